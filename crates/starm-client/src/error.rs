//! 客户端层错误类型定义

use starm_driver::DriverError;
use starm_serial::BusError;
use thiserror::Error;

/// 客户端层错误类型
#[derive(Error, Debug)]
pub enum ClientError {
    /// 驱动层错误
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    /// 串口总线错误
    #[error("Bus error: {0}")]
    Bus(#[from] BusError),

    /// 配置错误（启动期没有可用端口/设备，或配置内容非法）
    #[error("Config error: {0}")]
    Config(String),

    /// IO 错误（配置文件读取、线程创建）
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// 配置文件解析失败
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),
}
