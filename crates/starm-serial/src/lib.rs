//! # Starm Serial Bus Layer
//!
//! 串口硬件抽象层，提供统一的半双工总线接口抽象。
//!
//! 总线是单通道半双工的：同一时刻只允许一个未完成的请求/应答交换，
//! 串行化由上层 Transport 负责，本层只提供原始字节流和超时语义。

use std::io::{Read, Write};
use std::time::Duration;
use thiserror::Error;

#[cfg(feature = "mock")]
pub mod mock;
pub mod port;

#[cfg(feature = "mock")]
pub use mock::SimulatedBus;
pub use port::{FixedPort, ScanLocator, SerialPortBus};

/// 串口适配层统一错误类型
#[derive(Error, Debug)]
pub enum BusError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Device Error: {0}")]
    Device(#[from] BusDeviceError),
    #[error("Read timeout")]
    Timeout,
}

/// 设备/后端错误的结构化分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusDeviceErrorKind {
    Unknown,
    NotFound,
    NoDevice,
    AccessDenied,
    Busy,
    UnsupportedConfig,
}

/// 结构化设备错误
#[derive(Error, Debug, Clone)]
#[error("{kind:?}: {message}")]
pub struct BusDeviceError {
    pub kind: BusDeviceErrorKind,
    pub message: String,
}

impl BusDeviceError {
    pub fn new(kind: BusDeviceErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<serialport::Error> for BusError {
    fn from(e: serialport::Error) -> Self {
        let kind = match e.kind {
            serialport::ErrorKind::NoDevice => BusDeviceErrorKind::NoDevice,
            serialport::ErrorKind::InvalidInput => BusDeviceErrorKind::UnsupportedConfig,
            serialport::ErrorKind::Io(std::io::ErrorKind::NotFound) => BusDeviceErrorKind::NotFound,
            serialport::ErrorKind::Io(std::io::ErrorKind::PermissionDenied) => {
                BusDeviceErrorKind::AccessDenied
            },
            _ => BusDeviceErrorKind::Unknown,
        };
        BusError::Device(BusDeviceError::new(kind, e.to_string()))
    }
}

/// 半双工串行总线抽象
///
/// 读操作受 [`set_read_timeout`](SerialBus::set_read_timeout) 设置的
/// 期限约束，超时以 `io::ErrorKind::TimedOut` 形式出现在 `read` 上。
pub trait SerialBus: Read + Write + Send {
    /// 设置读超时（应用于后续所有读操作）
    fn set_read_timeout(&mut self, timeout: Duration) -> Result<(), BusError>;
}

/// 端口发现能力（引导期注入给 Transport 的构造方）
///
/// 启动期的端口扫描/选择策略不属于协议状态机，
/// 通过本 trait 作为外部能力注入。
pub trait PortLocator {
    /// 定位并打开一个可用总线
    fn locate(&self) -> Result<Box<dyn SerialBus>, BusError>;
}
