//! Builder 模式实现
//!
//! 链式构造 `Arm` 实例：配置来源（文件/内存/默认）、
//! 端口来源（指定端口/定位器/已打开总线），以及启动自检。

use crate::arm::Arm;
use crate::config::ArmConfig;
use crate::error::ClientError;
use starm_driver::Transport;
use starm_serial::{FixedPort, PortLocator, ScanLocator, SerialBus};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Arm Builder（链式构造）
///
/// # Example
///
/// ```no_run
/// use starm_client::ArmBuilder;
///
/// // 默认配置 + 扫描端口
/// let arm = ArmBuilder::new().build().unwrap();
///
/// // 指定端口与配置文件
/// let arm = ArmBuilder::new()
///     .config_path("arm.toml")
///     .port("/dev/ttyUSB0")
///     .build()
///     .unwrap();
/// ```
pub struct ArmBuilder {
    config: Option<ArmConfig>,
    config_path: Option<PathBuf>,
    port: Option<String>,
    locator: Option<Box<dyn PortLocator>>,
    bus: Option<Box<dyn SerialBus>>,
}

impl ArmBuilder {
    pub fn new() -> Self {
        Self {
            config: None,
            config_path: None,
            port: None,
            locator: None,
            bus: None,
        }
    }

    /// 使用内存配置（优先于配置文件）
    pub fn config(mut self, config: ArmConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// 从 TOML 文件加载配置
    pub fn config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    /// 指定串口（覆盖配置中的 `serial.port`）
    pub fn port(mut self, port: impl Into<String>) -> Self {
        self.port = Some(port.into());
        self
    }

    /// 注入自定义端口定位器
    pub fn locator(mut self, locator: Box<dyn PortLocator>) -> Self {
        self.locator = Some(locator);
        self
    }

    /// 注入已打开的总线（测试/仿真场景）
    pub fn bus(mut self, bus: Box<dyn SerialBus>) -> Self {
        self.bus = Some(bus);
        self
    }

    /// 构造 `Arm`
    ///
    /// 打开总线后做一次启动自检：夹爪舵机必须应答 ping，
    /// 否则返回 [`ClientError::Config`]。
    pub fn build(self) -> Result<Arm, ClientError> {
        let config = match (self.config, self.config_path) {
            (Some(config), _) => config,
            (None, Some(path)) => ArmConfig::load(path)?,
            (None, None) => ArmConfig::default(),
        };
        let timeout = Duration::from_millis(config.serial.timeout_ms);

        let bus = match self.bus {
            Some(bus) => bus,
            None => {
                let locator: Box<dyn PortLocator> = match self.locator {
                    Some(locator) => locator,
                    None => match self.port.clone().or_else(|| config.serial.port.clone()) {
                        Some(port) => {
                            Box::new(FixedPort::new(port, config.serial.baud_rate, timeout))
                        },
                        None => Box::new(ScanLocator::new(config.serial.baud_rate, timeout)),
                    },
                };
                locator.locate()?
            },
        };

        let transport = Arc::new(Transport::new(bus, timeout)?);
        let arm = Arm::new(transport, &config)?;

        // 启动自检：夹爪必须在线
        if !arm.gripper().ping()? {
            return Err(ClientError::Config(format!(
                "gripper servo (id {}) not responding",
                arm.gripper().id()
            )));
        }
        Ok(arm)
    }
}

impl Default for ArmBuilder {
    fn default() -> Self {
        Self::new()
    }
}
