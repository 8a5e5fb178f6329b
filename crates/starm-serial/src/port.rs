//! 真实串口后端与端口发现
//!
//! 基于 `serialport` crate 的总线实现，以及两种 [`PortLocator`]：
//! `FixedPort`（指定设备）和 `ScanLocator`（顺序探测候选端口）。

use crate::{BusDeviceError, BusDeviceErrorKind, BusError, PortLocator, SerialBus};
use std::io::{Read, Write};
use std::time::Duration;
use tracing::{debug, info};

/// 默认波特率（STS 舵机出厂值 1 Mbaud）
pub const DEFAULT_BAUD_RATE: u32 = 1_000_000;

/// `serialport` 后端的总线实现
pub struct SerialPortBus {
    port: Box<dyn serialport::SerialPort>,
}

impl SerialPortBus {
    /// 打开串口（8N1）
    pub fn open(path: &str, baud_rate: u32, timeout: Duration) -> Result<Self, BusError> {
        let port = serialport::new(path, baud_rate)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .timeout(timeout)
            .open()?;
        Ok(Self { port })
    }
}

impl Read for SerialPortBus {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.port.read(buf)
    }
}

impl Write for SerialPortBus {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.port.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.port.flush()
    }
}

impl SerialBus for SerialPortBus {
    fn set_read_timeout(&mut self, timeout: Duration) -> Result<(), BusError> {
        self.port.set_timeout(timeout)?;
        Ok(())
    }
}

/// 固定端口定位器（不扫描，直接打开指定设备）
pub struct FixedPort {
    path: String,
    baud_rate: u32,
    timeout: Duration,
}

impl FixedPort {
    pub fn new(path: impl Into<String>, baud_rate: u32, timeout: Duration) -> Self {
        Self {
            path: path.into(),
            baud_rate,
            timeout,
        }
    }
}

impl PortLocator for FixedPort {
    fn locate(&self) -> Result<Box<dyn SerialBus>, BusError> {
        let bus = SerialPortBus::open(&self.path, self.baud_rate, self.timeout)?;
        info!(port = %self.path, baud = self.baud_rate, "serial port opened");
        Ok(Box::new(bus))
    }
}

/// 扫描定位器：依次探测系统枚举到的端口和候选名单，
/// 第一个能打开的端口胜出
pub struct ScanLocator {
    candidates: Vec<String>,
    baud_rate: u32,
    timeout: Duration,
}

impl ScanLocator {
    /// 使用平台默认候选名单
    pub fn new(baud_rate: u32, timeout: Duration) -> Self {
        Self {
            candidates: default_candidates(),
            baud_rate,
            timeout,
        }
    }

    /// 使用自定义候选名单
    pub fn with_candidates(
        candidates: Vec<String>,
        baud_rate: u32,
        timeout: Duration,
    ) -> Self {
        Self {
            candidates,
            baud_rate,
            timeout,
        }
    }
}

impl PortLocator for ScanLocator {
    fn locate(&self) -> Result<Box<dyn SerialBus>, BusError> {
        // 系统枚举到的端口优先，候选名单兜底
        let mut paths: Vec<String> = serialport::available_ports()
            .map(|ports| ports.into_iter().map(|p| p.port_name).collect())
            .unwrap_or_default();
        for candidate in &self.candidates {
            if !paths.contains(candidate) {
                paths.push(candidate.clone());
            }
        }

        for path in &paths {
            match SerialPortBus::open(path, self.baud_rate, self.timeout) {
                Ok(bus) => {
                    info!(port = %path, baud = self.baud_rate, "serial port opened");
                    return Ok(Box::new(bus));
                },
                Err(e) => {
                    debug!(port = %path, "port unavailable: {e}");
                },
            }
        }

        Err(BusError::Device(BusDeviceError::new(
            BusDeviceErrorKind::NotFound,
            "no usable serial port found",
        )))
    }
}

/// 平台默认候选端口名
fn default_candidates() -> Vec<String> {
    let mut candidates = Vec::new();
    if cfg!(windows) {
        for n in 1..10 {
            candidates.push(format!("COM{n}"));
        }
    } else {
        for n in 0..4 {
            candidates.push(format!("/dev/ttyUSB{n}"));
            candidates.push(format!("/dev/ttyACM{n}"));
        }
    }
    candidates
}
