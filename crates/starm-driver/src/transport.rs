//! 寄存器传输层
//!
//! `Transport` 独占串口连接，把 ping / 读寄存器 / 写寄存器
//! 各自封装为一次完整的请求/应答交换。
//!
//! # 并发模型
//!
//! 总线是半双工单通道的：同一时刻只允许一个未完成交换。
//! 所有调用方通过一把 `parking_lot::Mutex` 串行化，
//! 锁的持有范围是"发送 + 接收"一次交换，从不跨交换持锁。
//! 需要把多次交换合并为一个临界区的调用方（例如复合动作）
//! 使用 [`Transport::session`] 显式持锁。
//!
//! 每次交换受读超时约束；超时是正常的、被处理的结果
//! （ping 返回 false，读写返回 [`DriverError::Timeout`]），
//! 传输层不做自动重试，重试策略属于调用方。

use crate::error::DriverError;
use parking_lot::{Mutex, MutexGuard};
use starm_protocol::{
    Instruction, ProtocolError, Register, StatusFrame, bytes_to_u16_le, decode_status,
    encode_instruction,
};
use starm_serial::{BusError, PortLocator, SerialBus};
use std::io::ErrorKind;
use std::time::Duration;
use tracing::trace;

/// 默认读超时（对齐舵机出厂应答延迟的保守上界）
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(1);

/// 寄存器传输
///
/// 独占持有串口；Servo/ServoGroup 只保存对它的共享引用，
/// 从不复制连接状态。
pub struct Transport {
    bus: Mutex<Box<dyn SerialBus>>,
    timeout: Duration,
}

impl Transport {
    /// 用已打开的总线创建传输层，并应用读超时
    pub fn new(mut bus: Box<dyn SerialBus>, timeout: Duration) -> Result<Self, DriverError> {
        bus.set_read_timeout(timeout)?;
        Ok(Self {
            bus: Mutex::new(bus),
            timeout,
        })
    }

    /// 通过端口定位器创建传输层（引导期能力注入）
    pub fn from_locator(
        locator: &dyn PortLocator,
        timeout: Duration,
    ) -> Result<Self, DriverError> {
        Self::new(locator.locate()?, timeout)
    }

    /// 当前读超时
    pub fn read_timeout(&self) -> Duration {
        self.timeout
    }

    /// 获取独占会话（跨多次交换持锁的组合临界区）
    ///
    /// 单次操作用 [`ping`](Transport::ping) / [`read`](Transport::read) /
    /// [`write`](Transport::write) 即可；会话只在需要保证
    /// 读-改-写序列不被其他调用方插入时使用。
    pub fn session(&self) -> Session<'_> {
        Session {
            bus: self.bus.lock(),
        }
    }

    /// 探测舵机是否在线（一次交换）
    pub fn ping(&self, id: u8) -> Result<bool, DriverError> {
        self.session().ping(id)
    }

    /// 读取寄存器（一次交换）
    pub fn read(&self, id: u8, register: Register, len: u8) -> Result<Vec<u8>, DriverError> {
        self.session().read(id, register, len)
    }

    /// 读取 2 字节小端寄存器（一次交换）
    pub fn read_u16(&self, id: u8, register: Register) -> Result<u16, DriverError> {
        self.session().read_u16(id, register)
    }

    /// 写入寄存器（一次交换）
    pub fn write(&self, id: u8, register: Register, values: &[u8]) -> Result<(), DriverError> {
        self.session().write(id, register, values)
    }
}

/// 独占总线会话
///
/// 持有传输层互斥锁；在会话存活期间其他调用方全部阻塞，
/// 不要长期持有。
pub struct Session<'a> {
    bus: MutexGuard<'a, Box<dyn SerialBus>>,
}

impl Session<'_> {
    /// 探测舵机是否在线
    ///
    /// 在超时前收到一帧有效应答返回 `true`；超时或应答解码失败
    /// 返回 `false`（设备缺席不是错误）。只有底层串口 IO 故障才会上抛。
    pub fn ping(&mut self, id: u8) -> Result<bool, DriverError> {
        self.send(id, Instruction::Ping, &[])?;
        match self.receive() {
            Ok(_) => Ok(true),
            Err(DriverError::Timeout) | Err(DriverError::Protocol(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// 读取寄存器
    ///
    /// 应答错误字节非零返回 [`DriverError::ServoFault`]；
    /// 应答参数长度与请求不一致返回协议错误。
    pub fn read(&mut self, id: u8, register: Register, len: u8) -> Result<Vec<u8>, DriverError> {
        self.send(id, Instruction::Read, &[register.into(), len])?;
        let frame = self.receive()?;
        if !frame.is_ok() {
            return Err(DriverError::ServoFault {
                id,
                code: frame.error,
            });
        }
        if frame.params().len() != len as usize {
            return Err(ProtocolError::InvalidLength {
                expected: len as usize,
                actual: frame.params().len(),
            }
            .into());
        }
        Ok(frame.params().to_vec())
    }

    /// 读取 2 字节小端寄存器
    pub fn read_u16(&mut self, id: u8, register: Register) -> Result<u16, DriverError> {
        let bytes = self.read(id, register, 2)?;
        Ok(bytes_to_u16_le([bytes[0], bytes[1]]))
    }

    /// 写入寄存器
    ///
    /// 成功 = 收到一帧错误字节为零的有效应答。
    pub fn write(&mut self, id: u8, register: Register, values: &[u8]) -> Result<(), DriverError> {
        let mut params = Vec::with_capacity(values.len() + 1);
        params.push(register.into());
        params.extend_from_slice(values);
        self.send(id, Instruction::Write, &params)?;
        let frame = self.receive()?;
        if !frame.is_ok() {
            return Err(DriverError::ServoFault {
                id,
                code: frame.error,
            });
        }
        Ok(())
    }

    fn send(&mut self, id: u8, instruction: Instruction, params: &[u8]) -> Result<(), DriverError> {
        let frame = encode_instruction(id, instruction, params);
        trace!(id, ?instruction, len = frame.len(), "tx frame");
        self.bus.write_all(&frame).map_err(io_to_driver)?;
        self.bus.flush().map_err(io_to_driver)?;
        Ok(())
    }

    fn receive(&mut self) -> Result<StatusFrame, DriverError> {
        decode_status(&mut *self.bus).map_err(|e| match e {
            ProtocolError::Io(io)
                if io.kind() == ErrorKind::TimedOut || io.kind() == ErrorKind::WouldBlock =>
            {
                DriverError::Timeout
            },
            other => DriverError::Protocol(other),
        })
    }
}

fn io_to_driver(e: std::io::Error) -> DriverError {
    match e.kind() {
        ErrorKind::TimedOut | ErrorKind::WouldBlock => DriverError::Timeout,
        _ => DriverError::Bus(BusError::Io(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use starm_serial::SimulatedBus;

    fn setup() -> (SimulatedBus, Transport) {
        let sim = SimulatedBus::new();
        let transport = Transport::new(Box::new(sim.clone()), Duration::from_millis(50))
            .expect("transport init failed");
        (sim, transport)
    }

    #[test]
    fn test_ping_present_servo() {
        let (sim, transport) = setup();
        sim.add_servo(1);
        assert!(transport.ping(1).unwrap());
    }

    #[test]
    fn test_ping_absent_servo_returns_false() {
        let (_sim, transport) = setup();
        // 无人应答：必须得到 false 而不是错误
        assert!(!transport.ping(7).unwrap());
    }

    #[test]
    fn test_ping_corrupt_reply_returns_false() {
        let (sim, transport) = setup();
        sim.add_servo(1);
        sim.corrupt_next_reply();
        assert!(!transport.ping(1).unwrap());
    }

    #[test]
    fn test_read_register() {
        let (sim, transport) = setup();
        sim.add_servo(2);
        sim.set_register_u16(2, Register::CurrentPosition, 1500);
        assert_eq!(transport.read_u16(2, Register::CurrentPosition).unwrap(), 1500);
    }

    #[test]
    fn test_read_timeout() {
        let (_sim, transport) = setup();
        let err = transport.read_u16(5, Register::CurrentPosition).unwrap_err();
        assert!(matches!(err, DriverError::Timeout));
    }

    #[test]
    fn test_servo_fault_code_propagates() {
        let (sim, transport) = setup();
        sim.add_servo(3);
        sim.set_error(3, 0x20);
        let err = transport.read_u16(3, Register::CurrentPosition).unwrap_err();
        assert!(matches!(err, DriverError::ServoFault { id: 3, code: 0x20 }));
    }

    #[test]
    fn test_write_register() {
        let (sim, transport) = setup();
        sim.add_servo(4);
        transport
            .write(4, Register::TargetPosition, &[0xD0, 0x07])
            .unwrap();
        assert_eq!(sim.register_u16(4, Register::TargetPosition), 2000);
    }

    #[test]
    fn test_session_spans_multiple_exchanges() {
        let (sim, transport) = setup();
        sim.add_servo(1);
        sim.set_register_u16(1, Register::CurrentPosition, 1000);

        let mut session = transport.session();
        let current = session.read_u16(1, Register::CurrentPosition).unwrap();
        session
            .write(1, Register::TargetPosition, &(current + 10).to_le_bytes())
            .unwrap();
        drop(session);

        assert_eq!(sim.register_u16(1, Register::TargetPosition), 1010);
    }
}
