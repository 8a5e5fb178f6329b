//! 总线仿真（`mock` feature）
//!
//! `SimulatedBus` 用寄存器文件模型模拟一条挂有若干 STS 舵机的总线：
//! 解析主机写入的指令帧，按 PING/READ/WRITE 语义生成应答字节。
//! 句柄可克隆，测试侧保留一份用于注入寄存器值和事后断言，
//! 另一份移交给 Transport。
//!
//! 超时语义：应答缓冲为空时 `read` 立即返回 `TimedOut`，
//! 测试无需真实等待。

use crate::{BusError, SerialBus};
use parking_lot::Mutex;
use std::collections::{BTreeMap, VecDeque};
use std::io::{Read, Write};
use std::sync::Arc;
use std::time::Duration;
use starm_protocol::{self as protocol, Instruction, Register};

/// 仿真舵机寄存器文件大小（覆盖 0x00..=0x4F）
pub const REGISTER_FILE_SIZE: usize = 0x50;

/// 一台仿真舵机
struct SimulatedServo {
    registers: [u8; REGISTER_FILE_SIZE],
    /// 应答帧携带的错误字节
    error: u8,
    /// false 表示舵机掉线（收到指令不应答）
    responding: bool,
}

impl SimulatedServo {
    fn new(id: u8) -> Self {
        let mut registers = [0u8; REGISTER_FILE_SIZE];
        registers[usize::from(u8::from(Register::Id))] = id;
        Self {
            registers,
            error: 0,
            responding: true,
        }
    }
}

struct SimInner {
    devices: BTreeMap<u8, SimulatedServo>,
    /// 主机已写入、尚未凑满一帧的字节
    pending: Vec<u8>,
    /// 主机待读取的应答字节
    rx: VecDeque<u8>,
    corrupt_next_reply: bool,
    frames_seen: usize,
}

/// 可克隆的仿真总线句柄
#[derive(Clone)]
pub struct SimulatedBus {
    inner: Arc<Mutex<SimInner>>,
}

impl SimulatedBus {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(SimInner {
                devices: BTreeMap::new(),
                pending: Vec::new(),
                rx: VecDeque::new(),
                corrupt_next_reply: false,
                frames_seen: 0,
            })),
        }
    }

    /// 在总线上挂一台舵机（寄存器清零）
    pub fn add_servo(&self, id: u8) {
        self.inner.lock().devices.insert(id, SimulatedServo::new(id));
    }

    pub fn set_register_u8(&self, id: u8, register: Register, value: u8) {
        let mut inner = self.inner.lock();
        let device = inner.devices.get_mut(&id).expect("unknown servo id");
        device.registers[usize::from(u8::from(register))] = value;
    }

    pub fn set_register_u16(&self, id: u8, register: Register, value: u16) {
        let mut inner = self.inner.lock();
        let device = inner.devices.get_mut(&id).expect("unknown servo id");
        let offset = usize::from(u8::from(register));
        device.registers[offset..offset + 2].copy_from_slice(&protocol::u16_to_bytes_le(value));
    }

    pub fn register_u8(&self, id: u8, register: Register) -> u8 {
        let inner = self.inner.lock();
        let device = inner.devices.get(&id).expect("unknown servo id");
        device.registers[usize::from(u8::from(register))]
    }

    pub fn register_u16(&self, id: u8, register: Register) -> u16 {
        let inner = self.inner.lock();
        let device = inner.devices.get(&id).expect("unknown servo id");
        let offset = usize::from(u8::from(register));
        protocol::bytes_to_u16_le([device.registers[offset], device.registers[offset + 1]])
    }

    /// 设置应答帧的错误字节（模拟设备上报故障）
    pub fn set_error(&self, id: u8, code: u8) {
        let mut inner = self.inner.lock();
        inner.devices.get_mut(&id).expect("unknown servo id").error = code;
    }

    /// 模拟舵机掉线/恢复
    pub fn set_responding(&self, id: u8, responding: bool) {
        let mut inner = self.inner.lock();
        inner
            .devices
            .get_mut(&id)
            .expect("unknown servo id")
            .responding = responding;
    }

    /// 破坏下一个应答帧的校验和
    pub fn corrupt_next_reply(&self) {
        self.inner.lock().corrupt_next_reply = true;
    }

    /// 已处理的完整指令帧数
    pub fn frames_seen(&self) -> usize {
        self.inner.lock().frames_seen
    }
}

impl Default for SimulatedBus {
    fn default() -> Self {
        Self::new()
    }
}

impl SimInner {
    fn process_pending(&mut self) {
        loop {
            // 对齐帧头
            while self.pending.len() >= 2 && self.pending[..2] != protocol::FRAME_HEADER {
                self.pending.remove(0);
            }
            if self.pending.len() < 5 {
                return;
            }
            let length = self.pending[3] as usize;
            // header(2) + id + length + instr + params(length-2) + checksum
            let total = length + 4;
            if length < 2 || self.pending.len() < total {
                return;
            }
            let frame: Vec<u8> = self.pending.drain(..total).collect();
            self.frames_seen += 1;
            self.handle_frame(&frame);
        }
    }

    fn handle_frame(&mut self, frame: &[u8]) {
        let id = frame[2];
        let length = frame[3] as usize;
        let instr = frame[4];
        let params = &frame[5..length + 3];

        // 校验和错误的指令帧丢弃（真实舵机沉默）
        if frame[length + 3] != protocol::checksum(&frame[2..length + 3]) {
            return;
        }

        let Some(device) = self.devices.get_mut(&id) else {
            return;
        };
        if !device.responding {
            return;
        }
        let error = device.error;

        let mut reply = match Instruction::try_from(instr) {
            Ok(Instruction::Ping) => protocol::encode_status(id, error, &[]),
            Ok(Instruction::Read) if params.len() == 2 => {
                let offset = params[0] as usize;
                let count = params[1] as usize;
                if error != 0 || offset + count > REGISTER_FILE_SIZE {
                    protocol::encode_status(id, error.max(1), &[])
                } else {
                    protocol::encode_status(id, 0, &device.registers[offset..offset + count])
                }
            },
            Ok(Instruction::Write) if !params.is_empty() => {
                let offset = params[0] as usize;
                let values = &params[1..];
                if error == 0 && offset + values.len() <= REGISTER_FILE_SIZE {
                    device.registers[offset..offset + values.len()].copy_from_slice(values);
                }
                protocol::encode_status(id, error, &[])
            },
            _ => protocol::encode_status(id, error, &[]),
        };

        if self.corrupt_next_reply {
            self.corrupt_next_reply = false;
            let last = reply.len() - 1;
            reply[last] ^= 0xFF;
        }
        self.rx.extend(reply);
    }
}

impl Write for SimulatedBus {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut inner = self.inner.lock();
        inner.pending.extend_from_slice(buf);
        inner.process_pending();
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Read for SimulatedBus {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let mut inner = self.inner.lock();
        if inner.rx.is_empty() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "simulated read timeout",
            ));
        }
        let n = buf.len().min(inner.rx.len());
        for slot in buf[..n].iter_mut() {
            *slot = inner.rx.pop_front().expect("rx drained concurrently");
        }
        Ok(n)
    }
}

impl SerialBus for SimulatedBus {
    fn set_read_timeout(&mut self, _timeout: Duration) -> Result<(), BusError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use starm_protocol::decode_status;

    #[test]
    fn test_ping_reply() {
        let bus = SimulatedBus::new();
        bus.add_servo(1);
        let mut host = bus.clone();

        host.write_all(&protocol::encode_instruction(1, Instruction::Ping, &[]))
            .unwrap();
        let frame = decode_status(&mut host).unwrap();
        assert_eq!(frame.id, 1);
        assert!(frame.is_ok());
        assert!(frame.params().is_empty());
    }

    #[test]
    fn test_absent_servo_stays_silent() {
        let bus = SimulatedBus::new();
        let mut host = bus.clone();

        host.write_all(&protocol::encode_instruction(9, Instruction::Ping, &[]))
            .unwrap();
        let mut buf = [0u8; 1];
        let err = host.read(&mut buf).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::TimedOut);
    }

    #[test]
    fn test_read_write_register() {
        let bus = SimulatedBus::new();
        bus.add_servo(2);
        bus.set_register_u16(2, Register::CurrentPosition, 1234);
        let mut host = bus.clone();

        host.write_all(&protocol::encode_instruction(
            2,
            Instruction::Read,
            &[Register::CurrentPosition.into(), 2],
        ))
        .unwrap();
        let frame = decode_status(&mut host).unwrap();
        assert_eq!(
            protocol::bytes_to_u16_le([frame.params()[0], frame.params()[1]]),
            1234
        );

        let mut params = vec![Register::TargetPosition.into()];
        params.extend_from_slice(&protocol::u16_to_bytes_le(2000));
        host.write_all(&protocol::encode_instruction(2, Instruction::Write, &params))
            .unwrap();
        let frame = decode_status(&mut host).unwrap();
        assert!(frame.is_ok());
        assert_eq!(bus.register_u16(2, Register::TargetPosition), 2000);
    }

    #[test]
    fn test_error_byte_passthrough() {
        let bus = SimulatedBus::new();
        bus.add_servo(3);
        bus.set_error(3, 0x24);
        let mut host = bus.clone();

        host.write_all(&protocol::encode_instruction(
            3,
            Instruction::Read,
            &[Register::CurrentPosition.into(), 2],
        ))
        .unwrap();
        let frame = decode_status(&mut host).unwrap();
        assert_eq!(frame.error, 0x24);
    }

    #[test]
    fn test_corrupt_next_reply() {
        let bus = SimulatedBus::new();
        bus.add_servo(1);
        bus.corrupt_next_reply();
        let mut host = bus.clone();

        host.write_all(&protocol::encode_instruction(1, Instruction::Ping, &[]))
            .unwrap();
        let err = decode_status(&mut host).unwrap_err();
        assert!(matches!(
            err,
            starm_protocol::ProtocolError::ChecksumMismatch { .. }
        ));
    }

    #[test]
    fn test_partial_writes_reassembled() {
        let bus = SimulatedBus::new();
        bus.add_servo(1);
        let mut host = bus.clone();

        let frame = protocol::encode_instruction(1, Instruction::Ping, &[]);
        for chunk in frame.chunks(2) {
            host.write_all(chunk).unwrap();
        }
        assert!(decode_status(&mut host).is_ok());
        assert_eq!(bus.frames_seen(), 1);
    }
}
