//! # Starm Protocol
//!
//! STS 总线舵机串行协议定义（无硬件依赖）
//!
//! ## 模块
//!
//! - `instruction`: 指令码常量定义
//! - `registers`: 舵机寄存器地址表
//!
//! ## 帧格式
//!
//! ```text
//! [0xFF, 0xFF, id, length, instr_or_err, params..., checksum]
//! ```
//!
//! - `length = params.len() + 2`
//! - `checksum = ~(id + length + instr_or_err + sum(params)) & 0xFF`
//!   （校验和覆盖两个帧头字节之后的所有字段）
//!
//! ## 字节序
//!
//! 多字节寄存器（位置、速度等）使用小端字节序（低位在前）。
//! 本模块提供了字节序转换工具函数。
//!
//! ## 设计约束
//!
//! 编解码是纯变换：本 crate 不做任何 I/O 重试，结构性错误
//! （帧头错误、校验和不匹配、短读）原样交给调用方处理。

pub mod instruction;
pub mod registers;

pub use instruction::Instruction;
pub use registers::Register;

use std::io::Read;
use thiserror::Error;

/// 帧头（两个固定字节）
pub const FRAME_HEADER: [u8; 2] = [0xFF, 0xFF];

/// 单帧参数字节数上限
///
/// STS 协议实际使用的参数不超过 4 字节（位置 + 速度），
/// 这里留出余量以容纳整块寄存器读取。
pub const MAX_PARAMS: usize = 16;

/// 写入目标位置时附带的默认运行速度（寄存器原始值）
pub const DEFAULT_MOVE_SPEED: u16 = 0x0FFF;

/// 协议解析错误类型
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// 帧头不是 `FF FF`
    #[error("Invalid frame header: expected FF FF, got {found:02X?}")]
    BadHeader { found: [u8; 2] },

    /// 长度字节非法（< 2 或超出参数上限）
    #[error("Invalid frame length byte: {length}")]
    BadLength { length: u8 },

    /// 校验和不匹配
    #[error("Checksum mismatch: expected 0x{expected:02X}, got 0x{actual:02X}")]
    ChecksumMismatch { expected: u8, actual: u8 },

    /// 字节流在帧中途结束
    #[error("Truncated frame: stream ended mid-frame")]
    Truncated,

    /// 应答参数长度与请求不一致
    #[error("Invalid reply length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    /// 底层 IO 错误（超时由上层转译）
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// 舵机应答帧（状态帧）
///
/// 固定容量参数存储，`Copy` 语义，按调用临时构造、从不持久化。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusFrame {
    /// 应答舵机 ID
    pub id: u8,
    /// 错误字节（0 表示无错误）
    pub error: u8,
    /// 参数存储（未使用部分为 0）
    params: [u8; MAX_PARAMS],
    /// 有效参数长度
    len: u8,
}

impl StatusFrame {
    /// 构造状态帧（参数超长部分被截断）
    pub fn new(id: u8, error: u8, params: &[u8]) -> Self {
        let mut fixed = [0u8; MAX_PARAMS];
        let len = params.len().min(MAX_PARAMS);
        fixed[..len].copy_from_slice(&params[..len]);
        Self {
            id,
            error,
            params: fixed,
            len: len as u8,
        }
    }

    /// 获取参数切片（只包含有效数据）
    pub fn params(&self) -> &[u8] {
        &self.params[..self.len as usize]
    }

    /// 错误字节是否为零
    pub fn is_ok(&self) -> bool {
        self.error == 0
    }
}

/// 计算校验和：逐字节求和取反，保留低 8 位
///
/// 输入为帧头之后、校验和之前的所有字节。
pub fn checksum(bytes: &[u8]) -> u8 {
    let sum: u32 = bytes.iter().map(|&b| b as u32).sum();
    !(sum as u8)
}

/// 构建指令帧
///
/// 产出 `[0xFF, 0xFF, id, params.len()+2, instruction, ...params, checksum]`。
///
/// # Panics
///
/// `params` 超过 [`MAX_PARAMS`] 时 panic（协议内所有调用点的参数都是
/// 固定长度，超限属于编程错误而非运行时状况）。
pub fn encode_instruction(id: u8, instruction: Instruction, params: &[u8]) -> Vec<u8> {
    assert!(
        params.len() <= MAX_PARAMS,
        "instruction parameters exceed MAX_PARAMS"
    );
    encode_raw(id, instruction.into(), params)
}

/// 构建状态帧（第三字段为错误字节而非指令码）
///
/// 帧布局与指令帧完全一致，供测试和总线仿真使用。
pub fn encode_status(id: u8, error: u8, params: &[u8]) -> Vec<u8> {
    assert!(
        params.len() <= MAX_PARAMS,
        "status parameters exceed MAX_PARAMS"
    );
    encode_raw(id, error, params)
}

fn encode_raw(id: u8, third: u8, params: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(6 + params.len());
    frame.extend_from_slice(&FRAME_HEADER);
    frame.push(id);
    frame.push(params.len() as u8 + 2);
    frame.push(third);
    frame.extend_from_slice(params);
    frame.push(checksum(&frame[2..]));
    frame
}

/// 从字节流解码一个状态帧
///
/// 精确读取：2 字节帧头、ID、长度、错误字节、`length - 2` 个参数字节、
/// 1 字节校验和。任何一段短读返回 [`ProtocolError::Truncated`]；
/// 帧头错误返回 [`ProtocolError::BadHeader`]；校验和不匹配返回
/// [`ProtocolError::ChecksumMismatch`]。
pub fn decode_status(reader: &mut impl Read) -> Result<StatusFrame, ProtocolError> {
    let mut header = [0u8; 2];
    read_field(reader, &mut header)?;
    if header != FRAME_HEADER {
        return Err(ProtocolError::BadHeader { found: header });
    }

    // id, length, error
    let mut meta = [0u8; 3];
    read_field(reader, &mut meta)?;
    let [id, length, error] = meta;
    if length < 2 || (length as usize - 2) > MAX_PARAMS {
        return Err(ProtocolError::BadLength { length });
    }

    let count = length as usize - 2;
    let mut params = [0u8; MAX_PARAMS];
    read_field(reader, &mut params[..count])?;

    let mut received = [0u8; 1];
    read_field(reader, &mut received)?;

    // 对接收到的字段重新计算校验和
    let mut sum = id as u32 + length as u32 + error as u32;
    for &b in &params[..count] {
        sum += b as u32;
    }
    let expected = !(sum as u8);
    if received[0] != expected {
        return Err(ProtocolError::ChecksumMismatch {
            expected,
            actual: received[0],
        });
    }

    Ok(StatusFrame::new(id, error, &params[..count]))
}

fn read_field(reader: &mut impl Read, buf: &mut [u8]) -> Result<(), ProtocolError> {
    reader.read_exact(buf).map_err(|e| match e.kind() {
        std::io::ErrorKind::UnexpectedEof => ProtocolError::Truncated,
        _ => ProtocolError::Io(e),
    })
}

/// 字节序转换工具函数
///
/// 协议的多字节寄存器使用小端字节序（低位在前）。
///
/// 小端字节序转 u16
pub fn bytes_to_u16_le(bytes: [u8; 2]) -> u16 {
    u16::from_le_bytes(bytes)
}

/// u16 转小端字节序
pub fn u16_to_bytes_le(value: u16) -> [u8; 2] {
    value.to_le_bytes()
}
