//! 驱动层错误类型定义

use starm_protocol::ProtocolError;
use starm_serial::BusError;
use thiserror::Error;

/// 驱动层错误类型
#[derive(Error, Debug)]
pub enum DriverError {
    /// 串口总线错误
    #[error("Bus error: {0}")]
    Bus(#[from] BusError),

    /// 协议解析错误
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// 应答超时（期限内没有收到任何应答）
    #[error("Operation timeout")]
    Timeout,

    /// 舵机上报非零错误字节
    #[error("Servo {id} reported error code 0x{code:02X}")]
    ServoFault { id: u8, code: u8 },

    /// 编组内没有该逻辑 ID 的舵机
    #[error("No servo found with id {id}")]
    ServoNotFound { id: u8 },

    /// 编组下标越界
    #[error("Servo index {index} out of range (group size {len})")]
    IndexOutOfRange { index: usize, len: usize },

    /// 非法输入（如重复 ID、限位顺序错误）
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
