//! 指令码定义
//!
//! 指令帧第三字段的操作码。应答帧同一位置携带的是错误字节。

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// 总线指令码
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum Instruction {
    /// 探测舵机是否在线
    Ping = 0x01,
    /// 读取寄存器
    Read = 0x02,
    /// 写入寄存器（立即生效）
    Write = 0x03,
    /// 写入寄存器（等待 ACTION 触发）
    RegWrite = 0x04,
    /// 触发所有挂起的 REG_WRITE
    Action = 0x05,
    /// 恢复出厂设置
    Reset = 0x06,
    /// 同步写多个舵机
    SyncWrite = 0x83,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instruction_codes() {
        assert_eq!(u8::from(Instruction::Ping), 0x01);
        assert_eq!(u8::from(Instruction::Read), 0x02);
        assert_eq!(u8::from(Instruction::Write), 0x03);
        assert_eq!(u8::from(Instruction::RegWrite), 0x04);
        assert_eq!(u8::from(Instruction::Action), 0x05);
        assert_eq!(u8::from(Instruction::Reset), 0x06);
        assert_eq!(u8::from(Instruction::SyncWrite), 0x83);
    }

    #[test]
    fn test_instruction_try_from() {
        assert_eq!(Instruction::try_from(0x02), Ok(Instruction::Read));
        assert!(Instruction::try_from(0x99).is_err());
    }
}
