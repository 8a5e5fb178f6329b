//! STS 舵机寄存器地址表
//!
//! 固定的设备内存偏移量。多字节寄存器（宽度 2）使用小端字节序。
//! 核心操作只读写 {目标位置, 当前位置, 当前速度, 当前电流} 和 PING，
//! 其余条目保留完整地址表以便配置工具使用。

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// 寄存器地址
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum Register {
    FirmwareMajor = 0x00,
    FirmwareMinor = 0x01,
    ServoMajor = 0x03,
    ServoMinor = 0x04,
    Id = 0x05,
    Baudrate = 0x06,
    ResponseDelay = 0x07,
    ResponseStatusLevel = 0x08,
    MinimumAngle = 0x09,
    MaximumAngle = 0x0B,
    MaximumTemperature = 0x0D,
    MaximumVoltage = 0x0E,
    MinimumVoltage = 0x0F,
    MaximumTorque = 0x10,
    UnloadingCondition = 0x13,
    LedAlarmCondition = 0x14,
    PosProportionalGain = 0x15,
    PosDerivativeGain = 0x16,
    PosIntegralGain = 0x17,
    MinimumStartupForce = 0x18,
    CkInsensitiveArea = 0x1A,
    CckInsensitiveArea = 0x1B,
    CurrentProtectionTh = 0x1C,
    AngularResolution = 0x1E,
    PositionCorrection = 0x1F,
    OperationMode = 0x21,
    TorqueProtectionTh = 0x22,
    TorqueProtectionTime = 0x23,
    OverloadTorque = 0x24,
    SpeedProportionalGain = 0x25,
    OvercurrentTime = 0x26,
    SpeedIntegralGain = 0x27,
    TorqueSwitch = 0x28,
    TargetAcceleration = 0x29,
    TargetPosition = 0x2A,
    RunningTime = 0x2C,
    RunningSpeed = 0x2E,
    TorqueLimit = 0x30,
    WriteLock = 0x37,
    CurrentPosition = 0x38,
    CurrentSpeed = 0x3A,
    CurrentDriveVoltage = 0x3C,
    CurrentVoltage = 0x3E,
    CurrentTemperature = 0x3F,
    AsynchronousWriteSt = 0x40,
    Status = 0x41,
    MovingStatus = 0x42,
    CurrentCurrent = 0x45,
}

impl Register {
    /// 寄存器字节宽度（1 或 2）
    pub fn width(self) -> u8 {
        match self {
            Register::MinimumAngle
            | Register::MaximumAngle
            | Register::MaximumTorque
            | Register::PositionCorrection
            | Register::TargetPosition
            | Register::RunningTime
            | Register::RunningSpeed
            | Register::TorqueLimit
            | Register::CurrentPosition
            | Register::CurrentSpeed
            | Register::CurrentDriveVoltage
            | Register::CurrentCurrent => 2,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_register_addresses() {
        assert_eq!(u8::from(Register::TargetPosition), 0x2A);
        assert_eq!(u8::from(Register::CurrentPosition), 0x38);
        assert_eq!(u8::from(Register::CurrentSpeed), 0x3A);
        assert_eq!(u8::from(Register::CurrentCurrent), 0x45);
    }

    #[test]
    fn test_core_register_widths() {
        assert_eq!(Register::TargetPosition.width(), 2);
        assert_eq!(Register::CurrentPosition.width(), 2);
        assert_eq!(Register::CurrentCurrent.width(), 2);
        assert_eq!(Register::CurrentTemperature.width(), 1);
        assert_eq!(Register::Id.width(), 1);
    }
}
