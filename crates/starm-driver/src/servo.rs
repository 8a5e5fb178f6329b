//! 单关节抽象
//!
//! `Servo` 是对总线上一个可寻址设备的类型化访问器：
//! 逻辑 ID、人类可读名称、不可变行程限位。
//! 位置状态只存在于物理设备上，所有读写都经由 Transport 往返。

use crate::error::DriverError;
use crate::transport::Transport;
use starm_protocol::{DEFAULT_MOVE_SPEED, Register, u16_to_bytes_le};
use std::sync::Arc;

/// 行程限位（设备位置刻度）
///
/// 不变量：`0 <= min_pos <= default_pos <= max_pos <= 0xFFFF`。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServoLimits {
    min_pos: i32,
    max_pos: i32,
    default_pos: i32,
}

impl ServoLimits {
    /// 创建限位，校验顺序不变量
    pub fn new(min_pos: i32, max_pos: i32, default_pos: i32) -> Result<Self, DriverError> {
        if !(min_pos <= default_pos && default_pos <= max_pos) {
            return Err(DriverError::InvalidInput(format!(
                "servo limits must satisfy min <= default <= max, got {min_pos}/{default_pos}/{max_pos}"
            )));
        }
        if min_pos < 0 || max_pos > i32::from(u16::MAX) {
            return Err(DriverError::InvalidInput(format!(
                "servo limits must fit device ticks 0..=65535, got {min_pos}..={max_pos}"
            )));
        }
        Ok(Self {
            min_pos,
            max_pos,
            default_pos,
        })
    }

    pub fn min_pos(&self) -> i32 {
        self.min_pos
    }

    pub fn max_pos(&self) -> i32 {
        self.max_pos
    }

    pub fn default_pos(&self) -> i32 {
        self.default_pos
    }

    /// 把请求位置静默收拢到有效区间
    pub fn clamp(&self, position: i32) -> i32 {
        position.clamp(self.min_pos, self.max_pos)
    }

    /// 行程总长度（刻度）
    pub fn span(&self) -> i32 {
        self.max_pos - self.min_pos
    }
}

/// 总线上的一个关节
pub struct Servo {
    id: u8,
    name: String,
    limits: ServoLimits,
    transport: Arc<Transport>,
}

impl Servo {
    pub fn new(
        id: u8,
        name: impl Into<String>,
        limits: ServoLimits,
        transport: Arc<Transport>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            limits,
            transport,
        }
    }

    pub fn id(&self) -> u8 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn limits(&self) -> ServoLimits {
        self.limits
    }

    /// 探测舵机是否在线
    pub fn ping(&self) -> Result<bool, DriverError> {
        self.transport.ping(self.id)
    }

    /// 读取当前位置（2 字节小端）
    pub fn current_position(&self) -> Result<i32, DriverError> {
        Ok(i32::from(
            self.transport.read_u16(self.id, Register::CurrentPosition)?,
        ))
    }

    /// 读取目标位置（舵机正在趋向的位置）
    pub fn target_position(&self) -> Result<i32, DriverError> {
        Ok(i32::from(
            self.transport.read_u16(self.id, Register::TargetPosition)?,
        ))
    }

    /// 读取当前扭矩/电流
    pub fn current_torque(&self) -> Result<i32, DriverError> {
        Ok(i32::from(
            self.transport.read_u16(self.id, Register::CurrentCurrent)?,
        ))
    }

    /// 设置目标位置
    ///
    /// 请求值先收拢到行程限位内再下发；收拢是静默的，
    /// 越界请求得到最近的有效位置而不是错误。
    /// 写入内容为 2 字节位置 + 2 字节默认运行速度。
    pub fn set_position(&self, position: i32) -> Result<(), DriverError> {
        let clamped = self.limits.clamp(position) as u16;
        let mut params = [0u8; 4];
        params[..2].copy_from_slice(&u16_to_bytes_le(clamped));
        params[2..].copy_from_slice(&u16_to_bytes_le(DEFAULT_MOVE_SPEED));
        self.transport
            .write(self.id, Register::TargetPosition, &params)
    }

    /// 相对当前位置移动
    ///
    /// 读-写两步分属两次交换，相对并发写者不是原子的；
    /// 需要原子性的调用方使用 [`Transport::session`]。
    pub fn move_relative(&self, offset: i32) -> Result<(), DriverError> {
        let current = self.current_position()?;
        self.set_position(current + offset)
    }

    /// 回到默认位置
    pub fn reset_to_default(&self) -> Result<(), DriverError> {
        self.set_position(self.limits.default_pos)
    }

    /// 是否处于最小行程端点
    pub fn is_at_min(&self) -> Result<bool, DriverError> {
        Ok(self.current_position()? <= self.limits.min_pos)
    }

    /// 是否处于最大行程端点
    pub fn is_at_max(&self) -> Result<bool, DriverError> {
        Ok(self.current_position()? >= self.limits.max_pos)
    }

    /// 当前位置在行程中的百分比
    pub fn movement_range_percent(&self) -> Result<f64, DriverError> {
        let current = self.current_position()?;
        Ok(f64::from(current - self.limits.min_pos) / f64::from(self.limits.span()) * 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use starm_serial::SimulatedBus;
    use std::time::Duration;

    fn setup(id: u8, limits: ServoLimits) -> (SimulatedBus, Servo) {
        let sim = SimulatedBus::new();
        sim.add_servo(id);
        let transport = Arc::new(
            Transport::new(Box::new(sim.clone()), Duration::from_millis(50)).unwrap(),
        );
        let servo = Servo::new(id, format!("servo-{id}"), limits, transport);
        (sim, servo)
    }

    fn limits(min: i32, max: i32, default: i32) -> ServoLimits {
        ServoLimits::new(min, max, default).unwrap()
    }

    #[test]
    fn test_limits_ordering_enforced() {
        assert!(ServoLimits::new(1400, 2000, 1800).is_ok());
        assert!(ServoLimits::new(2000, 1400, 1800).is_err());
        assert!(ServoLimits::new(1400, 2000, 2100).is_err());
        assert!(ServoLimits::new(-5, 2000, 100).is_err());
        assert!(ServoLimits::new(0, 70000, 100).is_err());
    }

    #[test]
    fn test_set_position_clamps_low_and_high() {
        let (sim, servo) = setup(1, limits(1400, 2000, 2000));

        servo.set_position(500).unwrap();
        assert_eq!(sim.register_u16(1, starm_protocol::Register::TargetPosition), 1400);

        servo.set_position(5000).unwrap();
        assert_eq!(sim.register_u16(1, starm_protocol::Register::TargetPosition), 2000);
    }

    #[test]
    fn test_set_position_in_range_writes_exact_value_and_speed() {
        let (sim, servo) = setup(1, limits(1400, 2000, 2000));
        servo.set_position(1700).unwrap();
        assert_eq!(sim.register_u16(1, starm_protocol::Register::TargetPosition), 1700);
        // 位置后紧跟 2 字节默认速度（落在 RunningTime 偏移上）
        assert_eq!(
            sim.register_u16(1, starm_protocol::Register::RunningTime),
            DEFAULT_MOVE_SPEED
        );
    }

    #[test]
    fn test_move_relative_reads_then_writes() {
        let (sim, servo) = setup(2, limits(1000, 3200, 2000));
        sim.set_register_u16(2, starm_protocol::Register::CurrentPosition, 2000);
        servo.move_relative(-150).unwrap();
        assert_eq!(sim.register_u16(2, starm_protocol::Register::TargetPosition), 1850);
    }

    #[test]
    fn test_reset_to_default() {
        let (sim, servo) = setup(3, limits(900, 3000, 1950));
        servo.reset_to_default().unwrap();
        assert_eq!(sim.register_u16(3, starm_protocol::Register::TargetPosition), 1950);
    }

    #[test]
    fn test_movement_range_percent() {
        let (sim, servo) = setup(4, limits(1000, 3000, 2000));
        sim.set_register_u16(4, starm_protocol::Register::CurrentPosition, 1500);
        let percent = servo.movement_range_percent().unwrap();
        assert!((percent - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_endpoint_checks() {
        let (sim, servo) = setup(5, limits(1000, 3000, 2000));
        sim.set_register_u16(5, starm_protocol::Register::CurrentPosition, 1000);
        assert!(servo.is_at_min().unwrap());
        assert!(!servo.is_at_max().unwrap());
    }

    #[test]
    fn test_transport_error_surfaces_unchanged() {
        let (sim, servo) = setup(6, limits(1000, 3000, 2000));
        sim.set_responding(6, false);
        let err = servo.current_position().unwrap_err();
        assert!(matches!(err, DriverError::Timeout));
    }
}
