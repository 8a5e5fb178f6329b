//! 舵机编组
//!
//! 有序的舵机集合：定长成员数组加 ID→下标查找表（arena 式存储，
//! 查找不产生堆分配）。不变量：组内逻辑 ID 唯一。

use crate::error::DriverError;
use crate::servo::{Servo, ServoLimits};
use std::collections::BTreeMap;
use tracing::warn;

/// 一台舵机的遥测快照（状态表的一行）
#[derive(Debug, Clone)]
pub struct ServoStatus {
    pub id: u8,
    pub name: String,
    pub position: i32,
    pub torque: i32,
    pub range_percent: f64,
    pub limits: ServoLimits,
}

/// 有序舵机编组
pub struct ServoGroup {
    servos: Vec<Servo>,
    /// ID → 成员下标（256 槽定长表）
    index_by_id: [Option<u8>; 256],
}

impl ServoGroup {
    /// 创建编组，拒绝重复 ID
    pub fn new(servos: Vec<Servo>) -> Result<Self, DriverError> {
        let mut index_by_id = [None; 256];
        for (index, servo) in servos.iter().enumerate() {
            let slot = &mut index_by_id[usize::from(servo.id())];
            if slot.is_some() {
                return Err(DriverError::InvalidInput(format!(
                    "duplicate servo id {} in group",
                    servo.id()
                )));
            }
            *slot = Some(index as u8);
        }
        Ok(Self {
            servos,
            index_by_id,
        })
    }

    pub fn len(&self) -> usize {
        self.servos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servos.is_empty()
    }

    /// 按数组下标查找
    pub fn by_index(&self, index: usize) -> Result<&Servo, DriverError> {
        self.servos.get(index).ok_or(DriverError::IndexOutOfRange {
            index,
            len: self.servos.len(),
        })
    }

    /// 按逻辑 ID 查找
    pub fn by_id(&self, id: u8) -> Result<&Servo, DriverError> {
        self.index_by_id[usize::from(id)]
            .map(|index| &self.servos[usize::from(index)])
            .ok_or(DriverError::ServoNotFound { id })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Servo> {
        self.servos.iter()
    }

    /// 按组内顺序把所有成员复位到默认位置
    ///
    /// 尽力而为：单个成员失败不会阻止其余成员复位，
    /// 所有失败连同舵机 ID 一并收集返回（空表示全部成功）。
    pub fn reset_all(&self) -> Vec<(u8, DriverError)> {
        let mut failures = Vec::new();
        for servo in &self.servos {
            if let Err(e) = servo.reset_to_default() {
                warn!(id = servo.id(), "reset_to_default failed: {e}");
                failures.push((servo.id(), e));
            }
        }
        failures
    }

    /// 所有成员的当前位置快照（ID → 位置）
    ///
    /// 每个成员是一次独立的总线往返，成员之间不保证原子性。
    pub fn positions_snapshot(&self) -> Result<BTreeMap<u8, i32>, DriverError> {
        let mut positions = BTreeMap::new();
        for servo in &self.servos {
            positions.insert(servo.id(), servo.current_position()?);
        }
        Ok(positions)
    }

    /// 所有成员的遥测状态（位置、扭矩、行程百分比）
    pub fn status_report(&self) -> Result<Vec<ServoStatus>, DriverError> {
        let mut rows = Vec::with_capacity(self.servos.len());
        for servo in &self.servos {
            rows.push(ServoStatus {
                id: servo.id(),
                name: servo.name().to_string(),
                position: servo.current_position()?,
                torque: servo.current_torque()?,
                range_percent: servo.movement_range_percent()?,
                limits: servo.limits(),
            });
        }
        Ok(rows)
    }
}
