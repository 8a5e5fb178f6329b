//! 机械臂协调层
//!
//! 把逻辑关节角色（夹爪、腕旋转、腕弯曲、肘、肩、底座）绑定到
//! 编组成员，并在单关节动作之上组合臂级手势。

use crate::config::ArmConfig;
use crate::error::ClientError;
use crate::monitor::ComplianceMonitor;
use starm_driver::{DriverError, Servo, ServoGroup, ServoLimits, ServoStatus, Transport};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

/// 逻辑关节角色（编组内固定顺序）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JointRole {
    Gripper,
    WristRotate,
    WristBend,
    Elbow,
    Shoulder,
    Base,
}

impl JointRole {
    /// 编组内下标（构造时按此顺序装配）
    fn index(self) -> usize {
        match self {
            JointRole::Gripper => 0,
            JointRole::WristRotate => 1,
            JointRole::WristBend => 2,
            JointRole::Elbow => 3,
            JointRole::Shoulder => 4,
            JointRole::Base => 5,
        }
    }
}

/// 6 关节机械臂
///
/// 持有舵机编组与柔顺监视器；所有运动最终通过共享的
/// Transport 串行化到总线上。
pub struct Arm {
    group: Arc<ServoGroup>,
    gripper_open: i32,
    gripper_closed: i32,
    monitor: ComplianceMonitor,
}

impl std::fmt::Debug for Arm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Arm")
            .field("joints", &self.group.len())
            .field("gripper_open", &self.gripper_open)
            .field("gripper_closed", &self.gripper_closed)
            .finish_non_exhaustive()
    }
}

impl Arm {
    /// 按配置装配机械臂
    pub fn new(transport: Arc<Transport>, config: &ArmConfig) -> Result<Self, ClientError> {
        let roles = [
            ("gripper", &config.gripper),
            ("wrist_rotate", &config.wrist_rotate),
            ("wrist_bend", &config.wrist_bend),
            ("elbow", &config.elbow),
            ("shoulder", &config.shoulder),
            ("base", &config.base),
        ];
        let mut servos = Vec::with_capacity(roles.len());
        for (name, joint) in roles {
            let limits = ServoLimits::new(joint.min_pos, joint.max_pos, joint.default_pos)?;
            servos.push(Servo::new(joint.id, name, limits, transport.clone()));
        }
        let group = Arc::new(ServoGroup::new(servos)?);
        let monitor = ComplianceMonitor::new(group.clone(), config.monitor.clone());
        info!(joints = group.len(), "arm assembled");
        Ok(Self {
            group,
            gripper_open: config.gripper_setpoints.open,
            gripper_closed: config.gripper_setpoints.closed,
            monitor,
        })
    }

    /// 按角色取关节
    pub fn joint(&self, role: JointRole) -> &Servo {
        self.group
            .by_index(role.index())
            .expect("arm group is assembled with all six roles")
    }

    pub fn gripper(&self) -> &Servo {
        self.joint(JointRole::Gripper)
    }

    pub fn wrist_rotate(&self) -> &Servo {
        self.joint(JointRole::WristRotate)
    }

    pub fn wrist_bend(&self) -> &Servo {
        self.joint(JointRole::WristBend)
    }

    pub fn elbow(&self) -> &Servo {
        self.joint(JointRole::Elbow)
    }

    pub fn shoulder(&self) -> &Servo {
        self.joint(JointRole::Shoulder)
    }

    pub fn base(&self) -> &Servo {
        self.joint(JointRole::Base)
    }

    /// 底层编组（状态报表、迭代）
    pub fn group(&self) -> &ServoGroup {
        &self.group
    }

    /// 闭合夹爪（配置的 closed 设定点）
    pub fn grab(&self) -> Result<(), ClientError> {
        self.gripper().set_position(self.gripper_closed)?;
        Ok(())
    }

    /// 张开夹爪（配置的 open 设定点）
    pub fn release(&self) -> Result<(), ClientError> {
        self.gripper().set_position(self.gripper_open)?;
        Ok(())
    }

    /// 伸展/收回手势：肩、肘、腕弯曲三关节联动
    ///
    /// 按固定顺序执行 `shoulder -ticks/2`、`elbow +ticks`、
    /// `wrist_bend -ticks/2`（0.5 比例来自平行连杆几何），
    /// 每个关节各自按自身限位收拢。
    ///
    /// 复合动作不是原子的：某一步失败会中止其余步骤并上报
    /// 首个错误，已移动的关节不回滚。
    pub fn extend(&self, ticks: i32) -> Result<(), ClientError> {
        let half = (f64::from(ticks) * 0.5).round() as i32;
        self.shoulder().move_relative(-half)?;
        self.elbow().move_relative(ticks)?;
        self.wrist_bend().move_relative(-half)?;
        Ok(())
    }

    /// 按逻辑 ID 设置绝对位置（透传）
    pub fn set_position(&self, id: u8, position: i32) -> Result<(), ClientError> {
        self.group.by_id(id)?.set_position(position)?;
        Ok(())
    }

    /// 按逻辑 ID 相对移动（透传）
    pub fn move_relative(&self, id: u8, offset: i32) -> Result<(), ClientError> {
        self.group.by_id(id)?.move_relative(offset)?;
        Ok(())
    }

    /// 探测某台舵机是否在线
    pub fn ping(&self, id: u8) -> Result<bool, ClientError> {
        Ok(self.group.by_id(id)?.ping()?)
    }

    /// 全部关节回默认位置（尽力而为，收集所有失败）
    pub fn reset_all(&self) -> Vec<(u8, DriverError)> {
        self.group.reset_all()
    }

    /// 所有关节的位置快照（ID → 位置）
    pub fn positions_snapshot(&self) -> Result<BTreeMap<u8, i32>, ClientError> {
        Ok(self.group.positions_snapshot()?)
    }

    /// 所有关节的遥测状态
    pub fn status_report(&self) -> Result<Vec<ServoStatus>, ClientError> {
        Ok(self.group.status_report()?)
    }

    /// 启动柔顺监视器
    pub fn start_monitor(&self) -> Result<(), ClientError> {
        self.monitor.start()
    }

    /// 停止柔顺监视器（等待环路退出）
    pub fn stop_monitor(&self) {
        self.monitor.stop()
    }

    /// 柔顺监视器是否在运行
    pub fn monitor_running(&self) -> bool {
        self.monitor.is_running()
    }
}
