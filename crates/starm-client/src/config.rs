//! 机械臂配置
//!
//! 关节 ID 与行程限位、夹爪设定点、串口参数、柔顺监视器参数。
//! 默认值对应 6 关节 STS 舵机臂的出厂装配；全部可由 TOML 覆盖。
//!
//! ```toml
//! [serial]
//! port = "/dev/ttyUSB0"
//! baud_rate = 1000000
//! timeout_ms = 1000
//!
//! [monitor]
//! torque_threshold = 13
//! adjustment_step = 1
//! poll_interval_ms = 100
//!
//! [gripper_setpoints]
//! open = 2000
//! closed = 1400
//!
//! [shoulder]
//! id = 5
//! min_pos = 900
//! max_pos = 3000
//! default_pos = 1950
//! ```

use crate::error::ClientError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 单个关节的装配参数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JointConfig {
    /// 总线逻辑 ID
    pub id: u8,
    pub min_pos: i32,
    pub max_pos: i32,
    pub default_pos: i32,
}

/// 串口参数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// 指定端口；缺省时顺序扫描候选端口
    pub port: Option<String>,
    pub baud_rate: u32,
    /// 单次交换的读超时（毫秒）
    pub timeout_ms: u64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: 1_000_000,
            timeout_ms: 1_000,
        }
    }
}

/// 柔顺监视器参数
///
/// 阈值与步长是配置输入而非硬编码常量。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// 触发让步的扭矩阈值
    pub torque_threshold: i32,
    /// 每次让步的位置步长（刻度）
    pub adjustment_step: i32,
    /// 巡检周期（毫秒）
    pub poll_interval_ms: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            torque_threshold: 13,
            adjustment_step: 1,
            poll_interval_ms: 100,
        }
    }
}

/// 夹爪开合设定点（设备相关常量，装配时标定）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GripperSetpoints {
    pub open: i32,
    pub closed: i32,
}

impl Default for GripperSetpoints {
    fn default() -> Self {
        Self {
            open: 2000,
            closed: 1400,
        }
    }
}

/// 机械臂整体配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArmConfig {
    pub serial: SerialConfig,
    pub monitor: MonitorConfig,
    pub gripper_setpoints: GripperSetpoints,
    pub gripper: JointConfig,
    pub wrist_rotate: JointConfig,
    pub wrist_bend: JointConfig,
    pub elbow: JointConfig,
    pub shoulder: JointConfig,
    pub base: JointConfig,
}

impl Default for ArmConfig {
    fn default() -> Self {
        Self {
            serial: SerialConfig::default(),
            monitor: MonitorConfig::default(),
            gripper_setpoints: GripperSetpoints::default(),
            // 出厂装配：夹爪 2000 开 / 1400 合；手腕旋转留线缆余量
            gripper: JointConfig {
                id: 1,
                min_pos: 1400,
                max_pos: 2000,
                default_pos: 2000,
            },
            wrist_rotate: JointConfig {
                id: 2,
                min_pos: 0,
                max_pos: 2700,
                default_pos: 1350,
            },
            wrist_bend: JointConfig {
                id: 3,
                min_pos: 1000,
                max_pos: 3200,
                default_pos: 2100,
            },
            elbow: JointConfig {
                id: 4,
                min_pos: 1000,
                max_pos: 3200,
                default_pos: 2100,
            },
            shoulder: JointConfig {
                id: 5,
                min_pos: 900,
                max_pos: 3000,
                default_pos: 1950,
            },
            base: JointConfig {
                id: 6,
                min_pos: 600,
                max_pos: 3300,
                default_pos: 1950,
            },
        }
    }
}

impl ArmConfig {
    /// 从 TOML 文件加载配置（缺失字段取默认值）
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let text = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }
}
