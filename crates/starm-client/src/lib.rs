//! # Starm Client
//!
//! 机械臂客户端接口模块，提供：
//! - `Arm`：命名关节访问器与复合动作（夹取/释放、伸展/收回）
//! - `ComplianceMonitor`：后台扭矩巡检，受阻时向目标位置让步
//! - `ArmConfig`：TOML 配置（关节限位、夹爪设定点、监视器参数）
//! - `ArmBuilder`：链式构造，端口定位与启动自检
//!
//! # 使用场景
//!
//! 这是外部协作方（按键面板、视觉代理、语音播报）应该使用的模块；
//! 它们只通过这里暴露的操作访问机械臂，拿不到原始帧字节。
//! 需要直接读写寄存器的场景使用 `starm-driver`。

pub mod arm;
pub mod builder;
pub mod config;
mod error;
pub mod monitor;

pub use arm::{Arm, JointRole};
pub use builder::ArmBuilder;
pub use config::{ArmConfig, GripperSetpoints, JointConfig, MonitorConfig, SerialConfig};
pub use error::ClientError;
pub use monitor::ComplianceMonitor;

// 重新导出驱动层常用类型
pub use starm_driver::{DriverError, Servo, ServoGroup, ServoLimits, ServoStatus, Transport};
