//! # Starm Driver
//!
//! 驱动层模块，提供：
//! - 寄存器传输（Transport：独占串口，按交换串行化所有调用方）
//! - 单关节抽象（Servo：行程限位、位置/扭矩遥测）
//! - 多舵机编组（ServoGroup：按下标/逻辑 ID 查找、批量复位、位置快照）
//!
//! # 数据流
//!
//! ```text
//! starm-protocol (编解码)
//!     ↓
//! Transport (一次加锁 = 一次请求/应答交换)
//!     ↓
//! Servo / ServoGroup (类型化访问器，不复制连接状态)
//! ```
//!
//! 舵机位置状态只存在于物理设备上；`Servo` 不持有可变位置缓存。

mod error;
pub mod group;
pub mod servo;
pub mod transport;

pub use error::DriverError;
pub use group::{ServoGroup, ServoStatus};
pub use servo::{Servo, ServoLimits};
pub use transport::{DEFAULT_READ_TIMEOUT, Session, Transport};
