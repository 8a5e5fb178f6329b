//! 柔顺监视器
//!
//! 后台环路轮询每台舵机的扭矩；超过阈值时读取当前/目标位置，
//! 向目标方向让步一个步长（写入仍受该舵机自身限位收拢）。
//! 这让关节在受到外力时"软"下来，而不是硬抗。
//!
//! # 状态机
//!
//! `Idle` --start--> `Running` --stop--> `Idle`。
//! 停止是协作式的：通过 channel 发信号并等待环路自行退出，
//! 从不强制终止。信号在每个周期顶部和周期间休眠中被观察，
//! 最坏停止延迟为一个巡检周期加上该周期内全部舵机的传输耗时。
//!
//! # 失败语义
//!
//! 单台舵机单个周期内的任何读取失败只是跳过该舵机
//! （不重试、不升级）：瞬时故障不允许中断安全环路。

use crate::config::MonitorConfig;
use crate::error::ClientError;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use starm_driver::ServoGroup;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};

enum MonitorState {
    Idle,
    Running {
        stop_tx: Sender<()>,
        handle: JoinHandle<()>,
    },
}

/// 柔顺监视器
pub struct ComplianceMonitor {
    group: Arc<ServoGroup>,
    config: MonitorConfig,
    state: Mutex<MonitorState>,
}

impl ComplianceMonitor {
    pub fn new(group: Arc<ServoGroup>, config: MonitorConfig) -> Self {
        Self {
            group,
            config,
            state: Mutex::new(MonitorState::Idle),
        }
    }

    /// 是否处于 Running 状态
    pub fn is_running(&self) -> bool {
        matches!(*self.state.lock(), MonitorState::Running { .. })
    }

    /// 启动巡检环路（已在运行时为空操作）
    pub fn start(&self) -> Result<(), ClientError> {
        let mut state = self.state.lock();
        if matches!(*state, MonitorState::Running { .. }) {
            debug!("compliance monitor already running");
            return Ok(());
        }

        let (stop_tx, stop_rx) = crossbeam_channel::bounded(1);
        let group = self.group.clone();
        let config = self.config.clone();
        let handle = std::thread::Builder::new()
            .name("compliance-monitor".into())
            .spawn(move || monitor_loop(group, config, stop_rx))
            .map_err(ClientError::Io)?;

        *state = MonitorState::Running { stop_tx, handle };
        Ok(())
    }

    /// 停止巡检环路并等待线程退出（未运行时为空操作）
    pub fn stop(&self) {
        let previous = {
            let mut state = self.state.lock();
            std::mem::replace(&mut *state, MonitorState::Idle)
        };
        if let MonitorState::Running { stop_tx, handle } = previous {
            // 环路可能已经因通道关闭退出，发送失败无妨
            let _ = stop_tx.send(());
            if handle.join().is_err() {
                error!("compliance monitor thread panicked");
            }
        }
    }
}

impl Drop for ComplianceMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

fn monitor_loop(group: Arc<ServoGroup>, config: MonitorConfig, stop_rx: Receiver<()>) {
    let poll_interval = Duration::from_millis(config.poll_interval_ms);
    info!(
        threshold = config.torque_threshold,
        step = config.adjustment_step,
        "compliance monitor started"
    );
    loop {
        run_cycle(&group, &config);
        // 周期间休眠兼作停止检查：收到信号或发送端消失即退出
        match stop_rx.recv_timeout(poll_interval) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {},
        }
    }
    info!("compliance monitor stopped");
}

/// 执行一个巡检周期（每台舵机依次处理）
pub(crate) fn run_cycle(group: &ServoGroup, config: &MonitorConfig) {
    for servo in group.iter() {
        let torque = match servo.current_torque() {
            Ok(torque) => torque,
            Err(e) => {
                trace!(id = servo.id(), "torque read failed, skipping: {e}");
                continue;
            },
        };
        if torque <= config.torque_threshold {
            continue;
        }

        let current = match servo.current_position() {
            Ok(position) => position,
            Err(e) => {
                trace!(id = servo.id(), "position read failed, skipping: {e}");
                continue;
            },
        };
        let target = match servo.target_position() {
            Ok(position) => position,
            Err(e) => {
                trace!(id = servo.id(), "target read failed, skipping: {e}");
                continue;
            },
        };

        let direction = if target > current { 1 } else { -1 };
        let nudged = current + direction * config.adjustment_step;
        debug!(
            id = servo.id(),
            torque, current, target, nudged, "yielding under load"
        );
        if let Err(e) = servo.set_position(nudged) {
            warn!(id = servo.id(), "compliance nudge failed: {e}");
        }
    }
}
