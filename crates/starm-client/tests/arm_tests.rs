//! Arm 协调层集成测试
//!
//! 全部运行在总线仿真上（`starm-serial` 的 `mock` feature），
//! 覆盖协作方可见的操作面：复合手势、透传命令、启动自检、
//! 柔顺监视器的端到端生命周期。

use starm_client::{Arm, ArmBuilder, ArmConfig, ClientError, DriverError};
use starm_protocol::Register;
use starm_serial::SimulatedBus;
use std::time::Duration;

fn arm_with_sim() -> (SimulatedBus, Arm) {
    let sim = SimulatedBus::new();
    for id in 1..=6 {
        sim.add_servo(id);
    }
    let mut config = ArmConfig::default();
    config.monitor.poll_interval_ms = 10;
    let arm = ArmBuilder::new()
        .config(config)
        .bus(Box::new(sim.clone()))
        .build()
        .expect("arm build failed");
    (sim, arm)
}

#[test]
fn test_builder_rejects_unresponsive_gripper() {
    let sim = SimulatedBus::new();
    // 总线上没有任何舵机：夹爪自检必须失败
    let err = ArmBuilder::new()
        .config(ArmConfig::default())
        .bus(Box::new(sim))
        .build()
        .unwrap_err();
    assert!(matches!(err, ClientError::Config(_)));
}

#[test]
fn test_grab_and_release_use_configured_setpoints() {
    let (sim, arm) = arm_with_sim();

    arm.grab().unwrap();
    assert_eq!(sim.register_u16(1, Register::TargetPosition), 1400);

    arm.release().unwrap();
    assert_eq!(sim.register_u16(1, Register::TargetPosition), 2000);
}

#[test]
fn test_extend_issues_scaled_relative_moves() {
    let (sim, arm) = arm_with_sim();
    for id in [3, 4, 5] {
        sim.set_register_u16(id, Register::CurrentPosition, 2000);
    }

    arm.extend(100).unwrap();

    // 肩 -50、肘 +100、腕弯曲 -50
    assert_eq!(sim.register_u16(5, Register::TargetPosition), 1950);
    assert_eq!(sim.register_u16(4, Register::TargetPosition), 2100);
    assert_eq!(sim.register_u16(3, Register::TargetPosition), 1950);
}

#[test]
fn test_extend_aborts_after_first_failure_without_rollback() {
    let (sim, arm) = arm_with_sim();
    for id in [3, 4, 5] {
        sim.set_register_u16(id, Register::CurrentPosition, 2000);
        sim.set_register_u16(id, Register::TargetPosition, 2000);
    }
    // 肘（第二步）掉线：肩已动、腕不再动
    sim.set_responding(4, false);

    let err = arm.extend(100).unwrap_err();
    assert!(matches!(err, ClientError::Driver(DriverError::Timeout)));

    assert_eq!(sim.register_u16(5, Register::TargetPosition), 1950);
    assert_eq!(sim.register_u16(3, Register::TargetPosition), 2000);
}

#[test]
fn test_pass_through_commands_clamp_at_the_servo() {
    let (sim, arm) = arm_with_sim();

    // 夹爪限位 1400..2000：越界请求静默收拢
    arm.set_position(1, 5000).unwrap();
    assert_eq!(sim.register_u16(1, Register::TargetPosition), 2000);

    sim.set_register_u16(6, Register::CurrentPosition, 700);
    arm.move_relative(6, -500).unwrap();
    assert_eq!(sim.register_u16(6, Register::TargetPosition), 600);
}

#[test]
fn test_unknown_id_reports_not_found() {
    let (_sim, arm) = arm_with_sim();
    let err = arm.set_position(42, 1000).unwrap_err();
    assert!(matches!(
        err,
        ClientError::Driver(DriverError::ServoNotFound { id: 42 })
    ));
}

#[test]
fn test_ping_surface() {
    let (sim, arm) = arm_with_sim();
    assert!(arm.ping(6).unwrap());
    sim.set_responding(6, false);
    assert!(!arm.ping(6).unwrap());
}

#[test]
fn test_positions_snapshot_maps_ids() {
    let (sim, arm) = arm_with_sim();
    for id in 1..=6u8 {
        sim.set_register_u16(id, Register::CurrentPosition, 1000 + u16::from(id) * 100);
    }
    let snapshot = arm.positions_snapshot().unwrap();
    assert_eq!(snapshot.len(), 6);
    assert_eq!(snapshot[&2], 1200);
    assert_eq!(snapshot[&6], 1600);
}

#[test]
fn test_reset_all_collects_failures_but_resets_the_rest() {
    let (sim, arm) = arm_with_sim();
    sim.set_responding(3, false);

    let failures = arm.reset_all();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0, 3);

    // 其余关节回到各自默认位置
    assert_eq!(sim.register_u16(1, Register::TargetPosition), 2000);
    assert_eq!(sim.register_u16(5, Register::TargetPosition), 1950);
}

#[test]
fn test_monitor_end_to_end_yields_under_load() {
    let (sim, arm) = arm_with_sim();
    // 底座受阻：扭矩超阈值，目标在当前位置之上
    sim.set_register_u16(6, Register::CurrentCurrent, 20);
    sim.set_register_u16(6, Register::CurrentPosition, 1000);
    sim.set_register_u16(6, Register::TargetPosition, 1400);

    arm.start_monitor().unwrap();
    assert!(arm.monitor_running());
    std::thread::sleep(Duration::from_millis(50));
    arm.stop_monitor();
    assert!(!arm.monitor_running());

    // 当前位置不变（仿真不积分运动），让步写入收敛在 current + step
    assert_eq!(sim.register_u16(6, Register::TargetPosition), 1001);
}
