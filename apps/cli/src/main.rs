//! # Starm CLI
//!
//! Command-line interface for STS bus-servo arm control.
//!
//! ```bash
//! # 扫描端口、打印全臂状态
//! starm-cli status
//!
//! # 指定端口与配置文件，移动单关节
//! starm-cli --port /dev/ttyUSB0 --config arm.toml move 4 2100
//!
//! # 运行柔顺监视器直到 Ctrl-C
//! starm-cli monitor
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use starm_client::{Arm, ArmBuilder};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Starm CLI - 总线舵机机械臂命令行工具
#[derive(Parser, Debug)]
#[command(name = "starm-cli")]
#[command(about = "Command-line interface for STS bus-servo arm control", long_about = None)]
#[command(version)]
struct Cli {
    /// 配置文件路径（TOML）
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// 串口路径（覆盖配置中的 serial.port）
    #[arg(short, long, global = true)]
    port: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 探测某台舵机是否在线
    Ping {
        /// 舵机 ID
        id: u8,
    },

    /// 打印全部关节的遥测状态
    Status,

    /// 全部关节回各自默认位置
    Reset,

    /// 移动单关节到绝对位置（超出限位时收拢）
    Move {
        /// 舵机 ID
        id: u8,
        /// 目标位置（ticks）
        position: i32,
    },

    /// 单关节相对移动
    Nudge {
        /// 舵机 ID
        id: u8,
        /// 位移量（ticks，可为负）
        #[arg(allow_hyphen_values = true)]
        offset: i32,
    },

    /// 伸展手势：肩、肘、腕弯曲联动（负值收回）
    Extend {
        /// 伸展量（ticks，可为负）
        #[arg(allow_hyphen_values = true)]
        ticks: i32,
    },

    /// 闭合夹爪
    Grab,

    /// 张开夹爪
    Release,

    /// 运行柔顺监视器直到 Ctrl-C
    Monitor,
}

fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let mut builder = ArmBuilder::new();
    if let Some(path) = cli.config {
        builder = builder.config_path(path);
    }
    if let Some(port) = cli.port {
        builder = builder.port(port);
    }
    let arm = builder.build()?;

    match cli.command {
        Commands::Ping { id } => {
            if arm.ping(id)? {
                println!("servo {id}: online");
            } else {
                println!("servo {id}: no response");
            }
        },
        Commands::Status => print_status(&arm)?,
        Commands::Reset => {
            let failures = arm.reset_all();
            if failures.is_empty() {
                println!("all joints reset to default positions");
            } else {
                for (id, e) in &failures {
                    eprintln!("servo {id}: {e}");
                }
                anyhow::bail!("{} joint(s) failed to reset", failures.len());
            }
        },
        Commands::Move { id, position } => {
            arm.set_position(id, position)?;
            println!("servo {id} -> {position}");
        },
        Commands::Nudge { id, offset } => {
            arm.move_relative(id, offset)?;
            println!("servo {id} nudged by {offset}");
        },
        Commands::Extend { ticks } => {
            arm.extend(ticks)?;
            println!("extend {ticks} done");
        },
        Commands::Grab => {
            arm.grab()?;
            println!("gripper closed");
        },
        Commands::Release => {
            arm.release()?;
            println!("gripper opened");
        },
        Commands::Monitor => run_monitor(&arm)?,
    }

    Ok(())
}

/// 打印全臂遥测表
fn print_status(arm: &Arm) -> Result<()> {
    let report = arm.status_report()?;
    println!(
        "{:>3}  {:<12} {:>8} {:>8} {:>7}",
        "ID", "NAME", "POSITION", "RANGE%", "TORQUE"
    );
    for status in report {
        println!(
            "{:>3}  {:<12} {:>8} {:>7.1}% {:>7}",
            status.id, status.name, status.position, status.range_percent, status.torque
        );
    }
    Ok(())
}

/// 前台运行柔顺监视器，Ctrl-C 后协作式停止
fn run_monitor(arm: &Arm) -> Result<()> {
    let running = Arc::new(AtomicBool::new(true));
    let flag = running.clone();
    ctrlc::set_handler(move || {
        flag.store(false, Ordering::SeqCst);
    })?;

    arm.start_monitor()?;
    println!("compliance monitor running, press Ctrl-C to stop");
    while running.load(Ordering::SeqCst) {
        std::thread::sleep(Duration::from_millis(100));
    }
    arm.stop_monitor();
    println!("compliance monitor stopped");
    Ok(())
}
