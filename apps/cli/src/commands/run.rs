//! run 命令
//!
//! 在仿真硬件上运行控制器：标准输入作为命令源，状态打印到标准输出。

use super::Session;
use crate::bus::BusMessage;
use crate::input::spawn_stdin_reader;
use anyhow::{Context, Result};
use clap::Args;
use crossbeam_channel::{Receiver, bounded};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use tp_controllers::{COMMAND_TOPIC, ControllerKind};
use tp_core::control::run_controller;
use tracing::info;

/// 命令通道容量
const COMMAND_CAPACITY: usize = 64;

/// 控制器运行命令参数
#[derive(Args, Debug)]
pub struct RunCommand {
    /// 配置文件路径
    #[arg(short, long)]
    pub config: PathBuf,

    /// 控制器类型（覆盖配置）
    #[arg(short, long)]
    pub kind: Option<ControllerKind>,

    /// 最大迭代次数（覆盖配置）
    #[arg(short = 'n', long)]
    pub iterations: Option<usize>,

    /// 控制频率 Hz（覆盖配置）
    #[arg(short, long)]
    pub frequency: Option<f64>,

    /// 状态打印频率 Hz（0 表示不打印）
    #[arg(long, default_value_t = 10.0)]
    pub print_hz: f64,
}

impl RunCommand {
    /// 运行控制器直到 Ctrl+C、`quit` 或达到迭代次数
    pub fn execute(&self) -> Result<()> {
        let session = Session::prepare(&self.config, self.kind)?;
        let Session {
            mut config,
            mut controller,
            hardware: _hardware,
            node,
            published,
        } = session;

        if let Some(iterations) = self.iterations {
            config.loop_config.max_iterations = Some(iterations);
        }
        if let Some(frequency) = self.frequency {
            config.loop_config.frequency_hz = frequency;
        }
        config.loop_config.validate()?;

        let stop = Arc::new(AtomicBool::new(false));
        {
            let stop = Arc::clone(&stop);
            ctrlc::set_handler(move || {
                // Release: 控制线程 Acquire 读取
                stop.store(true, Ordering::Release);
            })
            .context("Failed to install Ctrl+C handler")?;
        }

        let (command_tx, command_rx) = bounded(COMMAND_CAPACITY);
        let dispatcher = node.into_dispatcher();
        let dispatch_thread = {
            let stop = Arc::clone(&stop);
            thread::Builder::new()
                .name("tp-dispatch".into())
                .spawn(move || dispatcher.run(command_rx, &stop))
                .context("Failed to spawn dispatcher thread")?
        };

        let print_hz = self.print_hz;
        let printer_thread = thread::Builder::new()
            .name("tp-state".into())
            .spawn(move || print_states(published, print_hz))
            .context("Failed to spawn state printer thread")?;

        spawn_stdin_reader(COMMAND_TOPIC, command_tx, Arc::clone(&stop))?;

        println!(
            "▶ 运行 {} 控制器，关节 {:?}（每行输入一组数值，q 退出）",
            controller.name(),
            controller.joint_names().collect::<Vec<_>>()
        );

        let stats = run_controller(&mut controller, &config.loop_config, &stop)?;
        stop.store(true, Ordering::Release);

        let final_state = controller.state().clone();
        // 释放发布器，打印线程随通道关闭退出
        drop(controller);

        let dispatched = dispatch_thread
            .join()
            .map_err(|_| anyhow::anyhow!("Dispatcher thread panicked"))?;
        let printed = printer_thread
            .join()
            .map_err(|_| anyhow::anyhow!("State printer thread panicked"))?;

        info!(
            "{} command message(s) dispatched, {} state message(s) printed",
            dispatched, printed
        );

        println!();
        println!("📊 运行结果:");
        println!("  迭代: {}", stats.iterations);
        println!("  写入命令: {}", stats.commanded);
        println!("  保持: {}", stats.held);
        println!("  Inactive: {}", stats.inactive);
        println!("  错过截止时间: {}", stats.overruns);
        println!("  最终命令: {:?}", final_state.joint_angles.as_slice());

        Ok(())
    }
}

/// 按限定频率打印状态，返回打印条数
fn print_states(rx: Receiver<BusMessage>, print_hz: f64) -> usize {
    let interval = if print_hz > 0.0 {
        Duration::try_from_secs_f64(1.0 / print_hz).ok()
    } else {
        None
    };
    let mut last_print: Option<Instant> = None;
    let mut printed = 0;

    for message in rx.iter() {
        let Some(interval) = interval else {
            continue;
        };
        let now = Instant::now();
        if last_print.is_some_and(|last| now.duration_since(last) < interval) {
            continue;
        }

        let positions: Vec<String> = message.values.iter().map(|v| format!("{:.4}", v)).collect();
        println!("[{}] {}", message.topic, positions.join(" "));
        last_print = Some(now);
        printed += 1;
    }

    printed
}
