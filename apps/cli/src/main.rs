//! # tp-cli
//!
//! 遥操作关节控制器的命令行工具，在仿真硬件上运行躯干、手臂或夹爪控制器。
//!
//! ```bash
//! # 检查配置
//! tp-cli check --config apps/cli/config/torso.toml
//!
//! # 运行：每行输入一组数值作为命令，q 退出
//! tp-cli run --config apps/cli/config/arm.toml --frequency 50
//! ```
//!
//! 日志级别通过 `RUST_LOG` 调整，例如 `RUST_LOG=tp_core=debug`。

use anyhow::Result;
use clap::{Parser, Subcommand};

mod bus;
mod commands;
mod config;
mod input;

use commands::{CheckCommand, RunCommand};

/// tp-cli - 遥操作关节控制器命令行工具
#[derive(Parser, Debug)]
#[command(name = "tp-cli")]
#[command(about = "Run teleoperation joint controllers against simulated hardware", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 运行控制器
    Run {
        #[command(flatten)]
        args: RunCommand,
    },

    /// 检查配置并初始化控制器
    Check {
        #[command(flatten)]
        args: CheckCommand,
    },
}

fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("tp_cli=info".parse()?)
                .add_directive("tp_core=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { args } => args.execute(),
        Commands::Check { args } => args.execute(),
    }
}
