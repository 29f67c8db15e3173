//! check 命令
//!
//! 加载配置并初始化控制器，打印关节、限位和模式，不运行控制循环。

use super::Session;
use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use tp_controllers::ControllerKind;

/// 配置检查命令参数
#[derive(Args, Debug)]
pub struct CheckCommand {
    /// 配置文件路径
    #[arg(short, long)]
    pub config: PathBuf,

    /// 控制器类型（覆盖配置）
    #[arg(short, long)]
    pub kind: Option<ControllerKind>,
}

impl CheckCommand {
    /// 执行检查
    pub fn execute(&self) -> Result<()> {
        let session = Session::prepare(&self.config, self.kind)?;
        let controller = &session.controller;

        println!("✅ {} 控制器初始化成功", controller.name());
        println!("  类型: {}", session.config.controller.kind);
        println!("  模式: {}", controller.mode());
        if let Some(step) = controller.step() {
            println!("  步长: {}", step);
        }
        println!("  输入超时: {:?}", controller.input_timeout());
        println!(
            "  控制频率: {} Hz",
            session.config.loop_config.frequency_hz
        );
        println!("  关节:");
        for ((name, limits), position) in controller
            .joint_names()
            .zip(controller.limits())
            .zip(controller.state().joint_angles.iter())
        {
            println!(
                "    {:<32} [{:>8.4}, {:>8.4}]  当前 {:.4}",
                name,
                limits.lower(),
                limits.upper(),
                position
            );
        }

        session.config.loop_config.validate()?;
        Ok(())
    }
}
