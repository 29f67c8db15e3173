//! 命令定义和实现

pub mod check;
pub mod run;

pub use check::CheckCommand;
pub use run::RunCommand;

use crate::bus::{BusMessage, ChannelNode};
use crate::config::RunnerConfig;
use anyhow::{Context, Result};
use crossbeam_channel::Receiver;
use std::path::Path;
use tp_controllers::ControllerKind;
use tp_core::params::ROBOT_DESCRIPTION;
use tp_core::sim::{SimJointHandle, SimulatedJoints};
use tp_core::{
    ControllerBuilder, DescriptionParser, JointCommandStrategy, JointController, ParamSource,
    TomlDescriptionParser,
};

/// 发布通道容量（约 1 秒的 100Hz 状态）
const PUBLISHED_CAPACITY: usize = 128;

pub type SimController = JointController<SimJointHandle, Box<dyn JointCommandStrategy>>;

/// 已初始化的仿真会话
pub struct Session {
    pub config: RunnerConfig,
    pub controller: SimController,
    pub hardware: SimulatedJoints,
    pub node: ChannelNode,
    pub published: Receiver<BusMessage>,
}

impl Session {
    /// 加载配置并初始化控制器
    ///
    /// 仿真硬件按机器人描述创建，`kind` 覆盖配置文件中的控制器类型。
    pub fn prepare(path: &Path, kind: Option<ControllerKind>) -> Result<Self> {
        let mut config = RunnerConfig::load(path)?;
        if let Some(kind) = kind {
            config.controller.kind = kind;
        }

        let params = config.controller_params()?;
        let description = TomlDescriptionParser
            .parse(&params.get_string(ROBOT_DESCRIPTION)?)
            .context("Failed to parse robot description")?;

        let mut hardware = SimulatedJoints::from_description(&description)
            .with_tracking_gain(config.sim.tracking_gain);
        let (mut node, published) = ChannelNode::new(params, PUBLISHED_CAPACITY);

        let kind = config.controller.kind;
        let controller = ControllerBuilder::new(config.controller_name())
            .init(kind.build(), &mut hardware, &mut node)
            .with_context(|| format!("Failed to initialize {} controller", kind))?;

        Ok(Self {
            config,
            controller,
            hardware,
            node,
            published,
        })
    }
}
