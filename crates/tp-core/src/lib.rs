//! # tp-core
//!
//! 遥操作关节位置控制器核心。
//!
//! 控制器在外部实时调度器提供的固定周期内运行：读取关节位置、根据外部命令流的
//! 新鲜度决定是否 Active、计算目标（绝对或按步长增量）、饱和到关节限位、写回硬件。
//!
//! # 模块
//!
//! - [`controller`]: 生命周期与每周期更新状态机
//! - [`strategy`]: 控制器变体接口（躯干、手臂、夹爪）
//! - [`mailbox`]: 消息线程与控制线程之间的输入交接
//! - [`joint`] / [`description`] / [`params`] / [`node`]: 宿主环境的抽象
//! - [`control`]: 固定频率控制循环
//! - [`sim`]: 仿真硬件与回环节点

pub mod control;
pub mod controller;
pub mod description;
mod error;
pub mod joint;
pub mod mailbox;
pub mod mode;
pub mod node;
pub mod params;
pub mod sim;
pub mod strategy;

pub use controller::{ControllerBuilder, ControllerState, CycleOutcome, JointController};
pub use description::{DescriptionParser, RobotDescription, TomlDescriptionParser};
pub use error::{DescriptionError, InitError, ParamError};
pub use joint::{JointHandle, JointLimits, JointVec, PositionJointInterface};
pub use mailbox::{InputSink, PendingInput};
pub use mode::ControlMode;
pub use node::{InputCallback, Node, StatePublisher};
pub use params::{ParamSource, TomlParams};
pub use strategy::{JointCommandStrategy, SetupContext};
