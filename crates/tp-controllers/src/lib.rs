//! # tp-controllers
//!
//! 基于 [`tp_core`] 的遥操作控制器变体：
//!
//! - [`TorsoController`]: 增量模式，每条消息一个整数步数
//! - [`ArmController`]: 绝对模式，直接给出各关节目标
//! - [`GripperController`]: 绝对模式，1~2 个手指关节，激活时保持当前姿态
//!
//! 所有变体都在 [`COMMAND_TOPIC`] 上接收命令。[`ControllerKind`] 按名称构造变体，
//! 供配置文件和命令行使用。

mod arm;
mod gripper;
mod kind;
mod torso;

pub use arm::ArmController;
pub use gripper::{GripperController, MAX_FINGERS};
pub use kind::{ControllerKind, ParseKindError};
pub use torso::TorsoController;

/// 命令话题
pub const COMMAND_TOPIC: &str = "command";
