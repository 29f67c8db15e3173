//! 控制器类型与工厂

use crate::{ArmController, GripperController, TorsoController};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tp_core::JointCommandStrategy;

/// 控制器类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControllerKind {
    Torso,
    Arm,
    Gripper,
}

impl ControllerKind {
    /// 所有类型
    pub const ALL: [ControllerKind; 3] = [Self::Torso, Self::Arm, Self::Gripper];

    /// 构造对应的控制器变体
    pub fn build(self) -> Box<dyn JointCommandStrategy> {
        match self {
            ControllerKind::Torso => Box::new(TorsoController),
            ControllerKind::Arm => Box::new(ArmController),
            ControllerKind::Gripper => Box::new(GripperController::new()),
        }
    }

    /// 默认控制器名（用于日志）
    pub fn default_name(self) -> &'static str {
        match self {
            ControllerKind::Torso => "torso",
            ControllerKind::Arm => "arm",
            ControllerKind::Gripper => "gripper",
        }
    }
}

impl fmt::Display for ControllerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.default_name())
    }
}

/// 未知的控制器类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown controller kind '{0}' (expected torso, arm or gripper)")]
pub struct ParseKindError(String);

impl FromStr for ControllerKind {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ControllerKind::ALL
            .into_iter()
            .find(|kind| kind.default_name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseKindError(s.to_string()))
    }
}
