//! 控制模式定义
//!
//! - **Absolute**: 期望值即目标位置（饱和后写入）
//! - **Incremental**: 期望值为每周期增量，乘以固定步长后叠加到本周期读取的位置上

use serde::Deserialize;
use std::fmt;

/// 控制模式（由控制器变体声明）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlMode {
    /// 绝对模式（默认）
    #[default]
    Absolute,

    /// 增量模式，需要 `step` 参数
    Incremental,
}

impl ControlMode {
    /// 是否为增量模式
    pub fn is_incremental(self) -> bool {
        self == Self::Incremental
    }

    /// 是否为绝对模式
    pub fn is_absolute(self) -> bool {
        self == Self::Absolute
    }
}

impl fmt::Display for ControlMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlMode::Absolute => write!(f, "absolute"),
            ControlMode::Incremental => write!(f, "incremental"),
        }
    }
}

/// 初始化后确定的目标计算规则
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum CommandLaw {
    Absolute,
    Incremental { step: f64 },
}

impl CommandLaw {
    /// 计算饱和前的原始目标
    #[inline]
    pub(crate) fn raw_target(self, current: f64, desired: f64) -> f64 {
        match self {
            CommandLaw::Absolute => desired,
            CommandLaw::Incremental { step } => current + step * desired,
        }
    }

    pub(crate) fn mode(self) -> ControlMode {
        match self {
            CommandLaw::Absolute => ControlMode::Absolute,
            CommandLaw::Incremental { .. } => ControlMode::Incremental,
        }
    }
}
