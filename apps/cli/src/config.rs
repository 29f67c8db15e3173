//! 运行配置
//!
//! 一个 TOML 文件描述一次仿真运行：
//!
//! ```toml
//! [controller]
//! kind = "torso"
//! description = "tiago_description.toml"   # 相对于配置文件所在目录
//!
//! [controller.params]
//! joint_names = ["torso_lift_joint"]
//! step = 0.005
//!
//! [loop]
//! frequency_hz = 100.0
//!
//! [sim]
//! tracking_gain = 0.5
//! ```

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tp_controllers::ControllerKind;
use tp_core::TomlParams;
use tp_core::control::LoopConfig;
use tp_core::params::ROBOT_DESCRIPTION;

/// 控制器配置段
#[derive(Debug, Clone, Deserialize)]
pub struct ControllerSection {
    /// 控制器类型
    pub kind: ControllerKind,

    /// 控制器名（默认取类型名）
    #[serde(default)]
    pub name: Option<String>,

    /// 机器人描述文件路径
    #[serde(default)]
    pub description: Option<PathBuf>,

    /// 控制器参数（joint_names、step、input_timeout ...）
    #[serde(default)]
    pub params: toml::Table,
}

/// 仿真硬件配置段
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimSection {
    /// 一阶跟踪增益，1.0 表示立即到位
    pub tracking_gain: f64,
}

impl Default for SimSection {
    fn default() -> Self {
        Self { tracking_gain: 1.0 }
    }
}

/// 运行配置
#[derive(Debug, Clone, Deserialize)]
pub struct RunnerConfig {
    pub controller: ControllerSection,

    #[serde(default, rename = "loop")]
    pub loop_config: LoopConfig,

    #[serde(default)]
    pub sim: SimSection,
}

impl RunnerConfig {
    /// 从文件加载
    ///
    /// 相对的描述文件路径以配置文件所在目录为基准。
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config = Self::parse(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;

        if let Some(description) = config.controller.description.as_mut()
            && description.is_relative()
            && let Some(base) = path.parent()
        {
            *description = base.join(&*description);
        }

        Ok(config)
    }

    /// 从 TOML 文本解析
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config")
    }

    /// 控制器名
    pub fn controller_name(&self) -> &str {
        self.controller
            .name
            .as_deref()
            .unwrap_or_else(|| self.controller.kind.default_name())
    }

    /// 组装控制器参数
    ///
    /// 描述文件的内容作为 `robot_description` 注入；参数表中已有内联描述时优先使用文件。
    pub fn controller_params(&self) -> Result<TomlParams> {
        let mut params = TomlParams::from_table(self.controller.params.clone());

        match &self.controller.description {
            Some(path) => {
                let description = fs::read_to_string(path).with_context(|| {
                    format!("Failed to read robot description {}", path.display())
                })?;
                params.set(ROBOT_DESCRIPTION, description);
            },
            None if self.controller.params.contains_key(ROBOT_DESCRIPTION) => {},
            None => bail!(
                "No robot description: set controller.description or controller.params.{}",
                ROBOT_DESCRIPTION
            ),
        }

        Ok(params)
    }
}
