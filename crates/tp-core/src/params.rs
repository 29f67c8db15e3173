//! 参数读取
//!
//! 控制器从参数服务读取 `robot_description`、`joint_names`、`step`、
//! `input_timeout`。[`ParamSource`] 是参数服务的抽象，[`TomlParams`]
//! 是基于 TOML 表的实现。

use crate::error::ParamError;
use std::time::Duration;

/// 机器人描述文档
pub const ROBOT_DESCRIPTION: &str = "robot_description";

/// 关节名列表
pub const JOINT_NAMES: &str = "joint_names";

/// 增量模式步长
pub const STEP: &str = "step";

/// 输入超时（秒）
pub const INPUT_TIMEOUT: &str = "input_timeout";

/// 默认输入超时
pub const DEFAULT_INPUT_TIMEOUT: Duration = Duration::from_millis(250);

/// 参数服务
pub trait ParamSource {
    /// 读取字符串参数
    fn get_string(&self, name: &str) -> Result<String, ParamError>;

    /// 读取字符串列表参数
    fn get_string_list(&self, name: &str) -> Result<Vec<String>, ParamError>;

    /// 读取浮点参数（整数值也接受）
    fn get_f64(&self, name: &str) -> Result<f64, ParamError>;
}

/// 基于 TOML 表的参数源
///
/// # 示例
///
/// ```rust
/// use tp_core::params::{ParamSource, TomlParams};
///
/// let params = TomlParams::parse(r#"
///     joint_names = ["torso_lift_joint"]
///     step = 0.005
/// "#).unwrap();
///
/// assert_eq!(params.get_string_list("joint_names").unwrap(), vec!["torso_lift_joint"]);
/// assert_eq!(params.get_f64("step").unwrap(), 0.005);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TomlParams {
    table: toml::Table,
}

impl TomlParams {
    /// 创建空参数表
    pub fn new() -> Self {
        Self::default()
    }

    /// 从 TOML 文本解析
    pub fn parse(text: &str) -> Result<Self, ParamError> {
        let table: toml::Table =
            toml::from_str(text).map_err(|e| ParamError::Parse(e.to_string()))?;
        Ok(Self { table })
    }

    /// 从已有的表创建
    pub fn from_table(table: toml::Table) -> Self {
        Self { table }
    }

    /// 设置参数（覆盖已有值）
    pub fn set(&mut self, name: &str, value: impl Into<toml::Value>) {
        self.table.insert(name.to_string(), value.into());
    }

    /// 删除参数
    pub fn remove(&mut self, name: &str) -> Option<toml::Value> {
        self.table.remove(name)
    }

    fn value(&self, name: &str) -> Result<&toml::Value, ParamError> {
        self.table
            .get(name)
            .ok_or_else(|| ParamError::Missing(name.to_string()))
    }
}

impl ParamSource for TomlParams {
    fn get_string(&self, name: &str) -> Result<String, ParamError> {
        self.value(name)?
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ParamError::WrongType {
                name: name.to_string(),
                expected: "string",
            })
    }

    fn get_string_list(&self, name: &str) -> Result<Vec<String>, ParamError> {
        let wrong_type = || ParamError::WrongType {
            name: name.to_string(),
            expected: "array of strings",
        };

        self.value(name)?
            .as_array()
            .ok_or_else(wrong_type)?
            .iter()
            .map(|item| item.as_str().map(str::to_string).ok_or_else(wrong_type))
            .collect()
    }

    fn get_f64(&self, name: &str) -> Result<f64, ParamError> {
        match self.value(name)? {
            toml::Value::Float(value) => Ok(*value),
            toml::Value::Integer(value) => Ok(*value as f64),
            _ => Err(ParamError::WrongType {
                name: name.to_string(),
                expected: "float",
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_parameter() {
        let params = TomlParams::new();
        assert_eq!(
            params.get_f64(STEP),
            Err(ParamError::Missing("step".to_string()))
        );
    }

    #[test]
    fn test_integer_accepted_as_float() {
        let params = TomlParams::parse("step = 2").unwrap();
        assert_eq!(params.get_f64(STEP).unwrap(), 2.0);
    }

    #[test]
    fn test_wrong_types() {
        let params = TomlParams::parse(
            r#"
            step = "fast"
            joint_names = ["a", 3]
            robot_description = 1
            "#,
        )
        .unwrap();

        assert!(matches!(params.get_f64(STEP), Err(ParamError::WrongType { .. })));
        assert!(matches!(
            params.get_string_list(JOINT_NAMES),
            Err(ParamError::WrongType { .. })
        ));
        assert!(matches!(
            params.get_string(ROBOT_DESCRIPTION),
            Err(ParamError::WrongType { .. })
        ));
    }

    #[test]
    fn test_set_and_remove() {
        let mut params = TomlParams::new();
        params.set(ROBOT_DESCRIPTION, "[[joint]]");
        params.set(JOINT_NAMES, vec!["a".to_string(), "b".to_string()]);
        params.set(INPUT_TIMEOUT, 0.1);

        assert_eq!(params.get_string(ROBOT_DESCRIPTION).unwrap(), "[[joint]]");
        assert_eq!(params.get_string_list(JOINT_NAMES).unwrap(), vec!["a", "b"]);
        assert_eq!(params.get_f64(INPUT_TIMEOUT).unwrap(), 0.1);

        assert!(params.remove(INPUT_TIMEOUT).is_some());
        assert!(params.get_f64(INPUT_TIMEOUT).is_err());
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            TomlParams::parse("step = = 1"),
            Err(ParamError::Parse(_))
        ));
    }
}
