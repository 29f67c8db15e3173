//! 机器人描述
//!
//! 控制器只需要从描述中取得每个关节的位置限位。描述文档的格式由
//! [`DescriptionParser`] 决定；内置的 [`TomlDescriptionParser`] 读取如下格式：
//!
//! ```toml
//! name = "tiago"
//!
//! [[joint]]
//! name = "torso_lift_joint"
//! lower = 0.0
//! upper = 0.35
//! initial_position = 0.15
//! ```

use crate::error::DescriptionError;
use crate::joint::JointLimits;
use serde::Deserialize;

/// 单个关节的描述
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct JointDescription {
    /// 关节名
    pub name: String,
    /// 位置下限
    pub lower: f64,
    /// 位置上限
    pub upper: f64,
    /// 仿真初始位置（可选）
    #[serde(default)]
    pub initial_position: Option<f64>,
}

/// 机器人描述
#[derive(Debug, Clone, Default)]
pub struct RobotDescription {
    name: Option<String>,
    joints: Vec<JointDescription>,
}

impl RobotDescription {
    /// 创建描述，检查关节名唯一与限位有效
    pub fn new(
        name: Option<String>,
        joints: Vec<JointDescription>,
    ) -> Result<Self, DescriptionError> {
        for (i, joint) in joints.iter().enumerate() {
            if joints[..i].iter().any(|other| other.name == joint.name) {
                return Err(DescriptionError::DuplicateJoint(joint.name.clone()));
            }
            if JointLimits::new(joint.lower, joint.upper).is_none() {
                return Err(DescriptionError::InvalidLimits {
                    joint: joint.name.clone(),
                    lower: joint.lower,
                    upper: joint.upper,
                });
            }
        }

        Ok(Self { name, joints })
    }

    /// 机器人名称
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// 所有关节
    pub fn joints(&self) -> &[JointDescription] {
        &self.joints
    }

    /// 按名称查找关节
    pub fn joint(&self, name: &str) -> Option<&JointDescription> {
        self.joints.iter().find(|joint| joint.name == name)
    }

    /// 按名称查找关节限位
    pub fn limits(&self, name: &str) -> Option<JointLimits> {
        self.joint(name)
            .and_then(|joint| JointLimits::new(joint.lower, joint.upper))
    }
}

/// 描述文档解析器
pub trait DescriptionParser: Send + Sync {
    /// 解析描述文档
    fn parse(&self, document: &str) -> Result<RobotDescription, DescriptionError>;
}

/// TOML 格式的描述解析器
#[derive(Debug, Clone, Copy, Default)]
pub struct TomlDescriptionParser;

#[derive(Deserialize)]
struct DescriptionDocument {
    #[serde(default)]
    name: Option<String>,
    #[serde(default, rename = "joint")]
    joints: Vec<JointDescription>,
}

impl DescriptionParser for TomlDescriptionParser {
    fn parse(&self, document: &str) -> Result<RobotDescription, DescriptionError> {
        let doc: DescriptionDocument =
            toml::from_str(document).map_err(|e| DescriptionError::Parse(e.to_string()))?;
        RobotDescription::new(doc.name, doc.joints)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIAGO: &str = r#"
        name = "tiago"

        [[joint]]
        name = "torso_lift_joint"
        lower = 0.0
        upper = 0.35
        initial_position = 0.15

        [[joint]]
        name = "arm_1_joint"
        lower = 0.07
        upper = 2.68
    "#;

    #[test]
    fn test_parse_description() {
        let desc = TomlDescriptionParser.parse(TIAGO).unwrap();
        assert_eq!(desc.name(), Some("tiago"));
        assert_eq!(desc.joints().len(), 2);

        let limits = desc.limits("torso_lift_joint").unwrap();
        assert_eq!(limits.lower(), 0.0);
        assert_eq!(limits.upper(), 0.35);
        assert_eq!(
            desc.joint("torso_lift_joint").unwrap().initial_position,
            Some(0.15)
        );
        assert_eq!(desc.joint("arm_1_joint").unwrap().initial_position, None);
        assert!(desc.limits("head_1_joint").is_none());
    }

    #[test]
    fn test_unparseable_description() {
        let err = TomlDescriptionParser.parse("<robot name=\"tiago\">").unwrap_err();
        assert!(matches!(err, DescriptionError::Parse(_)));
    }

    #[test]
    fn test_missing_limits_is_parse_error() {
        let err = TomlDescriptionParser
            .parse("[[joint]]\nname = \"a\"\nlower = 0.0\n")
            .unwrap_err();
        assert!(matches!(err, DescriptionError::Parse(_)));
    }

    #[test]
    fn test_inverted_limits_rejected() {
        let err = TomlDescriptionParser
            .parse("[[joint]]\nname = \"a\"\nlower = 1.0\nupper = 0.0\n")
            .unwrap_err();
        assert!(matches!(err, DescriptionError::InvalidLimits { .. }));
    }

    #[test]
    fn test_duplicate_joint_rejected() {
        let doc = "[[joint]]\nname = \"a\"\nlower = 0.0\nupper = 1.0\n\
                   [[joint]]\nname = \"a\"\nlower = 0.0\nupper = 2.0\n";
        let err = TomlDescriptionParser.parse(doc).unwrap_err();
        assert_eq!(err, DescriptionError::DuplicateJoint("a".into()));
    }

    #[test]
    fn test_empty_document_has_no_joints() {
        let desc = TomlDescriptionParser.parse("").unwrap();
        assert!(desc.joints().is_empty());
        assert!(desc.name().is_none());
    }
}
