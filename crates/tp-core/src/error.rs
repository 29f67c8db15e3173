//! 控制器错误类型定义
//!
//! 初始化阶段的错误都是致命的：控制器不会以部分初始化的状态运行。
//! 运行期的软错误（输入超时、期望值长度不符）不会出现在这里，
//! 它们在 `update()` 内部被吸收为 Inactive / 保持上一条命令。

use thiserror::Error;

/// 参数读取错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParamError {
    /// 参数不存在
    #[error("Parameter '{0}' not found")]
    Missing(String),

    /// 参数类型不符
    #[error("Parameter '{name}' has wrong type (expected {expected})")]
    WrongType {
        /// 参数名
        name: String,
        /// 期望的类型
        expected: &'static str,
    },

    /// 参数文档无法解析
    #[error("Failed to parse parameters: {0}")]
    Parse(String),
}

/// 机器人描述解析错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DescriptionError {
    /// 文档无法解析
    #[error("Failed to parse robot description: {0}")]
    Parse(String),

    /// 同名关节出现多次
    #[error("Duplicate joint '{0}' in robot description")]
    DuplicateJoint(String),

    /// 关节限位无效（非有限值或下限大于上限）
    #[error("Invalid limits for joint '{joint}': [{lower}, {upper}]")]
    InvalidLimits {
        /// 关节名
        joint: String,
        /// 下限
        lower: f64,
        /// 上限
        upper: f64,
    },
}

/// 初始化错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InitError {
    /// 缺少 robot_description 参数
    #[error("Could not find robot_description: {0}")]
    MissingDescription(ParamError),

    /// robot_description 无法解析
    #[error(transparent)]
    InvalidDescription(#[from] DescriptionError),

    /// 缺少 joint_names 参数
    #[error("Could not retrieve joint names: {0}")]
    MissingJointNames(ParamError),

    /// joint_names 为空
    #[error("Joint name list is empty")]
    EmptyJointNames,

    /// joint_names 中有重复项
    #[error("Joint {0} is listed more than once")]
    DuplicateJoint(String),

    /// 增量模式下缺少 step 参数
    #[error("Could not retrieve step: {0}")]
    MissingStep(ParamError),

    /// 参数值无效
    #[error("Invalid parameter '{param}': {reason}")]
    InvalidParameter {
        /// 参数名
        param: String,
        /// 原因
        reason: String,
    },

    /// 机器人描述中找不到关节
    #[error("Could not retrieve joint {0} from robot description")]
    UnknownJoint(String),

    /// 硬件接口中找不到关节
    #[error("Could not acquire hardware handle for joint {0}")]
    MissingHandle(String),

    /// 控制器自定义初始化失败
    #[error("Controller setup failed: {0}")]
    Setup(String),
}
