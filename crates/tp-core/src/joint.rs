//! 关节、限位与硬件句柄
//!
//! 关节集合在初始化后顺序固定，限位、期望值向量、状态向量都按同一顺序索引。
//!
//! # 示例
//!
//! ```rust
//! use tp_core::joint::JointLimits;
//!
//! let limits = JointLimits::new(0.0, 0.35).unwrap();
//! assert_eq!(limits.clamp(0.5), 0.35);
//! assert_eq!(limits.clamp(-1.0), 0.0);
//! assert_eq!(limits.clamp(0.2), 0.2);
//! ```

use smallvec::SmallVec;

/// 关节向量内联容量
///
/// 常见的躯干/手臂/夹爪关节组都不超过此数量，控制周期内不会发生堆分配。
pub const INLINE_JOINTS: usize = 8;

/// 按关节顺序排列的数值向量
pub type JointVec = SmallVec<[f64; INLINE_JOINTS]>;

/// 关节位置限位（闭区间）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointLimits {
    lower: f64,
    upper: f64,
}

impl JointLimits {
    /// 创建限位
    ///
    /// 上下限必须为有限值且 `lower <= upper`，否则返回 `None`。
    pub fn new(lower: f64, upper: f64) -> Option<Self> {
        if lower.is_finite() && upper.is_finite() && lower <= upper {
            Some(Self { lower, upper })
        } else {
            None
        }
    }

    /// 下限
    #[inline]
    pub fn lower(&self) -> f64 {
        self.lower
    }

    /// 上限
    #[inline]
    pub fn upper(&self) -> f64 {
        self.upper
    }

    /// 将目标值饱和到限位区间内
    ///
    /// NaN 目标饱和到下限。
    #[inline]
    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.lower).min(self.upper)
    }

    /// 检查值是否在限位内
    #[inline]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }
}

/// 单个关节的硬件句柄
///
/// 硬件层在初始化成功后视为始终可用，读写不会失败。
pub trait JointHandle: Send {
    /// 读取当前位置
    fn position(&self) -> f64;

    /// 写入位置命令
    fn set_command(&mut self, command: f64);
}

/// 位置控制硬件接口
pub trait PositionJointInterface {
    /// 关节句柄类型
    type Handle: JointHandle;

    /// 按名称获取关节句柄，不存在时返回 `None`
    fn handle(&mut self, name: &str) -> Option<Self::Handle>;
}

/// 已解析的关节
#[derive(Debug)]
pub struct Joint<H> {
    name: String,
    limits: JointLimits,
    handle: H,
}

impl<H: JointHandle> Joint<H> {
    pub(crate) fn new(name: String, limits: JointLimits, handle: H) -> Self {
        Self {
            name,
            limits,
            handle,
        }
    }

    /// 关节名
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 关节限位
    pub fn limits(&self) -> JointLimits {
        self.limits
    }

    /// 当前位置
    pub fn position(&self) -> f64 {
        self.handle.position()
    }

    /// 饱和后写入命令，返回实际写入的值
    pub(crate) fn command_clamped(&mut self, raw: f64) -> f64 {
        let command = self.limits.clamp(raw);
        self.handle.set_command(command);
        command
    }
}

/// 有序关节集合
#[derive(Debug)]
pub struct JointSet<H> {
    joints: Vec<Joint<H>>,
}

impl<H: JointHandle> JointSet<H> {
    pub(crate) fn new(joints: Vec<Joint<H>>) -> Self {
        Self { joints }
    }

    /// 关节数量
    pub fn len(&self) -> usize {
        self.joints.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    /// 迭代器
    pub fn iter(&self) -> std::slice::Iter<'_, Joint<H>> {
        self.joints.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> std::slice::IterMut<'_, Joint<H>> {
        self.joints.iter_mut()
    }

    /// 按关节顺序读取所有位置（复用 `out` 的存储）
    pub fn read_positions(&self, out: &mut JointVec) {
        out.clear();
        out.extend(self.joints.iter().map(Joint::position));
    }
}
