//! JointCommandStrategy trait - 控制器变体接口
//!
//! 控制骨架（读取 → 发布 → 活跃判定 → 计算 → 饱和 → 写入）由
//! [`JointController`](crate::JointController) 固定实现，
//! 各变体（躯干、手臂、夹爪）只需实现此 trait 提供的几个钩子。
//!
//! # 生命周期
//!
//! - **初始化**: `mode()` → `setup()` → `subscribe()`
//! - **激活**: 从 Inactive 进入 Active 的第一个周期调用 `on_activate()`
//! - **运行**: Active 期间每周期调用 `compute_desired()`
//!
//! # 示例
//!
//! ```rust
//! use tp_core::{ControlMode, InitError, InputSink, JointCommandStrategy, Node};
//!
//! struct Passthrough;
//!
//! impl JointCommandStrategy for Passthrough {
//!     fn mode(&self) -> ControlMode {
//!         ControlMode::Absolute
//!     }
//!
//!     fn subscribe(&mut self, node: &mut dyn Node, sink: InputSink) -> Result<(), InitError> {
//!         node.subscribe("command", Box::new(move |values: &[f64]| sink.accept_now(values)));
//!         Ok(())
//!     }
//! }
//! ```

use crate::description::RobotDescription;
use crate::error::InitError;
use crate::joint::JointVec;
use crate::mailbox::InputSink;
use crate::mode::ControlMode;
use crate::node::Node;
use crate::params::ParamSource;
use std::time::Duration;

/// `setup()` 可见的初始化上下文
pub struct SetupContext<'a> {
    /// 控制器名
    pub name: &'a str,
    /// 参数源
    pub params: &'a dyn ParamSource,
    /// 已解析的机器人描述
    pub description: &'a RobotDescription,
    /// 按控制顺序排列的关节名
    pub joint_names: &'a [String],
    /// 初始化时读取的关节位置
    pub initial_positions: &'a [f64],
}

/// 控制器变体接口
pub trait JointCommandStrategy: Send {
    /// 控制模式
    ///
    /// 增量模式会在初始化时要求 `step` 参数。
    fn mode(&self) -> ControlMode;

    /// 变体自定义初始化（可选）
    ///
    /// 返回错误时整个初始化失败，不会注册任何订阅或发布。
    fn setup(&mut self, ctx: &SetupContext<'_>) -> Result<(), InitError> {
        let _ = ctx;
        Ok(())
    }

    /// 注册命令订阅
    ///
    /// 回调应将收到的数值通过 `sink` 投递给控制器。
    fn subscribe(&mut self, node: &mut dyn Node, sink: InputSink) -> Result<(), InitError>;

    /// 计算本周期的期望值
    ///
    /// # 参数
    ///
    /// - `period`: 控制周期
    /// - `current`: 本周期读取的关节位置
    /// - `input`: 邮箱中最近一次输入的快照
    /// - `desired`: 输出缓冲区（调用前已清空）
    ///
    /// # 返回
    ///
    /// 没有可用数据时返回 `false`，本周期不写命令。
    /// `desired` 长度与关节数不符时同样不写命令。
    ///
    /// 默认实现直接透传输入。
    fn compute_desired(
        &mut self,
        period: Duration,
        current: &[f64],
        input: &[f64],
        desired: &mut JointVec,
    ) -> bool {
        let _ = (period, current);
        desired.extend_from_slice(input);
        !input.is_empty()
    }

    /// 进入 Active 时调用（可选）
    ///
    /// `positions` 是同一周期读取的真实位置，用于重置内部积分/滤波状态。
    fn on_activate(&mut self, positions: &[f64]) {
        let _ = positions;
    }
}

impl<S: JointCommandStrategy + ?Sized> JointCommandStrategy for Box<S> {
    fn mode(&self) -> ControlMode {
        (**self).mode()
    }

    fn setup(&mut self, ctx: &SetupContext<'_>) -> Result<(), InitError> {
        (**self).setup(ctx)
    }

    fn subscribe(&mut self, node: &mut dyn Node, sink: InputSink) -> Result<(), InitError> {
        (**self).subscribe(node, sink)
    }

    fn compute_desired(
        &mut self,
        period: Duration,
        current: &[f64],
        input: &[f64],
        desired: &mut JointVec,
    ) -> bool {
        (**self).compute_desired(period, current, input, desired)
    }

    fn on_activate(&mut self, positions: &[f64]) {
        (**self).on_activate(positions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop;

    impl JointCommandStrategy for Noop {
        fn mode(&self) -> ControlMode {
            ControlMode::Incremental
        }

        fn subscribe(&mut self, _node: &mut dyn Node, _sink: InputSink) -> Result<(), InitError> {
            Ok(())
        }
    }

    #[test]
    fn test_default_compute_passes_input_through() {
        let mut strategy = Noop;
        let mut desired = JointVec::new();
        let ok = strategy.compute_desired(
            Duration::from_millis(10),
            &[0.0, 0.0],
            &[1.0, -1.0],
            &mut desired,
        );
        assert!(ok);
        assert_eq!(desired.as_slice(), &[1.0, -1.0]);
    }

    #[test]
    fn test_default_compute_reports_no_data_for_empty_input() {
        let mut strategy = Noop;
        let mut desired = JointVec::new();
        assert!(!strategy.compute_desired(Duration::ZERO, &[0.0], &[], &mut desired));
        assert!(desired.is_empty());
    }

    #[test]
    fn test_boxed_strategy_delegates() {
        let boxed: Box<dyn JointCommandStrategy> = Box::new(Noop);
        assert_eq!(boxed.mode(), ControlMode::Incremental);
    }
}
