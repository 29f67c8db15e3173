//! 躯干控制器
//!
//! 增量模式：每条消息是一个整数步数，目标 = 当前位置 + step × 步数。
//! 输入保持新鲜期间每周期都会前进一步，停止发送后在超时内停下。

use crate::COMMAND_TOPIC;
use std::time::Duration;
use tp_core::{
    ControlMode, InitError, InputSink, JointCommandStrategy, JointVec, Node, SetupContext,
};
use tracing::warn;

/// 躯干控制器
#[derive(Debug, Clone, Copy, Default)]
pub struct TorsoController;

impl JointCommandStrategy for TorsoController {
    fn mode(&self) -> ControlMode {
        ControlMode::Incremental
    }

    fn setup(&mut self, ctx: &SetupContext<'_>) -> Result<(), InitError> {
        if ctx.joint_names.len() > 1 {
            warn!(
                "{}: {} joints configured, every joint receives the same step",
                ctx.name,
                ctx.joint_names.len()
            );
        }
        Ok(())
    }

    fn subscribe(&mut self, node: &mut dyn Node, sink: InputSink) -> Result<(), InitError> {
        node.subscribe(
            COMMAND_TOPIC,
            Box::new(move |values: &[f64]| match values {
                [steps] if steps.is_finite() => sink.accept_now(&[steps.trunc()]),
                _ => warn!(
                    "Torso command must be a single integer step, got {:?}; dropping",
                    values
                ),
            }),
        );
        Ok(())
    }

    fn compute_desired(
        &mut self,
        _period: Duration,
        current: &[f64],
        input: &[f64],
        desired: &mut JointVec,
    ) -> bool {
        match input.first() {
            Some(&steps) => {
                desired.resize(current.len(), steps);
                true
            },
            None => false,
        }
    }
}
