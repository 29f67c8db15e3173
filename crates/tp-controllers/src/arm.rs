//! 手臂控制器
//!
//! 绝对模式：消息直接给出每个关节的目标位置（按 `joint_names` 顺序）。

use crate::COMMAND_TOPIC;
use tp_core::{ControlMode, InitError, InputSink, JointCommandStrategy, Node};
use tracing::warn;

/// 手臂控制器
#[derive(Debug, Clone, Copy, Default)]
pub struct ArmController;

impl JointCommandStrategy for ArmController {
    fn mode(&self) -> ControlMode {
        ControlMode::Absolute
    }

    fn subscribe(&mut self, node: &mut dyn Node, sink: InputSink) -> Result<(), InitError> {
        node.subscribe(
            COMMAND_TOPIC,
            Box::new(move |values: &[f64]| {
                // 非有限值会被饱和到下限，直接丢弃整条消息
                if values.iter().all(|v| v.is_finite()) {
                    sink.accept_now(values);
                } else {
                    warn!("Arm command contains non-finite values {:?}; dropping", values);
                }
            }),
        );
        Ok(())
    }
}
