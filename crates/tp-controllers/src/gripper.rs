//! 夹爪控制器
//!
//! 绝对模式，最多 [`MAX_FINGERS`] 个手指关节。每条消息可以是：
//!
//! - 空消息：保活，保持当前目标不动
//! - 一个值：所有手指使用同一目标（开合宽度）
//! - 每个手指一个值：分别设定
//!
//! 从 Inactive 进入 Active 时，保持目标取本周期读取的真实位置，
//! 因此以保活消息开始的会话不会让手指跳向旧目标。

use crate::COMMAND_TOPIC;
use std::time::Duration;
use tp_core::{
    ControlMode, InitError, InputSink, JointCommandStrategy, JointVec, Node, SetupContext,
};
use tracing::{debug, warn};

/// 最大手指关节数
pub const MAX_FINGERS: usize = 2;

/// 夹爪控制器
#[derive(Debug, Clone, Default)]
pub struct GripperController {
    fingers: usize,
    hold: JointVec,
}

impl GripperController {
    /// 创建夹爪控制器，手指数与保持目标在 `setup` 中确定
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前保持目标
    pub fn hold_target(&self) -> &[f64] {
        &self.hold
    }
}

impl JointCommandStrategy for GripperController {
    fn mode(&self) -> ControlMode {
        ControlMode::Absolute
    }

    fn setup(&mut self, ctx: &SetupContext<'_>) -> Result<(), InitError> {
        let fingers = ctx.joint_names.len();
        if fingers > MAX_FINGERS {
            return Err(InitError::Setup(format!(
                "gripper supports at most {} finger joints, got {}",
                MAX_FINGERS, fingers
            )));
        }

        self.fingers = fingers;
        self.hold = ctx.initial_positions.iter().copied().collect();
        Ok(())
    }

    fn subscribe(&mut self, node: &mut dyn Node, sink: InputSink) -> Result<(), InitError> {
        let fingers = self.fingers;
        node.subscribe(
            COMMAND_TOPIC,
            Box::new(move |values: &[f64]| {
                let shape_ok = values.len() <= 1 || values.len() == fingers;
                if shape_ok && values.iter().all(|v| v.is_finite()) {
                    sink.accept_now(values);
                } else {
                    warn!(
                        "Gripper command {:?} does not match {} finger(s); dropping",
                        values, fingers
                    );
                }
            }),
        );
        Ok(())
    }

    fn compute_desired(
        &mut self,
        _period: Duration,
        _current: &[f64],
        input: &[f64],
        desired: &mut JointVec,
    ) -> bool {
        match input {
            [] => {},
            [width] => self.hold.iter_mut().for_each(|h| *h = *width),
            per_finger if per_finger.len() == self.hold.len() => {
                self.hold.copy_from_slice(per_finger);
            },
            _ => return false,
        }
        desired.extend_from_slice(&self.hold);
        true
    }

    fn on_activate(&mut self, positions: &[f64]) {
        debug!("Gripper activating, holding {:?}", positions);
        self.hold.clear();
        self.hold.extend_from_slice(positions);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{hardware, params};
    use std::time::Instant;
    use tp_core::sim::LoopbackNode;
    use tp_core::{ControllerBuilder, CycleOutcome};

    const PERIOD: Duration = Duration::from_millis(10);
    const FINGERS: [&str; 2] = ["gripper_left_finger_joint", "gripper_right_finger_joint"];

    #[test]
    fn test_gripper_rejects_more_than_two_fingers() {
        let mut hw = hardware();
        let mut node = LoopbackNode::new(params(&[
            "gripper_left_finger_joint",
            "gripper_right_finger_joint",
            "arm_1_joint",
        ]));

        let result = ControllerBuilder::new("gripper").init(GripperController::new(), &mut hw, &mut node);
        assert!(matches!(result, Err(InitError::Setup(_))));
        assert!(node.subscribed_topics().is_empty());
        assert!(node.advertised_topics().is_empty());
    }

    #[test]
    fn test_gripper_single_value_drives_both_fingers() {
        let mut hw = hardware();
        let mut node = LoopbackNode::new(params(&FINGERS));
        let mut controller = ControllerBuilder::new("gripper")
            .init(GripperController::new(), &mut hw, &mut node)
            .unwrap();

        node.deliver(COMMAND_TOPIC, &[0.04]);
        assert_eq!(
            controller.update(Instant::now(), PERIOD),
            CycleOutcome::Commanded
        );
        assert_eq!(hw.command("gripper_left_finger_joint"), Some(0.04));
        assert_eq!(hw.command("gripper_right_finger_joint"), Some(0.04));
    }

    #[test]
    fn test_gripper_per_finger_targets_are_clamped() {
        let mut hw = hardware();
        let mut node = LoopbackNode::new(params(&FINGERS));
        let mut controller = ControllerBuilder::new("gripper")
            .init(GripperController::new(), &mut hw, &mut node)
            .unwrap();

        node.deliver(COMMAND_TOPIC, &[0.01, 0.5]);
        controller.update(Instant::now(), PERIOD);
        assert_eq!(hw.command("gripper_left_finger_joint"), Some(0.01));
        assert_eq!(hw.command("gripper_right_finger_joint"), Some(0.045));
    }

    #[test]
    fn test_gripper_keepalive_holds_activation_pose() {
        let mut hw = hardware();
        let mut node = LoopbackNode::new(params(&FINGERS));
        let mut controller = ControllerBuilder::new("gripper")
            .init(GripperController::new(), &mut hw, &mut node)
            .unwrap();

        // 初始化之后手指被外力移动
        hw.set_position("gripper_left_finger_joint", 0.01);
        hw.set_position("gripper_right_finger_joint", 0.015);

        node.deliver(COMMAND_TOPIC, &[]);
        assert_eq!(
            controller.update(Instant::now(), PERIOD),
            CycleOutcome::Commanded
        );
        assert_eq!(hw.command("gripper_left_finger_joint"), Some(0.01));
        assert_eq!(hw.command("gripper_right_finger_joint"), Some(0.015));
        assert_eq!(controller.strategy().hold_target(), &[0.01, 0.015]);
    }

    #[test]
    fn test_gripper_keeps_last_target_across_keepalives() {
        let mut hw = hardware();
        let mut node = LoopbackNode::new(params(&FINGERS));
        let mut controller = ControllerBuilder::new("gripper")
            .init(GripperController::new(), &mut hw, &mut node)
            .unwrap();

        node.deliver(COMMAND_TOPIC, &[0.03]);
        controller.update(Instant::now(), PERIOD);
        node.deliver(COMMAND_TOPIC, &[]);
        controller.update(Instant::now(), PERIOD);

        assert_eq!(hw.command("gripper_left_finger_joint"), Some(0.03));
        assert_eq!(hw.write_count("gripper_left_finger_joint"), 2);
    }

    #[test]
    fn test_gripper_drops_mismatched_messages() {
        let mut hw = hardware();
        let mut node = LoopbackNode::new(params(&["gripper_left_finger_joint"]));
        let mut controller = ControllerBuilder::new("gripper")
            .init(GripperController::new(), &mut hw, &mut node)
            .unwrap();

        node.deliver(COMMAND_TOPIC, &[0.01, 0.02]);
        node.deliver(COMMAND_TOPIC, &[f64::INFINITY]);
        assert_eq!(
            controller.update(Instant::now(), PERIOD),
            CycleOutcome::Inactive
        );
    }
}
