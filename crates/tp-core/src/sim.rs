//! 仿真硬件与回环节点
//!
//! 用于测试、基准和命令行仿真运行，不依赖任何真实硬件或消息系统。
//!
//! - [`SimulatedJoints`]: 位置控制硬件接口，关节以一阶滞后跟踪命令
//! - [`LoopbackNode`]: 进程内节点，记录所有订阅与发布，可手动投递消息

use crate::description::RobotDescription;
use crate::error::ParamError;
use crate::joint::{JointHandle, PositionJointInterface};
use crate::node::{InputCallback, Node, StatePublisher};
use crate::params::{ParamSource, TomlParams};
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug, Clone)]
struct SimJoint {
    name: String,
    position: f64,
    command: Option<f64>,
    writes: u64,
}

#[derive(Debug)]
struct SimState {
    joints: Vec<SimJoint>,
    tracking_gain: f64,
}

/// 仿真关节组
///
/// 每次写入命令时，位置按 `position += gain * (command - position)` 更新，
/// `gain = 1.0`（默认）表示立即到位。
///
/// # 示例
///
/// ```rust
/// use tp_core::joint::{JointHandle, PositionJointInterface};
/// use tp_core::sim::SimulatedJoints;
///
/// let mut hw = SimulatedJoints::new().with_joint("torso_lift_joint", 0.1);
/// let mut handle = hw.handle("torso_lift_joint").unwrap();
///
/// handle.set_command(0.2);
/// assert_eq!(handle.position(), 0.2);
/// assert_eq!(hw.command("torso_lift_joint"), Some(0.2));
/// ```
#[derive(Debug, Clone)]
pub struct SimulatedJoints {
    state: Arc<Mutex<SimState>>,
}

impl Default for SimulatedJoints {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedJoints {
    /// 创建空的关节组
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState {
                joints: Vec::new(),
                tracking_gain: 1.0,
            })),
        }
    }

    /// 按机器人描述创建
    ///
    /// 初始位置取 `initial_position`，未给出时取限位中点。
    pub fn from_description(description: &RobotDescription) -> Self {
        description.joints().iter().fold(Self::new(), |sim, joint| {
            let position = joint
                .initial_position
                .unwrap_or((joint.lower + joint.upper) / 2.0);
            sim.with_joint(&joint.name, position)
        })
    }

    /// 添加关节（同名关节会覆盖位置）
    pub fn with_joint(self, name: &str, position: f64) -> Self {
        {
            let mut state = self.state.lock();
            match state.joints.iter_mut().find(|j| j.name == name) {
                Some(joint) => joint.position = position,
                None => state.joints.push(SimJoint {
                    name: name.to_string(),
                    position,
                    command: None,
                    writes: 0,
                }),
            }
        }
        self
    }

    /// 设置跟踪增益，范围 `(0, 1]`，超出范围的值被饱和
    pub fn with_tracking_gain(self, gain: f64) -> Self {
        let gain = if gain.is_finite() {
            gain.clamp(f64::EPSILON, 1.0)
        } else {
            1.0
        };
        self.state.lock().tracking_gain = gain;
        self
    }

    /// 当前位置
    pub fn position(&self, name: &str) -> Option<f64> {
        self.with(name, |joint| joint.position)
    }

    /// 直接设置位置（模拟外力或另一控制器）
    pub fn set_position(&self, name: &str, position: f64) -> bool {
        let mut state = self.state.lock();
        match state.joints.iter_mut().find(|j| j.name == name) {
            Some(joint) => {
                joint.position = position;
                true
            },
            None => false,
        }
    }

    /// 最近一次命令
    pub fn command(&self, name: &str) -> Option<f64> {
        self.with(name, |joint| joint.command).flatten()
    }

    /// 命令写入次数
    pub fn write_count(&self, name: &str) -> u64 {
        self.with(name, |joint| joint.writes).unwrap_or(0)
    }

    /// 所有关节名
    pub fn joint_names(&self) -> Vec<String> {
        self.state
            .lock()
            .joints
            .iter()
            .map(|j| j.name.clone())
            .collect()
    }

    fn with<T>(&self, name: &str, f: impl FnOnce(&SimJoint) -> T) -> Option<T> {
        self.state.lock().joints.iter().find(|j| j.name == name).map(f)
    }
}

impl PositionJointInterface for SimulatedJoints {
    type Handle = SimJointHandle;

    fn handle(&mut self, name: &str) -> Option<SimJointHandle> {
        let index = self
            .state
            .lock()
            .joints
            .iter()
            .position(|j| j.name == name)?;

        Some(SimJointHandle {
            state: Arc::clone(&self.state),
            index,
        })
    }
}

/// 仿真关节句柄
#[derive(Debug)]
pub struct SimJointHandle {
    state: Arc<Mutex<SimState>>,
    index: usize,
}

impl JointHandle for SimJointHandle {
    fn position(&self) -> f64 {
        self.state.lock().joints[self.index].position
    }

    fn set_command(&mut self, command: f64) {
        let mut state = self.state.lock();
        let gain = state.tracking_gain;
        let joint = &mut state.joints[self.index];
        joint.command = Some(command);
        joint.writes += 1;
        joint.position += gain * (command - joint.position);
    }
}

/// 回环节点
///
/// 记录订阅的话题与回调、声明的发布话题以及每次发布的内容。
/// 测试中用 [`LoopbackNode::deliver`] 模拟消息到达。
pub struct LoopbackNode {
    params: TomlParams,
    subscriptions: Vec<(String, InputCallback)>,
    advertised: Vec<String>,
    published: Arc<Mutex<Vec<Vec<f64>>>>,
}

impl LoopbackNode {
    /// 用给定参数创建节点
    pub fn new(params: TomlParams) -> Self {
        Self {
            params,
            subscriptions: Vec::new(),
            advertised: Vec::new(),
            published: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// 参数（可修改）
    pub fn params_mut(&mut self) -> &mut TomlParams {
        &mut self.params
    }

    /// 向话题投递消息，返回被调用的回调数量
    pub fn deliver(&mut self, topic: &str, values: &[f64]) -> usize {
        let mut delivered = 0;
        for (subscribed, callback) in self.subscriptions.iter_mut() {
            if subscribed == topic {
                callback(values);
                delivered += 1;
            }
        }
        delivered
    }

    /// 已订阅的话题
    pub fn subscribed_topics(&self) -> Vec<&str> {
        self.subscriptions.iter().map(|(t, _)| t.as_str()).collect()
    }

    /// 已声明的发布话题
    pub fn advertised_topics(&self) -> &[String] {
        &self.advertised
    }

    /// 所有已发布的状态
    pub fn published(&self) -> Vec<Vec<f64>> {
        self.published.lock().clone()
    }

    /// 最近一次发布的状态
    pub fn last_published(&self) -> Option<Vec<f64>> {
        self.published.lock().last().cloned()
    }

    /// 清空发布记录
    pub fn clear_published(&self) {
        self.published.lock().clear();
    }
}

impl ParamSource for LoopbackNode {
    fn get_string(&self, name: &str) -> Result<String, ParamError> {
        self.params.get_string(name)
    }

    fn get_string_list(&self, name: &str) -> Result<Vec<String>, ParamError> {
        self.params.get_string_list(name)
    }

    fn get_f64(&self, name: &str) -> Result<f64, ParamError> {
        self.params.get_f64(name)
    }
}

impl Node for LoopbackNode {
    fn subscribe(&mut self, topic: &str, callback: InputCallback) {
        self.subscriptions.push((topic.to_string(), callback));
    }

    fn advertise(&mut self, topic: &str) -> Box<dyn StatePublisher> {
        self.advertised.push(topic.to_string());
        Box::new(LoopbackPublisher {
            published: Arc::clone(&self.published),
        })
    }
}

struct LoopbackPublisher {
    published: Arc<Mutex<Vec<Vec<f64>>>>,
}

impl StatePublisher for LoopbackPublisher {
    fn publish(&mut self, positions: &[f64]) {
        self.published.lock().push(positions.to_vec());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::description::{DescriptionParser, TomlDescriptionParser};

    #[test]
    fn test_tracking_gain_lags_command() {
        let mut hw = SimulatedJoints::new()
            .with_joint("a", 0.0)
            .with_tracking_gain(0.5);
        let mut handle = hw.handle("a").unwrap();

        handle.set_command(1.0);
        assert!((handle.position() - 0.5).abs() < 1e-12);
        handle.set_command(1.0);
        assert!((handle.position() - 0.75).abs() < 1e-12);
        assert_eq!(hw.write_count("a"), 2);
    }

    #[test]
    fn test_unknown_joint_has_no_handle() {
        let mut hw = SimulatedJoints::new().with_joint("a", 0.0);
        assert!(hw.handle("b").is_none());
        assert_eq!(hw.command("a"), None);
        assert_eq!(hw.write_count("b"), 0);
    }

    #[test]
    fn test_from_description_uses_initial_or_midpoint() {
        let desc = TomlDescriptionParser
            .parse(
                "[[joint]]\nname = \"a\"\nlower = 0.0\nupper = 1.0\ninitial_position = 0.2\n\
                 [[joint]]\nname = \"b\"\nlower = -1.0\nupper = 3.0\n",
            )
            .unwrap();
        let hw = SimulatedJoints::from_description(&desc);

        assert_eq!(hw.position("a"), Some(0.2));
        assert_eq!(hw.position("b"), Some(1.0));
        assert_eq!(hw.joint_names(), vec!["a", "b"]);
    }

    #[test]
    fn test_loopback_node_routes_by_topic() {
        let mut node = LoopbackNode::new(TomlParams::new());
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);
        node.subscribe(
            "command",
            Box::new(move |values: &[f64]| sink.lock().push(values.to_vec())),
        );

        assert_eq!(node.deliver("command", &[1.0, 2.0]), 1);
        assert_eq!(node.deliver("other", &[3.0]), 0);
        assert_eq!(*received.lock(), vec![vec![1.0, 2.0]]);
        assert_eq!(node.subscribed_topics(), vec!["command"]);
    }

    #[test]
    fn test_loopback_publisher_records() {
        let mut node = LoopbackNode::new(TomlParams::new());
        let mut publisher = node.advertise("state");
        publisher.publish(&[0.1]);
        publisher.publish(&[0.2]);

        assert_eq!(node.advertised_topics(), &["state".to_string()]);
        assert_eq!(node.published(), vec![vec![0.1], vec![0.2]]);
        assert_eq!(node.last_published(), Some(vec![0.2]));
        node.clear_published();
        assert!(node.published().is_empty());
    }
}
