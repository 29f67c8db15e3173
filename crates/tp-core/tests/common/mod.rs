//! 测试公共设施
//!
//! 机器人描述、参数、仿真硬件，以及记录钩子调用顺序的测试变体。

#![allow(dead_code)]

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tp_core::params::{INPUT_TIMEOUT, JOINT_NAMES, ROBOT_DESCRIPTION, STEP};
use tp_core::sim::{LoopbackNode, SimulatedJoints};
use tp_core::{
    ControlMode, ControllerBuilder, InitError, InputSink, JointCommandStrategy, JointController,
    JointVec, Node, SetupContext, TomlParams,
};

pub const COMMAND_TOPIC: &str = "command";

pub const DESCRIPTION: &str = r#"
name = "tiago"

[[joint]]
name = "torso_lift_joint"
lower = 0.0
upper = 0.35

[[joint]]
name = "arm_1_joint"
lower = 0.07
upper = 2.68

[[joint]]
name = "arm_2_joint"
lower = -1.5
upper = 1.02
"#;

/// 参数：描述 + 关节名
pub fn params(joints: &[&str]) -> TomlParams {
    let mut params = TomlParams::new();
    params.set(ROBOT_DESCRIPTION, DESCRIPTION);
    params.set(
        JOINT_NAMES,
        joints.iter().map(|j| j.to_string()).collect::<Vec<_>>(),
    );
    params
}

/// 参数：增量模式
pub fn incremental_params(joints: &[&str], step: f64) -> TomlParams {
    let mut params = params(joints);
    params.set(STEP, step);
    params
}

/// 参数：自定义超时
pub fn with_timeout(mut params: TomlParams, timeout: Duration) -> TomlParams {
    params.set(INPUT_TIMEOUT, timeout.as_secs_f64());
    params
}

/// 仿真硬件：torso 0.1，arm_1 1.0，arm_2 0.0
pub fn hardware() -> SimulatedJoints {
    SimulatedJoints::new()
        .with_joint("torso_lift_joint", 0.1)
        .with_joint("arm_1_joint", 1.0)
        .with_joint("arm_2_joint", 0.0)
}

/// 钩子调用记录
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Setup,
    Subscribe,
    Activate(Vec<f64>),
    Compute { current: Vec<f64>, input: Vec<f64> },
}

#[derive(Debug, Default)]
pub struct ProbeState {
    pub events: Vec<Event>,
    pub no_data: bool,
    pub setup_error: Option<String>,
}

/// 测试变体的观察句柄
#[derive(Debug, Clone, Default)]
pub struct Probe(Arc<Mutex<ProbeState>>);

impl Probe {
    pub fn events(&self) -> Vec<Event> {
        self.0.lock().events.clone()
    }

    pub fn clear(&self) {
        self.0.lock().events.clear();
    }

    pub fn set_no_data(&self, no_data: bool) {
        self.0.lock().no_data = no_data;
    }

    pub fn fail_setup(&self, reason: &str) {
        self.0.lock().setup_error = Some(reason.to_string());
    }

    pub fn activations(&self) -> Vec<Vec<f64>> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Activate(p) => Some(p),
                _ => None,
            })
            .collect()
    }
}

/// 记录所有钩子调用的变体，期望值直接透传输入
pub struct ScriptedStrategy {
    mode: ControlMode,
    probe: Probe,
}

impl ScriptedStrategy {
    pub fn new(mode: ControlMode) -> (Self, Probe) {
        let probe = Probe::default();
        (
            Self {
                mode,
                probe: probe.clone(),
            },
            probe,
        )
    }
}

impl JointCommandStrategy for ScriptedStrategy {
    fn mode(&self) -> ControlMode {
        self.mode
    }

    fn setup(&mut self, _ctx: &SetupContext<'_>) -> Result<(), InitError> {
        let mut probe = self.probe.0.lock();
        probe.events.push(Event::Setup);
        match probe.setup_error.clone() {
            Some(reason) => Err(InitError::Setup(reason)),
            None => Ok(()),
        }
    }

    fn subscribe(&mut self, node: &mut dyn Node, sink: InputSink) -> Result<(), InitError> {
        self.probe.0.lock().events.push(Event::Subscribe);
        node.subscribe(
            COMMAND_TOPIC,
            Box::new(move |values: &[f64]| sink.accept_now(values)),
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
        let mut probe = self.probe.0.lock();
        probe.events.push(Event::Compute {
            current: current.to_vec(),
            input: input.to_vec(),
        });
        if probe.no_data {
            return false;
        }
        desired.extend_from_slice(input);
        true
    }

    fn on_activate(&mut self, positions: &[f64]) {
        self.probe
            .0
            .lock()
            .events
            .push(Event::Activate(positions.to_vec()));
    }
}

pub type TestController = JointController<tp_core::sim::SimJointHandle, ScriptedStrategy>;

/// 初始化测试控制器
pub fn init(
    mode: ControlMode,
    params: TomlParams,
    hw: &mut SimulatedJoints,
) -> (TestController, LoopbackNode, Probe) {
    let (strategy, probe) = ScriptedStrategy::new(mode);
    let mut node = LoopbackNode::new(params);
    let controller = ControllerBuilder::new("test")
        .init(strategy, hw, &mut node)
        .expect("controller should initialize");
    (controller, node, probe)
}

pub const PERIOD: Duration = Duration::from_millis(10);
