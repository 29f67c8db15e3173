//! JointController - 关节位置控制器核心
//!
//! 固定的控制骨架，变体行为通过 [`JointCommandStrategy`] 注入。
//!
//! # 每周期流程
//!
//! 1. 读取所有关节位置并发布（无论是否 Active）
//! 2. 距上次输入超过 `input_timeout`（或从未收到输入）→ Inactive，不写命令
//! 3. 从 Inactive 恢复时先调用 `on_activate()`，传入本周期读取的位置
//! 4. 调用 `compute_desired()`；无数据或长度不符 → 保持上一条命令
//! 5. 逐关节计算原始目标，饱和到限位后写入硬件
//!
//! # 线程模型
//!
//! `update()` 只在控制线程调用。唯一的跨线程共享是输入邮箱，
//! 由 [`InputSink`] 在消息线程写入。

use crate::description::{DescriptionParser, TomlDescriptionParser};
use crate::error::{InitError, ParamError};
use crate::joint::{Joint, JointHandle, JointLimits, JointSet, JointVec, PositionJointInterface};
use crate::mailbox::{InputMailbox, InputSink};
use crate::mode::{CommandLaw, ControlMode};
use crate::node::{Node, STATE_TOPIC, StatePublisher};
use crate::params::{
    DEFAULT_INPUT_TIMEOUT, INPUT_TIMEOUT, JOINT_NAMES, ParamSource, ROBOT_DESCRIPTION, STEP,
};
use crate::strategy::{JointCommandStrategy, SetupContext};
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

/// 单周期结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// 输入超时或尚未收到输入，未写命令
    Inactive,
    /// Active，但没有有效期望值，保持上一条命令
    Held,
    /// 已写入命令
    Commanded,
}

/// 控制器状态快照
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerState {
    /// 是否 Active
    pub active: bool,
    /// 最近一次输入的到达时间
    pub last_input: Option<Instant>,
    /// 最近一次写入的命令（初始化时为当时读取的位置）
    pub joint_angles: JointVec,
}

/// 控制器构建器
///
/// # 示例
///
/// ```rust
/// use tp_core::{ControllerBuilder, ControlMode, InitError, InputSink, JointCommandStrategy, Node};
/// use tp_core::params::TomlParams;
/// use tp_core::sim::{LoopbackNode, SimulatedJoints};
///
/// struct Torso;
///
/// impl JointCommandStrategy for Torso {
///     fn mode(&self) -> ControlMode {
///         ControlMode::Incremental
///     }
///
///     fn subscribe(&mut self, node: &mut dyn Node, sink: InputSink) -> Result<(), InitError> {
///         node.subscribe("command", Box::new(move |v: &[f64]| sink.accept_now(v)));
///         Ok(())
///     }
/// }
///
/// let params = TomlParams::parse(r#"
///     robot_description = '''
///         [[joint]]
///         name = "torso_lift_joint"
///         lower = 0.0
///         upper = 0.35
///     '''
///     joint_names = ["torso_lift_joint"]
///     step = 0.01
/// "#).unwrap();
///
/// let mut hw = SimulatedJoints::new().with_joint("torso_lift_joint", 0.1);
/// let mut node = LoopbackNode::new(params);
///
/// let controller = ControllerBuilder::new("torso").init(Torso, &mut hw, &mut node)?;
/// assert_eq!(controller.state().joint_angles.as_slice(), &[0.1]);
/// # Ok::<(), InitError>(())
/// ```
pub struct ControllerBuilder {
    name: String,
    parser: Box<dyn DescriptionParser>,
}

impl ControllerBuilder {
    /// 创建构建器（默认使用 TOML 描述解析器）
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parser: Box::new(TomlDescriptionParser),
        }
    }

    /// 替换描述解析器
    pub fn description_parser(mut self, parser: impl DescriptionParser + 'static) -> Self {
        self.parser = Box::new(parser);
        self
    }

    /// 初始化控制器
    ///
    /// 任一步骤失败都返回 [`InitError`]，且不会向 `node` 注册任何订阅或发布。
    pub fn init<P, S, N>(
        self,
        mut strategy: S,
        hw: &mut P,
        node: &mut N,
    ) -> Result<JointController<P::Handle, S>, InitError>
    where
        P: PositionJointInterface,
        S: JointCommandStrategy,
        N: Node,
    {
        let name = self.name;
        info!("Initializing {} controller", name);

        let document = node
            .get_string(ROBOT_DESCRIPTION)
            .map_err(InitError::MissingDescription)?;
        let description = self.parser.parse(&document)?;

        let joint_names = node
            .get_string_list(JOINT_NAMES)
            .map_err(InitError::MissingJointNames)?;
        if joint_names.is_empty() {
            return Err(InitError::EmptyJointNames);
        }

        let law = resolve_law(strategy.mode(), &*node)?;
        let input_timeout = resolve_timeout(&*node)?;

        let mut joints = Vec::with_capacity(joint_names.len());
        for (i, joint_name) in joint_names.iter().enumerate() {
            if joint_names[..i].contains(joint_name) {
                return Err(InitError::DuplicateJoint(joint_name.clone()));
            }

            let limits = description
                .limits(joint_name)
                .ok_or_else(|| InitError::UnknownJoint(joint_name.clone()))?;
            let handle = hw
                .handle(joint_name)
                .ok_or_else(|| InitError::MissingHandle(joint_name.clone()))?;

            joints.push(Joint::new(joint_name.clone(), limits, handle));
        }
        let joints = JointSet::new(joints);

        let mut joint_angles = JointVec::new();
        joints.read_positions(&mut joint_angles);
        info!(
            "Initial joint configuration for {}: {:?}",
            name,
            joint_angles.as_slice()
        );

        strategy.setup(&SetupContext {
            name: &name,
            params: &*node,
            description: &description,
            joint_names: &joint_names,
            initial_positions: &joint_angles,
        })?;

        let mailbox = InputMailbox::new();
        strategy.subscribe(node, mailbox.sink())?;
        let publisher = node.advertise(STATE_TOPIC);

        info!(
            "{} controller ready: {} joint(s), {} mode, input timeout {:?}",
            name,
            joints.len(),
            law.mode(),
            input_timeout
        );

        let capacity = joints.len();
        Ok(JointController {
            name,
            strategy,
            joints,
            law,
            input_timeout,
            mailbox,
            publisher,
            state: ControllerState {
                active: false,
                last_input: None,
                joint_angles,
            },
            current: JointVec::with_capacity(capacity),
            input: JointVec::with_capacity(capacity),
            desired: JointVec::with_capacity(capacity),
            malformed_cycles: 0,
        })
    }
}

fn resolve_law(mode: ControlMode, params: &dyn ParamSource) -> Result<CommandLaw, InitError> {
    match mode {
        ControlMode::Absolute => Ok(CommandLaw::Absolute),
        ControlMode::Incremental => {
            let step = params.get_f64(STEP).map_err(InitError::MissingStep)?;
            if !step.is_finite() || step <= 0.0 {
                return Err(InitError::InvalidParameter {
                    param: STEP.to_string(),
                    reason: format!("{} (must be finite and > 0)", step),
                });
            }
            Ok(CommandLaw::Incremental { step })
        },
    }
}

fn resolve_timeout(params: &dyn ParamSource) -> Result<Duration, InitError> {
    let seconds = match params.get_f64(INPUT_TIMEOUT) {
        Ok(seconds) => seconds,
        Err(ParamError::Missing(_)) => return Ok(DEFAULT_INPUT_TIMEOUT),
        Err(e) => {
            return Err(InitError::InvalidParameter {
                param: INPUT_TIMEOUT.to_string(),
                reason: e.to_string(),
            });
        },
    };

    if seconds <= 0.0 {
        return Err(InitError::InvalidParameter {
            param: INPUT_TIMEOUT.to_string(),
            reason: format!("{} (must be > 0)", seconds),
        });
    }

    Duration::try_from_secs_f64(seconds).map_err(|e| InitError::InvalidParameter {
        param: INPUT_TIMEOUT.to_string(),
        reason: e.to_string(),
    })
}

/// 关节位置控制器
pub struct JointController<H, S> {
    name: String,
    strategy: S,
    joints: JointSet<H>,
    law: CommandLaw,
    input_timeout: Duration,
    mailbox: InputMailbox,
    publisher: Box<dyn StatePublisher>,
    state: ControllerState,
    // 周期内复用的缓冲区
    current: JointVec,
    input: JointVec,
    desired: JointVec,
    malformed_cycles: u64,
}

impl<H: JointHandle, S: JointCommandStrategy> JointController<H, S> {
    /// 执行一个控制周期
    ///
    /// # 参数
    ///
    /// - `now`: 本周期时间
    /// - `period`: 控制周期（传给 `compute_desired()`）
    pub fn update(&mut self, now: Instant, period: Duration) -> CycleOutcome {
        self.joints.read_positions(&mut self.current);
        self.publisher.publish(&self.current);

        let last_input = self.mailbox.snapshot_into(&mut self.input);
        self.state.last_input = last_input;

        let fresh = match last_input {
            Some(stamp) => now.saturating_duration_since(stamp) <= self.input_timeout,
            None => false,
        };

        if !fresh {
            if self.state.active {
                info!(
                    "{}: no input for more than {:?}, deactivating",
                    self.name, self.input_timeout
                );
            }
            self.state.active = false;
            return CycleOutcome::Inactive;
        }

        if !self.state.active {
            info!("{}: input received, activating", self.name);
            self.strategy.on_activate(&self.current);
            self.state.active = true;
        }

        self.desired.clear();
        let available =
            self.strategy
                .compute_desired(period, &self.current, &self.input, &mut self.desired);

        if !available {
            trace!("{}: no desired values this cycle", self.name);
            return CycleOutcome::Held;
        }

        if self.desired.len() != self.joints.len() {
            if self.malformed_cycles == 0 {
                warn!(
                    "{}: desired vector has {} value(s), expected {}; holding last command",
                    self.name,
                    self.desired.len(),
                    self.joints.len()
                );
            }
            self.malformed_cycles += 1;
            return CycleOutcome::Held;
        }

        if self.malformed_cycles > 0 {
            debug!(
                "{}: desired vector valid again after {} held cycle(s)",
                self.name, self.malformed_cycles
            );
            self.malformed_cycles = 0;
        }

        let law = self.law;
        for (i, joint) in self.joints.iter_mut().enumerate() {
            let raw = law.raw_target(self.current[i], self.desired[i]);
            self.state.joint_angles[i] = joint.command_clamped(raw);
        }

        CycleOutcome::Commanded
    }

    /// 控制器名
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 状态快照
    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    /// 是否 Active
    pub fn is_active(&self) -> bool {
        self.state.active
    }

    /// 控制模式
    pub fn mode(&self) -> ControlMode {
        self.law.mode()
    }

    /// 增量模式步长
    pub fn step(&self) -> Option<f64> {
        match self.law {
            CommandLaw::Incremental { step } => Some(step),
            CommandLaw::Absolute => None,
        }
    }

    /// 输入超时
    pub fn input_timeout(&self) -> Duration {
        self.input_timeout
    }

    /// 关节集合
    pub fn joints(&self) -> &JointSet<H> {
        &self.joints
    }

    /// 按控制顺序排列的关节名
    pub fn joint_names(&self) -> impl Iterator<Item = &str> {
        self.joints.iter().map(Joint::name)
    }

    /// 按控制顺序排列的关节限位
    pub fn limits(&self) -> impl Iterator<Item = JointLimits> + '_ {
        self.joints.iter().map(Joint::limits)
    }

    /// 获取输入投递句柄
    pub fn input_sink(&self) -> InputSink {
        self.mailbox.sink()
    }

    /// 变体
    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    /// 变体（可变）
    pub fn strategy_mut(&mut self) -> &mut S {
        &mut self.strategy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::TomlParams;

    #[test]
    fn test_timeout_defaults_when_missing() {
        let params = TomlParams::new();
        assert_eq!(resolve_timeout(&params).unwrap(), DEFAULT_INPUT_TIMEOUT);
        assert_eq!(DEFAULT_INPUT_TIMEOUT, Duration::from_millis(250));
    }

    #[test]
    fn test_timeout_from_params() {
        let params = TomlParams::parse("input_timeout = 0.05").unwrap();
        assert_eq!(resolve_timeout(&params).unwrap(), Duration::from_millis(50));
    }

    #[test]
    fn test_invalid_timeouts_rejected() {
        for text in [
            "input_timeout = 0.0",
            "input_timeout = -1.0",
            "input_timeout = nan",
            "input_timeout = 1e300",
            "input_timeout = \"1s\"",
        ] {
            let params = TomlParams::parse(text).unwrap();
            assert!(
                matches!(resolve_timeout(&params), Err(InitError::InvalidParameter { .. })),
                "{} should be rejected",
                text
            );
        }
    }

    #[test]
    fn test_step_only_required_for_incremental() {
        let params = TomlParams::new();
        assert_eq!(
            resolve_law(ControlMode::Absolute, &params).unwrap(),
            CommandLaw::Absolute
        );
        assert!(matches!(
            resolve_law(ControlMode::Incremental, &params),
            Err(InitError::MissingStep(ParamError::Missing(_)))
        ));
    }

    #[test]
    fn test_step_must_be_positive() {
        for text in ["step = 0.0", "step = -0.1", "step = inf"] {
            let params = TomlParams::parse(text).unwrap();
            assert!(matches!(
                resolve_law(ControlMode::Incremental, &params),
                Err(InitError::InvalidParameter { .. })
            ));
        }

        let params = TomlParams::parse("step = 0.1").unwrap();
        assert_eq!(
            resolve_law(ControlMode::Incremental, &params).unwrap(),
            CommandLaw::Incremental { step: 0.1 }
        );
    }
}
