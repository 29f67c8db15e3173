//! Loop Runner - 控制循环包装器
//!
//! 以固定频率驱动 [`JointController::update`]，处理定时、dt 钳位和停止信号。
//!
//! # 核心功能
//!
//! - **精确定时**: 使用 `spin_sleep` 实现低抖动延时，按绝对截止时间排程
//! - **dt 钳位**: 限制异常大的时间步长（系统卡顿、调度延迟）
//! - **外部停止**: 通过 `AtomicBool` 停止循环（如 Ctrl+C）
//!
//! # 使用场景
//!
//! ```rust,ignore
//! use tp_core::control::{run_controller, LoopConfig};
//! use std::sync::atomic::AtomicBool;
//!
//! let config = LoopConfig {
//!     frequency_hz: 100.0,          // 100Hz 控制频率
//!     dt_clamp_multiplier: 2.0,     // dt 最大为 2x 标称值
//!     max_iterations: Some(1000),   // 运行 1000 次后停止
//! };
//!
//! let stop = AtomicBool::new(false);
//! let stats = run_controller(&mut controller, &config, &stop)?;
//! ```

use crate::controller::{CycleOutcome, JointController};
use crate::joint::JointHandle;
use crate::strategy::JointCommandStrategy;
use serde::Deserialize;
use spin_sleep::SpinSleeper;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

/// 控制循环错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoopError {
    /// 配置无效
    #[error("Invalid loop configuration: {0}")]
    InvalidConfig(String),
}

/// 控制循环配置
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    /// 控制频率（Hz）
    ///
    /// 例如：100.0 表示 100Hz（10ms 周期）
    pub frequency_hz: f64,

    /// dt 钳位倍数
    ///
    /// 当实际 dt 超过标称周期的此倍数时，dt 被钳位。
    ///
    /// 例如：2.0 表示 dt 最大为 2 * (1 / frequency_hz)
    pub dt_clamp_multiplier: f64,

    /// 最大迭代次数（None 表示运行到停止信号）
    pub max_iterations: Option<usize>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        LoopConfig {
            frequency_hz: 100.0,      // 默认 100Hz
            dt_clamp_multiplier: 2.0, // 默认 2x
            max_iterations: None,     // 默认无限循环
        }
    }
}

/// 由 [`LoopConfig`] 推导出的周期参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopTiming {
    /// 标称周期
    pub period: Duration,
    /// dt 钳位上限
    pub max_dt: Duration,
}

impl LoopConfig {
    /// 检查配置
    pub fn validate(&self) -> Result<(), LoopError> {
        self.timing().map(|_| ())
    }

    /// 检查配置并计算周期参数
    ///
    /// 周期或 dt 上限无法表示为 [`Duration`] 时返回 [`LoopError::InvalidConfig`]。
    pub fn timing(&self) -> Result<LoopTiming, LoopError> {
        if !self.frequency_hz.is_finite() || self.frequency_hz <= 0.0 {
            return Err(LoopError::InvalidConfig(format!(
                "Invalid frequency_hz: {} (must be > 0)",
                self.frequency_hz
            )));
        }
        if self.frequency_hz > 10000.0 {
            warn!(
                "Very high control frequency: {} Hz. This may cause performance issues.",
                self.frequency_hz
            );
        }
        if !self.dt_clamp_multiplier.is_finite() || self.dt_clamp_multiplier <= 0.0 {
            return Err(LoopError::InvalidConfig(format!(
                "Invalid dt_clamp_multiplier: {} (must be > 0)",
                self.dt_clamp_multiplier
            )));
        }

        let period = Duration::try_from_secs_f64(1.0 / self.frequency_hz).map_err(|e| {
            LoopError::InvalidConfig(format!(
                "frequency_hz {} gives an unrepresentable period: {}",
                self.frequency_hz, e
            ))
        })?;
        let max_dt = Duration::try_from_secs_f64(period.as_secs_f64() * self.dt_clamp_multiplier)
            .map_err(|e| {
                LoopError::InvalidConfig(format!(
                    "dt_clamp_multiplier {} gives an unrepresentable max dt: {}",
                    self.dt_clamp_multiplier, e
                ))
            })?;

        Ok(LoopTiming { period, max_dt })
    }
}

/// 控制循环统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    /// 执行的周期数
    pub iterations: usize,
    /// 写入命令的周期数
    pub commanded: usize,
    /// 保持上一条命令的周期数
    pub held: usize,
    /// Inactive 周期数
    pub inactive: usize,
    /// dt 被钳位的次数
    pub clamped_dt: usize,
    /// 错过截止时间的次数
    pub overruns: usize,
}

impl LoopStats {
    fn record(&mut self, outcome: CycleOutcome) {
        self.iterations += 1;
        match outcome {
            CycleOutcome::Commanded => self.commanded += 1,
            CycleOutcome::Held => self.held += 1,
            CycleOutcome::Inactive => self.inactive += 1,
        }
    }
}

/// 运行控制循环
///
/// 这是一个阻塞函数，会持续运行直到：
/// - 达到 `max_iterations`（如果设置）
/// - `stop` 被置为 `true`
///
/// # 时间处理
///
/// - 计算实际 dt
/// - 如果 dt > max_dt，钳位后传入 `update()`
/// - 下一周期截止时间 = 上一截止时间 + 标称周期；落后超过一个周期时重新对齐
pub fn run_controller<H, S>(
    controller: &mut JointController<H, S>,
    config: &LoopConfig,
    stop: &AtomicBool,
) -> Result<LoopStats, LoopError>
where
    H: JointHandle,
    S: JointCommandStrategy,
{
    let LoopTiming {
        period: nominal_period,
        max_dt,
    } = config.timing()?;

    // 设置线程优先级（可选 feature）
    #[cfg(feature = "realtime")]
    {
        use thread_priority::*;

        match set_current_thread_priority(ThreadPriority::Max) {
            Ok(_) => {
                info!("Control thread priority set to MAX (realtime)");
            },
            Err(e) => {
                warn!(
                    "Failed to set control thread priority: {:?}. \
                    On Linux, you may need to run with CAP_SYS_NICE or use rtkit.",
                    e
                );
            },
        }
    }

    let sleeper = SpinSleeper::default();

    info!(
        "Starting control loop for {} at {} Hz",
        controller.name(),
        config.frequency_hz
    );

    let mut stats = LoopStats::default();
    let mut last_time = Instant::now();
    let mut deadline = last_time + nominal_period;

    loop {
        if let Some(max_iter) = config.max_iterations
            && stats.iterations >= max_iter
        {
            break;
        }
        // Acquire: 看到停止信号时也能看到设置方之前的写入
        if stop.load(Ordering::Acquire) {
            debug!("Stop requested, leaving control loop");
            break;
        }

        let now = Instant::now();
        let real_dt = now - last_time;
        let mut dt = real_dt;

        if real_dt > max_dt {
            if stats.clamped_dt == 0 {
                warn!(
                    "Control period jumped to {:?} (max {:?}), clamping dt",
                    real_dt, max_dt
                );
            }
            stats.clamped_dt += 1;
            dt = max_dt;
        }

        let outcome = controller.update(now, dt);
        stats.record(outcome);
        last_time = now;

        let after = Instant::now();
        if after >= deadline {
            stats.overruns += 1;
            deadline = after + nominal_period;
        } else {
            sleeper.sleep(deadline - after);
            deadline += nominal_period;
        }
    }

    info!(
        "Control loop for {} finished: {} iterations ({} commanded, {} held, {} inactive), \
         {} clamped dt, {} overruns",
        controller.name(),
        stats.iterations,
        stats.commanded,
        stats.held,
        stats.inactive,
        stats.clamped_dt,
        stats.overruns
    );

    Ok(stats)
}
