//! 控制循环
//!
//! 以固定频率驱动控制器的循环包装器。宿主框架自带调度器时不需要本模块，
//! 直接在其周期回调中调用 [`JointController::update`](crate::JointController::update) 即可。

mod loop_runner;

pub use loop_runner::{LoopConfig, LoopError, LoopStats, LoopTiming, run_controller};
