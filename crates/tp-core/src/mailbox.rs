//! 输入邮箱（Mailbox）
//!
//! 消息线程与控制线程之间的单槽交接：写入方直接覆盖旧内容（Last Write Wins），
//! 读取方在 `update()` 中复制一份快照。两侧临界区都只是 O(关节数) 的拷贝。

use crate::joint::JointVec;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;

/// 最近一次收到的输入
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PendingInput {
    /// 输入向量（绝对目标或增量，取决于控制模式）
    pub values: JointVec,
    /// 到达时间，尚未收到输入时为 `None`
    pub stamp: Option<Instant>,
}

/// 输入投递句柄
///
/// 交给命令源使用，可克隆、可跨线程。
///
/// # 示例
///
/// ```rust
/// use tp_core::mailbox::InputMailbox;
///
/// let mailbox = InputMailbox::new();
/// let sink = mailbox.sink();
///
/// std::thread::spawn(move || sink.accept_now(&[0.1, 0.2])).join().unwrap();
///
/// let pending = mailbox.snapshot();
/// assert_eq!(pending.values.as_slice(), &[0.1, 0.2]);
/// assert!(pending.stamp.is_some());
/// ```
#[derive(Debug, Clone)]
pub struct InputSink {
    slot: Arc<Mutex<PendingInput>>,
}

impl InputSink {
    /// 投递新输入，同时刷新活跃计时
    pub fn accept(&self, values: &[f64], stamp: Instant) {
        let mut slot = self.slot.lock();
        slot.values.clear();
        slot.values.extend_from_slice(values);
        slot.stamp = Some(stamp);
    }

    /// 以当前时间作为到达时间投递
    pub fn accept_now(&self, values: &[f64]) {
        self.accept(values, Instant::now());
    }
}

/// 输入邮箱（控制器持有）
#[derive(Debug, Default)]
pub struct InputMailbox {
    slot: Arc<Mutex<PendingInput>>,
}

impl InputMailbox {
    /// 创建空邮箱
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取投递句柄
    pub fn sink(&self) -> InputSink {
        InputSink {
            slot: Arc::clone(&self.slot),
        }
    }

    /// 将当前内容复制到 `values`（复用其存储），返回到达时间
    pub fn snapshot_into(&self, values: &mut JointVec) -> Option<Instant> {
        let slot = self.slot.lock();
        values.clear();
        values.extend_from_slice(&slot.values);
        slot.stamp
    }

    /// 复制当前内容
    pub fn snapshot(&self) -> PendingInput {
        self.slot.lock().clone()
    }
}
