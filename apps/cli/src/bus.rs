//! 进程内消息总线
//!
//! [`ChannelNode`] 是 `tp_core::Node` 的 crossbeam 实现：
//!
//! - 订阅回调在初始化后移交给 [`Dispatcher`]，由分发线程按话题调用
//! - 发布器用 `try_send` 写入有界通道，消费者跟不上时丢弃而不是阻塞控制线程
//! - 话题共享同一个 `Arc<str>`，数值存放在 [`JointVec`] 中，常见关节数下发布不做堆分配

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError, bounded};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tp_core::{
    InputCallback, JointVec, Node, ParamError, ParamSource, StatePublisher, TomlParams,
};
use tracing::{debug, warn};

/// 总线上的一条消息
#[derive(Debug, Clone, PartialEq)]
pub struct BusMessage {
    pub topic: Arc<str>,
    pub values: JointVec,
}

impl BusMessage {
    pub fn new(topic: impl Into<Arc<str>>, values: &[f64]) -> Self {
        Self {
            topic: topic.into(),
            values: JointVec::from_slice(values),
        }
    }
}

/// 基于 crossbeam 通道的节点
pub struct ChannelNode {
    params: TomlParams,
    subscriptions: Vec<(String, InputCallback)>,
    published_tx: Sender<BusMessage>,
}

impl ChannelNode {
    /// 创建节点，返回节点和已发布消息的接收端
    pub fn new(params: TomlParams, capacity: usize) -> (Self, Receiver<BusMessage>) {
        let (published_tx, published_rx) = bounded(capacity);
        (
            Self {
                params,
                subscriptions: Vec::new(),
                published_tx,
            },
            published_rx,
        )
    }

    /// 取出订阅，转为分发器
    ///
    /// 节点本身持有的发布通道随之释放，已声明的发布器不受影响。
    pub fn into_dispatcher(self) -> Dispatcher {
        Dispatcher {
            subscriptions: self.subscriptions,
        }
    }
}

impl ParamSource for ChannelNode {
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

impl Node for ChannelNode {
    fn subscribe(&mut self, topic: &str, callback: InputCallback) {
        debug!("Subscribed to '{}'", topic);
        self.subscriptions.push((topic.to_string(), callback));
    }

    fn advertise(&mut self, topic: &str) -> Box<dyn StatePublisher> {
        debug!("Advertised '{}'", topic);
        Box::new(ChannelPublisher {
            topic: Arc::from(topic),
            tx: self.published_tx.clone(),
            dropped: 0,
            disconnected: false,
        })
    }
}

struct ChannelPublisher {
    topic: Arc<str>,
    tx: Sender<BusMessage>,
    dropped: u64,
    disconnected: bool,
}

impl StatePublisher for ChannelPublisher {
    fn publish(&mut self, positions: &[f64]) {
        if self.disconnected {
            return;
        }

        let message = BusMessage {
            topic: Arc::clone(&self.topic),
            values: JointVec::from_slice(positions),
        };
        match self.tx.try_send(message) {
            Ok(()) => {
                if self.dropped > 0 {
                    debug!(
                        "'{}' consumer caught up after {} dropped message(s)",
                        self.topic, self.dropped
                    );
                    self.dropped = 0;
                }
            },
            Err(TrySendError::Full(_)) => {
                if self.dropped == 0 {
                    warn!("'{}' consumer is lagging, dropping messages", self.topic);
                }
                self.dropped += 1;
            },
            Err(TrySendError::Disconnected(_)) => {
                debug!("'{}' has no consumer, publishing stopped", self.topic);
                self.disconnected = true;
            },
        }
    }
}

/// 订阅分发器
pub struct Dispatcher {
    subscriptions: Vec<(String, InputCallback)>,
}

impl Dispatcher {
    /// 把消息交给订阅了该话题的回调，返回被调用的回调数量
    pub fn dispatch(&mut self, message: &BusMessage) -> usize {
        let mut delivered = 0;
        for (topic, callback) in self.subscriptions.iter_mut() {
            if topic.as_str() == &*message.topic {
                callback(message.values.as_slice());
                delivered += 1;
            }
        }
        if delivered == 0 {
            debug!("No subscriber for '{}'", message.topic);
        }
        delivered
    }

    /// 分发循环
    ///
    /// 直到所有发送端关闭或 `stop` 被置位。
    pub fn run(mut self, rx: Receiver<BusMessage>, stop: &AtomicBool) -> usize {
        let mut handled = 0;
        while !stop.load(Ordering::Acquire) {
            match rx.recv_timeout(Duration::from_millis(50)) {
                Ok(message) => {
                    self.dispatch(&message);
                    handled += 1;
                },
                Err(RecvTimeoutError::Timeout) => {},
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        debug!("Dispatcher finished after {} message(s)", handled);
        handled
    }
}
