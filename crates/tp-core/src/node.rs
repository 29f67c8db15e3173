//! 宿主环境接口
//!
//! [`Node`] 代表控制器所在的宿主：提供参数、注册订阅、发布状态。
//! 消息的传输与序列化由宿主负责，控制器只看到数值向量。

use crate::params::ParamSource;

/// 状态发布的话题名
pub const STATE_TOPIC: &str = "state";

/// 订阅回调
///
/// 在消息线程中调用，参数为消息携带的数值。
pub type InputCallback = Box<dyn FnMut(&[f64]) + Send>;

/// 状态发布器
///
/// 在控制线程中每周期调用一次，实现必须是非阻塞的。
pub trait StatePublisher: Send {
    /// 发布按关节顺序排列的当前位置
    fn publish(&mut self, positions: &[f64]);
}

/// 宿主节点
pub trait Node: ParamSource {
    /// 订阅话题
    fn subscribe(&mut self, topic: &str, callback: InputCallback);

    /// 声明发布话题
    fn advertise(&mut self, topic: &str) -> Box<dyn StatePublisher>;
}
