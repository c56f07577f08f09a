//! 队列策略（Queue disciplines）
//!
//! 设备发送队列按 packet 个数限长；溢出时的处理由具体策略决定：
//! DropTail 拒绝新到达的 packet，DropHead 挤掉队首最老的 packet。

use serde::{Deserialize, Serialize};

use crate::net::Packet;

mod drop_head;
mod drop_tail;

pub use drop_head::DropHeadQueue;
pub use drop_tail::DropTailQueue;

pub const DEFAULT_MAX_PACKETS: usize = 100;

/// Packet 队列抽象
pub trait PacketQueue: std::fmt::Debug + Send {
    /// 入队：
    /// - `Ok(None)`：直接入队
    /// - `Ok(Some(old))`：入队成功，但为腾出空间挤掉了 `old`
    /// - `Err(pkt)`：被拒绝，队列不变
    fn enqueue(&mut self, pkt: Packet) -> Result<Option<Packet>, Packet>;
    /// 出队：按 FIFO 返回队首 packet
    fn dequeue(&mut self) -> Option<Packet>;
    fn peek(&self) -> Option<&Packet>;

    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// 当前排队的总字节数
    fn bytes(&self) -> u64;
    fn capacity_packets(&self) -> usize;
}

/// 队列溢出策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    #[default]
    DropTail,
    DropHead,
}

impl OverflowPolicy {
    pub fn build(self, max_packets: usize) -> Box<dyn PacketQueue> {
        match self {
            OverflowPolicy::DropTail => Box::new(DropTailQueue::new(max_packets)),
            OverflowPolicy::DropHead => Box::new(DropHeadQueue::new(max_packets)),
        }
    }
}
