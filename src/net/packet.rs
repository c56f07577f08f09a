//! 数据包类型
//!
//! payload 不可变（`Arc<[u8]>`，克隆只增加引用计数），旁路元数据用显式字段携带，
//! 不属于 payload。

use std::sync::Arc;

use super::address::MacAddr;
use super::id::NodeId;
use crate::sim::SimTime;

/// 入队时打上的标签
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PacketTags {
    /// 进入设备队列的时间（用于排队时延统计）
    pub enqueued_at: Option<SimTime>,
    /// 定向模式下的目的节点
    pub dest_node: Option<NodeId>,
}

/// 链路层头部（入队时由设备填写）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkHeader {
    pub src: MacAddr,
    pub dst: MacAddr,
    pub protocol: u16,
}

/// 无线数据包
#[derive(Debug, Clone)]
pub struct Packet {
    pub id: u64,
    payload: Arc<[u8]>,
    pub tags: PacketTags,
    pub link: LinkHeader,
}

impl Packet {
    pub fn new(id: u64, payload: impl Into<Arc<[u8]>>) -> Self {
        Self {
            id,
            payload: payload.into(),
            tags: PacketTags::default(),
            link: LinkHeader::default(),
        }
    }

    /// 全零 payload 的 packet
    pub fn with_size(id: u64, size_bytes: u32) -> Self {
        Self::new(id, vec![0u8; size_bytes as usize])
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn size_bytes(&self) -> u32 {
        self.payload.len().min(u32::MAX as usize) as u32
    }
}
