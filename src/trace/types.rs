use serde::{Deserialize, Serialize};

use crate::net::MacAddr;

/// 观测事件类型
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TraceEventKind {
    /// packet 进入设备发送队列
    QueueEnqueue,
    /// packet 离开队列、准备发送
    QueueDequeue,
    /// 队列拒绝或淘汰了 packet（含超过 MTU 的 packet）
    QueueDrop,
    /// 出队时报告排队时延（只统计真正发出去的 packet）
    QueueLatency { latency_ns: u64 },
    /// 发送完成，交给信道扇出
    TxBegin {
        from: MacAddr,
        to: MacAddr,
        protocol: u16,
    },
    /// PHY 接收成功
    PhyRxEnd { rx_power_dbm: f64, from: MacAddr },
    /// PHY 因误码（或无信号）丢弃
    PhyRxDrop { rx_power_dbm: f64, from: MacAddr },
    /// 交付给上层
    MacRx { from: MacAddr },
    /// 竞争窗口内发生碰撞，MAC 丢弃
    MacRxDrop { from: MacAddr },
}

/// 一条观测事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEvent {
    /// 仿真时间（纳秒，和 `SimTime.0` 同口径）
    pub t_ns: u64,
    /// 产生事件的设备下标
    pub device: usize,
    pub pkt_id: u64,
    pub pkt_bytes: u32,
    #[serde(flatten)]
    pub kind: TraceEventKind,
}

/// 外部观察者
pub trait TraceSink: Send {
    fn on_trace(&mut self, ev: &TraceEvent);
}

impl<F> TraceSink for F
where
    F: FnMut(&TraceEvent) + Send,
{
    fn on_trace(&mut self, ev: &TraceEvent) {
        self(ev)
    }
}

/// 一个简单的事件收集器（存内存，仿真结束写 JSON 文件）
#[derive(Debug, Default)]
pub struct TraceLogger {
    pub events: Vec<TraceEvent>,
}

impl TraceLogger {
    pub fn push(&mut self, ev: TraceEvent) {
        self.events.push(ev);
    }

    pub fn count(&self, pred: impl Fn(&TraceEventKind) -> bool) -> usize {
        self.events.iter().filter(|ev| pred(&ev.kind)).count()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.events)
    }
}
