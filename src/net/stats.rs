//! 统计信息
//!
//! 每个设备一份、全网一份；都在 trace 发出的同一处更新，
//! 驱动程序直接读取，不需要全局计数器。

use crate::trace::TraceEventKind;

/// 计数器
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    pub enqueued_pkts: u64,
    pub queue_dropped_pkts: u64,
    pub tx_pkts: u64,
    pub tx_bytes: u64,
    pub phy_rx_pkts: u64,
    pub phy_rx_dropped_pkts: u64,
    pub delivered_pkts: u64,
    pub delivered_bytes: u64,
    pub collided_pkts: u64,
}

impl Stats {
    pub(crate) fn record(&mut self, kind: &TraceEventKind, bytes: u32) {
        let bytes = bytes as u64;
        match kind {
            TraceEventKind::QueueEnqueue => self.enqueued_pkts += 1,
            TraceEventKind::QueueDrop => self.queue_dropped_pkts += 1,
            TraceEventKind::TxBegin { .. } => {
                self.tx_pkts += 1;
                self.tx_bytes += bytes;
            }
            TraceEventKind::PhyRxEnd { .. } => self.phy_rx_pkts += 1,
            TraceEventKind::PhyRxDrop { .. } => self.phy_rx_dropped_pkts += 1,
            TraceEventKind::MacRx { .. } => {
                self.delivered_pkts += 1;
                self.delivered_bytes += bytes;
            }
            TraceEventKind::MacRxDrop { .. } => self.collided_pkts += 1,
            TraceEventKind::QueueDequeue | TraceEventKind::QueueLatency { .. } => {}
        }
    }
}
