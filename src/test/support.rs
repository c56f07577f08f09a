use crate::net::{ChannelId, DeviceConfig, DeviceId, NodeId, WirelessWorld};
use crate::propagation::Position;
use crate::sim::Simulator;
use crate::trace::{TraceEvent, TraceEventKind, TraceLogger};

pub(super) struct Fixture {
    pub sim: Simulator,
    pub world: WirelessWorld,
    pub channel: ChannelId,
    pub devices: Vec<DeviceId>,
}

/// `n` 个设备挂在同一个无损信道上，设备 i 位于 x = i 米处，开启 trace 记录
pub(super) fn fixture(n: usize, cfg: &DeviceConfig) -> Fixture {
    let mut world = WirelessWorld::default();
    world.net.trace = Some(TraceLogger::default());
    let channel = world.net.add_channel();
    let devices = (0..n)
        .map(|i| {
            let dev = world.net.add_device(NodeId(i), cfg);
            world
                .net
                .device_mut(dev)
                .set_position(Position::new(i as f64, 0.0, 0.0));
            world.net.attach(dev, channel).expect("attach");
            dev
        })
        .collect();
    Fixture {
        sim: Simulator::default(),
        world,
        channel,
        devices,
    }
}

impl Fixture {
    pub fn traces(&self) -> &[TraceEvent] {
        &self.world.net.trace.as_ref().expect("trace enabled").events
    }

    /// 某设备上满足条件的 trace 事件
    pub fn events_at(&self, dev: DeviceId, pred: impl Fn(&TraceEventKind) -> bool) -> Vec<&TraceEvent> {
        self.traces()
            .iter()
            .filter(|ev| ev.device == dev.0 && pred(&ev.kind))
            .collect()
    }

    pub fn count_at(&self, dev: DeviceId, pred: impl Fn(&TraceEventKind) -> bool) -> usize {
        self.events_at(dev, pred).len()
    }
}

pub(super) fn is_mac_rx(k: &TraceEventKind) -> bool {
    matches!(k, TraceEventKind::MacRx { .. })
}

pub(super) fn is_mac_rx_drop(k: &TraceEventKind) -> bool {
    matches!(k, TraceEventKind::MacRxDrop { .. })
}

pub(super) fn is_phy_rx_end(k: &TraceEventKind) -> bool {
    matches!(k, TraceEventKind::PhyRxEnd { .. })
}

pub(super) fn is_phy_rx_drop(k: &TraceEventKind) -> bool {
    matches!(k, TraceEventKind::PhyRxDrop { .. })
}

pub(super) fn is_tx_begin(k: &TraceEventKind) -> bool {
    matches!(k, TraceEventKind::TxBegin { .. })
}

pub(super) fn is_queue_drop(k: &TraceEventKind) -> bool {
    matches!(k, TraceEventKind::QueueDrop)
}
