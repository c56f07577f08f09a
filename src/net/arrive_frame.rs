//! 帧到达事件（传播时延非零时使用）

use super::device::ReceivedFrame;
use super::id::DeviceId;
use super::net_world::WirelessWorld;
use crate::sim::{Event, Simulator, World};
use tracing::trace;

/// 事件：帧经过传播时延后到达接收设备的 PHY。
#[derive(Debug)]
pub struct ArriveFrame {
    pub device: DeviceId,
    pub frame: ReceivedFrame,
}

impl Event for ArriveFrame {
    #[tracing::instrument(skip(self, sim, world), fields(pkt_id = self.frame.packet.id, device = self.device.0))]
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let ArriveFrame { device, frame } = *self;
        trace!(now = ?sim.now(), rx_power_dbm = frame.rx_power_dbm, "帧到达");
        let w = world
            .as_any_mut()
            .downcast_mut::<WirelessWorld>()
            .expect("world must be WirelessWorld");
        w.net.receive(device, frame, sim);
    }
}
