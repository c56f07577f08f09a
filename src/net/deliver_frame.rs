//! 帧上交事件

use super::device::ReceivedFrame;
use super::id::DeviceId;
use super::net_world::WirelessWorld;
use crate::sim::{Event, Simulator, World};

/// 事件：非时隙模式下，经过接收处理时延后把帧交给上层。
#[derive(Debug)]
pub struct DeliverFrame {
    pub device: DeviceId,
    pub frame: ReceivedFrame,
}

impl Event for DeliverFrame {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let DeliverFrame { device, frame } = *self;
        let now = sim.now();
        let w = world
            .as_any_mut()
            .downcast_mut::<WirelessWorld>()
            .expect("world must be WirelessWorld");
        w.net.deliver(device, frame, now);
    }
}
