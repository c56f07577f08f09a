//! 竞争窗口结算事件

use super::id::DeviceId;
use super::net_world::WirelessWorld;
use crate::sim::{Event, Simulator, World};

/// 事件：时隙模式下第一个帧到达后经过接收处理时延触发，结算窗口内累积的帧。
#[derive(Debug)]
pub struct ResolveContention {
    pub device: DeviceId,
}

impl Event for ResolveContention {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let ResolveContention { device } = *self;
        let w = world
            .as_any_mut()
            .downcast_mut::<WirelessWorld>()
            .expect("world must be WirelessWorld");
        w.net.on_resolve_contention(device, sim);
    }
}
