//! 发送完成事件

use super::id::DeviceId;
use super::net_world::WirelessWorld;
use crate::sim::{Event, Simulator, World};

/// 事件：设备把当前帧的最后一个 bit 发出去之后触发，帧进入信道，发送机回到 READY。
#[derive(Debug)]
pub struct TransmitComplete {
    pub device: DeviceId,
}

impl Event for TransmitComplete {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let TransmitComplete { device } = *self;
        let w = world
            .as_any_mut()
            .downcast_mut::<WirelessWorld>()
            .expect("world must be WirelessWorld");
        w.net.on_transmit_complete(device, sim);
    }
}
