//! 信道损耗环节的自调度定时器

use super::id::ChannelId;
use super::net_world::WirelessWorld;
use crate::sim::{Event, Simulator, World};

/// 事件：损耗环节请求的定时回调（例如两状态信道切换状态）。
#[derive(Debug)]
pub struct ChannelTimer {
    pub channel: ChannelId,
    /// 损耗链中的下标
    pub index: usize,
}

impl Event for ChannelTimer {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let ChannelTimer { channel, index } = *self;
        let w = world
            .as_any_mut()
            .downcast_mut::<WirelessWorld>()
            .expect("world must be WirelessWorld");
        w.net.on_channel_timer(channel, index, sim);
    }
}
