//! 圆盘拓扑构建：一个接收者位于圆心，N 个发送者均匀分布在半径 R 的圆盘内

use crate::net::{ChannelId, DeviceConfig, DeviceId, NodeId, WirelessWorld};
use crate::propagation::Position;
use crate::rng::RngStream;
use std::f64::consts::TAU;

/// 圆盘拓扑配置选项
#[derive(Debug, Clone)]
pub struct DiscOpts {
    pub senders: usize,
    pub radius_m: f64,
    pub device: DeviceConfig,
}

impl Default for DiscOpts {
    fn default() -> Self {
        Self {
            senders: 10,
            radius_m: 100.0,
            device: DeviceConfig::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DiscTopology {
    pub channel: ChannelId,
    pub receiver: DeviceId,
    pub senders: Vec<DeviceId>,
}

impl DiscTopology {
    pub fn sender(&self, i: usize) -> DeviceId {
        self.senders[i]
    }
}

/// 构建圆盘拓扑；接收者是节点 0，发送者依次是节点 1..=N
pub fn build_disc(world: &mut WirelessWorld, opts: &DiscOpts, rng: &mut RngStream) -> DiscTopology {
    let net = &mut world.net;
    let channel = net.add_channel();
    let receiver = net.add_device(NodeId(0), &opts.device);

    let mut senders = Vec::with_capacity(opts.senders);
    for i in 0..opts.senders {
        let dev = net.add_device(NodeId(i + 1), &opts.device);
        // 面积均匀：半径取 R * sqrt(u)
        let r = opts.radius_m * rng.uniform().sqrt();
        let theta = TAU * rng.uniform();
        net.device_mut(dev)
            .set_position(Position::new(r * theta.cos(), r * theta.sin(), 0.0));
        senders.push(dev);
    }

    for dev in std::iter::once(receiver).chain(senders.iter().copied()) {
        if let Err(e) = net.attach(dev, channel) {
            tracing::error!(%e, "挂载设备失败");
        }
    }
    DiscTopology {
        channel,
        receiver,
        senders,
    }
}
