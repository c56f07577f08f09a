//! 点对点链路拓扑构建

use crate::net::{ChannelId, DeviceConfig, DeviceId, NodeId, WirelessWorld};
use crate::propagation::Position;

/// 点对点链路配置选项
#[derive(Debug, Clone)]
pub struct LinkPairOpts {
    /// 两个设备之间的距离（米）
    pub distance_m: f64,
    pub device: DeviceConfig,
}

impl Default for LinkPairOpts {
    fn default() -> Self {
        Self {
            distance_m: 100.0,
            device: DeviceConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LinkPair {
    pub channel: ChannelId,
    pub tx: DeviceId,
    pub rx: DeviceId,
}

/// 构建点对点链路
///
/// 拓扑结构：tx(0,0,0) ~~ rx(distance,0,0)，共用一个信道。损耗链由调用方追加。
pub fn build_link_pair(world: &mut WirelessWorld, opts: &LinkPairOpts) -> LinkPair {
    let net = &mut world.net;
    let channel = net.add_channel();
    let tx = net.add_device(NodeId(0), &opts.device);
    let rx = net.add_device(NodeId(1), &opts.device);
    net.device_mut(tx).set_position(Position::new(0.0, 0.0, 0.0));
    net.device_mut(rx).set_position(Position::new(opts.distance_m, 0.0, 0.0));

    // 新建设备，不会重复挂载
    for dev in [tx, rx] {
        if let Err(e) = net.attach(dev, channel) {
            tracing::error!(%e, "挂载设备失败");
        }
    }
    LinkPair { channel, tx, rx }
}
