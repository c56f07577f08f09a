//! 无线网络模块
//!
//! 此模块包含无线链路层模型的核心组件：地址、数据包、半双工设备、共享信道，
//! 以及把它们串起来的网络拓扑和事件。

// 子模块声明
mod address;
mod arrive_frame;
mod channel;
mod channel_timer;
mod data_rate;
mod deliver_frame;
mod device;
mod id;
mod net_world;
mod network;
mod network_rx;
mod packet;
mod resolve_contention;
mod stats;
mod transmit_complete;

// 重新导出公共接口
pub use address::{MacAddr, MacAllocator};
pub use arrive_frame::ArriveFrame;
pub use channel::Channel;
pub use channel_timer::ChannelTimer;
pub use data_rate::DataRate;
pub use deliver_frame::DeliverFrame;
pub use device::{
    DeviceConfig, PacketType, ReceivedFrame, RxCallback, RxIndication, TxState, WirelessDevice,
};
pub use id::{ChannelId, DeviceId, NodeId};
pub use net_world::{StopCondition, WirelessWorld};
pub use network::WirelessNetwork;
pub use packet::{LinkHeader, Packet, PacketTags};
pub use resolve_contention::ResolveContention;
pub use stats::Stats;
pub use transmit_complete::TransmitComplete;
