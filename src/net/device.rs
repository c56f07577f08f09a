//! 无线设备
//!
//! 半双工：同一时刻最多发送一个 packet（READY/BUSY 状态机），
//! 接收侧依次做定向过滤、误码判定，以及（时隙模式下的）碰撞结算。
//! 跨设备的流程（发送完成 -> 信道扇出 -> 接收）由 `WirelessNetwork` 驱动，
//! 这里只保存单个设备的状态与配置。

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::address::MacAddr;
use super::data_rate::DataRate;
use super::id::{ChannelId, DeviceId, NodeId};
use super::packet::Packet;
use super::stats::Stats;
use crate::error_model::ErrorModel;
use crate::propagation::Position;
use crate::queue::{DEFAULT_MAX_PACKETS, OverflowPolicy, PacketQueue};
use crate::rng::{AssignStreams, RngStream};
use crate::sim::{EventId, SimTime};

/// 发送状态机
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxState {
    /// 空闲，可以开始发送
    Ready,
    /// 正在发送一个 packet
    Busy,
}

/// 设备配置（运行前设置一次）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub data_rate_bps: u64,
    pub tx_power_dbm: f64,
    pub noise_power_dbm: f64,
    pub queue_packets: usize,
    pub overflow: OverflowPolicy,
    /// 时隙（竞争）模式：同一窗口内收到多个 packet 视为碰撞
    pub slotted: bool,
    /// 接收处理时延（纳秒）；时隙模式下即竞争窗口长度
    pub rx_processing_delay_ns: u64,
    pub mtu: u16,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            data_rate_bps: 10_000_000,
            tx_power_dbm: 16.0,
            noise_power_dbm: -100.0,
            queue_packets: DEFAULT_MAX_PACKETS,
            overflow: OverflowPolicy::DropTail,
            slotted: false,
            rx_processing_delay_ns: 0,
            mtu: 1500,
        }
    }
}

/// PHY 判定通过、等待交付的帧
#[derive(Debug, Clone)]
pub struct ReceivedFrame {
    pub packet: Packet,
    pub rx_power_dbm: f64,
    pub protocol: u16,
    pub to: MacAddr,
    pub from: MacAddr,
}

/// 帧相对本设备的地址类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketType {
    Host,
    Broadcast,
    Multicast,
    OtherHost,
}

/// 交付给上层的接收指示
#[derive(Debug, Clone)]
pub struct RxIndication {
    pub device: DeviceId,
    pub at: SimTime,
    pub packet: Packet,
    pub protocol: u16,
    pub from: MacAddr,
    pub to: MacAddr,
    pub packet_type: PacketType,
}

/// 上层接收回调
pub type RxCallback = Box<dyn FnMut(&RxIndication) + Send>;

pub struct WirelessDevice {
    id: DeviceId,
    node: NodeId,
    address: MacAddr,
    pub(crate) channel: Option<ChannelId>,
    position: Position,

    data_rate: DataRate,
    tx_power_dbm: f64,
    noise_power_dbm: f64,
    mtu: u16,
    pub(crate) slotted: bool,
    rx_processing_delay: SimTime,

    pub(crate) queue: Box<dyn PacketQueue>,
    pub(crate) error_model: Option<Box<dyn ErrorModel>>,

    pub(crate) tx_state: TxState,
    pub(crate) current: Option<Packet>,

    neighbors: BTreeMap<NodeId, MacAddr>,
    directional: bool,

    // 时隙模式：当前竞争窗口内收到的帧，以及窗口结算事件
    pub(crate) rx_window: Vec<ReceivedFrame>,
    pub(crate) resolve_event: Option<EventId>,

    pub(crate) uniform: RngStream,
    pub(crate) rx_callback: Option<RxCallback>,
    pub(crate) stats: Stats,
}

impl std::fmt::Debug for WirelessDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WirelessDevice")
            .field("id", &self.id)
            .field("node", &self.node)
            .field("address", &self.address)
            .field("channel", &self.channel)
            .field("tx_state", &self.tx_state)
            .field("queue_len", &self.queue.len())
            .field("slotted", &self.slotted)
            .field("directional", &self.directional)
            .finish_non_exhaustive()
    }
}

impl WirelessDevice {
    pub(crate) fn new(id: DeviceId, node: NodeId, address: MacAddr, cfg: &DeviceConfig) -> Self {
        Self {
            id,
            node,
            address,
            channel: None,
            position: Position::default(),
            data_rate: DataRate(cfg.data_rate_bps),
            tx_power_dbm: cfg.tx_power_dbm,
            noise_power_dbm: cfg.noise_power_dbm,
            mtu: cfg.mtu,
            slotted: cfg.slotted,
            rx_processing_delay: SimTime(cfg.rx_processing_delay_ns),
            queue: cfg.overflow.build(cfg.queue_packets),
            error_model: None,
            tx_state: TxState::Ready,
            current: None,
            neighbors: BTreeMap::new(),
            directional: false,
            rx_window: Vec::new(),
            resolve_event: None,
            uniform: RngStream::default(),
            rx_callback: None,
            stats: Stats::default(),
        }
    }

    pub fn id(&self) -> DeviceId {
        self.id
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn address(&self) -> MacAddr {
        self.address
    }

    pub fn set_address(&mut self, address: MacAddr) {
        self.address = address;
    }

    pub fn channel(&self) -> Option<ChannelId> {
        self.channel
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn set_position(&mut self, position: Position) {
        self.position = position;
    }

    pub fn data_rate(&self) -> DataRate {
        self.data_rate
    }

    pub fn set_data_rate(&mut self, rate: DataRate) {
        self.data_rate = rate;
    }

    pub fn tx_power_dbm(&self) -> f64 {
        self.tx_power_dbm
    }

    pub fn set_tx_power_dbm(&mut self, dbm: f64) {
        self.tx_power_dbm = dbm;
    }

    pub fn noise_power_dbm(&self) -> f64 {
        self.noise_power_dbm
    }

    pub fn set_noise_power_dbm(&mut self, dbm: f64) {
        self.noise_power_dbm = dbm;
    }

    pub fn mtu(&self) -> u16 {
        self.mtu
    }

    pub fn set_mtu(&mut self, mtu: u16) {
        self.mtu = mtu;
    }

    pub fn rx_processing_delay(&self) -> SimTime {
        self.rx_processing_delay
    }

    pub fn set_rx_processing_delay(&mut self, delay: SimTime) {
        self.rx_processing_delay = delay;
    }

    pub fn is_slotted(&self) -> bool {
        self.slotted
    }

    pub fn tx_state(&self) -> TxState {
        self.tx_state
    }

    pub fn queue(&self) -> &dyn PacketQueue {
        self.queue.as_ref()
    }

    /// 替换发送队列，返回旧队列（其中的 packet 随之交还给调用者）
    pub fn set_queue(&mut self, queue: Box<dyn PacketQueue>) -> Box<dyn PacketQueue> {
        std::mem::replace(&mut self.queue, queue)
    }

    pub fn error_model(&self) -> Option<&dyn ErrorModel> {
        self.error_model.as_deref()
    }

    pub fn set_error_model(&mut self, model: Option<Box<dyn ErrorModel>>) {
        self.error_model = model;
    }

    pub fn set_receive_callback(&mut self, cb: RxCallback) {
        self.rx_callback = Some(cb);
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    /// 当前竞争窗口内累积的帧数
    pub fn pending_receptions(&self) -> usize {
        self.rx_window.len()
    }

    pub fn has_pending_resolution(&self) -> bool {
        self.resolve_event.is_some()
    }

    // ---------------------------------------------------------------------
    // 定向邻居

    /// 批量添加；只要有一个是新邻居就返回 true
    pub fn add_directional_neighbors(&mut self, nodes: BTreeMap<NodeId, MacAddr>) -> bool {
        let mut added = false;
        for (node, mac) in nodes {
            added |= self.add_directional_neighbor(node, mac);
        }
        added
    }

    /// 添加一个邻居并开启定向过滤；已存在时不覆盖并返回 false
    pub fn add_directional_neighbor(&mut self, node: NodeId, mac: MacAddr) -> bool {
        self.directional = true;
        if self.neighbors.contains_key(&node) {
            debug!(device = ?self.id, ?node, "directional neighbor already present");
            return false;
        }
        self.neighbors.insert(node, mac);
        true
    }

    pub fn delete_directional_neighbors(&mut self, nodes: &BTreeSet<NodeId>) {
        for node in nodes {
            self.delete_directional_neighbor(*node);
        }
    }

    /// 删除邻居；定向过滤保持开启
    pub fn delete_directional_neighbor(&mut self, node: NodeId) {
        self.neighbors.remove(&node);
    }

    pub fn directional_neighbors(&self) -> &BTreeMap<NodeId, MacAddr> {
        &self.neighbors
    }

    pub fn is_directional(&self) -> bool {
        self.directional
    }

    pub fn neighbor_address(&self, node: NodeId) -> Option<MacAddr> {
        self.neighbors.get(&node).copied()
    }

    pub(crate) fn is_neighbor_address(&self, mac: MacAddr) -> bool {
        self.neighbors.values().any(|m| *m == mac)
    }

    pub(crate) fn classify(&self, to: MacAddr) -> PacketType {
        if to == self.address {
            PacketType::Host
        } else if to.is_broadcast() {
            PacketType::Broadcast
        } else if to.is_group() {
            PacketType::Multicast
        } else {
            PacketType::OtherHost
        }
    }
}

impl AssignStreams for WirelessDevice {
    fn assign_streams(&mut self, seed: u64, first_stream: u64) -> u64 {
        self.uniform.set_stream(seed, first_stream);
        1
    }
}
