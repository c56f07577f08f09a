//! 无线网络（arena）
//!
//! 持有所有信道与设备，负责跨对象的流程：入队 -> 发送状态机 -> 信道扇出 -> 接收。
//! 设备只记信道下标、信道只记设备下标，避免互相持有引用。

use super::address::{MacAddr, MacAllocator};
use super::arrive_frame::ArriveFrame;
use super::channel::Channel;
use super::channel_timer::ChannelTimer;
use super::device::{DeviceConfig, ReceivedFrame, RxCallback, TxState, WirelessDevice};
use super::id::{ChannelId, DeviceId, NodeId};
use super::packet::Packet;
use super::stats::Stats;
use super::transmit_complete::TransmitComplete;
use crate::error::ConfigError;
use crate::error_model::ErrorModel;
use crate::propagation::{ConstantSpeedDelay, PropagationLoss};
use crate::queue::PacketQueue;
use crate::rng::{AssignStreams, DEFAULT_SEED};
use crate::sim::{SimTime, Simulator};
use crate::trace::{TraceEvent, TraceEventKind, TraceLogger, TraceSink};
use tracing::{debug, error, info, trace, warn};

/// 无线网络拓扑
pub struct WirelessNetwork {
    pub(crate) devices: Vec<WirelessDevice>,
    pub(crate) channels: Vec<Channel>,
    addresses: MacAllocator,
    next_pkt_id: u64,
    seed: u64,
    next_stream: u64,
    /// 损耗环节的定时器是否已经启动
    started: bool,
    sinks: Vec<Box<dyn TraceSink>>,
    /// 可选的内存事件记录（驱动程序写 JSON 用）
    pub trace: Option<TraceLogger>,
    /// 全网计数
    pub stats: Stats,
}

impl Default for WirelessNetwork {
    fn default() -> Self {
        Self::with_seed(DEFAULT_SEED)
    }
}

impl WirelessNetwork {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            devices: Vec::new(),
            channels: Vec::new(),
            addresses: MacAllocator::default(),
            next_pkt_id: 0,
            seed,
            next_stream: 0,
            started: false,
            sinks: Vec::new(),
            trace: None,
            stats: Stats::default(),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    // ---------------------------------------------------------------------
    // 拓扑搭建

    pub fn add_channel(&mut self) -> ChannelId {
        let id = ChannelId(self.channels.len());
        self.channels.push(Channel::new(id));
        id
    }

    /// 追加一个损耗环节（按添加顺序生效），并为它分配随机流
    pub fn add_loss_model(&mut self, channel: ChannelId, mut loss: Box<dyn PropagationLoss>) {
        let used = loss.assign_streams(self.seed, self.next_stream);
        self.next_stream = self.next_stream.saturating_add(used);
        debug!(?channel, model = loss.name(), streams = used, "添加损耗模型");
        self.channels[channel.0].losses.push(loss);
    }

    pub fn set_propagation_delay(&mut self, channel: ChannelId, delay: Option<ConstantSpeedDelay>) {
        self.channels[channel.0].delay = delay;
    }

    /// 创建设备（分配地址与随机流），尚未挂到信道上
    pub fn add_device(&mut self, node: NodeId, cfg: &DeviceConfig) -> DeviceId {
        let id = DeviceId(self.devices.len());
        let mut dev = WirelessDevice::new(id, node, self.addresses.allocate(), cfg);
        let used = dev.assign_streams(self.seed, self.next_stream);
        self.next_stream = self.next_stream.saturating_add(used);
        debug!(?id, ?node, address = %dev.address(), "添加设备");
        self.devices.push(dev);
        id
    }

    /// 设备在生命周期内只能挂到一个信道
    pub fn attach(&mut self, device: DeviceId, channel: ChannelId) -> Result<(), ConfigError> {
        let dev = &mut self.devices[device.0];
        if let Some(existing) = dev.channel {
            return Err(ConfigError::AlreadyAttached {
                device,
                channel: existing,
            });
        }
        dev.channel = Some(channel);
        self.channels[channel.0].devices.push(device);
        Ok(())
    }

    pub fn device(&self, id: DeviceId) -> &WirelessDevice {
        &self.devices[id.0]
    }

    pub fn device_mut(&mut self, id: DeviceId) -> &mut WirelessDevice {
        &mut self.devices[id.0]
    }

    pub fn devices(&self) -> &[WirelessDevice] {
        &self.devices
    }

    pub fn channel(&self, id: ChannelId) -> &Channel {
        &self.channels[id.0]
    }

    /// 设备所在的信道
    pub fn channel_of(&self, device: DeviceId) -> Result<ChannelId, ConfigError> {
        self.devices[device.0]
            .channel
            .ok_or(ConfigError::NotAttached(device))
    }

    pub fn find_device(&self, address: MacAddr) -> Option<DeviceId> {
        self.devices
            .iter()
            .find(|d| d.address() == address)
            .map(|d| d.id())
    }

    pub fn set_queue(&mut self, device: DeviceId, queue: Box<dyn PacketQueue>) -> Box<dyn PacketQueue> {
        self.devices[device.0].set_queue(queue)
    }

    pub fn set_error_model(&mut self, device: DeviceId, model: Option<Box<dyn ErrorModel>>) {
        self.devices[device.0].set_error_model(model);
    }

    pub fn set_receive_callback(&mut self, device: DeviceId, cb: RxCallback) {
        self.devices[device.0].set_receive_callback(cb);
    }

    /// 切换时隙模式；若有尚未结算的竞争窗口则取消它，累积的帧记为 MAC 丢弃
    pub fn set_slotted_mode(&mut self, device: DeviceId, enabled: bool, sim: &mut Simulator) {
        let now = sim.now();
        let dev = &mut self.devices[device.0];
        if let Some(ev) = dev.resolve_event.take() {
            sim.cancel(ev);
        }
        dev.slotted = enabled;
        let window = std::mem::take(&mut dev.rx_window);
        if !window.is_empty() {
            warn!(?device, discarded = window.len(), "丢弃未结算的竞争窗口");
        }
        for frame in window {
            let kind = TraceEventKind::MacRxDrop { from: frame.from };
            self.emit(now, device, &frame.packet, kind);
        }
    }

    pub fn add_trace_sink(&mut self, sink: Box<dyn TraceSink>) {
        self.sinks.push(sink);
    }

    /// 重新为全拓扑分配随机流（从 `first_stream` 开始连续编号），返回消耗的流数
    pub fn assign_streams(&mut self, first_stream: u64) -> u64 {
        let mut stream = first_stream;
        for dev in &mut self.devices {
            stream = stream.saturating_add(dev.assign_streams(self.seed, stream));
        }
        for ch in &mut self.channels {
            for loss in &mut ch.losses {
                stream = stream.saturating_add(loss.assign_streams(self.seed, stream));
            }
        }
        self.next_stream = stream;
        stream - first_stream
    }

    /// 启动自调度的损耗环节（例如两状态信道的状态切换）；只生效一次
    pub fn start(&mut self, sim: &mut Simulator) {
        if self.started {
            warn!("无线网络已经启动，忽略重复的 start");
            return;
        }
        self.started = true;
        let now = sim.now();
        for (ch_idx, ch) in self.channels.iter_mut().enumerate() {
            for (idx, loss) in ch.losses.iter_mut().enumerate() {
                if let Some(delay) = loss.start(now) {
                    sim.schedule_in(
                        delay,
                        ChannelTimer {
                            channel: ChannelId(ch_idx),
                            index: idx,
                        },
                    );
                }
            }
        }
        info!(
            devices = self.devices.len(),
            channels = self.channels.len(),
            "📡 无线网络启动"
        );
    }

    pub(crate) fn on_channel_timer(&mut self, channel: ChannelId, index: usize, sim: &mut Simulator) {
        let now = sim.now();
        let Some(loss) = self.channels[channel.0].losses.get_mut(index) else {
            warn!(?channel, index, "损耗环节不存在，定时器作废");
            return;
        };
        if let Some(delay) = loss.on_timer(now) {
            sim.schedule_in(delay, ChannelTimer { channel, index });
        }
    }

    pub fn make_packet(&mut self, size_bytes: u32) -> Packet {
        let id = self.next_pkt_id;
        self.next_pkt_id = self.next_pkt_id.wrapping_add(1);
        Packet::with_size(id, size_bytes)
    }

    // ---------------------------------------------------------------------
    // 观测

    pub(crate) fn emit(&mut self, now: SimTime, device: DeviceId, pkt: &Packet, kind: TraceEventKind) {
        let bytes = pkt.size_bytes();
        self.devices[device.0].stats.record(&kind, bytes);
        self.stats.record(&kind, bytes);
        let ev = TraceEvent {
            t_ns: now.0,
            device: device.0,
            pkt_id: pkt.id,
            pkt_bytes: bytes,
            kind,
        };
        for sink in &mut self.sinks {
            sink.on_trace(&ev);
        }
        if let Some(t) = &mut self.trace {
            t.push(ev);
        }
    }

    // ---------------------------------------------------------------------
    // 发送路径

    /// 不带定向目的节点的发送
    pub fn send(&mut self, device: DeviceId, pkt: Packet, to: MacAddr, protocol: u16, sim: &mut Simulator) -> bool {
        // 没有目的节点时不会查邻居表，不会出错
        self.enqueue(device, pkt, to, protocol, None, sim)
            .unwrap_or(false)
    }

    /// 放入设备发送队列；若发送机空闲则立即开始发送。
    ///
    /// 返回 `Ok(false)` 表示被队列（或 MTU）拒绝；定向模式下目的节点不在邻居表中是配置错误。
    #[tracing::instrument(skip(self, pkt, sim), fields(pkt_id = pkt.id, device = device.0))]
    pub fn enqueue(
        &mut self,
        device: DeviceId,
        mut pkt: Packet,
        to: MacAddr,
        protocol: u16,
        dest_node: Option<NodeId>,
        sim: &mut Simulator,
    ) -> Result<bool, ConfigError> {
        let now = sim.now();
        let dev = &self.devices[device.0];
        if let Some(node) = dest_node {
            if dev.is_directional() && dev.neighbor_address(node).is_none() {
                return Err(ConfigError::UnknownNeighbor { device, node });
            }
        }
        if pkt.size_bytes() > dev.mtu() as u32 {
            warn!(size = pkt.size_bytes(), mtu = dev.mtu(), "packet 超过 MTU，丢弃");
            self.emit(now, device, &pkt, TraceEventKind::QueueDrop);
            return Ok(false);
        }

        pkt.link.src = dev.address();
        pkt.link.dst = to;
        pkt.link.protocol = protocol;
        pkt.tags.enqueued_at = Some(now);
        pkt.tags.dest_node = dest_node;

        let snapshot = pkt.clone();
        match self.devices[device.0].queue.enqueue(pkt) {
            Err(rejected) => {
                debug!(queue_len = self.devices[device.0].queue.len(), "队列已满，拒绝入队");
                self.emit(now, device, &rejected, TraceEventKind::QueueDrop);
                return Ok(false);
            }
            Ok(evicted) => {
                self.emit(now, device, &snapshot, TraceEventKind::QueueEnqueue);
                if let Some(old) = evicted {
                    debug!(evicted = old.id, "队列已满，淘汰队首");
                    self.emit(now, device, &old, TraceEventKind::QueueDrop);
                }
            }
        }

        if self.devices[device.0].tx_state == TxState::Ready {
            self.try_transmit(device, sim);
        }
        Ok(true)
    }

    /// READY 时取队首开始发送；BUSY 时什么也不做
    pub(crate) fn try_transmit(&mut self, device: DeviceId, sim: &mut Simulator) {
        let now = sim.now();
        let dev = &mut self.devices[device.0];
        if dev.tx_state == TxState::Busy {
            trace!(?device, "发送机忙，等待");
            return;
        }
        let Some(pkt) = dev.queue.dequeue() else {
            return;
        };
        let tx_time = dev.data_rate().tx_time(pkt.size_bytes());
        dev.tx_state = TxState::Busy;
        dev.current = Some(pkt.clone());

        let latency = pkt
            .tags
            .enqueued_at
            .map_or(SimTime::ZERO, |t| now.saturating_since(t));
        self.emit(now, device, &pkt, TraceEventKind::QueueDequeue);
        self.emit(
            now,
            device,
            &pkt,
            TraceEventKind::QueueLatency {
                latency_ns: latency.0,
            },
        );

        debug!(?device, pkt_id = pkt.id, tx_time = ?tx_time, "开始发送");
        sim.schedule_in(tx_time, TransmitComplete { device });
    }

    /// 发送完成：交给信道扇出，回到 READY 并立刻检查队列
    #[tracing::instrument(skip(self, sim), fields(device = device.0))]
    pub(crate) fn on_transmit_complete(&mut self, device: DeviceId, sim: &mut Simulator) {
        let now = sim.now();
        let dev = &mut self.devices[device.0];
        let pkt = dev.current.take();
        dev.tx_state = TxState::Ready;

        if let Some(pkt) = pkt {
            self.transmit(device, pkt, now, sim);
        } else {
            warn!("发送完成但没有当前 packet");
        }
        self.try_transmit(device, sim);
    }

    fn transmit(&mut self, device: DeviceId, pkt: Packet, now: SimTime, sim: &mut Simulator) {
        let dev = &self.devices[device.0];
        let to = match pkt.tags.dest_node {
            Some(node) if dev.is_directional() => match dev.neighbor_address(node) {
                Some(mac) => mac,
                None => {
                    error!(?device, ?node, pkt_id = pkt.id, "目的节点不在定向邻居表中，packet 未发送");
                    return;
                }
            },
            _ => pkt.link.dst,
        };
        let Some(channel) = dev.channel else {
            error!(?device, pkt_id = pkt.id, "设备未挂到信道上，packet 未发送");
            return;
        };
        let from = dev.address();
        self.emit(
            now,
            device,
            &pkt,
            TraceEventKind::TxBegin {
                from,
                to,
                protocol: pkt.link.protocol,
            },
        );
        self.propagate(channel, device, &pkt, to, sim);
    }

    /// 信道扇出：对除发送者外的每个设备计算接收功率并交付
    #[tracing::instrument(skip(self, pkt, sim), fields(pkt_id = pkt.id, channel = channel.0, from = sender.0))]
    pub fn propagate(&mut self, channel: ChannelId, sender: DeviceId, pkt: &Packet, to: MacAddr, sim: &mut Simulator) {
        let (tx_power, from_pos, from) = {
            let d = &self.devices[sender.0];
            (d.tx_power_dbm(), d.position(), d.address())
        };
        let receivers = self.channels[channel.0]
            .devices
            .iter()
            .copied()
            .filter(|id| *id != sender)
            .map(|id| (id, self.devices[id.0].position()))
            .collect::<Vec<_>>();

        let ch = &mut self.channels[channel.0];
        let arrivals = receivers
            .into_iter()
            .map(|(id, pos)| {
                let power = ch.rx_power(tx_power, &from_pos, &pos);
                (id, power, ch.propagation_delay(&from_pos, &pos))
            })
            .collect::<Vec<_>>();

        for (rx, rx_power_dbm, delay) in arrivals {
            let frame = ReceivedFrame {
                packet: pkt.clone(),
                rx_power_dbm,
                protocol: pkt.link.protocol,
                to,
                from,
            };
            trace!(rx = rx.0, rx_power_dbm, ?delay, "扇出到接收者");
            if delay == SimTime::ZERO {
                self.receive(rx, frame, sim);
            } else {
                sim.schedule_in(delay, ArriveFrame { device: rx, frame });
            }
        }
    }
}
