//! 接收路径
//!
//! 信道扇出后的帧在这里经过：定向过滤 -> 信号哨兵 -> 误码模型 -> 交付（或进入时隙竞争窗口）。

use super::deliver_frame::DeliverFrame;
use super::device::{ReceivedFrame, RxIndication};
use super::id::DeviceId;
use super::network::WirelessNetwork;
use super::resolve_contention::ResolveContention;
use crate::propagation::NO_SIGNAL_DBM;
use crate::sim::{SimTime, Simulator};
use crate::trace::TraceEventKind;
use tracing::{debug, trace};

impl WirelessNetwork {
    /// 帧到达接收设备
    #[tracing::instrument(skip(self, frame, sim), fields(device = device.0, pkt_id = frame.packet.id))]
    pub(crate) fn receive(&mut self, device: DeviceId, frame: ReceivedFrame, sim: &mut Simulator) {
        let now = sim.now();
        let dev = &mut self.devices[device.0];
        let noise_dbm = dev.noise_power_dbm();

        if dev.is_directional() && !dev.is_neighbor_address(frame.from) {
            debug!(from = %frame.from, "发送者不是定向邻居，静默丢弃");
            return;
        }

        let drop = if frame.rx_power_dbm <= NO_SIGNAL_DBM {
            trace!("无信号");
            true
        } else if let Some(model) = dev.error_model.as_mut() {
            let snr_db = frame.rx_power_dbm - noise_dbm;
            let per = model.error_probability(snr_db, frame.packet.size_bytes());
            let draw = dev.uniform.uniform();
            trace!(snr_db, per, draw, "误码判决");
            draw < per
        } else {
            false
        };

        if drop {
            let kind = TraceEventKind::PhyRxDrop {
                rx_power_dbm: frame.rx_power_dbm,
                from: frame.from,
            };
            self.emit(now, device, &frame.packet, kind);
            return;
        }

        let kind = TraceEventKind::PhyRxEnd {
            rx_power_dbm: frame.rx_power_dbm,
            from: frame.from,
        };
        self.emit(now, device, &frame.packet, kind);

        let dev = &mut self.devices[device.0];
        let delay = dev.rx_processing_delay();
        if dev.slotted {
            dev.rx_window.push(frame);
            if dev.resolve_event.is_none() {
                let id = sim.schedule_in(delay, ResolveContention { device });
                dev.resolve_event = Some(id);
                trace!(?delay, "打开竞争窗口");
            }
        } else if delay == SimTime::ZERO {
            self.deliver(device, frame, now);
        } else {
            sim.schedule_in(delay, DeliverFrame { device, frame });
        }
    }

    /// 上交给上层：先回调，再记 MacRx
    pub(crate) fn deliver(&mut self, device: DeviceId, frame: ReceivedFrame, now: SimTime) {
        let dev = &mut self.devices[device.0];
        let packet_type = dev.classify(frame.to);
        let ReceivedFrame {
            packet,
            protocol,
            to,
            from,
            ..
        } = frame;
        if let Some(cb) = dev.rx_callback.as_mut() {
            let ind = RxIndication {
                device,
                at: now,
                packet: packet.clone(),
                protocol,
                from,
                to,
                packet_type,
            };
            cb(&ind);
        }
        self.emit(now, device, &packet, TraceEventKind::MacRx { from });
    }

    /// 结算竞争窗口：恰好一个帧则交付，否则全部记为碰撞
    #[tracing::instrument(skip(self, sim), fields(device = device.0))]
    pub(crate) fn on_resolve_contention(&mut self, device: DeviceId, sim: &mut Simulator) {
        let now = sim.now();
        let dev = &mut self.devices[device.0];
        dev.resolve_event = None;
        let mut window = std::mem::take(&mut dev.rx_window);

        match window.len() {
            0 => {}
            1 => {
                if let Some(frame) = window.pop() {
                    self.deliver(device, frame, now);
                }
            }
            n => {
                debug!(frames = n, "💥 时隙内碰撞");
                for frame in window {
                    let kind = TraceEventKind::MacRxDrop { from: frame.from };
                    self.emit(now, device, &frame.packet, kind);
                }
            }
        }
    }
}
