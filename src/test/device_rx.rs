use super::support::{fixture, is_mac_rx, is_mac_rx_drop, is_phy_rx_drop, is_phy_rx_end};
use crate::error_model::TableErrorModel;
use crate::net::{DeviceConfig, MacAddr, NodeId};
use crate::propagation::{
    ConstantSpeedDelay, FixedLoss, LogDistanceLoss, Position, TwoStateConfig, TwoStateLoss,
};
use crate::sim::SimTime;

const PROTO: u16 = 1;

fn slotted(delay: SimTime) -> DeviceConfig {
    DeviceConfig {
        slotted: true,
        rx_processing_delay_ns: delay.0,
        ..DeviceConfig::default()
    }
}

#[test]
fn single_frame_in_window_is_delivered() {
    let mut f = fixture(2, &slotted(SimTime::ZERO));
    let (tx, rx) = (f.devices[0], f.devices[1]);
    let to = f.world.net.device(rx).address();
    let pkt = f.world.net.make_packet(125);
    f.world.net.send(tx, pkt, to, PROTO, &mut f.sim);
    f.sim.run(&mut f.world);

    assert_eq!(f.count_at(rx, is_phy_rx_end), 1);
    assert_eq!(f.count_at(rx, is_mac_rx), 1);
    assert_eq!(f.count_at(rx, is_mac_rx_drop), 0);
    assert_eq!(f.world.net.device(rx).pending_receptions(), 0);
    assert!(!f.world.net.device(rx).has_pending_resolution());
}

#[test]
fn simultaneous_frames_collide_and_none_is_delivered() {
    let mut f = fixture(4, &slotted(SimTime::ZERO));
    let rx = f.devices[0];
    let to = f.world.net.device(rx).address();
    for &tx in &f.devices[1..] {
        let pkt = f.world.net.make_packet(125);
        f.world.net.send(tx, pkt, to, PROTO, &mut f.sim);
    }
    f.sim.run(&mut f.world);

    assert_eq!(f.count_at(rx, is_phy_rx_end), 3);
    assert_eq!(f.count_at(rx, is_mac_rx), 0);
    let drops = f.events_at(rx, is_mac_rx_drop);
    assert_eq!(drops.len(), 3);
    let mut ids: Vec<u64> = drops.iter().map(|e| e.pkt_id).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![0, 1, 2]);
    assert_eq!(f.world.net.device(rx).stats().collided_pkts, 3);
    assert_eq!(f.world.net.device(rx).pending_receptions(), 0);
}

#[test]
fn processing_delay_defines_the_contention_window() {
    // 10 Mbps：1250 字节 1 ms，1300 字节 1.04 ms，1400 字节 1.12 ms；窗口 50 µs
    let window = SimTime::from_micros(50);
    for (second_bytes, collide) in [(1300, true), (1400, false)] {
        let mut f = fixture(3, &slotted(window));
        let (rx, a, b) = (f.devices[0], f.devices[1], f.devices[2]);
        let to = f.world.net.device(rx).address();
        let pkt = f.world.net.make_packet(1250);
        f.world.net.send(a, pkt, to, PROTO, &mut f.sim);
        let pkt = f.world.net.make_packet(second_bytes);
        f.world.net.send(b, pkt, to, PROTO, &mut f.sim);
        f.sim.run(&mut f.world);

        if collide {
            assert_eq!(f.count_at(rx, is_mac_rx_drop), 2);
            assert_eq!(f.count_at(rx, is_mac_rx), 0);
        } else {
            assert_eq!(f.count_at(rx, is_mac_rx_drop), 0);
            let times: Vec<u64> = f.events_at(rx, is_mac_rx).iter().map(|e| e.t_ns).collect();
            assert_eq!(times, vec![1_050_000, 1_170_000]);
        }
    }
}

#[test]
fn phy_dropped_frame_does_not_count_as_collision() {
    // 近处发送者 SNR 高（PER 0），远处发送者 SNR 低于表的下限（PER 1）
    let mut f = fixture(3, &slotted(SimTime::ZERO));
    let (rx, near, far) = (f.devices[0], f.devices[1], f.devices[2]);
    f.world
        .net
        .device_mut(far)
        .set_position(Position::new(10_000.0, 0.0, 0.0));
    f.world
        .net
        .add_loss_model(f.channel, Box::new(LogDistanceLoss::default()));
    let mut table = TableErrorModel::default();
    table.add_value(0.0, 1.0).expect("valid control point");
    table.add_value(10.0, 0.0).expect("valid control point");
    f.world.net.set_error_model(rx, Some(Box::new(table)));

    let to = f.world.net.device(rx).address();
    for tx in [near, far] {
        let pkt = f.world.net.make_packet(125);
        f.world.net.send(tx, pkt, to, PROTO, &mut f.sim);
    }
    f.sim.run(&mut f.world);

    assert_eq!(f.count_at(rx, is_phy_rx_drop), 1);
    assert_eq!(f.count_at(rx, is_mac_rx_drop), 0);
    let got = f.events_at(rx, is_mac_rx);
    assert_eq!(got.len(), 1);
    assert_eq!(got[0].pkt_id, 0);
}

#[test]
fn error_model_probability_decides_phy_outcome() {
    // 无损信道：SNR = 16 - (-100) = 116 dB，高于表的上限
    for (points, expect_drop) in [(vec![], true), (vec![(-100.0, 1.0), (0.0, 0.0)], false)] {
        let mut f = fixture(2, &DeviceConfig::default());
        let (tx, rx) = (f.devices[0], f.devices[1]);
        let mut table = TableErrorModel::default();
        for (snr, per) in points {
            table.add_value(snr, per).expect("valid control point");
        }
        f.world.net.set_error_model(rx, Some(Box::new(table)));
        for _ in 0..20 {
            let pkt = f.world.net.make_packet(100);
            f.world.net.send(tx, pkt, MacAddr::BROADCAST, PROTO, &mut f.sim);
        }
        f.sim.run(&mut f.world);

        let (drops, delivered) = (f.count_at(rx, is_phy_rx_drop), f.count_at(rx, is_mac_rx));
        if expect_drop {
            assert_eq!((drops, delivered), (20, 0));
        } else {
            assert_eq!((drops, delivered), (0, 20));
        }
    }
}

#[test]
fn no_signal_power_is_always_dropped() {
    let mut f = fixture(2, &DeviceConfig::default());
    let (tx, rx) = (f.devices[0], f.devices[1]);
    // 两状态信道 GOOD 时必丢，后面再接一级固定损耗把功率压到哨兵以下
    let cfg = TwoStateConfig {
        per_good: 1.0,
        ..TwoStateConfig::default()
    };
    f.world.net.add_loss_model(
        f.channel,
        Box::new(TwoStateLoss::new(cfg).expect("valid config")),
    );
    f.world
        .net
        .add_loss_model(f.channel, Box::new(FixedLoss { loss_db: 3.0 }));
    f.world.net.start(&mut f.sim);

    let pkt = f.world.net.make_packet(100);
    f.world.net.send(tx, pkt, MacAddr::BROADCAST, PROTO, &mut f.sim);
    f.sim.run_until(SimTime::from_millis(1), &mut f.world);

    let drops = f.events_at(rx, is_phy_rx_drop);
    assert_eq!(drops.len(), 1);
    assert!(matches!(
        drops[0].kind,
        crate::trace::TraceEventKind::PhyRxDrop { rx_power_dbm, .. } if rx_power_dbm < -1000.0
    ));
    assert_eq!(f.count_at(rx, is_mac_rx), 0);
}

#[test]
fn directional_receiver_ignores_non_neighbors_silently() {
    let mut f = fixture(3, &DeviceConfig::default());
    let (rx, friend, stranger) = (f.devices[0], f.devices[1], f.devices[2]);
    let friend_mac = f.world.net.device(friend).address();
    f.world
        .net
        .device_mut(rx)
        .add_directional_neighbor(NodeId(1), friend_mac);

    let to = f.world.net.device(rx).address();
    for tx in [friend, stranger] {
        let pkt = f.world.net.make_packet(100);
        f.world.net.send(tx, pkt, to, PROTO, &mut f.sim);
    }
    f.sim.run(&mut f.world);

    // 陌生发送者的帧没有任何 trace
    let from_stranger = f
        .traces()
        .iter()
        .filter(|e| e.device == rx.0 && e.pkt_id == 1)
        .count();
    assert_eq!(from_stranger, 0);
    assert_eq!(f.count_at(rx, is_mac_rx), 1);
}

#[test]
fn non_slotted_processing_delay_defers_delivery() {
    let cfg = DeviceConfig {
        rx_processing_delay_ns: SimTime::from_micros(30).0,
        ..DeviceConfig::default()
    };
    let mut f = fixture(2, &cfg);
    let (tx, rx) = (f.devices[0], f.devices[1]);
    let pkt = f.world.net.make_packet(1250);
    f.world.net.send(tx, pkt, MacAddr::BROADCAST, PROTO, &mut f.sim);
    f.sim.run(&mut f.world);

    assert_eq!(f.events_at(rx, is_phy_rx_end)[0].t_ns, 1_000_000);
    assert_eq!(f.events_at(rx, is_mac_rx)[0].t_ns, 1_030_000);
}

#[test]
fn propagation_delay_schedules_arrival() {
    let mut f = fixture(2, &DeviceConfig::default());
    let (tx, rx) = (f.devices[0], f.devices[1]);
    f.world
        .net
        .set_propagation_delay(f.channel, Some(ConstantSpeedDelay { speed_mps: 1000.0 }));
    f.world
        .net
        .device_mut(rx)
        .set_position(Position::new(100.0, 0.0, 0.0));
    let pkt = f.world.net.make_packet(1250);
    f.world.net.send(tx, pkt, MacAddr::BROADCAST, PROTO, &mut f.sim);
    f.sim.run(&mut f.world);

    // 1 ms 发送 + 100 ms 传播
    assert_eq!(f.events_at(rx, is_mac_rx)[0].t_ns, 101_000_000);
}

#[test]
fn leaving_slotted_mode_cancels_pending_window() {
    let mut f = fixture(2, &slotted(SimTime::from_millis(1)));
    let (tx, rx) = (f.devices[0], f.devices[1]);
    let pkt = f.world.net.make_packet(1250);
    f.world.net.send(tx, pkt, MacAddr::BROADCAST, PROTO, &mut f.sim);
    f.sim.run_until(SimTime::from_micros(1500), &mut f.world);
    assert_eq!(f.world.net.device(rx).pending_receptions(), 1);
    assert!(f.world.net.device(rx).has_pending_resolution());

    f.world.net.set_slotted_mode(rx, false, &mut f.sim);
    assert!(!f.world.net.device(rx).is_slotted());
    assert_eq!(f.world.net.device(rx).pending_receptions(), 0);
    assert!(!f.world.net.device(rx).has_pending_resolution());

    // 被丢弃的帧仍然记一次 MAC 丢弃，trace 上的账能对上
    assert_eq!(f.count_at(rx, is_mac_rx_drop), 1);
    assert_eq!(f.world.net.device(rx).stats().collided_pkts, 1);

    f.sim.run(&mut f.world);
    assert_eq!(f.count_at(rx, is_phy_rx_end), 1);
    assert_eq!(f.count_at(rx, is_mac_rx), 0);
    assert_eq!(f.count_at(rx, is_mac_rx_drop), 1);
}

#[test]
fn starting_twice_arms_a_single_switch_chain() {
    let mut f = fixture(2, &DeviceConfig::default());
    f.world.net.add_loss_model(
        f.channel,
        Box::new(TwoStateLoss::new(TwoStateConfig::default()).expect("valid config")),
    );
    f.world.net.start(&mut f.sim);
    f.world.net.start(&mut f.sim);
    assert_eq!(f.sim.pending(), 1);

    f.sim.run_until(SimTime::from_secs(200), &mut f.world);
    assert_eq!(f.sim.pending(), 1);
}

#[test]
fn two_state_channel_keeps_switching_once_started() {
    let mut f = fixture(2, &DeviceConfig::default());
    let cfg = TwoStateConfig {
        mean_good_s: 0.5,
        mean_bad_s: 0.5,
        ..TwoStateConfig::default()
    };
    f.world.net.add_loss_model(
        f.channel,
        Box::new(TwoStateLoss::new(cfg).expect("valid config")),
    );
    f.world.net.start(&mut f.sim);
    assert_eq!(f.sim.pending(), 1);

    f.sim.run_until(SimTime::from_secs(100), &mut f.world);
    let model = f.world.net.channel(f.channel).losses()[0]
        .as_any()
        .downcast_ref::<TwoStateLoss>()
        .expect("two-state model");
    assert!(model.switches() > 50, "switches={}", model.switches());
    assert_eq!(f.sim.pending(), 1);
}
