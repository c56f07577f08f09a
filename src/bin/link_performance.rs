//! 链路性能实验
//!
//! 两个设备相距 distance 米，发送端以恒定速率发包，接收端用 BPSK 误码模型判定，
//! 统计丢包率（PER）及其 95% 置信区间半宽。

use clap::{Parser, ValueEnum};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use swsim_rs::error_model::BpskErrorModel;
use swsim_rs::net::{DataRate, DeviceId, MacAddr, WirelessNetwork, WirelessWorld};
use swsim_rs::propagation::{
    FriisLoss, LogDistanceLoss, PropagationLoss, TwoStateConfig, TwoStateLoss,
};
use swsim_rs::sim::{Event, ScenarioSpec, SimTime, Simulator, World};
use swsim_rs::topo::link_pair::{LinkPairOpts, build_link_pair};
use swsim_rs::trace::{TraceEvent, TraceEventKind, TraceLogger};
use tracing::info;

/// 恒定速率源的速率：1024 字节每 100 ms
const SOURCE_RATE_BPS: u64 = 81_920;
const PROTOCOL: u16 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LossModel {
    Friis,
    LogDistance,
    TwoState,
}

#[derive(Debug, Parser)]
#[command(name = "link-performance", about = "点对点无线链路的丢包率实验")]
struct Args {
    /// 两个节点之间的距离（米）
    #[arg(long, default_value_t = 25.0)]
    distance: f64,
    /// 发送的 packet 数
    #[arg(long, default_value_t = 1000)]
    max_packets: u64,
    #[arg(long, default_value_t = 1024)]
    packet_size: u32,
    /// 发送功率（dBm）
    #[arg(long, default_value_t = 16.0, allow_negative_numbers = true)]
    transmit_power: f64,
    /// 噪声功率（dBm）
    #[arg(long, default_value_t = -100.0, allow_negative_numbers = true)]
    noise_power: f64,
    /// 载波频率（Hz），仅 friis 使用
    #[arg(long, default_value_t = 5e9)]
    frequency: f64,
    #[arg(long, value_enum, default_value_t = LossModel::Friis)]
    loss_model: LossModel,
    /// 设备速率
    #[arg(long, default_value = "100Mbps")]
    data_rate: DataRate,
    /// 场景配置 JSON；其中的损耗链（若非空）替代 --loss-model
    #[arg(long)]
    config: Option<PathBuf>,
    /// 随机种子（覆盖配置文件中的 seed）
    #[arg(long)]
    seed: Option<u64>,
    /// 输出 trace JSON
    #[arg(long)]
    trace_json: Option<PathBuf>,
    /// 每个接收到的帧写一行 "<秒> <接收功率 dBm>"
    #[arg(long)]
    rssi_out: Option<PathBuf>,
    /// 追加一行汇总结果
    #[arg(long)]
    summary_out: Option<PathBuf>,
    /// 写入汇总行末尾的实验说明
    #[arg(long, default_value = "")]
    metadata: String,
}

/// 恒定速率源：每隔 `gap` 发一个 packet，直到 `remaining` 为 0
#[derive(Debug)]
struct ConstantRateSource {
    device: DeviceId,
    to: MacAddr,
    pkt_bytes: u32,
    remaining: u64,
    gap: SimTime,
}

impl Event for ConstantRateSource {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let mut me = *self;
        let w = world
            .as_any_mut()
            .downcast_mut::<WirelessWorld>()
            .expect("world must be WirelessWorld");
        if me.remaining == 0 {
            return;
        }
        let pkt = w.net.make_packet(me.pkt_bytes);
        w.net.send(me.device, pkt, me.to, PROTOCOL, sim);

        me.remaining -= 1;
        if me.remaining > 0 {
            let gap = me.gap;
            sim.schedule_in(gap, me);
        }
    }
}

fn main() {
    // 初始化 tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .init();

    let args = Args::parse();

    let mut scenario = match &args.config {
        Some(path) => {
            let raw = fs::read_to_string(path).expect("read scenario config");
            ScenarioSpec::from_json(&raw).expect("parse scenario config")
        }
        None => ScenarioSpec::default(),
    };
    if let Some(seed) = args.seed {
        scenario.seed = seed;
    }
    if args.config.is_none() {
        scenario.device.data_rate_bps = args.data_rate.bps();
        scenario.device.tx_power_dbm = args.transmit_power;
        scenario.device.noise_power_dbm = args.noise_power;
    }

    let mut sim = Simulator::default();
    let mut world = WirelessWorld::new(WirelessNetwork::with_seed(scenario.seed));
    let link = build_link_pair(
        &mut world,
        &LinkPairOpts {
            distance_m: args.distance,
            device: scenario.device.clone(),
        },
    );

    if scenario.channel.losses.is_empty() {
        let loss: Box<dyn PropagationLoss> = match args.loss_model {
            LossModel::Friis => Box::new(FriisLoss::new(args.frequency)),
            LossModel::LogDistance => Box::new(LogDistanceLoss::default()),
            LossModel::TwoState => Box::new(
                TwoStateLoss::new(TwoStateConfig::default()).expect("default two-state config"),
            ),
        };
        world.net.add_loss_model(link.channel, loss);
    }
    scenario
        .apply_channel(&mut world.net, link.channel)
        .expect("apply channel config");

    let model = scenario
        .build_error_model()
        .expect("build error model")
        .unwrap_or_else(|| Box::new(BpskErrorModel::default()));
    world.net.set_error_model(link.rx, Some(model));

    if args.trace_json.is_some() {
        world.net.trace = Some(TraceLogger::default());
    }

    let rssi = Arc::new(Mutex::new(Vec::<(f64, f64)>::new()));
    {
        let rssi = rssi.clone();
        let rx = link.rx.0;
        world.net.add_trace_sink(Box::new(move |ev: &TraceEvent| {
            if ev.device != rx {
                return;
            }
            if let TraceEventKind::PhyRxEnd { rx_power_dbm, .. } = ev.kind {
                if let Ok(mut v) = rssi.lock() {
                    v.push((SimTime(ev.t_ns).as_secs_f64(), rx_power_dbm));
                }
            }
        }));
    }

    // 全部发出且每一个都有了结果（收到或丢弃）就停止
    let (tx, rx, max_packets) = (link.tx, link.rx, args.max_packets);
    world.set_stop_condition(Box::new(move |net: &WirelessNetwork| {
        let sent = net.device(tx).stats().tx_pkts;
        let rs = net.device(rx).stats();
        sent == max_packets && rs.delivered_pkts + rs.phy_rx_dropped_pkts >= sent
    }));

    world.net.start(&mut sim);
    let to = world.net.device(link.rx).address();
    let gap = DataRate(SOURCE_RATE_BPS).tx_time(args.packet_size);
    sim.schedule(
        SimTime::from_secs(1),
        ConstantRateSource {
            device: link.tx,
            to,
            pkt_bytes: args.packet_size,
            remaining: args.max_packets,
            gap,
        },
    );

    // 两状态信道的切换事件永不停止，给一个足够宽的上限
    let horizon = SimTime(
        SimTime::from_secs(2)
            .0
            .saturating_add(gap.0.saturating_mul(args.max_packets.saturating_add(1))),
    );
    sim.run_until(horizon, &mut world);

    let sent = world.net.device(link.tx).stats().tx_pkts;
    let rs = world.net.device(link.rx).stats();
    let (rcv, drop) = (rs.delivered_pkts, rs.phy_rx_dropped_pkts);
    let per = if sent > 0 { drop as f64 / sent as f64 } else { 0.0 };
    let error = if per > 0.0 && per < 1.0 {
        1.96 * (per * (1.0 - per) / sent as f64).sqrt()
    } else {
        0.0
    };
    info!(now = ?sim.now(), sent, rcv, drop, "✅ 链路实验完成");
    println!("sent {sent} rcv {rcv} drop {drop} per {per} error {error}");

    if let Some(path) = &args.rssi_out {
        let v = rssi.lock().expect("rssi lock");
        let body = v
            .iter()
            .map(|(t, p)| format!("{t} {p}\n"))
            .collect::<String>();
        fs::write(path, body).expect("write rssi file");
    }

    if let Some(path) = &args.summary_out {
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .expect("open summary file");
        writeln!(f, "{sent} {rcv} {drop} {per} {error} {}", args.metadata)
            .expect("write summary file");
    }

    if let Some(path) = &args.trace_json {
        if let Some(t) = &world.net.trace {
            let json = t.to_json().expect("serialize trace events");
            fs::write(path, json).expect("write trace json");
            eprintln!("wrote trace events to {}", path.display());
        }
    }
}
