//! 时隙 ALOHA 实验
//!
//! 接收者位于圆心，N 个发送者随机分布在半径 R 的圆盘内。新 packet 以 Poisson 过程到达
//! （单位：时隙），每个时隙开始时按轮转顺序分配给发送者；同一时隙多个发送即碰撞，
//! 碰撞的 packet 在 [0, N] 个时隙后重新到达。

use clap::Parser;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use swsim_rs::error_model::BpskErrorModel;
use swsim_rs::net::{DeviceId, MacAddr, WirelessNetwork, WirelessWorld};
use swsim_rs::propagation::FriisLoss;
use swsim_rs::rng::RngStream;
use swsim_rs::sim::{Event, ScenarioSpec, SimTime, Simulator, World};
use swsim_rs::topo::disc::{DiscOpts, build_disc};
use swsim_rs::trace::TraceLogger;
use tracing::{debug, info};

const PROTOCOL: u16 = 1;
/// 驱动程序自己的随机流放在拓扑之后，避免与设备/信道重叠
const DRIVER_STREAM_BASE: u64 = 1 << 32;

#[derive(Debug, Parser)]
#[command(name = "slotted-aloha", about = "时隙 ALOHA 性能实验")]
struct Args {
    /// 新 packet 到达率（每时隙）
    #[arg(long, default_value_t = 0.1)]
    lambda: f64,
    /// 接收到多少个 packet 后结束
    #[arg(long, default_value_t = 1000)]
    max_packets: u64,
    /// 发送者个数（至少 1 个）
    #[arg(long, default_value_t = 100, value_parser = clap::value_parser!(u64).range(1..))]
    num_senders: u64,
    /// 圆盘半径（米）
    #[arg(long, default_value_t = 25.0)]
    radius: f64,
    #[arg(long, default_value_t = 125)]
    packet_size: u32,
    /// 时隙长度（微秒）
    #[arg(long, default_value_t = 100)]
    slot_us: u64,
    /// 连续多少个时隙没有新的成功接收即判定不稳定
    #[arg(long, default_value_t = 100)]
    max_slots_without_progress: u64,
    /// 每毫秒打印一次进度
    #[arg(long)]
    verbose: bool,
    /// 场景配置 JSON（设备参数；非空损耗链替代默认的 Friis 5 GHz）
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    seed: Option<u64>,
    /// 输出 trace JSON
    #[arg(long)]
    trace_json: Option<PathBuf>,
}

/// 一次运行的全部计数与随机源
#[derive(Debug)]
struct AlohaState {
    senders: Vec<DeviceId>,
    receiver: DeviceId,
    to: MacAddr,
    pkt_bytes: u32,
    slot: SimTime,
    mean_interarrival_slots: f64,
    max_packets: u64,
    max_slots_without_progress: u64,
    slot_arrivals: u64,
    arrivals_since_report: u64,
    last_received: u64,
    slots_without_progress: u64,
    next_sender: usize,
    arrivals: RngStream,
    backoff: RngStream,
}

type Shared = Arc<Mutex<AlohaState>>;

fn wireless(world: &mut dyn World) -> &mut WirelessWorld {
    world
        .as_any_mut()
        .downcast_mut::<WirelessWorld>()
        .expect("world must be WirelessWorld")
}

/// Poisson 到达：计一个到达并调度下一个
#[derive(Debug)]
struct PoissonArrival {
    state: Shared,
}

impl Event for PoissonArrival {
    fn execute(self: Box<Self>, sim: &mut Simulator, _world: &mut dyn World) {
        let next = {
            let mut st = self.state.lock().expect("aloha state lock");
            st.slot_arrivals += 1;
            let mean = st.mean_interarrival_slots;
            let slots = st.arrivals.exponential(mean);
            SimTime::from_secs_f64(slots * st.slot.as_secs_f64())
        };
        sim.schedule_in(next, *self);
    }
}

/// 碰撞后退避结束，packet 重新到达
#[derive(Debug)]
struct Retransmission {
    state: Shared,
}

impl Event for Retransmission {
    fn execute(self: Box<Self>, _sim: &mut Simulator, _world: &mut dyn World) {
        debug!("重传到达");
        let mut st = self.state.lock().expect("aloha state lock");
        st.slot_arrivals += 1;
    }
}

/// 时隙边界：检查进度，把本时隙的到达分配给发送者
#[derive(Debug)]
struct SlotBoundary {
    state: Shared,
}

impl Event for SlotBoundary {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let w = wireless(world);
        let mut st = self.state.lock().expect("aloha state lock");
        let received = w.net.device(st.receiver).stats().delivered_pkts;

        st.arrivals_since_report += st.slot_arrivals;
        if received == st.last_received {
            st.slots_without_progress += 1;
        } else {
            st.slots_without_progress = 0;
            st.last_received = received;
        }
        if received >= st.max_packets || st.slots_without_progress >= st.max_slots_without_progress {
            sim.stop();
            return;
        }

        let arrivals = st.slot_arrivals;
        for _ in 0..arrivals {
            if st.next_sender >= st.senders.len() {
                st.next_sender = 0;
            }
            let dev = st.senders[st.next_sender];
            st.next_sender += 1;
            debug!(sender = dev.0, "分配发送");
            let pkt = w.net.make_packet(st.pkt_bytes);
            w.net.send(dev, pkt, st.to, PROTOCOL, sim);
        }
        if arrivals > 1 {
            let max_backoff = st.senders.len() as u32;
            for _ in 0..arrivals {
                let slots = st.backoff.uniform_int(max_backoff) as u64;
                debug!(slots, "退避");
                let delay = SimTime(st.slot.0.saturating_mul(slots));
                sim.schedule_in(
                    delay,
                    Retransmission {
                        state: self.state.clone(),
                    },
                );
            }
        }
        st.slot_arrivals = 0;
        let slot = st.slot;
        drop(st);
        sim.schedule_in(slot, *self);
    }
}

/// 周期进度报告
#[derive(Debug)]
struct ReportProgress {
    state: Shared,
    interval: SimTime,
}

impl Event for ReportProgress {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let w = wireless(world);
        {
            let mut st = self.state.lock().expect("aloha state lock");
            let received = w.net.device(st.receiver).stats().delivered_pkts;
            println!(
                "*** Simulation time: {:.3}s; total received: {}; sent since last report: {}",
                sim.now().as_secs_f64(),
                received,
                st.arrivals_since_report
            );
            st.arrivals_since_report = 0;
        }
        let interval = self.interval;
        sim.schedule_in(interval, *self);
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
    assert!(args.lambda > 0.0, "--lambda must be positive");

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
    scenario.device.slotted = true;

    let mut sim = Simulator::default();
    let mut world = WirelessWorld::new(WirelessNetwork::with_seed(scenario.seed));
    let mut placement = RngStream::new(scenario.seed, DRIVER_STREAM_BASE);
    let topo = build_disc(
        &mut world,
        &DiscOpts {
            senders: args.num_senders as usize,
            radius_m: args.radius,
            device: scenario.device.clone(),
        },
        &mut placement,
    );

    if scenario.channel.losses.is_empty() {
        world
            .net
            .add_loss_model(topo.channel, Box::new(FriisLoss::new(5e9)));
    }
    scenario
        .apply_channel(&mut world.net, topo.channel)
        .expect("apply channel config");
    let model = scenario
        .build_error_model()
        .expect("build error model")
        .unwrap_or_else(|| Box::new(BpskErrorModel::default()));
    world.net.set_error_model(topo.receiver, Some(model));

    if args.trace_json.is_some() {
        world.net.trace = Some(TraceLogger::default());
    }

    let slot = SimTime::from_micros(args.slot_us);
    let state = Arc::new(Mutex::new(AlohaState {
        senders: topo.senders.clone(),
        receiver: topo.receiver,
        to: world.net.device(topo.receiver).address(),
        pkt_bytes: args.packet_size,
        slot,
        mean_interarrival_slots: 1.0 / args.lambda,
        max_packets: args.max_packets,
        max_slots_without_progress: args.max_slots_without_progress,
        slot_arrivals: 0,
        arrivals_since_report: 0,
        last_received: 0,
        slots_without_progress: 0,
        next_sender: 0,
        arrivals: RngStream::new(scenario.seed, DRIVER_STREAM_BASE + 1),
        backoff: RngStream::new(scenario.seed, DRIVER_STREAM_BASE + 2),
    }));

    world.net.start(&mut sim);
    sim.schedule(
        SimTime::ZERO,
        PoissonArrival {
            state: state.clone(),
        },
    );
    sim.schedule(
        slot,
        SlotBoundary {
            state: state.clone(),
        },
    );
    if args.verbose {
        sim.schedule(
            SimTime::from_millis(1),
            ReportProgress {
                state: state.clone(),
                interval: SimTime::from_millis(1),
            },
        );
    }
    sim.run(&mut world);

    let now = sim.now();
    let slots = (now.0 / slot.0.max(1)).saturating_sub(1);
    let sent: u64 = topo
        .senders
        .iter()
        .map(|d| world.net.device(*d).stats().tx_pkts)
        .sum();
    let received = world.net.device(topo.receiver).stats().delivered_pkts;
    let collided = world.net.device(topo.receiver).stats().collided_pkts;
    info!(now = ?now, sent, received, collided, "✅ 时隙 ALOHA 完成");

    if received >= args.max_packets {
        println!(
            "Simulation completed (successfully received {received} by time {}s)",
            now.as_secs_f64()
        );
        println!("New packet arrival rate (packets/slot): {}", args.lambda);
        println!("Simulation number of slot times: {slots}");
        println!("Total number of packets sent (inc. retransmissions): {sent}");
        println!("Total number of packets received: {received}");
        let throughput = if slots > 0 {
            received as f64 / slots as f64
        } else {
            0.0
        };
        println!("Throughput (number received/duration): {throughput}");
    } else {
        println!(
            "Simulation terminated due to instability at time {}s; try lowering lambda",
            now.as_secs_f64()
        );
    }

    if let Some(path) = &args.trace_json {
        if let Some(t) = &world.net.trace {
            let json = t.to_json().expect("serialize trace events");
            fs::write(path, json).expect("write trace json");
            eprintln!("wrote trace events to {}", path.display());
        }
    }
}
