use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "swsim-rs-{prefix}-{}-{nanos}",
        std::process::id()
    ));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn run(args: &[&str]) -> String {
    let output = Command::new(env!("CARGO_BIN_EXE_slotted_aloha"))
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("run slotted_aloha");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).expect("utf8 stdout")
}

fn value_after(stdout: &str, prefix: &str) -> f64 {
    stdout
        .lines()
        .find_map(|l| l.strip_prefix(prefix))
        .unwrap_or_else(|| panic!("missing line {prefix:?} in:\n{stdout}"))
        .trim()
        .parse()
        .expect("number")
}

#[test]
fn light_load_completes() {
    let stdout = run(&[
        "--lambda",
        "0.1",
        "--max-packets",
        "30",
        "--num-senders",
        "10",
        "--seed",
        "2",
    ]);
    assert!(
        stdout.contains("Simulation completed (successfully received 30"),
        "stdout:\n{stdout}"
    );
    let received = value_after(&stdout, "Total number of packets received: ");
    let sent = value_after(&stdout, "Total number of packets sent (inc. retransmissions): ");
    let slots = value_after(&stdout, "Simulation number of slot times: ");
    let throughput = value_after(&stdout, "Throughput (number received/duration): ");
    assert_eq!(received, 30.0);
    assert!(sent >= received);
    assert!(slots > 0.0);
    assert!((throughput - received / slots).abs() < 1e-9);
}

#[test]
fn overload_reports_instability() {
    // 每时隙平均 20 个新到达，几乎每个时隙都碰撞
    let stdout = run(&[
        "--lambda",
        "20",
        "--max-packets",
        "1000",
        "--num-senders",
        "50",
        "--max-slots-without-progress",
        "20",
    ]);
    assert!(
        stdout.contains("Simulation terminated due to instability"),
        "stdout:\n{stdout}"
    );
}

#[test]
fn trace_json_records_collisions_at_receiver() {
    let dir = unique_temp_dir("slotted-aloha");
    let trace = dir.join("trace.json");
    run(&[
        "--lambda",
        "0.5",
        "--max-packets",
        "20",
        "--num-senders",
        "5",
        "--trace-json",
        trace.to_str().unwrap(),
    ]);

    let raw = fs::read_to_string(&trace).expect("read trace json");
    let v: Value = serde_json::from_str(&raw).expect("parse trace json");
    let events = v.as_array().expect("trace json must be an array");
    // 接收者是设备 0
    let at_receiver = |kind: &str| {
        events
            .iter()
            .filter(|e| e["device"] == 0 && e["kind"] == kind)
            .count()
    };
    assert!(at_receiver("mac_rx") >= 20);
    assert_eq!(at_receiver("tx_begin"), 0);
    assert!(events.iter().any(|e| e["kind"] == "tx_begin"));
}

#[test]
fn zero_senders_is_rejected_at_parse_time() {
    let output = Command::new(env!("CARGO_BIN_EXE_slotted_aloha"))
        .args(["--num-senders", "0", "--max-packets", "1"])
        .env("RUST_LOG", "warn")
        .output()
        .expect("run slotted_aloha");
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--num-senders"), "stderr: {stderr}");
    assert!(!stderr.contains("panicked"), "stderr: {stderr}");
}
