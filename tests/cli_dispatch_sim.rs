use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "dispatch-sim-rs-{prefix}-{}-{nanos}",
        std::process::id()
    ));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn write_file(dir: &PathBuf, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write temp file");
    path
}

fn run_dispatch_sim(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_dispatch_sim"))
        .env("RUST_LOG", "off")
        .args(args)
        .output()
        .expect("run dispatch_sim")
}

fn lines_with_prefix<'a>(stdout: &'a str, prefix: &str) -> Vec<&'a str> {
    stdout
        .lines()
        .filter(|line| line.starts_with(prefix))
        .collect()
}

const TWO_DEVICE_CONFIG: &str = r#"
{
    "total_work": 250,
    "dispatch_latency": 10,
    "retrieve_latency": 5,
    "device_table": {
        "devices": ["cpu", "cuda:0"],
        "batch_sizes": [50, 40],
        "capacities": [100, 60],
        "speeds": [1.0, 2.0]
    }
}
"#;

#[test]
fn dispatch_sim_runs_documentation_demo_by_default() {
    let output = run_dispatch_sim(&[]);
    assert!(
        output.status.success(),
        "dispatch_sim failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(lines_with_prefix(&stdout, "work ").len(), 8);
    assert!(
        stdout.contains("work id=0 dev=0 size=50 dispatched_at=0 processed_at=500 retrieved_at=1000 pos0=0 shifts=[]"),
        "unexpected stdout: {stdout}"
    );
    assert!(stdout.contains("shifts=[3500:100]"), "unexpected stdout: {stdout}");
    assert!(
        stdout.contains("done @ 4550ms, events=8, units=1000"),
        "unexpected stdout: {stdout}"
    );
}

#[test]
fn dispatch_sim_writes_trace_and_viz_json() {
    let dir = unique_temp_dir("trace-viz");
    let config = write_file(&dir, "config.json", TWO_DEVICE_CONFIG);
    let trace_json = dir.join("trace.json");
    let viz_json = dir.join("viz.json");

    let output = run_dispatch_sim(&[
        "--config",
        config.to_str().unwrap(),
        "--trace-json",
        trace_json.to_str().unwrap(),
        "--viz-json",
        viz_json.to_str().unwrap(),
        "--verify",
        "--quiet",
    ]);
    assert!(
        output.status.success(),
        "dispatch_sim failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(
        String::from_utf8_lossy(&output.stdout).trim().is_empty(),
        "--quiet should suppress the summary"
    );

    let raw = fs::read_to_string(&trace_json).expect("read trace.json");
    let trace: Value = serde_json::from_str(&raw).expect("parse trace.json");
    let events = trace.as_object().expect("trace.json must be a JSON object");
    assert_eq!(events.len(), 6);
    let total: u64 = events
        .values()
        .map(|ev| ev["size"].as_u64().expect("size"))
        .sum();
    assert_eq!(total, 250);
    assert_eq!(trace["5"]["dispatched_to"], 1);
    assert_eq!(trace["5"]["shifts"][0]["at"], 85);
    assert_eq!(trace["5"]["shifts"][0]["by"], 40);

    let raw = fs::read_to_string(&viz_json).expect("read viz.json");
    let viz: Value = serde_json::from_str(&raw).expect("parse viz.json");
    let arr = viz.as_array().expect("viz.json must be a JSON array");
    assert_eq!(
        arr[0].get("kind").and_then(|k| k.as_str()),
        Some("meta"),
        "expected first viz event to be meta"
    );
    assert_eq!(arr[0]["devices"][1]["name"], "cuda:0");
    assert_eq!(arr[0]["dispatch_latency_ms"], 10);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn dispatch_sim_applies_overrides_and_prints_stats() {
    let dir = unique_temp_dir("overrides");
    let config = write_file(&dir, "config.json", TWO_DEVICE_CONFIG);

    let output = run_dispatch_sim(&[
        "--config",
        config.to_str().unwrap(),
        "--total-work",
        "90",
        "--dispatch-latency-ms",
        "0",
        "--retrieve-latency-ms",
        "0",
        "--stats",
    ]);
    assert!(
        output.status.success(),
        "dispatch_sim failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    let works = lines_with_prefix(&stdout, "work ");
    assert_eq!(works.len(), 2, "unexpected stdout: {stdout}");
    assert!(works[0].contains("dev=0 size=50 dispatched_at=0 processed_at=0"));
    assert!(works[1].contains("dev=1 size=40 dispatched_at=0 processed_at=0"));

    let stats = lines_with_prefix(&stdout, "device_stats ");
    assert_eq!(stats.len(), 2);
    assert!(stats[0].contains("name=cpu batches=1 units=50"));
    assert!(stats[1].contains("name=cuda:0 batches=1 units=40"));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn dispatch_sim_handles_zero_work() {
    let output = run_dispatch_sim(&["--total-work", "0"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(lines_with_prefix(&stdout, "work ").is_empty());
    assert!(stdout.contains("done @ 0ms, events=0, units=0"), "{stdout}");
}

#[test]
fn dispatch_sim_exits_with_status_2_on_invalid_config() {
    let dir = unique_temp_dir("invalid");
    let config = write_file(
        &dir,
        "config.json",
        r#"
{
    "total_work": 10,
    "devices": [
        { "name": "cpu", "capacity": 10, "batch_size": 5, "speed": 1.0 },
        { "name": "cuda:0", "capacity": 0, "batch_size": 5, "speed": 1.0 }
    ]
}
        "#,
    );

    let output = run_dispatch_sim(&["--config", config.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("device 1 has zero capacity"),
        "stderr did not contain expected message: {stderr}"
    );

    let _ = fs::remove_dir_all(&dir);
}
