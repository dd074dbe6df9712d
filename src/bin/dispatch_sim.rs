//! 静态混合调度仿真
//!
//! 读取调度配置（缺省为文档动画的演示场景），输出每个批次的时间线。

use clap::Parser;
use dispatch_sim_rs::demo::doc_demo_config;
use dispatch_sim_rs::dispatch::{DispatchError, DispatchTrace, StaticHybridScheduler};
use dispatch_sim_rs::sim::{DispatchConfig, SimTime};
use dispatch_sim_rs::viz::VizLogger;
use std::fs;
use std::path::PathBuf;
use std::process;

#[derive(Debug, Parser)]
#[command(
    name = "dispatch-sim",
    about = "静态混合调度仿真：把工作切成批次派发到异构设备"
)]
struct Args {
    /// Path to dispatch config JSON; defaults to the documentation demo
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override total work units
    #[arg(long)]
    total_work: Option<u64>,

    /// Override dispatch latency (ms)
    #[arg(long)]
    dispatch_latency_ms: Option<u64>,

    /// Override retrieve latency (ms)
    #[arg(long)]
    retrieve_latency_ms: Option<u64>,

    /// Output the work event mapping as JSON
    #[arg(long)]
    trace_json: Option<PathBuf>,

    /// Output viz timeline JSON (for the documentation animation)
    #[arg(long)]
    viz_json: Option<PathBuf>,

    /// Re-check the trace against the config after simulating
    #[arg(long)]
    verify: bool,

    /// Print per-device statistics
    #[arg(long)]
    stats: bool,

    /// Disable tracing and summary output
    #[arg(long)]
    quiet: bool,
}

fn load_config(args: &Args) -> DispatchConfig {
    let mut cfg = match &args.config {
        Some(path) => {
            let raw = fs::read_to_string(path).expect("read dispatch config");
            serde_json::from_str(&raw).expect("parse dispatch config")
        }
        None => doc_demo_config(),
    };
    if let Some(total_work) = args.total_work {
        cfg.total_work = total_work;
    }
    if let Some(ms) = args.dispatch_latency_ms {
        cfg.dispatch_latency = SimTime::from_millis(ms);
    }
    if let Some(ms) = args.retrieve_latency_ms {
        cfg.retrieve_latency = SimTime::from_millis(ms);
    }
    cfg
}

fn run(
    cfg: DispatchConfig,
    verify: bool,
) -> Result<(StaticHybridScheduler, DispatchTrace), DispatchError> {
    let scheduler = StaticHybridScheduler::new(cfg)?;
    let trace = scheduler.simulate()?;
    if verify {
        trace.verify(scheduler.config())?;
    }
    Ok((scheduler, trace))
}

fn print_summary(cfg: &DispatchConfig, trace: &DispatchTrace, stats: bool) {
    for (id, ev) in trace.iter() {
        let shifts: Vec<String> = ev
            .shifts
            .iter()
            .map(|s| format!("{}:{}", s.at.as_millis(), s.by))
            .collect();
        println!(
            "work id={} dev={} size={} dispatched_at={} processed_at={} retrieved_at={} pos0={} shifts=[{}]",
            id.0,
            ev.dispatched_to.0,
            ev.size,
            ev.dispatched_at.as_millis(),
            ev.processed_at.as_millis(),
            ev.retrieved_at.as_millis(),
            ev.pos0,
            shifts.join(",")
        );
    }
    if stats {
        for s in trace.device_stats(cfg) {
            println!(
                "device_stats dev={} name={} batches={} units={} busy_ms={} peak_load={}",
                s.device.0,
                cfg.devices[s.device.0].label(s.device.0),
                s.batches,
                s.units,
                s.busy.as_millis(),
                s.peak_load
            );
        }
    }
    println!(
        "done @ {}ms, events={}, units={}",
        trace.makespan(cfg.retrieve_latency).as_millis(),
        trace.len(),
        trace.total_units()
    );
}

fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(if args.quiet {
            tracing_subscriber::EnvFilter::new("off")
        } else {
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
        })
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .init();

    let cfg = load_config(&args);
    let (scheduler, trace) = match run(cfg, args.verify) {
        Ok(out) => out,
        Err(err) => {
            eprintln!("error: {err}");
            process::exit(2);
        }
    };
    let cfg = scheduler.config();

    if !args.quiet {
        print_summary(cfg, &trace, args.stats);
    }

    if let Some(path) = args.trace_json {
        let json = serde_json::to_string_pretty(&trace).expect("serialize trace");
        fs::write(&path, json).expect("write trace json");
        eprintln!("wrote trace to {}", path.display());
    }

    if let Some(path) = args.viz_json {
        let v = VizLogger::from_trace(cfg, &trace);
        let json = serde_json::to_string_pretty(&v.events).expect("serialize viz events");
        fs::write(&path, json).expect("write viz json");
        eprintln!("wrote viz events to {}", path.display());
    }
}
