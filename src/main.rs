use std::{io::Write, path::PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use env_logger::Builder;
use log::info;

use cfs_model::{
    CfsScheduler, Recorder, Sim, SimConfig, SliceStrategy,
    scheduler::{MIN_GRANULARITY, SCHED_LATENCY},
    sim::BernoulliWorkload,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Strategy {
    /// Requeue the running process every tick
    Uniform,
    /// Slices proportional to weight within the target latency
    TargetLatency,
}

/// Simulate the Completely Fair Scheduler over a workload
#[derive(Parser, Debug)]
#[command(name = "cfs_model", version)]
struct Args {
    /// TOML workload file with [scheduler] and [[process]] tables
    #[arg(short, long, conflicts_with = "random")]
    workload: Option<PathBuf>,

    /// Generate a random workload with arrivals over this many ticks
    #[arg(short, long)]
    random: Option<u64>,

    /// Seed for the random workload
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Per-tick arrival probability for the random workload
    #[arg(long, default_value_t = 0.3)]
    p_arrival: f64,

    /// Override the slice strategy from the workload file
    #[arg(short, long, value_enum)]
    strategy: Option<Strategy>,

    /// Print the Gantt segments and vruntime samples as JSON
    #[arg(long, default_value_t = false)]
    json: bool,
}

fn main() -> Result<()> {
    Builder::from_default_env()
        .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
        .init();

    let args = Args::parse();

    let mut config = match (&args.workload, args.random) {
        (Some(path), _) => SimConfig::from_file(path)
            .with_context(|| format!("loading workload {}", path.display()))?,
        (None, Some(ticks)) => SimConfig {
            processes: BernoulliWorkload {
                ticks,
                p_arrival: args.p_arrival,
                seed: args.seed,
                ..Default::default()
            }
            .generate(),
            ..Default::default()
        },
        (None, None) => anyhow::bail!("either --workload or --random is required"),
    };

    if let Some(strategy) = args.strategy {
        config.scheduler = match (strategy, config.scheduler) {
            (Strategy::Uniform, _) => SliceStrategy::Uniform,
            (Strategy::TargetLatency, keep @ SliceStrategy::TargetLatency { .. }) => keep,
            (Strategy::TargetLatency, SliceStrategy::Uniform) => SliceStrategy::TargetLatency {
                sched_latency: SCHED_LATENCY,
                min_granularity: MIN_GRANULARITY,
            },
        };
    }

    info!(
        "{} processes, strategy {:?}",
        config.processes.len(),
        config.scheduler
    );

    let mut sim = Sim::<CfsScheduler>::new(&config.processes, config.scheduler)
        .context("invalid workload")?;
    let mut recorder = Recorder::new();
    let report = sim.run(&mut recorder);

    println!("--- CFS Scheduling Results ---\n");
    println!("{report}");

    if args.json {
        println!("\n--- GANTT_DATA_START ---");
        println!("{}", serde_json::to_string(&recorder.segments)?);
        println!("--- GANTT_DATA_END ---");
        println!("\n--- VRUNTIME_DATA_START ---");
        println!("{}", serde_json::to_string(&recorder.vruntime)?);
        println!("--- VRUNTIME_DATA_END ---");
    }

    Ok(())
}
