//! loader-sim: drive a chunk scheduler with a synthetic producer and a pool
//! of loader workers, then print the final queue statistics.
//!
//! # Usage
//!
//! ```bash
//! # Defaults: 200 requests, 4 workers, priority strategy
//! loader-sim
//!
//! # Adaptive strategy under heavy pressure, from a TOML file
//! loader-sim --config scheduler.toml --strategy adaptive --pressure 0.95
//!
//! # Via environment variables (optionally profiled: CHUNKWISE_PROFILE=BENCH)
//! MAX_CONCURRENT_LOADS=8 LOAD_STRATEGY=distance loader-sim
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use chunkwise_core::ChunkCoord;
use chunkwise_scheduler::{
    BackgroundJobs, ChunkScheduler, LoadOutcome, LoadingRequest, PriorityTier, SchedulerConfig,
    SchedulerConfigUpdate, SharedPressure, StrategyKind, SystemClock,
};

/// Synthetic load generator for the chunk scheduler.
#[derive(Parser, Debug)]
#[command(name = "loader-sim", version, about)]
struct Cli {
    /// TOML file with scheduler settings.
    #[arg(long, env = "CHUNKWISE_CONFIG")]
    config: Option<PathBuf>,

    /// Number of load requests the producer submits.
    #[arg(long, env = "CHUNKWISE_SIM_REQUESTS", default_value_t = 200)]
    requests: usize,

    /// Number of loader workers polling for tasks.
    #[arg(long, env = "CHUNKWISE_SIM_WORKERS", default_value_t = 4)]
    workers: usize,

    /// Override for the concurrency ceiling.
    #[arg(long)]
    max_concurrent: Option<usize>,

    /// Override for the strategy: fifo, priority, distance or adaptive.
    #[arg(long)]
    strategy: Option<String>,

    /// Fixed resource pressure reading in 0..1 (unset = unavailable).
    #[arg(long, env = "CHUNKWISE_SIM_PRESSURE")]
    pressure: Option<f64>,

    /// Percentage of loads reported as failed.
    #[arg(long, default_value_t = 5)]
    failure_rate_pct: u8,

    /// Upper bound on simulation wall time.
    #[arg(long, default_value_t = 10_000)]
    duration_ms: u64,

    /// Seed for the request generator.
    #[arg(long, default_value_t = 0x5eed)]
    seed: u64,
}

/// Per-worker generator, derived from the run seed so reruns repeat.
fn worker_rng(seed: u64, worker: usize) -> StdRng {
    StdRng::seed_from_u64(seed ^ (worker as u64 + 1).wrapping_mul(0x9e37_79b9))
}

/// Whether a simulated load fails at the given percentage.
fn roll_failure(rng: &mut impl Rng, failure_rate_pct: u8) -> bool {
    rng.gen_range(0..100u8) < failure_rate_pct
}

fn build_config(cli: &Cli) -> anyhow::Result<SchedulerConfig> {
    chunkwise_core::config::load_dotenv();
    let env = chunkwise_core::Config::from_env();
    env.scheduler.validate().context("invalid environment configuration")?;
    env.log_summary();

    let mut config = match &cli.config {
        Some(path) => SchedulerConfig::from_toml_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => SchedulerConfig::default(),
    };
    config.apply_env(&env.scheduler);

    let strategy = cli
        .strategy
        .as_deref()
        .map(str::parse::<StrategyKind>)
        .transpose()?;
    config.apply_update(SchedulerConfigUpdate {
        max_concurrent_loads: cli.max_concurrent,
        strategy,
        ..Default::default()
    });
    Ok(config)
}

/// Chunks around the origin in a square spiral, nearest first.
fn spiral(count: usize) -> Vec<ChunkCoord> {
    let mut out = Vec::with_capacity(count);
    let mut ring = 0i32;
    while out.len() < count {
        if ring == 0 {
            out.push(ChunkCoord::new(0, 0));
        } else {
            for x in -ring..=ring {
                for z in -ring..=ring {
                    if x.abs() == ring || z.abs() == ring {
                        out.push(ChunkCoord::new(x, z));
                    }
                }
            }
        }
        ring += 1;
    }
    out.truncate(count);
    out
}

fn priority_for(coord: ChunkCoord) -> PriorityTier {
    match coord.x.abs().max(coord.z.abs()) {
        0 => PriorityTier::Critical,
        1..=2 => PriorityTier::High,
        3..=5 => PriorityTier::Normal,
        6..=8 => PriorityTier::Low,
        _ => PriorityTier::Background,
    }
}

async fn produce(scheduler: ChunkScheduler, cli_requests: usize, seed: u64) -> usize {
    let tile_width = scheduler.config().tile_width;
    let mut rng = StdRng::seed_from_u64(seed);
    let mut admitted_ids = Vec::with_capacity(cli_requests);
    let mut rejected = 0usize;

    for coord in spiral(cli_requests) {
        let distance = coord.distance_from(0.0, 0.0, tile_width);
        let request = LoadingRequest::new(coord, priority_for(coord), distance);
        let id = request.id.clone();
        match scheduler.schedule_load(request) {
            Ok(tier) => {
                debug!("Queued chunk {} in {} tier", coord, tier);
                admitted_ids.push(id);
            }
            Err(e) => {
                warn!("Admission failed for chunk {}: {}", coord, e);
                rejected += 1;
            }
        }

        // The player occasionally turns around: drop an earlier request.
        if !admitted_ids.is_empty() && rng.gen_range(0..20) == 0 {
            let victim = &admitted_ids[rng.gen_range(0..admitted_ids.len())];
            scheduler.cancel_request(victim, Some("out of view"));
        }

        if rng.gen_range(0..8) == 0 {
            tokio::task::yield_now().await;
        }
    }

    info!("Producer finished: {} admitted, {} rejected", admitted_ids.len(), rejected);
    rejected
}

async fn work(scheduler: ChunkScheduler, worker: usize, failure_rate_pct: u8, seed: u64) {
    let mut rng = worker_rng(seed, worker);
    let mut handled = 0u64;
    let mut idle_polls = 0u32;

    loop {
        let Some(task) = scheduler.get_next_task() else {
            idle_polls += 1;
            // Stop after the queues have stayed empty for a while.
            if idle_polls > 200 && scheduler.get_queue_statistics().pending == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
            continue;
        };
        idle_polls = 0;

        let load_ms = rng.gen_range(1..=8u64);
        tokio::time::sleep(Duration::from_millis(load_ms)).await;

        let outcome = if roll_failure(&mut rng, failure_rate_pct) {
            LoadOutcome::failed(format!("terrain generation failed for {}", task.coord))
        } else {
            LoadOutcome::Succeeded
        };
        let mut metrics = std::collections::HashMap::new();
        metrics.insert(format!("worker_{}_loads", worker), (handled + 1) as f64);
        scheduler.report_completion(&task.id, outcome, Some(metrics));
        handled += 1;
    }

    debug!("Worker {} exiting after {} loads", worker, handled);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    info!(?cli, "starting loader-sim");

    let config = build_config(&cli)?;
    let pressure = match cli.pressure {
        Some(value) => SharedPressure::with_value(value),
        None => SharedPressure::new(),
    };
    let scheduler =
        ChunkScheduler::with_sources(config, Arc::new(SystemClock), Arc::new(pressure));
    let jobs = BackgroundJobs::spawn(&scheduler);

    let producer = tokio::spawn(produce(scheduler.clone(), cli.requests, cli.seed));
    let workers: Vec<_> = (0..cli.workers.max(1))
        .map(|i| tokio::spawn(work(scheduler.clone(), i, cli.failure_rate_pct, cli.seed)))
        .collect();

    let run = async {
        let rejected = producer.await.context("producer task panicked")?;
        for handle in workers {
            handle.await.context("worker task panicked")?;
        }
        anyhow::Ok(rejected)
    };

    tokio::select! {
        result = run => {
            let rejected = result?;
            if rejected > 0 {
                warn!("{} requests were rejected at admission", rejected);
            }
        }
        _ = tokio::time::sleep(Duration::from_millis(cli.duration_ms)) => {
            warn!("Simulation time limit reached ({}ms)", cli.duration_ms);
        }
        _ = shutdown_signal() => {
            info!("shutdown signal received");
        }
    }

    jobs.shutdown().await;

    let stats = scheduler.get_queue_statistics();
    println!("{}", serde_json::to_string_pretty(&stats)?);
    info!("loader-sim exited cleanly");
    Ok(())
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {},
                    _ = sigterm.recv() => {},
                }
            }
            Err(e) => {
                warn!("failed to register SIGTERM handler: {}", e);
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = ctrl_c.await;
    }
}
