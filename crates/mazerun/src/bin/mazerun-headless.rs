//! Run a batch of worlds without a viewer and report throughput.

use anyhow::Context as _;
use clap::{Parser, ValueEnum};
use mazerun::prelude::*;
use mazerun::types::consts::{
    INTERACT_BUCKETS, MOVE_AMOUNT_BUCKETS, MOVE_ANGLE_BUCKETS, NUM_AGENTS, ROTATE_BUCKETS,
};
use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Backend {
    Cpu,
    Gpu,
}

#[derive(Parser, Debug)]
#[command(name = "mazerun-headless", version)]
struct Cli {
    /// JSON config file; flags below override its fields.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Executor to step the worlds on.
    #[arg(long, value_enum)]
    backend: Option<Backend>,

    /// Number of worlds.
    #[arg(long)]
    num_worlds: Option<u32>,

    /// Number of batch steps to run.
    #[arg(long, default_value_t = 1000)]
    num_steps: u64,

    /// Drive every agent with uniformly random actions instead of idling.
    #[arg(long, default_value_t = false)]
    rand_actions: bool,

    /// Seed for random actions.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// GPU adapter index.
    #[arg(long)]
    gpu_id: Option<u32>,

    /// CPU worker threads.
    #[arg(long)]
    threads: Option<usize>,

    /// Start new episodes automatically.
    #[arg(long)]
    auto_reset: bool,

    /// Directory holding the collision meshes.
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

impl Cli {
    fn config(&self) -> anyhow::Result<Config> {
        let mut cfg = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("read config '{}'", path.display()))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("parse config '{}'", path.display()))?
            }
            None => Config::default(),
        };
        if let Some(b) = self.backend {
            cfg.exec_mode = match b {
                Backend::Cpu => ExecMode::Cpu,
                Backend::Gpu => ExecMode::Gpu,
            };
        }
        if let Some(n) = self.num_worlds {
            cfg.num_worlds = n;
        }
        if let Some(id) = self.gpu_id {
            cfg.gpu_id = id;
        }
        if self.threads.is_some() {
            cfg.num_threads = self.threads;
        }
        if self.auto_reset {
            cfg.auto_reset = true;
        }
        if let Some(dir) = &self.data_dir {
            cfg.data_dir = dir.clone();
        }
        Ok(cfg)
    }
}

fn random_actions(mgr: &mut Manager, rng: &mut ChaCha8Rng) {
    let mut bucket = |n: i32| (rng.next_u32() % n as u32) as i32;
    for w in 0..mgr.num_worlds() {
        for a in 0..NUM_AGENTS as u32 {
            mgr.set_action(
                w,
                a,
                bucket(MOVE_AMOUNT_BUCKETS),
                bucket(MOVE_ANGLE_BUCKETS),
                bucket(ROTATE_BUCKETS),
                bucket(INTERACT_BUCKETS),
            );
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let cfg = cli.config()?;
    let mut mgr = Manager::new(cfg).context("build manager")?;
    let mut rng = ChaCha8Rng::seed_from_u64(cli.seed);

    let start = Instant::now();
    for _ in 0..cli.num_steps {
        if cli.rand_actions {
            random_actions(&mut mgr, &mut rng);
        }
        mgr.step().context("step")?;
    }
    let elapsed = start.elapsed().as_secs_f64();

    let world_steps = cli.num_steps * u64::from(mgr.num_worlds());
    info!(
        backend = %mgr.exec_mode(),
        worlds = mgr.num_worlds(),
        steps = cli.num_steps,
        progress = mgr.progress().context("read progress")?,
        "finished"
    );
    println!(
        "{} steps x {} worlds in {:.3} s: {:.0} world-steps/s",
        cli.num_steps,
        mgr.num_worlds(),
        elapsed,
        world_steps as f64 / elapsed.max(f64::EPSILON)
    );
    Ok(())
}
