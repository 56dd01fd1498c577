//! Benchmark profiles and utilities for mazerun.
//!
//! - [`reference_profile`]: a CPU batch sized for per-step timing
//! - [`stress_profile`]: a batch large enough to saturate the worker pool
//! - [`RandomDriver`]: seeded uniform actions for every agent

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use mazerun_core::consts::{
    INTERACT_BUCKETS, MOVE_AMOUNT_BUCKETS, MOVE_ANGLE_BUCKETS, NUM_AGENTS, ROTATE_BUCKETS,
};
use mazerun_engine::{Config, ExecMode, Manager};
use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// 64 CPU worlds with auto-reset, so long runs never stall on done flags.
pub fn reference_profile() -> Config {
    Config {
        num_worlds: 64,
        exec_mode: ExecMode::Cpu,
        auto_reset: true,
        ..Config::default()
    }
}

/// Same as [`reference_profile`] at 16x the world count.
pub fn stress_profile() -> Config {
    Config {
        num_worlds: 1024,
        ..reference_profile()
    }
}

/// [`reference_profile`] on GPU adapter 0.
pub fn gpu_profile(num_worlds: u32) -> Config {
    Config {
        num_worlds,
        exec_mode: ExecMode::Gpu,
        ..reference_profile()
    }
}

/// Writes a fresh uniformly random action for every agent before a step.
pub struct RandomDriver {
    rng: ChaCha8Rng,
}

impl RandomDriver {
    /// Deterministic driver for `seed`.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    fn bucket(&mut self, n: i32) -> i32 {
        (self.rng.next_u32() % n as u32) as i32
    }

    /// Set an action for every agent of every world.
    pub fn drive(&mut self, mgr: &mut Manager) {
        for w in 0..mgr.num_worlds() {
            for a in 0..NUM_AGENTS as u32 {
                let amount = self.bucket(MOVE_AMOUNT_BUCKETS);
                let angle = self.bucket(MOVE_ANGLE_BUCKETS);
                let rotate = self.bucket(ROTATE_BUCKETS);
                let interact = self.bucket(INTERACT_BUCKETS);
                mgr.set_action(w, a, amount, angle, rotate, interact);
            }
        }
    }
}
