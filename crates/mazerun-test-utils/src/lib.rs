//! Shared fixtures for mazerun integration tests and benchmarks.
//!
//! Small configs that build quickly, seeded random action scripts,
//! scratch asset directories, and helpers for tests that need a GPU
//! adapter but must pass on machines without one.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

use mazerun_core::consts::{
    INTERACT_BUCKETS, MOVE_AMOUNT_BUCKETS, MOVE_ANGLE_BUCKETS, NUM_AGENTS, ROTATE_BUCKETS,
};
use mazerun_engine::{Config, ExecMode, Manager};
use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Mesh files the asset loader reads.
pub const MESH_FILES: [&str; 3] = [
    "cube_collision.obj",
    "wall_collision.obj",
    "agent_collision_simplified.obj",
];

/// Install a `fmt` subscriber honouring `RUST_LOG`, writing through the
/// test harness. Safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// The repository's asset directory.
pub fn data_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../data")
}

/// A CPU config for `num_worlds` worlds on a two-thread pool.
pub fn cpu_config(num_worlds: u32) -> Config {
    Config {
        num_worlds,
        exec_mode: ExecMode::Cpu,
        num_threads: Some(2),
        data_dir: data_dir(),
        ..Config::default()
    }
}

/// A GPU config for `num_worlds` worlds on adapter 0.
pub fn gpu_config(num_worlds: u32) -> Config {
    Config {
        exec_mode: ExecMode::Gpu,
        num_threads: None,
        ..cpu_config(num_worlds)
    }
}

/// Build a CPU manager, panicking on failure.
pub fn cpu_manager(num_worlds: u32) -> Manager {
    init_tracing();
    match Manager::new(cpu_config(num_worlds)) {
        Ok(mgr) => mgr,
        Err(e) => panic!("CPU manager setup failed: {e}"),
    }
}

/// Build a GPU manager from `cfg`, or `None` if this machine has no
/// usable adapter. Any other setup failure panics.
#[cfg(feature = "gpu")]
pub fn try_gpu_manager(cfg: Config) -> Option<Manager> {
    use mazerun_engine::{ExecError, SetupError};

    init_tracing();
    match Manager::new(cfg) {
        Ok(mgr) => Some(mgr),
        Err(SetupError::Backend {
            source:
                ExecError::NoAdapter { .. }
                | ExecError::UnsupportedDevice { .. }
                | ExecError::RequestDevice(_),
            ..
        }) => {
            eprintln!("skipping: no usable GPU adapter");
            None
        }
        Err(e) => panic!("GPU manager setup failed: {e}"),
    }
}

/// A scratch copy of the asset directory that tests may break.
pub struct ScratchAssets {
    dir: TempDir,
}

impl ScratchAssets {
    /// Copy every mesh into a fresh temporary directory.
    pub fn new() -> std::io::Result<Self> {
        let dir = TempDir::new()?;
        for name in MESH_FILES {
            std::fs::copy(data_dir().join(name), dir.path().join(name))?;
        }
        Ok(Self { dir })
    }

    /// Directory to point [`Config::data_dir`] at.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Overwrite mesh `name` with `contents`.
    pub fn replace(&self, name: &str, contents: &str) -> std::io::Result<()> {
        std::fs::write(self.dir.path().join(name), contents)
    }

    /// Delete mesh `name`.
    pub fn remove(&self, name: &str) -> std::io::Result<()> {
        std::fs::remove_file(self.dir.path().join(name))
    }
}

/// Raw discrete action buckets: move amount, move angle, rotate, interact.
pub type ActionBuckets = [i32; 4];

/// Reproducible uniformly random actions.
pub struct ActionScript {
    rng: ChaCha8Rng,
}

impl ActionScript {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    fn bucket(&mut self, n: i32) -> i32 {
        (self.rng.next_u32() % n as u32) as i32
    }

    /// The next random action.
    pub fn next_action(&mut self) -> ActionBuckets {
        [
            self.bucket(MOVE_AMOUNT_BUCKETS),
            self.bucket(MOVE_ANGLE_BUCKETS),
            self.bucket(ROTATE_BUCKETS),
            self.bucket(INTERACT_BUCKETS),
        ]
    }

    /// Draw and set an action for every agent of every world. Returns the
    /// actions in `[world][agent]` order.
    pub fn apply(&mut self, mgr: &mut Manager) -> Vec<ActionBuckets> {
        let mut drawn = Vec::with_capacity(mgr.num_worlds() as usize * NUM_AGENTS);
        for w in 0..mgr.num_worlds() {
            for a in 0..NUM_AGENTS as u32 {
                let [m, g, r, i] = self.next_action();
                mgr.set_action(w, a, m, g, r, i);
                drawn.push([m, g, r, i]);
            }
        }
        drawn
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_is_reproducible_and_in_range() {
        let mut a = ActionScript::new(7);
        let mut b = ActionScript::new(7);
        for _ in 0..100 {
            let x = a.next_action();
            assert_eq!(x, b.next_action());
            assert!((0..MOVE_AMOUNT_BUCKETS).contains(&x[0]));
            assert!((0..MOVE_ANGLE_BUCKETS).contains(&x[1]));
            assert!((0..ROTATE_BUCKETS).contains(&x[2]));
            assert!((0..INTERACT_BUCKETS).contains(&x[3]));
        }
    }

    #[test]
    fn scratch_assets_copy_every_mesh() {
        let scratch = ScratchAssets::new().unwrap();
        for name in MESH_FILES {
            assert!(scratch.path().join(name).is_file());
        }
        scratch.remove(MESH_FILES[0]).unwrap();
        assert!(!scratch.path().join(MESH_FILES[0]).exists());
    }
}
