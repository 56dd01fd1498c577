//! mazerun: a batched escape-room simulator for multi-agent
//! reinforcement learning.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all mazerun sub-crates.
//!
//! # Quick start
//!
//! ```no_run
//! use mazerun::prelude::*;
//!
//! let mut mgr = Manager::new(Config {
//!     num_worlds: 16,
//!     ..Config::default()
//! })?;
//! mgr.set_action(0, 1, 3, 0, 2, 0);
//! mgr.step()?;
//! let rewards = mgr.reward_tensor().to_vec::<f32>()?;
//! assert_eq!(rewards.len(), 32);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `mazerun-core` | IDs, constants, record layouts, flags |
//! | [`assets`] | `mazerun-assets` | Mesh import and the rigid-body catalog |
//! | [`exec`] | `mazerun-exec` | CPU and GPU executors, tensors |
//! | [`sim`] | `mazerun-sim` | The per-world task graph and its kernel |
//! | [`engine`] | `mazerun-engine` | The batch manager |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// IDs, constants and tensor record layouts (`mazerun-core`).
pub use mazerun_core as types;

/// Collision mesh import and rigid-body metadata (`mazerun-assets`).
pub use mazerun_assets as assets;

/// Batch executors and zero-copy tensors (`mazerun-exec`).
pub use mazerun_exec as exec;

/// The escape-room task graph (`mazerun-sim`).
pub use mazerun_sim as sim;

/// The batch manager (`mazerun-engine`).
pub use mazerun_engine as engine;

/// Common imports for driving a batch of worlds.
pub mod prelude {
    pub use mazerun_core::{ElementType, ExportId, RewardMode, SimFlags};
    pub use mazerun_engine::{
        Config, ConfigError, ExecError, ExecMode, ExportSpec, Manager, RolloutError, SetupError,
        Tensor, TrainInterface,
    };
    pub use mazerun_sim::VizBridge;
}
