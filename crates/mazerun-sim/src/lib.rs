//! The escape-room task graph.
//!
//! Each [`Sim`] is one world: two agents cooperating to get through
//! three rooms, each closed by a door that opens when every button in
//! the room is held down or when an agent carries the matching key.
//! Worlds are stepped in lockstep by an executor from `mazerun-exec`;
//! [`SimExports`] is the table of per-slot buffers they exchange with
//! the host.
//!
//! The same systems are implemented twice: in Rust for the CPU executor
//! and in WGSL (`kernel.wgsl`) for the GPU executor. Both draw from the
//! same counter-based [`Rng`], so level layouts agree between backends.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod assets;
pub mod config;
pub mod episode;
pub mod exports;
pub mod gpu;
pub mod level_gen;
pub mod observe;
pub mod rng;
pub mod sim;
pub mod systems;
pub mod viz;

pub use config::{GpuParams, SimConfig};
pub use episode::{EpisodeManager, SharedProgress};
pub use exports::{SimExports, WorldExports};
pub use rng::Rng;
pub use sim::{Sim, WorldInit};
pub use viz::VizBridge;
