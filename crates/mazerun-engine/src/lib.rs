//! Batch manager for the mazerun escape-room simulator.
//!
//! A [`Manager`] owns N independent worlds and steps them in lockstep
//! on either a CPU worker pool or a GPU compute kernel. The rest of the
//! API is the same on both backends: per-world reset and checkpoint
//! control, per-agent actions, and zero-copy [`Tensor`] views of every
//! exported buffer with shapes fixed for the manager's lifetime.
//!
//! With feature `gpu`, the manager also drives asynchronous rollout
//! steps that shuttle a training loop's buffers around each step without
//! blocking the host.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod backend;
pub mod config;
pub mod error;
pub mod manager;
pub mod registry;
#[cfg(feature = "gpu")]
pub mod rollout;
pub mod train;

pub use backend::Backend;
pub use config::{Config, ConfigError, ExecMode};
pub use error::{RolloutError, SetupError};
pub use manager::Manager;
pub use mazerun_exec::{ExecError, Tensor};
pub use registry::ExportSpec;
pub use train::TrainInterface;
