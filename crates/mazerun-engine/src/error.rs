//! Manager error types.

use crate::config::{ConfigError, ExecMode};
use mazerun_assets::AssetError;
use mazerun_exec::ExecError;
use thiserror::Error;

/// A [`Manager`](crate::Manager) could not be constructed.
///
/// Construction is all or nothing: when this is returned, every
/// resource acquired along the way has already been released.
#[derive(Debug, Error)]
pub enum SetupError {
    /// The configuration failed validation.
    #[error("invalid config: {0}")]
    Config(#[from] ConfigError),

    /// Collision meshes could not be imported or processed.
    #[error("asset loading failed: {0}")]
    Assets(#[from] AssetError),

    /// The selected executor could not be built, or priming the worlds
    /// failed.
    #[error("{mode} backend failed: {source}")]
    Backend {
        /// Requested backend.
        mode: ExecMode,
        /// Underlying executor error.
        #[source]
        source: ExecError,
    },

    /// The GPU backend was requested in a build without GPU support.
    #[error("GPU backend requested but this build has no GPU support (enable feature `gpu`)")]
    GpuNotCompiled,
}

/// A GPU rollout step could not be issued.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RolloutError {
    /// The manager is not running on the GPU backend.
    #[error("rollouts need the GPU backend")]
    NotGpu,

    /// The external buffer list does not match the train interface.
    #[error("train interface needs {expected} rollout buffers, got {got}")]
    BufferCount {
        /// Buffers the interface describes.
        expected: usize,
        /// Buffers supplied.
        got: usize,
    },

    /// An external buffer is smaller than the tensor copied through it.
    #[error("rollout buffer for '{name}' holds {got} bytes, tensor needs {needed}")]
    BufferTooSmall {
        /// Tensor name.
        name: String,
        /// Bytes the copy moves.
        needed: u64,
        /// Bytes the buffer holds.
        got: u64,
    },
}
