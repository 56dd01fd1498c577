//! C-compatible status codes.
//!
//! [`MazerunStatus`] is a `repr(i32)` enum: `Ok` is zero and every error
//! is negative. Conversions from the manager's error types are provided.

use mazerun_engine::{ExecError, SetupError};

/// Status code returned by every FFI function.
///
/// Values are ABI-stable.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MazerunStatus {
    /// Success.
    Ok = 0,
    /// Handle is invalid or was already destroyed.
    InvalidHandle = -1,
    /// An argument is null, out of range, or otherwise invalid.
    InvalidArgument = -2,
    /// The configuration failed validation.
    ConfigError = -3,
    /// Collision meshes could not be loaded.
    AssetError = -4,
    /// The executor could not be built or primed.
    BackendError = -5,
    /// The GPU backend was requested from a build without GPU support.
    GpuNotCompiled = -6,
    /// Stepping or reading back from the device failed.
    ExecutionFailed = -7,
    /// Caller-provided buffer is too small.
    BufferTooSmall = -8,
    /// Internal error (e.g. poisoned mutex after a prior panic).
    InternalError = -9,
    /// A Rust panic was caught at the FFI boundary.
    Panicked = -128,
}

impl From<&SetupError> for MazerunStatus {
    fn from(e: &SetupError) -> Self {
        match e {
            SetupError::Config(_) => MazerunStatus::ConfigError,
            SetupError::Assets(_) => MazerunStatus::AssetError,
            SetupError::Backend { .. } => MazerunStatus::BackendError,
            SetupError::GpuNotCompiled => MazerunStatus::GpuNotCompiled,
        }
    }
}

impl From<&ExecError> for MazerunStatus {
    fn from(e: &ExecError) -> Self {
        match e {
            ExecError::BufferTooSmall { .. } => MazerunStatus::BufferTooSmall,
            _ => MazerunStatus::ExecutionFailed,
        }
    }
}
