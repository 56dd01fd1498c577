//! Executor error type.

use thiserror::Error;

/// Errors raised while building or running an executor.
#[derive(Debug, Error)]
pub enum ExecError {
    /// The worker pool could not be created.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// The number of per-world init records does not match the world count.
    #[error("expected {expected} world init records, got {got}")]
    InitCount {
        /// Configured world count.
        expected: u32,
        /// Records supplied.
        got: usize,
    },

    /// The task graph's export table has a different slot count than
    /// the executor was configured with.
    #[error("task graph registers {got} exports, executor configured for {expected}")]
    ExportCount {
        /// Configured slot count.
        expected: u32,
        /// Slots registered by the task graph.
        got: usize,
    },

    /// A zero-world batch was requested.
    #[error("an executor needs at least one world")]
    NoWorlds,

    /// No GPU adapter exists at the requested index.
    #[error("no GPU adapter with index {gpu_id} ({available} available)")]
    NoAdapter {
        /// Requested adapter index.
        gpu_id: u32,
        /// Adapters found.
        available: usize,
    },

    /// The adapter lacks a capability the kernel needs.
    #[error("GPU adapter '{adapter}' is unsupported: {reason}")]
    UnsupportedDevice {
        /// Adapter name.
        adapter: String,
        /// Missing capability.
        reason: String,
    },

    /// Logical device creation failed.
    #[error("failed to create GPU device: {0}")]
    RequestDevice(String),

    /// The kernel configuration is inconsistent.
    #[error("invalid GPU kernel configuration: {0}")]
    KernelConfig(String),

    /// Waiting on the device failed.
    #[error("GPU poll failed: {0}")]
    Poll(String),

    /// Mapping a buffer for readback failed.
    #[error("GPU readback failed: {0}")]
    Readback(String),

    /// A host copy target is too small.
    #[error("destination holds {got} bytes, tensor needs {needed}")]
    BufferTooSmall {
        /// Bytes required.
        needed: usize,
        /// Bytes available.
        got: usize,
    },
}
