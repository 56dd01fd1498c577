//! Task-graph executors for batched simulation.
//!
//! A task graph is any type implementing [`WorldTaskGraph`]: one value
//! per world, stepped once per batch step, exchanging data with the host
//! through an [`ExportTable`] of contiguous per-slot buffers. Two
//! executors run such graphs:
//!
//! - [`TaskGraphExecutor`] keeps every world in host memory and steps
//!   them on a fixed rayon pool.
//! - `GpuExecutor` (feature `gpu`) keeps every world in device memory
//!   and steps them with a WGSL compute kernel.
//!
//! Both implement [`ExecutionBackend`], and both hand out exported
//! buffers as [`Tensor`] views without copying.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod backend;
pub mod cpu;
pub mod error;
#[cfg(feature = "gpu")]
pub mod gpu;
pub mod graph;
pub mod tensor;

pub use backend::ExecutionBackend;
pub use cpu::{TaskGraphExecutor, ThreadPoolConfig};
pub use error::ExecError;
#[cfg(feature = "gpu")]
pub use gpu::{GpuContext, GpuExecConfig, GpuExecutor, GpuStream, SharedBufferDesc};
pub use graph::{ExportTable, WorldTaskGraph};
pub use tensor::{Tensor, TensorData};
