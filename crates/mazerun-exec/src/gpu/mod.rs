//! GPU executor: every world in device memory, stepped by a compute
//! kernel.
//!
//! The kernel contract is generic over the task graph. Bindings, all in
//! group 0:
//!
//! | binding | contents |
//! |---|---|
//! | `0` | uniform parameter block |
//! | `1..=S` | shared buffers, in [`GpuExecConfig::shared`] order |
//! | `S + 1` | per-world state array |
//! | `S + 2..` | export slots, in slot order |
//!
//! The kernel exposes an init entry point and a step entry point, both
//! dispatched with one invocation per world.

mod context;
mod executor;
mod stream;

pub use context::GpuContext;
pub use executor::{GpuExecConfig, GpuExecutor, SharedBufferDesc};
pub use stream::GpuStream;
