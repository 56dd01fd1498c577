//! The capability set every executor offers to the manager.

use crate::error::ExecError;
use crate::tensor::Tensor;
use mazerun_core::ElementType;

/// A batch executor: steps every world and exposes exported buffers.
pub trait ExecutionBackend: Send {
    /// Number of worlds in the batch.
    fn num_worlds(&self) -> u32;

    /// Step every world once. Returns after all worlds have finished.
    fn run(&mut self) -> Result<(), ExecError>;

    /// View export slot `slot` as a tensor of the given type and shape.
    ///
    /// The view aliases the executor's storage; it is valid until the
    /// executor is next borrowed mutably.
    fn export_tensor(&self, slot: u32, dtype: ElementType, dims: &[i64]) -> Tensor<'_>;

    /// Overwrite `bytes.len()` bytes of slot `slot` starting at
    /// `byte_offset`.
    ///
    /// # Panics
    ///
    /// Panics if the range lies outside the slot.
    fn write_exported(&mut self, slot: u32, byte_offset: usize, bytes: &[u8]);
}
