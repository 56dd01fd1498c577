//! Traits connecting a per-world task graph to an executor.

/// Per-slot export buffers for a whole batch of worlds.
///
/// Slot `s` is one contiguous byte buffer holding the records of every
/// world back to back, world-major. The executor hands the table to the
/// host for zero-copy tensor views and splits it into disjoint per-world
/// borrows for parallel stepping.
pub trait ExportTable: Send + Sized {
    /// Mutable per-world view of every slot, handed to one world's step.
    type World<'a>: Send
    where
        Self: 'a;

    /// Allocate zeroed buffers for `num_worlds` worlds.
    fn with_worlds(num_worlds: usize) -> Self;

    /// Number of registered slots.
    fn num_exports(&self) -> usize;

    /// Bytes of slot `slot`.
    ///
    /// # Panics
    ///
    /// Panics if `slot` is not registered.
    fn exported(&self, slot: u32) -> &[u8];

    /// Mutable bytes of slot `slot`.
    ///
    /// # Panics
    ///
    /// Panics if `slot` is not registered.
    fn exported_mut(&mut self, slot: u32) -> &mut [u8];

    /// Split into one disjoint view per world, in world order.
    fn split_worlds(&mut self) -> Vec<Self::World<'_>>;
}

/// A simulation with independent per-world state, stepped in lockstep.
pub trait WorldTaskGraph: Send + Sized {
    /// Configuration shared read-only by every world.
    type Config: Send + Sync;
    /// Per-world construction input.
    type Init: Sync;
    /// Export buffers exchanged with the host.
    type Exports: ExportTable;

    /// Construct world `world_idx`. Called once per world, possibly from
    /// several threads at once.
    fn init_world(cfg: &Self::Config, init: &Self::Init, world_idx: u32) -> Self;

    /// Advance one world by one step, reading control inputs from and
    /// writing outputs to its export view.
    fn step(&mut self, cfg: &Self::Config, io: <Self::Exports as ExportTable>::World<'_>);
}
