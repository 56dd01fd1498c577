//! Hook for an external viewer.

use mazerun_core::WorldState;

/// Receives each world's state after every step.
///
/// Called from worker threads, concurrently for different worlds.
/// Implementations must not block for long: the batch step waits for
/// every world.
pub trait VizBridge: Send + Sync {
    /// World `world_idx` finished a step in episode `episode_idx`.
    fn on_step(&self, world_idx: u32, episode_idx: u32, state: &WorldState);
}
