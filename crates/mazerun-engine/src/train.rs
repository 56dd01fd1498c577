//! The tensors a training loop reads and writes, grouped by role.

use crate::registry::ExportSpec;
use indexmap::IndexMap;

/// Describes how a training loop exchanges data with the simulator.
///
/// Inputs are written before a step, outputs are read after it.
/// Observation and statistic maps keep insertion order, which is also
/// the order of the external buffers in a GPU rollout.
#[derive(Clone, Debug, PartialEq)]
pub struct TrainInterface {
    /// Per-agent actions.
    pub actions: ExportSpec,
    /// Per-world reset requests.
    pub resets: ExportSpec,
    /// Per-agent rewards.
    pub rewards: ExportSpec,
    /// Per-agent done flags.
    pub dones: ExportSpec,
    /// Per-agent policy assignment, when agents follow different policies.
    pub policy_assignments: Option<ExportSpec>,
    /// Observation tensors by name.
    pub observations: IndexMap<&'static str, ExportSpec>,
    /// Statistic tensors by name.
    pub stats: IndexMap<&'static str, ExportSpec>,
}

impl TrainInterface {
    /// Every tensor in rollout order: actions, resets, rewards, dones,
    /// the policy assignment if any, observations, then statistics.
    pub fn rollout_order(&self) -> impl Iterator<Item = &ExportSpec> {
        [&self.actions, &self.resets, &self.rewards, &self.dones]
            .into_iter()
            .chain(self.policy_assignments.as_ref())
            .chain(self.observations.values())
            .chain(self.stats.values())
    }

    /// Number of external buffers a rollout needs.
    pub fn num_rollout_buffers(&self) -> usize {
        4 + usize::from(self.policy_assignments.is_some())
            + self.observations.len()
            + self.stats.len()
    }
}
