//! Element type and shape of every exported tensor.
//!
//! The executor stores each export as an untyped byte slot; this table
//! is the single place that gives a slot its type and dimensions. Shapes
//! depend only on the world count, so they are fixed for a manager's
//! lifetime.

use mazerun_core::consts::{MAX_OBSERVATIONS_PER_AGENT, NUM_AGENTS, NUM_LIDAR_SAMPLES};
use mazerun_core::{Checkpoint, ElementType, ExportId};
use smallvec::SmallVec;
use std::mem::size_of;

/// Type and shape of one exported tensor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportSpec {
    /// The export slot.
    pub id: ExportId,
    /// Element type.
    pub dtype: ElementType,
    /// Shape, outermost first. The leading dimension is the world count
    /// or the world count times the agent count.
    pub dims: SmallVec<[i64; 4]>,
}

impl ExportSpec {
    /// Look up the spec of `id` for a batch of `num_worlds`.
    pub fn of(id: ExportId, num_worlds: u32) -> Self {
        let w = i64::from(num_worlds);
        let wa = w * NUM_AGENTS as i64;
        let (dtype, dims): (ElementType, &[i64]) = match id {
            ExportId::Reset => (ElementType::Int32, &[w, 1]),
            ExportId::Action => (ElementType::Int32, &[wa, 4]),
            ExportId::Reward => (ElementType::Float32, &[wa, 1]),
            ExportId::Done => (ElementType::Int32, &[wa, 1]),
            ExportId::SelfObservation => (ElementType::Float32, &[wa, 9]),
            ExportId::AgentId => (ElementType::Int32, &[wa, 1]),
            ExportId::PartnerObservations => {
                (ElementType::Float32, &[wa, NUM_AGENTS as i64 - 1, 3])
            }
            ExportId::RoomEntityObservations => (
                ElementType::Float32,
                &[wa, MAX_OBSERVATIONS_PER_AGENT as i64, 3],
            ),
            ExportId::DoorObservation => (ElementType::Float32, &[wa, 3]),
            ExportId::Lidar => (ElementType::Float32, &[wa, NUM_LIDAR_SAMPLES as i64, 2]),
            ExportId::StepsRemaining => (ElementType::Int32, &[wa, 1]),
            ExportId::Checkpoint => (ElementType::UInt8, &[w, size_of::<Checkpoint>() as i64]),
            ExportId::CheckpointReset => (ElementType::Int32, &[w, 1]),
            ExportId::CheckpointSave => (ElementType::Int32, &[w, 1]),
        };
        Self {
            id,
            dtype,
            dims: SmallVec::from_slice(dims),
        }
    }

    /// Tensor name, as used by training interfaces.
    pub fn name(&self) -> &'static str {
        self.id.name()
    }

    /// Number of elements.
    pub fn num_elements(&self) -> u64 {
        self.dims.iter().map(|&d| d.max(0) as u64).product()
    }

    /// Size in bytes.
    pub fn num_bytes(&self) -> u64 {
        self.num_elements() * self.dtype.size_of() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mazerun_sim::SimExports;

    #[test]
    fn specs_cover_the_exported_bytes() {
        let per_world = SimExports::bytes_per_world();
        for num_worlds in [1u32, 3, 64] {
            for id in ExportId::ALL {
                let spec = ExportSpec::of(id, num_worlds);
                assert_eq!(
                    spec.num_bytes(),
                    per_world[id.slot() as usize] * u64::from(num_worlds),
                    "{id} with {num_worlds} worlds"
                );
            }
        }
    }

    #[test]
    fn leading_dimension_counts_worlds_or_agents() {
        let spec = ExportSpec::of(ExportId::Reward, 4);
        assert_eq!(spec.dims.as_slice(), &[8, 1]);
        assert_eq!(spec.dtype, ElementType::Float32);
        let spec = ExportSpec::of(ExportId::PartnerObservations, 4);
        assert_eq!(spec.dims.as_slice(), &[8, 1, 3]);
        let spec = ExportSpec::of(ExportId::Reset, 4);
        assert_eq!(spec.dims.as_slice(), &[4, 1]);
        assert_eq!(ExportSpec::of(ExportId::Action, 4).dims.as_slice(), &[8, 4]);
    }
}
