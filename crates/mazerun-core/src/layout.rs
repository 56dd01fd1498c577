//! `#[repr(C)]` record layouts backing each exported tensor.
//!
//! One record per world (control flags, checkpoint) or one record per
//! agent (actions, rewards, observations). Every field is four bytes
//! wide, so record sizes are multiples of four and match the device
//! kernel's `array<T>` strides exactly.

use crate::consts::{
    INTERACT_BUCKETS, MAX_OBSERVATIONS_PER_AGENT, MOVE_AMOUNT_BUCKETS, MOVE_ANGLE_BUCKETS,
    NUM_AGENTS, NUM_LIDAR_SAMPLES, ROTATE_BUCKETS, ROTATE_IDLE,
};
use bytemuck::{Pod, Zeroable};

// ── Per-world control flags ─────────────────────────────────────

/// Reset request. Nonzero regenerates the world on the next step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct WorldReset {
    /// Request flag.
    pub reset: i32,
}

/// Load-checkpoint request. Nonzero restores the checkpoint blob on the
/// next step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct CheckpointReset {
    /// Request flag.
    pub reset: i32,
}

/// Save-checkpoint request. While nonzero, each step writes the world
/// state into the checkpoint blob.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct CheckpointSave {
    /// Request flag.
    pub save: i32,
}

// ── Per-agent action and result records ─────────────────────────

/// Discrete four-bucket agent action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct Action {
    /// Speed bucket in `[0, 4)`.
    pub move_amount: i32,
    /// Direction bucket in `[0, 8)`, relative to the agent's heading.
    pub move_angle: i32,
    /// Turn bucket in `[0, 5)`; `2` does not turn.
    pub rotate: i32,
    /// `1` grabs or releases.
    pub interact: i32,
}

impl Action {
    /// The action written back after each step consumes an action.
    pub const IDLE: Action = Action {
        move_amount: 0,
        move_angle: 0,
        rotate: ROTATE_IDLE,
        interact: 0,
    };

    /// Build an action from raw bucket values.
    pub const fn new(move_amount: i32, move_angle: i32, rotate: i32, interact: i32) -> Self {
        Self {
            move_amount,
            move_angle,
            rotate,
            interact,
        }
    }

    /// Clamp each bucket into its legal range.
    pub fn clamped(self) -> Self {
        Self {
            move_amount: self.move_amount.clamp(0, MOVE_AMOUNT_BUCKETS - 1),
            move_angle: self.move_angle.clamp(0, MOVE_ANGLE_BUCKETS - 1),
            rotate: self.rotate.clamp(0, ROTATE_BUCKETS - 1),
            interact: self.interact.clamp(0, INTERACT_BUCKETS - 1),
        }
    }
}

impl Default for Action {
    fn default() -> Self {
        Self::IDLE
    }
}

/// Scalar reward for the last step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Reward {
    /// Reward value.
    pub v: f32,
}

/// Episode-finished flag.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct Done {
    /// `1` once the episode has ended.
    pub v: i32,
}

/// Steps left before the episode times out.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct StepsRemaining {
    /// Remaining steps.
    pub t: i32,
}

/// Agent index within its world.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct AgentId {
    /// Index in `[0, NUM_AGENTS)`.
    pub id: i32,
}

// ── Observations ────────────────────────────────────────────────

/// Normalized proprioceptive observation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct SelfObservation {
    /// X within the arena, scaled to `[-1, 1]`.
    pub room_x: f32,
    /// Y within the current room, scaled to `[0, 1]`.
    pub room_y: f32,
    /// X within the arena, scaled to `[-1, 1]`.
    pub global_x: f32,
    /// Y along the whole arena, scaled by the arena length.
    pub global_y: f32,
    /// Height above the floor.
    pub global_z: f32,
    /// Furthest y reached this episode, scaled by the arena length.
    pub max_y: f32,
    /// Heading in `[-1, 1)`, as a fraction of pi.
    pub theta: f32,
    /// `1` while carrying a cube.
    pub is_grabbing: f32,
    /// Code of the key the agent holds, or `0`.
    pub key_code: f32,
}

/// Distance and bearing of a point in an agent's frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct PolarObservation {
    /// Planar distance, scaled by the arena length.
    pub r: f32,
    /// Bearing as a fraction of pi; `0` is straight ahead.
    pub theta: f32,
}

/// Observation of one other agent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct PartnerObservation {
    /// Where the partner is.
    pub polar: PolarObservation,
    /// `1` while the partner carries a cube.
    pub is_grabbing: f32,
}

/// Observations of every other agent, in agent-index order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct PartnerObservations {
    /// One record per other agent.
    pub obs: [PartnerObservation; NUM_AGENTS - 1],
}

/// Observation of one entity in the agent's current room.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct EntityObservation {
    /// Where the entity is.
    pub polar: PolarObservation,
    /// [`EntityType::encode`](crate::EntityType::encode) of the entity.
    pub encoded_type: f32,
}

/// Entities in the agent's current room, padded with empty records.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct RoomEntityObservations {
    /// Buttons, then cubes, then the key, then padding.
    pub obs: [EntityObservation; MAX_OBSERVATIONS_PER_AGENT],
}

/// Observation of the current room's exit door.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct DoorObservation {
    /// Where the door is.
    pub polar: PolarObservation,
    /// `1` while the door is open.
    pub is_open: f32,
}

/// One lidar ray result.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct LidarSample {
    /// Hit distance scaled by the arena length, or `0` for no hit.
    pub depth: f32,
    /// Encoded type of the hit entity.
    pub encoded_type: f32,
}

/// A full planar lidar sweep starting at the agent's heading.
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Lidar {
    /// Samples in counter-clockwise order.
    pub samples: [LidarSample; NUM_LIDAR_SAMPLES],
}

impl Default for Lidar {
    fn default() -> Self {
        Self::zeroed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::size_of;

    #[test]
    fn record_sizes_match_tensor_widths() {
        assert_eq!(size_of::<Action>(), 16);
        assert_eq!(size_of::<SelfObservation>(), 9 * 4);
        assert_eq!(size_of::<PartnerObservations>(), (NUM_AGENTS - 1) * 3 * 4);
        assert_eq!(
            size_of::<RoomEntityObservations>(),
            MAX_OBSERVATIONS_PER_AGENT * 3 * 4
        );
        assert_eq!(size_of::<DoorObservation>(), 3 * 4);
        assert_eq!(size_of::<Lidar>(), NUM_LIDAR_SAMPLES * 2 * 4);
    }

    #[test]
    fn clamped_action_is_legal() {
        let a = Action::new(9, -3, 17, 5).clamped();
        assert_eq!(a, Action::new(3, 0, 4, 1));
        assert_eq!(Action::IDLE.clamped(), Action::IDLE);
        assert_eq!(Action::default().rotate, 2);
    }
}
