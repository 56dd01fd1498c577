//! Complete per-world simulation state.
//!
//! [`WorldState`] holds everything that determines a world's future:
//! entity poses, velocities, door and button status, and per-agent
//! episode bookkeeping. A [`Checkpoint`] is a byte-exact copy of it, so
//! restoring one reproduces the saved world bit for bit.

use crate::consts::{MAX_BUTTONS, MAX_CUBES, NUM_AGENTS, NUM_DOORS, NUM_WALLS};
use crate::math::{Quat, Vec3};
use bytemuck::{Pod, Zeroable};

/// Sentinel for [`AgentState::grab_state`] when nothing is carried.
pub const NOT_GRABBING: i32 = -1;

/// [`KeyState::state`] when the level has no key.
pub const KEY_ABSENT: i32 = 0;
/// [`KeyState::state`] when the key lies on the floor.
pub const KEY_ON_FLOOR: i32 = 1;
/// [`KeyState::state`] base value when held; agent `i` holding the key
/// is encoded as `KEY_HELD + i`.
pub const KEY_HELD: i32 = 2;

/// State of one agent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct AgentState {
    /// Position of the body centre.
    pub position: Vec3,
    /// Yaw-only orientation.
    pub rotation: Quat,
    /// Linear velocity over the last step.
    pub velocity: Vec3,
    /// Angular velocity over the last step.
    pub angular: Vec3,
    /// Index of the carried cube, or [`NOT_GRABBING`].
    pub grab_state: i32,
    /// Reward earned on the last step.
    pub reward: f32,
    /// `1` once the episode has ended.
    pub done: i32,
    /// Steps left before the episode times out.
    pub steps_remaining: i32,
    /// Furthest y reached this episode.
    pub progress: f32,
    /// Code of the held key, or `0`.
    pub key_code: i32,
}

/// State of one room-exit door.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct DoorState {
    /// Position; an open door sinks below the floor.
    pub position: Vec3,
    /// Orientation.
    pub rotation: Quat,
    /// Linear velocity.
    pub velocity: Vec3,
    /// Angular velocity.
    pub angular: Vec3,
    /// `1` while open.
    pub open: i32,
    /// Key code that unlocks the door, or `0` for button-operated doors.
    pub key_code: i32,
}

/// State of one cube slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct CubeState {
    /// Position of the cube centre.
    pub position: Vec3,
    /// Orientation.
    pub rotation: Quat,
    /// Linear velocity.
    pub velocity: Vec3,
    /// Angular velocity.
    pub angular: Vec3,
    /// `EntityType::Cube` for a live cube, `EntityType::None` for an
    /// unused slot.
    pub entity_type: i32,
    /// Slot index, stable for the whole episode.
    pub identity: i32,
}

/// State of one button slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct ButtonState {
    /// Position of the button centre.
    pub position: Vec3,
    /// Orientation.
    pub rotation: Quat,
    /// `1` while something stands on the button.
    pub pressed: i32,
    /// `1` if the slot holds a button this episode.
    pub active: i32,
}

/// Placement of one wall segment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct WallState {
    /// Position of the segment centre.
    pub position: Vec3,
    /// Full extents along each axis.
    pub scale: Vec3,
    /// `EntityType::Wall` for a placed segment, `EntityType::None` for a
    /// zero-width segment.
    pub entity_type: i32,
}

/// State of the level's key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct KeyState {
    /// Position.
    pub position: Vec3,
    /// Orientation.
    pub rotation: Quat,
    /// [`KEY_ABSENT`], [`KEY_ON_FLOOR`], or `KEY_HELD + agent`.
    pub state: i32,
    /// Code matching the door it unlocks.
    pub code: i32,
}

impl KeyState {
    /// Index of the agent holding the key, if any.
    pub fn holder(&self) -> Option<usize> {
        (self.state >= KEY_HELD).then(|| (self.state - KEY_HELD) as usize)
    }
}

/// Everything that determines a world's future.
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct WorldState {
    /// Agents in index order.
    pub agents: [AgentState; NUM_AGENTS],
    /// Door `k` closes room `k`.
    pub doors: [DoorState; NUM_DOORS],
    /// Cube slots; room `k` owns slots `2k` and `2k + 1` at generation.
    pub cubes: [CubeState; MAX_CUBES],
    /// Button slots; room `k` owns slots `2k` and `2k + 1`.
    pub buttons: [ButtonState; MAX_BUTTONS],
    /// Border walls first, then two segments per door.
    pub walls: [WallState; NUM_WALLS],
    /// The level's key.
    pub key: KeyState,
}

impl Default for WorldState {
    fn default() -> Self {
        Self::zeroed()
    }
}

/// Serialized world state exported through the checkpoint slot.
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
#[repr(transparent)]
pub struct Checkpoint {
    /// The saved state.
    pub state: WorldState,
}

impl Default for Checkpoint {
    fn default() -> Self {
        Self::zeroed()
    }
}

/// Episode bookkeeping kept beside the state but outside checkpoints.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct WorldMeta {
    /// Index drawn from the shared episode counter for the current episode.
    pub episode_idx: u32,
    /// Seed of the current episode's random stream.
    pub seed: u32,
    /// Draws taken from the current episode's random stream.
    pub rng_counter: u32,
    /// This world's index in the batch.
    pub world_idx: u32,
}

/// Device-side per-world record: state plus bookkeeping.
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct WorldData {
    /// Simulation state.
    pub state: WorldState,
    /// Episode bookkeeping.
    pub meta: WorldMeta,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::size_of;

    #[test]
    fn sizes_are_word_multiples() {
        assert_eq!(size_of::<AgentState>(), 19 * 4);
        assert_eq!(size_of::<DoorState>(), 15 * 4);
        assert_eq!(size_of::<CubeState>(), 15 * 4);
        assert_eq!(size_of::<ButtonState>(), 9 * 4);
        assert_eq!(size_of::<WallState>(), 7 * 4);
        assert_eq!(size_of::<KeyState>(), 9 * 4);
        assert_eq!(size_of::<Checkpoint>(), size_of::<WorldState>());
        assert_eq!(size_of::<WorldState>() % 4, 0);
        assert_eq!(
            size_of::<WorldData>(),
            size_of::<WorldState>() + size_of::<WorldMeta>()
        );
    }

    #[test]
    fn key_holder_decodes() {
        let mut key = KeyState::zeroed();
        assert_eq!(key.holder(), None);
        key.state = KEY_ON_FLOOR;
        assert_eq!(key.holder(), None);
        key.state = KEY_HELD + 1;
        assert_eq!(key.holder(), Some(1));
    }
}
