//! Compile-time world constants.
//!
//! Every constant here is mirrored in the device kernel. Changing one
//! requires the matching edit in `kernel.wgsl`.

/// Agents per world.
pub const NUM_AGENTS: usize = 2;

/// Rooms per world. Each room ends in one door.
pub const NUM_ROOMS: usize = 3;

/// Doors per world.
pub const NUM_DOORS: usize = NUM_ROOMS;

/// Button slots reserved per room.
pub const MAX_BUTTONS_PER_ROOM: usize = 2;

/// Cube slots reserved per room.
pub const MAX_CUBES_PER_ROOM: usize = 2;

/// Button slots per world.
pub const MAX_BUTTONS: usize = NUM_ROOMS * MAX_BUTTONS_PER_ROOM;

/// Cube slots per world.
pub const MAX_CUBES: usize = NUM_ROOMS * MAX_CUBES_PER_ROOM;

/// Wall segments per world: three border walls plus two segments
/// flanking each door.
pub const NUM_WALLS: usize = 3 + 2 * NUM_ROOMS;

/// Entity observation slots per agent.
pub const MAX_OBSERVATIONS_PER_AGENT: usize = 6;

/// Lidar rays per agent.
pub const NUM_LIDAR_SAMPLES: usize = 30;

/// Default episode length in steps.
pub const EPISODE_LEN: u32 = 200;

/// Arena width along x. The arena spans `[-WORLD_WIDTH / 2, WORLD_WIDTH / 2]`.
pub const WORLD_WIDTH: f32 = 20.0;

/// Arena length along y. The arena spans `[0, WORLD_LENGTH]`.
pub const WORLD_LENGTH: f32 = 40.0;

/// Length of a single room along y.
pub const ROOM_LENGTH: f32 = WORLD_LENGTH / NUM_ROOMS as f32;

/// Thickness of every wall segment.
pub const WALL_WIDTH: f32 = 1.0;

/// Height of every wall segment.
pub const WALL_HEIGHT: f32 = 2.0;

/// Free space past the last door where exited agents may walk.
pub const EXIT_DEPTH: f32 = 4.0;

/// An agent whose y exceeds this has fully cleared the last door.
pub const EXIT_Y: f32 = WORLD_LENGTH + WALL_WIDTH / 2.0 + AGENT_RADIUS;

/// Fixed simulation timestep in seconds.
pub const DELTA_T: f32 = 0.04;

/// Agent speed at the highest move-amount bucket.
pub const MAX_MOVE_SPEED: f32 = 10.0;

/// Yaw rate in radians per second per rotate bucket away from idle.
pub const TURN_RATE: f32 = 2.0;

/// Collision radius of an agent in the ground plane.
pub const AGENT_RADIUS: f32 = 1.0;

/// Reach for grabbing cubes and picking up keys, measured from the
/// agent's centre.
pub const INTERACT_RANGE: f32 = 2.5;

/// Gap between an agent's body and a carried cube.
pub const CARRY_GAP: f32 = 0.25;

/// Height of an open door below the floor.
pub const DOOR_OPEN_DEPTH: f32 = -4.0;

/// Code shared by the key and the door it unlocks.
pub const KEY_CODE: i32 = 1;

/// Sparse-mode reward for leaving the escape room.
pub const EXIT_BONUS: f32 = 1.0;

/// Maximum physics object kinds the asset loader accepts.
pub const MAX_PHYSICS_OBJECTS: usize = 10;

// ── Action buckets ──────────────────────────────────────────────

/// Move-amount buckets. `0` stands still.
pub const MOVE_AMOUNT_BUCKETS: i32 = 4;

/// Move-angle buckets, evenly spaced around the agent's heading.
pub const MOVE_ANGLE_BUCKETS: i32 = 8;

/// Rotate buckets. The middle bucket does not turn.
pub const ROTATE_BUCKETS: i32 = 5;

/// Interact buckets: `0` idle, `1` grab or release.
pub const INTERACT_BUCKETS: i32 = 2;

/// Rotate bucket that applies no yaw.
pub const ROTATE_IDLE: i32 = ROTATE_BUCKETS / 2;
