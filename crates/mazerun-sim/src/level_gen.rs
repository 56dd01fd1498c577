//! Procedural level generation.
//!
//! The arena is split along +y into `NUM_ROOMS` rooms. Room `k` ends in
//! a wall at `y = (k + 1) * ROOM_LENGTH` with a door at a random x. Each
//! room draws one puzzle:
//!
//! | kind | contents | door opens when |
//! |---|---|---|
//! | single button | one button | it is pressed |
//! | double button | two buttons | both are pressed |
//! | cube button | one button, one cube | it is pressed |
//! | key | the level's key | an agent holds the key |
//!
//! At most one room per level gets the key; later key draws fall back to
//! a single button.

use crate::config::SimConfig;
use crate::rng::Rng;
use mazerun_assets::ObjectCatalog;
use mazerun_core::consts::{
    KEY_CODE, MAX_BUTTONS_PER_ROOM, NUM_AGENTS, NUM_ROOMS, ROOM_LENGTH, WALL_HEIGHT,
    WALL_WIDTH, WORLD_LENGTH, WORLD_WIDTH,
};
use mazerun_core::state::{
    AgentState, ButtonState, CubeState, DoorState, KeyState, WallState, KEY_ON_FLOOR,
    NOT_GRABBING,
};
use mazerun_core::{EntityType, Quat, SimFlags, SimObject, Vec3, WorldState};
use std::f32::consts::PI;

/// Room puzzle kinds, in draw order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(i32)]
pub enum RoomKind {
    /// One button.
    SingleButton = 0,
    /// Two buttons.
    DoubleButton = 1,
    /// One button and one cube to hold it down.
    CubeButton = 2,
    /// A key that unlocks the door.
    Key = 3,
}

impl RoomKind {
    fn from_draw(draw: i32) -> Self {
        match draw {
            1 => RoomKind::DoubleButton,
            2 => RoomKind::CubeButton,
            3 => RoomKind::Key,
            _ => RoomKind::SingleButton,
        }
    }
}

/// y coordinate at which agents spawn when spawns are not randomized.
pub const FIXED_SPAWN_Y: f32 = 2.5;

/// Clearance kept between randomly placed entities and the room walls.
const PLACEMENT_MARGIN: f32 = 2.0;

/// Overwrite `state` with a fresh level drawn from `rng`.
pub fn generate_world(
    state: &mut WorldState,
    rng: &mut Rng,
    cfg: &SimConfig,
    catalog: &ObjectCatalog,
) {
    *state = WorldState::default();
    let half_w = WORLD_WIDTH * 0.5;
    let half_door = cfg.door_width * 0.5;

    // ── Border walls ────────────────────────────────────────────
    let wall = |position: Vec3, scale: Vec3| WallState {
        position,
        scale,
        entity_type: EntityType::Wall.raw(),
    };
    state.walls[0] = wall(
        Vec3::new(-half_w, WORLD_LENGTH * 0.5, 0.0),
        Vec3::new(WALL_WIDTH, WORLD_LENGTH, WALL_HEIGHT),
    );
    state.walls[1] = wall(
        Vec3::new(half_w, WORLD_LENGTH * 0.5, 0.0),
        Vec3::new(WALL_WIDTH, WORLD_LENGTH, WALL_HEIGHT),
    );
    state.walls[2] = wall(
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(WORLD_WIDTH, WALL_WIDTH, WALL_HEIGHT),
    );

    for (slot, cube) in state.cubes.iter_mut().enumerate() {
        cube.rotation = Quat::IDENTITY;
        cube.identity = slot as i32;
    }
    for button in &mut state.buttons {
        button.rotation = Quat::IDENTITY;
    }
    state.key.rotation = Quat::IDENTITY;

    // ── Rooms ───────────────────────────────────────────────────
    let cube_z = catalog.half_extents(SimObject::Cube).z;
    let key_z = catalog.half_extents(SimObject::Key).z;
    let mut key_placed = false;

    for room in 0..NUM_ROOMS {
        let y0 = room as f32 * ROOM_LENGTH;
        let y1 = y0 + ROOM_LENGTH;
        let margin = half_door + WALL_WIDTH;
        let door_x = rng.sample_range(-half_w + margin, half_w - margin);

        state.doors[room] = DoorState {
            position: Vec3::new(door_x, y1, 0.0),
            rotation: Quat::IDENTITY,
            velocity: Vec3::ZERO,
            angular: Vec3::ZERO,
            open: 0,
            key_code: 0,
        };

        let left_len = door_x - half_door + half_w;
        let right_len = half_w - (door_x + half_door);
        state.walls[3 + 2 * room] = wall(
            Vec3::new(-half_w + left_len * 0.5, y1, 0.0),
            Vec3::new(left_len, WALL_WIDTH, WALL_HEIGHT),
        );
        state.walls[4 + 2 * room] = wall(
            Vec3::new(half_w - right_len * 0.5, y1, 0.0),
            Vec3::new(right_len, WALL_WIDTH, WALL_HEIGHT),
        );

        let mut kind = RoomKind::from_draw(rng.sample_i32(0, 4));
        if kind == RoomKind::Key && key_placed {
            kind = RoomKind::SingleButton;
        }

        let slot = room * MAX_BUTTONS_PER_ROOM;
        let place = |rng: &mut Rng, z: f32| {
            let x = rng.sample_range(-half_w + PLACEMENT_MARGIN, half_w - PLACEMENT_MARGIN);
            let y = rng.sample_range(y0 + PLACEMENT_MARGIN, y1 - PLACEMENT_MARGIN);
            Vec3::new(x, y, z)
        };

        match kind {
            RoomKind::SingleButton => {
                state.buttons[slot] = button(place(rng, 0.0));
            }
            RoomKind::DoubleButton => {
                state.buttons[slot] = button(place(rng, 0.0));
                state.buttons[slot + 1] = button(place(rng, 0.0));
            }
            RoomKind::CubeButton => {
                state.buttons[slot] = button(place(rng, 0.0));
                state.cubes[slot] = CubeState {
                    position: place(rng, cube_z),
                    rotation: Quat::IDENTITY,
                    velocity: Vec3::ZERO,
                    angular: Vec3::ZERO,
                    entity_type: EntityType::Cube.raw(),
                    identity: slot as i32,
                };
            }
            RoomKind::Key => {
                state.key = KeyState {
                    position: place(rng, key_z),
                    rotation: Quat::IDENTITY,
                    state: KEY_ON_FLOOR,
                    code: KEY_CODE,
                };
                state.doors[room].key_code = KEY_CODE;
                key_placed = true;
            }
        }
    }

    // ── Agents ──────────────────────────────────────────────────
    let randomize = cfg.sim_flags.contains(SimFlags::RANDOMIZE_SPAWN);
    for i in 0..NUM_AGENTS {
        let (x, y, yaw) = if randomize {
            let x = rng.sample_range(-half_w + PLACEMENT_MARGIN, half_w - PLACEMENT_MARGIN);
            let y = rng.sample_range(PLACEMENT_MARGIN, ROOM_LENGTH * 0.5);
            let yaw = rng.sample_range(-PI, PI);
            (x, y, yaw)
        } else {
            (fixed_spawn_x(i), FIXED_SPAWN_Y, 0.0)
        };
        state.agents[i] = AgentState {
            position: Vec3::new(x, y, 0.0),
            rotation: Quat::from_yaw(yaw),
            velocity: Vec3::ZERO,
            angular: Vec3::ZERO,
            grab_state: NOT_GRABBING,
            reward: 0.0,
            done: 0,
            steps_remaining: cfg.episode_len as i32,
            progress: y,
            key_code: 0,
        };
    }
}

/// x coordinate of agent `i` when spawns are not randomized.
pub fn fixed_spawn_x(i: usize) -> f32 {
    -2.0 + 4.0 * i as f32
}

fn button(position: Vec3) -> ButtonState {
    ButtonState {
        position,
        rotation: Quat::IDENTITY,
        pressed: 0,
        active: 1,
    }
}
