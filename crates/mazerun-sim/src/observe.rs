//! Observation collection.
//!
//! All observations are egocentric: positions of other entities are
//! given as polar coordinates in the observing agent's frame, with
//! distances normalized by the arena length and angles by pi.

use crate::config::SimConfig;
use crate::exports::WorldExports;
use mazerun_assets::ObjectCatalog;
use mazerun_core::consts::{
    AGENT_RADIUS, MAX_BUTTONS_PER_ROOM, MAX_OBSERVATIONS_PER_AGENT, NUM_AGENTS,
    NUM_LIDAR_SAMPLES, NUM_ROOMS, ROOM_LENGTH, WALL_WIDTH, WORLD_LENGTH, WORLD_WIDTH,
};
use mazerun_core::layout::{
    DoorObservation, EntityObservation, Lidar, LidarSample, PartnerObservation,
    PartnerObservations, PolarObservation, RoomEntityObservations, SelfObservation,
};
use mazerun_core::math::{heading, wrap_angle};
use mazerun_core::state::{AgentState, KEY_ON_FLOOR, NOT_GRABBING};
use mazerun_core::{EntityType, SimObject, Vec3, WorldState};
use smallvec::SmallVec;
use std::f32::consts::{PI, TAU};

/// Room containing y coordinate `y`. Positions past the last door count
/// as the last room.
pub fn room_of(y: f32) -> usize {
    ((y / ROOM_LENGTH).floor().max(0.0) as usize).min(NUM_ROOMS - 1)
}

/// `target` in `agent`'s polar frame.
pub fn polar(agent: &AgentState, target: Vec3) -> PolarObservation {
    let yaw = agent.rotation.yaw();
    let (s, c) = yaw.sin_cos();
    let dx = target.x - agent.position.x;
    let dy = target.y - agent.position.y;
    let local_x = dx * c + dy * s;
    let local_y = -dx * s + dy * c;
    PolarObservation {
        r: (dx * dx + dy * dy).sqrt() / WORLD_LENGTH,
        theta: local_x.atan2(local_y) / PI,
    }
}

/// Agent `i`'s own state.
pub fn self_observation(state: &WorldState, i: usize) -> SelfObservation {
    let agent = &state.agents[i];
    let p = agent.position;
    let room = room_of(p.y);
    let x = p.x / (WORLD_WIDTH * 0.5);
    SelfObservation {
        room_x: x,
        room_y: (p.y - room as f32 * ROOM_LENGTH) / ROOM_LENGTH,
        global_x: x,
        global_y: p.y / WORLD_LENGTH,
        global_z: p.z,
        max_y: agent.progress / WORLD_LENGTH,
        theta: wrap_angle(agent.rotation.yaw()) / PI,
        is_grabbing: if agent.grab_state != NOT_GRABBING { 1.0 } else { 0.0 },
        key_code: agent.key_code as f32,
    }
}

/// Every other agent, in index order, as seen by agent `i`.
pub fn partner_observations(state: &WorldState, i: usize) -> PartnerObservations {
    let me = &state.agents[i];
    let mut out = PartnerObservations::default();
    let others = state
        .agents
        .iter()
        .enumerate()
        .filter(|&(j, _)| j != i)
        .map(|(_, a)| a);
    for (slot, other) in out.obs.iter_mut().zip(others) {
        *slot = PartnerObservation {
            polar: polar(me, other.position),
            is_grabbing: if other.grab_state != NOT_GRABBING { 1.0 } else { 0.0 },
        };
    }
    out
}

/// Buttons, cubes and the key in agent `i`'s current room.
///
/// Buttons come first, then cubes, then the key. Unused slots are
/// zero.
pub fn room_entity_observations(state: &WorldState, i: usize) -> RoomEntityObservations {
    let me = &state.agents[i];
    let room = room_of(me.position.y);

    let slot = room * MAX_BUTTONS_PER_ROOM;
    let buttons = state.buttons[slot..slot + MAX_BUTTONS_PER_ROOM]
        .iter()
        .filter(|b| b.active != 0)
        .map(|b| (b.position, EntityType::Button));
    let cubes = state
        .cubes
        .iter()
        .filter(|c| c.entity_type == EntityType::Cube.raw() && room_of(c.position.y) == room)
        .map(|c| (c.position, EntityType::Cube));
    let key = Some(&state.key)
        .filter(|k| k.state == KEY_ON_FLOOR && room_of(k.position.y) == room)
        .map(|k| (k.position, EntityType::Key));

    let mut out = RoomEntityObservations::default();
    let entities = buttons.chain(cubes).chain(key).take(MAX_OBSERVATIONS_PER_AGENT);
    for (obs, (position, kind)) in out.obs.iter_mut().zip(entities) {
        *obs = EntityObservation {
            polar: polar(me, position),
            encoded_type: kind.encode(),
        };
    }
    out
}

/// The exit door of agent `i`'s current room.
pub fn door_observation(state: &WorldState, i: usize) -> DoorObservation {
    let me = &state.agents[i];
    let door = &state.doors[room_of(me.position.y)];
    DoorObservation {
        polar: polar(me, door.position),
        is_open: if door.open != 0 { 1.0 } else { 0.0 },
    }
}

// ── Lidar ───────────────────────────────────────────────────────

/// An obstacle footprint for ray casting.
#[derive(Clone, Copy, Debug)]
struct Footprint {
    centre: Vec3,
    half_x: f32,
    half_y: f32,
    kind: EntityType,
}

/// Entry distance of a ray into an axis-aligned box, if the ray enters
/// it ahead of the origin.
fn ray_box(origin: Vec3, dir: (f32, f32), b: &Footprint) -> Option<f32> {
    let mut t_near = f32::NEG_INFINITY;
    let mut t_far = f32::INFINITY;
    for (o, d, c, h) in [
        (origin.x, dir.0, b.centre.x, b.half_x),
        (origin.y, dir.1, b.centre.y, b.half_y),
    ] {
        let (lo, hi) = (c - h, c + h);
        if d.abs() < 1e-8 {
            if o < lo || o > hi {
                return None;
            }
            continue;
        }
        let inv = 1.0 / d;
        let (t0, t1) = ((lo - o) * inv, (hi - o) * inv);
        t_near = t_near.max(t0.min(t1));
        t_far = t_far.min(t0.max(t1));
    }
    (t_near > 0.0 && t_near <= t_far).then_some(t_near)
}

/// Obstacles visible to agent `i`.
fn footprints(
    state: &WorldState,
    i: usize,
    cfg: &SimConfig,
    catalog: &ObjectCatalog,
) -> SmallVec<[Footprint; 24]> {
    let mut out = SmallVec::new();
    for wall in &state.walls {
        if wall.entity_type == EntityType::Wall.raw() {
            out.push(Footprint {
                centre: wall.position,
                half_x: wall.scale.x * 0.5,
                half_y: wall.scale.y * 0.5,
                kind: EntityType::Wall,
            });
        }
    }
    for door in state.doors.iter().filter(|d| d.open == 0) {
        out.push(Footprint {
            centre: door.position,
            half_x: cfg.door_width * 0.5,
            half_y: WALL_WIDTH * 0.5,
            kind: EntityType::Door,
        });
    }
    let cube_half = catalog.half_extents(SimObject::Cube);
    for cube in &state.cubes {
        if cube.entity_type == EntityType::Cube.raw() {
            out.push(Footprint {
                centre: cube.position,
                half_x: cube_half.x,
                half_y: cube_half.y,
                kind: EntityType::Cube,
            });
        }
    }
    for (j, agent) in state.agents.iter().enumerate() {
        if j != i {
            out.push(Footprint {
                centre: agent.position,
                half_x: AGENT_RADIUS,
                half_y: AGENT_RADIUS,
                kind: EntityType::Agent,
            });
        }
    }
    out
}

/// `NUM_LIDAR_SAMPLES` rays evenly spaced around agent `i`, starting at
/// its heading. Each sample holds the normalized distance and encoded
/// kind of the nearest hit, or zeros if the ray hits nothing.
pub fn lidar(state: &WorldState, i: usize, cfg: &SimConfig, catalog: &ObjectCatalog) -> Lidar {
    let me = &state.agents[i];
    let yaw = me.rotation.yaw();
    let obstacles = footprints(state, i, cfg, catalog);

    let mut out = Lidar::default();
    for (s, sample) in out.samples.iter_mut().enumerate() {
        let dir = heading(yaw + TAU * s as f32 / NUM_LIDAR_SAMPLES as f32);
        let hit = obstacles
            .iter()
            .filter_map(|b| ray_box(me.position, dir, b).map(|t| (t, b.kind)))
            .min_by(|a, b| a.0.total_cmp(&b.0));
        if let Some((t, kind)) = hit {
            *sample = LidarSample {
                depth: t / WORLD_LENGTH,
                encoded_type: kind.encode(),
            };
        }
    }
    out
}

/// Write every agent's observations into its world's export view.
pub fn collect_observations(
    state: &WorldState,
    out: &mut WorldExports<'_>,
    cfg: &SimConfig,
    catalog: &ObjectCatalog,
) {
    for i in 0..NUM_AGENTS {
        out.self_obs[i] = self_observation(state, i);
        out.partners[i] = partner_observations(state, i);
        out.room_entities[i] = room_entity_observations(state, i);
        out.doors[i] = door_observation(state, i);
        out.lidar[i] = lidar(state, i, cfg, catalog);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::test_catalog;
    use mazerun_core::state::{ButtonState, CubeState, WallState};
    use mazerun_core::Quat;

    fn empty_world() -> WorldState {
        let mut state = WorldState::default();
        for (i, agent) in state.agents.iter_mut().enumerate() {
            agent.position = Vec3::new(-2.0 + 4.0 * i as f32, 2.5, 0.0);
            agent.rotation = Quat::IDENTITY;
            agent.grab_state = NOT_GRABBING;
            agent.progress = 2.5;
        }
        state
    }

    #[test]
    fn rooms_partition_the_arena() {
        assert_eq!(room_of(-1.0), 0);
        assert_eq!(room_of(0.0), 0);
        assert_eq!(room_of(ROOM_LENGTH - 0.01), 0);
        assert_eq!(room_of(ROOM_LENGTH + 0.01), 1);
        assert_eq!(room_of(WORLD_LENGTH + 3.0), NUM_ROOMS - 1);
    }

    #[test]
    fn polar_is_relative_to_heading() {
        let mut agent = empty_world().agents[0];
        agent.position = Vec3::ZERO;
        let ahead = polar(&agent, Vec3::new(0.0, 4.0, 0.0));
        assert!((ahead.r - 0.1).abs() < 1e-6);
        assert!(ahead.theta.abs() < 1e-6);

        agent.rotation = Quat::from_yaw(PI / 2.0);
        let now_ahead = polar(&agent, Vec3::new(-4.0, 0.0, 0.0));
        assert!(now_ahead.theta.abs() < 1e-5);
        let behind = polar(&agent, Vec3::new(4.0, 0.0, 0.0));
        assert!((behind.theta.abs() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn self_observation_is_normalized() {
        let mut state = empty_world();
        state.agents[1].position = Vec3::new(5.0, ROOM_LENGTH * 1.5, 0.0);
        state.agents[1].grab_state = 3;
        state.agents[1].key_code = 1;
        let obs = self_observation(&state, 1);
        assert_eq!(obs.global_x, 0.5);
        assert!((obs.room_y - 0.5).abs() < 1e-5);
        assert!((obs.global_y - 0.5).abs() < 1e-5);
        assert_eq!(obs.is_grabbing, 1.0);
        assert_eq!(obs.key_code, 1.0);
    }

    #[test]
    fn partners_skip_self() {
        let state = empty_world();
        let p = partner_observations(&state, 0);
        assert!((p.obs[0].polar.r - 4.0 / WORLD_LENGTH).abs() < 1e-6);
        assert_eq!(p.obs[0].is_grabbing, 0.0);
    }

    #[test]
    fn room_entities_are_ordered_and_padded() {
        let mut state = empty_world();
        state.buttons[1] = ButtonState {
            position: Vec3::new(3.0, 6.0, 0.0),
            rotation: Quat::IDENTITY,
            pressed: 0,
            active: 1,
        };
        state.cubes[4] = CubeState {
            position: Vec3::new(0.0, 8.0, 0.75),
            entity_type: EntityType::Cube.raw(),
            ..Default::default()
        };
        state.cubes[5] = CubeState {
            position: Vec3::new(0.0, ROOM_LENGTH + 5.0, 0.75),
            entity_type: EntityType::Cube.raw(),
            ..Default::default()
        };
        state.key.state = KEY_ON_FLOOR;
        state.key.position = Vec3::new(1.0, 4.0, 0.75);

        let obs = room_entity_observations(&state, 0);
        let kinds: Vec<f32> = obs.obs.iter().map(|o| o.encoded_type).collect();
        assert_eq!(
            kinds,
            vec![
                EntityType::Button.encode(),
                EntityType::Cube.encode(),
                EntityType::Key.encode(),
                0.0,
                0.0,
                0.0
            ]
        );
        assert_eq!(obs.obs[3], EntityObservation::default());
    }

    #[test]
    fn door_observation_tracks_the_current_room() {
        let mut state = empty_world();
        state.doors[0].position = Vec3::new(3.0, ROOM_LENGTH, 0.0);
        state.doors[1].position = Vec3::new(-3.0, 2.0 * ROOM_LENGTH, 0.0);
        state.doors[1].open = 1;
        assert_eq!(door_observation(&state, 0).is_open, 0.0);
        state.agents[0].position.y = ROOM_LENGTH + 1.0;
        assert_eq!(door_observation(&state, 0).is_open, 1.0);
    }

    #[test]
    fn lidar_sees_the_nearest_obstacle() {
        let catalog = test_catalog();
        let cfg = SimConfig::default();
        let mut state = empty_world();
        state.walls[0] = WallState {
            position: Vec3::new(0.0, 10.0, 0.0),
            scale: Vec3::new(20.0, 1.0, 2.0),
            entity_type: EntityType::Wall.raw(),
        };
        state.cubes[0] = CubeState {
            position: Vec3::new(-2.0, 6.0, 0.75),
            entity_type: EntityType::Cube.raw(),
            ..Default::default()
        };
        let scan = lidar(&state, 0, &cfg, &catalog);
        let ahead = scan.samples[0];
        assert_eq!(ahead.encoded_type, EntityType::Cube.encode());
        assert!((ahead.depth - (6.0 - 0.75 - 2.5) / WORLD_LENGTH).abs() < 1e-5);

        let scan = lidar(&state, 1, &cfg, &catalog);
        assert_eq!(scan.samples[0].encoded_type, EntityType::Wall.encode());
        assert!((scan.samples[0].depth - 7.0 / WORLD_LENGTH).abs() < 1e-5);
    }

    #[test]
    fn lidar_misses_are_zero() {
        let catalog = test_catalog();
        let state = empty_world();
        let scan = lidar(&state, 0, &SimConfig::default(), &catalog);
        let forward = scan.samples[0];
        assert_eq!(forward, LidarSample::default());
    }
}
