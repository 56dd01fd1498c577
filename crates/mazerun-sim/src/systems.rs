//! Per-step systems, run in this order by [`Sim::step`](crate::Sim):
//!
//! 1. [`consume_actions`] then [`movement`]
//! 2. [`interact`] then [`update_carried`]
//! 3. [`update_buttons`]
//! 4. [`update_doors`]
//! 5. [`reward`]
//! 6. [`count_steps`]
//!
//! Physics is kinematic: agents move at the commanded speed unless a
//! wall or a closed door is in the way, and carried objects ride along
//! with their carrier.

use crate::config::SimConfig;
use mazerun_assets::ObjectCatalog;
use mazerun_core::consts::{
    AGENT_RADIUS, CARRY_GAP, DELTA_T, DOOR_OPEN_DEPTH, EXIT_BONUS, EXIT_DEPTH, EXIT_Y,
    INTERACT_RANGE, MAX_BUTTONS_PER_ROOM, MAX_MOVE_SPEED, MOVE_AMOUNT_BUCKETS,
    MOVE_ANGLE_BUCKETS, NUM_AGENTS, ROTATE_IDLE, TURN_RATE, WALL_WIDTH, WORLD_LENGTH,
    WORLD_WIDTH,
};
use mazerun_core::layout::Action;
use mazerun_core::math::{heading, wrap_angle};
use mazerun_core::state::{DoorState, KEY_HELD, KEY_ON_FLOOR, NOT_GRABBING};
use mazerun_core::{EntityType, Quat, RewardMode, SimFlags, SimObject, Vec3, WorldState};
use std::f32::consts::TAU;

// ── Actions and movement ────────────────────────────────────────

/// Take this step's actions, leaving the idle action in their place.
///
/// Out-of-range codes are clamped into their bucket range.
pub fn consume_actions(actions: &mut [Action]) -> [Action; NUM_AGENTS] {
    let mut taken = [Action::IDLE; NUM_AGENTS];
    for (slot, out) in actions.iter_mut().zip(taken.iter_mut()) {
        *out = slot.clamped();
        *slot = Action::IDLE;
    }
    taken
}

/// Move and turn every agent according to its action.
pub fn movement(
    state: &mut WorldState,
    actions: &[Action; NUM_AGENTS],
    cfg: &SimConfig,
    catalog: &ObjectCatalog,
) {
    let carry_drag = 1.0 / (1.0 + catalog.get(SimObject::Cube).friction.mu_d);
    let doors = state.doors;

    for (agent, action) in state.agents.iter_mut().zip(actions) {
        let yaw = agent.rotation.yaw();
        let mut speed =
            action.move_amount as f32 / (MOVE_AMOUNT_BUCKETS - 1) as f32 * MAX_MOVE_SPEED;
        if agent.grab_state != NOT_GRABBING {
            speed *= carry_drag;
        }
        let move_yaw = yaw + action.move_angle as f32 * TAU / MOVE_ANGLE_BUCKETS as f32;
        let (hx, hy) = heading(move_yaw);
        let omega = (action.rotate - ROTATE_IDLE) as f32 * TURN_RATE;

        let start = agent.position;
        let target = start + Vec3::new(hx, hy, 0.0) * (speed * DELTA_T);
        let end = resolve_motion(&doors, cfg.door_width, start, target, AGENT_RADIUS);

        agent.position = end;
        agent.velocity = (end - start) * (1.0 / DELTA_T);
        agent.angular = Vec3::new(0.0, 0.0, omega);
        agent.rotation = Quat::from_yaw(wrap_angle(yaw + omega * DELTA_T));
    }
}

/// Where a disc of radius `radius` moving from `start` towards `target`
/// comes to rest.
///
/// The side walls and the back wall clamp the disc into the arena. Each
/// door's wall blocks any crossing except through an open door's gap,
/// and a disc inside a wall's band can only slide within the gap.
pub fn resolve_motion(
    doors: &[DoorState],
    door_width: f32,
    start: Vec3,
    mut target: Vec3,
    radius: f32,
) -> Vec3 {
    let x_lim = WORLD_WIDTH * 0.5 - WALL_WIDTH * 0.5 - radius;
    target.x = target.x.clamp(-x_lim, x_lim);

    let band = WALL_WIDTH * 0.5 + radius;
    let half_gap = door_width * 0.5 - radius;
    for door in doors {
        let lo = door.position.y - band;
        let hi = door.position.y + band;
        let in_gap = door.open != 0 && (target.x - door.position.x).abs() <= half_gap;

        if start.y <= lo && target.y > lo && !in_gap {
            target.y = lo;
        } else if start.y >= hi && target.y < hi && !in_gap {
            target.y = hi;
        } else if target.y > lo && target.y < hi && door.open != 0 {
            target.x = target
                .x
                .max(door.position.x - half_gap)
                .min(door.position.x + half_gap);
        }
    }

    target.y = target.y.clamp(WALL_WIDTH * 0.5 + radius, WORLD_LENGTH + EXIT_DEPTH);
    target
}

// ── Interaction ─────────────────────────────────────────────────

/// Resolve interact actions in agent order.
///
/// An agent carrying a cube drops it. Otherwise it picks up the key if
/// the key lies within reach, or else grabs the nearest free cube in
/// reach. Ties go to the higher cube slot.
pub fn interact(
    state: &mut WorldState,
    actions: &[Action; NUM_AGENTS],
    catalog: &ObjectCatalog,
) {
    let cube_half = catalog.half_extents(SimObject::Cube);

    for (i, action) in actions.iter().enumerate() {
        if action.interact == 0 {
            continue;
        }
        let agent_pos = state.agents[i].position;

        let held = state.agents[i].grab_state;
        if held != NOT_GRABBING {
            let cube = &mut state.cubes[held as usize];
            cube.velocity = Vec3::ZERO;
            cube.angular = Vec3::ZERO;
            cube.position.z = cube_half.z;
            state.agents[i].grab_state = NOT_GRABBING;
            continue;
        }

        if state.key.state == KEY_ON_FLOOR
            && (state.key.position - agent_pos).length_xy() <= INTERACT_RANGE
        {
            state.key.state = KEY_HELD + i as i32;
            state.agents[i].key_code = state.key.code;
            continue;
        }

        let reach = INTERACT_RANGE + cube_half.x;
        let mut best: Option<(usize, f32)> = None;
        for (slot, cube) in state.cubes.iter().enumerate() {
            if cube.entity_type != EntityType::Cube.raw() {
                continue;
            }
            if state.agents.iter().any(|a| a.grab_state == slot as i32) {
                continue;
            }
            let d = (cube.position - agent_pos).length_xy();
            if d > reach {
                continue;
            }
            if best.map_or(true, |(_, best_d)| d <= best_d) {
                best = Some((slot, d));
            }
        }
        if let Some((slot, _)) = best {
            state.agents[i].grab_state = slot as i32;
        }
    }
}

/// Move carried cubes in front of their carriers and the key above its
/// holder.
pub fn update_carried(state: &mut WorldState, catalog: &ObjectCatalog) {
    let cube_half = catalog.half_extents(SimObject::Cube);
    let reach = AGENT_RADIUS + cube_half.y + CARRY_GAP;

    for agent in &state.agents {
        if agent.grab_state == NOT_GRABBING {
            continue;
        }
        let (hx, hy) = heading(agent.rotation.yaw());
        let cube = &mut state.cubes[agent.grab_state as usize];
        cube.position = Vec3::new(
            agent.position.x + hx * reach,
            agent.position.y + hy * reach,
            cube_half.z,
        );
        cube.rotation = agent.rotation;
        cube.velocity = agent.velocity;
        cube.angular = agent.angular;
    }

    if let Some(holder) = state.key.holder() {
        let agent = &state.agents[holder];
        state.key.position = agent.position + Vec3::new(0.0, 0.0, 2.0 * AGENT_RADIUS);
        state.key.rotation = agent.rotation;
    }
}

// ── Buttons and doors ───────────────────────────────────────────

/// A button is pressed while an agent or a cube centre is on its
/// square.
pub fn update_buttons(state: &mut WorldState, cfg: &SimConfig) {
    let half = cfg.button_width * 0.5;
    let on = |button: Vec3, p: Vec3| {
        (p.x - button.x).abs() <= half && (p.y - button.y).abs() <= half
    };

    let agents = state.agents.map(|a| a.position);
    let cubes = state
        .cubes
        .map(|c| (c.entity_type == EntityType::Cube.raw()).then_some(c.position));

    for button in &mut state.buttons {
        let pressed = button.active != 0
            && (agents.iter().any(|&p| on(button.position, p))
                || cubes.iter().flatten().any(|&p| on(button.position, p)));
        button.pressed = i32::from(pressed);
    }
}

/// Open each door whose room buttons are all pressed, or whose key is
/// held.
pub fn update_doors(state: &mut WorldState) {
    for (room, door) in state.doors.iter_mut().enumerate() {
        let slot = room * MAX_BUTTONS_PER_ROOM;
        let buttons = &state.buttons[slot..slot + MAX_BUTTONS_PER_ROOM];
        let active = buttons.iter().filter(|b| b.active != 0).count();
        let all_pressed = buttons.iter().all(|b| b.active == 0 || b.pressed != 0);
        let unlocked = door.key_code != 0
            && state.agents.iter().any(|a| a.key_code == door.key_code);

        let open = (active > 0 && all_pressed) || unlocked;
        door.open = i32::from(open);
        door.position.z = if open { DOOR_OPEN_DEPTH } else { 0.0 };
    }
}

// ── Episode bookkeeping ─────────────────────────────────────────

/// Compute each agent's reward and advance its progress.
///
/// `prev_y` holds the agents' y before this step's movement. Returns the
/// world's best progress, normalized to `[0, 1]`.
pub fn reward(state: &mut WorldState, prev_y: &[f32; NUM_AGENTS], cfg: &SimConfig) -> f32 {
    let mut best = 0.0f32;
    for (agent, &before) in state.agents.iter_mut().zip(prev_y) {
        let y = agent.position.y;
        let progress = agent.progress.max(y);
        agent.reward = match cfg.reward_mode {
            RewardMode::Dense => {
                (progress - agent.progress) * cfg.reward_per_dist + cfg.slack_reward
            }
            RewardMode::Sparse => {
                if before <= EXIT_Y && y > EXIT_Y {
                    EXIT_BONUS
                } else {
                    0.0
                }
            }
        };
        agent.progress = progress;
        best = best.max(progress);
    }
    (best / WORLD_LENGTH).clamp(0.0, 1.0)
}

/// Count down the episode clock and raise `done` on timeout or exit.
///
/// `done` stays raised until the world is reset.
pub fn count_steps(state: &mut WorldState, cfg: &SimConfig) {
    let exited = state.agents.iter().any(|a| a.position.y > EXIT_Y);
    let timed_limit = !cfg.sim_flags.contains(SimFlags::IGNORE_EPISODE_LENGTH);
    for agent in &mut state.agents {
        agent.steps_remaining = (agent.steps_remaining - 1).max(0);
    }
    let timed_out = timed_limit && state.agents.iter().any(|a| a.steps_remaining == 0);
    if exited || timed_out {
        for agent in &mut state.agents {
            agent.done = 1;
        }
    }
}
