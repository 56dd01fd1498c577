//! End-to-end behaviour of the manager on the CPU backend.

use mazerun_core::consts::{EPISODE_LEN, NUM_AGENTS};
use mazerun_core::{ElementType, ExportId, SimFlags, WorldState};
use mazerun_engine::{Backend, Config, ExecMode, Manager};
use mazerun_sim::VizBridge;
use mazerun_test_utils::{cpu_config, cpu_manager, init_tracing, ActionScript};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

fn ints(mgr: &Manager, id: ExportId) -> Vec<i32> {
    mgr.export_tensor(id).to_vec::<i32>().unwrap()
}

fn floats(mgr: &Manager, id: ExportId) -> Vec<f32> {
    mgr.export_tensor(id).to_vec::<f32>().unwrap()
}

fn world_state(mgr: &Manager, w: usize) -> WorldState {
    match mgr.backend() {
        Backend::Cpu(exec) => *exec.worlds()[w].state(),
        #[allow(unreachable_patterns)]
        _ => unreachable!("CPU manager"),
    }
}

fn build(cfg: Config) -> Manager {
    init_tracing();
    Manager::new(cfg).unwrap()
}

#[test]
fn construction_yields_valid_first_observation() {
    let mgr = cpu_manager(4);
    assert_eq!(mgr.num_worlds(), 4);
    assert_eq!(mgr.exec_mode(), ExecMode::Cpu);
    let n = 4 * NUM_AGENTS;
    assert_eq!(ints(&mgr, ExportId::StepsRemaining), vec![EPISODE_LEN as i32; n]);
    assert_eq!(ints(&mgr, ExportId::Done), vec![0; n]);
    assert_eq!(ints(&mgr, ExportId::Reset), vec![0; 4]);
    let ids = ints(&mgr, ExportId::AgentId);
    for (row, id) in ids.iter().enumerate() {
        assert_eq!(*id as usize, row % NUM_AGENTS);
    }
    // One episode per world at init, one more from the priming reset.
    assert_eq!(mgr.episodes_started().unwrap(), 8);
}

#[test]
fn reset_only_touches_the_requested_world() {
    let mut mgr = cpu_manager(4);
    mgr.trigger_reset(2);
    mgr.step().unwrap();

    let steps = ints(&mgr, ExportId::StepsRemaining);
    let done = ints(&mgr, ExportId::Done);
    for w in 0..4 {
        for a in 0..NUM_AGENTS {
            let row = w * NUM_AGENTS + a;
            let expected = if w == 2 { EPISODE_LEN } else { EPISODE_LEN - 1 };
            assert_eq!(steps[row], expected as i32, "world {w} agent {a}");
            assert_eq!(done[row], 0, "world {w} agent {a}");
        }
    }
    assert_eq!(mgr.episodes_started().unwrap(), 9);
}

#[test]
fn resetting_every_world_restarts_the_clock() {
    let mut mgr = cpu_manager(5);
    let mut script = ActionScript::new(11);
    for _ in 0..10 {
        script.apply(&mut mgr);
        mgr.step().unwrap();
    }
    for w in 0..5 {
        mgr.trigger_reset(w);
    }
    mgr.step().unwrap();
    let n = 5 * NUM_AGENTS;
    assert_eq!(ints(&mgr, ExportId::StepsRemaining), vec![EPISODE_LEN as i32; n]);
    assert_eq!(ints(&mgr, ExportId::Done), vec![0; n]);
}

#[test]
fn shapes_never_change() {
    let mut mgr = cpu_manager(3);
    let before: Vec<(ElementType, Vec<i64>)> = ExportId::ALL
        .iter()
        .map(|&id| {
            let t = mgr.export_tensor(id);
            (t.dtype(), t.dims().to_vec())
        })
        .collect();
    let mut script = ActionScript::new(3);
    for step in 0..20 {
        script.apply(&mut mgr);
        if step % 7 == 0 {
            mgr.trigger_reset(1);
        }
        mgr.step().unwrap();
    }
    for (&id, (dtype, dims)) in ExportId::ALL.iter().zip(&before) {
        let t = mgr.export_tensor(id);
        assert_eq!(t.dtype(), *dtype, "{id}");
        assert_eq!(t.dims(), dims.as_slice(), "{id}");
        assert!(!t.is_on_gpu());
        assert_eq!(t.host_bytes().unwrap().len(), t.num_bytes());
    }
}

#[test]
fn named_accessors_match_the_registry() {
    let mgr = cpu_manager(2);
    assert_eq!(mgr.reward_tensor().dims(), &[4, 1]);
    assert_eq!(mgr.reward_tensor().dtype(), ElementType::Float32);
    assert_eq!(mgr.action_tensor().dims(), &[4, 4]);
    assert_eq!(mgr.partner_observations_tensor().dims(), &[4, 1, 3]);
    assert_eq!(mgr.room_entity_observations_tensor().dims(), &[4, 6, 3]);
    assert_eq!(mgr.door_observation_tensor().dims(), &[4, 3]);
    assert_eq!(mgr.lidar_tensor().dims(), &[4, 30, 2]);
    assert_eq!(mgr.self_observation_tensor().dims(), &[4, 9]);
    assert_eq!(mgr.checkpoint_tensor().dtype(), ElementType::UInt8);
    assert_eq!(
        mgr.checkpoint_tensor().dims(),
        &[2, std::mem::size_of::<mazerun_core::Checkpoint>() as i64]
    );
    assert_eq!(mgr.checkpoint_reset_tensor().dims(), &[2, 1]);
    assert_eq!(mgr.checkpoint_save_tensor().dims(), &[2, 1]);
    assert_eq!(mgr.steps_remaining_tensor().dtype(), ElementType::Int32);
    assert_eq!(mgr.agent_id_tensor().dims(), &[4, 1]);
    assert_eq!(mgr.done_tensor().dims(), &[4, 1]);
    assert_eq!(mgr.reset_tensor().dims(), &[2, 1]);
}

#[test]
fn actions_affect_only_their_agent() {
    let cfg = Config {
        sim_flags: SimFlags::USE_FIXED_WORLD,
        ..cpu_config(3)
    };
    let mut acted = build(cfg.clone());
    let mut idle = build(cfg);

    acted.set_action(1, 0, 3, 0, 4, 0);
    assert_eq!(
        ints(&acted, ExportId::Action)[NUM_AGENTS * 4..NUM_AGENTS * 4 + 4],
        [3, 0, 4, 0]
    );
    acted.step().unwrap();
    idle.step().unwrap();

    // Consumed actions are replaced by the idle action.
    assert_eq!(ints(&acted, ExportId::Action), ints(&idle, ExportId::Action));

    let a = floats(&acted, ExportId::SelfObservation);
    let b = floats(&idle, ExportId::SelfObservation);
    for (row, (ra, rb)) in a.chunks(9).zip(b.chunks(9)).enumerate() {
        if row == NUM_AGENTS {
            assert_ne!(ra, rb, "acting agent must change");
        } else {
            assert_eq!(ra, rb, "row {row} must not change");
        }
    }
    for w in [0, 2] {
        assert_eq!(world_state(&acted, w), world_state(&idle, w));
    }
    assert_eq!(
        world_state(&acted, 1).agents[1],
        world_state(&idle, 1).agents[1]
    );
}

#[test]
fn checkpoint_round_trip_is_exact() {
    let mut mgr = cpu_manager(2);
    let mut script = ActionScript::new(5);
    for _ in 0..4 {
        script.apply(&mut mgr);
        mgr.step().unwrap();
    }

    mgr.set_save_checkpoint(0, true);
    script.apply(&mut mgr);
    mgr.step().unwrap();
    mgr.set_save_checkpoint(0, false);
    let saved_state = world_state(&mgr, 0);
    let saved_blob = mgr.checkpoint_tensor().to_vec::<u8>().unwrap();
    let rows = 0..NUM_AGENTS * 9;
    let saved_obs = floats(&mgr, ExportId::SelfObservation)[rows.clone()].to_vec();
    let saved_steps = ints(&mgr, ExportId::StepsRemaining)[..NUM_AGENTS].to_vec();
    assert_eq!(
        &saved_blob[..std::mem::size_of::<WorldState>()],
        bytemuck::bytes_of(&saved_state)
    );

    for _ in 0..6 {
        script.apply(&mut mgr);
        mgr.step().unwrap();
    }
    assert_ne!(world_state(&mgr, 0), saved_state);

    mgr.trigger_load_checkpoint(0);
    mgr.step().unwrap();
    assert_eq!(
        bytemuck::bytes_of(&world_state(&mgr, 0)),
        bytemuck::bytes_of(&saved_state)
    );
    assert_eq!(floats(&mgr, ExportId::SelfObservation)[rows], saved_obs[..]);
    assert_eq!(ints(&mgr, ExportId::StepsRemaining)[..NUM_AGENTS], saved_steps[..]);
    assert_eq!(mgr.checkpoint_tensor().to_vec::<u8>().unwrap(), saved_blob);
    assert_eq!(ints(&mgr, ExportId::CheckpointReset), vec![0, 0]);
}

#[test]
fn checkpoint_load_overrides_reset() {
    let mut mgr = cpu_manager(2);
    mgr.set_save_checkpoint(1, true);
    mgr.step().unwrap();
    mgr.set_save_checkpoint(1, false);
    let saved = world_state(&mgr, 1);
    mgr.step().unwrap();
    let episodes = mgr.episodes_started().unwrap();

    mgr.trigger_reset(1);
    mgr.trigger_load_checkpoint(1);
    mgr.step().unwrap();
    assert_eq!(world_state(&mgr, 1), saved);
    assert_eq!(mgr.episodes_started().unwrap(), episodes);
    // Both requests are consumed.
    assert_eq!(ints(&mgr, ExportId::Reset), vec![0, 0]);
    assert_eq!(ints(&mgr, ExportId::CheckpointReset), vec![0, 0]);
}

#[test]
fn save_flag_persists_until_cleared() {
    let mut mgr = cpu_manager(1);
    mgr.set_save_checkpoint(0, true);
    let mut script = ActionScript::new(9);
    for _ in 0..3 {
        script.apply(&mut mgr);
        mgr.step().unwrap();
        let blob = mgr.checkpoint_tensor().to_vec::<u8>().unwrap();
        assert_eq!(blob, bytemuck::bytes_of(&world_state(&mgr, 0)));
    }
    assert_eq!(ints(&mgr, ExportId::CheckpointSave), vec![1]);
    mgr.set_save_checkpoint(0, false);
    let frozen = mgr.checkpoint_tensor().to_vec::<u8>().unwrap();
    script.apply(&mut mgr);
    mgr.step().unwrap();
    assert_eq!(mgr.checkpoint_tensor().to_vec::<u8>().unwrap(), frozen);
}

#[test]
fn auto_reset_reports_the_finished_episode() {
    let mut mgr = build(Config {
        auto_reset: true,
        episode_len: 3,
        ..cpu_config(2)
    });
    for _ in 0..2 {
        mgr.step().unwrap();
        assert_eq!(ints(&mgr, ExportId::Done), vec![0; 2 * NUM_AGENTS]);
    }
    mgr.step().unwrap();
    assert_eq!(ints(&mgr, ExportId::Done), vec![1; 2 * NUM_AGENTS]);
    assert_eq!(ints(&mgr, ExportId::StepsRemaining), vec![3; 2 * NUM_AGENTS]);
    mgr.step().unwrap();
    assert_eq!(ints(&mgr, ExportId::Done), vec![0; 2 * NUM_AGENTS]);
    assert_eq!(ints(&mgr, ExportId::StepsRemaining), vec![2; 2 * NUM_AGENTS]);
}

#[test]
fn without_auto_reset_done_is_sticky() {
    let mut mgr = build(Config {
        episode_len: 2,
        ..cpu_config(1)
    });
    for _ in 0..5 {
        mgr.step().unwrap();
    }
    assert_eq!(ints(&mgr, ExportId::Done), vec![1; NUM_AGENTS]);
    assert_eq!(ints(&mgr, ExportId::StepsRemaining), vec![0; NUM_AGENTS]);
    mgr.trigger_reset(0);
    mgr.step().unwrap();
    assert_eq!(ints(&mgr, ExportId::Done), vec![0; NUM_AGENTS]);
    assert_eq!(ints(&mgr, ExportId::StepsRemaining), vec![2; NUM_AGENTS]);
}

#[test]
fn progress_is_normalized() {
    let mut mgr = cpu_manager(2);
    let first = mgr.progress().unwrap();
    assert!(first > 0.0 && first <= 1.0, "progress {first}");
    for w in 0..2 {
        for a in 0..NUM_AGENTS as u32 {
            mgr.set_action(w, a, 3, 0, 2, 0);
        }
    }
    mgr.step().unwrap();
    assert!(mgr.progress().unwrap() >= first);
}

#[test]
fn train_interface_lists_the_exported_tensors() {
    let mgr = cpu_manager(2);
    let iface = mgr.train_interface();
    assert_eq!(iface.actions.id, ExportId::Action);
    assert_eq!(iface.resets.id, ExportId::Reset);
    assert_eq!(iface.rewards.dims.as_slice(), &[4, 1]);
    assert_eq!(iface.dones.id, ExportId::Done);
    assert!(iface.policy_assignments.is_none());
    assert!(iface.stats.is_empty());
    let names: Vec<&str> = iface.observations.keys().copied().collect();
    assert_eq!(
        names,
        [
            "self",
            "partners",
            "roomEntities",
            "door",
            "lidar",
            "stepsRemaining",
            "agentID"
        ]
    );
    assert_eq!(iface.num_rollout_buffers(), 11);
}

struct CountingViz {
    calls: AtomicU32,
}

impl VizBridge for CountingViz {
    fn on_step(&self, _world_idx: u32, _episode_idx: u32, _state: &WorldState) {
        self.calls.fetch_add(1, Ordering::Relaxed);
    }
}

#[test]
fn viewer_sees_every_world_step() {
    init_tracing();
    let viz = Arc::new(CountingViz {
        calls: AtomicU32::new(0),
    });
    let mut mgr = Manager::with_viz(cpu_config(3), viz.clone()).unwrap();
    assert_eq!(viz.calls.load(Ordering::Relaxed), 3);
    mgr.step().unwrap();
    mgr.step().unwrap();
    assert_eq!(viz.calls.load(Ordering::Relaxed), 9);
}

#[test]
fn random_rollout_keeps_observations_finite() {
    let mut mgr = build(Config {
        auto_reset: true,
        episode_len: 25,
        sim_flags: SimFlags::RANDOMIZE_SPAWN,
        ..cpu_config(4)
    });
    let mut script = ActionScript::new(1234);
    for _ in 0..60 {
        script.apply(&mut mgr);
        mgr.step().unwrap();
        for id in [
            ExportId::Reward,
            ExportId::SelfObservation,
            ExportId::PartnerObservations,
            ExportId::RoomEntityObservations,
            ExportId::DoorObservation,
            ExportId::Lidar,
        ] {
            assert!(floats(&mgr, id).iter().all(|v| v.is_finite()), "{id}");
        }
        let steps = ints(&mgr, ExportId::StepsRemaining);
        assert!(steps.iter().all(|&t| (0..=25).contains(&t)));
    }
}
