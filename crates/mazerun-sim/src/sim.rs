//! One world of the escape room and its step pipeline.

use crate::config::SimConfig;
use crate::episode::{EpisodeManager, SharedProgress};
use crate::exports::{SimExports, WorldExports};
use crate::level_gen::generate_world;
use crate::observe::collect_observations;
use crate::rng::{episode_seed, Rng, FIXED_WORLD_SEED};
use crate::systems;
use crate::viz::VizBridge;
use mazerun_assets::ObjectCatalog;
use mazerun_core::consts::NUM_AGENTS;
use mazerun_core::layout::{AgentId, Done, Reward, StepsRemaining};
use mazerun_core::state::WorldMeta;
use mazerun_core::{SimFlags, WorldState};
use mazerun_exec::WorldTaskGraph;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// Shared handles every world receives at construction.
#[derive(Clone)]
pub struct WorldInit {
    /// Source of episode indices.
    pub episode_mgr: Arc<EpisodeManager>,
    /// Rigid-body metadata for every object kind.
    pub catalog: Arc<ObjectCatalog>,
    /// Viewer hook, if a viewer is attached.
    pub viz: Option<Arc<dyn VizBridge>>,
    /// Best progress across the batch.
    pub progress: Arc<SharedProgress>,
}

impl fmt::Debug for WorldInit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorldInit")
            .field("episode_mgr", &self.episode_mgr)
            .field("catalog_len", &self.catalog.len())
            .field("viz", &self.viz.is_some())
            .field("progress", &self.progress)
            .finish()
    }
}

/// What the reset stage of a step did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ResetKind {
    None,
    Loaded,
    Requested,
    Auto,
}

/// One escape-room world.
pub struct Sim {
    state: WorldState,
    meta: WorldMeta,
    episode_mgr: Arc<EpisodeManager>,
    catalog: Arc<ObjectCatalog>,
    viz: Option<Arc<dyn VizBridge>>,
    progress: Arc<SharedProgress>,
}

impl fmt::Debug for Sim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sim")
            .field("meta", &self.meta)
            .finish_non_exhaustive()
    }
}

impl Sim {
    /// The world's live state.
    pub fn state(&self) -> &WorldState {
        &self.state
    }

    /// Episode bookkeeping.
    pub fn meta(&self) -> &WorldMeta {
        &self.meta
    }

    /// Begin a new episode: claim an index and regenerate the level.
    fn start_episode(&mut self, cfg: &SimConfig) {
        let episode_idx = self.episode_mgr.next_episode();
        let seed = if cfg.sim_flags.contains(SimFlags::USE_FIXED_WORLD) {
            FIXED_WORLD_SEED
        } else {
            episode_seed(episode_idx)
        };
        let mut rng = Rng::new(seed);
        generate_world(&mut self.state, &mut rng, cfg, &self.catalog);
        self.meta = WorldMeta {
            episode_idx,
            seed,
            rng_counter: rng.counter(),
            world_idx: self.meta.world_idx,
        };
        trace!(
            world = self.meta.world_idx,
            episode = episode_idx,
            seed,
            "episode started"
        );
    }

    fn run_systems(&mut self, io: &mut WorldExports<'_>, cfg: &SimConfig) {
        let actions = systems::consume_actions(io.actions);
        let prev_y = self.state.agents.map(|a| a.position.y);

        systems::movement(&mut self.state, &actions, cfg, &self.catalog);
        systems::interact(&mut self.state, &actions, &self.catalog);
        systems::update_carried(&mut self.state, &self.catalog);
        systems::update_buttons(&mut self.state, cfg);
        systems::update_doors(&mut self.state);
        let best = systems::reward(&mut self.state, &prev_y, cfg);
        self.progress.record(best);
        systems::count_steps(&mut self.state, cfg);
    }

    /// Apply pending checkpoint loads and resets. A checkpoint load takes
    /// precedence and clears both requests.
    fn reset_stage(&mut self, io: &mut WorldExports<'_>, cfg: &SimConfig) -> ResetKind {
        if io.checkpoint_reset.reset != 0 {
            io.checkpoint_reset.reset = 0;
            io.reset.reset = 0;
            self.state = io.checkpoint.state;
            return ResetKind::Loaded;
        }
        if io.reset.reset != 0 {
            io.reset.reset = 0;
            self.start_episode(cfg);
            return ResetKind::Requested;
        }
        if cfg.auto_reset && self.state.agents[0].done != 0 {
            self.start_episode(cfg);
            return ResetKind::Auto;
        }
        ResetKind::None
    }
}

impl WorldTaskGraph for Sim {
    type Config = SimConfig;
    type Init = WorldInit;
    type Exports = SimExports;

    fn init_world(cfg: &SimConfig, init: &WorldInit, world_idx: u32) -> Self {
        let mut sim = Sim {
            state: WorldState::default(),
            meta: WorldMeta {
                world_idx,
                ..WorldMeta::default()
            },
            episode_mgr: Arc::clone(&init.episode_mgr),
            catalog: Arc::clone(&init.catalog),
            viz: init.viz.clone(),
            progress: Arc::clone(&init.progress),
        };
        sim.start_episode(cfg);
        sim
    }

    fn step(&mut self, cfg: &SimConfig, mut io: WorldExports<'_>) {
        self.run_systems(&mut io, cfg);

        // An auto-reset still reports the finished episode's reward and
        // done alongside the new episode's observations.
        let terminal = self.state.agents.map(|a| (a.reward, a.done));
        let reset = self.reset_stage(&mut io, cfg);

        if io.checkpoint_save.save != 0 {
            io.checkpoint.state = self.state;
        }

        for i in 0..NUM_AGENTS {
            let agent = &self.state.agents[i];
            let (reward, done) = if reset == ResetKind::Auto {
                terminal[i]
            } else {
                (agent.reward, agent.done)
            };
            io.rewards[i] = Reward { v: reward };
            io.dones[i] = Done { v: done };
            io.steps_remaining[i] = StepsRemaining {
                t: agent.steps_remaining,
            };
            io.agent_ids[i] = AgentId { id: i as i32 };
        }
        collect_observations(&self.state, &mut io, cfg, &self.catalog);

        if let Some(viz) = &self.viz {
            viz.on_step(self.meta.world_idx, self.meta.episode_idx, &self.state);
        }
    }
}
