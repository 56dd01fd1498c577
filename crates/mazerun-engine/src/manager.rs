//! The backend-agnostic facade over a batch of escape-room worlds.

use crate::backend::Backend;
use crate::config::{Config, ExecMode};
use crate::error::SetupError;
use crate::registry::ExportSpec;
use crate::train::TrainInterface;
use indexmap::IndexMap;
use mazerun_assets::ObjectCatalog;
use mazerun_core::consts::NUM_AGENTS;
use mazerun_core::layout::{Action, CheckpointReset, CheckpointSave, WorldReset};
use mazerun_core::ExportId;
use mazerun_exec::{ExecError, ExecutionBackend, TaskGraphExecutor, Tensor, ThreadPoolConfig};
use mazerun_sim::assets::load_catalog;
use mazerun_sim::{EpisodeManager, SharedProgress, Sim, SimConfig, VizBridge, WorldInit};
use std::mem::size_of;
use std::sync::Arc;
use tracing::{debug, error, info, info_span, warn};

/// Owns a batch of worlds and the executor stepping them.
///
/// Construction loads the collision meshes once, builds the selected
/// backend, then resets and steps every world once so that every
/// exported tensor holds a valid first observation.
///
/// Control calls ([`trigger_reset`](Self::trigger_reset) and friends)
/// write per-world flags that the next [`step`](Self::step) samples.
/// Tensor accessors borrow the manager, so a view can never outlive the
/// step that produced it.
///
/// World and agent indices are not range-checked in release builds.
pub struct Manager {
    pub(crate) cfg: Config,
    pub(crate) backend: Backend,
    episode_mgr: Arc<EpisodeManager>,
    progress: Arc<SharedProgress>,
}

impl std::fmt::Debug for Manager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Manager")
            .field("num_worlds", &self.cfg.num_worlds)
            .field("exec_mode", &self.backend.mode())
            .finish_non_exhaustive()
    }
}

impl Manager {
    // ── Construction ───────────────────────────────────────────────

    /// Build a manager without a viewer.
    ///
    /// # Errors
    ///
    /// See [`SetupError`]. No partial manager is ever returned.
    pub fn new(cfg: Config) -> Result<Self, SetupError> {
        Self::build(cfg, None)
    }

    /// Build a manager whose worlds report every step to `viz`.
    ///
    /// The GPU backend keeps world state on the device and never calls
    /// the viewer.
    ///
    /// # Errors
    ///
    /// See [`SetupError`].
    pub fn with_viz(cfg: Config, viz: Arc<dyn VizBridge>) -> Result<Self, SetupError> {
        Self::build(cfg, Some(viz))
    }

    fn build(cfg: Config, viz: Option<Arc<dyn VizBridge>>) -> Result<Self, SetupError> {
        let _span = info_span!(
            "manager_setup",
            num_worlds = cfg.num_worlds,
            backend = %cfg.exec_mode
        )
        .entered();

        let result = Self::try_build(cfg, viz);
        if let Err(e) = &result {
            error!(error = %e, "manager setup failed");
        }
        result
    }

    fn try_build(cfg: Config, viz: Option<Arc<dyn VizBridge>>) -> Result<Self, SetupError> {
        cfg.validate()?;
        let catalog = load_catalog(&cfg.data_dir)?;
        let sim_cfg = cfg.sim_config(viz.is_some());
        let episode_mgr = Arc::new(EpisodeManager::new());
        let progress = Arc::new(SharedProgress::new());

        let backend = match cfg.exec_mode {
            ExecMode::Cpu => {
                let init = WorldInit {
                    episode_mgr: Arc::clone(&episode_mgr),
                    catalog,
                    viz,
                    progress: Arc::clone(&progress),
                };
                build_cpu(&cfg, sim_cfg, init)?
            }
            ExecMode::Gpu => {
                if viz.is_some() {
                    warn!("viewer attached to the GPU backend; it will not receive steps");
                }
                build_gpu(&cfg, sim_cfg, &catalog)?
            }
        };

        let mode = cfg.exec_mode;
        let mut mgr = Self {
            cfg,
            backend,
            episode_mgr,
            progress,
        };
        mgr.prime()
            .map_err(|source| SetupError::Backend { mode, source })?;
        info!(
            num_worlds = mgr.cfg.num_worlds,
            backend = %mgr.cfg.exec_mode,
            "manager ready"
        );
        Ok(mgr)
    }

    /// Reset every world and run one step.
    fn prime(&mut self) -> Result<(), ExecError> {
        for w in 0..self.num_worlds() {
            self.trigger_reset(w);
        }
        self.step()
    }

    // ── Stepping ───────────────────────────────────────────────────

    /// Step every world once, blocking until all have finished.
    ///
    /// # Errors
    ///
    /// Returns an [`ExecError`] if the device fails while stepping.
    pub fn step(&mut self) -> Result<(), ExecError> {
        self.backend.run()
    }

    // ── Control ────────────────────────────────────────────────────

    /// Start a fresh episode in world `world_idx` on the next step.
    pub fn trigger_reset(&mut self, world_idx: u32) {
        self.write_world(ExportId::Reset, world_idx, &WorldReset { reset: 1 });
    }

    /// Arm (`true`) or disarm capture of world `world_idx` into its
    /// checkpoint slot. An armed world is captured on every step until
    /// disarmed.
    pub fn set_save_checkpoint(&mut self, world_idx: u32, save: bool) {
        let flag = CheckpointSave {
            save: i32::from(save),
        };
        self.write_world(ExportId::CheckpointSave, world_idx, &flag);
    }

    /// Restore world `world_idx` from its checkpoint slot on the next
    /// step. Takes precedence over [`trigger_reset`](Self::trigger_reset)
    /// for that step.
    pub fn trigger_load_checkpoint(&mut self, world_idx: u32) {
        self.write_world(
            ExportId::CheckpointReset,
            world_idx,
            &CheckpointReset { reset: 1 },
        );
    }

    /// Set the action agent `agent_idx` of world `world_idx` takes on the
    /// next step. Actions are consumed by the step; an agent without a
    /// new action idles.
    pub fn set_action(
        &mut self,
        world_idx: u32,
        agent_idx: u32,
        move_amount: i32,
        move_angle: i32,
        rotate: i32,
        interact: i32,
    ) {
        debug_assert!(
            (agent_idx as usize) < NUM_AGENTS,
            "agent {agent_idx} out of range"
        );
        let action = Action::new(move_amount, move_angle, rotate, interact);
        let row = world_idx as usize * NUM_AGENTS + agent_idx as usize;
        self.backend.write_exported(
            ExportId::Action.slot(),
            row * size_of::<Action>(),
            bytemuck::bytes_of(&action),
        );
    }

    fn write_world<T: bytemuck::Pod>(&mut self, id: ExportId, world_idx: u32, record: &T) {
        debug_assert!(
            world_idx < self.num_worlds(),
            "world {world_idx} out of range for {} worlds",
            self.num_worlds()
        );
        self.backend.write_exported(
            id.slot(),
            world_idx as usize * size_of::<T>(),
            bytemuck::bytes_of(record),
        );
    }

    // ── Tensors ────────────────────────────────────────────────────

    /// View any exported buffer with its registered type and shape.
    pub fn export_tensor(&self, id: ExportId) -> Tensor<'_> {
        let spec = self.export_spec(id);
        self.backend.export_tensor(id.slot(), spec.dtype, &spec.dims)
    }

    /// Registered type and shape of an exported buffer.
    pub fn export_spec(&self, id: ExportId) -> ExportSpec {
        ExportSpec::of(id, self.num_worlds())
    }

    /// `[W, 1]` i32 reset requests.
    pub fn reset_tensor(&self) -> Tensor<'_> {
        self.export_tensor(ExportId::Reset)
    }

    /// `[W×A, 4]` i32 actions.
    pub fn action_tensor(&self) -> Tensor<'_> {
        self.export_tensor(ExportId::Action)
    }

    /// `[W×A, 1]` f32 rewards.
    pub fn reward_tensor(&self) -> Tensor<'_> {
        self.export_tensor(ExportId::Reward)
    }

    /// `[W×A, 1]` i32 done flags.
    pub fn done_tensor(&self) -> Tensor<'_> {
        self.export_tensor(ExportId::Done)
    }

    /// `[W×A, 9]` f32 self observations.
    pub fn self_observation_tensor(&self) -> Tensor<'_> {
        self.export_tensor(ExportId::SelfObservation)
    }

    /// `[W×A, A−1, 3]` f32 partner observations.
    pub fn partner_observations_tensor(&self) -> Tensor<'_> {
        self.export_tensor(ExportId::PartnerObservations)
    }

    /// `[W×A, 6, 3]` f32 room entity observations.
    pub fn room_entity_observations_tensor(&self) -> Tensor<'_> {
        self.export_tensor(ExportId::RoomEntityObservations)
    }

    /// `[W×A, 3]` f32 door observations.
    pub fn door_observation_tensor(&self) -> Tensor<'_> {
        self.export_tensor(ExportId::DoorObservation)
    }

    /// `[W×A, 30, 2]` f32 lidar sweeps.
    pub fn lidar_tensor(&self) -> Tensor<'_> {
        self.export_tensor(ExportId::Lidar)
    }

    /// `[W×A, 1]` i32 steps remaining.
    pub fn steps_remaining_tensor(&self) -> Tensor<'_> {
        self.export_tensor(ExportId::StepsRemaining)
    }

    /// `[W×A, 1]` i32 agent indices.
    pub fn agent_id_tensor(&self) -> Tensor<'_> {
        self.export_tensor(ExportId::AgentId)
    }

    /// `[W, bytes]` u8 checkpoint blobs.
    pub fn checkpoint_tensor(&self) -> Tensor<'_> {
        self.export_tensor(ExportId::Checkpoint)
    }

    /// `[W, 1]` i32 load-checkpoint requests.
    pub fn checkpoint_reset_tensor(&self) -> Tensor<'_> {
        self.export_tensor(ExportId::CheckpointReset)
    }

    /// `[W, 1]` i32 save-checkpoint flags.
    pub fn checkpoint_save_tensor(&self) -> Tensor<'_> {
        self.export_tensor(ExportId::CheckpointSave)
    }

    /// The tensors a training loop exchanges with this manager.
    pub fn train_interface(&self) -> TrainInterface {
        let spec = |id| self.export_spec(id);
        let observations: IndexMap<&'static str, ExportSpec> = [
            ExportId::SelfObservation,
            ExportId::PartnerObservations,
            ExportId::RoomEntityObservations,
            ExportId::DoorObservation,
            ExportId::Lidar,
            ExportId::StepsRemaining,
            ExportId::AgentId,
        ]
        .into_iter()
        .map(|id| (id.name(), spec(id)))
        .collect();
        TrainInterface {
            actions: spec(ExportId::Action),
            resets: spec(ExportId::Reset),
            rewards: spec(ExportId::Reward),
            dones: spec(ExportId::Done),
            policy_assignments: None,
            observations,
            stats: IndexMap::new(),
        }
    }

    // ── Introspection ──────────────────────────────────────────────

    /// Worlds in the batch.
    pub fn num_worlds(&self) -> u32 {
        self.backend.num_worlds()
    }

    /// The configuration this manager was built with.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Which backend steps the worlds.
    pub fn exec_mode(&self) -> ExecMode {
        self.backend.mode()
    }

    /// The executor.
    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    /// Highest normalized progress any agent has reached, in `[0, 1]`.
    ///
    /// # Errors
    ///
    /// Returns a readback error on the GPU backend if the device counters
    /// cannot be read.
    pub fn progress(&self) -> Result<f32, ExecError> {
        match &self.backend {
            Backend::Cpu(_) => Ok(self.progress.load()),
            #[cfg(feature = "gpu")]
            Backend::Gpu(exec) => Ok(device_counters(exec)?.progress()),
        }
    }

    /// Episodes started across the batch since construction.
    ///
    /// # Errors
    ///
    /// Same as [`progress`](Self::progress).
    pub fn episodes_started(&self) -> Result<u32, ExecError> {
        match &self.backend {
            Backend::Cpu(_) => Ok(self.episode_mgr.episodes_started()),
            #[cfg(feature = "gpu")]
            Backend::Gpu(exec) => Ok(device_counters(exec)?.episodes),
        }
    }
}

fn build_cpu(cfg: &Config, sim_cfg: SimConfig, init: WorldInit) -> Result<Backend, SetupError> {
    let inits = vec![init; cfg.num_worlds as usize];
    let pool_cfg = ThreadPoolConfig {
        num_worlds: cfg.num_worlds,
        num_exported_buffers: ExportId::COUNT as u32,
        num_threads: cfg.num_threads,
    };
    let exec = TaskGraphExecutor::<Sim>::new(pool_cfg, sim_cfg, &inits).map_err(|source| {
        SetupError::Backend {
            mode: ExecMode::Cpu,
            source,
        }
    })?;
    debug!(threads = exec.num_threads(), "CPU backend built");
    Ok(Backend::Cpu(exec))
}

#[cfg(feature = "gpu")]
fn build_gpu(
    cfg: &Config,
    sim_cfg: SimConfig,
    catalog: &ObjectCatalog,
) -> Result<Backend, SetupError> {
    use mazerun_exec::{GpuContext, GpuExecutor};
    use mazerun_sim::gpu::DeviceLayout;

    let backend_err = |source| SetupError::Backend {
        mode: ExecMode::Gpu,
        source,
    };
    let layout = DeviceLayout::new(&sim_cfg, cfg.num_worlds, catalog);
    let ctx = GpuContext::new(cfg.gpu_id, layout.num_storage_buffers()).map_err(backend_err)?;
    let exec = layout
        .with_exec_config(|exec_cfg| GpuExecutor::new(ctx, exec_cfg))
        .map_err(backend_err)?;
    debug!(adapter = exec.context().adapter_name(), "GPU backend built");
    Ok(Backend::Gpu(exec))
}

#[cfg(not(feature = "gpu"))]
fn build_gpu(
    _cfg: &Config,
    _sim_cfg: SimConfig,
    _catalog: &ObjectCatalog,
) -> Result<Backend, SetupError> {
    Err(SetupError::GpuNotCompiled)
}

#[cfg(feature = "gpu")]
fn device_counters(
    exec: &mazerun_exec::GpuExecutor,
) -> Result<mazerun_sim::gpu::Counters, ExecError> {
    use mazerun_sim::gpu::{Counters, SHARED_COUNTERS};

    let bytes = exec.read_shared(SHARED_COUNTERS)?;
    Counters::from_bytes(&bytes)
        .ok_or_else(|| ExecError::Readback(format!("counters block is {} bytes", bytes.len())))
}
