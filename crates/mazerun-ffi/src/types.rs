//! C-compatible config and tensor descriptors.

use std::ffi::{c_char, CStr};
use std::path::PathBuf;

use mazerun_core::{RewardMode, SimFlags};
use mazerun_engine::{Config, ExecMode, Tensor};

use crate::status::MazerunStatus;

/// Maximum tensor rank a [`MazerunTensor`] can describe.
pub const MAZERUN_MAX_DIMS: usize = 4;

/// Executor selection for `MazerunConfig::exec_mode`.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MazerunExecMode {
    /// Fixed worker pool on the host.
    Cpu = 0,
    /// Compute kernel on a GPU adapter.
    Gpu = 1,
}

/// Manager configuration as seen from C.
///
/// Fill with `mazerun_config_default` and override fields as needed.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct MazerunConfig {
    /// Worlds stepped per batch.
    pub num_worlds: u32,
    /// A `MazerunExecMode` discriminant.
    pub exec_mode: i32,
    /// GPU adapter index.
    pub gpu_id: u32,
    /// CPU worker threads; 0 picks one per available core.
    pub num_threads: u32,
    /// Nonzero to start a new episode as soon as one ends.
    pub auto_reset: u8,
    /// Bitwise OR of the `SIM_FLAG_*` options.
    pub sim_flags: u32,
    /// 0 = dense, 1 = sparse.
    pub reward_mode: u32,
    /// Side length of a button's pressure square.
    pub button_width: f32,
    /// Width of each door opening.
    pub door_width: f32,
    /// Dense reward per unit of new forward progress.
    pub reward_per_dist: f32,
    /// Dense reward added every step.
    pub slack_reward: f32,
    /// Steps per episode.
    pub episode_len: u32,
    /// NUL-terminated UTF-8 mesh directory, or null for the built-in default.
    pub data_dir: *const c_char,
}

impl MazerunConfig {
    pub(crate) fn from_config(cfg: &Config) -> Self {
        Self {
            num_worlds: cfg.num_worlds,
            exec_mode: match cfg.exec_mode {
                ExecMode::Cpu => MazerunExecMode::Cpu as i32,
                ExecMode::Gpu => MazerunExecMode::Gpu as i32,
            },
            gpu_id: cfg.gpu_id,
            num_threads: cfg.num_threads.map_or(0, |n| n as u32),
            auto_reset: u8::from(cfg.auto_reset),
            sim_flags: cfg.sim_flags.bits(),
            reward_mode: cfg.reward_mode as u32,
            button_width: cfg.button_width,
            door_width: cfg.door_width,
            reward_per_dist: cfg.reward_per_dist,
            slack_reward: cfg.slack_reward,
            episode_len: cfg.episode_len,
            data_dir: std::ptr::null(),
        }
    }

    /// Convert to the manager's config. Value ranges are checked later by
    /// `Config::validate`; only encodings are checked here.
    ///
    /// # Safety
    ///
    /// `data_dir` must be null or point to a NUL-terminated string.
    #[allow(unsafe_code)]
    pub(crate) unsafe fn to_config(&self) -> Result<Config, MazerunStatus> {
        let exec_mode = match self.exec_mode {
            0 => ExecMode::Cpu,
            1 => ExecMode::Gpu,
            _ => return Err(MazerunStatus::InvalidArgument),
        };
        let reward_mode = match self.reward_mode {
            0 => RewardMode::Dense,
            1 => RewardMode::Sparse,
            _ => return Err(MazerunStatus::InvalidArgument),
        };
        let mut cfg = Config {
            num_worlds: self.num_worlds,
            exec_mode,
            gpu_id: self.gpu_id,
            num_threads: (self.num_threads != 0).then_some(self.num_threads as usize),
            auto_reset: self.auto_reset != 0,
            sim_flags: SimFlags(self.sim_flags),
            reward_mode,
            button_width: self.button_width,
            door_width: self.door_width,
            reward_per_dist: self.reward_per_dist,
            slack_reward: self.slack_reward,
            episode_len: self.episode_len,
            ..Config::default()
        };
        if !self.data_dir.is_null() {
            // SAFETY: non-null data_dir is NUL-terminated per caller contract.
            let dir = unsafe { CStr::from_ptr(self.data_dir) };
            let dir = dir.to_str().map_err(|_| MazerunStatus::InvalidArgument)?;
            cfg.data_dir = PathBuf::from(dir);
        }
        Ok(cfg)
    }
}

/// Where and how an exported tensor lives.
///
/// On the CPU backend `data` points at the manager's own buffer; it stays
/// valid until the manager is destroyed and its contents change on every
/// step. On the GPU backend `data` is null, `gpu_id` names the device, and
/// the contents are read with `mazerun_tensor_copy_to_host`.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct MazerunTensor {
    /// Host address of the first element, or null for device tensors.
    pub data: *const u8,
    /// An `ElementType` discriminant (3 = int32, 6 = float32, 0 = uint8).
    pub dtype: i32,
    /// Number of valid entries in `dims`.
    pub num_dims: u32,
    /// Shape, outermost dimension first.
    pub dims: [i64; MAZERUN_MAX_DIMS],
    /// Total size in bytes.
    pub num_bytes: u64,
    /// Owning device, or -1 for host tensors.
    pub gpu_id: i32,
}

impl MazerunTensor {
    pub(crate) fn describe(tensor: &Tensor<'_>) -> Self {
        let mut dims = [0; MAZERUN_MAX_DIMS];
        let rank = tensor.dims().len().min(MAZERUN_MAX_DIMS);
        dims[..rank].copy_from_slice(&tensor.dims()[..rank]);
        Self {
            data: tensor.as_ptr(),
            dtype: tensor.dtype() as i32,
            num_dims: rank as u32,
            dims,
            num_bytes: tensor.num_bytes() as u64,
            gpu_id: tensor.gpu_id().map_or(-1, |id| id as i32),
        }
    }
}

/// Reuse the same level layout for every episode.
pub const SIM_FLAG_USE_FIXED_WORLD: u32 = 1;
/// Never end an episode because the step budget ran out.
pub const SIM_FLAG_IGNORE_EPISODE_LENGTH: u32 = 2;
/// Randomize agent spawn positions and headings.
pub const SIM_FLAG_RANDOMIZE_SPAWN: u32 = 4;
