//! Manager configuration and validation.
//!
//! [`Config`] is fixed for the lifetime of a [`Manager`](crate::Manager).
//! [`validate()`](Config::validate) checks it before any asset is loaded
//! or any device is opened.

use mazerun_core::{RewardMode, SimFlags};
use mazerun_sim::assets::default_data_dir;
use mazerun_sim::SimConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

// ── ExecMode ───────────────────────────────────────────────────────

/// Which executor steps the worlds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecMode {
    /// Host memory, fixed worker pool.
    #[default]
    Cpu,
    /// Device memory, WGSL compute kernel.
    Gpu,
}

impl fmt::Display for ExecMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExecMode::Cpu => "cpu",
            ExecMode::Gpu => "gpu",
        })
    }
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected by [`Config::validate()`].
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// `num_worlds` is zero.
    #[error("num_worlds must be at least 1")]
    NoWorlds,
    /// `num_threads` is `Some(0)`.
    #[error("num_threads must be at least 1 when set")]
    ZeroThreads,
    /// `episode_len` is zero.
    #[error("episode_len must be at least 1")]
    ZeroEpisodeLength,
    /// `episode_len` does not fit the exported steps-remaining counter.
    #[error("episode_len {value} exceeds {max}")]
    EpisodeLengthOverflow {
        /// The configured length.
        value: u32,
        /// Largest accepted length.
        max: u32,
    },
    /// A geometry parameter is not finite and positive.
    #[error("{field} must be finite and positive, got {value}")]
    InvalidWidth {
        /// Name of the offending field.
        field: &'static str,
        /// The invalid value.
        value: f32,
    },
    /// A reward parameter is NaN or infinite.
    #[error("{field} must be finite, got {value}")]
    NonFiniteReward {
        /// Name of the offending field.
        field: &'static str,
        /// The invalid value.
        value: f32,
    },
    /// Unknown bits are set in `sim_flags`.
    #[error("unknown sim flag bits {bits:#x}")]
    UnknownSimFlags {
        /// The unrecognized bits.
        bits: u32,
    },
}

// ── Config ─────────────────────────────────────────────────────────

/// Complete configuration for a [`Manager`](crate::Manager).
///
/// Every field has a default, so a JSON config only needs to name the
/// fields it changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Worlds stepped per batch.
    pub num_worlds: u32,
    /// Executor selection.
    pub exec_mode: ExecMode,
    /// GPU adapter index. Ignored on the CPU backend.
    pub gpu_id: u32,
    /// CPU worker threads. `None` = one per available core.
    pub num_threads: Option<usize>,
    /// Start a new episode as soon as one ends.
    pub auto_reset: bool,
    /// Episode-generation options.
    pub sim_flags: SimFlags,
    /// Reward computation.
    pub reward_mode: RewardMode,
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
    /// Directory holding the collision meshes.
    pub data_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let sim = SimConfig::default();
        Self {
            num_worlds: 1,
            exec_mode: ExecMode::Cpu,
            gpu_id: 0,
            num_threads: None,
            auto_reset: sim.auto_reset,
            sim_flags: sim.sim_flags,
            reward_mode: sim.reward_mode,
            button_width: sim.button_width,
            door_width: sim.door_width,
            reward_per_dist: sim.reward_per_dist,
            slack_reward: sim.slack_reward,
            episode_len: sim.episode_len,
            data_dir: default_data_dir(),
        }
    }
}

impl Config {
    /// Check every structural invariant.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_worlds == 0 {
            return Err(ConfigError::NoWorlds);
        }
        if self.num_threads == Some(0) {
            return Err(ConfigError::ZeroThreads);
        }
        if self.episode_len == 0 {
            return Err(ConfigError::ZeroEpisodeLength);
        }
        let max = i32::MAX as u32;
        if self.episode_len > max {
            return Err(ConfigError::EpisodeLengthOverflow {
                value: self.episode_len,
                max,
            });
        }
        for (field, value) in [
            ("button_width", self.button_width),
            ("door_width", self.door_width),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidWidth { field, value });
            }
        }
        for (field, value) in [
            ("reward_per_dist", self.reward_per_dist),
            ("slack_reward", self.slack_reward),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::NonFiniteReward { field, value });
            }
        }
        let known = (SimFlags::USE_FIXED_WORLD
            | SimFlags::IGNORE_EPISODE_LENGTH
            | SimFlags::RANDOMIZE_SPAWN)
            .bits();
        let unknown = self.sim_flags.bits() & !known;
        if unknown != 0 {
            return Err(ConfigError::UnknownSimFlags { bits: unknown });
        }
        Ok(())
    }

    /// The per-world simulation configuration. `enable_viewer` records
    /// whether a viewer is attached.
    pub fn sim_config(&self, enable_viewer: bool) -> SimConfig {
        SimConfig {
            enable_viewer,
            auto_reset: self.auto_reset,
            sim_flags: self.sim_flags,
            reward_mode: self.reward_mode,
            button_width: self.button_width,
            door_width: self.door_width,
            reward_per_dist: self.reward_per_dist,
            slack_reward: self.slack_reward,
            episode_len: self.episode_len,
        }
    }
}
