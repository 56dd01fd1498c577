//! Per-batch simulation configuration.

use bytemuck::{Pod, Zeroable};
use mazerun_core::consts::EPISODE_LEN;
use mazerun_core::{RewardMode, SimFlags};

/// Configuration shared read-only by every world.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimConfig {
    /// A viewer is attached.
    pub enable_viewer: bool,
    /// Start a new episode automatically once an episode is done.
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
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            enable_viewer: false,
            auto_reset: false,
            sim_flags: SimFlags::DEFAULT,
            reward_mode: RewardMode::Dense,
            button_width: 1.3,
            door_width: 6.0,
            reward_per_dist: 0.05,
            slack_reward: -0.005,
            episode_len: EPISODE_LEN,
        }
    }
}

/// [`SimConfig`] flattened into the kernel's uniform parameter block.
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct GpuParams {
    /// Worlds in the batch.
    pub num_worlds: u32,
    /// `1` if auto-reset is on.
    pub auto_reset: u32,
    /// Raw [`SimFlags`] bits.
    pub sim_flags: u32,
    /// Raw [`RewardMode`] discriminant.
    pub reward_mode: u32,
    /// See [`SimConfig::button_width`].
    pub button_width: f32,
    /// See [`SimConfig::door_width`].
    pub door_width: f32,
    /// See [`SimConfig::reward_per_dist`].
    pub reward_per_dist: f32,
    /// See [`SimConfig::slack_reward`].
    pub slack_reward: f32,
    /// See [`SimConfig::episode_len`].
    pub episode_len: u32,
    /// `1` if a viewer is attached.
    pub enable_viewer: u32,
    /// Padding to 16-byte size.
    pub pad: [u32; 2],
}

impl GpuParams {
    /// Pack `cfg` for a batch of `num_worlds`.
    pub fn new(cfg: &SimConfig, num_worlds: u32) -> Self {
        Self {
            num_worlds,
            auto_reset: u32::from(cfg.auto_reset),
            sim_flags: cfg.sim_flags.bits(),
            reward_mode: cfg.reward_mode as u32,
            button_width: cfg.button_width,
            door_width: cfg.door_width,
            reward_per_dist: cfg.reward_per_dist,
            slack_reward: cfg.slack_reward,
            episode_len: cfg.episode_len,
            enable_viewer: u32::from(cfg.enable_viewer),
            pad: [0; 2],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_block_is_uniform_sized() {
        assert_eq!(std::mem::size_of::<GpuParams>(), 48);
        let p = GpuParams::new(
            &SimConfig {
                auto_reset: true,
                reward_mode: RewardMode::Sparse,
                ..SimConfig::default()
            },
            7,
        );
        assert_eq!(p.num_worlds, 7);
        assert_eq!(p.auto_reset, 1);
        assert_eq!(p.reward_mode, 1);
        assert_eq!(p.episode_len, EPISODE_LEN);
    }
}
