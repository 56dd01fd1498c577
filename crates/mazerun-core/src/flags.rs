//! Episode-generation flags and reward modes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::BitOr;

/// Bit set of episode-generation options.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SimFlags(pub u32);

impl SimFlags {
    /// No options.
    pub const DEFAULT: SimFlags = SimFlags(0);
    /// Reuse the same level layout for every episode.
    pub const USE_FIXED_WORLD: SimFlags = SimFlags(1 << 0);
    /// Never end an episode because the step budget ran out.
    pub const IGNORE_EPISODE_LENGTH: SimFlags = SimFlags(1 << 1);
    /// Randomize agent spawn positions and headings.
    pub const RANDOMIZE_SPAWN: SimFlags = SimFlags(1 << 2);

    /// Raw bits.
    pub fn bits(self) -> u32 {
        self.0
    }

    /// Whether every bit of `other` is set.
    pub fn contains(self, other: SimFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for SimFlags {
    type Output = SimFlags;

    fn bitor(self, rhs: SimFlags) -> SimFlags {
        SimFlags(self.0 | rhs.0)
    }
}

impl fmt::Display for SimFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// How rewards are computed each step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u32)]
pub enum RewardMode {
    /// Reward forward progress every step, plus a per-step slack term.
    #[default]
    Dense = 0,
    /// Reward only the step on which an agent leaves the escape room.
    Sparse = 1,
}
