//! Cross-world shared counters.
//!
//! These are the only values every world may mutate. Both are lock-free
//! atomics owned by the manager and handed to each world by `Arc`.

use std::sync::atomic::{AtomicU32, Ordering};

/// Hands out globally unique, monotonically increasing episode indices.
#[derive(Debug, Default)]
pub struct EpisodeManager {
    cur_episode: AtomicU32,
}

impl EpisodeManager {
    /// A counter starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the next episode index.
    pub fn next_episode(&self) -> u32 {
        self.cur_episode.fetch_add(1, Ordering::Relaxed)
    }

    /// Number of episodes started so far.
    pub fn episodes_started(&self) -> u32 {
        self.cur_episode.load(Ordering::Relaxed)
    }
}

/// Highest normalized progress any agent in any world has reached.
///
/// Stored as the bit pattern of a non-negative `f32`. For non-negative
/// floats the integer order of the bits matches the float order, so
/// `fetch_max` on the bits is a float max.
#[derive(Debug, Default)]
pub struct SharedProgress {
    bits: AtomicU32,
}

impl SharedProgress {
    /// Progress starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the recorded progress to `value` if it is higher. Negative
    /// and NaN values are ignored.
    pub fn record(&self, value: f32) {
        if value > 0.0 {
            self.bits.fetch_max(value.to_bits(), Ordering::Relaxed);
        }
    }

    /// Highest progress recorded.
    pub fn load(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn episodes_are_unique_across_threads() {
        let mgr = Arc::new(EpisodeManager::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let mgr = Arc::clone(&mgr);
                thread::spawn(move || (0..100).map(|_| mgr.next_episode()).collect::<Vec<_>>())
            })
            .collect();
        let mut all: Vec<u32> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        all.sort_unstable();
        assert_eq!(all, (0..800).collect::<Vec<_>>());
        assert_eq!(mgr.episodes_started(), 800);
    }

    #[test]
    fn progress_keeps_the_maximum() {
        let p = SharedProgress::new();
        assert_eq!(p.load(), 0.0);
        p.record(0.25);
        p.record(0.125);
        p.record(-3.0);
        p.record(f32::NAN);
        assert_eq!(p.load(), 0.25);
        p.record(0.75);
        assert_eq!(p.load(), 0.75);
    }
}
