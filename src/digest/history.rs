//! Repetition detection over digests.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Occurrences needed for a draw by repetition.
pub const DEFAULT_REPETITION_LIMIT: u32 = 3;

/// Counts how often each digest has been reached at a turn boundary.
///
/// Recording and forgetting are exact inverses so that undoing a move
/// also undoes its contribution.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RepetitionTable {
    counts: FxHashMap<u64, u32>,
    limit: u32,
}

impl Default for RepetitionTable {
    fn default() -> Self {
        Self::new()
    }
}

impl RepetitionTable {
    #[must_use]
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_REPETITION_LIMIT)
    }

    #[must_use]
    pub fn with_limit(limit: u32) -> Self {
        Self {
            counts: FxHashMap::default(),
            limit,
        }
    }

    #[must_use]
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Count one more occurrence; returns the new count.
    pub fn record(&mut self, digest: u64) -> u32 {
        let count = self.counts.entry(digest).or_insert(0);
        *count += 1;
        *count
    }

    /// Take back one occurrence recorded earlier.
    pub fn forget(&mut self, digest: u64) {
        if let Some(count) = self.counts.get_mut(&digest) {
            *count -= 1;
            if *count == 0 {
                self.counts.remove(&digest);
            }
        }
    }

    #[must_use]
    pub fn count(&self, digest: u64) -> u32 {
        self.counts.get(&digest).copied().unwrap_or(0)
    }

    /// True once `digest` has been seen `limit` times.
    #[must_use]
    pub fn is_repeated(&self, digest: u64) -> bool {
        self.limit > 0 && self.count(digest) >= self.limit
    }

    /// Distinct digests currently tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn clear(&mut self) {
        self.counts.clear();
    }
}
