//! Counters reported by a finished search.

use serde::{Deserialize, Serialize};

/// What one search (or one merged set of parallel searches) did.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStats {
    pub iterations: u32,
    pub nodes_expanded: u32,
    /// Playouts run, terminal leaves excluded.
    pub simulations: u32,
    pub max_depth: u16,
    /// Wall time in microseconds.
    pub time_us: u64,
    /// Unexecutes whose restored digest was compared.
    pub digest_checks: u64,
    /// The cancellation flag ended the search early.
    pub cancelled: bool,
}

impl SearchStats {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Iterations per second of wall time.
    #[must_use]
    pub fn rate(&self) -> f64 {
        match self.time_us {
            0 => 0.0,
            us => f64::from(self.iterations) * 1e6 / us as f64,
        }
    }

    /// Add a worker's counters. Workers run side by side, so the merged
    /// wall time is the slowest worker's.
    pub fn merge(&mut self, other: &SearchStats) {
        self.iterations += other.iterations;
        self.nodes_expanded += other.nodes_expanded;
        self.simulations += other.simulations;
        self.max_depth = self.max_depth.max(other.max_depth);
        self.time_us = self.time_us.max(other.time_us);
        self.digest_checks += other.digest_checks;
        self.cancelled |= other.cancelled;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate() {
        let mut stats = SearchStats::default();
        assert_eq!(stats.rate(), 0.0);

        stats.iterations = 300;
        stats.time_us = 500_000;
        assert_eq!(stats.rate(), 600.0);

        stats.reset();
        assert_eq!(stats, SearchStats::default());
    }

    #[test]
    fn test_merge_takes_slowest_wall_time() {
        let mut a = SearchStats {
            iterations: 10,
            max_depth: 3,
            time_us: 500,
            digest_checks: 4,
            ..SearchStats::default()
        };
        let b = SearchStats {
            iterations: 5,
            max_depth: 7,
            time_us: 200,
            digest_checks: 1,
            cancelled: true,
            ..SearchStats::default()
        };
        a.merge(&b);
        assert_eq!(a.iterations, 15);
        assert_eq!(a.max_depth, 7);
        assert_eq!(a.time_us, 500);
        assert_eq!(a.digest_checks, 5);
        assert!(a.cancelled);
    }
}
