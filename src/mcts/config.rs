//! Knobs for one MCTS search.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Search parameters. Built with `Default` plus the `with_*` setters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MCTSConfig {
    /// `c` in the UCB1 and PUCT bonus terms.
    pub exploration_constant: f64,

    /// Tree depth where expansion stops and the evaluator scores the leaf.
    /// Zero means no limit.
    pub max_depth: u32,

    /// The search stops growing once the arena holds this many nodes.
    pub max_nodes: usize,

    /// Playout RNG seed. The search mixes in the root digest.
    pub seed: u64,

    /// Zero picks the most visited root edge; above zero samples by
    /// `exp(visits / temperature)`.
    pub temperature: f64,

    /// Playout length before falling back to the evaluator. Zero plays out
    /// to the end of the game.
    pub playout_depth: u32,

    /// Sample playout moves by [`RulesEngine::move_weight`](crate::rules::RulesEngine::move_weight).
    pub weighted_playouts: bool,

    pub time_limit_ms: Option<u64>,

    /// Compare the digest before execute with the digest after unexecute.
    pub verify_digests: bool,
}

impl Default for MCTSConfig {
    fn default() -> Self {
        Self {
            exploration_constant: std::f64::consts::SQRT_2,
            max_depth: 0,
            max_nodes: 100_000,
            seed: 42,
            temperature: 0.0,
            playout_depth: 80,
            weighted_playouts: true,
            time_limit_ms: None,
            verify_digests: cfg!(debug_assertions),
        }
    }
}

impl MCTSConfig {
    pub fn with_exploration(mut self, c: f64) -> Self {
        self.exploration_constant = c;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_max_depth(mut self, depth: u32) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_nodes(mut self, nodes: usize) -> Self {
        self.max_nodes = nodes;
        self
    }

    pub fn with_playout_depth(mut self, depth: u32) -> Self {
        self.playout_depth = depth;
        self
    }

    /// Uniform playouts when `false`.
    pub fn with_weighted_playouts(mut self, weighted: bool) -> Self {
        self.weighted_playouts = weighted;
        self
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit_ms = Some(limit.as_millis() as u64);
        self
    }

    pub fn with_digest_checks(mut self, verify: bool) -> Self {
        self.verify_digests = verify;
        self
    }

    /// When a search started at `start` has to stop.
    #[must_use]
    pub fn deadline(&self, start: Instant) -> Option<Instant> {
        self.time_limit_ms.map(|ms| start + Duration::from_millis(ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_greedy_and_unlimited() {
        let config = MCTSConfig::default();
        assert_eq!(config.exploration_constant, std::f64::consts::SQRT_2);
        assert_eq!(config.temperature, 0.0);
        assert_eq!(config.max_depth, 0);
        assert!(config.weighted_playouts);
        assert!(config.deadline(Instant::now()).is_none());
    }

    #[test]
    fn test_setters() {
        let config = MCTSConfig::default()
            .with_exploration(0.7)
            .with_temperature(1.5)
            .with_max_nodes(64)
            .with_weighted_playouts(false)
            .with_playout_depth(12);

        assert_eq!(config.exploration_constant, 0.7);
        assert_eq!(config.temperature, 1.5);
        assert_eq!(config.max_nodes, 64);
        assert!(!config.weighted_playouts);
        assert_eq!(config.playout_depth, 12);
    }

    #[test]
    fn test_deadline_follows_time_limit() {
        let start = Instant::now();
        let config = MCTSConfig::default().with_time_limit(Duration::from_millis(1500));
        assert_eq!(config.time_limit_ms, Some(1500));
        assert_eq!(config.deadline(start), Some(start + Duration::from_millis(1500)));
    }

    #[test]
    fn test_json_round_trip() {
        let config = MCTSConfig::default().with_seed(9).with_digest_checks(true);
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(serde_json::from_str::<MCTSConfig>(&json).unwrap(), config);
    }
}
