//! Robot configuration.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::mcts::MCTSConfig;

/// Which search the robot runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RobotAlgorithm {
    /// Playout-based tree search.
    #[default]
    Mcts,
    /// Iterative deepening negamax with a transposition table.
    AlphaBeta,
}

impl std::str::FromStr for RobotAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mcts" => Ok(Self::Mcts),
            "alphabeta" | "alpha-beta" => Ok(Self::AlphaBeta),
            other => Err(format!("unknown robot algorithm '{other}'")),
        }
    }
}

/// Robot configuration parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RobotConfig {
    /// Search algorithm.
    pub algorithm: RobotAlgorithm,

    /// MCTS parameters. The robot's time limit and digest flag override
    /// the ones in here.
    pub mcts: MCTSConfig,

    /// MCTS iterations per worker.
    pub iterations: u32,

    /// Deepest alpha-beta iteration.
    pub max_depth: u32,

    /// Parallel workers (root-parallel MCTS or alpha-beta root split).
    pub workers: usize,

    /// Wall-clock budget per move in milliseconds.
    pub time_limit_ms: Option<u64>,

    /// Transposition table entries kept before new positions are dropped.
    pub tt_capacity: usize,

    /// Verify that every unexecute restores the digest.
    pub verify_digests: bool,
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            algorithm: RobotAlgorithm::Mcts,
            mcts: MCTSConfig::default(),
            iterations: 2_000,
            max_depth: 4,
            workers: 1,
            time_limit_ms: None,
            tt_capacity: 1 << 18,
            verify_digests: cfg!(debug_assertions),
        }
    }
}

impl RobotConfig {
    pub fn with_algorithm(mut self, algorithm: RobotAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn with_mcts(mut self, mcts: MCTSConfig) -> Self {
        self.mcts = mcts;
        self
    }

    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_max_depth(mut self, depth: u32) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit_ms = Some(limit.as_millis() as u64);
        self
    }

    pub fn with_tt_capacity(mut self, capacity: usize) -> Self {
        self.tt_capacity = capacity;
        self
    }

    pub fn with_digest_checks(mut self, verify: bool) -> Self {
        self.verify_digests = verify;
        self
    }

    /// Seed for the MCTS playouts.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.mcts.seed = seed;
        self
    }

    /// The MCTS parameters with the robot-level settings applied.
    #[must_use]
    pub fn mcts_config(&self) -> MCTSConfig {
        let mut mcts = self.mcts.clone().with_digest_checks(self.verify_digests);
        mcts.time_limit_ms = self.time_limit_ms.or(mcts.time_limit_ms);
        mcts
    }

    /// Deadline of a search started at `start`, if time-limited.
    #[must_use]
    pub fn deadline(&self, start: Instant) -> Option<Instant> {
        self.time_limit_ms
            .map(|ms| start + Duration::from_millis(ms))
    }
}
