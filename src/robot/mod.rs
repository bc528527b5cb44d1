//! Robot opponents.
//!
//! - [`AlphaBeta`]: iterative deepening negamax with a shared
//!   transposition table
//! - [`RobotDriver`]: runs either search on a worker thread against a
//!   private copy of the position
//!
//! MCTS itself lives in [`crate::mcts`]; the driver picks between the two
//! by [`RobotConfig::algorithm`].

pub mod alphabeta;
pub mod config;
pub mod driver;
pub mod transposition;

pub use alphabeta::{AlphaBeta, AlphaBetaOutcome};
pub use config::{RobotAlgorithm, RobotConfig};
pub use driver::{choose_move, RobotDriver, RobotReply, RobotState};
pub use transposition::{Bound, TTEntry, TTStats, TranspositionTable};
