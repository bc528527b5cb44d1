//! Monte Carlo Tree Search over any [`RulesEngine`](crate::rules::RulesEngine).
//!
//! One board clone per search, moved with `execute_robot` and restored with
//! `unexecute_robot`. Statistics live on the edges of an arena tree and are
//! kept per player. A search stops on its iteration count, node cap,
//! deadline or cancel flag, whichever comes first. [`parallel_search`] runs
//! independent workers on rayon and sums their root visits.
//!
//! ```rust
//! use rust_dipole::core::{Move, MoveOp, PlayerId, ReplayMode};
//! use rust_dipole::games::dipole::DipoleBoard;
//! use rust_dipole::mcts::{MCTSConfig, MCTSSearch, RandomSimulation, PUCT};
//!
//! let mut board = DipoleBoard::from_init_str("dipole 2 734687 1").unwrap();
//! board
//!     .execute(&mut Move::simple(MoveOp::Start, PlayerId::new(0)), ReplayMode::Replay)
//!     .unwrap();
//!
//! let config = MCTSConfig::default().with_playout_depth(10);
//! let mut search = MCTSSearch::<DipoleBoard>::new(config)
//!     .with_selection(PUCT)
//!     .with_simulation(RandomSimulation);
//! let best = search.search(&board, 200).unwrap();
//! assert!(best.is_some());
//! ```

pub mod config;
pub mod node;
pub mod parallel;
pub mod policy;
pub mod search;
pub mod stats;
pub mod tree;

pub use config::MCTSConfig;
pub use node::{Edge, MCTSNode, NodeId};
pub use parallel::{parallel_search, ParallelOutcome};
pub use policy::{
    RandomSimulation, SelectionPolicy, SimulationPolicy, WeightedSimulation, PUCT, UCB1,
};
pub use search::MCTSSearch;
pub use stats::SearchStats;
pub use tree::{MCTSTree, TreeStats};
