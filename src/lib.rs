//! # rust-dipole
//!
//! A deterministic turn-based board engine with an exact undo log, 64-bit
//! state digests and tree-search robots, built around the stacking game
//! Dipole.
//!
//! ## Design Principles
//!
//! 1. **Execute/Unexecute are inverses**: every mutation pushes an undo
//!    record, and unexecute restores the previous digest bit for bit.
//!
//! 2. **Illegal input is fatal**: a move the phase does not accept is an
//!    error, never a silent no-op. Only generator-approved moves are
//!    submitted by the robots.
//!
//! 3. **Digests by role**: each game-affecting field digests through its
//!    own key stream, so replays and repetition checks do not alias.
//!
//! ## Architecture
//!
//! - **Session**: the one authoritative board, its move log and the
//!   repetition table. Replaying the log reproduces the live digest.
//!
//! - **Robots**: searches run on a private clone handed to a worker thread;
//!   the finished move comes back over a channel and goes through the
//!   normal execute path.
//!
//! ## Modules
//!
//! - `core`: players, RNG, cells, moves and their wire format, errors
//! - `digest`: digest keys, mixing and the repetition table
//! - `rules`: RulesEngine trait consumed by the searches
//! - `games`: the Dipole board and phase machine
//! - `mcts`: Monte Carlo Tree Search
//! - `robot`: alpha-beta, transposition table and the robot driver
//! - `session`: apply/undo, move log, replay verification

pub mod core;
pub mod digest;
pub mod games;
pub mod mcts;
pub mod robot;
pub mod rules;
pub mod session;

#[cfg(feature = "python")]
pub mod python;

// Re-export commonly used types
pub use crate::core::{
    Cell, CellRef, Chip, Coord, GameError, GameRng, Move, MoveOp, ParseError, PlayerId,
    PlayerMap, ReplayMode, SearchError, SessionError, SessionInit,
};

pub use crate::digest::{DigestKeys, RepetitionTable};

pub use crate::rules::{GameResult, RulesEngine};

pub use crate::games::dipole::{DipoleBoard, Phase, Variant};

pub use crate::mcts::{
    MCTSConfig, MCTSSearch, MCTSTree, MCTSNode, NodeId, Edge,
    SearchStats, TreeStats,
    SelectionPolicy, SimulationPolicy,
    UCB1, PUCT, RandomSimulation, WeightedSimulation,
};

pub use crate::robot::{AlphaBeta, RobotAlgorithm, RobotConfig, RobotDriver, RobotReply, RobotState};

pub use crate::session::{LogEntry, Session};
