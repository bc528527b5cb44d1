//! Core engine types: players, RNG, errors, cells, moves, session init.
//!
//! Nothing in here knows the rules of a particular game. Games build their
//! boards out of these pieces.

pub mod cell;
pub mod config;
pub mod error;
pub mod moves;
pub mod player;
pub mod rng;

pub use cell::{Cell, CellKind, CellRef, Chip, ChipStack, Coord, Terrain};
pub use config::{SessionInit, DEFAULT_REVISION, LEGACY_REVISION};
pub use error::{
    GameError, MoveResult, ParseError, ParseResult, SearchError, SearchResult, SessionError,
    SessionResult,
};
pub use moves::{Move, MoveOp, ReplayMode};
pub use player::{PlayerId, PlayerMap};
pub use rng::{GameRng, SEED_SPREAD};
