//! Dipole: a two-player stacking game on the dark squares of a checkerboard.
//!
//! Each side starts with one tall stack on its home square. A move splits
//! off the top `n` chips of a stack and sends them exactly `n` units along
//! one of eight lines (an orthogonal step crosses a light square and costs
//! two). Forward moves may land on empty or friendly squares; a move in any
//! direction may capture an enemy stack no taller than the chips moved.
//! Stacks within reach of the far edges can be borne off. A player with no
//! chips left on the board loses.
//!
//! ## Modules
//!
//! - `board`: state, accessors, registers, digest.
//! - `execute`: the phase machine, execute/unexecute and undo records.
//! - `movegen`: legal and robot move lists.
//! - `eval`: static evaluation for searches.
//! - `engine`: the `RulesEngine` impl.

mod board;
mod engine;
mod eval;
mod execute;
mod grid;
mod movegen;
mod phase;
mod variant;

pub use board::{AnimationHints, DipoleBoard, Registers};
pub use grid::{Direction, Grid, Reach, DIRECTIONS, FORWARD_COUNT};
pub use phase::Phase;
pub use variant::{Variant, DIPOLE_PLAYERS, NEWEST_REVISION, SKIP_BLOCKED_REVISION};
