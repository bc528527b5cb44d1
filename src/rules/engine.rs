//! Rules engine trait consumed by robot searches.
//!
//! A board that implements `RulesEngine` is its own state: searches clone it
//! once into a private sandbox and then walk the game tree by executing and
//! unexecuting moves in place.
//!
//! ## Implementation Notes
//!
//! - `robot_moves`: the moves a robot chooses between. Each one must finish a
//!   turn when followed by the engine's automatic confirmation.
//! - `execute_robot` / `unexecute_robot`: exact inverses. The digest after an
//!   execute/unexecute pair must equal the digest before it.
//! - `result`: `None` while the game continues.

use std::fmt::{Debug, Display};

use crate::core::error::MoveResult;
use crate::core::player::PlayerId;

/// How a finished game ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum GameResult {
    Winner(PlayerId),
    Draw,
}

impl GameResult {
    #[must_use]
    pub fn is_winner(&self, player: PlayerId) -> bool {
        *self == GameResult::Winner(player)
    }

    /// Playout reward for `player`: 1 for the winner, 0.5 each on a draw.
    #[must_use]
    pub fn reward(&self, player: PlayerId) -> f64 {
        match self {
            GameResult::Draw => 0.5,
            GameResult::Winner(p) if *p == player => 1.0,
            GameResult::Winner(_) => 0.0,
        }
    }
}

impl std::fmt::Display for GameResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameResult::Winner(p) => write!(f, "{p} wins"),
            GameResult::Draw => f.write_str("draw"),
        }
    }
}

/// What a search needs from a board. `Send` so a sandbox clone can run on a
/// worker thread.
pub trait RulesEngine: Clone + Send {
    /// The engine's move value.
    type Move: Clone + PartialEq + Debug + Display + Send;

    /// Seats at the table.
    fn player_count(&self) -> usize;

    /// Player whose decision is pending, `done` included.
    fn whose_turn(&self) -> PlayerId;

    /// Candidate moves for a robot. Empty only when the game is over.
    fn robot_moves(&self) -> Vec<Self::Move>;

    /// Execute a robot move and confirm it. Fills side-effect fields of `mv`.
    fn execute_robot(&mut self, mv: &mut Self::Move) -> MoveResult<()>;

    /// Take back the last robot move.
    fn unexecute_robot(&mut self, mv: &Self::Move) -> MoveResult<()>;

    /// `None` while the game goes on.
    fn result(&self) -> Option<GameResult>;

    /// 64-bit digest of all game-affecting state.
    fn digest(&self) -> u64;

    /// Static estimate in `[0, 1]` of how well `player` stands.
    fn evaluate(&self, player: PlayerId) -> f64;

    /// Relative playout weight of `mv`. Uniform by default.
    fn move_weight(&self, _mv: &Self::Move) -> f32 {
        1.0
    }

    /// An independent copy for a search to play on. Searches only unwind
    /// their own moves, so engines may leave out older undo history.
    fn sandbox(&self) -> Self {
        self.clone()
    }
}
