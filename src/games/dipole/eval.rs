//! Static evaluation and playout move weights.

use crate::core::{CellRef, Move, MoveOp, PlayerId};

use super::board::DipoleBoard;

/// Score units per chip still on the board.
const CHIP_VALUE: f64 = 3.0;
/// Score units per enemy chip captured.
const CAPTURE_VALUE: f64 = 2.0;
/// Score difference that moves the estimate from 0.5 to about 0.73.
const SCALE: f64 = 8.0;

impl DipoleBoard {
    /// Material and progress score of `player`.
    #[must_use]
    pub fn score(&self, player: PlayerId) -> f64 {
        let regs = self.registers(player);
        CHIP_VALUE * f64::from(regs.chips_on_board)
            + CAPTURE_VALUE * f64::from(regs.captured)
            + f64::from(regs.advancement) / f64::from(self.grid.size())
    }

    /// Estimate in `[0, 1]` of how well `player` stands. Exact once the game
    /// is over.
    #[must_use]
    pub fn evaluate(&self, player: PlayerId) -> f64 {
        if let Some(result) = self.outcome() {
            return result.reward(player);
        }
        let diff = self.score(player) - self.score(self.opponent(player));
        1.0 / (1.0 + (-diff / SCALE).exp())
    }

    /// Playout weight: captures first, then forward progress.
    #[must_use]
    pub fn move_weight(&self, mv: &Move) -> f32 {
        match (mv.op, mv.from, mv.to) {
            (MoveOp::Move, Some(CellRef::Board(from)), Some(CellRef::Board(to))) => {
                let target = self.cell(to);
                if target.owner().is_some_and(|p| p != mv.player) {
                    3.0 + target.height() as f32
                } else if self.grid.advancement(to, mv.player) > self.grid.advancement(from, mv.player) {
                    1.5
                } else {
                    1.0
                }
            }
            (MoveOp::Off, ..) => 0.5,
            _ => 1.0,
        }
    }
}
