//! Dipole phases and the operations each one accepts.

use serde::{Deserialize, Serialize};

use crate::core::MoveOp;

/// Finite state of a Dipole board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Free editing of the position.
    Puzzle,
    Play,
    /// A move has been made and awaits `done`.
    Confirm,
    /// The player to move has no legal move.
    Pass,
    Resign,
    DrawOffered,
    /// The opponent of a draw offer must answer it.
    AcceptOrDecline,
    AcceptPending,
    DeclinePending,
    GameOver,
}

impl Phase {
    pub const ALL: [Phase; 10] = [
        Phase::Puzzle,
        Phase::Play,
        Phase::Confirm,
        Phase::Pass,
        Phase::Resign,
        Phase::DrawOffered,
        Phase::AcceptOrDecline,
        Phase::AcceptPending,
        Phase::DeclinePending,
        Phase::GameOver,
    ];

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Phase::Puzzle => "Puzzle",
            Phase::Play => "Play",
            Phase::Confirm => "Confirm",
            Phase::Pass => "Pass",
            Phase::Resign => "Resign",
            Phase::DrawOffered => "DrawOffered",
            Phase::AcceptOrDecline => "AcceptOrDecline",
            Phase::AcceptPending => "AcceptPending",
            Phase::DeclinePending => "DeclinePending",
            Phase::GameOver => "GameOver",
        }
    }

    /// Prompt shown to the player whose decision is pending.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Phase::Puzzle => "Rearrange the board, then start play",
            Phase::Play => "Move a stack",
            Phase::Confirm => "Click Done to confirm your move",
            Phase::Pass => "You have no legal moves: pass",
            Phase::Resign => "Click Done to confirm resigning",
            Phase::DrawOffered => "Click Done to offer a draw",
            Phase::AcceptOrDecline => "Accept or decline the draw offer",
            Phase::AcceptPending => "Click Done to accept the draw",
            Phase::DeclinePending => "Click Done to decline the draw",
            Phase::GameOver => "Game over",
        }
    }

    /// Phase-level admission. Target-level checks happen in `execute`.
    #[must_use]
    pub const fn accepts(self, op: MoveOp) -> bool {
        match self {
            Phase::Puzzle => matches!(op, MoveOp::Pick | MoveOp::Drop | MoveOp::Start),
            Phase::Play => matches!(
                op,
                MoveOp::Pick
                    | MoveOp::Drop
                    | MoveOp::Move
                    | MoveOp::Off
                    | MoveOp::Resign
                    | MoveOp::OfferDraw
                    | MoveOp::Edit
            ),
            Phase::Confirm => matches!(op, MoveOp::Pick | MoveOp::Done | MoveOp::Edit),
            Phase::Pass => matches!(
                op,
                MoveOp::Pass | MoveOp::Done | MoveOp::Resign | MoveOp::Edit
            ),
            Phase::Resign => matches!(op, MoveOp::Resign | MoveOp::Done),
            Phase::DrawOffered => matches!(op, MoveOp::OfferDraw | MoveOp::Done),
            Phase::AcceptOrDecline => matches!(op, MoveOp::AcceptDraw | MoveOp::DeclineDraw),
            Phase::AcceptPending => matches!(op, MoveOp::AcceptDraw | MoveOp::Done),
            Phase::DeclinePending => matches!(op, MoveOp::DeclineDraw | MoveOp::Done),
            Phase::GameOver => false,
        }
    }

    /// Phases in which `done` is the only way forward besides a take-back.
    #[must_use]
    pub const fn awaits_done(self) -> bool {
        matches!(
            self,
            Phase::Confirm
                | Phase::Resign
                | Phase::DrawOffered
                | Phase::AcceptPending
                | Phase::DeclinePending
        )
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_over_accepts_nothing() {
        for op in MoveOp::ALL {
            assert!(!Phase::GameOver.accepts(op));
        }
    }

    #[test]
    fn test_done_acceptance() {
        let accepting: Vec<_> = Phase::ALL
            .into_iter()
            .filter(|p| p.accepts(MoveOp::Done))
            .collect();
        assert_eq!(
            accepting,
            vec![
                Phase::Confirm,
                Phase::Pass,
                Phase::Resign,
                Phase::DrawOffered,
                Phase::AcceptPending,
                Phase::DeclinePending
            ]
        );
    }

    #[test]
    fn test_awaits_done_implies_accepts_done() {
        for phase in Phase::ALL {
            if phase.awaits_done() {
                assert!(phase.accepts(MoveOp::Done), "{phase}");
            }
        }
    }

    #[test]
    fn test_only_puzzle_starts() {
        for phase in Phase::ALL {
            assert_eq!(phase.accepts(MoveOp::Start), phase == Phase::Puzzle);
        }
    }
}
