//! `RulesEngine` for Dipole.
//!
//! Robot moves finish the turn: when a move leaves the board waiting for
//! `done`, `execute_robot` confirms it, and `unexecute_robot` takes the
//! confirmation back first.

use crate::core::{Move, MoveOp, MoveResult, PlayerId, ReplayMode};
use crate::rules::{GameResult, RulesEngine};

use super::board::DipoleBoard;
use super::variant::DIPOLE_PLAYERS;

impl RulesEngine for DipoleBoard {
    type Move = Move;

    fn player_count(&self) -> usize {
        DIPOLE_PLAYERS
    }

    fn whose_turn(&self) -> PlayerId {
        self.turn.whose_turn
    }

    fn robot_moves(&self) -> Vec<Move> {
        DipoleBoard::robot_moves(self)
    }

    fn execute_robot(&mut self, mv: &mut Move) -> MoveResult<()> {
        self.execute(mv, ReplayMode::Replay)?;
        if mv.op != MoveOp::Done && self.turn.phase.awaits_done() {
            let mut done = Move::simple(MoveOp::Done, mv.player);
            self.execute(&mut done, ReplayMode::Replay)?;
        }
        Ok(())
    }

    fn unexecute_robot(&mut self, mv: &Move) -> MoveResult<()> {
        let confirmed = mv.op != MoveOp::Done
            && self.last_executed().is_some_and(|last| last.op == MoveOp::Done);
        if confirmed {
            self.unexecute(&Move::simple(MoveOp::Done, mv.player))?;
        }
        self.unexecute(mv)
    }

    fn result(&self) -> Option<GameResult> {
        self.turn.outcome
    }

    fn digest(&self) -> u64 {
        DipoleBoard::digest(self)
    }

    fn evaluate(&self, player: PlayerId) -> f64 {
        DipoleBoard::evaluate(self, player)
    }

    fn move_weight(&self, mv: &Move) -> f32 {
        DipoleBoard::move_weight(self, mv)
    }

    fn sandbox(&self) -> Self {
        DipoleBoard::sandbox(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_robot_move_completes_turn() {
        let mut b = DipoleBoard::from_init_str("dipole 2 0 1").unwrap();
        let mut start = Move::simple(MoveOp::Start, PlayerId::new(0));
        b.execute_robot(&mut start).unwrap();

        let digest = RulesEngine::digest(&b);
        let before = b.clone();
        let mut mv = b.robot_moves()[0].clone();
        b.execute_robot(&mut mv).unwrap();
        assert_eq!(RulesEngine::whose_turn(&b), PlayerId::new(1));
        assert_eq!(b.undo_depth(), 3);

        b.unexecute_robot(&mv).unwrap();
        assert_eq!(RulesEngine::digest(&b), digest);
        assert_eq!(b, before);
    }

    #[test]
    fn test_every_opening_move_unwinds() {
        let mut b = DipoleBoard::from_init_str("dipole-10 2 5 1").unwrap();
        b.execute_robot(&mut Move::simple(MoveOp::Start, PlayerId::new(0)))
            .unwrap();
        let digest = RulesEngine::digest(&b);
        for mut mv in b.robot_moves() {
            b.execute_robot(&mut mv).unwrap();
            b.unexecute_robot(&mv).unwrap();
            assert_eq!(RulesEngine::digest(&b), digest, "{mv}");
        }
    }

    fn search_copy<E: RulesEngine>(engine: &E) -> E {
        engine.sandbox()
    }

    #[test]
    fn test_search_copy_has_no_history() {
        let mut b = DipoleBoard::from_init_str("dipole 2 0 1").unwrap();
        b.execute_robot(&mut Move::simple(MoveOp::Start, PlayerId::new(0)))
            .unwrap();
        for _ in 0..4 {
            let mut mv = b.robot_moves()[0].clone();
            b.execute_robot(&mut mv).unwrap();
        }
        assert!(b.undo_depth() > 4);

        let mut copy = search_copy(&b);
        assert_eq!(copy.undo_depth(), 0);
        assert_eq!(RulesEngine::digest(&copy), RulesEngine::digest(&b));

        // The copy still unwinds what it plays itself.
        let mut mv = copy.robot_moves()[0].clone();
        copy.execute_robot(&mut mv).unwrap();
        copy.unexecute_robot(&mv).unwrap();
        assert_eq!(copy, b);
    }

    #[test]
    fn test_resign_when_stuck_is_terminal() {
        let mut b = DipoleBoard::from_init_str("dipole 2 0 1").unwrap();
        b.execute_robot(&mut Move::simple(MoveOp::Start, PlayerId::new(0)))
            .unwrap();
        let mut resign = Move::simple(MoveOp::Resign, PlayerId::new(0));
        b.execute_robot(&mut resign).unwrap();
        assert_eq!(b.result(), Some(GameResult::Winner(PlayerId::new(1))));
        b.unexecute_robot(&resign).unwrap();
        assert_eq!(b.result(), None);
    }
}
