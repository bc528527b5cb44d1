//! The authoritative game session.
//!
//! A [`Session`] owns the one board every participant agrees on. Moves
//! arrive from the UI, the network or a robot and go through
//! [`Session::apply`], which executes them, logs them with a sequence
//! number and keeps the repetition table. The log is the persisted form
//! of a game: [`Session::replay`] rebuilds a session from the init string
//! and the log lines, and [`Session::verify_replay`] checks that doing so
//! lands on the live digest.

use im::Vector;
use tracing::{debug, error, info, warn};

use crate::core::{
    CellRef, Move, MoveOp, PlayerId, ReplayMode, SessionError, SessionInit, SessionResult,
};
use crate::digest::RepetitionTable;
use crate::games::dipole::{DipoleBoard, Phase};
use crate::robot::{RobotDriver, RobotReply};
use crate::rules::GameResult;

use super::log::LogEntry;

/// A live game: board, move log and repetition table.
#[derive(Clone, Debug)]
pub struct Session {
    init: SessionInit,
    board: DipoleBoard,
    log: Vector<LogEntry>,
    repetitions: RepetitionTable,
}

impl Session {
    /// Start a session from its init settings.
    pub fn new(init: SessionInit) -> SessionResult<Self> {
        let board = DipoleBoard::new(&init)?;
        info!(%init, "session created");
        Ok(Self {
            init,
            board,
            log: Vector::new(),
            repetitions: RepetitionTable::new(),
        })
    }

    /// Start a session from the handshake token.
    pub fn from_init_str(init: &str) -> SessionResult<Self> {
        Self::new(SessionInit::parse(init)?)
    }

    /// Replace the repetition table, e.g. to change the limit.
    pub fn with_repetitions(mut self, repetitions: RepetitionTable) -> Self {
        self.repetitions = repetitions;
        self
    }

    // =========================================================================
    // Queries
    // =========================================================================

    #[must_use]
    pub fn init(&self) -> &SessionInit {
        &self.init
    }

    #[must_use]
    pub fn board(&self) -> &DipoleBoard {
        &self.board
    }

    #[must_use]
    pub fn log(&self) -> &Vector<LogEntry> {
        &self.log
    }

    #[must_use]
    pub fn digest(&self) -> u64 {
        self.board.digest()
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.board.phase()
    }

    #[must_use]
    pub fn whose_turn(&self) -> PlayerId {
        self.board.whose_turn()
    }

    #[must_use]
    pub fn result(&self) -> Option<&GameResult> {
        self.board.outcome()
    }

    #[must_use]
    pub fn is_over(&self) -> bool {
        self.board.outcome().is_some()
    }

    #[must_use]
    pub fn phase_description(&self) -> String {
        self.board.phase_description()
    }

    /// Every move `player` may submit now.
    #[must_use]
    pub fn legal_moves(&self, player: PlayerId) -> Vec<Move> {
        self.board.legal_moves(player)
    }

    #[must_use]
    pub fn is_legal_target(&self, loc: CellRef) -> bool {
        self.board.is_legal_target(loc)
    }

    /// Times the current position has been seen at a turn boundary.
    #[must_use]
    pub fn repetition_count(&self) -> u32 {
        self.repetitions.count(self.board.digest())
    }

    // =========================================================================
    // Apply / undo
    // =========================================================================

    /// Execute `mv` on the authoritative board and log it.
    ///
    /// A drop back onto the cell of the pick just logged, or a pick of the
    /// cell just dropped on while the drop awaits `done`, cancels the
    /// logged move instead of adding to the log.
    ///
    /// # Errors
    ///
    /// Whatever the board rejects. Nothing changes when an error is returned.
    pub fn apply(&mut self, mut mv: Move, mode: ReplayMode) -> SessionResult<Move> {
        if self.collapses(&mv) {
            self.board.validate(&mv)?;
            let cancelled = self.undo()?;
            debug!(%mv, %cancelled, "collapsed into the previous move");
            return Ok(mv);
        }

        let turn_before = self.board.move_number();
        let was_over = self.is_over();
        mv.index = Some(self.log.len() as u32 + 1);
        self.board.execute(&mut mv, mode)?;

        let mut entry = LogEntry::new(mv.clone());
        let turn_ended = self.board.move_number() != turn_before || mv.op == MoveOp::Start;
        if turn_ended && !self.is_over() {
            let digest = self.board.digest();
            let seen = self.repetitions.record(digest);
            entry.recorded = Some(digest);
            if self.repetitions.is_repeated(digest) {
                warn!(digest, seen, "position repeated, game drawn");
                self.board.declare_draw()?;
                entry.drew = true;
            }
        }
        self.log.push_back(entry);

        if let (false, Some(result)) = (was_over, self.board.outcome()) {
            info!(%result, moves = self.log.len(), "game over");
        }
        Ok(mv)
    }

    fn collapses(&self, mv: &Move) -> bool {
        let Some(last) = self.log.last() else {
            return false;
        };
        if last.drew || last.mv.player != mv.player {
            return false;
        }
        match (last.mv.op, mv.op) {
            (MoveOp::Pick, MoveOp::Drop) => last.mv.from.is_some() && last.mv.from == mv.to,
            (MoveOp::Drop, MoveOp::Pick) => {
                self.board.phase() == Phase::Confirm
                    && last.mv.to.is_some()
                    && last.mv.to == mv.from
            }
            _ => false,
        }
    }

    /// Take back the last logged move.
    pub fn undo(&mut self) -> SessionResult<Move> {
        let Some(entry) = self.log.last().cloned() else {
            return Err(SessionError::EmptyLog);
        };
        if entry.drew {
            self.board.retract_draw()?;
        }
        if let Err(err) = self.board.unexecute(&entry.mv) {
            error!(mv = %entry.mv, %err, "log and board disagree");
            return Err(err.into());
        }
        if let Some(digest) = entry.recorded {
            self.repetitions.forget(digest);
        }
        self.log.pop_back();
        debug!(mv = %entry.mv, "undone");
        Ok(entry.mv)
    }

    /// Apply a robot's move and confirm it.
    pub fn apply_robot_move(&mut self, mv: Move) -> SessionResult<Move> {
        let player = mv.player;
        let applied = self.apply(mv, ReplayMode::Live)?;
        if applied.op != MoveOp::Done && self.board.phase().awaits_done() {
            self.apply(Move::simple(MoveOp::Done, player), ReplayMode::Live)?;
        }
        Ok(applied)
    }

    /// Let `driver` search the current position and play its answer.
    ///
    /// Returns `None` when the robot has no move.
    pub fn robot_turn(
        &mut self,
        driver: &mut RobotDriver<DipoleBoard>,
    ) -> SessionResult<Option<Move>> {
        driver.prepare_to_move(&self.board)?;
        let reply = driver.wait();
        let played = match reply {
            Ok(RobotReply::Move(mv)) => self.apply_robot_move(mv).map(Some),
            Ok(RobotReply::NoMove) => Ok(None),
            Err(err) => Err(err.into()),
        };
        driver.complete();
        played
    }

    // =========================================================================
    // Transcript and replay
    // =========================================================================

    /// The log in wire format, one move per line.
    #[must_use]
    pub fn transcript(&self) -> Vec<String> {
        self.log.iter().map(LogEntry::line).collect()
    }

    /// Rebuild a session by applying `lines` silently to a fresh board.
    /// Blank lines are skipped.
    pub fn replay<I, S>(init: &str, lines: I) -> SessionResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::replay_with(init, RepetitionTable::new(), lines)
    }

    /// [`Session::replay`] counting repetitions in `repetitions`, which
    /// fixes the limit the rebuilt game is drawn at.
    pub fn replay_with<I, S>(
        init: &str,
        repetitions: RepetitionTable,
        lines: I,
    ) -> SessionResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut session = Self::from_init_str(init)?.with_repetitions(repetitions);
        for (n, line) in lines.into_iter().enumerate() {
            let text = line.as_ref();
            if text.trim().is_empty() {
                continue;
            }
            let mv = Move::decode(text).map_err(|err| SessionError::ReplayLine {
                line: n + 1,
                message: err.to_string(),
            })?;
            session
                .apply(mv, ReplayMode::Replay)
                .map_err(|err| SessionError::ReplayLine {
                    line: n + 1,
                    message: err.to_string(),
                })?;
        }
        Ok(session)
    }

    /// Replay the transcript from the init string and compare digests.
    pub fn verify_replay(&self) -> SessionResult<u64> {
        let fresh = RepetitionTable::with_limit(self.repetitions.limit());
        let replayed = Self::replay_with(&self.init.to_string(), fresh, self.transcript())?;
        let (live, again) = (self.digest(), replayed.digest());
        if live != again {
            error!(live, replayed = again, "replay diverged from live session");
            return Err(SessionError::ReplayDiverged {
                live,
                replayed: again,
            });
        }
        Ok(live)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::GameError;

    const WHITE: PlayerId = PlayerId::new(0);
    const BLACK: PlayerId = PlayerId::new(1);

    fn session() -> Session {
        Session::from_init_str("dipole 2 734687 1").unwrap()
    }

    fn play(s: &mut Session, text: &str) -> Move {
        s.apply(Move::decode(text).unwrap(), ReplayMode::Live).unwrap()
    }

    #[test]
    fn test_moves_are_numbered() {
        let mut s = session();
        play(&mut s, "start P0");
        let mv = play(&mut s, "move C 1 D 2 P0");
        assert_eq!(mv.index, Some(2));
        assert_eq!(s.transcript(), vec!["1 start P0", "2 move C 1 D 2 P0"]);
    }

    #[test]
    fn test_wrong_player_rejected_and_unlogged() {
        let mut s = session();
        play(&mut s, "start P0");
        let digest = s.digest();
        let err = s
            .apply(Move::decode("move D 8 C 7 P1").unwrap(), ReplayMode::Live)
            .unwrap_err();
        assert_eq!(
            err,
            SessionError::Game(GameError::WrongPlayer {
                expected: WHITE,
                actual: BLACK
            })
        );
        assert_eq!(s.log().len(), 1);
        assert_eq!(s.digest(), digest);
    }

    #[test]
    fn test_pick_then_drop_back_collapses() {
        let mut s = session();
        play(&mut s, "start P0");
        let digest = s.digest();
        play(&mut s, "pick C 1 P0");
        play(&mut s, "drop C 1 P0");
        assert_eq!(s.log().len(), 1);
        assert_eq!(s.digest(), digest);
        assert_eq!(s.phase(), Phase::Play);
    }

    #[test]
    fn test_puzzle_pick_drop_collapses() {
        let mut s = session();
        play(&mut s, "pick D 8 P0");
        play(&mut s, "drop D 8 P0");
        assert!(s.log().is_empty());
    }

    #[test]
    fn test_undo_restores_digest() {
        let mut s = session();
        play(&mut s, "start P0");
        let digest = s.digest();
        play(&mut s, "move C 1 D 2 P0");
        play(&mut s, "done P0");
        s.undo().unwrap();
        s.undo().unwrap();
        assert_eq!(s.digest(), digest);
        assert_eq!(s.log().len(), 1);
    }

    #[test]
    fn test_undo_empty_log() {
        let mut s = session();
        assert_eq!(s.undo(), Err(SessionError::EmptyLog));
    }

    #[test]
    fn test_declined_offers_draw_by_repetition() {
        let mut s = session();
        play(&mut s, "start P0");
        for _ in 0..2 {
            play(&mut s, "offerdraw P0");
            play(&mut s, "done P0");
            play(&mut s, "declinedraw P1");
            play(&mut s, "done P1");
        }
        assert_eq!(s.result(), Some(&GameResult::Draw));
        assert!(s.log().last().unwrap().drew);

        s.undo().unwrap();
        assert!(!s.is_over());
        assert_eq!(s.phase(), Phase::DeclinePending);
        assert_eq!(s.repetition_count(), 0);
    }

    #[test]
    fn test_replay_matches_live() {
        let mut s = session();
        play(&mut s, "start P0");
        play(&mut s, "move C 1 D 2 P0");
        play(&mut s, "done P0");
        let digest = s.verify_replay().unwrap();
        assert_eq!(digest, s.digest());

        let replayed = Session::replay("dipole 2 734687 1", s.transcript()).unwrap();
        assert_eq!(replayed.board(), s.board());
    }

    #[test]
    fn test_replay_reports_bad_line() {
        let err = Session::replay("dipole 2 734687 1", ["1 start P0", "", "2 fly C 1 P0"])
            .unwrap_err();
        assert!(matches!(err, SessionError::ReplayLine { line: 3, .. }));
    }

    #[test]
    fn test_robot_move_is_confirmed() {
        let mut s = session();
        play(&mut s, "start P0");
        let mv = s.board().robot_moves()[0].clone();
        s.apply_robot_move(mv).unwrap();
        assert_eq!(s.whose_turn(), BLACK);
        assert_eq!(s.log().len(), 3);
    }

    #[test]
    fn test_bad_init() {
        assert!(Session::from_init_str("dipole 3 1 1").is_err());
        assert!(Session::from_init_str("checkers 2 1 1").is_err());
    }
}
