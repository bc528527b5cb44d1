//! Error types for the engine.
//!
//! Every fatal condition is an error variant propagated with `?`. Nothing
//! here is used for ordinary control flow: the board never relies on a
//! rejected move to discover what is legal.
//!
//! - [`GameError`]: a move reached `execute`/`unexecute` that the board cannot
//!   accept. The board is left untouched when one of these is returned.
//! - [`ParseError`]: malformed wire text or session init string.
//! - [`SessionError`]: failures of the authoritative session (replay, log).
//! - [`SearchError`]: failures surfaced by robot searches.

use thiserror::Error;

use super::moves::MoveOp;
use super::player::PlayerId;

/// Fatal board-level errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    /// The operation is not in the current phase's accepted set.
    #[error("operation '{op}' is not accepted in phase {phase}")]
    IllegalForPhase { op: MoveOp, phase: &'static str },

    /// The operation is accepted by the phase but not on this target.
    #[error("illegal '{op}' at {target}: {reason}")]
    IllegalTarget {
        op: MoveOp,
        target: String,
        reason: &'static str,
    },

    /// Only drops are accepted while a chip is held.
    #[error("operation '{op}' while a chip is held")]
    ChipHeld { op: MoveOp },

    /// A move was submitted for a player who is not to move.
    #[error("move by {actual} but {expected} is to move")]
    WrongPlayer { expected: PlayerId, actual: PlayerId },

    /// The game has already ended.
    #[error("the game is already over")]
    GameOver,

    /// Unexecute with an empty undo stack.
    #[error("nothing to unexecute")]
    UndoUnderflow,

    /// Unexecute of a move other than the last one executed.
    #[error("unexecute of '{requested}' but last executed was '{recorded}'")]
    UndoMismatch { requested: String, recorded: String },
}

/// Result alias for board operations.
pub type MoveResult<T> = Result<T, GameError>;

/// Errors decoding the wire format or the session init string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Nothing but whitespace.
    #[error("empty input")]
    Empty,

    /// Operation name not in the closed verb set.
    #[error("unknown operation '{0}'")]
    UnknownOp(String),

    /// A required token is absent.
    #[error("missing {what} in '{text}'")]
    Missing { what: &'static str, text: String },

    /// A token is present but malformed.
    #[error("bad {what} '{token}'")]
    BadToken { what: &'static str, token: String },

    /// Tokens left over after a complete move.
    #[error("unexpected trailing '{token}' in '{text}'")]
    Trailing { token: String, text: String },

    /// Variant name not known to the game.
    #[error("unknown variant '{0}'")]
    UnknownVariant(String),

    /// Player count the variant cannot seat.
    #[error("variant {variant} needs {expected} players, got {found}")]
    PlayerCount {
        variant: String,
        expected: usize,
        found: usize,
    },

    /// Rules revision newer than this build understands.
    #[error("unsupported rules revision {found} (newest is {newest})")]
    Revision { found: u32, newest: u32 },
}

/// Result alias for decoding.
pub type ParseResult<T> = Result<T, ParseError>;

/// Errors from the authoritative session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Game(#[from] GameError),

    /// A replay log line failed to decode or apply.
    #[error("replay line {line}: {message}")]
    ReplayLine { line: usize, message: String },

    /// The replayed board does not reproduce the live digest.
    #[error("replay digest {replayed:#018x} differs from live digest {live:#018x}")]
    ReplayDiverged { live: u64, replayed: u64 },

    /// Undo requested with an empty log.
    #[error("move log is empty")]
    EmptyLog,

    #[error(transparent)]
    Search(#[from] SearchError),
}

/// Result alias for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors surfaced by a robot search.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    #[error(transparent)]
    Game(#[from] GameError),

    /// Executing then unexecuting a move did not restore the digest.
    #[error("digest mismatch unwinding '{mv}': {before:#018x} became {after:#018x}")]
    DigestMismatch { mv: String, before: u64, after: u64 },

    /// A search worker thread panicked.
    #[error("search worker panicked")]
    WorkerPanicked,

    /// `prepare_to_move` while a search is still running.
    #[error("robot is already searching")]
    Busy,

    /// The worker hung up without sending a result.
    #[error("search worker disconnected")]
    Disconnected,
}

/// Result alias for searches.
pub type SearchResult<T> = Result<T, SearchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_error_messages() {
        let err = GameError::IllegalForPhase {
            op: MoveOp::Done,
            phase: "Play",
        };
        assert_eq!(err.to_string(), "operation 'done' is not accepted in phase Play");

        let err = GameError::WrongPlayer {
            expected: PlayerId::new(0),
            actual: PlayerId::new(1),
        };
        assert_eq!(err.to_string(), "move by P1 but P0 is to move");
    }

    #[test]
    fn test_session_error_from_game_error() {
        let err: SessionError = GameError::UndoUnderflow.into();
        assert!(matches!(err, SessionError::Game(GameError::UndoUnderflow)));
        assert_eq!(err.to_string(), "nothing to unexecute");
    }

    #[test]
    fn test_digest_mismatch_formats_hex() {
        let err = SearchError::DigestMismatch {
            mv: "move C 1 D 2 P0".into(),
            before: 0xff,
            after: 0x100,
        };
        let text = err.to_string();
        assert!(text.contains("0x00000000000000ff"));
        assert!(text.contains("0x0000000000000100"));
    }
}
