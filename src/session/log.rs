//! The session move log.

use serde::{Deserialize, Serialize};

use crate::core::Move;

/// One applied move and the bookkeeping needed to take it back.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// The move as executed, sequence number and side effects filled in.
    pub mv: Move,

    /// Digest recorded in the repetition table after this move, if it
    /// ended a turn.
    pub recorded: Option<u64>,

    /// This move's position repeated often enough to draw the game.
    pub drew: bool,
}

impl LogEntry {
    #[must_use]
    pub fn new(mv: Move) -> Self {
        Self {
            mv,
            recorded: None,
            drew: false,
        }
    }

    /// Sequence number of the move.
    #[must_use]
    pub fn seq(&self) -> u32 {
        self.mv.index.unwrap_or(0)
    }

    /// Wire text of the move.
    #[must_use]
    pub fn line(&self) -> String {
        self.mv.encode()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{MoveOp, PlayerId};

    #[test]
    fn test_line_carries_sequence() {
        let entry = LogEntry::new(Move::simple(MoveOp::Done, PlayerId::new(1)).with_index(7));
        assert_eq!(entry.seq(), 7);
        assert_eq!(entry.line(), "7 done P1");
        assert!(!entry.drew);
    }
}
