//! Move values and their wire encoding.
//!
//! ## Wire Format
//!
//! One move per line, whitespace separated:
//!
//! ```text
//! [<seq>] <op> [<args>...] P<player>
//! ```
//!
//! | Op | Args | Example |
//! |----|------|---------|
//! | `pick`, `drop` | cell | `pick C 1 P0`, `drop waste P0`, `pick rack 1 P1` |
//! | `move` | from cell, to cell | `12 move C 1 D 2 P0` |
//! | `off` | from cell, chip count | `off C 7 3 P0` |
//! | everything else | none | `done P1` |
//!
//! [`Move::encode`] and [`Move::decode`] are exact inverses on canonical text.
//!
//! ## Equality
//!
//! `PartialEq` compares moves "as specified": operation, cells, count and
//! player. The sequence number and the capture count filled in by `execute`
//! are ignored, so a logged move equals a freshly constructed one.

use std::fmt;
use std::str::SplitWhitespace;

use serde::{Deserialize, Serialize};

use super::cell::{CellRef, Coord};
use super::error::{ParseError, ParseResult};
use super::player::PlayerId;

/// The closed set of move verbs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveOp {
    /// Leave setup and begin play with the named player.
    Start,
    /// Return to setup.
    Edit,
    /// Lift a chip into the held slot.
    Pick,
    /// Put the held chip down.
    Drop,
    /// Whole-stack board move (robot form of pick + drop).
    Move,
    /// Bear chips off the board.
    Off,
    Pass,
    Done,
    Resign,
    OfferDraw,
    AcceptDraw,
    DeclineDraw,
}

impl MoveOp {
    pub const ALL: [MoveOp; 12] = [
        MoveOp::Start,
        MoveOp::Edit,
        MoveOp::Pick,
        MoveOp::Drop,
        MoveOp::Move,
        MoveOp::Off,
        MoveOp::Pass,
        MoveOp::Done,
        MoveOp::Resign,
        MoveOp::OfferDraw,
        MoveOp::AcceptDraw,
        MoveOp::DeclineDraw,
    ];

    /// Canonical wire name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            MoveOp::Start => "start",
            MoveOp::Edit => "edit",
            MoveOp::Pick => "pick",
            MoveOp::Drop => "drop",
            MoveOp::Move => "move",
            MoveOp::Off => "off",
            MoveOp::Pass => "pass",
            MoveOp::Done => "done",
            MoveOp::Resign => "resign",
            MoveOp::OfferDraw => "offerdraw",
            MoveOp::AcceptDraw => "acceptdraw",
            MoveOp::DeclineDraw => "declinedraw",
        }
    }

    /// Look up a wire name, ignoring case.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|op| op.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for MoveOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How `execute` should treat presentation side effects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ReplayMode {
    /// Interactive input: record animation hints.
    #[default]
    Live,
    /// Silent replay and robot search: no hints.
    Replay,
    /// Single-step review: record hints.
    Single,
}

impl ReplayMode {
    #[must_use]
    pub const fn animates(self) -> bool {
        !matches!(self, ReplayMode::Replay)
    }
}

/// One game action.
#[derive(Clone, Debug, Eq, Serialize, Deserialize)]
pub struct Move {
    /// Position in the session log, when logged.
    pub index: Option<u32>,
    pub op: MoveOp,
    pub from: Option<CellRef>,
    pub to: Option<CellRef>,
    /// Chip count for `off`; zero otherwise.
    pub count: u8,
    pub player: PlayerId,
    /// Chips captured, filled in by `execute`.
    pub captures: Option<u8>,
}

impl Move {
    /// A move with no cell arguments (`done`, `pass`, `resign`, ...).
    #[must_use]
    pub fn simple(op: MoveOp, player: PlayerId) -> Self {
        Self {
            index: None,
            op,
            from: None,
            to: None,
            count: 0,
            player,
            captures: None,
        }
    }

    #[must_use]
    pub fn pick(cell: CellRef, player: PlayerId) -> Self {
        Self {
            from: Some(cell),
            ..Self::simple(MoveOp::Pick, player)
        }
    }

    #[must_use]
    pub fn drop(cell: CellRef, player: PlayerId) -> Self {
        Self {
            to: Some(cell),
            ..Self::simple(MoveOp::Drop, player)
        }
    }

    /// Whole-stack board move from `from` to `to`.
    #[must_use]
    pub fn board(from: Coord, to: Coord, player: PlayerId) -> Self {
        Self {
            from: Some(CellRef::Board(from)),
            to: Some(CellRef::Board(to)),
            ..Self::simple(MoveOp::Move, player)
        }
    }

    /// Bear `count` chips off the board from `from`.
    #[must_use]
    pub fn off(from: Coord, count: u8, player: PlayerId) -> Self {
        Self {
            from: Some(CellRef::Board(from)),
            to: Some(CellRef::Waste),
            count,
            ..Self::simple(MoveOp::Off, player)
        }
    }

    #[must_use]
    pub fn with_index(mut self, index: u32) -> Self {
        self.index = Some(index);
        self
    }

    /// The cell a pick or drop names.
    #[must_use]
    pub fn target(&self) -> Option<CellRef> {
        match self.op {
            MoveOp::Drop => self.to,
            _ => self.from.or(self.to),
        }
    }

    /// Encode to canonical wire text.
    #[must_use]
    pub fn encode(&self) -> String {
        self.to_string()
    }

    /// Decode one line of wire text.
    ///
    /// ```
    /// use rust_dipole::core::{Move, MoveOp};
    ///
    /// let m = Move::decode("12 move C 1 D 2 P0").unwrap();
    /// assert_eq!(m.op, MoveOp::Move);
    /// assert_eq!(m.index, Some(12));
    /// assert_eq!(m.encode(), "12 move C 1 D 2 P0");
    /// ```
    pub fn decode(text: &str) -> ParseResult<Self> {
        let mut tokens = Tokens::new(text);

        let first = tokens.next().ok_or(ParseError::Empty)?;
        let (index, op_token) = match first.parse::<u32>() {
            Ok(seq) => (Some(seq), tokens.require("operation")?),
            Err(_) => (None, first),
        };
        let op = MoveOp::from_name(op_token)
            .ok_or_else(|| ParseError::UnknownOp(op_token.to_string()))?;

        let (mut from, mut to, mut count) = (None, None, 0);
        match op {
            MoveOp::Pick => from = Some(tokens.cell()?),
            MoveOp::Drop => to = Some(tokens.cell()?),
            MoveOp::Move => {
                from = Some(CellRef::Board(tokens.coord()?));
                to = Some(CellRef::Board(tokens.coord()?));
            }
            MoveOp::Off => {
                from = Some(CellRef::Board(tokens.coord()?));
                to = Some(CellRef::Waste);
                count = tokens.number("chip count")?;
            }
            _ => {}
        }

        let player_token = tokens.require("player")?;
        let player = PlayerId::from_token(player_token).ok_or_else(|| ParseError::BadToken {
            what: "player",
            token: player_token.to_string(),
        })?;
        tokens.finish()?;

        Ok(Self {
            index,
            op,
            from,
            to,
            count,
            player,
            captures: None,
        })
    }
}

impl PartialEq for Move {
    fn eq(&self, other: &Self) -> bool {
        self.op == other.op
            && self.from == other.from
            && self.to == other.to
            && self.count == other.count
            && self.player == other.player
    }
}

impl std::hash::Hash for Move {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.op.hash(state);
        self.from.hash(state);
        self.to.hash(state);
        self.count.hash(state);
        self.player.hash(state);
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(index) = self.index {
            write!(f, "{index} ")?;
        }
        f.write_str(self.op.name())?;
        match self.op {
            MoveOp::Pick | MoveOp::Drop => {
                if let Some(cell) = self.target() {
                    write!(f, " {cell}")?;
                }
            }
            MoveOp::Move => {
                if let (Some(from), Some(to)) = (self.from, self.to) {
                    write!(f, " {from} {to}")?;
                }
            }
            MoveOp::Off => {
                if let Some(from) = self.from {
                    write!(f, " {from} {}", self.count)?;
                }
            }
            _ => {}
        }
        write!(f, " {}", self.player)
    }
}

impl std::str::FromStr for Move {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

/// Cursor over the tokens of one line, keeping the line for error text.
struct Tokens<'a> {
    text: &'a str,
    iter: SplitWhitespace<'a>,
}

impl<'a> Tokens<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            iter: text.split_whitespace(),
        }
    }

    fn next(&mut self) -> Option<&'a str> {
        self.iter.next()
    }

    fn require(&mut self, what: &'static str) -> ParseResult<&'a str> {
        self.iter.next().ok_or_else(|| ParseError::Missing {
            what,
            text: self.text.to_string(),
        })
    }

    fn number<T: std::str::FromStr>(&mut self, what: &'static str) -> ParseResult<T> {
        let token = self.require(what)?;
        token.parse().map_err(|_| ParseError::BadToken {
            what,
            token: token.to_string(),
        })
    }

    fn coord(&mut self) -> ParseResult<Coord> {
        let col = self.require("column")?;
        self.coord_after(col)
    }

    fn coord_after(&mut self, col: &str) -> ParseResult<Coord> {
        let mut chars = col.chars();
        let letter = match (chars.next(), chars.next()) {
            (Some(c), None) => c,
            _ => {
                return Err(ParseError::BadToken {
                    what: "column",
                    token: col.to_string(),
                })
            }
        };
        let row_token = self.require("row")?;
        let row: u32 = row_token.parse().map_err(|_| ParseError::BadToken {
            what: "row",
            token: row_token.to_string(),
        })?;
        Coord::from_letter(letter, row).ok_or_else(|| ParseError::BadToken {
            what: "square",
            token: format!("{col} {row_token}"),
        })
    }

    fn cell(&mut self) -> ParseResult<CellRef> {
        let head = self.require("cell")?;
        if head.eq_ignore_ascii_case("waste") {
            return Ok(CellRef::Waste);
        }
        if head.eq_ignore_ascii_case("rack") {
            let owner: u8 = self.number("rack owner")?;
            return Ok(CellRef::Rack(PlayerId::new(owner)));
        }
        self.coord_after(head).map(CellRef::Board)
    }

    fn finish(&mut self) -> ParseResult<()> {
        match self.iter.next() {
            None => Ok(()),
            Some(token) => Err(ParseError::Trailing {
                token: token.to_string(),
                text: self.text.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(n: u8) -> PlayerId {
        PlayerId::new(n)
    }

    #[test]
    fn test_op_names_are_unique() {
        for op in MoveOp::ALL {
            assert_eq!(MoveOp::from_name(op.name()), Some(op));
        }
        assert_eq!(MoveOp::from_name("OFFERDRAW"), Some(MoveOp::OfferDraw));
        assert_eq!(MoveOp::from_name("castle"), None);
    }

    #[test]
    fn test_encode_shapes() {
        assert_eq!(Move::simple(MoveOp::Done, p(1)).encode(), "done P1");
        assert_eq!(Move::pick(CellRef::board(2, 0), p(0)).encode(), "pick C 1 P0");
        assert_eq!(Move::drop(CellRef::Waste, p(0)).encode(), "drop waste P0");
        assert_eq!(Move::pick(CellRef::Rack(p(1)), p(0)).encode(), "pick rack 1 P0");
        assert_eq!(
            Move::board(Coord::new(2, 0), Coord::new(3, 1), p(0)).with_index(12).encode(),
            "12 move C 1 D 2 P0"
        );
        assert_eq!(Move::off(Coord::new(2, 6), 3, p(0)).encode(), "off C 7 3 P0");
    }

    #[test]
    fn test_decode_canonical_lines() {
        for line in [
            "start P0",
            "3 pick C 1 P0",
            "4 drop D 2 P0",
            "drop rack 1 P1",
            "pick waste P0",
            "7 move J 10 H 8 P1",
            "off B 8 2 P0",
            "offerdraw P1",
            "declinedraw P0",
        ] {
            let m = Move::decode(line).unwrap();
            assert_eq!(m.encode(), line);
        }
    }

    #[test]
    fn test_decode_is_lenient_on_case_and_space() {
        let m = Move::decode("  5   MOVE c 1   d 2  p0 ").unwrap();
        assert_eq!(m.encode(), "5 move C 1 D 2 P0");
    }

    #[test]
    fn test_decode_errors() {
        assert_eq!(Move::decode("   "), Err(ParseError::Empty));
        assert!(matches!(Move::decode("jump P0"), Err(ParseError::UnknownOp(_))));
        assert!(matches!(Move::decode("move C 1 P0"), Err(ParseError::BadToken { .. })));
        assert!(matches!(Move::decode("done"), Err(ParseError::Missing { what: "player", .. })));
        assert!(matches!(Move::decode("done P0 extra"), Err(ParseError::Trailing { .. })));
        assert!(matches!(Move::decode("pick CC 1 P0"), Err(ParseError::BadToken { what: "column", .. })));
        assert!(matches!(Move::decode("off C 1 x P0"), Err(ParseError::BadToken { what: "chip count", .. })));
    }

    #[test]
    fn test_equality_ignores_side_effects() {
        let mut executed = Move::board(Coord::new(2, 0), Coord::new(3, 1), p(0)).with_index(40);
        executed.captures = Some(2);
        let fresh = Move::board(Coord::new(2, 0), Coord::new(3, 1), p(0));
        assert_eq!(executed, fresh);

        let other_player = Move::board(Coord::new(2, 0), Coord::new(3, 1), p(1));
        assert_ne!(fresh, other_player);
    }

    #[test]
    fn test_serde_roundtrip() {
        let m = Move::off(Coord::new(1, 7), 2, p(0)).with_index(3);
        let json = serde_json::to_string(&m).unwrap();
        let back: Move = serde_json::from_str(&json).unwrap();
        assert_eq!(back, m);
        assert_eq!(back.index, Some(3));
    }
}
