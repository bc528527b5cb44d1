//! Chips, coordinates and cells.
//!
//! ## Cells
//!
//! A [`Cell`] is any place a chip can be: a board square, the shared waste
//! pile, or a player's rack. It owns its chip sequence outright (bottom chip
//! first); moving a chip always means popping it from one cell and pushing it
//! onto another, or parking it in the board's single held slot.
//!
//! ## Addressing
//!
//! [`CellRef`] names a cell independently of the board that holds it, which is
//! what moves carry. Board squares use 0-based [`Coord`]s internally and print
//! as `C 1` (column letter, 1-based row) on the wire.

use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::player::PlayerId;

/// A single playing piece.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum Chip {
    White = 0,
    Black = 1,
}

impl Chip {
    /// The chip colour played by `player`.
    #[must_use]
    pub const fn for_player(player: PlayerId) -> Self {
        if player.0 == 0 {
            Chip::White
        } else {
            Chip::Black
        }
    }

    #[must_use]
    pub const fn owner(self) -> PlayerId {
        PlayerId(self as u8)
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// A board square, 0-based in both axes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    pub col: u8,
    pub row: u8,
}

impl Coord {
    #[must_use]
    pub const fn new(col: u8, row: u8) -> Self {
        Self { col, row }
    }

    /// Build from the wire spelling: column letter and 1-based row.
    ///
    /// ```
    /// use rust_dipole::core::Coord;
    ///
    /// assert_eq!(Coord::from_letter('C', 1), Some(Coord::new(2, 0)));
    /// assert_eq!(Coord::from_letter('c', 0), None);
    /// ```
    #[must_use]
    pub fn from_letter(col: char, row: u32) -> Option<Self> {
        let col = col.to_ascii_uppercase();
        if !col.is_ascii_uppercase() || row == 0 || row > 26 {
            return None;
        }
        Some(Self::new(col as u8 - b'A', (row - 1) as u8))
    }

    /// Column letter for the wire format.
    #[must_use]
    pub fn letter(self) -> char {
        (b'A' + self.col) as char
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.letter(), self.row + 1)
    }
}

/// Address of any cell a move can name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellRef {
    Board(Coord),
    Waste,
    Rack(PlayerId),
}

impl CellRef {
    #[must_use]
    pub const fn board(col: u8, row: u8) -> Self {
        CellRef::Board(Coord::new(col, row))
    }

    #[must_use]
    pub fn coord(self) -> Option<Coord> {
        match self {
            CellRef::Board(c) => Some(c),
            _ => None,
        }
    }

    #[must_use]
    pub fn kind(self) -> CellKind {
        match self {
            CellRef::Board(_) => CellKind::Board,
            CellRef::Waste => CellKind::Waste,
            CellRef::Rack(_) => CellKind::Rack,
        }
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellRef::Board(c) => write!(f, "{c}"),
            CellRef::Waste => f.write_str("waste"),
            CellRef::Rack(p) => write!(f, "rack {}", p.0),
        }
    }
}

/// Category tag of a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellKind {
    Board,
    Waste,
    Rack,
}

/// Board square colouring. Only dark squares hold chips.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Terrain {
    Dark,
    Light,
    /// Off-board holding areas.
    Reserve,
}

/// Inline capacity covers every stack that occurs in normal play.
pub type ChipStack = SmallVec<[Chip; 8]>;

/// A location holding an ordered stack of chips.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    loc: CellRef,
    terrain: Terrain,
    chips: ChipStack,
    /// Move number at which a chip was last lifted from here.
    pub last_picked: Option<u32>,
    /// Move number at which a chip was last put here.
    pub last_dropped: Option<u32>,
}

impl Cell {
    #[must_use]
    pub fn new(loc: CellRef, terrain: Terrain) -> Self {
        Self {
            loc,
            terrain,
            chips: SmallVec::new(),
            last_picked: None,
            last_dropped: None,
        }
    }

    #[must_use]
    pub fn loc(&self) -> CellRef {
        self.loc
    }

    #[must_use]
    pub fn terrain(&self) -> Terrain {
        self.terrain
    }

    #[must_use]
    pub fn kind(&self) -> CellKind {
        self.loc.kind()
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.chips.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chips.is_empty()
    }

    #[must_use]
    pub fn top(&self) -> Option<Chip> {
        self.chips.last().copied()
    }

    /// Owner of the top chip, if any.
    #[must_use]
    pub fn owner(&self) -> Option<PlayerId> {
        self.top().map(Chip::owner)
    }

    #[must_use]
    pub fn chips(&self) -> &[Chip] {
        &self.chips
    }

    pub fn push(&mut self, chip: Chip) {
        self.chips.push(chip);
    }

    pub fn pop(&mut self) -> Option<Chip> {
        self.chips.pop()
    }

    /// Count chips of one colour.
    #[must_use]
    pub fn count_of(&self, chip: Chip) -> usize {
        self.chips.iter().filter(|&&c| c == chip).count()
    }

    /// Remove everything, returning the removed stack.
    pub fn take_all(&mut self) -> ChipStack {
        std::mem::take(&mut self.chips)
    }

    /// Shorten to `len` chips, dropping the rest from the top.
    pub fn truncate(&mut self, len: usize) {
        self.chips.truncate(len);
    }

    /// Replace contents and bookkeeping from a saved copy of the same cell.
    pub fn restore(&mut self, saved: &Cell) {
        debug_assert_eq!(self.loc, saved.loc);
        self.chips.clone_from(&saved.chips);
        self.last_picked = saved.last_picked;
        self.last_dropped = saved.last_dropped;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chip_owner_roundtrip() {
        for p in PlayerId::all(2) {
            assert_eq!(Chip::for_player(p).owner(), p);
        }
        assert_eq!(Chip::Black.index(), 1);
    }

    #[test]
    fn test_coord_display() {
        assert_eq!(Coord::new(2, 0).to_string(), "C 1");
        assert_eq!(Coord::new(5, 9).to_string(), "F 10");
        assert_eq!(Coord::from_letter('f', 10), Some(Coord::new(5, 9)));
        assert_eq!(Coord::from_letter('1', 1), None);
    }

    #[test]
    fn test_cellref_display() {
        assert_eq!(CellRef::board(3, 7).to_string(), "D 8");
        assert_eq!(CellRef::Waste.to_string(), "waste");
        assert_eq!(CellRef::Rack(PlayerId::new(1)).to_string(), "rack 1");
        assert_eq!(CellRef::Rack(PlayerId::new(1)).kind(), CellKind::Rack);
    }

    #[test]
    fn test_cell_stack_ops() {
        let mut cell = Cell::new(CellRef::board(0, 0), Terrain::Dark);
        assert!(cell.is_empty());
        assert_eq!(cell.owner(), None);

        cell.push(Chip::White);
        cell.push(Chip::White);
        cell.push(Chip::Black);
        assert_eq!(cell.height(), 3);
        assert_eq!(cell.owner(), Some(PlayerId::new(1)));
        assert_eq!(cell.count_of(Chip::White), 2);

        cell.truncate(1);
        assert_eq!(cell.chips(), &[Chip::White]);

        let taken = cell.take_all();
        assert_eq!(taken.len(), 1);
        assert!(cell.is_empty());
    }

    #[test]
    fn test_cell_restore() {
        let mut cell = Cell::new(CellRef::Waste, Terrain::Reserve);
        cell.push(Chip::Black);
        cell.last_dropped = Some(4);
        let saved = cell.clone();

        cell.push(Chip::White);
        cell.last_dropped = Some(9);
        cell.restore(&saved);

        assert_eq!(cell, saved);
    }
}
