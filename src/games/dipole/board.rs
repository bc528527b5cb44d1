//! The Dipole board state.
//!
//! ## Layout
//!
//! - `cells`: every square of the grid, row-major. Light squares exist but
//!   never hold chips.
//! - `waste`: shared pile of captured and borne-off chips.
//! - `racks`: one per player, an unlimited chip supply used while editing.
//!   Rack cells never hold chips themselves.
//! - `turn`: every scalar the state machine reads (phase, turn, held chip,
//!   pending move, outcome, registers). Undo restores it wholesale.
//!
//! ## Equality
//!
//! `PartialEq` compares game content and bookkeeping, not the undo stack or
//! animation hints, so a board after an execute/unexecute pair equals the
//! board before it.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::{
    Cell, CellRef, Chip, Coord, ParseError, ParseResult, PlayerId, PlayerMap, SessionInit,
    Terrain,
};
use crate::digest::{DigestKeys, DigestLayout, DigestRole, Digester};
use crate::rules::GameResult;

use super::execute::UndoRecord;
use super::grid::Grid;
use super::phase::Phase;
use super::variant::{Variant, DIPOLE_PLAYERS, NEWEST_REVISION};

/// Per-player counters kept in step with the cells by execute/unexecute.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Registers {
    pub chips_on_board: u32,
    /// Sum over the player's board chips of rows advanced from home.
    pub advancement: u32,
    /// Enemy chips this player has captured.
    pub captured: u32,
    /// Own chips this player has moved off the board.
    pub borne_off: u32,
}

impl Registers {
    pub const COUNT: usize = 4;

    #[must_use]
    pub const fn values(&self) -> [u32; Self::COUNT] {
        [
            self.chips_on_board,
            self.advancement,
            self.captured,
            self.borne_off,
        ]
    }
}

/// Scalar state restored wholesale by undo.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct TurnState {
    pub phase: Phase,
    /// Phase to return to when a resign or draw offer is taken back.
    pub resume_phase: Option<Phase>,
    pub whose_turn: PlayerId,
    pub move_number: u32,
    pub held: Option<Chip>,
    pub held_from: Option<CellRef>,
    /// Destination of the move awaiting `done`.
    pub dropped_on: Option<CellRef>,
    pub outcome: Option<GameResult>,
    pub registers: PlayerMap<Registers>,
}

/// Cell pairs to animate after the last execute: (from, to).
pub type AnimationHints = SmallVec<[(CellRef, CellRef); 4]>;

/// Dipole board state machine.
#[derive(Clone, Debug)]
pub struct DipoleBoard {
    pub(crate) variant: Variant,
    pub(crate) grid: Grid,
    pub(crate) revision: u32,
    pub(crate) seed: u64,
    pub(crate) keys: Arc<DigestKeys>,
    pub(crate) cells: Vec<Cell>,
    pub(crate) waste: Cell,
    pub(crate) racks: PlayerMap<Cell>,
    pub(crate) turn: TurnState,
    pub(crate) undo: Vec<UndoRecord>,
    pub(crate) animation: AnimationHints,
}

impl DipoleBoard {
    /// Build the initial board for a session. Play begins after `start`.
    pub fn new(init: &SessionInit) -> ParseResult<Self> {
        let variant = Variant::from_name(&init.variant)?;
        if init.player_count != DIPOLE_PLAYERS {
            return Err(ParseError::PlayerCount {
                variant: variant.name().to_string(),
                expected: DIPOLE_PLAYERS,
                found: init.player_count,
            });
        }
        if init.revision > NEWEST_REVISION {
            return Err(ParseError::Revision {
                found: init.revision,
                newest: NEWEST_REVISION,
            });
        }

        let grid = variant.grid();
        let chips = variant.chips_per_side();
        let keys = Arc::new(DigestKeys::new(DigestLayout {
            cells: grid.cell_count(),
            slots: Self::max_stack_for(variant),
            colours: 2,
            players: DIPOLE_PLAYERS,
            registers: Registers::COUNT,
            phases: Phase::ALL.len(),
        }));

        let cells = (0..grid.cell_count())
            .map(|i| {
                let coord = grid.coord(i);
                let terrain = if grid.is_dark(coord) {
                    Terrain::Dark
                } else {
                    Terrain::Light
                };
                Cell::new(CellRef::Board(coord), terrain)
            })
            .collect();

        let mut board = Self {
            variant,
            grid,
            revision: init.revision,
            seed: init.seed,
            keys,
            cells,
            waste: Cell::new(CellRef::Waste, Terrain::Reserve),
            racks: PlayerMap::new(DIPOLE_PLAYERS, |p| Cell::new(CellRef::Rack(p), Terrain::Reserve)),
            turn: TurnState {
                phase: Phase::Puzzle,
                resume_phase: None,
                whose_turn: PlayerId::new(0),
                move_number: 1,
                held: None,
                held_from: None,
                dropped_on: None,
                outcome: None,
                registers: PlayerMap::with_default(DIPOLE_PLAYERS),
            },
            undo: Vec::new(),
            animation: SmallVec::new(),
        };

        let (white_home, black_home) = variant.homes(init.seed);
        for (player, home) in [(PlayerId::new(0), white_home), (PlayerId::new(1), black_home)] {
            board.add_chips(home, Chip::for_player(player), chips);
        }
        Ok(board)
    }

    /// Build from the session init string.
    pub fn from_init_str(init: &str) -> ParseResult<Self> {
        Self::new(&SessionInit::parse(init)?)
    }

    /// Tallest stack a puzzle drop may build, and the height with drawn
    /// digest keys. Merges in play can go higher; those slots derive their keys.
    fn max_stack_for(variant: Variant) -> usize {
        variant.chips_per_side() * 2
    }

    /// A value copy with no undo history, for searches.
    #[must_use]
    pub fn sandbox(&self) -> Self {
        let mut copy = self.clone();
        copy.undo = Vec::new();
        copy.animation.clear();
        copy
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[must_use]
    pub fn variant(&self) -> Variant {
        self.variant
    }

    #[must_use]
    pub fn grid(&self) -> Grid {
        self.grid
    }

    #[must_use]
    pub fn revision(&self) -> u32 {
        self.revision
    }

    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// The init string that rebuilds this board's starting position.
    #[must_use]
    pub fn init(&self) -> SessionInit {
        SessionInit::new(self.variant.name())
            .with_players(DIPOLE_PLAYERS)
            .with_seed(self.seed)
            .with_revision(self.revision)
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.turn.phase
    }

    #[must_use]
    pub fn whose_turn(&self) -> PlayerId {
        self.turn.whose_turn
    }

    #[must_use]
    pub fn move_number(&self) -> u32 {
        self.turn.move_number
    }

    #[must_use]
    pub fn held(&self) -> Option<Chip> {
        self.turn.held
    }

    /// Where the held chip or the pending move started.
    #[must_use]
    pub fn pending_source(&self) -> Option<CellRef> {
        self.turn.held_from
    }

    /// Destination of the move awaiting confirmation.
    #[must_use]
    pub fn pending_dest(&self) -> Option<CellRef> {
        self.turn.dropped_on
    }

    #[must_use]
    pub fn outcome(&self) -> Option<&GameResult> {
        self.turn.outcome.as_ref()
    }

    #[must_use]
    pub fn registers(&self, player: PlayerId) -> Registers {
        self.turn.registers[player]
    }

    /// Human-readable prompt for the current phase.
    #[must_use]
    pub fn phase_description(&self) -> String {
        match &self.turn.outcome {
            Some(result) => format!("{}: {result}", self.turn.phase.description()),
            None => format!("{} ({} to move)", self.turn.phase.description(), self.turn.whose_turn),
        }
    }

    /// Depth of the undo stack.
    #[must_use]
    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    #[must_use]
    pub fn animation(&self) -> &[(CellRef, CellRef)] {
        &self.animation
    }

    #[must_use]
    pub fn cell(&self, coord: Coord) -> &Cell {
        &self.cells[self.grid.index(coord)]
    }

    #[must_use]
    pub fn waste(&self) -> &Cell {
        &self.waste
    }

    /// Any addressable cell.
    #[must_use]
    pub fn cell_at(&self, loc: CellRef) -> Option<&Cell> {
        match loc {
            CellRef::Board(c) if self.grid.contains(c) => Some(self.cell(c)),
            CellRef::Board(_) => None,
            CellRef::Waste => Some(&self.waste),
            CellRef::Rack(p) if p.index() < DIPOLE_PLAYERS => Some(&self.racks[p]),
            CellRef::Rack(_) => None,
        }
    }

    /// Squares holding at least one chip.
    #[must_use]
    pub fn occupied_cells(&self) -> usize {
        self.cells.iter().filter(|c| !c.is_empty()).count()
    }

    /// Stacks whose top chip belongs to `player`.
    pub fn stacks_of(&self, player: PlayerId) -> impl Iterator<Item = &Cell> + '_ {
        self.cells
            .iter()
            .filter(move |c| c.owner() == Some(player))
    }

    #[must_use]
    pub fn max_stack(&self) -> usize {
        Self::max_stack_for(self.variant)
    }

    #[must_use]
    pub fn opponent(&self, player: PlayerId) -> PlayerId {
        player.next(DIPOLE_PLAYERS)
    }

    // =========================================================================
    // Chip bookkeeping
    // =========================================================================

    pub(crate) fn cell_mut(&mut self, coord: Coord) -> &mut Cell {
        let index = self.grid.index(coord);
        &mut self.cells[index]
    }

    /// Push `n` chips onto a square, keeping registers in step.
    pub(crate) fn add_chips(&mut self, coord: Coord, chip: Chip, n: usize) {
        let advance = self.grid.advancement(coord, chip.owner());
        let cell = self.cell_mut(coord);
        for _ in 0..n {
            cell.push(chip);
        }
        let regs = &mut self.turn.registers[chip.owner()];
        regs.chips_on_board += n as u32;
        regs.advancement += advance * n as u32;
    }

    /// Pop `n` chips off a square, keeping registers in step.
    pub(crate) fn remove_chips(&mut self, coord: Coord, n: usize) -> SmallVec<[Chip; 8]> {
        let grid = self.grid;
        let cell = self.cell_mut(coord);
        let mut removed: SmallVec<[Chip; 8]> = SmallVec::new();
        for _ in 0..n {
            if let Some(chip) = cell.pop() {
                removed.push(chip);
            }
        }
        for &chip in &removed {
            let regs = &mut self.turn.registers[chip.owner()];
            regs.chips_on_board -= 1;
            regs.advancement -= grid.advancement(coord, chip.owner());
        }
        removed
    }

    /// Dense index of an addressable cell for digesting.
    fn address(&self, loc: CellRef) -> usize {
        let cells = self.grid.cell_count();
        match loc {
            CellRef::Board(c) => self.grid.index(c),
            CellRef::Waste => cells,
            CellRef::Rack(p) => cells + 1 + p.index(),
        }
    }

    // =========================================================================
    // Digest
    // =========================================================================

    /// 64-bit digest of every game-affecting field.
    ///
    /// The move counter, last-touched markers and animation hints are
    /// deliberately absent.
    #[must_use]
    pub fn digest(&self) -> u64 {
        let keys = &*self.keys;
        let mut d = Digester::new(keys);

        for (index, cell) in self.cells.iter().enumerate() {
            for (slot, chip) in cell.chips().iter().enumerate() {
                d.toggle_key(keys.board_chip(index, slot, chip.index()));
            }
        }
        for chip in [Chip::White, Chip::Black] {
            d.mix(DigestRole::Waste, chip.index(), self.waste.count_of(chip) as u64);
        }

        let turn = &self.turn;
        if let Some(chip) = turn.held {
            d.toggle(DigestRole::Held, chip.index());
        }
        if let Some(src) = turn.held_from {
            d.toggle(DigestRole::PendingSource, self.address(src));
        }
        if let Some(dst) = turn.dropped_on {
            d.toggle(DigestRole::PendingDest, self.address(dst));
        }
        d.toggle(DigestRole::Phase, turn.phase.index());
        if let Some(resume) = turn.resume_phase {
            d.toggle(DigestRole::ResumePhase, resume.index());
        }
        d.toggle(DigestRole::Turn, turn.whose_turn.index());

        for (player, regs) in turn.registers.iter() {
            for (k, value) in regs.values().into_iter().enumerate() {
                d.mix(
                    DigestRole::Register,
                    player.index() * Registers::COUNT + k,
                    u64::from(value),
                );
            }
        }

        match &turn.outcome {
            None => {}
            Some(GameResult::Winner(p)) => d.toggle(DigestRole::Outcome, p.index()),
            Some(GameResult::Draw) => d.toggle(DigestRole::Outcome, DIPOLE_PLAYERS),
        }

        d.mix(DigestRole::Revision, 0, u64::from(self.revision));
        d.mix(DigestRole::Variant, 0, self.variant.index() as u64);
        d.finish()
    }
}

impl PartialEq for DipoleBoard {
    fn eq(&self, other: &Self) -> bool {
        self.variant == other.variant
            && self.revision == other.revision
            && self.seed == other.seed
            && self.turn == other.turn
            && self.waste == other.waste
            && self.cells == other.cells
    }
}

impl std::fmt::Display for DipoleBoard {
    /// Text diagram, top row first. `.` is an empty dark square, `w`/`b`
    /// followed by the height marks a stack.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let size = self.grid.size();
        for row in (0..size).rev() {
            write!(f, "{:>2} ", row + 1)?;
            for col in 0..size {
                let coord = Coord::new(col, row);
                let cell = self.cell(coord);
                match cell.top() {
                    _ if !self.grid.is_dark(coord) => f.write_str("    ")?,
                    None => f.write_str("  . ")?,
                    Some(Chip::White) => write!(f, "w{:<2} ", cell.height())?,
                    Some(Chip::Black) => write!(f, "b{:<2} ", cell.height())?,
                }
            }
            writeln!(f)?;
        }
        f.write_str("   ")?;
        for col in 0..size {
            write!(f, " {}  ", (b'A' + col) as char)?;
        }
        writeln!(f)?;
        write!(f, "{} | waste {}", self.phase_description(), self.waste.height())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(init: &str) -> DipoleBoard {
        DipoleBoard::from_init_str(init).unwrap()
    }

    #[test]
    fn test_initial_position() {
        let b = board("dipole 2 0 1");
        assert_eq!(b.phase(), Phase::Puzzle);
        assert_eq!(b.cell(Coord::new(2, 0)).height(), 12);
        assert_eq!(b.cell(Coord::new(2, 0)).top(), Some(Chip::White));
        assert_eq!(b.cell(Coord::new(3, 7)).top(), Some(Chip::Black));
        assert_eq!(b.occupied_cells(), 2);

        let white = b.registers(PlayerId::new(0));
        assert_eq!(white.chips_on_board, 12);
        assert_eq!(white.advancement, 0);
        assert_eq!(b.registers(PlayerId::new(1)).chips_on_board, 12);
    }

    #[test]
    fn test_init_errors() {
        assert!(matches!(
            DipoleBoard::from_init_str("dipole 3 0 1"),
            Err(ParseError::PlayerCount { found: 3, .. })
        ));
        assert!(matches!(
            DipoleBoard::from_init_str("dipole 2 0 9"),
            Err(ParseError::Revision { found: 9, .. })
        ));
        assert!(matches!(
            DipoleBoard::from_init_str("hex 2 0 1"),
            Err(ParseError::UnknownVariant(_))
        ));
    }

    #[test]
    fn test_init_roundtrip() {
        let b = board("dipole-r 2 734687 0");
        assert_eq!(b.init().to_string(), "dipole-r 2 734687 0");
    }

    #[test]
    fn test_digest_is_stable() {
        let b = board("dipole 2 734687 1");
        assert_eq!(b.digest(), b.digest());
        assert_eq!(b.digest(), board("dipole 2 734687 1").digest());
        assert_eq!(b.clone().digest(), b.digest());
    }

    #[test]
    fn test_digest_separates_setups() {
        let rev1 = board("dipole 2 0 1").digest();
        assert_ne!(rev1, board("dipole 2 0 0").digest());
        assert_ne!(rev1, board("dipole-s 2 0 1").digest());
        // The seed only matters where it changes the position.
        assert_eq!(rev1, board("dipole 2 99 1").digest());
    }

    #[test]
    fn test_digest_ignores_cosmetics() {
        let mut b = board("dipole 2 0 1");
        let before = b.digest();
        b.turn.move_number += 5;
        b.cell_mut(Coord::new(2, 0)).last_dropped = Some(3);
        assert_eq!(b.digest(), before);
    }

    #[test]
    fn test_digest_held_vs_board() {
        // The same chip in hand and on the board digest differently.
        let mut on_board = board("dipole 2 0 1");
        on_board.add_chips(Coord::new(0, 0), Chip::White, 1);
        let mut in_hand = board("dipole 2 0 1");
        in_hand.turn.held = Some(Chip::White);
        in_hand.turn.registers[PlayerId::new(0)].chips_on_board += 1;
        assert_ne!(on_board.digest(), in_hand.digest());
    }

    #[test]
    fn test_add_remove_keeps_registers() {
        let mut b = board("dipole 2 0 1");
        let c = Coord::new(2, 4);
        b.add_chips(c, Chip::White, 3);
        assert_eq!(b.registers(PlayerId::new(0)).advancement, 12);
        let removed = b.remove_chips(c, 2);
        assert_eq!(removed.len(), 2);
        let regs = b.registers(PlayerId::new(0));
        assert_eq!(regs.chips_on_board, 13);
        assert_eq!(regs.advancement, 4);
    }

    #[test]
    fn test_sandbox_drops_history() {
        let mut b = board("dipole 2 0 1");
        b.undo.push(UndoRecord::marker(b.turn.clone(), &b.waste));
        let s = b.sandbox();
        assert_eq!(s.undo_depth(), 0);
        assert_eq!(s, b);
        assert_eq!(s.digest(), b.digest());
    }

    #[test]
    fn test_display_mentions_phase() {
        let text = board("dipole 2 0 1").to_string();
        assert!(text.contains("w12"));
        assert!(text.contains("b12"));
        assert!(text.contains("Rearrange the board"));
    }
}
