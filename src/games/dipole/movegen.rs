//! Move generation.
//!
//! `legal_moves` lists everything `execute` accepts from a player in the
//! current phase, editing operations included. `robot_moves` is the subset a
//! robot chooses between: whole stack moves rather than pick/drop halves, and
//! no editing or draw offers.

use std::ops::RangeInclusive;

use smallvec::SmallVec;

use crate::core::{CellRef, Coord, Move, MoveOp, PlayerId};

use super::board::DipoleBoard;
use super::grid::Reach;
use super::phase::Phase;
use super::variant::DIPOLE_PLAYERS;

impl DipoleBoard {
    /// Height of the stack on `coord`, counting a chip lifted from it.
    #[must_use]
    pub fn stack_height(&self, coord: Coord) -> usize {
        let lifted = self.turn.held.is_some() && self.turn.held_from == Some(CellRef::Board(coord));
        self.cell(coord).height() + usize::from(lifted)
    }

    /// Owner of the stack on `coord`, counting a chip lifted from it.
    fn stack_owner(&self, coord: Coord) -> Option<PlayerId> {
        match self.turn.held {
            Some(chip) if self.turn.held_from == Some(CellRef::Board(coord)) => Some(chip.owner()),
            _ => self.cell(coord).owner(),
        }
    }

    /// Squares the stack on `from` can move to.
    ///
    /// Forward moves may land on empty or friendly squares. In every direction
    /// an enemy stack may be captured when its height does not exceed the
    /// number of chips moved.
    #[must_use]
    pub fn destinations(&self, from: Coord) -> SmallVec<[Reach; 24]> {
        let Some(owner) = self.stack_owner(from) else {
            return SmallVec::new();
        };
        self.grid
            .reaches(from, self.stack_height(from), owner)
            .into_iter()
            .filter(|r| match self.cell(r.to).owner() {
                Some(p) if p != owner => self.cell(r.to).height() <= usize::from(r.span),
                _ => r.forward,
            })
            .collect()
    }

    /// Chip counts the stack on `from` can bear off, if it reaches the edge.
    #[must_use]
    pub fn bear_off_range(&self, from: Coord) -> Option<RangeInclusive<u8>> {
        let owner = self.stack_owner(from)?;
        let distance = self.grid.distance_to_edge(from, owner);
        let height = u8::try_from(self.stack_height(from)).unwrap_or(u8::MAX);
        (distance <= height).then_some(distance..=height)
    }

    /// Whether `player` has any stack move.
    #[must_use]
    pub fn has_moves(&self, player: PlayerId) -> bool {
        self.stacks_of(player).any(|cell| {
            cell.loc().coord().is_some_and(|from| {
                !self.destinations(from).is_empty() || self.bear_off_range(from).is_some()
            })
        })
    }

    /// Whole-stack moves (`move`, `off`) for `player`.
    fn stack_moves(&self, player: PlayerId, out: &mut Vec<Move>) {
        for cell in self.stacks_of(player) {
            let Some(from) = cell.loc().coord() else {
                continue;
            };
            for reach in self.destinations(from) {
                out.push(Move::board(from, reach.to, player));
            }
            if let Some(range) = self.bear_off_range(from) {
                for count in range {
                    out.push(Move::off(from, count, player));
                }
            }
        }
    }

    /// Drops available for the held chip in play.
    fn play_drops(&self, source: Coord, player: PlayerId, out: &mut Vec<Move>) {
        for reach in self.destinations(source) {
            out.push(Move::drop(CellRef::Board(reach.to), player));
        }
        if self.bear_off_range(source).is_some() {
            out.push(Move::drop(CellRef::Waste, player));
        }
    }

    fn puzzle_moves(&self, player: PlayerId, out: &mut Vec<Move>) {
        match self.turn.held {
            Some(held) => {
                for coord in self.grid.dark_cells() {
                    let cell = self.cell(coord);
                    if cell.top().map_or(true, |top| top == held) && cell.height() < self.max_stack() {
                        out.push(Move::drop(CellRef::Board(coord), player));
                    }
                }
                out.push(Move::drop(CellRef::Rack(held.owner()), player));
                out.push(Move::drop(CellRef::Waste, player));
            }
            None => {
                for coord in self.grid.dark_cells() {
                    if !self.cell(coord).is_empty() {
                        out.push(Move::pick(CellRef::Board(coord), player));
                    }
                }
                for rack in PlayerId::all(DIPOLE_PLAYERS) {
                    out.push(Move::pick(CellRef::Rack(rack), player));
                }
                out.push(Move::simple(MoveOp::Start, player));
            }
        }
    }

    /// Every move `execute` would accept from `player` now.
    #[must_use]
    pub fn legal_moves(&self, player: PlayerId) -> Vec<Move> {
        let mut out = Vec::new();
        let phase = self.turn.phase;
        if phase == Phase::Puzzle {
            self.puzzle_moves(player, &mut out);
            return out;
        }
        if player != self.turn.whose_turn {
            return out;
        }
        match phase {
            Phase::Play => match (self.turn.held, self.turn.held_from) {
                (Some(_), Some(CellRef::Board(source))) => {
                    out.push(Move::drop(CellRef::Board(source), player));
                    self.play_drops(source, player, &mut out);
                }
                (Some(_), _) => {}
                (None, _) => {
                    for cell in self.stacks_of(player) {
                        out.push(Move::pick(cell.loc(), player));
                    }
                    self.stack_moves(player, &mut out);
                    for op in [MoveOp::Resign, MoveOp::OfferDraw, MoveOp::Edit] {
                        out.push(Move::simple(op, player));
                    }
                }
            },
            Phase::Confirm => {
                if let Some(dest) = self.turn.dropped_on {
                    if !self.undo.is_empty() {
                        out.push(Move::pick(dest, player));
                    }
                }
                out.push(Move::simple(MoveOp::Done, player));
                out.push(Move::simple(MoveOp::Edit, player));
            }
            Phase::Pass => {
                for op in [MoveOp::Pass, MoveOp::Done, MoveOp::Resign, MoveOp::Edit] {
                    out.push(Move::simple(op, player));
                }
            }
            Phase::Resign => {
                out.push(Move::simple(MoveOp::Resign, player));
                out.push(Move::simple(MoveOp::Done, player));
            }
            Phase::DrawOffered => {
                out.push(Move::simple(MoveOp::OfferDraw, player));
                out.push(Move::simple(MoveOp::Done, player));
            }
            Phase::AcceptOrDecline => {
                out.push(Move::simple(MoveOp::AcceptDraw, player));
                out.push(Move::simple(MoveOp::DeclineDraw, player));
            }
            Phase::AcceptPending => {
                out.push(Move::simple(MoveOp::AcceptDraw, player));
                out.push(Move::simple(MoveOp::Done, player));
            }
            Phase::DeclinePending => {
                out.push(Move::simple(MoveOp::DeclineDraw, player));
                out.push(Move::simple(MoveOp::Done, player));
            }
            Phase::Puzzle | Phase::GameOver => {}
        }
        out
    }

    /// Moves a robot chooses between. Empty only once the game is over.
    #[must_use]
    pub fn robot_moves(&self) -> Vec<Move> {
        let player = self.turn.whose_turn;
        let mut out = Vec::new();
        match self.turn.phase {
            Phase::Play => match (self.turn.held, self.turn.held_from) {
                (Some(_), Some(CellRef::Board(source))) => {
                    self.play_drops(source, player, &mut out);
                    if out.is_empty() {
                        out.push(Move::drop(CellRef::Board(source), player));
                    }
                }
                _ => {
                    self.stack_moves(player, &mut out);
                    if out.is_empty() {
                        out.push(Move::simple(MoveOp::Resign, player));
                    }
                }
            },
            Phase::Pass => out.push(Move::simple(MoveOp::Pass, player)),
            Phase::AcceptOrDecline => {
                out.push(Move::simple(MoveOp::AcceptDraw, player));
                out.push(Move::simple(MoveOp::DeclineDraw, player));
            }
            Phase::Puzzle => out.push(Move::simple(MoveOp::Start, player)),
            Phase::GameOver => {}
            phase if phase.awaits_done() => out.push(Move::simple(MoveOp::Done, player)),
            _ => {}
        }
        out
    }

    /// Whether some legal move of the player to move touches `loc`. Used to
    /// highlight cells.
    #[must_use]
    pub fn is_legal_target(&self, loc: CellRef) -> bool {
        self.legal_moves(self.turn.whose_turn).iter().any(|mv| match mv.op {
            MoveOp::Move => mv.from == Some(loc) || mv.to == Some(loc),
            _ => mv.target() == Some(loc),
        })
    }
}
