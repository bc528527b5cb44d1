//! Execute and unexecute.
//!
//! `execute` runs in two steps. [`DipoleBoard::validate`] checks the move
//! against the phase and the target cells without touching anything and
//! yields an `Effect`; only then is the effect applied. A rejected move
//! therefore leaves the board exactly as it was.
//!
//! Every applied effect pushes an [`UndoRecord`] holding the scalar state and
//! copies of the cells it is about to touch. `unexecute` pops the record and
//! restores those copies, so it is an exact inverse by construction rather
//! than a recomputation.

use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::core::{
    Cell, CellRef, Chip, Coord, GameError, Move, MoveOp, MoveResult, PlayerId, ReplayMode,
};
use crate::rules::GameResult;

use super::board::{DipoleBoard, TurnState};
use super::phase::Phase;
use super::variant::{DIPOLE_PLAYERS, SKIP_BLOCKED_REVISION};

/// How to put the waste pile back.
#[derive(Clone, Debug)]
pub(crate) enum WasteUndo {
    /// The move only appended to the waste.
    Truncate {
        len: usize,
        last_picked: Option<u32>,
        last_dropped: Option<u32>,
    },
    /// The move may have shrunk the waste: keep a full copy.
    Restore(Cell),
}

/// Everything needed to reverse one executed move.
#[derive(Clone, Debug)]
pub(crate) struct UndoRecord {
    /// `None` for the repetition-draw marker.
    pub applied: Option<Move>,
    pub before: TurnState,
    pub cells: SmallVec<[Cell; 2]>,
    pub waste: WasteUndo,
}

impl UndoRecord {
    fn new(applied: Option<Move>, before: TurnState, waste: &Cell) -> Self {
        Self {
            applied,
            before,
            cells: SmallVec::new(),
            waste: WasteUndo::Truncate {
                len: waste.height(),
                last_picked: waste.last_picked,
                last_dropped: waste.last_dropped,
            },
        }
    }

    /// A record carrying no move, used when the session ends the game.
    pub(crate) fn marker(before: TurnState, waste: &Cell) -> Self {
        Self::new(None, before, waste)
    }

    /// Remember a cell's contents before the first change to it.
    fn save(&mut self, cell: &Cell) {
        if !self.cells.iter().any(|c| c.loc() == cell.loc()) {
            self.cells.push(cell.clone());
        }
    }
}

/// What a validated move will do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Effect {
    Start(PlayerId),
    Edit,
    PickBoard(Coord),
    PickRack(PlayerId),
    /// Pick on the pending destination: revert the pending move.
    TakeBack,
    /// Drop the held chip where it came from.
    DropBack(Coord),
    DropPuzzle(CellRef),
    Transfer { from: Coord, to: Coord, span: u8 },
    BearOff { from: Coord, count: u8 },
    Pass,
    Toggle { into: Phase, resume: Option<Phase> },
    Done,
}

fn illegal(mv: &Move, target: Option<CellRef>, reason: &'static str) -> GameError {
    GameError::IllegalTarget {
        op: mv.op,
        target: target.map_or_else(|| "nothing".to_string(), |t| t.to_string()),
        reason,
    }
}

impl DipoleBoard {
    // =========================================================================
    // Validation
    // =========================================================================

    /// Check that `execute` would accept `mv`, without changing anything.
    pub fn validate(&self, mv: &Move) -> MoveResult<()> {
        self.plan(mv).map(|_| ())
    }

    fn plan(&self, mv: &Move) -> MoveResult<Effect> {
        let phase = self.turn.phase;
        if phase == Phase::GameOver {
            return Err(GameError::GameOver);
        }
        if !phase.accepts(mv.op) {
            return Err(GameError::IllegalForPhase {
                op: mv.op,
                phase: phase.name(),
            });
        }
        if phase != Phase::Puzzle && mv.player != self.turn.whose_turn {
            return Err(GameError::WrongPlayer {
                expected: self.turn.whose_turn,
                actual: mv.player,
            });
        }
        if self.turn.held.is_some() && mv.op != MoveOp::Drop {
            return Err(GameError::ChipHeld { op: mv.op });
        }

        match mv.op {
            MoveOp::Start if mv.player.index() < DIPOLE_PLAYERS => Ok(Effect::Start(mv.player)),
            MoveOp::Start => Err(illegal(mv, None, "no such player")),
            MoveOp::Edit => Ok(Effect::Edit),
            MoveOp::Pick => self.plan_pick(mv),
            MoveOp::Drop => self.plan_drop(mv),
            MoveOp::Move => self.plan_move(mv),
            MoveOp::Off => self.plan_off(mv),
            MoveOp::Pass => Ok(Effect::Pass),
            MoveOp::Done => Ok(Effect::Done),
            MoveOp::Resign | MoveOp::OfferDraw | MoveOp::AcceptDraw | MoveOp::DeclineDraw => {
                Ok(self.toggle(mv.op))
            }
        }
    }

    fn is_square(&self, coord: Coord) -> bool {
        self.grid.contains(coord) && self.grid.is_dark(coord)
    }

    fn plan_pick(&self, mv: &Move) -> MoveResult<Effect> {
        let target = mv.from;
        match (self.turn.phase, target) {
            (Phase::Puzzle, Some(CellRef::Board(c))) => {
                if self.is_square(c) && !self.cell(c).is_empty() {
                    Ok(Effect::PickBoard(c))
                } else {
                    Err(illegal(mv, target, "no chip to pick up"))
                }
            }
            (Phase::Puzzle, Some(CellRef::Rack(p))) if p.index() < DIPOLE_PLAYERS => {
                Ok(Effect::PickRack(p))
            }
            (Phase::Play, Some(CellRef::Board(c))) => {
                if self.is_square(c) && self.cell(c).owner() == Some(self.turn.whose_turn) {
                    Ok(Effect::PickBoard(c))
                } else {
                    Err(illegal(mv, target, "not a stack of the player to move"))
                }
            }
            (Phase::Confirm, Some(t)) if Some(t) == self.turn.dropped_on => {
                if self.undo.is_empty() {
                    Err(GameError::UndoUnderflow)
                } else {
                    Ok(Effect::TakeBack)
                }
            }
            _ => Err(illegal(mv, target, "cannot pick here")),
        }
    }

    fn plan_drop(&self, mv: &Move) -> MoveResult<Effect> {
        let target = mv.to;
        let Some(held) = self.turn.held else {
            return Err(illegal(mv, target, "nothing is held"));
        };
        let Some(target_ref) = target else {
            return Err(illegal(mv, target, "no destination"));
        };

        if self.turn.phase == Phase::Puzzle {
            return match target_ref {
                CellRef::Board(c) if self.is_square(c) => {
                    let cell = self.cell(c);
                    if cell.top().is_some_and(|top| top != held) {
                        Err(illegal(mv, target, "stacks hold one colour"))
                    } else if cell.height() >= self.max_stack() {
                        Err(illegal(mv, target, "stack is full"))
                    } else {
                        Ok(Effect::DropPuzzle(target_ref))
                    }
                }
                CellRef::Rack(p) if p.index() < DIPOLE_PLAYERS && Chip::for_player(p) == held => {
                    Ok(Effect::DropPuzzle(target_ref))
                }
                CellRef::Waste => Ok(Effect::DropPuzzle(target_ref)),
                _ => Err(illegal(mv, target, "cannot drop here")),
            };
        }

        // Play: the held chip is the top of a stack being moved.
        let Some(CellRef::Board(source)) = self.turn.held_from else {
            return Err(illegal(mv, target, "held chip has no source square"));
        };
        match target_ref {
            CellRef::Board(c) if c == source => Ok(Effect::DropBack(source)),
            CellRef::Board(c) => self
                .destinations(source)
                .into_iter()
                .find(|r| r.to == c)
                .map(|r| Effect::Transfer {
                    from: source,
                    to: c,
                    span: r.span,
                })
                .ok_or_else(|| illegal(mv, target, "stack cannot reach this square")),
            CellRef::Waste => self
                .bear_off_range(source)
                .map(|range| Effect::BearOff {
                    from: source,
                    count: *range.start(),
                })
                .ok_or_else(|| illegal(mv, target, "stack cannot reach the edge")),
            CellRef::Rack(_) => Err(illegal(mv, target, "racks are only used while editing")),
        }
    }

    fn own_stack(&self, mv: &Move) -> MoveResult<Coord> {
        match mv.from {
            Some(CellRef::Board(c))
                if self.is_square(c) && self.cell(c).owner() == Some(self.turn.whose_turn) =>
            {
                Ok(c)
            }
            other => Err(illegal(mv, other, "not a stack of the player to move")),
        }
    }

    fn plan_move(&self, mv: &Move) -> MoveResult<Effect> {
        let from = self.own_stack(mv)?;
        let Some(CellRef::Board(to)) = mv.to else {
            return Err(illegal(mv, mv.to, "destination must be a square"));
        };
        self.destinations(from)
            .into_iter()
            .find(|r| r.to == to)
            .map(|r| Effect::Transfer {
                from,
                to,
                span: r.span,
            })
            .ok_or_else(|| illegal(mv, mv.to, "stack cannot reach this square"))
    }

    fn plan_off(&self, mv: &Move) -> MoveResult<Effect> {
        let from = self.own_stack(mv)?;
        match self.bear_off_range(from) {
            Some(range) if range.contains(&mv.count) => Ok(Effect::BearOff {
                from,
                count: mv.count,
            }),
            _ => Err(illegal(mv, mv.from, "cannot bear off that many chips")),
        }
    }

    /// Enter the pending phase of a toggling verb, or leave it again.
    fn toggle(&self, op: MoveOp) -> Effect {
        let pending = match op {
            MoveOp::Resign => Phase::Resign,
            MoveOp::OfferDraw => Phase::DrawOffered,
            MoveOp::AcceptDraw => Phase::AcceptPending,
            _ => Phase::DeclinePending,
        };
        if self.turn.phase == pending {
            Effect::Toggle {
                into: self.turn.resume_phase.unwrap_or(Phase::Play),
                resume: None,
            }
        } else {
            Effect::Toggle {
                into: pending,
                resume: Some(self.turn.phase),
            }
        }
    }

    // =========================================================================
    // Execute
    // =========================================================================

    /// Apply `mv`, filling in its side-effect fields.
    ///
    /// # Errors
    ///
    /// Any move the current phase does not accept. The board is unchanged
    /// when an error is returned.
    pub fn execute(&mut self, mv: &mut Move, mode: ReplayMode) -> MoveResult<()> {
        let effect = self.plan(mv)?;
        let phase_before = self.turn.phase;
        self.animation.clear();

        let mut record = UndoRecord::new(None, self.turn.clone(), &self.waste);
        self.apply(effect, mv, mode, &mut record);
        record.applied = Some(mv.clone());
        self.undo.push(record);

        trace!(mv = %mv, phase = %self.turn.phase, "executed");
        if self.turn.phase != phase_before {
            debug!(from = %phase_before, to = %self.turn.phase, turn = %self.turn.whose_turn, "phase change");
        }
        Ok(())
    }

    fn apply(&mut self, effect: Effect, mv: &mut Move, mode: ReplayMode, record: &mut UndoRecord) {
        let stamp = self.turn.move_number;
        match effect {
            Effect::Start(player) => {
                self.clear_pending();
                self.turn.whose_turn = player;
                if !self.check_exhausted() {
                    self.enter_turn();
                }
            }
            Effect::Edit => {
                self.clear_pending();
                self.turn.phase = Phase::Puzzle;
            }
            Effect::PickBoard(c) => {
                record.save(self.cell(c));
                let chip = self.remove_chips(c, 1).pop();
                self.cell_mut(c).last_picked = Some(stamp);
                self.turn.held = chip;
                self.turn.held_from = Some(CellRef::Board(c));
            }
            Effect::PickRack(p) => {
                record.save(&self.racks[p]);
                self.racks[p].last_picked = Some(stamp);
                self.turn.held = Some(Chip::for_player(p));
                self.turn.held_from = Some(CellRef::Rack(p));
            }
            Effect::TakeBack => self.take_back(record),
            Effect::DropBack(c) => {
                record.save(self.cell(c));
                if let Some(chip) = self.turn.held.take() {
                    self.add_chips(c, chip, 1);
                }
                self.cell_mut(c).last_dropped = Some(stamp);
                self.turn.held_from = None;
            }
            Effect::DropPuzzle(target) => {
                if let Some(chip) = self.turn.held.take() {
                    self.drop_loose(target, chip, stamp, record);
                    if mode.animates() {
                        if let Some(from) = self.turn.held_from {
                            self.animation.push((from, target));
                        }
                    }
                }
                self.turn.held_from = None;
            }
            Effect::Transfer { from, to, span } => {
                let captures = self.transfer(from, to, span, stamp, record, mode);
                mv.captures = Some(captures);
                self.await_done(CellRef::Board(from), CellRef::Board(to));
            }
            Effect::BearOff { from, count } => {
                self.bear_off(from, count, stamp, record, mode);
                mv.captures = Some(0);
                self.await_done(CellRef::Board(from), CellRef::Waste);
            }
            Effect::Pass => {
                self.turn.phase = Phase::Confirm;
                self.turn.dropped_on = None;
            }
            Effect::Toggle { into, resume } => {
                self.turn.phase = into;
                self.turn.resume_phase = resume;
            }
            Effect::Done => self.done(),
        }
    }

    fn clear_pending(&mut self) {
        self.turn.held_from = None;
        self.turn.dropped_on = None;
        self.turn.resume_phase = None;
    }

    fn await_done(&mut self, from: CellRef, to: CellRef) {
        self.turn.held_from = Some(from);
        self.turn.dropped_on = Some(to);
        self.turn.phase = Phase::Confirm;
    }

    /// Put a loose chip (editing) somewhere.
    fn drop_loose(&mut self, target: CellRef, chip: Chip, stamp: u32, record: &mut UndoRecord) {
        match target {
            CellRef::Board(c) => {
                record.save(self.cell(c));
                self.add_chips(c, chip, 1);
                self.cell_mut(c).last_dropped = Some(stamp);
            }
            CellRef::Rack(p) => {
                record.save(&self.racks[p]);
                self.racks[p].last_dropped = Some(stamp);
            }
            CellRef::Waste => {
                self.waste.push(chip);
                self.waste.last_dropped = Some(stamp);
            }
        }
    }

    /// Move `span` chips from `from` to `to`, capturing an enemy stack there.
    /// Returns the number of chips captured.
    fn transfer(
        &mut self,
        from: Coord,
        to: Coord,
        span: u8,
        stamp: u32,
        record: &mut UndoRecord,
        mode: ReplayMode,
    ) -> u8 {
        let mover = self.turn.whose_turn;
        let chip = Chip::for_player(mover);
        record.save(self.cell(from));
        record.save(self.cell(to));

        let mut captured = 0;
        if self.cell(to).owner().is_some_and(|owner| owner != mover) {
            let height = self.cell(to).height();
            let taken = self.remove_chips(to, height);
            captured = taken.len();
            for c in taken.into_iter().rev() {
                self.waste.push(c);
            }
            self.waste.last_dropped = Some(stamp);
            self.turn.registers[mover].captured += captured as u32;
            if mode.animates() {
                self.animation.push((CellRef::Board(to), CellRef::Waste));
            }
        }

        let lifted = usize::from(self.turn.held.take().is_some());
        self.remove_chips(from, usize::from(span) - lifted);
        self.add_chips(to, chip, usize::from(span));
        self.cell_mut(from).last_picked = Some(stamp);
        self.cell_mut(to).last_dropped = Some(stamp);
        if mode.animates() {
            for _ in 0..span {
                self.animation.push((CellRef::Board(from), CellRef::Board(to)));
            }
        }
        captured as u8
    }

    fn bear_off(&mut self, from: Coord, count: u8, stamp: u32, record: &mut UndoRecord, mode: ReplayMode) {
        let mover = self.turn.whose_turn;
        record.save(self.cell(from));
        let held = self.turn.held.take();
        let lifted = usize::from(held.is_some());
        let removed = self.remove_chips(from, usize::from(count) - lifted);
        for chip in held.into_iter().chain(removed) {
            self.waste.push(chip);
        }
        self.waste.last_dropped = Some(stamp);
        self.cell_mut(from).last_picked = Some(stamp);
        self.turn.registers[mover].borne_off += u32::from(count);
        if mode.animates() {
            for _ in 0..count {
                self.animation.push((CellRef::Board(from), CellRef::Waste));
            }
        }
    }

    /// Revert the pending move by reapplying the top undo record.
    fn take_back(&mut self, record: &mut UndoRecord) {
        let Some(prior) = self.undo.last().cloned() else {
            return;
        };
        for saved in &prior.cells {
            if let Some(current) = self.cell_at(saved.loc()) {
                record.save(current);
            }
        }
        record.waste = WasteUndo::Restore(self.waste.clone());
        self.restore(&prior);
    }

    // =========================================================================
    // Turn boundaries
    // =========================================================================

    fn done(&mut self) {
        let mover = self.turn.whose_turn;
        let phase = self.turn.phase;
        self.clear_pending();
        match phase {
            Phase::Resign => self.finish(GameResult::Winner(self.opponent(mover))),
            Phase::AcceptPending => self.finish(GameResult::Draw),
            Phase::DrawOffered => {
                self.advance_turn();
                self.turn.phase = Phase::AcceptOrDecline;
            }
            Phase::DeclinePending => {
                self.advance_turn();
                self.enter_turn();
            }
            _ => {
                if !self.check_exhausted() {
                    self.advance_turn();
                    self.enter_turn();
                }
            }
        }
    }

    fn advance_turn(&mut self) {
        self.turn.whose_turn = self.opponent(self.turn.whose_turn);
        self.turn.move_number += 1;
    }

    /// A player without chips on the board loses. When both are empty the
    /// player not to move wins.
    fn check_exhausted(&mut self) -> bool {
        let mover = self.turn.whose_turn;
        let other = self.opponent(mover);
        let mover_empty = self.turn.registers[mover].chips_on_board == 0;
        let other_empty = self.turn.registers[other].chips_on_board == 0;
        if mover_empty {
            self.finish(GameResult::Winner(other));
        } else if other_empty {
            self.finish(GameResult::Winner(mover));
        }
        mover_empty || other_empty
    }

    /// Choose the phase for the player now to move.
    ///
    /// A player with no move passes. When one side is blocked the other
    /// always has a move, so from [`SKIP_BLOCKED_REVISION`] on the blocked
    /// turn is skipped rather than played out as `pass` and `done`.
    fn enter_turn(&mut self) {
        let player = self.turn.whose_turn;
        if self.has_moves(player) {
            self.turn.phase = Phase::Play;
        } else if self.revision >= SKIP_BLOCKED_REVISION && self.has_moves(self.opponent(player)) {
            trace!(%player, "no move, turn skipped");
            self.advance_turn();
            self.turn.phase = Phase::Play;
        } else {
            self.turn.phase = Phase::Pass;
        }
    }

    fn finish(&mut self, result: GameResult) {
        trace!(%result, "game over");
        self.turn.outcome = Some(result);
        self.turn.phase = Phase::GameOver;
        self.turn.resume_phase = None;
    }

    // =========================================================================
    // Unexecute
    // =========================================================================

    /// Reverse the last executed move, which must equal `mv`.
    pub fn unexecute(&mut self, mv: &Move) -> MoveResult<()> {
        let Some(record) = self.undo.pop() else {
            return Err(GameError::UndoUnderflow);
        };
        if record.applied.as_ref() != Some(mv) {
            let recorded = record
                .applied
                .as_ref()
                .map_or_else(|| "game end marker".to_string(), ToString::to_string);
            self.undo.push(record);
            return Err(GameError::UndoMismatch {
                requested: mv.to_string(),
                recorded,
            });
        }
        self.restore(&record);
        self.animation.clear();
        trace!(mv = %mv, phase = %self.turn.phase, "unexecuted");
        Ok(())
    }

    fn restore(&mut self, record: &UndoRecord) {
        self.turn = record.before.clone();
        for saved in &record.cells {
            match saved.loc() {
                CellRef::Board(c) => self.cell_mut(c).restore(saved),
                CellRef::Rack(p) => self.racks[p].restore(saved),
                CellRef::Waste => self.waste.restore(saved),
            }
        }
        match &record.waste {
            WasteUndo::Truncate {
                len,
                last_picked,
                last_dropped,
            } => {
                self.waste.truncate(*len);
                self.waste.last_picked = *last_picked;
                self.waste.last_dropped = *last_dropped;
            }
            WasteUndo::Restore(saved) => self.waste.restore(saved),
        }
    }

    // =========================================================================
    // Session-level endings
    // =========================================================================

    /// End the game drawn from outside the rules (repetition). Undone by
    /// [`retract_draw`](Self::retract_draw).
    pub fn declare_draw(&mut self) -> MoveResult<()> {
        if self.turn.phase == Phase::GameOver {
            return Err(GameError::GameOver);
        }
        if self.turn.held.is_some() {
            return Err(GameError::ChipHeld { op: MoveOp::Done });
        }
        self.undo.push(UndoRecord::marker(self.turn.clone(), &self.waste));
        self.clear_pending();
        self.finish(GameResult::Draw);
        Ok(())
    }

    /// Take back a draw made by [`declare_draw`](Self::declare_draw).
    pub fn retract_draw(&mut self) -> MoveResult<()> {
        let Some(record) = self.undo.pop() else {
            return Err(GameError::UndoUnderflow);
        };
        if let Some(applied) = &record.applied {
            let recorded = applied.to_string();
            self.undo.push(record);
            return Err(GameError::UndoMismatch {
                requested: "game end marker".to_string(),
                recorded,
            });
        }
        self.restore(&record);
        Ok(())
    }

    /// The last move still on the undo stack.
    #[must_use]
    pub fn last_executed(&self) -> Option<&Move> {
        self.undo.last().and_then(|r| r.applied.as_ref())
    }
}
