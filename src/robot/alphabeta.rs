//! Alpha-beta search with iterative deepening and a transposition table.
//!
//! Negamax over [`RulesEngine`]: scores are from the point of view of the
//! player to move. When a move leaves the same player to move again the
//! window is passed through unchanged instead of negated.
//!
//! # Features
//!
//! - Iterative deepening; the previous iteration's best move is searched first
//! - Digest-keyed transposition table shared by all workers
//! - Root moves split across rayon workers, each on its own engine clone
//! - Cooperative stop on the deadline or the cancel flag
//!
//! Decisive scores grow with the remaining depth, so faster wins rank
//! above slower ones.

use std::cmp::Ordering as CmpOrdering;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, error};

use crate::core::{PlayerId, SearchError, SearchResult};
use crate::rules::{GameResult, RulesEngine};

use super::config::RobotConfig;
use super::transposition::{Bound, TTEntry, TranspositionTable};

/// Base score of a decided game.
pub const WIN: f64 = 1_000.0;

/// Nodes between deadline checks.
const CHECK_INTERVAL: u64 = 256;

/// Result of an alpha-beta search.
#[derive(Clone, Debug)]
pub struct AlphaBetaOutcome<M> {
    /// Best move of the deepest completed iteration.
    pub best: Option<M>,
    /// Its score for the player to move.
    pub score: f64,
    /// Deepest completed iteration.
    pub depth: u32,
    /// Nodes visited over all iterations and workers.
    pub nodes: u64,
    /// The search stopped on its deadline or cancel flag.
    pub stopped: bool,
}

impl<M> AlphaBetaOutcome<M> {
    fn empty() -> Self {
        Self {
            best: None,
            score: 0.0,
            depth: 0,
            nodes: 0,
            stopped: false,
        }
    }
}

/// Alpha-beta search engine.
///
/// The transposition table outlives a single search; share it between
/// searches of the same game and clear it for a new one.
pub struct AlphaBeta<E: RulesEngine> {
    config: RobotConfig,
    tt: Arc<TranspositionTable<E::Move>>,
    cancel: Arc<AtomicBool>,
}

struct RootResult<M> {
    best: Option<M>,
    score: f64,
    nodes: u64,
    stopped: bool,
}

impl<E> AlphaBeta<E>
where
    E: RulesEngine + Sync,
    E::Move: Sync,
{
    /// Searcher with a fresh table sized by the config.
    #[must_use]
    pub fn new(config: RobotConfig) -> Self {
        let tt = Arc::new(TranspositionTable::new(config.tt_capacity));
        Self {
            config,
            tt,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Use an existing table.
    pub fn with_table(mut self, tt: Arc<TranspositionTable<E::Move>>) -> Self {
        self.tt = tt;
        self
    }

    /// Share a cancellation flag with the caller.
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    #[must_use]
    pub fn table(&self) -> &Arc<TranspositionTable<E::Move>> {
        &self.tt
    }

    /// Search `engine`'s position by iterative deepening up to the
    /// configured depth.
    pub fn search(&self, engine: &E) -> SearchResult<AlphaBetaOutcome<E::Move>> {
        let start = Instant::now();
        let deadline = self.config.deadline(start);
        let mut outcome = AlphaBetaOutcome::empty();

        if engine.result().is_some() {
            return Ok(outcome);
        }
        let mut root_moves = order_moves(engine, engine.robot_moves(), None);
        if root_moves.len() <= 1 {
            outcome.best = root_moves.pop();
            return Ok(outcome);
        }

        for depth in 1..=self.config.max_depth.max(1) {
            let result = self.search_root(engine, &root_moves, depth, deadline)?;
            outcome.nodes += result.nodes;
            if result.stopped {
                // Keep the last completed iteration.
                outcome.stopped = true;
                break;
            }

            outcome.best = result.best;
            outcome.score = result.score;
            outcome.depth = depth;
            debug!(depth, score = outcome.score, nodes = outcome.nodes, "alpha-beta iteration");

            if let Some(best) = &outcome.best {
                promote(&mut root_moves, best);
            }
            if outcome.score.abs() >= WIN {
                break;
            }
        }

        if outcome.best.is_none() {
            outcome.best = root_moves.first().cloned();
        }
        debug!(
            depth = outcome.depth,
            score = outcome.score,
            nodes = outcome.nodes,
            stopped = outcome.stopped,
            time_us = start.elapsed().as_micros() as u64,
            "alpha-beta search finished"
        );
        Ok(outcome)
    }

    /// One iteration: root moves are dealt to workers in contiguous runs,
    /// each run searched with its own rising alpha.
    fn search_root(
        &self,
        engine: &E,
        root_moves: &[E::Move],
        depth: u32,
        deadline: Option<Instant>,
    ) -> SearchResult<RootResult<E::Move>> {
        let workers = self.config.workers.max(1);
        let chunk = root_moves.len().div_ceil(workers).max(1);

        let runs: Vec<SearchResult<RootResult<E::Move>>> = root_moves
            .par_chunks(chunk)
            .map(|run| {
                let mut sandbox = engine.sandbox();
                let mut worker = Worker::new(&self.tt, &self.cancel, deadline, self.config.verify_digests);
                let me = sandbox.whose_turn();
                let mut alpha = f64::NEG_INFINITY;
                let mut best = None;
                let mut best_score = f64::NEG_INFINITY;

                for mv in run {
                    if worker.should_stop() {
                        break;
                    }
                    let score = worker.child_score(&mut sandbox, mv, me, depth - 1, alpha, f64::INFINITY)?;
                    if worker.stopped {
                        break;
                    }
                    if score > best_score {
                        best_score = score;
                        best = Some(mv.clone());
                    }
                    alpha = alpha.max(score);
                }

                Ok(RootResult {
                    best,
                    score: best_score,
                    nodes: worker.nodes,
                    stopped: worker.stopped,
                })
            })
            .collect();

        let mut merged = RootResult {
            best: None,
            score: f64::NEG_INFINITY,
            nodes: 0,
            stopped: false,
        };
        for run in runs {
            let run = run?;
            merged.nodes += run.nodes;
            merged.stopped |= run.stopped;
            if run.best.is_some() && run.score > merged.score {
                merged.best = run.best;
                merged.score = run.score;
            }
        }
        Ok(merged)
    }
}

/// Per-worker search state.
struct Worker<'a, M> {
    tt: &'a TranspositionTable<M>,
    cancel: &'a AtomicBool,
    deadline: Option<Instant>,
    verify: bool,
    nodes: u64,
    stopped: bool,
}

impl<'a, M: Clone + PartialEq + std::fmt::Display> Worker<'a, M> {
    fn new(
        tt: &'a TranspositionTable<M>,
        cancel: &'a AtomicBool,
        deadline: Option<Instant>,
        verify: bool,
    ) -> Self {
        Self {
            tt,
            cancel,
            deadline,
            verify,
            nodes: 0,
            stopped: false,
        }
    }

    fn should_stop(&mut self) -> bool {
        if !self.stopped && self.nodes % CHECK_INTERVAL == 0 {
            self.stopped = self.cancel.load(Ordering::Relaxed)
                || self.deadline.is_some_and(|d| Instant::now() >= d);
        }
        self.stopped
    }

    /// Score of `mv` for `me`, searching the child `depth` plies deep.
    fn child_score<E: RulesEngine<Move = M>>(
        &mut self,
        engine: &mut E,
        mv: &M,
        me: PlayerId,
        depth: u32,
        alpha: f64,
        beta: f64,
    ) -> SearchResult<f64> {
        let before = if self.verify { engine.digest() } else { 0 };
        let mut mv = mv.clone();
        engine.execute_robot(&mut mv)?;

        let score = if engine.whose_turn() == me {
            self.negamax(engine, depth, alpha, beta)
        } else {
            self.negamax(engine, depth, -beta, -alpha).map(|s| -s)
        };

        engine.unexecute_robot(&mv)?;
        if self.verify {
            let after = engine.digest();
            if after != before {
                error!(%mv, before, after, "digest not restored by unexecute");
                return Err(SearchError::DigestMismatch {
                    mv: mv.to_string(),
                    before,
                    after,
                });
            }
        }
        score
    }

    fn negamax<E: RulesEngine<Move = M>>(
        &mut self,
        engine: &mut E,
        depth: u32,
        mut alpha: f64,
        beta: f64,
    ) -> SearchResult<f64> {
        self.nodes += 1;
        if self.should_stop() {
            return Ok(0.0);
        }

        let me = engine.whose_turn();
        if let Some(result) = engine.result() {
            return Ok(terminal_score(&result, me, depth));
        }
        if depth == 0 {
            return Ok(2.0 * engine.evaluate(me) - 1.0);
        }

        let key = engine.digest();
        if let Some(score) = self.tt.probe(key, depth, alpha, beta) {
            return Ok(score);
        }

        let moves = order_moves(&*engine, engine.robot_moves(), self.tt.best_move(key));
        if moves.is_empty() {
            return Ok(0.0);
        }

        let alpha_orig = alpha;
        let mut best = f64::NEG_INFINITY;
        let mut best_move = None;

        for mv in &moves {
            let score = self.child_score(engine, mv, me, depth - 1, alpha, beta)?;
            if self.stopped {
                return Ok(0.0);
            }
            if score > best {
                best = score;
                best_move = Some(mv.clone());
            }
            alpha = alpha.max(score);
            if alpha >= beta {
                break;
            }
        }

        let bound = if best <= alpha_orig {
            Bound::Upper
        } else if best >= beta {
            Bound::Lower
        } else {
            Bound::Exact
        };
        self.tt.store(
            key,
            TTEntry {
                depth,
                score: best,
                bound,
                best: best_move,
            },
        );
        Ok(best)
    }
}

/// Score of a finished game for `player`, larger the sooner it was reached.
fn terminal_score(result: &GameResult, player: PlayerId, depth: u32) -> f64 {
    (2.0 * result.reward(player) - 1.0) * (WIN + f64::from(depth))
}

/// Heaviest moves first, then `first` moved to the front.
fn order_moves<E: RulesEngine>(
    engine: &E,
    moves: Vec<E::Move>,
    first: Option<E::Move>,
) -> Vec<E::Move> {
    let mut keyed: Vec<(f32, E::Move)> = moves
        .into_iter()
        .map(|m| (engine.move_weight(&m), m))
        .collect();
    keyed.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(CmpOrdering::Equal));
    let mut moves: Vec<E::Move> = keyed.into_iter().map(|(_, m)| m).collect();
    if let Some(first) = first {
        promote(&mut moves, &first);
    }
    moves
}

fn promote<M: PartialEq>(moves: &mut Vec<M>, mv: &M) {
    if let Some(pos) = moves.iter().position(|m| m == mv) {
        let m = moves.remove(pos);
        moves.insert(0, m);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Move, MoveOp, ReplayMode};
    use crate::games::dipole::DipoleBoard;

    fn board(moves: &[&str]) -> DipoleBoard {
        let mut b = DipoleBoard::from_init_str("dipole 2 734687 1").unwrap();
        for text in moves {
            let mut mv = Move::decode(text).unwrap();
            b.execute(&mut mv, ReplayMode::Replay).unwrap();
        }
        b
    }

    fn last_black_chip() -> DipoleBoard {
        let mut script = Vec::new();
        for _ in 0..11 {
            script.push("pick D 8 P0");
            script.push("drop waste P0");
        }
        script.push("pick D 8 P0");
        script.push("drop D 2 P0");
        script.push("start P0");
        board(&script)
    }

    fn config(depth: u32) -> RobotConfig {
        RobotConfig::default()
            .with_max_depth(depth)
            .with_digest_checks(true)
    }

    #[test]
    fn test_finds_winning_capture() {
        let b = last_black_chip();
        let search = AlphaBeta::<DipoleBoard>::new(config(2));
        let outcome = search.search(&b).unwrap();
        assert_eq!(outcome.best.unwrap().encode(), "move C 1 D 2 P0");
        assert!(outcome.score >= WIN);
        assert_eq!(outcome.depth, 1);
    }

    #[test]
    fn test_workers_find_winning_capture() {
        let b = last_black_chip();
        let search = AlphaBeta::<DipoleBoard>::new(config(2).with_workers(3));
        let outcome = search.search(&b).unwrap();
        assert_eq!(outcome.best.unwrap().encode(), "move C 1 D 2 P0");
    }

    #[test]
    fn test_opening_search_fills_table() {
        let b = board(&["start P0"]);
        let search = AlphaBeta::<DipoleBoard>::new(config(2).with_workers(2));
        let outcome = search.search(&b).unwrap();

        let best = outcome.best.unwrap();
        assert!(b.robot_moves().contains(&best));
        assert_eq!(outcome.depth, 2);
        assert!(outcome.nodes > 0);
        assert!(search.table().stats().entries > 0);
    }

    #[test]
    fn test_finished_game_has_no_move() {
        let b = board(&["start P0", "resign P0", "done P0"]);
        let outcome = AlphaBeta::<DipoleBoard>::new(config(2)).search(&b).unwrap();
        assert!(outcome.best.is_none());
    }

    #[test]
    fn test_single_move_returned_directly() {
        let b = board(&["start P0", "resign P0"]);
        let outcome = AlphaBeta::<DipoleBoard>::new(config(2)).search(&b).unwrap();
        assert_eq!(outcome.best.map(|m| m.op), Some(MoveOp::Done));
        assert_eq!(outcome.nodes, 0);
    }

    #[test]
    fn test_cancel_keeps_a_move() {
        let b = board(&["start P0"]);
        let search = AlphaBeta::<DipoleBoard>::new(config(3))
            .with_cancel_flag(Arc::new(AtomicBool::new(true)));
        let outcome = search.search(&b).unwrap();
        assert!(outcome.stopped);
        assert_eq!(outcome.depth, 0);
        assert!(outcome.best.is_some());
    }

    #[test]
    fn test_terminal_score_prefers_fast_wins() {
        let win = GameResult::Winner(PlayerId::new(0));
        assert!(terminal_score(&win, PlayerId::new(0), 3) > terminal_score(&win, PlayerId::new(0), 1));
        assert!(terminal_score(&win, PlayerId::new(1), 3) < -WIN);
        assert_eq!(terminal_score(&GameResult::Draw, PlayerId::new(0), 2), 0.0);
    }

    #[test]
    fn test_promote() {
        let mut moves = vec![1, 2, 3];
        promote(&mut moves, &3);
        assert_eq!(moves, vec![3, 1, 2]);
        promote(&mut moves, &9);
        assert_eq!(moves, vec![3, 1, 2]);
    }
}
