//! Robot search driver.
//!
//! ## Lifecycle
//!
//! `Idle -> Cloning -> Searching -> Applying -> Idle`
//!
//! [`RobotDriver::prepare_to_move`] copies the authoritative position into
//! a sandbox owned by a worker thread. From then on the worker never sees
//! the caller's state. The finished move comes back over a channel; the
//! main loop polls for it (or blocks in [`RobotDriver::wait`]), applies it
//! through the normal execute path and calls [`RobotDriver::complete`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, TryRecvError};
use tracing::{debug, info, warn};

use crate::core::{SearchError, SearchResult};
use crate::mcts::{parallel_search, MCTSSearch};
use crate::rules::RulesEngine;

use super::alphabeta::AlphaBeta;
use super::config::{RobotAlgorithm, RobotConfig};
use super::transposition::TranspositionTable;

/// Where the driver is in its hand-off cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RobotState {
    Idle,
    Cloning,
    Searching,
    Applying,
}

/// What a finished search produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RobotReply<M> {
    /// The move to apply.
    Move(M),
    /// The position has no robot move: the game is over or nobody can move.
    NoMove,
}

impl<M> RobotReply<M> {
    /// The move, if any.
    pub fn into_move(self) -> Option<M> {
        match self {
            Self::Move(mv) => Some(mv),
            Self::NoMove => None,
        }
    }
}

/// Run the configured search on `engine`'s position and return its move.
///
/// Blocks the calling thread. `table` carries alpha-beta results between
/// calls; MCTS ignores it.
pub fn choose_move<E>(
    engine: &E,
    config: &RobotConfig,
    table: &Arc<TranspositionTable<E::Move>>,
    cancel: &Arc<AtomicBool>,
) -> SearchResult<Option<E::Move>>
where
    E: RulesEngine + Sync + 'static,
    E::Move: Sync,
{
    match config.algorithm {
        RobotAlgorithm::Mcts => {
            // Seeded by the position so a replayed game replays the robot.
            let mut mcts = config.mcts_config();
            mcts.seed ^= engine.digest();
            if config.workers > 1 {
                parallel_search(engine, &mcts, config.iterations, config.workers, cancel)
                    .map(|outcome| outcome.best)
            } else {
                MCTSSearch::<E>::new(mcts)
                    .with_cancel_flag(Arc::clone(cancel))
                    .search(engine, config.iterations)
            }
        }
        RobotAlgorithm::AlphaBeta => AlphaBeta::<E>::new(config.clone())
            .with_table(Arc::clone(table))
            .with_cancel_flag(Arc::clone(cancel))
            .search(engine)
            .map(|outcome| outcome.best),
    }
}

/// Runs robot searches on a worker thread.
pub struct RobotDriver<E: RulesEngine> {
    config: RobotConfig,
    state: RobotState,
    table: Arc<TranspositionTable<E::Move>>,
    cancel: Arc<AtomicBool>,
    reply: Option<Receiver<SearchResult<Option<E::Move>>>>,
    worker: Option<JoinHandle<()>>,
}

impl<E> RobotDriver<E>
where
    E: RulesEngine + Sync + 'static,
    E::Move: Sync,
{
    #[must_use]
    pub fn new(config: RobotConfig) -> Self {
        let table = Arc::new(TranspositionTable::new(config.tt_capacity));
        Self {
            config,
            state: RobotState::Idle,
            table,
            cancel: Arc::new(AtomicBool::new(false)),
            reply: None,
            worker: None,
        }
    }

    #[must_use]
    pub fn state(&self) -> RobotState {
        self.state
    }

    #[must_use]
    pub fn config(&self) -> &RobotConfig {
        &self.config
    }

    /// Forget cached alpha-beta results, e.g. for a new game.
    pub fn clear_table(&self) {
        self.table.clear();
    }

    /// Copy `authoritative` into a sandbox and start searching it.
    pub fn prepare_to_move(&mut self, authoritative: &E) -> SearchResult<()> {
        if self.state != RobotState::Idle {
            return Err(SearchError::Busy);
        }

        self.state = RobotState::Cloning;
        let sandbox = authoritative.sandbox();
        let player = sandbox.whose_turn();

        self.cancel.store(false, Ordering::Relaxed);
        let (tx, rx) = crossbeam_channel::bounded(1);
        let config = self.config.clone();
        let table = Arc::clone(&self.table);
        let cancel = Arc::clone(&self.cancel);

        self.worker = Some(std::thread::spawn(move || {
            let result = choose_move(&sandbox, &config, &table, &cancel);
            // The driver may have been dropped; nobody is listening then.
            let _ = tx.send(result);
        }));
        self.reply = Some(rx);
        self.state = RobotState::Searching;
        info!(%player, algorithm = ?self.config.algorithm, "robot started searching");
        Ok(())
    }

    /// Ask the search to stop early; it still replies with its best so far.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// The reply, if the search has finished. Never blocks.
    pub fn poll(&mut self) -> SearchResult<Option<RobotReply<E::Move>>> {
        let Some(rx) = &self.reply else {
            return Ok(None);
        };
        match rx.try_recv() {
            Ok(result) => self.finish(result).map(Some),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(self.lost_worker()),
        }
    }

    /// Block until the search finishes.
    pub fn wait(&mut self) -> SearchResult<RobotReply<E::Move>> {
        let Some(rx) = &self.reply else {
            return Err(SearchError::Disconnected);
        };
        match rx.recv() {
            Ok(result) => self.finish(result),
            Err(_) => Err(self.lost_worker()),
        }
    }

    /// The main loop has applied the reply.
    pub fn complete(&mut self) {
        if self.state == RobotState::Applying {
            self.state = RobotState::Idle;
            debug!("robot idle");
        }
    }

    fn finish(
        &mut self,
        result: SearchResult<Option<E::Move>>,
    ) -> SearchResult<RobotReply<E::Move>> {
        self.reply = None;
        if let Some(handle) = self.worker.take() {
            handle.join().map_err(|_| SearchError::WorkerPanicked)?;
        }

        match result {
            Ok(Some(mv)) => {
                self.state = RobotState::Applying;
                info!(%mv, "robot hands back its move");
                Ok(RobotReply::Move(mv))
            }
            Ok(None) => {
                self.state = RobotState::Applying;
                info!("robot has no move available");
                Ok(RobotReply::NoMove)
            }
            Err(err) => {
                self.state = RobotState::Idle;
                Err(err)
            }
        }
    }

    fn lost_worker(&mut self) -> SearchError {
        self.reply = None;
        self.state = RobotState::Idle;
        let panicked = self.worker.take().is_some_and(|handle| handle.join().is_err());
        if panicked {
            SearchError::WorkerPanicked
        } else {
            SearchError::Disconnected
        }
    }
}

impl<E: RulesEngine> Drop for RobotDriver<E> {
    fn drop(&mut self) {
        self.cancel.store(true, Ordering::Relaxed);
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                warn!("robot worker panicked during shutdown");
            }
        }
    }
}
