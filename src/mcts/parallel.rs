//! Root-parallel MCTS.
//!
//! Each worker searches its own tree from the same position with its own
//! seed; root visit counts are summed per move and the most visited move
//! wins. Workers share only the cancellation flag.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use rayon::prelude::*;
use tracing::debug;

use crate::core::rng::SEED_SPREAD;
use crate::core::SearchResult;
use crate::rules::RulesEngine;

use super::config::MCTSConfig;
use super::search::MCTSSearch;
use super::stats::SearchStats;

/// Merged result of a root-parallel search.
#[derive(Clone, Debug)]
pub struct ParallelOutcome<M> {
    /// Most visited move over all workers.
    pub best: Option<M>,

    /// Root moves with visits summed over workers.
    pub visits: Vec<(M, u32)>,

    /// Statistics folded over workers.
    pub stats: SearchStats,
}

struct WorkerRun<M> {
    best: Option<M>,
    visits: Vec<(M, u32)>,
    stats: SearchStats,
}

/// Seed of worker `index`. Worker 0 keeps the configured seed, so a single
/// worker searches exactly like [`MCTSSearch`].
#[must_use]
pub fn worker_seed(seed: u64, index: usize) -> u64 {
    seed.wrapping_add((index as u64).wrapping_mul(SEED_SPREAD))
}

/// Run `workers` independent searches of `iterations` each and merge them.
pub fn parallel_search<E>(
    engine: &E,
    config: &MCTSConfig,
    iterations: u32,
    workers: usize,
    cancel: &Arc<AtomicBool>,
) -> SearchResult<ParallelOutcome<E::Move>>
where
    E: RulesEngine + Sync + 'static,
{
    let workers = workers.max(1);

    let runs: Vec<SearchResult<WorkerRun<E::Move>>> = (0..workers)
        .into_par_iter()
        .map(|index| {
            let worker_config = config.clone().with_seed(worker_seed(config.seed, index));
            let mut search =
                MCTSSearch::<E>::new(worker_config).with_cancel_flag(Arc::clone(cancel));
            let best = search.search(engine, iterations)?;
            Ok(WorkerRun {
                best,
                visits: search.move_visits(),
                stats: search.stats().clone(),
            })
        })
        .collect();

    let mut merged: Vec<(E::Move, u32)> = Vec::new();
    let mut stats = SearchStats::default();
    let mut fallback = None;

    for run in runs {
        let run = run?;
        stats.merge(&run.stats);
        if fallback.is_none() {
            fallback = run.best;
        }
        for (mv, visits) in run.visits {
            match merged.iter_mut().find(|(seen, _)| *seen == mv) {
                Some(entry) => entry.1 += visits,
                None => merged.push((mv, visits)),
            }
        }
    }

    // Early returns (single move, cancelled before the first iteration)
    // leave every count at zero; keep the first worker's answer then.
    let best = merged
        .iter()
        .filter(|(_, visits)| *visits > 0)
        .max_by_key(|(_, visits)| *visits)
        .map(|(mv, _)| mv.clone())
        .or(fallback);

    debug!(
        workers,
        iterations = stats.iterations,
        rate = format_args!("{:.0}/s", stats.rate()),
        moves = merged.len(),
        "parallel mcts merged"
    );

    Ok(ParallelOutcome {
        best,
        visits: merged,
        stats,
    })
}
