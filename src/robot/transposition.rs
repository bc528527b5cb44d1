//! Digest-keyed transposition table shared by alpha-beta workers.
//!
//! One `parking_lot` mutex guards the whole table. Workers hold the lock
//! only for a probe or a store, never across a recursive call.

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

/// How an entry's score bounds the true value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bound {
    /// The exact value.
    Exact,
    /// The value is at least the score (a beta cutoff).
    Lower,
    /// The value is at most the score (nothing beat alpha).
    Upper,
}

/// One searched position.
#[derive(Clone, Debug)]
pub struct TTEntry<M> {
    pub depth: u32,
    pub score: f64,
    pub bound: Bound,
    pub best: Option<M>,
}

#[derive(Debug)]
struct Inner<M> {
    entries: FxHashMap<u64, TTEntry<M>>,
    probes: u64,
    hits: u64,
}

/// Transposition table keyed by position digest.
#[derive(Debug)]
pub struct TranspositionTable<M> {
    inner: Mutex<Inner<M>>,
    capacity: usize,
}

/// Probe and store counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TTStats {
    pub entries: usize,
    pub probes: u64,
    pub hits: u64,
}

impl<M: Clone> TranspositionTable<M> {
    /// Table holding at most `capacity` positions.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: FxHashMap::default(),
                probes: 0,
                hits: 0,
            }),
            capacity,
        }
    }

    /// A score usable at `depth` inside the window, if one is stored.
    pub fn probe(&self, key: u64, depth: u32, alpha: f64, beta: f64) -> Option<f64> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        inner.probes += 1;
        let entry = inner.entries.get(&key)?;
        if entry.depth < depth {
            return None;
        }
        let usable = match entry.bound {
            Bound::Exact => true,
            Bound::Lower => entry.score >= beta,
            Bound::Upper => entry.score <= alpha,
        };
        let score = entry.score;
        if usable {
            inner.hits += 1;
            Some(score)
        } else {
            None
        }
    }

    /// The best move stored for a position, for move ordering.
    pub fn best_move(&self, key: u64) -> Option<M> {
        self.inner.lock().entries.get(&key).and_then(|e| e.best.clone())
    }

    /// Store a result. Deeper results replace shallower ones; new positions
    /// are dropped once the table is full.
    pub fn store(&self, key: u64, entry: TTEntry<M>) {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        let full = inner.entries.len() >= self.capacity;
        if let Some(existing) = inner.entries.get_mut(&key) {
            if entry.depth >= existing.depth {
                *existing = entry;
            }
        } else if !full {
            inner.entries.insert(key, entry);
        }
    }

    /// Forget everything, e.g. for a new game.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.probes = 0;
        inner.hits = 0;
    }

    #[must_use]
    pub fn stats(&self) -> TTStats {
        let inner = self.inner.lock();
        TTStats {
            entries: inner.entries.len(),
            probes: inner.probes,
            hits: inner.hits,
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
