//! 64-bit state digests.
//!
//! A digest is the xor of `key * value` over every field that affects
//! legality or outcome, with keys from [`DigestKeys`]. Because xor is its own
//! inverse, digests can also be maintained incrementally, although boards in
//! this crate recompute them on demand.
//!
//! ## Uses
//!
//! - Replay verification: a replayed log must land on the live digest.
//! - Repetition: [`RepetitionTable`] counts digests at turn boundaries.
//! - Search: every make/unmake pair can be checked to restore the digest.

pub mod history;
pub mod keys;

pub use history::{RepetitionTable, DEFAULT_REPETITION_LIMIT};
pub use keys::{DigestKeys, DigestLayout, DigestRole, DIGEST_SEED};

/// Accumulates one digest.
///
/// ```
/// use rust_dipole::digest::{Digester, DigestKeys, DigestLayout, DigestRole};
///
/// let keys = DigestKeys::new(DigestLayout {
///     cells: 4, slots: 2, colours: 2, players: 2, registers: 1, phases: 3,
/// });
/// let mut d = Digester::new(&keys);
/// d.toggle(DigestRole::Phase, 1);
/// d.toggle(DigestRole::Phase, 1);
/// assert_eq!(d.finish(), 0);
/// ```
#[derive(Debug)]
pub struct Digester<'a> {
    keys: &'a DigestKeys,
    value: u64,
}

impl<'a> Digester<'a> {
    #[must_use]
    pub fn new(keys: &'a DigestKeys) -> Self {
        Self { keys, value: 0 }
    }

    /// Xor in a bare key: "entry `index` of `role` is present".
    #[inline]
    pub fn toggle(&mut self, role: DigestRole, index: usize) {
        self.value ^= self.keys.key(role, index);
    }

    /// Xor in `key * (value + 1)`, so a zero value still contributes.
    #[inline]
    pub fn mix(&mut self, role: DigestRole, index: usize, value: u64) {
        self.value ^= self.keys.key(role, index).wrapping_mul(value.wrapping_add(1));
    }

    /// Xor in a precomputed key.
    #[inline]
    pub fn toggle_key(&mut self, key: u64) {
        self.value ^= key;
    }

    #[must_use]
    pub fn keys(&self) -> &'a DigestKeys {
        self.keys
    }

    #[must_use]
    pub fn finish(self) -> u64 {
        self.value
    }
}
