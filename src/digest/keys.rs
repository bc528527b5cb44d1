//! Per-role digest key tables.
//!
//! Each [`DigestRole`] draws its keys from its own ChaCha8 stream, seeded from
//! a fixed constant and the role's index. A field therefore always hashes
//! through the same keys no matter how or in what order the board was built,
//! and two roles never share a key table: a chip in hand and the same chip on
//! the board can never cancel each other out.

use serde::{Deserialize, Serialize};

use crate::core::rng::{GameRng, SEED_SPREAD};

/// Base seed of every key stream.
pub const DIGEST_SEED: u64 = 64_000;

/// The logically distinct things that contribute to a digest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DigestRole {
    /// A chip of one colour at one slot of one board cell.
    BoardChip,
    /// Chips of one colour in the waste pile.
    Waste,
    /// The chip in the held slot, by colour.
    Held,
    /// Where the held chip or pending move came from.
    PendingSource,
    /// Where the pending move was dropped.
    PendingDest,
    Phase,
    /// Phase restored when a resign or draw offer is taken back.
    ResumePhase,
    Turn,
    /// One per-player register of one player.
    Register,
    Outcome,
    Revision,
    Variant,
}

impl DigestRole {
    pub const ALL: [DigestRole; 12] = [
        DigestRole::BoardChip,
        DigestRole::Waste,
        DigestRole::Held,
        DigestRole::PendingSource,
        DigestRole::PendingDest,
        DigestRole::Phase,
        DigestRole::ResumePhase,
        DigestRole::Turn,
        DigestRole::Register,
        DigestRole::Outcome,
        DigestRole::Revision,
        DigestRole::Variant,
    ];

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Dimensions of a board's digestable state. Determines table sizes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DigestLayout {
    /// Board cells, including light ones.
    pub cells: usize,
    /// Stack slots per cell with a drawn key. Taller stacks still digest;
    /// see [`DigestKeys::board_chip`].
    pub slots: usize,
    /// Distinct chip colours.
    pub colours: usize,
    pub players: usize,
    /// Registers per player.
    pub registers: usize,
    pub phases: usize,
}

impl DigestLayout {
    /// Cells addressable by a move: board, waste, and one rack per player.
    #[must_use]
    pub fn addressable(&self) -> usize {
        self.cells + 1 + self.players
    }

    /// Number of keys the given role needs.
    #[must_use]
    pub fn table_len(&self, role: DigestRole) -> usize {
        match role {
            DigestRole::BoardChip => self.cells * self.slots * self.colours,
            DigestRole::Waste | DigestRole::Held => self.colours,
            DigestRole::PendingSource | DigestRole::PendingDest => self.addressable(),
            DigestRole::Phase | DigestRole::ResumePhase => self.phases,
            DigestRole::Turn => self.players,
            DigestRole::Register => self.players * self.registers,
            // A winner per player plus the draw.
            DigestRole::Outcome => self.players + 1,
            DigestRole::Revision | DigestRole::Variant => 1,
        }
    }
}

/// Immutable key tables, built once per session and shared by every clone.
#[derive(Clone, Debug)]
pub struct DigestKeys {
    layout: DigestLayout,
    tables: Vec<Vec<u64>>,
}

impl DigestKeys {
    /// Draw all key tables for `layout`.
    #[must_use]
    pub fn new(layout: DigestLayout) -> Self {
        let tables = DigestRole::ALL
            .iter()
            .map(|&role| {
                let seed = DIGEST_SEED.wrapping_add((role.index() as u64 + 1).wrapping_mul(SEED_SPREAD));
                let mut stream = GameRng::new(seed);
                (0..layout.table_len(role))
                    .map(|_| stream.next_u64() | 1)
                    .collect()
            })
            .collect();

        Self { layout, tables }
    }

    #[must_use]
    pub fn layout(&self) -> &DigestLayout {
        &self.layout
    }

    /// Key for entry `index` of `role`'s table.
    ///
    /// # Panics
    ///
    /// If `index` is outside the table, which means the layout does not
    /// describe the board being digested.
    #[inline]
    #[must_use]
    pub fn key(&self, role: DigestRole, index: usize) -> u64 {
        self.tables[role.index()][index]
    }

    /// Key for a board chip of colour `colour` at `slot` of cell `cell`.
    ///
    /// Slots past the table reuse the cell's top key, stretched by the slot
    /// number, so they never reach into a neighbouring cell's keys.
    #[inline]
    #[must_use]
    pub fn board_chip(&self, cell: usize, slot: usize, colour: usize) -> u64 {
        let layout = &self.layout;
        let top = layout.slots - 1;
        let base = self.key(
            DigestRole::BoardChip,
            (cell * layout.slots + slot.min(top)) * layout.colours + colour,
        );
        if slot <= top {
            base
        } else {
            stretch(base ^ (slot as u64).wrapping_mul(SEED_SPREAD)) | 1
        }
    }
}

/// SplitMix64 finalizer.
const fn stretch(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
