//! Seats and per-seat storage.
//!
//! A [`PlayerId`] is a 0-based seat. On the wire it is written `P<n>`.
//! [`PlayerMap`] holds one value per seat; boards keep their registers and
//! racks in one, searches their per-player rewards.

use std::fmt;
use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

/// A seat at the table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub u8);

impl PlayerId {
    #[must_use]
    pub const fn new(seat: u8) -> Self {
        Self(seat)
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// The seat that moves after this one.
    #[must_use]
    pub const fn next(self, player_count: usize) -> Self {
        Self(((self.0 as usize + 1) % player_count) as u8)
    }

    /// Seats `P0..P<player_count - 1>` in turn order.
    ///
    /// ```
    /// use rust_dipole::core::PlayerId;
    ///
    /// let seats: Vec<String> = PlayerId::all(2).map(|p| p.to_string()).collect();
    /// assert_eq!(seats, ["P0", "P1"]);
    /// ```
    pub fn all(player_count: usize) -> impl Iterator<Item = PlayerId> {
        (0..player_count).map(|seat| PlayerId(seat as u8))
    }

    /// Reads a `P<n>` token; the prefix may be lower case.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        let digits = token.strip_prefix(|c: char| c == 'P' || c == 'p')?;
        digits.parse().ok().map(PlayerId)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// One `T` per seat, indexed by [`PlayerId`].
///
/// ```
/// use rust_dipole::core::{PlayerId, PlayerMap};
///
/// let mut chips: PlayerMap<u32> = PlayerMap::with_value(2, 12);
/// chips[PlayerId::new(1)] -= 3;
/// assert_eq!(chips[PlayerId::new(1)], 9);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerMap<T> {
    seats: Vec<T>,
}

impl<T> PlayerMap<T> {
    /// Fills every seat from `init`.
    ///
    /// # Panics
    ///
    /// If `player_count` is zero or above 255.
    pub fn new(player_count: usize, init: impl Fn(PlayerId) -> T) -> Self {
        assert!(
            (1..=255).contains(&player_count),
            "player count {player_count} out of range 1..=255"
        );
        Self {
            seats: PlayerId::all(player_count).map(init).collect(),
        }
    }

    pub fn with_value(player_count: usize, value: T) -> Self
    where
        T: Clone,
    {
        Self::new(player_count, |_| value.clone())
    }

    pub fn with_default(player_count: usize) -> Self
    where
        T: Default,
    {
        Self::new(player_count, |_| T::default())
    }

    /// Seats in turn order with their values.
    pub fn iter(&self) -> impl Iterator<Item = (PlayerId, &T)> {
        PlayerId::all(self.seats.len()).zip(&self.seats)
    }
}

impl<T> Index<PlayerId> for PlayerMap<T> {
    type Output = T;

    fn index(&self, player: PlayerId) -> &T {
        &self.seats[player.index()]
    }
}

impl<T> IndexMut<PlayerId> for PlayerMap<T> {
    fn index_mut(&mut self, player: PlayerId) -> &mut T {
        &mut self.seats[player.index()]
    }
}
