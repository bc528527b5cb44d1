//! Board geometry: dark squares, directions, spans.
//!
//! Directions are listed clockwise starting at forward-left, relative to the
//! moving player. The first three are the forward directions. Odd entries are
//! orthogonal: one orthogonal step crosses a light square and lands two cells
//! away, costing 2 towards the span.

use smallvec::SmallVec;

use crate::core::{Coord, PlayerId};

/// One of the 8 movement directions for White. Black uses the negation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Direction {
    pub dc: i8,
    pub dr: i8,
}

impl Direction {
    const fn new(dc: i8, dr: i8) -> Self {
        Self { dc, dr }
    }

    #[must_use]
    pub const fn is_orthogonal(self) -> bool {
        self.dc == 0 || self.dr == 0
    }

    /// This direction as seen by `player`.
    #[must_use]
    pub const fn for_player(self, player: PlayerId) -> Self {
        if player.0 == 0 {
            self
        } else {
            Self::new(-self.dc, -self.dr)
        }
    }
}

pub const DIRECTIONS: [Direction; 8] = [
    Direction::new(-1, 1),  // forward-left
    Direction::new(0, 1),   // forward
    Direction::new(1, 1),   // forward-right
    Direction::new(1, 0),   // right
    Direction::new(1, -1),  // back-right
    Direction::new(0, -1),  // back
    Direction::new(-1, -1), // back-left
    Direction::new(-1, 0),  // left
];

/// Entries of [`DIRECTIONS`] that point forward.
pub const FORWARD_COUNT: usize = 3;

/// A square that a stack can reach, and the span it costs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Reach {
    pub to: Coord,
    pub span: u8,
    pub forward: bool,
}

/// Square board of `size × size` cells, A1 dark.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Grid {
    size: u8,
}

impl Grid {
    #[must_use]
    pub const fn new(size: u8) -> Self {
        Self { size }
    }

    #[must_use]
    pub const fn size(self) -> u8 {
        self.size
    }

    /// Cells including light ones.
    #[must_use]
    pub const fn cell_count(self) -> usize {
        self.size as usize * self.size as usize
    }

    #[must_use]
    pub fn contains(self, coord: Coord) -> bool {
        coord.col < self.size && coord.row < self.size
    }

    #[must_use]
    pub const fn is_dark(self, coord: Coord) -> bool {
        (coord.col + coord.row) % 2 == 0
    }

    /// Row-major index.
    #[must_use]
    pub const fn index(self, coord: Coord) -> usize {
        coord.row as usize * self.size as usize + coord.col as usize
    }

    #[must_use]
    pub const fn coord(self, index: usize) -> Coord {
        Coord::new(
            (index % self.size as usize) as u8,
            (index / self.size as usize) as u8,
        )
    }

    /// Dark squares in row-major order.
    pub fn dark_cells(self) -> impl Iterator<Item = Coord> {
        (0..self.cell_count())
            .map(move |i| self.coord(i))
            .filter(move |&c| self.is_dark(c))
    }

    /// One single-cell step, or `None` off the board.
    #[must_use]
    pub fn step(self, from: Coord, dir: Direction) -> Option<Coord> {
        let col = i16::from(from.col) + i16::from(dir.dc);
        let row = i16::from(from.row) + i16::from(dir.dr);
        let limit = i16::from(self.size);
        if (0..limit).contains(&col) && (0..limit).contains(&row) {
            Some(Coord::new(col as u8, row as u8))
        } else {
            None
        }
    }

    /// Rows `player` has advanced from their home edge.
    #[must_use]
    pub const fn advancement(self, coord: Coord, player: PlayerId) -> u32 {
        if player.0 == 0 {
            coord.row as u32
        } else {
            (self.size - 1 - coord.row) as u32
        }
    }

    /// Point reflection through the board centre.
    #[must_use]
    pub const fn reflect(self, coord: Coord) -> Coord {
        Coord::new(self.size - 1 - coord.col, self.size - 1 - coord.row)
    }

    /// Fewest single-cell steps off the board along `player`'s forward
    /// directions, counting the step that leaves the board.
    #[must_use]
    pub fn distance_to_edge(self, from: Coord, player: PlayerId) -> u8 {
        DIRECTIONS[..FORWARD_COUNT]
            .iter()
            .map(|&dir| {
                let dir = dir.for_player(player);
                let mut steps = 1;
                let mut at = from;
                while let Some(next) = self.step(at, dir) {
                    at = next;
                    steps += 1;
                }
                steps
            })
            .min()
            .unwrap_or(u8::MAX)
    }

    /// Every square a stack of `height` owned by `player` can reach from
    /// `from`, ignoring what occupies them.
    pub fn reaches(self, from: Coord, height: usize, player: PlayerId) -> SmallVec<[Reach; 24]> {
        let mut out = SmallVec::new();
        for (i, &dir) in DIRECTIONS.iter().enumerate() {
            let dir = dir.for_player(player);
            let stride: u8 = if dir.is_orthogonal() { 2 } else { 1 };
            let mut at = from;
            let mut span: u8 = 0;
            'walk: loop {
                for _ in 0..stride {
                    match self.step(at, dir) {
                        Some(next) => at = next,
                        None => break 'walk,
                    }
                }
                span += stride;
                if usize::from(span) > height {
                    break;
                }
                out.push(Reach {
                    to: at,
                    span,
                    forward: i < FORWARD_COUNT,
                });
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: PlayerId = PlayerId::new(0);
    const BLACK: PlayerId = PlayerId::new(1);

    #[test]
    fn test_dark_squares() {
        let grid = Grid::new(8);
        assert!(grid.is_dark(Coord::new(0, 0))); // A1
        assert!(grid.is_dark(Coord::new(2, 0))); // C1
        assert!(grid.is_dark(Coord::new(3, 7))); // D8
        assert!(!grid.is_dark(Coord::new(1, 0))); // B1
        assert_eq!(grid.dark_cells().count(), 32);
        assert_eq!(Grid::new(10).dark_cells().count(), 50);
    }

    #[test]
    fn test_index_roundtrip() {
        let grid = Grid::new(10);
        for i in 0..grid.cell_count() {
            assert_eq!(grid.index(grid.coord(i)), i);
        }
    }

    #[test]
    fn test_reflection_keeps_dark() {
        let grid = Grid::new(8);
        for c in grid.dark_cells() {
            assert!(grid.is_dark(grid.reflect(c)));
        }
        assert_eq!(grid.reflect(Coord::new(2, 0)), Coord::new(5, 7));
    }

    #[test]
    fn test_single_chip_reach() {
        let grid = Grid::new(8);
        // C1 height 1: only the two diagonal neighbours, forward and back.
        let reach = grid.reaches(Coord::new(2, 0), 1, WHITE);
        let targets: Vec<_> = reach.iter().map(|r| (r.to, r.forward)).collect();
        assert_eq!(
            targets,
            vec![(Coord::new(1, 1), true), (Coord::new(3, 1), true)]
        );
    }

    #[test]
    fn test_orthogonal_costs_two() {
        let grid = Grid::new(8);
        let reach = grid.reaches(Coord::new(2, 0), 2, WHITE);
        let forward = reach
            .iter()
            .find(|r| r.to == Coord::new(2, 2))
            .copied()
            .unwrap();
        assert_eq!(forward.span, 2);
        assert!(forward.forward);
        // Diagonal at span 2 also reachable.
        assert!(reach.iter().any(|r| r.to == Coord::new(4, 2) && r.span == 2));
        // Every target stays on a dark square.
        assert!(reach.iter().all(|r| grid.is_dark(r.to)));
    }

    #[test]
    fn test_black_moves_down() {
        let grid = Grid::new(8);
        let reach = grid.reaches(Coord::new(3, 7), 1, BLACK);
        assert!(reach.iter().all(|r| r.to.row == 6 && r.forward));
        assert_eq!(reach.len(), 2);
    }

    #[test]
    fn test_distance_to_edge() {
        let grid = Grid::new(8);
        // On the far row one step leaves the board.
        assert_eq!(grid.distance_to_edge(Coord::new(2, 7), WHITE), 1);
        // A1: forward-left leaves immediately.
        assert_eq!(grid.distance_to_edge(Coord::new(0, 0), WHITE), 1);
        // C1: forward-left walks B2, A3 then off.
        assert_eq!(grid.distance_to_edge(Coord::new(2, 0), WHITE), 3);
        assert_eq!(grid.distance_to_edge(Coord::new(3, 7), BLACK), 4);
    }

    #[test]
    fn test_advancement() {
        let grid = Grid::new(8);
        assert_eq!(grid.advancement(Coord::new(2, 0), WHITE), 0);
        assert_eq!(grid.advancement(Coord::new(2, 6), WHITE), 6);
        assert_eq!(grid.advancement(Coord::new(3, 7), BLACK), 0);
        assert_eq!(grid.advancement(Coord::new(3, 1), BLACK), 6);
    }
}
