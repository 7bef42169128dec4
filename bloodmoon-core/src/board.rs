//! Grid geometry with (row, col) coordinates

use serde::{Deserialize, Serialize};

/// Grid coordinate. Row grows downwards, column grows to the right.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    pub row: i32,
    pub col: i32,
}

impl Coord {
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// Check if this coordinate lies on a `rows` x `cols` grid
    pub fn in_bounds(&self, rows: usize, cols: usize) -> bool {
        self.row >= 0 && self.col >= 0 && (self.row as usize) < rows && (self.col as usize) < cols
    }

    /// Manhattan distance between two cells
    pub fn manhattan(&self, other: Coord) -> i32 {
        (self.row - other.row).abs() + (self.col - other.col).abs()
    }

    /// Chebyshev (king-move) distance between two cells
    pub fn chebyshev(&self, other: Coord) -> i32 {
        (self.row - other.row).abs().max((self.col - other.col).abs())
    }

    /// True if `other` is one of the 8 surrounding cells
    pub fn is_adjacent(&self, other: Coord) -> bool {
        self.chebyshev(other) == 1
    }

    /// Get neighbor in direction (0-7)
    pub fn neighbor(&self, direction: u8) -> Coord {
        let (dr, dc) = DIRECTIONS[direction as usize % 8];
        Coord::new(self.row + dr, self.col + dc)
    }

    /// All in-bounds neighbors, in direction order
    pub fn neighbors(self, rows: usize, cols: usize) -> impl Iterator<Item = Coord> {
        (0..8u8)
            .map(move |d| self.neighbor(d))
            .filter(move |c| c.in_bounds(rows, cols))
    }
}

impl std::fmt::Display for Coord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{})", self.row, self.col)
    }
}

/// Direction vectors (d_row, d_col)
/// Index: 0=N, 1=NE, 2=E, 3=SE, 4=S, 5=SW, 6=W, 7=NW
pub const DIRECTIONS: [(i32, i32); 8] = [
    (-1, 0),  // N
    (-1, 1),  // NE
    (0, 1),   // E
    (1, 1),   // SE
    (1, 0),   // S
    (1, -1),  // SW
    (0, -1),  // W
    (-1, -1), // NW
];
