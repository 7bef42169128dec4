//! Wire order for moves
//!
//! The arbiter speaks columns first: `(col_from, row_from, count, col_to,
//! row_to)`. The engine works in (row, col), so the transposition happens
//! here and nowhere else.

use bloodmoon_core::{Move, MoveSet};
use serde::Serialize;

/// One move as the arbiter expects it
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct WireMove {
    pub col_from: i32,
    pub row_from: i32,
    pub count: u32,
    pub col_to: i32,
    pub row_to: i32,
}

impl From<Move> for WireMove {
    fn from(mv: Move) -> Self {
        Self {
            col_from: mv.from.col,
            row_from: mv.from.row,
            count: mv.count,
            col_to: mv.to.col,
            row_to: mv.to.row,
        }
    }
}

impl WireMove {
    pub fn as_tuple(&self) -> (i32, i32, u32, i32, i32) {
        (self.col_from, self.row_from, self.count, self.col_to, self.row_to)
    }
}

/// Whole move set in wire order
pub fn to_wire(moves: &MoveSet) -> Vec<WireMove> {
    moves.iter().copied().map(WireMove::from).collect()
}

/// Space-separated text form, one move per line
pub fn format_wire(moves: &MoveSet) -> String {
    to_wire(moves)
        .iter()
        .map(|w| {
            let (a, b, c, d, e) = w.as_tuple();
            format!("{} {} {} {} {}", a, b, c, d, e)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
