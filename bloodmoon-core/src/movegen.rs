//! Move-set generation
//!
//! One move set per (group, direction, split size). Only single-source move
//! sets are produced: combining several groups in one turn multiplies the
//! branching factor past what the search can afford.

use crate::board::Coord;
use crate::combat::win_probability;
use crate::game::{GameState, Move, MoveSet, Side};

/// Minimum win probability for an attack on a human camp
pub const NEUTRAL_CONFIDENCE: f64 = 0.70;

/// Generator output for one side
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Candidates {
    /// Identity unresolved or the side has no units
    Unavailable,
    /// The side has units but no legal target
    Stalled,
    /// At least one legal move set
    Moves(Vec<MoveSet>),
}

impl Candidates {
    /// The move sets, empty for `Unavailable` and `Stalled`
    pub fn into_move_sets(self) -> Vec<MoveSet> {
        match self {
            Candidates::Moves(sets) => sets,
            Candidates::Unavailable | Candidates::Stalled => Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Candidates::Moves(sets) => sets.len(),
            Candidates::Unavailable | Candidates::Stalled => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Split sizes tried from a group of `count`: all, 3/4, 1/2, 1/4 and 1,
/// floored, at least 1, deduplicated, largest first
pub fn candidate_counts(count: u32) -> Vec<u32> {
    if count == 0 {
        return Vec::new();
    }
    let wide = u64::from(count);
    let mut counts = vec![
        count,
        ((wide * 3 / 4) as u32).max(1),
        (count / 2).max(1),
        (count / 4).max(1),
        1,
    ];
    counts.sort_unstable_by(|a, b| b.cmp(a));
    counts.dedup();
    counts
}

/// All moves out of `from` with `count` units of the mover
pub fn moves_from_cell(state: &GameState, from: Coord, count: u32) -> Vec<Move> {
    let mut moves = Vec::new();
    let counts = candidate_counts(count);

    for to in from.neighbors(state.rows(), state.cols()) {
        let humans = state.cell(to).map(|c| c.humans).unwrap_or(0);

        for &amount in &counts {
            // Coin-flip fights against humans are never worth offering
            if humans > 0 {
                let p = win_probability(amount, humans);
                if p < NEUTRAL_CONFIDENCE {
                    tracing::trace!(
                        "Filtered {} vs {} humans at {} (p={:.2})",
                        amount,
                        humans,
                        to,
                        p
                    );
                    continue;
                }
            }
            moves.push(Move::new(from, to, amount));
        }
    }

    moves
}

/// Generate every candidate move set for `side`
pub fn generate_move_sets(state: &GameState, side: Side) -> Candidates {
    let groups = state.groups(side);
    if groups.is_empty() {
        return Candidates::Unavailable;
    }

    let sets: Vec<MoveSet> = groups
        .iter()
        .flat_map(|g| moves_from_cell(state, g.coord, g.count))
        .map(MoveSet::single)
        .collect();

    if sets.is_empty() {
        Candidates::Stalled
    } else {
        Candidates::Moves(sets)
    }
}
