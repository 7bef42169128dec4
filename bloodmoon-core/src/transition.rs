//! Applying a move set to a state
//!
//! Battles are resolved from expected values, so the same move set always
//! produces the same child state.

use crate::board::Coord;
use crate::combat::{expected_outcome, overwhelms};
use crate::game::{Faction, GameState, Move, MoveSet, Side, Species};
use rustc_hash::FxHashMap;

/// Reasons a move set is refused by [`try_apply_move_set`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("sides are not resolved")]
    SidesUnresolved,
    #[error("empty move set while units remain")]
    EmptyMoveSet,
    #[error("move {0} leaves the board")]
    OutOfBounds(Move),
    #[error("move {0} is not to an adjacent cell")]
    NotAdjacent(Move),
    #[error("move {0} relocates no units")]
    ZeroCount(Move),
    #[error("cell ({row},{col}) is both a source and a target")]
    SourceIsTarget { row: i32, col: i32 },
    #[error("cell ({row},{col}) holds {available} units, {requested} requested")]
    InsufficientUnits {
        row: i32,
        col: i32,
        requested: u64,
        available: u32,
    },
}

/// Apply `moves` for `side` to a copy of `state`.
///
/// A move set that uses a cell as both source and target is rejected as a
/// whole and the copy is returned unchanged. A move whose source no longer
/// holds enough units is skipped.
pub fn apply_move_set(state: &GameState, moves: &MoveSet, side: Side) -> GameState {
    let mut next = state.clone();
    let faction = match state.faction(side) {
        Some(f) => f,
        None => return next,
    };

    if let Some(cell) = moves.overlap() {
        tracing::debug!("Rejected move set {}: {} is source and target", moves, cell);
        return next;
    }

    resolve_moves(&mut next, moves, faction);
    next
}

/// Checked variant of [`apply_move_set`] for move sets that did not come
/// from the generator
pub fn try_apply_move_set(
    state: &GameState,
    moves: &MoveSet,
    side: Side,
) -> Result<GameState, TransitionError> {
    let faction = state.faction(side).ok_or(TransitionError::SidesUnresolved)?;
    validate(state, moves, faction)?;

    let mut next = state.clone();
    resolve_moves(&mut next, moves, faction);
    Ok(next)
}

/// Check every rule a submitted move set must satisfy
pub fn validate(state: &GameState, moves: &MoveSet, faction: Faction) -> Result<(), TransitionError> {
    let species = faction.species();

    if moves.is_empty() {
        if state.total(species) > 0 {
            return Err(TransitionError::EmptyMoveSet);
        }
        return Ok(());
    }

    let mut requested: FxHashMap<Coord, u64> = FxHashMap::default();
    for mv in moves {
        if !state.in_bounds(mv.from) || !state.in_bounds(mv.to) {
            return Err(TransitionError::OutOfBounds(*mv));
        }
        if !mv.from.is_adjacent(mv.to) {
            return Err(TransitionError::NotAdjacent(*mv));
        }
        if mv.count == 0 {
            return Err(TransitionError::ZeroCount(*mv));
        }
        *requested.entry(mv.from).or_insert(0) += u64::from(mv.count);
    }

    if let Some(cell) = moves.overlap() {
        return Err(TransitionError::SourceIsTarget {
            row: cell.row,
            col: cell.col,
        });
    }

    for (from, &count) in &requested {
        let available = state.cell(*from).map(|c| c.count(species)).unwrap_or(0);
        if count > u64::from(available) {
            return Err(TransitionError::InsufficientUnits {
                row: from.row,
                col: from.col,
                requested: count,
                available,
            });
        }
    }

    Ok(())
}

fn resolve_moves(state: &mut GameState, moves: &MoveSet, faction: Faction) {
    let species = faction.species();

    for mv in moves {
        let available = match state.cell(mv.from) {
            Some(cell) => cell.count(species),
            None => continue,
        };
        if available < mv.count || !state.in_bounds(mv.to) {
            tracing::debug!("Skipped stale move {} ({} available)", mv, available);
            continue;
        }
        if let Some(source) = state.cell_mut(mv.from) {
            source.set_count(species, available - mv.count);
        }
        arrive(state, mv.to, mv.count, faction);
    }
}

/// Resolve `count` units of `faction` entering `to`
fn arrive(state: &mut GameState, to: Coord, count: u32, faction: Faction) {
    let species = faction.species();
    let enemy_species = faction.opponent().species();

    let cell = match state.cell_mut(to) {
        Some(cell) => cell,
        None => return,
    };
    let ours = cell.count(species);
    let enemies = cell.count(enemy_species);
    let humans = cell.humans;

    if enemies > 0 {
        if overwhelms(count, enemies) {
            cell.set_count(enemy_species, 0);
            cell.set_count(species, ours.saturating_add(count));
        } else if overwhelms(enemies, count) {
            // Attackers are wiped out
        } else {
            let outcome = expected_outcome(count, enemies, false);
            cell.set_count(species, ours.saturating_add(outcome.attackers as u32));
            cell.set_count(enemy_species, outcome.defenders as u32);
        }
    } else if humans > 0 {
        if overwhelms(count, humans) {
            cell.set_count(Species::Human, 0);
            cell.set_count(species, ours.saturating_add(count).saturating_add(humans));
        } else {
            let outcome = expected_outcome(count, humans, true);
            cell.set_count(species, ours.saturating_add(outcome.attackers as u32));
            cell.set_count(Species::Human, outcome.defenders as u32);
        }
    } else {
        cell.set_count(species, ours.saturating_add(count));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board() -> GameState {
        let mut state = GameState::with_sides(10, 10, Faction::Vampire).unwrap();
        state.set_count(Coord::new(5, 5), Species::Vampire, 10).unwrap();
        state
    }

    fn mv(from: (i32, i32), to: (i32, i32), count: u32) -> Move {
        Move::new(Coord::new(from.0, from.1), Coord::new(to.0, to.1), count)
    }

    fn vampires(state: &GameState, row: i32, col: i32) -> u32 {
        state.count(Coord::new(row, col), Species::Vampire).unwrap()
    }

    #[test]
    fn test_empty_move_set_is_noop() {
        let state = board();
        assert_eq!(apply_move_set(&state, &MoveSet::default(), Side::Ours), state);
    }

    #[test]
    fn test_split_move() {
        let state = board();
        let next = apply_move_set(&state, &MoveSet::single(mv((5, 5), (5, 6), 5)), Side::Ours);
        assert_eq!(vampires(&next, 5, 5), 5);
        assert_eq!(vampires(&next, 5, 6), 5);
        assert_eq!(vampires(&state, 5, 5), 10, "input state must not change");
    }

    #[test]
    fn test_move_everything_to_empty_cell() {
        let mut state = board();
        state.set_count(Coord::new(0, 0), Species::Human, 3).unwrap();
        state.set_count(Coord::new(9, 9), Species::Werewolf, 4).unwrap();
        let next = apply_move_set(&state, &MoveSet::single(mv((5, 5), (4, 4), 10)), Side::Ours);
        assert_eq!(vampires(&next, 5, 5), 0);
        assert_eq!(vampires(&next, 4, 4), 10);
        for (coord, cell) in next.cells() {
            if coord != Coord::new(5, 5) && coord != Coord::new(4, 4) {
                assert_eq!(Some(cell), state.cell(coord));
            }
        }
    }

    #[test]
    fn test_overlap_rejects_whole_set() {
        let mut state = board();
        state.set_count(Coord::new(5, 6), Species::Vampire, 4).unwrap();
        let set = MoveSet::new(vec![mv((5, 5), (5, 6), 3), mv((5, 6), (5, 7), 2)]);
        assert_eq!(apply_move_set(&state, &set, Side::Ours), state);
    }

    #[test]
    fn test_insufficient_units_skipped() {
        let state = board();
        let set = MoveSet::new(vec![mv((5, 5), (4, 5), 11), mv((5, 5), (6, 5), 4)]);
        let next = apply_move_set(&state, &set, Side::Ours);
        assert_eq!(vampires(&next, 4, 5), 0);
        assert_eq!(vampires(&next, 6, 5), 4);
        assert_eq!(vampires(&next, 5, 5), 6);
    }

    #[test]
    fn test_friendly_merge() {
        let mut state = board();
        state.set_count(Coord::new(5, 6), Species::Vampire, 3).unwrap();
        let next = apply_move_set(&state, &MoveSet::single(mv((5, 5), (5, 6), 2)), Side::Ours);
        assert_eq!(vampires(&next, 5, 6), 5);
    }

    #[test]
    fn test_overwhelming_attack_on_enemy() {
        let mut state = board();
        state.set_count(Coord::new(5, 6), Species::Werewolf, 6).unwrap();
        let next = apply_move_set(&state, &MoveSet::single(mv((5, 5), (5, 6), 9)), Side::Ours);
        assert_eq!(vampires(&next, 5, 6), 9);
        assert_eq!(next.count(Coord::new(5, 6), Species::Werewolf), Ok(0));
    }

    #[test]
    fn test_hopeless_attack_on_enemy() {
        let mut state = board();
        state.set_count(Coord::new(5, 6), Species::Werewolf, 15).unwrap();
        let next = apply_move_set(&state, &MoveSet::single(mv((5, 5), (5, 6), 10)), Side::Ours);
        assert_eq!(vampires(&next, 5, 6), 0);
        assert_eq!(vampires(&next, 5, 5), 0);
        assert_eq!(next.count(Coord::new(5, 6), Species::Werewolf), Ok(15));
    }

    #[test]
    fn test_contested_attack_uses_expected_values() {
        let mut state = board();
        state.set_count(Coord::new(5, 6), Species::Werewolf, 5).unwrap();
        // p = 0.6: 6 * 0.6 * 0.6 = 2.16, 5 * 0.4 * 0.4 = 0.8
        let next = apply_move_set(&state, &MoveSet::single(mv((5, 5), (5, 6), 6)), Side::Ours);
        assert_eq!(vampires(&next, 5, 6), 2);
        assert_eq!(next.count(Coord::new(5, 6), Species::Werewolf), Ok(0));
    }

    #[test]
    fn test_human_conversion() {
        let mut state = board();
        state.set_count(Coord::new(4, 4), Species::Human, 4).unwrap();
        let next = apply_move_set(&state, &MoveSet::single(mv((5, 5), (4, 4), 6)), Side::Ours);
        assert_eq!(vampires(&next, 4, 4), 10);
        assert_eq!(next.count(Coord::new(4, 4), Species::Human), Ok(0));
    }

    #[test]
    fn test_contested_human_fight() {
        let mut state = board();
        state.set_count(Coord::new(4, 4), Species::Human, 4).unwrap();
        // p = 0.5: (2 + 2) * 0.5 = 2 converted survivors, 4 * 0.25 = 1 human
        let next = apply_move_set(&state, &MoveSet::single(mv((5, 5), (4, 4), 4)), Side::Ours);
        assert_eq!(vampires(&next, 4, 4), 2);
        assert_eq!(next.count(Coord::new(4, 4), Species::Human), Ok(1));
    }

    #[test]
    fn test_opponent_moves() {
        let mut state = board();
        state.set_count(Coord::new(0, 0), Species::Werewolf, 3).unwrap();
        let next = apply_move_set(&state, &MoveSet::single(mv((0, 0), (1, 1), 3)), Side::Theirs);
        assert_eq!(next.count(Coord::new(1, 1), Species::Werewolf), Ok(3));
        assert_eq!(vampires(&next, 5, 5), 10);
    }

    #[test]
    fn test_unresolved_sides_is_noop() {
        let mut state = GameState::new(3, 3).unwrap();
        state.set_count(Coord::new(1, 1), Species::Vampire, 3).unwrap();
        let next = apply_move_set(&state, &MoveSet::single(mv((1, 1), (1, 2), 1)), Side::Ours);
        assert_eq!(next, state);
    }

    #[test]
    fn test_strict_rejections() {
        let state = board();
        assert_eq!(
            try_apply_move_set(&state, &MoveSet::default(), Side::Ours),
            Err(TransitionError::EmptyMoveSet)
        );
        assert!(matches!(
            try_apply_move_set(&state, &MoveSet::single(mv((5, 5), (5, 7), 1)), Side::Ours),
            Err(TransitionError::NotAdjacent(_))
        ));
        assert!(matches!(
            try_apply_move_set(&state, &MoveSet::single(mv((5, 5), (5, 6), 0)), Side::Ours),
            Err(TransitionError::ZeroCount(_))
        ));
        let split = MoveSet::new(vec![mv((5, 5), (4, 5), 6), mv((5, 5), (6, 5), 6)]);
        assert_eq!(
            try_apply_move_set(&state, &split, Side::Ours),
            Err(TransitionError::InsufficientUnits {
                row: 5,
                col: 5,
                requested: 12,
                available: 10
            })
        );
        let chain = MoveSet::new(vec![mv((5, 5), (5, 6), 3), mv((5, 6), (5, 7), 1)]);
        assert_eq!(
            try_apply_move_set(&state, &chain, Side::Ours),
            Err(TransitionError::SourceIsTarget { row: 5, col: 6 })
        );
    }

    #[test]
    fn test_huge_counts_saturate() {
        let mut state = GameState::with_sides(3, 3, Faction::Vampire).unwrap();
        state.set_count(Coord::new(0, 0), Species::Vampire, 3_000_000_000).unwrap();
        state.set_count(Coord::new(0, 1), Species::Vampire, 3_000_000_000).unwrap();
        state.set_count(Coord::new(2, 2), Species::Werewolf, 1).unwrap();
        assert_eq!(state.side_total(Side::Ours), 6_000_000_000);

        let merge = MoveSet::single(mv((0, 0), (0, 1), 3_000_000_000));
        let next = apply_move_set(&state, &merge, Side::Ours);
        assert_eq!(vampires(&next, 0, 1), u32::MAX);
        assert_eq!(vampires(&next, 0, 0), 0);

        // Duplicate moves whose sum exceeds u32 are refused, not wrapped
        let doubled = MoveSet::new(vec![
            mv((0, 0), (1, 0), 3_000_000_000),
            mv((0, 0), (1, 1), 3_000_000_000),
        ]);
        assert!(matches!(
            try_apply_move_set(&state, &doubled, Side::Ours),
            Err(TransitionError::InsufficientUnits { requested: 6_000_000_000, .. })
        ));
    }

    #[test]
    fn test_strict_accepts_multi_source() {
        let mut state = board();
        state.set_count(Coord::new(0, 0), Species::Vampire, 2).unwrap();
        let set = MoveSet::new(vec![mv((5, 5), (6, 6), 10), mv((0, 0), (0, 1), 2)]);
        let next = try_apply_move_set(&state, &set, Side::Ours).unwrap();
        assert_eq!(vampires(&next, 6, 6), 10);
        assert_eq!(vampires(&next, 0, 1), 2);
    }
}
