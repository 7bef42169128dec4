//! Referee - plays out games with the real, random battle rules
//!
//! Search works on expected values. The referee is what actually happens:
//! every contested cell rolls its own battle.

use crate::ai::{fallback_move, AlphaBetaAI};
use crate::board::Coord;
use crate::combat::{overwhelms, simulate_battle};
use crate::game::{Faction, GameState, MoveSet, Species};
use crate::transition::{validate, TransitionError};
use rand::Rng;
use serde::Serialize;

/// Final result of a game
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum GameResult {
    Ongoing,
    VampiresWin,
    WerewolvesWin,
    Draw,
}

impl GameResult {
    pub fn winner(self) -> Option<Faction> {
        match self {
            GameResult::VampiresWin => Some(Faction::Vampire),
            GameResult::WerewolvesWin => Some(Faction::Werewolf),
            GameResult::Ongoing | GameResult::Draw => None,
        }
    }
}

/// One played turn
#[derive(Clone, Debug, Serialize)]
pub struct TurnRecord {
    pub faction: Faction,
    pub moves: MoveSet,
    /// Battles decided by dice this turn
    pub battles: u32,
}

/// Everything worth keeping about a finished game
#[derive(Clone, Debug, Serialize)]
pub struct GameRecord {
    pub result: GameResult,
    pub turns: u32,
    pub vampires: u64,
    pub werewolves: u64,
    pub vampire_nodes: u64,
    pub werewolf_nodes: u64,
    pub history: Vec<TurnRecord>,
}

impl GameRecord {
    pub fn winner(&self) -> Option<Faction> {
        self.result.winner()
    }
}

/// Result by elimination, `Ongoing` while both factions have units
pub fn game_result(state: &GameState) -> GameResult {
    let vampires = state.total(Species::Vampire);
    let werewolves = state.total(Species::Werewolf);
    match (vampires, werewolves) {
        (0, 0) => GameResult::Draw,
        (0, _) => GameResult::WerewolvesWin,
        (_, 0) => GameResult::VampiresWin,
        _ => GameResult::Ongoing,
    }
}

/// Result when the turn limit is hit: the larger population wins
fn result_on_time(state: &GameState) -> GameResult {
    let vampires = state.total(Species::Vampire);
    let werewolves = state.total(Species::Werewolf);
    match vampires.cmp(&werewolves) {
        std::cmp::Ordering::Greater => GameResult::VampiresWin,
        std::cmp::Ordering::Less => GameResult::WerewolvesWin,
        std::cmp::Ordering::Equal => GameResult::Draw,
    }
}

/// Resolve a submitted move set for `faction`.
///
/// All units leave their sources first, then moves into the same cell are
/// merged and each target is resolved once. Humans convert outright when
/// met with at least their number, enemies die outright against 1.5 times
/// their number; anything else is a random battle.
pub fn resolve_turn<R: Rng>(
    state: &GameState,
    faction: Faction,
    moves: &MoveSet,
    rng: &mut R,
) -> Result<(GameState, u32), TransitionError> {
    validate(state, moves, faction)?;

    let species = faction.species();
    let mut next = state.clone();

    // Arrivals per target in first-seen order, so a seeded game replays
    let mut arrivals: Vec<(Coord, u32)> = Vec::new();
    for mv in moves {
        if let Some(source) = next.cell_mut(mv.from) {
            let left = source.count(species) - mv.count;
            source.set_count(species, left);
        }
        match arrivals.iter_mut().find(|(to, _)| *to == mv.to) {
            Some((_, count)) => *count = (*count).saturating_add(mv.count),
            None => arrivals.push((mv.to, mv.count)),
        }
    }

    let mut battles = 0;
    for (to, count) in arrivals {
        if settle(&mut next, to, count, faction, rng) {
            battles += 1;
        }
    }

    Ok((next, battles))
}

/// Land `count` units of `faction` on `to`. True if dice were rolled.
fn settle<R: Rng>(state: &mut GameState, to: Coord, count: u32, faction: Faction, rng: &mut R) -> bool {
    let species = faction.species();
    let enemy_species = faction.opponent().species();

    let cell = match state.cell_mut(to) {
        Some(cell) => cell,
        None => return false,
    };
    let ours = cell.count(species);
    let enemies = cell.count(enemy_species);
    let humans = cell.humans;

    if enemies > 0 {
        if overwhelms(count, enemies) {
            cell.set_count(enemy_species, 0);
            cell.set_count(species, ours.saturating_add(count));
            return false;
        }
        let battle = simulate_battle(count, enemies, false, rng);
        cell.set_count(species, ours.saturating_add(battle.attackers));
        cell.set_count(enemy_species, battle.defenders);
        tracing::trace!("Battle at {}: {} vs {} -> {:?}", to, count, enemies, battle);
        true
    } else if humans > 0 {
        if count >= humans {
            cell.set_count(Species::Human, 0);
            cell.set_count(species, ours.saturating_add(count).saturating_add(humans));
            return false;
        }
        let battle = simulate_battle(count, humans, true, rng);
        cell.set_count(species, ours.saturating_add(battle.attackers));
        cell.set_count(Species::Human, battle.defenders);
        tracing::trace!("Camp raid at {}: {} vs {} -> {:?}", to, count, humans, battle);
        true
    } else {
        cell.set_count(species, ours.saturating_add(count));
        false
    }
}

/// Play a full game between two engines, Vampires moving first.
///
/// `initial` may be seen from either faction; each engine gets its own view
/// every turn. A turn is one faction's move, so `max_turns` bounds both
/// players together.
pub fn play_game<R: Rng>(
    initial: &GameState,
    vampires: &AlphaBetaAI,
    werewolves: &AlphaBetaAI,
    max_turns: u32,
    rng: &mut R,
) -> GameRecord {
    let mut board = initial.clone();
    let mut history = Vec::new();
    let mut nodes = [0u64; 2];
    let mut faction = Faction::Vampire;
    let mut result = game_result(&board);
    let mut turns = 0;

    while result == GameResult::Ongoing && turns < max_turns {
        let view = board.from_perspective(faction);
        let (engine, slot) = match faction {
            Faction::Vampire => (vampires, 0),
            Faction::Werewolf => (werewolves, 1),
        };

        let outcome = engine.search(&view);
        nodes[slot] += outcome.nodes;
        let mut moves = outcome.moves;
        if moves.is_empty() {
            moves = fallback_move(&view);
        }

        if moves.is_empty() {
            tracing::debug!("Turn {}: {:?} cannot move", turns + 1, faction);
        } else {
            let mut resolved = resolve_turn(&board, faction, &moves, rng);
            if let Err(e) = &resolved {
                tracing::warn!("Turn {}: {:?} submitted {} ({}), falling back", turns + 1, faction, moves, e);
                moves = fallback_move(&view);
                resolved = resolve_turn(&board, faction, &moves, rng);
            }
            match resolved {
                Ok((next, battles)) => {
                    board = next;
                    history.push(TurnRecord {
                        faction,
                        moves,
                        battles,
                    });
                }
                Err(e) => tracing::warn!("Turn {}: {:?} forfeits: {}", turns + 1, faction, e),
            }
        }

        turns += 1;
        faction = faction.opponent();
        result = game_result(&board);
    }

    if result == GameResult::Ongoing {
        result = result_on_time(&board);
    }

    tracing::debug!("Game over after {} turns: {:?}", turns, result);

    GameRecord {
        result,
        turns,
        vampires: board.total(Species::Vampire),
        werewolves: board.total(Species::Werewolf),
        vampire_nodes: nodes[0],
        werewolf_nodes: nodes[1],
        history,
    }
}
