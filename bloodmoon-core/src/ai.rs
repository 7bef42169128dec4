//! Time-bounded alpha-beta AI
//!
//! Iterative deepening over single-source move sets. Every node visit checks
//! the wall clock; once the budget is spent the running depth is thrown away
//! and the best move set of the last completed depth is returned.

use std::time::{Duration, Instant};

use crate::config::SearchConfig;
use crate::eval::evaluate;
use crate::game::{GameState, Move, MoveSet, Side};
use crate::movegen::{generate_move_sets, Candidates};
use crate::transition::apply_move_set;

// ============================================================================
// BUDGET
// ============================================================================

/// Wall-clock budget measured from construction
#[derive(Clone, Copy, Debug)]
pub struct Deadline {
    start: Instant,
    budget: Duration,
}

impl Deadline {
    pub fn new(budget: Duration) -> Self {
        Self {
            start: Instant::now(),
            budget,
        }
    }

    #[inline]
    pub fn expired(&self) -> bool {
        self.start.elapsed() >= self.budget
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

/// The budget ran out mid-pass. Not an error: it unwinds the running depth.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Expired;

/// Score of a subtree, or the news that the pass was abandoned
type Scored = Result<f64, Expired>;

// ============================================================================
// ALPHA-BETA AI
// ============================================================================

/// Result of one search
#[derive(Clone, Debug)]
pub struct SearchOutcome {
    /// Chosen move set; empty only when we have no legal move
    pub moves: MoveSet,
    /// Score of `moves` at `completed_depth`, `None` if no pass finished
    pub score: Option<f64>,
    /// Deepest fully searched depth
    pub completed_depth: u32,
    /// Nodes visited across all passes
    pub nodes: u64,
    pub elapsed: Duration,
}

/// Alpha-Beta AI player
#[derive(Clone, Debug, Default)]
pub struct AlphaBetaAI {
    config: SearchConfig,
}

impl AlphaBetaAI {
    pub fn new(config: SearchConfig) -> Self {
        Self { config }
    }

    /// Default heuristics, given depth and budget
    pub fn with_limits(max_depth: u32, time_budget: Duration) -> Self {
        Self::new(SearchConfig::new(max_depth, time_budget))
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Best move set for our side
    pub fn compute_move(&self, state: &GameState) -> MoveSet {
        self.search(state).moves
    }

    /// Evaluate a position from our side
    pub fn evaluate(&self, state: &GameState) -> f64 {
        evaluate(state, Side::Ours, &self.config.heuristics)
    }

    /// Run iterative deepening and report what was found
    pub fn search(&self, state: &GameState) -> SearchOutcome {
        let mut search = Search {
            config: &self.config,
            deadline: Deadline::new(self.config.time_budget()),
            nodes: 0,
        };

        let root_moves = generate_move_sets(state, Side::Ours).into_move_sets();
        if root_moves.is_empty() {
            tracing::debug!("No legal move sets at root");
            return SearchOutcome {
                moves: MoveSet::default(),
                score: None,
                completed_depth: 0,
                nodes: 0,
                elapsed: search.deadline.elapsed(),
            };
        }

        let mut best: Option<(usize, f64)> = None;
        let mut completed_depth = 0;

        for depth in 1..=self.config.max_depth.max(1) {
            let pass = search.root(state, depth, &root_moves);

            if pass.expired {
                // Only the very first pass may be trusted partially
                if completed_depth == 0 {
                    best = pass.best;
                }
                tracing::debug!("Depth {} abandoned after {} nodes", depth, search.nodes);
                break;
            }

            best = pass.best;
            completed_depth = depth;
            if let Some((_, value)) = best {
                tracing::debug!("Depth {}: value={:.2}, nodes={}", depth, value, search.nodes);
            }
        }

        let (moves, score) = match best {
            Some((index, value)) => (root_moves[index].clone(), Some(value)),
            None => {
                tracing::warn!("Budget spent before any root move was scored");
                (root_moves[0].clone(), None)
            }
        };

        let elapsed = search.deadline.elapsed();
        tracing::debug!(
            "Search complete: depth={}, nodes={}, time={:.3}s, moves={}",
            completed_depth,
            search.nodes,
            elapsed.as_secs_f64(),
            moves
        );

        SearchOutcome {
            moves,
            score: if completed_depth > 0 { score } else { None },
            completed_depth,
            nodes: search.nodes,
            elapsed,
        }
    }
}

// ============================================================================
// ALPHA-BETA
// ============================================================================

/// Best root candidate of one pass
struct RootPass {
    best: Option<(usize, f64)>,
    expired: bool,
}

/// State of one search call
struct Search<'a> {
    config: &'a SearchConfig,
    deadline: Deadline,
    nodes: u64,
}

impl Search<'_> {
    fn root(&mut self, state: &GameState, depth: u32, moves: &[MoveSet]) -> RootPass {
        let mut alpha = f64::NEG_INFINITY;
        let beta = f64::INFINITY;
        let mut best: Option<(usize, f64)> = None;

        for (index, set) in moves.iter().enumerate() {
            if self.deadline.expired() {
                return RootPass { best, expired: true };
            }

            let child = apply_move_set(state, set, Side::Ours);
            let value = match self.alpha_beta(&child, depth - 1, alpha, beta, Side::Theirs) {
                Ok(v) => v,
                Err(Expired) => return RootPass { best, expired: true },
            };

            if best.map_or(true, |(_, b)| value > b) {
                best = Some((index, value));
            }
            alpha = alpha.max(value);
        }

        RootPass {
            best,
            expired: false,
        }
    }

    fn alpha_beta(
        &mut self,
        state: &GameState,
        depth: u32,
        mut alpha: f64,
        mut beta: f64,
        to_move: Side,
    ) -> Scored {
        self.nodes += 1;

        if self.deadline.expired() {
            return Err(Expired);
        }

        if depth == 0 || state.is_terminal() {
            return Ok(self.evaluate(state));
        }

        let moves = match generate_move_sets(state, to_move) {
            Candidates::Moves(sets) => sets,
            Candidates::Unavailable | Candidates::Stalled => return Ok(self.evaluate(state)),
        };

        match to_move {
            Side::Ours => {
                let mut value = f64::NEG_INFINITY;
                for set in &moves {
                    let child = apply_move_set(state, set, Side::Ours);
                    value = value.max(self.alpha_beta(&child, depth - 1, alpha, beta, Side::Theirs)?);
                    alpha = alpha.max(value);
                    if beta <= alpha {
                        break; // Beta cutoff
                    }
                }
                Ok(value)
            }
            Side::Theirs => {
                let mut value = f64::INFINITY;
                for set in &moves {
                    let child = apply_move_set(state, set, Side::Theirs);
                    value = value.min(self.alpha_beta(&child, depth - 1, alpha, beta, Side::Ours)?);
                    beta = beta.min(value);
                    if beta <= alpha {
                        break; // Alpha cutoff
                    }
                }
                Ok(value)
            }
        }
    }

    fn evaluate(&self, state: &GameState) -> f64 {
        evaluate(state, Side::Ours, &self.config.heuristics)
    }
}

// ============================================================================
// FALLBACK
// ============================================================================

/// Half of our largest group (at least one unit) to its first neighbor.
/// Empty if we have no units or nowhere to go.
pub fn fallback_move(state: &GameState) -> MoveSet {
    let largest = state
        .groups(Side::Ours)
        .into_iter()
        .max_by_key(|g| g.count);

    let group = match largest {
        Some(g) => g,
        None => return MoveSet::default(),
    };

    match group.coord.neighbors(state.rows(), state.cols()).next() {
        Some(to) => MoveSet::single(Move::new(group.coord, to, (group.count / 2).max(1))),
        None => MoveSet::default(),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Coord;
    use crate::eval::Heuristics;
    use crate::game::{Faction, Species};
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn skirmish() -> GameState {
        let mut state = GameState::with_sides(10, 10, Faction::Vampire).unwrap();
        state.set_count(Coord::new(5, 5), Species::Vampire, 10).unwrap();
        state.set_count(Coord::new(7, 7), Species::Werewolf, 8).unwrap();
        state.set_count(Coord::new(3, 3), Species::Human, 5).unwrap();
        state
    }

    fn ample() -> Duration {
        Duration::from_secs(30)
    }

    /// Plain minimax without pruning, same leaves and move order
    fn minimax(state: &GameState, depth: u32, to_move: Side, h: &Heuristics) -> f64 {
        if depth == 0 || state.is_terminal() {
            return evaluate(state, Side::Ours, h);
        }
        let sets = match generate_move_sets(state, to_move) {
            Candidates::Moves(sets) => sets,
            _ => return evaluate(state, Side::Ours, h),
        };
        let values = sets
            .iter()
            .map(|set| minimax(&apply_move_set(state, set, to_move), depth - 1, to_move.opponent(), h));
        match to_move {
            Side::Ours => values.fold(f64::NEG_INFINITY, f64::max),
            Side::Theirs => values.fold(f64::INFINITY, f64::min),
        }
    }

    /// Value of playing `set` at the root, looking `depth` plies ahead
    fn root_value(state: &GameState, set: &MoveSet, depth: u32, h: &Heuristics) -> f64 {
        minimax(&apply_move_set(state, set, Side::Ours), depth - 1, Side::Theirs, h)
    }

    /// Small board with one or two groups a side and a human camp
    fn random_position(rng: &mut ChaCha8Rng) -> GameState {
        let mut state = GameState::with_sides(5, 5, Faction::Vampire).unwrap();
        for species in [Species::Vampire, Species::Werewolf, Species::Human] {
            let groups = if species == Species::Human { 1 } else { rng.gen_range(1..=2) };
            for _ in 0..groups {
                let coord = Coord::new(rng.gen_range(0..5), rng.gen_range(0..5));
                if state.cell(coord).map_or(false, |c| !c.is_empty()) {
                    continue;
                }
                state.set_count(coord, species, rng.gen_range(1..=8)).unwrap();
            }
        }
        state
    }

    #[test]
    fn test_ai_returns_move() {
        let ai = AlphaBetaAI::with_limits(2, ample());
        let outcome = ai.search(&skirmish());
        assert_eq!(outcome.moves.len(), 1);
        assert_eq!(outcome.completed_depth, 2);
        assert!(outcome.score.is_some());
        assert!(outcome.nodes > 0);
    }

    #[test]
    fn test_only_move_is_returned() {
        // One vampire in a 1x2 corridor has exactly one move set
        let mut state = GameState::with_sides(1, 2, Faction::Vampire).unwrap();
        state.set_count(Coord::new(0, 0), Species::Vampire, 1).unwrap();
        state.set_count(Coord::new(0, 1), Species::Werewolf, 1).unwrap();
        let expected = MoveSet::single(Move::new(Coord::new(0, 0), Coord::new(0, 1), 1));

        for depth in 1..=4 {
            let ai = AlphaBetaAI::with_limits(depth, Duration::from_millis(200));
            assert_eq!(ai.compute_move(&state), expected);
        }
    }

    #[test]
    fn test_zero_budget_still_moves() {
        let ai = AlphaBetaAI::with_limits(4, Duration::ZERO);
        let outcome = ai.search(&skirmish());
        assert_eq!(outcome.moves.len(), 1);
        assert_eq!(outcome.completed_depth, 0);
        assert!(outcome.score.is_none());
    }

    #[test]
    fn test_no_units_returns_empty() {
        let mut state = GameState::with_sides(5, 5, Faction::Vampire).unwrap();
        state.set_count(Coord::new(2, 2), Species::Werewolf, 4).unwrap();
        let ai = AlphaBetaAI::with_limits(3, ample());
        assert!(ai.compute_move(&state).is_empty());
    }

    #[test]
    fn test_unresolved_identity_returns_empty() {
        let mut state = GameState::new(5, 5).unwrap();
        state.set_count(Coord::new(2, 2), Species::Vampire, 4).unwrap();
        assert!(AlphaBetaAI::default().compute_move(&state).is_empty());
    }

    #[test]
    fn test_deeper_search_visits_more_nodes() {
        let state = skirmish();
        let mut last = 0;
        for depth in 1..=3 {
            let outcome = AlphaBetaAI::with_limits(depth, ample()).search(&state);
            assert_eq!(outcome.completed_depth, depth);
            assert!(outcome.nodes >= last, "depth {} visited fewer nodes", depth);
            last = outcome.nodes;
        }
    }

    #[test]
    fn test_search_is_deterministic() {
        let state = skirmish();
        let ai = AlphaBetaAI::with_limits(3, ample());
        let a = ai.search(&state);
        let b = ai.search(&state);
        assert_eq!(a.moves, b.moves);
        assert_eq!(a.score, b.score);
        assert_eq!(a.nodes, b.nodes);
    }

    #[test]
    fn test_takes_free_capture() {
        // 12 vampires next to 3 werewolves: capturing ends the game
        let mut state = GameState::with_sides(6, 6, Faction::Vampire).unwrap();
        state.set_count(Coord::new(2, 2), Species::Vampire, 12).unwrap();
        state.set_count(Coord::new(2, 3), Species::Werewolf, 3).unwrap();
        let outcome = AlphaBetaAI::with_limits(2, ample()).search(&state);
        let mv = outcome.moves.moves()[0];
        assert_eq!(mv.to, Coord::new(2, 3));
        assert!(mv.count >= 5);
        assert_eq!(outcome.score, Some(crate::eval::WIN_VALUE));
    }

    #[test]
    fn test_search_leaves_input_untouched() {
        let state = skirmish();
        let before = state.clone();
        AlphaBetaAI::with_limits(3, ample()).search(&state);
        assert_eq!(state, before);
    }

    #[test]
    fn test_pruning_keeps_minimax_value() {
        let h = Heuristics::default();
        let mut rng = ChaCha8Rng::seed_from_u64(31);
        let mut checked = 0;
        while checked < 30 {
            let state = random_position(&mut rng);
            if state.is_terminal() {
                continue;
            }
            let depth = if checked < 20 { 2 } else { 3 };
            let outcome = AlphaBetaAI::with_limits(depth, ample()).search(&state);
            let score = match outcome.score {
                Some(s) => s,
                None => continue,
            };
            assert_eq!(outcome.completed_depth, depth);

            let exact = minimax(&state, depth, Side::Ours, &h);
            assert!((score - exact).abs() < 1e-6, "depth {}: {} vs {} on {}", depth, score, exact, state);
            // The reported score belongs to the returned move
            let chosen = root_value(&state, &outcome.moves, depth, &h);
            assert!((chosen - exact).abs() < 1e-6);
            checked += 1;
        }
    }

    #[test]
    fn test_deeper_pass_never_ranks_worse() {
        let h = Heuristics::default();
        let mut rng = ChaCha8Rng::seed_from_u64(47);
        for _ in 0..15 {
            let state = random_position(&mut rng);
            if state.is_terminal() {
                continue;
            }
            let shallow = AlphaBetaAI::with_limits(1, ample()).compute_move(&state);
            let deep = AlphaBetaAI::with_limits(2, ample()).compute_move(&state);
            if deep.is_empty() {
                assert!(shallow.is_empty());
                continue;
            }
            let deep_value = root_value(&state, &deep, 2, &h);
            let shallow_value = root_value(&state, &shallow, 2, &h);
            assert!(deep_value >= shallow_value - 1e-9);
        }
    }

    #[test]
    fn test_search_with_huge_groups() {
        let mut state = GameState::with_sides(6, 6, Faction::Vampire).unwrap();
        state.set_count(Coord::new(1, 1), Species::Vampire, 3_000_000_000).unwrap();
        state.set_count(Coord::new(1, 2), Species::Vampire, 3_000_000_000).unwrap();
        state.set_count(Coord::new(4, 4), Species::Werewolf, 2_000_000_000).unwrap();
        state.set_count(Coord::new(0, 5), Species::Human, 2_000_000_000).unwrap();
        let outcome = AlphaBetaAI::with_limits(2, ample()).search(&state);
        assert_eq!(outcome.moves.len(), 1);
        assert_eq!(outcome.completed_depth, 2);
    }

    #[test]
    fn test_fallback_move() {
        let mut state = GameState::with_sides(4, 4, Faction::Werewolf).unwrap();
        state.set_count(Coord::new(0, 0), Species::Werewolf, 3).unwrap();
        state.set_count(Coord::new(3, 3), Species::Werewolf, 9).unwrap();
        let fallback = fallback_move(&state);
        let mv = fallback.moves()[0];
        assert_eq!(mv.from, Coord::new(3, 3));
        assert_eq!(mv.count, 4);
        assert!(mv.from.is_adjacent(mv.to));

        let empty = GameState::with_sides(4, 4, Faction::Werewolf).unwrap();
        assert!(fallback_move(&empty).is_empty());
    }
}
