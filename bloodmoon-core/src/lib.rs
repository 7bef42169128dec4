//! Bloodmoon Core - Vampires vs Werewolves decision engine
//!
//! This crate provides the core game logic for Bloodmoon:
//! - Board geometry (rectangular grid, eight-way adjacency)
//! - Game state, move types and the population census
//! - Combat odds, expected outcomes and sampled battles
//! - Move-set generation and state transitions
//! - Position evaluation and time-bounded alpha-beta search
//! - Scenarios and a referee for self-play

pub mod board;
pub mod game;
pub mod combat;
pub mod movegen;
pub mod transition;
pub mod eval;
pub mod config;
pub mod ai;
pub mod scenario;
pub mod referee;

// Re-exports for convenient access
pub use board::{Coord, DIRECTIONS};
pub use game::{Cell, CellCensus, Faction, GameError, GameState, Group, Move, MoveSet, Side, Sides, Species};
pub use combat::{win_probability, expected_outcome, simulate_battle, BattleResult, ExpectedOutcome};
pub use movegen::{generate_move_sets, Candidates};
pub use transition::{apply_move_set, try_apply_move_set, TransitionError};
pub use eval::{evaluate, Heuristics, WIN_VALUE};
pub use config::SearchConfig;
pub use ai::{fallback_move, AlphaBetaAI, SearchOutcome};
pub use scenario::Scenario;
pub use referee::{play_game, resolve_turn, GameRecord, GameResult};
