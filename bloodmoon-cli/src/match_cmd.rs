//! Match command - self-play games on one scenario
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: load_scenario(), play_match(), report_results()
//! - Level 3: play_single_game(), compute_match_statistics()
//! - Level 4: formatting utilities

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use bloodmoon_core::{play_game, AlphaBetaAI, Faction, GameResult, GameState, Scenario, SearchConfig};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct MatchArgs {
    /// Scenario JSON file (built-in name with --map instead)
    #[arg(long, value_name = "FILE")]
    pub scenario: Option<PathBuf>,

    /// Built-in scenario name
    #[arg(long, default_value = "classic")]
    pub map: String,

    /// Number of games to play
    #[arg(long, default_value = "10")]
    pub games: usize,

    /// Search depth for both engines
    #[arg(long, default_value = "3")]
    pub depth: u32,

    /// Per-move time budget in milliseconds
    #[arg(long, default_value = "200")]
    pub budget_ms: u64,

    /// Search depth for the werewolves, if different
    #[arg(long)]
    pub werewolf_depth: Option<u32>,

    /// Maximum turns per game (one turn is one faction's move)
    #[arg(long, default_value = "100")]
    pub max_turns: u32,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

/// Result of a single game
#[derive(Clone, Debug)]
struct MatchGame {
    game_number: usize,
    result: GameResult,
    turns: u32,
    vampires: u64,
    werewolves: u64,
    nodes: u64,
}

/// Aggregated match results
#[derive(Clone, Debug)]
struct MatchResults {
    scenario: String,
    games: Vec<MatchGame>,
    vampire_wins: usize,
    werewolf_wins: usize,
    draws: usize,
    avg_turns: f32,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run match command
///
/// 1. Load the scenario
/// 2. Play the games in parallel
/// 3. Report results
pub fn run(args: MatchArgs, seed: Option<u64>) -> Result<()> {
    if args.depth == 0 || args.werewolf_depth == Some(0) {
        anyhow::bail!("search depth must be at least 1");
    }

    let scenario = load_scenario(&args)?;

    tracing::info!(
        "Starting match on '{}' ({} games, depth={}, budget={}ms)",
        scenario.name,
        args.games,
        args.depth,
        args.budget_ms
    );

    let results = play_match(&scenario, &args, seed)?;

    report_results(&results, &args);

    Ok(())
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

fn load_scenario(args: &MatchArgs) -> Result<Scenario> {
    match &args.scenario {
        Some(path) => Scenario::load(path)
            .with_context(|| format!("Failed to load scenario: {}", path.display())),
        None => Scenario::named(&args.map)
            .with_context(|| format!("Unknown built-in scenario: {}", args.map)),
    }
}

/// Play all games, each with its own seed derived from the base seed
fn play_match(scenario: &Scenario, args: &MatchArgs, seed: Option<u64>) -> Result<MatchResults> {
    let initial = scenario.to_game_state(Faction::Vampire)?;
    let budget = Duration::from_millis(args.budget_ms);
    let vampires = AlphaBetaAI::new(SearchConfig::new(args.depth, budget));
    let werewolves = AlphaBetaAI::new(SearchConfig::new(args.werewolf_depth.unwrap_or(args.depth), budget));

    let base_seed = create_rng(seed).gen::<u64>();

    let games: Vec<MatchGame> = (0..args.games)
        .into_par_iter()
        .map(|i| {
            let mut rng = ChaCha8Rng::seed_from_u64(base_seed.wrapping_add(i as u64));
            let game = play_single_game(&initial, &vampires, &werewolves, i + 1, args.max_turns, &mut rng);
            tracing::info!("Game {}: {:?} ({} turns)", game.game_number, game.result, game.turns);
            game
        })
        .collect();

    Ok(compute_match_statistics(scenario.name.clone(), games))
}

fn report_results(results: &MatchResults, args: &MatchArgs) {
    if args.json {
        print_json_results(results);
    } else {
        print_text_results(results);
    }
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

fn play_single_game(
    initial: &GameState,
    vampires: &AlphaBetaAI,
    werewolves: &AlphaBetaAI,
    game_number: usize,
    max_turns: u32,
    rng: &mut ChaCha8Rng,
) -> MatchGame {
    let record = play_game(initial, vampires, werewolves, max_turns, rng);
    MatchGame {
        game_number,
        result: record.result,
        turns: record.turns,
        vampires: record.vampires,
        werewolves: record.werewolves,
        nodes: record.vampire_nodes + record.werewolf_nodes,
    }
}

fn compute_match_statistics(scenario: String, games: Vec<MatchGame>) -> MatchResults {
    let count = |r: GameResult| games.iter().filter(|g| g.result == r).count();
    let vampire_wins = count(GameResult::VampiresWin);
    let werewolf_wins = count(GameResult::WerewolvesWin);
    let draws = count(GameResult::Draw);

    let total_turns: u32 = games.iter().map(|g| g.turns).sum();
    let avg_turns = if games.is_empty() {
        0.0
    } else {
        total_turns as f32 / games.len() as f32
    };

    MatchResults {
        scenario,
        games,
        vampire_wins,
        werewolf_wins,
        draws,
        avg_turns,
    }
}

// ============================================================================
// LEVEL 4 - UTILITIES
// ============================================================================

/// Create RNG from seed or random
fn create_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => ChaCha8Rng::from_entropy(),
    }
}

fn rate(part: usize, total: usize) -> f32 {
    if total > 0 {
        part as f32 / total as f32
    } else {
        0.0
    }
}

fn print_json_results(results: &MatchResults) {
    #[derive(serde::Serialize)]
    struct JsonGame {
        game_number: usize,
        result: GameResult,
        turns: u32,
        vampires: u64,
        werewolves: u64,
        nodes: u64,
    }

    #[derive(serde::Serialize)]
    struct JsonOutput {
        scenario: String,
        total_games: usize,
        vampire_wins: usize,
        werewolf_wins: usize,
        draws: usize,
        avg_turns: f32,
        vampire_win_rate: f32,
        games: Vec<JsonGame>,
    }

    let total = results.games.len();
    let output = JsonOutput {
        scenario: results.scenario.clone(),
        total_games: total,
        vampire_wins: results.vampire_wins,
        werewolf_wins: results.werewolf_wins,
        draws: results.draws,
        avg_turns: results.avg_turns,
        vampire_win_rate: rate(results.vampire_wins, total),
        games: results
            .games
            .iter()
            .map(|g| JsonGame {
                game_number: g.game_number,
                result: g.result,
                turns: g.turns,
                vampires: g.vampires,
                werewolves: g.werewolves,
                nodes: g.nodes,
            })
            .collect(),
    };

    if let Ok(json) = serde_json::to_string_pretty(&output) {
        println!("{}", json);
    }
}

fn print_text_results(results: &MatchResults) {
    let total = results.games.len();

    println!("\n=== Match Results: {} ===", results.scenario);
    println!("Total games:    {}", total);
    println!(
        "Vampire wins:   {} ({:.1}%)",
        results.vampire_wins,
        rate(results.vampire_wins, total) * 100.0
    );
    println!(
        "Werewolf wins:  {} ({:.1}%)",
        results.werewolf_wins,
        rate(results.werewolf_wins, total) * 100.0
    );
    println!(
        "Draws:          {} ({:.1}%)",
        results.draws,
        rate(results.draws, total) * 100.0
    );
    println!("Avg turns:      {:.1}", results.avg_turns);

    println!("\nGame details:");
    for game in &results.games {
        println!(
            "  Game {}: {:?} in {} turns ({} V / {} W left)",
            game.game_number, game.result, game.turns, game.vampires, game.werewolves
        );
    }
}

// ============================================================================
// TESTS
// ============================================================================
