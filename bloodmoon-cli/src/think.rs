//! Think command - compute one move set for a scenario
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: load_inputs(), decide(), report_decision()
//! - Level 3: build_config()
//! - Level 4: formatting utilities

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use bloodmoon_core::{
    fallback_move, AlphaBetaAI, Faction, GameState, Heuristics, MoveSet, Scenario, SearchConfig, SearchOutcome,
};

use crate::wire::{format_wire, to_wire, WireMove};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct ThinkArgs {
    /// Scenario JSON file (built-in name with --map instead)
    #[arg(long, value_name = "FILE")]
    pub scenario: Option<PathBuf>,

    /// Built-in scenario name
    #[arg(long, default_value = "classic")]
    pub map: String,

    /// Faction to move: vampire or werewolf
    #[arg(long, default_value = "vampire")]
    pub faction: Faction,

    /// Override search depth
    #[arg(long)]
    pub depth: Option<u32>,

    /// Override time budget in milliseconds
    #[arg(long)]
    pub budget_ms: Option<u64>,

    /// Search config JSON file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Evaluator weights JSON file, replaces the config's weights
    #[arg(long, value_name = "FILE")]
    pub heuristics: Option<PathBuf>,

    /// Output result as JSON
    #[arg(long)]
    pub json: bool,
}

/// What was decided and how
struct Decision {
    faction: Faction,
    moves: MoveSet,
    outcome: SearchOutcome,
    used_fallback: bool,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run think command
pub fn run(args: ThinkArgs) -> Result<()> {
    let (scenario, config) = load_inputs(&args)?;
    let state = scenario
        .to_game_state(args.faction)
        .with_context(|| format!("Scenario '{}' cannot be played", scenario.name))?;

    tracing::info!(
        "Thinking for {:?} on '{}' (depth={}, budget={}ms)",
        args.faction,
        scenario.name,
        config.max_depth,
        config.time_budget_ms
    );

    let decision = decide(&state, args.faction, config);
    report_decision(&decision, args.json);

    Ok(())
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

/// Load the scenario and the search config
fn load_inputs(args: &ThinkArgs) -> Result<(Scenario, SearchConfig)> {
    let scenario = match &args.scenario {
        Some(path) => Scenario::load(path)
            .with_context(|| format!("Failed to load scenario: {}", path.display()))?,
        None => Scenario::named(&args.map)
            .with_context(|| format!("Unknown built-in scenario: {}", args.map))?,
    };

    let config = build_config(args)?;
    Ok((scenario, config))
}

/// Search, then fall back if the search had nothing to offer
fn decide(state: &GameState, faction: Faction, config: SearchConfig) -> Decision {
    let ai = AlphaBetaAI::new(config);
    let outcome = ai.search(state);

    let mut moves = outcome.moves.clone();
    let used_fallback = moves.is_empty();
    if used_fallback {
        moves = fallback_move(state);
    }

    Decision {
        faction,
        moves,
        outcome,
        used_fallback,
    }
}

/// Print the decision
fn report_decision(decision: &Decision, json: bool) {
    if json {
        print_json_decision(decision);
    } else {
        print_text_decision(decision);
    }
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

/// Config file first, then command-line overrides
fn build_config(args: &ThinkArgs) -> Result<SearchConfig> {
    let mut config = match &args.config {
        Some(path) => SearchConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => SearchConfig::default(),
    };

    if let Some(depth) = args.depth {
        if depth == 0 {
            anyhow::bail!("--depth must be at least 1");
        }
        config.max_depth = depth;
    }
    if let Some(ms) = args.budget_ms {
        config.time_budget_ms = ms;
    }
    if let Some(path) = &args.heuristics {
        let weights = Heuristics::load(path)
            .with_context(|| format!("Failed to load heuristics: {}", path.display()))?;
        config = config.with_heuristics(weights);
    }

    Ok(config)
}

// ============================================================================
// LEVEL 4 - UTILITIES
// ============================================================================

fn print_json_decision(decision: &Decision) {
    #[derive(serde::Serialize)]
    struct JsonOutput {
        faction: Faction,
        moves: Vec<WireMove>,
        score: Option<f64>,
        completed_depth: u32,
        nodes: u64,
        elapsed_ms: f64,
        fallback: bool,
    }

    let output = JsonOutput {
        faction: decision.faction,
        moves: to_wire(&decision.moves),
        score: decision.outcome.score,
        completed_depth: decision.outcome.completed_depth,
        nodes: decision.outcome.nodes,
        elapsed_ms: decision.outcome.elapsed.as_secs_f64() * 1000.0,
        fallback: decision.used_fallback,
    };

    if let Ok(json) = serde_json::to_string_pretty(&output) {
        println!("{}", json);
    }
}

fn print_text_decision(decision: &Decision) {
    let outcome = &decision.outcome;
    println!("\n=== {:?} to move ===", decision.faction);
    println!("Depth:    {}", outcome.completed_depth);
    println!("Nodes:    {}", outcome.nodes);
    println!("Time:     {:.1}ms", outcome.elapsed.as_secs_f64() * 1000.0);
    match outcome.score {
        Some(score) => println!("Score:    {:.2}", score),
        None => println!("Score:    n/a"),
    }
    if decision.used_fallback {
        println!("(fallback move)");
    }

    if decision.moves.is_empty() {
        println!("\nNo move available");
    } else {
        println!("\nMoves (col_from row_from count col_to row_to):");
        println!("{}", format_wire(&decision.moves));
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> ThinkArgs {
        ThinkArgs {
            scenario: None,
            map: "classic".to_string(),
            faction: Faction::Werewolf,
            depth: Some(2),
            budget_ms: Some(500),
            config: None,
            heuristics: None,
            json: false,
        }
    }

    #[test]
    fn test_build_config_overrides() {
        let config = build_config(&args()).unwrap();
        assert_eq!(config.max_depth, 2);
        assert_eq!(config.time_budget_ms, 500);
    }

    #[test]
    fn test_build_config_with_heuristics_file() {
        let path = std::env::temp_dir().join(format!("bloodmoon-think-weights-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"center_weight": 0.0}"#).unwrap();
        let mut a = args();
        a.heuristics = Some(path.clone());
        let config = build_config(&a);
        std::fs::remove_file(&path).ok();
        let config = config.unwrap();
        assert_eq!(config.heuristics.center_weight, 0.0);
        assert_eq!(config.max_depth, 2);
    }

    #[test]
    fn test_build_config_rejects_zero_depth() {
        let mut a = args();
        a.depth = Some(0);
        assert!(build_config(&a).is_err());
    }

    #[test]
    fn test_unknown_map() {
        let mut a = args();
        a.map = "atlantis".to_string();
        assert!(load_inputs(&a).is_err());
    }

    #[test]
    fn test_decide_on_classic() {
        let a = args();
        let (scenario, config) = load_inputs(&a).unwrap();
        let state = scenario.to_game_state(a.faction).unwrap();
        let decision = decide(&state, a.faction, config);
        assert_eq!(decision.moves.len(), 1);
        assert!(!decision.used_fallback);
    }
}
