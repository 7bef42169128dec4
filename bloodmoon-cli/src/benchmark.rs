//! Benchmark command - search cost per depth
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: run_depth_sweep(), report_results()
//! - Level 3: benchmark_depth()
//! - Level 4: formatting utilities

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;

use bloodmoon_core::{AlphaBetaAI, Faction, GameState, Scenario, SearchConfig};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct BenchmarkArgs {
    /// Built-in scenario name
    #[arg(long, default_value = "classic")]
    pub map: String,

    /// Maximum depth to test
    #[arg(long, default_value = "5")]
    pub depth: u32,

    /// Time budget per search in milliseconds (large: measure full depths)
    #[arg(long, default_value = "60000")]
    pub budget_ms: u64,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

/// Cost of one search
#[derive(Clone, Debug, serde::Serialize)]
struct BenchmarkResult {
    depth: u32,
    completed_depth: u32,
    nodes: u64,
    elapsed_ms: f64,
    nodes_per_second: f64,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run benchmark command
pub fn run(args: BenchmarkArgs) -> Result<()> {
    let scenario = Scenario::named(&args.map)
        .with_context(|| format!("Unknown built-in scenario: {}", args.map))?;
    let state = scenario.to_game_state(Faction::Vampire)?;

    tracing::info!("Benchmarking '{}' up to depth {}", scenario.name, args.depth);

    let results = run_depth_sweep(&state, args.depth, Duration::from_millis(args.budget_ms));
    report_results(&results, args.json);

    Ok(())
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

fn run_depth_sweep(state: &GameState, max_depth: u32, budget: Duration) -> Vec<BenchmarkResult> {
    (1..=max_depth)
        .map(|depth| {
            let result = benchmark_depth(state, depth, budget);
            tracing::info!(
                "Depth {}: {} nodes in {:.1}ms",
                depth,
                result.nodes,
                result.elapsed_ms
            );
            result
        })
        .collect()
}

fn report_results(results: &[BenchmarkResult], json: bool) {
    if json {
        if let Ok(out) = serde_json::to_string_pretty(results) {
            println!("{}", out);
        }
        return;
    }

    println!("\n=== Search Benchmark ===");
    println!("{:>5} {:>9} {:>12} {:>12} {:>14}", "depth", "reached", "nodes", "ms", "nodes/s");
    for r in results {
        println!(
            "{:>5} {:>9} {:>12} {:>12.1} {:>14.0}",
            r.depth, r.completed_depth, r.nodes, r.elapsed_ms, r.nodes_per_second
        );
    }
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

fn benchmark_depth(state: &GameState, depth: u32, budget: Duration) -> BenchmarkResult {
    let ai = AlphaBetaAI::new(SearchConfig::new(depth, budget));
    let outcome = ai.search(state);
    let secs = outcome.elapsed.as_secs_f64();

    BenchmarkResult {
        depth,
        completed_depth: outcome.completed_depth,
        nodes: outcome.nodes,
        elapsed_ms: secs * 1000.0,
        nodes_per_second: if secs > 0.0 { outcome.nodes as f64 / secs } else { 0.0 },
    }
}
