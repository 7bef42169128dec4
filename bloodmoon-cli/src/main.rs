//! Bloodmoon CLI - Command-line interface
//!
//! Commands:
//! - think: Pick a move for one faction on a scenario
//! - match: Self-play games between two engines
//! - bench: Time the search at increasing depths

mod benchmark;
mod match_cmd;
mod think;
mod wire;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bloodmoon")]
#[command(about = "Vampires vs Werewolves decision engine")]
struct Cli {
    /// Random seed for reproducible runs
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Log search progress (same as RUST_LOG=debug)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute one move set
    Think(think::ThinkArgs),
    /// Play engines against each other
    Match(match_cmd::MatchArgs),
    /// Benchmark search depth against time
    Bench(benchmark::BenchmarkArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Think(args) => think::run(args),
        Commands::Match(args) => match_cmd::run(args, cli.seed),
        Commands::Bench(args) => benchmark::run(args),
    }
}

/// Logs go to stderr so JSON on stdout stays clean
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
