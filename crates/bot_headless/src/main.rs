//! Headless match runner.
//!
//! Plays the production controller against the mock game without a live
//! game connection. Designed for strategy authors and CI.
//!
//! # Usage
//!
//! ```bash
//! # Check a strategy file
//! cargo run -p bot_headless -- validate assets/strategies/gateway_macro.ron
//!
//! # Play one match with the built-in strategy
//! cargo run -p bot_headless -- run --seed 7 --ticks 600
//!
//! # Batch run with the learning selector
//! cargo run -p bot_headless -- batch --count 100 --learning --output results/
//!
//! # Verify determinism
//! cargo run -p bot_headless -- verify --seed 12345 --runs 5
//! ```
//!
//! Summaries go to stdout as JSON; logs go to stderr. `RUST_LOG` overrides
//! the level chosen with `-v`.

use std::path::{Path, PathBuf};

use bot_core::config::{BotConfig, SelectorKind};
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use bot_headless::{
    batch::{run_batch, verify_determinism, BatchConfig},
    error::HeadlessError,
    runner::{run_match, MatchSettings, DEFAULT_MAX_TICKS},
};

#[derive(Parser)]
#[command(name = "bot_headless")]
#[command(about = "Headless match runner for the production controller")]
#[command(version)]
struct Cli {
    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a single match and print its summary
    Run {
        /// Strategy file (defaults to the built-in strategy)
        #[arg(short, long)]
        strategy: Option<PathBuf>,

        /// Controller seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Ticks to play (one tick per game second)
        #[arg(short, long, default_value_t = DEFAULT_MAX_TICKS)]
        ticks: u64,

        /// Use the learning selector instead of the scripted one
        #[arg(long)]
        learning: bool,

        /// Write the summary here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Load and validate a strategy file
    Validate {
        /// Strategy file
        path: PathBuf,
    },

    /// Play many seeds in parallel
    Batch {
        /// Strategy file (defaults to the built-in strategy)
        #[arg(short, long)]
        strategy: Option<PathBuf>,

        /// Number of matches
        #[arg(short, long, default_value = "16")]
        count: u32,

        /// Worker threads (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: u32,

        /// First seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Ticks per match
        #[arg(short, long, default_value_t = DEFAULT_MAX_TICKS)]
        ticks: u64,

        /// Use the learning selector instead of the scripted one
        #[arg(long)]
        learning: bool,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,
    },

    /// Play the same seed several times and compare command streams
    Verify {
        /// Strategy file (defaults to the built-in strategy)
        #[arg(short, long)]
        strategy: Option<PathBuf>,

        /// Seed to verify
        #[arg(long, default_value = "12345")]
        seed: u64,

        /// Number of runs
        #[arg(short, long, default_value = "5")]
        runs: u32,

        /// Ticks per run
        #[arg(short, long, default_value_t = DEFAULT_MAX_TICKS)]
        ticks: u64,
    },

    /// Write the built-in strategy as RON
    Export {
        /// Destination file
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries the JSON summaries.
    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(filter)
        .init();

    let result = match cli.command {
        Commands::Run {
            strategy,
            seed,
            ticks,
            learning,
            output,
        } => cmd_run(strategy.as_deref(), seed, ticks, learning, output.as_deref()),
        Commands::Validate { path } => cmd_validate(&path),
        Commands::Batch {
            strategy,
            count,
            parallel,
            seed,
            ticks,
            learning,
            output,
        } => cmd_batch(strategy.as_deref(), count, parallel, seed, ticks, learning, output),
        Commands::Verify {
            strategy,
            seed,
            runs,
            ticks,
        } => cmd_verify(strategy.as_deref(), seed, runs, ticks),
        Commands::Export { output } => cmd_export(&output),
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "Command failed");
        eprintln!("FATAL: {e}");
        std::process::exit(1);
    }
}

/// Load a strategy file or fall back to the built-in strategy.
fn load_strategy(path: Option<&Path>, learning: bool) -> Result<BotConfig, HeadlessError> {
    let config = match path {
        Some(path) => {
            tracing::info!(path = %path.display(), "Loading strategy");
            BotConfig::load(path)?
        }
        None => BotConfig::standard(),
    };
    Ok(if learning {
        config.with_selector(SelectorKind::QLearning)
    } else {
        config
    })
}

/// Play one match
fn cmd_run(
    strategy: Option<&Path>,
    seed: u64,
    ticks: u64,
    learning: bool,
    output: Option<&Path>,
) -> Result<(), HeadlessError> {
    let config = load_strategy(strategy, learning)?;
    let summary = run_match(&config, MatchSettings::new(seed, ticks))?;
    let json = serde_json::to_string_pretty(&summary)?;

    match output {
        Some(path) => {
            std::fs::write(path, json)?;
            tracing::info!(path = %path.display(), "Summary written");
        }
        None => println!("{json}"),
    }
    Ok(())
}

/// Validate a strategy file
fn cmd_validate(path: &Path) -> Result<(), HeadlessError> {
    let config = BotConfig::load(path)?;
    config.validate()?;

    eprintln!("OK: {}", config.name);
    eprintln!("  Structure steps: {}", config.structure_ladder.steps().len());
    eprintln!("  Research steps:  {}", config.research_ladder.steps().len());
    eprintln!("  Tracked units:   {}", config.composition.tracked.len());
    eprintln!("  Selector:        {:?}", config.selector);
    Ok(())
}

/// Play a batch of seeds
fn cmd_batch(
    strategy: Option<&Path>,
    count: u32,
    parallel: u32,
    seed: u64,
    ticks: u64,
    learning: bool,
    output: PathBuf,
) -> Result<(), HeadlessError> {
    let config = load_strategy(strategy, learning)?;
    std::fs::create_dir_all(&output)?;

    let batch = BatchConfig {
        match_count: count,
        parallel_matches: parallel,
        seed_start: seed,
        max_ticks: ticks,
        output_dir: output.clone(),
    };
    let results = run_batch(&config, batch);

    let results_path = output.join("batch_results.json");
    results.save(&results_path)?;

    eprintln!("\n{}", "=".repeat(50));
    eprintln!("BATCH COMPLETE");
    eprintln!("{}", "=".repeat(50));
    eprintln!("Matches played: {}", results.matches.len());
    if !results.errors.is_empty() {
        eprintln!("Matches failed: {}", results.errors.len());
    }
    eprintln!("Avg workers:    {:.1}", results.summary.avg_workers);
    eprintln!("Avg supply:     {:.1}", results.summary.avg_supply_used);
    eprintln!("Commit rate:    {:.1}%", results.summary.commit_rate * 100.0);
    if let Some(tick) = results.summary.avg_first_commit_tick {
        eprintln!("Avg commit at:  tick {tick:.0}");
    }
    eprintln!("Results:        {}", results_path.display());
    Ok(())
}

/// Verify determinism
fn cmd_verify(strategy: Option<&Path>, seed: u64, runs: u32, ticks: u64) -> Result<(), HeadlessError> {
    let config = load_strategy(strategy, false)?;
    tracing::info!(seed, runs, ticks, "Verifying determinism");

    if verify_determinism(&config, MatchSettings::new(seed, ticks), runs)? {
        eprintln!("PASS: All {runs} runs produced identical command streams");
        Ok(())
    } else {
        eprintln!("FAIL: Non-determinism detected!");
        std::process::exit(1);
    }
}

/// Export the built-in strategy
fn cmd_export(output: &Path) -> Result<(), HeadlessError> {
    BotConfig::standard().save(output)?;
    eprintln!("Wrote {}", output.display());
    Ok(())
}
