//! Batch match runner.
//!
//! Plays many seeds of one strategy in parallel using rayon. Every match owns
//! its own controller and mock game, so results do not depend on thread
//! scheduling.

use std::path::{Path, PathBuf};
use std::time::Instant;

use bot_core::config::BotConfig;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::HeadlessError;
use crate::metrics::{BatchSummary, MatchSummary};
use crate::runner::{run_match, MatchSettings, DEFAULT_MAX_TICKS};

/// Configuration for a batch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Number of matches.
    pub match_count: u32,
    /// Worker threads (0 = rayon default).
    pub parallel_matches: u32,
    /// Seed of the first match; later matches count up from it.
    pub seed_start: u64,
    /// Ticks per match.
    pub max_ticks: u64,
    /// Output directory for results.
    pub output_dir: PathBuf,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            match_count: 16,
            parallel_matches: 0,
            seed_start: 0,
            max_ticks: DEFAULT_MAX_TICKS,
            output_dir: PathBuf::from("results"),
        }
    }
}

impl BatchConfig {
    /// Create a config for `match_count` matches.
    #[must_use]
    pub fn new(match_count: u32) -> Self {
        Self {
            match_count,
            ..Default::default()
        }
    }

    /// Set the output directory.
    #[must_use]
    pub fn with_output(mut self, dir: PathBuf) -> Self {
        self.output_dir = dir;
        self
    }

    /// Set the first seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed_start = seed;
        self
    }

    /// Set the match length.
    #[must_use]
    pub fn with_max_ticks(mut self, max_ticks: u64) -> Self {
        self.max_ticks = max_ticks;
        self
    }

    /// Settings for the `index`-th match.
    #[must_use]
    pub fn settings(&self, index: u32) -> MatchSettings {
        MatchSettings::new(self.seed_start.wrapping_add(u64::from(index)), self.max_ticks)
    }
}

/// A match that failed to start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchError {
    /// Match index.
    pub match_index: u32,
    /// Seed used.
    pub seed: u64,
    /// Error message.
    pub message: String,
}

/// Results from a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Strategy name.
    pub strategy: String,
    /// Configuration used.
    pub config: BatchConfig,
    /// Per-match summaries, in seed order.
    pub matches: Vec<MatchSummary>,
    /// Aggregate summary.
    pub summary: BatchSummary,
    /// Wall-clock runtime.
    pub duration_seconds: f64,
    /// Matches that failed to start.
    pub errors: Vec<BatchError>,
}

impl BatchResults {
    /// Save results to a JSON file.
    pub fn save(&self, path: &Path) -> Result<(), HeadlessError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load results from a JSON file.
    pub fn load(path: &Path) -> Result<Self, HeadlessError> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

/// Run a batch of matches.
pub fn run_batch(strategy: &BotConfig, config: BatchConfig) -> BatchResults {
    let start = Instant::now();
    info!(
        strategy = %strategy.name,
        matches = config.match_count,
        seed_start = config.seed_start,
        max_ticks = config.max_ticks,
        "Starting batch run"
    );

    let play = || -> Vec<Result<MatchSummary, BatchError>> {
        (0..config.match_count)
            .into_par_iter()
            .map(|index| {
                let settings = config.settings(index);
                run_match(strategy, settings).map_err(|e| {
                    warn!(index, seed = settings.seed, error = %e, "Match failed");
                    BatchError {
                        match_index: index,
                        seed: settings.seed,
                        message: e.to_string(),
                    }
                })
            })
            .collect()
    };

    let results = if config.parallel_matches > 0 {
        match rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallel_matches as usize)
            .build()
        {
            Ok(pool) => pool.install(play),
            Err(e) => {
                warn!(error = %e, "Failed to build thread pool, using the global pool");
                play()
            }
        }
    } else {
        play()
    };

    let (matches, errors): (Vec<_>, Vec<_>) = results.into_iter().partition(Result::is_ok);
    let matches: Vec<MatchSummary> = matches.into_iter().filter_map(Result::ok).collect();
    let errors: Vec<BatchError> = errors.into_iter().filter_map(Result::err).collect();

    let summary = BatchSummary::from_matches(&matches);
    let duration_seconds = start.elapsed().as_secs_f64();
    debug!(?summary, "Batch summary");
    info!(
        completed = matches.len(),
        failed = errors.len(),
        duration_secs = format!("{duration_seconds:.2}"),
        "Batch complete"
    );

    BatchResults {
        strategy: strategy.name.clone(),
        config,
        matches,
        summary,
        duration_seconds,
        errors,
    }
}

/// Play the same seed `runs` times and compare command hashes.
pub fn verify_determinism(strategy: &BotConfig, settings: MatchSettings, runs: u32) -> Result<bool, HeadlessError> {
    let hashes = (0..runs.max(1))
        .map(|_| run_match(strategy, settings).map(|summary| summary.command_hash))
        .collect::<Result<Vec<u64>, HeadlessError>>()?;
    debug!(?hashes, "Determinism hashes");
    Ok(hashes.windows(2).all(|w| w[0] == w[1]))
}
