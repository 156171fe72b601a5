//! Drives one controller through one mock match.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Instant;

use bot_core::config::BotConfig;
use bot_core::controller::{Controller, TickReport};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::HeadlessError;
use crate::metrics::MatchSummary;
use crate::mock::MockGame;

/// Default match length: fifteen game minutes at one tick per second.
pub const DEFAULT_MAX_TICKS: u64 = 900;

/// Per-match parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSettings {
    /// Controller seed. Overrides the seed in the strategy file.
    pub seed: u64,
    /// Ticks to play.
    pub max_ticks: u64,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            seed: 0,
            max_ticks: DEFAULT_MAX_TICKS,
        }
    }
}

impl MatchSettings {
    /// Create settings.
    #[must_use]
    pub const fn new(seed: u64, max_ticks: u64) -> Self {
        Self { seed, max_ticks }
    }
}

/// A controller paired with a fresh mock game.
pub struct MatchRunner {
    controller: Controller,
    game: MockGame,
    summary: MatchSummary,
    hasher: DefaultHasher,
    max_ticks: u64,
}

impl MatchRunner {
    /// Validate `config` and set up the match.
    pub fn new(config: &BotConfig, settings: MatchSettings) -> Result<Self, HeadlessError> {
        let game = MockGame::standard();
        let controller = Controller::new(config.clone().with_seed(settings.seed), game.map())?;
        let summary = MatchSummary::new(controller.name(), controller.selector_name(), settings.seed);

        Ok(Self {
            controller,
            game,
            summary,
            hasher: DefaultHasher::new(),
            max_ticks: settings.max_ticks,
        })
    }

    /// The mock game.
    #[must_use]
    pub const fn game(&self) -> &MockGame {
        &self.game
    }

    /// The controller.
    #[must_use]
    pub const fn controller(&self) -> &Controller {
        &self.controller
    }

    /// Whether every tick has been played.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.game.tick() >= self.max_ticks
    }

    /// Observe, decide, then advance the game one tick.
    pub fn step(&mut self) -> TickReport {
        let is_final = self.game.tick() + 1 >= self.max_ticks;
        let snapshot = self.game.snapshot(is_final);
        let mut placement = self.game.placement();
        let previous_rally = self.controller.rally();

        let report = self.controller.tick(&snapshot, &mut placement, &mut self.game);
        report.commands.hash(&mut self.hasher);
        self.summary.record(&report, previous_rally);

        self.game.step();
        report
    }

    /// Play to the end and summarise.
    pub fn run(mut self) -> MatchSummary {
        let started = Instant::now();
        info!(
            strategy = %self.summary.strategy,
            seed = self.summary.seed,
            max_ticks = self.max_ticks,
            "Starting match"
        );

        while !self.is_finished() {
            self.step();
        }

        let command_hash = self.hasher.finish();
        self.summary
            .finish(&self.game, self.controller.mode(), self.controller.rally(), command_hash);
        info!(
            seed = self.summary.seed,
            workers = self.summary.final_state.workers,
            supply = self.summary.final_state.supply_used,
            orders = self.summary.production_orders,
            elapsed_ms = started.elapsed().as_millis(),
            "Match finished"
        );
        self.summary
    }
}

/// Play one match with `config`.
pub fn run_match(config: &BotConfig, settings: MatchSettings) -> Result<MatchSummary, HeadlessError> {
    Ok(MatchRunner::new(config, settings)?.run())
}
