//! Match and batch summaries.
//!
//! Everything here is plain data written out as JSON after a run.

use std::collections::BTreeMap;

use bot_core::controller::TickReport;
use bot_core::deployment::DeploymentMode;
use bot_core::math::Vec2Fixed;
use serde::{Deserialize, Serialize};

use crate::mock::MockGame;

/// Outcome of one mock match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchSummary {
    /// Strategy name from the configuration.
    pub strategy: String,
    /// Decision strategy used.
    pub selector: String,
    /// Seed the controller ran with.
    pub seed: u64,
    /// Ticks played.
    pub ticks: u64,
    /// Commands the game accepted.
    pub commands_issued: u64,
    /// Production and research orders among them.
    pub production_orders: u64,
    /// Commands the game refused.
    pub commands_rejected: u64,
    /// Skip counts by reason.
    pub skips: BTreeMap<String, u64>,
    /// First tick the army committed, if ever.
    pub first_commit_tick: Option<u64>,
    /// Ticks on which the rally point moved.
    pub rally_moves: Vec<u64>,
    /// State at the end of the match.
    pub final_state: FinalState,
    /// Hash over every accepted command, for determinism checks.
    pub command_hash: u64,
}

/// End-of-match economy and army.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinalState {
    /// Primary stock.
    pub primary: u32,
    /// Secondary stock.
    pub secondary: u32,
    /// Supply used.
    pub supply_used: u32,
    /// Supply cap.
    pub supply_cap: u32,
    /// Finished workers.
    pub workers: u32,
    /// Finished non-worker units by type.
    pub army: BTreeMap<String, u32>,
    /// Finished structures by type.
    pub structures: BTreeMap<String, u32>,
    /// Completed upgrades.
    pub upgrades: Vec<String>,
    /// Deployment mode after the last tick.
    pub mode: DeploymentMode,
    /// Rally point after the last tick, in map units.
    pub rally: (f64, f64),
}

impl MatchSummary {
    /// Empty summary for a match about to start.
    #[must_use]
    pub fn new(strategy: impl Into<String>, selector: impl Into<String>, seed: u64) -> Self {
        Self {
            strategy: strategy.into(),
            selector: selector.into(),
            seed,
            ..Default::default()
        }
    }

    /// Fold one tick's report in.
    pub fn record(&mut self, report: &TickReport, previous_rally: Vec2Fixed) {
        self.ticks += 1;
        self.commands_issued += report.commands.len() as u64;
        self.production_orders += report.production_count() as u64;
        for reason in report.outcomes.iter().filter_map(|o| o.skipped) {
            *self.skips.entry(reason.to_string()).or_default() += 1;
        }
        if report.mode == DeploymentMode::Commit && self.first_commit_tick.is_none() {
            self.first_commit_tick = Some(report.tick);
        }
        if report.rally != previous_rally {
            self.rally_moves.push(report.tick);
        }
    }

    /// Capture the end state.
    pub fn finish(&mut self, game: &MockGame, mode: DeploymentMode, rally: Vec2Fixed, command_hash: u64) {
        let resources = game.resources();
        let mut state = FinalState {
            primary: resources.primary,
            secondary: resources.secondary,
            supply_used: resources.supply_used,
            supply_cap: resources.supply_cap,
            upgrades: game.upgrades().iter().map(|u| format!("{u:?}")).collect(),
            mode,
            rally: (rally.x.to_num::<f64>(), rally.y.to_num::<f64>()),
            ..FinalState::default()
        };

        for unit in game.units().iter().filter(|u| u.is_ready()) {
            if unit.unit_type.is_worker() {
                state.workers += 1;
            } else if unit.unit_type.is_structure() {
                *state.structures.entry(unit.unit_type.to_string()).or_default() += 1;
            } else {
                *state.army.entry(unit.unit_type.to_string()).or_default() += 1;
            }
        }

        self.commands_rejected = game.rejected();
        self.final_state = state;
        self.command_hash = command_hash;
    }
}

/// Aggregate over a batch of matches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Matches summarised.
    pub total_matches: u32,
    /// Mean finished workers at the end.
    pub avg_workers: f64,
    /// Mean supply used at the end.
    pub avg_supply_used: f64,
    /// Share of matches in which the army committed.
    pub commit_rate: f64,
    /// Mean first commit tick over matches that committed.
    pub avg_first_commit_tick: Option<f64>,
    /// Mean accepted production orders.
    pub avg_production_orders: f64,
    /// Skip counts by reason, summed over matches.
    pub skips: BTreeMap<String, u64>,
}

impl BatchSummary {
    /// Calculate the summary from individual matches.
    #[must_use]
    pub fn from_matches(matches: &[MatchSummary]) -> Self {
        if matches.is_empty() {
            return Self::default();
        }

        let count = matches.len() as f64;
        let mean = |value: fn(&MatchSummary) -> f64| matches.iter().map(value).sum::<f64>() / count;
        let commits: Vec<f64> = matches
            .iter()
            .filter_map(|m| m.first_commit_tick)
            .map(|t| t as f64)
            .collect();

        let mut skips: BTreeMap<String, u64> = BTreeMap::new();
        for (reason, n) in matches.iter().flat_map(|m| &m.skips) {
            *skips.entry(reason.clone()).or_default() += n;
        }

        Self {
            total_matches: u32::try_from(matches.len()).unwrap_or(u32::MAX),
            avg_workers: mean(|m| f64::from(m.final_state.workers)),
            avg_supply_used: mean(|m| f64::from(m.final_state.supply_used)),
            commit_rate: commits.len() as f64 / count,
            avg_first_commit_tick: (!commits.is_empty()).then(|| commits.iter().sum::<f64>() / commits.len() as f64),
            avg_production_orders: mean(|m| m.production_orders as f64),
            skips,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(workers: u32, commit: Option<u64>) -> MatchSummary {
        MatchSummary {
            first_commit_tick: commit,
            production_orders: 10,
            skips: [("No producer available".to_string(), 2)].into_iter().collect(),
            final_state: FinalState {
                workers,
                supply_used: workers,
                ..FinalState::default()
            },
            ..MatchSummary::default()
        }
    }

    #[test]
    fn test_batch_summary_averages() {
        let summary = BatchSummary::from_matches(&[summary(20, Some(300)), summary(30, None)]);
        assert_eq!(summary.total_matches, 2);
        assert!((summary.avg_workers - 25.0).abs() < f64::EPSILON);
        assert!((summary.commit_rate - 0.5).abs() < f64::EPSILON);
        assert_eq!(summary.avg_first_commit_tick, Some(300.0));
        assert_eq!(summary.skips["No producer available"], 4);
    }

    #[test]
    fn test_empty_batch_summary() {
        assert_eq!(BatchSummary::from_matches(&[]), BatchSummary::default());
    }

    #[test]
    fn test_finish_counts_units() {
        let game = MockGame::standard();
        let mut summary = MatchSummary::new("test", "scripted", 1);
        summary.finish(&game, DeploymentMode::Regroup, Vec2Fixed::from_ints(32, 30), 7);
        assert_eq!(summary.final_state.workers, 12);
        assert_eq!(summary.final_state.structures["Nexus"], 1);
        assert!(summary.final_state.army.is_empty());
        assert_eq!(summary.final_state.rally, (32.0, 30.0));
    }
}
