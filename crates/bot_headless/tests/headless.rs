//! Mock matches driven end to end.

use std::path::PathBuf;

use bot_core::command::Command;
use bot_core::config::{BotConfig, SelectorKind};
use bot_core::types::UnitTypeId;
use bot_headless::{run_batch, run_match, BatchConfig, MatchRunner, MatchSettings};
use bot_test_utils::determinism::{compute_hash, verify_determinism};

fn shipped_strategy() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../assets/strategies/gateway_macro.ron")
}

#[test]
fn test_shipped_strategy_matches_builtin() {
    let loaded = BotConfig::load(shipped_strategy()).unwrap();
    assert!(loaded.validate().is_ok());
    assert_eq!(loaded, BotConfig::standard());
}

#[test]
fn test_first_tick_trains_probe() {
    let mut runner = MatchRunner::new(&BotConfig::standard(), MatchSettings::new(1, 10)).unwrap();

    let report = runner.step();

    assert!(matches!(
        report.commands.as_slice(),
        [Command::TrainUnit {
            unit: UnitTypeId::Probe,
            ..
        }]
    ));
    assert_eq!(runner.game().tick(), 1);
}

#[test]
fn test_match_builds_economy_and_tech() {
    let summary = run_match(&BotConfig::standard(), MatchSettings::new(3, 600)).unwrap();

    assert_eq!(summary.ticks, 600);
    assert!(summary.final_state.workers > 12);
    assert!(summary.final_state.structures.contains_key("Pylon"));
    assert!(summary.final_state.structures.contains_key("Assimilator"));
    assert!(summary.final_state.structures.contains_key("CyberneticsCore"));
    assert!(summary.production_orders > 10);
    assert!(summary.final_state.army.contains_key("Stalker"));
}

#[test]
fn test_runner_is_deterministic() {
    let config = BotConfig::standard();
    let result = verify_determinism(
        3,
        240,
        || MatchRunner::new(&config, MatchSettings::new(21, 240)).unwrap(),
        |runner, _| {
            runner.step();
        },
        |runner| {
            let resources = runner.game().resources();
            compute_hash(&(
                resources.primary,
                resources.secondary,
                resources.supply_used,
                runner.game().units().len(),
            ))
        },
    );
    result.assert_deterministic();
}

#[test]
fn test_batch_repeats_exactly() {
    let batch = || BatchConfig::new(4).with_seed(100).with_max_ticks(180);
    let first = run_batch(&BotConfig::standard(), batch());
    let second = run_batch(&BotConfig::standard(), batch());

    assert_eq!(first.matches, second.matches);
    assert_eq!(first.summary, second.summary);
}

#[test]
fn test_learning_selector_plays_a_match() {
    let config = BotConfig::standard().with_selector(SelectorKind::QLearning);
    let summary = run_match(&config, MatchSettings::new(5, 300)).unwrap();

    assert_eq!(summary.selector, "q-learning");
    assert_eq!(summary.ticks, 300);
    assert!(summary.production_orders <= 300);
}
