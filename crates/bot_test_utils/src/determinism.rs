//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the controller produces identical
//! command streams given identical configuration and snapshots.
//!
//! # Testing Strategy
//!
//! The controller must be fully reproducible from its seed. Sources of
//! non-determinism include:
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   Producers are sorted by tag and ladders are plain vectors.
//!
//! - **System randomness**: No calls to `rand()` without explicit seeds.
//!   All jitter comes from the controller's seeded source.
//!
//! - **Floating-point positions**: Positions are fixed-point; `f64` is only
//!   used for ratios and learned values.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: Individual components (ladder, regulator, dispatch)
//! 2. **Property tests**: Random snapshots must still produce reproducible output
//! 3. **Integration tests**: Whole snapshot sequences replay identically

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use bot_core::command::Command;
use bot_core::config::BotConfig;
use bot_core::controller::Controller;
use bot_core::snapshot::GameStateSnapshot;
use tracing::debug;

use crate::fixtures::AnywherePlacement;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks driven.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic controller).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that every run matched, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Controller is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a stateful process multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run
/// * `ticks` - Number of steps per run
/// * `setup` - Function to create the initial state
/// * `step` - Function to advance the state by one tick
/// * `hash` - Function to compute the state hash
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S, u64),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for tick in 0..ticks {
            step(&mut state, tick);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Drive a fresh controller through `snapshots` and collect every command.
///
/// # Panics
///
/// Panics if `config` does not validate.
#[must_use]
pub fn command_stream(config: &BotConfig, snapshots: &[GameStateSnapshot]) -> Vec<Command> {
    let map = snapshots.first().map(|s| s.map.clone()).unwrap_or_default();
    let mut controller = Controller::new(config.clone(), &map).expect("config must validate");
    let mut sink: Vec<Command> = Vec::new();
    for snapshot in snapshots {
        controller.tick(snapshot, &mut AnywherePlacement, &mut sink);
    }
    sink
}

/// Replay `snapshots` through `runs` fresh controllers and compare the
/// command streams.
#[must_use]
pub fn verify_controller_determinism(
    config: &BotConfig,
    snapshots: &[GameStateSnapshot],
    runs: usize,
) -> DeterminismResult {
    let hashes: Vec<u64> = (0..runs)
        .map(|_| compute_hash(&command_stream(config, snapshots)))
        .collect();
    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks: snapshots.len() as u64,
    }
}

/// Compare the command streams of two configurations tick by tick.
///
/// Returns the index of the first snapshot after which the streams differ,
/// or `None` if they never do.
///
/// # Panics
///
/// Panics if either config does not validate.
#[must_use]
pub fn find_first_divergence(a: &BotConfig, b: &BotConfig, snapshots: &[GameStateSnapshot]) -> Option<usize> {
    let map = snapshots.first().map(|s| s.map.clone()).unwrap_or_default();
    let mut first = Controller::new(a.clone(), &map).expect("config must validate");
    let mut second = Controller::new(b.clone(), &map).expect("config must validate");

    for (index, snapshot) in snapshots.iter().enumerate() {
        let mut sink_a: Vec<Command> = Vec::new();
        let mut sink_b: Vec<Command> = Vec::new();
        first.tick(snapshot, &mut AnywherePlacement, &mut sink_a);
        second.tick(snapshot, &mut AnywherePlacement, &mut sink_b);
        if sink_a != sink_b {
            debug!(index, ?sink_a, ?sink_b, "Command streams diverged");
            return Some(index);
        }
    }

    None
}

/// Verify that a RON round trip preserves a configuration exactly.
#[must_use]
pub fn verify_config_roundtrip(config: &BotConfig) -> bool {
    let Ok(text) = ron::ser::to_string(config) else {
        return false;
    };
    BotConfig::from_ron_str(&text).is_ok_and(|restored| &restored == config)
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for controller inputs.
///
/// These strategies generate random but reproducible snapshots and
/// selections for property-based testing.
pub mod strategies {
    use bot_core::dispatch::Selection;
    use bot_core::ladder::PlacementHint;
    use bot_core::ledger::ResourceSnapshot;
    use bot_core::math::Vec2Fixed;
    use bot_core::snapshot::{GameStateSnapshot, OwnedUnit};
    use bot_core::types::{UnitTag, UnitTypeId, UpgradeId};
    use proptest::prelude::*;

    use crate::fixtures::standard_map;

    /// Generate a position on a 200x200 map.
    pub fn arb_position() -> impl Strategy<Value = Vec2Fixed> {
        (0i32..200, 0i32..200).prop_map(|(x, y)| Vec2Fixed::from_ints(x, y))
    }

    /// Generate stock and supply with `supply_used <= supply_cap`.
    pub fn arb_resources() -> impl Strategy<Value = ResourceSnapshot> {
        (0u32..2000, 0u32..1000, 0u32..200).prop_flat_map(|(primary, secondary, cap)| {
            (0..=cap).prop_map(move |used| ResourceSnapshot::new(primary, secondary, used, cap))
        })
    }

    /// Generate any unit type.
    pub fn arb_unit_type() -> impl Strategy<Value = UnitTypeId> {
        proptest::sample::select(UnitTypeId::ALL.to_vec())
    }

    /// Generate a unit with random readiness and queue.
    pub fn arb_unit() -> impl Strategy<Value = (UnitTypeId, Vec2Fixed, bool, u32)> {
        (arb_unit_type(), arb_position(), any::<bool>(), 0u32..3)
    }

    /// Generate a snapshot with up to `max_units` owned units.
    pub fn arb_snapshot(max_units: usize) -> impl Strategy<Value = GameStateSnapshot> {
        (
            arb_resources(),
            proptest::collection::vec(arb_unit(), 0..max_units),
            0u64..10_000,
        )
            .prop_map(|(resources, units, tick)| GameStateSnapshot {
                tick,
                resources,
                units: units
                    .into_iter()
                    .enumerate()
                    .map(|(index, (unit_type, position, ready, queue))| {
                        let progress = if ready { 100 } else { 50 };
                        OwnedUnit::new(UnitTag(index as u64 + 1), unit_type, position)
                            .with_progress(progress)
                            .with_queue(queue)
                    })
                    .collect(),
                map: standard_map(),
                ..GameStateSnapshot::default()
            })
    }

    /// Generate a production selection.
    pub fn arb_selection() -> impl Strategy<Value = Selection> {
        prop_oneof![
            arb_unit_type().prop_map(|unit| if unit.is_structure() {
                Selection::Structure {
                    structure: unit,
                    placement: PlacementHint::NearPylon { max_offset: 3 },
                }
            } else {
                Selection::Unit { unit }
            }),
            Just(Selection::Research {
                upgrade: UpgradeId::WarpGateResearch
            }),
            Just(Selection::Research {
                upgrade: UpgradeId::GroundWeapons1
            }),
        ]
    }

    /// Generate a sequence of selections.
    pub fn arb_selection_sequence(max_len: usize) -> impl Strategy<Value = Vec<Selection>> {
        proptest::collection::vec(arb_selection(), 0..max_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::SnapshotBuilder;
    use bot_core::types::UnitTypeId;

    fn early_game() -> Vec<GameStateSnapshot> {
        (0..24)
            .map(|tick| {
                SnapshotBuilder::opening()
                    .tick(tick)
                    .resources(50 + 25 * tick as u32, 0, 13, 15)
                    .build()
            })
            .collect()
    }

    #[test]
    fn test_verify_determinism_simple() {
        let result = verify_determinism(3, 10, || 0u64, |n, tick| *n += tick, |n| *n);
        assert!(result.is_deterministic);
        assert_eq!(result.unique_hashes().len(), 1);
    }

    #[test]
    fn test_controller_replays_identically() {
        let result = verify_controller_determinism(&BotConfig::standard().with_seed(3), &early_game(), 3);
        result.assert_deterministic();
        assert_eq!(result.ticks, 24);
    }

    #[test]
    fn test_same_config_never_diverges() {
        let config = BotConfig::standard();
        assert_eq!(find_first_divergence(&config, &config, &early_game()), None);
    }

    #[test]
    fn test_stream_contains_pylon() {
        let stream = command_stream(&BotConfig::standard(), &early_game());
        assert!(stream.iter().any(|c| matches!(
            c,
            Command::BuildStructure {
                structure: UnitTypeId::Pylon,
                ..
            }
        )));
    }

    #[test]
    fn test_standard_config_roundtrip() {
        assert!(verify_config_roundtrip(&BotConfig::standard()));
    }

    proptest::proptest! {
        #[test]
        fn prop_snapshot_supply_is_consistent(snapshot in strategies::arb_snapshot(20)) {
            proptest::prop_assert!(snapshot.resources.supply_used <= snapshot.resources.supply_cap);
        }
    }
}
