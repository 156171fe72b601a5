//! Army composition targets and the regulator that keeps the army on them.
//!
//! The regulator walks tracked types in declaration order and picks the first
//! one whose share of the army is below target and that can currently be
//! trained and paid for. Morph sources (High Templar waiting to become
//! Archons) are left out of the denominator and morphed before any ratio is
//! computed. Starter units fill whatever producers the ratios leave idle.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::catalog::Catalog;
use crate::condition::{Condition, EvalContext};
use crate::error::{BotError, Result};
use crate::snapshot::GameStateSnapshot;
use crate::types::{UnitTag, UnitTypeId};

/// Slack allowed when checking that ratios sum to at most 1.0.
const RATIO_SUM_TOLERANCE: f64 = 1e-9;

/// One entry in the target mixture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedUnit {
    /// Type whose share of the army is measured.
    pub counted_as: UnitTypeId,
    /// Type actually ordered to raise that share.
    pub train: UnitTypeId,
    /// Desired fraction of the army, 0.0-1.0.
    pub ratio: f64,
    /// Extra gate; the entry is skipped while it does not hold.
    #[serde(default)]
    pub gate: Condition,
}

impl TrackedUnit {
    /// Track and train the same type.
    #[must_use]
    pub fn new(unit: UnitTypeId, ratio: f64) -> Self {
        Self {
            counted_as: unit,
            train: unit,
            ratio,
            gate: Condition::Always,
        }
    }

    /// Measure `counted_as` but order `train` to grow it.
    #[must_use]
    pub fn trained_as(mut self, train: UnitTypeId) -> Self {
        self.train = train;
        self
    }

    /// Set the gate.
    #[must_use]
    pub fn with_gate(mut self, gate: Condition) -> Self {
        self.gate = gate;
        self
    }
}

/// A unit type that is converted into another on sight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MorphRule {
    /// Source type.
    pub from: UnitTypeId,
    /// Result type.
    pub into: UnitTypeId,
}

/// Keep a minimum number of a type alive or in production.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reserve {
    /// Reserved type.
    pub unit: UnitTypeId,
    /// Minimum planned count.
    pub count: u32,
    /// Extra gate.
    #[serde(default)]
    pub gate: Condition,
}

/// A unit trained on every free producer while its gate holds, regardless
/// of ratios.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StarterUnit {
    /// Type to train.
    pub unit: UnitTypeId,
    /// Gate; starters stop once it fails.
    #[serde(default)]
    pub gate: Condition,
}

/// Static configuration of the army mixture.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompositionTarget {
    /// Tracked types in priority order.
    pub tracked: Vec<TrackedUnit>,
    /// Morph rules applied every tick.
    #[serde(default)]
    pub morphs: Vec<MorphRule>,
    /// Reserves, evaluated before ratios.
    #[serde(default)]
    pub reserves: Vec<Reserve>,
    /// Starter units, evaluated after ratios.
    #[serde(default)]
    pub starters: Vec<StarterUnit>,
    /// Stop at the most urgent deficient type when it is unaffordable
    /// instead of moving on to cheaper ones.
    #[serde(default)]
    pub save_for_top_choice: bool,
}

impl CompositionTarget {
    /// Fail on negative, non-finite or oversubscribed ratios and on types
    /// the catalog cannot produce.
    pub fn validate(&self, catalog: &Catalog) -> Result<()> {
        let mut sum = 0.0;
        for entry in &self.tracked {
            if !entry.ratio.is_finite() || entry.ratio < 0.0 {
                return Err(BotError::InvalidRatio {
                    unit: entry.counted_as.to_string(),
                    ratio: entry.ratio,
                });
            }
            sum += entry.ratio;
            if catalog.producers_of(entry.train).is_empty() {
                return Err(BotError::MissingProducer(entry.train.to_string()));
            }
        }

        if sum > 1.0 + RATIO_SUM_TOLERANCE {
            return Err(BotError::RatioSumExceeded(sum));
        }

        let extra = self
            .reserves
            .iter()
            .map(|r| r.unit)
            .chain(self.starters.iter().map(|s| s.unit));
        for unit in extra {
            if catalog.producers_of(unit).is_empty() {
                return Err(BotError::MissingProducer(unit.to_string()));
            }
        }

        Ok(())
    }

    /// Whether `unit` is consumed by a morph rule.
    #[must_use]
    pub fn is_morph_source(&self, unit: UnitTypeId) -> bool {
        self.morphs.iter().any(|m| m.from == unit)
    }

    /// Morph target for `unit`, if it is a morph source.
    #[must_use]
    pub fn morph_target(&self, unit: UnitTypeId) -> Option<UnitTypeId> {
        self.morphs.iter().find(|m| m.from == unit).map(|m| m.into)
    }

    /// Unit types the regulator or reserves may order.
    pub fn trained_types(&self) -> impl Iterator<Item = UnitTypeId> + '_ {
        self.reserves
            .iter()
            .map(|r| r.unit)
            .chain(self.tracked.iter().map(|t| t.train))
            .chain(self.starters.iter().map(|s| s.unit))
    }
}

/// Owned army at the start of a tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArmyState {
    /// Army units, excluding morph sources.
    pub total_count: u32,
    /// Count per type, morph sources included.
    pub per_type_count: HashMap<UnitTypeId, u32>,
    /// Supply held by all army units.
    pub supply: u32,
    /// Every army unit.
    pub units: Vec<(UnitTag, UnitTypeId)>,
}

impl ArmyState {
    /// Derive the army from owned non-structure, non-worker units.
    #[must_use]
    pub fn from_snapshot(snapshot: &GameStateSnapshot, catalog: &Catalog, target: &CompositionTarget) -> Self {
        let mut army = Self::default();
        for unit in snapshot.army() {
            *army.per_type_count.entry(unit.unit_type).or_default() += 1;
            army.supply += catalog.cost(unit.unit_type).supply;
            army.units.push((unit.tag, unit.unit_type));
            if !target.is_morph_source(unit.unit_type) {
                army.total_count += 1;
            }
        }
        army
    }

    /// Count of `unit`.
    #[must_use]
    pub fn count(&self, unit: UnitTypeId) -> u32 {
        self.per_type_count.get(&unit).copied().unwrap_or(0)
    }

    /// Share of the army held by `unit`; zero for an empty army.
    #[must_use]
    pub fn ratio(&self, unit: UnitTypeId) -> f64 {
        if self.total_count == 0 {
            0.0
        } else {
            f64::from(self.count(unit)) / f64::from(self.total_count)
        }
    }

    /// Whether there is no army at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

/// Unit types that currently have a free producer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProducerAvailability {
    trainable: HashSet<UnitTypeId>,
}

impl ProducerAvailability {
    /// Create from a set of trainable types.
    #[must_use]
    pub fn new(trainable: impl IntoIterator<Item = UnitTypeId>) -> Self {
        Self {
            trainable: trainable.into_iter().collect(),
        }
    }

    /// Whether `unit` can be trained right now.
    #[must_use]
    pub fn can_train(&self, unit: UnitTypeId) -> bool {
        self.trainable.contains(&unit)
    }

    /// Mark `unit` as untrainable for the rest of the tick.
    pub fn mark_unavailable(&mut self, unit: UnitTypeId) {
        self.trainable.remove(&unit);
    }
}

/// What the regulator wants trained next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegulatorChoice {
    /// Type to order.
    pub unit: UnitTypeId,
    /// Types able to produce it.
    pub producers: Vec<UnitTypeId>,
}

/// Picks the next army unit type from a [`CompositionTarget`].
#[derive(Debug, Clone)]
pub struct ArmyCompositionRegulator {
    target: CompositionTarget,
}

impl ArmyCompositionRegulator {
    /// Create a regulator.
    #[must_use]
    pub const fn new(target: CompositionTarget) -> Self {
        Self { target }
    }

    /// The configured target.
    #[must_use]
    pub const fn target(&self) -> &CompositionTarget {
        &self.target
    }

    /// Units that should be ordered to morph this tick.
    #[must_use]
    pub fn morph_orders(&self, army: &ArmyState) -> Vec<(UnitTag, UnitTypeId)> {
        army.units
            .iter()
            .filter_map(|&(tag, unit)| self.target.morph_target(unit).map(|into| (tag, into)))
            .collect()
    }

    /// First unmet reserve that is affordable and trainable.
    #[must_use]
    pub fn evaluate_reserves(
        &self,
        ctx: &EvalContext<'_>,
        catalog: &Catalog,
        availability: &ProducerAvailability,
    ) -> Option<RegulatorChoice> {
        self.target.reserves.iter().find_map(|reserve| {
            let unmet = ctx.inventory.planned(reserve.unit) < reserve.count;
            let ready = unmet
                && reserve.gate.holds(ctx)
                && availability.can_train(reserve.unit)
                && ctx.ledger.can_afford(catalog.cost(reserve.unit));
            ready.then(|| RegulatorChoice {
                unit: reserve.unit,
                producers: catalog.producers_of(reserve.unit).to_vec(),
            })
        })
    }

    /// Next type to train, or `None` when every ratio is met or nothing
    /// deficient is both trainable and affordable.
    ///
    /// With `save_for_top_choice` set, the most urgent trainable type is
    /// returned even when it is unaffordable, so that dispatch reports the
    /// shortfall and nothing cheaper is bought.
    #[must_use]
    pub fn evaluate(
        &self,
        army: &ArmyState,
        ctx: &EvalContext<'_>,
        catalog: &Catalog,
        availability: &ProducerAvailability,
    ) -> Option<RegulatorChoice> {
        let mut deficient = self.target.tracked.iter().filter(|entry| {
            army.ratio(entry.counted_as) < entry.ratio
                && availability.can_train(entry.train)
                && entry.gate.holds(ctx)
        });

        let entry = if self.target.save_for_top_choice {
            deficient.next()?
        } else {
            deficient.find(|entry| {
                let affordable = ctx.ledger.can_afford(catalog.cost(entry.train));
                if !affordable {
                    trace!(unit = %entry.train, "Deficient but unaffordable");
                }
                affordable
            })?
        };

        Some(RegulatorChoice {
            unit: entry.train,
            producers: catalog.producers_of(entry.train).to_vec(),
        })
    }

    /// First starter unit whose gate holds and that is trainable and
    /// affordable.
    #[must_use]
    pub fn evaluate_starters(
        &self,
        ctx: &EvalContext<'_>,
        catalog: &Catalog,
        availability: &ProducerAvailability,
    ) -> Option<RegulatorChoice> {
        self.target.starters.iter().find_map(|starter| {
            let ready = starter.gate.holds(ctx)
                && availability.can_train(starter.unit)
                && ctx.ledger.can_afford(catalog.cost(starter.unit));
            ready.then(|| RegulatorChoice {
                unit: starter.unit,
                producers: catalog.producers_of(starter.unit).to_vec(),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::InventoryIndex;
    use crate::ledger::{ResourceLedger, ResourceSnapshot};
    use crate::types::UpgradeId;

    fn army(entries: &[(UnitTypeId, u32)], morph_sources: &[UnitTypeId]) -> ArmyState {
        let mut state = ArmyState::default();
        let mut tag = 0;
        for &(unit, count) in entries {
            state.per_type_count.insert(unit, count);
            for _ in 0..count {
                tag += 1;
                state.units.push((UnitTag(tag), unit));
            }
            if !morph_sources.contains(&unit) {
                state.total_count += count;
            }
        }
        state
    }

    fn rich_ledger() -> ResourceLedger {
        ResourceLedger::new(ResourceSnapshot::new(10_000, 10_000, 0, 200))
    }

    fn everything() -> ProducerAvailability {
        ProducerAvailability::new(UnitTypeId::ALL)
    }

    #[test]
    fn test_selects_deficient_type() {
        let regulator = ArmyCompositionRegulator::new(CompositionTarget {
            tracked: vec![
                TrackedUnit::new(UnitTypeId::Zealot, 0.5),
                TrackedUnit::new(UnitTypeId::Stalker, 0.5),
            ],
            ..CompositionTarget::default()
        });
        let inventory = InventoryIndex::new();
        let ledger = rich_ledger();
        let ctx = EvalContext::new(&inventory, &ledger);

        let choice = regulator
            .evaluate(&army(&[(UnitTypeId::Zealot, 2)], &[]), &ctx, &Catalog::standard(), &everything())
            .unwrap();
        assert_eq!(choice.unit, UnitTypeId::Stalker);
        assert_eq!(choice.producers, vec![UnitTypeId::Gateway, UnitTypeId::WarpGate]);
    }

    #[test]
    fn test_all_zero_target_never_selects() {
        let regulator = ArmyCompositionRegulator::new(CompositionTarget {
            tracked: vec![
                TrackedUnit::new(UnitTypeId::Zealot, 0.0),
                TrackedUnit::new(UnitTypeId::Stalker, 0.0),
            ],
            ..CompositionTarget::default()
        });
        let inventory = InventoryIndex::new();
        let ledger = rich_ledger();
        let ctx = EvalContext::new(&inventory, &ledger);

        for state in [army(&[], &[]), army(&[(UnitTypeId::Zealot, 3)], &[])] {
            assert!(regulator.evaluate(&state, &ctx, &Catalog::standard(), &everything()).is_none());
        }
    }

    #[test]
    fn test_unavailable_producer_skips_to_next() {
        let regulator = ArmyCompositionRegulator::new(CompositionTarget {
            tracked: vec![
                TrackedUnit::new(UnitTypeId::Immortal, 0.25),
                TrackedUnit::new(UnitTypeId::Stalker, 0.25),
            ],
            ..CompositionTarget::default()
        });
        let inventory = InventoryIndex::new();
        let ledger = rich_ledger();
        let ctx = EvalContext::new(&inventory, &ledger);
        let mut availability = everything();
        availability.mark_unavailable(UnitTypeId::Immortal);

        let choice = regulator
            .evaluate(&army(&[], &[]), &ctx, &Catalog::standard(), &availability)
            .unwrap();
        assert_eq!(choice.unit, UnitTypeId::Stalker);
    }

    #[test]
    fn test_failed_gate_skips_to_next() {
        let regulator = ArmyCompositionRegulator::new(CompositionTarget {
            tracked: vec![
                TrackedUnit::new(UnitTypeId::Zealot, 0.4).with_gate(Condition::Researched(UpgradeId::Charge)),
                TrackedUnit::new(UnitTypeId::Stalker, 0.1),
            ],
            ..CompositionTarget::default()
        });
        let inventory = InventoryIndex::new();
        let ledger = rich_ledger();
        let ctx = EvalContext::new(&inventory, &ledger);

        let choice = regulator
            .evaluate(&army(&[], &[]), &ctx, &Catalog::standard(), &everything())
            .unwrap();
        assert_eq!(choice.unit, UnitTypeId::Stalker);
    }

    fn immortal_then_zealot(save_for_top_choice: bool) -> ArmyCompositionRegulator {
        ArmyCompositionRegulator::new(CompositionTarget {
            tracked: vec![
                TrackedUnit::new(UnitTypeId::Immortal, 0.5),
                TrackedUnit::new(UnitTypeId::Zealot, 0.5),
            ],
            save_for_top_choice,
            ..CompositionTarget::default()
        })
    }

    #[test]
    fn test_unaffordable_type_falls_through_to_cheaper_one() {
        let inventory = InventoryIndex::new();
        let ledger = ResourceLedger::new(ResourceSnapshot::new(150, 0, 0, 200));
        let ctx = EvalContext::new(&inventory, &ledger);

        let choice = immortal_then_zealot(false)
            .evaluate(&army(&[], &[]), &ctx, &Catalog::standard(), &everything())
            .unwrap();
        assert_eq!(choice.unit, UnitTypeId::Zealot);
    }

    #[test]
    fn test_nothing_affordable_selects_nothing() {
        let inventory = InventoryIndex::new();
        let ledger = ResourceLedger::new(ResourceSnapshot::new(50, 0, 0, 200));
        let ctx = EvalContext::new(&inventory, &ledger);

        assert!(immortal_then_zealot(false)
            .evaluate(&army(&[], &[]), &ctx, &Catalog::standard(), &everything())
            .is_none());
    }

    #[test]
    fn test_saving_returns_unaffordable_top_choice() {
        let inventory = InventoryIndex::new();
        let ledger = ResourceLedger::new(ResourceSnapshot::new(150, 0, 0, 200));
        let ctx = EvalContext::new(&inventory, &ledger);

        let choice = immortal_then_zealot(true)
            .evaluate(&army(&[], &[]), &ctx, &Catalog::standard(), &everything())
            .unwrap();
        assert_eq!(choice.unit, UnitTypeId::Immortal);
    }

    #[test]
    fn test_starters_follow_their_gate() {
        let regulator = ArmyCompositionRegulator::new(CompositionTarget {
            starters: vec![StarterUnit {
                unit: UnitTypeId::Stalker,
                gate: Condition::Not(Box::new(Condition::planned(UnitTypeId::RoboticsFacility))),
            }],
            ..CompositionTarget::default()
        });
        let mut inventory = InventoryIndex::new();
        let ledger = rich_ledger();

        let choice = regulator
            .evaluate_starters(&EvalContext::new(&inventory, &ledger), &Catalog::standard(), &everything())
            .unwrap();
        assert_eq!(choice.unit, UnitTypeId::Stalker);

        inventory.record_dispatch(UnitTypeId::RoboticsFacility);
        assert!(regulator
            .evaluate_starters(&EvalContext::new(&inventory, &ledger), &Catalog::standard(), &everything())
            .is_none());
    }

    #[test]
    fn test_morph_sources_leave_denominator() {
        let target = CompositionTarget {
            tracked: vec![TrackedUnit::new(UnitTypeId::Archon, 0.5).trained_as(UnitTypeId::HighTemplar)],
            morphs: vec![MorphRule {
                from: UnitTypeId::HighTemplar,
                into: UnitTypeId::Archon,
            }],
            ..CompositionTarget::default()
        };
        let state = army(
            &[(UnitTypeId::Archon, 1), (UnitTypeId::Zealot, 1), (UnitTypeId::HighTemplar, 2)],
            &[UnitTypeId::HighTemplar],
        );
        let regulator = ArmyCompositionRegulator::new(target);

        assert!((state.ratio(UnitTypeId::Archon) - 0.5).abs() < f64::EPSILON);
        let morphs = regulator.morph_orders(&state);
        assert_eq!(morphs.len(), 2);
        assert!(morphs.iter().all(|(_, into)| *into == UnitTypeId::Archon));
    }

    #[test]
    fn test_reserve_filled_before_ratios() {
        let regulator = ArmyCompositionRegulator::new(CompositionTarget {
            tracked: vec![TrackedUnit::new(UnitTypeId::Immortal, 1.0)],
            reserves: vec![Reserve {
                unit: UnitTypeId::Observer,
                count: 1,
                gate: Condition::Always,
            }],
            ..CompositionTarget::default()
        });
        let mut inventory = InventoryIndex::new();
        let ledger = rich_ledger();

        let choice = regulator
            .evaluate_reserves(&EvalContext::new(&inventory, &ledger), &Catalog::standard(), &everything())
            .unwrap();
        assert_eq!(choice.unit, UnitTypeId::Observer);

        inventory.record_dispatch(UnitTypeId::Observer);
        assert!(regulator
            .evaluate_reserves(&EvalContext::new(&inventory, &ledger), &Catalog::standard(), &everything())
            .is_none());
    }

    #[test]
    fn test_validate_rejects_bad_ratios() {
        let catalog = Catalog::standard();
        let negative = CompositionTarget {
            tracked: vec![TrackedUnit::new(UnitTypeId::Zealot, -0.1)],
            ..CompositionTarget::default()
        };
        assert!(matches!(negative.validate(&catalog), Err(BotError::InvalidRatio { .. })));

        let nan = CompositionTarget {
            tracked: vec![TrackedUnit::new(UnitTypeId::Zealot, f64::NAN)],
            ..CompositionTarget::default()
        };
        assert!(matches!(nan.validate(&catalog), Err(BotError::InvalidRatio { .. })));

        let oversubscribed = CompositionTarget {
            tracked: vec![
                TrackedUnit::new(UnitTypeId::Zealot, 0.7),
                TrackedUnit::new(UnitTypeId::Stalker, 0.4),
            ],
            ..CompositionTarget::default()
        };
        assert!(matches!(oversubscribed.validate(&catalog), Err(BotError::RatioSumExceeded(_))));
    }

    #[test]
    fn test_validate_rejects_unproducible_type() {
        let target = CompositionTarget {
            tracked: vec![TrackedUnit::new(UnitTypeId::Zealot, 0.5)],
            ..CompositionTarget::default()
        };
        assert!(matches!(target.validate(&Catalog::new()), Err(BotError::MissingProducer(_))));
    }
}
