//! Ordered, predicate-gated build steps.
//!
//! A ladder is evaluated top to bottom every tick and yields the first step
//! that is both affordable and whose condition holds. Steps are never
//! reordered after configuration.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::catalog::Catalog;
use crate::condition::{Condition, EvalContext};
use crate::error::{BotError, Result};
use crate::types::Producible;

/// Where a structure should be placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlacementHint {
    /// Near a townhall, pushed towards the map centre by up to `max_offset`.
    NearTownhall {
        /// Upper bound of the jittered push, exclusive.
        max_offset: u32,
    },
    /// Near a random ready pylon, pushed towards the map centre by up to
    /// `max_offset`.
    NearPylon {
        /// Upper bound of the jittered push, exclusive.
        max_offset: u32,
    },
    /// On a free geyser next to a townhall.
    Geyser,
    /// At the next expansion location.
    Expansion,
}

impl Default for PlacementHint {
    fn default() -> Self {
        Self::NearPylon { max_offset: 3 }
    }
}

/// Side effect applied when a step is selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepEffect {
    /// Move the rally point to the natural staging point.
    StageAtNatural,
}

/// One rung of a ladder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildStep {
    /// What to produce.
    pub target: Producible,
    /// Gate in addition to affordability.
    #[serde(default)]
    pub condition: Condition,
    /// Placement for structure targets.
    #[serde(default)]
    pub placement: PlacementHint,
    /// Applied when the step is selected, before dispatch.
    #[serde(default)]
    pub effect: Option<StepEffect>,
}

impl BuildStep {
    /// Create a step with default placement and no effect.
    #[must_use]
    pub fn new(target: impl Into<Producible>, condition: Condition) -> Self {
        Self {
            target: target.into(),
            condition,
            placement: PlacementHint::default(),
            effect: None,
        }
    }

    /// Set the placement hint.
    #[must_use]
    pub fn with_placement(mut self, placement: PlacementHint) -> Self {
        self.placement = placement;
        self
    }

    /// Set the selection effect.
    #[must_use]
    pub fn with_effect(mut self, effect: StepEffect) -> Self {
        self.effect = Some(effect);
        self
    }

    /// Whether the target is a building.
    #[must_use]
    pub const fn is_structure(&self) -> bool {
        self.target.is_structure()
    }

    /// Affordable and condition holds.
    #[must_use]
    pub fn is_eligible(&self, ctx: &EvalContext<'_>, catalog: &Catalog) -> bool {
        ctx.ledger.can_afford(catalog.cost(self.target)) && self.condition.holds(ctx)
    }
}

/// A named, non-empty sequence of steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildLadder {
    /// Name used in logs and errors.
    pub name: String,
    steps: Vec<BuildStep>,
}

impl BuildLadder {
    /// Create a ladder. Fails if `steps` is empty.
    pub fn new(name: impl Into<String>, steps: Vec<BuildStep>) -> Result<Self> {
        let ladder = Self::from_steps(name, steps);
        ladder.validate()?;
        Ok(ladder)
    }

    /// Create a ladder without checking it. Configuration loading calls
    /// [`validate`](Self::validate) before the first tick.
    #[must_use]
    pub fn from_steps(name: impl Into<String>, steps: Vec<BuildStep>) -> Self {
        Self {
            name: name.into(),
            steps,
        }
    }

    /// Check the ladder is usable.
    pub fn validate(&self) -> Result<()> {
        if self.steps.is_empty() {
            return Err(BotError::EmptyLadder(self.name.clone()));
        }
        Ok(())
    }

    /// Steps in evaluation order.
    #[must_use]
    pub fn steps(&self) -> &[BuildStep] {
        &self.steps
    }

    /// First eligible step, if any.
    #[must_use]
    pub fn evaluate(&self, ctx: &EvalContext<'_>, catalog: &Catalog) -> Option<&BuildStep> {
        self.steps.iter().enumerate().find_map(|(index, step)| {
            let eligible = step.is_eligible(ctx, catalog);
            trace!(ladder = %self.name, index, target = %step.target, eligible, "Evaluated step");
            eligible.then_some(step)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Blueprint;
    use crate::inventory::{InventoryIndex, TypeCounts};
    use crate::ledger::{Cost, ResourceLedger, ResourceSnapshot};
    use crate::types::UnitTypeId;

    // Stand-ins: Forge plays "A", Gateway plays "B".
    fn small_catalog() -> Catalog {
        let mut catalog = Catalog::new();
        catalog.register(Blueprint::new(UnitTypeId::Forge, "A", Cost::primary(100), 10));
        catalog.register(Blueprint::new(UnitTypeId::Gateway, "B", Cost::primary(50), 10));
        catalog
    }

    fn two_step_ladder() -> BuildLadder {
        BuildLadder::new(
            "test",
            vec![
                BuildStep::new(UnitTypeId::Forge, Condition::Always),
                BuildStep::new(UnitTypeId::Gateway, Condition::ready(UnitTypeId::Forge)),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_empty_ladder_rejected() {
        let err = BuildLadder::new("empty", Vec::new()).unwrap_err();
        assert!(matches!(err, BotError::EmptyLadder(name) if name == "empty"));
    }

    #[test]
    fn test_nothing_eligible_when_poor_and_gated() {
        let catalog = small_catalog();
        let ladder = two_step_ladder();
        let inventory = InventoryIndex::new();
        let ledger = ResourceLedger::new(ResourceSnapshot::new(50, 0, 10, 15));

        assert!(ladder.evaluate(&EvalContext::new(&inventory, &ledger), &catalog).is_none());
    }

    #[test]
    fn test_first_eligible_step_wins() {
        let catalog = small_catalog();
        let ladder = two_step_ladder();
        let mut inventory = InventoryIndex::new();
        inventory.set(
            UnitTypeId::Forge,
            TypeCounts {
                ready: 1,
                ..TypeCounts::default()
            },
        );
        let ledger = ResourceLedger::new(ResourceSnapshot::new(500, 0, 10, 15));

        let step = ladder.evaluate(&EvalContext::new(&inventory, &ledger), &catalog).unwrap();
        assert_eq!(step.target, Producible::Unit(UnitTypeId::Forge));
    }

    #[test]
    fn test_unaffordable_step_falls_through() {
        let catalog = small_catalog();
        let ladder = two_step_ladder();
        let mut inventory = InventoryIndex::new();
        inventory.set(
            UnitTypeId::Forge,
            TypeCounts {
                ready: 1,
                ..TypeCounts::default()
            },
        );
        let ledger = ResourceLedger::new(ResourceSnapshot::new(60, 0, 10, 15));

        let step = ladder.evaluate(&EvalContext::new(&inventory, &ledger), &catalog).unwrap();
        assert_eq!(step.target, Producible::Unit(UnitTypeId::Gateway));
    }

    #[test]
    fn test_step_gated_on_absence_does_not_refire_after_dispatch() {
        let catalog = small_catalog();
        let ladder = BuildLadder::new(
            "once",
            vec![BuildStep::new(
                UnitTypeId::Forge,
                Condition::below(&[UnitTypeId::Forge], crate::inventory::CountScope::Planned, 1),
            )],
        )
        .unwrap();
        let mut inventory = InventoryIndex::new();
        let ledger = ResourceLedger::new(ResourceSnapshot::new(1000, 0, 0, 15));

        assert!(ladder.evaluate(&EvalContext::new(&inventory, &ledger), &catalog).is_some());
        inventory.record_dispatch(UnitTypeId::Forge);
        assert!(ladder.evaluate(&EvalContext::new(&inventory, &ledger), &catalog).is_none());
        inventory.record_completion(UnitTypeId::Forge);
        assert!(ladder.evaluate(&EvalContext::new(&inventory, &ledger), &catalog).is_none());
    }

    #[test]
    fn test_ladder_ron_round_trip() {
        let ladder = two_step_ladder();
        let text = ron::to_string(&ladder).unwrap();
        let back: BuildLadder = ron::from_str(&text).unwrap();
        assert_eq!(ladder, back);
    }
}
