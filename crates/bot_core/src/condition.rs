//! Serializable predicates that gate ladder steps and tracked units.

use serde::{Deserialize, Serialize};

use crate::inventory::{CountScope, InventoryIndex};
use crate::ledger::ResourceLedger;
use crate::types::{UnitTypeId, UpgradeId};

/// Read-only state a [`Condition`] is evaluated against.
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    /// Counts, including this tick's dispatches.
    pub inventory: &'a InventoryIndex,
    /// Resources, including this tick's commitments.
    pub ledger: &'a ResourceLedger,
}

impl<'a> EvalContext<'a> {
    /// Create a new context.
    #[must_use]
    pub const fn new(inventory: &'a InventoryIndex, ledger: &'a ResourceLedger) -> Self {
        Self { inventory, ledger }
    }
}

/// A predicate over counts, research and supply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Condition {
    /// Always holds.
    #[default]
    Always,
    /// Summed count over `types` is at least `n`.
    CountAtLeast {
        /// Types to sum.
        types: Vec<UnitTypeId>,
        /// Which count to use.
        scope: CountScope,
        /// Threshold.
        n: u32,
    },
    /// Summed count over `types` is below `n`.
    CountBelow {
        /// Types to sum.
        types: Vec<UnitTypeId>,
        /// Which count to use.
        scope: CountScope,
        /// Threshold.
        n: u32,
    },
    /// The upgrade has finished.
    Researched(UpgradeId),
    /// The upgrade has finished or is in progress.
    ResearchStarted(UpgradeId),
    /// Free supply is below the value.
    SupplyLeftBelow(u32),
    /// Used supply is at most the value.
    SupplyUsedAtMost(u32),
    /// Used supply exceeds the value.
    SupplyUsedAbove(u32),
    /// Workers exceed `townhalls * per_townhall - margin`.
    WorkersAboveSaturation {
        /// Workers one townhall saturates with.
        per_townhall: u32,
        /// Slack subtracted from full saturation.
        margin: u32,
    },
    /// Every child holds.
    All(Vec<Condition>),
    /// At least one child holds.
    Any(Vec<Condition>),
    /// The child does not hold.
    Not(Box<Condition>),
}

impl Condition {
    /// `types` summed over `scope` is at least `n`.
    #[must_use]
    pub fn at_least(types: &[UnitTypeId], scope: CountScope, n: u32) -> Self {
        Self::CountAtLeast {
            types: types.to_vec(),
            scope,
            n,
        }
    }

    /// `types` summed over `scope` is below `n`.
    #[must_use]
    pub fn below(types: &[UnitTypeId], scope: CountScope, n: u32) -> Self {
        Self::CountBelow {
            types: types.to_vec(),
            scope,
            n,
        }
    }

    /// At least one finished `unit`.
    #[must_use]
    pub fn ready(unit: UnitTypeId) -> Self {
        Self::at_least(&[unit], CountScope::Ready, 1)
    }

    /// At least one `unit` finished or under construction.
    #[must_use]
    pub fn exists(unit: UnitTypeId) -> Self {
        Self::at_least(&[unit], CountScope::Total, 1)
    }

    /// At least one `unit` existing or ordered.
    #[must_use]
    pub fn planned(unit: UnitTypeId) -> Self {
        Self::at_least(&[unit], CountScope::Planned, 1)
    }

    /// Evaluate against the current tick state.
    #[must_use]
    pub fn holds(&self, ctx: &EvalContext<'_>) -> bool {
        match self {
            Self::Always => true,
            Self::CountAtLeast { types, scope, n } => ctx.inventory.sum(types, *scope) >= *n,
            Self::CountBelow { types, scope, n } => ctx.inventory.sum(types, *scope) < *n,
            Self::Researched(upgrade) => ctx.inventory.is_researched(*upgrade),
            Self::ResearchStarted(upgrade) => ctx.inventory.research_started(*upgrade),
            Self::SupplyLeftBelow(n) => ctx.ledger.supply_left() < *n,
            Self::SupplyUsedAtMost(n) => ctx.ledger.supply_used() <= *n,
            Self::SupplyUsedAbove(n) => ctx.ledger.supply_used() > *n,
            Self::WorkersAboveSaturation {
                per_townhall,
                margin,
            } => {
                let workers = ctx.inventory.total(UnitTypeId::Probe);
                let townhalls = ctx.inventory.total(UnitTypeId::Nexus);
                // Signed so zero townhalls never underflows.
                i64::from(workers) > i64::from(townhalls) * i64::from(*per_townhall) - i64::from(*margin)
            }
            Self::All(children) => children.iter().all(|c| c.holds(ctx)),
            Self::Any(children) => children.iter().any(|c| c.holds(ctx)),
            Self::Not(child) => !child.holds(ctx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::TypeCounts;
    use crate::ledger::ResourceSnapshot;

    fn inventory_with(entries: &[(UnitTypeId, u32, u32, u32)]) -> InventoryIndex {
        let mut index = InventoryIndex::new();
        for &(unit, ready, under_construction, pending) in entries {
            index.set(
                unit,
                TypeCounts {
                    ready,
                    under_construction,
                    pending,
                },
            );
        }
        index
    }

    #[test]
    fn test_count_scopes() {
        let inventory = inventory_with(&[(UnitTypeId::Gateway, 1, 1, 1), (UnitTypeId::WarpGate, 2, 0, 0)]);
        let ledger = ResourceLedger::new(ResourceSnapshot::default());
        let ctx = EvalContext::new(&inventory, &ledger);
        let gates = [UnitTypeId::Gateway, UnitTypeId::WarpGate];

        assert!(Condition::at_least(&gates, CountScope::Ready, 3).holds(&ctx));
        assert!(Condition::below(&gates, CountScope::Planned, 6).holds(&ctx));
        assert!(!Condition::below(&gates, CountScope::Planned, 5).holds(&ctx));
        assert!(Condition::at_least(&[UnitTypeId::Gateway], CountScope::InProgress, 2).holds(&ctx));
    }

    #[test]
    fn test_supply_conditions_see_commitments() {
        let inventory = InventoryIndex::new();
        let mut ledger = ResourceLedger::new(ResourceSnapshot::new(500, 0, 58, 62));
        assert!(!Condition::SupplyLeftBelow(3).holds(&EvalContext::new(&inventory, &ledger)));

        assert!(ledger.commit(crate::ledger::Cost::new(100, 0, 2)));
        let ctx = EvalContext::new(&inventory, &ledger);
        assert!(Condition::SupplyLeftBelow(3).holds(&ctx));
        assert!(Condition::SupplyUsedAtMost(60).holds(&ctx));
        assert!(!Condition::SupplyUsedAbove(60).holds(&ctx));
    }

    #[test]
    fn test_worker_saturation() {
        let ledger = ResourceLedger::new(ResourceSnapshot::default());
        let saturated = Condition::WorkersAboveSaturation {
            per_townhall: 22,
            margin: 6,
        };

        let inventory = inventory_with(&[(UnitTypeId::Nexus, 1, 0, 0), (UnitTypeId::Probe, 16, 0, 0)]);
        assert!(!saturated.holds(&EvalContext::new(&inventory, &ledger)));

        let inventory = inventory_with(&[(UnitTypeId::Nexus, 1, 0, 0), (UnitTypeId::Probe, 17, 0, 0)]);
        assert!(saturated.holds(&EvalContext::new(&inventory, &ledger)));

        let inventory = inventory_with(&[(UnitTypeId::Probe, 1, 0, 0)]);
        assert!(saturated.holds(&EvalContext::new(&inventory, &ledger)));
    }

    #[test]
    fn test_combinators() {
        let inventory = inventory_with(&[(UnitTypeId::Pylon, 1, 0, 0)]);
        let ledger = ResourceLedger::new(ResourceSnapshot::default());
        let ctx = EvalContext::new(&inventory, &ledger);

        let pylon = Condition::ready(UnitTypeId::Pylon);
        let gateway = Condition::exists(UnitTypeId::Gateway);

        assert!(Condition::All(vec![]).holds(&ctx));
        assert!(!Condition::Any(vec![]).holds(&ctx));
        assert!(Condition::Any(vec![gateway.clone(), pylon.clone()]).holds(&ctx));
        assert!(!Condition::All(vec![gateway.clone(), pylon]).holds(&ctx));
        assert!(Condition::Not(Box::new(gateway)).holds(&ctx));
    }
}
