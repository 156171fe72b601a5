//! Per-type counts of owned, building and ordered things.
//!
//! Rebuilt from every snapshot. Within a tick only the dispatcher writes to
//! it, through [`InventoryIndex::record_dispatch`].

use std::collections::{BTreeSet, HashMap};

use crate::snapshot::GameStateSnapshot;
use crate::types::{Producible, UnitTypeId, UpgradeId};

/// Counts for one producible type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TypeCounts {
    /// Finished instances.
    pub ready: u32,
    /// Placed structures still under construction.
    pub under_construction: u32,
    /// Orders issued but not yet represented by an instance.
    pub pending: u32,
}

impl TypeCounts {
    /// Ready plus under construction.
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.ready + self.under_construction
    }

    /// Everything that exists or has been ordered.
    #[must_use]
    pub const fn planned(&self) -> u32 {
        self.total() + self.pending
    }
}

/// Which count a condition compares against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum CountScope {
    /// Finished only.
    Ready,
    /// Finished plus under construction.
    Total,
    /// Ordered, not yet started.
    Pending,
    /// Under construction plus pending.
    InProgress,
    /// Total plus pending.
    Planned,
}

impl CountScope {
    /// Select the matching count.
    #[must_use]
    pub const fn pick(self, counts: TypeCounts) -> u32 {
        match self {
            Self::Ready => counts.ready,
            Self::Total => counts.total(),
            Self::Pending => counts.pending,
            Self::InProgress => counts.under_construction + counts.pending,
            Self::Planned => counts.planned(),
        }
    }
}

/// Map from producible type to its counts.
pub type ProductionCounts = HashMap<Producible, TypeCounts>;

/// Derived per-tick view over everything owned or ordered.
#[derive(Debug, Clone, Default)]
pub struct InventoryIndex {
    counts: ProductionCounts,
    researched: BTreeSet<UpgradeId>,
}

impl InventoryIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the index from a snapshot.
    #[must_use]
    pub fn from_snapshot(snapshot: &GameStateSnapshot) -> Self {
        let mut index = Self::new();

        for unit in &snapshot.units {
            let entry = index.counts.entry(Producible::Unit(unit.unit_type)).or_default();
            if unit.is_ready() {
                entry.ready += 1;
            } else {
                entry.under_construction += 1;
            }
        }

        for &(target, count) in &snapshot.pending {
            index.counts.entry(target).or_default().pending += count;
        }

        index.researched.clone_from(&snapshot.upgrades);
        index
    }

    /// Set counts directly.
    pub fn set(&mut self, target: impl Into<Producible>, counts: TypeCounts) {
        self.counts.insert(target.into(), counts);
    }

    /// Counts for `target`, zero if never seen.
    #[must_use]
    pub fn counts(&self, target: impl Into<Producible>) -> TypeCounts {
        self.counts.get(&target.into()).copied().unwrap_or_default()
    }

    /// Finished instances of `unit`.
    #[must_use]
    pub fn ready(&self, unit: UnitTypeId) -> u32 {
        self.counts(unit).ready
    }

    /// Finished plus under construction.
    #[must_use]
    pub fn total(&self, unit: UnitTypeId) -> u32 {
        self.counts(unit).total()
    }

    /// Orders in flight for `target`.
    #[must_use]
    pub fn pending(&self, target: impl Into<Producible>) -> u32 {
        self.counts(target).pending
    }

    /// Total plus pending.
    #[must_use]
    pub fn planned(&self, unit: UnitTypeId) -> u32 {
        self.counts(unit).planned()
    }

    /// Sum of `scope` over several types.
    #[must_use]
    pub fn sum(&self, types: &[UnitTypeId], scope: CountScope) -> u32 {
        types.iter().map(|t| scope.pick(self.counts(*t))).sum()
    }

    /// Whether `upgrade` has completed.
    #[must_use]
    pub fn is_researched(&self, upgrade: UpgradeId) -> bool {
        self.researched.contains(&upgrade)
    }

    /// Whether `upgrade` has completed or is being researched.
    #[must_use]
    pub fn research_started(&self, upgrade: UpgradeId) -> bool {
        self.is_researched(upgrade) || self.pending(upgrade) > 0
    }

    /// Record an issued order.
    pub fn record_dispatch(&mut self, target: impl Into<Producible>) {
        self.counts.entry(target.into()).or_default().pending += 1;
    }

    /// Record that one order for `target` finished.
    pub fn record_completion(&mut self, target: impl Into<Producible>) {
        let target = target.into();
        #[cfg(feature = "debug-validation")]
        if self.pending(target) == 0 {
            tracing::warn!(%target, "Completion recorded without a pending order");
        }

        match target {
            Producible::Upgrade(upgrade) => {
                self.researched.insert(upgrade);
                let entry = self.counts.entry(target).or_default();
                entry.pending = entry.pending.saturating_sub(1);
            }
            Producible::Unit(_) => {
                let entry = self.counts.entry(target).or_default();
                entry.pending = entry.pending.saturating_sub(1);
                entry.ready += 1;
            }
        }
    }
}
