//! Resource accounting for a single tick.
//!
//! The snapshot stock is immutable; the ledger layers this tick's commitments
//! on top so later dispatches in the same tick see what earlier ones spent.

use serde::{Deserialize, Serialize};

/// Price of one production order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Cost {
    /// Primary resource (minerals).
    pub primary: u32,
    /// Secondary resource (vespene).
    pub secondary: u32,
    /// Supply consumed while the unit lives.
    pub supply: u32,
}

impl Cost {
    /// Free.
    pub const ZERO: Self = Self::new(0, 0, 0);

    /// Create a new cost.
    #[must_use]
    pub const fn new(primary: u32, secondary: u32, supply: u32) -> Self {
        Self {
            primary,
            secondary,
            supply,
        }
    }

    /// Cost paid only in primary resource.
    #[must_use]
    pub const fn primary(amount: u32) -> Self {
        Self::new(amount, 0, 0)
    }
}

impl std::ops::Add for Cost {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self::new(
            self.primary + rhs.primary,
            self.secondary + rhs.secondary,
            self.supply + rhs.supply,
        )
    }
}

impl std::ops::AddAssign for Cost {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

/// Stock and supply as reported by the game at the start of a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResourceSnapshot {
    /// Primary resource stock.
    pub primary: u32,
    /// Secondary resource stock.
    pub secondary: u32,
    /// Supply currently used.
    pub supply_used: u32,
    /// Supply capacity.
    pub supply_cap: u32,
}

impl ResourceSnapshot {
    /// Create a new snapshot.
    #[must_use]
    pub const fn new(primary: u32, secondary: u32, supply_used: u32, supply_cap: u32) -> Self {
        Self {
            primary,
            secondary,
            supply_used,
            supply_cap,
        }
    }

    /// Free supply. Never negative.
    #[must_use]
    pub const fn supply_left(&self) -> u32 {
        self.supply_cap.saturating_sub(self.supply_used)
    }
}

/// Affordability view for one tick.
#[derive(Debug, Clone)]
pub struct ResourceLedger {
    snapshot: ResourceSnapshot,
    committed: Cost,
}

impl ResourceLedger {
    /// Start a fresh ledger for this tick.
    #[must_use]
    pub const fn new(snapshot: ResourceSnapshot) -> Self {
        Self {
            snapshot,
            committed: Cost::ZERO,
        }
    }

    /// The unmodified snapshot.
    #[must_use]
    pub const fn snapshot(&self) -> &ResourceSnapshot {
        &self.snapshot
    }

    /// Everything committed so far this tick.
    #[must_use]
    pub const fn committed(&self) -> Cost {
        self.committed
    }

    /// Primary resource still uncommitted.
    #[must_use]
    pub const fn primary(&self) -> u32 {
        self.snapshot.primary.saturating_sub(self.committed.primary)
    }

    /// Secondary resource still uncommitted.
    #[must_use]
    pub const fn secondary(&self) -> u32 {
        self.snapshot.secondary.saturating_sub(self.committed.secondary)
    }

    /// Supply used including this tick's commitments.
    #[must_use]
    pub const fn supply_used(&self) -> u32 {
        self.snapshot.supply_used + self.committed.supply
    }

    /// Free supply after this tick's commitments.
    #[must_use]
    pub const fn supply_left(&self) -> u32 {
        self.snapshot.supply_left().saturating_sub(self.committed.supply)
    }

    /// Check if the remaining stock and supply cover `cost`.
    #[must_use]
    pub const fn can_afford(&self, cost: Cost) -> bool {
        self.primary() >= cost.primary
            && self.secondary() >= cost.secondary
            && self.supply_left() >= cost.supply
    }

    /// Commit `cost` if affordable.
    ///
    /// Returns true if the commitment was recorded.
    pub fn commit(&mut self, cost: Cost) -> bool {
        if self.can_afford(cost) {
            self.committed += cost;
            true
        } else {
            false
        }
    }
}
