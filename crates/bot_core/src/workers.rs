//! Worker production policy.

use serde::{Deserialize, Serialize};

use crate::error::{BotError, Result};
use crate::inventory::InventoryIndex;
use crate::types::UnitTypeId;

/// Workers that fully saturate one townhall.
pub const FULL_SATURATION: u32 = 22;

/// Global worker cap.
pub const MAX_WORKERS: u32 = 70;

/// Train workers until every townhall is saturated or the cap is hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerPolicy {
    /// Workers per townhall.
    pub saturation_per_townhall: u32,
    /// Hard cap across all bases.
    pub max_workers: u32,
}

impl Default for WorkerPolicy {
    fn default() -> Self {
        Self {
            saturation_per_townhall: FULL_SATURATION,
            max_workers: MAX_WORKERS,
        }
    }
}

impl WorkerPolicy {
    /// Reject a zero saturation target.
    pub fn validate(&self) -> Result<()> {
        if self.saturation_per_townhall == 0 {
            return Err(BotError::InvalidValue {
                field: "workers.saturation_per_townhall",
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Whether another worker should be ordered, counting orders in flight.
    #[must_use]
    pub fn wants_worker(&self, inventory: &InventoryIndex) -> bool {
        let workers = inventory.planned(UnitTypeId::Probe);
        let townhalls = inventory.total(UnitTypeId::Nexus);
        workers < townhalls.saturating_mul(self.saturation_per_townhall) && workers < self.max_workers
    }
}
