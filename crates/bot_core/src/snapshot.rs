//! Per-tick observation of the game, as handed to the controller.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::ledger::ResourceSnapshot;
use crate::math::Vec2Fixed;
use crate::types::{Producible, UnitTag, UnitTypeId, UpgradeId};

/// Build progress value of a finished unit or structure.
pub const FULL_PROGRESS: u8 = 100;

/// One owned unit or structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnedUnit {
    /// Game-assigned tag.
    pub tag: UnitTag,
    /// Type of the unit.
    pub unit_type: UnitTypeId,
    /// Current position.
    pub position: Vec2Fixed,
    /// Construction progress, 0-100. Units are always 100.
    pub build_progress: u8,
    /// Orders currently queued on this unit.
    pub queue_len: u32,
}

impl OwnedUnit {
    /// Create a finished, idle unit.
    #[must_use]
    pub const fn new(tag: UnitTag, unit_type: UnitTypeId, position: Vec2Fixed) -> Self {
        Self {
            tag,
            unit_type,
            position,
            build_progress: FULL_PROGRESS,
            queue_len: 0,
        }
    }

    /// Set construction progress.
    #[must_use]
    pub const fn with_progress(mut self, build_progress: u8) -> Self {
        self.build_progress = build_progress;
        self
    }

    /// Set the order queue length.
    #[must_use]
    pub const fn with_queue(mut self, queue_len: u32) -> Self {
        self.queue_len = queue_len;
        self
    }

    /// Whether construction has finished.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        self.build_progress >= FULL_PROGRESS
    }

    /// Whether the unit has no queued orders.
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        self.queue_len == 0
    }
}

/// Map landmarks the controller positions things against.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MapInfo {
    /// Geometric centre of the playable area.
    pub map_center: Vec2Fixed,
    /// Own starting townhall location.
    pub start_location: Vec2Fixed,
    /// Enemy starting location; the attack target.
    pub enemy_start: Vec2Fixed,
    /// Top of the main base ramp.
    pub main_ramp: Vec2Fixed,
    /// Tops of all ramps on the map.
    pub ramps: Vec<Vec2Fixed>,
    /// Where the next townhall should go, if any location is free.
    pub next_expansion: Option<Vec2Fixed>,
}

impl MapInfo {
    /// Staging point in front of the natural expansion: the top of the
    /// second-closest ramp to the start location.
    ///
    /// Falls back to the main ramp when fewer than two ramps are known.
    #[must_use]
    pub fn natural_staging(&self) -> Vec2Fixed {
        let mut ramps = self.ramps.clone();
        ramps.sort_by_key(|r| r.distance_squared(self.start_location));
        ramps.get(1).copied().unwrap_or(self.main_ramp)
    }
}

/// Everything the controller sees at one tick.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GameStateSnapshot {
    /// Game tick the snapshot was taken at.
    pub tick: u64,
    /// Stock and supply.
    pub resources: ResourceSnapshot,
    /// Owned units and structures, finished or not.
    pub units: Vec<OwnedUnit>,
    /// Orders in flight per target (queued or in production, not yet
    /// represented as units).
    pub pending: Vec<(Producible, u32)>,
    /// Completed upgrades.
    pub upgrades: BTreeSet<UpgradeId>,
    /// Map landmarks.
    pub map: MapInfo,
    /// Reward signal since the previous tick, for learning selectors.
    #[serde(default)]
    pub reward: f64,
    /// Set on the last snapshot of a match.
    #[serde(default)]
    pub is_final: bool,
}

impl GameStateSnapshot {
    /// Iterate owned units of `unit_type`.
    pub fn units_of(&self, unit_type: UnitTypeId) -> impl Iterator<Item = &OwnedUnit> {
        self.units.iter().filter(move |u| u.unit_type == unit_type)
    }

    /// Iterate owned townhalls.
    pub fn townhalls(&self) -> impl Iterator<Item = &OwnedUnit> {
        self.units.iter().filter(|u| u.unit_type.is_townhall())
    }

    /// The most recently created townhall (highest tag).
    #[must_use]
    pub fn newest_townhall(&self) -> Option<&OwnedUnit> {
        self.townhalls().max_by_key(|u| u.tag)
    }

    /// Iterate army units (non-structure, non-worker).
    pub fn army(&self) -> impl Iterator<Item = &OwnedUnit> {
        self.units.iter().filter(|u| u.unit_type.is_army())
    }

    /// Whether `upgrade` has finished.
    #[must_use]
    pub fn has_upgrade(&self, upgrade: UpgradeId) -> bool {
        self.upgrades.contains(&upgrade)
    }
}
