//! Test fixtures and helpers.
//!
//! Pre-built maps, snapshot builders and stub collaborators for consistent
//! testing.

use bot_core::command::{Command, CommandRejected, CommandSink, PlacementService};
use bot_core::ledger::ResourceSnapshot;
use bot_core::math::Vec2Fixed;
use bot_core::snapshot::{GameStateSnapshot, MapInfo, OwnedUnit};
use bot_core::types::{Producible, UnitTag, UnitTypeId, UpgradeId};
use fixed::types::I32F32;

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a fixed-point position from integers.
#[must_use]
pub fn pos(x: i32, y: i32) -> Vec2Fixed {
    Vec2Fixed::from_ints(x, y)
}

/// A 200x200 map with the own base in the lower-left corner.
#[must_use]
pub fn standard_map() -> MapInfo {
    MapInfo {
        map_center: pos(100, 100),
        start_location: pos(20, 20),
        enemy_start: pos(180, 180),
        main_ramp: pos(32, 30),
        ramps: vec![pos(32, 30), pos(52, 44), pos(100, 96), pos(148, 156), pos(168, 170)],
        next_expansion: Some(pos(58, 24)),
    }
}

/// Incremental [`GameStateSnapshot`] builder handing out unit tags in order.
#[derive(Debug, Clone)]
pub struct SnapshotBuilder {
    snapshot: GameStateSnapshot,
    next_tag: u64,
}

impl Default for SnapshotBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotBuilder {
    /// Empty snapshot on [`standard_map`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            snapshot: GameStateSnapshot {
                map: standard_map(),
                ..GameStateSnapshot::default()
            },
            next_tag: 1,
        }
    }

    /// A single townhall with twelve harvesting workers and 50 primary.
    #[must_use]
    pub fn opening() -> Self {
        let mut builder = Self::new()
            .resources(50, 0, 12, 15)
            .unit(UnitTypeId::Nexus, pos(20, 20));
        for _ in 0..12 {
            builder = builder.busy(UnitTypeId::Probe, pos(24, 20), 1);
        }
        builder
    }

    /// Set the tick.
    #[must_use]
    pub fn tick(mut self, tick: u64) -> Self {
        self.snapshot.tick = tick;
        self
    }

    /// Set stock and supply.
    #[must_use]
    pub fn resources(mut self, primary: u32, secondary: u32, supply_used: u32, supply_cap: u32) -> Self {
        self.snapshot.resources = ResourceSnapshot::new(primary, secondary, supply_used, supply_cap);
        self
    }

    /// Add a finished, idle unit.
    #[must_use]
    pub fn unit(self, unit_type: UnitTypeId, position: Vec2Fixed) -> Self {
        self.busy(unit_type, position, 0)
    }

    /// Add several finished, idle units at one position.
    #[must_use]
    pub fn units(mut self, unit_type: UnitTypeId, count: u32, position: Vec2Fixed) -> Self {
        for _ in 0..count {
            self = self.unit(unit_type, position);
        }
        self
    }

    /// Add a finished unit with `queue_len` orders.
    #[must_use]
    pub fn busy(mut self, unit_type: UnitTypeId, position: Vec2Fixed, queue_len: u32) -> Self {
        let tag = self.take_tag();
        self.snapshot
            .units
            .push(OwnedUnit::new(tag, unit_type, position).with_queue(queue_len));
        self
    }

    /// Add a structure still under construction.
    #[must_use]
    pub fn building(mut self, unit_type: UnitTypeId, position: Vec2Fixed, progress: u8) -> Self {
        let tag = self.take_tag();
        self.snapshot
            .units
            .push(OwnedUnit::new(tag, unit_type, position).with_progress(progress));
        self
    }

    /// Record orders in flight for `target`.
    #[must_use]
    pub fn pending(mut self, target: impl Into<Producible>, count: u32) -> Self {
        self.snapshot.pending.push((target.into(), count));
        self
    }

    /// Mark an upgrade as finished.
    #[must_use]
    pub fn upgrade(mut self, upgrade: UpgradeId) -> Self {
        self.snapshot.upgrades.insert(upgrade);
        self
    }

    /// Replace the map.
    #[must_use]
    pub fn map(mut self, map: MapInfo) -> Self {
        self.snapshot.map = map;
        self
    }

    /// Finish building.
    #[must_use]
    pub fn build(self) -> GameStateSnapshot {
        self.snapshot
    }

    fn take_tag(&mut self) -> UnitTag {
        let tag = UnitTag(self.next_tag);
        self.next_tag += 1;
        tag
    }
}

/// Accepts every spot it is asked about.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnywherePlacement;

impl PlacementService for AnywherePlacement {
    fn find_placement(&mut self, _structure: UnitTypeId, near: Vec2Fixed) -> Option<Vec2Fixed> {
        Some(near)
    }
}

/// Never finds a spot.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPlacement;

impl PlacementService for NoPlacement {
    fn find_placement(&mut self, _structure: UnitTypeId, _near: Vec2Fixed) -> Option<Vec2Fixed> {
        None
    }
}

/// Rejects every command after accepting the first `accept` of them.
#[derive(Debug, Clone, Default)]
pub struct RejectingSink {
    accept: usize,
    /// Commands accepted before rejecting began.
    pub accepted: Vec<Command>,
    /// Number of rejected submissions.
    pub rejected: usize,
}

impl RejectingSink {
    /// Accept `accept` commands, then reject everything.
    #[must_use]
    pub fn after(accept: usize) -> Self {
        Self {
            accept,
            ..Self::default()
        }
    }
}

impl CommandSink for RejectingSink {
    fn submit(&mut self, command: Command) -> Result<(), CommandRejected> {
        if self.accepted.len() < self.accept {
            self.accepted.push(command);
            Ok(())
        } else {
            self.rejected += 1;
            Err(CommandRejected::new("sink closed"))
        }
    }
}
