//! Deterministic stand-in for a live match.
//!
//! [`MockGame`] accepts the controller's commands, charges their cost, runs
//! build timers at one game second per tick and hands out the next snapshot.
//! There is no opponent: attack orders only move units.

use std::collections::BTreeSet;

use bot_core::catalog::Catalog;
use bot_core::command::{Command, CommandRejected, CommandSink, PlacementService};
use bot_core::ledger::{Cost, ResourceSnapshot};
use bot_core::math::{Fixed, Vec2Fixed};
use bot_core::snapshot::{GameStateSnapshot, MapInfo, OwnedUnit, FULL_PROGRESS};
use bot_core::types::{Producible, UnitTag, UnitTypeId, UpgradeId};
use tracing::{debug, trace};

/// Supply granted by a finished townhall.
const TOWNHALL_SUPPLY: u32 = 15;
/// Supply granted by a finished pylon.
const PYLON_SUPPLY: u32 = 8;
const MAX_SUPPLY: u32 = 200;
/// Workers one townhall's primary field can take.
const PRIMARY_SLOTS: u32 = 16;
/// Workers one extractor can take.
const SECONDARY_SLOTS: u32 = 3;
/// Geysers next to each townhall.
const GEYSERS_PER_TOWNHALL: usize = 2;
/// Ticks between a warp-in order and the unit appearing.
const WARP_IN_TICKS: u32 = 4;
/// Workers at the start of a match.
const STARTING_WORKERS: u32 = 12;
/// Primary stock at the start of a match.
const STARTING_PRIMARY: u32 = 50;
/// Squared distance below which two structures overlap.
const STRUCTURE_CLEARANCE_SQ: i32 = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JobKind {
    Construct { tag: UnitTag },
    Train { producer: UnitTag, unit: UnitTypeId },
    Warp { unit: UnitTypeId, at: Vec2Fixed },
    Cooldown { producer: UnitTag },
    Research { producer: UnitTag, upgrade: UpgradeId },
    Transform { tag: UnitTag },
}

#[derive(Debug, Clone, Copy)]
struct Job {
    kind: JobKind,
    elapsed: u32,
    total: u32,
}

impl Job {
    const fn new(kind: JobKind, total: u32) -> Self {
        Self {
            kind,
            elapsed: 0,
            total: if total == 0 { 1 } else { total },
        }
    }

    const fn is_done(&self) -> bool {
        self.elapsed >= self.total
    }
}

/// Single-player mock match.
#[derive(Debug, Clone)]
pub struct MockGame {
    catalog: Catalog,
    map: MapInfo,
    expansions: Vec<Vec2Fixed>,
    tick: u64,
    primary: u32,
    secondary: u32,
    units: Vec<OwnedUnit>,
    jobs: Vec<Job>,
    upgrades: BTreeSet<UpgradeId>,
    merging: Vec<UnitTag>,
    next_tag: u64,
    last_supply: u32,
    accepted: u64,
    rejected: u64,
    attack_orders: u64,
}

impl MockGame {
    /// Start a match on `map` with a townhall and workers at the start
    /// location. `expansions` are handed out in order as townhalls are
    /// ordered.
    #[must_use]
    pub fn new(catalog: Catalog, mut map: MapInfo, expansions: Vec<Vec2Fixed>) -> Self {
        map.next_expansion = expansions.first().copied();
        let mut game = Self {
            catalog,
            map,
            expansions,
            tick: 0,
            primary: STARTING_PRIMARY,
            secondary: 0,
            units: Vec::new(),
            jobs: Vec::new(),
            upgrades: BTreeSet::new(),
            merging: Vec::new(),
            next_tag: 1,
            last_supply: 0,
            accepted: 0,
            rejected: 0,
            attack_orders: 0,
        };

        let start = game.map.start_location;
        game.spawn(UnitTypeId::Nexus, start);
        for _ in 0..STARTING_WORKERS {
            game.spawn(UnitTypeId::Probe, start + Vec2Fixed::from_ints(4, 0));
        }
        game.last_supply = game.supply_used();
        game
    }

    /// A 200x200 map with the main in the lower-left corner and three
    /// expansions.
    #[must_use]
    pub fn standard() -> Self {
        let map = MapInfo {
            map_center: Vec2Fixed::from_ints(100, 100),
            start_location: Vec2Fixed::from_ints(20, 20),
            enemy_start: Vec2Fixed::from_ints(180, 180),
            main_ramp: Vec2Fixed::from_ints(32, 30),
            ramps: vec![
                Vec2Fixed::from_ints(32, 30),
                Vec2Fixed::from_ints(52, 44),
                Vec2Fixed::from_ints(100, 96),
                Vec2Fixed::from_ints(148, 156),
                Vec2Fixed::from_ints(168, 170),
            ],
            next_expansion: None,
        };
        let expansions = vec![
            Vec2Fixed::from_ints(58, 24),
            Vec2Fixed::from_ints(24, 70),
            Vec2Fixed::from_ints(96, 36),
        ];
        Self::new(Catalog::standard(), map, expansions)
    }

    /// Static map information.
    #[must_use]
    pub const fn map(&self) -> &MapInfo {
        &self.map
    }

    /// Current game tick.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// All owned units and structures.
    #[must_use]
    pub fn units(&self) -> &[OwnedUnit] {
        &self.units
    }

    /// Completed upgrades.
    #[must_use]
    pub const fn upgrades(&self) -> &BTreeSet<UpgradeId> {
        &self.upgrades
    }

    /// Stock and supply right now.
    #[must_use]
    pub fn resources(&self) -> ResourceSnapshot {
        ResourceSnapshot::new(self.primary, self.secondary, self.supply_used(), self.supply_cap())
    }

    /// Commands accepted so far.
    #[must_use]
    pub const fn accepted(&self) -> u64 {
        self.accepted
    }

    /// Commands refused so far.
    #[must_use]
    pub const fn rejected(&self) -> u64 {
        self.rejected
    }

    /// Attack orders received so far.
    #[must_use]
    pub const fn attack_orders(&self) -> u64 {
        self.attack_orders
    }

    /// Finished units of `unit_type`.
    #[must_use]
    pub fn count_ready(&self, unit_type: UnitTypeId) -> usize {
        self.units
            .iter()
            .filter(|u| u.unit_type == unit_type && u.is_ready())
            .count()
    }

    /// Observe the match. Reward is the supply gained since the previous
    /// observation.
    pub fn snapshot(&mut self, is_final: bool) -> GameStateSnapshot {
        let supply = self.supply_used();
        let reward = f64::from(supply) - f64::from(self.last_supply);
        self.last_supply = supply;

        let mut pending: Vec<(Producible, u32)> = Vec::new();
        for job in &self.jobs {
            let target = match job.kind {
                JobKind::Train { unit, .. } | JobKind::Warp { unit, .. } => Producible::Unit(unit),
                JobKind::Research { upgrade, .. } => Producible::Upgrade(upgrade),
                _ => continue,
            };
            match pending.iter_mut().find(|(t, _)| *t == target) {
                Some((_, count)) => *count += 1,
                None => pending.push((target, 1)),
            }
        }

        GameStateSnapshot {
            tick: self.tick,
            resources: self.resources(),
            units: self.units.clone(),
            pending,
            upgrades: self.upgrades.clone(),
            map: self.map.clone(),
            reward,
            is_final,
        }
    }

    /// Placement over the structures standing right now.
    #[must_use]
    pub fn placement(&self) -> GridPlacement {
        GridPlacement {
            structures: self
                .units
                .iter()
                .filter(|u| u.unit_type.is_structure())
                .map(|u| (u.unit_type, u.position))
                .collect(),
        }
    }

    /// Advance one game second: harvest, then run every timer.
    pub fn step(&mut self) {
        self.harvest();

        for job in &mut self.jobs {
            job.elapsed += 1;
        }
        for job in &self.jobs {
            if let JobKind::Construct { tag } = job.kind {
                let progress = job.elapsed.saturating_mul(u32::from(FULL_PROGRESS)) / job.total;
                if let Some(unit) = self.units.iter_mut().find(|u| u.tag == tag) {
                    unit.build_progress = u8::try_from(progress.min(u32::from(FULL_PROGRESS) - 1)).unwrap_or(0);
                }
            }
        }

        let (finished, running): (Vec<Job>, Vec<Job>) = self.jobs.drain(..).partition(Job::is_done);
        self.jobs = running;
        for job in finished {
            self.complete(job.kind);
        }

        self.tick += 1;
    }

    fn harvest(&mut self) {
        let townhalls = u32::try_from(self.count_ready(UnitTypeId::Nexus)).unwrap_or(u32::MAX);
        let extractors = u32::try_from(self.count_ready(UnitTypeId::Assimilator)).unwrap_or(u32::MAX);
        let workers = u32::try_from(
            self.units
                .iter()
                .filter(|u| u.unit_type.is_worker() && u.queue_len == 0)
                .count(),
        )
        .unwrap_or(u32::MAX);

        let on_primary = workers.min(townhalls.saturating_mul(PRIMARY_SLOTS));
        let on_secondary = (workers - on_primary).min(extractors.saturating_mul(SECONDARY_SLOTS));
        self.primary = self.primary.saturating_add(on_primary);
        self.secondary = self.secondary.saturating_add(on_secondary);
    }

    fn complete(&mut self, kind: JobKind) {
        match kind {
            JobKind::Construct { tag } => {
                let Some(index) = self.units.iter().position(|u| u.tag == tag) else {
                    return;
                };
                self.units[index].build_progress = FULL_PROGRESS;
                debug!(tick = self.tick, structure = %self.units[index].unit_type, "Structure finished");
                self.maybe_transform(tag);
            }
            JobKind::Train { producer, unit } => {
                let at = self.position_of(producer).unwrap_or(self.map.start_location);
                self.spawn(unit, at + Vec2Fixed::from_ints(2, 2));
                self.release(producer);
                self.maybe_transform(producer);
            }
            JobKind::Warp { unit, at } => {
                self.spawn(unit, at);
            }
            JobKind::Cooldown { producer } => self.release(producer),
            JobKind::Research { producer, upgrade } => {
                self.upgrades.insert(upgrade);
                debug!(tick = self.tick, ?upgrade, "Research finished");
                self.release(producer);
                if upgrade == UpgradeId::WarpGateResearch {
                    let gateways: Vec<UnitTag> = self
                        .units
                        .iter()
                        .filter(|u| u.unit_type == UnitTypeId::Gateway)
                        .map(|u| u.tag)
                        .collect();
                    for tag in gateways {
                        self.maybe_transform(tag);
                    }
                } else {
                    self.maybe_transform(producer);
                }
            }
            JobKind::Transform { tag } => {
                if let Some(unit) = self.units.iter_mut().find(|u| u.tag == tag) {
                    unit.unit_type = UnitTypeId::WarpGate;
                    unit.queue_len = 0;
                }
            }
        }
    }

    /// Turn an idle, finished gateway into a warp gate once the research is
    /// done.
    fn maybe_transform(&mut self, tag: UnitTag) {
        if !self.upgrades.contains(&UpgradeId::WarpGateResearch) {
            return;
        }
        let total = self.catalog.get(UnitTypeId::WarpGate).map_or(1, |b| b.build_time);
        let Some(unit) = self.units.iter_mut().find(|u| u.tag == tag) else {
            return;
        };
        if unit.unit_type == UnitTypeId::Gateway && unit.is_ready() && unit.queue_len == 0 {
            unit.queue_len = 1;
            self.jobs.push(Job::new(JobKind::Transform { tag }, total));
        }
    }

    fn spawn(&mut self, unit_type: UnitTypeId, position: Vec2Fixed) -> UnitTag {
        let tag = UnitTag(self.next_tag);
        self.next_tag += 1;
        self.units.push(OwnedUnit::new(tag, unit_type, position));
        tag
    }

    fn position_of(&self, tag: UnitTag) -> Option<Vec2Fixed> {
        self.units.iter().find(|u| u.tag == tag).map(|u| u.position)
    }

    fn release(&mut self, producer: UnitTag) {
        if let Some(unit) = self.units.iter_mut().find(|u| u.tag == producer) {
            unit.queue_len = unit.queue_len.saturating_sub(1);
        }
    }

    fn supply_cap(&self) -> u32 {
        let townhalls = u32::try_from(self.count_ready(UnitTypeId::Nexus)).unwrap_or(u32::MAX);
        let pylons = u32::try_from(self.count_ready(UnitTypeId::Pylon)).unwrap_or(u32::MAX);
        townhalls
            .saturating_mul(TOWNHALL_SUPPLY)
            .saturating_add(pylons.saturating_mul(PYLON_SUPPLY))
            .min(MAX_SUPPLY)
    }

    /// Supply of standing units plus everything queued.
    fn supply_used(&self) -> u32 {
        let standing: u32 = self
            .units
            .iter()
            .filter(|u| !u.unit_type.is_structure())
            .map(|u| self.catalog.cost(u.unit_type).supply)
            .sum();
        let queued: u32 = self
            .jobs
            .iter()
            .filter_map(|job| match job.kind {
                JobKind::Train { unit, .. } | JobKind::Warp { unit, .. } => Some(self.catalog.cost(unit).supply),
                _ => None,
            })
            .sum();
        standing + queued
    }

    fn requirements_met(&self, target: impl Into<Producible>) -> bool {
        self.catalog.get(target).is_some_and(|blueprint| {
            blueprint
                .requires
                .iter()
                .all(|required| self.count_ready(*required) > 0)
        })
    }

    fn charge(&mut self, cost: Cost) -> Result<(), CommandRejected> {
        if cost.primary > self.primary || cost.secondary > self.secondary {
            return Err(CommandRejected::new("insufficient resources"));
        }
        if cost.supply > self.supply_cap().saturating_sub(self.supply_used()) {
            return Err(CommandRejected::new("supply blocked"));
        }
        self.primary -= cost.primary;
        self.secondary -= cost.secondary;
        Ok(())
    }

    /// Find a finished, idle producer by tag.
    fn idle_producer(&self, tag: UnitTag, allowed: &[UnitTypeId]) -> Result<usize, CommandRejected> {
        let index = self
            .units
            .iter()
            .position(|u| u.tag == tag)
            .ok_or_else(|| CommandRejected::new(format!("unknown producer {tag}")))?;
        let unit = &self.units[index];
        if !allowed.contains(&unit.unit_type) || !unit.is_ready() {
            return Err(CommandRejected::new(format!("{tag} cannot produce this")));
        }
        if unit.queue_len > 0 {
            return Err(CommandRejected::new(format!("{tag} is busy")));
        }
        Ok(index)
    }

    fn apply(&mut self, command: Command) -> Result<(), CommandRejected> {
        match command {
            Command::BuildStructure { structure, position } => {
                if self.count_ready(UnitTypeId::Probe) == 0 {
                    return Err(CommandRejected::new("no worker to build with"));
                }
                if !self.requirements_met(structure) {
                    return Err(CommandRejected::new("requirement not ready"));
                }
                self.charge(self.catalog.cost(structure))?;
                let tag = self.spawn(structure, position);
                if let Some(unit) = self.units.last_mut() {
                    unit.build_progress = 0;
                }
                let total = self.catalog.get(structure).map_or(1, |b| b.build_time);
                self.jobs.push(Job::new(JobKind::Construct { tag }, total));
                if structure.is_townhall() {
                    self.expansions.retain(|spot| *spot != position);
                    self.map.next_expansion = self.expansions.first().copied();
                }
            }
            Command::TrainUnit { producer, unit } => {
                let index = self.idle_producer(producer, self.catalog.producers_of(unit))?;
                if !self.requirements_met(unit) {
                    return Err(CommandRejected::new("requirement not ready"));
                }
                self.charge(self.catalog.cost(unit))?;
                self.units[index].queue_len += 1;
                let total = self.catalog.get(unit).map_or(1, |b| b.build_time);
                self.jobs.push(Job::new(JobKind::Train { producer, unit }, total));
            }
            Command::WarpIn { producer, unit, position } => {
                let index = self.idle_producer(producer, &[UnitTypeId::WarpGate])?;
                if !self.requirements_met(unit) {
                    return Err(CommandRejected::new("requirement not ready"));
                }
                self.charge(self.catalog.cost(unit))?;
                self.units[index].queue_len += 1;
                let cooldown = self.catalog.get(unit).map_or(1, |b| b.build_time);
                self.jobs.push(Job::new(JobKind::Warp { unit, at: position }, WARP_IN_TICKS));
                self.jobs.push(Job::new(JobKind::Cooldown { producer }, cooldown));
            }
            Command::ResearchUpgrade { producer, upgrade } => {
                let index = self.idle_producer(producer, self.catalog.producers_of(upgrade))?;
                let in_progress = self
                    .jobs
                    .iter()
                    .any(|job| matches!(job.kind, JobKind::Research { upgrade: u, .. } if u == upgrade));
                if self.upgrades.contains(&upgrade) || in_progress {
                    return Err(CommandRejected::new("already researched"));
                }
                if !self.requirements_met(upgrade) {
                    return Err(CommandRejected::new("requirement not ready"));
                }
                self.charge(self.catalog.cost(upgrade))?;
                self.units[index].queue_len += 1;
                let total = self.catalog.get(upgrade).map_or(1, |b| b.build_time);
                self.jobs.push(Job::new(JobKind::Research { producer, upgrade }, total));
            }
            Command::MorphUnit { unit, into } => {
                let source = self
                    .units
                    .iter()
                    .find(|u| u.tag == unit)
                    .ok_or_else(|| CommandRejected::new(format!("unknown unit {unit}")))?;
                if source.unit_type != UnitTypeId::HighTemplar || into != UnitTypeId::Archon {
                    return Err(CommandRejected::new("cannot morph"));
                }
                if !self.merging.contains(&unit) {
                    self.merging.push(unit);
                }
                if self.merging.len() >= 2 {
                    let pair: Vec<UnitTag> = self.merging.drain(..2).collect();
                    let at = source.position;
                    self.units.retain(|u| !pair.contains(&u.tag));
                    self.spawn(UnitTypeId::Archon, at);
                    debug!(tick = self.tick, "Archon merged");
                }
            }
            Command::MoveUnits { units, position } => self.relocate(&units, position),
            Command::AttackPosition { units, position } => {
                self.attack_orders += 1;
                self.relocate(&units, position);
            }
        }
        Ok(())
    }

    fn relocate(&mut self, tags: &[UnitTag], position: Vec2Fixed) {
        for unit in self.units.iter_mut().filter(|u| tags.contains(&u.tag)) {
            unit.position = position;
        }
    }
}

impl CommandSink for MockGame {
    fn submit(&mut self, command: Command) -> Result<(), CommandRejected> {
        trace!(tick = self.tick, ?command, "Command received");
        match self.apply(command) {
            Ok(()) => {
                self.accepted += 1;
                Ok(())
            }
            Err(rejected) => {
                debug!(tick = self.tick, reason = %rejected.reason, "Command rejected");
                self.rejected += 1;
                Err(rejected)
            }
        }
    }
}

/// Placement over a fixed set of standing structures.
///
/// Structures keep a small clearance from each other, each townhall has two
/// geysers and warp-ins land wherever they are aimed.
#[derive(Debug, Clone, Default)]
pub struct GridPlacement {
    structures: Vec<(UnitTypeId, Vec2Fixed)>,
}

impl GridPlacement {
    fn is_clear(&self, spot: Vec2Fixed) -> bool {
        let clearance = Fixed::from_num(STRUCTURE_CLEARANCE_SQ);
        self.structures
            .iter()
            .all(|(_, position)| position.distance_squared(spot) >= clearance)
    }

    fn free_geyser(&self, townhall: Vec2Fixed) -> Option<Vec2Fixed> {
        [Vec2Fixed::from_ints(7, 0), Vec2Fixed::from_ints(0, 7)]
            .into_iter()
            .take(GEYSERS_PER_TOWNHALL)
            .map(|offset| townhall + offset)
            .find(|geyser| {
                !self
                    .structures
                    .iter()
                    .any(|(kind, position)| *kind == UnitTypeId::Assimilator && position == geyser)
            })
    }

    /// Nearest clear spot on a three-cell grid around `near`.
    fn search(&self, near: Vec2Fixed) -> Option<Vec2Fixed> {
        (0i32..=4).find_map(|ring| {
            (-ring..=ring)
                .flat_map(|dx| (-ring..=ring).map(move |dy| (dx, dy)))
                .filter(|(dx, dy)| dx.abs().max(dy.abs()) == ring)
                .map(|(dx, dy)| near + Vec2Fixed::from_ints(dx * 3, dy * 3))
                .find(|spot| self.is_clear(*spot))
        })
    }
}

impl PlacementService for GridPlacement {
    fn find_placement(&mut self, structure: UnitTypeId, near: Vec2Fixed) -> Option<Vec2Fixed> {
        if !structure.is_structure() {
            return Some(near);
        }
        let spot = match structure {
            UnitTypeId::Assimilator => self.free_geyser(near),
            UnitTypeId::Nexus => self.is_clear(near).then_some(near),
            _ => self.search(near),
        }?;
        self.structures.push((structure, spot));
        Some(spot)
    }
}
