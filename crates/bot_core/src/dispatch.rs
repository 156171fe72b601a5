//! Turning selections into commands.
//!
//! A [`DispatchSession`] lives for one tick. It owns the tick's ledger,
//! inventory and producer claims, and is the only place where resources are
//! committed and `pending` counts grow. Every dispatch re-checks
//! affordability, tech requirements and producer availability immediately
//! before the command goes to the sink.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::catalog::Catalog;
use crate::command::{Command, CommandSink, PlacementService};
use crate::composition::ProducerAvailability;
use crate::condition::EvalContext;
use crate::error::{BotError, Result};
use crate::inventory::InventoryIndex;
use crate::jitter::Jitter;
use crate::ladder::{BuildStep, PlacementHint};
use crate::ledger::{Cost, ResourceLedger};
use crate::math::{Fixed, Vec2Fixed};
use crate::producers::{ProducerPool, ProducerSlot};
use crate::snapshot::GameStateSnapshot;
use crate::types::{Producible, UnitTypeId, UpgradeId};

/// Default number of production commands per tick.
pub const DEFAULT_MAX_COMMANDS_PER_TICK: u32 = 8;

/// Distance from the warp-in pylon at which units arrive.
const WARP_IN_DISTANCE: i32 = 4;

/// Why a selection was not turned into a command this tick.
///
/// All of these are retried naturally on the next tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkipReason {
    /// Not enough resources or supply after earlier commitments.
    InsufficientResources,
    /// No ready, unclaimed producer of a matching type.
    NoProducerAvailable,
    /// The chosen producer's queue is at the depth limit.
    QueueFull,
    /// No legal position for the structure or warp-in.
    PlacementNotFound,
    /// No ladder step was eligible.
    NoEligibleStep,
    /// The sink refused the command.
    CommandRejected,
    /// A required structure is not ready.
    RequirementNotMet,
    /// The per-tick production budget is spent.
    TickBudgetExhausted,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InsufficientResources => write!(f, "Insufficient resources"),
            Self::NoProducerAvailable => write!(f, "No producer available"),
            Self::QueueFull => write!(f, "Production queue is full"),
            Self::PlacementNotFound => write!(f, "No placement found"),
            Self::NoEligibleStep => write!(f, "No eligible build step"),
            Self::CommandRejected => write!(f, "Command rejected by sink"),
            Self::RequirementNotMet => write!(f, "Tech requirement not met"),
            Self::TickBudgetExhausted => write!(f, "Tick command budget exhausted"),
        }
    }
}

impl std::error::Error for SkipReason {}

/// Dispatcher limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// A producer whose queue holds this many orders is full. 1 means only
    /// idle producers are used.
    pub queue_depth_limit: u32,
    /// Production commands allowed per tick.
    pub max_commands_per_tick: u32,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            queue_depth_limit: 1,
            max_commands_per_tick: DEFAULT_MAX_COMMANDS_PER_TICK,
        }
    }
}

impl DispatchConfig {
    /// Reject zero limits.
    pub fn validate(&self) -> Result<()> {
        if self.queue_depth_limit == 0 {
            return Err(BotError::InvalidValue {
                field: "dispatch.queue_depth_limit",
                message: "must be at least 1".to_string(),
            });
        }
        if self.max_commands_per_tick == 0 {
            return Err(BotError::InvalidValue {
                field: "dispatch.max_commands_per_tick",
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// What a decision component wants produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Selection {
    /// Build a structure.
    Structure {
        /// Structure type.
        structure: UnitTypeId,
        /// Where to look for a spot.
        placement: PlacementHint,
    },
    /// Train or warp in a unit.
    Unit {
        /// Unit type.
        unit: UnitTypeId,
    },
    /// Research an upgrade.
    Research {
        /// Upgrade.
        upgrade: UpgradeId,
    },
}

impl Selection {
    /// Selection for a ladder step.
    #[must_use]
    pub fn from_step(step: &BuildStep) -> Self {
        match step.target {
            Producible::Unit(unit) if unit.is_structure() => Self::Structure {
                structure: unit,
                placement: step.placement,
            },
            Producible::Unit(unit) => Self::Unit { unit },
            Producible::Upgrade(upgrade) => Self::Research { upgrade },
        }
    }

    /// What the selection produces.
    #[must_use]
    pub const fn target(&self) -> Producible {
        match *self {
            Self::Structure { structure, .. } => Producible::Unit(structure),
            Self::Unit { unit } => Producible::Unit(unit),
            Self::Research { upgrade } => Producible::Upgrade(upgrade),
        }
    }
}

/// Result of one dispatch attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchOutcome {
    /// What was attempted.
    pub target: Producible,
    /// Why it was skipped, or `None` if issued.
    pub skipped: Option<SkipReason>,
}

/// Per-tick dispatch state.
pub struct DispatchSession<'a> {
    catalog: &'a Catalog,
    snapshot: &'a GameStateSnapshot,
    ledger: ResourceLedger,
    inventory: InventoryIndex,
    pool: ProducerPool,
    jitter: &'a mut Jitter,
    placement: &'a mut dyn PlacementService,
    sink: &'a mut dyn CommandSink,
    budget_left: u32,
    rally_request: Option<Vec2Fixed>,
    outcomes: Vec<DispatchOutcome>,
}

impl<'a> DispatchSession<'a> {
    /// Open a session over a fresh snapshot.
    pub fn new(
        catalog: &'a Catalog,
        snapshot: &'a GameStateSnapshot,
        config: &DispatchConfig,
        jitter: &'a mut Jitter,
        placement: &'a mut dyn PlacementService,
        sink: &'a mut dyn CommandSink,
    ) -> Self {
        Self {
            catalog,
            snapshot,
            ledger: ResourceLedger::new(snapshot.resources),
            inventory: InventoryIndex::from_snapshot(snapshot),
            pool: ProducerPool::from_snapshot(snapshot, config.queue_depth_limit),
            jitter,
            placement,
            sink,
            budget_left: config.max_commands_per_tick,
            rally_request: None,
            outcomes: Vec::new(),
        }
    }

    /// Evaluation context reflecting this tick's commitments.
    #[must_use]
    pub fn ctx(&self) -> EvalContext<'_> {
        EvalContext::new(&self.inventory, &self.ledger)
    }

    /// The blueprint registry.
    #[must_use]
    pub const fn catalog(&self) -> &'a Catalog {
        self.catalog
    }

    /// The snapshot being acted on.
    #[must_use]
    pub const fn snapshot(&self) -> &'a GameStateSnapshot {
        self.snapshot
    }

    /// The tick's ledger.
    #[must_use]
    pub const fn ledger(&self) -> &ResourceLedger {
        &self.ledger
    }

    /// The tick's inventory.
    #[must_use]
    pub const fn inventory(&self) -> &InventoryIndex {
        &self.inventory
    }

    /// The tick's producer pool.
    #[must_use]
    pub const fn pool(&self) -> &ProducerPool {
        &self.pool
    }

    /// The jitter source.
    pub fn jitter(&mut self) -> &mut Jitter {
        &mut *self.jitter
    }

    /// Production commands still allowed this tick.
    #[must_use]
    pub const fn budget_left(&self) -> u32 {
        self.budget_left
    }

    /// Ask for the rally point to move once the tick ends.
    pub fn request_rally(&mut self, position: Vec2Fixed) {
        self.rally_request = Some(position);
    }

    /// Rally move requested this tick, if any.
    #[must_use]
    pub const fn rally_request(&self) -> Option<Vec2Fixed> {
        self.rally_request
    }

    /// Every dispatch attempt so far.
    #[must_use]
    pub fn outcomes(&self) -> &[DispatchOutcome] {
        &self.outcomes
    }

    /// Record a selection that never reached dispatch.
    pub fn record_skip(&mut self, target: Producible, reason: SkipReason) {
        debug!(%target, %reason, "Skipped");
        self.outcomes.push(DispatchOutcome {
            target,
            skipped: Some(reason),
        });
    }

    /// Tech requirements of `target` are ready.
    #[must_use]
    pub fn requirements_met(&self, target: impl Into<Producible>) -> bool {
        self.catalog
            .get(target)
            .is_some_and(|b| b.requires.iter().all(|r| self.inventory.ready(*r) > 0))
    }

    /// Which of `candidates` could be dispatched right now, ignoring cost.
    #[must_use]
    pub fn availability(&self, candidates: impl IntoIterator<Item = UnitTypeId>) -> ProducerAvailability {
        ProducerAvailability::new(candidates.into_iter().filter(|unit| {
            self.requirements_met(*unit) && self.pool.has_free(self.catalog.producers_of(*unit))
        }))
    }

    /// Issue `selection` or explain why not.
    ///
    /// On success the cost is committed, `pending` grows by one and the
    /// producer is claimed. On any skip nothing changes.
    pub fn dispatch(&mut self, selection: Selection) -> std::result::Result<Command, SkipReason> {
        let target = selection.target();
        let result = self.try_dispatch(selection);
        match &result {
            Ok(command) => {
                debug!(%target, ?command, "Issued");
                self.outcomes.push(DispatchOutcome { target, skipped: None });
            }
            Err(reason) => self.record_skip(target, *reason),
        }
        result
    }

    fn try_dispatch(&mut self, selection: Selection) -> std::result::Result<Command, SkipReason> {
        if self.budget_left == 0 {
            return Err(SkipReason::TickBudgetExhausted);
        }

        let target = selection.target();
        let catalog = self.catalog;
        let blueprint = catalog.get(target).ok_or(SkipReason::RequirementNotMet)?;
        let cost = blueprint.cost;
        if !self.ledger.can_afford(cost) {
            return Err(SkipReason::InsufficientResources);
        }
        if !self.requirements_met(target) {
            return Err(SkipReason::RequirementNotMet);
        }

        let producer = self.pool.select(&blueprint.producers)?;
        let command = match selection {
            Selection::Structure { structure, placement } => Command::BuildStructure {
                structure,
                position: self.place_structure(structure, placement)?,
            },
            Selection::Unit { unit } if producer.unit_type == UnitTypeId::WarpGate => Command::WarpIn {
                producer: producer.tag,
                unit,
                position: self.place_warp_in(unit)?,
            },
            Selection::Unit { unit } => Command::TrainUnit {
                producer: producer.tag,
                unit,
            },
            Selection::Research { upgrade } => Command::ResearchUpgrade {
                producer: producer.tag,
                upgrade,
            },
        };

        if let Err(rejected) = self.sink.submit(command.clone()) {
            warn!(%target, reason = %rejected.reason, "Command rejected");
            return Err(SkipReason::CommandRejected);
        }

        self.commit(target, cost, &producer);
        Ok(command)
    }

    fn commit(&mut self, target: Producible, cost: Cost, producer: &ProducerSlot) {
        let committed = self.ledger.commit(cost);
        debug_assert!(committed, "affordability checked before submit");
        self.inventory.record_dispatch(target);
        self.pool.claim(producer.tag);
        self.budget_left -= 1;
    }

    fn place_structure(
        &mut self,
        structure: UnitTypeId,
        hint: PlacementHint,
    ) -> std::result::Result<Vec2Fixed, SkipReason> {
        let center = self.snapshot.map.map_center;
        let near = match hint {
            PlacementHint::NearTownhall { max_offset } => {
                let townhall = self.random_ready(UnitTypeId::Nexus)?;
                let push = self.jitter.offset(max_offset);
                townhall.towards(center, Fixed::from_num(push))
            }
            PlacementHint::NearPylon { max_offset } => {
                let pylon = self.random_ready(UnitTypeId::Pylon)?;
                let push = self.jitter.offset(max_offset);
                pylon.towards(center, Fixed::from_num(push))
            }
            PlacementHint::Geyser => self.random_ready(UnitTypeId::Nexus)?,
            PlacementHint::Expansion => self.snapshot.map.next_expansion.ok_or(SkipReason::PlacementNotFound)?,
        };

        self.placement
            .find_placement(structure, near)
            .ok_or(SkipReason::PlacementNotFound)
    }

    fn random_ready(&mut self, unit_type: UnitTypeId) -> std::result::Result<Vec2Fixed, SkipReason> {
        let positions: Vec<Vec2Fixed> = self
            .snapshot
            .units_of(unit_type)
            .filter(|u| u.is_ready())
            .map(|u| u.position)
            .collect();
        let index = self.jitter.pick(positions.len()).ok_or(SkipReason::PlacementNotFound)?;
        Ok(positions[index])
    }

    /// Warp-ins arrive around the ready pylon closest to the newest townhall.
    fn place_warp_in(&mut self, unit: UnitTypeId) -> std::result::Result<Vec2Fixed, SkipReason> {
        let anchor = self
            .snapshot
            .newest_townhall()
            .map_or(self.snapshot.map.start_location, |t| t.position);
        let pylon = self
            .snapshot
            .units_of(UnitTypeId::Pylon)
            .filter(|p| p.is_ready())
            .min_by_key(|p| (p.position.distance_squared(anchor), p.tag))
            .ok_or(SkipReason::PlacementNotFound)?
            .position;

        let around = self.jitter.on_distance(pylon, Fixed::from_num(WARP_IN_DISTANCE));
        self.placement
            .find_placement(unit, around)
            .ok_or(SkipReason::PlacementNotFound)
    }

    /// Send a non-production order (morphs) straight to the sink.
    ///
    /// Does not touch the budget or the ledger.
    pub fn submit_order(&mut self, command: Command) -> std::result::Result<(), SkipReason> {
        self.sink.submit(command).map_err(|rejected| {
            warn!(reason = %rejected.reason, "Order rejected");
            SkipReason::CommandRejected
        })
    }

    /// Close the session, returning the tick's inventory and outcomes.
    #[must_use]
    pub fn finish(self) -> (InventoryIndex, Vec<DispatchOutcome>, Option<Vec2Fixed>) {
        (self.inventory, self.outcomes, self.rally_request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandRejected;
    use crate::ledger::ResourceSnapshot;
    use crate::snapshot::{MapInfo, OwnedUnit};
    use crate::types::UnitTag;

    struct AnywherePlacement;

    impl PlacementService for AnywherePlacement {
        fn find_placement(&mut self, _structure: UnitTypeId, near: Vec2Fixed) -> Option<Vec2Fixed> {
            Some(near)
        }
    }

    struct NowherePlacement;

    impl PlacementService for NowherePlacement {
        fn find_placement(&mut self, _structure: UnitTypeId, _near: Vec2Fixed) -> Option<Vec2Fixed> {
            None
        }
    }

    struct RejectingSink;

    impl CommandSink for RejectingSink {
        fn submit(&mut self, _command: Command) -> std::result::Result<(), CommandRejected> {
            Err(CommandRejected::new("not now"))
        }
    }

    fn base_snapshot(primary: u32, units: Vec<OwnedUnit>) -> GameStateSnapshot {
        GameStateSnapshot {
            resources: ResourceSnapshot::new(primary, 1000, 20, 60),
            units,
            map: MapInfo {
                map_center: Vec2Fixed::from_ints(100, 100),
                next_expansion: Some(Vec2Fixed::from_ints(40, 10)),
                ..MapInfo::default()
            },
            ..GameStateSnapshot::default()
        }
    }

    fn nexus(tag: u64) -> OwnedUnit {
        OwnedUnit::new(UnitTag(tag), UnitTypeId::Nexus, Vec2Fixed::from_ints(10, 10))
    }

    #[test]
    fn test_one_producer_two_dispatches() {
        let catalog = Catalog::standard();
        let snapshot = base_snapshot(1000, vec![nexus(1)]);
        let mut jitter = Jitter::new(0);
        let mut placement = AnywherePlacement;
        let mut sink: Vec<Command> = Vec::new();
        let mut session = DispatchSession::new(
            &catalog,
            &snapshot,
            &DispatchConfig::default(),
            &mut jitter,
            &mut placement,
            &mut sink,
        );

        let probe = Selection::Unit { unit: UnitTypeId::Probe };
        assert_eq!(
            session.dispatch(probe),
            Ok(Command::TrainUnit {
                producer: UnitTag(1),
                unit: UnitTypeId::Probe
            })
        );
        assert_eq!(session.dispatch(probe), Err(SkipReason::NoProducerAvailable));
        assert_eq!(session.inventory().pending(UnitTypeId::Probe), 1);
        assert_eq!(session.ledger().primary(), 950);
        drop(session);
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_pending_counts_every_success() {
        let catalog = Catalog::standard();
        let units = (1..=4).map(nexus).collect();
        let snapshot = base_snapshot(1000, units);
        let mut jitter = Jitter::new(0);
        let mut placement = AnywherePlacement;
        let mut sink: Vec<Command> = Vec::new();
        let mut session = DispatchSession::new(
            &catalog,
            &snapshot,
            &DispatchConfig::default(),
            &mut jitter,
            &mut placement,
            &mut sink,
        );

        for _ in 0..3 {
            assert!(session.dispatch(Selection::Unit { unit: UnitTypeId::Probe }).is_ok());
        }
        assert_eq!(session.inventory().pending(UnitTypeId::Probe), 3);
    }

    #[test]
    fn test_insufficient_resources_commits_nothing() {
        let catalog = Catalog::standard();
        let snapshot = base_snapshot(40, vec![nexus(1)]);
        let mut jitter = Jitter::new(0);
        let mut placement = AnywherePlacement;
        let mut sink: Vec<Command> = Vec::new();
        let mut session = DispatchSession::new(
            &catalog,
            &snapshot,
            &DispatchConfig::default(),
            &mut jitter,
            &mut placement,
            &mut sink,
        );

        assert_eq!(
            session.dispatch(Selection::Unit { unit: UnitTypeId::Probe }),
            Err(SkipReason::InsufficientResources)
        );
        assert_eq!(session.inventory().pending(UnitTypeId::Probe), 0);
        assert_eq!(session.ledger().primary(), 40);
    }

    #[test]
    fn test_rejected_command_commits_nothing() {
        let catalog = Catalog::standard();
        let snapshot = base_snapshot(1000, vec![nexus(1)]);
        let mut jitter = Jitter::new(0);
        let mut placement = AnywherePlacement;
        let mut sink = RejectingSink;
        let mut session = DispatchSession::new(
            &catalog,
            &snapshot,
            &DispatchConfig::default(),
            &mut jitter,
            &mut placement,
            &mut sink,
        );

        let probe = Selection::Unit { unit: UnitTypeId::Probe };
        assert_eq!(session.dispatch(probe), Err(SkipReason::CommandRejected));
        assert_eq!(session.inventory().pending(UnitTypeId::Probe), 0);
        assert_eq!(session.ledger().primary(), 1000);
        assert!(!session.pool().is_claimed(UnitTag(1)));
    }

    #[test]
    fn test_requirement_not_met() {
        let catalog = Catalog::standard();
        let gateway = OwnedUnit::new(UnitTag(2), UnitTypeId::Gateway, Vec2Fixed::ZERO);
        let snapshot = base_snapshot(1000, vec![nexus(1), gateway]);
        let mut jitter = Jitter::new(0);
        let mut placement = AnywherePlacement;
        let mut sink: Vec<Command> = Vec::new();
        let mut session = DispatchSession::new(
            &catalog,
            &snapshot,
            &DispatchConfig::default(),
            &mut jitter,
            &mut placement,
            &mut sink,
        );

        assert_eq!(
            session.dispatch(Selection::Unit { unit: UnitTypeId::Stalker }),
            Err(SkipReason::RequirementNotMet)
        );
        assert!(session.dispatch(Selection::Unit { unit: UnitTypeId::Zealot }).is_ok());
    }

    #[test]
    fn test_structure_needs_placement() {
        let catalog = Catalog::standard();
        let probe = OwnedUnit::new(UnitTag(2), UnitTypeId::Probe, Vec2Fixed::ZERO).with_queue(1);
        let snapshot = base_snapshot(1000, vec![nexus(1), probe]);
        let mut jitter = Jitter::new(0);
        let mut placement = NowherePlacement;
        let mut sink: Vec<Command> = Vec::new();
        let mut session = DispatchSession::new(
            &catalog,
            &snapshot,
            &DispatchConfig::default(),
            &mut jitter,
            &mut placement,
            &mut sink,
        );

        let pylon = Selection::Structure {
            structure: UnitTypeId::Pylon,
            placement: PlacementHint::NearTownhall { max_offset: 10 },
        };
        assert_eq!(session.dispatch(pylon), Err(SkipReason::PlacementNotFound));
        assert_eq!(session.inventory().pending(UnitTypeId::Pylon), 0);
    }

    #[test]
    fn test_expansion_goes_to_next_expansion() {
        let catalog = Catalog::standard();
        let probe = OwnedUnit::new(UnitTag(2), UnitTypeId::Probe, Vec2Fixed::ZERO).with_queue(1);
        let snapshot = base_snapshot(1000, vec![nexus(1), probe]);
        let mut jitter = Jitter::new(0);
        let mut placement = AnywherePlacement;
        let mut sink: Vec<Command> = Vec::new();
        let mut session = DispatchSession::new(
            &catalog,
            &snapshot,
            &DispatchConfig::default(),
            &mut jitter,
            &mut placement,
            &mut sink,
        );

        let command = session
            .dispatch(Selection::Structure {
                structure: UnitTypeId::Nexus,
                placement: PlacementHint::Expansion,
            })
            .unwrap();
        assert_eq!(
            command,
            Command::BuildStructure {
                structure: UnitTypeId::Nexus,
                position: Vec2Fixed::from_ints(40, 10)
            }
        );
    }

    #[test]
    fn test_warp_gate_produces_warp_in() {
        let catalog = Catalog::standard();
        let units = vec![
            nexus(1),
            OwnedUnit::new(UnitTag(2), UnitTypeId::Pylon, Vec2Fixed::from_ints(14, 10)),
            OwnedUnit::new(UnitTag(3), UnitTypeId::Pylon, Vec2Fixed::from_ints(80, 80)),
            OwnedUnit::new(UnitTag(4), UnitTypeId::WarpGate, Vec2Fixed::from_ints(20, 20)),
        ];
        let snapshot = base_snapshot(1000, units);
        let mut jitter = Jitter::new(3);
        let mut placement = AnywherePlacement;
        let mut sink: Vec<Command> = Vec::new();
        let mut session = DispatchSession::new(
            &catalog,
            &snapshot,
            &DispatchConfig::default(),
            &mut jitter,
            &mut placement,
            &mut sink,
        );

        let command = session.dispatch(Selection::Unit { unit: UnitTypeId::Zealot }).unwrap();
        let Command::WarpIn { producer, position, .. } = command else {
            panic!("expected warp-in, got {command:?}");
        };
        assert_eq!(producer, UnitTag(4));
        let error = (position.distance_squared(Vec2Fixed::from_ints(14, 10)) - Fixed::from_num(16)).abs();
        assert!(error < Fixed::from_num(1) / Fixed::from_num(100));
    }

    #[test]
    fn test_budget_exhaustion() {
        let catalog = Catalog::standard();
        let units = (1..=3).map(nexus).collect();
        let snapshot = base_snapshot(1000, units);
        let mut jitter = Jitter::new(0);
        let mut placement = AnywherePlacement;
        let mut sink: Vec<Command> = Vec::new();
        let config = DispatchConfig {
            max_commands_per_tick: 2,
            ..DispatchConfig::default()
        };
        let mut session =
            DispatchSession::new(&catalog, &snapshot, &config, &mut jitter, &mut placement, &mut sink);

        let probe = Selection::Unit { unit: UnitTypeId::Probe };
        assert!(session.dispatch(probe).is_ok());
        assert!(session.dispatch(probe).is_ok());
        assert_eq!(session.dispatch(probe), Err(SkipReason::TickBudgetExhausted));
        assert_eq!(session.outcomes().len(), 3);
    }

    #[test]
    fn test_availability_filters_requirements_and_producers() {
        let catalog = Catalog::standard();
        let units = vec![
            nexus(1),
            OwnedUnit::new(UnitTag(2), UnitTypeId::Gateway, Vec2Fixed::ZERO),
        ];
        let snapshot = base_snapshot(1000, units);
        let mut jitter = Jitter::new(0);
        let mut placement = AnywherePlacement;
        let mut sink: Vec<Command> = Vec::new();
        let session = DispatchSession::new(
            &catalog,
            &snapshot,
            &DispatchConfig::default(),
            &mut jitter,
            &mut placement,
            &mut sink,
        );

        let availability =
            session.availability([UnitTypeId::Zealot, UnitTypeId::Stalker, UnitTypeId::Immortal]);
        assert!(availability.can_train(UnitTypeId::Zealot));
        assert!(!availability.can_train(UnitTypeId::Stalker));
        assert!(!availability.can_train(UnitTypeId::Immortal));
    }

    #[test]
    fn test_zero_limits_rejected() {
        let config = DispatchConfig {
            queue_depth_limit: 0,
            ..DispatchConfig::default()
        };
        assert!(config.validate().is_err());
        assert!(DispatchConfig::default().validate().is_ok());
    }
}
