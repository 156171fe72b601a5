//! Per-match controller.
//!
//! [`Controller`] is built once per match from a validated [`BotConfig`]
//! and driven by calling [`Controller::tick`] with every new snapshot. One
//! tick runs, in order:
//!
//! 1. army state is derived from the snapshot;
//! 2. morph sources are ordered to morph;
//! 3. the selector plans production through a fresh dispatch session;
//! 4. a rally move requested during planning is applied;
//! 5. the deployment controller issues movement orders.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::command::{Command, CommandRejected, CommandSink, PlacementService};
use crate::composition::{ArmyCompositionRegulator, ArmyState};
use crate::config::{BotConfig, SelectorKind};
use crate::deployment::{DeploymentController, DeploymentMode};
use crate::dispatch::{DispatchOutcome, DispatchSession};
use crate::error::Result;
use crate::jitter::Jitter;
use crate::math::Vec2Fixed;
use crate::qlearning::QLearningSelector;
use crate::selector::{ActionSelector, ScriptedSelector};
use crate::snapshot::{GameStateSnapshot, MapInfo};
use crate::types::UnitTag;

/// What happened during one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    /// Tick of the snapshot acted on.
    pub tick: u64,
    /// Commands the sink accepted, in issue order.
    pub commands: Vec<Command>,
    /// Every production attempt and its result.
    pub outcomes: Vec<DispatchOutcome>,
    /// Deployment mode after the tick.
    pub mode: DeploymentMode,
    /// Rally point after the tick.
    pub rally: Vec2Fixed,
}

impl TickReport {
    /// Number of production commands issued.
    #[must_use]
    pub fn production_count(&self) -> usize {
        self.commands.iter().filter(|c| c.is_production()).count()
    }
}

/// Forwards to the caller's sink and keeps what was accepted.
struct RecordingSink<'s> {
    inner: &'s mut dyn CommandSink,
    accepted: Vec<Command>,
}

impl CommandSink for RecordingSink<'_> {
    fn submit(&mut self, command: Command) -> std::result::Result<(), CommandRejected> {
        self.inner.submit(command.clone())?;
        self.accepted.push(command);
        Ok(())
    }
}

/// Decision state for one match.
pub struct Controller {
    name: String,
    catalog: Catalog,
    config: BotConfig,
    regulator: ArmyCompositionRegulator,
    selector: Box<dyn ActionSelector>,
    deployment: DeploymentController,
    jitter: Jitter,
}

impl Controller {
    /// Validate `config` and build the selector it names.
    ///
    /// The rally point starts at the top of the main ramp.
    pub fn new(config: BotConfig, map: &MapInfo) -> Result<Self> {
        config.validate()?;
        let selector: Box<dyn ActionSelector> = match config.selector {
            SelectorKind::Scripted => Box::new(ScriptedSelector::new(
                config.structure_ladder.clone(),
                config.research_ladder.clone(),
                config.workers,
                ArmyCompositionRegulator::new(config.composition.clone()),
            )),
            SelectorKind::QLearning => Box::new(QLearningSelector::new(config.learning)),
        };
        Ok(Self::assemble(config, map, selector))
    }

    /// Validate `config` but plan with a caller-supplied selector.
    pub fn with_selector(config: BotConfig, map: &MapInfo, selector: Box<dyn ActionSelector>) -> Result<Self> {
        config.validate()?;
        Ok(Self::assemble(config, map, selector))
    }

    fn assemble(config: BotConfig, map: &MapInfo, selector: Box<dyn ActionSelector>) -> Self {
        info!(
            name = %config.name,
            selector = selector.name(),
            seed = config.seed,
            "Controller ready"
        );
        Self {
            name: config.name.clone(),
            catalog: Catalog::standard(),
            regulator: ArmyCompositionRegulator::new(config.composition.clone()),
            deployment: DeploymentController::new(config.deployment, map.main_ramp),
            jitter: Jitter::new(config.seed),
            selector,
            config,
        }
    }

    /// Configuration name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The configuration in use.
    #[must_use]
    pub const fn config(&self) -> &BotConfig {
        &self.config
    }

    /// The blueprint registry.
    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Name of the active selector.
    #[must_use]
    pub fn selector_name(&self) -> &str {
        self.selector.name()
    }

    /// Current deployment mode.
    #[must_use]
    pub const fn mode(&self) -> DeploymentMode {
        self.deployment.mode()
    }

    /// Current rally point.
    #[must_use]
    pub const fn rally(&self) -> Vec2Fixed {
        self.deployment.rally()
    }

    /// Run one decision cycle.
    pub fn tick(
        &mut self,
        snapshot: &GameStateSnapshot,
        placement: &mut dyn PlacementService,
        sink: &mut dyn CommandSink,
    ) -> TickReport {
        let army = ArmyState::from_snapshot(snapshot, &self.catalog, self.regulator.target());
        let mut recorder = RecordingSink {
            inner: sink,
            accepted: Vec::new(),
        };

        let mut session = DispatchSession::new(
            &self.catalog,
            snapshot,
            &self.config.dispatch,
            &mut self.jitter,
            placement,
            &mut recorder,
        );

        let mut morphing: Vec<UnitTag> = Vec::new();
        for (unit, into) in self.regulator.morph_orders(&army) {
            if session.submit_order(Command::MorphUnit { unit, into }).is_ok() {
                morphing.push(unit);
            }
        }

        self.selector.plan(&army, &mut session);
        let (_, outcomes, rally_request) = session.finish();

        if let Some(rally) = rally_request {
            self.deployment.set_rally(rally);
        }

        self.deployment.run(
            snapshot.tick,
            &army,
            self.regulator.target(),
            &morphing,
            snapshot.map.enemy_start,
            &mut recorder,
        );

        let report = TickReport {
            tick: snapshot.tick,
            commands: recorder.accepted,
            outcomes,
            mode: self.deployment.mode(),
            rally: self.deployment.rally(),
        };
        debug!(
            tick = report.tick,
            commands = report.commands.len(),
            production = report.production_count(),
            mode = ?report.mode,
            "Tick complete"
        );
        report
    }
}
