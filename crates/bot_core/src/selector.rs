//! Decision strategies.
//!
//! An [`ActionSelector`] decides what to produce this tick and issues it
//! through the tick's [`DispatchSession`]. The scripted selector walks the
//! build and research ladders, trains workers, and then lets the
//! composition regulator spend what is left, first on ratios and then on
//! starter units.

use tracing::trace;

use crate::composition::{ArmyCompositionRegulator, ArmyState};
use crate::dispatch::{DispatchSession, Selection, SkipReason};
use crate::ladder::{BuildLadder, StepEffect};
use crate::types::UnitTypeId;
use crate::workers::WorkerPolicy;

/// Pluggable per-tick decision strategy.
pub trait ActionSelector {
    /// Name for logs and reports.
    fn name(&self) -> &str;

    /// Decide and dispatch this tick's production.
    fn plan(&mut self, army: &ArmyState, session: &mut DispatchSession<'_>);
}

/// Ladder, research, workers, then composition.
#[derive(Debug, Clone)]
pub struct ScriptedSelector {
    structures: BuildLadder,
    research: BuildLadder,
    workers: WorkerPolicy,
    regulator: ArmyCompositionRegulator,
}

impl ScriptedSelector {
    /// Create a selector from its parts.
    #[must_use]
    pub const fn new(
        structures: BuildLadder,
        research: BuildLadder,
        workers: WorkerPolicy,
        regulator: ArmyCompositionRegulator,
    ) -> Self {
        Self {
            structures,
            research,
            workers,
            regulator,
        }
    }

    /// Dispatch at most one step from `ladder`.
    fn climb(ladder: &BuildLadder, session: &mut DispatchSession<'_>) {
        let Some(step) = ladder.evaluate(&session.ctx(), session.catalog()) else {
            trace!(ladder = %ladder.name, reason = %SkipReason::NoEligibleStep, "Ladder idle");
            return;
        };

        if step.effect == Some(StepEffect::StageAtNatural) {
            let staging = session.snapshot().map.natural_staging();
            session.request_rally(staging);
        }
        let _ = session.dispatch(Selection::from_step(step));
    }

    fn train_workers(&self, session: &mut DispatchSession<'_>) {
        while self.workers.wants_worker(session.inventory()) {
            if session.dispatch(Selection::Unit { unit: UnitTypeId::Probe }).is_err() {
                break;
            }
        }
    }

    fn fill_reserves(&self, session: &mut DispatchSession<'_>) {
        let target = self.regulator.target();
        let availability = session.availability(target.reserves.iter().map(|r| r.unit));
        let choice = self
            .regulator
            .evaluate_reserves(&session.ctx(), session.catalog(), &availability);
        if let Some(choice) = choice {
            let _ = session.dispatch(Selection::Unit { unit: choice.unit });
        }
    }

    fn regulate(&self, army: &ArmyState, session: &mut DispatchSession<'_>) {
        let target = self.regulator.target();
        let mut availability = session.availability(target.tracked.iter().map(|t| t.train));

        loop {
            let choice = self
                .regulator
                .evaluate(army, &session.ctx(), session.catalog(), &availability);
            let Some(choice) = choice else { break };
            match session.dispatch(Selection::Unit { unit: choice.unit }) {
                Ok(_) => {
                    if !session.pool().has_free(&choice.producers) {
                        availability.mark_unavailable(choice.unit);
                    }
                }
                Err(SkipReason::TickBudgetExhausted) => break,
                Err(SkipReason::InsufficientResources) if target.save_for_top_choice => break,
                Err(_) => availability.mark_unavailable(choice.unit),
            }
        }
    }

    fn fill_starters(&self, session: &mut DispatchSession<'_>) {
        let target = self.regulator.target();
        let mut availability = session.availability(target.starters.iter().map(|s| s.unit));

        loop {
            let choice = self
                .regulator
                .evaluate_starters(&session.ctx(), session.catalog(), &availability);
            let Some(choice) = choice else { break };
            match session.dispatch(Selection::Unit { unit: choice.unit }) {
                Ok(_) => {
                    if !session.pool().has_free(&choice.producers) {
                        availability.mark_unavailable(choice.unit);
                    }
                }
                Err(SkipReason::TickBudgetExhausted) => break,
                Err(_) => availability.mark_unavailable(choice.unit),
            }
        }
    }
}

impl ActionSelector for ScriptedSelector {
    fn name(&self) -> &str {
        "scripted"
    }

    fn plan(&mut self, army: &ArmyState, session: &mut DispatchSession<'_>) {
        Self::climb(&self.structures, session);
        Self::climb(&self.research, session);
        self.train_workers(session);
        self.fill_reserves(session);
        self.regulate(army, session);
        self.fill_starters(session);
    }
}
