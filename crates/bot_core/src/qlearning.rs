//! Tabular Q-learning selector.
//!
//! States are discretised own-side counts plus affordability flags, encoded
//! as strings. Each tick the selector learns from the reward attached to the
//! snapshot, then picks one action epsilon-greedily and routes it through the
//! same dispatch path as the scripted selector.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::composition::ArmyState;
use crate::dispatch::{DispatchSession, Selection};
use crate::error::{BotError, Result};
use crate::jitter::Jitter;
use crate::ladder::PlacementHint;
use crate::selector::ActionSelector;
use crate::types::UnitTypeId;

/// Learning hyper-parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QLearningConfig {
    /// Step size of each update.
    pub learning_rate: f64,
    /// Weight of the next state's best value.
    pub discount: f64,
    /// Probability of acting greedily.
    pub epsilon: f64,
}

impl Default for QLearningConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.01,
            discount: 0.9,
            epsilon: 0.9,
        }
    }
}

impl QLearningConfig {
    /// Every parameter must lie in `[0, 1]`.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("learning.learning_rate", self.learning_rate),
            ("learning.discount", self.discount),
            ("learning.epsilon", self.epsilon),
        ];
        for (field, value) in fields {
            if !(0.0..=1.0).contains(&value) {
                return Err(BotError::InvalidValue {
                    field,
                    message: format!("{value} is outside [0, 1]"),
                });
            }
        }
        Ok(())
    }
}

/// Actions available to the learner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QAction {
    /// Issue nothing.
    DoNothing,
    /// Train a worker.
    TrainProbe,
    /// Build a pylon.
    BuildPylon,
    /// Build a gateway.
    BuildGateway,
    /// Build an assimilator.
    BuildAssimilator,
    /// Build a cybernetics core.
    BuildCyberneticsCore,
    /// Train a zealot.
    TrainZealot,
    /// Train a stalker.
    TrainStalker,
}

impl QAction {
    /// Every action, in table column order.
    pub const ALL: [Self; 8] = [
        Self::DoNothing,
        Self::TrainProbe,
        Self::BuildPylon,
        Self::BuildGateway,
        Self::BuildAssimilator,
        Self::BuildCyberneticsCore,
        Self::TrainZealot,
        Self::TrainStalker,
    ];

    /// The production request behind this action.
    #[must_use]
    pub const fn selection(self) -> Option<Selection> {
        let near_pylon = PlacementHint::NearPylon { max_offset: 3 };
        match self {
            Self::DoNothing => None,
            Self::TrainProbe => Some(Selection::Unit {
                unit: UnitTypeId::Probe,
            }),
            Self::BuildPylon => Some(Selection::Structure {
                structure: UnitTypeId::Pylon,
                placement: PlacementHint::NearTownhall { max_offset: 10 },
            }),
            Self::BuildGateway => Some(Selection::Structure {
                structure: UnitTypeId::Gateway,
                placement: near_pylon,
            }),
            Self::BuildAssimilator => Some(Selection::Structure {
                structure: UnitTypeId::Assimilator,
                placement: PlacementHint::Geyser,
            }),
            Self::BuildCyberneticsCore => Some(Selection::Structure {
                structure: UnitTypeId::CyberneticsCore,
                placement: near_pylon,
            }),
            Self::TrainZealot => Some(Selection::Unit {
                unit: UnitTypeId::Zealot,
            }),
            Self::TrainStalker => Some(Selection::Unit {
                unit: UnitTypeId::Stalker,
            }),
        }
    }
}

/// State → per-action value table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QTable {
    config: QLearningConfig,
    values: BTreeMap<String, Vec<f64>>,
}

impl QTable {
    /// Create an empty table.
    #[must_use]
    pub const fn new(config: QLearningConfig) -> Self {
        Self {
            config,
            values: BTreeMap::new(),
        }
    }

    /// Number of states seen.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no state has been seen.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Values for `state`, if seen.
    #[must_use]
    pub fn values(&self, state: &str) -> Option<&[f64]> {
        self.values.get(state).map(Vec::as_slice)
    }

    fn ensure(&mut self, state: &str) -> &mut Vec<f64> {
        self.values
            .entry(state.to_string())
            .or_insert_with(|| vec![0.0; QAction::ALL.len()])
    }

    /// Pick an action index: greedy with probability epsilon (ties broken at
    /// random), otherwise uniform.
    pub fn choose_action(&mut self, state: &str, jitter: &mut Jitter) -> usize {
        let epsilon = self.config.epsilon;
        let row = self.ensure(state).clone();
        let pick = |jitter: &mut Jitter, len: usize| jitter.pick(len).unwrap_or(0);

        if jitter.chance(epsilon) {
            let best = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let ties: Vec<usize> = (0..row.len()).filter(|&i| (row[i] - best).abs() < f64::EPSILON).collect();
            let tie = pick(jitter, ties.len());
            ties.get(tie).copied().unwrap_or(0)
        } else {
            pick(jitter, row.len())
        }
    }

    /// Temporal-difference update of `(state, action)`.
    ///
    /// `next` is `None` for a terminal transition, whose target is the bare
    /// reward. Non-finite rewards or targets leave the table unchanged.
    pub fn learn(&mut self, state: &str, action: usize, reward: f64, next: Option<&str>) {
        if !reward.is_finite() {
            warn!(reward, "Ignoring non-finite reward");
            return;
        }
        let target = match next {
            Some(next) => {
                let best = self.ensure(next).iter().copied().fold(f64::NEG_INFINITY, f64::max);
                reward + self.config.discount * best
            }
            None => reward,
        };
        if !target.is_finite() {
            warn!(target, "Ignoring non-finite update target");
            return;
        }
        let rate = self.config.learning_rate;
        let row = self.ensure(state);
        if let Some(value) = row.get_mut(action) {
            *value += rate * (target - *value);
        }
    }
}

/// Learner plugged in behind [`ActionSelector`].
#[derive(Debug, Clone)]
pub struct QLearningSelector {
    table: QTable,
    previous: Option<(String, usize)>,
}

impl QLearningSelector {
    /// Create a selector with an empty table.
    #[must_use]
    pub const fn new(config: QLearningConfig) -> Self {
        Self::with_table(QTable::new(config))
    }

    /// Continue from a previously trained table.
    #[must_use]
    pub const fn with_table(table: QTable) -> Self {
        Self { table, previous: None }
    }

    /// The learned values.
    #[must_use]
    pub const fn table(&self) -> &QTable {
        &self.table
    }

    /// Encode the tick state as a table key.
    #[must_use]
    pub fn encode_state(session: &DispatchSession<'_>) -> String {
        let inventory = session.inventory();
        let ledger = session.ledger();
        let features = [
            inventory.total(UnitTypeId::Nexus),
            inventory.planned(UnitTypeId::Probe),
            inventory.total(UnitTypeId::Pylon),
            inventory.ready(UnitTypeId::Pylon),
            inventory.total(UnitTypeId::Gateway),
            inventory.ready(UnitTypeId::Gateway),
            inventory.total(UnitTypeId::CyberneticsCore),
            inventory.planned(UnitTypeId::Zealot),
            inventory.planned(UnitTypeId::Stalker),
            ledger.supply_left(),
            u32::from(ledger.primary() >= 100),
            u32::from(ledger.primary() >= 150),
        ];
        features.map(|f| f.to_string()).join(",")
    }
}

impl ActionSelector for QLearningSelector {
    fn name(&self) -> &str {
        "q-learning"
    }

    fn plan(&mut self, _army: &ArmyState, session: &mut DispatchSession<'_>) {
        let state = Self::encode_state(session);
        let snapshot = session.snapshot();

        if let Some((previous_state, previous_action)) = self.previous.take() {
            let next = (!snapshot.is_final).then_some(state.as_str());
            self.table.learn(&previous_state, previous_action, snapshot.reward, next);
            trace!(reward = snapshot.reward, terminal = snapshot.is_final, "Learned");
        }
        if snapshot.is_final {
            return;
        }

        let index = self.table.choose_action(&state, session.jitter());
        let action = QAction::ALL[index];
        debug!(?action, state = %state, "Chose action");
        self.previous = Some((state, index));

        if let Some(selection) = action.selection() {
            // Skips are recorded by the session and learned from via reward.
            let _ = session.dispatch(selection);
        }
    }
}
