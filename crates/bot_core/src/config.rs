//! Match configuration loaded from RON.
//!
//! A [`BotConfig`] holds everything a [`Controller`](crate::controller::Controller)
//! needs that does not come from the game: both ladders, the composition
//! target, cadences, limits and the jitter seed. Every value is checked once
//! by [`BotConfig::validate`] before the first tick.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::composition::CompositionTarget;
use crate::deployment::DeploymentConfig;
use crate::dispatch::DispatchConfig;
use crate::error::{ConfigError, Result};
use crate::ladder::BuildLadder;
use crate::qlearning::QLearningConfig;
use crate::workers::WorkerPolicy;

/// Which decision strategy drives production.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SelectorKind {
    /// Ladders, workers and the composition regulator.
    #[default]
    Scripted,
    /// Tabular Q-learning.
    QLearning,
}

/// Complete per-match configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotConfig {
    /// Name used in logs and reports.
    pub name: String,
    /// Seed for placement and learner jitter.
    #[serde(default)]
    pub seed: u64,
    /// Decision strategy.
    #[serde(default)]
    pub selector: SelectorKind,
    /// Structure progression.
    pub structure_ladder: BuildLadder,
    /// Upgrade progression.
    pub research_ladder: BuildLadder,
    /// Army mixture.
    pub composition: CompositionTarget,
    /// Regroup and commit thresholds.
    #[serde(default)]
    pub deployment: DeploymentConfig,
    /// Queue depth and per-tick budget.
    #[serde(default)]
    pub dispatch: DispatchConfig,
    /// Worker saturation.
    #[serde(default)]
    pub workers: WorkerPolicy,
    /// Learner hyper-parameters, used by [`SelectorKind::QLearning`].
    #[serde(default)]
    pub learning: QLearningConfig,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self::standard()
    }
}

impl BotConfig {
    /// Load a configuration from a RON file.
    ///
    /// The result is not validated; [`Controller::new`](crate::controller::Controller::new)
    /// does that.
    pub fn load<P: AsRef<Path>>(path: P) -> std::result::Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string.
    pub fn from_ron_str(ron: &str) -> std::result::Result<Self, ConfigError> {
        let config: BotConfig = ron::from_str(ron)?;
        Ok(config)
    }

    /// Pretty-printed RON.
    pub fn to_ron_string(&self) -> std::result::Result<String, ConfigError> {
        let pretty = ron::ser::PrettyConfig::new().depth_limit(6);
        Ok(ron::ser::to_string_pretty(self, pretty)?)
    }

    /// Write as RON to `path`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> std::result::Result<(), ConfigError> {
        std::fs::write(path, self.to_ron_string()?)?;
        Ok(())
    }

    /// Override the seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Override the selector.
    #[must_use]
    pub fn with_selector(mut self, selector: SelectorKind) -> Self {
        self.selector = selector;
        self
    }

    /// Validate against the shipped catalog.
    pub fn validate(&self) -> Result<()> {
        self.validate_against(&Catalog::standard())
    }

    /// Fail on anything that would make the tick loop misbehave.
    pub fn validate_against(&self, catalog: &Catalog) -> Result<()> {
        self.structure_ladder.validate()?;
        self.research_ladder.validate()?;
        self.composition.validate(catalog)?;
        self.deployment.validate()?;
        self.dispatch.validate()?;
        self.workers.validate()?;
        self.learning.validate()?;
        Ok(())
    }
}
