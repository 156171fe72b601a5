//! # Bot Core
//!
//! Deterministic production and army-composition decision core for a
//! gateway-macro RTS bot.
//!
//! This crate contains **only** decision logic:
//! - No game connection
//! - No IO beyond loading configuration files
//! - No system randomness (jitter comes from a seeded source)
//! - No floating-point positions (uses fixed-point)
//!
//! Each tick the [`Controller`](controller::Controller) reads a
//! [`GameStateSnapshot`](snapshot::GameStateSnapshot) and writes commands to a
//! [`CommandSink`](command::CommandSink). Nothing about the game survives
//! between ticks except the rally point, the deployment mode and, for the
//! learning selector, its value table.
//!
//! ## Crate Structure
//!
//! - [`catalog`] - Costs, producers and tech requirements
//! - [`ladder`] - Ordered, predicate-gated build steps
//! - [`composition`] - Army mixture targets and the regulator
//! - [`dispatch`] - Turning selections into commands
//! - [`deployment`] - Regroup and commit
//! - [`selector`] - Scripted and learning decision strategies
//! - [`controller`] - The per-match tick loop
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod catalog;
pub mod command;
pub mod composition;
pub mod condition;
pub mod config;
pub mod controller;
pub mod deployment;
pub mod dispatch;
pub mod error;
pub mod inventory;
pub mod jitter;
pub mod ladder;
pub mod ledger;
pub mod math;
pub mod producers;
pub mod qlearning;
pub mod selector;
pub mod snapshot;
pub mod standard;
pub mod types;
pub mod workers;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::catalog::{Blueprint, Catalog};
    pub use crate::command::{Command, CommandRejected, CommandSink, PlacementService};
    pub use crate::composition::{
        ArmyCompositionRegulator, ArmyState, CompositionTarget, MorphRule, Reserve, StarterUnit, TrackedUnit,
    };
    pub use crate::condition::{Condition, EvalContext};
    pub use crate::config::{BotConfig, SelectorKind};
    pub use crate::controller::{Controller, TickReport};
    pub use crate::deployment::{DeploymentConfig, DeploymentController, DeploymentMode};
    pub use crate::dispatch::{DispatchConfig, DispatchOutcome, DispatchSession, Selection, SkipReason};
    pub use crate::error::{BotError, ConfigError, Result};
    pub use crate::inventory::{CountScope, InventoryIndex, TypeCounts};
    pub use crate::jitter::Jitter;
    pub use crate::ladder::{BuildLadder, BuildStep, PlacementHint, StepEffect};
    pub use crate::ledger::{Cost, ResourceLedger, ResourceSnapshot};
    pub use crate::math::{Fixed, Vec2Fixed};
    pub use crate::qlearning::{QAction, QLearningConfig, QLearningSelector, QTable};
    pub use crate::selector::{ActionSelector, ScriptedSelector};
    pub use crate::snapshot::{GameStateSnapshot, MapInfo, OwnedUnit};
    pub use crate::types::{Producible, UnitTag, UnitTypeId, UpgradeId};
    pub use crate::workers::WorkerPolicy;
}
