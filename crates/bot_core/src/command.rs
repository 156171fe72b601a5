//! Commands emitted by the controller and the collaborators that receive them.
//!
//! The controller never talks to the game directly. Everything it decides
//! flows out through a [`CommandSink`], and every structure position comes
//! from a [`PlacementService`]. Both are supplied by the caller each tick:
//!
//! - **Live play:** the sink forwards to the game client
//! - **Headless runs:** a mock match applies commands to its own state
//! - **Tests:** a recording sink captures the stream for assertions

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::math::Vec2Fixed;
use crate::types::{UnitTag, UnitTypeId, UpgradeId};

/// One order for the game.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    /// Start a structure at a position.
    BuildStructure {
        /// Structure type.
        structure: UnitTypeId,
        /// Chosen position.
        position: Vec2Fixed,
    },
    /// Queue a unit at a producer.
    TrainUnit {
        /// Producing structure.
        producer: UnitTag,
        /// Unit type.
        unit: UnitTypeId,
    },
    /// Warp a unit in through a warp gate.
    WarpIn {
        /// Warp gate used.
        producer: UnitTag,
        /// Unit type.
        unit: UnitTypeId,
        /// Arrival position.
        position: Vec2Fixed,
    },
    /// Start research at a structure.
    ResearchUpgrade {
        /// Researching structure.
        producer: UnitTag,
        /// Upgrade.
        upgrade: UpgradeId,
    },
    /// Convert a unit into another type.
    MorphUnit {
        /// Unit to morph.
        unit: UnitTag,
        /// Result type.
        into: UnitTypeId,
    },
    /// Move units without engaging.
    MoveUnits {
        /// Units to move.
        units: Vec<UnitTag>,
        /// Destination.
        position: Vec2Fixed,
    },
    /// Attack-move units.
    AttackPosition {
        /// Units to send.
        units: Vec<UnitTag>,
        /// Target.
        position: Vec2Fixed,
    },
}

impl Command {
    /// Whether this command starts production or research.
    #[must_use]
    pub const fn is_production(&self) -> bool {
        matches!(
            self,
            Self::BuildStructure { .. } | Self::TrainUnit { .. } | Self::WarpIn { .. } | Self::ResearchUpgrade { .. }
        )
    }
}

/// The sink refused a command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Command rejected: {reason}")]
pub struct CommandRejected {
    /// Why the sink refused.
    pub reason: String,
}

impl CommandRejected {
    /// Create a new rejection.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

/// Receiver of controller output.
///
/// Rejections are non-fatal: the controller logs them, commits nothing for
/// the rejected order and carries on with the tick.
pub trait CommandSink {
    /// Submit one command.
    ///
    /// # Errors
    /// Returns [`CommandRejected`] if the command cannot be carried out.
    fn submit(&mut self, command: Command) -> Result<(), CommandRejected>;
}

impl CommandSink for Vec<Command> {
    fn submit(&mut self, command: Command) -> Result<(), CommandRejected> {
        self.push(command);
        Ok(())
    }
}

/// Geometric placement search for structures and warp-ins.
pub trait PlacementService {
    /// Find a free spot for `structure` close to `near`.
    ///
    /// Returns `None` if nothing fits.
    fn find_placement(&mut self, structure: UnitTypeId, near: Vec2Fixed) -> Option<Vec2Fixed>;
}
