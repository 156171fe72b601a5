//! Identifiers for everything the controller can count, build or research.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unit and structure types of the controlled faction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UnitTypeId {
    /// Townhall; trains workers and receives harvested resources.
    Nexus,
    /// Supply structure; also powers nearby structures and warp-ins.
    Pylon,
    /// Gas extractor built on a geyser.
    Assimilator,
    /// Basic infantry producer.
    Gateway,
    /// Researched form of the gateway; warps units in near a pylon.
    WarpGate,
    /// Unlocks tier-two gateway units and Warp Gate research.
    CyberneticsCore,
    /// Ground weapon and armor upgrades.
    Forge,
    /// Mechanical unit producer.
    RoboticsFacility,
    /// Charge and Blink research.
    TwilightCouncil,
    /// Unlocks High Templar.
    TemplarArchive,
    /// Worker.
    Probe,
    /// Melee infantry.
    Zealot,
    /// Ranged infantry.
    Stalker,
    /// Support caster.
    Sentry,
    /// Caster; two merge into an Archon.
    HighTemplar,
    /// Merged High Templar.
    Archon,
    /// Heavy robotic assault unit.
    Immortal,
    /// Detector.
    Observer,
}

impl UnitTypeId {
    /// Every type, in declaration order.
    pub const ALL: [Self; 18] = [
        Self::Nexus,
        Self::Pylon,
        Self::Assimilator,
        Self::Gateway,
        Self::WarpGate,
        Self::CyberneticsCore,
        Self::Forge,
        Self::RoboticsFacility,
        Self::TwilightCouncil,
        Self::TemplarArchive,
        Self::Probe,
        Self::Zealot,
        Self::Stalker,
        Self::Sentry,
        Self::HighTemplar,
        Self::Archon,
        Self::Immortal,
        Self::Observer,
    ];

    /// Whether this type is a building.
    #[must_use]
    pub const fn is_structure(self) -> bool {
        matches!(
            self,
            Self::Nexus
                | Self::Pylon
                | Self::Assimilator
                | Self::Gateway
                | Self::WarpGate
                | Self::CyberneticsCore
                | Self::Forge
                | Self::RoboticsFacility
                | Self::TwilightCouncil
                | Self::TemplarArchive
        )
    }

    /// Whether this type harvests resources.
    #[must_use]
    pub const fn is_worker(self) -> bool {
        matches!(self, Self::Probe)
    }

    /// Whether this type is a townhall.
    #[must_use]
    pub const fn is_townhall(self) -> bool {
        matches!(self, Self::Nexus)
    }

    /// Whether this type belongs to the army (non-structure, non-worker).
    #[must_use]
    pub const fn is_army(self) -> bool {
        !self.is_structure() && !self.is_worker()
    }
}

impl fmt::Display for UnitTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Researchable upgrades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UpgradeId {
    /// Converts gateways into warp gates.
    WarpGateResearch,
    /// Zealot charge.
    Charge,
    /// Stalker blink.
    Blink,
    /// Ground weapons level 1.
    GroundWeapons1,
    /// Ground weapons level 2.
    GroundWeapons2,
    /// Ground weapons level 3.
    GroundWeapons3,
    /// Ground armor level 1.
    GroundArmor1,
    /// Ground armor level 2.
    GroundArmor2,
    /// Ground armor level 3.
    GroundArmor3,
}

impl fmt::Display for UpgradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Anything a production command can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Producible {
    /// A unit or structure.
    Unit(UnitTypeId),
    /// A research upgrade.
    Upgrade(UpgradeId),
}

impl Producible {
    /// Whether this targets a building.
    #[must_use]
    pub const fn is_structure(self) -> bool {
        match self {
            Self::Unit(unit) => unit.is_structure(),
            Self::Upgrade(_) => false,
        }
    }
}

impl From<UnitTypeId> for Producible {
    fn from(unit: UnitTypeId) -> Self {
        Self::Unit(unit)
    }
}

impl From<UpgradeId> for Producible {
    fn from(upgrade: UpgradeId) -> Self {
        Self::Upgrade(upgrade)
    }
}

impl fmt::Display for Producible {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unit(unit) => write!(f, "{unit}"),
            Self::Upgrade(upgrade) => write!(f, "{upgrade}"),
        }
    }
}

/// Stable reference to one owned unit or structure, assigned by the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct UnitTag(pub u64);

impl UnitTag {
    /// Create a new tag.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for UnitTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
