//! Blueprint registry: cost, build time, producers and tech requirements of
//! every producible type.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::ledger::Cost;
use crate::types::{Producible, UnitTypeId, UpgradeId};

/// Static data for one producible type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blueprint {
    /// What this blueprint describes.
    pub id: Producible,
    /// Display name.
    pub name: String,
    /// Resources and supply consumed by one order.
    pub cost: Cost,
    /// Time to complete, in game seconds.
    pub build_time: u32,
    /// Owned types that can carry out the order. For structures this is the
    /// worker type.
    pub producers: Vec<UnitTypeId>,
    /// Types that must have at least one ready instance before the order can
    /// be issued.
    pub requires: Vec<UnitTypeId>,
}

impl Blueprint {
    /// Create a new blueprint without producers or requirements.
    #[must_use]
    pub fn new(id: impl Into<Producible>, name: impl Into<String>, cost: Cost, build_time: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            cost,
            build_time,
            producers: Vec::new(),
            requires: Vec::new(),
        }
    }

    /// Set the producer types.
    #[must_use]
    pub fn with_producers(mut self, producers: Vec<UnitTypeId>) -> Self {
        self.producers = producers;
        self
    }

    /// Set the tech requirements.
    #[must_use]
    pub fn with_requires(mut self, requires: Vec<UnitTypeId>) -> Self {
        self.requires = requires;
        self
    }

    /// Check if `producer` can carry out this order.
    #[must_use]
    pub fn can_be_produced_by(&self, producer: UnitTypeId) -> bool {
        self.producers.contains(&producer)
    }
}

/// Registry of all blueprints, looked up by [`Producible`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    blueprints: HashMap<Producible, Blueprint>,
}

impl Catalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self {
            blueprints: HashMap::new(),
        }
    }

    /// Register a blueprint, replacing any previous one for the same id.
    pub fn register(&mut self, blueprint: Blueprint) {
        self.blueprints.insert(blueprint.id, blueprint);
    }

    /// Get a blueprint by id.
    #[must_use]
    pub fn get(&self, id: impl Into<Producible>) -> Option<&Blueprint> {
        self.blueprints.get(&id.into())
    }

    /// Cost of one order, or free if the type is unknown.
    #[must_use]
    pub fn cost(&self, id: impl Into<Producible>) -> Cost {
        self.get(id).map_or(Cost::ZERO, |b| b.cost)
    }

    /// Producer types for `id`. Empty if unknown.
    #[must_use]
    pub fn producers_of(&self, id: impl Into<Producible>) -> &[UnitTypeId] {
        self.get(id).map_or(&[], |b| b.producers.as_slice())
    }

    /// Get all registered blueprints.
    pub fn all(&self) -> impl Iterator<Item = &Blueprint> {
        self.blueprints.values()
    }

    /// The shipped Protoss tech tree.
    #[must_use]
    pub fn standard() -> Self {
        use UnitTypeId as U;
        use UpgradeId as R;

        let mut catalog = Self::new();
        let structure = |id: UnitTypeId, name: &str, cost: Cost, time: u32| {
            Blueprint::new(id, name, cost, time).with_producers(vec![U::Probe])
        };

        catalog.register(structure(U::Nexus, "Nexus", Cost::primary(400), 71));
        catalog.register(structure(U::Pylon, "Pylon", Cost::primary(100), 18));
        catalog.register(structure(U::Assimilator, "Assimilator", Cost::primary(75), 21));
        catalog.register(
            structure(U::Gateway, "Gateway", Cost::primary(150), 46).with_requires(vec![U::Pylon]),
        );
        // Gateways turn into warp gates through research, never by construction.
        catalog.register(Blueprint::new(U::WarpGate, "Warp Gate", Cost::ZERO, 7));
        catalog.register(
            structure(U::CyberneticsCore, "Cybernetics Core", Cost::primary(150), 36)
                .with_requires(vec![U::Gateway]),
        );
        catalog.register(structure(U::Forge, "Forge", Cost::primary(150), 32).with_requires(vec![U::Pylon]));
        catalog.register(
            structure(U::RoboticsFacility, "Robotics Facility", Cost::new(150, 100, 0), 46)
                .with_requires(vec![U::CyberneticsCore]),
        );
        catalog.register(
            structure(U::TwilightCouncil, "Twilight Council", Cost::new(150, 100, 0), 36)
                .with_requires(vec![U::CyberneticsCore]),
        );
        catalog.register(
            structure(U::TemplarArchive, "Templar Archives", Cost::new(150, 200, 0), 36)
                .with_requires(vec![U::TwilightCouncil]),
        );

        let gateway_unit = |id: UnitTypeId, name: &str, cost: Cost, time: u32| {
            Blueprint::new(id, name, cost, time).with_producers(vec![U::Gateway, U::WarpGate])
        };
        catalog.register(Blueprint::new(U::Probe, "Probe", Cost::new(50, 0, 1), 12).with_producers(vec![U::Nexus]));
        catalog.register(gateway_unit(U::Zealot, "Zealot", Cost::new(100, 0, 2), 27));
        catalog.register(
            gateway_unit(U::Stalker, "Stalker", Cost::new(125, 50, 2), 30).with_requires(vec![U::CyberneticsCore]),
        );
        catalog.register(
            gateway_unit(U::Sentry, "Sentry", Cost::new(50, 100, 2), 26).with_requires(vec![U::CyberneticsCore]),
        );
        catalog.register(
            gateway_unit(U::HighTemplar, "High Templar", Cost::new(50, 150, 2), 39)
                .with_requires(vec![U::TemplarArchive]),
        );
        // Archons are merged from two High Templar; the supply is already paid.
        catalog.register(Blueprint::new(U::Archon, "Archon", Cost::new(0, 0, 4), 9).with_producers(vec![U::HighTemplar]));
        catalog.register(
            Blueprint::new(U::Immortal, "Immortal", Cost::new(275, 100, 4), 39)
                .with_producers(vec![U::RoboticsFacility]),
        );
        catalog.register(
            Blueprint::new(U::Observer, "Observer", Cost::new(25, 75, 1), 21)
                .with_producers(vec![U::RoboticsFacility]),
        );

        let research = |id: UpgradeId, name: String, cost: Cost, time: u32, producer: UnitTypeId| {
            Blueprint::new(id, name, cost, time).with_producers(vec![producer])
        };
        catalog.register(research(
            R::WarpGateResearch,
            "Warp Gate".to_string(),
            Cost::new(50, 50, 0),
            100,
            U::CyberneticsCore,
        ));
        catalog.register(research(R::Charge, "Charge".to_string(), Cost::new(100, 100, 0), 100, U::TwilightCouncil));
        catalog.register(research(R::Blink, "Blink".to_string(), Cost::new(150, 150, 0), 121, U::TwilightCouncil));

        let levels = [
            (R::GroundWeapons1, R::GroundArmor1, 100, 129, false),
            (R::GroundWeapons2, R::GroundArmor2, 150, 154, true),
            (R::GroundWeapons3, R::GroundArmor3, 200, 179, true),
        ];
        for (level, (weapons, armor, price, time, needs_twilight)) in levels.into_iter().enumerate() {
            let requires = if needs_twilight {
                vec![U::TwilightCouncil]
            } else {
                Vec::new()
            };
            let cost = Cost::new(price, price, 0);
            catalog.register(
                research(weapons, format!("Ground Weapons {}", level + 1), cost, time, U::Forge)
                    .with_requires(requires.clone()),
            );
            catalog.register(
                research(armor, format!("Ground Armor {}", level + 1), cost, time, U::Forge).with_requires(requires),
            );
        }

        catalog
    }
}
