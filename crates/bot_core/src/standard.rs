//! The shipped gateway-macro strategy.
//!
//! One canonical set of thresholds: pylons ahead of supply, a two-gate core
//! opening, a natural once the main is close to saturated, then robotics,
//! twilight, forges and templar archives feeding an Immortal / Archon /
//! Stalker / Zealot army.

use crate::composition::{CompositionTarget, MorphRule, Reserve, StarterUnit, TrackedUnit};
use crate::condition::Condition;
use crate::config::{BotConfig, SelectorKind};
use crate::deployment::DeploymentConfig;
use crate::dispatch::DispatchConfig;
use crate::inventory::CountScope;
use crate::ladder::{BuildLadder, BuildStep, PlacementHint, StepEffect};
use crate::qlearning::QLearningConfig;
use crate::types::{UnitTypeId as U, UpgradeId as R};
use crate::workers::{WorkerPolicy, FULL_SATURATION};

/// Gateways count as gateways whether or not they have transformed.
const GATES: [U; 2] = [U::Gateway, U::WarpGate];

/// Supply used at which pylons are built further ahead.
const LATE_PYLON_SUPPLY: u32 = 60;

/// Worker slack below full saturation that triggers an expansion.
const EXPAND_MARGIN: u32 = 6;

/// Most townhalls the ladder will plan.
const MAX_TOWNHALLS: u32 = 4;

fn fewer_than(types: &[U], n: u32) -> Condition {
    Condition::below(types, CountScope::Planned, n)
}

fn pylon_spot() -> PlacementHint {
    PlacementHint::NearTownhall { max_offset: 10 }
}

/// Structure progression.
#[must_use]
pub fn structure_ladder() -> Vec<BuildStep> {
    vec![
        BuildStep::new(
            U::Pylon,
            Condition::All(vec![
                Condition::SupplyUsedAtMost(LATE_PYLON_SUPPLY),
                Condition::SupplyLeftBelow(3),
                Condition::below(&[U::Pylon], CountScope::InProgress, 1),
            ]),
        )
        .with_placement(pylon_spot()),
        BuildStep::new(
            U::Pylon,
            Condition::All(vec![
                Condition::SupplyUsedAbove(LATE_PYLON_SUPPLY),
                Condition::SupplyLeftBelow(7),
                Condition::below(&[U::Pylon], CountScope::InProgress, 2),
            ]),
        )
        .with_placement(pylon_spot()),
        BuildStep::new(
            U::Gateway,
            Condition::All(vec![Condition::ready(U::Pylon), fewer_than(&GATES, 1)]),
        ),
        BuildStep::new(
            U::Assimilator,
            Condition::All(vec![
                Condition::at_least(&GATES, CountScope::Total, 1),
                fewer_than(&[U::Assimilator], 1),
            ]),
        )
        .with_placement(PlacementHint::Geyser),
        BuildStep::new(
            U::CyberneticsCore,
            Condition::All(vec![
                Condition::at_least(&GATES, CountScope::Ready, 1),
                fewer_than(&[U::CyberneticsCore], 1),
            ]),
        ),
        BuildStep::new(
            U::Gateway,
            Condition::All(vec![Condition::planned(U::CyberneticsCore), fewer_than(&GATES, 2)]),
        ),
        BuildStep::new(
            U::Assimilator,
            Condition::All(vec![
                Condition::at_least(&GATES, CountScope::Planned, 2),
                fewer_than(&[U::Assimilator], 2),
            ]),
        )
        .with_placement(PlacementHint::Geyser),
        BuildStep::new(
            U::Nexus,
            Condition::All(vec![
                Condition::exists(U::CyberneticsCore),
                Condition::WorkersAboveSaturation {
                    per_townhall: FULL_SATURATION,
                    margin: EXPAND_MARGIN,
                },
                fewer_than(&[U::Nexus], MAX_TOWNHALLS),
            ]),
        )
        .with_placement(PlacementHint::Expansion)
        .with_effect(StepEffect::StageAtNatural),
        BuildStep::new(
            U::RoboticsFacility,
            Condition::All(vec![
                Condition::at_least(&[U::Nexus], CountScope::Planned, 2),
                Condition::ready(U::CyberneticsCore),
                fewer_than(&[U::RoboticsFacility], 1),
            ]),
        ),
        BuildStep::new(
            U::TwilightCouncil,
            Condition::All(vec![
                Condition::ready(U::RoboticsFacility),
                fewer_than(&[U::TwilightCouncil], 1),
            ]),
        ),
        BuildStep::new(
            U::Forge,
            Condition::All(vec![Condition::planned(U::TwilightCouncil), fewer_than(&[U::Forge], 2)]),
        ),
        BuildStep::new(
            U::Gateway,
            Condition::All(vec![Condition::ready(U::Forge), fewer_than(&GATES, 4)]),
        ),
        BuildStep::new(
            U::TemplarArchive,
            Condition::All(vec![
                Condition::ready(U::TwilightCouncil),
                fewer_than(&[U::TemplarArchive], 1),
            ]),
        ),
        BuildStep::new(
            U::Assimilator,
            Condition::All(vec![
                Condition::at_least(&[U::Nexus], CountScope::Ready, 2),
                fewer_than(&[U::Assimilator], 4),
            ]),
        )
        .with_placement(PlacementHint::Geyser),
        BuildStep::new(
            U::Gateway,
            Condition::All(vec![
                Condition::ready(U::TemplarArchive),
                Condition::at_least(&[U::Nexus], CountScope::Total, 3),
                fewer_than(&GATES, 12),
            ]),
        ),
    ]
}

fn research(upgrade: R, mut gates: Vec<Condition>) -> BuildStep {
    gates.push(Condition::Not(Box::new(Condition::ResearchStarted(upgrade))));
    BuildStep::new(upgrade, Condition::All(gates))
}

/// Upgrade progression. Each step drops out once its upgrade has started.
#[must_use]
pub fn research_ladder() -> Vec<BuildStep> {
    let twilight = || Condition::ready(U::TwilightCouncil);
    let forge = || Condition::ready(U::Forge);

    vec![
        research(R::WarpGateResearch, vec![Condition::ready(U::CyberneticsCore)]),
        research(R::Charge, vec![twilight()]),
        research(R::Blink, vec![twilight(), Condition::Researched(R::Charge)]),
        research(R::GroundWeapons1, vec![forge()]),
        research(
            R::GroundWeapons2,
            vec![forge(), twilight(), Condition::Researched(R::GroundWeapons1)],
        ),
        research(
            R::GroundWeapons3,
            vec![forge(), twilight(), Condition::Researched(R::GroundWeapons2)],
        ),
        research(R::GroundArmor1, vec![forge()]),
        research(
            R::GroundArmor2,
            vec![forge(), twilight(), Condition::Researched(R::GroundArmor1)],
        ),
        research(
            R::GroundArmor3,
            vec![forge(), twilight(), Condition::Researched(R::GroundArmor2)],
        ),
    ]
}

/// Immortal / Archon / Stalker / Zealot, with an Observer and a Sentry kept
/// alongside. Stalkers fill idle gateways until a Robotics Facility is
/// planned.
#[must_use]
pub fn composition() -> CompositionTarget {
    CompositionTarget {
        tracked: vec![
            TrackedUnit::new(U::Immortal, 0.25),
            TrackedUnit::new(U::Archon, 0.25)
                .trained_as(U::HighTemplar)
                .with_gate(Condition::ready(U::TemplarArchive)),
            TrackedUnit::new(U::Stalker, 0.10),
            TrackedUnit::new(U::Zealot, 0.40).with_gate(Condition::Researched(R::Charge)),
        ],
        morphs: vec![MorphRule {
            from: U::HighTemplar,
            into: U::Archon,
        }],
        reserves: vec![
            Reserve {
                unit: U::Observer,
                count: 1,
                gate: Condition::Always,
            },
            Reserve {
                unit: U::Sentry,
                count: 1,
                gate: Condition::at_least(&[U::Stalker], CountScope::Total, 2),
            },
        ],
        starters: vec![StarterUnit {
            unit: U::Stalker,
            gate: Condition::Not(Box::new(Condition::planned(U::RoboticsFacility))),
        }],
        save_for_top_choice: false,
    }
}

impl BotConfig {
    /// The shipped strategy.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            name: "gateway-macro".to_string(),
            seed: 0,
            selector: SelectorKind::Scripted,
            structure_ladder: BuildLadder::from_steps("structures", structure_ladder()),
            research_ladder: BuildLadder::from_steps("research", research_ladder()),
            composition: composition(),
            deployment: DeploymentConfig::default(),
            dispatch: DispatchConfig::default(),
            workers: WorkerPolicy::default(),
            learning: QLearningConfig::default(),
        }
    }
}
