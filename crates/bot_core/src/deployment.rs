//! Army movement: regroup at the rally point or commit to an attack.
//!
//! The only decision state that survives between ticks lives here: the rally
//! point and the current mode.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::command::{Command, CommandSink};
use crate::composition::{ArmyState, CompositionTarget};
use crate::error::{BotError, Result};
use crate::math::Vec2Fixed;
use crate::types::UnitTag;

/// Army supply above which the army commits.
pub const DEFAULT_COMMIT_SUPPLY: u32 = 80;

/// Ticks between regroup orders.
pub const DEFAULT_REGROUP_CADENCE: u64 = 12;

/// Whether the army waits or attacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DeploymentMode {
    /// Gather at the rally point.
    #[default]
    Regroup,
    /// Attack the enemy start location.
    Commit,
}

/// Thresholds and cadences for army movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentConfig {
    /// Army supply strictly above which the army commits.
    pub commit_supply_threshold: u32,
    /// Ticks between regroup orders.
    pub regroup_cadence: u64,
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        Self {
            commit_supply_threshold: DEFAULT_COMMIT_SUPPLY,
            regroup_cadence: DEFAULT_REGROUP_CADENCE,
        }
    }
}

impl DeploymentConfig {
    /// Reject a zero cadence.
    pub fn validate(&self) -> Result<()> {
        if self.regroup_cadence == 0 {
            return Err(BotError::InvalidValue {
                field: "deployment.regroup_cadence",
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Two-state army controller.
#[derive(Debug, Clone)]
pub struct DeploymentController {
    config: DeploymentConfig,
    rally: Vec2Fixed,
    mode: DeploymentMode,
}

impl DeploymentController {
    /// Start in [`DeploymentMode::Regroup`] at `rally`.
    #[must_use]
    pub const fn new(config: DeploymentConfig, rally: Vec2Fixed) -> Self {
        Self {
            config,
            rally,
            mode: DeploymentMode::Regroup,
        }
    }

    /// Current mode.
    #[must_use]
    pub const fn mode(&self) -> DeploymentMode {
        self.mode
    }

    /// Current rally point.
    #[must_use]
    pub const fn rally(&self) -> Vec2Fixed {
        self.rally
    }

    /// Move the rally point.
    pub fn set_rally(&mut self, rally: Vec2Fixed) {
        if rally != self.rally {
            info!(from = ?self.rally, to = ?rally, "Rally point moved");
            self.rally = rally;
        }
    }

    /// Apply the transition rule for this tick's army.
    ///
    /// An empty army always regroups. Otherwise the army commits once its
    /// supply exceeds the threshold and stays committed.
    pub fn update_mode(&mut self, army: &ArmyState) -> DeploymentMode {
        let next = if army.is_empty() {
            DeploymentMode::Regroup
        } else if army.supply > self.config.commit_supply_threshold {
            DeploymentMode::Commit
        } else {
            self.mode
        };

        if next != self.mode {
            info!(from = ?self.mode, to = ?next, army_supply = army.supply, "Deployment mode changed");
            self.mode = next;
        }
        next
    }

    /// Update the mode and issue this tick's movement orders.
    ///
    /// Morph sources never move; any not listed in `morphing` are ordered
    /// to morph instead. Returns the orders the sink accepted.
    pub fn run(
        &mut self,
        tick: u64,
        army: &ArmyState,
        target: &CompositionTarget,
        morphing: &[UnitTag],
        enemy_start: Vec2Fixed,
        sink: &mut dyn CommandSink,
    ) -> Vec<Command> {
        let mode = self.update_mode(army);
        let due = match mode {
            DeploymentMode::Commit => true,
            DeploymentMode::Regroup => tick % self.config.regroup_cadence == 0,
        };
        if !due || army.is_empty() {
            return Vec::new();
        }

        let mut orders = Vec::new();
        let mut movers = Vec::new();
        for &(tag, unit) in &army.units {
            match target.morph_target(unit) {
                Some(into) if !morphing.contains(&tag) => orders.push(Command::MorphUnit { unit: tag, into }),
                Some(_) => {}
                None => movers.push(tag),
            }
        }

        if !movers.is_empty() {
            orders.push(match mode {
                DeploymentMode::Regroup => Command::MoveUnits {
                    units: movers,
                    position: self.rally,
                },
                DeploymentMode::Commit => Command::AttackPosition {
                    units: movers,
                    position: enemy_start,
                },
            });
        }

        orders
            .into_iter()
            .filter(|order| match sink.submit(order.clone()) {
                Ok(()) => true,
                Err(rejected) => {
                    warn!(reason = %rejected.reason, "Movement order rejected");
                    false
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composition::MorphRule;
    use crate::types::UnitTypeId;

    fn army_with_supply(supply: u32, count: usize) -> ArmyState {
        let units: Vec<(UnitTag, UnitTypeId)> =
            (0..count).map(|i| (UnitTag(i as u64 + 1), UnitTypeId::Zealot)).collect();
        ArmyState {
            total_count: units.len() as u32,
            per_type_count: [(UnitTypeId::Zealot, units.len() as u32)].into_iter().collect(),
            supply,
            units,
        }
    }

    fn templar_target() -> CompositionTarget {
        CompositionTarget {
            morphs: vec![MorphRule {
                from: UnitTypeId::HighTemplar,
                into: UnitTypeId::Archon,
            }],
            ..CompositionTarget::default()
        }
    }

    #[test]
    fn test_mode_transitions() {
        let mut controller = DeploymentController::new(DeploymentConfig::default(), Vec2Fixed::ZERO);

        assert_eq!(controller.update_mode(&army_with_supply(79, 5)), DeploymentMode::Regroup);
        assert_eq!(controller.update_mode(&army_with_supply(80, 5)), DeploymentMode::Regroup);
        assert_eq!(controller.update_mode(&army_with_supply(81, 5)), DeploymentMode::Commit);
        assert_eq!(controller.update_mode(&army_with_supply(10, 5)), DeploymentMode::Commit);
        assert_eq!(controller.update_mode(&army_with_supply(0, 0)), DeploymentMode::Regroup);
    }

    #[test]
    fn test_regroup_only_on_cadence() {
        let rally = Vec2Fixed::from_ints(30, 30);
        let mut controller = DeploymentController::new(DeploymentConfig::default(), rally);
        let army = army_with_supply(10, 3);
        let mut sink: Vec<Command> = Vec::new();

        let issued: usize = (0..24)
            .map(|tick| {
                controller
                    .run(tick, &army, &CompositionTarget::default(), &[], Vec2Fixed::ZERO, &mut sink)
                    .len()
            })
            .sum();

        assert_eq!(issued, 2);
        assert_eq!(
            sink[0],
            Command::MoveUnits {
                units: vec![UnitTag(1), UnitTag(2), UnitTag(3)],
                position: rally
            }
        );
    }

    #[test]
    fn test_commit_attacks_every_tick() {
        let enemy = Vec2Fixed::from_ints(150, 150);
        let mut controller = DeploymentController::new(DeploymentConfig::default(), Vec2Fixed::ZERO);
        let army = army_with_supply(90, 2);
        let mut sink: Vec<Command> = Vec::new();

        for tick in 1..=3 {
            controller.run(tick, &army, &CompositionTarget::default(), &[], enemy, &mut sink);
        }

        assert_eq!(sink.len(), 3);
        assert!(sink
            .iter()
            .all(|c| matches!(c, Command::AttackPosition { position, .. } if *position == enemy)));
    }

    #[test]
    fn test_morph_sources_morph_instead_of_moving() {
        let mut controller = DeploymentController::new(DeploymentConfig::default(), Vec2Fixed::ZERO);
        let mut army = army_with_supply(10, 1);
        army.units.push((UnitTag(10), UnitTypeId::HighTemplar));
        army.units.push((UnitTag(11), UnitTypeId::HighTemplar));
        let mut sink: Vec<Command> = Vec::new();

        let issued = controller.run(0, &army, &templar_target(), &[UnitTag(10)], Vec2Fixed::ZERO, &mut sink);

        assert_eq!(
            issued,
            vec![
                Command::MorphUnit {
                    unit: UnitTag(11),
                    into: UnitTypeId::Archon
                },
                Command::MoveUnits {
                    units: vec![UnitTag(1)],
                    position: Vec2Fixed::ZERO
                },
            ]
        );
    }

    #[test]
    fn test_set_rally() {
        let mut controller = DeploymentController::new(DeploymentConfig::default(), Vec2Fixed::ZERO);
        controller.set_rally(Vec2Fixed::from_ints(5, 5));
        assert_eq!(controller.rally(), Vec2Fixed::from_ints(5, 5));
    }

    #[test]
    fn test_zero_cadence_rejected() {
        let config = DeploymentConfig {
            regroup_cadence: 0,
            ..DeploymentConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
