//! Attack legality and damage resolution.
//!
//! An attack resolves in a fixed order:
//! - damage to the primary target (attack × best bonus, minus armor, at least 1)
//! - the attacker's on-hit effect on the primary target, if it survived
//! - splash to every other enemy within the attacker's area of the target,
//!   scaled by `falloff^distance`, each followed by the same on-hit attempt
//! - one action spent, whatever happened
//!
//! Units reduced to zero HP are removed in the same step that killed them.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::board::Board;
use crate::grid::Coord;
use crate::math::{pow, Fixed};
use crate::status::{AttachError, AttachOutcome, StatusKind};
use crate::unit::{Unit, UnitId};

/// Multiplier for splash damage `distance` cells from the target.
///
/// Distance zero is always 1, including when `falloff` is zero.
#[must_use]
pub fn splash_multiplier(falloff: Fixed, distance: u32) -> Fixed {
    pow(falloff, distance)
}

/// One unit damaged by an attack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hit {
    /// Where the victim stood.
    pub coord: Coord,
    /// Victim id.
    pub unit: UnitId,
    /// Victim kind name.
    pub name: String,
    /// Distance from the primary target; zero for the target itself.
    pub splash_distance: u32,
    /// HP removed.
    pub hp_lost: i32,
    /// Whether the hit killed the victim.
    pub killed: bool,
}

/// One on-hit status attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusAttempt {
    /// Where the victim stood.
    pub coord: Coord,
    /// Effect inflicted.
    pub effect: StatusKind,
    /// What happened.
    pub result: Result<AttachOutcome, AttachError>,
}

/// Everything an attack did, in resolution order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackReport {
    /// Attacking unit, if there was one.
    pub attacker: Option<UnitId>,
    /// Damage dealt.
    pub hits: Vec<Hit>,
    /// On-hit status attempts.
    pub statuses: Vec<StatusAttempt>,
}

impl AttackReport {
    /// Number of units killed.
    #[must_use]
    pub fn kills(&self) -> usize {
        self.hits.iter().filter(|hit| hit.killed).count()
    }

    /// Total HP removed.
    #[must_use]
    pub fn total_damage(&self) -> i32 {
        self.hits.iter().map(|hit| hit.hp_lost).sum()
    }
}

impl Board {
    /// Enemy-occupied cells the unit at `from` may attack.
    ///
    /// Empty unless the cell holds a unit of the acting player with an
    /// action left. Line of sight is not considered.
    #[must_use]
    pub fn attackable_tiles_from(&self, from: Coord) -> BTreeSet<Coord> {
        let Some(attacker) = self.unit_at(from) else {
            return BTreeSet::new();
        };
        if attacker.owner() != self.acting() || !attacker.can_attack() {
            return BTreeSet::new();
        }
        let range = u32::try_from(attacker.range()).unwrap_or(0);
        self.grid()
            .units_of(attacker.owner().other())
            .map(|(coord, _)| coord)
            .filter(|coord| coord.manhattan(from) <= range)
            .collect()
    }

    /// Resolve an attack from `from` on `target`.
    ///
    /// Does nothing if `from` is empty. Legality is the caller's concern;
    /// see [`Board::attackable_tiles_from`].
    pub fn attack(&mut self, from: Coord, target: Coord) -> AttackReport {
        let Some(attacker) = self.unit_at(from).cloned() else {
            return AttackReport::default();
        };
        let mut report = AttackReport {
            attacker: Some(attacker.id()),
            ..AttackReport::default()
        };

        self.strike(&attacker, target, 0, &mut report);

        let area = u32::try_from(attacker.area()).unwrap_or(0);
        if area > 0 {
            let falloff = attacker.damage_falloff();
            let splash: Vec<Coord> = self
                .grid()
                .within(target, area)
                .filter(|&coord| coord != target)
                .collect();
            for coord in splash {
                let distance = coord.manhattan(target);
                let scale = splash_multiplier(falloff, distance);
                self.strike_scaled(&attacker, coord, distance, scale, &mut report);
            }
        }

        if let Some(unit) = self.unit_at_mut(from) {
            unit.spend_action();
        }

        debug!(
            attacker = %attacker.id(),
            name = attacker.name(),
            %from,
            %target,
            damage = report.total_damage(),
            kills = report.kills(),
            "attack resolved"
        );
        report
    }

    fn strike(&mut self, attacker: &Unit, coord: Coord, distance: u32, report: &mut AttackReport) {
        self.strike_scaled(attacker, coord, distance, Fixed::ONE, report);
    }

    /// Damage one enemy cell and try the on-hit effect if it survives.
    fn strike_scaled(
        &mut self,
        attacker: &Unit,
        coord: Coord,
        distance: u32,
        scale: Fixed,
        report: &mut AttackReport,
    ) {
        let Some(victim) = self.unit_at_mut(coord) else {
            return;
        };
        if victim.owner() == attacker.owner() {
            return;
        }

        let damage = attacker.damage_against(victim) * scale;
        let hp_lost = victim.take_damage(damage);
        let killed = victim.is_dead();
        report.hits.push(Hit {
            coord,
            unit: victim.id(),
            name: victim.name().to_string(),
            splash_distance: distance,
            hp_lost,
            killed,
        });

        if killed {
            debug!(unit = %victim.id(), name = victim.name(), %coord, "unit killed");
            self.remove_unit(coord);
            return;
        }

        if let Some(effect) = attacker.on_hit() {
            let result = victim.attach_status(effect.instantiate());
            report.statuses.push(StatusAttempt {
                coord,
                effect,
                result,
            });
        }
    }
}
