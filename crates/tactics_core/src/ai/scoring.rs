//! Board evaluation helpers for the heuristic AI.
//!
//! Everything here is a read-only query over a [`Board`].

use std::cmp::Reverse;
use std::collections::BTreeSet;

use crate::board::Board;
use crate::grid::Coord;
use crate::math::{round_to_i32, Fixed};
use crate::player::PlayerId;
use crate::unit::{tags, Unit};

use super::AiConfig;

/// Ordering key for attack targets; the maximum is the best target.
///
/// Compares bonus multiplier (higher first), then HP fraction (lower first),
/// then distance to the nearest objective (closer first).
pub type TargetScore = (Fixed, Reverse<Fixed>, Reverse<u32>);

/// Distance from `coord` to the nearest objective, `u32::MAX` if there are none.
#[must_use]
pub fn objective_distance(board: &Board, coord: Coord) -> u32 {
    board
        .objectives()
        .iter()
        .map(|objective| objective.manhattan(coord))
        .min()
        .unwrap_or(u32::MAX)
}

/// Score a target cell for `attacker`.
#[must_use]
pub fn target_score(board: &Board, attacker: &Unit, target: Coord) -> Option<TargetScore> {
    let victim = board.unit_at(target)?;
    Some((
        attacker.bonuses().multiplier_against(victim.tags()),
        Reverse(victim.hp_fraction()),
        Reverse(objective_distance(board, target)),
    ))
}

/// The best legal target for the unit at `from`.
#[must_use]
pub fn best_target(board: &Board, from: Coord) -> Option<Coord> {
    let attacker = board.unit_at(from)?;
    board
        .attackable_tiles_from(from)
        .into_iter()
        .filter_map(|target| target_score(board, attacker, target).map(|score| (score, target)))
        .max_by(|a, b| a.0.cmp(&b.0))
        .map(|(_, target)| target)
}

/// Objective cells not held by `player`'s opponent.
#[must_use]
pub fn uncontested_objectives(board: &Board, player: PlayerId) -> BTreeSet<Coord> {
    board
        .objectives()
        .iter()
        .copied()
        .filter(|&coord| board.unit_at(coord).map_or(true, |unit| unit.owner() == player))
        .collect()
}

/// Cells of every unit owned by `player`'s opponent.
#[must_use]
pub fn enemy_cells(board: &Board, player: PlayerId) -> Vec<Coord> {
    board
        .grid()
        .units_of(player.other())
        .map(|(coord, _)| coord)
        .collect()
}

/// Distance from `coord` to the nearest cell in `cells`.
#[must_use]
pub fn nearest_distance(coord: Coord, cells: &[Coord]) -> Option<u32> {
    cells.iter().map(|cell| cell.manhattan(coord)).min()
}

/// The move that brings the unit closest to any of `goals`.
#[must_use]
pub fn step_toward(moves: &BTreeSet<Coord>, goals: &[Coord]) -> Option<Coord> {
    if goals.is_empty() {
        return None;
    }
    moves
        .iter()
        .copied()
        .min_by_key(|&cell| nearest_distance(cell, goals).unwrap_or(u32::MAX))
}

/// The move that keeps the unit furthest from every cell in `threats`.
#[must_use]
pub fn step_away(moves: &BTreeSet<Coord>, threats: &[Coord]) -> Option<Coord> {
    moves
        .iter()
        .copied()
        .max_by_key(|&cell| nearest_distance(cell, threats).unwrap_or(u32::MAX))
}

/// Damage the enemies of `unit` could deal to it at `cell` during their next
/// turn.
///
/// An enemy counts if it can get within range: its distance to the cell is at
/// most its speed plus its range. Each contributes its armor-adjusted damage
/// (at least 1) times its actions.
#[must_use]
pub fn threat_at(board: &Board, cell: Coord, unit: &Unit) -> i32 {
    board
        .grid()
        .units_of(unit.owner().other())
        .filter(|(coord, enemy)| {
            let reach = u32::try_from(enemy.speed() + enemy.range()).unwrap_or(0);
            coord.manhattan(cell) <= reach && enemy.range() > 0
        })
        .map(|(_, enemy)| {
            let per_hit = (round_to_i32(enemy.damage_against(unit)) - unit.armor()).max(1);
            per_hit * enemy.actions().max(1)
        })
        .sum()
}

/// Whether staying at `cell` is likely to get `unit` killed.
///
/// Units that cannot strike back are more cautious: half their HP is
/// enough to count as lethal.
#[must_use]
pub fn is_lethal(board: &Board, cell: Coord, unit: &Unit) -> bool {
    let threat = threat_at(board, cell, unit);
    let can_counter = unit.attack() > 0 && unit.range() > 0;
    let threshold = if can_counter { unit.hp() } else { unit.hp() / 2 };
    threat > 0 && threat >= threshold
}

/// The safest of `moves` for `unit`: another objective when one is
/// reachable, otherwise the cell furthest from any enemy.
#[must_use]
pub fn safest_cell(board: &Board, moves: &BTreeSet<Coord>, unit: &Unit) -> Option<Coord> {
    let threats = enemy_cells(board, unit.owner());
    let objectives: BTreeSet<Coord> = moves
        .iter()
        .copied()
        .filter(|&cell| board.is_objective(cell) && !is_lethal(board, cell, unit))
        .collect();
    if objectives.is_empty() {
        step_away(moves, &threats)
    } else {
        step_away(&objectives, &threats)
    }
}

/// Check if `player` is losing badly.
///
/// Dire means too few standing units and no income, or a total HP far
/// below the opponent's.
#[must_use]
pub fn is_dire(board: &Board, player: PlayerId, config: &AiConfig) -> bool {
    let own: Vec<&Unit> = board.grid().units_of(player).map(|(_, unit)| unit).collect();
    let standing = own.iter().filter(|unit| !unit.is_under_construction()).count();
    let producers = own
        .iter()
        .filter(|unit| unit.has_tag(tags::PRODUCER) && !unit.is_under_construction())
        .count();
    if standing < config.dire_min_units && producers == 0 {
        return true;
    }

    let own_hp: i32 = own.iter().map(|unit| unit.hp()).sum();
    let enemy_hp: i32 = board
        .grid()
        .units_of(player.other())
        .map(|(_, unit)| unit.hp())
        .sum();
    Fixed::from_num(own_hp) < config.dire_hp_ratio * Fixed::from_num(enemy_hp)
}

/// Units of `player` standing on objectives plus its producers.
#[must_use]
pub fn foothold(board: &Board, player: PlayerId) -> usize {
    board
        .grid()
        .units_of(player)
        .filter(|(coord, unit)| board.is_objective(*coord) || unit.has_tag(tags::PRODUCER))
        .count()
}
