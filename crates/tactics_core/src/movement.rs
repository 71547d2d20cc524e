//! Movement legality and reachability.
//!
//! Reachability is a breadth-first search over orthogonal steps, bounded by
//! the mover's effective speed. A step may enter a cell only if the moving
//! player can pass through it: the cell is empty, or holds one of that
//! player's own units that does not obstruct movement. Enemy units are never
//! passable. Destinations must additionally be empty.

use std::collections::{BTreeSet, VecDeque};

use tracing::debug;

use crate::board::Board;
use crate::grid::{Coord, Grid};
use crate::player::PlayerId;

/// Empty cells `player` can reach from `origin` within `budget` steps.
///
/// The origin itself is never included.
#[must_use]
pub fn reachable_cells(grid: &Grid, origin: Coord, player: PlayerId, budget: u32) -> BTreeSet<Coord> {
    let mut visited = BTreeSet::from([origin]);
    let mut frontier = VecDeque::from([(origin, 0u32)]);
    let mut reachable = BTreeSet::new();

    while let Some((coord, steps)) = frontier.pop_front() {
        if steps == budget {
            continue;
        }
        for next in grid.orthogonal(coord) {
            if visited.contains(&next) || !grid.passable_for(next, player) {
                continue;
            }
            visited.insert(next);
            if grid.is_empty(next) {
                reachable.insert(next);
            }
            frontier.push_back((next, steps + 1));
        }
    }

    reachable
}

impl Board {
    /// Cells the unit at `from` may move to this turn.
    ///
    /// Empty unless the cell holds a unit of the acting player that has not
    /// moved and still has speed and actions left.
    #[must_use]
    pub fn moveable_tiles_from(&self, from: Coord) -> BTreeSet<Coord> {
        match self.unit_at(from) {
            Some(unit) if unit.owner() == self.acting() && unit.can_move() => {
                let budget = u32::try_from(unit.speed()).unwrap_or(0);
                reachable_cells(self.grid(), from, unit.owner(), budget)
            }
            _ => BTreeSet::new(),
        }
    }

    /// Move a unit and mark it as moved.
    ///
    /// Returns false without changing anything if the move is not legal.
    pub fn move_unit(&mut self, from: Coord, to: Coord) -> bool {
        if !self.moveable_tiles_from(from).contains(&to) {
            return false;
        }
        self.grid_mut().move_unit(from, to);
        if let Some(unit) = self.unit_at_mut(to) {
            unit.mark_moved();
            debug!(unit = %unit.id(), name = unit.name(), %from, %to, "unit moved");
        }
        true
    }
}
