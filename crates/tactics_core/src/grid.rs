//! Cells, coordinates and the unit position index.
//!
//! Each cell owns at most one [`Unit`]. Units are moved between cells by
//! value, so a unit can never be in two places at once. The grid also keeps
//! a `UnitId -> Coord` index that is updated only by [`Grid::place`],
//! [`Grid::take`] and [`Grid::move_unit`].
//!
//! Indexing outside the grid is a broken caller contract and panics.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::player::PlayerId;
use crate::unit::{Unit, UnitId};

/// A cell coordinate. `x` grows to the right, `y` grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    /// Column.
    pub x: u32,
    /// Row.
    pub y: u32,
}

impl Coord {
    /// Create a coordinate.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance, the only metric used for range, speed and area.
    #[must_use]
    pub const fn manhattan(self, other: Self) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Offset by a signed delta, if the result is non-negative.
    #[must_use]
    pub fn offset(self, dx: i64, dy: i64) -> Option<Self> {
        let x = u32::try_from(i64::from(self.x) + dx).ok()?;
        let y = u32::try_from(i64::from(self.y) + dy).ok()?;
        Some(Self { x, y })
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl From<(u32, u32)> for Coord {
    fn from((x, y): (u32, u32)) -> Self {
        Self { x, y }
    }
}

const ORTHOGONAL: [(i64, i64); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

const SURROUNDING: [(i64, i64); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// The board's cell array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    width: u32,
    height: u32,
    cells: Vec<Option<Unit>>,
    positions: BTreeMap<UnitId, Coord>,
}

impl Grid {
    /// Create an empty grid.
    ///
    /// # Panics
    ///
    /// Panics if either dimension is zero.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        assert!(width > 0 && height > 0, "grid must be at least 1x1");
        Self {
            width,
            height,
            cells: vec![None; (width * height) as usize],
            positions: BTreeMap::new(),
        }
    }

    /// Number of columns.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Check if a coordinate lies on the grid.
    #[must_use]
    pub const fn in_bounds(&self, coord: Coord) -> bool {
        coord.x < self.width && coord.y < self.height
    }

    fn index(&self, coord: Coord) -> usize {
        assert!(
            self.in_bounds(coord),
            "{coord} is outside the {}x{} grid",
            self.width,
            self.height
        );
        (coord.y * self.width + coord.x) as usize
    }

    /// The unit in a cell, if any.
    #[must_use]
    pub fn get(&self, coord: Coord) -> Option<&Unit> {
        self.cells[self.index(coord)].as_ref()
    }

    /// Mutable access to the unit in a cell.
    pub fn get_mut(&mut self, coord: Coord) -> Option<&mut Unit> {
        let index = self.index(coord);
        self.cells[index].as_mut()
    }

    /// Check if a cell holds no unit.
    #[must_use]
    pub fn is_empty(&self, coord: Coord) -> bool {
        self.get(coord).is_none()
    }

    /// Check if `player` may path through a cell: empty, or holding one of
    /// its own non-obstructing units.
    #[must_use]
    pub fn passable_for(&self, coord: Coord, player: PlayerId) -> bool {
        self.get(coord)
            .map_or(true, |unit| unit.can_pass_through(player))
    }

    /// Put a unit into an empty cell. Callers outside the crate go through
    /// [`Board::insert_unit`](crate::board::Board::insert_unit), which hands
    /// out unique ids.
    ///
    /// # Panics
    ///
    /// Panics if the cell is occupied or the unit's id is already on the grid.
    pub(crate) fn place(&mut self, coord: Coord, unit: Unit) {
        let index = self.index(coord);
        assert!(self.cells[index].is_none(), "cell {coord} is occupied");
        assert!(
            !self.positions.contains_key(&unit.id()),
            "unit {} is already on the grid",
            unit.id()
        );
        self.positions.insert(unit.id(), coord);
        self.cells[index] = Some(unit);
    }

    /// Remove and return the unit in a cell.
    pub(crate) fn take(&mut self, coord: Coord) -> Option<Unit> {
        let index = self.index(coord);
        let unit = self.cells[index].take()?;
        self.positions.remove(&unit.id());
        Some(unit)
    }

    /// Move a unit between cells.
    ///
    /// # Panics
    ///
    /// Panics if `from` is empty or `to` is occupied.
    pub(crate) fn move_unit(&mut self, from: Coord, to: Coord) {
        let unit = self
            .take(from)
            .unwrap_or_else(|| panic!("no unit at {from} to move"));
        self.place(to, unit);
    }

    /// Where a unit currently is.
    #[must_use]
    pub fn position_of(&self, id: UnitId) -> Option<Coord> {
        self.positions.get(&id).copied()
    }

    /// Look up a unit by id.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.position_of(id).and_then(|coord| self.get(coord))
    }

    /// All units with their positions, in id order.
    pub fn units(&self) -> impl Iterator<Item = (Coord, &Unit)> + '_ {
        self.positions.values().filter_map(|&coord| {
            self.get(coord).map(|unit| (coord, unit))
        })
    }

    /// Units owned by one player, in id order.
    pub fn units_of(&self, player: PlayerId) -> impl Iterator<Item = (Coord, &Unit)> + '_ {
        self.units().filter(move |(_, unit)| unit.owner() == player)
    }

    /// Ids of a player's units, in id order.
    #[must_use]
    pub fn ids_of(&self, player: PlayerId) -> Vec<UnitId> {
        self.units_of(player).map(|(_, unit)| unit.id()).collect()
    }

    /// Number of units on the grid.
    #[must_use]
    pub fn unit_count(&self) -> usize {
        self.positions.len()
    }

    /// Every coordinate, row by row.
    pub fn coords(&self) -> impl Iterator<Item = Coord> {
        let width = self.width;
        (0..self.height).flat_map(move |y| (0..width).map(move |x| Coord::new(x, y)))
    }

    /// In-bounds orthogonal neighbours.
    pub fn orthogonal(&self, coord: Coord) -> impl Iterator<Item = Coord> + '_ {
        ORTHOGONAL
            .iter()
            .filter_map(move |&(dx, dy)| coord.offset(dx, dy))
            .filter(|c| self.in_bounds(*c))
    }

    /// In-bounds cells among the eight around `coord`.
    pub fn surrounding(&self, coord: Coord) -> impl Iterator<Item = Coord> + '_ {
        SURROUNDING
            .iter()
            .filter_map(move |&(dx, dy)| coord.offset(dx, dy))
            .filter(|c| self.in_bounds(*c))
    }

    /// Empty cells among the eight around `coord`.
    pub fn empty_surrounding(&self, coord: Coord) -> impl Iterator<Item = Coord> + '_ {
        self.surrounding(coord).filter(|c| self.is_empty(*c))
    }

    /// In-bounds cells within Manhattan distance `radius`, including `center`.
    pub fn within(&self, center: Coord, radius: u32) -> impl Iterator<Item = Coord> + '_ {
        let r = i64::from(radius);
        (-r..=r)
            .flat_map(move |dy| {
                let span = r - dy.abs();
                (-span..=span).map(move |dx| (dx, dy))
            })
            .filter_map(move |(dx, dy)| center.offset(dx, dy))
            .filter(|c| self.in_bounds(*c))
    }
}
