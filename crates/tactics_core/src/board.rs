//! Authoritative game state and turn advance.
//!
//! The [`Board`] owns the grid, both players, the turn counter and the
//! click-driven selection state. Every mutation of a match goes through it,
//! for human and AI players alike.
//!
//! Legality queries and actions live next to the rules they implement:
//! [`crate::movement`], [`crate::combat`], [`crate::economy`] and
//! [`crate::interaction`] each extend `Board` with their part of the API.
//!
//! # Turn advance
//!
//! [`Board::next_turn`] runs the phases in a fixed order:
//!
//! 1. clear the selection
//! 2. advance the turn counter by one half
//! 3. tick the status effects of every unit of the player whose turn ends
//! 4. remove the units those ticks killed
//! 5. restore actions and movement for every surviving unit
//! 6. hand the turn to the other player
//! 7. pay that player's income
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use tactics_core::prelude::*;
//!
//! let catalog = UnitCatalog::from_ron_str(r#"[
//!     UnitData(name: "Farm", attack: 0, max_hp: 5, speed: 0, range: 0,
//!              cost: 2, production: 1, tags: ["producer"]),
//! ]"#).unwrap();
//! let mut board = Board::new(&GameConfig::default(), Arc::new(catalog)).unwrap();
//! board.place_unit(Coord::new(0, 0), "Farm", PlayerId::One, true).unwrap();
//!
//! let summary = board.next_turn();
//! assert_eq!(summary.acting, PlayerId::One);
//! assert_eq!(summary.income, 1);
//! assert_eq!(board.player(PlayerId::One).funds, 6);
//! ```

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::config::GameConfig;
use crate::data::UnitCatalog;
use crate::error::{GameError, Result};
use crate::grid::{Coord, Grid};
use crate::interaction::ClickState;
use crate::math::{fixed_serde, Fixed, HALF};
use crate::player::{Player, PlayerId};
use crate::unit::{Unit, UnitId};

/// What a turn advance did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnSummary {
    /// Player whose turn ended.
    pub ended: PlayerId,
    /// Player now acting.
    pub acting: PlayerId,
    /// Turn counter after the advance.
    pub turn: Fixed,
    /// Income paid to the new acting player.
    pub income: i32,
    /// Units of the ending player killed by status damage.
    pub lost_to_status: Vec<String>,
}

/// The full state of one match.
#[derive(Debug, Clone, Serialize)]
pub struct Board {
    grid: Grid,
    players: [Player; 2],
    acting: PlayerId,
    #[serde(with = "fixed_serde")]
    turn: Fixed,
    pub(crate) selection: ClickState,
    objectives: BTreeSet<Coord>,
    #[serde(skip)]
    catalog: Arc<UnitCatalog>,
    next_id: u32,
}

impl Board {
    /// Create an empty board. Player zero acts first, on turn 1.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: &GameConfig, catalog: Arc<UnitCatalog>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            grid: Grid::new(config.width, config.height),
            players: PlayerId::ALL.map(|id| Player::new(id, config.starting_funds)),
            acting: PlayerId::Zero,
            turn: Fixed::ONE,
            selection: ClickState::default(),
            objectives: config.objectives.iter().copied().collect(),
            catalog,
            next_id: 1,
        })
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// The cell array.
    #[must_use]
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Mutable cell array, for scenario setup and tests.
    pub fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    /// The unit in a cell, if any.
    #[must_use]
    pub fn unit_at(&self, coord: Coord) -> Option<&Unit> {
        self.grid.get(coord)
    }

    /// Mutable access to the unit in a cell.
    pub fn unit_at_mut(&mut self, coord: Coord) -> Option<&mut Unit> {
        self.grid.get_mut(coord)
    }

    /// A player's state.
    #[must_use]
    pub const fn player(&self, id: PlayerId) -> &Player {
        &self.players[id.index()]
    }

    /// Mutable player state.
    pub fn player_mut(&mut self, id: PlayerId) -> &mut Player {
        &mut self.players[id.index()]
    }

    /// The player whose turn it is.
    #[must_use]
    pub const fn acting(&self) -> PlayerId {
        self.acting
    }

    /// State of the acting player.
    #[must_use]
    pub const fn acting_player(&self) -> &Player {
        self.player(self.acting)
    }

    /// Turn counter: starts at 1 and grows by one half per advance.
    #[must_use]
    pub const fn turn(&self) -> Fixed {
        self.turn
    }

    /// Whole turn number shown to players.
    #[must_use]
    pub fn turn_number(&self) -> i32 {
        self.turn.floor().to_num()
    }

    /// Current interaction state.
    #[must_use]
    pub const fn selection(&self) -> &ClickState {
        &self.selection
    }

    /// Objective cells.
    #[must_use]
    pub const fn objectives(&self) -> &BTreeSet<Coord> {
        &self.objectives
    }

    /// Check if a cell is an objective.
    #[must_use]
    pub fn is_objective(&self, coord: Coord) -> bool {
        self.objectives.contains(&coord)
    }

    /// Unit kinds available in this match.
    #[must_use]
    pub fn catalog(&self) -> &UnitCatalog {
        &self.catalog
    }

    /// Shared handle to the catalog.
    #[must_use]
    pub fn catalog_handle(&self) -> Arc<UnitCatalog> {
        Arc::clone(&self.catalog)
    }

    // ------------------------------------------------------------------
    // Placement
    // ------------------------------------------------------------------

    /// Put an existing unit on an empty cell, assigning it a fresh id.
    ///
    /// # Panics
    ///
    /// Panics if the cell is occupied or outside the grid.
    pub fn insert_unit(&mut self, coord: Coord, mut unit: Unit) -> UnitId {
        let id = UnitId(self.next_id);
        self.next_id += 1;
        unit.set_id(id);
        self.grid.place(coord, unit);
        id
    }

    /// Place a catalog unit without charging anyone, for scenario setup.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown kinds or an occupied cell.
    pub fn place_unit(
        &mut self,
        coord: Coord,
        kind: &str,
        owner: PlayerId,
        prebuilt: bool,
    ) -> Result<UnitId> {
        if !self.grid.is_empty(coord) {
            return Err(GameError::InvalidState(format!(
                "cannot place {kind} on occupied cell {coord}"
            )));
        }
        let unit = self.catalog.instantiate(kind, owner, prebuilt)?;
        let id = self.insert_unit(coord, unit);
        debug!(%id, kind, ?owner, %coord, prebuilt, "unit placed");
        Ok(id)
    }

    /// Remove a unit from the board.
    pub fn remove_unit(&mut self, coord: Coord) -> Option<Unit> {
        self.grid.take(coord)
    }

    // ------------------------------------------------------------------
    // Turn advance
    // ------------------------------------------------------------------

    /// End the acting player's turn.
    pub fn next_turn(&mut self) -> TurnSummary {
        self.selection = ClickState::default();
        self.turn += HALF;

        let ending = self.acting;
        let mut dead = Vec::new();
        let ticking: Vec<Coord> = self.grid.units_of(ending).map(|(coord, _)| coord).collect();
        for coord in ticking {
            if let Some(unit) = self.grid.get_mut(coord) {
                if unit.statuses().is_empty() {
                    continue;
                }
                let tick = unit.tick_statuses();
                debug!(unit = %unit.id(), name = unit.name(), hp = unit.hp(), ?tick, "status tick");
                if unit.is_dead() {
                    dead.push(coord);
                }
            }
        }

        let lost_to_status: Vec<String> = dead
            .into_iter()
            .filter_map(|coord| self.grid.take(coord))
            .map(|unit| unit.name().to_string())
            .collect();

        let occupied: Vec<Coord> = self.grid.units().map(|(coord, _)| coord).collect();
        for coord in occupied {
            if let Some(unit) = self.grid.get_mut(coord) {
                unit.reset_for_turn();
            }
        }

        self.acting = ending.other();
        let income = self.income_for(self.acting);
        self.players[self.acting.index()].earn(income);

        info!(
            turn = %self.turn,
            acting = ?self.acting,
            income,
            funds = self.acting_player().funds,
            lost = lost_to_status.len(),
            "turn advanced"
        );

        TurnSummary {
            ended: ending,
            acting: self.acting,
            turn: self.turn,
            income,
            lost_to_status,
        }
    }

    // ------------------------------------------------------------------
    // Snapshots
    // ------------------------------------------------------------------

    /// Compute a hash of the game state.
    ///
    /// Two boards with identical state produce identical hashes. The
    /// selection state is not part of the hash.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.turn.to_bits().hash(&mut hasher);
        self.acting.hash(&mut hasher);
        for player in &self.players {
            player.funds.hash(&mut hasher);
        }

        self.grid.unit_count().hash(&mut hasher);
        for (coord, unit) in self.grid.units() {
            unit.id().hash(&mut hasher);
            coord.hash(&mut hasher);
            unit.name().hash(&mut hasher);
            unit.owner().hash(&mut hasher);
            unit.hp().hash(&mut hasher);
            unit.actions().hash(&mut hasher);
            unit.has_moved().hash(&mut hasher);
            if let Some(construction) = unit.construction() {
                construction.progress.hash(&mut hasher);
                construction.in_progress.hash(&mut hasher);
            }
            for effect in unit.statuses().as_slice() {
                effect.name.hash(&mut hasher);
                effect.duration.hash(&mut hasher);
            }
        }

        hasher.finish()
    }

    /// Serialize the board for snapshots and debugging.
    ///
    /// The catalog is not included.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| GameError::InvalidState(format!("Failed to serialize board: {e}")))
    }
}
