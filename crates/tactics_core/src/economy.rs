//! Purchases, construction and income.
//!
//! Each player has a single balance. Buying a unit places it for the acting
//! player and deducts its cost; a failed purchase changes nothing. Kinds
//! tagged `produced by builder` arrive as construction sites and earn
//! nothing until builders finish them.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::board::Board;
use crate::grid::Coord;
use crate::player::PlayerId;
use crate::unit::{tags, UnitId};

/// Why a purchase was refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum PurchaseError {
    /// The acting player cannot pay.
    #[error("Cannot afford {kind}: costs {cost}, have {funds}")]
    InsufficientFunds {
        /// Kind requested.
        kind: String,
        /// Its price.
        cost: i32,
        /// The player's balance.
        funds: i32,
    },
    /// The target cell already holds a unit.
    #[error("Cell {0} is occupied")]
    Occupied(Coord),
    /// The catalog has no such kind.
    #[error("Unknown unit kind: {0}")]
    UnknownKind(String),
}

impl Board {
    /// Income `player` collects at the start of its turn: the production of
    /// all its units that are not under construction.
    #[must_use]
    pub fn income_for(&self, player: PlayerId) -> i32 {
        self.grid()
            .units_of(player)
            .map(|(_, unit)| unit.income())
            .sum()
    }

    /// Buy a unit of `kind` for the acting player and place it at `coord`.
    ///
    /// # Errors
    ///
    /// Returns a [`PurchaseError`] and leaves the board untouched if the kind
    /// is unknown, the player cannot pay or the cell is occupied.
    pub fn buy_unit(&mut self, coord: Coord, kind: &str) -> Result<UnitId, PurchaseError> {
        let buyer = self.acting();
        let cost = self
            .catalog()
            .cost_of(kind)
            .ok_or_else(|| PurchaseError::UnknownKind(kind.to_string()))?;
        let funds = self.player(buyer).funds;
        if funds < cost {
            return Err(PurchaseError::InsufficientFunds {
                kind: kind.to_string(),
                cost,
                funds,
            });
        }
        if !self.grid().is_empty(coord) {
            return Err(PurchaseError::Occupied(coord));
        }

        let unit = self
            .catalog()
            .instantiate(kind, buyer, false)
            .map_err(|_| PurchaseError::UnknownKind(kind.to_string()))?;
        let id = self.insert_unit(coord, unit);
        self.player_mut(buyer).spend(cost);

        info!(%id, kind, player = ?buyer, %coord, cost, funds = self.player(buyer).funds, "unit purchased");
        Ok(id)
    }

    /// Allied construction sites the builder at `from` can work on now.
    #[must_use]
    pub fn buildable_tiles_from(&self, from: Coord) -> BTreeSet<Coord> {
        let Some(builder) = self.unit_at(from) else {
            return BTreeSet::new();
        };
        if builder.owner() != self.acting()
            || !builder.has_tag(tags::BUILDER)
            || !builder.can_attack()
        {
            return BTreeSet::new();
        }
        self.grid()
            .surrounding(from)
            .filter(|&coord| {
                self.unit_at(coord).is_some_and(|site| {
                    site.owner() == builder.owner() && site.is_under_construction()
                })
            })
            .collect()
    }

    /// Spend one of the builder's actions advancing the site's construction.
    ///
    /// Returns false without changing anything if the build is not legal.
    pub fn build(&mut self, builder: Coord, site: Coord) -> bool {
        if !self.buildable_tiles_from(builder).contains(&site) {
            return false;
        }
        if let Some(unit) = self.unit_at_mut(builder) {
            unit.spend_action();
        }
        if let Some(unit) = self.unit_at_mut(site) {
            let finished = unit.construct_tick();
            let progress = unit.construction().map_or(0, |c| c.progress);
            debug!(site = %unit.id(), name = unit.name(), progress, finished, "construction advanced");
            if finished {
                info!(site = %unit.id(), name = unit.name(), %site, "construction finished");
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::config::GameConfig;
    use crate::data::UnitCatalog;

    const CATALOG: &str = r#"[
        UnitData(name: "Peasant", attack: 1, max_hp: 5, speed: 3, range: 1, cost: 1,
                 tags: ["alive", "builder"], actions: 1),
        UnitData(name: "Farm", attack: 0, max_hp: 8, speed: 0, range: 0, cost: 3,
                 production: 1, tags: ["producer", "produced by builder", "produced by Peasant"]),
        UnitData(name: "Knight", attack: 6, max_hp: 14, speed: 4, range: 1, cost: 6,
                 tags: ["alive"]),
    ]"#;

    fn board() -> Board {
        let catalog = UnitCatalog::from_ron_str(CATALOG).unwrap();
        Board::new(&GameConfig::default(), Arc::new(catalog)).unwrap()
    }

    #[test]
    fn test_buy_unit_deducts_cost() {
        let mut board = board();
        let id = board.buy_unit(Coord::new(1, 1), "Farm").unwrap();
        assert_eq!(board.player(PlayerId::Zero).funds, 2);
        let farm = board.unit_at(Coord::new(1, 1)).unwrap();
        assert_eq!(farm.id(), id);
        assert_eq!(farm.owner(), PlayerId::Zero);
        assert!(farm.is_under_construction());
    }

    #[test]
    fn test_purchase_error_messages() {
        let err = PurchaseError::InsufficientFunds {
            kind: "Knight".to_string(),
            cost: 6,
            funds: 5,
        };
        assert_eq!(err.to_string(), "Cannot afford Knight: costs 6, have 5");
        assert_eq!(
            PurchaseError::Occupied(Coord::new(2, 3)).to_string(),
            "Cell (2, 3) is occupied"
        );
        let boxed: Box<dyn std::error::Error> =
            Box::new(PurchaseError::UnknownKind("Dragon".to_string()));
        assert_eq!(boxed.to_string(), "Unknown unit kind: Dragon");
    }

    #[test]
    fn test_failed_purchase_changes_nothing() {
        let mut board = board();
        let before = board.state_hash();
        assert!(matches!(
            board.buy_unit(Coord::new(0, 0), "Knight"),
            Err(PurchaseError::InsufficientFunds { cost: 6, funds: 5, .. })
        ));
        assert_eq!(
            board.buy_unit(Coord::new(0, 0), "Dragon"),
            Err(PurchaseError::UnknownKind("Dragon".to_string()))
        );
        board.place_unit(Coord::new(0, 0), "Peasant", PlayerId::One, false).unwrap();
        let before_occupied = board.state_hash();
        assert_ne!(before, before_occupied);
        assert_eq!(
            board.buy_unit(Coord::new(0, 0), "Peasant"),
            Err(PurchaseError::Occupied(Coord::new(0, 0)))
        );
        assert_eq!(board.state_hash(), before_occupied);
    }

    #[test]
    fn test_sites_earn_nothing_until_built() {
        let mut board = board();
        board.place_unit(Coord::new(0, 0), "Peasant", PlayerId::Zero, false).unwrap();
        board.buy_unit(Coord::new(1, 1), "Farm").unwrap();
        assert_eq!(board.income_for(PlayerId::Zero), 0);

        assert_eq!(
            board.buildable_tiles_from(Coord::new(0, 0)),
            BTreeSet::from([Coord::new(1, 1)])
        );
        assert!(board.build(Coord::new(0, 0), Coord::new(1, 1)));
        // One action per turn.
        assert!(!board.build(Coord::new(0, 0), Coord::new(1, 1)));
        assert!(board.unit_at(Coord::new(1, 1)).unwrap().is_under_construction());

        board.next_turn();
        board.next_turn();
        assert!(board.build(Coord::new(0, 0), Coord::new(1, 1)));
        assert!(!board.unit_at(Coord::new(1, 1)).unwrap().is_under_construction());
        assert_eq!(board.income_for(PlayerId::Zero), 1);
    }

    #[test]
    fn test_income_paid_on_turn_start() {
        let mut board = board();
        board.place_unit(Coord::new(5, 0), "Farm", PlayerId::One, true).unwrap();
        board.next_turn();
        assert_eq!(board.player(PlayerId::One).funds, 6);
        assert_eq!(board.player(PlayerId::Zero).funds, 5);
    }
}
