//! Test fixtures and helpers.
//!
//! A small standard catalog, a board builder and pre-built matches for
//! consistent testing.

use std::sync::Arc;

use fixed::types::I32F32;
use tactics_core::ai::AiConfig;
use tactics_core::board::Board;
use tactics_core::config::GameConfig;
use tactics_core::data::UnitCatalog;
use tactics_core::game::Game;
use tactics_core::grid::Coord;
use tactics_core::player::PlayerId;

/// Standard unit kinds shared by tests.
pub const STANDARD_UNITS: &str = r#"[
    UnitData(name: "Castle", attack: 0, max_hp: 40, armor: 3, speed: 0, range: 0, cost: 30,
             production: 1, tags: ["building", "construct", "factory", "obstructs movement"]),
    UnitData(name: "Farm", attack: 0, max_hp: 8, speed: 0, range: 0, cost: 3, production: 1,
             tags: ["building", "construct", "producer", "produced by builder", "produced by Peasant"],
             hotkey: 'f'),
    UnitData(name: "Wall", attack: 0, max_hp: 20, armor: 3, speed: 0, range: 0, cost: 2,
             tags: ["building", "construct", "obstructs movement", "produced by builder",
                    "produced by Peasant"],
             hotkey: 'w', build_cost: Some(3)),
    UnitData(name: "Peasant", attack: 1, max_hp: 5, speed: 3, range: 1, cost: 1,
             tags: ["alive", "infantry", "builder", "produced by Castle"], hotkey: 'p'),
    UnitData(name: "Archer", attack: 4, max_hp: 10, speed: 3, range: 3, cost: 2,
             tags: ["alive", "infantry", "ranged", "produced by Castle"], hotkey: 'a'),
    UnitData(name: "Swordsman", attack: 5, max_hp: 12, armor: 1, speed: 3, range: 1, cost: 3,
             bonuses: "ranged:1.5", tags: ["alive", "infantry", "produced by Castle"],
             hotkey: 's'),
    UnitData(name: "Knight", attack: 6, max_hp: 14, armor: 1, speed: 5, range: 1, cost: 5,
             bonuses: "infantry:1.5", tags: ["alive", "cavalry", "produced by Castle"],
             hotkey: 'k', status_on_hit: Some("fear")),
    UnitData(name: "Catapult", attack: 6, max_hp: 8, speed: 2, range: 4, cost: 5, area: 1,
             damage_falloff: 0.5, bonuses: "building:2",
             tags: ["construct", "siege", "produced by Castle"], hotkey: 'c'),
    UnitData(name: "Alchemist", attack: 2, max_hp: 7, speed: 3, range: 2, cost: 4,
             tags: ["alive", "infantry", "ranged", "produced by Castle"], hotkey: 'l',
             status_on_hit: Some("poison")),
]"#;

/// Names of the mobile kinds in [`STANDARD_UNITS`].
pub const MOBILE_KINDS: [&str; 6] = [
    "Peasant",
    "Archer",
    "Swordsman",
    "Knight",
    "Catapult",
    "Alchemist",
];

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
///
/// Note: In real simulation code, never use floats.
/// This is only for convenient test setup.
#[must_use]
pub fn fixed_f(n: f64) -> I32F32 {
    I32F32::from_num(n)
}

/// The standard catalog.
///
/// # Panics
///
/// Panics if [`STANDARD_UNITS`] does not parse.
#[must_use]
pub fn standard_catalog() -> Arc<UnitCatalog> {
    Arc::new(UnitCatalog::from_ron_str(STANDARD_UNITS).expect("standard catalog parses"))
}

/// Builder for boards with a known layout.
///
/// ```
/// use tactics_test_utils::fixtures::BoardBuilder;
/// use tactics_core::player::PlayerId;
///
/// let board = BoardBuilder::new()
///     .size(6, 6)
///     .unit(0, 0, "Archer", PlayerId::Zero)
///     .unit(5, 5, "Knight", PlayerId::One)
///     .build();
/// assert_eq!(board.grid().unit_count(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct BoardBuilder {
    config: GameConfig,
    catalog: Arc<UnitCatalog>,
    placements: Vec<(Coord, String, PlayerId, bool)>,
}

impl Default for BoardBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BoardBuilder {
    /// A 10×10 board with the standard catalog.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: GameConfig::default().with_size(10, 10),
            catalog: standard_catalog(),
            placements: Vec::new(),
        }
    }

    /// Use a different catalog.
    #[must_use]
    pub fn catalog(mut self, catalog: Arc<UnitCatalog>) -> Self {
        self.catalog = catalog;
        self
    }

    /// Board dimensions.
    #[must_use]
    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.config = self.config.with_size(width, height);
        self
    }

    /// Starting funds for both players.
    #[must_use]
    pub fn funds(mut self, funds: i32) -> Self {
        self.config = self.config.with_starting_funds(funds);
        self
    }

    /// Objective cells.
    #[must_use]
    pub fn objectives(mut self, cells: &[(u32, u32)]) -> Self {
        self.config = self
            .config
            .with_objectives(cells.iter().map(|&(x, y)| Coord::new(x, y)));
        self
    }

    /// Place a unit; kinds built by builders arrive as construction sites.
    #[must_use]
    pub fn unit(mut self, x: u32, y: u32, kind: &str, owner: PlayerId) -> Self {
        self.placements
            .push((Coord::new(x, y), kind.to_string(), owner, false));
        self
    }

    /// Place a finished unit.
    #[must_use]
    pub fn prebuilt(mut self, x: u32, y: u32, kind: &str, owner: PlayerId) -> Self {
        self.placements
            .push((Coord::new(x, y), kind.to_string(), owner, true));
        self
    }

    /// The configuration the board will be built from.
    #[must_use]
    pub const fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Build the board.
    ///
    /// # Panics
    ///
    /// Panics if the configuration or any placement is invalid.
    #[must_use]
    pub fn build(self) -> Board {
        let mut board = Board::new(&self.config, self.catalog).expect("valid board config");
        for (coord, kind, owner, prebuilt) in self.placements {
            board
                .place_unit(coord, &kind, owner, prebuilt)
                .unwrap_or_else(|err| panic!("cannot place {kind} at {coord}: {err}"));
        }
        board
    }
}

/// A small AI-vs-AI match: a castle, a farm and an archer per side, facing
/// each other across a 10×12 board with two objectives in the middle.
#[must_use]
pub fn skirmish(seed: u64) -> Game {
    let board = BoardBuilder::new()
        .size(10, 12)
        .objectives(&[(2, 6), (7, 5)])
        .prebuilt(5, 0, "Castle", PlayerId::Zero)
        .prebuilt(4, 0, "Farm", PlayerId::Zero)
        .unit(5, 1, "Archer", PlayerId::Zero)
        .prebuilt(4, 11, "Castle", PlayerId::One)
        .prebuilt(5, 11, "Farm", PlayerId::One)
        .unit(4, 10, "Archer", PlayerId::One)
        .build();
    Game::from_board(board, u32::MAX)
        .with_ai(PlayerId::Zero, AiConfig::default().with_seed(seed))
        .with_ai(PlayerId::One, AiConfig::default().with_seed(seed.wrapping_add(1)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_catalog_loads() {
        let catalog = standard_catalog();
        assert_eq!(catalog.len(), 9);
        for kind in MOBILE_KINDS {
            assert!(catalog.contains(kind), "missing {kind}");
        }
        assert_eq!(catalog.produced_by("Castle").len(), MOBILE_KINDS.len());
    }

    #[test]
    fn test_builder_places_sites_and_prebuilt() {
        let board = BoardBuilder::new()
            .unit(0, 0, "Farm", PlayerId::Zero)
            .prebuilt(1, 0, "Farm", PlayerId::Zero)
            .build();
        assert!(board.unit_at(Coord::new(0, 0)).unwrap().is_under_construction());
        assert!(!board.unit_at(Coord::new(1, 0)).unwrap().is_under_construction());
    }

    #[test]
    fn test_skirmish_is_ai_vs_ai() {
        let game = skirmish(3);
        assert!(game.is_ai(PlayerId::Zero));
        assert!(game.is_ai(PlayerId::One));
        assert_eq!(game.board().grid().unit_count(), 6);
    }
}
