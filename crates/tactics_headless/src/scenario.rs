//! Scenario loading and configuration.
//!
//! Scenarios define the starting board for headless matches: the board
//! configuration plus the units each player begins with.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tactics_core::ai::AiConfig;
use tactics_core::board::Board;
use tactics_core::config::GameConfig;
use tactics_core::data::UnitCatalog;
use tactics_core::game::Game;
use tactics_core::grid::Coord;
use tactics_core::player::PlayerId;
use tracing::debug;

use crate::error::{Result, RunnerError};

/// One unit present at the start of a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    /// Unit kind name from the catalog.
    pub kind: String,
    /// Column.
    pub x: u32,
    /// Row.
    pub y: u32,
    /// Owning player.
    pub owner: PlayerId,
    /// Whether a buildable kind starts finished.
    #[serde(default)]
    pub prebuilt: bool,
}

impl Placement {
    /// Create a placement.
    pub fn new(kind: impl Into<String>, x: u32, y: u32, owner: PlayerId) -> Self {
        Self {
            kind: kind.into(),
            x,
            y,
            owner,
            prebuilt: false,
        }
    }

    /// Mark the unit as already built.
    #[must_use]
    pub fn prebuilt(mut self) -> Self {
        self.prebuilt = true;
        self
    }
}

/// A complete scenario configuration.
///
/// # Example RON
///
/// ```ron
/// Scenario(
///     name: "Duel",
///     config: (width: 6, height: 6),
///     placements: [
///         (kind: "Archer", x: 0, y: 0, owner: Zero),
///         (kind: "Knight", x: 5, y: 5, owner: One),
///     ],
/// )
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Board and rules configuration.
    #[serde(default)]
    pub config: GameConfig,
    /// Starting units.
    #[serde(default)]
    pub placements: Vec<Placement>,
    /// Base AI settings; each player gets its own seed on top.
    #[serde(default)]
    pub ai: AiConfig,
}

impl Default for Scenario {
    fn default() -> Self {
        Self::castles()
    }
}

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(RunnerError::FileNotFound(path.to_path_buf()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string.
    pub fn from_ron_str(ron: &str) -> Result<Self> {
        let scenario: Scenario = ron::from_str(ron)?;
        scenario.config.validate()?;
        Ok(scenario)
    }

    /// Two walled castles facing each other across a 10×20 board.
    ///
    /// Each side has a castle and a farm on its back row, a defensive
    /// archer, a six-wide wall with a two-cell gate and short side walls.
    /// The four central cells are objectives.
    #[must_use]
    pub fn castles() -> Self {
        let mut placements = Vec::new();
        castle_complex(&mut placements, PlayerId::Zero, 0, 3, 1);
        castle_complex(&mut placements, PlayerId::One, 19, 16, 18);

        Self {
            name: "Castles".to_string(),
            description: "Castle against castle with a contested centre".to_string(),
            config: GameConfig::default().with_objectives([
                Coord::new(4, 9),
                Coord::new(5, 9),
                Coord::new(4, 10),
                Coord::new(5, 10),
            ]),
            placements,
            ai: AiConfig::default(),
        }
    }

    /// Override the board configuration.
    #[must_use]
    pub fn with_config(mut self, config: GameConfig) -> Self {
        self.config = config;
        self
    }

    /// Lay out the starting board.
    pub fn build_board(&self, catalog: Arc<UnitCatalog>) -> Result<Board> {
        let mut board = Board::new(&self.config, catalog)?;
        for placement in &self.placements {
            board.place_unit(
                Coord::new(placement.x, placement.y),
                &placement.kind,
                placement.owner,
                placement.prebuilt,
            )?;
        }
        debug!(
            scenario = %self.name,
            units = board.grid().unit_count(),
            "scenario board ready"
        );
        Ok(board)
    }

    /// Lay out the board and hand both sides to seeded AI controllers.
    ///
    /// Player one's controller is seeded with `seed + 1` so the sides do
    /// not mirror each other's random picks.
    pub fn build_game(&self, catalog: Arc<UnitCatalog>, seed: u64) -> Result<Game> {
        let board = self.build_board(catalog)?;
        Ok(Game::from_board(board, self.config.max_chained_ai_turns)
            .with_ai(PlayerId::Zero, self.ai.clone().with_seed(seed))
            .with_ai(PlayerId::One, self.ai.clone().with_seed(seed.wrapping_add(1))))
    }
}

fn castle_complex(
    placements: &mut Vec<Placement>,
    owner: PlayerId,
    castle_y: u32,
    wall_y: u32,
    archer_y: u32,
) {
    for x in (2..=7).filter(|x| !matches!(*x, 4 | 5)) {
        placements.push(Placement::new("Wall", x, wall_y, owner).prebuilt());
    }

    let side_start = if castle_y == 0 { 0 } else { castle_y - 2 };
    for y in side_start..side_start + 3 {
        placements.push(Placement::new("Wall", 2, y, owner).prebuilt());
        placements.push(Placement::new("Wall", 7, y, owner).prebuilt());
    }

    placements.push(Placement::new("Gate", 4, wall_y, owner).prebuilt());
    placements.push(Placement::new("Gate", 5, wall_y, owner).prebuilt());
    placements.push(Placement::new("Archer", 5, archer_y, owner));
    placements.push(Placement::new("Castle", 5, castle_y, owner).prebuilt());
    placements.push(Placement::new("Farm", 4, castle_y, owner).prebuilt());
}
