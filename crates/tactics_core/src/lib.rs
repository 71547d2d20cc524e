//! # Tactics Core
//!
//! Deterministic grid simulation engine for a two-player, turn-based
//! tactics game.
//!
//! This crate contains **only** game logic:
//! - No rendering
//! - No IO (catalogs arrive as strings, files are read by callers)
//! - No system randomness (the AI draws from a seeded `ChaCha8Rng`)
//! - No floating-point math in the simulation (uses fixed-point)
//!
//! ## Crate Structure
//!
//! - [`unit`] - Units, tag sets and derived stats
//! - [`status`] - Timed status effects and their stacking rules
//! - [`bonus`] - Tag-keyed damage multipliers
//! - [`grid`] - Cells, coordinates and the unit position index
//! - [`movement`] / [`combat`] - Legality queries and damage resolution
//! - [`economy`] - Purchases and income
//! - [`board`] - Authoritative game state and turn advance
//! - [`interaction`] - Click-driven selection state machine
//! - [`ai`] - Heuristic computer player
//! - [`game`] - Driver that hands turns to AI players
//! - [`data`] - Unit definition records and the catalog

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod ai;
pub mod board;
pub mod bonus;
pub mod combat;
pub mod config;
pub mod data;
pub mod economy;
pub mod error;
pub mod game;
pub mod grid;
pub mod interaction;
pub mod math;
pub mod movement;
pub mod player;
pub mod status;
pub mod unit;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::ai::{AiAction, AiConfig, AiDecision, AiTurnReport, HeuristicAi};
    pub use crate::board::{Board, TurnSummary};
    pub use crate::bonus::{BonusRule, BonusTable};
    pub use crate::combat::{AttackReport, Hit};
    pub use crate::config::GameConfig;
    pub use crate::data::{UnitCatalog, UnitData};
    pub use crate::economy::PurchaseError;
    pub use crate::error::{GameError, Result};
    pub use crate::game::Game;
    pub use crate::grid::{Coord, Grid};
    pub use crate::interaction::{
        ClickOutcome, ClickState, Highlights, PlayerSummary, ProductionEntry, ProductionStatus,
        UnitSummary,
    };
    pub use crate::math::Fixed;
    pub use crate::player::{Player, PlayerId};
    pub use crate::status::{AttachError, AttachOutcome, StatusEffect, StatusKind};
    pub use crate::unit::{Unit, UnitId};
}
