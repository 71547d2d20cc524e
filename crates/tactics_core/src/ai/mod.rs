//! Heuristic computer player.
//!
//! The AI plays through the same board API a human uses and ends its turn
//! with [`Board::next_turn`]. Each turn it visits its units in a seeded
//! random order and lets the first applicable rule from an ordered list
//! decide what the unit does:
//!
//! 1. `hold_objective` - units on an objective attack, retreat if staying
//!    would be lethal, or hold
//! 2. `builder` - builders fight, build, found producers or head for
//!    objectives
//! 3. `engage` - attack the best target or advance
//! 4. `factory` - factories produce a unit from the least recently bought
//!    cost bracket
//!
//! All randomness comes from a `ChaCha8Rng` seeded by [`AiConfig::seed`], so
//! the same seed on the same board always plays the same game.

mod rules;
pub mod scoring;

use std::collections::VecDeque;

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::board::{Board, TurnSummary};
use crate::error::{GameError, Result};
use crate::grid::Coord;
use crate::math::{decimal_serde, Fixed};
use crate::player::PlayerId;
use crate::unit::UnitId;

/// Tuning for the heuristic AI.
///
/// # Example RON
///
/// ```ron
/// AiConfig(
///     history_window: 5,
///     cheap_max_cost: 2,
///     expensive_min_cost: 5,
///     dire_hp_ratio: 0.3,
///     dire_min_units: 2,
///     seed: 42,
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// How many recent purchases the factory rule remembers.
    pub history_window: usize,
    /// Highest cost in the cheap bracket.
    pub cheap_max_cost: i32,
    /// Lowest cost in the expensive bracket.
    pub expensive_min_cost: i32,
    /// Own total HP below this fraction of the enemy's is dire.
    #[serde(with = "decimal_serde")]
    pub dire_hp_ratio: Fixed,
    /// Fewer standing units than this, with no producers, is dire.
    pub dire_min_units: usize,
    /// Seed for unit order and production picks.
    pub seed: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            history_window: 5,
            cheap_max_cost: 2,
            expensive_min_cost: 5,
            dire_hp_ratio: Fixed::from_num(0.3),
            dire_min_units: 2,
            seed: 0,
        }
    }
}

impl AiConfig {
    /// Builder method to set the seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// What the AI did with one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AiAction {
    /// Attacked a target.
    Attack {
        /// Target cell.
        target: Coord,
        /// HP removed across all hits.
        damage: i32,
        /// Units killed.
        kills: usize,
    },
    /// Moved toward a goal.
    Move {
        /// Destination.
        to: Coord,
    },
    /// Moved away from danger.
    Retreat {
        /// Destination.
        to: Coord,
    },
    /// Stayed on an objective.
    Hold,
    /// Had nothing useful to do.
    Idle,
    /// Advanced a construction site.
    Build {
        /// The site.
        site: Coord,
    },
    /// Bought a unit.
    Produce {
        /// Kind bought.
        kind: String,
        /// Where it was placed.
        at: Coord,
    },
}

/// One rule firing for one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiDecision {
    /// The acting unit.
    pub unit: UnitId,
    /// Where it stood when the rule fired.
    pub from: Coord,
    /// Name of the rule.
    pub rule: String,
    /// What it did.
    pub action: AiAction,
}

/// Everything the AI did in one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiTurnReport {
    /// The AI's player.
    pub player: PlayerId,
    /// Decisions in the order they were made.
    pub decisions: Vec<AiDecision>,
    /// Whether the AI judged its position dire at the start of the turn.
    pub dire: bool,
    /// Result of the closing turn advance.
    pub summary: TurnSummary,
}

impl AiTurnReport {
    /// Number of attacks made.
    #[must_use]
    pub fn attacks(&self) -> usize {
        self.decisions
            .iter()
            .filter(|d| matches!(d.action, AiAction::Attack { .. }))
            .count()
    }

    /// Kinds bought this turn.
    #[must_use]
    pub fn purchases(&self) -> Vec<&str> {
        self.decisions
            .iter()
            .filter_map(|d| match &d.action {
                AiAction::Produce { kind, .. } => Some(kind.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// Facts computed once at the start of a turn.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TurnContext {
    pub dire: bool,
}

/// A seeded heuristic controller for one player.
#[derive(Debug, Clone)]
pub struct HeuristicAi {
    player: PlayerId,
    config: AiConfig,
    history: VecDeque<String>,
    rng: ChaCha8Rng,
}

impl HeuristicAi {
    /// Create a controller for `player`.
    #[must_use]
    pub fn new(player: PlayerId, config: AiConfig) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Self {
            player,
            config,
            history: VecDeque::new(),
            rng,
        }
    }

    /// The player this controller plays.
    #[must_use]
    pub const fn player(&self) -> PlayerId {
        self.player
    }

    /// Tuning in use.
    #[must_use]
    pub const fn config(&self) -> &AiConfig {
        &self.config
    }

    /// Recent factory purchases, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &str> {
        self.history.iter().map(String::as_str)
    }

    /// Play one full turn and end it.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::NotActingPlayer`] without touching the board if
    /// it is not this controller's turn.
    pub fn take_turn(&mut self, board: &mut Board) -> Result<AiTurnReport> {
        if board.acting() != self.player {
            return Err(GameError::NotActingPlayer {
                attempted: self.player,
                acting: board.acting(),
            });
        }

        let context = TurnContext {
            dire: scoring::is_dire(board, self.player, &self.config),
        };
        let mut order = board.grid().ids_of(self.player);
        order.shuffle(&mut self.rng);

        let mut decisions = Vec::new();
        for id in order {
            let Some(from) = board.grid().position_of(id) else {
                continue;
            };
            if board.unit_at(from).map_or(true, |unit| unit.is_under_construction()) {
                continue;
            }
            for &(rule, apply) in rules::RULES {
                if let Some(action) = apply(self, board, from, context) {
                    debug!(player = ?self.player, unit = %id, rule, ?action, "ai decision");
                    decisions.push(AiDecision {
                        unit: id,
                        from,
                        rule: rule.to_string(),
                        action,
                    });
                    break;
                }
            }
        }

        let summary = board.next_turn();
        Ok(AiTurnReport {
            player: self.player,
            decisions,
            dire: context.dire,
            summary,
        })
    }

    /// Remember a factory purchase, dropping the oldest past the window.
    fn record_purchase(&mut self, kind: &str) {
        self.history.push_back(kind.to_string());
        while self.history.len() > self.config.history_window {
            self.history.pop_front();
        }
    }
}
