//! Match driver that hands turns to computer players.
//!
//! A [`Game`] owns the [`Board`] and an optional [`HeuristicAi`] per side.
//! When a human ends their turn with [`Game::advance_turn`], every following
//! AI turn is played in a loop until a human holds the turn again. Two AI
//! players would never hand control back, so the chain is capped by
//! [`GameConfig::max_chained_ai_turns`].

use std::sync::Arc;

use tracing::{info, warn};

use crate::ai::{AiConfig, AiTurnReport, HeuristicAi};
use crate::board::{Board, TurnSummary};
use crate::config::GameConfig;
use crate::data::UnitCatalog;
use crate::error::{GameError, Result};
use crate::player::PlayerId;

/// A board plus the controllers playing it.
#[derive(Debug, Clone)]
pub struct Game {
    board: Board,
    controllers: [Option<HeuristicAi>; 2],
    max_chained_ai_turns: u32,
}

impl Game {
    /// Create a game with two human players.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: &GameConfig, catalog: Arc<UnitCatalog>) -> Result<Self> {
        let board = Board::new(config, catalog)?;
        Ok(Self::from_board(board, config.max_chained_ai_turns))
    }

    /// Wrap an already populated board.
    #[must_use]
    pub fn from_board(board: Board, max_chained_ai_turns: u32) -> Self {
        Self {
            board,
            controllers: [None, None],
            max_chained_ai_turns,
        }
    }

    /// Builder method to hand `player` to a heuristic AI.
    #[must_use]
    pub fn with_ai(mut self, player: PlayerId, config: AiConfig) -> Self {
        self.set_controller(player, Some(HeuristicAi::new(player, config)));
        self
    }

    /// Install or remove the controller for `player`.
    pub fn set_controller(&mut self, player: PlayerId, controller: Option<HeuristicAi>) {
        self.board.player_mut(player).ai_controlled = controller.is_some();
        self.controllers[player.index()] = controller;
    }

    /// The board.
    #[must_use]
    pub const fn board(&self) -> &Board {
        &self.board
    }

    /// Mutable access to the board, for human input.
    pub fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    /// The AI playing `player`, if any.
    #[must_use]
    pub fn controller(&self, player: PlayerId) -> Option<&HeuristicAi> {
        self.controllers[player.index()].as_ref()
    }

    /// Check if `player` is computer controlled.
    #[must_use]
    pub fn is_ai(&self, player: PlayerId) -> bool {
        self.controllers[player.index()].is_some()
    }

    /// The player who has lost every unit, if exactly one has.
    #[must_use]
    pub fn loser(&self) -> Option<PlayerId> {
        let empty: Vec<PlayerId> = PlayerId::ALL
            .into_iter()
            .filter(|&player| self.board.grid().units_of(player).next().is_none())
            .collect();
        match empty.as_slice() {
            [player] => Some(*player),
            _ => None,
        }
    }

    /// The remaining player once the other has been wiped out.
    #[must_use]
    pub fn winner(&self) -> Option<PlayerId> {
        self.loser().map(PlayerId::other)
    }

    /// End the current (human) turn, then play AI turns until a human is
    /// to act.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::AiRunaway`] when more than the configured number
    /// of AI turns follow each other. The board is left between turns.
    pub fn advance_turn(&mut self) -> Result<(TurnSummary, Vec<AiTurnReport>)> {
        let summary = self.board.next_turn();
        let reports = self.run_ai_turns()?;
        Ok((summary, reports))
    }

    /// Play AI turns while the acting player is computer controlled.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::AiRunaway`] once the chain limit is reached.
    pub fn run_ai_turns(&mut self) -> Result<Vec<AiTurnReport>> {
        let mut reports = Vec::new();
        while self.is_ai(self.board.acting()) {
            if reports.len() >= self.max_chained_ai_turns as usize {
                warn!(limit = self.max_chained_ai_turns, "ai turn chain aborted");
                return Err(GameError::AiRunaway {
                    limit: self.max_chained_ai_turns,
                });
            }
            if let Some(report) = self.step_ai()? {
                reports.push(report);
            }
        }
        Ok(reports)
    }

    /// Play exactly one turn for the acting player if it is an AI.
    ///
    /// Returns `None` when a human holds the turn.
    ///
    /// # Errors
    ///
    /// Propagates errors from the controller.
    pub fn step_ai(&mut self) -> Result<Option<AiTurnReport>> {
        let acting = self.board.acting();
        let Some(ai) = self.controllers[acting.index()].as_mut() else {
            return Ok(None);
        };
        let report = ai.take_turn(&mut self.board)?;
        info!(
            player = ?acting,
            decisions = report.decisions.len(),
            attacks = report.attacks(),
            dire = report.dire,
            "ai turn finished"
        );
        Ok(Some(report))
    }
}
