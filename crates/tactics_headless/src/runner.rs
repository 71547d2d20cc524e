//! Single-match runner.
//!
//! Plays one AI-vs-AI match to elimination or a turn limit and collects
//! the numbers a batch needs.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tactics_core::ai::{AiAction, AiTurnReport};
use tactics_core::data::UnitCatalog;
use tactics_core::game::Game;
use tactics_core::player::PlayerId;
use tracing::{debug, info};

use crate::error::Result;
use crate::scenario::Scenario;

/// Default whole-turn limit for a match.
pub const DEFAULT_MAX_TURNS: i32 = 100;

/// Per-player tallies over a match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideStats {
    /// Units bought.
    pub purchases: u32,
    /// Attacks made.
    pub attacks: u32,
    /// Enemy units killed by this side's attacks.
    pub kills: u32,
    /// Own units lost to status damage.
    pub lost_to_status: u32,
    /// Units standing at the end.
    pub survivors: u32,
    /// Funds at the end.
    pub funds: i32,
}

/// Outcome of one match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Seed the match was played with.
    pub seed: u64,
    /// Winner by elimination, if any.
    pub winner: Option<PlayerId>,
    /// Whole turn reached when the match stopped.
    pub turns: i32,
    /// Half-turns played by the AI.
    pub ai_turns: u32,
    /// Tallies for player zero and player one.
    pub sides: [SideStats; 2],
    /// Board hash at the end.
    pub final_state_hash: u64,
}

impl MatchResult {
    /// Whether the turn limit ended the match.
    pub fn is_draw(&self) -> bool {
        self.winner.is_none()
    }
}

/// Drives one [`Game`] turn by turn.
#[derive(Debug)]
pub struct MatchRunner {
    game: Game,
    seed: u64,
    max_turns: i32,
    ai_turns: u32,
    sides: [SideStats; 2],
}

impl MatchRunner {
    /// Set up `scenario` with both sides seeded from `seed`.
    pub fn new(
        scenario: &Scenario,
        catalog: Arc<UnitCatalog>,
        seed: u64,
        max_turns: i32,
    ) -> Result<Self> {
        let game = scenario.build_game(catalog, seed)?;
        Ok(Self::from_game(game, seed, max_turns))
    }

    /// Wrap an already prepared game.
    pub fn from_game(game: Game, seed: u64, max_turns: i32) -> Self {
        Self {
            game,
            seed,
            max_turns,
            ai_turns: 0,
            sides: Default::default(),
        }
    }

    /// The game being played.
    pub fn game(&self) -> &Game {
        &self.game
    }

    /// Whether the match has ended.
    pub fn is_finished(&self) -> bool {
        self.game.winner().is_some() || self.game.board().turn_number() > self.max_turns
    }

    /// Play one AI half-turn.
    ///
    /// Returns `None` once the match has ended or a human holds the turn.
    pub fn step(&mut self) -> Result<Option<AiTurnReport>> {
        if self.is_finished() {
            return Ok(None);
        }
        let Some(report) = self.game.step_ai()? else {
            return Ok(None);
        };
        self.ai_turns += 1;
        self.record(&report);
        debug!(
            seed = self.seed,
            turn = %self.game.board().turn(),
            player = ?report.player,
            "half-turn played"
        );
        Ok(Some(report))
    }

    fn record(&mut self, report: &AiTurnReport) {
        let side = &mut self.sides[report.player.index()];
        side.purchases += report.purchases().len() as u32;
        side.attacks += report.attacks() as u32;
        side.kills += report
            .decisions
            .iter()
            .map(|d| match d.action {
                AiAction::Attack { kills, .. } => kills as u32,
                _ => 0,
            })
            .sum::<u32>();
        // Status effects tick as the owner's turn ends.
        side.lost_to_status += report.summary.lost_to_status.len() as u32;
    }

    /// Play to the end and summarize.
    pub fn run(mut self) -> Result<MatchResult> {
        while self.step()?.is_some() {}
        Ok(self.finish())
    }

    /// Summarize the match as it stands.
    pub fn finish(mut self) -> MatchResult {
        let board = self.game.board();
        for player in PlayerId::ALL {
            let side = &mut self.sides[player.index()];
            side.survivors = board.grid().units_of(player).count() as u32;
            side.funds = board.player(player).funds;
        }
        let result = MatchResult {
            seed: self.seed,
            winner: self.game.winner(),
            turns: board.turn_number(),
            ai_turns: self.ai_turns,
            final_state_hash: board.state_hash(),
            sides: self.sides,
        };
        info!(
            seed = result.seed,
            winner = ?result.winner,
            turns = result.turns,
            hash = result.final_state_hash,
            "Match finished"
        );
        result
    }
}

/// Play one seeded match of `scenario`.
pub fn run_match(
    scenario: &Scenario,
    catalog: Arc<UnitCatalog>,
    seed: u64,
    max_turns: i32,
) -> Result<MatchResult> {
    MatchRunner::new(scenario, catalog, seed, max_turns)?.run()
}
