//! Batch match runner.
//!
//! Runs many seeded matches in parallel using rayon and summarizes who
//! won. Each worker owns its own board; only the catalog is shared.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tactics_core::data::UnitCatalog;
use tactics_core::player::PlayerId;
use tracing::{info, warn};

use crate::error::Result;
use crate::runner::{run_match, MatchResult, DEFAULT_MAX_TURNS};
use crate::scenario::Scenario;

/// Configuration for a batch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Number of matches to play.
    pub game_count: u32,
    /// Seed of the first match; match `i` uses `seed_start + i`.
    pub seed_start: u64,
    /// Whole-turn limit per match.
    pub max_turns: i32,
    /// Worker threads (0 = rayon default).
    pub parallel_games: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            game_count: 100,
            seed_start: 0,
            max_turns: DEFAULT_MAX_TURNS,
            parallel_games: 0,
        }
    }
}

impl BatchConfig {
    /// Config for `game_count` matches.
    pub fn new(game_count: u32) -> Self {
        Self {
            game_count,
            ..Default::default()
        }
    }

    /// Set seed start.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed_start = seed;
        self
    }

    /// Set the turn limit.
    pub fn with_max_turns(mut self, max_turns: i32) -> Self {
        self.max_turns = max_turns;
        self
    }
}

/// A match that failed to complete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchError {
    /// Seed of the failed match.
    pub seed: u64,
    /// Error text.
    pub message: String,
}

/// Aggregate numbers over all completed matches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Completed matches.
    pub total_games: u32,
    /// Wins per player.
    pub wins: BTreeMap<String, u32>,
    /// Matches that hit the turn limit.
    pub draws: u32,
    /// Share of completed matches each player won.
    pub win_rates: BTreeMap<String, f64>,
    /// Mean whole turns per match.
    pub average_turns: f64,
    /// Mean units bought per match, both sides together.
    pub average_purchases: f64,
}

impl BatchSummary {
    /// Summarize a set of match results.
    pub fn from_matches(matches: &[MatchResult]) -> Self {
        let total = matches.len() as u32;
        let mut wins: BTreeMap<String, u32> = PlayerId::ALL
            .iter()
            .map(|player| (format!("{player:?}"), 0))
            .collect();
        let mut draws = 0;
        for result in matches {
            match result.winner {
                Some(player) => *wins.entry(format!("{player:?}")).or_insert(0) += 1,
                None => draws += 1,
            }
        }

        let denominator = f64::from(total.max(1));
        let win_rates = wins
            .iter()
            .map(|(player, count)| (player.clone(), f64::from(*count) / denominator))
            .collect();
        let average_turns =
            matches.iter().map(|m| f64::from(m.turns)).sum::<f64>() / denominator;
        let average_purchases = matches
            .iter()
            .flat_map(|m| m.sides.iter())
            .map(|side| f64::from(side.purchases))
            .sum::<f64>()
            / denominator;

        Self {
            total_games: total,
            wins,
            draws,
            win_rates,
            average_turns,
            average_purchases,
        }
    }
}

/// Results from a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Scenario name.
    pub scenario: String,
    /// Configuration used.
    pub config: BatchConfig,
    /// Individual match results, in seed order.
    pub matches: Vec<MatchResult>,
    /// Aggregate summary.
    pub summary: BatchSummary,
    /// Total runtime.
    pub duration_seconds: f64,
    /// Matches that failed.
    pub errors: Vec<BatchError>,
}

impl BatchResults {
    /// Save results to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load results from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Pretty JSON for stdout.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn play_all(
    scenario: &Scenario,
    catalog: &Arc<UnitCatalog>,
    config: &BatchConfig,
) -> Vec<std::result::Result<MatchResult, BatchError>> {
    let completed = AtomicU32::new(0);
    let step = (config.game_count / 10).max(1);

    (0..config.game_count)
        .into_par_iter()
        .map(|index| {
            let seed = config.seed_start.wrapping_add(u64::from(index));
            let outcome = run_match(scenario, Arc::clone(catalog), seed, config.max_turns)
                .map_err(|e| BatchError {
                    seed,
                    message: e.to_string(),
                });
            let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
            if done % step == 0 {
                info!(done, total = config.game_count, "Batch progress");
            }
            outcome
        })
        .collect()
}

/// Run a batch of matches.
pub fn run_batch(
    scenario: &Scenario,
    catalog: Arc<UnitCatalog>,
    config: BatchConfig,
) -> BatchResults {
    let start = Instant::now();
    info!(
        scenario = %scenario.name,
        games = config.game_count,
        seed = config.seed_start,
        "Starting batch run"
    );

    let outcomes = if config.parallel_games > 0 {
        match rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallel_games)
            .build()
        {
            Ok(pool) => pool.install(|| play_all(scenario, &catalog, &config)),
            Err(e) => {
                warn!(error = %e, "Could not build thread pool, using the global one");
                play_all(scenario, &catalog, &config)
            }
        }
    } else {
        play_all(scenario, &catalog, &config)
    };

    let mut matches = Vec::new();
    let mut errors = Vec::new();
    for outcome in outcomes {
        match outcome {
            Ok(result) => matches.push(result),
            Err(error) => {
                warn!(seed = error.seed, error = %error.message, "Match failed");
                errors.push(error);
            }
        }
    }

    let summary = BatchSummary::from_matches(&matches);
    let duration_seconds = start.elapsed().as_secs_f64();
    info!(
        completed = matches.len(),
        failed = errors.len(),
        draws = summary.draws,
        "Batch complete in {:.1}s",
        duration_seconds
    );

    BatchResults {
        scenario: scenario.name.clone(),
        config,
        matches,
        summary,
        duration_seconds,
        errors,
    }
}
