//! Determinism testing utilities.
//!
//! Provides a harness for verifying that matches produce identical results
//! given identical inputs.
//!
//! # Testing Strategy
//!
//! The same board, catalog and AI seeds must always play the same game.
//! Sources of non-determinism include:
//!
//! - **Floating-point math**: multipliers, falloff and the turn counter use
//!   [`tactics_core::math::Fixed`].
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   Units are always visited in id or coordinate order.
//!
//! - **System randomness**: the AI only draws from its seeded `ChaCha8Rng`.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: individual rules (movement, combat, statuses)
//! 2. **Property tests**: random inputs must still produce deterministic outputs
//! 3. **Integration tests**: full AI-vs-AI matches are reproducible
//! 4. **Parallel tests**: running N matches on separate threads all match

use std::thread;

use tactics_core::game::Game;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of steps taken per run.
    pub steps: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic match).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the runs were deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Match is non-deterministic!\n\
                 Runs: {}\n\
                 Steps: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.steps,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a state machine multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run
/// * `steps` - Number of steps per run
/// * `setup` - Function to create the initial state
/// * `step` - Function to advance the state by one step
/// * `hash` - Function to compute the state hash
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    steps: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..steps {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        steps,
    }
}

/// Play one AI turn; human turns are skipped.
///
/// # Panics
///
/// Panics if the controller reports an error, since a failed turn would
/// otherwise pass for a deterministic no-op.
fn play_turn(game: &mut Game) {
    if let Err(e) = game.step_ai() {
        panic!("AI turn failed: {e}");
    }
}

/// Play the same AI-vs-AI match twice and compare the final board hashes.
///
/// # Example
///
/// ```
/// use tactics_test_utils::determinism::verify_match_determinism;
/// use tactics_test_utils::fixtures::skirmish;
///
/// assert!(verify_match_determinism(|| skirmish(7), 20));
/// ```
pub fn verify_match_determinism<F>(setup_fn: F, turns: u64) -> bool
where
    F: Fn() -> Game,
{
    verify_determinism(2, turns, &setup_fn, play_turn, |game| {
        game.board().state_hash()
    })
    .is_deterministic
}

/// Result of parallel match runs.
#[derive(Debug, Clone)]
pub struct ParallelMatchResult {
    /// Final board hash from each match.
    pub hashes: Vec<u64>,
    /// Number of turns each match ran.
    pub turns: u64,
}

impl ParallelMatchResult {
    /// Check if all matches produced identical results.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.hashes.windows(2).all(|w| w[0] == w[1])
    }

    /// Assert all matches agreed.
    ///
    /// # Panics
    ///
    /// Panics if matches produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic() {
            panic!(
                "Parallel matches diverged!\n\
                 Matches: {}\n\
                 Turns: {}\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.turns,
                self.hashes
            );
        }
    }
}

/// Run N copies of a match on scoped threads and collect final hashes.
///
/// # Panics
///
/// Panics if a worker thread panics.
pub fn run_parallel_matches<F>(setup_fn: F, num_matches: usize, turns: u64) -> ParallelMatchResult
where
    F: Fn() -> Game + Sync,
{
    let hashes = thread::scope(|s| {
        let handles: Vec<_> = (0..num_matches)
            .map(|_| {
                s.spawn(|| {
                    let mut game = setup_fn();
                    for _ in 0..turns {
                        play_turn(&mut game);
                    }
                    game.board().state_hash()
                })
            })
            .collect();

        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    ParallelMatchResult { hashes, turns }
}

/// Compare two runs turn by turn, finding the first divergence.
///
/// Returns `None` if the runs agree, `Some(turn)` if they diverge there.
pub fn find_first_divergence<F>(setup_fn: F, turns: u64) -> Option<u64>
where
    F: Fn() -> Game,
{
    let mut first = setup_fn();
    let mut second = setup_fn();

    if first.board().state_hash() != second.board().state_hash() {
        return Some(0);
    }

    for turn in 1..=turns {
        play_turn(&mut first);
        play_turn(&mut second);

        if first.board().state_hash() != second.board().state_hash() {
            return Some(turn);
        }
    }

    None
}

/// Proptest strategies for board and combat inputs.
pub mod strategies {
    use proptest::prelude::*;
    use tactics_core::grid::Coord;
    use tactics_core::math::Fixed;
    use tactics_core::player::PlayerId;
    use tactics_core::status::StatusKind;

    use crate::fixtures::MOBILE_KINDS;

    /// A coordinate on a `width`×`height` board.
    pub fn arb_coord(width: u32, height: u32) -> impl Strategy<Value = Coord> {
        (0..width, 0..height).prop_map(|(x, y)| Coord::new(x, y))
    }

    /// Either player.
    pub fn arb_player() -> impl Strategy<Value = PlayerId> {
        prop_oneof![Just(PlayerId::Zero), Just(PlayerId::One)]
    }

    /// Attack values (0-50).
    pub fn arb_attack() -> impl Strategy<Value = i32> {
        0i32..50
    }

    /// Armor values, including absurd ones (0-1000).
    pub fn arb_armor() -> impl Strategy<Value = i32> {
        0i32..1000
    }

    /// Health values (1-100).
    pub fn arb_health() -> impl Strategy<Value = i32> {
        1i32..100
    }

    /// Splash falloff in eighths between 0 and 1.
    pub fn arb_falloff() -> impl Strategy<Value = Fixed> {
        (0i32..=8).prop_map(|eighths| Fixed::from_num(eighths) / Fixed::from_num(8))
    }

    /// Any built-in status effect.
    pub fn arb_status() -> impl Strategy<Value = StatusKind> {
        proptest::sample::select(StatusKind::ALL.to_vec())
    }

    /// Any mobile kind from the standard catalog.
    pub fn arb_mobile_kind() -> impl Strategy<Value = &'static str> {
        proptest::sample::select(MOBILE_KINDS.to_vec())
    }

    /// Distinct placements of mobile units on a `width`×`height` board.
    pub fn arb_placements(
        width: u32,
        height: u32,
        max_units: usize,
    ) -> impl Strategy<Value = Vec<(Coord, &'static str, PlayerId)>> {
        proptest::collection::btree_map(
            arb_coord(width, height),
            (arb_mobile_kind(), arb_player()),
            0..max_units,
        )
        .prop_map(|cells| {
            cells
                .into_iter()
                .map(|(coord, (kind, owner))| (coord, kind, owner))
                .collect()
        })
    }
}
