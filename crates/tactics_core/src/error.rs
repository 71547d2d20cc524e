//! Error types for the tactics engine.
//!
//! Expected, recoverable game outcomes (an unaffordable purchase, a blocked
//! status effect) have their own small enums next to the code that produces
//! them. [`GameError`] covers data loading and driver-level failures.

use thiserror::Error;

use crate::player::PlayerId;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for the engine.
#[derive(Debug, Error)]
pub enum GameError {
    /// Failed to parse a unit catalog.
    #[error("Failed to parse unit catalog: {0}")]
    CatalogParse(String),

    /// Two records share the same unit kind name.
    #[error("Duplicate unit kind: {0}")]
    DuplicateUnitKind(String),

    /// A unit kind was requested that the catalog does not define.
    #[error("Unknown unit kind: {0}")]
    UnknownUnitKind(String),

    /// A bonus table string could not be parsed.
    #[error("Invalid bonus table '{input}': {reason}")]
    InvalidBonus {
        /// The offending text.
        input: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A unit record failed validation.
    #[error("Invalid unit data for '{kind}': {reason}")]
    InvalidUnitData {
        /// Unit kind name.
        kind: String,
        /// Validation failure.
        reason: String,
    },

    /// An on-hit status identifier does not name a known effect.
    #[error("Unknown status effect: {0}")]
    UnknownStatus(String),

    /// A controller tried to act while another player holds the turn.
    #[error("Player {attempted:?} cannot act during {acting:?}'s turn")]
    NotActingPlayer {
        /// Player that tried to act.
        attempted: PlayerId,
        /// Player that actually holds the turn.
        acting: PlayerId,
    },

    /// AI players kept handing the turn to each other without a human.
    #[error("AI turn chain exceeded {limit} consecutive turns")]
    AiRunaway {
        /// Configured chain limit.
        limit: u32,
    },

    /// Invalid game state.
    #[error("Invalid game state: {0}")]
    InvalidState(String),
}
