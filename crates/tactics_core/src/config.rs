//! Match configuration.

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::grid::Coord;

/// Board and rules configuration for one match.
///
/// # Example RON
///
/// ```ron
/// GameConfig(
///     width: 10,
///     height: 20,
///     starting_funds: 5,
///     objectives: [(x: 4, y: 9), (x: 5, y: 10)],
///     max_chained_ai_turns: 8,
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Board width in cells.
    pub width: u32,
    /// Board height in cells.
    pub height: u32,
    /// Funds each player starts with.
    pub starting_funds: i32,
    /// Objective cells the AI fights over.
    pub objectives: Vec<Coord>,
    /// How many AI turns may follow each other before the driver gives up.
    pub max_chained_ai_turns: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            width: 10,
            height: 20,
            starting_funds: 5,
            objectives: Vec::new(),
            max_chained_ai_turns: 8,
        }
    }
}

impl GameConfig {
    /// Builder method to set the board size.
    #[must_use]
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Builder method to set the objective cells.
    #[must_use]
    pub fn with_objectives(mut self, objectives: impl IntoIterator<Item = Coord>) -> Self {
        self.objectives = objectives.into_iter().collect();
        self
    }

    /// Builder method to set both players' starting funds.
    #[must_use]
    pub const fn with_starting_funds(mut self, funds: i32) -> Self {
        self.starting_funds = funds;
        self
    }

    /// Parse a RON configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is malformed or fails validation.
    pub fn from_ron_str(source: &str) -> Result<Self> {
        let config: Self = ron::from_str(source)
            .map_err(|e| GameError::InvalidState(format!("bad game config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Check dimensions, funds and objective bounds.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidState`] describing the first problem.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(GameError::InvalidState(format!(
                "board must be at least 1x1, got {}x{}",
                self.width, self.height
            )));
        }
        if self.starting_funds < 0 {
            return Err(GameError::InvalidState(
                "starting funds must not be negative".to_string(),
            ));
        }
        if let Some(outside) = self
            .objectives
            .iter()
            .find(|c| c.x >= self.width || c.y >= self.height)
        {
            return Err(GameError::InvalidState(format!(
                "objective {outside} is outside the board"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GameConfig::default();
        assert_eq!((config.width, config.height), (10, 20));
        assert_eq!(config.starting_funds, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_ron_uses_defaults() {
        let config = GameConfig::from_ron_str("(objectives: [(x: 4, y: 9)])").unwrap();
        assert_eq!(config.width, 10);
        assert_eq!(config.objectives, vec![Coord::new(4, 9)]);
    }

    #[test]
    fn test_objective_out_of_bounds_rejected() {
        let config = GameConfig::default().with_objectives([Coord::new(10, 0)]);
        assert!(config.validate().is_err());
    }
}
