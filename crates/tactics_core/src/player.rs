//! Players and their treasuries.

use serde::{Deserialize, Serialize};

/// One of the two sides in a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PlayerId {
    /// The first player; acts on turn 1.
    Zero,
    /// The second player.
    One,
}

impl PlayerId {
    /// Both players, in turn order.
    pub const ALL: [PlayerId; 2] = [PlayerId::Zero, PlayerId::One];

    /// The opposing player.
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Zero => Self::One,
            Self::One => Self::Zero,
        }
    }

    /// Index into per-player arrays.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Zero => 0,
            Self::One => 1,
        }
    }

    /// Team number shown to humans.
    #[must_use]
    pub const fn team(self) -> u8 {
        match self {
            Self::Zero => 0,
            Self::One => 1,
        }
    }
}

/// Per-player state: funds and who is at the controls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Which side this is.
    pub id: PlayerId,
    /// Current balance.
    pub funds: i32,
    /// Whether a computer controller plays this side.
    pub ai_controlled: bool,
}

impl Player {
    /// Create a human-controlled player with a starting balance.
    #[must_use]
    pub const fn new(id: PlayerId, funds: i32) -> Self {
        Self {
            id,
            funds,
            ai_controlled: false,
        }
    }

    /// Check if the player can afford a cost.
    #[must_use]
    pub const fn can_afford(&self, cost: i32) -> bool {
        self.funds >= cost
    }

    /// Spend funds if available.
    ///
    /// Returns true if the transaction succeeded.
    pub fn spend(&mut self, amount: i32) -> bool {
        if self.can_afford(amount) {
            self.funds -= amount;
            true
        } else {
            false
        }
    }

    /// Add income to the balance.
    pub fn earn(&mut self, amount: i32) {
        self.funds += amount;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_other_player() {
        assert_eq!(PlayerId::Zero.other(), PlayerId::One);
        assert_eq!(PlayerId::One.other(), PlayerId::Zero);
    }

    #[test]
    fn test_spend_rejects_overdraft() {
        let mut player = Player::new(PlayerId::Zero, 5);
        assert!(!player.spend(6));
        assert_eq!(player.funds, 5);
        assert!(player.spend(5));
        assert_eq!(player.funds, 0);
    }
}
