//! Tag-keyed damage multipliers.
//!
//! A unit's bonus table is a list of rules. A rule applies to a target that
//! carries one of its tags, unless that same tag is also listed as an
//! exception. Among applicable rules the highest multiplier wins; a target
//! no rule applies to is hit at 1×.
//!
//! Tables keep the compact text form used by unit records:
//!
//! ```text
//! infantry|cavalry!armored:1.5,building:2
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GameError;
use crate::math::{fixed_serde, Fixed};
use crate::unit::Tags;

/// One multiplier rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BonusRule {
    /// Target tags that trigger the rule.
    pub tags: Vec<String>,
    /// Tags that are excluded even when listed in `tags`.
    pub exceptions: Vec<String>,
    /// Damage multiplier.
    #[serde(with = "fixed_serde")]
    pub multiplier: Fixed,
}

impl BonusRule {
    /// Create a rule with no exceptions.
    #[must_use]
    pub fn new(tags: &[&str], multiplier: Fixed) -> Self {
        Self {
            tags: tags.iter().map(|t| (*t).to_string()).collect(),
            exceptions: Vec::new(),
            multiplier,
        }
    }

    /// Builder method to add exception tags.
    #[must_use]
    pub fn with_exceptions(mut self, exceptions: &[&str]) -> Self {
        self.exceptions = exceptions.iter().map(|t| (*t).to_string()).collect();
        self
    }

    /// The multiplier if this rule applies to a target with `target_tags`.
    #[must_use]
    pub fn multiplier_against(&self, target_tags: &Tags) -> Option<Fixed> {
        target_tags
            .iter()
            .any(|tag| self.tags.contains(tag) && !self.exceptions.contains(tag))
            .then_some(self.multiplier)
    }
}

/// A unit's full set of bonus rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BonusTable {
    rules: Vec<BonusRule>,
}

impl BonusTable {
    /// Create a table from rules.
    #[must_use]
    pub fn new(rules: Vec<BonusRule>) -> Self {
        Self { rules }
    }

    /// All rules in declaration order.
    #[must_use]
    pub fn rules(&self) -> &[BonusRule] {
        &self.rules
    }

    /// Highest applicable multiplier against a target, never below one.
    #[must_use]
    pub fn multiplier_against(&self, target_tags: &Tags) -> Fixed {
        self.rules
            .iter()
            .filter_map(|rule| rule.multiplier_against(target_tags))
            .fold(Fixed::ONE, Fixed::max)
    }
}

fn split_list(text: &str) -> Vec<String> {
    text.split('|')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

impl FromStr for BonusTable {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| GameError::InvalidBonus {
            input: s.to_string(),
            reason: reason.to_string(),
        };

        let mut rules = Vec::new();
        for entry in s.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (selector, multiplier) = entry
                .rsplit_once(':')
                .ok_or_else(|| invalid("missing ':multiplier'"))?;
            let multiplier = Fixed::from_str(multiplier.trim())
                .map_err(|_| invalid("multiplier is not a decimal number"))?;
            let (tags, exceptions) = match selector.split_once('!') {
                Some((tags, exceptions)) => (split_list(tags), split_list(exceptions)),
                None => (split_list(selector), Vec::new()),
            };
            if tags.is_empty() {
                return Err(invalid("rule names no tags"));
            }
            rules.push(BonusRule {
                tags,
                exceptions,
                multiplier,
            });
        }
        Ok(Self { rules })
    }
}

impl fmt::Display for BonusTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, rule) in self.rules.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            f.write_str(&rule.tags.join("|"))?;
            if !rule.exceptions.is_empty() {
                write!(f, "!{}", rule.exceptions.join("|"))?;
            }
            write!(f, ":{}", rule.multiplier)?;
        }
        Ok(())
    }
}

impl TryFrom<String> for BonusTable {
    type Error = GameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BonusTable> for String {
    fn from(table: BonusTable) -> Self {
        table.to_string()
    }
}
