//! Unit data structures for data-driven unit definitions.

use serde::{Deserialize, Serialize};

use crate::bonus::BonusTable;
use crate::error::{GameError, Result};
use crate::math::{decimal_serde, Fixed};
use crate::status::StatusKind;
use crate::unit::{tags, BaseStats};

/// Data-driven unit kind definition.
///
/// # Example RON
///
/// ```ron
/// UnitData(
///     name: "Catapult",
///     attack: 6,
///     max_hp: 8,
///     speed: 2,
///     range: 4,
///     cost: 5,
///     area: 1,
///     damage_falloff: 0.5,
///     bonuses: "building:2",
///     tags: ["alive", "siege", "produced by Castle"],
///     image: "catapult.png",
///     hotkey: 'c',
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitData {
    /// Kind name; unique within a catalog.
    pub name: String,

    /// Base attack damage.
    pub attack: i32,

    /// Maximum hit points.
    pub max_hp: i32,

    /// Flat damage reduction.
    #[serde(default)]
    pub armor: i32,

    /// Movement budget per turn.
    pub speed: i32,

    /// Attack reach.
    pub range: i32,

    /// Purchase price.
    pub cost: i32,

    /// Splash radius around the target.
    #[serde(default)]
    pub area: i32,

    /// Splash multiplier base, written as a decimal.
    #[serde(default, with = "decimal_serde")]
    pub damage_falloff: Fixed,

    /// Bonus table in its compact text form.
    #[serde(default)]
    pub bonuses: BonusTable,

    /// Tags driving behavior and bonuses.
    #[serde(default)]
    pub tags: Vec<String>,

    /// Image reference for renderers.
    #[serde(default)]
    pub image: String,

    /// Actions per turn.
    #[serde(default = "default_actions")]
    pub actions: i32,

    /// Income per owner turn.
    #[serde(default)]
    pub production: i32,

    /// Production menu hotkey.
    #[serde(default = "default_hotkey")]
    pub hotkey: char,

    /// Status effect identifier applied on hit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_on_hit: Option<String>,

    /// Build progress needed when placed as a construction site.
    /// Defaults to `cost`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_cost: Option<i32>,
}

/// Default actions per turn.
const fn default_actions() -> i32 {
    1
}

/// Placeholder hotkey for kinds without one.
const fn default_hotkey() -> char {
    '-'
}

impl UnitData {
    /// Check if this kind has the specified tag.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Check if a unit named `producer` can create this kind.
    #[must_use]
    pub fn is_produced_by(&self, producer: &str) -> bool {
        self.has_tag(&tags::produced_by(producer))
    }

    /// Base stat sheet for instances of this kind.
    #[must_use]
    pub fn base_stats(&self) -> BaseStats {
        BaseStats {
            attack: self.attack,
            max_hp: self.max_hp,
            armor: self.armor,
            speed: self.speed,
            range: self.range,
            area: self.area,
            damage_falloff: self.damage_falloff,
            max_actions: self.actions,
            production: self.production,
            cost: self.cost,
        }
    }

    /// Resolve the on-hit identifier.
    pub fn on_hit(&self) -> Result<Option<StatusKind>> {
        self.status_on_hit
            .as_deref()
            .map(str::parse::<StatusKind>)
            .transpose()
    }

    /// Validate the record.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| GameError::InvalidUnitData {
            kind: self.name.clone(),
            reason,
        };

        if self.name.trim().is_empty() {
            return Err(invalid("name is empty".to_string()));
        }
        if self.max_hp <= 0 {
            return Err(invalid(format!("max_hp must be positive, got {}", self.max_hp)));
        }
        let non_negative = [
            ("attack", self.attack),
            ("armor", self.armor),
            ("speed", self.speed),
            ("range", self.range),
            ("cost", self.cost),
            ("area", self.area),
            ("actions", self.actions),
            ("production", self.production),
            ("build_cost", self.build_cost.unwrap_or(0)),
        ];
        if let Some((field, value)) = non_negative.iter().find(|(_, value)| *value < 0) {
            return Err(invalid(format!("{field} must not be negative, got {value}")));
        }
        if self.damage_falloff < Fixed::ZERO {
            return Err(invalid("damage_falloff must not be negative".to_string()));
        }
        self.on_hit().map_err(|err| invalid(err.to_string()))?;
        Ok(())
    }
}
