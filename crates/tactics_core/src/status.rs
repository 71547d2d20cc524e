//! Timed status effects.
//!
//! An effect modifies a unit's stats for a number of its owner's turns and
//! may deal damage (or heal) each time that owner's turn ends. Effects are
//! gated by tags: a unit carrying any immunity tag is never affected, and an
//! effect that declares required tags only lands on units with one of them.
//!
//! When an effect with the same name is already active, the new one is
//! merged according to its [`Stacking`] policy.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::GameError;
use crate::math::{fixed_serde, Fixed};
use crate::unit::Tags;

/// How a new instance merges with an active effect of the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stacking {
    /// Add an independent instance with its own duration.
    Instance,
    /// Add the new duration onto the existing instance.
    Duration,
    /// Discard the existing instance and install the new one.
    Replace,
}

/// Additive stat modifiers carried by an effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatModifiers {
    /// Attack change.
    pub attack: i32,
    /// Armor change.
    pub armor: i32,
    /// Actions-per-turn change.
    pub actions: i32,
    /// Range change.
    pub range: i32,
    /// Area change.
    pub area: i32,
    /// Damage falloff change.
    #[serde(with = "fixed_serde")]
    pub damage_falloff: Fixed,
    /// Speed change.
    pub speed: i32,
}

impl std::ops::Add for StatModifiers {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            attack: self.attack + rhs.attack,
            armor: self.armor + rhs.armor,
            actions: self.actions + rhs.actions,
            range: self.range + rhs.range,
            area: self.area + rhs.area,
            damage_falloff: self.damage_falloff + rhs.damage_falloff,
            speed: self.speed + rhs.speed,
        }
    }
}

/// The built-in status effects a unit can inflict on hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    /// Damage over time on living units.
    Poison,
    /// Lowers armor.
    ArmorBreak,
    /// Lowers speed.
    Slow,
    /// Removes actions and movement for a turn.
    Stun,
    /// More attack and actions at the cost of armor.
    BerserkerRage,
    /// Lowers speed and actions.
    Freeze,
    /// Light damage over time that weakens armor.
    Burn,
    /// Lowers attack and speed.
    Fear,
    /// Heals over time.
    Regeneration,
    /// Small attack and armor boost.
    Blessed,
}

impl StatusKind {
    /// Every built-in kind.
    pub const ALL: [StatusKind; 10] = [
        Self::Poison,
        Self::ArmorBreak,
        Self::Slow,
        Self::Stun,
        Self::BerserkerRage,
        Self::Freeze,
        Self::Burn,
        Self::Fear,
        Self::Regeneration,
        Self::Blessed,
    ];

    /// Identifier used in unit records.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Poison => "poison",
            Self::ArmorBreak => "armor_break",
            Self::Slow => "slow",
            Self::Stun => "stun",
            Self::BerserkerRage => "berserker_rage",
            Self::Freeze => "freeze",
            Self::Burn => "burn",
            Self::Fear => "fear",
            Self::Regeneration => "regeneration",
            Self::Blessed => "blessed",
        }
    }

    /// Build a fresh instance with this kind's default duration.
    #[must_use]
    pub fn instantiate(self) -> StatusEffect {
        let base = |name: &str, duration: u32, stacking: Stacking| StatusEffect {
            name: name.to_string(),
            duration,
            stacking,
            self_damage: 0,
            modifiers: StatModifiers::default(),
            required_tags: Vec::new(),
            immunity_tags: Vec::new(),
        };
        let tags = |list: &[&str]| list.iter().map(|t| (*t).to_string()).collect::<Vec<_>>();

        match self {
            Self::Poison => StatusEffect {
                self_damage: 2,
                required_tags: tags(&["alive"]),
                immunity_tags: tags(&["poison_immune", "construct", "elemental"]),
                ..base("Poison", 3, Stacking::Instance)
            },
            Self::ArmorBreak => StatusEffect {
                modifiers: StatModifiers {
                    armor: -2,
                    ..StatModifiers::default()
                },
                immunity_tags: tags(&["armor_break_immune", "no_armor", "incorporeal"]),
                ..base("Armor Break", 5, Stacking::Duration)
            },
            Self::Slow => StatusEffect {
                modifiers: StatModifiers {
                    speed: -1,
                    ..StatModifiers::default()
                },
                immunity_tags: tags(&["slow_immune", "teleporter", "immobile"]),
                ..base("Slow", 3, Stacking::Duration)
            },
            Self::Stun => StatusEffect {
                modifiers: StatModifiers {
                    actions: -10,
                    speed: -10,
                    ..StatModifiers::default()
                },
                required_tags: tags(&["alive"]),
                immunity_tags: tags(&["stun_immune", "mindless", "construct"]),
                ..base("Stun", 1, Stacking::Replace)
            },
            Self::BerserkerRage => StatusEffect {
                modifiers: StatModifiers {
                    attack: 3,
                    armor: -1,
                    actions: 1,
                    ..StatModifiers::default()
                },
                required_tags: tags(&["alive"]),
                immunity_tags: tags(&["rage_immune", "calm", "mindless"]),
                ..base("Berserker Rage", 3, Stacking::Replace)
            },
            Self::Freeze => StatusEffect {
                modifiers: StatModifiers {
                    speed: -2,
                    actions: -1,
                    ..StatModifiers::default()
                },
                immunity_tags: tags(&["fire", "freeze_immune", "hot_blooded"]),
                ..base("Freeze", 2, Stacking::Duration)
            },
            Self::Burn => StatusEffect {
                self_damage: 1,
                modifiers: StatModifiers {
                    armor: -1,
                    ..StatModifiers::default()
                },
                immunity_tags: tags(&["fire_immune", "fire", "burn_immune", "incorporeal"]),
                ..base("Burn", 3, Stacking::Instance)
            },
            Self::Fear => StatusEffect {
                modifiers: StatModifiers {
                    attack: -2,
                    speed: -1,
                    ..StatModifiers::default()
                },
                required_tags: tags(&["alive"]),
                immunity_tags: tags(&["fearless", "mindless", "construct"]),
                ..base("Fear", 2, Stacking::Replace)
            },
            Self::Regeneration => StatusEffect {
                self_damage: -2,
                required_tags: tags(&["alive"]),
                immunity_tags: tags(&["construct"]),
                ..base("Regeneration", 3, Stacking::Duration)
            },
            Self::Blessed => StatusEffect {
                modifiers: StatModifiers {
                    attack: 1,
                    armor: 1,
                    ..StatModifiers::default()
                },
                required_tags: tags(&["alive"]),
                ..base("Blessed", 4, Stacking::Duration)
            },
        }
    }
}

impl FromStr for StatusKind {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.id() == s)
            .ok_or_else(|| GameError::UnknownStatus(s.to_string()))
    }
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// An active (or about to be applied) status effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEffect {
    /// Display name; effects with equal names stack with each other.
    pub name: String,
    /// Owner turns remaining.
    pub duration: u32,
    /// Merge policy.
    pub stacking: Stacking,
    /// Damage dealt to the carrier each tick; negative heals.
    pub self_damage: i32,
    /// Stat changes while active.
    pub modifiers: StatModifiers,
    /// The carrier must have at least one of these (when non-empty).
    pub required_tags: Vec<String>,
    /// Carriers with any of these are immune.
    pub immunity_tags: Vec<String>,
}

impl StatusEffect {
    /// Check the tag gates against a prospective carrier.
    ///
    /// Immunity is checked before requirements.
    pub fn check_target(&self, target_tags: &Tags) -> Result<(), AttachError> {
        if let Some(tag) = self
            .immunity_tags
            .iter()
            .find(|tag| target_tags.contains(tag))
        {
            return Err(AttachError::Immune {
                effect: self.name.clone(),
                tag: tag.clone(),
            });
        }
        if !self.required_tags.is_empty()
            && !self.required_tags.iter().any(|tag| target_tags.contains(tag))
        {
            return Err(AttachError::MissingRequiredTag {
                effect: self.name.clone(),
                required: self.required_tags.clone(),
            });
        }
        Ok(())
    }

    /// Count down one tick. Returns true once the effect has expired.
    pub fn decrement(&mut self) -> bool {
        self.duration = self.duration.saturating_sub(1);
        self.duration == 0
    }
}

/// What happened when an effect was attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttachOutcome {
    /// No effect with this name was active; the new one was added.
    Added,
    /// Added as an independent extra instance.
    Stacked,
    /// The existing instance's duration was extended.
    Extended,
    /// The existing instance was replaced.
    Replaced,
}

/// Why an effect was not attached.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum AttachError {
    /// The target carries an immunity tag.
    #[error("immune to {effect} (has '{tag}' tag)")]
    Immune {
        /// Effect name.
        effect: String,
        /// The immunity tag found on the target.
        tag: String,
    },
    /// The target has none of the required tags.
    #[error("cannot be affected by {effect} (missing required tags: {required:?})")]
    MissingRequiredTag {
        /// Effect name.
        effect: String,
        /// Tags the effect requires.
        required: Vec<String>,
    },
}

/// Ordered list of a unit's active effects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusList {
    effects: Vec<StatusEffect>,
}

impl StatusList {
    /// Merge a new effect in, honoring its stacking policy.
    ///
    /// Tag gates are checked by the caller, which knows the carrier.
    pub fn merge(&mut self, effect: StatusEffect) -> AttachOutcome {
        let Some(index) = self.effects.iter().position(|e| e.name == effect.name) else {
            self.effects.push(effect);
            return AttachOutcome::Added;
        };
        match effect.stacking {
            Stacking::Instance => {
                self.effects.push(effect);
                AttachOutcome::Stacked
            }
            Stacking::Duration => {
                self.effects[index].duration += effect.duration;
                AttachOutcome::Extended
            }
            Stacking::Replace => {
                self.effects.remove(index);
                self.effects.push(effect);
                AttachOutcome::Replaced
            }
        }
    }

    /// Sum of all active modifiers.
    #[must_use]
    pub fn total(&self) -> StatModifiers {
        self.effects
            .iter()
            .fold(StatModifiers::default(), |acc, e| acc + e.modifiers)
    }

    /// Remove every instance with the given name. Returns how many were removed.
    pub fn remove_named(&mut self, name: &str) -> usize {
        let before = self.effects.len();
        self.effects.retain(|e| e.name != name);
        before - self.effects.len()
    }

    /// Check for an active effect by name.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.effects.iter().any(|e| e.name == name)
    }

    /// Active effects in application order.
    #[must_use]
    pub fn as_slice(&self) -> &[StatusEffect] {
        &self.effects
    }

    /// Mutable access for the per-turn tick.
    pub(crate) fn effects_mut(&mut self) -> &mut Vec<StatusEffect> {
        &mut self.effects
    }

    /// Number of active instances.
    #[must_use]
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    /// Check if no effects are active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}

impl fmt::Display for StatusList {
    /// `Name(duration), Name(duration)`, as shown in the stats panel.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, effect) in self.effects.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}({})", effect.name, effect.duration)?;
        }
        Ok(())
    }
}
