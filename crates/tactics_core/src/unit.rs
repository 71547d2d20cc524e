//! Units, tag sets and derived stats.
//!
//! There is one concrete [`Unit`] type. What a unit *is* (a factory, a
//! builder, a wall) is decided entirely by its tags and stat sheet, so
//! behavior elsewhere in the engine dispatches on tag membership.
//!
//! Base stats never change during play. Every stat query goes through the
//! effective-stat accessors, which add the modifiers of all active status
//! effects and floor the result at zero.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bonus::BonusTable;
use crate::math::{round_to_i32, Fixed};
use crate::player::PlayerId;
use crate::status::{AttachError, AttachOutcome, StatusEffect, StatusKind, StatusList};

/// Well-known tags the engine dispatches on.
pub mod tags {
    /// Can produce units onto adjacent cells.
    pub const FACTORY: &str = "factory";
    /// Can advance construction of adjacent sites.
    pub const BUILDER: &str = "builder";
    /// Generates income; counted by the AI as economy.
    pub const PRODUCER: &str = "producer";
    /// Other units of the same player cannot pass through.
    pub const OBSTRUCTS_MOVEMENT: &str = "obstructs movement";
    /// Living units; gates several status effects.
    pub const ALIVE: &str = "alive";
    /// Placed as a construction site that builders must finish.
    pub const PRODUCED_BY_BUILDER: &str = "produced by builder";

    /// The tag marking kinds a unit named `producer` can create.
    #[must_use]
    pub fn produced_by(producer: &str) -> String {
        format!("produced by {producer}")
    }
}

/// Unique identifier for units on a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(pub u32);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A unit's tag set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tags(BTreeSet<String>);

impl Tags {
    /// Check whether a tag is present.
    #[must_use]
    pub fn contains(&self, tag: &str) -> bool {
        self.0.contains(tag)
    }

    /// Check whether any of the given tags is present.
    #[must_use]
    pub fn contains_any<S: AsRef<str>>(&self, candidates: &[S]) -> bool {
        candidates.iter().any(|t| self.contains(t.as_ref()))
    }

    /// Add a tag.
    pub fn insert(&mut self, tag: impl Into<String>) {
        self.0.insert(tag.into());
    }

    /// Iterate tags in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.0.iter()
    }
}

impl<'a> FromIterator<&'a str> for Tags {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        Self(iter.into_iter().map(str::to_string).collect())
    }
}

impl FromIterator<String> for Tags {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Base statistics from a unit's stat sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseStats {
    /// Attack damage before bonuses.
    pub attack: i32,
    /// Maximum hit points.
    pub max_hp: i32,
    /// Flat damage reduction.
    pub armor: i32,
    /// Movement budget per turn (Manhattan steps).
    pub speed: i32,
    /// Attack reach (Manhattan distance).
    pub range: i32,
    /// Splash radius around the target (0 = single target).
    pub area: i32,
    /// Splash multiplier base, raised to the distance from the target.
    #[serde(with = "crate::math::fixed_serde")]
    pub damage_falloff: Fixed,
    /// Actions restored at each turn change.
    pub max_actions: i32,
    /// Income contributed each of its owner's turns.
    pub production: i32,
    /// Purchase price.
    pub cost: i32,
}

impl Default for BaseStats {
    fn default() -> Self {
        Self {
            attack: 5,
            max_hp: 10,
            armor: 0,
            speed: 3,
            range: 1,
            area: 0,
            damage_falloff: Fixed::ZERO,
            max_actions: 1,
            production: 0,
            cost: 2,
        }
    }
}

/// Construction state for kinds placed as build sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Construction {
    /// Build actions received so far; starts at 1.
    pub progress: i32,
    /// Progress needed to finish.
    pub cost: i32,
    /// True until progress reaches the cost.
    pub in_progress: bool,
}

/// Result of a unit's per-turn status tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusTick {
    /// HP lost to damage-over-time.
    pub damage_taken: i32,
    /// HP restored by healing effects.
    pub healed: i32,
    /// Names of effects that expired this tick.
    pub expired: Vec<String>,
}

/// A combat entity occupying one cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    id: UnitId,
    name: String,
    owner: PlayerId,
    tags: Tags,
    stats: BaseStats,
    hp: i32,
    actions: i32,
    has_moved: bool,
    bonuses: BonusTable,
    statuses: StatusList,
    on_hit: Option<StatusKind>,
    construction: Option<Construction>,
    hotkey: char,
}

impl Unit {
    /// Create a unit at full health with a full action budget.
    ///
    /// Kinds tagged `produced by builder` start as construction sites whose
    /// build cost equals their purchase cost; see [`Unit::prebuilt`].
    #[must_use]
    pub fn new(name: impl Into<String>, owner: PlayerId, stats: BaseStats, tags: Tags) -> Self {
        let construction = tags.contains(tags::PRODUCED_BY_BUILDER).then_some(Construction {
            progress: 1,
            cost: stats.cost,
            in_progress: stats.cost > 1,
        });
        Self {
            id: UnitId(0),
            name: name.into(),
            owner,
            tags,
            stats,
            hp: stats.max_hp,
            actions: stats.max_actions,
            has_moved: false,
            bonuses: BonusTable::default(),
            statuses: StatusList::default(),
            on_hit: None,
            construction,
            hotkey: '-',
        }
    }

    /// Builder method to set the bonus table.
    #[must_use]
    pub fn with_bonuses(mut self, bonuses: BonusTable) -> Self {
        self.bonuses = bonuses;
        self
    }

    /// Builder method to set the on-hit status effect.
    #[must_use]
    pub fn with_on_hit(mut self, on_hit: Option<StatusKind>) -> Self {
        self.on_hit = on_hit;
        self
    }

    /// Builder method to set the production hotkey.
    #[must_use]
    pub fn with_hotkey(mut self, hotkey: char) -> Self {
        self.hotkey = hotkey;
        self
    }

    /// Builder method to override the build cost of a construction site.
    #[must_use]
    pub fn with_build_cost(mut self, cost: i32) -> Self {
        if let Some(construction) = self.construction.as_mut() {
            construction.cost = cost;
        }
        self
    }

    /// Builder method to mark a construction site as already finished.
    #[must_use]
    pub fn prebuilt(mut self) -> Self {
        if let Some(construction) = self.construction.as_mut() {
            construction.in_progress = false;
        }
        self
    }

    pub(crate) fn set_id(&mut self, id: UnitId) {
        self.id = id;
    }

    // ------------------------------------------------------------------
    // Identity
    // ------------------------------------------------------------------

    /// Board-assigned identifier.
    #[must_use]
    pub const fn id(&self) -> UnitId {
        self.id
    }

    /// Kind name, e.g. "Archer".
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Owning player.
    #[must_use]
    pub const fn owner(&self) -> PlayerId {
        self.owner
    }

    /// Tag set.
    #[must_use]
    pub const fn tags(&self) -> &Tags {
        &self.tags
    }

    /// Shorthand for `tags().contains(tag)`.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Base stat sheet.
    #[must_use]
    pub const fn base(&self) -> &BaseStats {
        &self.stats
    }

    /// Bonus table.
    #[must_use]
    pub const fn bonuses(&self) -> &BonusTable {
        &self.bonuses
    }

    /// Status effect applied to targets on hit.
    #[must_use]
    pub const fn on_hit(&self) -> Option<StatusKind> {
        self.on_hit
    }

    /// Production hotkey.
    #[must_use]
    pub const fn hotkey(&self) -> char {
        self.hotkey
    }

    // ------------------------------------------------------------------
    // Effective stats
    // ------------------------------------------------------------------

    /// Current hit points.
    #[must_use]
    pub const fn hp(&self) -> i32 {
        self.hp
    }

    /// Maximum hit points.
    #[must_use]
    pub const fn max_hp(&self) -> i32 {
        self.stats.max_hp
    }

    /// Attack after status modifiers.
    #[must_use]
    pub fn attack(&self) -> i32 {
        (self.stats.attack + self.statuses.total().attack).max(0)
    }

    /// Armor after status modifiers.
    #[must_use]
    pub fn armor(&self) -> i32 {
        (self.stats.armor + self.statuses.total().armor).max(0)
    }

    /// Remaining actions after status modifiers.
    #[must_use]
    pub fn actions(&self) -> i32 {
        (self.actions + self.statuses.total().actions).max(0)
    }

    /// Range after status modifiers.
    #[must_use]
    pub fn range(&self) -> i32 {
        (self.stats.range + self.statuses.total().range).max(0)
    }

    /// Splash radius after status modifiers.
    #[must_use]
    pub fn area(&self) -> i32 {
        (self.stats.area + self.statuses.total().area).max(0)
    }

    /// Splash falloff base after status modifiers.
    #[must_use]
    pub fn damage_falloff(&self) -> Fixed {
        (self.stats.damage_falloff + self.statuses.total().damage_falloff).max(Fixed::ZERO)
    }

    /// Speed after status modifiers; zero once the unit has moved this turn.
    #[must_use]
    pub fn speed(&self) -> i32 {
        if self.has_moved {
            0
        } else {
            (self.stats.speed + self.statuses.total().speed).max(0)
        }
    }

    /// HP as a fraction of max HP.
    #[must_use]
    pub fn hp_fraction(&self) -> Fixed {
        Fixed::from_num(self.hp) / Fixed::from_num(self.stats.max_hp.max(1))
    }

    /// Whether the unit already moved this turn.
    #[must_use]
    pub const fn has_moved(&self) -> bool {
        self.has_moved
    }

    /// Check if the unit has an action left to attack or build with.
    #[must_use]
    pub fn can_attack(&self) -> bool {
        self.actions() > 0
    }

    /// Check if the unit may still move this turn.
    ///
    /// A unit that has spent its last action is done for the turn.
    #[must_use]
    pub fn can_move(&self) -> bool {
        !self.has_moved && self.speed() > 0 && self.actions() > 0
    }

    /// Check if `player`'s units may path through this unit's cell.
    #[must_use]
    pub fn can_pass_through(&self, player: PlayerId) -> bool {
        self.owner == player && !self.has_tag(tags::OBSTRUCTS_MOVEMENT)
    }

    /// Check whether the unit has died.
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.hp <= 0
    }

    // ------------------------------------------------------------------
    // Combat
    // ------------------------------------------------------------------

    /// Damage this unit deals to `target` before armor.
    #[must_use]
    pub fn damage_against(&self, target: &Unit) -> Fixed {
        Fixed::from_num(self.attack()) * self.bonuses.multiplier_against(&target.tags)
    }

    /// Apply incoming damage, reduced by armor but never below 1.
    ///
    /// Returns the HP actually lost.
    pub fn take_damage(&mut self, damage: Fixed) -> i32 {
        let lost = (round_to_i32(damage) - self.armor()).max(1);
        self.hp -= lost;
        lost
    }

    /// Spend one action.
    pub fn spend_action(&mut self) {
        self.actions -= 1;
    }

    /// Record that the unit moved; movement is disabled until the next reset.
    pub fn mark_moved(&mut self) {
        self.has_moved = true;
    }

    /// Restore the action budget and movement for a new turn.
    pub fn reset_for_turn(&mut self) {
        self.actions = self.stats.max_actions;
        self.has_moved = false;
    }

    // ------------------------------------------------------------------
    // Status effects
    // ------------------------------------------------------------------

    /// Active status effects.
    #[must_use]
    pub const fn statuses(&self) -> &StatusList {
        &self.statuses
    }

    /// Check for an active effect by name.
    #[must_use]
    pub fn has_status(&self, name: &str) -> bool {
        self.statuses.contains(name)
    }

    /// Try to attach an effect, honoring tag gates and stacking rules.
    pub fn attach_status(&mut self, effect: StatusEffect) -> Result<AttachOutcome, AttachError> {
        if let Err(err) = effect.check_target(&self.tags) {
            debug!(unit = %self.id, name = %self.name, "status blocked: {err}");
            return Err(err);
        }
        let name = effect.name.clone();
        let duration = effect.duration;
        let outcome = self.statuses.merge(effect);
        debug!(unit = %self.id, name = %self.name, effect = %name, duration, ?outcome, "status applied");
        Ok(outcome)
    }

    /// Active effects as `Name(duration), ...` for the stats panel.
    #[must_use]
    pub fn status_display(&self) -> String {
        self.statuses.to_string()
    }

    /// Remove every active effect with the given name.
    pub fn remove_status(&mut self, name: &str) -> usize {
        self.statuses.remove_named(name)
    }

    /// Run one owner-turn tick of every active effect.
    ///
    /// Each effect deals its self-damage (armor-reduced, at least 1) or heals
    /// up to max HP, then counts down. Expired effects are removed after all
    /// effects have ticked. The caller checks [`Unit::is_dead`] afterwards.
    pub fn tick_statuses(&mut self) -> StatusTick {
        let mut tick = StatusTick::default();
        let mut expired = Vec::new();

        for index in 0..self.statuses.len() {
            let self_damage = self.statuses.as_slice()[index].self_damage;
            if self_damage > 0 {
                let lost = (self_damage - self.armor()).max(1);
                self.hp -= lost;
                tick.damage_taken += lost;
            } else if self_damage < 0 {
                let before = self.hp;
                self.hp = (self.hp - self_damage).min(self.stats.max_hp);
                tick.healed += (self.hp - before).max(0);
            }
            if self.statuses.effects_mut()[index].decrement() {
                expired.push(index);
            }
        }

        let effects = self.statuses.effects_mut();
        for index in expired.into_iter().rev() {
            tick.expired.push(effects.remove(index).name);
        }
        tick.expired.reverse();
        tick
    }

    // ------------------------------------------------------------------
    // Construction and economy
    // ------------------------------------------------------------------

    /// Construction state, for kinds placed as build sites.
    #[must_use]
    pub const fn construction(&self) -> Option<&Construction> {
        self.construction.as_ref()
    }

    /// Check if the unit is an unfinished build site.
    #[must_use]
    pub fn is_under_construction(&self) -> bool {
        self.construction.is_some_and(|c| c.in_progress)
    }

    /// Apply one build action. Returns true when this tick finished the site.
    pub fn construct_tick(&mut self) -> bool {
        let Some(construction) = self.construction.as_mut() else {
            return false;
        };
        if !construction.in_progress {
            return false;
        }
        construction.progress += 1;
        if construction.progress >= construction.cost {
            construction.in_progress = false;
            return true;
        }
        false
    }

    /// Income this unit contributes to its owner.
    #[must_use]
    pub fn income(&self) -> i32 {
        if self.is_under_construction() {
            0
        } else {
            self.stats.production
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn soldier(stats: BaseStats) -> Unit {
        Unit::new(
            "Soldier",
            PlayerId::Zero,
            stats,
            Tags::from_iter(["alive", "infantry"]),
        )
    }

    #[test]
    fn test_take_damage_floors_at_one() {
        let mut unit = soldier(BaseStats {
            armor: 999,
            ..BaseStats::default()
        });
        assert_eq!(unit.take_damage(Fixed::from_num(5)), 1);
        assert_eq!(unit.hp(), 9);
    }

    #[test]
    fn test_take_damage_rounds_before_armor() {
        let mut unit = soldier(BaseStats {
            armor: 1,
            ..BaseStats::default()
        });
        // 3.5 rounds to 4 (ties to even), minus 1 armor.
        assert_eq!(unit.take_damage(Fixed::from_num(3.5)), 3);
        assert_eq!(unit.hp(), 7);
    }

    #[test]
    fn test_effective_stats_floor_at_zero() {
        let mut unit = soldier(BaseStats {
            attack: 1,
            ..BaseStats::default()
        });
        unit.attach_status(StatusKind::Fear.instantiate()).unwrap();
        assert_eq!(unit.attack(), 0);
        assert_eq!(unit.speed(), 2);

        unit.attach_status(StatusKind::Stun.instantiate()).unwrap();
        assert_eq!(unit.actions(), 0);
        assert_eq!(unit.speed(), 0);
        assert!(!unit.can_attack());
        assert!(!unit.can_move());
    }

    #[test]
    fn test_speed_zero_after_moving() {
        let mut unit = soldier(BaseStats::default());
        assert!(unit.can_move());
        unit.mark_moved();
        assert_eq!(unit.speed(), 0);
        assert!(!unit.can_move());
        unit.reset_for_turn();
        assert_eq!(unit.speed(), 3);
    }

    #[test]
    fn test_no_actions_means_no_movement() {
        let mut unit = soldier(BaseStats::default());
        unit.spend_action();
        assert!(!unit.can_attack());
        assert!(!unit.can_move());
    }

    #[test]
    fn test_poison_runs_its_course() {
        let mut unit = soldier(BaseStats::default());
        unit.attach_status(StatusKind::Poison.instantiate()).unwrap();

        for expected_hp in [8, 6, 4] {
            unit.tick_statuses();
            assert_eq!(unit.hp(), expected_hp);
        }
        assert!(!unit.has_status("Poison"));
        assert!(unit.statuses().is_empty());

        // Nothing left to tick.
        unit.tick_statuses();
        assert_eq!(unit.hp(), 4);
    }

    #[test]
    fn test_stacked_poison_instances_tick_independently() {
        let mut unit = soldier(BaseStats::default());
        unit.attach_status(StatusKind::Poison.instantiate()).unwrap();
        unit.tick_statuses();
        unit.attach_status(StatusKind::Poison.instantiate()).unwrap();

        let tick = unit.tick_statuses();
        assert_eq!(tick.damage_taken, 4);
        let tick = unit.tick_statuses();
        assert_eq!(tick.expired, vec!["Poison".to_string()]);
        assert_eq!(unit.statuses().len(), 1);
        assert_eq!(unit.statuses().as_slice()[0].duration, 1);
    }

    #[test]
    fn test_status_display_and_removal() {
        let mut unit = soldier(BaseStats::default());
        unit.attach_status(StatusKind::Poison.instantiate()).unwrap();
        unit.attach_status(StatusKind::Poison.instantiate()).unwrap();
        unit.attach_status(StatusKind::Fear.instantiate()).unwrap();
        assert_eq!(unit.status_display(), "Poison(3), Poison(3), Fear(2)");

        assert_eq!(unit.remove_status("Poison"), 2);
        assert!(!unit.has_status("Poison"));
        assert_eq!(unit.status_display(), "Fear(2)");
    }

    #[test]
    fn test_regeneration_clamps_at_max_hp() {
        let mut unit = soldier(BaseStats::default());
        unit.take_damage(Fixed::from_num(1));
        unit.attach_status(StatusKind::Regeneration.instantiate()).unwrap();
        let tick = unit.tick_statuses();
        assert_eq!(tick.healed, 1);
        assert_eq!(unit.hp(), 10);
    }

    #[test]
    fn test_construct_is_immune_to_poison() {
        let mut wall = Unit::new(
            "Wall",
            PlayerId::Zero,
            BaseStats::default(),
            Tags::from_iter(["alive", "construct"]),
        );
        assert!(wall.attach_status(StatusKind::Poison.instantiate()).is_err());
        assert!(wall.statuses().is_empty());
    }

    #[test]
    fn test_construction_completes_at_build_cost() {
        let mut farm = Unit::new(
            "Farm",
            PlayerId::Zero,
            BaseStats {
                cost: 3,
                production: 1,
                ..BaseStats::default()
            },
            Tags::from_iter([tags::PRODUCED_BY_BUILDER, tags::PRODUCER]),
        );
        assert!(farm.is_under_construction());
        assert_eq!(farm.income(), 0);
        assert!(!farm.construct_tick());
        assert!(farm.construct_tick());
        assert!(!farm.is_under_construction());
        assert_eq!(farm.income(), 1);
        // Further ticks are ignored.
        assert!(!farm.construct_tick());
    }

    #[test]
    fn test_one_cost_site_starts_finished() {
        let mut post = Unit::new(
            "Post",
            PlayerId::Zero,
            BaseStats {
                cost: 1,
                production: 1,
                ..BaseStats::default()
            },
            Tags::from_iter([tags::PRODUCED_BY_BUILDER, tags::PRODUCER]),
        );
        assert!(!post.is_under_construction());
        assert_eq!(post.income(), 1);
        assert!(!post.construct_tick());
    }

    #[test]
    fn test_prebuilt_site_is_finished() {
        let farm = Unit::new(
            "Farm",
            PlayerId::One,
            BaseStats::default(),
            Tags::from_iter([tags::PRODUCED_BY_BUILDER]),
        )
        .prebuilt();
        assert!(!farm.is_under_construction());
        assert_eq!(farm.construction().map(|c| c.progress), Some(1));
    }

    #[test]
    fn test_pass_through_rules() {
        let gate = soldier(BaseStats::default());
        assert!(gate.can_pass_through(PlayerId::Zero));
        assert!(!gate.can_pass_through(PlayerId::One));

        let wall = Unit::new(
            "Wall",
            PlayerId::Zero,
            BaseStats::default(),
            Tags::from_iter([tags::OBSTRUCTS_MOVEMENT]),
        );
        assert!(!wall.can_pass_through(PlayerId::Zero));
    }
}
