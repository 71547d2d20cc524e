//! Click-driven selection state machine.
//!
//! A front end feeds cell clicks, hotkeys and menu picks into the board and
//! reads back plain data ([`Highlights`], [`UnitSummary`], production
//! entries) to draw. Actions are two-click: the first click on a legal
//! target arms it, a second click on the same cell commits. Any other click
//! is treated as a fresh choice from the selected unit, so an illegal click
//! never raises an error.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::board::Board;
use crate::combat::AttackReport;
use crate::economy::PurchaseError;
use crate::grid::Coord;
use crate::player::PlayerId;
use crate::unit::{tags, UnitId};

/// Where the player is in selecting and confirming an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClickState {
    /// Nothing actionable selected; an empty cell may be highlighted.
    Idle {
        /// Last clicked empty cell.
        selected: Option<Coord>,
    },
    /// One of the acting player's units is selected.
    ChoosingAction {
        /// The selected unit.
        from: Coord,
    },
    /// An opposing unit is selected for inspection.
    EnemySelected {
        /// The inspected unit.
        at: Coord,
    },
    /// A move is armed.
    ConfirmingMove {
        /// Mover.
        from: Coord,
        /// Destination.
        to: Coord,
    },
    /// An attack is armed.
    ConfirmingAttack {
        /// Attacker.
        from: Coord,
        /// Primary target.
        target: Coord,
    },
    /// A build action is armed.
    ConfirmingBuild {
        /// Builder.
        from: Coord,
        /// Construction site.
        site: Coord,
    },
    /// A production entry was picked; waiting for a placement cell.
    Producing {
        /// Producing unit.
        from: Coord,
        /// Kind to buy.
        kind: String,
    },
}

impl Default for ClickState {
    fn default() -> Self {
        Self::Idle { selected: None }
    }
}

impl ClickState {
    /// The highlighted cell, whatever is in it.
    #[must_use]
    pub fn selected(&self) -> Option<Coord> {
        match self {
            Self::Idle { selected } => *selected,
            Self::EnemySelected { at } => Some(*at),
            _ => self.acting_unit(),
        }
    }

    /// The acting player's selected unit, when there is one.
    #[must_use]
    pub fn acting_unit(&self) -> Option<Coord> {
        match self {
            Self::ChoosingAction { from }
            | Self::ConfirmingMove { from, .. }
            | Self::ConfirmingAttack { from, .. }
            | Self::ConfirmingBuild { from, .. }
            | Self::Producing { from, .. } => Some(*from),
            Self::Idle { .. } | Self::EnemySelected { .. } => None,
        }
    }
}

/// Result of one click.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// The selection changed.
    Selected,
    /// An action was armed and awaits confirmation.
    Armed,
    /// A move was committed.
    Moved {
        /// Origin.
        from: Coord,
        /// Destination.
        to: Coord,
    },
    /// An attack was committed.
    Attacked(AttackReport),
    /// A build action was committed.
    Built {
        /// The site.
        site: Coord,
        /// Whether the site is now finished.
        finished: bool,
    },
    /// A unit was bought and placed.
    Produced(UnitId),
    /// A purchase was attempted and refused.
    PurchaseFailed(PurchaseError),
}

/// Availability of a production entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductionStatus {
    /// Can be bought now.
    Available,
    /// No empty cell next to the producer.
    NoSpace,
    /// The producer is a builder with no actions left.
    NoAction,
    /// The acting player cannot pay.
    InsufficientFunds,
}

/// One line of a producer's menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionEntry {
    /// Kind name.
    pub kind: String,
    /// Price.
    pub cost: i32,
    /// Hotkey.
    pub hotkey: char,
    /// Availability.
    pub status: ProductionStatus,
}

impl ProductionEntry {
    /// Button text.
    #[must_use]
    pub fn label(&self) -> String {
        match self.status {
            ProductionStatus::Available => format!("{}: {}", self.cost, self.kind),
            ProductionStatus::NoSpace => format!("{} No Space", self.kind),
            ProductionStatus::NoAction => format!("{} No Action", self.kind),
            ProductionStatus::InsufficientFunds => {
                format!("{}: {} - Insufficient Funds", self.cost, self.kind)
            }
        }
    }

    /// Whether picking this entry arms production.
    #[must_use]
    pub const fn selectable(&self) -> bool {
        matches!(
            self.status,
            ProductionStatus::Available | ProductionStatus::InsufficientFunds
        )
    }
}

/// Cells to draw highlighted for the current state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Highlights {
    /// Legal move destinations.
    pub moveable: BTreeSet<Coord>,
    /// Legal attack targets.
    pub attackable: BTreeSet<Coord>,
    /// Legal build sites.
    pub buildable: BTreeSet<Coord>,
    /// Cells a picked production entry can be placed on.
    pub producible: BTreeSet<Coord>,
    /// Selected cell.
    pub selected: Option<Coord>,
    /// Armed move destination.
    pub move_target: Option<Coord>,
    /// Armed attack target.
    pub attack_target: Option<Coord>,
    /// Armed build site.
    pub build_target: Option<Coord>,
}

/// Stats panel contents for one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitSummary {
    /// Kind name.
    pub name: String,
    /// Owner.
    pub owner: PlayerId,
    /// Effective attack.
    pub attack: i32,
    /// Current HP.
    pub hp: i32,
    /// Maximum HP.
    pub max_hp: i32,
    /// Effective armor.
    pub armor: i32,
    /// Effective remaining actions.
    pub actions: i32,
    /// `(progress, cost)` while under construction.
    pub construction: Option<(i32, i32)>,
    /// Active effects as `Name(duration), ...`.
    pub statuses: String,
    /// Name of the effect this unit inflicts on hit.
    pub on_hit: Option<String>,
}

/// Top bar contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSummary {
    /// Player to act.
    pub acting: PlayerId,
    /// Its balance.
    pub funds: i32,
    /// Whole turn number.
    pub turn: i32,
}

impl Board {
    /// Handle a click on a cell.
    ///
    /// # Panics
    ///
    /// Panics if `coord` is outside the grid.
    pub fn click(&mut self, coord: Coord) -> ClickOutcome {
        let outcome = match self.selection.clone() {
            ClickState::Idle { .. } | ClickState::EnemySelected { .. } => self.select(coord),
            ClickState::ChoosingAction { from } => self.choose_action(from, coord),
            ClickState::ConfirmingMove { from, to } if to == coord => {
                self.move_unit(from, to);
                self.select(to);
                ClickOutcome::Moved { from, to }
            }
            ClickState::ConfirmingAttack { from, target } if target == coord => {
                let report = self.attack(from, target);
                self.select(from);
                ClickOutcome::Attacked(report)
            }
            ClickState::ConfirmingBuild { from, site } if site == coord => {
                self.build(from, site);
                self.select(from);
                let finished = self
                    .unit_at(site)
                    .is_some_and(|unit| !unit.is_under_construction());
                ClickOutcome::Built { site, finished }
            }
            ClickState::Producing { from, kind } => {
                if self.grid().empty_surrounding(from).any(|c| c == coord) {
                    let outcome = self.produce(from, coord, &kind);
                    self.selection = ClickState::ChoosingAction { from };
                    outcome
                } else {
                    self.choose_action(from, coord)
                }
            }
            ClickState::ConfirmingMove { from, .. }
            | ClickState::ConfirmingAttack { from, .. }
            | ClickState::ConfirmingBuild { from, .. } => self.choose_action(from, coord),
        };
        debug!(%coord, state = ?self.selection, "click handled");
        outcome
    }

    /// Select whatever is in a cell.
    fn select(&mut self, coord: Coord) -> ClickOutcome {
        self.selection = match self.unit_at(coord) {
            Some(unit) if unit.owner() == self.acting() => ClickState::ChoosingAction { from: coord },
            Some(_) => ClickState::EnemySelected { at: coord },
            None => ClickState::Idle {
                selected: Some(coord),
            },
        };
        ClickOutcome::Selected
    }

    /// Interpret a click as an action for the unit at `from`.
    fn choose_action(&mut self, from: Coord, coord: Coord) -> ClickOutcome {
        if self.moveable_tiles_from(from).contains(&coord) {
            self.selection = ClickState::ConfirmingMove { from, to: coord };
        } else if self.attackable_tiles_from(from).contains(&coord) {
            self.selection = ClickState::ConfirmingAttack {
                from,
                target: coord,
            };
        } else if self.buildable_tiles_from(from).contains(&coord) {
            self.selection = ClickState::ConfirmingBuild { from, site: coord };
        } else {
            return self.select(coord);
        }
        ClickOutcome::Armed
    }

    /// Buy `kind` at `coord` on behalf of the producer at `from`.
    ///
    /// A builder pays one action for a successful purchase.
    fn produce(&mut self, from: Coord, coord: Coord, kind: &str) -> ClickOutcome {
        match self.buy_unit(coord, kind) {
            Ok(id) => {
                if let Some(producer) = self.unit_at_mut(from) {
                    if producer.has_tag(tags::BUILDER) {
                        producer.spend_action();
                    }
                }
                ClickOutcome::Produced(id)
            }
            Err(err) => {
                debug!(%coord, kind, "purchase refused: {err}");
                ClickOutcome::PurchaseFailed(err)
            }
        }
    }

    /// The selected unit's production menu.
    ///
    /// Empty when no unit of the acting player is selected, or when it is
    /// still under construction.
    #[must_use]
    pub fn production_menu(&self) -> Vec<ProductionEntry> {
        let Some(from) = self.selection.acting_unit() else {
            return Vec::new();
        };
        let Some(producer) = self.unit_at(from) else {
            return Vec::new();
        };
        if producer.is_under_construction() {
            return Vec::new();
        }
        let has_space = self.grid().empty_surrounding(from).next().is_some();
        let out_of_actions = producer.has_tag(tags::BUILDER) && producer.actions() == 0;
        let funds = self.acting_player().funds;

        self.catalog()
            .produced_by(producer.name())
            .into_iter()
            .map(|data| {
                let status = if !has_space {
                    ProductionStatus::NoSpace
                } else if out_of_actions {
                    ProductionStatus::NoAction
                } else if funds < data.cost {
                    ProductionStatus::InsufficientFunds
                } else {
                    ProductionStatus::Available
                };
                ProductionEntry {
                    kind: data.name.clone(),
                    cost: data.cost,
                    hotkey: data.hotkey,
                    status,
                }
            })
            .collect()
    }

    /// Hotkeys for the selectable entries of the current menu.
    #[must_use]
    pub fn hotkeys(&self) -> Vec<(char, String)> {
        self.production_menu()
            .into_iter()
            .filter(ProductionEntry::selectable)
            .map(|entry| (entry.hotkey, entry.kind))
            .collect()
    }

    /// Pick a production entry by kind. Returns true if production was armed.
    pub fn select_production(&mut self, kind: &str) -> bool {
        let Some(from) = self.selection.acting_unit() else {
            return false;
        };
        let selectable = self
            .production_menu()
            .iter()
            .any(|entry| entry.kind == kind && entry.selectable());
        if selectable {
            self.selection = ClickState::Producing {
                from,
                kind: kind.to_string(),
            };
        }
        selectable
    }

    /// Pick a production entry by hotkey. Returns true if production was armed.
    pub fn press_key(&mut self, key: char) -> bool {
        let Some((_, kind)) = self.hotkeys().into_iter().find(|(hotkey, _)| *hotkey == key) else {
            return false;
        };
        self.select_production(&kind)
    }

    /// Cells to highlight.
    #[must_use]
    pub fn highlights(&self) -> Highlights {
        let mut highlights = Highlights {
            selected: self.selection.selected(),
            ..Highlights::default()
        };
        if let ClickState::Producing { from, .. } = &self.selection {
            highlights.producible = self.grid().empty_surrounding(*from).collect();
            return highlights;
        }
        if let Some(from) = self.selection.acting_unit() {
            highlights.moveable = self.moveable_tiles_from(from);
            highlights.attackable = self.attackable_tiles_from(from);
            highlights.buildable = self.buildable_tiles_from(from);
        }
        match self.selection {
            ClickState::ConfirmingMove { to, .. } => highlights.move_target = Some(to),
            ClickState::ConfirmingAttack { target, .. } => highlights.attack_target = Some(target),
            ClickState::ConfirmingBuild { site, .. } => highlights.build_target = Some(site),
            _ => {}
        }
        highlights
    }

    /// Stats panel for the unit in a cell.
    #[must_use]
    pub fn unit_summary(&self, coord: Coord) -> Option<UnitSummary> {
        let unit = self.unit_at(coord)?;
        Some(UnitSummary {
            name: unit.name().to_string(),
            owner: unit.owner(),
            attack: unit.attack(),
            hp: unit.hp(),
            max_hp: unit.max_hp(),
            armor: unit.armor(),
            actions: unit.actions(),
            construction: unit
                .construction()
                .filter(|c| c.in_progress)
                .map(|c| (c.progress, c.cost)),
            statuses: unit.status_display(),
            on_hit: unit.on_hit().map(|kind| kind.instantiate().name),
        })
    }

    /// Top bar contents.
    #[must_use]
    pub fn player_summary(&self) -> PlayerSummary {
        PlayerSummary {
            acting: self.acting(),
            funds: self.acting_player().funds,
            turn: self.turn_number(),
        }
    }

    /// The cell under a pixel for a square-tiled rendering.
    #[must_use]
    pub fn cell_at_pixel(&self, px: u32, py: u32, tile_size: u32) -> Option<Coord> {
        if tile_size == 0 {
            return None;
        }
        let coord = Coord::new(px / tile_size, py / tile_size);
        self.grid().in_bounds(coord).then_some(coord)
    }
}
