//! The immutable set of unit kinds available in a match.

use std::collections::HashMap;

use tracing::debug;

use super::unit_data::UnitData;
use crate::error::{GameError, Result};
use crate::player::PlayerId;
use crate::status::StatusKind;
use crate::unit::{tags, Tags, Unit};

#[derive(Debug, Clone)]
struct Entry {
    data: UnitData,
    on_hit: Option<StatusKind>,
}

/// Validated unit kinds, in declaration order.
///
/// Built once from records and never modified; boards share it through an
/// `Arc`.
#[derive(Debug, Clone, Default)]
pub struct UnitCatalog {
    entries: Vec<Entry>,
    by_name: HashMap<String, usize>,
}

impl UnitCatalog {
    /// Build a catalog from records, validating each one.
    ///
    /// # Errors
    ///
    /// Returns an error for duplicate kind names or invalid records.
    pub fn from_units(units: Vec<UnitData>) -> Result<Self> {
        let mut catalog = Self::default();
        for data in units {
            data.validate()?;
            if catalog.by_name.contains_key(&data.name) {
                return Err(GameError::DuplicateUnitKind(data.name));
            }
            let on_hit = data.on_hit()?;
            catalog
                .by_name
                .insert(data.name.clone(), catalog.entries.len());
            catalog.entries.push(Entry { data, on_hit });
        }
        debug!(kinds = catalog.entries.len(), "unit catalog built");
        Ok(catalog)
    }

    /// Parse a RON list of [`UnitData`] records.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::CatalogParse`] for malformed RON, or a
    /// validation error from [`UnitCatalog::from_units`].
    pub fn from_ron_str(source: &str) -> Result<Self> {
        let units: Vec<UnitData> =
            ron::from_str(source).map_err(|e| GameError::CatalogParse(e.to_string()))?;
        Self::from_units(units)
    }

    /// Look up a kind.
    #[must_use]
    pub fn get(&self, kind: &str) -> Option<&UnitData> {
        self.by_name.get(kind).map(|&i| &self.entries[i].data)
    }

    /// Check if a kind is defined.
    #[must_use]
    pub fn contains(&self, kind: &str) -> bool {
        self.by_name.contains_key(kind)
    }

    /// Purchase price of a kind.
    #[must_use]
    pub fn cost_of(&self, kind: &str) -> Option<i32> {
        self.get(kind).map(|data| data.cost)
    }

    /// Production hotkey of a kind.
    #[must_use]
    pub fn hotkey_of(&self, kind: &str) -> Option<char> {
        self.get(kind).map(|data| data.hotkey)
    }

    /// Names of every kind carrying `tag`, in declaration order.
    #[must_use]
    pub fn units_with_tag(&self, tag: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|entry| entry.data.has_tag(tag))
            .map(|entry| entry.data.name.as_str())
            .collect()
    }

    /// Kinds a unit named `producer` can create, in declaration order.
    #[must_use]
    pub fn produced_by(&self, producer: &str) -> Vec<&UnitData> {
        let tag = tags::produced_by(producer);
        self.entries
            .iter()
            .filter(|entry| entry.data.has_tag(&tag))
            .map(|entry| &entry.data)
            .collect()
    }

    /// Create a unit of `kind` for `owner`.
    ///
    /// Kinds tagged `produced by builder` come out as construction sites
    /// unless `prebuilt` is set. The board assigns the id on placement.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnknownUnitKind`] if the kind is not defined.
    pub fn instantiate(&self, kind: &str, owner: PlayerId, prebuilt: bool) -> Result<Unit> {
        let entry = self
            .by_name
            .get(kind)
            .map(|&i| &self.entries[i])
            .ok_or_else(|| GameError::UnknownUnitKind(kind.to_string()))?;
        let data = &entry.data;

        let mut unit = Unit::new(
            data.name.clone(),
            owner,
            data.base_stats(),
            data.tags.iter().cloned().collect::<Tags>(),
        )
        .with_bonuses(data.bonuses.clone())
        .with_on_hit(entry.on_hit)
        .with_hotkey(data.hotkey);
        if let Some(build_cost) = data.build_cost {
            unit = unit.with_build_cost(build_cost);
        }
        if prebuilt {
            unit = unit.prebuilt();
        }
        Ok(unit)
    }

    /// All kinds in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &UnitData> {
        self.entries.iter().map(|entry| &entry.data)
    }

    /// Number of kinds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the catalog defines no kinds.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
