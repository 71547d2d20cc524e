//! Unit catalog loading for headless runs.
//!
//! The engine only parses strings; this module owns the file IO and falls
//! back to the bundled catalog when no path is given.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use tactics_core::data::UnitCatalog;

use crate::error::{Result, RunnerError};

/// The catalog shipped with the runner.
pub const BUNDLED_UNITS: &str = include_str!("../assets/data/units.ron");

/// Load a catalog from a RON file, or the bundled one when `path` is `None`.
pub fn load_catalog(path: Option<&Path>) -> Result<Arc<UnitCatalog>> {
    let source = match path {
        Some(path) => {
            if !path.exists() {
                return Err(RunnerError::FileNotFound(path.to_path_buf()));
            }
            fs::read_to_string(path)?
        }
        None => BUNDLED_UNITS.to_string(),
    };
    let catalog = UnitCatalog::from_ron_str(&source)?;
    tracing::info!(
        kinds = catalog.len(),
        source = %path.map_or_else(|| "bundled".to_string(), |p| p.display().to_string()),
        "Unit catalog loaded"
    );
    Ok(Arc::new(catalog))
}

/// One line per kind: stats, price, hotkey and tags.
pub fn describe_catalog(catalog: &UnitCatalog) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<12} {:>4} {:>4} {:>4} {:>4} {:>4} {:>4} {:>3}  tags",
        "kind", "atk", "hp", "arm", "spd", "rng", "cost", "key"
    );
    for data in catalog.iter() {
        let _ = writeln!(
            out,
            "{:<12} {:>4} {:>4} {:>4} {:>4} {:>4} {:>4} {:>3}  {}",
            data.name,
            data.attack,
            data.max_hp,
            data.armor,
            data.speed,
            data.range,
            data.cost,
            data.hotkey,
            data.tags.join(", ")
        );
    }
    out
}
