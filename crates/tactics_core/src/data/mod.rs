//! Data structures for unit definitions.
//!
//! Unit kinds are plain records deserialized from RON and collected into an
//! immutable [`UnitCatalog`]. The catalog is validated once when it is built
//! and shared by reference afterwards.
//!
//! **Note:** This module contains no IO - it only defines data types and
//! parses strings. Reading files is left to the caller.

mod catalog;
mod unit_data;

pub use catalog::UnitCatalog;
pub use unit_data::UnitData;
