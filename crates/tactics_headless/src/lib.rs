//! Headless match runner for AI testing and balance checks.
//!
//! This crate owns everything the engine leaves out: reading catalog,
//! config and scenario files, logging setup, and JSON output. It enables:
//!
//! - **AI testing**: two heuristic controllers play each other with no UI
//! - **Balance checks**: many seeded matches run in parallel with rayon
//! - **Data validation**: unit catalogs are loaded and listed
//!
//! # Example
//!
//! ```bash
//! # Play one match and watch the board
//! cargo run -p tactics_headless -- run --seed 7 --ascii
//!
//! # Run a batch and save the summary
//! cargo run -p tactics_headless -- batch --count 200 --output results/batch.json
//!
//! # Validate a catalog
//! cargo run -p tactics_headless -- catalog --path units.ron
//! ```

pub mod ascii;
pub mod batch;
pub mod catalog_loader;
pub mod error;
pub mod runner;
pub mod scenario;

pub use ascii::{render_board, AsciiConfig};
pub use batch::{run_batch, BatchConfig, BatchResults, BatchSummary};
pub use catalog_loader::{describe_catalog, load_catalog, BUNDLED_UNITS};
pub use error::{Result, RunnerError};
pub use runner::{run_match, MatchResult, MatchRunner, SideStats};
pub use scenario::{Placement, Scenario};
