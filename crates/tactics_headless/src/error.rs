//! Error type for the headless runner.

use std::path::PathBuf;

use tactics_core::error::GameError;
use thiserror::Error;

/// Result type alias using [`RunnerError`].
pub type Result<T> = std::result::Result<T, RunnerError>;

/// Everything that can stop a headless run.
#[derive(Error, Debug)]
pub enum RunnerError {
    /// File not found.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),
    /// Failed to read or write a file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse RON: {0}")]
    Ron(#[from] ron::error::SpannedError),
    /// Failed to produce or read JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// The engine rejected the setup or a controller failed.
    #[error(transparent)]
    Game(#[from] GameError),
}
