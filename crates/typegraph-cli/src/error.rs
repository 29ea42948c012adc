//! CLI error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// Store, validation or conversion failure.
    #[error(transparent)]
    Core(#[from] typegraph_core::Error),

    /// An input file could not be read.
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Input or output JSON was malformed.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
