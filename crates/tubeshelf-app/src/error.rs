//! Errors surfaced by the command line driver.

use thiserror::Error;

use crate::logging::LoggingError;

/// Anything that stops a command from completing.
#[derive(Debug, Error)]
pub enum AppError {
    /// Failure inside the library.
    #[error(transparent)]
    Core(#[from] tubeshelf_core::Error),

    /// Logging could not be set up.
    #[error(transparent)]
    Logging(#[from] LoggingError),

    /// `catalog` was run without a path and none is configured.
    #[error("No catalog file given and no catalog_path configured")]
    MissingCatalog,

    /// Results could not be rendered as JSON.
    #[error("Failed to render output: {0}")]
    Output(#[from] serde_json::Error),
}
