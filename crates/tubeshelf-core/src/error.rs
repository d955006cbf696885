//! Error types for Tubeshelf core operations.

use thiserror::Error;

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in Tubeshelf core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A video URL or ID could not be normalised to a canonical video ID.
    ///
    /// During an import this only costs the offending row.
    #[error("Invalid YouTube URL or video ID: {input}")]
    InvalidIdentifier {
        /// The raw input that failed extraction.
        input: String,
    },

    /// A tabular import produced zero playlists.
    #[error("No valid playlist data found in the file")]
    EmptyImport,

    /// The import source could not be decoded into a grid of cells.
    #[error("Failed to decode {source_name}: {reason}")]
    DecodeFailure {
        /// File name or label of the source being decoded.
        source_name: String,
        /// Why decoding failed.
        reason: String,
    },

    /// The batched metadata lookup for a playlist failed.
    #[error("Enrichment failed for playlist {playlist_id}: {reason}")]
    EnrichmentFailure {
        /// Catalog id of the playlist whose lookup failed.
        playlist_id: String,
        /// Underlying failure.
        reason: String,
    },

    /// The catalog had no entries, or no entry survived enrichment.
    #[error("Catalog is empty: no playlists could be loaded")]
    EmptyCatalog,

    /// Network or remote API error.
    #[error("Network error: {0}")]
    Network(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create a network error.
    pub fn network_error(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Create a decode failure for the named source.
    pub fn decode_failure(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DecodeFailure {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }

    /// Create an enrichment failure for a playlist.
    pub fn enrichment_failure(playlist_id: impl Into<String>, reason: impl ToString) -> Self {
        Self::EnrichmentFailure {
            playlist_id: playlist_id.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether the error only affects a single row and the caller can carry on.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::InvalidIdentifier { .. })
    }
}
