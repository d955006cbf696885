//! Playlist catalog: the definitions the assembly pipeline enriches.
//!
//! A catalog file is a JSON array:
//!
//! ```json
//! [
//!   { "id": "dsa", "name": "DSA", "video_ids": ["dQw4w9WgXcQ", "https://youtu.be/abc12345678"] }
//! ]
//! ```
//!
//! Video entries may be URLs; they are normalised to canonical IDs when the
//! catalog is built and entries that do not yield an ID are dropped.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::video_id::extract_video_id;

/// One playlist definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Playlist identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Video IDs in display order.
    #[serde(default, alias = "videoIds")]
    pub video_ids: Vec<String>,
}

impl CatalogEntry {
    /// Create an entry.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        video_ids: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            video_ids: video_ids.into_iter().map(Into::into).collect(),
        }
    }
}

/// A validated, ordered set of playlist definitions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// Validate entries and normalise their video IDs.
    ///
    /// Entries need a non-blank id and name, and ids must be unique.
    pub fn new(entries: Vec<CatalogEntry>) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut normalised = Vec::with_capacity(entries.len());

        for entry in entries {
            let id = entry.id.trim().to_string();
            let name = entry.name.trim().to_string();

            if id.is_empty() {
                return Err(Error::Configuration(format!(
                    "Catalog entry '{name}' has no id"
                )));
            }
            if name.is_empty() {
                return Err(Error::Configuration(format!(
                    "Catalog entry '{id}' has no name"
                )));
            }
            if !seen.insert(id.clone()) {
                return Err(Error::Configuration(format!(
                    "Duplicate catalog entry id: {id}"
                )));
            }

            let video_ids = entry
                .video_ids
                .iter()
                .filter_map(|raw| match extract_video_id(raw) {
                    Ok(video_id) => Some(video_id),
                    Err(e) => {
                        warn!("Dropping video from catalog entry '{}': {}", id, e);
                        None
                    }
                })
                .collect();

            normalised.push(CatalogEntry { id, name, video_ids });
        }

        Ok(Self {
            entries: normalised,
        })
    }

    /// Parse a JSON catalog.
    pub fn from_json(json: &str) -> Result<Self> {
        let entries: Vec<CatalogEntry> = serde_json::from_str(json)?;
        Self::new(entries)
    }

    /// Read a JSON catalog file.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            Error::Configuration(format!("Failed to read catalog {}: {e}", path.display()))
        })?;
        let catalog = Self::from_json(&content)?;
        info!(
            "Loaded catalog with {} playlists from {}",
            catalog.len(),
            path.display()
        );
        Ok(catalog)
    }

    /// Entries in catalog order.
    #[must_use]
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Number of playlists.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog has no playlists.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_normalises_ids() {
        let catalog = Catalog::from_json(
            r#"[{"id":"dsa","name":" DSA ","video_ids":["https://youtu.be/dQw4w9WgXcQ","abc12345678"]}]"#,
        )
        .unwrap();

        let entry = &catalog.entries()[0];
        assert_eq!(entry.name, "DSA");
        assert_eq!(entry.video_ids, vec!["dQw4w9WgXcQ", "abc12345678"]);
    }

    #[test]
    fn test_camel_case_alias() {
        let catalog =
            Catalog::from_json(r#"[{"id":"a","name":"A","videoIds":["dQw4w9WgXcQ"]}]"#).unwrap();
        assert_eq!(catalog.entries()[0].video_ids.len(), 1);
    }

    #[test]
    fn test_invalid_video_ids_dropped_in_order() {
        let catalog = Catalog::new(vec![CatalogEntry::new(
            "a",
            "A",
            ["dQw4w9WgXcQ", "nope", "abc12345678"],
        )])
        .unwrap();
        assert_eq!(
            catalog.entries()[0].video_ids,
            vec!["dQw4w9WgXcQ", "abc12345678"]
        );
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let err = Catalog::new(vec![
            CatalogEntry::new("a", "A", Vec::<String>::new()),
            CatalogEntry::new("a", "Again", Vec::<String>::new()),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("Duplicate"));
    }

    #[test]
    fn test_blank_name_rejected() {
        assert!(Catalog::new(vec![CatalogEntry::new("a", "  ", Vec::<String>::new())]).is_err());
        assert!(Catalog::new(vec![CatalogEntry::new(" ", "A", Vec::<String>::new())]).is_err());
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("catalog.json");
        tokio::fs::write(&path, r#"[{"id":"a","name":"A","video_ids":[]}]"#)
            .await
            .unwrap();

        let catalog = Catalog::load_from(&path).await.unwrap();
        assert_eq!(catalog.len(), 1);
        assert!(!catalog.is_empty());
    }

    #[tokio::test]
    async fn test_load_from_missing_file() {
        let err = Catalog::load_from(Path::new("/no/catalog.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }
}
