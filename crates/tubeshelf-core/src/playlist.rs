//! Playlist and video records.
//!
//! Both are built once per load (sheet import or catalog enrichment) and
//! then treated as read-only snapshots. Video order inside a playlist is
//! the order the source listed them in.

use serde::{Deserialize, Serialize};

use crate::duration::format_duration;
use crate::thumbnail::get_playlist_thumbnail_url;

/// A single video inside a playlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistVideo {
    /// Canonical 11-character video ID.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Thumbnail URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    /// Channel/uploader name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_title: Option<String>,
    /// Duration in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    /// Publication timestamp as reported by the source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    /// Name of the owning playlist, carried along for analytics payloads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub playlist_name: Option<String>,
}

impl PlaylistVideo {
    /// Unenriched entry: the ID doubles as the title.
    #[must_use]
    pub fn stub(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            title: id.clone(),
            id,
            thumbnail: None,
            channel_title: None,
            duration: None,
            published_at: None,
            playlist_name: None,
        }
    }

    /// Duration as `M:SS` / `H:MM:SS`, if known.
    #[must_use]
    pub fn formatted_duration(&self) -> Option<String> {
        self.duration.map(format_duration)
    }

    /// Playlist name for analytics, `"Unknown"` when not set.
    #[must_use]
    pub fn display_playlist_name(&self) -> &str {
        self.playlist_name.as_deref().unwrap_or("Unknown")
    }
}

/// A named, ordered list of videos.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    /// Identifier, unique within one catalog.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Videos in source order.
    #[serde(default)]
    pub videos: Vec<PlaylistVideo>,
}

impl Playlist {
    /// Create an empty playlist.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            videos: Vec::new(),
        }
    }

    /// Number of videos.
    #[must_use]
    pub fn video_count(&self) -> usize {
        self.videos.len()
    }

    /// Thumbnail for the playlist: the first video's own thumbnail, or one
    /// derived from its ID.
    #[must_use]
    pub fn thumbnail_url(&self) -> Option<String> {
        let first = self.videos.first()?;
        get_playlist_thumbnail_url(first.thumbnail.as_deref(), Some(&first.id))
    }

    /// Find a video by ID.
    #[must_use]
    pub fn video(&self, video_id: &str) -> Option<&PlaylistVideo> {
        self.videos.iter().find(|v| v.id == video_id)
    }
}
