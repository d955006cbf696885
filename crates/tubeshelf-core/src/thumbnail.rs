//! Thumbnail URLs for playlists and videos.

use serde::{Deserialize, Serialize};

/// Resolution variants served by the thumbnail host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThumbnailQuality {
    /// 120x90.
    Default,
    /// 320x180, used for list rows.
    #[default]
    Medium,
    /// 480x360.
    High,
    /// Up to 1280x720. Not always available for every video.
    Max,
}

impl ThumbnailQuality {
    /// Every quality, smallest first.
    pub const ALL: [Self; 4] = [Self::Default, Self::Medium, Self::High, Self::Max];

    /// Lowercase name, as used in serialized config and output.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Max => "max",
        }
    }

    /// File stem used by the thumbnail host for this quality.
    #[must_use]
    pub const fn file_stem(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Medium => "mqdefault",
            Self::High => "hqdefault",
            Self::Max => "maxresdefault",
        }
    }
}

/// Generate a `YouTube` thumbnail URL for a video ID.
#[must_use]
pub fn youtube_thumbnail_url(video_id: &str, quality: ThumbnailQuality) -> String {
    // https://img.youtube.com/vi/{VIDEO_ID}/{QUALITY}.jpg
    format!(
        "https://img.youtube.com/vi/{video_id}/{}.jpg",
        quality.file_stem()
    )
}

/// Get the best thumbnail URL for a playlist.
///
/// If the playlist has its own thumbnail, use that.
/// Otherwise, use the first video's thumbnail.
#[must_use]
pub fn get_playlist_thumbnail_url(
    playlist_thumbnail: Option<&str>,
    first_video_id: Option<&str>,
) -> Option<String> {
    playlist_thumbnail
        .map(String::from)
        .or_else(|| first_video_id.map(|id| youtube_thumbnail_url(id, ThumbnailQuality::Medium)))
}
