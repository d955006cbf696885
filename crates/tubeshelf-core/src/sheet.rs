//! Spreadsheet-to-playlist import.
//!
//! The sheet layout is loose: a row whose first cell looks like a title opens
//! a new playlist, and the rows below it are videos until the next title.
//!
//! ```text
//! Playlist: DSA
//! https://youtu.be/dQw4w9WgXcQ   Intro         Some Channel   2024-01-02
//! abc12345678                    Part 1
//! Arrays
//! ...
//! ```
//!
//! Video rows with an unusable first cell are logged and skipped; they never
//! abort the import or discard playlists already collected.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::grid::{self, Cell, Row};
use crate::playlist::{Playlist, PlaylistVideo};
use crate::thumbnail::{ThumbnailQuality, youtube_thumbnail_url};
use crate::video_id::extract_video_id;

/// Marker that may prefix a header row.
pub const PLAYLIST_PREFIX: &str = "Playlist:";

/// Title used when a video row has no title cell.
pub const UNTITLED_VIDEO: &str = "Untitled Video";

/// A video row that was dropped during import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    /// 1-based row number in the sheet.
    pub row: usize,
    /// The first cell as read.
    pub input: String,
    /// Why the row was dropped.
    pub reason: String,
}

/// Outcome of a sheet import.
#[derive(Debug, Clone, Default)]
pub struct SheetImport {
    /// Playlists in the order their headers appeared.
    pub playlists: Vec<Playlist>,
    /// Video rows that could not be used.
    pub skipped: Vec<SkippedRow>,
}

/// Whether a trimmed first cell opens a new playlist.
///
/// Headers either carry the `Playlist:` prefix or start with an uppercase
/// letter, and never start with `http`.
#[must_use]
pub fn is_playlist_header(first_cell: &str) -> bool {
    let looks_like_header = first_cell.starts_with(PLAYLIST_PREFIX)
        || first_cell.starts_with(|c: char| c.is_ascii_uppercase());

    looks_like_header && !first_cell.starts_with("http")
}

/// Display name of a header row: the optional `Playlist:` prefix (any case)
/// stripped and whitespace trimmed.
#[must_use]
pub fn header_name(first_cell: &str) -> &str {
    let prefix_len = PLAYLIST_PREFIX.len();
    let rest = match first_cell.get(..prefix_len) {
        Some(head) if head.eq_ignore_ascii_case(PLAYLIST_PREFIX) => &first_cell[prefix_len..],
        _ => first_cell,
    };
    rest.trim()
}

/// Parse a decoded grid into playlists.
///
/// Fails with [`Error::EmptyImport`] only when no header row was found. A
/// playlist with no usable videos is still returned.
pub fn parse_rows(rows: &[Row]) -> Result<Vec<Playlist>> {
    parse_rows_detailed(rows).map(|import| import.playlists)
}

/// Like [`parse_rows`], also reporting the rows that were skipped.
pub fn parse_rows_detailed(rows: &[Row]) -> Result<SheetImport> {
    let mut import = SheetImport::default();

    for (index, row) in rows.iter().enumerate() {
        let row_number = index + 1;

        let Some(first) = row.first().filter(|cell| !cell.is_blank()) else {
            continue;
        };
        let first_cell = first.as_text().unwrap_or_default();
        let first_cell = first_cell.trim();

        if is_playlist_header(first_cell) {
            let number = import.playlists.len() + 1;
            let name = match header_name(first_cell) {
                "" => format!("Playlist {number}"),
                name => name.to_string(),
            };
            debug!("Row {}: opening playlist '{}'", row_number, name);
            import
                .playlists
                .push(Playlist::new(format!("playlist-{number}"), name));
            continue;
        }

        let Some(current) = import.playlists.last_mut() else {
            debug!("Row {}: video row before any playlist header, ignored", row_number);
            continue;
        };

        match build_video(first_cell, row, &current.name) {
            Ok(video) => current.videos.push(video),
            Err(e) if e.is_recoverable() => {
                warn!("Skipping invalid video URL at row {}: {}", row_number, e);
                import.skipped.push(SkippedRow {
                    row: row_number,
                    input: first_cell.to_string(),
                    reason: e.to_string(),
                });
            }
            Err(e) => return Err(e),
        }
    }

    if import.playlists.is_empty() {
        return Err(Error::EmptyImport);
    }

    info!(
        "Imported {} playlists ({} videos, {} rows skipped)",
        import.playlists.len(),
        import.playlists.iter().map(Playlist::video_count).sum::<usize>(),
        import.skipped.len()
    );

    Ok(import)
}

/// Decode an import file and parse it.
pub async fn import_file(path: &Path) -> Result<SheetImport> {
    let rows = grid::decode_file(path).await?;
    parse_rows_detailed(&rows)
}

fn build_video(first_cell: &str, row: &[Cell], playlist_name: &str) -> Result<PlaylistVideo> {
    let id = extract_video_id(first_cell)?;
    let text_at = |idx: usize| row.get(idx).and_then(Cell::trimmed_text);

    Ok(PlaylistVideo {
        title: text_at(1).unwrap_or_else(|| UNTITLED_VIDEO.to_string()),
        thumbnail: Some(youtube_thumbnail_url(&id, ThumbnailQuality::Medium)),
        channel_title: Some(text_at(2).unwrap_or_default()),
        duration: None,
        published_at: Some(text_at(3).unwrap_or_default()),
        playlist_name: Some(playlist_name.to_string()),
        id,
    })
}
