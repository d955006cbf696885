//! `Tubeshelf` Core Library
//!
//! This crate provides the core functionality for the `Tubeshelf` media
//! library browser:
//! - Importing playlists from spreadsheet-like grids (JSON, CSV, TSV)
//! - Enriching a playlist catalog with video metadata, concurrently
//! - Publishing loaded playlists with last-load-wins semantics
//! - Tracking the selected playlist and video
//! - Turning embedded player callbacks into analytics events
//!
//! # Error Handling
//!
//! All fallible operations return [`Result`] with the crate [`Error`] type.
//! Only [`Error::InvalidIdentifier`] is recoverable; the sheet importer
//! handles it per row and keeps going.
//!
//! ```rust,ignore
//! use tubeshelf_core::{Library, sheet};
//!
//! let library = Library::new();
//! let import = library.import_sheet(Path::new("playlists.csv")).await?;
//! ```

pub mod catalog;
pub mod config;
pub mod duration;
pub mod enrichment;
pub mod error;
pub mod grid;
pub mod library;
pub mod pipeline;
pub mod playback;
pub mod playlist;
pub mod selection;
pub mod sheet;
pub mod thumbnail;
pub mod video_id;

pub use catalog::{Catalog, CatalogEntry};
pub use config::{API_KEY_ENV, AppConfig, DEFAULT_API_BASE_URL};
pub use duration::{format_duration, parse_duration};
pub use enrichment::{MAX_IDS_PER_REQUEST, VideoDetails, VideoMetadataSource, YouTubeDataApi};
pub use error::{Error, Result};
pub use grid::{Cell, Grid, GridFormat, Row, decode_bytes, decode_file};
pub use library::{Library, LoadTicket};
pub use pipeline::{
    AssemblyPipeline, CatalogLoad, FailurePolicy, PlaylistFailure, assemble_playlist,
    merge_details,
};
pub use playback::{
    AnalyticsEvent, AnalyticsSink, NoopAnalytics, PlaybackSession, PlayerHandle, PlayerState,
    TracingAnalytics, VideoContext,
};
pub use playlist::{Playlist, PlaylistVideo};
pub use selection::{Selection, filter_playlists};
pub use sheet::{SheetImport, SkippedRow, import_file, parse_rows, parse_rows_detailed};
pub use thumbnail::{ThumbnailQuality, get_playlist_thumbnail_url, youtube_thumbnail_url};
pub use video_id::{VIDEO_ID_LEN, extract_video_id, watch_url};
