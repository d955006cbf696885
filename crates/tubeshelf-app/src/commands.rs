//! Subcommand implementations and result rendering.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Map, Value, json};
use tracing::{info, warn};
use tubeshelf_core::{
    AppConfig, AssemblyPipeline, Catalog, Library, Playlist, PlaylistFailure, Selection,
    SkippedRow, ThumbnailQuality, YouTubeDataApi, extract_video_id, format_duration,
    parse_duration, watch_url, youtube_thumbnail_url,
};

use crate::error::AppError;

/// How results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable listing.
    Text,
    /// One JSON document.
    Json,
}

/// A loaded library, ready to print.
#[derive(Debug, Default)]
pub struct Report {
    /// Published playlists.
    pub playlists: Vec<Playlist>,
    /// Playlists whose metadata lookup failed.
    pub failures: Vec<PlaylistFailure>,
    /// Sheet rows that were dropped.
    pub skipped: Vec<SkippedRow>,
    /// Auto-selection over `playlists`.
    pub selection: Selection,
}

impl Report {
    fn new(
        playlists: Vec<Playlist>,
        failures: Vec<PlaylistFailure>,
        skipped: Vec<SkippedRow>,
        default_video_index: usize,
    ) -> Self {
        let mut selection = Selection::new();
        selection.auto_select(&playlists, default_video_index);
        Self {
            playlists,
            failures,
            skipped,
            selection,
        }
    }
}

/// `catalog [FILE]`: enrich a catalog and print the library.
pub async fn catalog(
    config: &AppConfig,
    path: Option<PathBuf>,
    format: OutputFormat,
) -> Result<(), AppError> {
    let path = catalog_path(path, config)?;
    let catalog = Catalog::load_from(&path).await?;
    let pipeline = pipeline(config)?;
    let library = Library::new();

    let Some(load) = library.load_catalog(&pipeline, &catalog).await? else {
        warn!("Catalog load was superseded, nothing to show");
        return Ok(());
    };

    let playlists = library.playlists().await.as_ref().clone();
    let report = Report::new(playlists, load.failures, Vec::new(), config.default_video_index);
    print(&report, format)
}

/// `import FILE [--enrich]`: import a sheet, optionally enrich it, and print
/// the library.
pub async fn import(
    config: &AppConfig,
    file: &Path,
    enrich: bool,
    format: OutputFormat,
) -> Result<(), AppError> {
    let library = Library::new();

    let Some(import) = library.import_sheet(file).await? else {
        warn!("Import was superseded, nothing to show");
        return Ok(());
    };

    let mut failures = Vec::new();
    if enrich {
        let pipeline = pipeline(config)?;
        if let Some(load) = library.enrich_published(&pipeline).await? {
            failures = load.failures;
        }
    }

    let playlists = library.playlists().await.as_ref().clone();
    let report = Report::new(playlists, failures, import.skipped, config.default_video_index);
    print(&report, format)
}

/// `duration VALUE`: decode an ISO-8601 duration.
pub fn duration(value: &str, format: OutputFormat) -> Result<(), AppError> {
    let seconds = parse_duration(value);
    let formatted = format_duration(seconds);

    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&json!({ "seconds": seconds, "formatted": formatted }))?
        ),
        OutputFormat::Text => println!("{seconds} ({formatted})"),
    }
    Ok(())
}

/// `video-id INPUT`: extract the canonical video ID.
pub fn video_id(input: &str, format: OutputFormat) -> Result<(), AppError> {
    let id = extract_video_id(input)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&video_json(&id))?),
        OutputFormat::Text => println!("{id}"),
    }
    Ok(())
}

/// JSON document for a video ID, with a thumbnail URL per quality.
pub fn video_json(id: &str) -> Value {
    let thumbnails: Map<String, Value> = ThumbnailQuality::ALL
        .iter()
        .map(|q| (q.name().to_string(), Value::from(youtube_thumbnail_url(id, *q))))
        .collect();

    json!({
        "id": id,
        "url": watch_url(id),
        "thumbnail": youtube_thumbnail_url(id, ThumbnailQuality::default()),
        "thumbnails": thumbnails,
    })
}

/// Explicit path first, then the configured one.
fn catalog_path(path: Option<PathBuf>, config: &AppConfig) -> Result<PathBuf, AppError> {
    path.or_else(|| config.catalog_path.clone())
        .ok_or(AppError::MissingCatalog)
}

fn pipeline(config: &AppConfig) -> Result<AssemblyPipeline, AppError> {
    let api = YouTubeDataApi::from_config(config)?;
    info!("Using metadata API at {}", config.api_base_url);
    Ok(AssemblyPipeline::new(Arc::new(api)).with_policy(config.failure_policy))
}

fn print(report: &Report, format: OutputFormat) -> Result<(), AppError> {
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(&report_json(report))?,
        OutputFormat::Text => render_text(report),
    };
    println!("{rendered}");
    Ok(())
}

/// JSON document for a report.
pub fn report_json(report: &Report) -> Value {
    let playlists: Vec<Value> = report
        .playlists
        .iter()
        .map(|p| {
            json!({
                "id": p.id,
                "name": p.name,
                "thumbnail": p.thumbnail_url(),
                "videos": p.videos,
            })
        })
        .collect();

    json!({
        "playlists": playlists,
        "failures": report.failures.iter().map(|f| json!({
            "playlistId": f.playlist_id,
            "reason": f.reason,
        })).collect::<Vec<_>>(),
        "skipped": report.skipped.iter().map(|s| json!({
            "row": s.row,
            "input": s.input,
            "reason": s.reason,
        })).collect::<Vec<_>>(),
        "selection": {
            "playlistId": report.selection.playlist().map(|p| &p.id),
            "videoId": report.selection.video().map(|v| &v.id),
        },
    })
}

/// Plain-text listing; the selected playlist and video are marked with `>`.
pub fn render_text(report: &Report) -> String {
    let mut out = String::new();
    let selected_playlist = report.selection.playlist().map(|p| p.id.as_str());
    let selected_video = report.selection.video().map(|v| v.id.as_str());

    for playlist in &report.playlists {
        let marker = if selected_playlist == Some(playlist.id.as_str()) {
            '>'
        } else {
            ' '
        };
        let _ = writeln!(
            out,
            "{marker} {} ({} videos)",
            playlist.name,
            playlist.video_count()
        );

        if let Some(failure) = report
            .failures
            .iter()
            .find(|f| f.playlist_id == playlist.id)
        {
            let _ = writeln!(out, "    ! {}", failure.reason);
        }

        for (index, video) in playlist.videos.iter().enumerate() {
            let marker = if selected_playlist == Some(playlist.id.as_str())
                && selected_video == Some(video.id.as_str())
            {
                '>'
            } else {
                ' '
            };
            let duration = video
                .formatted_duration()
                .map(|d| format!(" [{d}]"))
                .unwrap_or_default();
            let _ = writeln!(
                out,
                "  {marker} {}. {}{duration}  {}",
                index + 1,
                video.title,
                watch_url(&video.id)
            );
        }
    }

    for skipped in &report.skipped {
        let _ = writeln!(
            out,
            "Skipped row {} ({}): {}",
            skipped.row, skipped.input, skipped.reason
        );
    }

    out.trim_end().to_string()
}
