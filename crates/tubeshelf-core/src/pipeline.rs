//! Playlist assembly: catalog definitions in, enriched playlists out.
//!
//! Every catalog entry is enriched with one batched metadata lookup, and all
//! lookups run concurrently. Results are matched back to the catalog by video
//! ID, never by response position, so the catalog order always wins. IDs the
//! lookup did not return become unenriched stubs.
//!
//! Imported playlists already carry sheet data, so they are enriched in place
//! with [`AssemblyPipeline::enrich_playlists`]: metadata is merged over each
//! imported video and anything the lookup cannot supply keeps its sheet value.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::catalog::{Catalog, CatalogEntry};
use crate::duration::parse_duration;
use crate::enrichment::{VideoDetails, VideoMetadataSource};
use crate::error::{Error, Result};
use crate::playlist::{Playlist, PlaylistVideo};
use crate::thumbnail::{ThumbnailQuality, youtube_thumbnail_url};

/// How a catalog load reacts when one playlist's lookup fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Keep the playlist with no videos, record the failure, and carry on.
    /// The load only fails if every playlist failed.
    #[default]
    Isolate,
    /// Fail the whole load on the first failed playlist.
    FailFast,
}

/// A playlist whose lookup failed under [`FailurePolicy::Isolate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistFailure {
    /// Catalog id of the playlist.
    pub playlist_id: String,
    /// Failure description.
    pub reason: String,
}

/// Result of a catalog load.
#[derive(Debug, Clone, Default)]
pub struct CatalogLoad {
    /// Playlists in catalog order, including failed ones (with no videos).
    pub playlists: Vec<Playlist>,
    /// Playlists whose lookup failed.
    pub failures: Vec<PlaylistFailure>,
}

impl CatalogLoad {
    /// Whether every playlist was enriched.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Enriches catalog entries through a [`VideoMetadataSource`].
#[derive(Clone)]
pub struct AssemblyPipeline {
    source: Arc<dyn VideoMetadataSource>,
    policy: FailurePolicy,
}

impl AssemblyPipeline {
    /// Create a pipeline with the default failure policy.
    pub fn new(source: Arc<dyn VideoMetadataSource>) -> Self {
        Self {
            source,
            policy: FailurePolicy::default(),
        }
    }

    /// Set the failure policy.
    #[must_use]
    pub const fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The active failure policy.
    #[must_use]
    pub const fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Enrich every catalog entry concurrently.
    pub async fn assemble(&self, catalog: &Catalog) -> Result<CatalogLoad> {
        if catalog.is_empty() {
            return Err(Error::EmptyCatalog);
        }

        info!("Enriching {} playlists", catalog.len());
        let results = join_all(catalog.entries().iter().map(|e| self.enrich_entry(e))).await;

        let mut load = CatalogLoad::default();
        let mut first_error = None;

        for (entry, result) in catalog.entries().iter().zip(results) {
            match result {
                Ok(playlist) => load.playlists.push(playlist),
                Err(e) if self.policy == FailurePolicy::FailFast => return Err(e),
                Err(e) => {
                    warn!("Playlist '{}' left empty: {}", entry.id, e);
                    load.failures.push(PlaylistFailure {
                        playlist_id: entry.id.clone(),
                        reason: e.to_string(),
                    });
                    load.playlists.push(Playlist::new(&entry.id, &entry.name));
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        if load.failures.len() == catalog.len()
            && let Some(e) = first_error
        {
            return Err(e);
        }

        info!(
            "Catalog ready: {} playlists, {} failed",
            load.playlists.len(),
            load.failures.len()
        );
        Ok(load)
    }

    /// Enrich already-imported playlists concurrently.
    ///
    /// Unlike [`AssemblyPipeline::assemble`], a failed lookup under
    /// [`FailurePolicy::Isolate`] keeps the playlist exactly as imported, and
    /// the load never fails as a whole: the imported data stays usable.
    pub async fn enrich_playlists(&self, playlists: &[Playlist]) -> Result<CatalogLoad> {
        if playlists.is_empty() {
            return Err(Error::EmptyCatalog);
        }

        info!("Enriching {} imported playlists", playlists.len());
        let ids: Vec<Vec<String>> = playlists
            .iter()
            .map(|p| p.videos.iter().map(|v| v.id.clone()).collect())
            .collect();
        let results = join_all(
            playlists
                .iter()
                .zip(&ids)
                .map(|(playlist, ids)| self.fetch_details(&playlist.id, ids)),
        )
        .await;

        let mut load = CatalogLoad::default();
        for (playlist, result) in playlists.iter().zip(results) {
            match result {
                Ok(details) => load.playlists.push(merge_details(playlist, details)),
                Err(e) if self.policy == FailurePolicy::FailFast => return Err(e),
                Err(e) => {
                    warn!("Playlist '{}' kept as imported: {}", playlist.id, e);
                    load.failures.push(PlaylistFailure {
                        playlist_id: playlist.id.clone(),
                        reason: e.to_string(),
                    });
                    load.playlists.push(playlist.clone());
                }
            }
        }

        info!(
            "Imported playlists enriched: {} playlists, {} failed",
            load.playlists.len(),
            load.failures.len()
        );
        Ok(load)
    }

    async fn enrich_entry(&self, entry: &CatalogEntry) -> Result<Playlist> {
        let details = self.fetch_details(&entry.id, &entry.video_ids).await?;
        Ok(assemble_playlist(entry, details))
    }

    async fn fetch_details(&self, playlist_id: &str, ids: &[String]) -> Result<Vec<VideoDetails>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        debug!(
            "Fetching metadata for playlist '{}' ({} videos)",
            playlist_id,
            ids.len()
        );

        self.source
            .fetch_video_details(ids)
            .await
            .map_err(|e| match e {
                Error::EnrichmentFailure { .. } => e,
                other => Error::enrichment_failure(playlist_id, other),
            })
    }
}

/// Build a playlist from its catalog entry and whatever metadata came back.
///
/// Videos follow `entry.video_ids`; an ID missing from `details` becomes a
/// stub titled with its own ID.
#[must_use]
pub fn assemble_playlist(entry: &CatalogEntry, details: Vec<VideoDetails>) -> Playlist {
    let by_id: HashMap<String, VideoDetails> =
        details.into_iter().map(|d| (d.id.clone(), d)).collect();

    let videos = entry
        .video_ids
        .iter()
        .map(|id| match by_id.get(id) {
            Some(details) => enriched_video(details, &entry.name),
            None => {
                debug!("No metadata for {} in playlist '{}'", id, entry.id);
                PlaylistVideo {
                    playlist_name: Some(entry.name.clone()),
                    ..PlaylistVideo::stub(id)
                }
            }
        })
        .collect();

    Playlist {
        id: entry.id.clone(),
        name: entry.name.clone(),
        videos,
    }
}

/// Merge looked-up metadata over an imported playlist.
///
/// Video order and membership stay as imported. A video the lookup did not
/// return is kept unchanged; for one it did, each field the lookup left empty
/// keeps its imported value.
#[must_use]
pub fn merge_details(playlist: &Playlist, details: Vec<VideoDetails>) -> Playlist {
    let by_id: HashMap<String, VideoDetails> =
        details.into_iter().map(|d| (d.id.clone(), d)).collect();

    let videos = playlist
        .videos
        .iter()
        .map(|video| match by_id.get(&video.id) {
            Some(details) => merged_video(video, details, &playlist.name),
            None => {
                debug!("No metadata for {}, keeping imported record", video.id);
                video.clone()
            }
        })
        .collect();

    Playlist {
        id: playlist.id.clone(),
        name: playlist.name.clone(),
        videos,
    }
}

fn merged_video(
    imported: &PlaylistVideo,
    details: &VideoDetails,
    playlist_name: &str,
) -> PlaylistVideo {
    let filled = |value: Option<&str>| {
        value
            .filter(|v| !v.trim().is_empty())
            .map(str::to_string)
    };

    PlaylistVideo {
        id: imported.id.clone(),
        title: if details.title.trim().is_empty() || details.title == details.id {
            imported.title.clone()
        } else {
            details.title.clone()
        },
        thumbnail: filled(details.thumbnail.as_deref())
            .or_else(|| imported.thumbnail.clone()),
        channel_title: filled(details.channel_title.as_deref())
            .or_else(|| imported.channel_title.clone()),
        duration: details
            .duration
            .as_deref()
            .map(parse_duration)
            .or(imported.duration),
        published_at: filled(details.published_at.as_deref())
            .or_else(|| imported.published_at.clone()),
        playlist_name: imported
            .playlist_name
            .clone()
            .or_else(|| Some(playlist_name.to_string())),
    }
}

fn enriched_video(details: &VideoDetails, playlist_name: &str) -> PlaylistVideo {
    PlaylistVideo {
        id: details.id.clone(),
        title: details.title.clone(),
        thumbnail: details
            .thumbnail
            .clone()
            .or_else(|| Some(youtube_thumbnail_url(&details.id, ThumbnailQuality::Medium))),
        channel_title: details.channel_title.clone(),
        duration: details.duration.as_deref().map(parse_duration),
        published_at: details.published_at.clone(),
        playlist_name: Some(playlist_name.to_string()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::enrichment::MockVideoMetadataSource;

    fn details(id: &str, title: &str) -> VideoDetails {
        VideoDetails {
            id: id.to_string(),
            title: title.to_string(),
            duration: Some("PT3M".to_string()),
            ..Default::default()
        }
    }

    fn two_playlist_catalog() -> Catalog {
        Catalog::new(vec![
            CatalogEntry::new("dsa", "DSA", ["dQw4w9WgXcQ", "abc12345678"]),
            CatalogEntry::new("web", "Web", ["zyx98765432"]),
        ])
        .unwrap()
    }

    fn same_ids(actual: &[String], expected: &[&str]) -> bool {
        actual.iter().map(String::as_str).eq(expected.iter().copied())
    }

    mod assemble_playlist_tests {
        use super::*;

        #[test]
        fn test_reorders_to_catalog_order() {
            let entry = CatalogEntry::new("dsa", "DSA", ["aaaaaaaaaaa", "bbbbbbbbbbb", "ccccccccccc"]);
            let response = vec![
                details("ccccccccccc", "C"),
                details("aaaaaaaaaaa", "A"),
                details("bbbbbbbbbbb", "B"),
            ];

            let playlist = assemble_playlist(&entry, response);
            let titles: Vec<_> = playlist.videos.iter().map(|v| v.title.as_str()).collect();
            assert_eq!(titles, vec!["A", "B", "C"]);
        }

        #[test]
        fn test_missing_ids_become_stubs() {
            let entry = CatalogEntry::new("dsa", "DSA", ["aaaaaaaaaaa", "bbbbbbbbbbb"]);
            let playlist = assemble_playlist(&entry, vec![details("bbbbbbbbbbb", "B")]);

            assert_eq!(playlist.videos.len(), 2);
            assert_eq!(playlist.videos[0].id, "aaaaaaaaaaa");
            assert_eq!(playlist.videos[0].title, "aaaaaaaaaaa");
            assert_eq!(playlist.videos[0].duration, None);
            assert_eq!(playlist.videos[0].playlist_name.as_deref(), Some("DSA"));
            assert_eq!(playlist.videos[1].title, "B");
        }

        #[test]
        fn test_unknown_ids_in_response_ignored() {
            let entry = CatalogEntry::new("dsa", "DSA", ["aaaaaaaaaaa"]);
            let playlist = assemble_playlist(
                &entry,
                vec![details("zzzzzzzzzzz", "Z"), details("aaaaaaaaaaa", "A")],
            );
            assert_eq!(playlist.videos.len(), 1);
            assert_eq!(playlist.videos[0].title, "A");
        }

        #[test]
        fn test_duplicate_catalog_ids_each_enriched() {
            let entry = CatalogEntry::new("dsa", "DSA", ["aaaaaaaaaaa", "aaaaaaaaaaa"]);
            let playlist = assemble_playlist(&entry, vec![details("aaaaaaaaaaa", "A")]);
            assert_eq!(playlist.videos.len(), 2);
            assert!(playlist.videos.iter().all(|v| v.title == "A"));
        }

        #[test]
        fn test_enriched_fields() {
            let entry = CatalogEntry::new("dsa", "DSA", ["aaaaaaaaaaa"]);
            let response = vec![VideoDetails {
                id: "aaaaaaaaaaa".to_string(),
                title: "A".to_string(),
                channel_title: Some("Chan".to_string()),
                thumbnail: None,
                duration: Some("PT1H2M3S".to_string()),
                published_at: Some("2024-01-01T00:00:00Z".to_string()),
            }];

            let video = &assemble_playlist(&entry, response).videos[0];
            assert_eq!(video.duration, Some(3723));
            assert_eq!(video.channel_title.as_deref(), Some("Chan"));
            assert_eq!(
                video.thumbnail.as_deref(),
                Some("https://img.youtube.com/vi/aaaaaaaaaaa/mqdefault.jpg")
            );
            assert_eq!(video.playlist_name.as_deref(), Some("DSA"));
        }
    }

    fn imported_dsa() -> Playlist {
        let mut playlist = Playlist::new("playlist-1", "DSA");
        playlist.videos = vec![
            PlaylistVideo {
                title: "Intro".to_string(),
                channel_title: Some("Chan".to_string()),
                published_at: Some("2024".to_string()),
                playlist_name: Some("DSA".to_string()),
                ..PlaylistVideo::stub("dQw4w9WgXcQ")
            },
            PlaylistVideo {
                title: "Part1".to_string(),
                channel_title: Some("Chan2".to_string()),
                published_at: Some(String::new()),
                playlist_name: Some("DSA".to_string()),
                ..PlaylistVideo::stub("abc12345678")
            },
        ];
        playlist
    }

    mod merge_details_tests {
        use super::*;

        #[test]
        fn test_lookup_overrides_imported_fields() {
            let response = vec![VideoDetails {
                id: "dQw4w9WgXcQ".to_string(),
                title: "Intro (remastered)".to_string(),
                channel_title: Some("Official".to_string()),
                thumbnail: Some("https://example.com/t.jpg".to_string()),
                duration: Some("PT3M33S".to_string()),
                published_at: Some("2024-01-01T00:00:00Z".to_string()),
            }];

            let merged = merge_details(&imported_dsa(), response);
            let video = &merged.videos[0];
            assert_eq!(video.title, "Intro (remastered)");
            assert_eq!(video.channel_title.as_deref(), Some("Official"));
            assert_eq!(video.thumbnail.as_deref(), Some("https://example.com/t.jpg"));
            assert_eq!(video.duration, Some(213));
            assert_eq!(video.published_at.as_deref(), Some("2024-01-01T00:00:00Z"));
        }

        #[test]
        fn test_missing_ids_keep_imported_record() {
            let merged = merge_details(&imported_dsa(), vec![details("dQw4w9WgXcQ", "Intro")]);

            assert_eq!(merged.videos.len(), 2);
            assert_eq!(merged.videos[1], imported_dsa().videos[1]);
            assert_eq!(merged.videos[1].title, "Part1");
            assert_eq!(merged.videos[1].channel_title.as_deref(), Some("Chan2"));
        }

        #[test]
        fn test_empty_lookup_fields_keep_imported_values() {
            let response = vec![VideoDetails {
                id: "dQw4w9WgXcQ".to_string(),
                title: "dQw4w9WgXcQ".to_string(),
                ..Default::default()
            }];

            let video = &merge_details(&imported_dsa(), response).videos[0];
            assert_eq!(video.title, "Intro");
            assert_eq!(video.channel_title.as_deref(), Some("Chan"));
            assert_eq!(video.published_at.as_deref(), Some("2024"));
            assert_eq!(video.thumbnail, None);
            assert_eq!(video.duration, None);
        }

        #[test]
        fn test_imported_order_is_kept() {
            let merged = merge_details(
                &imported_dsa(),
                vec![details("abc12345678", "B"), details("dQw4w9WgXcQ", "A")],
            );
            let titles: Vec<_> = merged.videos.iter().map(|v| v.title.as_str()).collect();
            assert_eq!(titles, vec!["A", "B"]);
            assert_eq!(merged.id, "playlist-1");
        }
    }

    mod pipeline_tests {
        use super::*;

        #[tokio::test]
        async fn test_one_batched_call_per_playlist() {
            let mut source = MockVideoMetadataSource::new();
            source
                .expect_fetch_video_details()
                .withf(|ids| same_ids(ids, &["dQw4w9WgXcQ", "abc12345678"]))
                .times(1)
                .returning(|_| {
                    Ok(vec![
                        details("abc12345678", "Second"),
                        details("dQw4w9WgXcQ", "First"),
                    ])
                });
            source
                .expect_fetch_video_details()
                .withf(|ids| same_ids(ids, &["zyx98765432"]))
                .times(1)
                .returning(|_| Ok(vec![details("zyx98765432", "Only")]));

            let pipeline = AssemblyPipeline::new(Arc::new(source));
            let load = pipeline.assemble(&two_playlist_catalog()).await.unwrap();

            assert!(load.is_complete());
            assert_eq!(load.playlists.len(), 2);
            assert_eq!(load.playlists[0].id, "dsa");
            assert_eq!(load.playlists[0].videos[0].title, "First");
            assert_eq!(load.playlists[0].videos[1].title, "Second");
            assert_eq!(load.playlists[0].videos[0].duration, Some(180));
            assert_eq!(load.playlists[1].videos[0].title, "Only");
        }

        #[tokio::test]
        async fn test_isolate_policy_keeps_other_playlists() {
            let mut source = MockVideoMetadataSource::new();
            source
                .expect_fetch_video_details()
                .withf(|ids| same_ids(ids, &["dQw4w9WgXcQ", "abc12345678"]))
                .returning(|_| Err(Error::network_error("HTTP 500")));
            source
                .expect_fetch_video_details()
                .withf(|ids| same_ids(ids, &["zyx98765432"]))
                .returning(|_| Ok(vec![details("zyx98765432", "Only")]));

            let pipeline = AssemblyPipeline::new(Arc::new(source));
            assert_eq!(pipeline.policy(), FailurePolicy::Isolate);

            let load = pipeline.assemble(&two_playlist_catalog()).await.unwrap();

            assert!(!load.is_complete());
            assert_eq!(load.failures.len(), 1);
            assert_eq!(load.failures[0].playlist_id, "dsa");
            assert!(load.failures[0].reason.contains("HTTP 500"));

            assert_eq!(load.playlists.len(), 2);
            assert_eq!(load.playlists[0].name, "DSA");
            assert!(load.playlists[0].videos.is_empty());
            assert_eq!(load.playlists[1].videos.len(), 1);
            assert_eq!(load.playlists[1].videos[0].title, "Only");
        }

        #[tokio::test]
        async fn test_fail_fast_policy_fails_whole_load() {
            let mut source = MockVideoMetadataSource::new();
            source
                .expect_fetch_video_details()
                .withf(|ids| same_ids(ids, &["dQw4w9WgXcQ", "abc12345678"]))
                .returning(|_| Ok(vec![details("dQw4w9WgXcQ", "First")]));
            source
                .expect_fetch_video_details()
                .withf(|ids| same_ids(ids, &["zyx98765432"]))
                .returning(|_| Err(Error::network_error("quota exceeded")));

            let pipeline =
                AssemblyPipeline::new(Arc::new(source)).with_policy(FailurePolicy::FailFast);
            let err = pipeline.assemble(&two_playlist_catalog()).await.unwrap_err();

            match err {
                Error::EnrichmentFailure {
                    playlist_id,
                    reason,
                } => {
                    assert_eq!(playlist_id, "web");
                    assert!(reason.contains("quota exceeded"));
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }

        #[tokio::test]
        async fn test_all_playlists_failing_is_an_error() {
            let mut source = MockVideoMetadataSource::new();
            source
                .expect_fetch_video_details()
                .times(2)
                .returning(|_| Err(Error::network_error("offline")));

            let pipeline = AssemblyPipeline::new(Arc::new(source));
            let err = pipeline.assemble(&two_playlist_catalog()).await.unwrap_err();
            assert!(matches!(err, Error::EnrichmentFailure { .. }));
        }

        #[tokio::test]
        async fn test_empty_catalog_is_an_error() {
            let mut source = MockVideoMetadataSource::new();
            source.expect_fetch_video_details().never();

            let pipeline = AssemblyPipeline::new(Arc::new(source));
            let err = pipeline.assemble(&Catalog::default()).await.unwrap_err();
            assert!(matches!(err, Error::EmptyCatalog));
        }

        #[tokio::test]
        async fn test_failed_enrichment_keeps_imported_videos() {
            let mut arrays = Playlist::new("playlist-2", "Arrays");
            arrays.videos = vec![PlaylistVideo {
                title: "Sorting".to_string(),
                ..PlaylistVideo::stub("zyx98765432")
            }];

            let mut source = MockVideoMetadataSource::new();
            source
                .expect_fetch_video_details()
                .withf(|ids| same_ids(ids, &["dQw4w9WgXcQ", "abc12345678"]))
                .returning(|_| Err(Error::network_error("HTTP 403")));
            source
                .expect_fetch_video_details()
                .withf(|ids| same_ids(ids, &["zyx98765432"]))
                .returning(|_| Ok(vec![details("zyx98765432", "Sorting in depth")]));

            let pipeline = AssemblyPipeline::new(Arc::new(source));
            let load = pipeline
                .enrich_playlists(&[imported_dsa(), arrays])
                .await
                .unwrap();

            assert_eq!(load.failures.len(), 1);
            assert_eq!(load.failures[0].playlist_id, "playlist-1");
            assert_eq!(load.playlists[0], imported_dsa());
            assert_eq!(load.playlists[1].videos[0].title, "Sorting in depth");
            assert_eq!(load.playlists[1].videos[0].duration, Some(180));
        }

        #[tokio::test]
        async fn test_enrichment_failing_everywhere_still_keeps_import() {
            let mut source = MockVideoMetadataSource::new();
            source
                .expect_fetch_video_details()
                .times(1)
                .returning(|_| Err(Error::network_error("offline")));

            let pipeline = AssemblyPipeline::new(Arc::new(source));
            let load = pipeline.enrich_playlists(&[imported_dsa()]).await.unwrap();

            assert!(!load.is_complete());
            assert_eq!(load.playlists, vec![imported_dsa()]);
        }

        #[tokio::test]
        async fn test_enrichment_fail_fast() {
            let mut source = MockVideoMetadataSource::new();
            source
                .expect_fetch_video_details()
                .returning(|_| Err(Error::network_error("quota exceeded")));

            let pipeline =
                AssemblyPipeline::new(Arc::new(source)).with_policy(FailurePolicy::FailFast);
            let err = pipeline
                .enrich_playlists(&[imported_dsa()])
                .await
                .unwrap_err();
            assert!(matches!(err, Error::EnrichmentFailure { .. }));
        }

        #[tokio::test]
        async fn test_empty_playlists_skip_the_lookup() {
            let mut source = MockVideoMetadataSource::new();
            source.expect_fetch_video_details().never();

            let pipeline = AssemblyPipeline::new(Arc::new(source));
            let load = pipeline
                .enrich_playlists(&[Playlist::new("playlist-1", "Empty")])
                .await
                .unwrap();
            assert!(load.is_complete());
            assert!(load.playlists[0].videos.is_empty());

            assert!(matches!(
                pipeline.enrich_playlists(&[]).await,
                Err(Error::EmptyCatalog)
            ));
        }

        #[test]
        fn test_failure_policy_serde() {
            assert_eq!(
                serde_json::to_string(&FailurePolicy::FailFast).unwrap(),
                "\"fail_fast\""
            );
            assert_eq!(
                serde_json::from_str::<FailurePolicy>("\"isolate\"").unwrap(),
                FailurePolicy::Isolate
            );
        }
    }
}
