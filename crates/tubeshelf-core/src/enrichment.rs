//! Video metadata lookup.
//!
//! The assembly pipeline only knows the [`VideoMetadataSource`] trait; the
//! production implementation, [`YouTubeDataApi`], queries the `YouTube` Data
//! API `videos` endpoint with a comma-joined batch of IDs.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::AppConfig;
use crate::error::{Error, Result};

/// The `videos` endpoint accepts at most this many IDs per request.
pub const MAX_IDS_PER_REQUEST: usize = 50;

/// Metadata returned for one video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct VideoDetails {
    /// Video ID the record belongs to.
    pub id: String,
    /// Video title.
    pub title: String,
    /// Channel/uploader name.
    pub channel_title: Option<String>,
    /// Medium-resolution thumbnail URL.
    pub thumbnail: Option<String>,
    /// ISO-8601 duration, e.g. `PT4M13S`.
    pub duration: Option<String>,
    /// Publication timestamp.
    pub published_at: Option<String>,
}

/// Source of video metadata, queried once per playlist with all its IDs.
///
/// Results may come back in any order and may omit IDs. A failure applies
/// to the whole batch.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VideoMetadataSource: Send + Sync {
    /// Fetch metadata for a batch of video IDs.
    async fn fetch_video_details(&self, ids: &[String]) -> Result<Vec<VideoDetails>>;
}

/// `YouTube` Data API v3 client.
#[derive(Debug, Clone)]
pub struct YouTubeDataApi {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl YouTubeDataApi {
    /// Create a client for the given API root and credential.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::network_error(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    /// Create a client from application config.
    ///
    /// Fails if no API key is configured.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| Error::Configuration("No API key configured".to_string()))?;

        Self::new(
            &config.api_base_url,
            api_key,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    fn videos_url(&self) -> String {
        format!("{}/videos", self.base_url)
    }

    async fn fetch_chunk(&self, ids: &[String]) -> Result<Vec<VideoDetails>> {
        let joined = ids.join(",");
        debug!("Requesting metadata for {} videos", ids.len());

        let response = self
            .client
            .get(self.videos_url())
            .query(&[
                ("part", "snippet,contentDetails"),
                ("id", joined.as_str()),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| Error::network_error(format!("Video metadata request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::network_error(format!("Failed to read metadata response: {e}")))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| body.chars().take(200).collect());
            warn!("Metadata API returned {}: {}", status, message);
            return Err(Error::network_error(format!(
                "Metadata API returned {status}: {message}"
            )));
        }

        parse_videos_response(&body)
    }
}

#[async_trait]
impl VideoMetadataSource for YouTubeDataApi {
    async fn fetch_video_details(&self, ids: &[String]) -> Result<Vec<VideoDetails>> {
        let mut details = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(MAX_IDS_PER_REQUEST) {
            details.extend(self.fetch_chunk(chunk).await?);
        }
        Ok(details)
    }
}

#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoItem {
    id: String,
    #[serde(default)]
    snippet: Option<Snippet>,
    #[serde(default)]
    content_details: Option<ContentDetails>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    #[serde(default)]
    title: String,
    channel_title: Option<String>,
    published_at: Option<String>,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Deserialize, Default)]
struct Thumbnails {
    medium: Option<Thumbnail>,
    high: Option<Thumbnail>,
    default: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ContentDetails {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// Decode a `videos` endpoint response body.
pub fn parse_videos_response(body: &str) -> Result<Vec<VideoDetails>> {
    let response: VideoListResponse = serde_json::from_str(body)?;

    Ok(response
        .items
        .into_iter()
        .map(|item| {
            let snippet = item.snippet;
            let (title, channel_title, published_at, thumbnail) = match snippet {
                Some(s) => {
                    let thumbnail = s
                        .thumbnails
                        .medium
                        .or(s.thumbnails.high)
                        .or(s.thumbnails.default)
                        .map(|t| t.url);
                    (s.title, s.channel_title, s.published_at, thumbnail)
                }
                None => (String::new(), None, None, None),
            };

            VideoDetails {
                title: if title.is_empty() { item.id.clone() } else { title },
                id: item.id,
                channel_title,
                thumbnail,
                duration: item.content_details.and_then(|c| c.duration),
                published_at,
            }
        })
        .collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    const SAMPLE_RESPONSE: &str = r#"{
        "kind": "youtube#videoListResponse",
        "items": [
            {
                "id": "abc12345678",
                "snippet": {
                    "title": "Part 1",
                    "channelTitle": "Algo Channel",
                    "publishedAt": "2024-01-02T03:04:05Z",
                    "thumbnails": {
                        "default": {"url": "https://i.ytimg.com/vi/abc12345678/default.jpg"},
                        "medium": {"url": "https://i.ytimg.com/vi/abc12345678/mqdefault.jpg"}
                    }
                },
                "contentDetails": {"duration": "PT12M5S"}
            },
            {
                "id": "dQw4w9WgXcQ",
                "snippet": {
                    "title": "Intro",
                    "thumbnails": {
                        "high": {"url": "https://i.ytimg.com/vi/dQw4w9WgXcQ/hqdefault.jpg"}
                    }
                }
            }
        ]
    }"#;

    /// Serve one canned HTTP response and hand back the raw request.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }

            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&request).into_owned()
        });

        (format!("http://{addr}"), handle)
    }

    mod parse_tests {
        use super::*;

        #[test]
        fn test_parse_sample_response() {
            let details = parse_videos_response(SAMPLE_RESPONSE).unwrap();
            assert_eq!(details.len(), 2);

            assert_eq!(details[0].id, "abc12345678");
            assert_eq!(details[0].title, "Part 1");
            assert_eq!(details[0].channel_title.as_deref(), Some("Algo Channel"));
            assert_eq!(
                details[0].thumbnail.as_deref(),
                Some("https://i.ytimg.com/vi/abc12345678/mqdefault.jpg")
            );
            assert_eq!(details[0].duration.as_deref(), Some("PT12M5S"));
            assert_eq!(
                details[0].published_at.as_deref(),
                Some("2024-01-02T03:04:05Z")
            );
        }

        #[test]
        fn test_parse_partial_item() {
            let details = parse_videos_response(SAMPLE_RESPONSE).unwrap();
            let intro = &details[1];
            assert_eq!(
                intro.thumbnail.as_deref(),
                Some("https://i.ytimg.com/vi/dQw4w9WgXcQ/hqdefault.jpg")
            );
            assert!(intro.duration.is_none());
            assert!(intro.channel_title.is_none());
        }

        #[test]
        fn test_parse_item_without_snippet() {
            let details = parse_videos_response(r#"{"items":[{"id":"abc12345678"}]}"#).unwrap();
            assert_eq!(details[0].title, "abc12345678");
        }

        #[test]
        fn test_parse_no_items() {
            assert!(parse_videos_response("{}").unwrap().is_empty());
        }

        #[test]
        fn test_parse_garbage() {
            assert!(matches!(
                parse_videos_response("<html>"),
                Err(Error::Serialization(_))
            ));
        }
    }

    mod client_tests {
        use super::*;

        #[test]
        fn test_from_config_requires_key() {
            let config = AppConfig::default();
            let err = YouTubeDataApi::from_config(&config).unwrap_err();
            assert!(matches!(err, Error::Configuration(_)));
        }

        #[test]
        fn test_base_url_trailing_slash_trimmed() {
            let api =
                YouTubeDataApi::new("https://example.com/v3/", "key", Duration::from_secs(1))
                    .unwrap();
            assert_eq!(api.videos_url(), "https://example.com/v3/videos");
        }

        #[tokio::test]
        async fn test_fetch_sends_batched_request() {
            let (base_url, server) = serve_once("200 OK", SAMPLE_RESPONSE).await;
            let api = YouTubeDataApi::new(base_url, "secret", Duration::from_secs(5)).unwrap();

            let ids = vec!["abc12345678".to_string(), "dQw4w9WgXcQ".to_string()];
            let details = api.fetch_video_details(&ids).await.unwrap();
            assert_eq!(details.len(), 2);

            let request = server.await.unwrap();
            let request_line = request.lines().next().unwrap();
            assert!(request_line.starts_with("GET /videos?"));
            assert!(request_line.contains("id=abc12345678%2CdQw4w9WgXcQ"));
            assert!(request_line.contains("key=secret"));
            assert!(request_line.contains("part=snippet%2CcontentDetails"));
        }

        #[tokio::test]
        async fn test_fetch_error_status() {
            let (base_url, server) = serve_once(
                "403 Forbidden",
                r#"{"error":{"code":403,"message":"API key not valid"}}"#,
            )
            .await;
            let api = YouTubeDataApi::new(base_url, "bad", Duration::from_secs(5)).unwrap();

            let err = api
                .fetch_video_details(&["abc12345678".to_string()])
                .await
                .unwrap_err();
            assert!(matches!(err, Error::Network(_)));
            assert!(err.to_string().contains("API key not valid"));
            server.await.unwrap();
        }

        #[tokio::test]
        async fn test_fetch_empty_batch_makes_no_request() {
            let api =
                YouTubeDataApi::new("http://127.0.0.1:9", "key", Duration::from_secs(1)).unwrap();
            assert!(api.fetch_video_details(&[]).await.unwrap().is_empty());
        }
    }
}
