//! Canonical video ID extraction.
//!
//! Accepts any of the URL forms people paste into a sheet and reduces them
//! to the 11-character video ID.
//!
//! # Supported Inputs
//!
//! - `https://www.youtube.com/watch?v=dQw4w9WgXcQ` - Watch URL
//! - `https://youtu.be/dQw4w9WgXcQ` - Short link
//! - `https://www.youtube.com/shorts/dQw4w9WgXcQ` - Shorts URL
//! - `https://www.youtube.com/embed/dQw4w9WgXcQ` - Embed URL
//! - `dQw4w9WgXcQ` - Bare ID

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};

/// Length of a canonical video ID.
pub const VIDEO_ID_LEN: usize = 11;

#[allow(clippy::expect_used)]
static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/shorts/|youtube\.com/embed/)([a-zA-Z0-9_-]{11})",
    )
    .expect("video URL pattern is valid")
});

#[allow(clippy::expect_used)]
static BARE_ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-zA-Z0-9_-]{11})$").expect("bare video ID pattern is valid")
});

/// Extract the canonical video ID from a URL or bare ID.
///
/// URL forms are tried before the bare-ID form; the first match wins.
///
/// # Examples
///
/// ```rust
/// use tubeshelf_core::video_id::extract_video_id;
///
/// let id = extract_video_id("https://youtu.be/dQw4w9WgXcQ").unwrap();
/// assert_eq!(id, "dQw4w9WgXcQ");
///
/// assert!(extract_video_id("not a url").is_err());
/// ```
pub fn extract_video_id(input: &str) -> Result<String> {
    let input = input.trim();

    [&*URL_PATTERN, &*BARE_ID_PATTERN]
        .iter()
        .find_map(|pattern| pattern.captures(input))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| Error::InvalidIdentifier {
            input: input.to_string(),
        })
}

/// Build the watch URL for a canonical video ID.
#[must_use]
pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={video_id}")
}
