//! Video duration codec.
//!
//! The metadata API reports durations in the compact ISO-8601 form
//! (`PT1H2M3S`, `P1DT2H`), while the library displays them as `H:MM:SS`
//! or `M:SS`. The two directions are separate codecs: the display form is
//! not accepted back by [`parse_duration`].

use std::sync::LazyLock;

use regex::Regex;

#[allow(clippy::expect_used)]
static ISO_DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^P(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?)?$")
        .expect("duration pattern is valid")
});

/// Parse an ISO-8601 style duration (`PT#H#M#S`, optional `#D` day part)
/// into total seconds.
///
/// Missing components count as zero. Input that does not match the pattern
/// yields `0` rather than an error.
#[must_use]
pub fn parse_duration(iso: &str) -> u64 {
    let Some(caps) = ISO_DURATION_RE.captures(iso.trim()) else {
        return 0;
    };

    let component = |idx: usize| -> u64 {
        caps.get(idx)
            .and_then(|m| m.as_str().parse::<u64>().ok())
            .unwrap_or(0)
    };

    let days = component(1);
    let hours = component(2);
    let minutes = component(3);
    let seconds = component(4);

    days.saturating_mul(86_400)
        .saturating_add(hours.saturating_mul(3600))
        .saturating_add(minutes.saturating_mul(60))
        .saturating_add(seconds)
}

/// Format a number of seconds for display.
///
/// Produces `M:SS` below one hour and `H:MM:SS` from one hour on.
#[must_use]
pub fn format_duration(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    }
}
