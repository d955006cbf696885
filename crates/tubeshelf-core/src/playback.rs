//! Playback session analytics.
//!
//! The embedded player is an opaque [`PlayerHandle`]; it reports state
//! changes, and [`PlaybackSession`] turns them into named analytics events
//! delivered to an [`AnalyticsSink`].
//!
//! | Trigger                 | Event                  |
//! |-------------------------|------------------------|
//! | state → playing         | `video_started`        |
//! | state → paused          | `video_paused`         |
//! | state → ended           | `video_completed`      |
//! | mute / unmute toggle    | `video_muted` / `video_unmuted` |
//! | fullscreen button       | `fullscreen_clicked`   |
//! | session teardown        | `video_watch_duration` |

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Value, json};
use tokio::time::Instant;
use tracing::{debug, info};

use crate::playlist::PlaylistVideo;

/// Player states, as reported by the embedded player's numeric codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    /// -1: not started yet.
    Unstarted,
    /// 0: playback reached the end.
    Ended,
    /// 1: playing.
    Playing,
    /// 2: paused.
    Paused,
    /// 3: buffering.
    Buffering,
    /// 5: cued and ready.
    Cued,
}

impl PlayerState {
    /// Map a player state code.
    #[must_use]
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            -1 => Some(Self::Unstarted),
            0 => Some(Self::Ended),
            1 => Some(Self::Playing),
            2 => Some(Self::Paused),
            3 => Some(Self::Buffering),
            5 => Some(Self::Cued),
            _ => None,
        }
    }
}

/// Video fields attached to analytics events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoContext {
    /// Video ID.
    pub video_id: String,
    /// Video title.
    pub video_title: String,
    /// Channel name, empty if unknown.
    pub channel_title: String,
    /// Owning playlist name, `"Unknown"` if not known.
    pub playlist_name: String,
}

impl From<&PlaylistVideo> for VideoContext {
    fn from(video: &PlaylistVideo) -> Self {
        Self {
            video_id: video.id.clone(),
            video_title: video.title.clone(),
            channel_title: video.channel_title.clone().unwrap_or_default(),
            playlist_name: video.display_playlist_name().to_string(),
        }
    }
}

/// An analytics event.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalyticsEvent {
    /// Playback started or resumed.
    VideoStarted(VideoContext),
    /// Playback paused.
    VideoPaused {
        /// Video being played.
        video: VideoContext,
        /// Playback position in seconds.
        paused_at: f64,
    },
    /// Playback reached the end.
    VideoCompleted(VideoContext),
    /// Player muted.
    VideoMuted {
        /// Video ID.
        video_id: String,
    },
    /// Player unmuted.
    VideoUnmuted {
        /// Video ID.
        video_id: String,
    },
    /// Fullscreen requested.
    FullscreenClicked {
        /// Video ID.
        video_id: String,
    },
    /// Emitted once when the session ends.
    VideoWatchDuration {
        /// Video being played.
        video: VideoContext,
        /// Wall-clock seconds since playback last started, rounded.
        seconds_watched: u64,
        /// Last playback position the player reported.
        last_known_timestamp: Option<f64>,
    },
}

impl AnalyticsEvent {
    /// Event name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::VideoStarted(_) => "video_started",
            Self::VideoPaused { .. } => "video_paused",
            Self::VideoCompleted(_) => "video_completed",
            Self::VideoMuted { .. } => "video_muted",
            Self::VideoUnmuted { .. } => "video_unmuted",
            Self::FullscreenClicked { .. } => "fullscreen_clicked",
            Self::VideoWatchDuration { .. } => "video_watch_duration",
        }
    }

    /// Event parameters as a JSON object.
    #[must_use]
    pub fn payload(&self) -> Value {
        match self {
            Self::VideoStarted(video) | Self::VideoCompleted(video) => json!(video),
            Self::VideoPaused { video, paused_at } => {
                let mut payload = json!(video);
                payload["pausedAt"] = json!(paused_at);
                payload
            }
            Self::VideoMuted { video_id }
            | Self::VideoUnmuted { video_id }
            | Self::FullscreenClicked { video_id } => json!({ "videoId": video_id }),
            Self::VideoWatchDuration {
                video,
                seconds_watched,
                last_known_timestamp,
            } => {
                let mut payload = json!(video);
                payload["secondsWatched"] = json!(seconds_watched);
                payload["lastKnownTimestamp"] = json!(last_known_timestamp);
                payload
            }
        }
    }
}

/// Destination for analytics events.
#[cfg_attr(test, mockall::automock)]
pub trait AnalyticsSink: Send + Sync {
    /// Record one event.
    fn record(&self, event: &AnalyticsEvent);
}

/// Writes events to the `analytics` tracing target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAnalytics;

impl AnalyticsSink for TracingAnalytics {
    fn record(&self, event: &AnalyticsEvent) {
        info!(target: "analytics", event = event.name(), payload = %event.payload());
    }
}

/// Drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAnalytics;

impl AnalyticsSink for NoopAnalytics {
    fn record(&self, _event: &AnalyticsEvent) {}
}

/// Controls exposed by the embedded player.
#[cfg_attr(test, mockall::automock)]
pub trait PlayerHandle: Send {
    /// Current playback position in seconds, if the player knows it.
    fn current_time(&self) -> Option<f64>;
    /// Mute audio.
    fn mute(&mut self);
    /// Unmute audio.
    fn unmute(&mut self);
    /// Switch the player to fullscreen.
    fn request_fullscreen(&mut self);
}

/// Analytics bookkeeping for one video being watched.
///
/// Ending the session (explicitly or by dropping it) reports the watch
/// duration, once.
pub struct PlaybackSession {
    video: VideoContext,
    analytics: Arc<dyn AnalyticsSink>,
    player: Option<Box<dyn PlayerHandle>>,
    muted: bool,
    started_at: Option<Instant>,
}

impl PlaybackSession {
    /// Start a session for `video`.
    pub fn new(video: &PlaylistVideo, analytics: Arc<dyn AnalyticsSink>) -> Self {
        Self {
            video: VideoContext::from(video),
            analytics,
            player: None,
            muted: false,
            started_at: None,
        }
    }

    /// The player finished loading.
    pub fn on_ready(&mut self, player: Box<dyn PlayerHandle>) {
        debug!("Player ready for {}", self.video.video_id);
        self.player = Some(player);
    }

    /// Handle a raw player state code. Unknown codes are ignored.
    pub fn on_state_code(&mut self, code: i32) {
        match PlayerState::from_code(code) {
            Some(state) => self.on_state_change(state),
            None => debug!("Ignoring unknown player state {}", code),
        }
    }

    /// Handle a player state change.
    pub fn on_state_change(&mut self, state: PlayerState) {
        match state {
            PlayerState::Playing => {
                self.emit(AnalyticsEvent::VideoStarted(self.video.clone()));
                self.started_at = Some(Instant::now());
            }
            PlayerState::Paused => {
                let paused_at = self.current_time().unwrap_or(0.0);
                self.emit(AnalyticsEvent::VideoPaused {
                    video: self.video.clone(),
                    paused_at,
                });
            }
            PlayerState::Ended => {
                self.emit(AnalyticsEvent::VideoCompleted(self.video.clone()));
            }
            PlayerState::Unstarted | PlayerState::Buffering | PlayerState::Cued => {}
        }
    }

    /// Toggle mute. Does nothing before the player is ready.
    ///
    /// Returns whether the player is muted afterwards.
    pub fn toggle_mute(&mut self) -> bool {
        let Some(player) = self.player.as_mut() else {
            return self.muted;
        };

        let event = if self.muted {
            player.unmute();
            AnalyticsEvent::VideoUnmuted {
                video_id: self.video.video_id.clone(),
            }
        } else {
            player.mute();
            AnalyticsEvent::VideoMuted {
                video_id: self.video.video_id.clone(),
            }
        };
        self.muted = !self.muted;
        self.emit(event);
        self.muted
    }

    /// Request fullscreen. Does nothing before the player is ready.
    pub fn enter_fullscreen(&mut self) {
        let Some(player) = self.player.as_mut() else {
            return;
        };
        player.request_fullscreen();
        self.emit(AnalyticsEvent::FullscreenClicked {
            video_id: self.video.video_id.clone(),
        });
    }

    /// Whether the player is muted.
    #[must_use]
    pub const fn is_muted(&self) -> bool {
        self.muted
    }

    /// End the session, reporting how long the video was watched.
    ///
    /// Reports only if playback started and the player is attached, and
    /// only the first time it is called.
    pub fn teardown(&mut self) {
        if self.player.is_none() {
            return;
        }
        let Some(started_at) = self.started_at.take() else {
            return;
        };

        let seconds_watched = started_at.elapsed().as_secs_f64().round() as u64;
        let last_known_timestamp = self.current_time();
        self.emit(AnalyticsEvent::VideoWatchDuration {
            video: self.video.clone(),
            seconds_watched,
            last_known_timestamp,
        });
    }

    fn current_time(&self) -> Option<f64> {
        self.player.as_ref().and_then(|p| p.current_time())
    }

    fn emit(&self, event: AnalyticsEvent) {
        self.analytics.record(&event);
    }
}

impl Drop for PlaybackSession {
    fn drop(&mut self) {
        self.teardown();
    }
}
