//! Current playlist/video selection and playlist search.

use crate::playlist::{Playlist, PlaylistVideo};

/// Which playlist and video the user is looking at.
///
/// Selecting a playlist always clears the selected video, so a video
/// selection never outlives the playlist it was picked from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    playlist: Option<Playlist>,
    video: Option<PlaylistVideo>,
}

impl Selection {
    /// Empty selection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a playlist and clear the selected video.
    pub fn select_playlist(&mut self, playlist: Playlist) {
        self.playlist = Some(playlist);
        self.video = None;
    }

    /// Select a video.
    ///
    /// Membership in the current playlist is not checked; callers offer only
    /// the active playlist's videos.
    pub fn select_video(&mut self, video: PlaylistVideo) {
        self.video = Some(video);
    }

    /// Clear both selections.
    pub fn clear(&mut self) {
        self.playlist = None;
        self.video = None;
    }

    /// Selected playlist.
    #[must_use]
    pub const fn playlist(&self) -> Option<&Playlist> {
        self.playlist.as_ref()
    }

    /// Selected video.
    #[must_use]
    pub const fn video(&self) -> Option<&PlaylistVideo> {
        self.video.as_ref()
    }

    /// Select the first playlist and its video at `default_video_index`,
    /// when present. Nothing is selected for an empty list.
    pub fn auto_select(&mut self, playlists: &[Playlist], default_video_index: usize) {
        let Some(first) = playlists.first() else {
            self.clear();
            return;
        };

        self.select_playlist(first.clone());
        if let Some(video) = first.videos.get(default_video_index) {
            self.select_video(video.clone());
        }
    }
}

/// Playlists whose name contains `term`, ignoring case. A blank term
/// matches everything.
#[must_use]
pub fn filter_playlists<'a>(playlists: &'a [Playlist], term: &str) -> Vec<&'a Playlist> {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return playlists.iter().collect();
    }

    playlists
        .iter()
        .filter(|p| p.name.to_lowercase().contains(&term))
        .collect()
}
