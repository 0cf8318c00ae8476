//! Background music playlists

use serde::{Deserialize, Serialize};

use crate::Error;

/// Playlist category, selected by the current segment's kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaylistCategory {
    /// Upbeat music for preparation, warm-up, exercises and transitions
    Active,
    /// Calm music for cooldown and closing segments
    Resting,
}

impl std::fmt::Display for PlaylistCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaylistCategory::Active => write!(f, "active"),
            PlaylistCategory::Resting => write!(f, "resting"),
        }
    }
}

/// One background music track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MusicTrack {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(alias = "audioUrl", alias = "url")]
    pub audio_url: String,
    #[serde(alias = "durationSeconds", alias = "duration")]
    pub duration_seconds: f64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub artist: Option<String>,
}

impl MusicTrack {
    /// Title for display, falling back to the URL's file name
    pub fn display_title(&self) -> &str {
        match &self.title {
            Some(title) => title,
            None => self
                .audio_url
                .rsplit('/')
                .next()
                .unwrap_or(self.audio_url.as_str()),
        }
    }
}

/// Ordered, non-empty list of tracks that loops indefinitely
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PlaylistRecord")]
pub struct MusicPlaylist {
    pub id: String,
    pub name: Option<String>,
    tracks: Vec<MusicTrack>,
}

impl MusicPlaylist {
    /// Build a playlist, rejecting an empty track list
    pub fn new(id: impl Into<String>, tracks: Vec<MusicTrack>) -> crate::Result<Self> {
        let id = id.into();
        if tracks.is_empty() {
            return Err(Error::InvalidClass(format!("playlist '{}' has no tracks", id)));
        }
        if let Some(bad) = tracks.iter().find(|t| t.audio_url.trim().is_empty()) {
            return Err(Error::InvalidClass(format!(
                "playlist '{}' has a track without an audio URL ({:?})",
                id, bad.title
            )));
        }
        Ok(Self { id, name: None, tracks })
    }

    pub fn tracks(&self) -> &[MusicTrack] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Always false for a constructed playlist; provided for API symmetry
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn track(&self, index: usize) -> Option<&MusicTrack> {
        self.tracks.get(index)
    }

    /// Index that follows `index`, wrapping to the start
    pub fn next_index(&self, index: usize) -> usize {
        (index + 1) % self.tracks.len()
    }
}

#[derive(Debug, Deserialize)]
struct PlaylistRecord {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    tracks: Vec<MusicTrack>,
}

impl TryFrom<PlaylistRecord> for MusicPlaylist {
    type Error = Error;

    fn try_from(record: PlaylistRecord) -> Result<Self, Self::Error> {
        let mut playlist = MusicPlaylist::new(record.id, record.tracks)?;
        playlist.name = record.name;
        Ok(playlist)
    }
}
