//! Class definition data model
//!
//! A class arrives from the content store as already-formed data: an ordered
//! segment list plus up to two music playlists keyed by category. This module
//! parses and validates it; nothing here is mutated during playback.

mod playlist;
mod segment;

pub use playlist::{MusicPlaylist, MusicTrack, PlaylistCategory};
pub use segment::{Segment, SegmentKind, Voiceover};

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{Error, Result};

/// Music playlists available to a class, keyed by category
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassPlaylists {
    #[serde(default)]
    pub active: Option<MusicPlaylist>,
    #[serde(default)]
    pub resting: Option<MusicPlaylist>,
}

impl ClassPlaylists {
    /// Playlist for a category, if one was supplied
    pub fn get(&self, category: PlaylistCategory) -> Option<&MusicPlaylist> {
        match category {
            PlaylistCategory::Active => self.active.as_ref(),
            PlaylistCategory::Resting => self.resting.as_ref(),
        }
    }
}

/// A complete class ready for playback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDefinition {
    #[serde(default)]
    pub class_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    pub segments: Vec<Segment>,
    #[serde(default)]
    pub playlists: ClassPlaylists,
}

impl ClassDefinition {
    /// Build and validate a class from parts
    pub fn new(segments: Vec<Segment>, playlists: ClassPlaylists) -> Result<Self> {
        let class = Self {
            class_id: None,
            title: None,
            segments,
            playlists,
        };
        class.validate()?;
        Ok(class)
    }

    /// Parse a class definition from JSON
    pub fn from_json_str(json: &str) -> Result<Self> {
        let class: ClassDefinition = serde_json::from_str(json)?;
        class.validate()?;
        Ok(class)
    }

    /// Load a class definition from a JSON file
    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::NotFound(format!("class file {}", path.display()))
            } else {
                Error::Io(e)
            }
        })?;
        Self::from_json_str(&contents)
    }

    /// Structural checks that serde cannot express
    pub fn validate(&self) -> Result<()> {
        if self.segments.is_empty() {
            return Err(Error::InvalidClass("class has no segments".to_string()));
        }
        Ok(())
    }

    /// Sum of nominal segment durations in seconds
    pub fn total_nominal_seconds(&self) -> u64 {
        self.segments
            .iter()
            .map(|s| u64::from(s.nominal_duration_seconds))
            .sum()
    }

    /// Number of segments that produce section events
    pub fn tracked_segment_count(&self) -> usize {
        self.segments.iter().filter(|s| !s.kind.is_transition()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLASS_JSON: &str = r#"{
        "class_id": "c-42",
        "title": "Morning mobility",
        "segments": [
            {"kind": "preparation", "display_name": "Get ready", "nominal_duration_seconds": 10},
            {"kind": "exercise", "display_name": "Squats", "nominal_duration_seconds": 30,
             "demo_video_url": "https://cdn.example/squats.mp4"},
            {"kind": "transition", "nominal_duration_seconds": 5},
            {"kind": "cooldown", "display_name": "Stretch", "nominal_duration_seconds": 20,
             "voiceover": {"url": "https://cdn.example/stretch.mp3", "duration_seconds": 18}}
        ],
        "playlists": {
            "active": {"id": "up", "tracks": [{"audio_url": "a.mp3", "duration_seconds": 120}]},
            "resting": {"id": "calm", "tracks": [{"audio_url": "c.mp3", "duration_seconds": 200}]}
        }
    }"#;

    #[test]
    fn test_parse_full_class() {
        let class = ClassDefinition::from_json_str(CLASS_JSON).unwrap();
        assert_eq!(class.segments.len(), 4);
        assert_eq!(class.total_nominal_seconds(), 65);
        assert_eq!(class.tracked_segment_count(), 3);
        assert_eq!(class.playlists.get(PlaylistCategory::Resting).unwrap().id, "calm");
    }

    #[test]
    fn test_empty_segments_rejected() {
        let err = ClassDefinition::from_json_str(r#"{"segments": []}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidClass(_)));
    }

    #[test]
    fn test_missing_duration_is_fatal() {
        let err = ClassDefinition::from_json_str(
            r#"{"segments": [{"kind": "exercise", "display_name": "Lunges"}]}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("missing its duration"), "{}", err);
    }

    #[test]
    fn test_playlists_optional() {
        let class = ClassDefinition::from_json_str(
            r#"{"segments": [{"kind": "exercise", "nominal_duration_seconds": 5}]}"#,
        )
        .unwrap();
        assert!(class.playlists.get(PlaylistCategory::Active).is_none());
    }

    #[test]
    fn test_from_path_not_found() {
        let err = ClassDefinition::from_path(Path::new("/nonexistent/class.json")).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
