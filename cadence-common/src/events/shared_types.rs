//! Shared type definitions for event data

use serde::{Deserialize, Serialize};

use crate::class::{MusicTrack, PlaylistCategory, Segment, SegmentKind};

/// Segment summary carried by events and snapshots
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SegmentInfo {
    /// Position in the class (0-based)
    pub index: usize,
    pub kind: SegmentKind,
    pub display_name: String,
    pub nominal_duration_seconds: u32,
    pub has_voiceover: bool,
    pub has_demo_video: bool,
}

impl SegmentInfo {
    pub fn from_segment(index: usize, segment: &Segment) -> Self {
        Self {
            index,
            kind: segment.kind,
            display_name: segment.display_name.clone(),
            nominal_duration_seconds: segment.nominal_duration_seconds,
            has_voiceover: segment.active_voiceover().is_some(),
            has_demo_video: segment.has_demo_video(),
        }
    }
}

/// Music track summary for events and snapshots
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrackInfo {
    pub category: PlaylistCategory,
    pub playlist_id: String,
    pub track_index: usize,
    pub audio_url: String,
    pub title: String,
}

impl TrackInfo {
    pub fn new(
        category: PlaylistCategory,
        playlist_id: &str,
        track_index: usize,
        track: &MusicTrack,
    ) -> Self {
        Self {
            category,
            playlist_id: playlist_id.to_string(),
            track_index,
            audio_url: track.audio_url.clone(),
            title: track.display_title().to_string(),
        }
    }
}
