//! Observable engine state
//!
//! One serializable value with everything a host UI renders: segment,
//! countdown, pause flag, per-channel audio state, video phase and scroll.

use cadence_common::events::{PlaybackStatus, SegmentInfo};
use serde::Serialize;
use uuid::Uuid;

use super::sequencer::PlaybackState;
use crate::audio::AudioSnapshot;
use crate::narrative::ScrollSnapshot;
use crate::video::VideoSnapshot;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaybackSnapshot {
    pub session_id: Uuid,
    pub status: PlaybackStatus,
    pub segment: SegmentInfo,
    pub segment_count: usize,
    pub remaining_seconds: u32,
    /// Countdown formatted for display (`M:SS`)
    pub remaining_display: String,
    pub progress: f64,
    pub state: PlaybackState,
    pub needs_exit_confirmation: bool,
    pub play_duration_seconds: u64,
    pub audio: AudioSnapshot,
    pub video: VideoSnapshot,
    pub scroll: ScrollSnapshot,
    /// Engine clock in milliseconds since construction
    pub clock_ms: u64,
}

impl PlaybackSnapshot {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
