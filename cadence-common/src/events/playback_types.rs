//! Playback-related type definitions
//!
//! Supporting enums for engine status, navigation causes and media phases.

use serde::{Deserialize, Serialize};

/// Segment sequencer status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackStatus {
    /// Constructed, first tick not yet run
    #[default]
    Idle,
    /// Counting down
    Running,
    /// Countdown and scroll frozen
    Paused,
    /// Ran off the end of the class (terminal)
    Completed,
    /// User left the class (terminal)
    Exited,
}

impl PlaybackStatus {
    /// Completed and Exited accept no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, PlaybackStatus::Completed | PlaybackStatus::Exited)
    }
}

impl std::fmt::Display for PlaybackStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackStatus::Idle => write!(f, "idle"),
            PlaybackStatus::Running => write!(f, "running"),
            PlaybackStatus::Paused => write!(f, "paused"),
            PlaybackStatus::Completed => write!(f, "completed"),
            PlaybackStatus::Exited => write!(f, "exited"),
        }
    }
}

/// Why the current segment changed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransitionCause {
    /// First segment at engine start
    Start,
    /// Countdown reached zero
    Natural,
    /// `next()` from the host
    SkipForward,
    /// `previous()` from the host
    SkipBack,
}

/// Which of the two audio channels an event concerns
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AudioChannelKind {
    Music,
    Voiceover,
}

impl std::fmt::Display for AudioChannelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AudioChannelKind::Music => write!(f, "music"),
            AudioChannelKind::Voiceover => write!(f, "voiceover"),
        }
    }
}

/// Demonstration video surface phase for the current segment
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum VideoPhase {
    /// Segment has no demonstration video
    #[default]
    None,
    /// Placeholder with progress indicator
    Thumbnail,
    /// Clip playing (or waiting for its ready signal)
    Video,
    /// Clip ended; final frame held
    Holding,
    /// Final frame faded out
    FadedOut,
    /// Load or playback failed; surface hidden
    Hidden,
}
