//! Media backend contracts
//!
//! The engine never touches audio devices or video surfaces directly. Hosts
//! plug in backends implementing these traits; the engine drives them with
//! commands and pulls their notifications (`Ready`, `Ended`, `Error`) once
//! per scheduler step via `poll`. A backend that needs time to buffer simply
//! withholds `Ready`; the countdown keeps running regardless.

pub mod simulated;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use simulated::{SimulatedAudioBackend, SimulatedProbe, SimulatedState, SimulatedVideoBackend};

/// A playable resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaSource {
    pub url: String,
    /// Known length, when the catalog supplies one
    pub duration_ms: Option<u64>,
}

impl MediaSource {
    pub fn new(url: impl Into<String>, duration_ms: Option<u64>) -> Self {
        Self {
            url: url.into(),
            duration_ms,
        }
    }
}

/// Failures reported by media backends
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MediaError {
    /// Runtime refused playback without a user gesture
    #[error("Autoplay blocked by runtime")]
    AutoplayBlocked,

    #[error("Media not ready")]
    NotReady,

    #[error("No media loaded")]
    NotLoaded,

    #[error("Load failed: {0}")]
    Load(String),

    #[error("Playback failed: {0}")]
    Playback(String),
}

/// Asynchronous notification from a backend
#[derive(Debug, Clone, PartialEq)]
pub enum MediaSignal {
    /// Loaded resource can start playing
    Ready,
    /// Playback reached the end of the resource
    Ended,
    /// Load or playback failed
    Error(MediaError),
}

/// Who asked for playback to start
///
/// Runtimes that block unsolicited audio accept `UserGesture` plays and
/// may refuse `Automatic` ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOrigin {
    Automatic,
    UserGesture,
}

/// One audio element
pub trait AudioBackend: Send {
    /// Replace the current source; readiness is reported later via `poll`
    fn load(&mut self, source: &MediaSource);

    fn play(&mut self, origin: PlayOrigin) -> Result<(), MediaError>;

    fn pause(&mut self);

    /// Absolute output volume (0.0-1.0)
    fn set_volume(&mut self, volume: f32);

    /// Stop and release the source
    fn unload(&mut self);

    /// Advance backend time and collect pending notifications
    fn poll(&mut self, elapsed_ms: u64) -> Vec<MediaSignal>;
}

/// The demonstration video surface
pub trait VideoBackend: Send {
    fn load(&mut self, source: &MediaSource);

    /// Show the static placeholder with a progress indicator (0.0-1.0)
    fn show_thumbnail(&mut self, progress: f32);

    /// Reset playback position to zero
    fn rewind(&mut self);

    fn play(&mut self, origin: PlayOrigin) -> Result<(), MediaError>;

    fn pause(&mut self);

    /// Fade the held final frame out of view
    fn fade_out(&mut self);

    /// Remove the surface entirely
    fn hide(&mut self);

    fn unload(&mut self);

    fn poll(&mut self, elapsed_ms: u64) -> Vec<MediaSignal>;
}
