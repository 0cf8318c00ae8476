//! # Cadence Player Library (cadence-player)
//!
//! Segment playback engine for guided exercise classes.
//!
//! **Purpose:** Sequence a class's timed segments, keep background music,
//! voice-over, demonstration video and narrative scroll in step with the
//! countdown, and report session telemetry without ever blocking playback.
//!
//! **Architecture:** One synchronous engine on a cooperative logical-timer
//! scheduler, driven by a tokio task and controlled over HTTP/SSE.

pub mod api;
pub mod audio;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod media;
pub mod narrative;
pub mod playback;
pub mod scheduler;
pub mod telemetry;
pub mod video;

pub use config::PlayerConfig;
pub use error::{Error, Result};
pub use playback::{EngineHandle, EngineRuntime, PlaybackEngine, PlaybackSnapshot};
