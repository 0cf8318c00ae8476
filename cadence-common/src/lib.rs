//! # Cadence Common Library
//!
//! Shared code for the Cadence class player:
//! - Class data model (segments, music playlists, validation)
//! - Event types (CadenceEvent enum) and the EventBus
//! - Bootstrap configuration resolution
//! - Fade curve definitions
//! - Time formatting helpers

pub mod class;
pub mod config;
pub mod error;
pub mod events;
pub mod fade_curves;
pub mod human_time;
pub mod time;

pub use class::{
    ClassDefinition, ClassPlaylists, MusicPlaylist, MusicTrack, PlaylistCategory, Segment,
    SegmentKind, Voiceover,
};
pub use error::{Error, Result};
pub use fade_curves::FadeCurve;
