//! Audio playback: channel controllers and the dual-channel director

pub mod channel;
pub mod director;

pub use channel::{AudioChannel, ChannelEvent, ChannelStatus};
pub use director::{AudioDirector, AudioSnapshot, DirectorEvent, DuckingSettings};
