//! Segment sequencing and the playback engine

pub mod engine;
pub mod runtime;
pub mod sequencer;
pub mod snapshot;

pub use engine::{CompletionHook, EndKind, EngineBuilder, PlaybackEngine, TimerKind};
pub use runtime::{CommandKind, EngineHandle, EngineRuntime};
pub use sequencer::{NavOutcome, PlaybackState, Sequencer, TickOutcome};
pub use snapshot::PlaybackSnapshot;
