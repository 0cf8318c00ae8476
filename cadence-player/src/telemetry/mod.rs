//! Session & telemetry tracking
//!
//! The tracker lives inside the engine and only ever calls a non-blocking
//! sink. Delivery to the remote collector happens in a separate dispatcher
//! task, so analytics failures can never affect playback.

pub mod dispatcher;
pub mod reports;
pub mod sink;
pub mod tracker;

pub use dispatcher::{DispatchStats, TelemetryClient, TelemetryDispatcher, TelemetryError};
pub use reports::{DeviceContext, PlaybackCounters, SectionEndReason, TelemetryReport};
pub use sink::{ChannelSink, NullSink, TelemetrySink};
pub use tracker::{SessionContext, SessionTracker};
