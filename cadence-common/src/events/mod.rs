//! Event types for the Cadence event system
//!
//! Provides the shared event definitions and the EventBus used by the
//! playback engine to notify hosts (SSE clients, embedding UIs, loggers).

mod playback_types;
mod shared_types;

pub use playback_types::{AudioChannelKind, PlaybackStatus, TransitionCause, VideoPhase};
pub use shared_types::{SegmentInfo, TrackInfo};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Cadence engine events
///
/// Events are broadcast via EventBus and can be serialized for SSE
/// transmission. Observers must never be able to stall playback, so every
/// emit from the engine is lossy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CadenceEvent {
    /// Engine started its first segment
    ClassStarted {
        /// Local play-session id
        session_id: Uuid,
        segment_count: usize,
        /// Sum of nominal durations
        total_seconds: u64,
        timestamp: DateTime<Utc>,
    },

    /// A new segment became current
    ///
    /// Triggers:
    /// - SSE: swap narrative, title and countdown
    /// - Telemetry: section event bookkeeping (internal)
    SegmentChanged {
        segment: SegmentInfo,
        /// Countdown reloaded from the segment's nominal duration
        remaining_seconds: u32,
        cause: TransitionCause,
        timestamp: DateTime<Utc>,
    },

    /// Countdown moved by one logical second
    Countdown {
        index: usize,
        remaining_seconds: u32,
        /// Class progress in [0, 1]
        progress: f64,
        timestamp: DateTime<Utc>,
    },

    /// Running ↔ Paused
    PlaybackStateChanged {
        old_state: PlaybackStatus,
        new_state: PlaybackStatus,
        timestamp: DateTime<Utc>,
    },

    /// Music channel switched to a new track
    MusicTrackChanged {
        track: TrackInfo,
        timestamp: DateTime<Utc>,
    },

    /// Music started (ducked = true) or stopped ducking under a voice-over
    DuckingChanged {
        ducked: bool,
        /// Volume the running fade is heading for
        target_volume: f32,
        timestamp: DateTime<Utc>,
    },

    /// Demonstration video surface changed phase
    VideoPhaseChanged {
        index: usize,
        phase: VideoPhase,
        timestamp: DateTime<Utc>,
    },

    /// Runtime refused unsolicited playback; host should offer "enable audio"
    AudioBlocked {
        channel: AudioChannelKind,
        timestamp: DateTime<Utc>,
    },

    /// Class ran to its end
    ClassCompleted {
        session_id: Uuid,
        play_duration_seconds: u64,
        timestamp: DateTime<Utc>,
    },

    /// User left the class
    ClassExited {
        session_id: Uuid,
        index: usize,
        play_duration_seconds: u64,
        timestamp: DateTime<Utc>,
    },
}

impl CadenceEvent {
    /// Event type string, used as the SSE `event:` field
    pub fn event_type(&self) -> &'static str {
        match self {
            CadenceEvent::ClassStarted { .. } => "ClassStarted",
            CadenceEvent::SegmentChanged { .. } => "SegmentChanged",
            CadenceEvent::Countdown { .. } => "Countdown",
            CadenceEvent::PlaybackStateChanged { .. } => "PlaybackStateChanged",
            CadenceEvent::MusicTrackChanged { .. } => "MusicTrackChanged",
            CadenceEvent::DuckingChanged { .. } => "DuckingChanged",
            CadenceEvent::VideoPhaseChanged { .. } => "VideoPhaseChanged",
            CadenceEvent::AudioBlocked { .. } => "AudioBlocked",
            CadenceEvent::ClassCompleted { .. } => "ClassCompleted",
            CadenceEvent::ClassExited { .. } => "ClassExited",
        }
    }
}

// ========================================
// EventBus Implementation
// ========================================

/// Central event distribution bus
///
/// The EventBus uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Automatic cleanup when subscribers drop
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use cadence_common::events::{CadenceEvent, EventBus, PlaybackStatus};
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit_lossy(CadenceEvent::PlaybackStateChanged {
///     old_state: PlaybackStatus::Running,
///     new_state: PlaybackStatus::Paused,
///     timestamp: chrono::Utc::now(),
/// });
///
/// assert!(rx.try_recv().is_ok());
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<CadenceEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// Capacity is the number of events buffered per subscriber before the
    /// oldest are dropped. Countdown events arrive once per second, so a few
    /// hundred is plenty for interactive hosts.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<CadenceEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists,
    /// `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: CadenceEvent,
    ) -> Result<usize, broadcast::error::SendError<CadenceEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: CadenceEvent) {
        let _ = self.tx.send(event);
    }

    /// Current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
