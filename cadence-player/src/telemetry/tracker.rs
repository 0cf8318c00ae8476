//! Session & section tracker
//!
//! **Responsibilities:**
//! - Open the play session at engine start and close it exactly once
//! - Accumulate play duration (one second per unpaused countdown tick)
//! - Emit heartbeats carrying duration, index and counters
//! - Keep at most one section event open; close it before the next opens
//!
//! All reports go through a [`TelemetrySink`], which never blocks. Closing a
//! section or the session a second time is a silent no-op.

use cadence_common::{ClassDefinition, Segment};
use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use super::reports::{DeviceContext, PlaybackCounters, SectionEndReason, TelemetryReport};
use super::sink::TelemetrySink;

#[derive(Debug, Clone)]
struct OpenSection {
    id: Uuid,
    index: usize,
}

/// Session-level identity supplied by the host
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    pub user_id: Option<String>,
    pub device: DeviceContext,
}

pub struct SessionTracker {
    sink: Box<dyn TelemetrySink>,
    session_id: Uuid,
    context: SessionContext,
    opened: bool,
    closed: bool,
    play_duration_seconds: u64,
    max_index_reached: usize,
    open_section: Option<OpenSection>,
    sections_closed: usize,
    heartbeats_sent: usize,
}

impl SessionTracker {
    pub fn new(sink: Box<dyn TelemetrySink>, context: SessionContext) -> Self {
        Self {
            sink,
            session_id: Uuid::new_v4(),
            context,
            opened: false,
            closed: false,
            play_duration_seconds: 0,
            max_index_reached: 0,
            open_section: None,
            sections_closed: 0,
            heartbeats_sent: 0,
        }
    }

    /// Local session id
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn open_session(&mut self, class: &ClassDefinition) {
        if self.opened {
            return;
        }
        self.opened = true;
        info!("Play session {} opened", self.session_id);
        self.sink.submit(TelemetryReport::SessionStart {
            session: self.session_id,
            user_id: self.context.user_id.clone(),
            class_id: class.class_id.clone(),
            segment_count: class.segments.len(),
            device: self.context.device.clone(),
            started_at: Utc::now(),
        });
    }

    /// One unpaused second of play
    pub fn record_second(&mut self) {
        if self.opened && !self.closed {
            self.play_duration_seconds += 1;
        }
    }

    pub fn play_duration_seconds(&self) -> u64 {
        self.play_duration_seconds
    }

    pub fn heartbeat(&mut self, current_index: usize, counters: PlaybackCounters) {
        if !self.opened || self.closed {
            return;
        }
        self.heartbeats_sent += 1;
        debug!(
            duration = self.play_duration_seconds,
            index = current_index,
            "heartbeat"
        );
        self.sink.submit(TelemetryReport::Heartbeat {
            session: self.session_id,
            play_duration_seconds: self.play_duration_seconds,
            current_index,
            counters,
            sent_at: Utc::now(),
        });
    }

    pub fn heartbeats_sent(&self) -> usize {
        self.heartbeats_sent
    }

    /// Close any open section, then open one for `segment` unless it is a transition
    pub fn enter_segment(&mut self, index: usize, segment: &Segment, previous_reason: SectionEndReason) {
        if !self.opened || self.closed {
            return;
        }
        self.close_section(previous_reason);
        self.max_index_reached = self.max_index_reached.max(index);

        if segment.kind.is_transition() {
            return;
        }
        let id = Uuid::new_v4();
        debug!("Section {} opened for segment {} ({})", id, index, segment.kind);
        self.open_section = Some(OpenSection { id, index });
        self.sink.submit(TelemetryReport::SectionStart {
            session: self.session_id,
            section: id,
            kind: segment.kind,
            segment_index: index,
            planned_duration_seconds: segment.nominal_duration_seconds,
            started_at: Utc::now(),
        });
    }

    /// Close the open section, if any; returns whether one was closed
    pub fn close_section(&mut self, reason: SectionEndReason) -> bool {
        let Some(section) = self.open_section.take() else {
            return false;
        };
        debug!("Section {} (segment {}) closed: {}", section.id, section.index, reason);
        self.sections_closed += 1;
        self.sink.submit(TelemetryReport::SectionEnd {
            session: self.session_id,
            section: section.id,
            reason,
            ended_at: Utc::now(),
        });
        true
    }

    pub fn has_open_section(&self) -> bool {
        self.open_section.is_some()
    }

    pub fn sections_closed(&self) -> usize {
        self.sections_closed
    }

    /// Close the session; returns false if it was already closed
    ///
    /// `max_segment_index_reached` is the furthest index visited for a
    /// completed run and the current index otherwise.
    pub fn close_session(&mut self, was_completed: bool, current_index: usize, counters: PlaybackCounters) -> bool {
        if !self.opened || self.closed {
            return false;
        }
        self.closed = true;
        let max_segment_index_reached = if was_completed {
            self.max_index_reached
        } else {
            current_index
        };
        info!(
            "Play session {} closed (completed: {}, {}s played)",
            self.session_id, was_completed, self.play_duration_seconds
        );
        self.sink.submit(TelemetryReport::SessionEnd {
            session: self.session_id,
            play_duration_seconds: self.play_duration_seconds,
            was_completed,
            max_segment_index_reached,
            counters,
            ended_at: Utc::now(),
        });
        true
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}
