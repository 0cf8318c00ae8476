//! Telemetry report payloads
//!
//! The engine identifies sessions and sections by locally generated UUIDs so
//! it never waits for the collector. The dispatcher maps them to the ids the
//! collector hands back.

use cadence_common::SegmentKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Why a section event closed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionEndReason {
    /// Superseded by a natural, countdown-driven advance
    Completed,
    SkippedForward,
    SkippedBack,
    /// Explicit exit or engine teardown
    Exited,
}

impl std::fmt::Display for SectionEndReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SectionEndReason::Completed => write!(f, "completed"),
            SectionEndReason::SkippedForward => write!(f, "skipped_forward"),
            SectionEndReason::SkippedBack => write!(f, "skipped_back"),
            SectionEndReason::Exited => write!(f, "exited"),
        }
    }
}

/// Device/context metadata sent with session-start
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceContext {
    pub platform: String,
    pub arch: String,
    pub app_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,
}

impl Default for DeviceContext {
    fn default() -> Self {
        Self {
            platform: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            client: None,
        }
    }
}

/// Navigation and pause counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackCounters {
    pub pause_count: u32,
    pub skip_count: u32,
    pub rewind_count: u32,
}

/// One fire-and-forget report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "report", rename_all = "snake_case")]
pub enum TelemetryReport {
    SessionStart {
        session: Uuid,
        user_id: Option<String>,
        class_id: Option<String>,
        segment_count: usize,
        device: DeviceContext,
        started_at: DateTime<Utc>,
    },
    Heartbeat {
        session: Uuid,
        play_duration_seconds: u64,
        current_index: usize,
        counters: PlaybackCounters,
        sent_at: DateTime<Utc>,
    },
    SessionEnd {
        session: Uuid,
        play_duration_seconds: u64,
        was_completed: bool,
        max_segment_index_reached: usize,
        counters: PlaybackCounters,
        ended_at: DateTime<Utc>,
    },
    SectionStart {
        session: Uuid,
        section: Uuid,
        kind: SegmentKind,
        segment_index: usize,
        planned_duration_seconds: u32,
        started_at: DateTime<Utc>,
    },
    SectionEnd {
        session: Uuid,
        section: Uuid,
        reason: SectionEndReason,
        ended_at: DateTime<Utc>,
    },
}

impl TelemetryReport {
    pub fn kind(&self) -> &'static str {
        match self {
            TelemetryReport::SessionStart { .. } => "session_start",
            TelemetryReport::Heartbeat { .. } => "heartbeat",
            TelemetryReport::SessionEnd { .. } => "session_end",
            TelemetryReport::SectionStart { .. } => "section_start",
            TelemetryReport::SectionEnd { .. } => "section_end",
        }
    }

    /// Local session id every report belongs to
    pub fn session(&self) -> Uuid {
        match self {
            TelemetryReport::SessionStart { session, .. }
            | TelemetryReport::Heartbeat { session, .. }
            | TelemetryReport::SessionEnd { session, .. }
            | TelemetryReport::SectionStart { session, .. }
            | TelemetryReport::SectionEnd { session, .. } => *session,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_end_wire_format() {
        let report = TelemetryReport::SectionEnd {
            session: Uuid::new_v4(),
            section: Uuid::new_v4(),
            reason: SectionEndReason::SkippedForward,
            ended_at: Utc::now(),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["report"], "section_end");
        assert_eq!(json["reason"], "skipped_forward");
        assert_eq!(report.kind(), "section_end");
    }

    #[test]
    fn test_section_start_carries_kind_name() {
        let report = TelemetryReport::SectionStart {
            session: Uuid::new_v4(),
            section: Uuid::new_v4(),
            kind: SegmentKind::ClosingMeditation,
            segment_index: 6,
            planned_duration_seconds: 120,
            started_at: Utc::now(),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["kind"], "closing-meditation");
    }
}
