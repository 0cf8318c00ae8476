//! Telemetry sinks
//!
//! `submit` must return immediately: the engine calls it from timer handlers
//! and never waits on delivery.

use tokio::sync::mpsc;
use tracing::warn;

use super::reports::TelemetryReport;

/// Non-blocking destination for reports
pub trait TelemetrySink: Send {
    fn submit(&self, report: TelemetryReport);
}

/// Queues reports for a [`TelemetryDispatcher`](super::TelemetryDispatcher)
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<TelemetryReport>,
}

impl ChannelSink {
    /// Create a sink and the receiver the dispatcher drains
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<TelemetryReport>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

impl TelemetrySink for ChannelSink {
    fn submit(&self, report: TelemetryReport) {
        if let Err(e) = self.tx.try_send(report) {
            let (reason, report) = match e {
                mpsc::error::TrySendError::Full(r) => ("queue full", r),
                mpsc::error::TrySendError::Closed(r) => ("dispatcher stopped", r),
            };
            warn!("Dropping {} telemetry report: {}", report.kind(), reason);
        }
    }
}

/// Discards everything (telemetry disabled)
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl TelemetrySink for NullSink {
    fn submit(&self, _report: TelemetryReport) {}
}
