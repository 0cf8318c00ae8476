//! Telemetry dispatcher
//!
//! Drains the [`ChannelSink`](super::ChannelSink) queue in a tokio task and
//! posts each report to the collector, in order:
//!
//! | Report        | Request                              | Response      |
//! |---------------|--------------------------------------|---------------|
//! | session start | `POST {base}/sessions`               | `{"id": ...}` |
//! | heartbeat     | `POST {base}/sessions/{id}/heartbeat`|               |
//! | session end   | `POST {base}/sessions/{id}/end`      |               |
//! | section start | `POST {base}/sections`               | `{"id": ...}` |
//! | section end   | `POST {base}/sections/{id}/end`      |               |
//!
//! Reports whose parent was never acknowledged (failed session-start or
//! section-start) are dropped with a warning. Nothing is retried. The task
//! ends once every sink has been dropped and the queue is empty, so reports
//! submitted during engine teardown are still delivered.

use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::reports::TelemetryReport;

const USER_AGENT: &str = concat!("cadence-player/", env!("CARGO_PKG_VERSION"));

/// Telemetry client errors
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Collector returned {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("No collector id for {0} (parent report failed)")]
    MissingParent(Uuid),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CollectorId {
    Text(String),
    Number(i64),
}

#[derive(Debug, Deserialize)]
struct CreatedResponse {
    id: CollectorId,
}

/// Collector HTTP client
#[derive(Debug, Clone)]
pub struct TelemetryClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl TelemetryClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TelemetryError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| TelemetryError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn send(&self, path: &str, body: &Value) -> Result<reqwest::Response, TelemetryError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http_client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| TelemetryError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(TelemetryError::ApiError(status.as_u16(), text));
        }
        Ok(response)
    }

    /// POST expecting a collector-issued id back
    async fn create(&self, path: &str, body: &Value) -> Result<String, TelemetryError> {
        let created: CreatedResponse = self
            .send(path, body)
            .await?
            .json()
            .await
            .map_err(|e| TelemetryError::ParseError(e.to_string()))?;
        Ok(match created.id {
            CollectorId::Text(id) => id,
            CollectorId::Number(id) => id.to_string(),
        })
    }

    async fn post(&self, path: &str, body: &Value) -> Result<(), TelemetryError> {
        self.send(path, body).await.map(|_| ())
    }
}

/// Delivery totals, returned when the dispatcher stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub delivered: usize,
    pub failed: usize,
}

pub struct TelemetryDispatcher {
    client: TelemetryClient,
    rx: mpsc::Receiver<TelemetryReport>,
    sessions: HashMap<Uuid, String>,
    sections: HashMap<Uuid, String>,
    stats: DispatchStats,
}

impl TelemetryDispatcher {
    pub fn new(client: TelemetryClient, rx: mpsc::Receiver<TelemetryReport>) -> Self {
        Self {
            client,
            rx,
            sessions: HashMap::new(),
            sections: HashMap::new(),
            stats: DispatchStats::default(),
        }
    }

    /// Run on the current tokio runtime
    pub fn spawn(self) -> JoinHandle<DispatchStats> {
        tokio::spawn(self.run())
    }

    pub async fn run(mut self) -> DispatchStats {
        info!("Telemetry dispatcher started ({})", self.client.base_url);
        while let Some(report) = self.rx.recv().await {
            let kind = report.kind();
            match self.deliver(report).await {
                Ok(()) => {
                    self.stats.delivered += 1;
                    debug!("Delivered {} report", kind);
                }
                Err(e) => {
                    self.stats.failed += 1;
                    warn!("Telemetry {} report failed: {}", kind, e);
                }
            }
        }
        info!(
            "Telemetry dispatcher stopped ({} delivered, {} failed)",
            self.stats.delivered, self.stats.failed
        );
        self.stats
    }

    fn session_id(&self, local: Uuid) -> Result<String, TelemetryError> {
        self.sessions
            .get(&local)
            .cloned()
            .ok_or(TelemetryError::MissingParent(local))
    }

    async fn deliver(&mut self, report: TelemetryReport) -> Result<(), TelemetryError> {
        match report {
            TelemetryReport::SessionStart {
                session,
                user_id,
                class_id,
                segment_count,
                device,
                started_at,
            } => {
                let body = json!({
                    "user_id": user_id,
                    "class_id": class_id,
                    "segment_count": segment_count,
                    "device": device,
                    "started_at": started_at,
                });
                let remote = self.client.create("/sessions", &body).await?;
                self.sessions.insert(session, remote);
            }
            TelemetryReport::Heartbeat {
                session,
                play_duration_seconds,
                current_index,
                counters,
                sent_at,
            } => {
                let remote = self.session_id(session)?;
                let body = json!({
                    "play_duration_seconds": play_duration_seconds,
                    "current_index": current_index,
                    "pause_count": counters.pause_count,
                    "skip_count": counters.skip_count,
                    "rewind_count": counters.rewind_count,
                    "sent_at": sent_at,
                });
                self.client
                    .post(&format!("/sessions/{}/heartbeat", remote), &body)
                    .await?;
            }
            TelemetryReport::SessionEnd {
                session,
                play_duration_seconds,
                was_completed,
                max_segment_index_reached,
                counters,
                ended_at,
            } => {
                let remote = self.session_id(session)?;
                self.sessions.remove(&session);
                let body = json!({
                    "play_duration_seconds": play_duration_seconds,
                    "was_completed": was_completed,
                    "max_segment_index_reached": max_segment_index_reached,
                    "pause_count": counters.pause_count,
                    "skip_count": counters.skip_count,
                    "rewind_count": counters.rewind_count,
                    "ended_at": ended_at,
                });
                self.client
                    .post(&format!("/sessions/{}/end", remote), &body)
                    .await?;
            }
            TelemetryReport::SectionStart {
                session,
                section,
                kind,
                segment_index,
                planned_duration_seconds,
                started_at,
            } => {
                let remote_session = self.session_id(session)?;
                let body = json!({
                    "session_id": remote_session,
                    "kind": kind,
                    "segment_index": segment_index,
                    "planned_duration_seconds": planned_duration_seconds,
                    "started_at": started_at,
                });
                let remote = self.client.create("/sections", &body).await?;
                self.sections.insert(section, remote);
            }
            TelemetryReport::SectionEnd {
                section,
                reason,
                ended_at,
                ..
            } => {
                let remote = self
                    .sections
                    .remove(&section)
                    .ok_or(TelemetryError::MissingParent(section))?;
                let body = json!({
                    "reason": reason,
                    "ended_at": ended_at,
                });
                self.client
                    .post(&format!("/sections/{}/end", remote), &body)
                    .await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = TelemetryClient::new("http://127.0.0.1:9/v1/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url, "http://127.0.0.1:9/v1");
    }

    #[test]
    fn test_collector_id_accepts_numbers_and_strings() {
        let text: CreatedResponse = serde_json::from_str(r#"{"id": "abc"}"#).unwrap();
        let number: CreatedResponse = serde_json::from_str(r#"{"id": 42}"#).unwrap();
        assert!(matches!(text.id, CollectorId::Text(ref s) if s == "abc"));
        assert!(matches!(number.id, CollectorId::Number(42)));
    }

    #[tokio::test]
    async fn test_unreachable_collector_counts_failures() {
        // Port 9 (discard) is not listening on test hosts
        let client = TelemetryClient::new("http://127.0.0.1:9", Duration::from_millis(200)).unwrap();
        let (tx, rx) = mpsc::channel(8);
        let session = Uuid::new_v4();
        tx.send(TelemetryReport::Heartbeat {
            session,
            play_duration_seconds: 1,
            current_index: 0,
            counters: Default::default(),
            sent_at: chrono::Utc::now(),
        })
        .await
        .unwrap();
        drop(tx);

        let stats = TelemetryDispatcher::new(client, rx).run().await;
        // Heartbeat without an acknowledged session is dropped before any request
        assert_eq!(stats, DispatchStats { delivered: 0, failed: 1 });
    }
}
