//! Test helpers for Cadence Player integration tests
//!
//! Provides reusable test infrastructure:
//! - RecordingSink: captures telemetry reports in submission order
//! - CountingWakeLock: counts acquire/release calls
//! - LoggedAudioBackend: simulated audio that records unloads
//! - OrderLog: one ordered log shared by the recorders above
//! - Class builders for common segment layouts

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use cadence_common::{
    ClassDefinition, ClassPlaylists, MusicPlaylist, MusicTrack, Segment, SegmentKind, Voiceover,
};
use cadence_player::lifecycle::{WakeLock, WakeLockError};
use cadence_player::media::{
    AudioBackend, MediaError, MediaSignal, MediaSource, PlayOrigin, SimulatedAudioBackend,
    SimulatedProbe,
};
use cadence_player::telemetry::{SectionEndReason, TelemetryReport, TelemetrySink};
use cadence_player::{PlaybackEngine, PlayerConfig};

// ========================================
// Ordered log
// ========================================

/// Ordered record of side effects across collaborators
#[derive(Clone, Default)]
pub struct OrderLog(Arc<Mutex<Vec<String>>>);

impl OrderLog {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}

// ========================================
// Telemetry
// ========================================

#[derive(Clone, Default)]
pub struct RecordingSink {
    reports: Arc<Mutex<Vec<TelemetryReport>>>,
    log: Option<OrderLog>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_log(log: OrderLog) -> Self {
        Self {
            reports: Arc::default(),
            log: Some(log),
        }
    }

    pub fn reports(&self) -> Vec<TelemetryReport> {
        self.reports.lock().unwrap().clone()
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        self.reports().iter().map(|r| r.kind()).collect()
    }

    pub fn count(&self, kind: &str) -> usize {
        self.kinds().iter().filter(|k| **k == kind).count()
    }

    pub fn section_end_reasons(&self) -> Vec<SectionEndReason> {
        self.reports()
            .into_iter()
            .filter_map(|r| match r {
                TelemetryReport::SectionEnd { reason, .. } => Some(reason),
                _ => None,
            })
            .collect()
    }

    /// `(was_completed, max_segment_index_reached, play_duration_seconds)`
    pub fn session_end(&self) -> Option<(bool, usize, u64)> {
        self.reports().into_iter().find_map(|r| match r {
            TelemetryReport::SessionEnd {
                was_completed,
                max_segment_index_reached,
                play_duration_seconds,
                ..
            } => Some((was_completed, max_segment_index_reached, play_duration_seconds)),
            _ => None,
        })
    }

    /// Play durations carried by heartbeats, in order
    pub fn heartbeat_durations(&self) -> Vec<u64> {
        self.reports()
            .into_iter()
            .filter_map(|r| match r {
                TelemetryReport::Heartbeat {
                    play_duration_seconds,
                    ..
                } => Some(play_duration_seconds),
                _ => None,
            })
            .collect()
    }
}

impl TelemetrySink for RecordingSink {
    fn submit(&self, report: TelemetryReport) {
        if let Some(log) = &self.log {
            log.push(format!("telemetry:{}", report.kind()));
        }
        self.reports.lock().unwrap().push(report);
    }
}

// ========================================
// Wake lock
// ========================================

#[derive(Clone, Default)]
pub struct CountingWakeLock {
    pub acquired: Arc<AtomicUsize>,
    pub released: Arc<AtomicUsize>,
    log: Option<OrderLog>,
}

impl CountingWakeLock {
    pub fn with_log(log: OrderLog) -> Self {
        Self {
            log: Some(log),
            ..Self::default()
        }
    }

    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

impl WakeLock for CountingWakeLock {
    fn acquire(&mut self) -> Result<(), WakeLockError> {
        self.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn release(&mut self) {
        if let Some(log) = &self.log {
            log.push("wake_lock:release");
        }
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

// ========================================
// Audio
// ========================================

/// Simulated audio backend that logs unloads under `name`
pub struct LoggedAudioBackend {
    inner: SimulatedAudioBackend,
    name: &'static str,
    log: OrderLog,
}

impl LoggedAudioBackend {
    pub fn new(name: &'static str, log: OrderLog) -> Self {
        Self {
            inner: SimulatedAudioBackend::new(),
            name,
            log,
        }
    }

    pub fn probe(&self) -> SimulatedProbe {
        self.inner.probe()
    }
}

impl AudioBackend for LoggedAudioBackend {
    fn load(&mut self, source: &MediaSource) {
        self.inner.load(source);
    }

    fn play(&mut self, origin: PlayOrigin) -> Result<(), MediaError> {
        self.inner.play(origin)
    }

    fn pause(&mut self) {
        self.inner.pause();
    }

    fn set_volume(&mut self, volume: f32) {
        self.inner.set_volume(volume);
    }

    fn unload(&mut self) {
        self.log.push(format!("audio:{}:unload", self.name));
        self.inner.unload();
    }

    fn poll(&mut self, elapsed_ms: u64) -> Vec<MediaSignal> {
        self.inner.poll(elapsed_ms)
    }
}

// ========================================
// Class builders
// ========================================

pub fn segment(kind: SegmentKind, seconds: u32) -> Segment {
    Segment {
        kind,
        display_name: format!("{} ({}s)", kind, seconds),
        narrative_text: "Stand tall\n\n[pause 2s]\nBreathe in slowly\nBreathe out".to_string(),
        nominal_duration_seconds: seconds,
        voiceover: None,
        demo_video_url: None,
    }
}

pub fn with_voiceover(mut segment: Segment, seconds: f64) -> Segment {
    segment.voiceover = Some(Voiceover {
        url: format!("https://cdn.test/vo/{}.mp3", segment.display_name.len()),
        duration_seconds: seconds,
        enabled: true,
    });
    segment
}

pub fn with_video(mut segment: Segment, url: &str) -> Segment {
    segment.demo_video_url = Some(url.to_string());
    segment
}

pub fn playlist(id: &str, tracks: usize, track_seconds: f64) -> MusicPlaylist {
    let tracks = (0..tracks)
        .map(|i| MusicTrack {
            id: Some(format!("{}-{}", id, i)),
            audio_url: format!("https://cdn.test/{}/{}.mp3", id, i),
            duration_seconds: track_seconds,
            title: Some(format!("{} track {}", id, i)),
            artist: None,
        })
        .collect();
    MusicPlaylist::new(id, tracks).unwrap()
}

pub fn class(segments: Vec<Segment>) -> ClassDefinition {
    ClassDefinition::new(segments, ClassPlaylists::default()).unwrap()
}

pub fn class_with_music(segments: Vec<Segment>, active: MusicPlaylist, resting: MusicPlaylist) -> ClassDefinition {
    ClassDefinition::new(
        segments,
        ClassPlaylists {
            active: Some(active),
            resting: Some(resting),
        },
    )
    .unwrap()
}

/// Exercise segments with the given durations, no media
pub fn exercise_class(durations: &[u32]) -> ClassDefinition {
    class(
        durations
            .iter()
            .map(|&d| segment(SegmentKind::Exercise, d))
            .collect(),
    )
}

/// Started engine with a recording sink and default collaborators
pub fn started_engine(class: ClassDefinition) -> (PlaybackEngine, RecordingSink) {
    let sink = RecordingSink::new();
    let mut engine = PlaybackEngine::builder(class, PlayerConfig::default())
        .telemetry_sink(sink.clone())
        .build()
        .unwrap();
    engine.start().unwrap();
    (engine, sink)
}
