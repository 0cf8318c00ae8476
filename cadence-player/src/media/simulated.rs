//! Simulated media backends
//!
//! Model known-duration media against the engine clock: a loaded source
//! becomes ready after a configurable latency, plays while unpaused and
//! reports `Ended` once its duration has elapsed. Used by the headless
//! binary (where a remote UI renders the actual media from SSE events) and
//! by tests, which observe backend state through a shared [`SimulatedProbe`].

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use super::{AudioBackend, MediaError, MediaSignal, MediaSource, PlayOrigin, VideoBackend};

/// Observable backend state
#[derive(Debug, Clone, Default)]
pub struct SimulatedState {
    pub source: Option<MediaSource>,
    pub ready: bool,
    pub playing: bool,
    pub position_ms: u64,
    pub volume: f32,
    pub loads: usize,
    pub unloads: usize,
    pub play_attempts: usize,
    pub rewinds: usize,
    pub visible: bool,
    pub faded_out: bool,
    pub thumbnail_progress: Option<f32>,

    /// Delay between `load` and `Ready`
    pub load_latency_ms: u64,
    /// Sources that fail to load
    pub failing_urls: Vec<String>,
    /// Refuse `Automatic` plays until a user gesture unlocks playback
    pub autoplay_blocked: bool,
    /// Length assumed for sources that carry no duration
    pub default_duration_ms: Option<u64>,

    latency_left_ms: u64,
    signalled: bool,
}

/// Shared handle onto a simulated backend's state
pub type SimulatedProbe = Arc<Mutex<SimulatedState>>;

#[derive(Debug, Clone, Default)]
struct SimulatedMedia {
    state: SimulatedProbe,
}

impl SimulatedMedia {
    fn lock(&self) -> MutexGuard<'_, SimulatedState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn load(&self, source: &MediaSource) {
        let mut s = self.lock();
        s.loads += 1;
        s.source = Some(source.clone());
        s.ready = false;
        s.playing = false;
        s.position_ms = 0;
        s.latency_left_ms = s.load_latency_ms;
        s.signalled = false;
    }

    fn play(&self, origin: PlayOrigin) -> Result<(), MediaError> {
        let mut s = self.lock();
        s.play_attempts += 1;
        if s.source.is_none() {
            return Err(MediaError::NotLoaded);
        }
        match origin {
            PlayOrigin::UserGesture => s.autoplay_blocked = false,
            PlayOrigin::Automatic if s.autoplay_blocked => return Err(MediaError::AutoplayBlocked),
            PlayOrigin::Automatic => {}
        }
        if !s.ready {
            return Err(MediaError::NotReady);
        }
        let finished = s
            .source
            .as_ref()
            .and_then(|src| src.duration_ms)
            .or(s.default_duration_ms)
            .map_or(false, |d| s.position_ms >= d);
        if finished {
            s.position_ms = 0;
        }
        s.playing = true;
        Ok(())
    }

    fn pause(&self) {
        self.lock().playing = false;
    }

    fn unload(&self) {
        let mut s = self.lock();
        if s.source.take().is_some() {
            s.unloads += 1;
        }
        s.ready = false;
        s.playing = false;
        s.position_ms = 0;
    }

    fn poll(&self, elapsed_ms: u64) -> Vec<MediaSignal> {
        let mut s = self.lock();
        let mut signals = Vec::new();
        let Some(source) = s.source.clone() else {
            return signals;
        };

        if !s.ready {
            if s.signalled {
                return signals;
            }
            if s.failing_urls.iter().any(|u| u == &source.url) {
                s.signalled = true;
                debug!(url = %source.url, "simulated load failure");
                signals.push(MediaSignal::Error(MediaError::Load(format!(
                    "cannot load {}",
                    source.url
                ))));
                return signals;
            }
            s.latency_left_ms = s.latency_left_ms.saturating_sub(elapsed_ms);
            if s.latency_left_ms == 0 {
                s.ready = true;
                signals.push(MediaSignal::Ready);
            }
            return signals;
        }

        if s.playing {
            s.position_ms += elapsed_ms;
            if let Some(duration) = source.duration_ms.or(s.default_duration_ms) {
                if s.position_ms >= duration {
                    s.position_ms = duration;
                    s.playing = false;
                    signals.push(MediaSignal::Ended);
                }
            }
        }
        signals
    }
}

/// Simulated audio element
#[derive(Debug, Clone)]
pub struct SimulatedAudioBackend {
    media: SimulatedMedia,
}

impl Default for SimulatedAudioBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedAudioBackend {
    pub fn new() -> Self {
        let media = SimulatedMedia::default();
        media.lock().volume = 1.0;
        Self { media }
    }

    pub fn with_load_latency(self, latency_ms: u64) -> Self {
        self.media.lock().load_latency_ms = latency_ms;
        self
    }

    pub fn with_autoplay_blocked(self) -> Self {
        self.media.lock().autoplay_blocked = true;
        self
    }

    pub fn with_failing_url(self, url: &str) -> Self {
        self.media.lock().failing_urls.push(url.to_string());
        self
    }

    /// Shared view of the backend state
    pub fn probe(&self) -> SimulatedProbe {
        Arc::clone(&self.media.state)
    }
}

impl AudioBackend for SimulatedAudioBackend {
    fn load(&mut self, source: &MediaSource) {
        self.media.load(source);
    }

    fn play(&mut self, origin: PlayOrigin) -> Result<(), MediaError> {
        self.media.play(origin)
    }

    fn pause(&mut self) {
        self.media.pause();
    }

    fn set_volume(&mut self, volume: f32) {
        self.media.lock().volume = volume.clamp(0.0, 1.0);
    }

    fn unload(&mut self) {
        self.media.unload();
    }

    fn poll(&mut self, elapsed_ms: u64) -> Vec<MediaSignal> {
        self.media.poll(elapsed_ms)
    }
}

/// Simulated video surface
#[derive(Debug, Clone, Default)]
pub struct SimulatedVideoBackend {
    media: SimulatedMedia,
}

impl SimulatedVideoBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_load_latency(self, latency_ms: u64) -> Self {
        self.media.lock().load_latency_ms = latency_ms;
        self
    }

    pub fn with_failing_url(self, url: &str) -> Self {
        self.media.lock().failing_urls.push(url.to_string());
        self
    }

    /// Clip length used when the source has no known duration
    pub fn with_clip_duration(self, duration_ms: u64) -> Self {
        self.media.lock().default_duration_ms = Some(duration_ms);
        self
    }

    pub fn probe(&self) -> SimulatedProbe {
        Arc::clone(&self.media.state)
    }
}

impl VideoBackend for SimulatedVideoBackend {
    fn load(&mut self, source: &MediaSource) {
        self.media.load(source);
        let mut s = self.media.lock();
        s.visible = true;
        s.faded_out = false;
        s.thumbnail_progress = None;
    }

    fn show_thumbnail(&mut self, progress: f32) {
        let mut s = self.media.lock();
        s.visible = true;
        s.thumbnail_progress = Some(progress.clamp(0.0, 1.0));
    }

    fn rewind(&mut self) {
        let mut s = self.media.lock();
        s.rewinds += 1;
        s.position_ms = 0;
        s.thumbnail_progress = None;
    }

    fn play(&mut self, origin: PlayOrigin) -> Result<(), MediaError> {
        self.media.play(origin)
    }

    fn pause(&mut self) {
        self.media.pause();
    }

    fn fade_out(&mut self) {
        self.media.lock().faded_out = true;
    }

    fn hide(&mut self) {
        let mut s = self.media.lock();
        s.visible = false;
        s.playing = false;
    }

    fn unload(&mut self) {
        self.media.unload();
        let mut s = self.media.lock();
        s.visible = false;
        s.thumbnail_progress = None;
    }

    fn poll(&mut self, elapsed_ms: u64) -> Vec<MediaSignal> {
        self.media.poll(elapsed_ms)
    }
}
