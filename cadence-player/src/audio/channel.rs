//! Audio channel controller
//!
//! Wraps one [`AudioBackend`] and tracks what the engine needs to know about
//! it: loaded source, readiness, whether playback is wanted, whether the
//! runtime refused autoplay, and the current volume with an optional ramp.
//!
//! Playback requested before the backend is ready is remembered and started
//! on the `Ready` signal, so "not yet ready" never stalls the caller.

use cadence_common::events::AudioChannelKind;
use cadence_common::FadeCurve;
use serde::Serialize;
use tracing::{debug, warn};

use crate::media::{AudioBackend, MediaError, MediaSignal, MediaSource, PlayOrigin};

/// Volume ramp in flight
#[derive(Debug, Clone)]
struct VolumeFade {
    from: f32,
    to: f32,
    duration_ms: u64,
    elapsed_ms: u64,
    curve: FadeCurve,
}

impl VolumeFade {
    fn volume_at(&self, elapsed_ms: u64) -> f32 {
        if self.duration_ms == 0 {
            return self.to;
        }
        let position = (elapsed_ms as f32 / self.duration_ms as f32).min(1.0);
        self.curve.interpolate(self.from, self.to, position)
    }
}

/// What a backend signal meant for the channel
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    /// Source finished playing
    Ended,
    /// Source failed; treated like an end by the director
    Failed(MediaError),
    /// Deferred play was refused by the runtime
    Blocked,
}

/// Observable channel state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelStatus {
    pub channel: AudioChannelKind,
    pub source_url: Option<String>,
    pub volume: f32,
    pub ready: bool,
    pub playing: bool,
    /// Autoplay was refused; waiting for a user gesture
    pub blocked: bool,
    pub fading: bool,
}

/// One audio channel (music or voice-over)
pub struct AudioChannel {
    kind: AudioChannelKind,
    backend: Box<dyn AudioBackend>,
    source: Option<MediaSource>,
    ready: bool,
    playing: bool,
    want_playing: bool,
    /// Set once playback actually started; cleared on end, failure or unload
    started: bool,
    /// Source played to its end; only a new load plays again
    finished: bool,
    blocked: bool,
    volume: f32,
    fade: Option<VolumeFade>,
}

impl AudioChannel {
    pub fn new(kind: AudioChannelKind, mut backend: Box<dyn AudioBackend>, volume: f32) -> Self {
        backend.set_volume(volume);
        Self {
            kind,
            backend,
            source: None,
            ready: false,
            playing: false,
            want_playing: false,
            started: false,
            finished: false,
            blocked: false,
            volume,
            fade: None,
        }
    }

    pub fn kind(&self) -> AudioChannelKind {
        self.kind
    }

    /// Replace the source; playback intent is kept
    pub fn load(&mut self, source: MediaSource) {
        debug!(channel = %self.kind, url = %source.url, "loading audio source");
        self.backend.load(&source);
        self.source = Some(source);
        self.ready = false;
        self.playing = false;
        self.started = false;
        self.finished = false;
    }

    /// Request playback
    ///
    /// Returns `Err(AutoplayBlocked)` when the runtime refused; every other
    /// outcome (deferred until ready, already playing, started) is `Ok`.
    pub fn play(&mut self, origin: PlayOrigin) -> Result<(), MediaError> {
        self.want_playing = true;
        if self.source.is_none() || !self.ready || self.playing || self.finished {
            return Ok(());
        }
        self.start(origin)
    }

    fn start(&mut self, origin: PlayOrigin) -> Result<(), MediaError> {
        match self.backend.play(origin) {
            Ok(()) => {
                self.playing = true;
                self.started = true;
                self.blocked = false;
                Ok(())
            }
            Err(MediaError::AutoplayBlocked) => {
                debug!(channel = %self.kind, "autoplay refused by runtime");
                self.blocked = true;
                Err(MediaError::AutoplayBlocked)
            }
            Err(e) => {
                warn!(channel = %self.kind, "audio play failed: {}", e);
                Ok(())
            }
        }
    }

    pub fn pause(&mut self) {
        self.want_playing = false;
        if self.playing {
            self.backend.pause();
            self.playing = false;
        }
    }

    /// Stop and release the source, cancelling any ramp
    pub fn unload(&mut self) {
        if self.source.take().is_some() {
            self.backend.unload();
        }
        self.ready = false;
        self.playing = false;
        self.started = false;
        self.finished = false;
        self.blocked = false;
        self.fade = None;
    }

    /// Start a ramp from the current volume, replacing any ramp in flight
    pub fn fade_to(&mut self, target: f32, duration_ms: u64, curve: FadeCurve) {
        let target = target.clamp(0.0, 1.0);
        if duration_ms == 0 {
            self.fade = None;
            self.apply_volume(target);
            return;
        }
        self.fade = Some(VolumeFade {
            from: self.volume,
            to: target,
            duration_ms,
            elapsed_ms: 0,
            curve,
        });
    }

    /// Advance the ramp; returns true while it is still running
    pub fn step_fade(&mut self, elapsed_ms: u64) -> bool {
        let Some(fade) = self.fade.as_mut() else {
            return false;
        };
        fade.elapsed_ms += elapsed_ms;
        let volume = fade.volume_at(fade.elapsed_ms);
        let done = fade.elapsed_ms >= fade.duration_ms;
        self.apply_volume(volume);
        if done {
            self.fade = None;
        }
        !done
    }

    fn apply_volume(&mut self, volume: f32) {
        self.volume = volume;
        self.backend.set_volume(volume);
    }

    /// Volume the channel is at or heading for
    pub fn target_volume(&self) -> f32 {
        self.fade.as_ref().map_or(self.volume, |f| f.to)
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn is_fading(&self) -> bool {
        self.fade.is_some()
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Playback has begun and the source has not finished
    pub fn is_active(&self) -> bool {
        self.started
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked
    }

    /// Source played through to its end
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn has_source(&self) -> bool {
        self.source.is_some()
    }

    pub fn wants_playing(&self) -> bool {
        self.want_playing
    }

    /// Poll the backend and fold its signals into channel state
    pub fn poll(&mut self, elapsed_ms: u64) -> Vec<ChannelEvent> {
        let signals = self.backend.poll(elapsed_ms);
        signals
            .into_iter()
            .filter_map(|signal| self.handle_signal(signal))
            .collect()
    }

    fn handle_signal(&mut self, signal: MediaSignal) -> Option<ChannelEvent> {
        self.source.as_ref()?;
        match signal {
            MediaSignal::Ready => {
                self.ready = true;
                if self.want_playing && !self.playing && !self.finished {
                    if let Err(MediaError::AutoplayBlocked) = self.start(PlayOrigin::Automatic) {
                        return Some(ChannelEvent::Blocked);
                    }
                }
                None
            }
            MediaSignal::Ended => {
                self.playing = false;
                self.started = false;
                self.finished = true;
                Some(ChannelEvent::Ended)
            }
            MediaSignal::Error(e) => {
                warn!(
                    channel = %self.kind,
                    url = self.source.as_ref().map(|s| s.url.as_str()).unwrap_or(""),
                    "audio error: {}",
                    e
                );
                self.playing = false;
                self.started = false;
                self.ready = false;
                Some(ChannelEvent::Failed(e))
            }
        }
    }

    pub fn status(&self) -> ChannelStatus {
        ChannelStatus {
            channel: self.kind,
            source_url: self.source.as_ref().map(|s| s.url.clone()),
            volume: self.volume,
            ready: self.ready,
            playing: self.playing,
            blocked: self.blocked,
            fading: self.is_fading(),
        }
    }
}
