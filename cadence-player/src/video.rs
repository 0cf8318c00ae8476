//! Video reveal sequencer
//!
//! Drives the demonstration-video surface for the current segment:
//!
//! ```text
//! exercise + video:   Thumbnail --(reveal steps)--> Video --ended--> Holding --hold--> FadedOut
//! other + video:      Video --ended--> Holding --hold--> FadedOut
//! no video:           None
//! any load/play error:                 Hidden
//! ```
//!
//! Timing lives in the engine's scheduler; this type only reacts to reveal
//! steps, hold expiry and backend signals. Errors never propagate: they are
//! logged and the surface is hidden.

use cadence_common::events::VideoPhase;
use cadence_common::Segment;
use serde::Serialize;
use tracing::{debug, warn};

use crate::media::{MediaError, MediaSignal, MediaSource, PlayOrigin, VideoBackend};

/// Which timer the engine must arm after a segment change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealPlan {
    /// Nothing to schedule
    None,
    /// Arm the repeating reveal-step timer
    Thumbnail,
    /// Playback already requested
    Immediate,
}

/// Outcome of a backend signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoOutcome {
    /// Clip ended; arm the hold timer
    HoldStarted,
    /// Surface hidden after an error
    Hidden,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoSnapshot {
    pub phase: VideoPhase,
    /// Thumbnail progress (0.0-1.0)
    pub reveal_progress: f32,
    pub url: Option<String>,
}

pub struct VideoReveal {
    backend: Box<dyn VideoBackend>,
    phase: VideoPhase,
    url: Option<String>,
    steps_done: u32,
    total_steps: u32,
    paused: bool,
    released: bool,
}

impl VideoReveal {
    pub fn new(backend: Box<dyn VideoBackend>, reveal_steps: u32) -> Self {
        Self {
            backend,
            phase: VideoPhase::None,
            url: None,
            steps_done: 0,
            total_steps: reveal_steps.max(1),
            paused: false,
            released: false,
        }
    }

    pub fn phase(&self) -> VideoPhase {
        self.phase
    }

    pub fn reveal_progress(&self) -> f32 {
        self.steps_done as f32 / self.total_steps as f32
    }

    /// Prepare the surface for a newly current segment
    pub fn enter_segment(&mut self, segment: &Segment) -> RevealPlan {
        if self.released {
            return RevealPlan::None;
        }
        self.steps_done = 0;

        let Some(url) = segment.demo_video_url.clone() else {
            if self.url.take().is_some() {
                self.backend.unload();
            }
            self.backend.hide();
            self.phase = VideoPhase::None;
            return RevealPlan::None;
        };

        self.backend.load(&MediaSource::new(url.clone(), None));
        self.url = Some(url);

        if segment.kind.is_exercise() {
            self.backend.show_thumbnail(0.0);
            self.phase = VideoPhase::Thumbnail;
            RevealPlan::Thumbnail
        } else {
            self.start_video();
            RevealPlan::Immediate
        }
    }

    /// One reveal increment; returns true once the video has been revealed
    pub fn reveal_step(&mut self) -> bool {
        if self.phase != VideoPhase::Thumbnail {
            return true;
        }
        self.steps_done = (self.steps_done + 1).min(self.total_steps);
        self.backend.show_thumbnail(self.reveal_progress());
        if self.steps_done < self.total_steps {
            return false;
        }
        self.start_video();
        true
    }

    fn start_video(&mut self) {
        self.phase = VideoPhase::Video;
        self.backend.rewind();
        if !self.paused {
            self.try_play();
        }
    }

    fn try_play(&mut self) {
        match self.backend.play(PlayOrigin::Automatic) {
            // Deferred until the ready signal
            Ok(()) | Err(MediaError::NotReady) => {}
            Err(e) => self.fail(e),
        }
    }

    fn fail(&mut self, error: MediaError) {
        warn!(url = self.url.as_deref().unwrap_or(""), "Demo video failed: {}", error);
        self.backend.hide();
        self.phase = VideoPhase::Hidden;
    }

    /// Final-frame hold elapsed
    pub fn hold_elapsed(&mut self) {
        if self.phase == VideoPhase::Holding {
            self.backend.fade_out();
            self.phase = VideoPhase::FadedOut;
        }
    }

    pub fn pause(&mut self) {
        self.paused = true;
        if self.phase == VideoPhase::Video {
            self.backend.pause();
        }
    }

    pub fn resume(&mut self) {
        self.paused = false;
        if self.phase == VideoPhase::Video {
            self.try_play();
        }
    }

    /// Poll the backend; errors hide the surface, the end starts the hold
    pub fn poll(&mut self, elapsed_ms: u64) -> Option<VideoOutcome> {
        if self.released || self.url.is_none() {
            return None;
        }
        let mut outcome = None;
        for signal in self.backend.poll(elapsed_ms) {
            match signal {
                MediaSignal::Ready => {
                    debug!("Demo video ready");
                    if self.phase == VideoPhase::Video && !self.paused {
                        self.try_play();
                        if self.phase == VideoPhase::Hidden {
                            outcome = Some(VideoOutcome::Hidden);
                        }
                    }
                }
                MediaSignal::Ended => {
                    if self.phase == VideoPhase::Video {
                        self.phase = VideoPhase::Holding;
                        outcome = Some(VideoOutcome::HoldStarted);
                    }
                }
                MediaSignal::Error(e) => {
                    if self.phase != VideoPhase::Hidden {
                        self.fail(e);
                        outcome = Some(VideoOutcome::Hidden);
                    }
                }
            }
        }
        outcome
    }

    /// Unload the surface (teardown); idempotent
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if self.url.take().is_some() {
            self.backend.unload();
        }
        self.backend.hide();
    }

    pub fn snapshot(&self) -> VideoSnapshot {
        VideoSnapshot {
            phase: self.phase,
            reveal_progress: self.reveal_progress(),
            url: self.url.clone(),
        }
    }
}
