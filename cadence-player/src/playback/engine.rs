//! Playback engine - orchestration hub
//!
//! **Responsibilities:**
//! - Own one sequencer, audio director, video reveal, scroll synchroniser,
//!   session tracker and lifecycle manager per class run
//! - Drive all of them from one cooperative [`Scheduler`] on a logical clock
//! - Pull media signals from the backends between timer firings
//! - Translate component outcomes into [`CadenceEvent`]s on the bus
//! - Tear everything down exactly once, in a fixed order
//!
//! The engine is synchronous and never sleeps. Callers move its clock with
//! [`PlaybackEngine::advance`]: tests with a virtual clock, production through
//! [`EngineRuntime`](super::EngineRuntime) and a tokio interval.

use std::time::Duration;

use cadence_common::events::{
    CadenceEvent, EventBus, PlaybackStatus, SegmentInfo, TransitionCause,
};
use cadence_common::human_time::format_countdown;
use cadence_common::time;
use cadence_common::ClassDefinition;
use tracing::{debug, info};

use super::sequencer::{NavOutcome, PlaybackState, Sequencer, TickOutcome};
use super::snapshot::PlaybackSnapshot;
use crate::audio::{AudioDirector, DirectorEvent, DuckingSettings};
use crate::config::PlayerConfig;
use crate::error::{Error, Result};
use crate::lifecycle::{NoopWakeLock, ResourceLifecycle, WakeLock};
use crate::media::{
    AudioBackend, PlayOrigin, SimulatedAudioBackend, SimulatedVideoBackend, VideoBackend,
};
use crate::narrative::{LineMetricsSurface, NarrativeSurface, ScrollSynchroniser};
use crate::scheduler::Scheduler;
use crate::telemetry::{NullSink, SectionEndReason, SessionContext, SessionTracker, TelemetrySink};
use crate::video::{RevealPlan, VideoOutcome, VideoReveal};

const SECOND_MS: u64 = 1000;

/// Logical timers
///
/// Declaration order is the tie-break for timers due at the same instant:
/// the countdown second always runs first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimerKind {
    Second,
    Heartbeat,
    ScrollLeadIn,
    ScrollFrame,
    RevealStep,
    VideoHold,
    /// Volume ramps keep running while paused
    Fade,
}

/// Host callback fired once when the class ends
pub type CompletionHook = Box<dyn FnOnce() + Send>;

/// How the run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndKind {
    /// Countdown ran off the last segment
    Completed,
    /// `next()` on the last segment
    SkippedPastEnd,
    /// Explicit user exit
    Exited,
    /// Host dropped or cancelled the engine
    TornDown,
}

/// Assembles an engine; every collaborator has a built-in default
pub struct EngineBuilder {
    class: ClassDefinition,
    config: PlayerConfig,
    music_backend: Option<Box<dyn AudioBackend>>,
    voiceover_backend: Option<Box<dyn AudioBackend>>,
    video_backend: Option<Box<dyn VideoBackend>>,
    surface: Option<Box<dyn NarrativeSurface>>,
    wake_lock: Option<Box<dyn WakeLock>>,
    sink: Option<Box<dyn TelemetrySink>>,
    session: SessionContext,
    events: Option<EventBus>,
    on_complete: Option<CompletionHook>,
    on_exit: Option<CompletionHook>,
}

impl EngineBuilder {
    pub fn new(class: ClassDefinition, config: PlayerConfig) -> Self {
        Self {
            class,
            config,
            music_backend: None,
            voiceover_backend: None,
            video_backend: None,
            surface: None,
            wake_lock: None,
            sink: None,
            session: SessionContext::default(),
            events: None,
            on_complete: None,
            on_exit: None,
        }
    }

    pub fn music_backend(mut self, backend: impl AudioBackend + 'static) -> Self {
        self.music_backend = Some(Box::new(backend));
        self
    }

    pub fn voiceover_backend(mut self, backend: impl AudioBackend + 'static) -> Self {
        self.voiceover_backend = Some(Box::new(backend));
        self
    }

    pub fn video_backend(mut self, backend: impl VideoBackend + 'static) -> Self {
        self.video_backend = Some(Box::new(backend));
        self
    }

    pub fn narrative_surface(mut self, surface: impl NarrativeSurface + 'static) -> Self {
        self.surface = Some(Box::new(surface));
        self
    }

    pub fn wake_lock(mut self, wake_lock: impl WakeLock + 'static) -> Self {
        self.wake_lock = Some(Box::new(wake_lock));
        self
    }

    pub fn telemetry_sink(mut self, sink: impl TelemetrySink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    pub fn session_context(mut self, session: SessionContext) -> Self {
        self.session = session;
        self
    }

    /// Share an existing bus (e.g. one the HTTP layer already subscribes to)
    pub fn event_bus(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    pub fn on_complete(mut self, hook: impl FnOnce() + Send + 'static) -> Self {
        self.on_complete = Some(Box::new(hook));
        self
    }

    pub fn on_exit(mut self, hook: impl FnOnce() + Send + 'static) -> Self {
        self.on_exit = Some(Box::new(hook));
        self
    }

    /// Validate configuration and class, then assemble the engine (Idle)
    pub fn build(self) -> Result<PlaybackEngine> {
        self.config.validate()?;
        let sequencer = Sequencer::new(&self.class)?;

        let director = AudioDirector::new(
            self.music_backend
                .unwrap_or_else(|| Box::new(SimulatedAudioBackend::new())),
            self.voiceover_backend
                .unwrap_or_else(|| Box::new(SimulatedAudioBackend::new())),
            self.class.playlists.clone(),
            DuckingSettings::from(&self.config.audio),
        );
        let video = VideoReveal::new(
            self.video_backend
                .unwrap_or_else(|| Box::new(SimulatedVideoBackend::new())),
            self.config.video.reveal_steps,
        );
        let scroll = ScrollSynchroniser::new(
            self.surface
                .unwrap_or_else(|| Box::new(LineMetricsSurface::default())),
        );
        let tracker = SessionTracker::new(self.sink.unwrap_or_else(|| Box::new(NullSink)), self.session);
        let lifecycle =
            ResourceLifecycle::new(self.wake_lock.unwrap_or_else(|| Box::new(NoopWakeLock)));
        let events = self
            .events
            .unwrap_or_else(|| EventBus::new(self.config.runtime.event_capacity));

        info!(
            "Engine built: {} segments, {}s nominal",
            self.class.segments.len(),
            self.class.total_nominal_seconds()
        );

        Ok(PlaybackEngine {
            class: self.class,
            config: self.config,
            scheduler: Scheduler::new(),
            sequencer,
            director,
            video,
            scroll,
            tracker,
            lifecycle,
            events,
            on_complete: self.on_complete,
            on_exit: self.on_exit,
            media_clock_ms: 0,
            ended: None,
        })
    }
}

pub struct PlaybackEngine {
    class: ClassDefinition,
    config: PlayerConfig,
    scheduler: Scheduler<TimerKind>,
    sequencer: Sequencer,
    director: AudioDirector,
    video: VideoReveal,
    scroll: ScrollSynchroniser,
    tracker: SessionTracker,
    lifecycle: ResourceLifecycle,
    events: EventBus,
    on_complete: Option<CompletionHook>,
    on_exit: Option<CompletionHook>,
    /// Clock time media backends have been polled up to
    media_clock_ms: u64,
    ended: Option<EndKind>,
}

impl PlaybackEngine {
    pub fn builder(class: ClassDefinition, config: PlayerConfig) -> EngineBuilder {
        EngineBuilder::new(class, config)
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn status(&self) -> PlaybackStatus {
        self.sequencer.status()
    }

    pub fn state(&self) -> &PlaybackState {
        self.sequencer.state()
    }

    pub fn end_kind(&self) -> Option<EndKind> {
        self.ended
    }

    pub fn is_finished(&self) -> bool {
        self.ended.is_some()
    }

    pub fn clock_ms(&self) -> u64 {
        self.scheduler.now_ms()
    }

    pub fn class(&self) -> &ClassDefinition {
        &self.class
    }

    pub fn needs_exit_confirmation(&self) -> bool {
        self.sequencer.needs_exit_confirmation()
    }

    // ========================================
    // Host commands
    // ========================================

    /// Idle -> Running: open the session, enter segment 0, start audio
    pub fn start(&mut self) -> Result<()> {
        self.sequencer.start()?;
        self.tracker.open_session(&self.class);
        self.emit(CadenceEvent::ClassStarted {
            session_id: self.tracker.session_id(),
            segment_count: self.class.segments.len(),
            total_seconds: self.class.total_nominal_seconds(),
            timestamp: time::now(),
        });
        self.lifecycle.on_running();
        self.scheduler.schedule_repeating(
            TimerKind::Heartbeat,
            self.config.telemetry.heartbeat_interval_ms(),
            true,
        );
        self.enter_segment(0, TransitionCause::Start);
        let events = self.director.play(PlayOrigin::Automatic);
        self.publish_audio(events);
        Ok(())
    }

    /// Running <-> Paused; returns the new paused flag
    pub fn toggle_pause(&mut self) -> Result<bool> {
        let paused = self.sequencer.toggle_pause()?;
        if paused {
            self.scheduler.suspend_pausable();
            self.lifecycle.on_paused();
            self.director.pause();
            self.video.pause();
            info!("Paused at segment {}", self.sequencer.current_index());
        } else {
            self.scheduler.resume_pausable();
            self.lifecycle.on_running();
            let events = self.director.play(PlayOrigin::Automatic);
            self.publish_audio(events);
            self.video.resume();

            // Immediate heartbeat, then a fresh interval
            self.tracker
                .heartbeat(self.sequencer.current_index(), self.sequencer.counters());
            self.scheduler.cancel_kind(TimerKind::Heartbeat);
            self.scheduler.schedule_repeating(
                TimerKind::Heartbeat,
                self.config.telemetry.heartbeat_interval_ms(),
                true,
            );
            info!("Resumed at segment {}", self.sequencer.current_index());
        }

        let (old_state, new_state) = if paused {
            (PlaybackStatus::Running, PlaybackStatus::Paused)
        } else {
            (PlaybackStatus::Paused, PlaybackStatus::Running)
        };
        self.emit(CadenceEvent::PlaybackStateChanged {
            old_state,
            new_state,
            timestamp: time::now(),
        });
        Ok(paused)
    }

    /// Skip forward; on the last segment this ends the class
    pub fn next(&mut self) -> Result<()> {
        match self.sequencer.next()? {
            NavOutcome::Moved(index) => self.enter_segment(index, TransitionCause::SkipForward),
            NavOutcome::Completed => self.finish(EndKind::SkippedPastEnd),
            NavOutcome::Ignored => {}
        }
        Ok(())
    }

    /// Step back one segment; ignored on the first segment
    pub fn previous(&mut self) -> Result<()> {
        match self.sequencer.previous()? {
            NavOutcome::Moved(index) => self.enter_segment(index, TransitionCause::SkipBack),
            NavOutcome::Completed | NavOutcome::Ignored => {}
        }
        Ok(())
    }

    /// User-initiated exit
    ///
    /// Past the first segment and not paused, the host must pass
    /// `confirmed = true`; otherwise [`Error::ConfirmationRequired`].
    pub fn exit(&mut self, confirmed: bool) -> Result<()> {
        if self.sequencer.needs_exit_confirmation() && !confirmed {
            return Err(Error::ConfirmationRequired);
        }
        self.sequencer.exit()?;
        self.finish(EndKind::Exited);
        Ok(())
    }

    /// Manual "enable audio" affordance after a blocked autoplay
    ///
    /// Idempotent. While paused the gesture is ignored; resuming plays audio.
    pub fn enable_audio(&mut self) -> Result<()> {
        match self.sequencer.status() {
            PlaybackStatus::Running => {
                let events = self.director.play(PlayOrigin::UserGesture);
                self.publish_audio(events);
                Ok(())
            }
            PlaybackStatus::Paused => {
                debug!("Enable audio while paused; deferred to resume");
                Ok(())
            }
            status => Err(Error::InvalidState(format!("cannot enable audio while {}", status))),
        }
    }

    /// Tear the engine down from any state (idempotent)
    pub fn teardown(&mut self) {
        if self.ended.is_some() {
            return;
        }
        if !self.sequencer.status().is_terminal() {
            // Cannot fail for a non-terminal status
            let _ = self.sequencer.exit();
        }
        self.finish(EndKind::TornDown);
    }

    // ========================================
    // Clock
    // ========================================

    pub fn advance(&mut self, elapsed: Duration) {
        self.advance_ms(time::duration_to_millis(elapsed));
    }

    /// Move the logical clock forward, firing timers and polling media
    ///
    /// Time is processed in slices of at most `runtime.media_poll_ms`, so
    /// media signals are never observed later than one slice after they
    /// happen regardless of how coarse the caller's steps are.
    pub fn advance_ms(&mut self, elapsed_ms: u64) {
        if self.ended.is_some() {
            return;
        }
        let target = self.scheduler.now_ms() + elapsed_ms;
        let slice = self.config.runtime.media_poll_ms.max(1);

        while self.scheduler.now_ms() < target && self.ended.is_none() {
            let slice_end = (self.scheduler.now_ms() + slice).min(target);
            self.run_timers(slice_end);
            if self.ended.is_some() {
                break;
            }
            self.scheduler.advance_to(slice_end);
            self.sync_media(slice_end);
        }
    }

    fn run_timers(&mut self, limit_ms: u64) {
        while let Some((_, kind)) = self.scheduler.pop_due(limit_ms) {
            let now = self.scheduler.now_ms();
            self.sync_media(now);
            self.fire(kind);
            if self.ended.is_some() {
                return;
            }
        }
    }

    fn fire(&mut self, kind: TimerKind) {
        match kind {
            TimerKind::Second => self.on_second(),
            TimerKind::Heartbeat => {
                self.tracker
                    .heartbeat(self.sequencer.current_index(), self.sequencer.counters());
            }
            TimerKind::ScrollLeadIn => {
                self.scroll.begin();
                self.scheduler
                    .schedule_repeating(TimerKind::ScrollFrame, self.config.scroll.frame_ms, true);
            }
            TimerKind::ScrollFrame => {
                let finished = self.scroll.frame(self.config.scroll.frame_ms);
                self.sequencer.set_elapsed_scroll(self.scroll.elapsed_ms());
                if finished {
                    self.scheduler.cancel_kind(TimerKind::ScrollFrame);
                }
            }
            TimerKind::RevealStep => {
                if self.video.reveal_step() {
                    self.scheduler.cancel_kind(TimerKind::RevealStep);
                    self.emit_video_phase();
                }
            }
            TimerKind::VideoHold => {
                self.video.hold_elapsed();
                self.emit_video_phase();
            }
            TimerKind::Fade => {
                if !self.director.step_fades(self.config.audio.fade_step_ms) {
                    self.scheduler.cancel_kind(TimerKind::Fade);
                }
            }
        }
    }

    fn on_second(&mut self) {
        self.tracker.record_second();
        match self.sequencer.tick() {
            TickOutcome::Counting(remaining_seconds) => {
                self.emit(CadenceEvent::Countdown {
                    index: self.sequencer.current_index(),
                    remaining_seconds,
                    progress: self.sequencer.progress(),
                    timestamp: time::now(),
                });
            }
            TickOutcome::Advanced(index) => self.enter_segment(index, TransitionCause::Natural),
            TickOutcome::Completed => self.finish(EndKind::Completed),
            TickOutcome::Ignored => {}
        }
    }

    /// Poll media backends for everything that happened up to `now_ms`
    fn sync_media(&mut self, now_ms: u64) {
        let elapsed = now_ms.saturating_sub(self.media_clock_ms);
        if elapsed == 0 || self.ended.is_some() {
            return;
        }
        self.media_clock_ms = now_ms;

        let events = self.director.poll(elapsed);
        self.publish_audio(events);

        match self.video.poll(elapsed) {
            Some(VideoOutcome::HoldStarted) => {
                self.scheduler
                    .schedule_once(TimerKind::VideoHold, self.config.video.hold_ms, true);
                self.emit_video_phase();
            }
            Some(VideoOutcome::Hidden) => {
                self.scheduler.cancel_kind(TimerKind::RevealStep);
                self.scheduler.cancel_kind(TimerKind::VideoHold);
                self.emit_video_phase();
            }
            None => {}
        }
    }

    // ========================================
    // Segment transitions
    // ========================================

    fn enter_segment(&mut self, index: usize, cause: TransitionCause) {
        let segment = self.class.segments[index].clone();
        let previous_reason = match cause {
            TransitionCause::Start | TransitionCause::Natural => SectionEndReason::Completed,
            TransitionCause::SkipForward => SectionEndReason::SkippedForward,
            TransitionCause::SkipBack => SectionEndReason::SkippedBack,
        };
        self.tracker.enter_segment(index, &segment, previous_reason);

        for kind in [
            TimerKind::Second,
            TimerKind::ScrollLeadIn,
            TimerKind::ScrollFrame,
            TimerKind::RevealStep,
            TimerKind::VideoHold,
        ] {
            self.scheduler.cancel_kind(kind);
        }
        self.scheduler
            .schedule_repeating(TimerKind::Second, SECOND_MS, true);

        self.scroll
            .load_segment(&segment, self.config.scroll.readability_factor);
        self.sequencer.set_elapsed_scroll(0);
        self.scheduler
            .schedule_once(TimerKind::ScrollLeadIn, self.config.scroll.lead_in_ms, true);

        if self.video.enter_segment(&segment) == RevealPlan::Thumbnail {
            self.scheduler.schedule_repeating(
                TimerKind::RevealStep,
                self.config.video.reveal_step_ms(),
                true,
            );
        }

        let mut events = self.director.select_category(segment.kind.music_category());
        events.extend(self.director.set_voiceover(segment.active_voiceover()));
        self.publish_audio(events);

        info!(
            index,
            kind = %segment.kind,
            cause = ?cause,
            "Segment {} of {}: {}",
            index + 1,
            self.class.segments.len(),
            segment.display_name
        );
        self.emit(CadenceEvent::SegmentChanged {
            segment: SegmentInfo::from_segment(index, &segment),
            remaining_seconds: self.sequencer.remaining_seconds(),
            cause,
            timestamp: time::now(),
        });
        self.emit_video_phase();
    }

    /// Release everything exactly once: timers, audio, video, wake lock,
    /// open section, session; then notify
    fn finish(&mut self, end: EndKind) {
        if self.ended.is_some() {
            return;
        }
        self.ended = Some(end);
        self.scheduler.cancel_all();

        self.director.release();
        self.video.release();
        self.lifecycle.release();

        let reason = match end {
            EndKind::Completed => SectionEndReason::Completed,
            EndKind::SkippedPastEnd => SectionEndReason::SkippedForward,
            EndKind::Exited | EndKind::TornDown => SectionEndReason::Exited,
        };
        self.tracker.close_section(reason);
        let index = self.sequencer.current_index();
        let opened = self.tracker.close_session(
            end == EndKind::Completed,
            index,
            self.sequencer.counters(),
        );

        let session_id = self.tracker.session_id();
        let play_duration_seconds = self.tracker.play_duration_seconds();
        info!(
            "Class ended ({:?}) at segment {} after {}s",
            end, index, play_duration_seconds
        );

        match end {
            EndKind::Completed | EndKind::SkippedPastEnd => {
                self.emit(CadenceEvent::ClassCompleted {
                    session_id,
                    play_duration_seconds,
                    timestamp: time::now(),
                });
                if let Some(hook) = self.on_complete.take() {
                    hook();
                }
            }
            EndKind::Exited => {
                self.emit(CadenceEvent::ClassExited {
                    session_id,
                    index,
                    play_duration_seconds,
                    timestamp: time::now(),
                });
                if let Some(hook) = self.on_exit.take() {
                    hook();
                }
            }
            EndKind::TornDown => {
                if opened {
                    self.emit(CadenceEvent::ClassExited {
                        session_id,
                        index,
                        play_duration_seconds,
                        timestamp: time::now(),
                    });
                }
            }
        }
    }

    // ========================================
    // Observation
    // ========================================

    fn emit(&self, event: CadenceEvent) {
        self.events.emit_lossy(event);
    }

    fn emit_video_phase(&self) {
        self.emit(CadenceEvent::VideoPhaseChanged {
            index: self.sequencer.current_index(),
            phase: self.video.phase(),
            timestamp: time::now(),
        });
    }

    /// Forward director events and keep the fade timer in step with ramps
    fn publish_audio(&mut self, events: Vec<DirectorEvent>) {
        for event in events {
            let event = match event {
                DirectorEvent::TrackChanged(track) => CadenceEvent::MusicTrackChanged {
                    track,
                    timestamp: time::now(),
                },
                DirectorEvent::DuckingChanged {
                    ducked,
                    target_volume,
                } => CadenceEvent::DuckingChanged {
                    ducked,
                    target_volume,
                    timestamp: time::now(),
                },
                DirectorEvent::AutoplayBlocked(channel) => CadenceEvent::AudioBlocked {
                    channel,
                    timestamp: time::now(),
                },
            };
            self.emit(event);
        }

        let fading = self.director.is_fading();
        let scheduled = self.scheduler.is_scheduled(TimerKind::Fade);
        if fading && !scheduled && self.ended.is_none() {
            self.scheduler
                .schedule_repeating(TimerKind::Fade, self.config.audio.fade_step_ms, false);
        } else if !fading && scheduled {
            self.scheduler.cancel_kind(TimerKind::Fade);
        }
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        let index = self.sequencer.current_index();
        let remaining_seconds = self.sequencer.remaining_seconds();
        PlaybackSnapshot {
            session_id: self.tracker.session_id(),
            status: self.sequencer.status(),
            segment: SegmentInfo::from_segment(index, &self.class.segments[index]),
            segment_count: self.class.segments.len(),
            remaining_seconds,
            remaining_display: format_countdown(u64::from(remaining_seconds)),
            progress: self.sequencer.progress(),
            state: self.sequencer.state().clone(),
            needs_exit_confirmation: self.sequencer.needs_exit_confirmation(),
            play_duration_seconds: self.tracker.play_duration_seconds(),
            audio: self.director.snapshot(),
            video: self.video.snapshot(),
            scroll: self.scroll.snapshot(),
            clock_ms: self.scheduler.now_ms(),
        }
    }
}

impl Drop for PlaybackEngine {
    fn drop(&mut self) {
        self.teardown();
    }
}
