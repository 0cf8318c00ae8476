//! Segment sequencer
//!
//! Pure state machine over the class's segment list:
//!
//! ```text
//! Idle --start--> Running <--toggle_pause--> Paused
//!                    |  \                      |
//!                    |   `--exit--> Exited <---'
//!                    `--last tick / next on last--> Completed
//! ```
//!
//! The sequencer knows nothing about timers. The engine calls [`Sequencer::tick`]
//! once per logical second while running. Every index change reloads
//! `remaining_seconds` from the destination segment's nominal duration.

use cadence_common::events::PlaybackStatus;
use cadence_common::ClassDefinition;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::telemetry::PlaybackCounters;

/// Sequencer state, owned by one engine per run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaybackState {
    pub current_index: usize,
    pub remaining_seconds: u32,
    pub is_paused: bool,
    pub elapsed_scroll_ms: u64,
    pub pause_count: u32,
    pub skip_count: u32,
    pub rewind_count: u32,
    pub status: PlaybackStatus,
}

/// Result of one countdown second
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Still counting; seconds left in the current segment
    Counting(u32),
    /// Countdown hit zero and the next segment became current
    Advanced(usize),
    /// Countdown hit zero on the last segment
    Completed,
    /// Not running (idle, paused or terminal)
    Ignored,
}

/// Result of manual navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavOutcome {
    Moved(usize),
    /// `next()` on the last segment
    Completed,
    /// `previous()` on the first segment
    Ignored,
}

pub struct Sequencer {
    durations: Vec<u32>,
    state: PlaybackState,
}

impl Sequencer {
    /// Build a sequencer, refusing classes it cannot time
    pub fn new(class: &ClassDefinition) -> Result<Self> {
        class.validate()?;
        if let Some((index, _)) = class
            .segments
            .iter()
            .enumerate()
            .find(|(_, s)| s.nominal_duration_seconds == 0)
        {
            return Err(Error::Config(format!("segment {} has a zero duration", index)));
        }
        if let Some((index, _)) = class.segments.iter().enumerate().find(|(_, s)| {
            s.active_voiceover()
                .map_or(false, |vo| !(vo.duration_seconds.is_finite() && vo.duration_seconds > 0.0))
        }) {
            return Err(Error::Config(format!(
                "segment {} has a voice-over without a usable duration",
                index
            )));
        }

        let durations: Vec<u32> = class.segments.iter().map(|s| s.nominal_duration_seconds).collect();
        Ok(Self {
            state: PlaybackState {
                current_index: 0,
                remaining_seconds: durations[0],
                is_paused: false,
                elapsed_scroll_ms: 0,
                pause_count: 0,
                skip_count: 0,
                rewind_count: 0,
                status: PlaybackStatus::Idle,
            },
            durations,
        })
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn status(&self) -> PlaybackStatus {
        self.state.status
    }

    pub fn current_index(&self) -> usize {
        self.state.current_index
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.state.remaining_seconds
    }

    pub fn is_paused(&self) -> bool {
        self.state.is_paused
    }

    pub fn segment_count(&self) -> usize {
        self.durations.len()
    }

    pub fn counters(&self) -> PlaybackCounters {
        PlaybackCounters {
            pause_count: self.state.pause_count,
            skip_count: self.state.skip_count,
            rewind_count: self.state.rewind_count,
        }
    }

    /// Mirror of the scroll synchroniser's progress, for observers
    pub fn set_elapsed_scroll(&mut self, elapsed_ms: u64) {
        self.state.elapsed_scroll_ms = elapsed_ms;
    }

    fn ensure_active(&self, operation: &str) -> Result<()> {
        match self.state.status {
            PlaybackStatus::Running | PlaybackStatus::Paused => Ok(()),
            status => Err(Error::InvalidState(format!("cannot {} while {}", operation, status))),
        }
    }

    fn load_index(&mut self, index: usize) {
        self.state.current_index = index;
        self.state.remaining_seconds = self.durations[index];
        self.state.elapsed_scroll_ms = 0;
    }

    /// Idle -> Running on the first segment
    pub fn start(&mut self) -> Result<()> {
        if self.state.status != PlaybackStatus::Idle {
            return Err(Error::InvalidState(format!(
                "cannot start while {}",
                self.state.status
            )));
        }
        self.state.status = PlaybackStatus::Running;
        self.load_index(0);
        info!("Sequencer running ({} segments)", self.durations.len());
        Ok(())
    }

    /// One logical second of countdown
    pub fn tick(&mut self) -> TickOutcome {
        if self.state.status != PlaybackStatus::Running {
            return TickOutcome::Ignored;
        }
        self.state.remaining_seconds = self.state.remaining_seconds.saturating_sub(1);
        if self.state.remaining_seconds > 0 {
            return TickOutcome::Counting(self.state.remaining_seconds);
        }

        let next = self.state.current_index + 1;
        if next >= self.durations.len() {
            self.state.status = PlaybackStatus::Completed;
            info!("Sequencer completed");
            return TickOutcome::Completed;
        }
        self.load_index(next);
        debug!("Countdown elapsed; advanced to segment {}", next);
        TickOutcome::Advanced(next)
    }

    /// Running <-> Paused; returns the new paused flag
    pub fn toggle_pause(&mut self) -> Result<bool> {
        self.ensure_active("toggle pause")?;
        if self.state.is_paused {
            self.state.is_paused = false;
            self.state.status = PlaybackStatus::Running;
        } else {
            self.state.is_paused = true;
            self.state.status = PlaybackStatus::Paused;
            self.state.pause_count += 1;
        }
        Ok(self.state.is_paused)
    }

    /// Skip forward; on the last segment this ends the class
    ///
    /// Ending the class this way does not count as a skip.
    pub fn next(&mut self) -> Result<NavOutcome> {
        self.ensure_active("skip forward")?;
        let next = self.state.current_index + 1;
        if next >= self.durations.len() {
            self.state.status = PlaybackStatus::Completed;
            self.state.is_paused = false;
            info!("Skipped past the last segment; sequencer completed");
            return Ok(NavOutcome::Completed);
        }
        self.load_index(next);
        self.state.skip_count += 1;
        Ok(NavOutcome::Moved(next))
    }

    /// Step back one segment; a no-op on the first segment
    pub fn previous(&mut self) -> Result<NavOutcome> {
        self.ensure_active("skip back")?;
        if self.state.current_index == 0 {
            return Ok(NavOutcome::Ignored);
        }
        let previous = self.state.current_index - 1;
        self.load_index(previous);
        self.state.rewind_count += 1;
        Ok(NavOutcome::Moved(previous))
    }

    /// User leaves the class
    pub fn exit(&mut self) -> Result<()> {
        if self.state.status.is_terminal() {
            return Err(Error::InvalidState(format!(
                "cannot exit while {}",
                self.state.status
            )));
        }
        self.state.status = PlaybackStatus::Exited;
        self.state.is_paused = false;
        Ok(())
    }

    /// Leaving now would abandon a class in progress
    pub fn needs_exit_confirmation(&self) -> bool {
        self.state.current_index > 0 && self.state.status == PlaybackStatus::Running
    }

    /// `(completed_segments + fraction_elapsed_in_current) / total_segments`
    pub fn progress(&self) -> f64 {
        let total = self.durations.len() as f64;
        match self.state.status {
            PlaybackStatus::Completed => 1.0,
            PlaybackStatus::Idle => 0.0,
            _ => {
                let duration = f64::from(self.durations[self.state.current_index]);
                let elapsed = duration - f64::from(self.state.remaining_seconds);
                (self.state.current_index as f64 + elapsed / duration) / total
            }
        }
    }
}
