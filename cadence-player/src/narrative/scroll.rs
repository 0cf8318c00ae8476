//! Narrative scroll synchroniser
//!
//! Moves the narrative surface so it reaches the bottom exactly when the
//! segment's effective duration has elapsed:
//!
//! ```text
//! speed    = scrollable_height / effective_duration_ms
//! position = min(speed × elapsed_ms, scrollable_height)
//! ```
//!
//! The lead-in delay and frame cadence are scheduler timers owned by the
//! engine, both pausable. Elapsed time only grows on frames, so pausing
//! freezes it and resuming continues from the stored value.

use cadence_common::Segment;
use serde::Serialize;
use tracing::debug;

use super::markers::{parse_narrative, NarrativeScript};
use super::surface::NarrativeSurface;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollPhase {
    /// No segment loaded
    Idle,
    /// Waiting out the lead-in delay
    LeadIn,
    Scrolling,
    /// Bottom reached
    Finished,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScrollSnapshot {
    pub phase: ScrollPhase,
    pub elapsed_ms: u64,
    pub effective_duration_ms: u64,
    pub position: f64,
    pub scrollable_height: f64,
    pub lines: Vec<String>,
}

pub struct ScrollSynchroniser {
    surface: Box<dyn NarrativeSurface>,
    script: NarrativeScript,
    scrollable_height: f64,
    effective_ms: u64,
    elapsed_ms: u64,
    phase: ScrollPhase,
}

impl ScrollSynchroniser {
    pub fn new(surface: Box<dyn NarrativeSurface>) -> Self {
        Self {
            surface,
            script: NarrativeScript::default(),
            scrollable_height: 0.0,
            effective_ms: 0,
            elapsed_ms: 0,
            phase: ScrollPhase::Idle,
        }
    }

    /// Render a new segment's narrative and reset progress
    ///
    /// Returns the effective duration the scroll is timed against.
    pub fn load_segment(&mut self, segment: &Segment, readability_factor: f64) -> u64 {
        self.script = parse_narrative(&segment.narrative_text);
        self.scrollable_height = self.surface.render(&self.script.lines);
        self.effective_ms = segment.effective_duration_ms(readability_factor);
        self.elapsed_ms = 0;
        self.surface.scroll_to(0.0);
        self.phase = ScrollPhase::LeadIn;
        debug!(
            "Narrative: {} lines ({} cues stripped), {:.0}px over {}ms",
            self.script.lines.len(),
            self.script.markers_removed,
            self.scrollable_height,
            self.effective_ms
        );
        self.effective_ms
    }

    /// Lead-in elapsed; frames may start
    pub fn begin(&mut self) {
        if self.phase == ScrollPhase::LeadIn {
            self.phase = ScrollPhase::Scrolling;
        }
    }

    /// Pixels per millisecond
    pub fn speed(&self) -> f64 {
        if self.effective_ms == 0 {
            return 0.0;
        }
        self.scrollable_height / self.effective_ms as f64
    }

    /// One animation frame; returns true once the bottom is reached
    pub fn frame(&mut self, elapsed_ms: u64) -> bool {
        match self.phase {
            ScrollPhase::Scrolling => {}
            ScrollPhase::Finished => return true,
            ScrollPhase::Idle | ScrollPhase::LeadIn => return false,
        }

        self.elapsed_ms = (self.elapsed_ms + elapsed_ms).min(self.effective_ms);
        let position = if self.elapsed_ms >= self.effective_ms {
            self.scrollable_height
        } else {
            (self.speed() * self.elapsed_ms as f64).min(self.scrollable_height)
        };
        self.surface.scroll_to(position);

        if self.elapsed_ms >= self.effective_ms {
            self.phase = ScrollPhase::Finished;
            return true;
        }
        false
    }

    pub fn phase(&self) -> ScrollPhase {
        self.phase
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    pub fn effective_duration_ms(&self) -> u64 {
        self.effective_ms
    }

    pub fn position(&self) -> f64 {
        self.surface.position()
    }

    pub fn scrollable_height(&self) -> f64 {
        self.scrollable_height
    }

    pub fn lines(&self) -> &[String] {
        &self.script.lines
    }

    pub fn snapshot(&self) -> ScrollSnapshot {
        ScrollSnapshot {
            phase: self.phase,
            elapsed_ms: self.elapsed_ms,
            effective_duration_ms: self.effective_ms,
            position: self.position(),
            scrollable_height: self.scrollable_height,
            lines: self.script.lines.clone(),
        }
    }
}
