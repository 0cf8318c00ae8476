//! Segment value types
//!
//! A segment is one timed unit of a class. Segments are immutable once
//! loaded; the playback engine only ever moves an index across them.
//!
//! Deserialization goes through [`SegmentRecord`] so that malformed content
//! (a missing or zero duration, an enabled voice-over without a length) is
//! rejected when the class is loaded instead of surfacing as undefined
//! timing mid-class.

use serde::{Deserialize, Serialize};

use super::PlaylistCategory;
use crate::Error;

/// Kind of class segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SegmentKind {
    /// Instructional script before the workout starts
    Preparation,
    /// Warm-up block
    #[serde(alias = "warm-up", alias = "warm_up")]
    Warmup,
    /// Main exercise (may carry a demonstration video)
    Exercise,
    /// Short move-between-exercises interval
    Transition,
    /// Cooldown block
    Cooldown,
    /// Closing meditation
    #[serde(alias = "closing_meditation")]
    ClosingMeditation,
    /// Closing advice
    #[serde(alias = "closing_advice")]
    ClosingAdvice,
}

impl SegmentKind {
    /// Transitions are not tracked as section events
    pub fn is_transition(&self) -> bool {
        matches!(self, SegmentKind::Transition)
    }

    /// Only exercises get the thumbnail-then-video reveal
    pub fn is_exercise(&self) -> bool {
        matches!(self, SegmentKind::Exercise)
    }

    /// Music playlist category that plays under this kind of segment
    pub fn music_category(&self) -> PlaylistCategory {
        match self {
            SegmentKind::Preparation
            | SegmentKind::Warmup
            | SegmentKind::Exercise
            | SegmentKind::Transition => PlaylistCategory::Active,
            SegmentKind::Cooldown | SegmentKind::ClosingMeditation | SegmentKind::ClosingAdvice => {
                PlaylistCategory::Resting
            }
        }
    }

    /// Wire name, as used in telemetry reports
    pub fn as_str(&self) -> &'static str {
        match self {
            SegmentKind::Preparation => "preparation",
            SegmentKind::Warmup => "warmup",
            SegmentKind::Exercise => "exercise",
            SegmentKind::Transition => "transition",
            SegmentKind::Cooldown => "cooldown",
            SegmentKind::ClosingMeditation => "closing-meditation",
            SegmentKind::ClosingAdvice => "closing-advice",
        }
    }
}

impl std::fmt::Display for SegmentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Voice-over track attached to a segment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Voiceover {
    /// Audio URL of the narration
    pub url: String,
    /// Narration length in seconds
    pub duration_seconds: f64,
    /// Disabled voice-overs are ignored for playback and scroll timing
    pub enabled: bool,
}

impl Voiceover {
    /// Narration length in whole milliseconds
    pub fn duration_ms(&self) -> u64 {
        crate::time::seconds_f64_to_millis(self.duration_seconds)
    }
}

/// One timed unit of a class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SegmentRecord")]
pub struct Segment {
    pub kind: SegmentKind,
    pub display_name: String,
    pub narrative_text: String,
    pub nominal_duration_seconds: u32,
    pub voiceover: Option<Voiceover>,
    pub demo_video_url: Option<String>,
}

impl Segment {
    /// Nominal duration in milliseconds
    pub fn nominal_duration_ms(&self) -> u64 {
        u64::from(self.nominal_duration_seconds) * 1000
    }

    /// Voice-over that should actually play, if any
    pub fn active_voiceover(&self) -> Option<&Voiceover> {
        self.voiceover.as_ref().filter(|vo| vo.enabled)
    }

    /// Timing basis for narrative scroll
    ///
    /// Voice-over length when an enabled voice-over exists, otherwise the
    /// nominal duration stretched by `readability_factor` so unnarrated text
    /// scrolls slowly enough to read.
    pub fn effective_duration_ms(&self, readability_factor: f64) -> u64 {
        match self.active_voiceover() {
            Some(vo) => vo.duration_ms(),
            None => (self.nominal_duration_ms() as f64 * readability_factor).round() as u64,
        }
    }

    /// Whether a demonstration clip accompanies this segment
    pub fn has_demo_video(&self) -> bool {
        self.demo_video_url.is_some()
    }
}

/// Raw voice-over as it arrives from the content store
#[derive(Debug, Deserialize)]
struct VoiceoverRecord {
    url: String,
    #[serde(default, alias = "durationSeconds", alias = "duration")]
    duration_seconds: Option<f64>,
    #[serde(default = "default_enabled")]
    enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// Raw segment as it arrives from the content store
#[derive(Debug, Deserialize)]
struct SegmentRecord {
    kind: SegmentKind,
    #[serde(default, alias = "displayName", alias = "name")]
    display_name: Option<String>,
    #[serde(default, alias = "narrativeText", alias = "text")]
    narrative_text: String,
    #[serde(default, alias = "nominalDurationSeconds", alias = "duration")]
    nominal_duration_seconds: Option<u32>,
    #[serde(default)]
    voiceover: Option<VoiceoverRecord>,
    #[serde(default, alias = "demoVideoUrl", alias = "video_url")]
    demo_video_url: Option<String>,
}

impl TryFrom<SegmentRecord> for Segment {
    type Error = Error;

    fn try_from(record: SegmentRecord) -> Result<Self, Self::Error> {
        let display_name = record
            .display_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| record.kind.as_str().to_string());

        let nominal_duration_seconds = match record.nominal_duration_seconds {
            Some(0) => {
                return Err(Error::InvalidClass(format!(
                    "segment '{}' has a zero duration",
                    display_name
                )))
            }
            Some(seconds) => seconds,
            None => {
                return Err(Error::InvalidClass(format!(
                    "segment '{}' is missing its duration",
                    display_name
                )))
            }
        };

        let voiceover = match record.voiceover {
            None => None,
            Some(vo) => {
                let duration_seconds = match (vo.duration_seconds, vo.enabled) {
                    (Some(d), _) if d.is_finite() && d > 0.0 => d,
                    (_, false) => 0.0,
                    _ => {
                        return Err(Error::InvalidClass(format!(
                            "voice-over for segment '{}' has no usable duration",
                            display_name
                        )))
                    }
                };
                Some(Voiceover {
                    url: vo.url,
                    duration_seconds,
                    enabled: vo.enabled,
                })
            }
        };

        let demo_video_url = record.demo_video_url.filter(|url| !url.trim().is_empty());

        Ok(Segment {
            kind: record.kind,
            display_name,
            narrative_text: record.narrative_text,
            nominal_duration_seconds,
            voiceover,
            demo_video_url,
        })
    }
}
