//! Narrative text: cue stripping, rendering surface and auto-scroll

pub mod markers;
pub mod scroll;
pub mod surface;

pub use markers::{is_pause_marker, parse_narrative, NarrativeScript};
pub use scroll::{ScrollPhase, ScrollSnapshot, ScrollSynchroniser};
pub use surface::{LineMetricsSurface, NarrativeSurface};
