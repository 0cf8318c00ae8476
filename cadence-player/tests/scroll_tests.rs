//! Narrative scroll timing through the full engine

mod helpers;

use cadence_common::SegmentKind;
use cadence_player::narrative::{LineMetricsSurface, ScrollPhase};
use cadence_player::{PlaybackEngine, PlayerConfig};
use helpers::*;

fn narrated(seconds: u32, voiceover_seconds: Option<f64>) -> PlaybackEngine {
    let mut segment = segment(SegmentKind::Cooldown, seconds);
    segment.narrative_text = (1..=30)
        .map(|i| format!("Line {} of the cooldown script", i))
        .collect::<Vec<_>>()
        .join("\n");
    if let Some(vo) = voiceover_seconds {
        segment = with_voiceover(segment, vo);
    }
    let mut engine = PlaybackEngine::builder(class(vec![segment]), PlayerConfig::default())
        .narrative_surface(LineMetricsSurface::new(80, 20.0, 200.0))
        .build()
        .unwrap();
    engine.start().unwrap();
    engine
}

#[test]
fn test_voiceover_length_times_the_scroll() {
    let mut engine = narrated(60, Some(12.0));
    let scroll = engine.snapshot().scroll;
    assert_eq!(scroll.effective_duration_ms, 12_000);
    // 30 lines of 20px against a 200px viewport
    assert!((scroll.scrollable_height - 400.0).abs() < 1e-9);

    engine.advance_ms(2_000);
    assert_eq!(engine.snapshot().scroll.position, 0.0);

    engine.advance_ms(6_000);
    let mid = engine.snapshot().scroll;
    assert_eq!(mid.elapsed_ms, 6_000);
    assert!((mid.position - 200.0).abs() < 1e-6);

    engine.advance_ms(6_000);
    let end = engine.snapshot().scroll;
    assert_eq!(end.phase, ScrollPhase::Finished);
    assert!((end.position - 400.0).abs() < 1e-9);

    // Stays at the bottom for the rest of the segment
    engine.advance_ms(10_000);
    assert_eq!(engine.snapshot().scroll.elapsed_ms, 12_000);
}

#[test]
fn test_unnarrated_text_is_stretched_by_readability_factor() {
    let engine = narrated(100, None);
    assert_eq!(engine.snapshot().scroll.effective_duration_ms, 119_000);
}

#[test]
fn test_pause_holds_scroll_position() {
    let mut engine = narrated(60, Some(20.0));
    engine.advance_ms(7_000);
    let before = engine.snapshot().scroll;

    engine.toggle_pause().unwrap();
    engine.advance_ms(15_000);
    let during = engine.snapshot().scroll;
    assert_eq!(during.elapsed_ms, before.elapsed_ms);
    assert_eq!(during.position, before.position);

    engine.toggle_pause().unwrap();
    engine.advance_ms(1_000);
    assert_eq!(engine.snapshot().scroll.elapsed_ms, before.elapsed_ms + 1_000);
    assert_eq!(engine.state().elapsed_scroll_ms, before.elapsed_ms + 1_000);
}

#[test]
fn test_segment_change_resets_scroll() {
    let (mut engine, _sink) = started_engine(exercise_class(&[5, 5]));
    engine.advance_ms(4_000);
    assert!(engine.state().elapsed_scroll_ms > 0);
    engine.advance_ms(1_000);
    assert_eq!(engine.state().elapsed_scroll_ms, 0);
    assert_eq!(engine.snapshot().scroll.phase, ScrollPhase::LeadIn);
}

#[test]
fn test_pause_markers_are_not_rendered() {
    let (engine, _sink) = started_engine(exercise_class(&[5]));
    let lines = engine.snapshot().scroll.lines;
    assert_eq!(lines, vec!["Stand tall", "", "Breathe in slowly", "Breathe out"]);
}
