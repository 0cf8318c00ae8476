//! Session and section telemetry through the full engine

mod helpers;

use cadence_common::SegmentKind;
use cadence_player::telemetry::SectionEndReason;
use helpers::*;

#[test]
fn test_teardown_mid_segment_closes_section_and_session_once() {
    let (mut engine, sink) = started_engine(exercise_class(&[10, 10, 10]));
    engine.advance_ms(14_500);
    assert_eq!(engine.state().current_index, 1);

    engine.teardown();
    engine.teardown();
    drop(engine);

    let exited = sink
        .section_end_reasons()
        .into_iter()
        .filter(|r| *r == SectionEndReason::Exited)
        .count();
    assert_eq!(exited, 1);
    assert_eq!(sink.count("session_end"), 1);

    let (was_completed, max_index, played) = sink.session_end().unwrap();
    assert!(!was_completed);
    assert_eq!(max_index, 1);
    assert_eq!(played, 14);
    assert_eq!(sink.kinds().last(), Some(&"session_end"));
}

#[test]
fn test_completed_run_closes_one_section_per_tracked_segment() {
    let segments = vec![
        segment(SegmentKind::Preparation, 3),
        segment(SegmentKind::Exercise, 4),
        segment(SegmentKind::Transition, 2),
        segment(SegmentKind::Exercise, 4),
        segment(SegmentKind::Cooldown, 3),
    ];
    let (mut engine, sink) = started_engine(class(segments));
    engine.advance_ms(16_000);
    assert!(engine.is_finished());

    assert_eq!(sink.count("section_start"), 4);
    assert_eq!(sink.count("section_end"), 4);
    assert!(sink
        .section_end_reasons()
        .iter()
        .all(|r| *r == SectionEndReason::Completed));

    let (was_completed, max_index, played) = sink.session_end().unwrap();
    assert!(was_completed);
    assert_eq!(max_index, 4);
    assert_eq!(played, 16);
}

#[test]
fn test_at_most_one_section_open() {
    let (mut engine, sink) = started_engine(exercise_class(&[5, 5, 5, 5]));
    engine.advance_ms(2_000);
    engine.next().unwrap();
    engine.next().unwrap();
    engine.previous().unwrap();
    engine.advance_ms(6_000);
    engine.exit(true).unwrap();

    let mut open = 0i32;
    for kind in sink.kinds() {
        match kind {
            "section_start" => open += 1,
            "section_end" => open -= 1,
            _ => {}
        }
        assert!((0..=1).contains(&open), "open sections: {}", open);
    }
    assert_eq!(open, 0);
    assert_eq!(
        sink.section_end_reasons(),
        vec![
            SectionEndReason::SkippedForward,
            SectionEndReason::SkippedForward,
            SectionEndReason::SkippedBack,
            SectionEndReason::Completed,
            SectionEndReason::Exited,
        ]
    );
}

#[test]
fn test_heartbeats_every_thirty_running_seconds() {
    let (mut engine, sink) = started_engine(exercise_class(&[120]));
    engine.advance_ms(61_000);
    assert_eq!(sink.heartbeat_durations(), vec![30, 60]);
}

#[test]
fn test_pause_stops_heartbeats_and_resume_sends_one() {
    let (mut engine, sink) = started_engine(exercise_class(&[120]));
    engine.advance_ms(10_000);
    engine.toggle_pause().unwrap();
    engine.advance_ms(90_000);
    assert!(sink.heartbeat_durations().is_empty());

    engine.toggle_pause().unwrap();
    assert_eq!(sink.heartbeat_durations(), vec![10]);

    // Interval restarts from the resume
    engine.advance_ms(29_999);
    assert_eq!(sink.heartbeat_durations().len(), 1);
    engine.advance_ms(1);
    assert_eq!(sink.heartbeat_durations(), vec![10, 40]);
}

#[test]
fn test_skip_past_end_reports_incomplete_session() {
    let (mut engine, sink) = started_engine(exercise_class(&[5, 5]));
    engine.next().unwrap();
    engine.next().unwrap();

    assert_eq!(
        sink.section_end_reasons(),
        vec![SectionEndReason::SkippedForward, SectionEndReason::SkippedForward]
    );
    let (was_completed, max_index, _) = sink.session_end().unwrap();
    assert!(!was_completed);
    assert_eq!(max_index, 1);
}
