//! Segment sequencing through the full engine
//!
//! Countdown, navigation, pause invariance and completion, driven on the
//! engine's logical clock.

mod helpers;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use cadence_common::events::{CadenceEvent, PlaybackStatus, TransitionCause};
use cadence_common::SegmentKind;
use cadence_player::{Error, PlaybackEngine, PlayerConfig};
use helpers::*;

#[test]
fn test_three_segments_complete_after_23_seconds() {
    let (mut engine, _sink) = started_engine(exercise_class(&[10, 5, 8]));

    engine.advance_ms(22_999);
    assert_eq!(engine.status(), PlaybackStatus::Running);
    assert_eq!(engine.state().current_index, 2);
    assert_eq!(engine.state().remaining_seconds, 1);

    engine.advance_ms(1);
    assert_eq!(engine.status(), PlaybackStatus::Completed);
    assert_eq!(engine.state().skip_count, 0);
    assert_eq!(engine.state().rewind_count, 0);
}

#[test]
fn test_running_time_matches_sum_of_durations() {
    let durations = [3, 7, 1, 12, 4];
    let (mut engine, sink) = started_engine(exercise_class(&durations));

    let mut seconds = 0;
    while engine.status() == PlaybackStatus::Running {
        engine.advance_ms(1000);
        seconds += 1;
        assert!(seconds <= 100, "class never completed");
    }
    let total: u32 = durations.iter().sum();
    assert_eq!(seconds, total);
    assert_eq!(sink.session_end().map(|(_, _, played)| played), Some(u64::from(total)));
}

#[test]
fn test_next_next_previous_lands_on_index_one() {
    let (mut engine, _sink) = started_engine(exercise_class(&[10, 10, 10, 10, 10]));

    engine.next().unwrap();
    engine.next().unwrap();
    engine.previous().unwrap();

    let state = engine.state();
    assert_eq!(state.current_index, 1);
    assert_eq!(state.skip_count, 2);
    assert_eq!(state.rewind_count, 1);
}

#[test]
fn test_previous_then_next_restores_full_countdown() {
    let (mut engine, _sink) = started_engine(exercise_class(&[6, 9, 4]));
    engine.next().unwrap();
    engine.advance_ms(3_500);
    assert_eq!(engine.state().remaining_seconds, 6);

    engine.previous().unwrap();
    engine.next().unwrap();
    assert_eq!(engine.state().current_index, 1);
    assert_eq!(engine.state().remaining_seconds, 9);
}

#[test]
fn test_pausing_never_changes_countdown_or_scroll() {
    let class = exercise_class(&[20, 20]);
    let (mut reference, _) = started_engine(class.clone());
    reference.advance_ms(7_300);

    let (mut paused, _) = started_engine(class);
    let mut running_ms = 0;
    for step in [1_234u64, 987, 2_001, 49, 1_729] {
        paused.advance_ms(step);
        running_ms += step;
        paused.toggle_pause().unwrap();
        paused.advance_ms(4_321);
        paused.toggle_pause().unwrap();
    }
    paused.advance_ms(7_300 - running_ms);

    assert_eq!(paused.state().remaining_seconds, reference.state().remaining_seconds);
    assert_eq!(paused.state().elapsed_scroll_ms, reference.state().elapsed_scroll_ms);
    assert_eq!(paused.state().current_index, reference.state().current_index);
    assert_eq!(paused.state().pause_count, 5);
}

#[test]
fn test_navigation_while_paused_stays_paused() {
    let (mut engine, _sink) = started_engine(exercise_class(&[5, 5, 5]));
    engine.toggle_pause().unwrap();
    engine.next().unwrap();
    engine.advance_ms(10_000);

    assert!(engine.state().is_paused);
    assert_eq!(engine.state().current_index, 1);
    assert_eq!(engine.state().remaining_seconds, 5);
}

#[test]
fn test_previous_on_first_segment_is_ignored() {
    let (mut engine, _sink) = started_engine(exercise_class(&[5, 5]));
    engine.advance_ms(2_000);
    engine.previous().unwrap();
    assert_eq!(engine.state().current_index, 0);
    assert_eq!(engine.state().remaining_seconds, 3);
    assert_eq!(engine.state().rewind_count, 0);
}

#[test]
fn test_next_on_last_segment_completes_class() {
    let completed = Arc::new(AtomicUsize::new(0));
    let hook = completed.clone();
    let sink = RecordingSink::new();
    let mut engine = PlaybackEngine::builder(exercise_class(&[5, 5]), PlayerConfig::default())
        .telemetry_sink(sink.clone())
        .on_complete(move || {
            hook.fetch_add(1, Ordering::SeqCst);
        })
        .build()
        .unwrap();
    engine.start().unwrap();

    engine.next().unwrap();
    engine.next().unwrap();
    assert_eq!(engine.status(), PlaybackStatus::Completed);
    assert_eq!(completed.load(Ordering::SeqCst), 1);
    assert_eq!(engine.state().skip_count, 1);

    let (was_completed, max_index, _) = sink.session_end().unwrap();
    assert!(!was_completed);
    assert_eq!(max_index, 1);
}

#[test]
fn test_exit_guard_and_on_exit() {
    let exited = Arc::new(AtomicUsize::new(0));
    let hook = exited.clone();
    let mut engine = PlaybackEngine::builder(exercise_class(&[5, 5, 5]), PlayerConfig::default())
        .on_exit(move || {
            hook.fetch_add(1, Ordering::SeqCst);
        })
        .build()
        .unwrap();
    engine.start().unwrap();

    // First segment: no confirmation needed, but keep going
    assert!(!engine.needs_exit_confirmation());
    engine.next().unwrap();
    assert!(engine.needs_exit_confirmation());
    assert!(matches!(engine.exit(false), Err(Error::ConfirmationRequired)));
    assert_eq!(engine.status(), PlaybackStatus::Running);

    // Paused: the guard is lifted
    engine.toggle_pause().unwrap();
    engine.exit(false).unwrap();
    assert_eq!(engine.status(), PlaybackStatus::Exited);
    assert_eq!(exited.load(Ordering::SeqCst), 1);

    drop(engine);
    assert_eq!(exited.load(Ordering::SeqCst), 1);
}

#[test]
fn test_segment_changed_events_carry_cause() {
    let (mut engine, _sink) = started_engine(exercise_class(&[2, 2, 2]));
    let mut rx = engine.events().subscribe();

    engine.advance_ms(2_000);
    engine.next().unwrap();
    engine.previous().unwrap();

    let mut causes = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let CadenceEvent::SegmentChanged { cause, segment, .. } = event {
            causes.push((segment.index, cause));
        }
    }
    assert_eq!(
        causes,
        vec![
            (1, TransitionCause::Natural),
            (2, TransitionCause::SkipForward),
            (1, TransitionCause::SkipBack),
        ]
    );
}

#[test]
fn test_countdown_events_report_progress() {
    let (mut engine, _sink) = started_engine(exercise_class(&[4, 4]));
    let mut rx = engine.events().subscribe();
    engine.advance_ms(2_000);

    let mut last = None;
    while let Ok(event) = rx.try_recv() {
        if let CadenceEvent::Countdown {
            remaining_seconds,
            progress,
            ..
        } = event
        {
            last = Some((remaining_seconds, progress));
        }
    }
    let (remaining, progress) = last.unwrap();
    assert_eq!(remaining, 2);
    assert!((progress - 0.25).abs() < 1e-9);
}

#[test]
fn test_zero_duration_segment_refuses_to_build() {
    let mut class = exercise_class(&[5]);
    class.segments.push(segment(SegmentKind::Cooldown, 0));
    let result = PlaybackEngine::builder(class, PlayerConfig::default()).build();
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
fn test_silent_voiceover_refuses_to_build() {
    let class = class(vec![with_voiceover(segment(SegmentKind::Warmup, 20), 0.0)]);
    let result = PlaybackEngine::builder(class, PlayerConfig::default()).build();
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
fn test_start_twice_is_rejected() {
    let (mut engine, _sink) = started_engine(exercise_class(&[5]));
    assert!(matches!(engine.start(), Err(Error::InvalidState(_))));
}
