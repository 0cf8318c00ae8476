//! Engine driven by the tokio runtime wrapper
//!
//! Uses a paused tokio clock so interval ticks are deterministic.

mod helpers;

use std::time::Duration;

use cadence_common::events::PlaybackStatus;
use cadence_common::ClassDefinition;
use cadence_player::error::Error;
use cadence_player::{EngineHandle, EngineRuntime, PlaybackEngine, PlaybackSnapshot, PlayerConfig};
use helpers::*;
use tokio::task::JoinHandle;

const TICK: Duration = Duration::from_millis(50);

fn spawn(class: ClassDefinition) -> (EngineHandle, JoinHandle<PlaybackSnapshot>, RecordingSink) {
    let sink = RecordingSink::new();
    let engine = PlaybackEngine::builder(class, PlayerConfig::default())
        .telemetry_sink(sink.clone())
        .build()
        .unwrap();
    let (handle, task) = EngineRuntime::spawn(engine, TICK).unwrap();
    (handle, task, sink)
}

#[tokio::test(start_paused = true)]
async fn test_interval_drives_countdown() {
    let (handle, _task, _sink) = spawn(exercise_class(&[10, 10]));
    assert_eq!(handle.snapshot().status, PlaybackStatus::Running);
    assert_eq!(handle.snapshot().remaining_seconds, 10);

    tokio::time::sleep(Duration::from_millis(3_500)).await;
    let snapshot = handle.snapshot();
    assert_eq!(snapshot.segment.index, 0);
    assert_eq!(snapshot.remaining_seconds, 7);

    handle.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_commands_reply_with_snapshot() {
    let (handle, _task, _sink) = spawn(exercise_class(&[10, 10, 10]));
    tokio::time::sleep(Duration::from_millis(1_200)).await;

    let moved = handle.next().await.unwrap();
    assert_eq!(moved.segment.index, 1);
    assert_eq!(moved.remaining_seconds, 10);

    let paused = handle.toggle_pause().await.unwrap();
    assert_eq!(paused.status, PlaybackStatus::Paused);
    tokio::time::sleep(Duration::from_millis(5_000)).await;
    assert_eq!(handle.snapshot().remaining_seconds, 10);

    let resumed = handle.toggle_pause().await.unwrap();
    assert_eq!(resumed.status, PlaybackStatus::Running);

    let back = handle.previous().await.unwrap();
    assert_eq!(back.segment.index, 0);

    handle.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_exit_requires_confirmation_then_stops_task() {
    let (handle, task, sink) = spawn(exercise_class(&[10, 10]));
    handle.next().await.unwrap();

    let refused = handle.exit(false).await;
    assert!(matches!(refused, Err(Error::ConfirmationRequired)));
    assert_eq!(handle.snapshot().status, PlaybackStatus::Running);

    let exited = handle.exit(true).await.unwrap();
    assert_eq!(exited.status, PlaybackStatus::Exited);

    let last = task.await.unwrap();
    assert_eq!(last.status, PlaybackStatus::Exited);
    assert_eq!(sink.count("session_end"), 1);

    let late = handle.next().await;
    assert!(matches!(late, Err(Error::EngineStopped)));
}

#[tokio::test(start_paused = true)]
async fn test_class_runs_to_completion() {
    let (handle, task, sink) = spawn(exercise_class(&[1, 1]));
    let mut updates = handle.subscribe();

    let last = task.await.unwrap();
    assert_eq!(last.status, PlaybackStatus::Completed);
    assert!(updates.borrow_and_update().is_terminal());

    let (was_completed, max_index, played) = sink.session_end().unwrap();
    assert!(was_completed);
    assert_eq!(max_index, 1);
    assert_eq!(played, 2);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_tears_engine_down() {
    let (handle, task, sink) = spawn(exercise_class(&[30]));
    tokio::time::sleep(Duration::from_millis(2_100)).await;

    handle.shutdown();
    let last = task.await.unwrap();
    assert_eq!(last.status, PlaybackStatus::Exited);
    assert!(handle.cancellation_token().is_cancelled());

    let (was_completed, _, played) = sink.session_end().unwrap();
    assert!(!was_completed);
    assert_eq!(played, 2);
    assert!(matches!(handle.enable_audio().await, Err(Error::EngineStopped)));
}

#[tokio::test(start_paused = true)]
async fn test_sub_millisecond_steps_accumulate() {
    let (handle, _task, _sink) = spawn(exercise_class(&[10, 10]));

    // Commands land every 0.7ms; each one catches the engine clock up
    for _ in 0..2_000 {
        tokio::time::advance(Duration::from_micros(700)).await;
        handle.enable_audio().await.unwrap();
    }

    let snapshot = handle.snapshot();
    assert!(
        (1_399..=1_400).contains(&snapshot.clock_ms),
        "engine clock {}ms after 1400ms",
        snapshot.clock_ms
    );
    assert_eq!(snapshot.remaining_seconds, 9);

    handle.shutdown();
}
