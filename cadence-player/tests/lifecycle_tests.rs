//! Wake lock handling and teardown ordering

mod helpers;

use cadence_common::SegmentKind;
use cadence_player::{PlaybackEngine, PlayerConfig};
use helpers::*;

fn logged_engine(log: &OrderLog, lock: &CountingWakeLock) -> PlaybackEngine {
    let class = class_with_music(
        vec![
            with_voiceover(segment(SegmentKind::Warmup, 20), 15.0),
            segment(SegmentKind::Exercise, 20),
        ],
        playlist("up", 2, 120.0),
        playlist("calm", 2, 120.0),
    );
    PlaybackEngine::builder(class, PlayerConfig::default())
        .music_backend(LoggedAudioBackend::new("music", log.clone()))
        .voiceover_backend(LoggedAudioBackend::new("voiceover", log.clone()))
        .wake_lock(lock.clone())
        .telemetry_sink(RecordingSink::with_log(log.clone()))
        .build()
        .unwrap()
}

#[test]
fn test_teardown_releases_in_order() {
    let log = OrderLog::default();
    let lock = CountingWakeLock::with_log(log.clone());
    let mut engine = logged_engine(&log, &lock);
    engine.start().unwrap();
    engine.advance_ms(5_000);

    log.clear();
    engine.teardown();

    assert_eq!(
        log.entries(),
        vec![
            "audio:music:unload",
            "audio:voiceover:unload",
            "wake_lock:release",
            "telemetry:section_end",
            "telemetry:session_end",
        ]
    );

    // Nothing happens twice
    engine.teardown();
    drop(engine);
    assert_eq!(log.entries().len(), 5);
    assert_eq!(lock.released(), 1);
}

#[test]
fn test_teardown_while_paused() {
    let log = OrderLog::default();
    let lock = CountingWakeLock::with_log(log.clone());
    let mut engine = logged_engine(&log, &lock);
    engine.start().unwrap();
    engine.advance_ms(3_000);
    engine.toggle_pause().unwrap();
    assert_eq!(lock.released(), 1);

    log.clear();
    drop(engine);

    // Wake lock already released by the pause
    assert_eq!(
        log.entries(),
        vec![
            "audio:music:unload",
            "audio:voiceover:unload",
            "telemetry:section_end",
            "telemetry:session_end",
        ]
    );
    assert_eq!(lock.released(), 1);
}

#[test]
fn test_wake_lock_follows_pause_state() {
    let log = OrderLog::default();
    let lock = CountingWakeLock::default();
    let mut engine = logged_engine(&log, &lock);
    assert_eq!(lock.acquired(), 0);

    engine.start().unwrap();
    assert_eq!(lock.acquired(), 1);

    for _ in 0..3 {
        engine.toggle_pause().unwrap();
        engine.toggle_pause().unwrap();
    }
    assert_eq!(lock.acquired(), 4);
    assert_eq!(lock.released(), 3);
}

#[test]
fn test_teardown_before_start_reports_nothing() {
    let log = OrderLog::default();
    let lock = CountingWakeLock::with_log(log.clone());
    let engine = logged_engine(&log, &lock);
    drop(engine);
    assert!(log.entries().is_empty());
    assert_eq!(lock.acquired(), 0);
}
