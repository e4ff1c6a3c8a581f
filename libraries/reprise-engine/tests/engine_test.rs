//! Engine actor tests on virtual time

use reprise_core::{FileId, MediaLocation};
use reprise_engine::{
    ClockBackend, EngineConfig, EngineError, EngineEvent, EngineEvents, EngineHandle, LoadToken,
    PlaybackEngine,
};
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

// ===== Helpers =====

struct Fixture {
    _dir: TempDir,
    path: PathBuf,
    engine: EngineHandle,
    events: EngineEvents,
}

fn fixture(duration: f64) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lecture.mp3");
    std::fs::write(&path, b"stub").unwrap();
    let (engine, events) =
        PlaybackEngine::spawn(Box::new(ClockBackend::fixed(duration)), EngineConfig::default());
    Fixture {
        _dir: dir,
        path,
        engine,
        events,
    }
}

fn token(id: &str, generation: u64) -> LoadToken {
    LoadToken::new(FileId::new(id), generation)
}

/// Receive events until one matches, returning it
async fn wait_for(
    events: &mut EngineEvents,
    mut pred: impl FnMut(&LoadToken, &EngineEvent) -> bool,
) -> (LoadToken, EngineEvent) {
    tokio::time::timeout(Duration::from_secs(30), async {
        loop {
            let cb = events.recv().await.expect("engine gone");
            if pred(&cb.token, &cb.payload) {
                return (cb.token, cb.payload);
            }
        }
    })
    .await
    .expect("timed out waiting for engine event")
}

async fn next_tick(events: &mut EngineEvents) -> f64 {
    match wait_for(events, |_, e| matches!(e, EngineEvent::Tick(_))).await {
        (_, EngineEvent::Tick(t)) => t,
        _ => unreachable!(),
    }
}

fn drain(events: &mut EngineEvents) {
    while events.try_recv().is_ok() {}
}

// ===== Loading =====

#[tokio::test(start_paused = true)]
async fn load_reports_duration_and_resume_position() {
    let mut fx = fixture(120.0);
    let t = token("a", 1);

    fx.engine
        .load(MediaLocation::new(&fx.path), 45.0, t.clone())
        .await
        .unwrap();

    let (tok, event) = wait_for(&mut fx.events, |_, e| {
        matches!(e, EngineEvent::DurationLoaded(_))
    })
    .await;
    assert_eq!(tok, t);
    assert_eq!(event, EngineEvent::DurationLoaded(120.0));

    // Not playing yet, so time sits at the resume point
    assert_eq!(next_tick(&mut fx.events).await, 45.0);
    assert_eq!(next_tick(&mut fx.events).await, 45.0);
}

#[tokio::test(start_paused = true)]
async fn missing_file_is_resource_unavailable() {
    let fx = fixture(10.0);
    let missing = fx.path.with_file_name("nope.mp3");

    let err = fx
        .engine
        .load(MediaLocation::new(missing), 0.0, token("a", 1))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ResourceUnavailable(_)));

    // Nothing loaded, so control commands are refused
    assert!(!fx.engine.play(&token("a", 1)).await);
}

// ===== Control =====

#[tokio::test(start_paused = true)]
async fn play_advances_sampled_time() {
    let mut fx = fixture(120.0);
    let t = token("a", 1);
    fx.engine
        .load(MediaLocation::new(&fx.path), 0.0, t.clone())
        .await
        .unwrap();

    assert!(fx.engine.play(&t).await);
    wait_for(&mut fx.events, |_, e| {
        *e == EngineEvent::PlaybackStateChanged(true)
    })
    .await;

    tokio::time::sleep(Duration::from_secs(2)).await;
    drain(&mut fx.events);
    let time = next_tick(&mut fx.events).await;
    assert!(time >= 2.0 && time < 2.2, "time was {time}");

    assert!(fx.engine.pause(&t).await);
    wait_for(&mut fx.events, |_, e| {
        *e == EngineEvent::PlaybackStateChanged(false)
    })
    .await;
    let paused_at = next_tick(&mut fx.events).await;
    tokio::time::sleep(Duration::from_secs(1)).await;
    drain(&mut fx.events);
    assert_eq!(next_tick(&mut fx.events).await, paused_at);
}

#[tokio::test(start_paused = true)]
async fn stale_token_commands_are_refused() {
    let fx = fixture(60.0);
    let current = token("b", 2);
    fx.engine
        .load(MediaLocation::new(&fx.path), 0.0, current.clone())
        .await
        .unwrap();

    assert!(!fx.engine.play(&token("a", 1)).await);
    assert!(!fx.engine.seek(&token("b", 1), 10.0).await);
    assert!(fx.engine.play(&current).await);
}

#[tokio::test(start_paused = true)]
async fn seek_clamps_to_duration() {
    let mut fx = fixture(100.0);
    let t = token("a", 1);
    fx.engine
        .load(MediaLocation::new(&fx.path), 0.0, t.clone())
        .await
        .unwrap();

    assert!(fx.engine.seek(&t, -5.0).await);
    drain(&mut fx.events);
    assert_eq!(next_tick(&mut fx.events).await, 0.0);

    assert!(fx.engine.seek(&t, 200.0).await);
    drain(&mut fx.events);
    assert_eq!(next_tick(&mut fx.events).await, 100.0);

    assert!(fx.engine.seek(&t, 33.0).await);
    drain(&mut fx.events);
    assert_eq!(next_tick(&mut fx.events).await, 33.0);
}

// ===== End of media =====

#[tokio::test(start_paused = true)]
async fn end_of_media_notifies_handle_and_stops() {
    let mut fx = fixture(2.0);
    let t = token("a", 1);
    let mut handle = fx
        .engine
        .load(MediaLocation::new(&fx.path), 1.5, t.clone())
        .await
        .unwrap();
    assert_eq!(handle.token(), &t);

    assert!(fx.engine.play(&t).await);
    tokio::time::timeout(Duration::from_secs(5), handle.ended())
        .await
        .expect("end of media not reported");
    assert!(handle.has_ended());

    wait_for(&mut fx.events, |_, e| {
        *e == EngineEvent::PlaybackStateChanged(false)
    })
    .await;

    // Seeking back re-arms the notification
    assert!(fx.engine.seek(&t, 0.0).await);
    assert!(!handle.has_ended());
}

// ===== Teardown =====

#[tokio::test(start_paused = true)]
async fn teardown_is_idempotent_and_stops_sampling() {
    let mut fx = fixture(30.0);
    fx.engine.teardown().await.unwrap();
    fx.engine.teardown().await.unwrap();

    let t = token("a", 1);
    fx.engine
        .load(MediaLocation::new(&fx.path), 0.0, t.clone())
        .await
        .unwrap();
    next_tick(&mut fx.events).await;

    fx.engine.teardown().await.unwrap();
    fx.engine.teardown().await.unwrap();
    drain(&mut fx.events);

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(fx.events.try_recv().is_err());
    assert!(!fx.engine.play(&t).await);
}

#[tokio::test(start_paused = true)]
async fn reload_supersedes_previous_token() {
    let mut fx = fixture(30.0);
    let first = token("a", 1);
    let second = token("b", 2);
    fx.engine
        .load(MediaLocation::new(&fx.path), 0.0, first.clone())
        .await
        .unwrap();
    fx.engine
        .load(MediaLocation::new(&fx.path), 0.0, second.clone())
        .await
        .unwrap();
    drain(&mut fx.events);

    let (tok, _) = wait_for(&mut fx.events, |_, e| matches!(e, EngineEvent::Tick(_))).await;
    assert_eq!(tok, second);
    assert!(!fx.engine.play(&first).await);
}

// ===== Probing backend =====

#[tokio::test]
async fn probing_backend_reports_wav_duration() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tone.wav");
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 8000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    for _ in 0..8000 * 3 {
        writer.write_sample(0i16).unwrap();
    }
    writer.finalize().unwrap();

    let (engine, mut events) =
        PlaybackEngine::spawn(Box::new(ClockBackend::probing()), EngineConfig::default());
    engine
        .load(MediaLocation::new(&path), 0.0, token("wav", 1))
        .await
        .unwrap();

    let (_, event) = wait_for(&mut events, |_, e| {
        matches!(e, EngineEvent::DurationLoaded(_))
    })
    .await;
    let EngineEvent::DurationLoaded(duration) = event else {
        unreachable!()
    };
    assert!((duration - 3.0).abs() < 0.01);
}
