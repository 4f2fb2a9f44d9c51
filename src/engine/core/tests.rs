use super::*;
use crate::config::ComparisonConfig;
use crate::pose::landmark::LEFT_WRIST;
use crate::pose::test_poses::{standing, with};

impl CoachEngine {
    /// Engine with a fast poll so tests finish quickly.
    pub(crate) fn new_test(poll_interval_ms: u64) -> Self {
        Self::from_config(AppConfig {
            comparison: ComparisonConfig {
                poll_interval_ms,
                sample_every_n_ticks: 1,
                ..ComparisonConfig::default()
            },
            ..AppConfig::default()
        })
    }
}

#[tokio::test]
async fn start_twice_is_rejected() {
    let engine = CoachEngine::new_test(5);
    engine.start_session().unwrap();
    assert_eq!(engine.start_session(), Err(SessionError::AlreadyRunning));
    assert!(engine.is_running());
    engine.stop_session().await.unwrap();
    assert!(!engine.is_running());
}

#[tokio::test]
async fn stop_without_start_is_rejected() {
    let engine = CoachEngine::new_test(5);
    assert_eq!(engine.stop_session().await.unwrap_err(), SessionError::NotRunning);
}

#[test]
fn start_outside_runtime_fails() {
    let engine = CoachEngine::new_test(5);
    assert!(matches!(
        engine.start_session(),
        Err(SessionError::TaskFailed { .. })
    ));
}

#[tokio::test]
async fn missing_poses_produce_empty_log() {
    let engine = CoachEngine::new_test(5);
    engine.publish_reference(Some(standing()));
    engine.start_session().unwrap();
    tokio::time::sleep(Duration::from_millis(40)).await;
    let log = engine.stop_session().await.unwrap();
    assert!(log.is_empty());
}

#[tokio::test]
async fn session_streams_results_and_logs_samples() {
    let engine = CoachEngine::new_test(5);
    engine.publish_reference(Some(with(&standing(), LEFT_WRIST, 0.62, 0.10)));
    engine.publish_user(Some(standing()));
    engine.publish_playback_time(Some(1.5));

    engine.start_session().unwrap();
    let mut results = engine.subscribe_comparisons().unwrap();
    let mut cues = engine.subscribe_cues().unwrap();

    let first = tokio::time::timeout(Duration::from_secs(2), results.recv())
        .await
        .expect("comparison before timeout")
        .unwrap();
    assert!(first.has_data());
    assert!(first.overall < 100.0);

    let cue = tokio::time::timeout(Duration::from_secs(2), cues.recv())
        .await
        .expect("cue before timeout")
        .unwrap();
    assert!(cue.text.contains("left arm"), "{}", cue.text);

    let log = engine.stop_session().await.unwrap();
    assert!(!log.is_empty());
    assert!(log
        .samples()
        .iter()
        .all(|s| s.video_time_s == Some(1.5) && s.is_complete()));
}

#[tokio::test]
async fn muted_engine_emits_no_cues() {
    let engine = CoachEngine::new_test(5);
    engine.mute_voice();
    engine.publish_reference(Some(with(&standing(), LEFT_WRIST, 0.62, 0.10)));
    engine.publish_user(Some(standing()));
    engine.publish_playback_time(Some(0.0));

    engine.start_session().unwrap();
    let mut cues = engine.subscribe_cues().unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    engine.stop_session().await.unwrap();

    // Sender is dropped on stop; no cue was queued before it.
    assert!(matches!(
        cues.try_recv(),
        Err(broadcast::error::TryRecvError::Closed)
    ));
}

#[tokio::test]
async fn analyze_reports_not_available_for_short_sessions() {
    let engine = CoachEngine::new_test(5);
    let report = engine.analyze(&SessionLog::new(0));
    assert!(!report.summary.is_available());
    assert!(report.moments.is_empty());
}
