//! End-to-end report tests: synthetic track -> replay -> summary, moments, narrative.

use std::path::PathBuf;

use pose_coach::config::AppConfig;
use pose_coach::error::NarrativeErrorCodes;
use pose_coach::fixtures::{synthesize, FixtureReplayer, SynthOptions};
use pose_coach::narrative::RecordedNarrative;
use pose_coach::session::report::{analyze_log, build_report, ReportOptions};
use pose_coach::session::{Grade, NarrativeOutcome, SessionLog};
use pose_coach::BodySegment;

fn replayed_log() -> SessionLog {
    let fixture = synthesize(&SynthOptions::default());
    FixtureReplayer::new(AppConfig::default()).run(&fixture).log
}

fn write_temp(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "pose_coach_report_{}_{}.json",
        name,
        std::process::id()
    ));
    std::fs::write(&path, contents).expect("write temp narrative");
    path
}

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("failed to build test runtime")
        .block_on(future)
}

#[test]
fn synthetic_session_produces_graded_report() {
    let log = replayed_log();
    assert!(log.len() > 50, "only {} samples", log.len());

    let report = analyze_log(&log, &ReportOptions::default());
    assert!(report.summary.is_available());
    assert_ne!(report.summary.grade, Grade::NotAvailable);
    assert_eq!(report.summary.sample_count, log.len());
    assert!(!report.summary.tips.is_empty());
    assert_eq!(report.narrative, NarrativeOutcome::NotRequested);

    assert!(!report.moments.is_empty() && report.moments.len() <= 3);
    for pair in report.moments.windows(2) {
        assert!(pair[0].moment.end_index < pair[1].moment.start_index);
    }
    assert!(report
        .moments
        .iter()
        .any(|m| m.context.worst_segments.first() == Some(&BodySegment::LeftArm)));
}

#[test]
fn narrative_is_paired_with_moments() {
    let log = replayed_log();
    let path = write_temp(
        "ok",
        r#"{"feedback":[
            {"observation":"Left arm stayed low.","tip":"Lift through the shoulder."},
            {"observation":"Timing drifted.","tip":"Watch the count."},
            {"observation":"Good recovery.","tip":"Keep it up."}
        ]}"#,
    );
    let service = RecordedNarrative::new(&path);

    let report = block_on(build_report(&log, &ReportOptions::default(), Some(&service)));
    match &report.narrative {
        NarrativeOutcome::Available { feedback } => assert_eq!(feedback.len(), 3),
        other => panic!("expected narrative, got {other:?}"),
    }
    assert_eq!(
        report.moments[0].narrative.as_ref().map(|n| n.tip.as_str()),
        Some("Lift through the shoulder.")
    );
    std::fs::remove_file(path).ok();
}

#[test]
fn narrative_failure_keeps_local_report() {
    let log = replayed_log();
    let path = write_temp("limited", r#"{"status":429,"body":"slow down"}"#);
    let service = RecordedNarrative::new(&path);

    let local = analyze_log(&log, &ReportOptions::default());
    let report = block_on(build_report(&log, &ReportOptions::default(), Some(&service)));

    match &report.narrative {
        NarrativeOutcome::Unavailable { code, .. } => {
            assert_eq!(*code, NarrativeErrorCodes::RATE_LIMITED)
        }
        other => panic!("expected unavailable, got {other:?}"),
    }
    assert_eq!(report.summary, local.summary);
    assert_eq!(report.moments, local.moments);
    std::fs::remove_file(path).ok();
}

#[test]
fn short_session_is_not_graded() {
    let fixture = synthesize(&SynthOptions {
        duration_s: 0.3,
        ..SynthOptions::default()
    });
    let log = FixtureReplayer::new(AppConfig::default()).run(&fixture).log;
    assert!(log.len() < 3);

    let report = analyze_log(&log, &ReportOptions::default());
    assert_eq!(report.summary.grade, Grade::NotAvailable);
    assert!(report.moments.is_empty());
}
