//! Synchronous comparison core driven once per polling tick.

use crate::analysis::{compare_poses, posecode, ComparisonResult};
use crate::config::{AppConfig, ComparisonConfig};
use crate::feedback::{VoiceCue, VoiceCueThrottle};
use crate::pose::Pose;
use crate::session::{SessionLog, SessionSample};
use crate::telemetry::{self, SkipReason};

/// Everything one scored tick produces for the live outputs.
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutcome {
    pub result: ComparisonResult,
    pub caption: Option<String>,
    pub cue: Option<VoiceCue>,
}

/// Per-session state: voice throttle, sample log, and tick counter.
///
/// Not shared; the sampling loop owns it for the whole session.
pub struct ComparisonSession {
    comparison: ComparisonConfig,
    throttle: VoiceCueThrottle,
    log: SessionLog,
    comparisons: u64,
}

impl ComparisonSession {
    pub fn new(config: &AppConfig, started_at_ms: u64) -> Self {
        let mut throttle = VoiceCueThrottle::new(config.voice.clone());
        throttle.reset();
        Self {
            comparison: config.comparison.clone(),
            throttle,
            log: SessionLog::new(started_at_ms),
            comparisons: 0,
        }
    }

    pub fn throttle_mut(&mut self) -> &mut VoiceCueThrottle {
        &mut self.throttle
    }

    pub fn log(&self) -> &SessionLog {
        &self.log
    }

    /// Number of scored ticks so far.
    pub fn comparisons(&self) -> u64 {
        self.comparisons
    }

    /// Score the current pose pair.
    ///
    /// `now_ms` is milliseconds since session start. Returns `None` (and
    /// appends nothing) when either pose is absent or cannot be normalized.
    pub fn tick(
        &mut self,
        now_ms: u64,
        reference: Option<&Pose>,
        user: Option<&Pose>,
        video_time_s: Option<f64>,
    ) -> Option<TickOutcome> {
        let hub = telemetry::hub();
        let Some(reference) = reference else {
            hub.record_skip(SkipReason::MissingReference);
            return None;
        };
        let Some(user) = user else {
            hub.record_skip(SkipReason::MissingUser);
            return None;
        };
        let Some(result) = compare_poses(reference, user, now_ms) else {
            hub.record_skip(SkipReason::NotComparable);
            return None;
        };

        let reference_codes = posecode::extract(reference);
        let user_codes = posecode::extract(user);
        let diff = posecode::diff(&reference_codes, &user_codes);
        let caption = posecode::live_caption(&diff, &result, self.comparison.caption_threshold);
        let spoken_hint = posecode::voice_cue(&reference_codes, &diff, &result);
        let cue = self.throttle.evaluate(
            now_ms,
            &result,
            Some(reference),
            Some(user),
            spoken_hint.as_deref(),
        );

        let every = u64::from(self.comparison.sample_every_n_ticks.max(1));
        if self.comparisons % every == 0 {
            self.log.push(SessionSample {
                result: result.clone(),
                reference_pose: Some(reference.clone()),
                user_pose: Some(user.clone()),
                video_time_s,
            });
        }
        self.comparisons += 1;

        hub.record_comparison(&result);
        if let Some(cue) = &cue {
            hub.record_cue(cue);
        }

        Some(TickOutcome {
            result,
            caption,
            cue,
        })
    }

    /// End the session and hand over the sample log.
    pub fn finish(self) -> SessionLog {
        self.log
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::CueKind;
    use crate::pose::landmark::*;
    use crate::pose::test_poses::{standing, with};
    use crate::pose::{BodySegment, Landmark};

    fn session() -> ComparisonSession {
        ComparisonSession::new(&AppConfig::default(), 0)
    }

    #[test]
    fn test_missing_pose_skips_tick() {
        let mut session = session();
        let pose = standing();
        assert!(session.tick(0, None, Some(&pose), Some(0.0)).is_none());
        assert!(session.tick(100, Some(&pose), None, Some(0.1)).is_none());
        assert!(session.log().is_empty());
        assert_eq!(session.comparisons(), 0);
    }

    #[test]
    fn test_degenerate_pose_skips_tick() {
        let mut session = session();
        let collapsed = standing().map(|_| Landmark::visible(0.5, 0.5, 0.0));
        assert!(session
            .tick(0, Some(&standing()), Some(&collapsed), None)
            .is_none());
    }

    #[test]
    fn test_every_third_comparison_is_logged() {
        let mut session = session();
        let pose = standing();
        for i in 0..7u64 {
            let outcome = session.tick(i * 100, Some(&pose), Some(&pose), Some(i as f64 * 0.1));
            assert!(outcome.is_some());
        }
        let log = session.finish();
        let kept: Vec<u64> = log.samples().iter().map(|s| s.timestamp_ms()).collect();
        assert_eq!(kept, vec![0, 300, 600]);
        assert!(log.samples().iter().all(|s| s.is_complete()));
    }

    #[test]
    fn test_bad_arm_produces_caption_and_cue() {
        let mut session = session();
        let reference = with(&standing(), LEFT_WRIST, 0.62, 0.10);
        let user = standing();
        let outcome = session
            .tick(0, Some(&reference), Some(&user), Some(0.0))
            .unwrap();

        assert_eq!(
            outcome.result.worst_segment().map(|(s, _)| s),
            Some(BodySegment::LeftArm)
        );
        assert!(outcome.caption.unwrap().contains("Left arm"));
        let cue = outcome.cue.unwrap();
        assert_eq!(cue.kind, CueKind::Correction);
        assert!(cue.text.contains("left arm"), "{}", cue.text);

        // Cooldown holds the next identical tick back.
        let again = session
            .tick(100, Some(&reference), Some(&user), Some(0.1))
            .unwrap();
        assert!(again.cue.is_none());
    }

    #[test]
    fn test_muted_throttle_stays_silent() {
        let mut session = session();
        session.throttle_mut().mute();
        let reference = with(&standing(), LEFT_WRIST, 0.62, 0.10);
        let outcome = session
            .tick(0, Some(&reference), Some(&standing()), None)
            .unwrap();
        assert!(outcome.cue.is_none());
    }
}
