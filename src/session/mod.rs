//! Session log and post-session analysis.
//!
//! The live loop appends a subsample of comparison ticks to a [`SessionLog`].
//! Once the stream stops, the log is read-only and feeds two independent
//! batch passes: the worst-moment finder and the session aggregator. The
//! report module stitches both together with optional narrative feedback.

use serde::{Deserialize, Serialize};

use crate::analysis::ComparisonResult;
use crate::pose::Pose;

pub mod aggregator;
pub mod coaching;
pub mod moments;
pub mod report;

pub use aggregator::{analyze_session, Grade, SegmentStatistics, SessionSummary};
pub use moments::{describe_moment, find_worst_moments, Moment, MomentContext};
pub use report::{build_report, NarrativeOutcome, SessionReport};

/// One retained comparison tick with its source poses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSample {
    pub result: ComparisonResult,
    #[serde(default)]
    pub reference_pose: Option<Pose>,
    #[serde(default)]
    pub user_pose: Option<Pose>,
    /// Reference video playback position in seconds
    #[serde(default)]
    pub video_time_s: Option<f64>,
}

impl SessionSample {
    pub fn timestamp_ms(&self) -> u64 {
        self.result.timestamp_ms
    }

    /// Carries both poses and a playback marker.
    pub fn is_complete(&self) -> bool {
        self.reference_pose.is_some() && self.user_pose.is_some() && self.video_time_s.is_some()
    }
}

/// Append-only sample log for one session.
///
/// Written by exactly one producer (the sampling loop); read-only once the
/// session has stopped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionLog {
    /// Wall-clock start of the session (ms since UNIX epoch)
    started_at_ms: u64,
    samples: Vec<SessionSample>,
}

impl SessionLog {
    pub fn new(started_at_ms: u64) -> Self {
        Self {
            started_at_ms,
            samples: Vec::new(),
        }
    }

    pub fn started_at_ms(&self) -> u64 {
        self.started_at_ms
    }

    pub fn push(&mut self, sample: SessionSample) {
        self.samples.push(sample);
    }

    pub fn samples(&self) -> &[SessionSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl From<Vec<SessionSample>> for SessionLog {
    fn from(samples: Vec<SessionSample>) -> Self {
        Self {
            started_at_ms: 0,
            samples,
        }
    }
}

/// Format seconds as `m:ss`.
pub(crate) fn format_clock(seconds: f64) -> String {
    let total = seconds.max(0.0).round() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}
