//! Core telemetry event types describing diagnostics data exposed to
//! CLI/HTTP surfaces.

use serde::{Deserialize, Serialize};

use crate::feedback::CueKind;
use crate::pose::BodySegment;

/// Session lifecycle stages reported by the engine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Started,
    Stopped,
    Analyzed,
}

/// Why a comparison tick produced no result.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    MissingReference,
    MissingUser,
    NotComparable,
}

/// Diagnostic error codes surfaced via telemetry metrics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticError {
    FixtureLoad,
    StreamLagged,
    NarrativeUnavailable,
    Unknown,
}

/// Metric events covering live scores, cue activity, and session lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum MetricEvent {
    Comparison {
        overall: f64,
        worst_segment: Option<BodySegment>,
        /// Mean of the rolling score window
        rolling_avg: f64,
        /// Minimum of the rolling score window
        rolling_min: f64,
        window_size: usize,
    },
    TickSkipped {
        reason: SkipReason,
    },
    VoiceCue {
        kind: CueKind,
        segment: Option<BodySegment>,
    },
    SessionLifecycle {
        phase: SessionPhase,
        timestamp_ms: u64,
    },
    Error {
        code: DiagnosticError,
        context: String,
    },
}
