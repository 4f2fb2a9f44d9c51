// Analysis module - per-frame pose comparison
//
// This module holds the per-tick half of the engine: the similarity scorer
// that turns two poses into segment scores, and the posecode extractor that
// describes what each pose is doing in words.
//
// Pipeline: Pose -> normalize -> scorer -> ComparisonResult
//           Pose -> posecode::extract -> posecode::diff -> captions/cues

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::pose::BodySegment;

pub mod posecode;
pub mod scorer;

pub use posecode::{Posecode, PosecodeDiff, PosecodeKind};
pub use scorer::{compare_normalized, compare_poses};

/// Result of one live comparison tick
///
/// Broadcast to the live overlay and retained (subsampled) in the session
/// log for post-session analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    /// Weighted overall score (0-100), 0 when no segment had data
    pub overall: f64,
    /// Per-segment score, `None` when the segment was not visible
    pub segments: BTreeMap<BodySegment, Option<f64>>,
    /// Milliseconds since session start
    pub timestamp_ms: u64,
}

impl ComparisonResult {
    /// Whether any segment produced a score.
    ///
    /// `overall == 0.0` is ambiguous; callers must use this instead.
    pub fn has_data(&self) -> bool {
        self.segments.values().any(Option::is_some)
    }

    pub fn segment(&self, segment: BodySegment) -> Option<f64> {
        self.segments.get(&segment).copied().flatten()
    }

    /// Lowest-scoring segment with data. Ties resolve to the earlier segment
    /// in canonical order.
    pub fn worst_segment(&self) -> Option<(BodySegment, f64)> {
        self.segments
            .iter()
            .filter_map(|(segment, score)| score.map(|s| (*segment, s)))
            .fold(None, |worst, (segment, score)| match worst {
                Some((_, worst_score)) if worst_score <= score => worst,
                _ => Some((segment, score)),
            })
    }
}

#[cfg(test)]
mod tests;
