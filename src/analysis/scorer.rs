//! Similarity scorer - segment-wise cosine comparison of two poses
//!
//! For every bone of every segment, the base->tip vectors of the reference
//! and user poses are compared by cosine similarity. Bones whose endpoints
//! are not confidently tracked in both poses are skipped. The per-segment
//! mean cosine is mapped from [-1, 1] to [0, 100]; the overall score is the
//! weight-averaged segment score rounded to one decimal.

use std::collections::BTreeMap;

use super::ComparisonResult;
use crate::pose::{normalize, BodySegment, Bone, Landmark, NormalizedPose, MIN_VISIBILITY};

/// Vectors shorter than this compare as orthogonal (similarity 0).
const MIN_VECTOR_MAGNITUDE: f64 = 0.0001;

fn bone_vector(pose: &NormalizedPose, bone: Bone) -> [f64; 3] {
    let base = pose.get(bone.base);
    let tip = pose.get(bone.tip);
    [tip.x - base.x, tip.y - base.y, tip.z - base.z]
}

/// Cosine similarity of two 3-D vectors; 0 when either is degenerate.
pub fn cosine_similarity(a: [f64; 3], b: [f64; 3]) -> f64 {
    let dot = a[0] * b[0] + a[1] * b[1] + a[2] * b[2];
    let mag_a = (a[0] * a[0] + a[1] * a[1] + a[2] * a[2]).sqrt();
    let mag_b = (b[0] * b[0] + b[1] * b[1] + b[2] * b[2]).sqrt();
    if mag_a < MIN_VECTOR_MAGNITUDE || mag_b < MIN_VECTOR_MAGNITUDE {
        return 0.0;
    }
    dot / (mag_a * mag_b)
}

fn min_visibility(landmarks: [&Landmark; 4]) -> f64 {
    landmarks
        .iter()
        .map(|lm| lm.visibility)
        .fold(f64::INFINITY, f64::min)
}

/// Score one segment, or `None` when no bone is usable.
pub fn score_segment(
    segment: BodySegment,
    reference: &NormalizedPose,
    user: &NormalizedPose,
) -> Option<f64> {
    let mut cos_sum = 0.0;
    let mut retained = 0usize;

    for &bone in segment.bones() {
        let visibility = min_visibility([
            reference.get(bone.base),
            reference.get(bone.tip),
            user.get(bone.base),
            user.get(bone.tip),
        ]);
        if visibility < MIN_VISIBILITY {
            continue;
        }
        cos_sum += cosine_similarity(bone_vector(reference, bone), bone_vector(user, bone));
        retained += 1;
    }

    if retained == 0 {
        return None;
    }

    let mean_cos = cos_sum / retained as f64;
    Some((((mean_cos + 1.0) / 2.0) * 100.0).clamp(0.0, 100.0))
}

/// Round to one decimal place.
pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Compare two already-normalized poses.
pub fn compare_normalized(
    reference: &NormalizedPose,
    user: &NormalizedPose,
    timestamp_ms: u64,
) -> ComparisonResult {
    let mut segments = BTreeMap::new();
    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;

    for segment in BodySegment::ALL {
        let score = score_segment(segment, reference, user);
        if let Some(value) = score {
            weighted_sum += value * segment.weight();
            weight_total += segment.weight();
        }
        segments.insert(segment, score);
    }

    let overall = if weight_total > 0.0 {
        round1(weighted_sum / weight_total)
    } else {
        0.0
    };

    ComparisonResult {
        overall,
        segments,
        timestamp_ms,
    }
}

/// Normalize both poses and compare them.
///
/// Returns `None` only when either pose cannot be normalized.
pub fn compare_poses(
    reference: &crate::pose::Pose,
    user: &crate::pose::Pose,
    timestamp_ms: u64,
) -> Option<ComparisonResult> {
    let reference = match normalize(reference) {
        Ok(pose) => pose,
        Err(err) => {
            log::debug!("[Scorer] Reference pose not comparable: {}", err);
            return None;
        }
    };
    let user = match normalize(user) {
        Ok(pose) => pose,
        Err(err) => {
            log::debug!("[Scorer] User pose not comparable: {}", err);
            return None;
        }
    };
    Some(compare_normalized(&reference, &user, timestamp_ms))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::landmark::*;
    use crate::pose::test_poses::{standing, with, with_visibility};
    use crate::pose::Pose;

    const EPS: f64 = 1e-6;

    #[test]
    fn test_identical_poses_score_100() {
        let pose = standing();
        let result = compare_poses(&pose, &pose, 0).unwrap();
        assert_eq!(result.overall, 100.0);
        for segment in BodySegment::ALL {
            let score = result.segments[&segment].unwrap();
            assert!((score - 100.0).abs() < EPS, "{:?} = {}", segment, score);
        }
        assert!(result.has_data());
    }

    #[test]
    fn test_translation_and_scale_invariance() {
        let reference = standing();
        let user = with(&reference, LEFT_WRIST, 0.75, 0.35);
        let transform = |pose: &Pose| {
            pose.map(|lm| Landmark {
                x: lm.x * 2.5 + 0.3,
                y: lm.y * 2.5 - 0.1,
                z: lm.z * 2.5 + 0.7,
                visibility: lm.visibility,
            })
        };

        let base = compare_poses(&reference, &user, 5).unwrap();
        let moved = compare_poses(&transform(&reference), &transform(&user), 5).unwrap();

        assert!((base.overall - moved.overall).abs() < 0.05);
        for segment in BodySegment::ALL {
            let a = base.segments[&segment].unwrap();
            let b = moved.segments[&segment].unwrap();
            assert!((a - b).abs() < EPS, "{:?}: {} vs {}", segment, a, b);
        }
    }

    #[test]
    fn test_left_arm_rotated_90_degrees_scores_50() {
        let reference = standing();
        // Rotate elbow and wrist 90 degrees about the left shoulder in the image plane.
        let shoulder = *reference.get(LEFT_SHOULDER);
        let rotate = |lm: &Landmark| {
            let dx = lm.x - shoulder.x;
            let dy = lm.y - shoulder.y;
            (shoulder.x - dy, shoulder.y + dx)
        };
        let (ex, ey) = rotate(reference.get(LEFT_ELBOW));
        let (wx, wy) = rotate(reference.get(LEFT_WRIST));
        let user = with(&with(&reference, LEFT_ELBOW, ex, ey), LEFT_WRIST, wx, wy);

        let result = compare_poses(&reference, &user, 0).unwrap();
        let left_arm = result.segments[&BodySegment::LeftArm].unwrap();
        assert!((left_arm - 50.0).abs() < EPS, "left arm = {}", left_arm);
        let right_arm = result.segments[&BodySegment::RightArm].unwrap();
        assert!((right_arm - 100.0).abs() < EPS);
    }

    #[test]
    fn test_low_visibility_bone_is_skipped() {
        let reference = standing();
        let user = with_visibility(&reference, LEFT_ELBOW, 0.1);
        let result = compare_poses(&reference, &user, 0).unwrap();
        // Both left-arm bones touch the elbow, so the segment has no data.
        assert_eq!(result.segments[&BodySegment::LeftArm], None);
        assert!(result.segments[&BodySegment::RightArm].is_some());
    }

    #[test]
    fn test_no_visible_segments_yields_zero_without_data() {
        let reference = standing().map(|lm| Landmark { visibility: 0.0, ..*lm });
        let result = compare_poses(&reference, &reference, 0).unwrap();
        assert_eq!(result.overall, 0.0);
        assert!(!result.has_data());
    }

    #[test]
    fn test_degenerate_pose_yields_none() {
        let collapsed = standing().map(|_| Landmark::visible(0.2, 0.2, 0.0));
        assert!(compare_poses(&standing(), &collapsed, 0).is_none());
    }

    #[test]
    fn test_zero_vector_counts_as_orthogonal() {
        assert_eq!(cosine_similarity([0.0, 0.0, 0.0], [1.0, 0.0, 0.0]), 0.0);
        assert!((cosine_similarity([1.0, 0.0, 0.0], [-2.0, 0.0, 0.0]) + 1.0).abs() < EPS);
    }

    #[test]
    fn test_overall_is_weighted_and_rounded() {
        let reference = standing();
        let user = with(&reference, LEFT_WRIST, 0.70, 0.40);
        let result = compare_poses(&reference, &user, 0).unwrap();

        let mut sum = 0.0;
        let mut weights = 0.0;
        for (segment, score) in &result.segments {
            if let Some(score) = score {
                sum += score * segment.weight();
                weights += segment.weight();
            }
        }
        assert_eq!(result.overall, round1(sum / weights));
        assert!(result.overall < 100.0);
    }
}
