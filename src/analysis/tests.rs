use super::*;
use crate::pose::landmark::*;
use crate::pose::test_poses::{standing, with};
use crate::pose::{normalize, BodySegment};

fn result_with(scores: &[(BodySegment, Option<f64>)]) -> ComparisonResult {
    ComparisonResult {
        overall: 0.0,
        segments: scores.iter().copied().collect(),
        timestamp_ms: 0,
    }
}

#[test]
fn test_worst_segment_ignores_missing_scores() {
    let result = result_with(&[
        (BodySegment::LeftArm, None),
        (BodySegment::RightArm, Some(62.0)),
        (BodySegment::Torso, Some(48.5)),
        (BodySegment::Head, Some(90.0)),
    ]);
    assert_eq!(result.worst_segment(), Some((BodySegment::Torso, 48.5)));
}

#[test]
fn test_worst_segment_tie_prefers_canonical_order() {
    let result = result_with(&[
        (BodySegment::RightLeg, Some(40.0)),
        (BodySegment::LeftArm, Some(40.0)),
    ]);
    assert_eq!(result.worst_segment(), Some((BodySegment::LeftArm, 40.0)));
}

#[test]
fn test_has_data_requires_a_scored_segment() {
    let empty = result_with(&[(BodySegment::LeftArm, None), (BodySegment::Head, None)]);
    assert!(!empty.has_data());
    assert_eq!(empty.worst_segment(), None);
}

#[test]
fn test_result_serializes_with_camel_case_segments() {
    let pose = standing();
    let result = compare_poses(&pose, &pose, 1200).unwrap();
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["timestampMs"], 1200);
    assert_eq!(json["overall"], 100.0);
    assert!(json["segments"]["leftArm"].is_number());

    let parsed: ComparisonResult = serde_json::from_value(json).unwrap();
    assert_eq!(parsed, result);
}

#[test]
fn test_normalized_comparison_matches_raw_comparison() {
    let reference = standing();
    let user = with(&reference, RIGHT_WRIST, 0.30, 0.30);
    let raw = compare_poses(&reference, &user, 0).unwrap();
    let normalized = compare_normalized(
        &normalize(&reference).unwrap(),
        &normalize(&user).unwrap(),
        0,
    );
    assert_eq!(raw, normalized);
    assert_eq!(
        raw.worst_segment().map(|(segment, _)| segment),
        Some(BodySegment::RightArm)
    );
}

#[test]
fn test_posecode_diff_tracks_scored_difference() {
    let reference = with(&standing(), LEFT_WRIST, 0.62, 0.10);
    let user = standing();
    let result = compare_poses(&reference, &user, 0).unwrap();
    let d = posecode::diff(&posecode::extract(&reference), &posecode::extract(&user));

    assert!(d
        .missing
        .iter()
        .any(|code| code.segment == BodySegment::LeftArm && code.code == PosecodeKind::ArmOverhead));
    let caption = posecode::live_caption(&d, &result, 70.0).unwrap();
    assert!(caption.contains("Left arm"), "{}", caption);
}
