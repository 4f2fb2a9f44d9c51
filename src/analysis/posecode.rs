//! Posecode extraction - discrete pose features per body segment
//!
//! A posecode is a categorical tag ("arm_raised", "knee_bent", ...) attached
//! to one body segment. Extraction runs on a single raw pose in image space,
//! so thresholds are expressed in image-normalized units. Every rule checks
//! the visibility of the landmarks it reads and is skipped entirely when any
//! of them falls below the floor; rules never emit partial results.
//!
//! Diffing two posecode sets yields what the performer is missing compared
//! to the reference and what they are doing that the reference isn't. The
//! diff feeds live captions, voice cues, and the narrative context text.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::ComparisonResult;
use crate::pose::landmark::*;
use crate::pose::{midpoint, BodySegment, Landmark, Pose};

/// Joint vectors shorter than this make the joint angle undefined.
const MIN_LIMB_LENGTH: f64 = 0.001;

const ARM_TIGHT_BEND_DEG: f64 = 60.0;
const ARM_BEND_DEG: f64 = 100.0;
const ARM_STRAIGHT_DEG: f64 = 155.0;
const KNEE_DEEP_BEND_DEG: f64 = 90.0;
const KNEE_BEND_DEG: f64 = 140.0;
const LEG_STRAIGHT_DEG: f64 = 165.0;

const SIDEWAYS_REACH: f64 = 0.15;
const SIDEWAYS_LEVEL: f64 = 0.08;
const CROSS_MARGIN: f64 = 0.05;
const KNEE_LIFT_MARGIN: f64 = 0.03;
const LEG_SPREAD: f64 = 0.15;
const TORSO_LEAN: f64 = 0.04;
const SHOULDER_TILT: f64 = 0.04;
const TORSO_COMPACT: f64 = 0.08;
const HEAD_TILT: f64 = 0.05;
const HEAD_DROP_MARGIN: f64 = 0.02;

/// Closed set of posecode categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PosecodeKind {
    ArmTightlyBent,
    ArmBent,
    ArmStraight,
    ArmOverhead,
    ArmRaised,
    ArmDropped,
    ArmExtendedSideways,
    ArmCrossed,
    KneeDeepBend,
    KneeBent,
    LegStraight,
    LegRaised,
    LegSpread,
    TorsoLeanLeft,
    TorsoLeanRight,
    ShouldersTilted,
    TorsoCompact,
    HeadTilted,
    HeadDropped,
}

impl PosecodeKind {
    /// Stable snake_case tag.
    pub fn tag(&self) -> &'static str {
        match self {
            PosecodeKind::ArmTightlyBent => "arm_tightly_bent",
            PosecodeKind::ArmBent => "arm_bent",
            PosecodeKind::ArmStraight => "arm_straight",
            PosecodeKind::ArmOverhead => "arm_overhead",
            PosecodeKind::ArmRaised => "arm_raised",
            PosecodeKind::ArmDropped => "arm_dropped",
            PosecodeKind::ArmExtendedSideways => "arm_extended_sideways",
            PosecodeKind::ArmCrossed => "arm_crossed",
            PosecodeKind::KneeDeepBend => "knee_deep_bend",
            PosecodeKind::KneeBent => "knee_bent",
            PosecodeKind::LegStraight => "leg_straight",
            PosecodeKind::LegRaised => "leg_raised",
            PosecodeKind::LegSpread => "leg_spread",
            PosecodeKind::TorsoLeanLeft => "torso_lean_left",
            PosecodeKind::TorsoLeanRight => "torso_lean_right",
            PosecodeKind::ShouldersTilted => "shoulders_tilted",
            PosecodeKind::TorsoCompact => "torso_compact",
            PosecodeKind::HeadTilted => "head_tilted",
            PosecodeKind::HeadDropped => "head_dropped",
        }
    }

    /// Predicate phrase following the segment name.
    fn phrase(&self) -> &'static str {
        match self {
            PosecodeKind::ArmTightlyBent => "tightly bent at the elbow",
            PosecodeKind::ArmBent => "bent at the elbow",
            PosecodeKind::ArmStraight | PosecodeKind::LegStraight => "held straight",
            PosecodeKind::ArmOverhead => "raised overhead",
            PosecodeKind::ArmRaised => "raised above the shoulder",
            PosecodeKind::ArmDropped => "dropped below the hip",
            PosecodeKind::ArmExtendedSideways => "extended out to the side",
            PosecodeKind::ArmCrossed => "crossed over the body",
            PosecodeKind::KneeDeepBend => "in a deep knee bend",
            PosecodeKind::KneeBent => "bent at the knee",
            PosecodeKind::LegRaised => "lifted with the knee above the hip",
            PosecodeKind::LegSpread => "stepped out wide",
            PosecodeKind::TorsoLeanLeft => "leaning left",
            PosecodeKind::TorsoLeanRight => "leaning right",
            PosecodeKind::ShouldersTilted => "tilted at the shoulders",
            PosecodeKind::TorsoCompact => "crunched down",
            PosecodeKind::HeadTilted => "tilted to the side",
            PosecodeKind::HeadDropped => "dropped forward",
        }
    }
}

/// Categorical feature of one segment in one pose
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Posecode {
    pub segment: BodySegment,
    pub code: PosecodeKind,
    pub description: String,
}

impl Posecode {
    pub fn new(segment: BodySegment, code: PosecodeKind) -> Self {
        let name = segment.display_name();
        let mut description = String::with_capacity(name.len() + 32);
        let mut chars = name.chars();
        if let Some(first) = chars.next() {
            description.extend(first.to_uppercase());
            description.push_str(chars.as_str());
        }
        description.push(' ');
        description.push_str(code.phrase());
        Self {
            segment,
            code,
            description,
        }
    }

    fn key(&self) -> (BodySegment, PosecodeKind) {
        (self.segment, self.code)
    }

    /// Instruction phrased for speech ("Get your left arm raised above the shoulder").
    pub fn speech(&self) -> String {
        format!(
            "Get your {} {}",
            self.segment.display_name(),
            self.code.phrase()
        )
    }
}

/// Interior angle in degrees at `joint`, `None` when either limb is degenerate.
pub fn joint_angle(a: &Landmark, joint: &Landmark, c: &Landmark) -> Option<f64> {
    let u = [a.x - joint.x, a.y - joint.y, a.z - joint.z];
    let v = [c.x - joint.x, c.y - joint.y, c.z - joint.z];
    let len_u = (u[0] * u[0] + u[1] * u[1] + u[2] * u[2]).sqrt();
    let len_v = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if len_u < MIN_LIMB_LENGTH || len_v < MIN_LIMB_LENGTH {
        return None;
    }
    let cos = ((u[0] * v[0] + u[1] * v[1] + u[2] * v[2]) / (len_u * len_v)).clamp(-1.0, 1.0);
    Some(cos.acos().to_degrees())
}

/// Landmark indices for one side of the body.
struct Side {
    arm: BodySegment,
    leg: BodySegment,
    shoulder: usize,
    elbow: usize,
    wrist: usize,
    hip: usize,
    knee: usize,
    ankle: usize,
}

const LEFT: Side = Side {
    arm: BodySegment::LeftArm,
    leg: BodySegment::LeftLeg,
    shoulder: LEFT_SHOULDER,
    elbow: LEFT_ELBOW,
    wrist: LEFT_WRIST,
    hip: LEFT_HIP,
    knee: LEFT_KNEE,
    ankle: LEFT_ANKLE,
};

const RIGHT: Side = Side {
    arm: BodySegment::RightArm,
    leg: BodySegment::RightLeg,
    shoulder: RIGHT_SHOULDER,
    elbow: RIGHT_ELBOW,
    wrist: RIGHT_WRIST,
    hip: RIGHT_HIP,
    knee: RIGHT_KNEE,
    ankle: RIGHT_ANKLE,
};

/// Midpoint of a landmark pair when both are visible.
fn visible_midpoint(pose: &Pose, a: usize, b: usize) -> Option<Landmark> {
    Some(midpoint(pose.visible(a)?, pose.visible(b)?))
}

fn elbow_bend(pose: &Pose, side: &Side) -> Option<PosecodeKind> {
    let angle = joint_angle(
        pose.visible(side.shoulder)?,
        pose.visible(side.elbow)?,
        pose.visible(side.wrist)?,
    )?;
    if angle < ARM_TIGHT_BEND_DEG {
        Some(PosecodeKind::ArmTightlyBent)
    } else if angle <= ARM_BEND_DEG {
        Some(PosecodeKind::ArmBent)
    } else if angle > ARM_STRAIGHT_DEG {
        Some(PosecodeKind::ArmStraight)
    } else {
        None
    }
}

fn wrist_height(pose: &Pose, side: &Side) -> Option<PosecodeKind> {
    let wrist = pose.visible(side.wrist)?;
    let shoulder = pose.visible(side.shoulder)?;

    if let Some(nose) = pose.visible(NOSE) {
        if wrist.y < nose.y {
            return Some(PosecodeKind::ArmOverhead);
        }
    }
    if wrist.y < shoulder.y {
        return Some(PosecodeKind::ArmRaised);
    }
    match pose.visible(side.hip) {
        Some(hip) if wrist.y > hip.y => Some(PosecodeKind::ArmDropped),
        _ => None,
    }
}

fn arm_sideways(pose: &Pose, side: &Side) -> Option<PosecodeKind> {
    let wrist = pose.visible(side.wrist)?;
    let shoulder = pose.visible(side.shoulder)?;
    let reach = (wrist.x - shoulder.x).abs();
    let level = (wrist.y - shoulder.y).abs();
    (reach > SIDEWAYS_REACH && level < SIDEWAYS_LEVEL).then_some(PosecodeKind::ArmExtendedSideways)
}

fn arm_crossed(pose: &Pose, side: &Side) -> Option<PosecodeKind> {
    let wrist = pose.visible(side.wrist)?;
    let shoulder = pose.visible(side.shoulder)?;
    let midline = visible_midpoint(pose, LEFT_SHOULDER, RIGHT_SHOULDER)?.x;
    let own_side = (shoulder.x - midline).signum();
    (own_side * (wrist.x - midline) < -CROSS_MARGIN).then_some(PosecodeKind::ArmCrossed)
}

fn knee_bend(pose: &Pose, side: &Side) -> Option<PosecodeKind> {
    let angle = joint_angle(
        pose.visible(side.hip)?,
        pose.visible(side.knee)?,
        pose.visible(side.ankle)?,
    )?;
    if angle < KNEE_DEEP_BEND_DEG {
        Some(PosecodeKind::KneeDeepBend)
    } else if angle <= KNEE_BEND_DEG {
        Some(PosecodeKind::KneeBent)
    } else if angle > LEG_STRAIGHT_DEG {
        Some(PosecodeKind::LegStraight)
    } else {
        None
    }
}

fn leg_raised(pose: &Pose, side: &Side) -> Option<PosecodeKind> {
    let knee = pose.visible(side.knee)?;
    let hip = pose.visible(side.hip)?;
    (knee.y < hip.y - KNEE_LIFT_MARGIN).then_some(PosecodeKind::LegRaised)
}

fn leg_spread(pose: &Pose, side: &Side) -> Option<PosecodeKind> {
    let ankle = pose.visible(side.ankle)?;
    let hip_mid = visible_midpoint(pose, LEFT_HIP, RIGHT_HIP)?;
    ((ankle.x - hip_mid.x).abs() > LEG_SPREAD).then_some(PosecodeKind::LegSpread)
}

fn torso_lean(pose: &Pose) -> Option<PosecodeKind> {
    let shoulder_mid = visible_midpoint(pose, LEFT_SHOULDER, RIGHT_SHOULDER)?;
    let hip_mid = visible_midpoint(pose, LEFT_HIP, RIGHT_HIP)?;
    let offset = shoulder_mid.x - hip_mid.x;
    if offset < -TORSO_LEAN {
        Some(PosecodeKind::TorsoLeanLeft)
    } else if offset > TORSO_LEAN {
        Some(PosecodeKind::TorsoLeanRight)
    } else {
        None
    }
}

fn shoulders_tilted(pose: &Pose) -> Option<PosecodeKind> {
    let left = pose.visible(LEFT_SHOULDER)?;
    let right = pose.visible(RIGHT_SHOULDER)?;
    ((left.y - right.y).abs() > SHOULDER_TILT).then_some(PosecodeKind::ShouldersTilted)
}

fn torso_compact(pose: &Pose) -> Option<PosecodeKind> {
    let shoulder_mid = visible_midpoint(pose, LEFT_SHOULDER, RIGHT_SHOULDER)?;
    let hip_mid = visible_midpoint(pose, LEFT_HIP, RIGHT_HIP)?;
    ((hip_mid.y - shoulder_mid.y).abs() < TORSO_COMPACT).then_some(PosecodeKind::TorsoCompact)
}

fn head_tilted(pose: &Pose) -> Option<PosecodeKind> {
    let nose = pose.visible(NOSE)?;
    let shoulder_mid = visible_midpoint(pose, LEFT_SHOULDER, RIGHT_SHOULDER)?;
    ((nose.x - shoulder_mid.x).abs() > HEAD_TILT).then_some(PosecodeKind::HeadTilted)
}

fn head_dropped(pose: &Pose) -> Option<PosecodeKind> {
    let nose = pose.visible(NOSE)?;
    let shoulder_mid = visible_midpoint(pose, LEFT_SHOULDER, RIGHT_SHOULDER)?;
    (nose.y > shoulder_mid.y + HEAD_DROP_MARGIN).then_some(PosecodeKind::HeadDropped)
}

type SideRule = fn(&Pose, &Side) -> Option<PosecodeKind>;
type BodyRule = fn(&Pose) -> Option<PosecodeKind>;

const ARM_RULES: [SideRule; 4] = [elbow_bend, wrist_height, arm_sideways, arm_crossed];
const LEG_RULES: [SideRule; 3] = [knee_bend, leg_raised, leg_spread];
const TORSO_RULES: [BodyRule; 3] = [torso_lean, shoulders_tilted, torso_compact];
const HEAD_RULES: [BodyRule; 2] = [head_tilted, head_dropped];

/// Classify a single pose into posecodes.
///
/// Output order: left arm, right arm, left leg, right leg, torso, head; rules
/// within a segment in table order.
pub fn extract(pose: &Pose) -> Vec<Posecode> {
    let mut codes = Vec::new();

    for side in [&LEFT, &RIGHT] {
        codes.extend(
            ARM_RULES
                .iter()
                .filter_map(|rule| rule(pose, side))
                .map(|kind| Posecode::new(side.arm, kind)),
        );
    }
    for side in [&LEFT, &RIGHT] {
        codes.extend(
            LEG_RULES
                .iter()
                .filter_map(|rule| rule(pose, side))
                .map(|kind| Posecode::new(side.leg, kind)),
        );
    }
    codes.extend(
        TORSO_RULES
            .iter()
            .filter_map(|rule| rule(pose))
            .map(|kind| Posecode::new(BodySegment::Torso, kind)),
    );
    codes.extend(
        HEAD_RULES
            .iter()
            .filter_map(|rule| rule(pose))
            .map(|kind| Posecode::new(BodySegment::Head, kind)),
    );

    codes
}

/// Difference between reference and user posecodes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PosecodeDiff {
    /// In the reference but not the user, reference order
    pub missing: Vec<Posecode>,
    /// In the user but not the reference, user order
    pub extra: Vec<Posecode>,
}

fn missing_text(code: &Posecode) -> String {
    format!("Try to match: {}", code.description)
}

fn extra_text(code: &Posecode) -> String {
    format!("Reference doesn't do this here: {}", code.description)
}

impl PosecodeDiff {
    pub fn is_empty(&self) -> bool {
        self.missing.is_empty() && self.extra.is_empty()
    }

    /// All missing descriptions, then all extra descriptions.
    pub fn descriptions(&self) -> Vec<String> {
        self.missing
            .iter()
            .map(missing_text)
            .chain(self.extra.iter().map(extra_text))
            .collect()
    }

    fn first_for(&self, segment: BodySegment) -> Option<String> {
        self.missing
            .iter()
            .find(|code| code.segment == segment)
            .map(missing_text)
            .or_else(|| {
                self.extra
                    .iter()
                    .find(|code| code.segment == segment)
                    .map(extra_text)
            })
    }
}

/// Diff two posecode sets keyed by (segment, code).
pub fn diff(reference: &[Posecode], user: &[Posecode]) -> PosecodeDiff {
    let reference_keys: HashSet<_> = reference.iter().map(Posecode::key).collect();
    let user_keys: HashSet<_> = user.iter().map(Posecode::key).collect();

    PosecodeDiff {
        missing: reference
            .iter()
            .filter(|code| !user_keys.contains(&code.key()))
            .cloned()
            .collect(),
        extra: user
            .iter()
            .filter(|code| !reference_keys.contains(&code.key()))
            .cloned()
            .collect(),
    }
}

/// Best single caption for the live overlay.
///
/// Prefers a diff entry about the worst segment when it scores below
/// `threshold`; otherwise the first available description.
pub fn live_caption(diff: &PosecodeDiff, result: &ComparisonResult, threshold: f64) -> Option<String> {
    if let Some((segment, score)) = result.worst_segment() {
        if score < threshold {
            if let Some(caption) = diff.first_for(segment) {
                return Some(caption);
            }
        }
    }
    diff.descriptions().into_iter().next()
}

/// Voice-friendly cue: the reference's first posecode for the worst segment,
/// else the first available description.
pub fn voice_cue(
    reference: &[Posecode],
    diff: &PosecodeDiff,
    result: &ComparisonResult,
) -> Option<String> {
    result
        .worst_segment()
        .and_then(|(segment, _)| reference.iter().find(|code| code.segment == segment))
        .map(Posecode::speech)
        .or_else(|| diff.descriptions().into_iter().next())
}

fn join_codes(codes: &[Posecode]) -> String {
    if codes.is_empty() {
        return "none".to_string();
    }
    codes
        .iter()
        .map(|code| format!("{}: {}", code.segment.display_name(), code.code.tag()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Three-line context block for the narrative service.
pub fn summary_text(reference: &[Posecode], user: &[Posecode], diff: &PosecodeDiff) -> String {
    let differences = if diff.is_empty() {
        "none".to_string()
    } else {
        diff.descriptions().join("; ")
    };
    format!(
        "Reference: {}\nYou: {}\nDifferences: {}",
        join_codes(reference),
        join_codes(user),
        differences
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::test_poses::{standing, with, with_visibility};
    use std::collections::BTreeMap;

    fn kinds_for(codes: &[Posecode], segment: BodySegment) -> Vec<PosecodeKind> {
        codes
            .iter()
            .filter(|code| code.segment == segment)
            .map(|code| code.code)
            .collect()
    }

    fn result_with(scores: &[(BodySegment, f64)]) -> ComparisonResult {
        let mut segments: BTreeMap<_, _> = BodySegment::ALL.iter().map(|s| (*s, None)).collect();
        for (segment, score) in scores {
            segments.insert(*segment, Some(*score));
        }
        ComparisonResult {
            overall: 0.0,
            segments,
            timestamp_ms: 0,
        }
    }

    /// Left arm held straight out to the side at shoulder height.
    fn t_pose_left_arm() -> Pose {
        let pose = standing();
        let pose = with(&pose, LEFT_ELBOW, 0.72, 0.30);
        with(&pose, LEFT_WRIST, 0.84, 0.31)
    }

    /// Right leg kept straight but planted wide.
    fn wide_right_leg() -> Pose {
        let pose = with(&standing(), RIGHT_KNEE, 0.37, 0.74);
        with(&pose, RIGHT_ANKLE, 0.30, 0.90)
    }

    #[test]
    fn test_standing_pose_codes() {
        let codes = extract(&standing());
        assert_eq!(kinds_for(&codes, BodySegment::LeftLeg), vec![PosecodeKind::LegStraight]);
        assert_eq!(kinds_for(&codes, BodySegment::RightLeg), vec![PosecodeKind::LegStraight]);
        assert!(kinds_for(&codes, BodySegment::Torso).is_empty());
        assert!(kinds_for(&codes, BodySegment::Head).is_empty());
    }

    #[test]
    fn test_joint_angle() {
        let a = Landmark::visible(1.0, 0.0, 0.0);
        let joint = Landmark::visible(0.0, 0.0, 0.0);
        let c = Landmark::visible(0.0, 1.0, 0.0);
        assert!((joint_angle(&a, &joint, &c).unwrap() - 90.0).abs() < 1e-9);
        assert!(joint_angle(&joint, &joint, &c).is_none());
    }

    #[test]
    fn test_arm_extended_sideways_and_straight() {
        let codes = extract(&t_pose_left_arm());
        let left = kinds_for(&codes, BodySegment::LeftArm);
        assert!(left.contains(&PosecodeKind::ArmStraight));
        assert!(left.contains(&PosecodeKind::ArmExtendedSideways));
        assert!(!left.contains(&PosecodeKind::ArmCrossed));
    }

    #[test]
    fn test_arm_height_tiers() {
        let overhead = with(&standing(), LEFT_WRIST, 0.62, 0.10);
        assert!(kinds_for(&extract(&overhead), BodySegment::LeftArm)
            .contains(&PosecodeKind::ArmOverhead));

        let raised = with(&standing(), LEFT_WRIST, 0.66, 0.25);
        let left = kinds_for(&extract(&raised), BodySegment::LeftArm);
        assert!(left.contains(&PosecodeKind::ArmRaised));
        assert!(!left.contains(&PosecodeKind::ArmOverhead));

        let dropped = with(&standing(), LEFT_WRIST, 0.62, 0.64);
        assert!(kinds_for(&extract(&dropped), BodySegment::LeftArm)
            .contains(&PosecodeKind::ArmDropped));
    }

    #[test]
    fn test_arm_crossed_toward_opposite_side() {
        let pose = with(&standing(), LEFT_ELBOW, 0.52, 0.40);
        let pose = with(&pose, LEFT_WRIST, 0.44, 0.32);
        let left = kinds_for(&extract(&pose), BodySegment::LeftArm);
        assert!(left.contains(&PosecodeKind::ArmCrossed));
        assert!(left.contains(&PosecodeKind::ArmBent) || left.contains(&PosecodeKind::ArmTightlyBent));
    }

    #[test]
    fn test_knee_bends_and_raised_leg() {
        let pose = with(&standing(), LEFT_KNEE, 0.66, 0.52);
        let pose = with(&pose, LEFT_ANKLE, 0.66, 0.70);
        let left = kinds_for(&extract(&pose), BodySegment::LeftLeg);
        assert!(left.contains(&PosecodeKind::LegRaised));
        assert!(left.contains(&PosecodeKind::KneeDeepBend));
    }

    #[test]
    fn test_leg_spread() {
        let right = kinds_for(&extract(&wide_right_leg()), BodySegment::RightLeg);
        assert_eq!(right, vec![PosecodeKind::LegStraight, PosecodeKind::LegSpread]);
    }

    #[test]
    fn test_torso_and_head_rules() {
        let mut pose = with(&standing(), LEFT_SHOULDER, 0.68, 0.24);
        pose = with(&pose, RIGHT_SHOULDER, 0.48, 0.32);
        pose = with(&pose, NOSE, 0.64, 0.14);
        let codes = extract(&pose);
        let torso = kinds_for(&codes, BodySegment::Torso);
        assert!(torso.contains(&PosecodeKind::TorsoLeanRight));
        assert!(torso.contains(&PosecodeKind::ShouldersTilted));
        assert!(kinds_for(&codes, BodySegment::Head).contains(&PosecodeKind::HeadTilted));
    }

    #[test]
    fn test_head_dropped_and_torso_compact() {
        let mut pose = with(&standing(), LEFT_SHOULDER, 0.60, 0.52);
        pose = with(&pose, RIGHT_SHOULDER, 0.40, 0.52);
        pose = with(&pose, NOSE, 0.50, 0.56);
        let codes = extract(&pose);
        assert!(kinds_for(&codes, BodySegment::Torso).contains(&PosecodeKind::TorsoCompact));
        assert!(kinds_for(&codes, BodySegment::Head).contains(&PosecodeKind::HeadDropped));
    }

    #[test]
    fn test_low_visibility_skips_rule() {
        let pose = with_visibility(&t_pose_left_arm(), LEFT_WRIST, 0.2);
        assert!(kinds_for(&extract(&pose), BodySegment::LeftArm).is_empty());
    }

    #[test]
    fn test_diff_orders_missing_then_extra() {
        let reference = extract(&t_pose_left_arm());
        let user = extract(&wide_right_leg());
        let d = diff(&reference, &user);

        assert!(d.missing.iter().all(|c| c.segment == BodySegment::LeftArm));
        assert_eq!(d.extra.len(), 1);
        assert_eq!(d.extra[0].code, PosecodeKind::LegSpread);

        let descriptions = d.descriptions();
        assert_eq!(descriptions.len(), d.missing.len() + d.extra.len());
        assert!(descriptions[0].starts_with("Try to match: Left arm"));
        assert!(descriptions
            .last()
            .unwrap()
            .starts_with("Reference doesn't do this here: Right leg"));
    }

    #[test]
    fn test_identical_sets_diff_empty() {
        let codes = extract(&standing());
        assert!(diff(&codes, &codes).is_empty());
    }

    #[test]
    fn test_live_caption_targets_worst_segment() {
        let reference = extract(&t_pose_left_arm());
        let user = extract(&wide_right_leg());
        let d = diff(&reference, &user);

        let result = result_with(&[(BodySegment::LeftArm, 90.0), (BodySegment::RightLeg, 40.0)]);
        let caption = live_caption(&d, &result, 70.0).unwrap();
        assert!(caption.contains("Right leg stepped out wide"), "{}", caption);

        let result = result_with(&[(BodySegment::LeftArm, 90.0), (BodySegment::RightLeg, 80.0)]);
        let caption = live_caption(&d, &result, 70.0).unwrap();
        assert_eq!(caption, d.descriptions()[0]);
    }

    #[test]
    fn test_voice_cue_prefers_reference_code() {
        let reference = extract(&t_pose_left_arm());
        let user = extract(&standing());
        let d = diff(&reference, &user);
        let result = result_with(&[(BodySegment::LeftArm, 30.0), (BodySegment::Torso, 90.0)]);
        let cue = voice_cue(&reference, &d, &result).unwrap();
        assert!(cue.starts_with("Get your left arm"), "{}", cue);

        let result = result_with(&[(BodySegment::Head, 30.0)]);
        let cue = voice_cue(&reference, &d, &result).unwrap();
        assert_eq!(cue, d.descriptions()[0]);
    }

    #[test]
    fn test_summary_text_has_three_lines() {
        let reference = extract(&t_pose_left_arm());
        let user = extract(&standing());
        let text = summary_text(&reference, &user, &diff(&reference, &user));
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Reference: left arm: arm_straight"));
        assert!(lines[1].starts_with("You: left leg: leg_straight"));
        assert!(lines[2].starts_with("Differences: Try to match"));
    }
}
