// Body segments - skeletal groupings used for scoring and feedback
//
// Each segment owns a fixed set of bones (landmark pairs, base -> tip), a
// primary bone used for directional voice cues, and a weight used when the
// per-segment scores are folded into one overall score.

use serde::{Deserialize, Serialize};

use super::landmark::*;

/// A bone as a (base, tip) landmark index pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bone {
    pub base: usize,
    pub tip: usize,
}

const fn bone(base: usize, tip: usize) -> Bone {
    Bone { base, tip }
}

const LEFT_ARM_BONES: [Bone; 2] = [bone(LEFT_SHOULDER, LEFT_ELBOW), bone(LEFT_ELBOW, LEFT_WRIST)];
const RIGHT_ARM_BONES: [Bone; 2] = [
    bone(RIGHT_SHOULDER, RIGHT_ELBOW),
    bone(RIGHT_ELBOW, RIGHT_WRIST),
];
const LEFT_LEG_BONES: [Bone; 2] = [bone(LEFT_HIP, LEFT_KNEE), bone(LEFT_KNEE, LEFT_ANKLE)];
const RIGHT_LEG_BONES: [Bone; 2] = [bone(RIGHT_HIP, RIGHT_KNEE), bone(RIGHT_KNEE, RIGHT_ANKLE)];
const TORSO_BONES: [Bone; 4] = [
    bone(LEFT_SHOULDER, RIGHT_SHOULDER),
    bone(LEFT_HIP, RIGHT_HIP),
    bone(LEFT_HIP, LEFT_SHOULDER),
    bone(RIGHT_HIP, RIGHT_SHOULDER),
];
const HEAD_BONES: [Bone; 3] = [
    bone(LEFT_EAR, RIGHT_EAR),
    bone(LEFT_EAR, NOSE),
    bone(RIGHT_EAR, NOSE),
];

/// Named grouping of bones treated as one scoring/feedback unit
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum BodySegment {
    LeftArm,
    RightArm,
    LeftLeg,
    RightLeg,
    Torso,
    Head,
}

impl BodySegment {
    /// All segments in canonical order.
    pub const ALL: [BodySegment; 6] = [
        BodySegment::LeftArm,
        BodySegment::RightArm,
        BodySegment::LeftLeg,
        BodySegment::RightLeg,
        BodySegment::Torso,
        BodySegment::Head,
    ];

    pub fn bones(&self) -> &'static [Bone] {
        match self {
            BodySegment::LeftArm => &LEFT_ARM_BONES,
            BodySegment::RightArm => &RIGHT_ARM_BONES,
            BodySegment::LeftLeg => &LEFT_LEG_BONES,
            BodySegment::RightLeg => &RIGHT_LEG_BONES,
            BodySegment::Torso => &TORSO_BONES,
            BodySegment::Head => &HEAD_BONES,
        }
    }

    /// Bone whose offset drives raise/lower/shift voice cues.
    pub fn primary_bone(&self) -> Bone {
        match self {
            BodySegment::LeftArm => bone(LEFT_SHOULDER, LEFT_WRIST),
            BodySegment::RightArm => bone(RIGHT_SHOULDER, RIGHT_WRIST),
            BodySegment::LeftLeg => bone(LEFT_HIP, LEFT_ANKLE),
            BodySegment::RightLeg => bone(RIGHT_HIP, RIGHT_ANKLE),
            BodySegment::Torso => bone(LEFT_HIP, LEFT_SHOULDER),
            BodySegment::Head => bone(LEFT_EAR, NOSE),
        }
    }

    /// Weight used for the overall score.
    pub fn weight(&self) -> f64 {
        match self {
            BodySegment::LeftArm
            | BodySegment::RightArm
            | BodySegment::LeftLeg
            | BodySegment::RightLeg => 1.5,
            BodySegment::Torso => 1.0,
            BodySegment::Head => 0.5,
        }
    }

    /// Lower-case name for captions and speech ("left arm").
    pub fn display_name(&self) -> &'static str {
        match self {
            BodySegment::LeftArm => "left arm",
            BodySegment::RightArm => "right arm",
            BodySegment::LeftLeg => "left leg",
            BodySegment::RightLeg => "right leg",
            BodySegment::Torso => "torso",
            BodySegment::Head => "head",
        }
    }

    /// Title-case label for report headings ("Left Arm").
    pub fn label(&self) -> &'static str {
        match self {
            BodySegment::LeftArm => "Left Arm",
            BodySegment::RightArm => "Right Arm",
            BodySegment::LeftLeg => "Left Leg",
            BodySegment::RightLeg => "Right Leg",
            BodySegment::Torso => "Torso",
            BodySegment::Head => "Head",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weights() {
        assert_eq!(BodySegment::LeftArm.weight(), 1.5);
        assert_eq!(BodySegment::RightLeg.weight(), 1.5);
        assert_eq!(BodySegment::Torso.weight(), 1.0);
        assert_eq!(BodySegment::Head.weight(), 0.5);
    }

    #[test]
    fn test_every_segment_has_bones() {
        for segment in BodySegment::ALL {
            assert!(!segment.bones().is_empty(), "{:?} has no bones", segment);
        }
    }

    #[test]
    fn test_serde_uses_camel_case() {
        let json = serde_json::to_string(&BodySegment::LeftArm).unwrap();
        assert_eq!(json, "\"leftArm\"");
        let parsed: BodySegment = serde_json::from_str("\"rightLeg\"").unwrap();
        assert_eq!(parsed, BodySegment::RightLeg);
    }
}
