//! Pose model - 33-point body landmarks
//!
//! This module defines the landmark layout produced by the external
//! pose-detection provider (BlazePose ordering) and the normalized,
//! body-centered representation the scorer works on.
//!
//! Coordinate convention: image-style space, `x` grows to the right of the
//! frame and `y` grows downward. Odd landmark indices are the performer's
//! left side.

use serde::{Deserialize, Serialize};

use crate::error::PoseError;

pub mod normalize;
pub mod segment;

pub use normalize::{distance, midpoint, mirror, normalize};
pub use segment::{Bone, BodySegment};

/// Number of landmarks in a complete pose.
pub const LANDMARK_COUNT: usize = 33;

/// Minimum per-landmark visibility for a landmark to take part in scoring
/// or posecode rules.
pub const MIN_VISIBILITY: f64 = 0.4;

/// Fixed anatomical landmark indices.
pub mod landmark {
    pub const NOSE: usize = 0;
    pub const LEFT_EYE_INNER: usize = 1;
    pub const LEFT_EYE: usize = 2;
    pub const LEFT_EYE_OUTER: usize = 3;
    pub const RIGHT_EYE_INNER: usize = 4;
    pub const RIGHT_EYE: usize = 5;
    pub const RIGHT_EYE_OUTER: usize = 6;
    pub const LEFT_EAR: usize = 7;
    pub const RIGHT_EAR: usize = 8;
    pub const MOUTH_LEFT: usize = 9;
    pub const MOUTH_RIGHT: usize = 10;
    pub const LEFT_SHOULDER: usize = 11;
    pub const RIGHT_SHOULDER: usize = 12;
    pub const LEFT_ELBOW: usize = 13;
    pub const RIGHT_ELBOW: usize = 14;
    pub const LEFT_WRIST: usize = 15;
    pub const RIGHT_WRIST: usize = 16;
    pub const LEFT_PINKY: usize = 17;
    pub const RIGHT_PINKY: usize = 18;
    pub const LEFT_INDEX: usize = 19;
    pub const RIGHT_INDEX: usize = 20;
    pub const LEFT_THUMB: usize = 21;
    pub const RIGHT_THUMB: usize = 22;
    pub const LEFT_HIP: usize = 23;
    pub const RIGHT_HIP: usize = 24;
    pub const LEFT_KNEE: usize = 25;
    pub const RIGHT_KNEE: usize = 26;
    pub const LEFT_ANKLE: usize = 27;
    pub const RIGHT_ANKLE: usize = 28;
    pub const LEFT_HEEL: usize = 29;
    pub const RIGHT_HEEL: usize = 30;
    pub const LEFT_FOOT_INDEX: usize = 31;
    pub const RIGHT_FOOT_INDEX: usize = 32;
}

/// One tracked anatomical point.
///
/// `visibility` is the detector's confidence in [0, 1]; a missing value in
/// serialized input is read as 0.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    #[serde(default)]
    pub visibility: f64,
}

impl Landmark {
    pub fn new(x: f64, y: f64, z: f64, visibility: f64) -> Self {
        Self {
            x,
            y,
            z,
            visibility,
        }
    }

    /// Landmark with full confidence.
    pub fn visible(x: f64, y: f64, z: f64) -> Self {
        Self::new(x, y, z, 1.0)
    }

    pub fn is_visible(&self) -> bool {
        self.visibility >= MIN_VISIBILITY
    }
}

/// Complete 33-landmark pose in provider order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Landmark>", into = "Vec<Landmark>")]
pub struct Pose {
    landmarks: Vec<Landmark>,
}

impl Pose {
    /// Build a pose from provider landmarks.
    ///
    /// Fails when fewer than 33 landmarks are supplied. Extra trailing
    /// landmarks are dropped.
    pub fn new(mut landmarks: Vec<Landmark>) -> Result<Self, PoseError> {
        if landmarks.len() < LANDMARK_COUNT {
            return Err(PoseError::InsufficientLandmarks {
                required: LANDMARK_COUNT,
                found: landmarks.len(),
            });
        }
        landmarks.truncate(LANDMARK_COUNT);
        Ok(Self { landmarks })
    }

    pub fn landmarks(&self) -> &[Landmark] {
        &self.landmarks
    }

    pub fn get(&self, index: usize) -> &Landmark {
        &self.landmarks[index]
    }

    /// Landmark at `index` if it meets the visibility floor.
    pub fn visible(&self, index: usize) -> Option<&Landmark> {
        self.landmarks.get(index).filter(|lm| lm.is_visible())
    }

    /// Apply `f` to every landmark, keeping the index layout.
    pub fn map(&self, f: impl Fn(&Landmark) -> Landmark) -> Self {
        Self {
            landmarks: self.landmarks.iter().map(f).collect(),
        }
    }

    pub(crate) fn swap_landmarks(&mut self, a: usize, b: usize) {
        self.landmarks.swap(a, b);
    }
}

impl TryFrom<Vec<Landmark>> for Pose {
    type Error = PoseError;

    fn try_from(landmarks: Vec<Landmark>) -> Result<Self, Self::Error> {
        Pose::new(landmarks)
    }
}

impl From<Pose> for Vec<Landmark> {
    fn from(pose: Pose) -> Self {
        pose.landmarks
    }
}

/// Pose translated to the hip midpoint and scaled to unit torso length.
///
/// Only constructed by [`normalize`], so the invariant always holds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedPose(Pose);

impl NormalizedPose {
    pub(crate) fn from_normalized(pose: Pose) -> Self {
        Self(pose)
    }

    pub fn pose(&self) -> &Pose {
        &self.0
    }

    pub fn get(&self, index: usize) -> &Landmark {
        self.0.get(index)
    }

    pub fn into_pose(self) -> Pose {
        self.0
    }
}
