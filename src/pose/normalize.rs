//! Pose normalization - body-centered, scale-invariant coordinates
//!
//! Every landmark is translated so the hip midpoint sits at the origin and
//! divided by the torso length (shoulder midpoint to hip midpoint). Two poses
//! normalized this way can be compared regardless of where the performer
//! stands in frame or how far they are from the camera.

use super::landmark::{LEFT_HIP, LEFT_SHOULDER, RIGHT_HIP, RIGHT_SHOULDER};
use super::{Landmark, NormalizedPose, Pose, LANDMARK_COUNT};
use crate::error::PoseError;

/// Torso lengths below this cannot be normalized against.
pub const MIN_TORSO_LENGTH: f64 = 0.001;

/// Left/right landmark pairs exchanged by [`mirror`].
const MIRROR_PAIRS: [(usize, usize); 16] = [
    (1, 4),
    (2, 5),
    (3, 6),
    (7, 8),
    (9, 10),
    (11, 12),
    (13, 14),
    (15, 16),
    (17, 18),
    (19, 20),
    (21, 22),
    (23, 24),
    (25, 26),
    (27, 28),
    (29, 30),
    (31, 32),
];

/// Midpoint of two landmarks; visibility is the weaker of the two.
pub fn midpoint(a: &Landmark, b: &Landmark) -> Landmark {
    Landmark {
        x: (a.x + b.x) / 2.0,
        y: (a.y + b.y) / 2.0,
        z: (a.z + b.z) / 2.0,
        visibility: a.visibility.min(b.visibility),
    }
}

/// 3-D Euclidean distance between two landmarks.
pub fn distance(a: &Landmark, b: &Landmark) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    let dz = a.z - b.z;
    (dx * dx + dy * dy + dz * dz).sqrt()
}

/// Translate to the hip midpoint and scale to unit torso length.
///
/// # Errors
/// * `InsufficientLandmarks` - fewer than 33 landmarks
/// * `DegenerateScale` - torso length below [`MIN_TORSO_LENGTH`]
pub fn normalize(pose: &Pose) -> Result<NormalizedPose, PoseError> {
    let landmarks = pose.landmarks();
    if landmarks.len() < LANDMARK_COUNT {
        return Err(PoseError::InsufficientLandmarks {
            required: LANDMARK_COUNT,
            found: landmarks.len(),
        });
    }

    let hip_mid = midpoint(&landmarks[LEFT_HIP], &landmarks[RIGHT_HIP]);
    let shoulder_mid = midpoint(&landmarks[LEFT_SHOULDER], &landmarks[RIGHT_SHOULDER]);
    let torso_length = distance(&shoulder_mid, &hip_mid);

    if !torso_length.is_finite() || torso_length < MIN_TORSO_LENGTH {
        return Err(PoseError::DegenerateScale { torso_length });
    }

    let normalized = pose.map(|lm| Landmark {
        x: (lm.x - hip_mid.x) / torso_length,
        y: (lm.y - hip_mid.y) / torso_length,
        z: (lm.z - hip_mid.z) / torso_length,
        visibility: lm.visibility,
    });

    Ok(NormalizedPose::from_normalized(normalized))
}

/// Mirror a pose horizontally.
///
/// Negates `x` and swaps every left/right landmark pair so that a mirrored
/// reference still labels the performer's left arm as the left arm.
pub fn mirror(pose: &Pose) -> Pose {
    let mut mirrored = pose.map(|lm| Landmark { x: -lm.x, ..*lm });
    for &(left, right) in MIRROR_PAIRS.iter() {
        mirrored.swap_landmarks(left, right);
    }
    mirrored
}
