//! Synthetic pose tracks for the simulation harness.
//!
//! The reference performer swings both arms up and down on a fixed period.
//! The user follows with seeded jitter, occasional detector dropouts, and a
//! few scripted mistake windows where the left arm stays down.

use std::f64::consts::PI;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::{PoseFixture, PoseFrame};
use crate::pose::landmark::*;
use crate::pose::{Landmark, Pose, LANDMARK_COUNT};

const UPPER_ARM: f64 = 0.13;
const FOREARM: f64 = 0.12;
const ARM_REST: f64 = 0.2;
const ARM_SWING: f64 = 1.3;
const SWING_PERIOD_S: f64 = 4.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthOptions {
    pub seed: u64,
    pub duration_s: f64,
    /// Detector output spacing
    pub frame_interval_ms: u64,
    /// Max absolute noise added to user x/y
    pub jitter: f64,
    /// Probability a user frame is missing
    pub dropout: f64,
    /// Number of mistake windows
    pub mistakes: usize,
    pub mistake_length_s: f64,
}

impl Default for SynthOptions {
    fn default() -> Self {
        Self {
            seed: 7,
            duration_s: 30.0,
            frame_interval_ms: 33,
            jitter: 0.01,
            dropout: 0.02,
            mistakes: 2,
            mistake_length_s: 2.0,
        }
    }
}

/// Arm elevation (radians from hanging straight down) at `t` seconds.
fn arm_angle(t: f64) -> f64 {
    ARM_REST + ARM_SWING * (0.5 - 0.5 * (2.0 * PI * t / SWING_PERIOD_S).cos())
}

/// Place a straight-ish arm hanging from `shoulder` at `angle`.
/// `side` is +1 for the performer's left (larger image x), -1 for right.
fn arm(shoulder: (f64, f64), angle: f64, side: f64) -> [(f64, f64); 2] {
    let dir = (side * angle.sin(), angle.cos());
    let elbow = (shoulder.0 + UPPER_ARM * dir.0, shoulder.1 + UPPER_ARM * dir.1);
    // Slight elbow bend toward the body.
    let fore = angle - 0.15;
    let wrist = (
        elbow.0 + FOREARM * side * fore.sin(),
        elbow.1 + FOREARM * fore.cos(),
    );
    [elbow, wrist]
}

/// Full 33-landmark pose with the given arm elevations.
pub fn performer_pose(left_angle: f64, right_angle: f64) -> Pose {
    let mut points = [(0.5, 0.5); LANDMARK_COUNT];

    points[NOSE] = (0.50, 0.18);
    points[LEFT_EYE_INNER] = (0.51, 0.165);
    points[LEFT_EYE] = (0.52, 0.165);
    points[LEFT_EYE_OUTER] = (0.53, 0.165);
    points[RIGHT_EYE_INNER] = (0.49, 0.165);
    points[RIGHT_EYE] = (0.48, 0.165);
    points[RIGHT_EYE_OUTER] = (0.47, 0.165);
    points[LEFT_EAR] = (0.54, 0.18);
    points[RIGHT_EAR] = (0.46, 0.18);
    points[MOUTH_LEFT] = (0.515, 0.205);
    points[MOUTH_RIGHT] = (0.485, 0.205);

    let left_shoulder = (0.60, 0.30);
    let right_shoulder = (0.40, 0.30);
    points[LEFT_SHOULDER] = left_shoulder;
    points[RIGHT_SHOULDER] = right_shoulder;

    let [left_elbow, left_wrist] = arm(left_shoulder, left_angle, 1.0);
    let [right_elbow, right_wrist] = arm(right_shoulder, right_angle, -1.0);
    points[LEFT_ELBOW] = left_elbow;
    points[RIGHT_ELBOW] = right_elbow;
    points[LEFT_WRIST] = left_wrist;
    points[RIGHT_WRIST] = right_wrist;
    for (index, wrist, side) in [
        (LEFT_PINKY, left_wrist, 1.0),
        (LEFT_INDEX, left_wrist, 1.0),
        (LEFT_THUMB, left_wrist, 1.0),
        (RIGHT_PINKY, right_wrist, -1.0),
        (RIGHT_INDEX, right_wrist, -1.0),
        (RIGHT_THUMB, right_wrist, -1.0),
    ] {
        points[index] = (wrist.0 + side * 0.01, wrist.1 + 0.02);
    }

    points[LEFT_HIP] = (0.56, 0.58);
    points[RIGHT_HIP] = (0.44, 0.58);
    points[LEFT_KNEE] = (0.56, 0.74);
    points[RIGHT_KNEE] = (0.44, 0.74);
    points[LEFT_ANKLE] = (0.56, 0.90);
    points[RIGHT_ANKLE] = (0.44, 0.90);
    points[LEFT_HEEL] = (0.555, 0.92);
    points[RIGHT_HEEL] = (0.445, 0.92);
    points[LEFT_FOOT_INDEX] = (0.57, 0.93);
    points[RIGHT_FOOT_INDEX] = (0.43, 0.93);

    let landmarks: Vec<Landmark> = points
        .iter()
        .map(|(x, y)| Landmark::visible(*x, *y, 0.0))
        .collect();
    // The array always holds LANDMARK_COUNT entries.
    Pose::new(landmarks).unwrap_or_else(|_| unreachable!())
}

/// Generate a two-source fixture from `options`.
pub fn synthesize(options: &SynthOptions) -> PoseFixture {
    let mut rng = StdRng::seed_from_u64(options.seed);
    let interval_ms = options.frame_interval_ms.max(1);
    let total_ms = (options.duration_s.max(0.0) * 1000.0) as u64;

    // Mistake windows spread over the track, start jittered within their slot.
    let slot_ms = total_ms / (options.mistakes as u64 + 1).max(1);
    let mistake_ms = (options.mistake_length_s * 1000.0) as u64;
    let mistakes: Vec<(u64, u64)> = (1..=options.mistakes as u64)
        .map(|i| {
            let spread = slot_ms / 4;
            let offset = if spread > 0 { rng.gen_range(0..spread) } else { 0 };
            let start = (i * slot_ms).saturating_sub(mistake_ms / 2) + offset;
            (start, start + mistake_ms)
        })
        .collect();

    let mut frames = Vec::with_capacity((total_ms / interval_ms + 1) as usize);
    let mut ts = 0u64;
    while ts <= total_ms {
        let t = ts as f64 / 1000.0;
        let angle = arm_angle(t);
        let reference = performer_pose(angle, angle);

        let in_mistake = mistakes.iter().any(|(start, end)| ts >= *start && ts < *end);
        let user = if rng.gen_bool(options.dropout.clamp(0.0, 1.0)) {
            None
        } else {
            let left = if in_mistake { ARM_REST } else { angle };
            let jitter = options.jitter.abs();
            let clean = performer_pose(left, angle);
            if jitter > 0.0 {
                let noisy: Vec<Landmark> = clean
                    .landmarks()
                    .iter()
                    .map(|lm| Landmark {
                        x: lm.x + rng.gen_range(-jitter..=jitter),
                        y: lm.y + rng.gen_range(-jitter..=jitter),
                        ..*lm
                    })
                    .collect();
                Pose::new(noisy).ok()
            } else {
                Some(clean)
            }
        };

        frames.push(PoseFrame {
            timestamp_ms: ts,
            video_time_s: Some(t),
            reference: Some(reference),
            user,
        });
        ts += interval_ms;
    }

    log::debug!(
        "[Synth] {} frames, mistakes at {:?} (seed {})",
        frames.len(),
        mistakes,
        options.seed
    );

    PoseFixture {
        name: format!("synthetic-{}", options.seed),
        frames,
    }
}
