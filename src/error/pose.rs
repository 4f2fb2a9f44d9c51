// Pose error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Pose error code constants
///
/// Error code range: 1001-1002
pub struct PoseErrorCodes {}

impl PoseErrorCodes {
    /// Pose carries fewer than the 33 required landmarks
    pub const INSUFFICIENT_LANDMARKS: i32 = 1001;

    /// Torso length too small to normalize against
    pub const DEGENERATE_SCALE: i32 = 1002;
}

/// Log a pose error with structured context
///
/// Pose errors are recoverable: callers treat them as "no comparison this
/// tick", so this logs at error level only for diagnostics.
pub fn log_pose_error(err: &PoseError, context: &str) {
    error!(
        "Pose error in {}: code={}, component=PoseNormalizer, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Pose-related errors
///
/// These errors cover pose construction and normalization. Neither is fatal
/// to a session; the scorer maps them to an absent comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum PoseError {
    /// Fewer landmarks than the fixed 33-point layout
    InsufficientLandmarks { required: usize, found: usize },

    /// Shoulder-to-hip distance below the normalization floor
    DegenerateScale { torso_length: f64 },
}

impl ErrorCode for PoseError {
    fn code(&self) -> i32 {
        match self {
            PoseError::InsufficientLandmarks { .. } => PoseErrorCodes::INSUFFICIENT_LANDMARKS,
            PoseError::DegenerateScale { .. } => PoseErrorCodes::DEGENERATE_SCALE,
        }
    }

    fn message(&self) -> String {
        match self {
            PoseError::InsufficientLandmarks { required, found } => {
                format!("Insufficient landmarks: need {}, got {}", required, found)
            }
            PoseError::DegenerateScale { torso_length } => {
                format!("Degenerate torso scale: {:.6}", torso_length)
            }
        }
    }
}

impl fmt::Display for PoseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PoseError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for PoseError {}
