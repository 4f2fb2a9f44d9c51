// Error types for the pose coach engine
//
// This module defines custom error types for pose, session, and narrative
// operations, providing structured error handling with stable error codes.

mod narrative;
mod pose;
mod session;

pub use narrative::{log_narrative_error, NarrativeError, NarrativeErrorCodes};
pub use pose::{log_pose_error, PoseError, PoseErrorCodes};
pub use session::{log_session_error, SessionError, SessionErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent error handling across
/// the CLI, HTTP, and library boundaries.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}
