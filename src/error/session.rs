// Session error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Session error code constants
///
/// Error code range: 2001-2005
pub struct SessionErrorCodes {}

impl SessionErrorCodes {
    /// A comparison session is already running
    pub const ALREADY_RUNNING: i32 = 2001;

    /// No comparison session is running
    pub const NOT_RUNNING: i32 = 2002;

    /// Mutex/RwLock was poisoned
    pub const LOCK_POISONED: i32 = 2003;

    /// Too few samples collected for post-session analysis
    pub const INSUFFICIENT_SAMPLES: i32 = 2004;

    /// Session task could not be spawned or ended abnormally
    pub const TASK_FAILED: i32 = 2005;
}

/// Log a session error with structured context
///
/// The logging is non-blocking and will not panic on failure.
pub fn log_session_error(err: &SessionError, context: &str) {
    error!(
        "Session error in {}: code={}, component=CoachEngine, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Session lifecycle errors
///
/// Error code ranges: 2001-2005
#[derive(Debug, Clone, PartialEq)]
pub enum SessionError {
    /// Session already running
    AlreadyRunning,

    /// Session not running
    NotRunning,

    /// Mutex/RwLock was poisoned
    LockPoisoned { component: String },

    /// Not enough samples for the requested analysis
    InsufficientSamples { required: usize, collected: usize },

    /// Sampling task failed to start or panicked
    TaskFailed { reason: String },
}

impl ErrorCode for SessionError {
    fn code(&self) -> i32 {
        match self {
            SessionError::AlreadyRunning => SessionErrorCodes::ALREADY_RUNNING,
            SessionError::NotRunning => SessionErrorCodes::NOT_RUNNING,
            SessionError::LockPoisoned { .. } => SessionErrorCodes::LOCK_POISONED,
            SessionError::InsufficientSamples { .. } => SessionErrorCodes::INSUFFICIENT_SAMPLES,
            SessionError::TaskFailed { .. } => SessionErrorCodes::TASK_FAILED,
        }
    }

    fn message(&self) -> String {
        match self {
            SessionError::AlreadyRunning => {
                "Session already running. Call stop_session() first.".to_string()
            }
            SessionError::NotRunning => {
                "Session not running. Call start_session() first.".to_string()
            }
            SessionError::LockPoisoned { component } => {
                format!("Lock poisoned for component: {}", component)
            }
            SessionError::InsufficientSamples {
                required,
                collected,
            } => {
                format!("Insufficient samples: need {}, got {}", required, collected)
            }
            SessionError::TaskFailed { reason } => format!("Session task failed: {}", reason),
        }
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SessionError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for SessionError {}
