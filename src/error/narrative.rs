// Narrative service error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Narrative error code constants
///
/// Error code range: 3001-3004
pub struct NarrativeErrorCodes {}

impl NarrativeErrorCodes {
    /// Service rejected the request because of rate limiting
    pub const RATE_LIMITED: i32 = 3001;

    /// Service requires payment or credits
    pub const PAYMENT_REQUIRED: i32 = 3002;

    /// Generic transport or service failure
    pub const FAILED: i32 = 3003;

    /// Service answered without usable feedback
    pub const EMPTY_RESPONSE: i32 = 3004;
}

/// Log a narrative error with structured context
pub fn log_narrative_error(err: &NarrativeError, context: &str) {
    error!(
        "Narrative error in {}: code={}, component=NarrativeService, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Narrative-feedback service failures
///
/// Isolated to the narrative feature: none of these variants affect scores,
/// moments, or session statistics.
#[derive(Debug, Clone, PartialEq)]
pub enum NarrativeError {
    /// HTTP 429 or equivalent
    RateLimited,

    /// HTTP 402 or equivalent
    PaymentRequired,

    /// Unreachable service, unexpected status, or malformed payload
    Failed { reason: String },

    /// Response parsed but carried no feedback entries
    EmptyResponse,
}

impl NarrativeError {
    /// Map a transport status code and body to the failure taxonomy.
    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            429 => NarrativeError::RateLimited,
            402 => NarrativeError::PaymentRequired,
            _ => NarrativeError::Failed {
                reason: format!("status {}: {}", status, body.trim()),
            },
        }
    }

    /// Message suitable for showing to the performer.
    pub fn user_message(&self) -> &'static str {
        match self {
            NarrativeError::RateLimited => {
                "Coaching notes are busy right now. Try again in a minute."
            }
            NarrativeError::PaymentRequired => {
                "Coaching notes need more credits. Your scores are still below."
            }
            NarrativeError::Failed { .. } => "Coaching notes couldn't be generated this time.",
            NarrativeError::EmptyResponse => "No coaching notes available for this session.",
        }
    }
}

impl ErrorCode for NarrativeError {
    fn code(&self) -> i32 {
        match self {
            NarrativeError::RateLimited => NarrativeErrorCodes::RATE_LIMITED,
            NarrativeError::PaymentRequired => NarrativeErrorCodes::PAYMENT_REQUIRED,
            NarrativeError::Failed { .. } => NarrativeErrorCodes::FAILED,
            NarrativeError::EmptyResponse => NarrativeErrorCodes::EMPTY_RESPONSE,
        }
    }

    fn message(&self) -> String {
        match self {
            NarrativeError::RateLimited => "Narrative service rate limited".to_string(),
            NarrativeError::PaymentRequired => "Narrative service requires payment".to_string(),
            NarrativeError::Failed { reason } => {
                format!("Narrative service failed: {}", reason)
            }
            NarrativeError::EmptyResponse => "Narrative service returned no feedback".to_string(),
        }
    }
}

impl fmt::Display for NarrativeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "NarrativeError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for NarrativeError {}

impl From<serde_json::Error> for NarrativeError {
    fn from(err: serde_json::Error) -> Self {
        NarrativeError::Failed {
            reason: err.to_string(),
        }
    }
}

impl From<std::io::Error> for NarrativeError {
    fn from(err: std::io::Error) -> Self {
        NarrativeError::Failed {
            reason: err.to_string(),
        }
    }
}
