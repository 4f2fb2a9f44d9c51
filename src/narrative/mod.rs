//! Narrative-feedback service seam.
//!
//! The report asks an external service to turn worst-moment data into prose.
//! The transport is behind [`NarrativeService`]; failures map onto
//! [`NarrativeError`] and never affect the locally computed report.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::NarrativeError;
use crate::session::MomentContext;

/// One moment as the service expects it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NarrativeMoment {
    pub time_range: String,
    pub avg_score: f64,
    pub worst_segments: String,
    pub posecode_context: String,
}

impl From<&MomentContext> for NarrativeMoment {
    fn from(context: &MomentContext) -> Self {
        let worst_segments = context
            .worst_segments
            .iter()
            .map(|s| s.display_name())
            .collect::<Vec<_>>()
            .join(", ");
        Self {
            time_range: context.time_range.clone(),
            avg_score: context.avg_score,
            worst_segments,
            posecode_context: context.posecode_context.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativeRequest {
    pub moments: Vec<NarrativeMoment>,
}

impl NarrativeRequest {
    pub fn from_contexts(contexts: &[MomentContext]) -> Self {
        Self {
            moments: contexts.iter().map(NarrativeMoment::from).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.moments.is_empty()
    }
}

/// Prose for one moment, in request order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativeFeedback {
    pub observation: String,
    pub tip: String,
}

/// Service reply. Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NarrativeResponse {
    #[serde(default)]
    pub feedback: Vec<NarrativeFeedback>,
}

impl NarrativeResponse {
    /// Reject replies that carry no usable feedback.
    pub fn into_usable(self) -> Result<Self, NarrativeError> {
        let feedback: Vec<NarrativeFeedback> = self
            .feedback
            .into_iter()
            .filter(|f| !f.observation.trim().is_empty() || !f.tip.trim().is_empty())
            .collect();
        if feedback.is_empty() {
            return Err(NarrativeError::EmptyResponse);
        }
        Ok(Self { feedback })
    }
}

/// Remote narrative generator
#[async_trait]
pub trait NarrativeService: Send + Sync {
    fn name(&self) -> &str;

    async fn generate(&self, request: &NarrativeRequest) -> Result<NarrativeResponse, NarrativeError>;
}

/// Canned reply stored on disk: either a response body or a failed status.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RecordedReply {
    Failure {
        status: u16,
        #[serde(default)]
        body: String,
    },
    Response(NarrativeResponse),
}

/// File-backed service used by the CLI and tests.
///
/// The file holds either `{"feedback": [...]}` or `{"status": 429, "body": "..."}`.
/// It is read on every call.
#[derive(Debug, Clone)]
pub struct RecordedNarrative {
    path: PathBuf,
}

impl RecordedNarrative {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl NarrativeService for RecordedNarrative {
    fn name(&self) -> &str {
        "recorded"
    }

    async fn generate(&self, request: &NarrativeRequest) -> Result<NarrativeResponse, NarrativeError> {
        log::debug!(
            "[Narrative] Replaying {} for {} moments",
            self.path.display(),
            request.moments.len()
        );
        let contents = tokio::fs::read_to_string(&self.path).await?;
        match serde_json::from_str::<RecordedReply>(&contents)? {
            RecordedReply::Failure { status, body } => Err(NarrativeError::from_status(status, &body)),
            RecordedReply::Response(response) => Ok(response),
        }
    }
}
