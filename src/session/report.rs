//! Post-session report assembly.
//!
//! The local half (summary + worst moments) is always produced once the
//! minimum sample counts are met. Narrative prose is requested afterwards and
//! any failure degrades to [`NarrativeOutcome::Unavailable`].

use serde::{Deserialize, Serialize};

use super::{analyze_session, describe_moment, find_worst_moments, Moment, MomentContext};
use super::{SessionLog, SessionSummary};
use crate::config::AppConfig;
use crate::error::{log_narrative_error, ErrorCode, NarrativeError};
use crate::narrative::{NarrativeFeedback, NarrativeRequest, NarrativeService};

/// Parameters for the worst-moment search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportOptions {
    pub window_seconds: f64,
    pub moment_count: usize,
    /// Sample spacing assumed when all timestamps coincide
    pub fallback_interval_ms: u64,
}

impl ReportOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            window_seconds: config.moments.window_seconds,
            moment_count: config.moments.count,
            fallback_interval_ms: config.comparison.poll_interval_ms
                * config.comparison.sample_every_n_ticks.max(1) as u64,
        }
    }
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMoment {
    #[serde(flatten)]
    pub moment: Moment,
    pub context: MomentContext,
    /// Narrative entry paired by position, when available
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrative: Option<NarrativeFeedback>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum NarrativeOutcome {
    /// No service configured or nothing to narrate
    NotRequested,
    Available { feedback: Vec<NarrativeFeedback> },
    Unavailable { code: i32, message: String },
}

impl NarrativeOutcome {
    pub fn from_error(err: &NarrativeError) -> Self {
        NarrativeOutcome::Unavailable {
            code: err.code(),
            message: err.user_message().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionReport {
    pub summary: SessionSummary,
    pub moments: Vec<ReportMoment>,
    pub narrative: NarrativeOutcome,
}

impl SessionReport {
    pub fn narrative_request(&self) -> NarrativeRequest {
        let contexts: Vec<MomentContext> = self.moments.iter().map(|m| m.context.clone()).collect();
        NarrativeRequest::from_contexts(&contexts)
    }

    /// Attach a narrative outcome, pairing feedback entries with moments in order.
    pub fn attach_narrative(&mut self, outcome: NarrativeOutcome) {
        if let NarrativeOutcome::Available { feedback } = &outcome {
            for (moment, entry) in self.moments.iter_mut().zip(feedback.iter()) {
                moment.narrative = Some(entry.clone());
            }
        }
        self.narrative = outcome;
    }
}

/// Synchronous batch pass over a finished session.
pub fn analyze_log(log: &SessionLog, options: &ReportOptions) -> SessionReport {
    let samples = log.samples();
    let summary = analyze_session(samples);
    let moments = find_worst_moments(
        samples,
        options.window_seconds,
        options.moment_count,
        options.fallback_interval_ms,
    )
    .into_iter()
    .map(|moment| ReportMoment {
        context: describe_moment(&moment),
        moment,
        narrative: None,
    })
    .collect();

    SessionReport {
        summary,
        moments,
        narrative: NarrativeOutcome::NotRequested,
    }
}

/// Ask the service for prose; failures are logged and folded into the outcome.
pub async fn request_narrative(
    service: &dyn NarrativeService,
    request: &NarrativeRequest,
) -> NarrativeOutcome {
    if request.is_empty() {
        return NarrativeOutcome::NotRequested;
    }
    let result = service
        .generate(request)
        .await
        .and_then(|response| response.into_usable());
    match result {
        Ok(response) => {
            log::info!(
                "[Report] {} returned {} narrative entries",
                service.name(),
                response.feedback.len()
            );
            NarrativeOutcome::Available {
                feedback: response.feedback,
            }
        }
        Err(err) => {
            log_narrative_error(&err, "request_narrative");
            NarrativeOutcome::from_error(&err)
        }
    }
}

/// Analyze the session and, when a service is given, enrich it with narrative.
pub async fn build_report(
    log: &SessionLog,
    options: &ReportOptions,
    service: Option<&dyn NarrativeService>,
) -> SessionReport {
    let mut report = analyze_log(log, options);
    if let Some(service) = service {
        let outcome = request_narrative(service, &report.narrative_request()).await;
        report.attach_narrative(outcome);
    }
    report
}
