//! Worst-moment finder
//!
//! Slides a fixed-length window over the valid session samples, ranks every
//! window by mean overall score and greedily picks the lowest-scoring
//! non-overlapping windows. Each accepted window claims a guard zone around
//! itself so the picks land on distinct parts of the performance.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{format_clock, SessionSample};
use crate::analysis::posecode;
use crate::analysis::scorer::round1;
use crate::pose::BodySegment;

/// Fewer valid samples than this yields no moments.
pub const MIN_VALID_SAMPLES: usize = 5;

/// Smallest window, in samples.
pub const MIN_WINDOW_SAMPLES: usize = 3;

/// A contiguous low-scoring span of the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Moment {
    /// Index into the valid-sample list (inclusive)
    pub start_index: usize,
    /// Index into the valid-sample list (inclusive)
    pub end_index: usize,
    pub start_time_s: f64,
    pub end_time_s: f64,
    /// Mean overall score over the window, one decimal
    pub avg_score: f64,
    #[serde(skip_serializing, default)]
    pub samples: Vec<SessionSample>,
}

impl Moment {
    pub fn len(&self) -> usize {
        self.end_index - self.start_index + 1
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Find up to `count` worst non-overlapping windows of roughly
/// `window_seconds` each.
///
/// Only samples carrying both poses and a playback marker are considered.
/// `fallback_interval_ms` stands in for the sample spacing when every
/// sample shares one timestamp. The result is chronological.
pub fn find_worst_moments(
    samples: &[SessionSample],
    window_seconds: f64,
    count: usize,
    fallback_interval_ms: u64,
) -> Vec<Moment> {
    let valid: Vec<&SessionSample> = samples.iter().filter(|s| s.is_complete()).collect();
    let n = valid.len();
    if n < MIN_VALID_SAMPLES || count == 0 {
        log::debug!(
            "[Moments] Skipping search: {} valid samples, count {}",
            n,
            count
        );
        return Vec::new();
    }

    let first_ts = valid[0].timestamp_ms();
    let last_ts = valid[n - 1].timestamp_ms();
    let span_ms = last_ts.saturating_sub(first_ts) as f64;
    let avg_interval_ms = if span_ms > 0.0 {
        span_ms / (n - 1) as f64
    } else {
        fallback_interval_ms.max(1) as f64
    };

    let window = ((window_seconds * 1000.0 / avg_interval_ms).round() as usize)
        .max(MIN_WINDOW_SAMPLES);
    if window > n {
        log::debug!(
            "[Moments] Window of {} samples exceeds the {} valid samples",
            window,
            n
        );
        return Vec::new();
    }

    // Running sum over every contiguous window.
    let scores: Vec<f64> = valid.iter().map(|s| s.result.overall).collect();
    let mut sum: f64 = scores[..window].iter().sum();
    let mut means = Vec::with_capacity(n - window + 1);
    means.push((0usize, sum / window as f64));
    for start in 1..=(n - window) {
        sum += scores[start + window - 1] - scores[start - 1];
        means.push((start, sum / window as f64));
    }

    // sort_by is stable: equal means keep the earlier window first.
    means.sort_by(|a, b| a.1.total_cmp(&b.1));

    let guard = window.max((window as f64 * 1.5).round() as usize);
    let mut claimed = vec![false; n];
    let mut picked: Vec<(usize, f64)> = Vec::with_capacity(count);

    for (start, mean) in means {
        if picked.len() >= count {
            break;
        }
        let end = start + window - 1;
        if claimed[start..=end].iter().any(|c| *c) {
            continue;
        }
        let lo = start.saturating_sub(guard);
        let hi = (end + guard).min(n - 1);
        claimed[lo..=hi].iter_mut().for_each(|c| *c = true);
        picked.push((start, mean));
    }

    picked.sort_by_key(|(start, _)| *start);

    picked
        .into_iter()
        .map(|(start, mean)| {
            let end = start + window - 1;
            Moment {
                start_index: start,
                end_index: end,
                start_time_s: valid[start].video_time_s.unwrap_or_default(),
                end_time_s: valid[end].video_time_s.unwrap_or_default(),
                avg_score: round1(mean),
                samples: valid[start..=end].iter().map(|s| (*s).clone()).collect(),
            }
        })
        .collect()
}

/// Moment enriched with the text the narrative service needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MomentContext {
    /// `m:ss - m:ss` in playback time
    pub time_range: String,
    pub avg_score: f64,
    /// Up to two lowest segments by window mean, worst first
    pub worst_segments: Vec<BodySegment>,
    /// Posecode summary of the lowest-scoring sample in the window
    pub posecode_context: String,
}

pub fn describe_moment(moment: &Moment) -> MomentContext {
    let time_range = format!(
        "{} - {}",
        format_clock(moment.start_time_s),
        format_clock(moment.end_time_s)
    );

    let mut totals: BTreeMap<BodySegment, (f64, usize)> = BTreeMap::new();
    for sample in &moment.samples {
        for (segment, score) in &sample.result.segments {
            if let Some(score) = score {
                let entry = totals.entry(*segment).or_insert((0.0, 0));
                entry.0 += score;
                entry.1 += 1;
            }
        }
    }
    let mut ranked: Vec<(BodySegment, f64)> = totals
        .into_iter()
        .map(|(segment, (sum, count))| (segment, sum / count as f64))
        .collect();
    ranked.sort_by(|a, b| a.1.total_cmp(&b.1));
    let worst_segments = ranked.into_iter().take(2).map(|(s, _)| s).collect();

    let lowest = moment
        .samples
        .iter()
        .fold(None::<&SessionSample>, |lowest, sample| match lowest {
            Some(l) if l.result.overall <= sample.result.overall => Some(l),
            _ => Some(sample),
        });
    let posecode_context = lowest
        .and_then(|sample| {
            let reference = posecode::extract(sample.reference_pose.as_ref()?);
            let user = posecode::extract(sample.user_pose.as_ref()?);
            let d = posecode::diff(&reference, &user);
            Some(posecode::summary_text(&reference, &user, &d))
        })
        .unwrap_or_default();

    MomentContext {
        time_range,
        avg_score: moment.avg_score,
        worst_segments,
        posecode_context,
    }
}
