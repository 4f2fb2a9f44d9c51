//! Session aggregator
//!
//! Batch statistics over a finished session: per-segment averages, trends,
//! consistency and struggle runs; a letter grade; a four-part timeline; and
//! an ordered list of coaching tips.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::coaching;
use super::{format_clock, SessionSample};
use crate::analysis::scorer::round1;
use crate::pose::BodySegment;

/// Fewer samples than this yields [`SessionSummary::not_available`].
pub const MIN_SESSION_SAMPLES: usize = 3;

/// Segments averaging below this become focus areas.
pub const FOCUS_THRESHOLD: f64 = 70.0;

/// Scores below this count toward a struggle run.
pub const STRUGGLE_SCORE: f64 = 50.0;

/// Shortest reported struggle run, in samples.
pub const MIN_STRUGGLE_RUN: usize = 5;

pub const MAX_TIPS: usize = 5;

const TIMELINE_CHUNKS: usize = 4;

/// Letter grade for the overall session average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    S,
    A,
    B,
    C,
    D,
    F,
    #[serde(rename = "N/A")]
    NotAvailable,
}

impl Grade {
    pub fn from_average(average: f64) -> Self {
        match average {
            a if a >= 90.0 => Grade::S,
            a if a >= 80.0 => Grade::A,
            a if a >= 70.0 => Grade::B,
            a if a >= 60.0 => Grade::C,
            a if a >= 50.0 => Grade::D,
            _ => Grade::F,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::S => "S",
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
            Grade::NotAvailable => "N/A",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Grade::S => "Outstanding",
            Grade::A => "Excellent",
            Grade::B => "Good",
            Grade::C => "Fair",
            Grade::D => "Needs Work",
            Grade::F => "Keep Practicing",
            Grade::NotAvailable => "Not enough data",
        }
    }

    /// Colour token for the report header.
    pub fn color(&self) -> &'static str {
        match self {
            Grade::S => "gold",
            Grade::A => "green",
            Grade::B => "yellow-green",
            Grade::C => "amber",
            Grade::D => "orange",
            Grade::F => "red",
            Grade::NotAvailable => "gray",
        }
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive range of sample indices where a segment stayed below 50.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StruggleRun {
    pub start_index: usize,
    pub end_index: usize,
}

impl StruggleRun {
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.end_index - self.start_index + 1
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentStatistics {
    pub segment: BodySegment,
    pub average: f64,
    pub min: f64,
    pub max: f64,
    /// Mean of the second half minus mean of the first half
    pub trend: f64,
    /// 100 - 2 * population stddev; not clamped
    pub consistency: f64,
    pub struggles: Vec<StruggleRun>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusArea {
    pub segment: BodySegment,
    pub average: f64,
    pub feedback: String,
    pub exercises: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Strength {
    pub segment: BodySegment,
    pub average: f64,
    pub message: String,
}

/// One chronological quarter of the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineChunk {
    pub start_index: usize,
    pub end_index: usize,
    pub average: f64,
    /// Elapsed time relative to the first sample, `m:ss - m:ss`
    pub label: String,
    pub weakest_segment: Option<BodySegment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub sample_count: usize,
    pub overall_average: f64,
    pub grade: Grade,
    pub grade_label: String,
    pub grade_color: String,
    /// Ascending by average
    pub segments: Vec<SegmentStatistics>,
    pub focus_areas: Vec<FocusArea>,
    /// Best first
    pub strengths: Vec<Strength>,
    pub timeline: Vec<TimelineChunk>,
    pub tips: Vec<String>,
}

impl SessionSummary {
    pub fn not_available(sample_count: usize) -> Self {
        let grade = Grade::NotAvailable;
        Self {
            sample_count,
            overall_average: 0.0,
            grade,
            grade_label: grade.label().to_string(),
            grade_color: grade.color().to_string(),
            segments: Vec::new(),
            focus_areas: Vec::new(),
            strengths: Vec::new(),
            timeline: Vec::new(),
            tips: Vec::new(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.grade != Grade::NotAvailable
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn population_stddev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

fn struggle_runs(scores: &[Option<f64>]) -> Vec<StruggleRun> {
    let mut runs = Vec::new();
    let mut run_start: Option<usize> = None;

    for (i, score) in scores.iter().enumerate() {
        let struggling = matches!(score, Some(s) if *s < STRUGGLE_SCORE);
        match (struggling, run_start) {
            (true, None) => run_start = Some(i),
            (false, Some(start)) => {
                if i - start >= MIN_STRUGGLE_RUN {
                    runs.push(StruggleRun {
                        start_index: start,
                        end_index: i - 1,
                    });
                }
                run_start = None;
            }
            _ => {}
        }
    }
    if let Some(start) = run_start {
        if scores.len() - start >= MIN_STRUGGLE_RUN {
            runs.push(StruggleRun {
                start_index: start,
                end_index: scores.len() - 1,
            });
        }
    }
    runs
}

/// Statistics for one segment, `None` when it never produced a score.
pub fn segment_statistics(
    segment: BodySegment,
    samples: &[SessionSample],
) -> Option<SegmentStatistics> {
    let series: Vec<Option<f64>> = samples.iter().map(|s| s.result.segment(segment)).collect();
    let scores: Vec<f64> = series.iter().flatten().copied().collect();
    if scores.is_empty() {
        return None;
    }

    let half = scores.len() / 2;
    let (first, second) = scores.split_at(half);
    let trend = if first.is_empty() || second.is_empty() {
        0.0
    } else {
        mean(second) - mean(first)
    };

    Some(SegmentStatistics {
        segment,
        average: mean(&scores),
        min: scores.iter().copied().fold(f64::INFINITY, f64::min),
        max: scores.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        trend,
        consistency: 100.0 - 2.0 * population_stddev(&scores),
        struggles: struggle_runs(&series),
    })
}

fn weakest_segment(samples: &[SessionSample]) -> Option<BodySegment> {
    let mut totals: BTreeMap<BodySegment, (f64, usize)> = BTreeMap::new();
    for sample in samples {
        for (segment, score) in &sample.result.segments {
            if let Some(score) = score {
                let entry = totals.entry(*segment).or_insert((0.0, 0));
                entry.0 += score;
                entry.1 += 1;
            }
        }
    }
    totals
        .into_iter()
        .map(|(segment, (sum, n))| (segment, sum / n as f64))
        .fold(None::<(BodySegment, f64)>, |worst, (segment, avg)| match worst {
            Some((_, w)) if w <= avg => worst,
            _ => Some((segment, avg)),
        })
        .map(|(segment, _)| segment)
}

fn build_timeline(samples: &[SessionSample]) -> Vec<TimelineChunk> {
    let chunk_size = samples.len().div_ceil(TIMELINE_CHUNKS).max(1);
    let origin_ms = samples.first().map(|s| s.timestamp_ms()).unwrap_or(0);
    let elapsed = |sample: &SessionSample| {
        sample.timestamp_ms().saturating_sub(origin_ms) as f64 / 1000.0
    };

    samples
        .chunks(chunk_size)
        .enumerate()
        .map(|(i, chunk)| {
            let start_index = i * chunk_size;
            let overall: Vec<f64> = chunk.iter().map(|s| s.result.overall).collect();
            let label = match (chunk.first(), chunk.last()) {
                (Some(first), Some(last)) => format!(
                    "{} - {}",
                    format_clock(elapsed(first)),
                    format_clock(elapsed(last))
                ),
                _ => String::new(),
            };
            TimelineChunk {
                start_index,
                end_index: start_index + chunk.len() - 1,
                average: round1(mean(&overall)),
                label,
                weakest_segment: weakest_segment(chunk),
            }
        })
        .collect()
}

fn build_tips(focus: &[FocusArea], ranked: &[SegmentStatistics]) -> Vec<String> {
    if focus.is_empty() {
        return vec![coaching::congratulations_tip()];
    }

    let mut tips = Vec::new();
    if focus.len() >= 3 {
        tips.push(coaching::multiple_areas_tip(focus[0].segment));
    }
    if let Some(worst) = ranked.first() {
        tips.push(coaching::priority_tip(worst));
    }

    let improving: Vec<BodySegment> = ranked
        .iter()
        .filter(|s| s.trend > coaching::TREND_NOTICE)
        .map(|s| s.segment)
        .collect();
    if !improving.is_empty() {
        tips.push(coaching::improving_tip(&improving));
    }

    let declining: Vec<BodySegment> = ranked
        .iter()
        .filter(|s| s.trend < -coaching::TREND_NOTICE)
        .map(|s| s.segment)
        .collect();
    if !declining.is_empty() {
        tips.push(coaching::declining_tip(&declining));
    }

    tips.push(coaching::closing_tip());
    tips.truncate(MAX_TIPS);
    tips
}

/// Aggregate a finished session.
pub fn analyze_session(samples: &[SessionSample]) -> SessionSummary {
    if samples.len() < MIN_SESSION_SAMPLES {
        log::info!(
            "[Aggregator] {} samples collected, need {}",
            samples.len(),
            MIN_SESSION_SAMPLES
        );
        return SessionSummary::not_available(samples.len());
    }

    let mut ranked: Vec<SegmentStatistics> = BodySegment::ALL
        .iter()
        .filter_map(|segment| segment_statistics(*segment, samples))
        .collect();
    ranked.sort_by(|a, b| a.average.total_cmp(&b.average));

    let focus_areas: Vec<FocusArea> = ranked
        .iter()
        .filter(|s| s.average < FOCUS_THRESHOLD)
        .map(|s| FocusArea {
            segment: s.segment,
            average: round1(s.average),
            feedback: coaching::focus_feedback(s),
            exercises: coaching::exercises(s.segment)
                .iter()
                .map(|e| e.to_string())
                .collect(),
        })
        .collect();

    let strengths: Vec<Strength> = ranked
        .iter()
        .rev()
        .filter(|s| s.average >= FOCUS_THRESHOLD)
        .map(|s| Strength {
            segment: s.segment,
            average: round1(s.average),
            message: coaching::strength_message(s),
        })
        .collect();

    let overall: Vec<f64> = samples.iter().map(|s| s.result.overall).collect();
    let raw_average = mean(&overall);
    let overall_average = round1(raw_average);
    let grade = Grade::from_average(raw_average);
    let tips = build_tips(&focus_areas, &ranked);

    log::info!(
        "[Aggregator] {} samples, average {:.1}, grade {}, {} focus areas",
        samples.len(),
        overall_average,
        grade,
        focus_areas.len()
    );

    SessionSummary {
        sample_count: samples.len(),
        overall_average,
        grade,
        grade_label: grade.label().to_string(),
        grade_color: grade.color().to_string(),
        timeline: build_timeline(samples),
        segments: ranked,
        focus_areas,
        strengths,
        tips,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::test_samples::{series, with_segments};

    const EPS: f64 = 1e-9;

    /// Samples where each listed segment follows its own score series.
    fn scripted(series_by_segment: &[(BodySegment, &[Option<f64>])]) -> Vec<SessionSample> {
        let n = series_by_segment[0].1.len();
        (0..n)
            .map(|i| {
                let segments: BTreeMap<_, _> = series_by_segment
                    .iter()
                    .map(|(segment, scores)| (*segment, scores[i]))
                    .collect();
                let present: Vec<f64> = segments.values().flatten().copied().collect();
                with_segments(i, mean(&present), segments, 300)
            })
            .collect()
    }

    #[test]
    fn test_fewer_than_three_samples_is_not_available() {
        let summary = analyze_session(&series(&[80.0, 90.0], 300));
        assert_eq!(summary.grade, Grade::NotAvailable);
        assert_eq!(summary.grade.as_str(), "N/A");
        assert!(!summary.is_available());
        assert!(summary.focus_areas.is_empty());
        assert!(summary.strengths.is_empty());
        assert!(summary.timeline.is_empty());
        assert!(summary.tips.is_empty());
    }

    #[test]
    fn test_grade_uses_unrounded_average() {
        let summary = analyze_session(&series(&[89.9, 90.0, 90.0, 89.9, 90.0], 300));
        assert_eq!(summary.overall_average, 90.0);
        assert_eq!(summary.grade, Grade::A);
    }

    #[test]
    fn test_grade_thresholds() {
        assert_eq!(Grade::from_average(90.0), Grade::S);
        assert_eq!(Grade::from_average(89.9), Grade::A);
        assert_eq!(Grade::from_average(70.0), Grade::B);
        assert_eq!(Grade::from_average(60.0), Grade::C);
        assert_eq!(Grade::from_average(50.0), Grade::D);
        assert_eq!(Grade::from_average(49.9), Grade::F);
    }

    #[test]
    fn test_segment_statistics() {
        let scores = [Some(40.0), None, Some(60.0), Some(80.0), Some(100.0)];
        let samples = scripted(&[(BodySegment::Torso, &scores)]);
        let stats = segment_statistics(BodySegment::Torso, &samples).unwrap();

        assert!((stats.average - 70.0).abs() < EPS);
        assert_eq!(stats.min, 40.0);
        assert_eq!(stats.max, 100.0);
        // Halves of [40, 60] and [80, 100].
        assert!((stats.trend - 40.0).abs() < EPS);
        let stddev = 500.0f64.sqrt();
        assert!((stats.consistency - (100.0 - 2.0 * stddev)).abs() < EPS);
        assert!(segment_statistics(BodySegment::Head, &samples).is_none());
    }

    #[test]
    fn test_single_score_has_zero_trend() {
        let samples = scripted(&[(BodySegment::Head, &[None, Some(70.0), None])]);
        let stats = segment_statistics(BodySegment::Head, &samples).unwrap();
        assert_eq!(stats.trend, 0.0);
        assert_eq!(stats.consistency, 100.0);
    }

    #[test]
    fn test_consistency_is_not_clamped() {
        let scores = [Some(0.0), Some(100.0), Some(0.0), Some(100.0)];
        let samples = scripted(&[(BodySegment::Torso, &scores)]);
        let stats = segment_statistics(BodySegment::Torso, &samples).unwrap();
        assert!((stats.consistency - 0.0).abs() < EPS);

        let wild = [Some(0.0), Some(0.0), Some(100.0), Some(100.0), Some(0.0), Some(100.0)];
        let samples = scripted(&[(BodySegment::Torso, &wild)]);
        let stats = segment_statistics(BodySegment::Torso, &samples).unwrap();
        assert!(stats.consistency <= 0.0);
    }

    #[test]
    fn test_struggle_runs_need_five_consecutive_scores() {
        let low = Some(30.0);
        let high = Some(80.0);
        let scores = [
            low, low, low, low, low, high, low, low, low, low, None, low, low, low, low, low, low,
        ];
        let runs = struggle_runs(&scores);
        assert_eq!(
            runs,
            vec![
                StruggleRun { start_index: 0, end_index: 4 },
                StruggleRun { start_index: 11, end_index: 16 },
            ]
        );
        assert_eq!(runs[1].len(), 6);
    }

    #[test]
    fn test_focus_and_strength_ranking() {
        let n = 8;
        let arm = vec![Some(45.0); n];
        let leg = vec![Some(65.0); n];
        let torso = vec![Some(80.0); n];
        let head = vec![Some(95.0); n];
        let samples = scripted(&[
            (BodySegment::LeftArm, &arm),
            (BodySegment::RightLeg, &leg),
            (BodySegment::Torso, &torso),
            (BodySegment::Head, &head),
        ]);
        let summary = analyze_session(&samples);

        let focus: Vec<BodySegment> = summary.focus_areas.iter().map(|f| f.segment).collect();
        assert_eq!(focus, vec![BodySegment::LeftArm, BodySegment::RightLeg]);
        assert!(!summary.focus_areas[0].exercises.is_empty());

        let strengths: Vec<BodySegment> = summary.strengths.iter().map(|s| s.segment).collect();
        assert_eq!(strengths, vec![BodySegment::Head, BodySegment::Torso]);
        assert!(summary.strengths[0].message.starts_with("Excellent"));

        // Priority fix then the closing tip; no trend tips on flat scores.
        assert_eq!(summary.tips.len(), 2);
        assert!(summary.tips[0].starts_with("Priority fix: your left arm"));
        assert_eq!(summary.tips[1], coaching::closing_tip());
    }

    #[test]
    fn test_clean_session_gets_single_congratulation() {
        let summary = analyze_session(&series(&[92.0, 94.0, 96.0, 91.0], 300));
        assert_eq!(summary.grade, Grade::S);
        assert_eq!(summary.grade_label, "Outstanding");
        assert!(summary.focus_areas.is_empty());
        assert_eq!(summary.tips, vec![coaching::congratulations_tip()]);
    }

    #[test]
    fn test_tips_are_capped_in_fixed_order() {
        let rising: Vec<Option<f64>> = [30.0, 30.0, 60.0, 60.0].iter().map(|s| Some(*s)).collect();
        let falling: Vec<Option<f64>> = [65.0, 65.0, 40.0, 40.0].iter().map(|s| Some(*s)).collect();
        let flat = vec![Some(50.0); 4];
        let samples = scripted(&[
            (BodySegment::LeftArm, &rising),
            (BodySegment::RightArm, &falling),
            (BodySegment::Torso, &flat),
        ]);
        let summary = analyze_session(&samples);

        assert_eq!(summary.focus_areas.len(), 3);
        assert_eq!(summary.tips.len(), MAX_TIPS);
        assert!(summary.tips[0].starts_with("Several areas"));
        assert!(summary.tips[1].starts_with("Priority fix"));
        assert!(summary.tips[2].contains("left arm improved"));
        assert!(summary.tips[3].contains("right arm slipped"));
        assert_eq!(summary.tips[4], coaching::closing_tip());
    }

    #[test]
    fn test_timeline_chunks_and_weakest_segment() {
        let scores: Vec<f64> = (0..10).map(|i| 50.0 + i as f64 * 5.0).collect();
        let mut samples = series(&scores, 1000);
        samples[9]
            .result
            .segments
            .insert(BodySegment::Head, Some(10.0));
        let summary = analyze_session(&samples);

        // ceil(10 / 4) = 3 -> chunks of 3, 3, 3, 1.
        let bounds: Vec<(usize, usize)> = summary
            .timeline
            .iter()
            .map(|c| (c.start_index, c.end_index))
            .collect();
        assert_eq!(bounds, vec![(0, 2), (3, 5), (6, 8), (9, 9)]);
        assert_eq!(summary.timeline[0].average, 55.0);
        assert_eq!(summary.timeline[0].label, "0:00 - 0:02");
        assert_eq!(summary.timeline[3].label, "0:09 - 0:09");
        assert_eq!(summary.timeline[3].weakest_segment, Some(BodySegment::Head));
        assert_eq!(summary.timeline[0].weakest_segment, Some(BodySegment::LeftArm));
    }

    #[test]
    fn test_summary_serializes_grade_symbol() {
        let summary = analyze_session(&series(&[10.0], 300));
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["grade"], "N/A");
        assert_eq!(json["gradeColor"], "gray");
    }
}
