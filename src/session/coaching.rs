// Coaching text tables
//
// Fixed feedback, exercise and tip templates keyed by body segment. The
// aggregator decides which entries apply; this module only phrases them.

use super::aggregator::SegmentStatistics;
use crate::pose::BodySegment;

/// Average at or above which a strength is called excellent.
pub const EXCELLENT_AVERAGE: f64 = 85.0;

/// Trend magnitude (points) reported as improving or declining.
pub const TREND_NOTICE: f64 = 8.0;

/// What to watch for, per segment.
fn segment_advice(segment: BodySegment) -> &'static str {
    match segment {
        BodySegment::LeftArm | BodySegment::RightArm => {
            "Watch the angle at the elbow and how high the hand travels."
        }
        BodySegment::LeftLeg | BodySegment::RightLeg => {
            "Check knee bend depth and where the foot lands relative to the hips."
        }
        BodySegment::Torso => "Keep the shoulders level and stacked over the hips unless the move leans.",
        BodySegment::Head => "Keep your gaze and head tilt in line with the reference.",
    }
}

/// Drill suggestions, per segment.
pub fn exercises(segment: BodySegment) -> &'static [&'static str] {
    match segment {
        BodySegment::LeftArm | BodySegment::RightArm => &[
            "Arm circles, 10 forward and 10 back",
            "Mirror drill: trace the reference arm path at half speed",
            "Hold each arm position for two counts before moving on",
        ],
        BodySegment::LeftLeg | BodySegment::RightLeg => &[
            "Bodyweight squats, 3 sets of 10",
            "Step-touch footwork at half speed",
            "Balance holds, 20 seconds per leg",
        ],
        BodySegment::Torso => &[
            "Standing side bends, 10 per side",
            "Plank hold, 30 seconds",
            "Shoulder rolls to loosen the upper body",
        ],
        BodySegment::Head => &[
            "Neck tilts, 5 per side",
            "Spotting practice: pick a fixed point and return to it",
        ],
    }
}

/// Multi-line feedback for a focus area.
pub fn focus_feedback(stats: &SegmentStatistics) -> String {
    let segment = stats.segment;
    let mut lines = vec![
        format!(
            "Your {} averaged {:.0}% (range {:.0}-{:.0}).",
            segment.display_name(),
            stats.average,
            stats.min,
            stats.max
        ),
        segment_advice(segment).to_string(),
    ];

    if stats.trend > TREND_NOTICE {
        lines.push("It got better as the session went on.".to_string());
    } else if stats.trend < -TREND_NOTICE {
        lines.push("It slipped toward the end; fatigue may be a factor.".to_string());
    }

    if !stats.struggles.is_empty() {
        lines.push(format!(
            "There were {} stretches where it stayed below 50%.",
            stats.struggles.len()
        ));
    }

    lines.join("\n")
}

pub fn strength_message(stats: &SegmentStatistics) -> String {
    let name = stats.segment.display_name();
    if stats.average >= EXCELLENT_AVERAGE {
        format!(
            "Excellent {} work, averaging {:.0}%.",
            name, stats.average
        )
    } else {
        format!(
            "Your {} was good at {:.0}%, with room to tighten the details.",
            name, stats.average
        )
    }
}

pub fn congratulations_tip() -> String {
    "Excellent session! Every tracked segment stayed close to the reference. Try a faster section next."
        .to_string()
}

pub fn multiple_areas_tip(worst: BodySegment) -> String {
    format!(
        "Several areas need attention. Work on one at a time, starting with your {}.",
        worst.display_name()
    )
}

pub fn priority_tip(worst: &SegmentStatistics) -> String {
    format!(
        "Priority fix: your {} averaged {:.0}%. {}",
        worst.segment.display_name(),
        worst.average,
        segment_advice(worst.segment)
    )
}

pub fn improving_tip(segments: &[BodySegment]) -> String {
    format!(
        "Your {} improved as the session went on. Keep that momentum.",
        join_names(segments)
    )
}

pub fn declining_tip(segments: &[BodySegment]) -> String {
    format!(
        "Your {} slipped later in the session. Short breaks help you stay sharp.",
        join_names(segments)
    )
}

pub fn closing_tip() -> String {
    "Slow the reference down and rehearse your worst moments before running the full routine again."
        .to_string()
}

fn join_names(segments: &[BodySegment]) -> String {
    let names: Vec<&str> = segments.iter().map(|s| s.display_name()).collect();
    match names.as_slice() {
        [] => String::new(),
        [only] => only.to_string(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(segment: BodySegment, average: f64, trend: f64) -> SegmentStatistics {
        SegmentStatistics {
            segment,
            average,
            min: average - 10.0,
            max: average + 10.0,
            trend,
            consistency: 90.0,
            struggles: Vec::new(),
        }
    }

    #[test]
    fn test_every_segment_has_exercises() {
        for segment in BodySegment::ALL {
            assert!(!exercises(segment).is_empty(), "{:?}", segment);
        }
    }

    #[test]
    fn test_focus_feedback_mentions_trend() {
        let text = focus_feedback(&stats(BodySegment::LeftLeg, 55.0, 12.0));
        assert!(text.starts_with("Your left leg averaged 55%"));
        assert!(text.contains("got better"));
        assert!(text.lines().count() >= 3);
    }

    #[test]
    fn test_strength_message_tiers() {
        assert!(strength_message(&stats(BodySegment::Head, 92.0, 0.0)).starts_with("Excellent"));
        assert!(strength_message(&stats(BodySegment::Head, 75.0, 0.0)).contains("room"));
    }

    #[test]
    fn test_join_names() {
        assert_eq!(join_names(&[BodySegment::Torso]), "torso");
        assert_eq!(
            join_names(&[BodySegment::LeftArm, BodySegment::Torso, BodySegment::Head]),
            "left arm, torso and head"
        );
    }
}
