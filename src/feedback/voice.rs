// Voice-cue throttle - decides if and what to say on each comparison tick
//
// One throttle per session. It enforces a global cooldown between
// utterances, a longer window before naming the same segment again, and
// only praises when nothing needs correcting.

use serde::{Deserialize, Serialize};

use crate::analysis::ComparisonResult;
use crate::config::VoiceConfig;
use crate::pose::{BodySegment, Pose};

/// Offset difference (normalized image units) that earns a directional cue.
const DIRECTION_THRESHOLD: f64 = 0.04;

pub const PRAISE_TEXT: &str = "Great job, keep it up!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CueKind {
    Praise,
    Correction,
}

/// Text to hand to the speech synthesizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceCue {
    pub text: String,
    /// Segment being corrected; `None` for praise
    pub segment: Option<BodySegment>,
    pub kind: CueKind,
}

/// Timing state carried between ticks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceCueState {
    pub last_speak_ms: Option<u64>,
    pub last_spoken_segment: Option<BodySegment>,
}

impl VoiceCueState {
    /// Milliseconds since the last utterance; `None` means never spoke.
    fn elapsed(&self, now_ms: u64) -> Option<u64> {
        self.last_speak_ms.map(|at| now_ms.saturating_sub(at))
    }
}

pub struct VoiceCueThrottle {
    config: VoiceConfig,
    enabled: bool,
    state: VoiceCueState,
}

impl VoiceCueThrottle {
    pub fn new(config: VoiceConfig) -> Self {
        Self {
            enabled: config.enabled,
            config,
            state: VoiceCueState::default(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn state(&self) -> VoiceCueState {
        self.state
    }

    /// Clear timing state; called at session start.
    pub fn reset(&mut self) {
        self.state = VoiceCueState::default();
    }

    pub fn mute(&mut self) {
        self.enabled = false;
        self.reset();
    }

    pub fn unmute(&mut self) {
        self.enabled = true;
    }

    /// Evaluate one comparison. `external_cue` (typically the posecode-derived
    /// voice cue) takes priority over the geometric fallback.
    pub fn evaluate(
        &mut self,
        now_ms: u64,
        result: &ComparisonResult,
        reference: Option<&Pose>,
        user: Option<&Pose>,
        external_cue: Option<&str>,
    ) -> Option<VoiceCue> {
        if !self.enabled || !result.has_data() {
            return None;
        }

        let elapsed = self.state.elapsed(now_ms);
        let past = |window_ms: u64| elapsed.map_or(true, |e| e >= window_ms);
        if !past(self.config.cooldown_ms) {
            return None;
        }

        let (segment, score) = result.worst_segment()?;

        if score >= self.config.flag_threshold {
            let praise_due = elapsed.map_or(true, |e| e > self.config.repeat_ms);
            if result.overall >= self.config.praise_threshold && praise_due {
                self.state.last_speak_ms = Some(now_ms);
                return Some(VoiceCue {
                    text: PRAISE_TEXT.to_string(),
                    segment: None,
                    kind: CueKind::Praise,
                });
            }
            return None;
        }

        if self.state.last_spoken_segment == Some(segment) && !past(self.config.repeat_ms) {
            return None;
        }

        let text = external_cue
            .filter(|cue| !cue.trim().is_empty())
            .map(str::to_string)
            .or_else(|| directional_cue(segment, reference?, user?))
            .unwrap_or_else(|| format!("Watch your {}", segment.display_name()));

        self.state.last_speak_ms = Some(now_ms);
        self.state.last_spoken_segment = Some(segment);
        log::debug!("[VoiceCue] t={}ms {:?}: {}", now_ms, segment, text);

        Some(VoiceCue {
            text,
            segment: Some(segment),
            kind: CueKind::Correction,
        })
    }
}

/// Compare the primary bone offsets of both poses and phrase a correction.
///
/// `None` when either bone endpoint is not visible in either pose.
pub fn directional_cue(segment: BodySegment, reference: &Pose, user: &Pose) -> Option<String> {
    let bone = segment.primary_bone();
    let ref_base = reference.visible(bone.base)?;
    let ref_tip = reference.visible(bone.tip)?;
    let user_base = user.visible(bone.base)?;
    let user_tip = user.visible(bone.tip)?;

    let dx = (user_tip.x - user_base.x) - (ref_tip.x - ref_base.x);
    let dy = (user_tip.y - user_base.y) - (ref_tip.y - ref_base.y);
    let name = segment.display_name();

    let text = if dy.abs() >= dx.abs() && dy.abs() > DIRECTION_THRESHOLD {
        // Image y grows downward: a positive dy means the user is lower.
        if dy > 0.0 {
            format!("Raise your {}", name)
        } else {
            format!("Lower your {}", name)
        }
    } else if dx.abs() > DIRECTION_THRESHOLD {
        if dx > 0.0 {
            format!("Move your {} to the left", name)
        } else {
            format!("Move your {} to the right", name)
        }
    } else {
        format!("Adjust your {} position", name)
    };
    Some(text)
}
