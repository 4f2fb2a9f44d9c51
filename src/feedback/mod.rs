//! Live feedback helpers: spoken cue throttling and overlay score bands.

pub mod bands;
pub mod voice;

pub use bands::ScoreBand;
pub use voice::{directional_cue, CueKind, VoiceCue, VoiceCueState, VoiceCueThrottle};
