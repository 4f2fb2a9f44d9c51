use serde::{Deserialize, Serialize};

/// Colour band of a live score, used for skeleton and score overlays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    Perfect,
    Good,
    Close,
    Off,
    WayOff,
}

impl ScoreBand {
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 85.0 => ScoreBand::Perfect,
            s if s >= 70.0 => ScoreBand::Good,
            s if s >= 55.0 => ScoreBand::Close,
            s if s >= 40.0 => ScoreBand::Off,
            _ => ScoreBand::WayOff,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ScoreBand::Perfect => "Perfect!",
            ScoreBand::Good => "Good",
            ScoreBand::Close => "Close",
            ScoreBand::Off => "Off",
            ScoreBand::WayOff => "Way Off",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            ScoreBand::Perfect => "green",
            ScoreBand::Good => "yellow-green",
            ScoreBand::Close => "amber",
            ScoreBand::Off => "orange",
            ScoreBand::WayOff => "red",
        }
    }
}
