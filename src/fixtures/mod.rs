//! Fixture utilities for the deterministic CLI harness.
//!
//! This module discovers recorded pose tracks on disk, loads them, and
//! replays them through the same `ComparisonSession` the live engine uses.
//! Replay walks a virtual clock at the configured poll interval and reads
//! the latest frame at or before each tick, so results are reproducible.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::analysis::ComparisonResult;
use crate::config::AppConfig;
use crate::engine::ComparisonSession;
use crate::feedback::VoiceCue;
use crate::pose::Pose;
use crate::session::SessionLog;
use crate::telemetry::{self, DiagnosticError};

pub mod synth;

pub use synth::{synthesize, SynthOptions};

/// Default location for fixture JSON tracks.
pub const DEFAULT_FIXTURE_ROOT: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures");

/// One detector output for both sources at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseFrame {
    pub timestamp_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_time_s: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<Pose>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Pose>,
}

/// Recorded pose track for both sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseFixture {
    pub name: String,
    pub frames: Vec<PoseFrame>,
}

impl PoseFixture {
    pub fn duration_ms(&self) -> u64 {
        match (self.frames.first(), self.frames.last()) {
            (Some(first), Some(last)) => last.timestamp_ms.saturating_sub(first.timestamp_ms),
            _ => 0,
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let json = serde_json::to_string(self)?;
        fs::write(path, json).with_context(|| format!("writing {}", path.display()))
    }
}

/// Metadata describing an available fixture.
#[derive(Clone, Debug, Serialize)]
pub struct FixtureMetadata {
    pub name: String,
    pub path: PathBuf,
}

/// Catalog responsible for discovering fixtures on disk.
pub struct FixtureCatalog {
    root: PathBuf,
}

impl FixtureCatalog {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// List all `*.json` fixtures, sorted by name.
    pub fn discover(&self) -> Result<Vec<FixtureMetadata>> {
        let mut fixtures = Vec::new();
        if !self.root.exists() {
            return Ok(fixtures);
        }

        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) == Some("json") {
                fixtures.push(FixtureMetadata {
                    name: path
                        .file_stem()
                        .and_then(|s| s.to_str())
                        .unwrap_or_default()
                        .to_string(),
                    path,
                });
            }
        }

        fixtures.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(fixtures)
    }

    /// Load a fixture by catalog name or filesystem path.
    pub fn load(&self, fixture: &str) -> Result<PoseFixture> {
        let path = self.resolve_fixture_path(fixture)?;
        load_fixture(&path).inspect_err(|err| {
            telemetry::hub().record_error(DiagnosticError::FixtureLoad, err.to_string());
        })
    }

    fn resolve_fixture_path(&self, fixture: &str) -> Result<PathBuf> {
        let as_path = Path::new(fixture);
        if as_path.exists() {
            return Ok(as_path.to_path_buf());
        }

        let candidate = self.root.join(format!("{fixture}.json"));
        if candidate.exists() {
            Ok(candidate)
        } else {
            Err(anyhow!(
                "Fixture '{fixture}' not found in {}",
                self.root.display()
            ))
        }
    }
}

impl Default for FixtureCatalog {
    fn default() -> Self {
        Self::new(DEFAULT_FIXTURE_ROOT)
    }
}

pub fn load_fixture(path: &Path) -> Result<PoseFixture> {
    let json =
        fs::read_to_string(path).with_context(|| format!("reading fixture {}", path.display()))?;
    let mut fixture: PoseFixture =
        serde_json::from_str(&json).with_context(|| format!("parsing {}", path.display()))?;
    fixture.frames.sort_by_key(|frame| frame.timestamp_ms);
    Ok(fixture)
}

/// Per-tick replay output, emitted as JSON lines in streaming mode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickRecord {
    pub tick_ms: u64,
    pub result: ComparisonResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cue: Option<VoiceCue>,
}

pub struct ReplayOutput {
    pub ticks: Vec<TickRecord>,
    pub skipped: usize,
    pub log: SessionLog,
}

/// Replays fixtures through a fresh `ComparisonSession` on a virtual clock.
pub struct FixtureReplayer {
    config: AppConfig,
}

impl FixtureReplayer {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn run(&self, fixture: &PoseFixture) -> ReplayOutput {
        let mut session = ComparisonSession::new(&self.config, 0);
        let mut ticks = Vec::new();
        let mut skipped = 0usize;

        let Some(first) = fixture.frames.first() else {
            return ReplayOutput {
                ticks,
                skipped,
                log: session.finish(),
            };
        };
        let origin = first.timestamp_ms;
        let end = origin + fixture.duration_ms();
        let poll = self.config.comparison.poll_interval_ms.max(1);

        // Last-value state per source, as the live feeds would hold it.
        let mut reference: Option<&Pose> = None;
        let mut user: Option<&Pose> = None;
        let mut video_time: Option<f64> = None;
        let mut next_frame = 0usize;

        let mut now = origin;
        while now <= end {
            while let Some(frame) = fixture.frames.get(next_frame) {
                if frame.timestamp_ms > now {
                    break;
                }
                reference = frame.reference.as_ref();
                user = frame.user.as_ref();
                video_time = frame.video_time_s;
                next_frame += 1;
            }

            let tick_ms = now - origin;
            match session.tick(tick_ms, reference, user, video_time) {
                Some(outcome) => ticks.push(TickRecord {
                    tick_ms,
                    result: outcome.result,
                    caption: outcome.caption,
                    cue: outcome.cue,
                }),
                None => skipped += 1,
            }
            now += poll;
        }

        log::info!(
            "[Fixtures] Replayed '{}': {} ticks scored, {} skipped",
            fixture.name,
            ticks.len(),
            skipped
        );

        ReplayOutput {
            ticks,
            skipped,
            log: session.finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::test_poses::standing;

    fn frame(timestamp_ms: u64, user: Option<Pose>) -> PoseFrame {
        PoseFrame {
            timestamp_ms,
            video_time_s: Some(timestamp_ms as f64 / 1000.0),
            reference: Some(standing()),
            user,
        }
    }

    fn temp_root(name: &str) -> PathBuf {
        let root = std::env::temp_dir().join(format!(
            "pose_coach_fixtures_{}_{}",
            name,
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&root);
        root
    }

    #[test]
    fn frame_json_accepts_missing_poses() {
        let json = r#"{"name":"gap","frames":[{"timestamp_ms":0},{"timestamp_ms":50,"video_time_s":0.05}]}"#;
        let fixture: PoseFixture = serde_json::from_str(json).unwrap();
        assert_eq!(fixture.frames.len(), 2);
        assert!(fixture.frames[0].reference.is_none());
        assert_eq!(fixture.duration_ms(), 50);
    }

    #[test]
    fn catalog_discovers_saved_fixtures() {
        let root = temp_root("catalog");
        let catalog = FixtureCatalog::new(&root);
        assert!(catalog.discover().unwrap().is_empty());

        let fixture = PoseFixture {
            name: "still".to_string(),
            frames: vec![frame(0, Some(standing()))],
        };
        fixture.save(&root.join("still.json")).unwrap();

        let found = catalog.discover().unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "still");
        assert_eq!(catalog.load("still").unwrap(), fixture);
        assert!(catalog.load("missing").is_err());
        fs::remove_dir_all(root).ok();
    }

    #[test]
    fn replay_uses_latest_frame_per_tick() {
        // Frames every 30 ms, ticks every 100 ms; the user drops out at 300 ms.
        let frames = (0..=20)
            .map(|i| {
                let ts = i * 30;
                frame(ts, (ts < 300).then(standing))
            })
            .collect();
        let fixture = PoseFixture {
            name: "dropout".to_string(),
            frames,
        };
        let output = FixtureReplayer::new(AppConfig::default()).run(&fixture);

        // Ticks at 0..=600 step 100: scored at 0, 100, 200; skipped afterwards.
        let scored: Vec<u64> = output.ticks.iter().map(|t| t.tick_ms).collect();
        assert_eq!(scored, vec![0, 100, 200]);
        assert_eq!(output.skipped, 4);
        assert_eq!(output.log.len(), 1);
        assert_eq!(output.ticks[0].result.overall, 100.0);
    }

    #[test]
    fn replay_is_deterministic() {
        let fixture = synthesize(&SynthOptions {
            duration_s: 6.0,
            ..SynthOptions::default()
        });
        let replayer = FixtureReplayer::new(AppConfig::default());
        let a = replayer.run(&fixture);
        let b = replayer.run(&fixture);
        assert_eq!(a.ticks, b.ticks);
        assert_eq!(a.log, b.log);
    }

    #[test]
    fn empty_fixture_replays_to_nothing() {
        let fixture = PoseFixture {
            name: "empty".to_string(),
            frames: Vec::new(),
        };
        let output = FixtureReplayer::new(AppConfig::default()).run(&fixture);
        assert!(output.ticks.is_empty());
        assert!(output.log.is_empty());
    }
}
