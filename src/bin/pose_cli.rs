use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pose_coach::config::AppConfig;
use pose_coach::error::SessionError;
use pose_coach::fixtures::{
    synthesize, FixtureCatalog, FixtureReplayer, PoseFixture, ReplayOutput, SynthOptions,
};
use pose_coach::http;
use pose_coach::narrative::{NarrativeService, RecordedNarrative};
use pose_coach::session::aggregator::MIN_SESSION_SAMPLES;
use pose_coach::session::report::{build_report, ReportOptions};
use pose_coach::session::{SessionLog, SessionReport};
use pose_coach::CoachEngine;
use once_cell::sync::OnceCell;
use serde::Serialize;
use tokio::sync::broadcast::error::TryRecvError;

/// Engine shared with the debug HTTP server for the `live` command.
static LIVE_ENGINE: OnceCell<CoachEngine> = OnceCell::new();

#[derive(Parser, Debug)]
#[command(
    name = "pose_cli",
    about = "Deterministic pose comparison harness for Pose Coach"
)]
struct Cli {
    /// Override directory containing fixture tracks (defaults to ./fixtures in the crate)
    #[arg(long)]
    fixtures_dir: Option<PathBuf>,
    /// Config JSON (defaults to assets/coach_config.json, falling back to built-ins)
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Debug, Clone)]
struct SynthArgs {
    #[arg(long, default_value_t = 7)]
    seed: u64,
    #[arg(long, default_value_t = 30.0)]
    duration: f64,
    #[arg(long, default_value_t = 2)]
    mistakes: usize,
    #[arg(long, default_value_t = 0.01)]
    jitter: f64,
    #[arg(long, default_value_t = 0.02)]
    dropout: f64,
}

impl SynthArgs {
    fn options(&self) -> SynthOptions {
        SynthOptions {
            seed: self.seed,
            duration_s: self.duration,
            mistakes: self.mistakes,
            jitter: self.jitter,
            dropout: self.dropout,
            ..SynthOptions::default()
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a synthetic session, replay it, and print the report
    Simulate {
        #[command(flatten)]
        synth: SynthArgs,
        /// Fail when the session is too short to grade
        #[arg(long)]
        strict: bool,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Write a synthetic fixture track to disk
    Synth {
        #[command(flatten)]
        synth: SynthArgs,
        #[arg(long)]
        output: PathBuf,
    },
    /// Replay a fixture track and print the report
    Replay {
        #[arg(long)]
        fixture: String,
        /// Canned narrative response file
        #[arg(long)]
        narrative: Option<PathBuf>,
        /// Print per-tick results and cues as JSON lines instead of a report
        #[arg(long)]
        stream: bool,
        #[arg(long)]
        strict: bool,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Feed a track through the live engine in real time, then print the report
    ///
    /// Debug builds with `debug_http` also serve the engine over HTTP.
    Live {
        /// Fixture to play; a synthetic track is generated when omitted
        #[arg(long)]
        fixture: Option<String>,
        #[command(flatten)]
        synth: SynthArgs,
        /// Playback speed multiplier
        #[arg(long, default_value_t = 1.0)]
        speed: f64,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// List available fixtures on disk
    DumpFixtures,
}

fn main() -> ExitCode {
    pose_coach::init_logging();
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let catalog = cli
        .fixtures_dir
        .map(FixtureCatalog::new)
        .unwrap_or_default();
    let config = cli
        .config
        .as_deref()
        .map(AppConfig::load_from_file)
        .unwrap_or_else(AppConfig::load);

    match cli.command {
        Commands::Simulate {
            synth,
            strict,
            output,
        } => {
            let fixture = synthesize(&synth.options());
            run_report(&config, &fixture, None, strict, output)
        }
        Commands::Synth { synth, output } => run_synth(&synth, &output),
        Commands::Replay {
            fixture,
            narrative,
            stream,
            strict,
            output,
        } => {
            let fixture = catalog.load(&fixture)?;
            if stream {
                run_stream(&config, &fixture)
            } else {
                let service = narrative.map(RecordedNarrative::new);
                run_report(&config, &fixture, service, strict, output)
            }
        }
        Commands::Live {
            fixture,
            synth,
            speed,
            output,
        } => {
            let fixture = match fixture {
                Some(name) => catalog.load(&name)?,
                None => synthesize(&synth.options()),
            };
            run_live(&config, &fixture, speed, output)
        }
        Commands::DumpFixtures => run_dump(&catalog),
    }
}

fn run_report(
    config: &AppConfig,
    fixture: &PoseFixture,
    narrative: Option<RecordedNarrative>,
    strict: bool,
    output_path: Option<PathBuf>,
) -> Result<ExitCode> {
    let replay = FixtureReplayer::new(config.clone()).run(fixture);
    let options = ReportOptions::from_config(config);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("building runtime for report")?;
    let service = narrative.as_ref().map(|s| s as &dyn NarrativeService);
    let report = runtime.block_on(build_report(&replay.log, &options, service));

    if strict && !report.summary.is_available() {
        let err = SessionError::InsufficientSamples {
            required: MIN_SESSION_SAMPLES,
            collected: replay.log.len(),
        };
        return Err(err).with_context(|| format!("grading fixture {}", fixture.name));
    }

    emit_report(&fixture.name, &replay, &report, output_path)?;
    Ok(ExitCode::from(0))
}

fn run_live(
    config: &AppConfig,
    fixture: &PoseFixture,
    speed: f64,
    output_path: Option<PathBuf>,
) -> Result<ExitCode> {
    let engine = LIVE_ENGINE.get_or_init(|| CoachEngine::from_config(config.clone()));
    http::spawn_if_enabled(engine);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("building runtime for live session")?;
    let log = runtime.block_on(drive_live(engine, fixture, speed))?;
    let report = engine.analyze(&log);

    let payload = LivePayload {
        fixture: &fixture.name,
        speed,
        samples: log.len(),
        report: &report,
    };
    emit_json(&payload, output_path)?;
    Ok(ExitCode::from(0))
}

/// Publish frames at their recorded pace while the engine samples them.
async fn drive_live(engine: &CoachEngine, fixture: &PoseFixture, speed: f64) -> Result<SessionLog> {
    engine.start_session()?;
    let mut cues = engine.subscribe_cues();

    let speed = speed.max(0.01);
    let origin = fixture.frames.first().map(|f| f.timestamp_ms).unwrap_or_default();
    let started = tokio::time::Instant::now();

    for frame in &fixture.frames {
        let offset_s = frame.timestamp_ms.saturating_sub(origin) as f64 / 1000.0 / speed;
        tokio::time::sleep_until(started + Duration::from_secs_f64(offset_s)).await;

        engine.publish_reference(frame.reference.clone());
        engine.publish_user(frame.user.clone());
        engine.publish_playback_time(frame.video_time_s);

        if let Some(rx) = cues.as_mut() {
            loop {
                match rx.try_recv() {
                    Ok(cue) => tracing::info!(text = %cue.text, "[Live] Voice cue"),
                    Err(TryRecvError::Lagged(_)) => continue,
                    Err(_) => break,
                }
            }
        }
    }

    Ok(engine.stop_session().await?)
}

fn run_stream(config: &AppConfig, fixture: &PoseFixture) -> Result<ExitCode> {
    let replay = FixtureReplayer::new(config.clone()).run(fixture);
    for tick in &replay.ticks {
        println!("{}", serde_json::to_string(tick)?);
    }
    Ok(ExitCode::from(0))
}

fn run_synth(args: &SynthArgs, output: &Path) -> Result<ExitCode> {
    let fixture = synthesize(&args.options());
    fixture.save(output)?;
    println!(
        "Wrote {} frames ({} ms) to {}",
        fixture.frames.len(),
        fixture.duration_ms(),
        output.display()
    );
    Ok(ExitCode::from(0))
}

fn run_dump(catalog: &FixtureCatalog) -> Result<ExitCode> {
    let fixtures = catalog.discover()?;
    if fixtures.is_empty() {
        println!("No fixtures found under {}", catalog.root().display());
        return Ok(ExitCode::from(0));
    }

    for metadata in fixtures {
        println!("{} -> {}", metadata.name, metadata.path.display());
    }
    Ok(ExitCode::from(0))
}

fn emit_report(
    fixture: &str,
    replay: &ReplayOutput,
    report: &SessionReport,
    output_path: Option<PathBuf>,
) -> Result<()> {
    let payload = ReportPayload {
        fixture,
        ticks_scored: replay.ticks.len(),
        ticks_skipped: replay.skipped,
        samples: replay.log.len(),
        report,
    };
    emit_json(&payload, output_path)
}

fn emit_json<T: Serialize>(payload: &T, output_path: Option<PathBuf>) -> Result<()> {
    let json = serde_json::to_string_pretty(payload)?;

    if let Some(path) = output_path {
        fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    } else {
        println!("{json}");
    }

    Ok(())
}

#[derive(Serialize)]
struct ReportPayload<'a> {
    fixture: &'a str,
    ticks_scored: usize,
    ticks_skipped: usize,
    samples: usize,
    report: &'a SessionReport,
}

#[derive(Serialize)]
struct LivePayload<'a> {
    fixture: &'a str,
    speed: f64,
    samples: usize,
    report: &'a SessionReport,
}
