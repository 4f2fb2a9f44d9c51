//! CoachEngine: live comparison session orchestration.
//!
//! Owns the input feeds, broadcast channels, and the single sampling task.
//! The task polls the latest pose of each feed at a fixed cadence, scores the
//! pair through [`ComparisonSession`], and publishes results and cues.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::sync::{broadcast, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::feed::{PlaybackFeed, PoseFeed};
use super::tick::ComparisonSession;
use crate::analysis::ComparisonResult;
use crate::config::AppConfig;
use crate::error::{log_session_error, SessionError};
use crate::feedback::VoiceCue;
use crate::managers::BroadcastChannelManager;
use crate::pose::Pose;
use crate::session::report::{analyze_log, ReportOptions};
use crate::session::{SessionLog, SessionReport};
use crate::telemetry::{self, now_timestamp_ms, SessionPhase};

struct RunningSession {
    stop_tx: oneshot::Sender<()>,
    handle: JoinHandle<SessionLog>,
}

/// Input receivers and output senders moved into the sampling task.
struct SessionChannels {
    reference: watch::Receiver<Option<Pose>>,
    user: watch::Receiver<Option<Pose>>,
    playback: watch::Receiver<Option<f64>>,
    comparison_tx: broadcast::Sender<ComparisonResult>,
    cue_tx: broadcast::Sender<VoiceCue>,
    voice_muted: Arc<AtomicBool>,
}

/// Handle to the comparison engine. One session at a time.
pub struct CoachEngine {
    config: AppConfig,
    reference: PoseFeed,
    user: PoseFeed,
    playback: PlaybackFeed,
    pub(crate) broadcasts: BroadcastChannelManager,
    voice_muted: Arc<AtomicBool>,
    session: Mutex<Option<RunningSession>>,
}

impl CoachEngine {
    /// Engine using `assets/coach_config.json` (or defaults).
    pub fn new() -> Self {
        Self::from_config(AppConfig::load())
    }

    pub fn from_config(config: AppConfig) -> Self {
        let broadcasts = BroadcastChannelManager::new(config.broadcast.clone());
        let voice_muted = Arc::new(AtomicBool::new(!config.voice.enabled));
        Self {
            config,
            reference: PoseFeed::new(),
            user: PoseFeed::new(),
            playback: PlaybackFeed::new(),
            broadcasts,
            voice_muted,
            session: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    // ========================================================================
    // INPUT FEEDS
    // ========================================================================

    pub fn publish_reference(&self, pose: Option<Pose>) {
        self.reference.publish(pose);
    }

    pub fn publish_user(&self, pose: Option<Pose>) {
        self.user.publish(pose);
    }

    pub fn publish_playback_time(&self, seconds: Option<f64>) {
        self.playback.publish(seconds);
    }

    // ========================================================================
    // OUTPUT STREAMS
    // ========================================================================

    pub fn subscribe_comparisons(&self) -> Option<broadcast::Receiver<ComparisonResult>> {
        self.broadcasts.subscribe_comparison()
    }

    pub fn subscribe_cues(&self) -> Option<broadcast::Receiver<VoiceCue>> {
        self.broadcasts.subscribe_cues()
    }

    pub fn mute_voice(&self) {
        self.voice_muted.store(true, Ordering::SeqCst);
    }

    pub fn unmute_voice(&self) {
        self.voice_muted.store(false, Ordering::SeqCst);
    }

    // ========================================================================
    // SESSION LIFECYCLE
    // ========================================================================

    fn lock_session(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, Option<RunningSession>>, SessionError> {
        self.session.lock().map_err(|_| SessionError::LockPoisoned {
            component: "session".to_string(),
        })
    }

    pub fn is_running(&self) -> bool {
        self.lock_session()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }

    /// Spawn the sampling task on the current tokio runtime.
    ///
    /// Output channels are re-created, so subscribe after this returns.
    pub fn start_session(&self) -> Result<(), SessionError> {
        let mut guard = self.lock_session()?;
        if guard.is_some() {
            let err = SessionError::AlreadyRunning;
            log_session_error(&err, "start_session");
            return Err(err);
        }

        let runtime = tokio::runtime::Handle::try_current().map_err(|err| {
            SessionError::TaskFailed {
                reason: err.to_string(),
            }
        })?;

        let channels = SessionChannels {
            reference: self.reference.subscribe(),
            user: self.user.subscribe(),
            playback: self.playback.subscribe(),
            comparison_tx: self.broadcasts.init_comparison(),
            cue_tx: self.broadcasts.init_cues(),
            voice_muted: Arc::clone(&self.voice_muted),
        };
        let session = ComparisonSession::new(&self.config, now_timestamp_ms());
        let poll = Duration::from_millis(self.config.comparison.poll_interval_ms.max(1));
        let (stop_tx, stop_rx) = oneshot::channel();

        let handle = runtime.spawn(run_session(session, channels, poll, stop_rx));
        *guard = Some(RunningSession { stop_tx, handle });

        telemetry::hub().record_session_phase(SessionPhase::Started);
        tracing::info!(poll_ms = poll.as_millis() as u64, "[CoachEngine] Session started");
        Ok(())
    }

    /// Signal the sampling task and wait for its sample log.
    ///
    /// A tick already in progress completes before the task exits.
    pub async fn stop_session(&self) -> Result<SessionLog, SessionError> {
        let running = self.lock_session()?.take();
        let Some(running) = running else {
            let err = SessionError::NotRunning;
            log_session_error(&err, "stop_session");
            return Err(err);
        };

        // The task may already have exited; the join below still yields its log.
        let _ = running.stop_tx.send(());
        let log = running.handle.await.map_err(|err| {
            let err = SessionError::TaskFailed {
                reason: err.to_string(),
            };
            log_session_error(&err, "stop_session");
            err
        })?;

        self.broadcasts.close_all();
        telemetry::hub().record_session_phase(SessionPhase::Stopped);
        tracing::info!(samples = log.len(), "[CoachEngine] Session stopped");
        Ok(log)
    }

    /// Post-session batch analysis with the configured moment settings.
    pub fn analyze(&self, log: &SessionLog) -> SessionReport {
        let report = analyze_log(log, &ReportOptions::from_config(&self.config));
        telemetry::hub().record_session_phase(SessionPhase::Analyzed);
        report
    }
}

impl Default for CoachEngine {
    fn default() -> Self {
        Self::new()
    }
}

async fn run_session(
    mut session: ComparisonSession,
    channels: SessionChannels,
    poll: Duration,
    mut stop_rx: oneshot::Receiver<()>,
) -> SessionLog {
    let mut interval = tokio::time::interval(poll);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let started = Instant::now();
    let mut muted = false;

    loop {
        tokio::select! {
            biased;
            _ = &mut stop_rx => break,
            _ = interval.tick() => {
                let want_muted = channels.voice_muted.load(Ordering::SeqCst);
                if want_muted != muted {
                    if want_muted {
                        session.throttle_mut().mute();
                    } else {
                        session.throttle_mut().unmute();
                    }
                    muted = want_muted;
                }

                let now_ms = started.elapsed().as_millis() as u64;
                let reference = channels.reference.borrow().clone();
                let user = channels.user.borrow().clone();
                let video_time = *channels.playback.borrow();

                let Some(outcome) = session.tick(now_ms, reference.as_ref(), user.as_ref(), video_time) else {
                    tracing::trace!(now_ms, "[CoachEngine] Tick skipped");
                    continue;
                };

                // No subscribers is fine; results are still logged.
                let _ = channels.comparison_tx.send(outcome.result);
                if let Some(cue) = outcome.cue {
                    tracing::debug!(now_ms, text = %cue.text, "[CoachEngine] Voice cue");
                    let _ = channels.cue_tx.send(cue);
                }
            }
        }
    }

    tracing::debug!(
        comparisons = session.comparisons(),
        "[CoachEngine] Sampling loop exited"
    );
    session.finish()
}

#[cfg(test)]
mod tests;
