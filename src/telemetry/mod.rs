//! Diagnostics telemetry collector and helpers.
//!
//! The collector multiplexes comparison scores, skipped ticks, voice cues,
//! and session lifecycle events into a bounded history plus async broadcast
//! stream.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

use once_cell::sync::Lazy;
use tokio::sync::{broadcast, mpsc};

use crate::analysis::ComparisonResult;
use crate::feedback::VoiceCue;

pub mod events;

pub use events::{DiagnosticError, MetricEvent, SessionPhase, SkipReason};

/// Global telemetry hub shared across the crate.
static HUB: Lazy<TelemetryHub> = Lazy::new(TelemetryHub::default);

/// Access the global telemetry hub.
pub fn hub() -> &'static TelemetryHub {
    &HUB
}

/// Recover the guard from a poisoned lock; telemetry state stays usable.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Snapshot of collector state for HTTP/CLI reporting.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TelemetrySnapshot {
    pub recent: Vec<MetricEvent>,
    pub total_events: u64,
    pub dropped_events: u64,
}

/// Broadcast-based collector retaining a bounded history of metrics.
pub struct TelemetryCollector {
    tx: broadcast::Sender<MetricEvent>,
    history: Mutex<VecDeque<MetricEvent>>,
    history_capacity: usize,
    total_events: AtomicU64,
    dropped_history: AtomicU64,
}

impl TelemetryCollector {
    pub fn new(buffer: usize, history_capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(buffer.max(1));
        Self {
            tx,
            history: Mutex::new(VecDeque::with_capacity(history_capacity)),
            history_capacity,
            total_events: AtomicU64::new(0),
            dropped_history: AtomicU64::new(0),
        }
    }

    pub fn publish(&self, event: MetricEvent) {
        self.total_events.fetch_add(1, Ordering::Relaxed);
        {
            let mut history = lock(&self.history);
            if history.len() == self.history_capacity {
                history.pop_front();
                self.dropped_history.fetch_add(1, Ordering::Relaxed);
            }
            history.push_back(event.clone());
        }

        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MetricEvent> {
        self.tx.subscribe()
    }

    /// Forward broadcast events into an unbounded channel.
    ///
    /// Must be called from within a tokio runtime.
    pub fn subscribe_unbounded(&self) -> mpsc::UnboundedReceiver<MetricEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut broadcast_rx = self.tx.subscribe();

        tokio::spawn(async move {
            while let Ok(event) = broadcast_rx.recv().await {
                if tx.send(event).is_err() {
                    break;
                }
            }
        });

        rx
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        let history = lock(&self.history);
        TelemetrySnapshot {
            recent: history.iter().cloned().collect(),
            total_events: self.total_events.load(Ordering::Relaxed),
            dropped_events: self.dropped_history.load(Ordering::Relaxed),
        }
    }
}

impl Default for TelemetryCollector {
    fn default() -> Self {
        Self::new(256, 64)
    }
}

/// Rolling window of overall scores; yields (avg, min, count).
struct ScoreWindow {
    samples: VecDeque<f64>,
    max_samples: usize,
}

impl ScoreWindow {
    fn new(max_samples: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(max_samples),
            max_samples: max_samples.max(1),
        }
    }

    fn observe(&mut self, value: f64) -> (f64, f64, usize) {
        if self.samples.len() == self.max_samples {
            self.samples.pop_front();
        }
        self.samples.push_back(value);

        let count = self.samples.len();
        let sum: f64 = self.samples.iter().sum();
        let min = self.samples.iter().copied().fold(f64::INFINITY, f64::min);
        (sum / count as f64, min, count)
    }

    fn clear(&mut self) {
        self.samples.clear();
    }
}

/// Top-level hub wrapping collector state plus the rolling score window.
pub struct TelemetryHub {
    collector: TelemetryCollector,
    scores: Mutex<ScoreWindow>,
}

impl TelemetryHub {
    pub fn new(channel_capacity: usize, history_capacity: usize, score_window: usize) -> Self {
        Self {
            collector: TelemetryCollector::new(channel_capacity, history_capacity),
            scores: Mutex::new(ScoreWindow::new(score_window)),
        }
    }

    pub fn collector(&self) -> &TelemetryCollector {
        &self.collector
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        self.collector.snapshot()
    }

    /// Record a comparison; results without data are not scored.
    pub fn record_comparison(&self, result: &ComparisonResult) {
        if !result.has_data() {
            return;
        }
        let (rolling_avg, rolling_min, window_size) = lock(&self.scores).observe(result.overall);

        self.collector.publish(MetricEvent::Comparison {
            overall: result.overall,
            worst_segment: result.worst_segment().map(|(segment, _)| segment),
            rolling_avg,
            rolling_min,
            window_size,
        });
    }

    pub fn record_skip(&self, reason: SkipReason) {
        self.collector.publish(MetricEvent::TickSkipped { reason });
    }

    pub fn record_cue(&self, cue: &VoiceCue) {
        self.collector.publish(MetricEvent::VoiceCue {
            kind: cue.kind,
            segment: cue.segment,
        });
    }

    pub fn record_session_phase(&self, phase: SessionPhase) {
        if phase == SessionPhase::Started {
            lock(&self.scores).clear();
        }
        self.collector.publish(MetricEvent::SessionLifecycle {
            phase,
            timestamp_ms: now_timestamp_ms(),
        });
    }

    pub fn record_error(&self, code: DiagnosticError, context: impl Into<String>) {
        self.collector.publish(MetricEvent::Error {
            code,
            context: context.into(),
        });
    }
}

impl Default for TelemetryHub {
    fn default() -> Self {
        Self::new(256, 64, 32)
    }
}

pub(crate) fn now_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
