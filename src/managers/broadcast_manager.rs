// BroadcastChannelManager: Centralized tokio broadcast channel management
// Single Responsibility: Broadcast channel lifecycle and subscription

use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;

use crate::analysis::ComparisonResult;
use crate::config::BroadcastConfig;
use crate::feedback::VoiceCue;

type Slot<T> = Arc<Mutex<Option<broadcast::Sender<T>>>>;

fn lock<T>(slot: &Slot<T>) -> MutexGuard<'_, Option<broadcast::Sender<T>>> {
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Manages the live-output broadcast channels
///
/// # Channel Types
/// - Comparison: one `ComparisonResult` per scored tick, for the live overlay
/// - Cues: `VoiceCue`s for the speech synthesizer
///
/// Lagging subscribers lose the oldest messages; producers never block.
pub struct BroadcastChannelManager {
    config: BroadcastConfig,
    comparison: Slot<ComparisonResult>,
    cues: Slot<VoiceCue>,
}

impl BroadcastChannelManager {
    /// Create a manager with all channels uninitialized
    ///
    /// Channels must be explicitly initialized via init_* methods before use.
    pub fn new(config: BroadcastConfig) -> Self {
        Self {
            config,
            comparison: Arc::new(Mutex::new(None)),
            cues: Arc::new(Mutex::new(None)),
        }
    }

    // ========================================================================
    // COMPARISON CHANNEL
    // ========================================================================

    /// Initialize the comparison channel and return its sender
    ///
    /// Replaces any previous channel; existing subscribers see it close once
    /// the old sender is dropped.
    pub fn init_comparison(&self) -> broadcast::Sender<ComparisonResult> {
        let (tx, _) = broadcast::channel(self.config.comparison_capacity.max(1));
        *lock(&self.comparison) = Some(tx.clone());
        tx
    }

    /// Subscribe to comparison results; `None` before `init_comparison()`
    pub fn subscribe_comparison(&self) -> Option<broadcast::Receiver<ComparisonResult>> {
        lock(&self.comparison).as_ref().map(|tx| tx.subscribe())
    }

    // ========================================================================
    // VOICE CUE CHANNEL
    // ========================================================================

    pub fn init_cues(&self) -> broadcast::Sender<VoiceCue> {
        let (tx, _) = broadcast::channel(self.config.cue_capacity.max(1));
        *lock(&self.cues) = Some(tx.clone());
        tx
    }

    pub fn subscribe_cues(&self) -> Option<broadcast::Receiver<VoiceCue>> {
        lock(&self.cues).as_ref().map(|tx| tx.subscribe())
    }

    /// Drop both senders so subscribers observe channel closure.
    pub fn close_all(&self) {
        *lock(&self.comparison) = None;
        *lock(&self.cues) = None;
    }
}

impl Default for BroadcastChannelManager {
    fn default() -> Self {
        Self::new(BroadcastConfig::default())
    }
}
