//! Last-value input slots fed by the external pose-detection provider.
//!
//! Producers overwrite the current value at their own cadence; the
//! comparison loop reads whatever is current on each tick. Nothing is queued.

use tokio::sync::watch;

use crate::pose::Pose;

/// Single-value slot backed by a `watch` channel.
#[derive(Debug)]
pub struct LatestSlot<T> {
    tx: watch::Sender<Option<T>>,
}

impl<T: Clone> LatestSlot<T> {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx }
    }

    /// Overwrite the current value. Never blocks, never fails.
    pub fn publish(&self, value: Option<T>) {
        self.tx.send_replace(value);
    }

    pub fn clear(&self) {
        self.publish(None);
    }

    /// Clone of the current value.
    pub fn latest(&self) -> Option<T> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<T>> {
        self.tx.subscribe()
    }
}

impl<T: Clone> Default for LatestSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Latest detected pose for one source (reference track or live camera).
pub type PoseFeed = LatestSlot<Pose>;

/// Latest reference-video playback position in seconds.
pub type PlaybackFeed = LatestSlot<f64>;
