//! Engine module housing the live comparison loop.
//!
//! `feed` holds the last-value input slots, `tick` the synchronous per-tick
//! core, and `core` the `CoachEngine` handle that owns the sampling task.

pub mod core;
pub mod feed;
pub mod tick;

pub use core::CoachEngine;
pub use feed::{LatestSlot, PlaybackFeed, PoseFeed};
pub use tick::{ComparisonSession, TickOutcome};
