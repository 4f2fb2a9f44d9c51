// Pose Coach Core - pose comparison and session analysis engine
// Live two-source comparison loop with post-session coaching reports

// Module declarations
pub mod analysis;
pub mod config;
pub mod engine;
pub mod error;
pub mod feedback;
pub mod fixtures;
pub mod http;
pub mod managers;
pub mod narrative;
pub mod pose;
pub mod session;
pub mod telemetry;

// Re-exports for convenience
pub use analysis::{compare_poses, ComparisonResult};
pub use engine::CoachEngine;
pub use pose::{BodySegment, Landmark, Pose};
pub use session::{analyze_session, find_worst_moments, SessionReport};

/// Install the fmt subscriber on stderr; `log` records are forwarded.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .try_init();
}
