// Managers Module
//
// Focused manager types owned by the engine handle.
//
// - BroadcastChannelManager: Tokio broadcast channel management

pub mod broadcast_manager;

pub use broadcast_manager::BroadcastChannelManager;
