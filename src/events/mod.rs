//! Event types and observers.
//!
//! Submodules:
//! - [`cutscene`] – playback notifications and playback requests
//! - [`sceneloader`] – loader thread messages and scene activation notifications
//!
//! Keyed gameplay events broadcast by sequencers do not go through bevy
//! events; they use the [`GameEventBus`](crate::resources::gameeventbus::GameEventBus).
pub mod cutscene;
pub mod sceneloader;
