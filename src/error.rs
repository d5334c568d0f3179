//! Error types for asset loading, scene loading, configuration, and playback.
//!
//! Only resource failures are represented here. Configuration problems inside
//! authoring data (duplicate camera ids, missing cameras, empty playlists) are
//! reported through the log and skipped, never surfaced as errors.

use thiserror::Error;

/// Scene loading errors reported by a [`SceneSource`](crate::resources::sceneloader::SceneSource)
/// or the [`SceneLoader`](crate::resources::sceneloader::SceneLoader).
///
/// Cloneable so a failed request can be inspected by several readers.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    /// No scene with that name exists in the source
    #[error("Scene not found: {name}")]
    NotFound { name: String },

    /// Scene file could not be read
    #[error("Failed to read scene '{name}': {reason}")]
    Io { name: String, reason: String },

    /// Scene file is not a valid scene definition
    #[error("Failed to parse scene '{name}': {reason}")]
    Parse { name: String, reason: String },

    /// The loader worker thread is gone
    #[error("Scene loader is shut down")]
    LoaderShutDown,
}

/// Authoring data loading errors.
#[derive(Error, Debug)]
pub enum AssetError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration file errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config file: {0}")]
    Load(String),

    #[error("Failed to save config file: {0}")]
    Save(String),
}

/// Conditions that abort a playback session.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlaybackError {
    /// A required scene failed to load
    #[error("Cutscene '{cutscene}' aborted: {source}")]
    SceneLoad {
        cutscene: String,
        #[source]
        source: SceneError,
    },

    /// Playback was requested without a camera brain in the world
    #[error("No CameraBrain resource found; insert one before playing cutscenes")]
    MissingBrain,
}
