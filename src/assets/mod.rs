//! Authoring data: cutscenes, event sequences, and scene definitions.
//!
//! All of these are plain immutable records loaded from JSON with
//! `serde_json`. Loading happens outside the playback core; once handed to
//! the player or a sequencer they are shared through `Arc` and never edited.
//!
//! Submodules:
//! - [`cutscene`] – shots, cutscenes, and playlists
//! - [`eventsequence`] – timed event lists with additive/absolute resolution
//! - [`scene`] – scene definitions spawned by the scene loader

pub mod cutscene;
pub mod eventsequence;
pub mod scene;

use std::path::Path;
use std::sync::Arc;

use log::info;
use serde::Deserialize;

use crate::assets::cutscene::{Cutscene, Playlist};
use crate::assets::eventsequence::EventSequence;
use crate::error::AssetError;

/// On-disk playlist layout: `{ "cutscenes": [ {...}, null, ... ] }`.
#[derive(Deserialize)]
struct PlaylistFile {
    #[serde(default)]
    cutscenes: Vec<Option<Cutscene>>,
}

/// Parse a playlist from a JSON string.
pub fn parse_playlist(json: &str) -> Result<Playlist, AssetError> {
    let file: PlaylistFile = serde_json::from_str(json)?;
    Ok(file
        .cutscenes
        .into_iter()
        .map(|entry| entry.map(Arc::new))
        .collect())
}

/// Load a playlist JSON file.
pub fn load_playlist(path: impl AsRef<Path>) -> Result<Playlist, AssetError> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path)?;
    let playlist = parse_playlist(&json)?;
    info!(
        "Loaded playlist {:?} with {} entries",
        path,
        playlist.len()
    );
    Ok(playlist)
}

/// Load a standalone event sequence JSON file.
pub fn load_event_sequence(path: impl AsRef<Path>) -> Result<EventSequence, AssetError> {
    let json = std::fs::read_to_string(path.as_ref())?;
    Ok(serde_json::from_str(&json)?)
}
