//! Cutscene playback notifications and requests.
//!
//! [`CutsceneEvent`]s are triggered on the world by
//! [`cutscene_player_system`](crate::systems::cutscene::cutscene_player_system)
//! after each tick, in the order they happened. Observe them to react to
//! playback progress:
//!
//! ```ignore
//! world.add_observer(|ev: On<CutsceneEvent>| {
//!     if let CutsceneEvent::Aborted { error, .. } = &*ev {
//!         log::error!("cutscene aborted: {error}");
//!     }
//! });
//! ```
//!
//! [`CutsceneRequest`] goes the other way: any system holding `Commands` can
//! trigger one, and [`observe_cutscene_request`] applies it once the world is
//! available.

use bevy_ecs::observer::On;
use bevy_ecs::prelude::*;
use log::debug;

use crate::error::PlaybackError;
use crate::resources::cutsceneplayer::{play_next, play_playlist, stop_cutscene};

#[derive(Event, Debug, Clone, PartialEq)]
pub enum CutsceneEvent {
    /// A cutscene began (before its scenes load).
    Started { index: usize, name: String },
    /// A shot began. `camera_found` is false when its camera id was unknown.
    ShotStarted {
        index: usize,
        shot: usize,
        camera_id: String,
        camera_found: bool,
    },
    /// A cutscene ran to completion, including its next-scene load.
    Finished { index: usize, name: String },
    /// No cutscene is left to play.
    PlaylistFinished,
    /// A required scene failed to load; playback was torn down.
    Aborted { index: usize, error: PlaybackError },
}

/// Playback control request.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutsceneRequest {
    PlayPlaylist(usize),
    PlayIndex(usize),
    PlayNext,
    Stop,
}

/// Observer that forwards a [`CutsceneRequest`] to the player.
///
/// The request is deferred through `Commands` so it runs with exclusive
/// world access after the triggering system finishes.
pub fn observe_cutscene_request(trigger: On<CutsceneRequest>, mut commands: Commands) {
    let request = *trigger;
    debug!("CutsceneRequest {:?}", request);
    commands.queue(move |world: &mut World| match request {
        CutsceneRequest::PlayPlaylist(index) | CutsceneRequest::PlayIndex(index) => {
            play_playlist(world, index)
        }
        CutsceneRequest::PlayNext => play_next(world),
        CutsceneRequest::Stop => stop_cutscene(world),
    });
}
