//! Composition root.
//!
//! [`setup`] inserts every resource and observer the cutscene core needs,
//! [`build_update_schedule`] builds the per-tick schedule, and [`tick`] runs
//! one frame of it. [`teardown`] stops the loader thread and drops bus
//! subscribers.
//!
//! System order within a tick:
//!
//! 1. `scene_loader_system` – activate scenes fetched since the last tick
//! 2. `cutscene_player_system` – resume playback, activate cameras, start fades
//! 3. `event_sequencer_system` – free-standing sequencer components
//! 4. `screen_fader_system` – advance fades started this tick or earlier
//! 5. `camera_brain_system` – follow the camera priorities set above

use std::sync::Arc;

use bevy_ecs::observer::Observer;
use bevy_ecs::prelude::*;
use log::info;

use crate::assets::cutscene::Playlist;
use crate::components::persistent::Persistent;
use crate::events::cutscene::observe_cutscene_request;
use crate::resources::camerabrain::CameraBrain;
use crate::resources::cameraregistry::CameraRegistry;
use crate::resources::cutsceneconfig::CutsceneConfig;
use crate::resources::cutsceneplayer::CutscenePlayer;
use crate::resources::gameeventbus::GameEventBus;
use crate::resources::sceneloader::{SceneSource, setup_scene_loader, shutdown_scene_loader};
use crate::resources::worldtime::WorldTime;
use crate::systems::camerabrain::camera_brain_system;
use crate::systems::cutscene::cutscene_player_system;
use crate::systems::eventsequencer::event_sequencer_system;
use crate::systems::sceneloader::scene_loader_system;
use crate::systems::screenfader::screen_fader_system;
use crate::systems::time::update_world_time;

/// Insert resources and observers for cutscene playback.
///
/// The screen fader is not inserted here; it is created on first use.
pub fn setup(
    world: &mut World,
    config: &CutsceneConfig,
    source: Arc<dyn SceneSource>,
    playlist: Playlist,
) {
    world.insert_resource(WorldTime::default());
    world.insert_resource(GameEventBus::new());
    world.insert_resource(CameraRegistry::new(
        config.base_priority,
        config.active_priority,
    ));
    world.insert_resource(CameraBrain::default());
    world.insert_resource(CutscenePlayer::new(playlist));
    world.insert_resource(config.clone());
    setup_scene_loader(world, source, config.threaded_loader);

    world.spawn((Observer::new(observe_cutscene_request), Persistent));
    // Ensure the observer is registered before any system can trigger requests.
    world.flush();

    info!(
        "Cutscene core ready ({} loader, priorities {}/{})",
        if config.threaded_loader { "threaded" } else { "inline" },
        config.base_priority,
        config.active_priority
    );
}

pub fn build_update_schedule() -> Schedule {
    let mut update = Schedule::default();
    update.add_systems(
        (
            scene_loader_system,
            cutscene_player_system,
            event_sequencer_system,
            screen_fader_system,
            camera_brain_system,
        )
            .chain(),
    );
    update
}

/// Run one frame with a delta of `dt` seconds.
pub fn tick(world: &mut World, update: &mut Schedule, dt: f32) {
    update_world_time(world, dt);
    update.run(world);
    world.clear_trackers();
}

pub fn teardown(world: &mut World) {
    shutdown_scene_loader(world);
    if let Some(mut bus) = world.get_resource_mut::<GameEventBus>() {
        bus.clear();
    }
}
