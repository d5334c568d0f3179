//! Scene loading systems.
//!
//! - [`scene_loader_system`] – activates fetched scenes whose gate is open
//! - [`load_single_blocking`] – fetch and activate a single-mode scene right now
//! - [`scene_loader_thread`] – worker loop behind the threaded backend
//!
//! Activating a scene spawns one entity per [`CameraDef`] tagged with
//! [`SceneMember`]. A single-mode activation first despawns every
//! `SceneMember` entity that is not [`Persistent`].

use std::sync::Arc;

use bevy_ecs::prelude::*;
use crossbeam_channel::{Receiver, Sender};
use log::{debug, warn};
use rustc_hash::FxHashMap;

use crate::assets::scene::{CameraDef, SceneDef};
use crate::components::persistent::Persistent;
use crate::components::scenemember::SceneMember;
use crate::components::vcamid::VCamId;
use crate::components::virtualcamera::VirtualCamera;
use crate::error::SceneError;
use crate::events::sceneloader::{LoaderCmd, LoaderReply, SceneActivated};
use crate::resources::sceneloader::{LoadMode, SceneLoader, SceneSource};

/// Poll the loader and spawn every scene that may activate.
pub fn scene_loader_system(world: &mut World) {
    let activations = match world.get_resource_mut::<SceneLoader>() {
        Some(mut loader) => {
            loader.poll();
            loader.take_activatable()
        }
        None => return,
    };

    for activation in activations {
        activate_scene(world, activation.mode, &activation.scene);
    }
}

/// Fetch `name` from the loader's source and activate it in single mode,
/// bypassing the request queue.
pub fn load_single_blocking(world: &mut World, name: &str) -> Result<(), SceneError> {
    let source = world
        .get_resource::<SceneLoader>()
        .map(SceneLoader::source)
        .ok_or(SceneError::LoaderShutDown)?;
    let scene = source.fetch(name)?;
    activate_scene(world, LoadMode::Single, &scene);
    Ok(())
}

/// Spawn a scene's entities and record it as loaded.
pub fn activate_scene(world: &mut World, mode: LoadMode, scene: &SceneDef) {
    if mode == LoadMode::Single {
        let removed = despawn_scene_members(world);
        debug!("SceneLoader: unloaded {} entities for '{}'", removed, scene.name);
    }
    let spawned = spawn_scene(world, scene);
    if let Some(mut loader) = world.get_resource_mut::<SceneLoader>() {
        loader.mark_loaded(&scene.name, mode);
    }
    world.trigger(SceneActivated {
        name: scene.name.clone(),
        mode,
        spawned,
    });
}

/// Despawn every non-persistent scene entity. Returns how many were removed.
pub fn despawn_scene_members(world: &mut World) -> usize {
    let mut query = world.query_filtered::<Entity, (With<SceneMember>, Without<Persistent>)>();
    let doomed: Vec<Entity> = query.iter(world).collect();
    for entity in &doomed {
        world.despawn(*entity);
    }
    doomed.len()
}

fn spawn_scene(world: &mut World, scene: &SceneDef) -> usize {
    let mut by_name: FxHashMap<&str, Entity> = FxHashMap::default();
    let mut spawned: Vec<(&CameraDef, Entity)> = Vec::with_capacity(scene.cameras.len());

    for def in &scene.cameras {
        let mut entity = world.spawn(SceneMember(scene.name.clone()));
        if def.has_camera {
            entity.insert(VirtualCamera::new(def.name.clone(), def.priority));
        }
        let id = entity.id();
        by_name.entry(def.name.as_str()).or_insert(id);
        spawned.push((def, id));
    }

    // Tags go on after every entity exists so overrides can point forward.
    for (def, entity) in &spawned {
        let Some(vcam_id) = &def.vcam_id else {
            continue;
        };
        let mut tag = VCamId::new(vcam_id.clone());
        if let Some(target) = &def.camera_override {
            match by_name.get(target.as_str()) {
                Some(&camera) => tag = tag.with_override(camera),
                None => warn!(
                    "SceneLoader: '{}' in scene '{}' overrides unknown camera '{}'",
                    def.name, scene.name, target
                ),
            }
        }
        world.entity_mut(*entity).insert(tag);
    }

    spawned.len()
}

/// Background worker for the threaded loader.
///
/// Blocks on the command channel, fetches each requested scene from `source`,
/// and sends the result back. Exits on [`LoaderCmd::Shutdown`] or when the
/// loader drops its sender.
pub fn scene_loader_thread(
    source: Arc<dyn SceneSource>,
    rx_cmd: Receiver<LoaderCmd>,
    tx_reply: Sender<LoaderReply>,
) {
    debug!(
        "[sceneloader] thread starting (id={:?})",
        std::thread::current().id()
    );

    while let Ok(cmd) = rx_cmd.recv() {
        match cmd {
            LoaderCmd::Fetch { request, name } => {
                let result = source.fetch(&name);
                if tx_reply.send(LoaderReply::Fetched { request, result }).is_err() {
                    break;
                }
            }
            LoaderCmd::Shutdown => break,
        }
    }

    debug!(
        "[sceneloader] thread exiting (id={:?})",
        std::thread::current().id()
    );
}
