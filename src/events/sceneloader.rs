//! Scene loader messages and notifications.
//!
//! [`LoaderCmd`] and [`LoaderReply`] travel over the crossbeam channels
//! between the [`SceneLoader`](crate::resources::sceneloader::SceneLoader)
//! and its worker thread. [`SceneActivated`] is triggered on the world each
//! time a loaded scene's entities are spawned.

use bevy_ecs::prelude::*;

use crate::assets::scene::SceneDef;
use crate::error::SceneError;
use crate::resources::sceneloader::LoadMode;

/// Commands sent *to* the loader thread
#[derive(Debug, Clone)]
pub enum LoaderCmd {
    Fetch { request: u64, name: String },
    Shutdown,
}

/// Results sent *back* from the loader thread
#[derive(Debug)]
pub enum LoaderReply {
    Fetched {
        request: u64,
        result: Result<SceneDef, SceneError>,
    },
}

/// A scene finished loading and its entities now exist.
#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct SceneActivated {
    pub name: String,
    pub mode: LoadMode,
    /// Entities spawned for the scene.
    pub spawned: usize,
}
