//! Scene loader resource and scene sources.
//!
//! The [`SceneLoader`] fetches [`SceneDef`]s from a [`SceneSource`] and hands
//! them to [`scene_loader_system`](crate::systems::sceneloader::scene_loader_system),
//! which spawns their entities. Every request is tracked by a
//! [`SceneLoadHandle`]:
//!
//! - additive requests activate as soon as they are fetched
//! - single requests are held after fetching until
//!   [`SceneLoader::allow_activation`] opens their gate, so a scene can be
//!   fully preloaded without becoming visible
//!
//! Two backends are available. `Inline` fetches on the next system run on the
//! main thread. `Threaded` sends fetches to a background worker over
//! crossbeam channels; use [`setup_scene_loader`] to spawn it and
//! [`shutdown_scene_loader`] to stop and join it.
//!
//! There is no load timeout: a source that never answers stalls the request.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::JoinHandle;

use bevy_ecs::prelude::*;
use crossbeam_channel::{Receiver, Sender, unbounded};
use log::{debug, error, info, warn};
use rustc_hash::FxHashMap;

use crate::assets::scene::SceneDef;
use crate::error::SceneError;
use crate::events::sceneloader::{LoaderCmd, LoaderReply};
use crate::systems::sceneloader::scene_loader_thread;

/// Where scene definitions come from.
pub trait SceneSource: Send + Sync {
    fn fetch(&self, name: &str) -> Result<SceneDef, SceneError>;
}

/// Reads `<root>/<name>.json`.
#[derive(Debug, Clone)]
pub struct DirectorySceneSource {
    root: PathBuf,
}

impl DirectorySceneSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl SceneSource for DirectorySceneSource {
    fn fetch(&self, name: &str) -> Result<SceneDef, SceneError> {
        let path = self.root.join(format!("{name}.json"));
        let json = std::fs::read_to_string(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => SceneError::NotFound {
                name: name.to_string(),
            },
            _ => SceneError::Io {
                name: name.to_string(),
                reason: e.to_string(),
            },
        })?;
        let mut def: SceneDef = serde_json::from_str(&json).map_err(|e| SceneError::Parse {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        if def.name.is_empty() {
            def.name = name.to_string();
        }
        Ok(def)
    }
}

/// In-memory scenes, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct MemorySceneSource {
    scenes: FxHashMap<String, SceneDef>,
}

impl MemorySceneSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scene(mut self, scene: SceneDef) -> Self {
        self.insert(scene);
        self
    }

    pub fn insert(&mut self, scene: SceneDef) {
        self.scenes.insert(scene.name.clone(), scene);
    }
}

impl SceneSource for MemorySceneSource {
    fn fetch(&self, name: &str) -> Result<SceneDef, SceneError> {
        self.scenes
            .get(name)
            .cloned()
            .ok_or_else(|| SceneError::NotFound {
                name: name.to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    /// Spawn alongside what is already loaded.
    Additive,
    /// Replace every non-persistent scene entity.
    Single,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SceneLoadHandle(u64);

#[derive(Debug)]
enum LoadState {
    Fetching,
    Ready(SceneDef),
    Done,
    Failed(SceneError),
}

#[derive(Debug)]
struct LoadRequest {
    name: String,
    mode: LoadMode,
    allow_activation: bool,
    state: LoadState,
}

/// A fetched scene whose gate is open, ready to be spawned.
#[derive(Debug)]
pub struct Activation {
    pub handle: SceneLoadHandle,
    pub mode: LoadMode,
    pub scene: SceneDef,
}

enum Backend {
    Inline,
    Threaded {
        tx_cmd: Sender<LoaderCmd>,
        rx_reply: Receiver<LoaderReply>,
        handle: Option<JoinHandle<()>>,
    },
}

#[derive(Resource)]
pub struct SceneLoader {
    source: Arc<dyn SceneSource>,
    backend: Backend,
    requests: BTreeMap<u64, LoadRequest>,
    next_id: u64,
    loaded: Vec<String>,
}

impl SceneLoader {
    /// Loader that fetches on the main thread.
    pub fn inline(source: Arc<dyn SceneSource>) -> Self {
        Self {
            source,
            backend: Backend::Inline,
            requests: BTreeMap::new(),
            next_id: 0,
            loaded: Vec::new(),
        }
    }

    /// Loader backed by a worker thread.
    pub fn threaded(source: Arc<dyn SceneSource>) -> Self {
        let (tx_cmd, rx_cmd) = unbounded::<LoaderCmd>();
        let (tx_reply, rx_reply) = unbounded::<LoaderReply>();
        let worker_source = Arc::clone(&source);
        let handle = std::thread::spawn(move || scene_loader_thread(worker_source, rx_cmd, tx_reply));
        Self {
            source,
            backend: Backend::Threaded {
                tx_cmd,
                rx_reply,
                handle: Some(handle),
            },
            requests: BTreeMap::new(),
            next_id: 0,
            loaded: Vec::new(),
        }
    }

    pub fn source(&self) -> Arc<dyn SceneSource> {
        Arc::clone(&self.source)
    }

    pub fn is_threaded(&self) -> bool {
        matches!(self.backend, Backend::Threaded { .. })
    }

    /// Start an additive load. It activates as soon as it is fetched.
    pub fn load_additive(&mut self, name: &str) -> Result<SceneLoadHandle, SceneError> {
        self.request(name, LoadMode::Additive, true)
    }

    /// Start a single-mode load with its activation gate closed.
    pub fn load_single(&mut self, name: &str) -> Result<SceneLoadHandle, SceneError> {
        self.request(name, LoadMode::Single, false)
    }

    fn request(
        &mut self,
        name: &str,
        mode: LoadMode,
        allow_activation: bool,
    ) -> Result<SceneLoadHandle, SceneError> {
        let id = self.next_id;
        if let Backend::Threaded { tx_cmd, .. } = &self.backend {
            tx_cmd
                .send(LoaderCmd::Fetch {
                    request: id,
                    name: name.to_string(),
                })
                .map_err(|_| SceneError::LoaderShutDown)?;
        }
        self.next_id += 1;
        self.requests.insert(
            id,
            LoadRequest {
                name: name.to_string(),
                mode,
                allow_activation,
                state: LoadState::Fetching,
            },
        );
        debug!("SceneLoader: requested '{}' ({:?}) as #{}", name, mode, id);
        Ok(SceneLoadHandle(id))
    }

    /// Open the activation gate of a request.
    pub fn allow_activation(&mut self, handle: SceneLoadHandle) {
        if let Some(req) = self.requests.get_mut(&handle.0) {
            req.allow_activation = true;
        }
    }

    /// The scene has been spawned.
    pub fn is_done(&self, handle: SceneLoadHandle) -> bool {
        matches!(
            self.requests.get(&handle.0).map(|r| &r.state),
            Some(LoadState::Done)
        )
    }

    /// Fetched and waiting for its gate.
    pub fn is_ready(&self, handle: SceneLoadHandle) -> bool {
        matches!(
            self.requests.get(&handle.0).map(|r| &r.state),
            Some(LoadState::Ready(_))
        )
    }

    pub fn failure(&self, handle: SceneLoadHandle) -> Option<&SceneError> {
        match self.requests.get(&handle.0).map(|r| &r.state) {
            Some(LoadState::Failed(err)) => Some(err),
            _ => None,
        }
    }

    /// Forget a finished request.
    pub fn release(&mut self, handle: SceneLoadHandle) {
        self.requests.remove(&handle.0);
    }

    /// Drop a request. A late reply from the worker is ignored.
    pub fn cancel(&mut self, handle: SceneLoadHandle) {
        if let Some(req) = self.requests.remove(&handle.0) {
            debug!("SceneLoader: cancelled '{}' (#{})", req.name, handle.0);
        }
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.loaded.iter().any(|n| n == name)
    }

    /// Loaded scene names in activation order.
    pub fn loaded_scenes(&self) -> &[String] {
        &self.loaded
    }

    pub fn pending_requests(&self) -> usize {
        self.requests
            .values()
            .filter(|r| matches!(r.state, LoadState::Fetching | LoadState::Ready(_)))
            .count()
    }

    /// Collect fetch results: inline fetches run now, worker replies are drained.
    pub fn poll(&mut self) {
        match &self.backend {
            Backend::Inline => {
                for req in self.requests.values_mut() {
                    if matches!(req.state, LoadState::Fetching) {
                        req.state = Self::fetched(&req.name, self.source.fetch(&req.name));
                    }
                }
            }
            Backend::Threaded { rx_reply, .. } => {
                for reply in rx_reply.try_iter() {
                    let LoaderReply::Fetched { request, result } = reply;
                    match self.requests.get_mut(&request) {
                        Some(req) => req.state = Self::fetched(&req.name, result),
                        None => debug!("SceneLoader: dropping reply for cancelled #{}", request),
                    }
                }
            }
        }
    }

    fn fetched(name: &str, result: Result<SceneDef, SceneError>) -> LoadState {
        match result {
            Ok(scene) => {
                debug!("SceneLoader: fetched '{}'", name);
                LoadState::Ready(scene)
            }
            Err(err) => {
                error!("SceneLoader: {}", err);
                LoadState::Failed(err)
            }
        }
    }

    /// Take every fetched scene whose gate is open, in request order, and
    /// mark it done.
    pub fn take_activatable(&mut self) -> Vec<Activation> {
        let mut ready = Vec::new();
        for (&id, req) in self.requests.iter_mut() {
            if !req.allow_activation || !matches!(req.state, LoadState::Ready(_)) {
                continue;
            }
            if let LoadState::Ready(scene) = std::mem::replace(&mut req.state, LoadState::Done) {
                ready.push(Activation {
                    handle: SceneLoadHandle(id),
                    mode: req.mode,
                    scene,
                });
            }
        }
        ready
    }

    /// Record that `name` is now loaded.
    pub fn mark_loaded(&mut self, name: &str, mode: LoadMode) {
        if mode == LoadMode::Single {
            self.loaded.clear();
        }
        if !self.is_loaded(name) {
            self.loaded.push(name.to_string());
        }
        info!("SceneLoader: '{}' active ({:?})", name, mode);
    }

    /// Stop the worker thread, if any. Pending requests stay unresolved.
    pub fn shutdown(&mut self) {
        if let Backend::Threaded { tx_cmd, handle, .. } = &mut self.backend
            && let Some(handle) = handle.take()
        {
            let _ = tx_cmd.send(LoaderCmd::Shutdown);
            if handle.join().is_err() {
                warn!("SceneLoader: worker thread panicked");
            }
        }
    }
}

impl Drop for SceneLoader {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Insert a [`SceneLoader`], spawning its worker thread when `threaded`.
pub fn setup_scene_loader(world: &mut World, source: Arc<dyn SceneSource>, threaded: bool) {
    let loader = if threaded {
        SceneLoader::threaded(source)
    } else {
        SceneLoader::inline(source)
    };
    world.insert_resource(loader);
}

/// Stop the worker thread and remove the loader from the world.
pub fn shutdown_scene_loader(world: &mut World) {
    if let Some(mut loader) = world.remove_resource::<SceneLoader>() {
        loader.shutdown();
    }
}
