//! Named virtual camera registry.
//!
//! The [`CameraRegistry`] maps stable string ids to live camera entities. It
//! is rebuilt from a [`CameraProvider`] after scenes load, and drives camera
//! priorities so that exactly one registered camera is live at a time under
//! the [`CameraBrain`](crate::resources::camerabrain::CameraBrain)'s
//! highest-priority-wins rule.
//!
//! The `World` itself is a provider: it discovers every
//! [`VCamId`](crate::components::vcamid::VCamId) tag in ascending entity
//! order, so when two tags share an id the older entity always wins.

use bevy_ecs::prelude::*;
use log::{debug, error, warn};
use rustc_hash::FxHashMap;

use crate::components::vcamid::VCamId;
use crate::components::virtualcamera::VirtualCamera;

/// Scene-graph query used by the registry.
pub trait CameraProvider {
    /// Every camera tag in a stable order: the tag's id and the camera it
    /// resolves to, if any.
    fn discover(&mut self) -> Vec<(String, Option<Entity>)>;

    /// Set a camera's priority. Returns `false` if the camera is gone.
    fn set_priority(&mut self, camera: Entity, priority: i32) -> bool;
}

impl CameraProvider for World {
    fn discover(&mut self) -> Vec<(String, Option<Entity>)> {
        let mut query = self.query::<(Entity, &VCamId, Has<VirtualCamera>)>();
        let mut tags: Vec<(Entity, String, Option<Entity>, bool)> = query
            .iter(self)
            .map(|(entity, tag, has_camera)| {
                (entity, tag.id.clone(), tag.camera_override, has_camera)
            })
            .collect();
        tags.sort_by_key(|(entity, ..)| *entity);

        tags.into_iter()
            .map(|(entity, id, camera_override, has_camera)| {
                let camera = match camera_override {
                    Some(target) => self.get::<VirtualCamera>(target).map(|_| target),
                    None => has_camera.then_some(entity),
                };
                (id, camera)
            })
            .collect()
    }

    fn set_priority(&mut self, camera: Entity, priority: i32) -> bool {
        match self.get_mut::<VirtualCamera>(camera) {
            Some(mut vcam) => {
                if vcam.priority != priority {
                    vcam.priority = priority;
                }
                true
            }
            None => false,
        }
    }
}

/// Outcome of [`CameraRegistry::rebuild`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RebuildReport {
    pub registered: usize,
    /// Ids that were rejected because an earlier tag already claimed them.
    pub duplicates: Vec<String>,
    /// Ids whose tag resolved to no camera.
    pub unresolved: Vec<String>,
}

#[derive(Resource, Debug, Clone)]
pub struct CameraRegistry {
    entries: FxHashMap<String, Entity>,
    /// Registration order, so priority writes happen in a stable order.
    order: Vec<String>,
    pub base_priority: i32,
    pub active_priority: i32,
}

impl Default for CameraRegistry {
    fn default() -> Self {
        Self::new(0, 20)
    }
}

impl CameraRegistry {
    pub fn new(base_priority: i32, active_priority: i32) -> Self {
        Self {
            entries: FxHashMap::default(),
            order: Vec::new(),
            base_priority,
            active_priority,
        }
    }

    /// Clear and rescan. Every registered camera ends at base priority.
    pub fn rebuild(&mut self, provider: &mut dyn CameraProvider) -> RebuildReport {
        self.entries.clear();
        self.order.clear();
        let mut report = RebuildReport::default();

        for (id, camera) in provider.discover() {
            if id.trim().is_empty() {
                continue;
            }
            let Some(camera) = camera else {
                warn!("CameraRegistry: vcam id '{}' has no camera, skipped", id);
                report.unresolved.push(id);
                continue;
            };
            if self.entries.contains_key(&id) {
                error!("CameraRegistry: duplicate vcam id '{}'. IDs must be unique.", id);
                report.duplicates.push(id);
                continue;
            }
            self.entries.insert(id.clone(), camera);
            self.order.push(id);
        }

        report.registered = self.order.len();
        self.reset_all(provider);
        debug!(
            "CameraRegistry: registered {} vcams: {}",
            report.registered,
            self.order.join(", ")
        );
        report
    }

    pub fn lookup(&self, id: &str) -> Option<Entity> {
        self.entries.get(id).copied()
    }

    /// Lower every registered camera to base priority.
    pub fn reset_all(&self, provider: &mut dyn CameraProvider) {
        for id in &self.order {
            if let Some(&camera) = self.entries.get(id)
                && !provider.set_priority(camera, self.base_priority)
            {
                debug!("CameraRegistry: camera for '{}' is gone", id);
            }
        }
    }

    /// Make `camera` the only live camera. A positive `priority_override`
    /// replaces the configured active priority.
    pub fn activate(
        &self,
        provider: &mut dyn CameraProvider,
        camera: Entity,
        priority_override: i32,
    ) -> bool {
        self.reset_all(provider);
        let priority = if priority_override > 0 {
            priority_override
        } else {
            self.active_priority
        };
        let live = provider.set_priority(camera, priority);
        if live {
            debug!("CameraRegistry: active {:?} (priority {})", camera, priority);
        } else {
            warn!("CameraRegistry: cannot activate {:?}, camera is gone", camera);
        }
        live
    }

    /// Activate by id. Returns `false` if the id is unknown.
    pub fn activate_id(
        &self,
        provider: &mut dyn CameraProvider,
        id: &str,
        priority_override: i32,
    ) -> bool {
        match self.lookup(id) {
            Some(camera) => self.activate(provider, camera, priority_override),
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Registered ids in registration order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawn_cam(world: &mut World, id: &str, priority: i32) -> Entity {
        world
            .spawn((VCamId::new(id), VirtualCamera::new(id, priority)))
            .id()
    }

    fn priority(world: &World, e: Entity) -> i32 {
        world.get::<VirtualCamera>(e).unwrap().priority
    }

    #[test]
    fn test_duplicate_id_keeps_first() {
        let mut world = World::new();
        let first = spawn_cam(&mut world, "wide", 5);
        let _second = spawn_cam(&mut world, "wide", 7);

        let mut registry = CameraRegistry::new(0, 20);
        let report = registry.rebuild(&mut world);

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.lookup("wide"), Some(first));
        assert_eq!(report.duplicates, vec!["wide".to_string()]);
    }

    #[test]
    fn test_rebuild_resets_to_base() {
        let mut world = World::new();
        let a = spawn_cam(&mut world, "a", 50);
        let mut registry = CameraRegistry::new(3, 20);
        registry.rebuild(&mut world);
        assert_eq!(priority(&world, a), 3);
    }

    #[test]
    fn test_activate_leaves_exactly_one_live() {
        let mut world = World::new();
        let cams: Vec<Entity> = ["a", "b", "c"]
            .iter()
            .map(|id| spawn_cam(&mut world, id, 0))
            .collect();
        let mut registry = CameraRegistry::new(0, 20);
        registry.rebuild(&mut world);

        assert!(registry.activate_id(&mut world, "b", 0));
        assert!(registry.activate_id(&mut world, "c", 0));

        let live: Vec<Entity> = cams
            .iter()
            .copied()
            .filter(|&e| priority(&world, e) == 20)
            .collect();
        assert_eq!(live, vec![cams[2]]);
        assert_eq!(priority(&world, cams[0]), 0);
        assert_eq!(priority(&world, cams[1]), 0);
    }

    #[test]
    fn test_positive_override_replaces_active_priority() {
        let mut world = World::new();
        let a = spawn_cam(&mut world, "a", 0);
        let mut registry = CameraRegistry::new(0, 20);
        registry.rebuild(&mut world);

        registry.activate_id(&mut world, "a", 42);
        assert_eq!(priority(&world, a), 42);
        registry.activate_id(&mut world, "a", -1);
        assert_eq!(priority(&world, a), 20);
    }

    #[test]
    fn test_override_camera_takes_precedence() {
        let mut world = World::new();
        let target = world.spawn(VirtualCamera::new("crane_cam", 0)).id();
        let tag = world
            .spawn((VCamId::new("crane").with_override(target), VirtualCamera::new("rig", 0)))
            .id();

        let mut registry = CameraRegistry::default();
        registry.rebuild(&mut world);
        assert_eq!(registry.lookup("crane"), Some(target));
        assert_ne!(registry.lookup("crane"), Some(tag));
    }

    #[test]
    fn test_blank_and_cameraless_tags_are_skipped() {
        let mut world = World::new();
        world.spawn((VCamId::new("  "), VirtualCamera::new("blank", 0)));
        world.spawn(VCamId::new("orphan"));

        let mut registry = CameraRegistry::default();
        let report = registry.rebuild(&mut world);
        assert!(registry.is_empty());
        assert_eq!(report.unresolved, vec!["orphan".to_string()]);
    }

    #[test]
    fn test_unknown_id_does_not_activate() {
        let mut world = World::new();
        let a = spawn_cam(&mut world, "a", 0);
        let mut registry = CameraRegistry::default();
        registry.rebuild(&mut world);
        assert!(!registry.activate_id(&mut world, "nope", 0));
        assert_eq!(priority(&world, a), 0);
    }
}
