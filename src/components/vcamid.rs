//! Camera identifier tag.
//!
//! [`VCamId`] gives a camera a stable string id that cutscene shots refer to.
//! The registry resolves the tag to a camera handle when it rebuilds:
//!
//! - `camera_override` set: that entity is the camera
//! - otherwise: the tagged entity itself, if it carries a
//!   [`VirtualCamera`](crate::components::virtualcamera::VirtualCamera)
//!
//! Tags that resolve to nothing are skipped.

use bevy_ecs::prelude::{Component, Entity};

#[derive(Component, Clone, Debug, PartialEq, Eq)]
pub struct VCamId {
    pub id: String,
    pub camera_override: Option<Entity>,
}

impl VCamId {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            camera_override: None,
        }
    }

    /// Tag that points at a camera living on another entity.
    pub fn with_override(mut self, camera: Entity) -> Self {
        self.camera_override = Some(camera);
        self
    }
}
