//! Virtual camera component.
//!
//! A [`VirtualCamera`] is a candidate viewpoint. The
//! [`CameraBrain`](crate::resources::camerabrain::CameraBrain) follows the
//! highest-priority one; the camera registry only ever touches `priority`.

use bevy_ecs::prelude::Component;

#[derive(Component, Clone, Debug, PartialEq, Eq)]
pub struct VirtualCamera {
    pub name: String,
    pub priority: i32,
}

impl VirtualCamera {
    pub fn new(name: impl Into<String>, priority: i32) -> Self {
        Self {
            name: name.into(),
            priority,
        }
    }
}
