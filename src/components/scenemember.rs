//! Scene ownership tag.

use bevy_ecs::prelude::Component;

/// Name of the scene that spawned this entity.
///
/// Added by the scene loader to everything it spawns so a later single-mode
/// load knows what to tear down.
#[derive(Component, Clone, Debug, PartialEq, Eq)]
pub struct SceneMember(pub String);
