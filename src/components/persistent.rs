//! Scene-transition survivor marker.
//!
//! A single-mode scene load despawns every
//! [`SceneMember`](crate::components::scenemember::SceneMember) entity except
//! those that also carry [`Persistent`]. Observers spawned by the composition
//! root are tagged with it as well.

use bevy_ecs::prelude::Component;

/// Keeps an entity alive across single-mode scene loads.
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct Persistent;
