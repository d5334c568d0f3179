//! Cutscene engine library.
//!
//! Timed cutscene playback on top of `bevy_ecs`: camera shots with blends and
//! fades, keyed event sequences broadcast on an event bus, and scene loading
//! with background preloading. The modules are public for the runner binary
//! and for integration tests.
//!
//! - [`assets`] – authoring data (cutscenes, event sequences, scenes)
//! - [`color`] – RGBA colour used by fades
//! - [`components`] – ECS components (cameras, sequencers, scene tags)
//! - [`error`] – error types
//! - [`events`] – ECS events and observers
//! - [`game`] – composition root and schedule
//! - [`resources`] – ECS resources (player, registry, brain, fader, loader, bus)
//! - [`systems`] – ECS systems

pub mod assets;
pub mod color;
pub mod components;
pub mod error;
pub mod events;
pub mod game;
pub mod resources;
pub mod systems;
