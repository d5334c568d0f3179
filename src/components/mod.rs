//! ECS components for entities.
//!
//! Cameras, their identifier tags, scene bookkeeping, and the free-standing
//! event sequencer.
//!
//! Submodules overview:
//! - [`eventsequencer`] – state machine that fires timed events from a playlist of sequences
//! - [`persistent`] – marker for entities that survive single-mode scene loads
//! - [`scenemember`] – name of the scene that spawned an entity
//! - [`vcamid`] – stable string id that shots use to address a camera
//! - [`virtualcamera`] – candidate viewpoint with a priority

pub mod eventsequencer;
pub mod persistent;
pub mod scenemember;
pub mod vcamid;
pub mod virtualcamera;
