//! Engine systems.
//!
//! Submodules overview
//! - [`camerabrain`] – pick the live camera and progress blends
//! - [`cutscene`] – resume cutscene playback each tick
//! - [`eventsequencer`] – advance sequencer components and publish their events
//! - [`sceneloader`] – activate loaded scenes; loader worker thread
//! - [`screenfader`] – advance screen fades
//! - [`time`] – update simulation time and delta

pub mod camerabrain;
pub mod cutscene;
pub mod eventsequencer;
pub mod sceneloader;
pub mod screenfader;
pub mod time;
