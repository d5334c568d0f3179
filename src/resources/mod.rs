//! ECS resources made available to systems.
//!
//! Overview
//! - `camerabrain` – follows the highest-priority camera and blends between cameras
//! - `cameraregistry` – maps camera ids to camera entities and drives priorities
//! - `cutsceneconfig` – INI-backed settings
//! - `cutsceneplayer` – the playlist playback engine and its control functions
//! - `gameeventbus` – publish/subscribe channel for keyed, timed events
//! - `sceneloader` – scene sources and the additive/single scene loader
//! - `screenfader` – full-screen fade overlay
//! - `worldtime` – simulation time and delta
pub mod camerabrain;
pub mod cameraregistry;
pub mod cutsceneconfig;
pub mod cutsceneplayer;
pub mod gameeventbus;
pub mod sceneloader;
pub mod screenfader;
pub mod worldtime;
