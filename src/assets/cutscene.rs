//! Cutscene authoring data.
//!
//! A [`Cutscene`] is an ordered list of [`Shot`]s plus scene-loading
//! directives. A playlist is an ordered list of cutscenes where `null` entries
//! are allowed and skipped at playback time.
//!
//! These records are read-only during playback; the player shares them
//! through `Arc` and never mutates them.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::assets::eventsequence::EventSequence;
use crate::color::Rgba;

/// Camera blend applied for the transition into a shot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BlendStyle {
    #[default]
    EaseInOut,
    EaseIn,
    EaseOut,
    Linear,
    /// Hard cut, the blend time is ignored.
    Cut,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlendOverride {
    #[serde(default)]
    pub style: BlendStyle,
    #[serde(default)]
    pub time: f32,
}

/// One timed segment of a cutscene bound to one camera.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shot {
    /// Id of the [`VCamId`](crate::components::vcamid::VCamId) to make live.
    #[serde(alias = "vcam_id")]
    pub camera_id: String,
    /// Seconds; negative values are treated as zero.
    #[serde(default)]
    pub duration: f32,
    /// Waits and fades of this shot ignore `WorldTime::time_scale`.
    #[serde(default)]
    pub unscaled_time: bool,
    /// `<= 0` uses the registry's active priority.
    #[serde(default)]
    pub priority_override: i32,
    #[serde(default)]
    pub blend: Option<BlendOverride>,
    /// Fade from `fade_color` to transparent over this many seconds.
    #[serde(default)]
    pub fade_in: Option<f32>,
    /// Fade to opaque `fade_color` during the last seconds of the shot.
    #[serde(default)]
    pub fade_out: Option<f32>,
    #[serde(default)]
    pub fade_color: Rgba,
    /// Per-shot events, stretched over the shot duration.
    #[serde(default)]
    pub events: Option<Arc<EventSequence>>,
}

impl Shot {
    pub fn new(camera_id: impl Into<String>, duration: f32) -> Self {
        Self {
            camera_id: camera_id.into(),
            duration,
            unscaled_time: false,
            priority_override: 0,
            blend: None,
            fade_in: None,
            fade_out: None,
            fade_color: Rgba::BLACK,
            events: None,
        }
    }

    pub fn with_blend(mut self, style: BlendStyle, time: f32) -> Self {
        self.blend = Some(BlendOverride { style, time });
        self
    }

    pub fn with_fade_in(mut self, seconds: f32) -> Self {
        self.fade_in = Some(seconds);
        self
    }

    pub fn with_fade_out(mut self, seconds: f32) -> Self {
        self.fade_out = Some(seconds);
        self
    }

    pub fn with_fade_color(mut self, color: Rgba) -> Self {
        self.fade_color = color;
        self
    }

    pub fn with_events(mut self, events: EventSequence) -> Self {
        self.events = Some(Arc::new(events));
        self
    }

    pub fn with_priority_override(mut self, priority: i32) -> Self {
        self.priority_override = priority;
        self
    }

    pub fn with_unscaled_time(mut self) -> Self {
        self.unscaled_time = true;
        self
    }

    /// Duration clamped to be non-negative.
    pub fn length(&self) -> f32 {
        self.duration.max(0.0)
    }
}

fn default_true() -> bool {
    true
}

fn default_lead() -> f32 {
    1.0
}

/// Ordered list of shots plus scene-loading directives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cutscene {
    #[serde(default)]
    pub name: String,
    /// Loaded additively, in order, before the first shot. Already-loaded scenes are skipped.
    #[serde(default)]
    pub additive_scenes: Vec<String>,
    #[serde(default)]
    pub shots: Vec<Shot>,
    /// Loaded in single mode when the cutscene ends. Ends the playlist.
    #[serde(default)]
    pub next_scene: Option<String>,
    #[serde(default = "default_true")]
    pub preload_during_last_shot: bool,
    #[serde(default = "default_lead")]
    pub preload_lead_seconds: f32,
}

impl Cutscene {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            additive_scenes: Vec::new(),
            shots: Vec::new(),
            next_scene: None,
            preload_during_last_shot: true,
            preload_lead_seconds: 1.0,
        }
    }

    pub fn with_additive_scene(mut self, scene: impl Into<String>) -> Self {
        self.additive_scenes.push(scene.into());
        self
    }

    pub fn with_shot(mut self, shot: Shot) -> Self {
        self.shots.push(shot);
        self
    }

    pub fn with_next_scene(mut self, scene: impl Into<String>) -> Self {
        self.next_scene = Some(scene.into());
        self
    }

    pub fn with_preload(mut self, during_last_shot: bool, lead_seconds: f32) -> Self {
        self.preload_during_last_shot = during_last_shot;
        self.preload_lead_seconds = lead_seconds;
        self
    }

    /// The next scene, ignoring blank names.
    pub fn next_scene(&self) -> Option<&str> {
        self.next_scene
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Sum of all shot durations.
    pub fn total_duration(&self) -> f32 {
        self.shots.iter().map(Shot::length).sum()
    }
}

/// Playlist of cutscenes; `None` entries are skipped with a warning.
pub type Playlist = Vec<Option<Arc<Cutscene>>>;
