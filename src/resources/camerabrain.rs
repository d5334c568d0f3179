//! Camera brain resource.
//!
//! Stand-in for the host compositor: it follows whichever
//! [`VirtualCamera`](crate::components::virtualcamera::VirtualCamera) has the
//! highest priority and blends from the previous one using
//! [`CameraBrain::default_blend`]. Cutscene shots override `default_blend`
//! temporarily; the player snapshots and restores it.
//!
//! Updated by [`camera_brain_system`](crate::systems::camerabrain::camera_brain_system).

use bevy_ecs::prelude::{Entity, Resource};

use crate::assets::cutscene::BlendStyle;
use crate::systems::camerabrain::ease;

/// Shape of a camera blend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendCurve {
    /// Instant switch.
    Cut,
    #[default]
    EaseInOut,
    EaseIn,
    EaseOut,
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlendDefinition {
    pub curve: BlendCurve,
    /// Seconds. Ignored for [`BlendCurve::Cut`].
    pub time: f32,
}

impl Default for BlendDefinition {
    fn default() -> Self {
        Self {
            curve: BlendCurve::EaseInOut,
            time: 2.0,
        }
    }
}

impl BlendDefinition {
    pub const fn new(curve: BlendCurve, time: f32) -> Self {
        Self { curve, time }
    }

    pub const fn cut() -> Self {
        Self::new(BlendCurve::Cut, 0.0)
    }

    /// Blend for an authored shot style. `Cut` ignores `time`; every other
    /// style clamps it to be non-negative.
    pub fn from_style(style: BlendStyle, time: f32) -> Self {
        let curve = match style {
            BlendStyle::Cut => return Self::cut(),
            BlendStyle::EaseInOut => BlendCurve::EaseInOut,
            BlendStyle::EaseIn => BlendCurve::EaseIn,
            BlendStyle::EaseOut => BlendCurve::EaseOut,
            BlendStyle::Linear => BlendCurve::Linear,
        };
        Self::new(curve, time.max(0.0))
    }

    /// Whether switching with this definition happens instantly.
    pub fn is_cut(&self) -> bool {
        self.curve == BlendCurve::Cut || self.time <= 0.0
    }
}

/// A blend between two cameras in progress.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveBlend {
    pub from: Entity,
    pub to: Entity,
    pub definition: BlendDefinition,
    pub elapsed: f32,
}

impl ActiveBlend {
    /// Eased weight of `to`, in `[0, 1]`.
    pub fn weight(&self) -> f32 {
        if self.definition.is_cut() {
            return 1.0;
        }
        ease(self.definition.curve, self.elapsed / self.definition.time)
    }

    pub fn is_complete(&self) -> bool {
        self.definition.is_cut() || self.elapsed >= self.definition.time
    }
}

#[derive(Resource, Debug, Clone, Default)]
pub struct CameraBrain {
    /// Blend used whenever the live camera changes.
    pub default_blend: BlendDefinition,
    pub(crate) live: Option<Entity>,
    pub(crate) blend: Option<ActiveBlend>,
    pub(crate) switches: u32,
}

impl CameraBrain {
    pub fn new(default_blend: BlendDefinition) -> Self {
        Self {
            default_blend,
            ..Default::default()
        }
    }

    pub fn live_camera(&self) -> Option<Entity> {
        self.live
    }

    pub fn active_blend(&self) -> Option<&ActiveBlend> {
        self.blend.as_ref()
    }

    pub fn is_blending(&self) -> bool {
        self.blend.is_some()
    }

    /// Number of times the live camera changed.
    pub fn switch_count(&self) -> u32 {
        self.switches
    }
}
