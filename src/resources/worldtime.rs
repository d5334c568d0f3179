//! Simulation time resource.
//!
//! Updated once per frame by
//! [`update_world_time`](crate::systems::time::update_world_time). Cutscene
//! waits, fades, and event sequencers read `delta` (scaled) or
//! `unscaled_delta` depending on their configuration.

use bevy_ecs::prelude::Resource;

#[derive(Resource, Clone, Copy, Debug)]
pub struct WorldTime {
    /// Accumulated scaled seconds.
    pub elapsed: f32,
    /// Scaled seconds of the current frame.
    pub delta: f32,
    /// Raw seconds of the current frame, ignoring `time_scale`.
    pub unscaled_delta: f32,
    pub time_scale: f32,
    pub frame_count: u64,
}

impl Default for WorldTime {
    fn default() -> Self {
        WorldTime {
            elapsed: 0.0,
            delta: 0.0,
            unscaled_delta: 0.0,
            time_scale: 1.0,
            frame_count: 0,
        }
    }
}

impl WorldTime {
    pub fn with_time_scale(mut self, time_scale: f32) -> Self {
        self.time_scale = time_scale;
        self
    }

    /// Delta for a consumer that may opt out of time scaling.
    pub fn delta_for(&self, unscaled: bool) -> f32 {
        if unscaled {
            self.unscaled_delta
        } else {
            self.delta
        }
    }
}
