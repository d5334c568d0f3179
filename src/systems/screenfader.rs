//! Screen fader system.
use bevy_ecs::prelude::*;

use crate::resources::screenfader::ScreenFader;
use crate::resources::worldtime::WorldTime;

/// Advance running fades. Does nothing until the fader has been created.
pub fn screen_fader_system(time: Res<WorldTime>, fader: Option<ResMut<ScreenFader>>) {
    let Some(mut fader) = fader else {
        return;
    };
    if fader.is_fading() {
        fader.advance(time.delta, time.unscaled_delta);
    }
}
