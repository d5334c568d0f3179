//! Cutscene player system.
//!
//! Resumes the [`CutscenePlayer`] step machine once per tick, then triggers
//! the [`CutsceneEvent`]s it produced, in order.
use bevy_ecs::prelude::*;

use crate::events::cutscene::CutsceneEvent;
use crate::resources::cutsceneplayer::CutscenePlayer;

/// Exclusive system: the player touches the registry, brain, fader, loader
/// and bus while it runs.
pub fn cutscene_player_system(world: &mut World) {
    if !world
        .get_resource::<CutscenePlayer>()
        .is_some_and(CutscenePlayer::is_playing)
    {
        return;
    }

    let mut events = Vec::new();
    world.resource_scope(|world, mut player: Mut<CutscenePlayer>| {
        player.tick(world, &mut events);
    });

    for event in events {
        world.trigger(event);
    }
}
