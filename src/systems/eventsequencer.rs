//! Event sequencer system.
//!
//! Drives every [`EventSequencer`] component once per tick. A sequencer built
//! with `play_on_start` is started on the first tick it is seen and begins
//! advancing on the following one.
use bevy_ecs::prelude::*;

use crate::components::eventsequencer::EventSequencer;
use crate::resources::gameeventbus::{EventSource, GameEventBus};
use crate::resources::worldtime::WorldTime;

/// Advance all sequencer components and publish due events on the bus.
pub fn event_sequencer_system(
    time: Res<WorldTime>,
    mut bus: ResMut<GameEventBus>,
    mut query: Query<(Entity, &mut EventSequencer)>,
) {
    for (entity, mut sequencer) in query.iter_mut() {
        let source = EventSource::Sequencer(entity);
        if let Some((index, start)) = sequencer.take_autostart() {
            sequencer.play_from(index, start, &mut *bus, source);
            continue;
        }
        let dt = time.delta_for(sequencer.use_unscaled_time);
        sequencer.advance(dt, &mut *bus, source);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::eventsequence::{EventSequence, TimedEvent};
    use crate::components::eventsequencer::SequencerState;
    use crate::systems::time::update_world_time;
    use std::sync::{Arc, Mutex};

    fn make_world(time_scale: f32) -> (World, Arc<Mutex<Vec<String>>>) {
        let mut world = World::new();
        world.insert_resource(WorldTime::default().with_time_scale(time_scale));
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        let mut bus = GameEventBus::new();
        bus.subscribe(move |ev| sink.lock().unwrap().push(ev.key.clone()));
        world.insert_resource(bus);
        (world, log)
    }

    fn tick(world: &mut World, dt: f32) {
        update_world_time(world, dt);
        let mut schedule = Schedule::default();
        schedule.add_systems(event_sequencer_system);
        schedule.run(world);
    }

    fn sequence() -> Arc<EventSequence> {
        Arc::new(EventSequence::from_absolute(
            "s",
            vec![TimedEvent::new(0.0, "start"), TimedEvent::new(1.0, "one")],
        ))
    }

    #[test]
    fn test_autostart_then_advance() {
        let (mut world, log) = make_world(1.0);
        let entity = world
            .spawn(EventSequencer::single(sequence()).play_on_start(0, 0.0))
            .id();

        tick(&mut world, 0.5);
        assert_eq!(*log.lock().unwrap(), vec!["start"]);
        assert_eq!(world.get::<EventSequencer>(entity).unwrap().time_seconds(), 0.0);

        tick(&mut world, 0.5);
        tick(&mut world, 0.5);
        assert_eq!(*log.lock().unwrap(), vec!["start", "one"]);
        assert_eq!(
            world.get::<EventSequencer>(entity).unwrap().state(),
            SequencerState::Finished
        );
    }

    #[test]
    fn test_idle_sequencer_is_untouched() {
        let (mut world, log) = make_world(1.0);
        let entity = world.spawn(EventSequencer::single(sequence())).id();
        tick(&mut world, 1.0);
        assert!(log.lock().unwrap().is_empty());
        assert_eq!(
            world.get::<EventSequencer>(entity).unwrap().state(),
            SequencerState::Idle
        );
    }

    #[test]
    fn test_unscaled_sequencer_ignores_time_scale() {
        let (mut world, _log) = make_world(0.0);
        let scaled = world
            .spawn(EventSequencer::single(sequence()).play_on_start(0, 0.0))
            .id();
        let unscaled = world
            .spawn(
                EventSequencer::single(sequence())
                    .with_unscaled_time()
                    .play_on_start(0, 0.0),
            )
            .id();

        tick(&mut world, 0.25);
        tick(&mut world, 0.25);

        assert_eq!(world.get::<EventSequencer>(scaled).unwrap().time_seconds(), 0.0);
        assert_eq!(world.get::<EventSequencer>(unscaled).unwrap().time_seconds(), 0.25);
    }
}
