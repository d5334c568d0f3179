//! Timed event broadcast.
//!
//! The [`GameEventBus`] is a publish/subscribe channel for keyed, timestamped
//! events. Event sequencers and the cutscene player publish into it; any
//! number of external listeners subscribe without the producers knowing about
//! them.
//!
//! Delivery is synchronous: [`GameEventBus::publish`] calls every current
//! subscriber, in subscription order, before returning. There is no queue and
//! no persistence. Handlers are not isolated from each other: a panicking
//! handler unwinds through `publish` into the system that published.
//!
//! # Example
//!
//! ```ignore
//! let mut bus = world.resource_mut::<GameEventBus>();
//! let id = bus.subscribe(|ev| {
//!     if ev.key == "door_slam" {
//!         log::info!("door slammed at t={:.3}", ev.sequence_time);
//!     }
//! });
//! // later
//! bus.unsubscribe(id);
//! ```

use bevy_ecs::prelude::{Entity, Resource};
use log::trace;

/// Who published an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSource {
    /// An [`EventSequencer`](crate::components::eventsequencer::EventSequencer) component.
    Sequencer(Entity),
    /// The per-shot sequencer of the cutscene player.
    Shot { cutscene: usize, shot: usize },
    /// Published directly by host code.
    Host,
}

/// A broadcast event as seen by subscribers.
#[derive(Debug, Clone, PartialEq)]
pub struct GameEvent {
    pub key: String,
    /// Clock of the publishing sequencer when the event fired.
    pub sequence_time: f32,
    pub source: EventSource,
}

/// Anything a sequencer can fire events into.
///
/// Implemented by [`GameEventBus`] and by `Vec<GameEvent>`, which simply
/// records what would have been broadcast.
pub trait EventSink {
    fn publish(&mut self, key: &str, sequence_time: f32, source: EventSource);
}

impl EventSink for GameEventBus {
    fn publish(&mut self, key: &str, sequence_time: f32, source: EventSource) {
        GameEventBus::publish(self, key, sequence_time, source);
    }
}

impl EventSink for Vec<GameEvent> {
    fn publish(&mut self, key: &str, sequence_time: f32, source: EventSource) {
        if key.trim().is_empty() {
            return;
        }
        self.push(GameEvent {
            key: key.to_string(),
            sequence_time,
            source,
        });
    }
}

/// Handle returned by [`GameEventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Handler = Box<dyn FnMut(&GameEvent) + Send + Sync>;

/// Process-wide event broker, owned by the ECS world.
#[derive(Resource, Default)]
pub struct GameEventBus {
    handlers: Vec<(SubscriptionId, Handler)>,
    next_id: u64,
    published: u64,
}

impl GameEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler. Handlers are called in subscription order.
    pub fn subscribe<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut(&GameEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.handlers.push((id, Box::new(handler)));
        id
    }

    /// Remove a handler. Returns `false` if it was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(sub, _)| *sub != id);
        self.handlers.len() != before
    }

    /// Broadcast `key` to every subscriber. Blank keys are dropped.
    pub fn publish(&mut self, key: &str, sequence_time: f32, source: EventSource) {
        if key.trim().is_empty() {
            return;
        }
        let event = GameEvent {
            key: key.to_string(),
            sequence_time,
            source,
        };
        trace!(
            "GameEventBus: '{}' at t={:.3} from {:?} -> {} handlers",
            event.key,
            sequence_time,
            source,
            self.handlers.len()
        );
        self.published += 1;
        for (_, handler) in self.handlers.iter_mut() {
            handler(&event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.handlers.len()
    }

    /// Number of non-blank events published since creation.
    pub fn published_count(&self) -> u64 {
        self.published
    }

    /// Drop every handler. Used on shutdown.
    pub fn clear(&mut self) {
        self.handlers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn recorder(bus: &mut GameEventBus, tag: &'static str, log: &Arc<Mutex<Vec<String>>>) -> SubscriptionId {
        let log = Arc::clone(log);
        bus.subscribe(move |ev| log.lock().unwrap().push(format!("{tag}:{}", ev.key)))
    }

    #[test]
    fn test_fan_out_in_subscription_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut bus = GameEventBus::new();
        recorder(&mut bus, "first", &log);
        recorder(&mut bus, "second", &log);

        bus.publish("boom", 1.0, EventSource::Host);

        assert_eq!(*log.lock().unwrap(), vec!["first:boom", "second:boom"]);
        assert_eq!(bus.published_count(), 1);
    }

    #[test]
    fn test_blank_key_never_reaches_subscribers() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut bus = GameEventBus::new();
        recorder(&mut bus, "a", &log);

        bus.publish("", 0.0, EventSource::Host);
        bus.publish("   \t", 0.0, EventSource::Host);

        assert!(log.lock().unwrap().is_empty());
        assert_eq!(bus.published_count(), 0);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut bus = GameEventBus::new();
        let a = recorder(&mut bus, "a", &log);
        recorder(&mut bus, "b", &log);

        assert!(bus.unsubscribe(a));
        assert!(!bus.unsubscribe(a));
        bus.publish("x", 0.0, EventSource::Host);

        assert_eq!(*log.lock().unwrap(), vec!["b:x"]);
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[test]
    fn test_event_carries_time_and_source() {
        let seen = Arc::new(Mutex::new(None));
        let mut bus = GameEventBus::new();
        let sink = Arc::clone(&seen);
        bus.subscribe(move |ev| *sink.lock().unwrap() = Some(ev.clone()));

        bus.publish("k", 2.5, EventSource::Shot { cutscene: 1, shot: 3 });

        let ev = seen.lock().unwrap().clone().unwrap();
        assert_eq!(ev.sequence_time, 2.5);
        assert_eq!(ev.source, EventSource::Shot { cutscene: 1, shot: 3 });
    }
}
