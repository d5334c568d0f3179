//! Timed event sequences.
//!
//! An [`EventSequence`] is an ordered list of `(time, key)` pairs that an
//! [`EventSequencer`](crate::components::eventsequencer::EventSequencer) walks
//! through. Authors write the list either with absolute times or with additive
//! deltas ("2s after the previous event"). Whatever the authoring form, the
//! sequence keeps a derived list of absolute entries that is rebuilt every time
//! the authored list changes and is never serialized.
//!
//! # JSON
//!
//! ```json
//! {
//!   "name": "intro_beats",
//!   "timing": "additive",
//!   "events": [
//!     { "time": 2.0, "key": "thunder" },
//!     { "time": 3.0, "key": "door_slam", "note": "sync with sfx" }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};

/// A single keyed event scheduled at `time` seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedEvent {
    /// Seconds; an absolute time or a delta depending on the sequence's [`TimingMode`].
    pub time: f32,
    /// Key broadcast on the [`GameEventBus`](crate::resources::gameeventbus::GameEventBus).
    #[serde(alias = "event_key")]
    pub key: String,
    /// Free-form authoring note. Diagnostic only.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub note: String,
}

impl TimedEvent {
    pub fn new(time: f32, key: impl Into<String>) -> Self {
        Self {
            time,
            key: key.into(),
            note: String::new(),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }
}

/// How the authored `time` values of a sequence are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimingMode {
    /// Each time is measured from the start of the sequence.
    #[default]
    Absolute,
    /// Each time is measured from the previous entry.
    Additive,
}

/// Resolve additive entries into absolute ones.
///
/// `absolute[i].time = sum(max(0, additive[j].time) for j in 0..=i)`. Pure
/// function of its input, so resolving the same list twice yields identical
/// output.
pub fn resolve_additive(entries: &[TimedEvent]) -> Vec<TimedEvent> {
    let mut acc = 0.0f32;
    entries
        .iter()
        .map(|e| {
            acc += e.time.max(0.0);
            TimedEvent {
                time: acc,
                ..e.clone()
            }
        })
        .collect()
}

fn resolve_absolute(entries: &[TimedEvent]) -> Vec<TimedEvent> {
    entries
        .iter()
        .map(|e| TimedEvent {
            time: e.time.max(0.0),
            ..e.clone()
        })
        .collect()
}

/// Ordered set of [`TimedEvent`]s with a derived absolute view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "EventSequenceData", into = "EventSequenceData")]
pub struct EventSequence {
    name: String,
    timing: TimingMode,
    entries: Vec<TimedEvent>,
    resolved: Vec<TimedEvent>,
}

/// Serialized form: only the authored list is stored.
#[derive(Serialize, Deserialize)]
struct EventSequenceData {
    #[serde(default)]
    name: String,
    #[serde(default)]
    timing: TimingMode,
    #[serde(default)]
    events: Vec<TimedEvent>,
}

impl From<EventSequenceData> for EventSequence {
    fn from(data: EventSequenceData) -> Self {
        EventSequence::new(data.name, data.timing, data.events)
    }
}

impl From<EventSequence> for EventSequenceData {
    fn from(seq: EventSequence) -> Self {
        EventSequenceData {
            name: seq.name,
            timing: seq.timing,
            events: seq.entries,
        }
    }
}

impl EventSequence {
    pub fn new(name: impl Into<String>, timing: TimingMode, entries: Vec<TimedEvent>) -> Self {
        let mut seq = Self {
            name: name.into(),
            timing,
            entries,
            resolved: Vec::new(),
        };
        seq.rebuild();
        seq
    }

    /// Sequence authored with absolute times.
    pub fn from_absolute(name: impl Into<String>, entries: Vec<TimedEvent>) -> Self {
        Self::new(name, TimingMode::Absolute, entries)
    }

    /// Sequence authored with additive deltas.
    pub fn from_additive(name: impl Into<String>, entries: Vec<TimedEvent>) -> Self {
        Self::new(name, TimingMode::Additive, entries)
    }

    /// Replace the authored list. The absolute view is recomputed.
    pub fn set_entries(&mut self, timing: TimingMode, entries: Vec<TimedEvent>) {
        self.timing = timing;
        self.entries = entries;
        self.rebuild();
    }

    fn rebuild(&mut self) {
        self.resolved = match self.timing {
            TimingMode::Absolute => resolve_absolute(&self.entries),
            TimingMode::Additive => resolve_additive(&self.entries),
        };
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn timing(&self) -> TimingMode {
        self.timing
    }

    /// The list as authored.
    pub fn entries(&self) -> &[TimedEvent] {
        &self.entries
    }

    /// Absolute entries in authored order.
    pub fn events(&self) -> &[TimedEvent] {
        &self.resolved
    }

    /// Absolute entries stably sorted by time; ties keep authored order.
    pub fn sorted_events(&self) -> Vec<TimedEvent> {
        let mut sorted = self.resolved.clone();
        sorted.sort_by(|a, b| a.time.total_cmp(&b.time));
        sorted
    }

    /// Time of the latest event, or 0 for an empty sequence.
    pub fn span(&self) -> f32 {
        self.resolved.iter().map(|e| e.time).fold(0.0, f32::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(events: &[TimedEvent]) -> Vec<&str> {
        events.iter().map(|e| e.key.as_str()).collect()
    }

    fn times(events: &[TimedEvent]) -> Vec<f32> {
        events.iter().map(|e| e.time).collect()
    }

    #[test]
    fn test_additive_resolves_to_running_sum() {
        let seq = EventSequence::from_additive(
            "abc",
            vec![
                TimedEvent::new(2.0, "A"),
                TimedEvent::new(3.0, "B"),
                TimedEvent::new(1.0, "C"),
            ],
        );
        assert_eq!(times(seq.events()), vec![2.0, 5.0, 6.0]);
        assert_eq!(keys(seq.events()), vec!["A", "B", "C"]);
        assert_eq!(seq.span(), 6.0);
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let entries = vec![
            TimedEvent::new(0.5, "a"),
            TimedEvent::new(0.0, "b"),
            TimedEvent::new(1.25, "c"),
        ];
        let first = resolve_additive(&entries);
        let second = resolve_additive(&entries);
        assert_eq!(first, second);
        for pair in first.windows(2) {
            assert!(pair[0].time <= pair[1].time);
        }
    }

    #[test]
    fn test_negative_deltas_are_clamped() {
        let resolved = resolve_additive(&[
            TimedEvent::new(-4.0, "a"),
            TimedEvent::new(1.0, "b"),
            TimedEvent::new(-1.0, "c"),
        ]);
        assert_eq!(times(&resolved), vec![0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_absolute_negative_times_clamped() {
        let seq = EventSequence::from_absolute("neg", vec![TimedEvent::new(-2.0, "x")]);
        assert_eq!(seq.events()[0].time, 0.0);
        assert_eq!(seq.entries()[0].time, -2.0);
    }

    #[test]
    fn test_set_entries_recomputes_view() {
        let mut seq = EventSequence::from_absolute("s", vec![TimedEvent::new(4.0, "x")]);
        seq.set_entries(
            TimingMode::Additive,
            vec![TimedEvent::new(1.0, "x"), TimedEvent::new(1.0, "y")],
        );
        assert_eq!(times(seq.events()), vec![1.0, 2.0]);
    }

    #[test]
    fn test_sorted_events_is_stable_on_ties() {
        let seq = EventSequence::from_absolute(
            "ties",
            vec![
                TimedEvent::new(3.0, "late"),
                TimedEvent::new(1.0, "first"),
                TimedEvent::new(1.0, "second"),
            ],
        );
        assert_eq!(keys(&seq.sorted_events()), vec!["first", "second", "late"]);
    }

    #[test]
    fn test_json_roundtrip_keeps_authored_form() {
        let json = r#"{
            "name": "beats",
            "timing": "additive",
            "events": [
                { "time": 2.0, "key": "A" },
                { "time": 3.0, "event_key": "B", "note": "alias" }
            ]
        }"#;
        let seq: EventSequence = serde_json::from_str(json).unwrap();
        assert_eq!(seq.timing(), TimingMode::Additive);
        assert_eq!(times(seq.events()), vec![2.0, 5.0]);

        let out = serde_json::to_value(&seq).unwrap();
        assert_eq!(out["events"][1]["time"], 3.0);
        assert!(out.get("resolved").is_none());
    }
}
