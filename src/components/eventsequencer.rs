//! Event sequencer state machine.
//!
//! An [`EventSequencer`] walks a playlist of [`EventSequence`]s and fires each
//! due event exactly once per play through an [`EventSink`] (normally the
//! [`GameEventBus`](crate::resources::gameeventbus::GameEventBus)).
//!
//! # States
//!
//! - `Idle` – never played, stopped, or the playlist had nothing playable
//! - `Playing` – the clock advances on every tick
//! - `Paused` – clock and cursor frozen
//! - `Finished` – the last sequence fired all its events and there is no next one
//!
//! # Timing
//!
//! `play_from(index, t)` sets the clock to `max(0, t)`, skips events scheduled
//! strictly before `t`, and immediately fires those scheduled exactly at `t`.
//! Each `advance(dt)` adds `dt * time_scale` to the clock and fires every event
//! with `time <= clock` in ascending order. When the current sequence has no
//! events left, the sequencer moves on to the next non-null playlist entry
//! (or loops, or finishes). At most one such move happens per `advance` call.
//!
//! Attach the component to an entity and let
//! [`event_sequencer_system`](crate::systems::eventsequencer::event_sequencer_system)
//! drive it, or own one directly and call `advance` yourself, which is what
//! the cutscene player does for per-shot events.

use std::sync::Arc;

use bevy_ecs::prelude::Component;
use log::{debug, warn};

use crate::assets::eventsequence::{EventSequence, TimedEvent};
use crate::resources::gameeventbus::{EventSink, EventSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SequencerState {
    #[default]
    Idle,
    Playing,
    Paused,
    Finished,
}

#[derive(Component, Debug, Clone)]
pub struct EventSequencer {
    playlist: Vec<Option<Arc<EventSequence>>>,
    /// Jump back to the first valid entry after the last sequence.
    pub loop_playlist: bool,
    /// Read `WorldTime::unscaled_delta` instead of `delta`.
    pub use_unscaled_time: bool,
    /// Playback rate applied to every delta.
    pub time_scale: f32,
    start_index: usize,
    start_time: f32,
    autostart: bool,
    sorted: Vec<TimedEvent>,
    current: Option<usize>,
    next_event: usize,
    time: f32,
    state: SequencerState,
}

impl EventSequencer {
    /// Sequencer over a playlist. `None` entries are skipped.
    pub fn new(playlist: Vec<Option<Arc<EventSequence>>>) -> Self {
        Self {
            playlist,
            loop_playlist: false,
            use_unscaled_time: false,
            time_scale: 1.0,
            start_index: 0,
            start_time: 0.0,
            autostart: false,
            sorted: Vec::new(),
            current: None,
            next_event: 0,
            time: 0.0,
            state: SequencerState::Idle,
        }
    }

    /// Sequencer over a single sequence.
    pub fn single(sequence: Arc<EventSequence>) -> Self {
        Self::new(vec![Some(sequence)])
    }

    pub fn with_loop(mut self, loop_playlist: bool) -> Self {
        self.loop_playlist = loop_playlist;
        self
    }

    pub fn with_unscaled_time(mut self) -> Self {
        self.use_unscaled_time = true;
        self
    }

    pub fn with_time_scale(mut self, time_scale: f32) -> Self {
        self.time_scale = time_scale;
        self
    }

    /// Start automatically at `index`/`time` the first time the system sees it.
    pub fn play_on_start(mut self, index: usize, time: f32) -> Self {
        self.start_index = index;
        self.start_time = time.max(0.0);
        self.autostart = true;
        self
    }

    /// Consume the pending autostart request, returning where to start.
    pub(crate) fn take_autostart(&mut self) -> Option<(usize, f32)> {
        if !self.autostart {
            return None;
        }
        self.autostart = false;
        Some((self.start_index, self.start_time))
    }

    // ---------- Playback control ----------

    /// Play from the first valid playlist entry at `start_time`.
    pub fn play(&mut self, start_time: f32, sink: &mut dyn EventSink, source: EventSource) {
        self.play_from(0, start_time, sink, source);
    }

    /// Play from the first valid playlist entry at or after `index`.
    /// A pending autostart is dropped.
    pub fn play_from(
        &mut self,
        index: usize,
        start_time: f32,
        sink: &mut dyn EventSink,
        source: EventSource,
    ) {
        self.autostart = false;
        self.set_current(index, start_time, sink, source);
    }

    /// Advance the clock by `dt` seconds and fire due events.
    pub fn advance(&mut self, dt: f32, sink: &mut dyn EventSink, source: EventSource) {
        if self.state != SequencerState::Playing || dt <= 0.0 {
            return;
        }
        let target = self.time + dt * self.time_scale;
        self.step_clock(target, sink, source);
    }

    /// Move the clock forward to `time`, ignoring `time_scale`. Earlier
    /// times are ignored.
    pub fn advance_to(&mut self, time: f32, sink: &mut dyn EventSink, source: EventSource) {
        if self.state != SequencerState::Playing || time <= self.time {
            return;
        }
        self.step_clock(time, sink, source);
    }

    fn step_clock(&mut self, time: f32, sink: &mut dyn EventSink, source: EventSource) {
        self.time = time;
        self.fire_due_events(sink, source);
        if self.current_sequence_finished() {
            self.advance_to_next_sequence(false, sink, source);
        }
    }

    pub fn pause(&mut self) {
        if self.state == SequencerState::Playing {
            self.state = SequencerState::Paused;
        }
    }

    pub fn resume(&mut self) {
        if self.state == SequencerState::Paused {
            self.state = SequencerState::Playing;
        }
    }

    /// Back to `Idle`. Clock and cursor are reset by the next play.
    pub fn stop(&mut self) {
        self.state = SequencerState::Idle;
    }

    /// Replace the playlist. With `restart`, playback restarts from the
    /// configured start position; otherwise the current index is kept if it
    /// is still in range.
    pub fn set_playlist(
        &mut self,
        playlist: Vec<Option<Arc<EventSequence>>>,
        restart: bool,
        sink: &mut dyn EventSink,
        source: EventSource,
    ) {
        self.playlist = playlist;
        if restart {
            self.play_from(self.start_index, self.start_time, sink, source);
        } else {
            self.rebuild_cache();
            self.next_event = self.first_event_at_or_after(self.time);
        }
    }

    /// Move to the next sequence even if the current one has events left.
    pub fn jump_to_next_sequence(&mut self, sink: &mut dyn EventSink, source: EventSource) {
        self.advance_to_next_sequence(true, sink, source);
    }

    pub fn jump_to_previous_sequence(&mut self, sink: &mut dyn EventSink, source: EventSource) {
        let Some(prev) = self.find_prev_valid_index() else {
            debug!("EventSequencer: no previous sequence");
            return;
        };
        self.set_current(prev, 0.0, sink, source);
    }

    pub fn restart_current_sequence(
        &mut self,
        time: f32,
        sink: &mut dyn EventSink,
        source: EventSource,
    ) {
        if let Some(current) = self.current {
            self.set_current(current, time, sink, source);
        }
    }

    // ---------- Accessors ----------

    pub fn state(&self) -> SequencerState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == SequencerState::Playing
    }

    pub fn time_seconds(&self) -> f32 {
        self.time
    }

    pub fn current_playlist_index(&self) -> Option<usize> {
        self.current
    }

    /// Index of the next event to fire within the current sequence.
    pub fn next_event_index(&self) -> usize {
        self.next_event
    }

    pub fn playlist_len(&self) -> usize {
        self.playlist.len()
    }

    // ---------- Internals ----------

    fn set_current(
        &mut self,
        requested: usize,
        start_time: f32,
        sink: &mut dyn EventSink,
        source: EventSource,
    ) {
        let Some(idx) = self.find_next_valid_index(requested) else {
            warn!("EventSequencer: playlist empty or only null entries. Stopping.");
            self.state = SequencerState::Idle;
            self.current = None;
            self.sorted.clear();
            return;
        };

        self.current = Some(idx);
        self.time = start_time.max(0.0);
        self.rebuild_cache();
        self.next_event = self.first_event_at_or_after(self.time);
        self.state = SequencerState::Playing;

        debug!(
            "EventSequencer: now playing playlist[{}] '{}' from t={:.3}",
            idx,
            self.playlist[idx].as_ref().map(|s| s.name()).unwrap_or(""),
            self.time
        );

        self.fire_due_events(sink, source);
    }

    fn rebuild_cache(&mut self) {
        self.sorted = self
            .current
            .and_then(|i| self.playlist.get(i))
            .and_then(|entry| entry.as_ref())
            .map(|seq| seq.sorted_events())
            .unwrap_or_default();
    }

    fn fire_due_events(&mut self, sink: &mut dyn EventSink, source: EventSource) {
        while let Some(ev) = self.sorted.get(self.next_event) {
            if ev.time > self.time {
                break;
            }
            self.next_event += 1;
            debug!(
                "EventSequencer: t={:.3} fired '{}' (scheduled {:.3})",
                self.time, ev.key, ev.time
            );
            sink.publish(&ev.key, self.time, source);
        }
    }

    fn current_sequence_finished(&self) -> bool {
        self.next_event >= self.sorted.len()
    }

    fn advance_to_next_sequence(
        &mut self,
        force: bool,
        sink: &mut dyn EventSink,
        source: EventSource,
    ) {
        if !force && !self.current_sequence_finished() {
            return;
        }

        let after = self.current.map_or(0, |c| c + 1);
        if let Some(next) = self.find_next_valid_index(after) {
            self.set_current(next, 0.0, sink, source);
            return;
        }

        if self.loop_playlist
            && let Some(first) = self.find_next_valid_index(0)
        {
            debug!("EventSequencer: looping playlist to start");
            self.set_current(first, 0.0, sink, source);
            return;
        }

        debug!("EventSequencer: reached end of playlist");
        self.state = SequencerState::Finished;
    }

    /// First non-null entry at or after `from`.
    fn find_next_valid_index(&self, from: usize) -> Option<usize> {
        (from..self.playlist.len()).find(|&i| self.playlist[i].is_some())
    }

    fn find_prev_valid_index(&self) -> Option<usize> {
        let current = self.current?;
        (0..current).rev().find(|&i| self.playlist[i].is_some())
    }

    fn first_event_at_or_after(&self, t: f32) -> usize {
        self.sorted
            .iter()
            .position(|e| e.time >= t)
            .unwrap_or(self.sorted.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::gameeventbus::GameEvent;

    const SRC: EventSource = EventSource::Host;

    fn abc() -> Arc<EventSequence> {
        Arc::new(EventSequence::from_additive(
            "abc",
            vec![
                TimedEvent::new(2.0, "A"),
                TimedEvent::new(3.0, "B"),
                TimedEvent::new(1.0, "C"),
            ],
        ))
    }

    fn seq(name: &str, events: &[(f32, &str)]) -> Arc<EventSequence> {
        Arc::new(EventSequence::from_absolute(
            name,
            events.iter().map(|(t, k)| TimedEvent::new(*t, *k)).collect(),
        ))
    }

    fn keys(events: &[GameEvent]) -> Vec<&str> {
        events.iter().map(|e| e.key.as_str()).collect()
    }

    #[test]
    fn test_fires_in_order_without_duplicates_or_early_events() {
        let mut sink: Vec<GameEvent> = Vec::new();
        let mut s = EventSequencer::single(abc());
        s.play(0.0, &mut sink, SRC);
        assert!(sink.is_empty());

        let mut fired_per_tick = Vec::new();
        for _ in 0..6 {
            let before = sink.len();
            s.advance(1.0, &mut sink, SRC);
            fired_per_tick.push(keys(&sink[before..]).join(","));
        }

        assert_eq!(fired_per_tick, vec!["", "A", "", "", "B", "C"]);
        assert_eq!(keys(&sink), vec!["A", "B", "C"]);
        assert_eq!(s.state(), SequencerState::Finished);

        s.advance(10.0, &mut sink, SRC);
        assert_eq!(sink.len(), 3);
    }

    #[test]
    fn test_event_time_is_sequencer_clock() {
        let mut sink: Vec<GameEvent> = Vec::new();
        let mut s = EventSequencer::single(seq("s", &[(1.0, "x")]));
        s.play(0.0, &mut sink, SRC);
        s.advance(1.5, &mut sink, SRC);
        assert_eq!(sink[0].sequence_time, 1.5);
    }

    #[test]
    fn test_play_at_start_time_skips_past_and_fires_exact() {
        let mut sink: Vec<GameEvent> = Vec::new();
        let mut s = EventSequencer::single(seq("s", &[(1.0, "past"), (2.0, "exact"), (3.0, "later")]));
        s.play(2.0, &mut sink, SRC);
        assert_eq!(keys(&sink), vec!["exact"]);

        s.advance(1.0, &mut sink, SRC);
        assert_eq!(keys(&sink), vec!["exact", "later"]);
    }

    #[test]
    fn test_events_at_zero_fire_on_play() {
        let mut sink: Vec<GameEvent> = Vec::new();
        let mut s = EventSequencer::single(seq("s", &[(0.0, "now"), (0.5, "soon")]));
        s.play(0.0, &mut sink, SRC);
        assert_eq!(keys(&sink), vec!["now"]);
    }

    #[test]
    fn test_negative_start_time_clamps_to_zero() {
        let mut sink: Vec<GameEvent> = Vec::new();
        let mut s = EventSequencer::single(seq("s", &[(0.0, "now")]));
        s.play(-3.0, &mut sink, SRC);
        assert_eq!(s.time_seconds(), 0.0);
        assert_eq!(keys(&sink), vec!["now"]);
    }

    #[test]
    fn test_non_positive_delta_is_ignored() {
        let mut sink: Vec<GameEvent> = Vec::new();
        let mut s = EventSequencer::single(seq("s", &[(1.0, "x")]));
        s.play(0.0, &mut sink, SRC);
        s.advance(0.0, &mut sink, SRC);
        s.advance(-5.0, &mut sink, SRC);
        assert_eq!(s.time_seconds(), 0.0);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_pause_and_resume_keep_clock() {
        let mut sink: Vec<GameEvent> = Vec::new();
        let mut s = EventSequencer::single(seq("s", &[(2.0, "x")]));
        s.play(0.0, &mut sink, SRC);
        s.advance(1.0, &mut sink, SRC);
        s.pause();
        assert_eq!(s.state(), SequencerState::Paused);
        s.advance(5.0, &mut sink, SRC);
        assert_eq!(s.time_seconds(), 1.0);
        assert!(sink.is_empty());

        s.resume();
        s.advance(1.0, &mut sink, SRC);
        assert_eq!(keys(&sink), vec!["x"]);
    }

    #[test]
    fn test_resume_does_not_restart_stopped_sequencer() {
        let mut sink: Vec<GameEvent> = Vec::new();
        let mut s = EventSequencer::single(seq("s", &[(2.0, "x")]));
        s.play(0.0, &mut sink, SRC);
        s.stop();
        s.resume();
        assert_eq!(s.state(), SequencerState::Idle);
    }

    #[test]
    fn test_stop_then_play_resets_clock_and_cursor() {
        let mut sink: Vec<GameEvent> = Vec::new();
        let mut s = EventSequencer::single(seq("s", &[(1.0, "x")]));
        s.play(0.0, &mut sink, SRC);
        s.advance(1.0, &mut sink, SRC);
        s.stop();
        s.play(0.0, &mut sink, SRC);
        assert_eq!(s.time_seconds(), 0.0);
        assert_eq!(s.next_event_index(), 0);
        s.advance(1.0, &mut sink, SRC);
        assert_eq!(keys(&sink), vec!["x", "x"]);
    }

    #[test]
    fn test_playlist_advances_skipping_null_entries() {
        let mut sink: Vec<GameEvent> = Vec::new();
        let mut s = EventSequencer::new(vec![
            Some(seq("one", &[(1.0, "a")])),
            None,
            Some(seq("two", &[(1.0, "b")])),
        ]);
        s.play(0.0, &mut sink, SRC);
        s.advance(1.0, &mut sink, SRC);
        assert_eq!(s.current_playlist_index(), Some(2));
        assert_eq!(s.time_seconds(), 0.0);

        s.advance(1.0, &mut sink, SRC);
        assert_eq!(keys(&sink), vec!["a", "b"]);
        assert_eq!(s.state(), SequencerState::Finished);
    }

    #[test]
    fn test_loop_returns_to_first_valid_entry() {
        let mut sink: Vec<GameEvent> = Vec::new();
        let mut s = EventSequencer::new(vec![None, Some(seq("one", &[(1.0, "a")]))]).with_loop(true);
        s.play(0.0, &mut sink, SRC);
        s.advance(1.0, &mut sink, SRC);
        assert_eq!(s.current_playlist_index(), Some(1));
        assert!(s.is_playing());
        s.advance(1.0, &mut sink, SRC);
        assert_eq!(keys(&sink), vec!["a", "a"]);
    }

    #[test]
    fn test_looping_empty_sequence_advances_once_per_tick() {
        let mut sink: Vec<GameEvent> = Vec::new();
        let mut s = EventSequencer::single(seq("empty", &[])).with_loop(true);
        s.play(0.0, &mut sink, SRC);
        s.advance(1.0, &mut sink, SRC);
        assert!(s.is_playing());
        assert_eq!(s.current_playlist_index(), Some(0));
    }

    #[test]
    fn test_empty_or_null_playlist_stays_idle() {
        let mut sink: Vec<GameEvent> = Vec::new();
        let mut empty = EventSequencer::new(Vec::new());
        empty.play(0.0, &mut sink, SRC);
        assert_eq!(empty.state(), SequencerState::Idle);

        let mut nulls = EventSequencer::new(vec![None, None]);
        nulls.play(0.0, &mut sink, SRC);
        assert_eq!(nulls.state(), SequencerState::Idle);
        assert_eq!(nulls.current_playlist_index(), None);
    }

    #[test]
    fn test_jump_next_and_previous() {
        let mut sink: Vec<GameEvent> = Vec::new();
        let mut s = EventSequencer::new(vec![
            Some(seq("one", &[(5.0, "a")])),
            None,
            Some(seq("two", &[(0.0, "b")])),
        ]);
        s.play(0.0, &mut sink, SRC);
        s.jump_to_next_sequence(&mut sink, SRC);
        assert_eq!(s.current_playlist_index(), Some(2));
        assert_eq!(keys(&sink), vec!["b"]);

        s.jump_to_previous_sequence(&mut sink, SRC);
        assert_eq!(s.current_playlist_index(), Some(0));

        s.jump_to_previous_sequence(&mut sink, SRC);
        assert_eq!(s.current_playlist_index(), Some(0));
    }

    #[test]
    fn test_restart_current_sequence() {
        let mut sink: Vec<GameEvent> = Vec::new();
        let mut s = EventSequencer::single(seq("s", &[(1.0, "x"), (3.0, "y")]));
        s.play(0.0, &mut sink, SRC);
        s.advance(1.0, &mut sink, SRC);
        s.restart_current_sequence(0.0, &mut sink, SRC);
        s.advance(1.0, &mut sink, SRC);
        assert_eq!(keys(&sink), vec!["x", "x"]);
    }

    #[test]
    fn test_time_scale_stretches_clock() {
        let mut sink: Vec<GameEvent> = Vec::new();
        let mut s = EventSequencer::single(seq("s", &[(2.0, "x")])).with_time_scale(2.0);
        s.play(0.0, &mut sink, SRC);
        s.advance(1.0, &mut sink, SRC);
        assert_eq!(keys(&sink), vec!["x"]);
        assert_eq!(sink[0].sequence_time, 2.0);
    }

    #[test]
    fn test_advance_to_only_moves_forward() {
        let mut sink: Vec<GameEvent> = Vec::new();
        let mut s = EventSequencer::single(seq("s", &[(1.0, "x"), (3.0, "y")])).with_time_scale(10.0);
        s.play(0.0, &mut sink, SRC);
        s.advance_to(1.0, &mut sink, SRC);
        assert_eq!(s.time_seconds(), 1.0);
        s.advance_to(0.5, &mut sink, SRC);
        assert_eq!(s.time_seconds(), 1.0);
        s.advance_to(3.0, &mut sink, SRC);
        assert_eq!(keys(&sink), vec!["x", "y"]);
    }

    #[test]
    fn test_set_playlist_restart_uses_start_position() {
        let mut sink: Vec<GameEvent> = Vec::new();
        let mut s = EventSequencer::new(Vec::new()).play_on_start(1, 0.0);
        s.set_playlist(
            vec![Some(seq("a", &[(0.0, "a")])), Some(seq("b", &[(0.0, "b")]))],
            true,
            &mut sink,
            SRC,
        );
        assert_eq!(s.current_playlist_index(), Some(1));
        assert_eq!(keys(&sink), vec!["b"]);
    }

    #[test]
    fn test_autostart_is_consumed_once() {
        let mut s = EventSequencer::new(Vec::new()).play_on_start(2, 1.5);
        assert_eq!(s.take_autostart(), Some((2, 1.5)));
        assert_eq!(s.take_autostart(), None);
    }
}
