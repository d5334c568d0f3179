//! Cutscene playback engine.
//!
//! The [`CutscenePlayer`] resource plays a [`Playlist`] of cutscenes. Each
//! cutscene loads its additive scenes, rebuilds the
//! [`CameraRegistry`], then runs its shots in order. A shot activates its
//! camera, applies blend and fade settings, drives its own event sequence, and
//! waits out its duration. The last shot may start preloading the next scene
//! in single mode; the preload's activation gate only opens once every shot
//! has finished, and that scene transition ends the playlist.
//!
//! Playback is an explicit step machine resumed once per tick by
//! [`cutscene_player_system`](crate::systems::cutscene::cutscene_player_system).
//! Waits consume the tick's delta and carry any overshoot into the next step,
//! so cumulative shot timing never drifts and zero-length waits finish within
//! the same tick.
//!
//! Control it with [`play_playlist`], [`play_index`], [`play_next`] and
//! [`stop_cutscene`], or by triggering a
//! [`CutsceneRequest`](crate::events::cutscene::CutsceneRequest). Only one
//! session runs at a time: starting a new one tears down the previous one.
//!
//! # Failure handling
//!
//! Unknown camera ids, duplicate ids, empty playlists, null entries, and
//! cutscenes without shots are logged and skipped. A missing camera still
//! waits out the shot so downstream timing holds. A scene that fails to load
//! aborts the session: cleanup runs, [`CutscenePlayer::last_error`] is set and
//! `CutsceneEvent::Aborted` is triggered.
//!
//! Every exit path (completion, stop, replacement, abort) drops the shot event
//! sequencer, resets camera priorities, and restores the blend snapshot.

use std::collections::VecDeque;
use std::sync::Arc;

use bevy_ecs::prelude::*;
use log::{debug, error, info, warn};

use crate::assets::cutscene::{Cutscene, Playlist, Shot};
use crate::components::eventsequencer::EventSequencer;
use crate::error::{PlaybackError, SceneError};
use crate::events::cutscene::CutsceneEvent;
use crate::resources::camerabrain::{BlendDefinition, CameraBrain};
use crate::resources::cameraregistry::CameraRegistry;
use crate::resources::gameeventbus::{EventSource, GameEventBus};
use crate::resources::sceneloader::{SceneLoadHandle, SceneLoader};
use crate::resources::screenfader::ensure_screen_fader;
use crate::resources::worldtime::WorldTime;
use crate::systems::sceneloader::load_single_blocking;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Idle,
    LoadingScenes,
    PlayingShot,
    /// Last shot running while the next scene loads in the background.
    Preloading,
    /// Shots are done; waiting for the next scene to activate.
    TransitioningScene,
    /// Stopped by request or aborted.
    Stopped,
}

/// What happens when a wait finishes.
#[derive(Debug, Clone, Copy, PartialEq)]
enum HoldEnd {
    BeginPreload { lead: f32 },
    BeginFadeOut { fade_time: f32 },
    SnapFadeOut,
    EndShot,
}

#[derive(Debug)]
enum Step {
    BeginCutscene,
    LoadScenes {
        queue: VecDeque<String>,
        in_flight: Option<SceneLoadHandle>,
    },
    BeginShot,
    Hold { remaining: f32, then: HoldEnd },
    EndShot,
    EndCutscene,
    /// Move on to the next playlist entry.
    NextCutscene,
    AwaitNextScene { handle: SceneLoadHandle },
    Done,
}

/// Per-shot event sequence mapped onto the shot's duration.
#[derive(Debug)]
struct ShotEvents {
    sequencer: EventSequencer,
    span: f32,
    /// Sequence seconds per shot second.
    rate: f32,
    shot_length: f32,
    elapsed: f32,
    source: EventSource,
}

impl ShotEvents {
    fn new(sequencer: EventSequencer, span: f32, shot_length: f32, source: EventSource) -> Self {
        let rate = if span > 0.0 && shot_length > 0.0 {
            span / shot_length
        } else {
            1.0
        };
        Self {
            sequencer,
            span,
            rate,
            shot_length,
            elapsed: 0.0,
            source,
        }
    }

    fn advance(&mut self, shot_seconds: f32, bus: &mut GameEventBus) {
        self.elapsed += shot_seconds;
        let target = if self.elapsed >= self.shot_length {
            self.span
        } else {
            self.elapsed * self.rate
        };
        self.sequencer.advance_to(target, bus, self.source);
    }

    /// Run the sequence out to its span. Called once the shot's time is up,
    /// whatever the accumulated `elapsed` rounded to.
    fn finish(&mut self, bus: &mut GameEventBus) {
        self.sequencer.advance_to(self.span, bus, self.source);
    }
}

/// Time left in the current tick, in both clocks.
///
/// Consuming from one clock shrinks the other proportionally, so scaled and
/// unscaled shots can share one tick.
#[derive(Debug, Clone, Copy)]
struct TickBudget {
    scaled: f32,
    unscaled: f32,
    tick_scaled: f32,
    tick_unscaled: f32,
}

impl TickBudget {
    fn new(time: &WorldTime) -> Self {
        let scaled = time.delta.max(0.0);
        let unscaled = time.unscaled_delta.max(0.0);
        Self {
            scaled,
            unscaled,
            tick_scaled: scaled,
            tick_unscaled: unscaled,
        }
    }

    fn available(&self, unscaled: bool) -> f32 {
        if unscaled { self.unscaled } else { self.scaled }
    }

    /// Part of this tick already played out. A fade started now skips this
    /// much of the fader's next advance.
    fn spent(&self, unscaled: bool) -> f32 {
        let total = if unscaled {
            self.tick_unscaled
        } else {
            self.tick_scaled
        };
        (total - self.available(unscaled)).max(0.0)
    }

    fn consume(&mut self, seconds: f32, unscaled: bool) {
        let (used, other) = if unscaled {
            (&mut self.unscaled, &mut self.scaled)
        } else {
            (&mut self.scaled, &mut self.unscaled)
        };
        let before = *used;
        if before <= 0.0 {
            return;
        }
        *used = (before - seconds).max(0.0);
        *other *= *used / before;
    }
}

#[derive(Debug)]
struct Session {
    playlist: Playlist,
    index: usize,
    cutscene: Option<Arc<Cutscene>>,
    shot: usize,
    step: Step,
    shot_unscaled: bool,
    shot_events: Option<ShotEvents>,
    preload: Option<SceneLoadHandle>,
    saved_blend: Option<BlendDefinition>,
    cutscene_time: f32,
}

impl Session {
    fn new(playlist: Playlist, index: usize) -> Self {
        Self {
            playlist,
            index,
            cutscene: None,
            shot: 0,
            step: Step::BeginCutscene,
            shot_unscaled: false,
            shot_events: None,
            preload: None,
            saved_blend: None,
            cutscene_time: 0.0,
        }
    }

    fn cutscene_name(&self) -> String {
        self.cutscene
            .as_ref()
            .map(|c| c.name.clone())
            .unwrap_or_default()
    }
}

#[derive(Resource, Debug, Default)]
pub struct CutscenePlayer {
    playlist: Playlist,
    session: Option<Session>,
    state: PlaybackState,
    current_index: Option<usize>,
    shots_started: u32,
    last_error: Option<PlaybackError>,
}

impl CutscenePlayer {
    pub fn new(playlist: Playlist) -> Self {
        Self {
            playlist,
            ..Default::default()
        }
    }

    /// Replace the playlist. A running session keeps playing its own copy.
    pub fn set_playlist(&mut self, playlist: Playlist) {
        self.playlist = playlist;
    }

    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.session.is_some()
    }

    /// Index of the cutscene being played, or of the last one played.
    /// Cleared by [`stop_cutscene`].
    pub fn current_playlist_index(&self) -> Option<usize> {
        self.current_index
    }

    pub fn current_shot_index(&self) -> Option<usize> {
        self.session
            .as_ref()
            .filter(|s| s.cutscene.is_some())
            .map(|s| s.shot)
    }

    /// Shots whose camera was activated, over the player's lifetime.
    pub fn shots_started(&self) -> u32 {
        self.shots_started
    }

    /// Seconds of shot time elapsed in the current cutscene.
    pub fn cutscene_time(&self) -> f32 {
        self.session.as_ref().map_or(0.0, |s| s.cutscene_time)
    }

    /// Handle of the next-scene preload, once begun.
    pub fn preload_handle(&self) -> Option<SceneLoadHandle> {
        self.session.as_ref().and_then(|s| s.preload)
    }

    pub fn last_error(&self) -> Option<&PlaybackError> {
        self.last_error.as_ref()
    }

    /// Resume the session for one tick.
    pub(crate) fn tick(&mut self, world: &mut World, events: &mut Vec<CutsceneEvent>) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        let time = world.get_resource::<WorldTime>().copied().unwrap_or_default();
        let mut budget = TickBudget::new(&time);

        let outcome = loop {
            match self.resume(&mut session, world, &mut budget, events) {
                Ok(Flow::Continue) => continue,
                Ok(Flow::Yield) => break Ok(true),
                Ok(Flow::Finished) => break Ok(false),
                Err(err) => break Err(err),
            }
        };

        match outcome {
            Ok(true) => self.session = Some(session),
            Ok(false) => {
                self.state = PlaybackState::Idle;
                info!("Cutscene playlist finished");
                events.push(CutsceneEvent::PlaylistFinished);
            }
            Err(err) => {
                let index = session.index;
                error!("{}", err);
                cleanup(&mut session, world);
                self.state = PlaybackState::Stopped;
                self.last_error = Some(err.clone());
                events.push(CutsceneEvent::Aborted { index, error: err });
            }
        }
    }

    /// Run the current step. Each call either changes the step or yields.
    fn resume(
        &mut self,
        session: &mut Session,
        world: &mut World,
        budget: &mut TickBudget,
        events: &mut Vec<CutsceneEvent>,
    ) -> Result<Flow, PlaybackError> {
        let step = std::mem::replace(&mut session.step, Step::Done);
        match step {
            Step::BeginCutscene => {
                if session.index >= session.playlist.len() {
                    session.step = Step::Done;
                    return Ok(Flow::Continue);
                }
                let Some(cutscene) = session.playlist[session.index].clone() else {
                    warn!("Playlist entry {} is null, skipping", session.index);
                    session.index += 1;
                    session.step = Step::BeginCutscene;
                    return Ok(Flow::Continue);
                };
                info!("Cutscene '{}' (playlist[{}]) started", cutscene.name, session.index);
                self.current_index = Some(session.index);
                self.state = PlaybackState::LoadingScenes;
                events.push(CutsceneEvent::Started {
                    index: session.index,
                    name: cutscene.name.clone(),
                });
                let queue = cutscene
                    .additive_scenes
                    .iter()
                    .map(|s| s.trim())
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect();
                session.cutscene = Some(cutscene);
                session.shot = 0;
                session.cutscene_time = 0.0;
                session.preload = None;
                session.step = Step::LoadScenes {
                    queue,
                    in_flight: None,
                };
                Ok(Flow::Continue)
            }

            Step::LoadScenes {
                mut queue,
                in_flight,
            } => {
                let cutscene_name = session.cutscene_name();
                let scene_failed = |source: SceneError| PlaybackError::SceneLoad {
                    cutscene: cutscene_name.clone(),
                    source,
                };

                if let Some(handle) = in_flight {
                    let mut loader = world
                        .get_resource_mut::<SceneLoader>()
                        .ok_or_else(|| scene_failed(SceneError::LoaderShutDown))?;
                    if let Some(err) = loader.failure(handle).cloned() {
                        loader.release(handle);
                        return Err(scene_failed(err));
                    }
                    if !loader.is_done(handle) {
                        session.step = Step::LoadScenes { queue, in_flight };
                        return Ok(Flow::Yield);
                    }
                    loader.release(handle);
                    session.step = Step::LoadScenes {
                        queue,
                        in_flight: None,
                    };
                    return Ok(Flow::Continue);
                }

                if let Some(name) = queue.pop_front() {
                    let mut loader = world
                        .get_resource_mut::<SceneLoader>()
                        .ok_or_else(|| scene_failed(SceneError::LoaderShutDown))?;
                    if loader.is_loaded(&name) {
                        debug!("Scene '{}' already loaded", name);
                        session.step = Step::LoadScenes {
                            queue,
                            in_flight: None,
                        };
                        return Ok(Flow::Continue);
                    }
                    let handle = loader.load_additive(&name).map_err(scene_failed)?;
                    session.step = Step::LoadScenes {
                        queue,
                        in_flight: Some(handle),
                    };
                    return Ok(Flow::Yield);
                }

                world.resource_scope(|world, mut registry: Mut<CameraRegistry>| {
                    registry.rebuild(world);
                });

                let has_shots = session
                    .cutscene
                    .as_ref()
                    .is_some_and(|c| !c.shots.is_empty());
                if has_shots {
                    self.state = PlaybackState::PlayingShot;
                    session.step = Step::BeginShot;
                } else {
                    warn!("Cutscene '{}' has no shots", cutscene_name);
                    events.push(CutsceneEvent::Finished {
                        index: session.index,
                        name: cutscene_name,
                    });
                    session.step = Step::NextCutscene;
                }
                Ok(Flow::Continue)
            }

            Step::BeginShot => {
                let Some(cutscene) = session.cutscene.clone() else {
                    session.step = Step::NextCutscene;
                    return Ok(Flow::Continue);
                };
                let shot = &cutscene.shots[session.shot];
                let last = session.shot + 1 == cutscene.shots.len();
                self.state = PlaybackState::PlayingShot;
                session.shot_unscaled = shot.unscaled_time;
                self.begin_shot(session, world, &cutscene, shot, last, budget, events)?;
                Ok(Flow::Continue)
            }

            Step::Hold { remaining, then } => {
                let unscaled = session.shot_unscaled;
                let used = remaining.min(budget.available(unscaled)).max(0.0);
                budget.consume(used, unscaled);
                session.cutscene_time += used;
                if let Some(shot_events) = session.shot_events.as_mut()
                    && let Some(mut bus) = world.get_resource_mut::<GameEventBus>()
                {
                    shot_events.advance(used, &mut bus);
                }

                let left = remaining - used;
                if left > 0.0 {
                    session.step = Step::Hold {
                        remaining: left,
                        then,
                    };
                    return Ok(Flow::Yield);
                }
                self.finish_hold(session, world, budget, then)?;
                Ok(Flow::Continue)
            }

            Step::EndShot => {
                if let Some(mut shot_events) = session.shot_events.take() {
                    if let Some(mut bus) = world.get_resource_mut::<GameEventBus>() {
                        shot_events.finish(&mut bus);
                    }
                    shot_events.sequencer.stop();
                }
                session.shot += 1;
                let shot_count = session.cutscene.as_ref().map_or(0, |c| c.shots.len());
                session.step = if session.shot < shot_count {
                    Step::BeginShot
                } else {
                    Step::EndCutscene
                };
                Ok(Flow::Continue)
            }

            Step::EndCutscene => {
                reset_cameras(world);
                restore_blend(session, world);

                let name = session.cutscene_name();
                let next_scene = session
                    .cutscene
                    .as_ref()
                    .and_then(|c| c.next_scene().map(str::to_string));

                let Some(next_scene) = next_scene else {
                    info!("Cutscene '{}' finished", name);
                    events.push(CutsceneEvent::Finished {
                        index: session.index,
                        name,
                    });
                    session.step = Step::NextCutscene;
                    return Ok(Flow::Continue);
                };

                self.state = PlaybackState::TransitioningScene;
                if session.preload.is_none()
                    && let Err(err) = begin_preload(session, world, &next_scene)
                {
                    warn!("Preload of '{}' unavailable ({}), loading directly", next_scene, err);
                }

                match session.preload {
                    Some(handle) => {
                        if let Some(mut loader) = world.get_resource_mut::<SceneLoader>() {
                            loader.allow_activation(handle);
                        }
                        debug!("Activation gate opened for '{}'", next_scene);
                        session.step = Step::AwaitNextScene { handle };
                    }
                    None => {
                        load_single_blocking(world, &next_scene).map_err(|source| {
                            PlaybackError::SceneLoad {
                                cutscene: name.clone(),
                                source,
                            }
                        })?;
                        info!("Cutscene '{}' finished, '{}' loaded", name, next_scene);
                        events.push(CutsceneEvent::Finished {
                            index: session.index,
                            name,
                        });
                        session.step = Step::Done;
                    }
                }
                Ok(Flow::Continue)
            }

            Step::AwaitNextScene { handle } => {
                let name = session.cutscene_name();
                let scene_failed = |source: SceneError| PlaybackError::SceneLoad {
                    cutscene: name.clone(),
                    source,
                };
                let mut loader = world
                    .get_resource_mut::<SceneLoader>()
                    .ok_or_else(|| scene_failed(SceneError::LoaderShutDown))?;
                if let Some(err) = loader.failure(handle).cloned() {
                    loader.release(handle);
                    session.preload = None;
                    return Err(scene_failed(err));
                }
                if !loader.is_done(handle) {
                    session.step = Step::AwaitNextScene { handle };
                    return Ok(Flow::Yield);
                }
                loader.release(handle);
                session.preload = None;
                info!("Cutscene '{}' finished with scene transition", name);
                events.push(CutsceneEvent::Finished {
                    index: session.index,
                    name,
                });
                session.step = Step::Done;
                Ok(Flow::Continue)
            }

            Step::NextCutscene => {
                session.index += 1;
                session.cutscene = None;
                session.step = Step::BeginCutscene;
                Ok(Flow::Continue)
            }

            Step::Done => Ok(Flow::Finished),
        }
    }

    fn begin_shot(
        &mut self,
        session: &mut Session,
        world: &mut World,
        cutscene: &Cutscene,
        shot: &Shot,
        last: bool,
        budget: &TickBudget,
        events: &mut Vec<CutsceneEvent>,
    ) -> Result<(), PlaybackError> {
        let length = shot.length();

        if let Some(blend) = shot.blend
            && let Some(mut brain) = world.get_resource_mut::<CameraBrain>()
        {
            if session.saved_blend.is_none() {
                session.saved_blend = Some(brain.default_blend);
            }
            brain.default_blend = BlendDefinition::from_style(blend.style, blend.time);
        }

        let camera = world
            .get_resource::<CameraRegistry>()
            .and_then(|r| r.lookup(&shot.camera_id));
        let Some(camera) = camera else {
            error!(
                "Missing vcam id '{}' (shot {}) in cutscene '{}'",
                shot.camera_id, session.shot, cutscene.name
            );
            events.push(CutsceneEvent::ShotStarted {
                index: session.index,
                shot: session.shot,
                camera_id: shot.camera_id.clone(),
                camera_found: false,
            });
            session.step = Step::Hold {
                remaining: length,
                then: HoldEnd::EndShot,
            };
            return Ok(());
        };

        if let Some(fade_in) = shot.fade_in {
            ensure_screen_fader(world).fade_to_after(
                shot.fade_color.with_alpha(0.0),
                fade_in,
                shot.unscaled_time,
                budget.spent(shot.unscaled_time),
            );
        }

        if let Some(sequence) = &shot.events {
            let source = EventSource::Shot {
                cutscene: session.index,
                shot: session.shot,
            };
            let mut sequencer = EventSequencer::single(Arc::clone(sequence));
            let bus = world.get_resource_or_insert_with(GameEventBus::default);
            sequencer.play(0.0, &mut *bus.into_inner(), source);
            session.shot_events = Some(ShotEvents::new(sequencer, sequence.span(), length, source));
        }

        world.resource_scope(|world, registry: Mut<CameraRegistry>| {
            registry.activate(world, camera, shot.priority_override);
        });
        self.shots_started += 1;
        debug!(
            "Shot {} of '{}' on '{}' for {:.2}s",
            session.shot, cutscene.name, shot.camera_id, length
        );
        events.push(CutsceneEvent::ShotStarted {
            index: session.index,
            shot: session.shot,
            camera_id: shot.camera_id.clone(),
            camera_found: true,
        });

        if last && cutscene.preload_during_last_shot && cutscene.next_scene().is_some() {
            let lead = cutscene.preload_lead_seconds.clamp(0.0, length);
            session.step = Step::Hold {
                remaining: length - lead,
                then: HoldEnd::BeginPreload { lead },
            };
            return Ok(());
        }

        session.step = match shot.fade_out {
            Some(fade_time) if fade_time > 0.0 && fade_time < length => Step::Hold {
                remaining: length - fade_time,
                then: HoldEnd::BeginFadeOut { fade_time },
            },
            Some(fade_time) if fade_time <= 0.0 => Step::Hold {
                remaining: length,
                then: HoldEnd::SnapFadeOut,
            },
            _ => Step::Hold {
                remaining: length,
                then: HoldEnd::EndShot,
            },
        };
        Ok(())
    }

    fn finish_hold(
        &mut self,
        session: &mut Session,
        world: &mut World,
        budget: &TickBudget,
        then: HoldEnd,
    ) -> Result<(), PlaybackError> {
        let fade_color = session
            .cutscene
            .as_ref()
            .and_then(|c| c.shots.get(session.shot))
            .map(|s| s.fade_color)
            .unwrap_or_default();

        session.step = match then {
            HoldEnd::BeginPreload { lead } => {
                let next_scene = session
                    .cutscene
                    .as_ref()
                    .and_then(|c| c.next_scene().map(str::to_string));
                if let Some(next_scene) = next_scene
                    && let Err(err) = begin_preload(session, world, &next_scene)
                {
                    warn!("Could not preload '{}': {}", next_scene, err);
                }
                self.state = PlaybackState::Preloading;
                Step::Hold {
                    remaining: lead,
                    then: HoldEnd::EndShot,
                }
            }
            HoldEnd::BeginFadeOut { fade_time } => {
                ensure_screen_fader(world).fade_to_after(
                    fade_color.with_alpha(1.0),
                    fade_time,
                    session.shot_unscaled,
                    budget.spent(session.shot_unscaled),
                );
                Step::Hold {
                    remaining: fade_time,
                    then: HoldEnd::EndShot,
                }
            }
            HoldEnd::SnapFadeOut => {
                ensure_screen_fader(world).fade_to(fade_color.with_alpha(1.0), 0.0, false);
                Step::EndShot
            }
            HoldEnd::EndShot => Step::EndShot,
        };
        Ok(())
    }
}

enum Flow {
    Continue,
    Yield,
    Finished,
}

/// Start the single-mode preload of `scene` unless one is already running.
fn begin_preload(session: &mut Session, world: &mut World, scene: &str) -> Result<(), SceneError> {
    if session.preload.is_some() {
        return Ok(());
    }
    let mut loader = world
        .get_resource_mut::<SceneLoader>()
        .ok_or(SceneError::LoaderShutDown)?;
    let handle = loader.load_single(scene)?;
    info!(
        "Preloading '{}' at t={:.2}s into the cutscene",
        scene, session.cutscene_time
    );
    session.preload = Some(handle);
    Ok(())
}

fn reset_cameras(world: &mut World) {
    if world.contains_resource::<CameraRegistry>() {
        world.resource_scope(|world, registry: Mut<CameraRegistry>| {
            registry.reset_all(world);
        });
    }
}

fn restore_blend(session: &mut Session, world: &mut World) {
    if let Some(saved) = session.saved_blend.take()
        && let Some(mut brain) = world.get_resource_mut::<CameraBrain>()
    {
        brain.default_blend = saved;
    }
}

/// Tear a session down: stop shot events, cancel pending loads, reset
/// cameras, restore the blend.
fn cleanup(session: &mut Session, world: &mut World) {
    if let Some(mut shot_events) = session.shot_events.take() {
        shot_events.sequencer.stop();
    }
    let mut pending: Vec<SceneLoadHandle> = session.preload.take().into_iter().collect();
    if let Step::LoadScenes {
        in_flight: Some(handle),
        ..
    }
    | Step::AwaitNextScene { handle } = session.step
    {
        pending.push(handle);
    }
    if let Some(mut loader) = world.get_resource_mut::<SceneLoader>() {
        for handle in pending {
            loader.cancel(handle);
        }
    }
    session.step = Step::Done;
    reset_cameras(world);
    restore_blend(session, world);
}

/// Play the player's playlist starting at `from_index` (clamped).
///
/// Tears down any running session first. Needs a [`CameraBrain`] resource;
/// without one this logs an error and does nothing.
pub fn play_playlist(world: &mut World, from_index: usize) {
    if !world.contains_resource::<CameraBrain>() {
        error!("{}", PlaybackError::MissingBrain);
        if let Some(mut player) = world.get_resource_mut::<CutscenePlayer>() {
            player.last_error = Some(PlaybackError::MissingBrain);
        }
        return;
    }
    world.init_resource::<CameraRegistry>();
    world.init_resource::<GameEventBus>();
    world.init_resource::<CutscenePlayer>();

    world.resource_scope(|world, mut player: Mut<CutscenePlayer>| {
        if player.playlist.is_empty() {
            warn!("Cutscene playlist is empty");
            return;
        }
        let index = from_index.min(player.playlist.len() - 1);
        if let Some(mut previous) = player.session.take() {
            debug!("Cancelling running cutscene session");
            cleanup(&mut previous, world);
        }
        info!("Playing cutscene playlist from index {}", index);
        let playlist = player.playlist.clone();
        player.session = Some(Session::new(playlist, index));
        player.current_index = Some(index);
        player.state = PlaybackState::LoadingScenes;
        player.last_error = None;
    });
}

pub fn play_index(world: &mut World, index: usize) {
    play_playlist(world, index);
}

/// Play the entry after the current (or last played) one, clamped to the
/// end of the playlist.
pub fn play_next(world: &mut World) {
    let Some(player) = world.get_resource::<CutscenePlayer>() else {
        return;
    };
    if player.playlist.is_empty() {
        return;
    }
    let next = player
        .current_index
        .map_or(0, |i| i + 1)
        .min(player.playlist.len() - 1);
    play_playlist(world, next);
}

/// Stop playback. Does nothing when idle.
pub fn stop_cutscene(world: &mut World) {
    if !world
        .get_resource::<CutscenePlayer>()
        .is_some_and(CutscenePlayer::is_playing)
    {
        return;
    }
    world.resource_scope(|world, mut player: Mut<CutscenePlayer>| {
        if let Some(mut session) = player.session.take() {
            cleanup(&mut session, world);
        }
        player.current_index = None;
        player.state = PlaybackState::Stopped;
        info!("Cutscene playback stopped");
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_splits_tick_between_modes() {
        let time = WorldTime {
            delta: 0.25,
            unscaled_delta: 0.5,
            ..Default::default()
        };
        let mut budget = TickBudget::new(&time);
        assert_eq!(budget.available(false), 0.25);
        budget.consume(0.125, false);
        assert_eq!(budget.available(true), 0.25);
        budget.consume(0.25, true);
        assert_eq!(budget.available(false), 0.0);
    }

    #[test]
    fn test_shot_events_rate_stretches_span() {
        let mut bus = GameEventBus::new();
        let seq = Arc::new(crate::assets::eventsequence::EventSequence::from_absolute(
            "s",
            vec![crate::assets::eventsequence::TimedEvent::new(2.0, "end")],
        ));
        let mut sequencer = EventSequencer::single(Arc::clone(&seq));
        sequencer.play(0.0, &mut bus, EventSource::Host);
        let mut events = ShotEvents::new(sequencer, seq.span(), 8.0, EventSource::Host);
        assert_eq!(events.rate, 0.25);

        events.advance(4.0, &mut bus);
        assert_eq!(events.sequencer.time_seconds(), 1.0);
        assert_eq!(bus.published_count(), 0);

        events.advance(4.0, &mut bus);
        assert_eq!(bus.published_count(), 1);
    }

    #[test]
    fn test_budget_reports_spent_time() {
        let time = WorldTime {
            delta: 0.75,
            unscaled_delta: 0.75,
            ..Default::default()
        };
        let mut budget = TickBudget::new(&time);
        assert_eq!(budget.spent(false), 0.0);
        budget.consume(0.25, false);
        assert_eq!(budget.spent(false), 0.25);
        assert!((budget.spent(true) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_shot_events_finish_reaches_span() {
        let mut bus = GameEventBus::new();
        let seq = Arc::new(crate::assets::eventsequence::EventSequence::from_absolute(
            "s",
            vec![crate::assets::eventsequence::TimedEvent::new(1.0, "end")],
        ));
        let mut sequencer = EventSequencer::single(Arc::clone(&seq));
        sequencer.play(0.0, &mut bus, EventSource::Host);
        let mut events = ShotEvents::new(sequencer, seq.span(), 1.0, EventSource::Host);

        // Accumulated shot time a hair short of the shot length.
        events.advance(0.999_99, &mut bus);
        assert_eq!(bus.published_count(), 0);

        events.finish(&mut bus);
        assert_eq!(bus.published_count(), 1);
        events.finish(&mut bus);
        assert_eq!(bus.published_count(), 1);
    }

    #[test]
    fn test_play_sets_index_before_first_tick() {
        let mut world = World::new();
        world.insert_resource(CameraBrain::default());
        world.insert_resource(CutscenePlayer::new(vec![
            Some(Arc::new(Cutscene::new("a"))),
            Some(Arc::new(Cutscene::new("b"))),
            Some(Arc::new(Cutscene::new("c"))),
        ]));
        play_playlist(&mut world, 1);
        assert_eq!(world.resource::<CutscenePlayer>().current_playlist_index(), Some(1));

        play_next(&mut world);
        assert_eq!(world.resource::<CutscenePlayer>().current_playlist_index(), Some(2));
    }

    #[test]
    fn test_play_without_brain_records_error() {
        let mut world = World::new();
        world.insert_resource(CutscenePlayer::new(vec![Some(Arc::new(Cutscene::new("a")))]));
        play_playlist(&mut world, 0);
        let player = world.resource::<CutscenePlayer>();
        assert!(!player.is_playing());
        assert_eq!(player.last_error(), Some(&PlaybackError::MissingBrain));
    }

    #[test]
    fn test_stop_when_idle_is_noop() {
        let mut world = World::new();
        world.insert_resource(CutscenePlayer::default());
        stop_cutscene(&mut world);
        assert_eq!(world.resource::<CutscenePlayer>().state(), PlaybackState::Idle);
    }
}
