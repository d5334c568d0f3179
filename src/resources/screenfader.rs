//! Full-screen fade overlay.
//!
//! [`ScreenFader`] owns the overlay colour a renderer would draw on top of
//! everything. It is created on first use with [`ensure_screen_fader`] and is
//! a plain resource, so it survives scene loads.
//!
//! Every [`ScreenFader::fade_to`] call starts an independent fade task that
//! captures the overlay colour at call time and interpolates toward its
//! target. Overlapping tasks are not cancelled: they all run to completion
//! and [`screen_fader_system`](crate::systems::screenfader::screen_fader_system)
//! applies them in creation order, so the most recently started fade is the
//! one visible on any tick where several are running.

use bevy_ecs::prelude::*;
use log::debug;

use crate::color::Rgba;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FadeTask {
    pub start: Rgba,
    pub target: Rgba,
    pub duration: f32,
    pub elapsed: f32,
    pub unscaled: bool,
}

impl FadeTask {
    fn is_done(&self) -> bool {
        self.elapsed >= self.duration
    }

    fn color(&self) -> Rgba {
        self.start.lerp(self.target, (self.elapsed / self.duration).max(0.0))
    }
}

#[derive(Resource, Debug, Clone)]
pub struct ScreenFader {
    overlay: Rgba,
    tasks: Vec<FadeTask>,
}

impl Default for ScreenFader {
    fn default() -> Self {
        Self {
            overlay: Rgba::TRANSPARENT,
            tasks: Vec::new(),
        }
    }
}

impl ScreenFader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fade the overlay from its current colour to `target`.
    ///
    /// A non-positive `duration` snaps immediately.
    pub fn fade_to(&mut self, target: Rgba, duration: f32, unscaled: bool) {
        self.fade_to_after(target, duration, unscaled, 0.0);
    }

    /// Like [`fade_to`](Self::fade_to), but the first `delay` seconds of
    /// advance are swallowed before the fade moves.
    ///
    /// Used for fades that start partway through a tick the fader has not
    /// advanced yet.
    pub fn fade_to_after(&mut self, target: Rgba, duration: f32, unscaled: bool, delay: f32) {
        if duration <= 0.0 {
            self.overlay = target;
            return;
        }
        debug!(
            "ScreenFader: fade to {:?} over {:.2}s ({} already running)",
            target,
            duration,
            self.tasks.len()
        );
        self.tasks.push(FadeTask {
            start: self.overlay,
            target,
            duration,
            elapsed: -delay.max(0.0),
            unscaled,
        });
    }

    /// Advance every running fade. Completed tasks write their exact target.
    pub fn advance(&mut self, scaled_dt: f32, unscaled_dt: f32) {
        for task in self.tasks.iter_mut() {
            task.elapsed += if task.unscaled { unscaled_dt } else { scaled_dt };
            self.overlay = if task.is_done() {
                task.target
            } else {
                task.color()
            };
        }
        self.tasks.retain(|task| !task.is_done());
    }

    pub fn overlay(&self) -> Rgba {
        self.overlay
    }

    pub fn is_fading(&self) -> bool {
        !self.tasks.is_empty()
    }

    pub fn active_fades(&self) -> usize {
        self.tasks.len()
    }
}

/// Return the fader, inserting a transparent one on first use.
pub fn ensure_screen_fader(world: &mut World) -> Mut<'_, ScreenFader> {
    world.get_resource_or_insert_with(ScreenFader::default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_transparent() {
        assert_eq!(ScreenFader::new().overlay(), Rgba::TRANSPARENT);
    }

    #[test]
    fn test_zero_duration_snaps() {
        let mut fader = ScreenFader::new();
        fader.fade_to(Rgba::WHITE, 0.0, false);
        assert_eq!(fader.overlay(), Rgba::WHITE);
        assert!(!fader.is_fading());
    }

    #[test]
    fn test_fade_interpolates_from_current_colour() {
        let mut fader = ScreenFader::new();
        fader.fade_to(Rgba::BLACK, 1.0, false);
        fader.advance(0.5, 0.5);
        assert_eq!(fader.overlay().a, 0.5);
        fader.advance(0.5, 0.5);
        assert_eq!(fader.overlay(), Rgba::BLACK);
        assert!(!fader.is_fading());
    }

    #[test]
    fn test_unscaled_fade_ignores_scaled_delta() {
        let mut fader = ScreenFader::new();
        fader.fade_to(Rgba::BLACK, 1.0, true);
        fader.advance(0.0, 0.25);
        assert_eq!(fader.overlay().a, 0.25);
    }

    #[test]
    fn test_latest_fade_wins_while_overlapping() {
        let mut fader = ScreenFader::new();
        fader.fade_to(Rgba::BLACK, 2.0, false);
        fader.advance(0.5, 0.5);
        fader.fade_to(Rgba::WHITE, 0.5, false);
        fader.advance(0.5, 0.5);
        assert_eq!(fader.overlay(), Rgba::WHITE);
        assert_eq!(fader.active_fades(), 1);

        // The older fade is still running and takes over again once alone.
        fader.advance(0.5, 0.5);
        assert_eq!(fader.overlay().a, 0.75);
    }

    #[test]
    fn test_delayed_fade_swallows_part_of_first_advance() {
        let mut fader = ScreenFader::new();
        fader.fade_to_after(Rgba::BLACK, 1.0, false, 0.25);
        fader.advance(0.75, 0.75);
        assert_eq!(fader.overlay().a, 0.5);
        fader.advance(0.5, 0.5);
        assert_eq!(fader.overlay(), Rgba::BLACK);
        assert!(!fader.is_fading());
    }

    #[test]
    fn test_ensure_inserts_once() {
        let mut world = World::new();
        ensure_screen_fader(&mut world).fade_to(Rgba::WHITE, 0.0, false);
        assert_eq!(ensure_screen_fader(&mut world).overlay(), Rgba::WHITE);
    }
}
