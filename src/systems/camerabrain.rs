//! Camera brain system.
//!
//! Picks the live [`VirtualCamera`] each tick (highest priority, ties go to the
//! lowest entity) and progresses the blend toward it. Blends use
//! [`CameraBrain::default_blend`](crate::resources::camerabrain::CameraBrain)
//! as it is at the moment the live camera changes.

use std::cmp::Reverse;

use bevy_ecs::prelude::*;
use log::debug;

use crate::components::virtualcamera::VirtualCamera;
use crate::resources::camerabrain::{ActiveBlend, BlendCurve, CameraBrain};
use crate::resources::worldtime::WorldTime;

/// Apply a blend curve to a normalized time value.
///
/// The input `t` is clamped to [0.0, 1.0]. `Cut` jumps straight to 1.0.
pub(crate) fn ease(curve: BlendCurve, t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    match curve {
        BlendCurve::Cut => 1.0,
        BlendCurve::Linear => t,
        BlendCurve::EaseIn => t * t * t,
        BlendCurve::EaseOut => {
            let p = t - 1.0;
            p * p * p + 1.0
        }
        BlendCurve::EaseInOut => {
            if t < 0.5 {
                4.0 * t * t * t
            } else {
                let p = 2.0 * t - 2.0;
                0.5 * p * p * p + 1.0
            }
        }
    }
}

/// Follow the highest-priority camera and advance the current blend.
pub fn camera_brain_system(
    time: Res<WorldTime>,
    mut brain: ResMut<CameraBrain>,
    cameras: Query<(Entity, &VirtualCamera)>,
) {
    let best = cameras
        .iter()
        .max_by_key(|(entity, cam)| (cam.priority, Reverse(*entity)))
        .map(|(entity, _)| entity);

    if best != brain.live {
        let definition = brain.default_blend;
        brain.blend = match (brain.live, best) {
            (Some(from), Some(to)) if !definition.is_cut() => Some(ActiveBlend {
                from,
                to,
                definition,
                elapsed: 0.0,
            }),
            _ => None,
        };
        if let Some(to) = best
            && let Ok((_, cam)) = cameras.get(to)
        {
            debug!(
                "CameraBrain: live -> '{}' ({:?}, {:.2}s)",
                cam.name, definition.curve, definition.time
            );
        }
        brain.live = best;
        brain.switches += 1;
        return;
    }

    if let Some(blend) = brain.blend.as_mut() {
        blend.elapsed += time.delta;
        if blend.is_complete() {
            brain.blend = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::camerabrain::BlendDefinition;
    use crate::systems::time::update_world_time;

    const EPSILON: f32 = 1e-6;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    fn make_world(blend: BlendDefinition) -> World {
        let mut world = World::new();
        world.insert_resource(WorldTime::default());
        world.insert_resource(CameraBrain::new(blend));
        world
    }

    fn tick(world: &mut World, dt: f32) {
        update_world_time(world, dt);
        let mut schedule = Schedule::default();
        schedule.add_systems(camera_brain_system);
        schedule.run(world);
    }

    #[test]
    fn test_ease_endpoints() {
        for curve in [
            BlendCurve::Linear,
            BlendCurve::EaseIn,
            BlendCurve::EaseOut,
            BlendCurve::EaseInOut,
        ] {
            assert!(approx_eq(ease(curve, 0.0), 0.0), "{curve:?} at 0");
            assert!(approx_eq(ease(curve, 1.0), 1.0), "{curve:?} at 1");
        }
        assert!(approx_eq(ease(BlendCurve::EaseInOut, 0.5), 0.5));
        assert_eq!(ease(BlendCurve::Cut, 0.0), 1.0);
    }

    #[test]
    fn test_highest_priority_wins_ties_to_lowest_entity() {
        let mut world = make_world(BlendDefinition::cut());
        let a = world.spawn(VirtualCamera::new("a", 10)).id();
        let _b = world.spawn(VirtualCamera::new("b", 10)).id();
        world.spawn(VirtualCamera::new("c", 1));

        tick(&mut world, 0.5);
        assert_eq!(world.resource::<CameraBrain>().live_camera(), Some(a));
    }

    #[test]
    fn test_switch_blends_then_completes() {
        let mut world = make_world(BlendDefinition::new(BlendCurve::Linear, 1.0));
        let a = world.spawn(VirtualCamera::new("a", 10)).id();
        let b = world.spawn(VirtualCamera::new("b", 0)).id();
        tick(&mut world, 0.5);
        assert!(!world.resource::<CameraBrain>().is_blending());

        world.get_mut::<VirtualCamera>(b).unwrap().priority = 20;
        tick(&mut world, 0.5);
        {
            let brain = world.resource::<CameraBrain>();
            let blend = brain.active_blend().unwrap();
            assert_eq!((blend.from, blend.to), (a, b));
            assert_eq!(brain.live_camera(), Some(b));
        }

        tick(&mut world, 0.5);
        assert!(approx_eq(
            world.resource::<CameraBrain>().active_blend().unwrap().weight(),
            0.5
        ));
        tick(&mut world, 0.5);
        assert!(!world.resource::<CameraBrain>().is_blending());
        assert_eq!(world.resource::<CameraBrain>().switch_count(), 2);
    }

    #[test]
    fn test_cut_switches_without_blend() {
        let mut world = make_world(BlendDefinition::cut());
        world.spawn(VirtualCamera::new("a", 10));
        let b = world.spawn(VirtualCamera::new("b", 0)).id();
        tick(&mut world, 0.5);
        world.get_mut::<VirtualCamera>(b).unwrap().priority = 20;
        tick(&mut world, 0.5);
        let brain = world.resource::<CameraBrain>();
        assert_eq!(brain.live_camera(), Some(b));
        assert!(!brain.is_blending());
    }
}
