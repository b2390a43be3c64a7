//! Host-side passes built on the query engine.

use sprig_ecs::{ComponentType, World};

use crate::components::{Ballistic, Inert, Pulse};

/// Step every [`Ballistic`] body. Returns how many were moved.
pub fn move_bodies(world: &mut World, dt: f32) -> usize {
    let bodies = world.query(&[ComponentType::of::<Ballistic>()], &[]);
    let Some(pairs) = world.fetch_mut_with_transforms::<Ballistic>(&bodies) else {
        return 0;
    };
    let moved = pairs.len();
    for (motion, transform) in pairs {
        motion.advance(transform, dt);
    }
    moved
}

/// Rescale every pulsing entity that is not inert. Returns how many changed.
pub fn pulse(world: &mut World, dt: f32) -> usize {
    let pulsing = world.query(
        &[ComponentType::of::<Pulse>()],
        &[ComponentType::of::<Inert>()],
    );
    let Some(pairs) = world.fetch_mut_with_transforms::<Pulse>(&pulsing) else {
        return 0;
    };
    let pulsed = pairs.len();
    for (pulse, transform) in pairs {
        pulse.advance(transform, dt);
    }
    pulsed
}
