use bevy::prelude::*;
use constants::render_settings::{
    OBJECT_BOB_AMPLITUDE, OBJECT_BOB_RATE, OBJECT_SCALE_IN_SECS, OBJECT_SPIN_RATE,
};

use crate::engine::core::config::ArConfig;

/// Render-only motion of a placed object around its resting transform.
#[derive(Component, Debug, Clone, Copy)]
pub struct PlacedMotion {
    pub rest: Transform,
    pub spawned_secs: f32,
    /// Bob phase, so neighbouring objects don't move in lockstep.
    pub phase: f32,
}

impl PlacedMotion {
    pub fn transform_at(&self, elapsed_secs: f32) -> Transform {
        let age = (elapsed_secs - self.spawned_secs).max(0.0);
        let bob = OBJECT_BOB_AMPLITUDE * (elapsed_secs * OBJECT_BOB_RATE + self.phase).sin();
        Transform {
            translation: self.rest.translation + Vec3::Y * bob,
            rotation: Quat::from_rotation_y(age * OBJECT_SPIN_RATE) * self.rest.rotation,
            scale: self.rest.scale * (age / OBJECT_SCALE_IN_SECS).min(1.0),
        }
    }
}

pub fn animate_placed_objects(
    time: Res<Time>,
    config: Res<ArConfig>,
    mut objects: Query<(&PlacedMotion, &mut Transform)>,
) {
    if !config.object_motion {
        return;
    }
    let now = time.elapsed_secs();
    for (motion, mut transform) in &mut objects {
        *transform = motion.transform_at(now);
    }
}
