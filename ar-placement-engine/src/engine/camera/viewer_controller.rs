use bevy::input::mouse::MouseMotion;
use bevy::math::EulerRot;
use bevy::prelude::*;

use crate::engine::host::simulated::SimulatedHostControl;
use crate::engine::tracking::pose::Pose;

const YAW_SENSITIVITY: f32 = 0.0035;
const PITCH_SENSITIVITY: f32 = 0.0030;
const PITCH_LIMIT: f32 = 1.55;
const WALK_SPEED: f32 = 1.2;

/// Simulated device pose, in the local reference space.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct SimulatedViewer {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
}

impl Default for SimulatedViewer {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            yaw: 0.0,
            pitch: -std::f32::consts::FRAC_PI_4,
        }
    }
}

impl SimulatedViewer {
    pub fn rotation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, 0.0)
    }

    pub fn pose(&self) -> Pose {
        Pose::from_rotation_translation(self.rotation(), self.position)
    }

    /// Apply a look delta in pixels. Pitch is clamped short of vertical.
    pub fn look(&mut self, delta: Vec2) {
        self.yaw += -delta.x * YAW_SENSITIVITY;
        self.pitch = (self.pitch - delta.y * PITCH_SENSITIVITY).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Walk relative to the current heading; `input.y` moves vertically.
    pub fn walk(&mut self, input: Vec3, distance: f32) {
        if input == Vec3::ZERO {
            return;
        }
        let heading = Quat::from_rotation_y(self.yaw);
        let forward = heading * Vec3::NEG_Z;
        let right = heading * Vec3::X;
        let delta = right * input.x + Vec3::Y * input.y - forward * input.z;
        self.position += delta.normalize() * distance;
    }
}

/// WASD/QE walks, right-drag looks. The result is pushed to the simulated host.
pub fn viewer_controller(
    mut viewer: ResMut<SimulatedViewer>,
    control: Option<Res<SimulatedHostControl>>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    mut mouse_motion: EventReader<MouseMotion>,
    keyboard: Res<ButtonInput<KeyCode>>,
    time: Res<Time>,
) {
    let Some(control) = control else {
        return;
    };

    let mouse_delta: Vec2 = mouse_motion.read().map(|m| m.delta).sum();
    if mouse_button.pressed(MouseButton::Right) && mouse_delta != Vec2::ZERO {
        viewer.look(mouse_delta);
    }

    let mut move_input = Vec3::ZERO;
    if keyboard.pressed(KeyCode::KeyW) { move_input.z -= 1.0; }
    if keyboard.pressed(KeyCode::KeyS) { move_input.z += 1.0; }
    if keyboard.pressed(KeyCode::KeyD) { move_input.x += 1.0; }
    if keyboard.pressed(KeyCode::KeyA) { move_input.x -= 1.0; }
    if keyboard.pressed(KeyCode::KeyE) { move_input.y += 1.0; } // Up
    if keyboard.pressed(KeyCode::KeyQ) { move_input.y -= 1.0; } // Down

    if move_input != Vec3::ZERO {
        let mut speed = WALK_SPEED;
        if keyboard.any_pressed([KeyCode::ShiftLeft, KeyCode::ShiftRight]) { speed *= 3.5; }
        viewer.walk(move_input, speed * time.delta_secs());
    }

    if viewer.is_changed() {
        control.0.set_viewer(viewer.pose());
    }
}
