use bevy::prelude::*;
use constants::render_settings::{
    POINTER_COLOUR, POINTER_RADIUS, RETICLE_COLOUR, RETICLE_INNER_RADIUS, RETICLE_OUTER_RADIUS,
    RETICLE_PULSE_AMPLITUDE, RETICLE_PULSE_RATE,
};

use crate::engine::core::app_state::SessionState;
use crate::engine::core::config::ArConfig;
use crate::engine::scene::frame_loop::CurrentFrame;
use crate::engine::tracking::pose::TrackedPose;

/// Ring marking the tracked surface point.
#[derive(Component)]
pub struct Reticle;

/// Small sphere above the reticle at the viewer's height.
#[derive(Component)]
pub struct Pointer;

pub fn reticle_pulse_scale(elapsed_secs: f32) -> f32 {
    1.0 + RETICLE_PULSE_AMPLITUDE * (elapsed_secs * RETICLE_PULSE_RATE).sin()
}

pub fn spawn_reticle(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    // Ring lies flat in the pose's XZ plane.
    let ring = Mesh::from(Annulus::new(RETICLE_INNER_RADIUS, RETICLE_OUTER_RADIUS))
        .rotated_by(Quat::from_rotation_x(-std::f32::consts::FRAC_PI_2));

    commands.spawn((
        Reticle,
        Name::new("Reticle"),
        Mesh3d(meshes.add(ring)),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: RETICLE_COLOUR,
            alpha_mode: AlphaMode::Blend,
            unlit: true,
            cull_mode: None,
            ..default()
        })),
        Transform::default(),
        Visibility::Hidden,
    ));

    commands.spawn((
        Pointer,
        Name::new("Pointer"),
        Mesh3d(meshes.add(Sphere::new(POINTER_RADIUS))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: POINTER_COLOUR,
            unlit: true,
            ..default()
        })),
        Transform::default(),
        Visibility::Hidden,
    ));
}

/// Project the tracked pose onto the reticle and pointer.
///
/// Hidden whenever the session is not active or the last frame had no hit.
pub fn present_reticle(
    tracked: Res<TrackedPose>,
    state: Res<State<SessionState>>,
    current: Res<CurrentFrame>,
    config: Res<ArConfig>,
    time: Res<Time>,
    mut reticles: Query<(&mut Transform, &mut Visibility), (With<Reticle>, Without<Pointer>)>,
    mut pointers: Query<(&mut Transform, &mut Visibility), (With<Pointer>, Without<Reticle>)>,
) {
    let pose = tracked
        .pose()
        .filter(|_| *state.get() == SessionState::Active);

    let Some(pose) = pose else {
        for (_, mut visibility) in reticles.iter_mut().chain(pointers.iter_mut()) {
            visibility.set_if_neq(Visibility::Hidden);
        }
        return;
    };

    let scale = if config.reticle_pulse {
        reticle_pulse_scale(time.elapsed_secs())
    } else {
        1.0
    };

    for (mut transform, mut visibility) in &mut reticles {
        *transform = pose.to_transform().with_scale(Vec3::splat(scale));
        visibility.set_if_neq(Visibility::Visible);
    }

    let target = pose.translation();
    let viewer_height = current
        .frame()
        .map(|frame| frame.viewer_pose.translation().y)
        .unwrap_or(target.y);
    for (mut transform, mut visibility) in &mut pointers {
        transform.translation = Vec3::new(target.x, viewer_height, target.z);
        visibility.set_if_neq(Visibility::Visible);
    }
}

pub fn hide_reticle(mut visibilities: Query<&mut Visibility, Or<(With<Reticle>, With<Pointer>)>>) {
    for mut visibility in &mut visibilities {
        visibility.set_if_neq(Visibility::Hidden);
    }
}
