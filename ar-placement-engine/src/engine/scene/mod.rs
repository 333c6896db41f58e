//! Scene presentation and the per-frame render loop.
//!
//! Registers the frame callback for the active session, delivers one host
//! frame per tick, presents the reticle and pointer from the tracked pose and
//! draws with the frame's camera pose.

/// Frame callback registration, frame delivery and camera draw.
pub mod frame_loop;

/// Reticle and pointer presentation.
pub mod reticle;

/// Line grids over the simulated surface planes.
pub mod surface_grid;

use bevy::prelude::*;
use bevy::window::WindowResized;

use crate::engine::core::app_state::{ArSystemSet, SessionState};
use frame_loop::{
    CurrentFrame, FrameCallback, FrameStats, deliver_frame, deregister_frame_callback,
    draw_scene, forward_surface_resize, register_frame_callback,
};
use reticle::{hide_reticle, present_reticle, spawn_reticle};

pub struct ScenePlugin;

impl Plugin for ScenePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CurrentFrame>()
            .init_resource::<FrameStats>()
            .add_event::<WindowResized>()
            .add_systems(Startup, spawn_reticle)
            .add_systems(OnEnter(SessionState::Active), register_frame_callback)
            .add_systems(OnExit(SessionState::Active), deregister_frame_callback)
            .add_systems(OnEnter(SessionState::Idle), hide_reticle)
            .add_systems(
                Update,
                deliver_frame
                    .run_if(resource_exists::<FrameCallback>)
                    .in_set(ArSystemSet::FrameDelivery),
            )
            .add_systems(Update, forward_surface_resize.in_set(ArSystemSet::UiCommands))
            .add_systems(Update, present_reticle.in_set(ArSystemSet::Presentation))
            .add_systems(
                Update,
                draw_scene
                    .run_if(resource_exists::<FrameCallback>)
                    .in_set(ArSystemSet::Draw),
            );
    }
}
