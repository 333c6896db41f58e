//! Per-frame coordination while the session is active.
//!
//! `OnEnter(Active)` registers exactly one [`FrameCallback`] for the session
//! and `OnExit(Active)` removes it. While it exists, each tick polls the host
//! for one device frame; the tracking, placement, presentation and draw sets
//! then consume that same frame in order.

use bevy::prelude::*;
use bevy::window::WindowResized;

use crate::engine::host::{ArHostResource, HostFrame, SessionHandle};
use crate::engine::session::session_manager::SessionManager;
use crate::tools::input::WorldSelectEvent;

/// Render surface the session is bound to.
#[derive(Component, Default)]
pub struct ArCamera;

/// Frame callback registered for the active session.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameCallback {
    pub session: SessionHandle,
}

/// Device frame delivered this tick, if any.
#[derive(Resource, Default)]
pub struct CurrentFrame {
    frame: Option<HostFrame>,
}

impl CurrentFrame {
    pub fn frame(&self) -> Option<&HostFrame> {
        self.frame.as_ref()
    }
}

#[derive(Resource, Default, Debug, Clone, Copy)]
pub struct FrameStats {
    /// Frames delivered across all sessions.
    pub delivered: u64,
    /// Frames delivered in the current session.
    pub session_frames: u64,
    pub last_timestamp: f64,
}

pub fn register_frame_callback(
    mut commands: Commands,
    manager: Res<SessionManager>,
    mut stats: ResMut<FrameStats>,
) {
    let Some(session) = manager.session_handle() else {
        warn!("Session active without a handle, no frame callback registered");
        return;
    };
    stats.session_frames = 0;
    commands.insert_resource(FrameCallback { session });
    debug!("Frame callback registered for {:?}", session);
}

pub fn deregister_frame_callback(mut commands: Commands, mut frame: ResMut<CurrentFrame>) {
    commands.remove_resource::<FrameCallback>();
    frame.frame = None;
    debug!("Frame callback removed");
}

pub fn deliver_frame(
    callback: Res<FrameCallback>,
    mut host: ResMut<ArHostResource>,
    mut current: ResMut<CurrentFrame>,
    mut stats: ResMut<FrameStats>,
    mut selects: EventWriter<WorldSelectEvent>,
) {
    current.frame = host.host_mut().poll_frame(callback.session);
    let Some(frame) = current.frame.as_ref() else {
        return;
    };

    stats.delivered += 1;
    stats.session_frames += 1;
    stats.last_timestamp = frame.timestamp;

    for _ in 0..frame.selects {
        selects.write(WorldSelectEvent {
            timestamp: frame.timestamp,
        });
    }
}

/// Draw with the frame's camera pose.
pub fn draw_scene(current: Res<CurrentFrame>, mut cameras: Query<&mut Transform, With<ArCamera>>) {
    let Some(frame) = current.frame() else {
        return;
    };
    for mut transform in &mut cameras {
        *transform = frame.viewer_pose.to_transform();
    }
}

/// Keep the host's render size in step with the window.
pub fn forward_surface_resize(
    mut resized: EventReader<WindowResized>,
    mut host: ResMut<ArHostResource>,
) {
    if let Some(event) = resized.read().last() {
        debug!("Render surface resized to {}x{}", event.width, event.height);
        host.host_mut().resize_surface(event.width, event.height);
    }
}
