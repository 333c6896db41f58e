use bevy::prelude::*;
use bevy::state::state::StateTransitionEvent;
use serde::Serialize;

use crate::engine::core::app_state::SessionState;
use crate::engine::core::config::ArConfig;
use crate::engine::scene::frame_loop::FrameStats;
use crate::engine::session::capability::SupportChecked;
use crate::engine::tracking::pose::TrackedPose;
use crate::error::{ArError, ArErrorEvent};
use crate::rpc::web_rpc::WebRpcInterface;
use crate::tools::placement::state::PlacedObjects;

/// What the UI boundary renders its chrome from.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ArUiStatus {
    pub tracking_state: bool,
    pub placed_count: usize,
    /// Session active with its render surface bound.
    pub ready: bool,
}

/// Persistent, dismissable user-facing error.
#[derive(Resource, Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorBanner {
    message: Option<String>,
    kind: Option<&'static str>,
}

impl ErrorBanner {
    pub fn show(&mut self, error: &ArError) {
        self.message = Some(error.to_string());
        self.kind = Some(error.kind());
    }

    pub fn dismiss(&mut self) {
        self.message = None;
        self.kind = None;
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn kind(&self) -> Option<&'static str> {
        self.kind
    }

    pub fn is_visible(&self) -> bool {
        self.message.is_some()
    }
}

/// Request to hide the error banner.
#[derive(Event, Debug, Clone, Copy, Default)]
pub struct DismissError;

/// Errors collected before the app ran, reported on the first tick.
#[derive(Resource, Debug, Default)]
pub struct StartupErrors(pub Vec<ArError>);

pub fn report_startup_errors(
    mut startup: ResMut<StartupErrors>,
    mut errors: EventWriter<ArErrorEvent>,
) {
    for error in startup.0.drain(..) {
        errors.write(ArErrorEvent(error));
    }
}

/// Single sink for every engine error.
pub fn report_errors(
    mut events: EventReader<ArErrorEvent>,
    mut banner: ResMut<ErrorBanner>,
    mut rpc_interface: ResMut<WebRpcInterface>,
) {
    for ArErrorEvent(error) in events.read() {
        match error {
            ArError::TeardownRace => {
                debug!("{}", error);
                continue;
            }
            ArError::ProbeAcquisitionFailed(_) => warn!("{}", error),
            _ if error.is_fatal() => error!("Fatal: {}", error),
            _ => error!("{}", error),
        }

        if error.is_user_visible() {
            banner.show(error);
        }

        rpc_interface.send_notification(
            "ar_error",
            serde_json::json!({
                "kind": error.kind(),
                "message": error.to_string(),
                "user_visible": error.is_user_visible(),
                "retryable": error.is_retryable(),
                "fatal": error.is_fatal(),
            }),
        );
    }
}

pub fn dismiss_error_banner(mut events: EventReader<DismissError>, mut banner: ResMut<ErrorBanner>) {
    if events.read().count() > 0 && banner.is_visible() {
        info!("Error banner dismissed");
        banner.dismiss();
    }
}

pub fn update_ui_status(
    tracked: Res<TrackedPose>,
    placed: Res<PlacedObjects>,
    state: Res<State<SessionState>>,
    mut status: ResMut<ArUiStatus>,
) {
    let active = *state.get() == SessionState::Active;
    status.set_if_neq(ArUiStatus {
        tracking_state: active && tracked.is_tracked(),
        placed_count: placed.len(),
        ready: active,
    });
}

pub fn publish_ui_status(
    status: Res<ArUiStatus>,
    config: Res<ArConfig>,
    mut rpc_interface: ResMut<WebRpcInterface>,
) {
    if !status.is_changed() || !config.status_notifications {
        return;
    }
    match serde_json::to_value(*status) {
        Ok(params) => rpc_interface.send_notification("ar_status", params),
        Err(e) => error!("Failed to serialise status: {}", e),
    }
}

pub fn notify_session_state(
    mut transitions: EventReader<StateTransitionEvent<SessionState>>,
    mut rpc_interface: ResMut<WebRpcInterface>,
) {
    for transition in transitions.read() {
        if let Some(entered) = transition.entered {
            rpc_interface.send_notification(
                "session_state",
                serde_json::json!({ "state": entered.as_str() }),
            );
        }
    }
}

pub fn notify_support_result(
    mut checked: EventReader<SupportChecked>,
    mut rpc_interface: ResMut<WebRpcInterface>,
) {
    for SupportChecked(result) in checked.read() {
        match serde_json::to_value(result) {
            Ok(params) => rpc_interface.send_notification("ar_support", params),
            Err(e) => error!("Failed to serialise support result: {}", e),
        }
    }
}

pub fn frame_stats_notification_system(
    mut rpc_interface: ResMut<WebRpcInterface>,
    stats: Res<FrameStats>,
    state: Res<State<SessionState>>,
    mut last_send: Local<(f32, u64)>,
    time: Res<Time>,
) {
    let current_time = time.elapsed_secs();
    let elapsed = current_time - last_send.0;

    // Send device frame rate every 0.5 seconds while active
    if *state.get() != SessionState::Active || elapsed < 0.5 {
        return;
    }
    let frames = stats.delivered.saturating_sub(last_send.1);
    rpc_interface.send_notification(
        "frame_stats",
        serde_json::json!({
            "device_fps": frames as f32 / elapsed,
            "session_frames": stats.session_frames,
        }),
    );
    *last_send = (current_time, stats.delivered);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn banner_keeps_kind_until_dismissed() {
        let mut banner = ErrorBanner::default();
        banner.show(&ArError::SessionRequestFailed("busy".into()));
        assert_eq!(banner.kind(), Some("session_request_failed"));
        assert!(banner.message().unwrap().contains("busy"));
        banner.dismiss();
        assert!(!banner.is_visible());
    }

    #[test]
    fn status_serialises_with_ui_field_names() {
        let status = ArUiStatus {
            tracking_state: true,
            placed_count: 2,
            ready: true,
        };
        let json = serde_json::to_value(status).unwrap();
        assert_eq!(json["tracking_state"], true);
        assert_eq!(json["placed_count"], 2);
        assert_eq!(json["ready"], true);
    }
}
