//! Status reporting towards the UI boundary.
//!
//! Collects every engine error into one reporting system, keeps the
//! `{tracking_state, placed_count, ready}` status current and pushes both to
//! the frontend as RPC notifications.

/// Error reporting, UI status and frontend notifications.
pub mod status_tracking;

use bevy::prelude::*;

use crate::engine::core::app_state::{ArSystemSet, log_session_state_change};
use status_tracking::{
    ArUiStatus, DismissError, ErrorBanner, StartupErrors, dismiss_error_banner,
    frame_stats_notification_system, notify_session_state, notify_support_result,
    publish_ui_status, report_errors, report_startup_errors, update_ui_status,
};

pub struct StatusPlugin;

impl Plugin for StatusPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ArUiStatus>()
            .init_resource::<ErrorBanner>()
            .init_resource::<StartupErrors>()
            .add_event::<DismissError>()
            .add_systems(Startup, report_startup_errors)
            .add_systems(
                Update,
                (
                    log_session_state_change,
                    notify_session_state,
                    notify_support_result,
                    report_errors,
                    dismiss_error_banner,
                    update_ui_status,
                    publish_ui_status,
                    frame_stats_notification_system,
                )
                    .chain()
                    .in_set(ArSystemSet::Status),
            );
    }
}
