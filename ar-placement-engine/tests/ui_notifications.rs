use ar_placement_engine::engine::core::app_state::SessionState;
use ar_placement_engine::engine::session::session_manager::SessionCommand;
use ar_placement_engine::engine::systems::status_tracking::{DismissError, ErrorBanner};
use ar_placement_engine::rpc::web_rpc::IncomingRpcMessage;
use ar_placement_engine::test_utils::*;
use ar_placement_engine::tools::tool_manager::{CommandSource, PlacementAction};
use bevy::prelude::*;

fn log(app: &App) -> &NotificationLog {
    app.world().resource::<NotificationLog>()
}

fn fail_session_start(app: &mut App) {
    send_session_command(app, SessionCommand::Start);
    assert!(run_until(app, 10, |app| {
        session_state(app) == SessionState::Idle && !error_kinds(app).is_empty()
    }));
}

#[test]
fn session_start_announces_states_and_ready_status() {
    let (mut app, _host) = headless_app();
    record_notifications(&mut app);

    assert!(start_tracked_session(&mut app));
    run_frames(&mut app, 1);

    let states = log(&app).session_states();
    let requesting = states.iter().position(|s| s == "requesting");
    let active = states.iter().position(|s| s == "active");
    assert!(requesting.is_some());
    assert!(requesting < active);

    let statuses = log(&app).params("ar_status");
    assert!(statuses.iter().any(|s| s["ready"] == true));
    assert!(statuses.iter().any(|s| s["tracking_state"] == true));
}

#[test]
fn placement_and_stop_update_the_status() {
    let (mut app, _host) = headless_app();
    record_notifications(&mut app);
    assert!(start_tracked_session(&mut app));

    send_placement(&mut app, PlacementAction::Place, CommandSource::Keyboard);
    run_frames(&mut app, 1);
    assert!(log(&app).params("ar_status").iter().any(|s| s["placed_count"] == 1));

    assert!(stop_session(&mut app));
    run_frames(&mut app, 1);

    let last = log(&app).params("ar_status").last().copied().cloned();
    let last = last.expect("status published after stop");
    assert_eq!(last["ready"], false);
    assert_eq!(last["tracking_state"], false);
    assert_eq!(last["placed_count"], 0);
    assert_eq!(log(&app).session_states().last().map(String::as_str), Some("idle"));
}

#[test]
fn failed_session_reports_a_visible_error_until_dismissed() {
    let (mut app, host) = headless_app();
    record_notifications(&mut app);
    record_errors(&mut app);
    host.fail_next_session_requests(2);

    fail_session_start(&mut app);

    let errors = log(&app).params("ar_error");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["kind"], "session_request_failed");
    assert_eq!(errors[0]["user_visible"], true);
    assert_eq!(errors[0]["retryable"], true);
    assert_eq!(errors[0]["fatal"], false);
    assert!(app.world().resource::<ErrorBanner>().is_visible());

    app.world_mut().send_event(DismissError);
    run_frames(&mut app, 1);
    assert!(!app.world().resource::<ErrorBanner>().is_visible());
}

#[test]
fn dismiss_error_request_from_the_page_clears_the_banner() {
    let (mut app, host) = headless_app();
    record_errors(&mut app);
    host.fail_next_session_requests(2);
    fail_session_start(&mut app);
    assert!(app.world().resource::<ErrorBanner>().is_visible());

    app.world_mut().send_event(IncomingRpcMessage {
        content: r#"{"jsonrpc":"2.0","method":"dismiss_error","id":1}"#.to_string(),
    });
    run_frames(&mut app, 1);
    assert!(!app.world().resource::<ErrorBanner>().is_visible());
}

#[test]
fn unbound_surface_is_reported_as_fatal_without_a_banner() {
    let (mut app, _host) = headless_app_without_surface();
    record_notifications(&mut app);
    record_errors(&mut app);

    fail_session_start(&mut app);

    let errors = log(&app).params("ar_error");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["kind"], "render_surface_unbound");
    assert_eq!(errors[0]["user_visible"], false);
    assert_eq!(errors[0]["fatal"], true);
    assert!(!app.world().resource::<ErrorBanner>().is_visible());
}
