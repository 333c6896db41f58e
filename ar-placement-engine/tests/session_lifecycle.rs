use ar_placement_engine::engine::core::app_state::SessionState;
use ar_placement_engine::engine::host::simulated::SimulatedHost;
use ar_placement_engine::engine::session::session_manager::{SessionCommand, SessionManager};
use ar_placement_engine::engine::systems::status_tracking::{ArUiStatus, ErrorBanner};
use ar_placement_engine::engine::tracking::hit_test::{HitTestTracker, ProbeCreationState};
use ar_placement_engine::error::HostError;
use ar_placement_engine::test_utils::*;
use ar_placement_engine::tools::tool_manager::{CommandSource, PlacementAction};
use bevy::prelude::*;
use bevy::window::WindowResized;
use constants::session::MAX_ORPHANED_ACQUISITIONS;
use proptest::prelude::*;

fn probe_state(app: &App) -> ProbeCreationState {
    app.world().resource::<HitTestTracker>().creation_state()
}

#[test]
fn start_reaches_active_and_tracks_the_floor() {
    let (mut app, host) = headless_app();
    assert!(start_tracked_session(&mut app));

    let status = *app.world().resource::<ArUiStatus>();
    assert!(status.ready);
    assert!(status.tracking_state);
    assert_eq!(status.placed_count, 0);
    assert_eq!(host.running_session_count(), 1);
    assert_eq!(host.probe_requests(), 1);
    assert_eq!(probe_state(&app), ProbeCreationState::Ready);
}

#[test]
fn stop_returns_to_idle_and_releases_everything() {
    let (mut app, host) = headless_app();
    assert!(start_tracked_session(&mut app));
    host.tap();
    run_frames(&mut app, 2);
    assert_eq!(placed_count(&app), 1);

    assert!(stop_session(&mut app));

    assert!(!is_tracked(&app));
    assert_eq!(placed_count(&app), 0);
    assert_eq!(host.running_session_count(), 0);
    assert_eq!(host.live_probe_count(), 0);
    assert_eq!(probe_state(&app), ProbeCreationState::Unrequested);
    assert!(app.world().resource::<SessionManager>().active_session().is_none());
}

#[test]
fn stop_while_idle_is_a_no_op() {
    let (mut app, host) = headless_app();
    run_frames(&mut app, 1);
    send_session_command(&mut app, SessionCommand::Stop);
    run_frames(&mut app, 3);
    assert_eq!(session_state(&app), SessionState::Idle);
    assert!(host.session_requests().is_empty());
}

#[test]
fn second_session_acquires_a_fresh_probe() {
    let (mut app, host) = headless_app();
    assert!(start_tracked_session(&mut app));
    assert!(stop_session(&mut app));
    assert!(start_tracked_session(&mut app));

    assert_eq!(host.probe_requests(), 2);
    assert_eq!(host.live_probe_count(), 1);
}

#[test]
fn failed_request_is_retried_with_required_features_only() {
    let (mut app, host) = headless_app();
    record_errors(&mut app);
    host.fail_next_session_requests(1);

    assert!(start_tracked_session(&mut app));

    let requests = host.session_requests();
    assert_eq!(requests.len(), 2);
    assert!(!requests[0].optional_features.is_empty());
    assert!(requests[1].optional_features.is_empty());
    assert_eq!(requests[1].required_features, requests[0].required_features);
    assert!(error_kinds(&app).is_empty());
}

#[test]
fn second_failure_surfaces_and_allows_retry() {
    let (mut app, host) = headless_app();
    record_errors(&mut app);
    host.fail_next_session_requests(2);

    send_session_command(&mut app, SessionCommand::Start);
    assert!(run_until(&mut app, 10, |app| {
        session_state(app) == SessionState::Idle && !error_kinds(app).is_empty()
    }));
    assert_eq!(error_kinds(&app), vec!["session_request_failed"]);
    assert_eq!(
        app.world().resource::<ErrorBanner>().kind(),
        Some("session_request_failed")
    );

    // Failures exhausted; the user can start again.
    assert!(start_tracked_session(&mut app));
}

#[test]
fn unsupported_device_never_requests_a_session() {
    let host = SimulatedHost::new();
    host.handle().set_support(Ok(false));
    let (mut app, handle) = headless_app_with(test_config(), host);
    record_errors(&mut app);

    send_session_command(&mut app, SessionCommand::Start);
    run_frames(&mut app, 5);

    assert_eq!(session_state(&app), SessionState::Idle);
    assert!(handle.session_requests().is_empty());
    assert_eq!(error_kinds(&app), vec!["unsupported_capability"]);
    assert!(app.world().resource::<ErrorBanner>().is_visible());
}

#[test]
fn missing_ar_interface_and_failed_query_read_as_unsupported() {
    let host = SimulatedHost::new();
    host.handle().remove_ar_interface();
    let (mut app, _) = headless_app_with(test_config(), host);
    record_errors(&mut app);
    send_session_command(&mut app, SessionCommand::Start);
    run_frames(&mut app, 3);
    assert_eq!(error_kinds(&app), vec!["unsupported_capability"]);

    let host = SimulatedHost::new();
    host.handle()
        .set_support(Err(HostError::QueryFailed("permission denied".into())));
    let (mut app, _) = headless_app_with(test_config(), host);
    record_errors(&mut app);
    send_session_command(&mut app, SessionCommand::Start);
    run_frames(&mut app, 3);
    assert_eq!(error_kinds(&app), vec!["unsupported_capability"]);
    assert_eq!(session_state(&app), SessionState::Idle);
}

#[test]
fn missing_required_feature_fails_the_request() {
    let host = SimulatedHost::new();
    host.handle().set_device_features(&["dom-overlay"]);
    let (mut app, handle) = headless_app_with(test_config(), host);
    record_errors(&mut app);

    send_session_command(&mut app, SessionCommand::Start);
    run_frames(&mut app, 6);

    assert_eq!(session_state(&app), SessionState::Idle);
    assert_eq!(handle.running_session_count(), 0);
    assert_eq!(error_kinds(&app), vec!["unsupported_capability"]);
}

#[test]
fn missing_render_surface_is_fatal_and_returns_to_idle() {
    let (mut app, host) = headless_app_without_surface();
    record_errors(&mut app);

    send_session_command(&mut app, SessionCommand::Start);
    run_frames(&mut app, 6);

    assert_eq!(session_state(&app), SessionState::Idle);
    assert_eq!(host.running_session_count(), 0);
    assert_eq!(host.frames_delivered(), 0);
    assert_eq!(error_kinds(&app), vec!["render_surface_unbound"]);
    assert!(!app.world().resource::<ErrorBanner>().is_visible());
}

#[test]
fn external_termination_runs_the_same_teardown() {
    let (mut app, host) = headless_app();
    assert!(start_tracked_session(&mut app));
    host.tap();
    run_frames(&mut app, 2);
    assert_eq!(placed_count(&app), 1);

    host.terminate_sessions();
    assert!(run_until(&mut app, 10, |app| session_state(app) == SessionState::Idle));

    assert!(!is_tracked(&app));
    assert_eq!(placed_count(&app), 0);
    assert_eq!(host.live_probe_count(), 0);
    assert_eq!(probe_state(&app), ProbeCreationState::Unrequested);
}

#[test]
fn probe_failure_degrades_without_ending_the_session() {
    let (mut app, host) = headless_app();
    record_errors(&mut app);
    host.fail_probe_requests(Some("sensor unavailable"));

    send_session_command(&mut app, SessionCommand::Start);
    run_frames(&mut app, 10);

    assert_eq!(session_state(&app), SessionState::Active);
    assert!(!is_tracked(&app));
    assert_eq!(host.probe_requests(), 1);
    assert_eq!(probe_state(&app), ProbeCreationState::Failed);
    assert_eq!(error_kinds(&app), vec!["probe_acquisition_failed"]);
    assert!(!app.world().resource::<ErrorBanner>().is_visible());

    send_placement(&mut app, PlacementAction::Place, CommandSource::Keyboard);
    run_frames(&mut app, 1);
    assert_eq!(placed_count(&app), 0);
}

#[test]
fn stop_during_pending_probe_discards_late_resolution() {
    let (mut app, host) = headless_app();
    host.hold_probe_requests(true);

    send_session_command(&mut app, SessionCommand::Start);
    assert!(run_until(&mut app, 10, |app| {
        session_state(app) == SessionState::Active && probe_state(app) == ProbeCreationState::Requested
    }));

    assert!(stop_session(&mut app));
    host.release_held_probes();
    host.tap();
    run_frames(&mut app, 3);

    assert!(!is_tracked(&app));
    assert_eq!(placed_count(&app), 0);
    assert_eq!(host.live_probe_count(), 0);
}

#[test]
fn stop_during_pending_session_request_ends_the_late_session() {
    let (mut app, host) = headless_app();
    host.hold_session_requests(true);

    send_session_command(&mut app, SessionCommand::Start);
    assert!(run_until(&mut app, 10, |app| session_state(app) == SessionState::Requesting));

    assert!(stop_session(&mut app));
    host.release_held_sessions();
    run_frames(&mut app, 2);

    assert_eq!(session_state(&app), SessionState::Idle);
    assert_eq!(host.running_session_count(), 0);
    assert_eq!(host.frames_delivered(), 0);
}

#[test]
fn resize_keeps_session_tracking_and_placements() {
    let (mut app, host) = headless_app();
    assert!(start_tracked_session(&mut app));
    host.tap();
    run_frames(&mut app, 2);

    app.world_mut().send_event(WindowResized {
        window: Entity::PLACEHOLDER,
        width: 390.0,
        height: 844.0,
    });
    run_frames(&mut app, 2);

    assert_eq!(host.surface_size(), Some(Vec2::new(390.0, 844.0)));
    assert_eq!(session_state(&app), SessionState::Active);
    assert!(is_tracked(&app));
    assert_eq!(placed_count(&app), 1);
}

#[test]
fn session_started_fires_once_per_successful_start() {
    let (mut app, host) = headless_app();
    record_session_starts(&mut app);
    record_errors(&mut app);

    for _ in 0..3 {
        assert!(start_tracked_session(&mut app));
        assert!(stop_session(&mut app));
    }
    assert_eq!(started_count(&app), 3);

    // Rejected twice: no session, no event.
    host.fail_next_session_requests(2);
    send_session_command(&mut app, SessionCommand::Start);
    assert!(run_until(&mut app, 10, |app| {
        session_state(app) == SessionState::Idle && !error_kinds(app).is_empty()
    }));
    assert_eq!(started_count(&app), 3);

    // Abandoned while requesting, granted later.
    host.hold_session_requests(true);
    send_session_command(&mut app, SessionCommand::Start);
    assert!(run_until(&mut app, 10, |app| session_state(app) == SessionState::Requesting));
    assert!(stop_session(&mut app));
    host.release_held_sessions();
    run_frames(&mut app, 3);
    assert_eq!(started_count(&app), 3);

    host.hold_session_requests(false);
    assert!(start_tracked_session(&mut app));
    run_frames(&mut app, 1);

    let started = &app.world().resource::<StartedLog>().0;
    assert_eq!(started.len(), 4);
    let reference_space = test_config().reference_space;
    assert!(started.iter().all(|s| s.reference_space.kind == reference_space));

    let current = app.world().resource::<SessionManager>().session_handle();
    assert_eq!(started.last().map(|s| s.reference_space.session), current);
}

#[test]
fn unresolved_abandoned_requests_stay_bounded() {
    let (mut app, host) = headless_app();
    host.hold_session_requests(true);

    for _ in 0..(MAX_ORPHANED_ACQUISITIONS + 4) {
        send_session_command(&mut app, SessionCommand::Start);
        assert!(run_until(&mut app, 10, |app| session_state(app) == SessionState::Requesting));
        assert!(stop_session(&mut app));
    }
    let orphans = app.world().resource::<SessionManager>().orphan_count();
    assert_eq!(orphans, MAX_ORPHANED_ACQUISITIONS);

    host.release_held_sessions();
    run_frames(&mut app, 2);
    assert_eq!(app.world().resource::<SessionManager>().orphan_count(), 0);
    assert_eq!(session_state(&app), SessionState::Idle);
}

#[derive(Debug, Clone)]
enum Op {
    Start,
    Stop,
    Terminate,
    Tap,
    Frames(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Start),
        Just(Op::Stop),
        Just(Op::Terminate),
        Just(Op::Tap),
        (1usize..4).prop_map(Op::Frames),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn session_invariants_hold_for_any_command_sequence(ops in prop::collection::vec(op(), 1..24)) {
        let (mut app, host) = headless_app();
        run_frames(&mut app, 1);

        for op in ops {
            match op {
                Op::Start => send_session_command(&mut app, SessionCommand::Start),
                Op::Stop => send_session_command(&mut app, SessionCommand::Stop),
                Op::Terminate => host.terminate_sessions(),
                Op::Tap => host.tap(),
                Op::Frames(n) => run_frames(&mut app, n),
            }
            app.update();

            let state = session_state(&app);
            prop_assert!(host.running_session_count() <= 1);
            if state != SessionState::Active {
                prop_assert!(!is_tracked(&app));
            }
            if state == SessionState::Idle {
                prop_assert_eq!(placed_count(&app), 0);
                prop_assert_eq!(host.live_probe_count(), 0);
                prop_assert_eq!(probe_state(&app), ProbeCreationState::Unrequested);
            }
        }

        // Whatever happened, a fresh session behaves like the first one.
        prop_assert!(stop_session(&mut app));
        prop_assert_eq!(placed_count(&app), 0);
        prop_assert!(start_tracked_session(&mut app));
        prop_assert_eq!(placed_count(&app), 0);
        prop_assert_eq!(host.live_probe_count(), 1);
    }
}
