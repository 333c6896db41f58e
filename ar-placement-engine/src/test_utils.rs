//! Headless app builders for scenario tests.
//!
//! The app runs the full engine on `MinimalPlugins` against a
//! [`SimulatedHost`]; one `App::update()` is one device frame.

use bevy::prelude::*;
use bevy::state::app::StatesPlugin;

use crate::engine::ArEnginePlugin;
use crate::engine::core::app_state::{ArSystemSet, SessionState};
use crate::engine::core::config::ArConfig;
use crate::engine::host::ArHostResource;
use crate::engine::host::simulated::{SimulatedHost, SimulatedHostControl, SimulatedHostHandle};
use crate::engine::scene::frame_loop::ArCamera;
use crate::engine::session::session_manager::{SessionCommand, SessionStarted};
use crate::engine::systems::status_tracking::frame_stats_notification_system;
use crate::engine::tracking::pose::TrackedPose;
use crate::error::{ArError, ArErrorEvent};
use crate::rpc::web_rpc::{RpcNotification, WebRpcInterface, send_outgoing_messages};
use crate::tools::placement::state::PlacedObjects;
use crate::tools::tool_manager::{CommandSource, PlacementAction, PlacementCommand};

/// Config with a fixed descriptor seed. Placed objects rest at their anchor.
pub fn test_config() -> ArConfig {
    ArConfig {
        rng_seed: Some(7),
        object_motion: false,
        ..ArConfig::default()
    }
}

pub fn headless_app() -> (App, SimulatedHostHandle) {
    headless_app_with(test_config(), SimulatedHost::new())
}

/// Engine app around a prepared host. The render surface camera is spawned.
pub fn headless_app_with(config: ArConfig, host: SimulatedHost) -> (App, SimulatedHostHandle) {
    let handle = host.handle();
    let mut app = App::new();
    app.add_plugins((MinimalPlugins, StatesPlugin))
        .init_resource::<Assets<Mesh>>()
        .init_resource::<Assets<StandardMaterial>>()
        .insert_resource(ArHostResource::new(host))
        .insert_resource(SimulatedHostControl(handle.clone()))
        .add_plugins(ArEnginePlugin::new(config));
    app.world_mut().spawn((ArCamera, Transform::default()));
    (app, handle)
}

/// Headless app without a render surface to bind to.
pub fn headless_app_without_surface() -> (App, SimulatedHostHandle) {
    let host = SimulatedHost::new();
    let handle = host.handle();
    let mut app = App::new();
    app.add_plugins((MinimalPlugins, StatesPlugin))
        .init_resource::<Assets<Mesh>>()
        .init_resource::<Assets<StandardMaterial>>()
        .insert_resource(ArHostResource::new(host))
        .add_plugins(ArEnginePlugin::new(test_config()));
    (app, handle)
}

pub fn run_frames(app: &mut App, frames: usize) {
    for _ in 0..frames {
        app.update();
    }
}

pub fn session_state(app: &App) -> SessionState {
    *app.world().resource::<State<SessionState>>().get()
}

pub fn send_session_command(app: &mut App, command: SessionCommand) {
    app.world_mut().send_event(command);
}

pub fn send_placement(app: &mut App, action: PlacementAction, source: CommandSource) {
    app.world_mut().send_event(PlacementCommand { action, source });
}

/// Run frames until `predicate` holds, up to `limit`. Returns whether it held.
pub fn run_until(app: &mut App, limit: usize, predicate: impl Fn(&App) -> bool) -> bool {
    for _ in 0..limit {
        if predicate(app) {
            return true;
        }
        app.update();
    }
    predicate(app)
}

/// Start a session and wait for the first tracked frame.
pub fn start_tracked_session(app: &mut App) -> bool {
    send_session_command(app, SessionCommand::Start);
    run_until(app, 10, |app| {
        session_state(app) == SessionState::Active && is_tracked(app)
    })
}

pub fn stop_session(app: &mut App) -> bool {
    send_session_command(app, SessionCommand::Stop);
    app.update();
    run_until(app, 10, |app| session_state(app) == SessionState::Idle)
}

pub fn is_tracked(app: &App) -> bool {
    app.world().resource::<TrackedPose>().is_tracked()
}

pub fn placed_count(app: &App) -> usize {
    app.world().resource::<PlacedObjects>().len()
}

/// Every error reported so far, in order.
#[derive(Resource, Default)]
pub struct ErrorLog(pub Vec<ArError>);

fn collect_errors(mut events: EventReader<ArErrorEvent>, mut log: ResMut<ErrorLog>) {
    log.0.extend(events.read().map(|ArErrorEvent(error)| error.clone()));
}

/// Start recording reported errors into [`ErrorLog`].
pub fn record_errors(app: &mut App) {
    app.init_resource::<ErrorLog>()
        .add_systems(Update, collect_errors.after(ArSystemSet::Status));
}

pub fn error_kinds(app: &App) -> Vec<&'static str> {
    app.world()
        .get_resource::<ErrorLog>()
        .map(|log| log.0.iter().map(ArError::kind).collect())
        .unwrap_or_default()
}

/// Notifications queued for the embedding page, in send order.
#[derive(Resource, Default)]
pub struct NotificationLog(pub Vec<RpcNotification>);

impl NotificationLog {
    /// Params of every notification with this method.
    pub fn params(&self, method: &str) -> Vec<&serde_json::Value> {
        self.0
            .iter()
            .filter(|n| n.method == method)
            .map(|n| &n.params)
            .collect()
    }

    /// Session states announced so far.
    pub fn session_states(&self) -> Vec<String> {
        self.params("session_state")
            .into_iter()
            .filter_map(|p| p["state"].as_str().map(str::to_string))
            .collect()
    }
}

fn collect_notifications(rpc_interface: Res<WebRpcInterface>, mut log: ResMut<NotificationLog>) {
    log.0.extend(rpc_interface.queued_notifications().iter().cloned());
}

/// Record every notification before the outgoing queue is flushed.
pub fn record_notifications(app: &mut App) {
    app.init_resource::<NotificationLog>().add_systems(
        Update,
        collect_notifications
            .in_set(ArSystemSet::Status)
            .after(frame_stats_notification_system)
            .before(send_outgoing_messages),
    );
}

/// Every `SessionStarted` event emitted so far.
#[derive(Resource, Default)]
pub struct StartedLog(pub Vec<SessionStarted>);

fn collect_started(mut events: EventReader<SessionStarted>, mut log: ResMut<StartedLog>) {
    log.0.extend(events.read().cloned());
}

pub fn record_session_starts(app: &mut App) {
    app.init_resource::<StartedLog>()
        .add_systems(Update, collect_started.after(ArSystemSet::Status));
}

pub fn started_count(app: &App) -> usize {
    app.world()
        .get_resource::<StartedLog>()
        .map_or(0, |log| log.0.len())
}
