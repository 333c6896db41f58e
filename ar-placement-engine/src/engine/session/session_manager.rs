use bevy::prelude::*;
use serde::Serialize;

use crate::engine::core::app_state::SessionState;
use crate::engine::core::config::ArConfig;
use crate::engine::host::{
    ArHost, ArHostResource, HostSessionStatus, OrphanedAcquisitions, Pending, ReferenceSpace,
    RenderSurface, SessionGrant, SessionHandle, SessionRequest,
};
use crate::engine::scene::frame_loop::ArCamera;
use crate::engine::session::capability::CapabilityProber;
use crate::error::{ArError, ArErrorEvent};

/// Start or stop request from any UI boundary.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    Start,
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEndReason {
    Stopped,
    ExternallyTerminated,
    Failed,
}

#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct SessionStarted {
    pub reference_space: ReferenceSpace,
}

/// Emitted once per return to `Idle` from a started or attempted session.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionEnded {
    pub reason: SessionEndReason,
}

/// A granted session with its render surface bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveSession {
    pub handle: SessionHandle,
    pub reference_space: ReferenceSpace,
    pub enabled_features: Vec<String>,
}

struct SessionAttempt {
    request: SessionRequest,
    pending: Pending<SessionGrant>,
    retried: bool,
}

/// Owner of the session lifecycle.
///
/// Only the systems in this module mutate it; other systems read the active
/// session through the accessors.
#[derive(Resource, Default)]
pub struct SessionManager {
    active: Option<ActiveSession>,
    attempt: Option<SessionAttempt>,
    start_deferred: bool,
    end_reason: Option<SessionEndReason>,
    orphans: OrphanedAcquisitions<SessionGrant>,
}

impl SessionManager {
    pub fn active_session(&self) -> Option<&ActiveSession> {
        self.active.as_ref()
    }

    pub fn session_handle(&self) -> Option<SessionHandle> {
        self.active.as_ref().map(|s| s.handle)
    }

    pub fn reference_space(&self) -> Option<&ReferenceSpace> {
        self.active.as_ref().map(|s| &s.reference_space)
    }

    /// Session requests abandoned by `stop()` that have not resolved yet.
    pub fn orphan_count(&self) -> usize {
        self.orphans.len()
    }

    fn issue(&mut self, host: &mut dyn ArHost, request: SessionRequest, retried: bool) {
        info!(
            "Requesting AR session (required: {:?}, optional: {:?})",
            request.required_features, request.optional_features
        );
        let pending = host.request_session(&request);
        self.attempt = Some(SessionAttempt {
            request,
            pending,
            retried,
        });
    }

    /// Start gated on the capability check. `None` keeps the current state.
    fn gated_start(
        &mut self,
        prober: &CapabilityProber,
        host: &mut dyn ArHost,
        config: &ArConfig,
        errors: &mut EventWriter<ArErrorEvent>,
    ) -> Option<SessionState> {
        let Some(support) = prober.result() else {
            self.start_deferred = true;
            debug!("Session start deferred until the capability check resolves");
            return None;
        };
        self.start_deferred = false;

        if !support.supported {
            let reason = support
                .reason
                .clone()
                .unwrap_or_else(|| "immersive AR is not supported".to_string());
            errors.write(ArErrorEvent(ArError::UnsupportedCapability(reason)));
            return None;
        }

        self.issue(host, config.session_request(), false);
        Some(SessionState::Requesting)
    }
}

/// State the machine will be in next tick.
fn effective_state(state: &State<SessionState>, next: &NextState<SessionState>) -> SessionState {
    match next {
        NextState::Pending(pending) => *pending,
        NextState::Unchanged => *state.get(),
    }
}

pub fn handle_session_commands(
    mut commands: EventReader<SessionCommand>,
    state: Res<State<SessionState>>,
    mut next_state: ResMut<NextState<SessionState>>,
    mut manager: ResMut<SessionManager>,
    mut prober: ResMut<CapabilityProber>,
    mut host: ResMut<ArHostResource>,
    config: Res<ArConfig>,
    mut errors: EventWriter<ArErrorEvent>,
) {
    let initial = effective_state(&state, &next_state);
    let mut current = initial;

    for command in commands.read() {
        match (command, current) {
            (SessionCommand::Start, SessionState::Idle) => {
                if prober.result().is_none() {
                    prober.begin(host.host_mut());
                }
                if let Some(state) =
                    manager.gated_start(&prober, host.host_mut(), &config, &mut errors)
                {
                    current = state;
                }
            }
            (SessionCommand::Start, other) => {
                debug!("Start ignored while session is {}", other.as_str());
            }
            (SessionCommand::Stop, SessionState::Idle) => {
                if manager.start_deferred {
                    manager.start_deferred = false;
                    info!("Deferred session start cancelled");
                }
            }
            (SessionCommand::Stop, SessionState::Requesting) => {
                if let Some(attempt) = manager.attempt.take() {
                    manager.orphans.push(attempt.pending);
                }
                manager.end_reason = Some(SessionEndReason::Stopped);
                info!("Session request abandoned by stop");
                current = SessionState::Ending;
            }
            (SessionCommand::Stop, SessionState::Active) => {
                if let Some(handle) = manager.session_handle() {
                    host.host_mut().end_session(handle);
                }
                manager.end_reason = Some(SessionEndReason::Stopped);
                info!("Ending AR session");
                current = SessionState::Ending;
            }
            (SessionCommand::Stop, SessionState::Ending) => {}
        }
    }

    // Capability check resolved since a start was deferred.
    if manager.start_deferred && current == SessionState::Idle && prober.result().is_some() {
        if let Some(state) = manager.gated_start(&prober, host.host_mut(), &config, &mut errors) {
            current = state;
        }
    }

    if current != initial {
        next_state.set(current);
    }
}

pub fn poll_session_request(
    mut manager: ResMut<SessionManager>,
    mut host: ResMut<ArHostResource>,
    config: Res<ArConfig>,
    cameras: Query<Entity, With<ArCamera>>,
    mut next_state: ResMut<NextState<SessionState>>,
    mut started: EventWriter<SessionStarted>,
    mut errors: EventWriter<ArErrorEvent>,
) {
    let Some(result) = manager.attempt.as_ref().and_then(|a| a.pending.try_take()) else {
        return;
    };
    let Some(attempt) = manager.attempt.take() else {
        return;
    };
    let host = host.host_mut();

    match result {
        Ok(grant) => {
            let bound = cameras
                .single()
                .map_err(|e| e.to_string())
                .and_then(|camera| {
                    host.bind_render_surface(grant.session, RenderSurface { camera })
                        .map_err(|e| e.to_string())
                });

            if let Err(reason) = bound {
                host.end_session(grant.session);
                errors.write(ArErrorEvent(ArError::RenderSurfaceUnbound(reason)));
                manager.end_reason = Some(SessionEndReason::Failed);
                next_state.set(SessionState::Idle);
                return;
            }

            info!(
                "AR session started (features: {:?}, space: {})",
                grant.enabled_features, grant.reference_space.kind
            );
            started.write(SessionStarted {
                reference_space: grant.reference_space.clone(),
            });
            manager.active = Some(ActiveSession {
                handle: grant.session,
                reference_space: grant.reference_space,
                enabled_features: grant.enabled_features,
            });
            next_state.set(SessionState::Active);
        }
        Err(e) => {
            if !attempt.retried
                && config.retry_without_optional
                && attempt.request.has_optional_features()
            {
                warn!("Session request failed ({}), retrying with required features only", e);
                let retry = attempt.request.required_only();
                manager.issue(host, retry, true);
                return;
            }
            errors.write(ArErrorEvent(ArError::from_session_failure(&e)));
            manager.end_reason = Some(SessionEndReason::Failed);
            next_state.set(SessionState::Idle);
        }
    }
}

/// Device-initiated end drives the same teardown as `stop()`.
pub fn watch_session_termination(
    mut manager: ResMut<SessionManager>,
    host: Res<ArHostResource>,
    mut next_state: ResMut<NextState<SessionState>>,
) {
    if manager.end_reason.is_some() {
        return;
    }
    let Some(handle) = manager.session_handle() else {
        return;
    };
    if host.host().session_status(handle) != HostSessionStatus::Running {
        warn!("AR session terminated by the device");
        manager.end_reason = Some(SessionEndReason::ExternallyTerminated);
        next_state.set(SessionState::Ending);
    }
}

pub fn finish_session_end(
    mut manager: ResMut<SessionManager>,
    host: Res<ArHostResource>,
    mut next_state: ResMut<NextState<SessionState>>,
) {
    if let Some(handle) = manager.session_handle() {
        if host.host().session_status(handle) != HostSessionStatus::Ended {
            return;
        }
    }
    manager.active = None;
    next_state.set(SessionState::Idle);
}

/// Release sessions granted after their request was abandoned.
pub fn release_orphaned_sessions(
    mut manager: ResMut<SessionManager>,
    mut host: ResMut<ArHostResource>,
) {
    if manager.orphans.is_empty() {
        return;
    }
    let host = host.host_mut();
    manager.orphans.release(|grant| {
        debug!("{}: ending session {:?}", ArError::TeardownRace, grant.session);
        host.end_session(grant.session);
    });
}

/// First step of the `Idle` entry funnel.
pub fn announce_session_end(
    mut manager: ResMut<SessionManager>,
    mut ended: EventWriter<SessionEnded>,
) {
    manager.active = None;
    manager.attempt = None;
    if let Some(reason) = manager.end_reason.take() {
        info!("AR session ended ({:?})", reason);
        ended.write(SessionEnded { reason });
    }
}
