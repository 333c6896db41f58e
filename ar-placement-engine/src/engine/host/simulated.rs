//! Scripted AR runtime.
//!
//! Stands in for a phone's AR stack on desktop builds and in tests. The
//! environment is a set of horizontal [`SurfacePlane`]s; each frame the
//! viewer's forward ray is cast against them and the hits become the
//! hit-test candidates, nearest first. Every failure mode the engine has to
//! survive can be injected through [`SimulatedHostHandle`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use bevy::prelude::*;
use constants::session::{FEATURE_DOM_OVERLAY, FEATURE_HIT_TEST};

use super::ray::{SurfacePlane, ranked_plane_hits};
use super::{
    ArHost, HostFrame, HostSessionStatus, Pending, ProbeHandle, ReferenceSpace, RenderSurface,
    Resolver, SessionGrant, SessionHandle, SessionRequest, pending_pair,
};
use crate::engine::tracking::pose::Pose;
use crate::error::HostError;

const FRAME_INTERVAL_MS: f64 = 1000.0 / 60.0;

struct SimSession {
    status: HostSessionStatus,
    surface: Option<RenderSurface>,
}

struct SimState {
    ar_interface: bool,
    support: Result<bool, HostError>,
    device_features: Vec<String>,
    session_failures: u32,
    hold_sessions: bool,
    held_sessions: Vec<(Resolver<SessionGrant>, SessionGrant)>,
    probe_failure: Option<String>,
    hold_probes: bool,
    held_probes: Vec<(Resolver<ProbeHandle>, ProbeHandle, SessionHandle)>,
    next_id: u64,
    sessions: HashMap<SessionHandle, SimSession>,
    live_probes: Vec<(ProbeHandle, SessionHandle)>,
    session_requests: Vec<SessionRequest>,
    probe_requests: usize,
    planes: Vec<SurfacePlane>,
    scripted_hits: Option<Vec<Pose>>,
    viewer: Pose,
    queued_selects: usize,
    frames_delivered: u64,
    surface_size: Option<Vec2>,
}

impl Default for SimState {
    fn default() -> Self {
        Self {
            ar_interface: true,
            support: Ok(true),
            device_features: vec![FEATURE_HIT_TEST.to_string(), FEATURE_DOM_OVERLAY.to_string()],
            session_failures: 0,
            hold_sessions: false,
            held_sessions: Vec::new(),
            probe_failure: None,
            hold_probes: false,
            held_probes: Vec::new(),
            next_id: 1,
            sessions: HashMap::new(),
            live_probes: Vec::new(),
            session_requests: Vec::new(),
            probe_requests: 0,
            planes: vec![default_floor()],
            scripted_hits: None,
            viewer: default_viewer(),
            queued_selects: 0,
            frames_delivered: 0,
            surface_size: None,
        }
    }
}

impl SimState {
    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn is_running(&self, session: SessionHandle) -> bool {
        self.sessions
            .get(&session)
            .is_some_and(|s| s.status == HostSessionStatus::Running)
    }

    fn open_session(&mut self, grant: &SessionGrant) {
        self.sessions.insert(
            grant.session,
            SimSession {
                status: HostSessionStatus::Running,
                surface: None,
            },
        );
    }

    fn hits_for_viewer(&self) -> Vec<Pose> {
        if let Some(hits) = &self.scripted_hits {
            return hits.clone();
        }
        ranked_plane_hits(self.viewer.translation(), self.viewer.forward(), &self.planes)
            .into_iter()
            .map(Pose::from_translation)
            .collect()
    }
}

/// Floor 1.4 m below the viewer, 6 m square.
fn default_floor() -> SurfacePlane {
    SurfacePlane::new(Vec3::new(0.0, -1.4, 0.0), Vec2::splat(6.0))
}

/// Viewer at the origin looking 45 degrees down towards -Z.
fn default_viewer() -> Pose {
    Pose::from_rotation_translation(
        Quat::from_rotation_x(-std::f32::consts::FRAC_PI_4),
        Vec3::ZERO,
    )
}

/// Host implementation backed by shared simulated state.
pub struct SimulatedHost {
    state: Arc<Mutex<SimState>>,
}

/// Control surface for a [`SimulatedHost`], cloneable across tests and systems.
#[derive(Clone)]
pub struct SimulatedHostHandle {
    state: Arc<Mutex<SimState>>,
}

impl SimulatedHost {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState::default())),
        }
    }

    pub fn handle(&self) -> SimulatedHostHandle {
        SimulatedHostHandle {
            state: self.state.clone(),
        }
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut SimState) -> R) -> Option<R> {
        self.state.lock().ok().map(|mut state| f(&mut state))
    }
}

impl Default for SimulatedHost {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T>() -> Pending<T> {
    Pending::ready(Err(HostError::QueryFailed("simulated host state poisoned".into())))
}

impl ArHost for SimulatedHost {
    fn has_ar_interface(&self) -> bool {
        self.state.lock().map(|s| s.ar_interface).unwrap_or(false)
    }

    fn is_session_supported(&mut self) -> Pending<bool> {
        self.with_state(|s| Pending::ready(s.support.clone()))
            .unwrap_or_else(poisoned)
    }

    fn request_session(&mut self, request: &SessionRequest) -> Pending<SessionGrant> {
        self.with_state(|s| {
            s.session_requests.push(request.clone());
            if !s.ar_interface {
                return Pending::ready(Err(HostError::NoArInterface));
            }
            if let Some(missing) = request
                .required_features
                .iter()
                .find(|f| !s.device_features.contains(f))
            {
                return Pending::ready(Err(HostError::FeatureUnsupported(missing.clone())));
            }
            if s.session_failures > 0 {
                s.session_failures -= 1;
                return Pending::ready(Err(HostError::RequestRejected(
                    "device busy".to_string(),
                )));
            }

            let session = SessionHandle(s.next_id());
            let enabled_features = request
                .required_features
                .iter()
                .chain(request.optional_features.iter())
                .filter(|f| s.device_features.contains(f))
                .cloned()
                .collect();
            let grant = SessionGrant {
                session,
                reference_space: ReferenceSpace {
                    session,
                    kind: request.reference_space.clone(),
                },
                enabled_features,
            };

            if s.hold_sessions {
                let (resolver, pending) = pending_pair();
                s.held_sessions.push((resolver, grant));
                pending
            } else {
                s.open_session(&grant);
                Pending::ready(Ok(grant))
            }
        })
        .unwrap_or_else(poisoned)
    }

    fn bind_render_surface(
        &mut self,
        session: SessionHandle,
        surface: RenderSurface,
    ) -> Result<(), HostError> {
        self.with_state(|s| match s.sessions.get_mut(&session) {
            Some(sim) if sim.status == HostSessionStatus::Running => {
                sim.surface = Some(surface);
                Ok(())
            }
            _ => Err(HostError::SessionEnded),
        })
        .unwrap_or(Err(HostError::SurfaceUnavailable("host state poisoned".into())))
    }

    fn request_probe_source(&mut self, session: SessionHandle, _space: &str) -> Pending<ProbeHandle> {
        self.with_state(|s| {
            s.probe_requests += 1;
            if !s.is_running(session) {
                return Pending::ready(Err(HostError::SessionEnded));
            }
            if let Some(reason) = &s.probe_failure {
                return Pending::ready(Err(HostError::ProbeUnavailable(reason.clone())));
            }
            let probe = ProbeHandle(s.next_id());
            if s.hold_probes {
                let (resolver, pending) = pending_pair();
                s.held_probes.push((resolver, probe, session));
                pending
            } else {
                s.live_probes.push((probe, session));
                Pending::ready(Ok(probe))
            }
        })
        .unwrap_or_else(poisoned)
    }

    fn release_probe_source(&mut self, probe: ProbeHandle) {
        self.with_state(|s| s.live_probes.retain(|(p, _)| *p != probe));
    }

    fn poll_frame(&mut self, session: SessionHandle) -> Option<HostFrame> {
        self.with_state(|s| {
            let sim = s.sessions.get(&session)?;
            if sim.status != HostSessionStatus::Running || sim.surface.is_none() {
                return None;
            }
            s.frames_delivered += 1;
            let mut frame = HostFrame::new(s.frames_delivered as f64 * FRAME_INTERVAL_MS, s.viewer)
                .with_selects(std::mem::take(&mut s.queued_selects));
            let hits = s.hits_for_viewer();
            for (probe, owner) in &s.live_probes {
                if *owner == session {
                    frame = frame.with_hits(*probe, hits.clone());
                }
            }
            Some(frame)
        })
        .flatten()
    }

    fn end_session(&mut self, session: SessionHandle) {
        self.with_state(|s| {
            if let Some(sim) = s.sessions.get_mut(&session) {
                sim.status = HostSessionStatus::Ended;
            }
        });
    }

    fn session_status(&self, session: SessionHandle) -> HostSessionStatus {
        self.state
            .lock()
            .ok()
            .and_then(|s| s.sessions.get(&session).map(|sim| sim.status))
            .unwrap_or(HostSessionStatus::Ended)
    }

    fn resize_surface(&mut self, width: f32, height: f32) {
        self.with_state(|s| s.surface_size = Some(Vec2::new(width, height)));
    }
}

impl SimulatedHostHandle {
    fn with_state<R>(&self, f: impl FnOnce(&mut SimState) -> R) -> Option<R> {
        self.state.lock().ok().map(|mut state| f(&mut state))
    }

    pub fn remove_ar_interface(&self) {
        self.with_state(|s| s.ar_interface = false);
    }

    pub fn set_support(&self, support: Result<bool, HostError>) {
        self.with_state(|s| s.support = support);
    }

    pub fn set_device_features(&self, features: &[&str]) {
        self.with_state(|s| s.device_features = features.iter().map(|f| f.to_string()).collect());
    }

    pub fn fail_next_session_requests(&self, count: u32) {
        self.with_state(|s| s.session_failures = count);
    }

    pub fn hold_session_requests(&self, hold: bool) {
        self.with_state(|s| s.hold_sessions = hold);
    }

    /// Complete every held session request successfully.
    pub fn release_held_sessions(&self) {
        self.with_state(|s| {
            for (resolver, grant) in std::mem::take(&mut s.held_sessions) {
                s.open_session(&grant);
                resolver.resolve(Ok(grant));
            }
        });
    }

    pub fn fail_probe_requests(&self, reason: Option<&str>) {
        self.with_state(|s| s.probe_failure = reason.map(str::to_string));
    }

    pub fn hold_probe_requests(&self, hold: bool) {
        self.with_state(|s| s.hold_probes = hold);
    }

    /// Complete every held probe request successfully.
    pub fn release_held_probes(&self) {
        self.with_state(|s| {
            for (resolver, probe, session) in std::mem::take(&mut s.held_probes) {
                s.live_probes.push((probe, session));
                resolver.resolve(Ok(probe));
            }
        });
    }

    pub fn set_planes(&self, planes: Vec<SurfacePlane>) {
        self.with_state(|s| s.planes = planes);
    }

    pub fn planes(&self) -> Vec<SurfacePlane> {
        self.with_state(|s| s.planes.clone()).unwrap_or_default()
    }

    /// Override ray casting with fixed candidates; `None` restores the environment.
    pub fn script_hits(&self, hits: Option<Vec<Pose>>) {
        self.with_state(|s| s.scripted_hits = hits);
    }

    pub fn set_viewer(&self, viewer: Pose) {
        self.with_state(|s| s.viewer = viewer);
    }

    pub fn viewer(&self) -> Pose {
        self.with_state(|s| s.viewer).unwrap_or_default()
    }

    /// Queue a controller `select`, delivered with the next frame.
    pub fn tap(&self) {
        self.with_state(|s| s.queued_selects += 1);
    }

    /// Device-initiated end of every running session.
    pub fn terminate_sessions(&self) {
        self.with_state(|s| {
            for sim in s.sessions.values_mut() {
                sim.status = HostSessionStatus::Ended;
            }
        });
    }

    pub fn session_requests(&self) -> Vec<SessionRequest> {
        self.with_state(|s| s.session_requests.clone()).unwrap_or_default()
    }

    pub fn probe_requests(&self) -> usize {
        self.with_state(|s| s.probe_requests).unwrap_or_default()
    }

    pub fn live_probe_count(&self) -> usize {
        self.with_state(|s| s.live_probes.len()).unwrap_or_default()
    }

    pub fn running_session_count(&self) -> usize {
        self.with_state(|s| {
            s.sessions
                .values()
                .filter(|sim| sim.status == HostSessionStatus::Running)
                .count()
        })
        .unwrap_or_default()
    }

    pub fn frames_delivered(&self) -> u64 {
        self.with_state(|s| s.frames_delivered).unwrap_or_default()
    }

    pub fn surface_size(&self) -> Option<Vec2> {
        self.with_state(|s| s.surface_size).flatten()
    }
}

/// Handle to the simulated host, for systems driving it from desktop input.
#[derive(Resource, Clone)]
pub struct SimulatedHostControl(pub SimulatedHostHandle);

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> SessionRequest {
        SessionRequest {
            required_features: vec![FEATURE_HIT_TEST.into()],
            optional_features: vec![FEATURE_DOM_OVERLAY.into()],
            reference_space: "local".into(),
        }
    }

    fn open(host: &mut SimulatedHost) -> SessionHandle {
        let grant = host.request_session(&request()).try_take().unwrap().unwrap();
        host.bind_render_surface(grant.session, RenderSurface { camera: Entity::PLACEHOLDER })
            .unwrap();
        grant.session
    }

    #[test]
    fn missing_required_feature_fails_request() {
        let mut host = SimulatedHost::new();
        host.handle().set_device_features(&[FEATURE_DOM_OVERLAY]);
        let result = host.request_session(&request()).try_take().unwrap();
        assert_eq!(result, Err(HostError::FeatureUnsupported(FEATURE_HIT_TEST.into())));
    }

    #[test]
    fn frames_need_a_bound_surface() {
        let mut host = SimulatedHost::new();
        let grant = host.request_session(&request()).try_take().unwrap().unwrap();
        assert!(host.poll_frame(grant.session).is_none());

        host.bind_render_surface(grant.session, RenderSurface { camera: Entity::PLACEHOLDER })
            .unwrap();
        assert!(host.poll_frame(grant.session).is_some());
    }

    #[test]
    fn default_viewer_sees_the_floor() {
        let mut host = SimulatedHost::new();
        let session = open(&mut host);
        let probe = host
            .request_probe_source(session, "viewer")
            .try_take()
            .unwrap()
            .unwrap();

        let frame = host.poll_frame(session).unwrap();
        let hits = frame.hit_test_results(probe);
        assert_eq!(hits.len(), 1);
        assert!((hits[0].translation().y + 1.4).abs() < 1e-3);
    }

    #[test]
    fn taps_are_delivered_once() {
        let mut host = SimulatedHost::new();
        let session = open(&mut host);
        host.handle().tap();
        assert_eq!(host.poll_frame(session).unwrap().selects, 1);
        assert_eq!(host.poll_frame(session).unwrap().selects, 0);
    }

    #[test]
    fn ended_session_rejects_probe_requests() {
        let mut host = SimulatedHost::new();
        let session = open(&mut host);
        host.end_session(session);
        let result = host.request_probe_source(session, "viewer").try_take().unwrap();
        assert_eq!(result, Err(HostError::SessionEnded));
        assert_eq!(host.session_status(session), HostSessionStatus::Ended);
    }
}
