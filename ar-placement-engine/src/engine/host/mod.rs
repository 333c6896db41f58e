//! Boundary to the device/browser AR runtime.
//!
//! The engine never talks to hardware directly: everything it needs (capability
//! queries, session requests, hit-test sources, frame delivery, termination) goes
//! through the [`ArHost`] trait held in [`ArHostResource`].
//!
//! ## Acquisition Model
//!
//! ```text
//! engine                         host
//!   │ request_session() ───────────> │
//!   │ <──────────── Pending<Grant>   │
//!   │   ...ticks pass...             │
//!   │                                ├─ Resolver::resolve(Ok(grant))
//!   │ try_take() -> Some(grant)      │
//! ```
//!
//! A pending acquisition is polled once per tick and never blocks the frame
//! loop. Whoever polls a result after its session is gone must release it.

/// One-shot acquisition slots shared between engine and host.
pub mod pending;

/// Ray intersection helpers for environment probing.
pub mod ray;

/// Scripted host for the desktop preview and tests.
pub mod simulated;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::engine::tracking::pose::Pose;
use crate::error::HostError;

pub use pending::{OrphanedAcquisitions, Pending, Resolver, pending_pair};

/// Opaque session identifier issued by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionHandle(pub u64);

/// Opaque hit-test source identifier issued by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProbeHandle(pub u64);

/// Coordinate frame poses are reported in for a session's lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceSpace {
    pub session: SessionHandle,
    pub kind: String,
}

/// Drawable surface a session renders into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderSurface {
    pub camera: Entity,
}

/// Features asked of the host when opening a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRequest {
    pub required_features: Vec<String>,
    pub optional_features: Vec<String>,
    pub reference_space: String,
}

impl SessionRequest {
    /// Same request without optional features, used for the single retry.
    pub fn required_only(&self) -> Self {
        Self {
            optional_features: Vec::new(),
            ..self.clone()
        }
    }

    pub fn has_optional_features(&self) -> bool {
        !self.optional_features.is_empty()
    }
}

/// Successful session acquisition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionGrant {
    pub session: SessionHandle,
    pub reference_space: ReferenceSpace,
    pub enabled_features: Vec<String>,
}

/// Host-side lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostSessionStatus {
    Running,
    Ending,
    Ended,
}

/// One device frame delivered by the host.
#[derive(Debug, Clone, Default)]
pub struct HostFrame {
    pub timestamp: f64,
    pub viewer_pose: Pose,
    /// Controller `select` events delivered with this frame.
    pub selects: usize,
    hit_results: Vec<(ProbeHandle, Vec<Pose>)>,
}

impl HostFrame {
    pub fn new(timestamp: f64, viewer_pose: Pose) -> Self {
        Self {
            timestamp,
            viewer_pose,
            selects: 0,
            hit_results: Vec::new(),
        }
    }

    pub fn with_hits(mut self, probe: ProbeHandle, hits: Vec<Pose>) -> Self {
        self.hit_results.push((probe, hits));
        self
    }

    pub fn with_selects(mut self, selects: usize) -> Self {
        self.selects = selects;
        self
    }

    /// Candidates for `probe` in the host's own ranking order.
    pub fn hit_test_results(&self, probe: ProbeHandle) -> &[Pose] {
        self.hit_results
            .iter()
            .find(|(handle, _)| *handle == probe)
            .map(|(_, hits)| hits.as_slice())
            .unwrap_or(&[])
    }
}

/// Device/browser AR runtime.
pub trait ArHost: Send + Sync + 'static {
    /// Whether any AR capability interface exists at all.
    fn has_ar_interface(&self) -> bool;

    /// Ask whether an immersive AR session can be opened.
    fn is_session_supported(&mut self) -> Pending<bool>;

    fn request_session(&mut self, request: &SessionRequest) -> Pending<SessionGrant>;

    fn bind_render_surface(
        &mut self,
        session: SessionHandle,
        surface: RenderSurface,
    ) -> Result<(), HostError>;

    /// Create a standing hit-test source cast from `space`.
    fn request_probe_source(&mut self, session: SessionHandle, space: &str) -> Pending<ProbeHandle>;

    fn release_probe_source(&mut self, probe: ProbeHandle);

    /// Next device frame for `session`, if one is ready.
    fn poll_frame(&mut self, session: SessionHandle) -> Option<HostFrame>;

    /// Ask the host to terminate `session`.
    fn end_session(&mut self, session: SessionHandle);

    fn session_status(&self, session: SessionHandle) -> HostSessionStatus;

    /// Drawable surface changed size (window resize, orientation change).
    fn resize_surface(&mut self, _width: f32, _height: f32) {}
}

/// Resource owning the active host implementation.
#[derive(Resource)]
pub struct ArHostResource(Box<dyn ArHost>);

impl ArHostResource {
    pub fn new(host: impl ArHost) -> Self {
        Self(Box::new(host))
    }

    pub fn host(&self) -> &dyn ArHost {
        self.0.as_ref()
    }

    pub fn host_mut(&mut self) -> &mut dyn ArHost {
        self.0.as_mut()
    }
}
