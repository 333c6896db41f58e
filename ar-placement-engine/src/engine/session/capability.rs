use bevy::prelude::*;
use serde::Serialize;

use crate::engine::host::{ArHost, ArHostResource, Pending};
use crate::error::HostError;

/// Outcome of a capability check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SupportResult {
    pub supported: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl SupportResult {
    pub fn supported() -> Self {
        Self {
            supported: true,
            reason: None,
        }
    }

    pub fn unsupported(reason: impl Into<String>) -> Self {
        Self {
            supported: false,
            reason: Some(reason.into()),
        }
    }

    /// Interpret a resolved host query. Query failures never propagate.
    pub fn from_query(result: Result<bool, HostError>) -> Self {
        match result {
            Ok(true) => Self::supported(),
            Ok(false) => Self::unsupported("immersive AR sessions are not supported"),
            Err(e) => Self::unsupported(format!("capability query failed: {}", e)),
        }
    }
}

/// Request a fresh capability check.
#[derive(Event, Debug, Clone, Copy, Default)]
pub struct CheckSupport;

/// Emitted once per completed check.
#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct SupportChecked(pub SupportResult);

/// Runs capability checks against the host and remembers the last answer.
#[derive(Resource, Default)]
pub struct CapabilityProber {
    pending: Option<Pending<bool>>,
    result: Option<SupportResult>,
}

impl CapabilityProber {
    /// Start a check unless one is already in flight.
    pub fn begin(&mut self, host: &mut dyn ArHost) {
        if self.pending.is_some() {
            return;
        }
        self.result = None;
        if !host.has_ar_interface() {
            self.result = Some(SupportResult::unsupported(
                "no AR capability interface on this device",
            ));
            return;
        }
        self.pending = Some(host.is_session_supported());
    }

    /// Returns the result the tick the in-flight check resolves.
    pub fn poll(&mut self) -> Option<SupportResult> {
        let resolved = self.pending.as_ref()?.try_take()?;
        self.pending = None;
        let result = SupportResult::from_query(resolved);
        self.result = Some(result.clone());
        Some(result)
    }

    pub fn result(&self) -> Option<&SupportResult> {
        self.result.as_ref()
    }

    pub fn is_checking(&self) -> bool {
        self.pending.is_some()
    }

    pub fn is_supported(&self) -> bool {
        self.result.as_ref().is_some_and(|r| r.supported)
    }
}

pub fn begin_support_check(
    mut requests: EventReader<CheckSupport>,
    mut prober: ResMut<CapabilityProber>,
    mut host: ResMut<ArHostResource>,
    mut checked: EventWriter<SupportChecked>,
) {
    if requests.read().count() == 0 {
        return;
    }
    prober.begin(host.host_mut());
    // Hosts without any interface answer synchronously.
    if !prober.is_checking() {
        if let Some(result) = prober.result() {
            checked.write(SupportChecked(result.clone()));
        }
    }
}

pub fn poll_support_check(
    mut prober: ResMut<CapabilityProber>,
    mut checked: EventWriter<SupportChecked>,
) {
    if let Some(result) = prober.poll() {
        match &result.reason {
            None => info!("AR capability check: supported"),
            Some(reason) => info!("AR capability check: unsupported ({})", reason),
        }
        checked.write(SupportChecked(result));
    }
}
