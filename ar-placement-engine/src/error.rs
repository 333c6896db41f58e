//! Error taxonomy for the AR session and placement engine.
//!
//! `HostError` carries failures reported by the device/browser surface,
//! `ArError` is what the rest of the engine reasons about and reports.

use bevy::prelude::Event;
use thiserror::Error;

/// Failure reported by an [`ArHost`](crate::engine::host::ArHost) implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("no AR capability interface is available")]
    NoArInterface,
    #[error("required feature not supported: {0}")]
    FeatureUnsupported(String),
    #[error("session request rejected: {0}")]
    RequestRejected(String),
    #[error("capability query failed: {0}")]
    QueryFailed(String),
    #[error("hit-test source unavailable: {0}")]
    ProbeUnavailable(String),
    #[error("session has already ended")]
    SessionEnded,
    #[error("render surface unavailable: {0}")]
    SurfaceUnavailable(String),
}

/// Engine-level errors, classified by how the engine recovers from them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArError {
    /// Device or browser lacks AR or hit-testing. Not retryable on this hardware.
    #[error("AR is not supported: {0}")]
    UnsupportedCapability(String),
    /// Session request failed after the reduced-feature retry.
    #[error("AR session request failed: {0}")]
    SessionRequestFailed(String),
    /// Hit-test source could not be acquired; tracking stays lost for the session.
    #[error("hit-test source acquisition failed: {0}")]
    ProbeAcquisitionFailed(String),
    /// The session has no drawable surface to bind to.
    #[error("render surface is not bound: {0}")]
    RenderSurfaceUnbound(String),
    /// An acquisition resolved after its session was torn down.
    #[error("acquisition resolved after session teardown")]
    TeardownRace,
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ArError {
    /// Stable identifier used in UI notifications.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnsupportedCapability(_) => "unsupported_capability",
            Self::SessionRequestFailed(_) => "session_request_failed",
            Self::ProbeAcquisitionFailed(_) => "probe_acquisition_failed",
            Self::RenderSurfaceUnbound(_) => "render_surface_unbound",
            Self::TeardownRace => "teardown_race",
            Self::Config(_) => "config",
        }
    }

    /// Errors that raise the persistent, dismissable banner.
    pub fn is_user_visible(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedCapability(_) | Self::SessionRequestFailed(_)
        )
    }

    /// Whether the user can reasonably try `start()` again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::SessionRequestFailed(_))
    }

    /// Configuration errors the user cannot recover from.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::RenderSurfaceUnbound(_) | Self::Config(_))
    }

    /// Map a failed session request onto the taxonomy.
    pub fn from_session_failure(error: &HostError) -> Self {
        match error {
            HostError::NoArInterface | HostError::FeatureUnsupported(_) => {
                Self::UnsupportedCapability(error.to_string())
            }
            HostError::SurfaceUnavailable(reason) => Self::RenderSurfaceUnbound(reason.clone()),
            other => Self::SessionRequestFailed(other.to_string()),
        }
    }
}

/// An [`ArError`] on its way to the single reporting system.
#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct ArErrorEvent(pub ArError);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_required_feature_is_unsupported_capability() {
        let err = ArError::from_session_failure(&HostError::FeatureUnsupported("hit-test".into()));
        assert_eq!(err.kind(), "unsupported_capability");
        assert!(err.is_user_visible());
        assert!(!err.is_retryable());
    }

    #[test]
    fn rejected_request_is_retryable_session_failure() {
        let err = ArError::from_session_failure(&HostError::RequestRejected("busy".into()));
        assert!(matches!(err, ArError::SessionRequestFailed(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn degraded_failures_stay_off_the_banner() {
        assert!(!ArError::ProbeAcquisitionFailed("x".into()).is_user_visible());
        assert!(!ArError::TeardownRace.is_user_visible());
        assert!(ArError::RenderSurfaceUnbound("no camera".into()).is_fatal());
    }
}
