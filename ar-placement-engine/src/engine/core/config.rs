//! Runtime configuration.
//!
//! Every field defaults to the values in the `constants` crate, so a partial
//! JSON file only needs the keys it overrides.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use constants::render_settings::OBJECT_LIFT;
use constants::session::{
    CONFIG_ENV_VAR, FEATURE_DOM_OVERLAY, FEATURE_HIT_TEST, PALETTE_ASSET_PATH,
    PROBE_SPACE_VIEWER, REFERENCE_SPACE_LOCAL, SELECT_SUPPRESSION_FRAMES,
};

use crate::engine::host::SessionRequest;
use crate::error::ArError;

#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArConfig {
    pub required_features: Vec<String>,
    pub optional_features: Vec<String>,
    pub reference_space: String,
    /// Space the hit-test ray is cast from.
    pub probe_space: String,
    /// Retry a failed request once without the optional features.
    pub retry_without_optional: bool,
    /// Render height of placed objects above their captured pose.
    pub object_lift: f32,
    pub reticle_pulse: bool,
    /// Scale-in, bob and spin of placed objects. Never moves the captured pose.
    pub object_motion: bool,
    pub select_suppression_frames: u32,
    /// Fixed seed for visual descriptors; `None` seeds from entropy.
    pub rng_seed: Option<u64>,
    pub palette_path: String,
    pub status_notifications: bool,
}

impl Default for ArConfig {
    fn default() -> Self {
        Self {
            required_features: vec![FEATURE_HIT_TEST.to_string()],
            optional_features: vec![FEATURE_DOM_OVERLAY.to_string()],
            reference_space: REFERENCE_SPACE_LOCAL.to_string(),
            probe_space: PROBE_SPACE_VIEWER.to_string(),
            retry_without_optional: true,
            object_lift: OBJECT_LIFT,
            reticle_pulse: true,
            object_motion: true,
            select_suppression_frames: SELECT_SUPPRESSION_FRAMES,
            rng_seed: None,
            palette_path: PALETTE_ASSET_PATH.to_string(),
            status_notifications: true,
        }
    }
}

impl ArConfig {
    pub fn session_request(&self) -> SessionRequest {
        SessionRequest {
            required_features: self.required_features.clone(),
            optional_features: self.optional_features.clone(),
            reference_space: self.reference_space.clone(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ArError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ArError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn load(path: &std::path::Path) -> Result<Self, ArError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| ArError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }

    /// Config named by the environment, or defaults with the load error.
    pub fn from_env() -> (Self, Option<ArError>) {
        #[cfg(not(target_arch = "wasm32"))]
        {
            let Ok(path) = std::env::var(CONFIG_ENV_VAR) else {
                return (Self::default(), None);
            };
            match Self::load(std::path::Path::new(&path)) {
                Ok(config) => {
                    info!("Loaded AR config from {}", path);
                    (config, None)
                }
                Err(e) => (Self::default(), Some(e)),
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let _ = CONFIG_ENV_VAR;
            (Self::default(), None)
        }
    }

    fn validate(&self) -> Result<(), ArError> {
        if self.required_features.is_empty() {
            return Err(ArError::Config("required_features must not be empty".into()));
        }
        if self.reference_space.is_empty() || self.probe_space.is_empty() {
            return Err(ArError::Config("space names must not be empty".into()));
        }
        if !self.object_lift.is_finite() {
            return Err(ArError::Config("object_lift must be finite".into()));
        }
        Ok(())
    }
}
