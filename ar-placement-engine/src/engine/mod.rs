//! AR session and hit-test tracking engine.
//!
//! [`ArEnginePlugin`] assembles the session lifecycle, hit-test tracking,
//! frame loop, placement and status reporting. The caller supplies the AR
//! runtime as an [`ArHostResource`](host::ArHostResource): the browser
//! bridge on a phone, or the [`SimulatedHost`](host::simulated::SimulatedHost)
//! on desktop and in tests.

pub mod camera;
pub mod core;
pub mod host;
pub mod scene;
pub mod session;
pub mod systems;
pub mod tracking;

use bevy::prelude::*;

use crate::error::{ArError, ArErrorEvent};
use crate::rpc::web_rpc::WebRpcPlugin;
use crate::tools::placement::PlacementToolPlugin;
use core::app_state::{SessionState, configure_ar_system_sets};
use core::config::ArConfig;
use scene::ScenePlugin;
use session::SessionPlugin;
use systems::StatusPlugin;
use systems::status_tracking::StartupErrors;
use tracking::TrackingPlugin;

/// Everything the engine needs besides the host and the windowing stack.
pub struct ArEnginePlugin {
    pub config: ArConfig,
    /// Problems found before the app existed, reported on the first tick.
    pub startup_errors: Vec<ArError>,
}

impl ArEnginePlugin {
    pub fn new(config: ArConfig) -> Self {
        Self {
            config,
            startup_errors: Vec::new(),
        }
    }

    /// Config from the file named by the environment, falling back to defaults.
    pub fn from_env() -> Self {
        let (config, error) = ArConfig::from_env();
        Self {
            config,
            startup_errors: error.into_iter().collect(),
        }
    }
}

impl Default for ArEnginePlugin {
    fn default() -> Self {
        Self::new(ArConfig::default())
    }
}

impl Plugin for ArEnginePlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(self.config.clone())
            .insert_resource(StartupErrors(self.startup_errors.clone()))
            .init_state::<SessionState>()
            .add_event::<ArErrorEvent>();

        configure_ar_system_sets(app);

        app.add_plugins((
            SessionPlugin,
            TrackingPlugin,
            ScenePlugin,
            PlacementToolPlugin,
            StatusPlugin,
            WebRpcPlugin,
        ));
    }
}
