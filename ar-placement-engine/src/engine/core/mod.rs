//! Core application setup and state management.
//!
//! Handles application lifecycle, window configuration, session state,
//! per-tick system ordering and runtime configuration for both native and
//! WASM targets.

/// Windowed application setup and plugin configuration.
///
/// Creates the main app with the AR engine, the simulated device, desktop
/// input and the native overlay.
pub mod app_setup;

/// Session state machine and per-tick system set ordering.
pub mod app_state;

/// Serde-backed runtime configuration with constant defaults.
pub mod config;

/// Platform-specific window configuration for native and WASM builds.
///
/// Configures canvas integration for web targets and vsync settings.
pub mod window_config;
