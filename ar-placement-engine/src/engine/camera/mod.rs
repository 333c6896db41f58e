//! Desktop stand-in for moving a phone around.
//!
//! Drives the simulated host's viewer pose from keyboard and mouse so the
//! hit-test reticle can be swept across the simulated surfaces.

/// Viewer pose resource and its input controller.
pub mod viewer_controller;
