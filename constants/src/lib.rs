//! Shared constants for the AR placement engine.
//!
//! Visual dimensions are in metres, expressed in the session reference space.

pub mod render_settings;
pub mod session;
