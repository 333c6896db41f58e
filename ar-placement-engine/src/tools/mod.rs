//! User-facing interaction: placement commands, world selects and the
//! native overlay.
//!
//! ## Command Sources
//!
//! Placement operations reach the engine from three places:
//!
//! - **Overlay**: buttons drawn by the page (RPC) or by [`overlay`] on desktop
//! - **RPC**: `place`, `undo`, `clear` and `placement_action` from the page
//! - **Keyboard**: desktop shortcuts (`Space` place, `U` undo, `C` clear,
//!   `Enter` start, `Escape` exit)
//!
//! Overlay and RPC commands share the select channel with the world on a
//! phone, so they arm [`input::SelectSuppression`] before running. Keyboard
//! input never produces a world select and does not arm it.
//!
//! ## World Selects
//!
//! A `select` arriving with a device frame places one object at the tracked
//! pose, unless it is the echo of a UI tap.

/// World select handling and UI/world disambiguation.
pub mod input;

/// Native Bevy UI overlay (desktop preview only).
pub mod overlay;

/// Placed-object management, palette and visual descriptors.
pub mod placement;

/// Placement command events and keyboard shortcuts.
pub mod tool_manager;
