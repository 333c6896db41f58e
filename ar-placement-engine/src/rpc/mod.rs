//! JSON-RPC 2.0 communication layer for the page hosting the AR canvas.
//!
//! The page draws the overlay chrome (start button, placement controls,
//! error banner) and talks to Bevy via iframe postMessage, supporting both
//! request-response and notification patterns.
//!
//! ## Message Flow
//!
//! ```text
//! Page (Parent Window)   <──postMessage──>  Bevy (iframe)
//!        │                                        │
//!        ├─ Request (with ID) ──────────────────> │
//!        │                                        ├─ Process request
//!        │ <───────────────── Response (with ID) ─┤
//!        │                                        │
//!        │ <────────── Notification (no ID) ─────┤
//! ```
//!
//! Requests are handled in the `UiCommands` set at the start of a tick;
//! queued notifications and responses go out at the end of the `Status` set.
//!
//! ## Methods
//!
//! ### Session
//! - `check_support`: Cached capability result, or `{"pending": true}` and a
//!   fresh check answered by an `ar_support` notification
//! - `start_session`: Start from idle (deferred until the check resolves)
//! - `exit`: Stop the requesting or active session
//!
//! ### Placement
//! - `place`, `undo`, `clear`: Overlay placement controls
//! - `placement_action`: Same, with `{"action": "place" | "undo" | "clear"}`
//!
//! ### Status
//! - `get_status`: `{tracking_state, placed_count, ready, session_state, supported, error}`
//! - `dismiss_error`: Hide the error banner
//!
//! ## Notifications
//!
//! - `ar_status`: Status object, sent whenever it changes
//! - `session_state`: `{state}` on every session transition
//! - `ar_support`: Capability check result
//! - `ar_error`: `{kind, message, user_visible, retryable, fatal}`
//! - `frame_stats`: `{device_fps, session_frames}` every half second while active
//!
//! ## Error Handling
//!
//! Standard JSON-RPC 2.0 error codes:
//! - `-32601`: Method not found
//! - `-32602`: Invalid params
//! - `-32603`: Internal error

/// JSON-RPC 2.0 bidirectional communication system for page integration.
///
/// Handles request-response patterns, notifications, and WASM message listeners.
pub mod web_rpc;
