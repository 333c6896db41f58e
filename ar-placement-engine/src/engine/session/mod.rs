//! AR session lifecycle.
//!
//! The capability prober gates `start()`; the session manager owns the
//! `Idle → Requesting → Active → Ending → Idle` machine, the render-surface
//! binding and the termination watch.
//!
//! ## Teardown
//!
//! Every path back to `Idle` (explicit stop, device termination, request
//! failure, unbound render surface) runs the same `OnEnter(Idle)` schedule.
//! Dependent plugins register their resets there.

/// One-shot AR capability checks.
pub mod capability;

/// Session state machine systems and lifecycle events.
pub mod session_manager;

use bevy::prelude::*;

use crate::engine::core::app_state::{ArSystemSet, SessionState};
use capability::{
    CapabilityProber, CheckSupport, SupportChecked, begin_support_check, poll_support_check,
};
use session_manager::{
    SessionCommand, SessionEnded, SessionManager, SessionStarted, announce_session_end,
    finish_session_end, handle_session_commands, poll_session_request,
    release_orphaned_sessions, watch_session_termination,
};

pub struct SessionPlugin;

impl Plugin for SessionPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CapabilityProber>()
            .init_resource::<SessionManager>()
            .add_event::<CheckSupport>()
            .add_event::<SupportChecked>()
            .add_event::<SessionCommand>()
            .add_event::<SessionStarted>()
            .add_event::<SessionEnded>()
            .add_systems(Startup, request_initial_support_check)
            .add_systems(
                Update,
                (
                    begin_support_check,
                    poll_support_check,
                    handle_session_commands,
                    poll_session_request.run_if(in_state(SessionState::Requesting)),
                    watch_session_termination.run_if(in_state(SessionState::Active)),
                    finish_session_end.run_if(in_state(SessionState::Ending)),
                    release_orphaned_sessions,
                )
                    .chain()
                    .in_set(ArSystemSet::Session),
            )
            .add_systems(OnEnter(SessionState::Idle), announce_session_end);
    }
}

fn request_initial_support_check(mut checks: EventWriter<CheckSupport>) {
    checks.write(CheckSupport);
}
