use bevy::prelude::*;
use bevy::state::state::StateTransitionEvent;

/// Lifecycle of the AR session.
///
/// `Idle → Requesting → Active → Ending → Idle`. Only the session systems set
/// this state; everything else reads it.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash, States)]
pub enum SessionState {
    #[default]
    Idle,
    Requesting,
    Active,
    Ending,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Requesting => "requesting",
            Self::Active => "active",
            Self::Ending => "ending",
        }
    }
}

/// Per-tick ordering of the AR systems.
///
/// Within one tick every set runs to completion before the next one starts,
/// and a state change requested in `Session` takes effect on the next tick.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArSystemSet {
    /// RPC, overlay buttons and desktop input turn into commands.
    UiCommands,
    Session,
    FrameDelivery,
    Tracking,
    Placement,
    Presentation,
    Draw,
    /// Error reporting, UI status and outgoing notifications.
    Status,
}

pub fn configure_ar_system_sets(app: &mut App) {
    app.configure_sets(
        Update,
        (
            ArSystemSet::UiCommands,
            ArSystemSet::Session,
            ArSystemSet::FrameDelivery,
            ArSystemSet::Tracking,
            ArSystemSet::Placement,
            ArSystemSet::Presentation,
            ArSystemSet::Draw,
            ArSystemSet::Status,
        )
            .chain(),
    );
}

// Transition logging
pub fn log_session_state_change(mut transitions: EventReader<StateTransitionEvent<SessionState>>) {
    for transition in transitions.read() {
        if let (Some(exited), Some(entered)) = (transition.exited, transition.entered) {
            if exited != entered {
                info!("→ Session {} → {}", exited.as_str(), entered.as_str());
            }
        }
    }
}
