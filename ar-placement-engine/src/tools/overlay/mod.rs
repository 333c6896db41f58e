//! Native overlay controls for the desktop preview.
//!
//! On a phone the page hosting the canvas draws these controls and drives the
//! engine over RPC. The desktop build has no page, so the same controls are
//! drawn with Bevy UI:
//!
//! - **Start AR**, shown while idle
//! - **Place / Undo / Clear / Exit**, shown while the session is active
//! - a status line with tracking state and placed-object count
//! - an error banner with a dismiss button
//!
//! Buttons emit the same commands the RPC layer does, tagged
//! [`CommandSource::Overlay`](crate::tools::tool_manager::CommandSource) so
//! the ghost world select they cause is suppressed.

/// Overlay button handlers.
pub mod interactions;

/// Overlay layout and per-tick reflection of engine state.
pub mod ui;

use bevy::prelude::*;

use crate::engine::core::app_state::ArSystemSet;
use interactions::overlay_button_interaction;
use ui::{reflect_error_banner, reflect_session_controls, reflect_status_text, spawn_overlay_ui};

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayAction {
    StartSession,
    Place,
    UndoLast,
    ClearAll,
    ExitSession,
    DismissError,
}

impl OverlayAction {
    pub fn label(&self) -> &'static str {
        match self {
            Self::StartSession => "Start AR",
            Self::Place => "Place",
            Self::UndoLast => "Undo",
            Self::ClearAll => "Clear",
            Self::ExitSession => "Exit",
            Self::DismissError => "Dismiss",
        }
    }

    /// Buttons shown only while a session is active.
    pub fn is_session_control(&self) -> bool {
        matches!(
            self,
            Self::Place | Self::UndoLast | Self::ClearAll | Self::ExitSession
        )
    }
}

#[derive(Component)]
pub struct OverlayButton(pub OverlayAction);

#[derive(Component)]
pub struct StatusText;

#[derive(Component)]
pub struct ErrorBannerNode;

#[derive(Component)]
pub struct ErrorBannerText;

pub struct OverlayUiPlugin;

impl Plugin for OverlayUiPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, spawn_overlay_ui)
            .add_systems(
                Update,
                overlay_button_interaction.in_set(ArSystemSet::UiCommands),
            )
            .add_systems(
                Update,
                (reflect_session_controls, reflect_status_text, reflect_error_banner)
                    .after(ArSystemSet::Status),
            );
    }
}
