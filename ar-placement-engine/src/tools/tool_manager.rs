use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::engine::core::app_state::SessionState;
#[cfg(not(target_arch = "wasm32"))]
use crate::engine::session::session_manager::SessionCommand;
use crate::engine::tracking::pose::TrackedPose;
use crate::tools::input::SelectSuppression;
use crate::tools::placement::placement::PlacementManager;

/// Placement operations the UI boundary can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementAction {
    Place,
    UndoLast,
    ClearAll,
}

impl PlacementAction {
    /// Convert string identifier to action for RPC compatibility.
    pub fn from_string(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "place" => Some(Self::Place),
            "undo" | "undo_last" => Some(Self::UndoLast),
            "clear" | "clear_all" => Some(Self::ClearAll),
            _ => None,
        }
    }

    pub fn to_string(&self) -> &'static str {
        match self {
            Self::Place => "place",
            Self::UndoLast => "undo",
            Self::ClearAll => "clear",
        }
    }
}

/// Where a command came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandSource {
    /// Native overlay button.
    Overlay,
    /// Embedding page via JSON-RPC.
    Rpc,
    Keyboard,
}

impl CommandSource {
    /// Sources whose tap may also arrive as a world select.
    pub fn shares_select_channel(&self) -> bool {
        matches!(self, Self::Overlay | Self::Rpc)
    }
}

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementCommand {
    pub action: PlacementAction,
    pub source: CommandSource,
}

/// Apply UI placement commands. Runs before world selects in the same tick.
pub fn handle_placement_commands(
    mut events: EventReader<PlacementCommand>,
    mut suppression: ResMut<SelectSuppression>,
    state: Res<State<SessionState>>,
    tracked: Res<TrackedPose>,
    mut placement: PlacementManager,
) {
    for event in events.read() {
        if *state.get() != SessionState::Active {
            debug!(
                "{} via {:?} ignored while session is {}",
                event.action.to_string(),
                event.source,
                state.get().as_str()
            );
            continue;
        }

        if event.source.shares_select_channel() {
            suppression.arm();
        }

        match event.action {
            PlacementAction::Place => {
                if placement.place(&tracked).is_none() {
                    debug!("Place via {:?} ignored: no tracked surface", event.source);
                }
            }
            PlacementAction::UndoLast => {
                placement.undo_last();
            }
            PlacementAction::ClearAll => {
                placement.clear_all();
            }
        }
    }
}

/// System handling keyboard shortcuts (native builds only).
#[cfg(not(target_arch = "wasm32"))]
pub fn handle_keyboard_shortcuts(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut placement_events: EventWriter<PlacementCommand>,
    mut session_events: EventWriter<SessionCommand>,
) {
    let shortcuts = [
        (KeyCode::Space, PlacementAction::Place),
        (KeyCode::KeyU, PlacementAction::UndoLast),
        (KeyCode::KeyC, PlacementAction::ClearAll),
    ];
    for (key, action) in shortcuts {
        if keyboard.just_pressed(key) {
            placement_events.write(PlacementCommand {
                action,
                source: CommandSource::Keyboard,
            });
        }
    }

    if keyboard.just_pressed(KeyCode::Enter) {
        session_events.write(SessionCommand::Start);
    }
    if keyboard.just_pressed(KeyCode::Escape) {
        session_events.write(SessionCommand::Stop);
    }
}

/// Placeholder system for WASM builds where keyboard shortcuts are disabled.
#[cfg(target_arch = "wasm32")]
pub fn handle_keyboard_shortcuts() {
    // No keyboard shortcuts in WASM builds - controlled via RPC only.
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rpc_names_map_to_actions() {
        assert_eq!(PlacementAction::from_string("Undo"), Some(PlacementAction::UndoLast));
        assert_eq!(PlacementAction::from_string("clear_all"), Some(PlacementAction::ClearAll));
        assert_eq!(PlacementAction::from_string("spin"), None);
    }

    #[test]
    fn only_ui_sources_arm_suppression() {
        assert!(CommandSource::Overlay.shares_select_channel());
        assert!(CommandSource::Rpc.shares_select_channel());
        assert!(!CommandSource::Keyboard.shares_select_channel());
    }
}
