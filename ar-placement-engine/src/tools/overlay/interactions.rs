use bevy::prelude::*;

use super::{OverlayAction, OverlayButton};
use crate::engine::session::session_manager::SessionCommand;
use crate::engine::systems::status_tracking::DismissError;
use crate::tools::tool_manager::{CommandSource, PlacementAction, PlacementCommand};

const BUTTON_IDLE: Color = Color::srgb(0.22, 0.24, 0.28);
const BUTTON_HOVERED: Color = Color::srgb(0.26, 0.28, 0.32);
const BUTTON_PRESSED: Color = Color::srgb(0.18, 0.20, 0.24);

// Every overlay button funnels into the same command events the RPC layer writes
pub fn overlay_button_interaction(
    mut q: Query<
        (&Interaction, &OverlayButton, &mut BackgroundColor),
        (Changed<Interaction>, With<Button>),
    >,
    mut session_events: EventWriter<SessionCommand>,
    mut placement_events: EventWriter<PlacementCommand>,
    mut dismiss_events: EventWriter<DismissError>,
) {
    for (interaction, button, mut bg) in &mut q {
        match *interaction {
            Interaction::Pressed => {
                *bg = BackgroundColor(BUTTON_PRESSED);
                match button.0 {
                    OverlayAction::StartSession => { session_events.write(SessionCommand::Start); }
                    OverlayAction::ExitSession => { session_events.write(SessionCommand::Stop); }
                    OverlayAction::DismissError => { dismiss_events.write(DismissError); }
                    OverlayAction::Place => { placement_events.write(overlay_command(PlacementAction::Place)); }
                    OverlayAction::UndoLast => { placement_events.write(overlay_command(PlacementAction::UndoLast)); }
                    OverlayAction::ClearAll => { placement_events.write(overlay_command(PlacementAction::ClearAll)); }
                }
            }
            Interaction::Hovered => *bg = BackgroundColor(BUTTON_HOVERED),
            Interaction::None    => *bg = BackgroundColor(BUTTON_IDLE),
        }
    }
}

fn overlay_command(action: PlacementAction) -> PlacementCommand {
    PlacementCommand {
        action,
        source: CommandSource::Overlay,
    }
}
