use bevy::prelude::*;

use super::{ErrorBannerNode, ErrorBannerText, OverlayAction, OverlayButton, StatusText};
use crate::engine::core::app_state::SessionState;
use crate::engine::systems::status_tracking::{ArUiStatus, ErrorBanner};

const SESSION_CONTROLS: [OverlayAction; 4] = [
    OverlayAction::Place,
    OverlayAction::UndoLast,
    OverlayAction::ClearAll,
    OverlayAction::ExitSession,
];

// Spawns the overlay: status line, error banner and a bottom button row
pub fn spawn_overlay_ui(mut commands: Commands) {
    commands
        .spawn((
            Name::new("ArOverlay"),
            Node {
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                position_type: PositionType::Absolute,
                display: Display::Flex,
                flex_direction: FlexDirection::Column,
                justify_content: JustifyContent::SpaceBetween,
                padding: UiRect::all(Val::Px(12.0)),
                ..default()
            },
        ))
        .with_children(|parent| {
            parent
                .spawn((
                    Name::new("Header"),
                    Node {
                        display: Display::Flex,
                        flex_direction: FlexDirection::Column,
                        row_gap: Val::Px(8.0),
                        ..default()
                    },
                ))
                .with_children(|header| {
                    header.spawn((
                        StatusText,
                        Name::new("Status"),
                        Text::new(""),
                        TextFont { font_size: 18.0, ..default() },
                        TextColor(Color::srgb(1.0, 1.0, 1.0)),
                    ));

                    header
                        .spawn((
                            ErrorBannerNode,
                            Name::new("ErrorBanner"),
                            BackgroundColor(Color::srgb(0.28, 0.10, 0.10)),
                            Node {
                                display: Display::None,
                                align_items: AlignItems::Center,
                                justify_content: JustifyContent::SpaceBetween,
                                padding: UiRect::axes(Val::Px(12.0), Val::Px(8.0)),
                                column_gap: Val::Px(8.0),
                                ..default()
                            },
                        ))
                        .with_children(|banner| {
                            banner.spawn((
                                ErrorBannerText,
                                Text::new(""),
                                TextFont { font_size: 16.0, ..default() },
                                TextColor(Color::srgb(1.0, 1.0, 1.0)),
                            ));
                            spawn_button(banner, OverlayAction::DismissError, Display::Flex);
                        });
                });

            parent
                .spawn((
                    Name::new("Controls"),
                    Node {
                        display: Display::Flex,
                        justify_content: JustifyContent::Center,
                        column_gap: Val::Px(8.0),
                        ..default()
                    },
                ))
                .with_children(|controls| {
                    spawn_button(controls, OverlayAction::StartSession, Display::Flex);
                    for action in SESSION_CONTROLS {
                        spawn_button(controls, action, Display::None);
                    }
                });
        });
}

fn spawn_button(parent: &mut ChildSpawnerCommands, action: OverlayAction, display: Display) {
    parent
        .spawn((
            OverlayButton(action),
            Button,
            Name::new(action.label()),
            BackgroundColor(Color::srgb(0.22, 0.24, 0.28)),
            BorderColor(Color::srgba(0.0, 0.0, 0.0, 0.25)),
            Node {
                min_width: Val::Px(96.0),
                height: Val::Px(36.0),
                display,
                align_items: AlignItems::Center,
                justify_content: JustifyContent::Center,
                padding: UiRect::horizontal(Val::Px(12.0)),
                border: UiRect::all(Val::Px(1.0)),
                ..default()
            },
        ))
        .with_children(|btn| {
            btn.spawn((
                Text::new(action.label()),
                TextFont { font_size: 16.0, ..default() },
                TextColor(Color::srgb(1.0, 1.0, 1.0)),
            ));
        });
}

/// Start is offered only while idle; the placement row only while active.
pub fn reflect_session_controls(
    state: Res<State<SessionState>>,
    mut buttons: Query<(&OverlayButton, &mut Node)>,
) {
    if !state.is_changed() { return; }

    for (button, mut node) in &mut buttons {
        let visible = match button.0 {
            OverlayAction::StartSession => *state.get() == SessionState::Idle,
            action if action.is_session_control() => *state.get() == SessionState::Active,
            _ => continue,
        };
        node.display = if visible { Display::Flex } else { Display::None };
    }
}

pub fn reflect_status_text(
    status: Res<ArUiStatus>,
    state: Res<State<SessionState>>,
    mut q: Query<&mut Text, With<StatusText>>,
) {
    if !status.is_changed() && !state.is_changed() { return; }

    let line = match *state.get() {
        SessionState::Active => format!(
            "{} | Objects: {}",
            if status.tracking_state { "Tracking" } else { "Searching for surface..." },
            status.placed_count
        ),
        SessionState::Requesting => "Starting AR session...".to_string(),
        SessionState::Ending => "Ending session...".to_string(),
        SessionState::Idle => String::new(),
    };
    for mut text in &mut q {
        *text = Text::new(line.clone());
    }
}

pub fn reflect_error_banner(
    banner: Res<ErrorBanner>,
    mut nodes: Query<&mut Node, With<ErrorBannerNode>>,
    mut texts: Query<&mut Text, With<ErrorBannerText>>,
) {
    if !banner.is_changed() { return; }

    if let Ok(mut node) = nodes.single_mut() {
        node.display = if banner.is_visible() { Display::Flex } else { Display::None };
    }
    if let Ok(mut text) = texts.single_mut() {
        *text = Text::new(banner.message().unwrap_or_default());
    }
}
