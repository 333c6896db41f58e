use bevy::asset::AssetMetaCheck;
use bevy::log::LogPlugin;
use bevy::prelude::*;
use bevy_common_assets::json::JsonAssetPlugin;
use constants::session::DEFAULT_LOG_FILTER;

use crate::engine::ArEnginePlugin;
use crate::engine::camera::viewer_controller::{SimulatedViewer, viewer_controller};
use crate::engine::core::app_state::ArSystemSet;
use crate::engine::core::window_config::create_window_config;
use crate::engine::host::ArHostResource;
use crate::engine::host::simulated::{SimulatedHost, SimulatedHostControl};
use crate::engine::scene::frame_loop::ArCamera;
use crate::engine::scene::surface_grid::create_surface_grids;
use crate::tools::placement::palette::{
    PaletteLoader, PlacementPalette, apply_loaded_palette, start_palette_loading,
};
use crate::tools::tool_manager::handle_keyboard_shortcuts;

#[cfg(not(target_arch = "wasm32"))]
use crate::tools::input::forward_clicks_to_host;
#[cfg(not(target_arch = "wasm32"))]
use crate::tools::overlay::OverlayUiPlugin;

pub fn create_app() -> App {
    let mut app = App::new();

    let host = SimulatedHost::new();
    let control = SimulatedHostControl(host.handle());

    app.add_plugins(create_default_plugins())
        // Registers PlacementPalette as a loadable asset type from JSON files.
        .add_plugins(JsonAssetPlugin::<PlacementPalette>::new(&["json"]))
        .insert_resource(ArHostResource::new(host))
        .insert_resource(control)
        .add_plugins(ArEnginePlugin::from_env());

    app.init_resource::<PaletteLoader>()
        .init_resource::<SimulatedViewer>()
        .add_systems(Startup, (setup, start_palette_loading))
        .add_systems(Update, apply_loaded_palette)
        .add_systems(
            Update,
            (handle_keyboard_shortcuts, viewer_controller).in_set(ArSystemSet::UiCommands),
        );

    // Native overlay and click forwarding; the page provides both on the web.
    #[cfg(not(target_arch = "wasm32"))]
    {
        app.add_plugins(OverlayUiPlugin).add_systems(
            Update,
            forward_clicks_to_host.in_set(ArSystemSet::UiCommands),
        );
    }

    app
}

fn spawn_lighting(commands: &mut Commands) {
    commands.spawn((
        DirectionalLight {
            shadows_enabled: true,
            ..default()
        },
        Transform::from_rotation(Quat::from_euler(
            EulerRot::ZYX,
            0.0,
            1.0,
            -std::f32::consts::FRAC_PI_4,
        )),
    ));
}

fn spawn_ar_camera(commands: &mut Commands, viewer: &SimulatedViewer) {
    commands.spawn((
        Camera3d::default(),
        ArCamera,
        Name::new("ArCamera"),
        viewer.pose().to_transform(),
    ));
}

// Startup system for the preview scene: light, camera and plane grids
fn setup(
    mut commands: Commands,
    control: Res<SimulatedHostControl>,
    viewer: Res<SimulatedViewer>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    spawn_lighting(&mut commands);
    spawn_ar_camera(&mut commands, &viewer);
    control.0.set_viewer(viewer.pose());

    create_surface_grids(
        &mut commands,
        &control.0.planes(),
        &mut meshes,
        &mut materials,
    );
}

fn create_default_plugins() -> impl PluginGroup {
    let window_config = WindowPlugin {
        primary_window: Some(create_window_config()),
        ..default()
    };

    let asset_config = AssetPlugin {
        meta_check: AssetMetaCheck::Never,
        ..default()
    };

    let log_config = LogPlugin {
        filter: DEFAULT_LOG_FILTER.to_string(),
        ..default()
    };

    DefaultPlugins
        .set(window_config)
        .set(asset_config)
        .set(log_config)
}
