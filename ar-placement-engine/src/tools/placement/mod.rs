//! Placed-object management.
//!
//! Objects are anchored at the pose tracked when the placement was confirmed
//! and never follow tracking afterwards. Each owns its own mesh and material;
//! undo and clear release them together with the entity.
//!
//! ## Command Flow
//!
//! ```text
//! Overlay / RPC / keyboard          host frame
//!   └─> PlacementCommand              └─> WorldSelectEvent
//!       └─> handle_placement_commands     └─> handle_world_selects
//!           ├─> arm SelectSuppression         ├─> consume suppression, or
//!           └─> PlacementManager              └─> PlacementManager::place
//! ```

/// Scale-in, bob and spin of placed objects.
pub mod motion;

/// Shapes, colours and the seeded RNG behind visual descriptors.
pub mod palette;

/// Placement manager system parameter.
pub mod placement;

/// Placed-object collection and identifiers.
pub mod state;

use bevy::prelude::*;

use crate::engine::core::app_state::{ArSystemSet, SessionState};
use crate::tools::input::{
    SelectSuppression, WorldSelectEvent, advance_select_suppression, clear_select_suppression,
    handle_world_selects,
};
use crate::tools::tool_manager::{PlacementCommand, handle_placement_commands};
use motion::animate_placed_objects;
use palette::{PlacementPalette, PlacementRng};
use placement::PlacementManager;
use state::PlacedObjects;

pub struct PlacementToolPlugin;

impl Plugin for PlacementToolPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PlacedObjects>()
            .init_resource::<PlacementPalette>()
            .init_resource::<PlacementRng>()
            .init_resource::<SelectSuppression>()
            .add_event::<PlacementCommand>()
            .add_event::<WorldSelectEvent>()
            .add_systems(
                Update,
                (handle_placement_commands, handle_world_selects)
                    .chain()
                    .in_set(ArSystemSet::Placement),
            )
            .add_systems(
                Update,
                animate_placed_objects.in_set(ArSystemSet::Presentation),
            )
            .add_systems(
                Update,
                advance_select_suppression.in_set(ArSystemSet::Status),
            )
            .add_systems(
                OnEnter(SessionState::Idle),
                (clear_placed_objects, clear_select_suppression),
            );
    }
}

fn clear_placed_objects(mut placement: PlacementManager) {
    placement.clear_all();
}
