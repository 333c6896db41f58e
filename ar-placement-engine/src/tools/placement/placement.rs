use bevy::ecs::system::SystemParam;
use bevy::prelude::*;

use super::motion::PlacedMotion;
use super::palette::{PlacementPalette, PlacementRng};
use super::state::{PlacedObject, PlacedObjectId, PlacedObjects, PlacedRecord};
use crate::engine::core::config::ArConfig;
use crate::engine::tracking::pose::TrackedPose;

/// Sole mutator of [`PlacedObjects`].
///
/// Owns creation and disposal of placed objects together with the mesh and
/// material each one retains.
#[derive(SystemParam)]
pub struct PlacementManager<'w, 's> {
    commands: Commands<'w, 's>,
    placed: ResMut<'w, PlacedObjects>,
    meshes: ResMut<'w, Assets<Mesh>>,
    materials: ResMut<'w, Assets<StandardMaterial>>,
    palette: Res<'w, PlacementPalette>,
    rng: ResMut<'w, PlacementRng>,
    config: Res<'w, ArConfig>,
    time: Res<'w, Time>,
}

impl PlacementManager<'_, '_> {
    pub fn placed_count(&self) -> usize {
        self.placed.len()
    }

    /// Anchor a new object at the tracked pose. `None` when nothing is tracked.
    pub fn place(&mut self, tracked: &TrackedPose) -> Option<PlacedObjectId> {
        let pose = tracked.pose()?;
        let descriptor = self.palette.pick(&mut self.rng.0);
        let id = self.placed.allocate_id();

        let mesh = self.meshes.add(descriptor.shape.mesh());
        let material = self.materials.add(StandardMaterial {
            base_color: descriptor.colour,
            ..default()
        });
        let rest = Transform::from_translation(
            pose.translation() + Vec3::Y * self.config.object_lift,
        )
        .with_rotation(descriptor.rotation);
        let motion = PlacedMotion {
            rest,
            spawned_secs: self.time.elapsed_secs(),
            phase: id.0 as f32,
        };
        let transform = if self.config.object_motion {
            motion.transform_at(motion.spawned_secs)
        } else {
            rest
        };

        let entity = self
            .commands
            .spawn((
                PlacedObject { id, pose },
                motion,
                Name::new(format!("PlacedObject{}", id.0)),
                Mesh3d(mesh.clone()),
                MeshMaterial3d(material.clone()),
                transform,
            ))
            .id();

        self.placed.push(PlacedRecord {
            id,
            pose,
            descriptor,
            entity,
            mesh,
            material,
        });
        info!(
            "Placed {:?} #{} at {:?} ({} placed)",
            descriptor.shape,
            id.0,
            pose.translation(),
            self.placed.len()
        );
        Some(id)
    }

    /// Remove the most recently placed object.
    pub fn undo_last(&mut self) -> Option<PlacedObjectId> {
        let record = self.placed.pop()?;
        let id = record.id;
        self.dispose(record);
        info!("Removed object #{} ({} placed)", id.0, self.placed.len());
        Some(id)
    }

    /// Remove every placed object. Returns how many were removed.
    pub fn clear_all(&mut self) -> usize {
        let records = self.placed.drain();
        let removed = records.len();
        for record in records {
            self.dispose(record);
        }
        if removed > 0 {
            info!("Cleared {} placed objects", removed);
        }
        removed
    }

    fn dispose(&mut self, record: PlacedRecord) {
        self.commands.entity(record.entity).despawn();
        self.meshes.remove(&record.mesh);
        self.materials.remove(&record.material);
    }
}
