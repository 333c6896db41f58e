use bevy::prelude::*;
use serde::Serialize;

use super::palette::VisualDescriptor;
use crate::engine::tracking::pose::Pose;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PlacedObjectId(pub u64);

/// Marker on a placed object's entity.
#[derive(Component, Debug, Clone, Copy)]
pub struct PlacedObject {
    pub id: PlacedObjectId,
    /// Pose captured at placement, never updated afterwards.
    pub pose: Pose,
}

/// A placed object and the rendering resources it retains.
#[derive(Debug, Clone)]
pub struct PlacedRecord {
    pub id: PlacedObjectId,
    pub pose: Pose,
    pub descriptor: VisualDescriptor,
    pub entity: Entity,
    pub(super) mesh: Handle<Mesh>,
    pub(super) material: Handle<StandardMaterial>,
}

/// Placed objects in insertion order.
///
/// Only the placement manager mutates it; undo removes from the back.
#[derive(Resource, Default)]
pub struct PlacedObjects {
    records: Vec<PlacedRecord>,
    next_id: u64,
}

impl PlacedObjects {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlacedRecord> {
        self.records.iter()
    }

    pub fn last(&self) -> Option<&PlacedRecord> {
        self.records.last()
    }

    pub(super) fn allocate_id(&mut self) -> PlacedObjectId {
        let id = PlacedObjectId(self.next_id);
        self.next_id += 1;
        id
    }

    pub(super) fn push(&mut self, record: PlacedRecord) {
        self.records.push(record);
    }

    pub(super) fn pop(&mut self) -> Option<PlacedRecord> {
        self.records.pop()
    }

    pub(super) fn drain(&mut self) -> Vec<PlacedRecord> {
        std::mem::take(&mut self.records)
    }
}
