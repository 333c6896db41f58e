/// Grid overlay for the simulated device's surface planes
use bevy::asset::RenderAssetUsages;
use bevy::prelude::*;
use bevy::render::mesh::{Indices, PrimitiveTopology};
use constants::render_settings::SURFACE_PLANE_COLOUR;

use crate::engine::host::ray::SurfacePlane;

#[derive(Component)]
pub struct SurfaceGrid;

/// Target cell size in metres
const GRID_CELL_SIZE: f32 = 0.5;

/// Spawn one line grid per plane so the preview shows where hits can land
pub fn create_surface_grids(
    commands: &mut Commands,
    planes: &[SurfacePlane],
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
) {
    let grid_material = materials.add(StandardMaterial {
        base_color: SURFACE_PLANE_COLOUR,
        alpha_mode: AlphaMode::Blend,
        unlit: true,
        ..default()
    });

    for plane in planes {
        commands.spawn((
            SurfaceGrid,
            Name::new("SurfaceGrid"),
            Mesh3d(meshes.add(create_plane_grid_mesh(plane))),
            MeshMaterial3d(grid_material.clone()),
            Transform::default(),
        ));
    }
}

/// Line-list mesh covering the plane, lines on both axes
pub fn create_plane_grid_mesh(plane: &SurfacePlane) -> Mesh {
    let min = plane.center.xz() - plane.half_size;
    let max = plane.center.xz() + plane.half_size;
    let y = plane.center.y;

    // Ensure at least one cell per axis
    let cells_x = ((max.x - min.x) / GRID_CELL_SIZE).round().max(1.0) as u32;
    let cells_z = ((max.y - min.y) / GRID_CELL_SIZE).round().max(1.0) as u32;

    let mut vertices: Vec<[f32; 3]> = Vec::new();
    let mut indices: Vec<u32> = Vec::new();
    let mut push_line = |a: [f32; 3], b: [f32; 3]| {
        let base = vertices.len() as u32;
        vertices.push(a);
        vertices.push(b);
        indices.extend_from_slice(&[base, base + 1]);
    };

    // Lines running along Z, fixed X positions
    for i in 0..=cells_x {
        let x = min.x + i as f32 * (max.x - min.x) / cells_x as f32;
        push_line([x, y, min.y], [x, y, max.y]);
    }

    // Lines running along X, fixed Z positions
    for i in 0..=cells_z {
        let z = min.y + i as f32 * (max.y - min.y) / cells_z as f32;
        push_line([min.x, y, z], [max.x, y, z]);
    }

    let mut mesh = Mesh::new(PrimitiveTopology::LineList, RenderAssetUsages::RENDER_WORLD);
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, vertices);
    mesh.insert_indices(Indices::U32(indices));
    mesh
}
