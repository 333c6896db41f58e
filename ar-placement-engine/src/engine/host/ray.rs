use bevy::prelude::*;

/// Horizontal surface patch the simulated environment sensor can detect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfacePlane {
    pub center: Vec3,
    /// Half extents along X and Z.
    pub half_size: Vec2,
}

impl SurfacePlane {
    pub fn new(center: Vec3, size: Vec2) -> Self {
        Self {
            center,
            half_size: size * 0.5,
        }
    }

    /// Distance along the ray to the plane patch, if hit from either side.
    pub fn ray_hit_t(&self, origin: Vec3, dir: Vec3) -> Option<f32> {
        let he = Vec3::new(self.half_size.x, PLANE_HALF_THICKNESS, self.half_size.y);
        ray_aabb_hit_t(origin, dir, self.center - he, self.center + he)
    }
}

const PLANE_HALF_THICKNESS: f32 = 1e-4;

// Slab-method ray–AABB intersection, returns Some(t) or None
pub fn ray_aabb_hit_t(ray_origin: Vec3, ray_direction: Vec3, min: Vec3, max: Vec3) -> Option<f32> {
    let inv = Vec3::new(
        if ray_direction.x != 0.0 { 1.0 / ray_direction.x } else { f32::INFINITY },
        if ray_direction.y != 0.0 { 1.0 / ray_direction.y } else { f32::INFINITY },
        if ray_direction.z != 0.0 { 1.0 / ray_direction.z } else { f32::INFINITY },
    );

    let mut tmin = f32::NEG_INFINITY;
    let mut tmax = f32::INFINITY;
    for axis in 0..3 {
        let (o, lo, hi, i) = (ray_origin[axis], min[axis], max[axis], inv[axis]);
        if i.is_infinite() {
            // Parallel to this slab: must already lie inside it.
            if o < lo || o > hi { return None; }
            continue;
        }
        let (mut t0, mut t1) = ((lo - o) * i, (hi - o) * i);
        if t0 > t1 { std::mem::swap(&mut t0, &mut t1); }
        tmin = tmin.max(t0);
        tmax = tmax.min(t1);
        if tmin > tmax { return None; }
    }

    if tmax < 0.0 { return None; }
    Some(if tmin >= 0.0 { tmin } else { tmax })
}

/// Cast a ray against every plane, nearest hit first.
pub fn ranked_plane_hits(origin: Vec3, dir: Vec3, planes: &[SurfacePlane]) -> Vec<Vec3> {
    let mut hits: Vec<f32> = planes
        .iter()
        .filter_map(|plane| plane.ray_hit_t(origin, dir))
        .collect();
    hits.sort_by(|a, b| a.total_cmp(b));
    hits.into_iter().map(|t| origin + dir * t).collect()
}
