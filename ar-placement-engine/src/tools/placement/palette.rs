use std::hash::{BuildHasher, Hasher};

use bevy::prelude::*;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use constants::render_settings::{
    OBJECT_BOX_SIZE, OBJECT_HEIGHT, OBJECT_RADIUS, RANDOM_HUE_LIGHTNESS, RANDOM_HUE_SATURATION,
};

use crate::engine::core::config::ArConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectShape {
    Box,
    Sphere,
    Cylinder,
    Cone,
}

impl ObjectShape {
    pub fn mesh(&self) -> Mesh {
        match self {
            Self::Box => Cuboid::from_length(OBJECT_BOX_SIZE).into(),
            Self::Sphere => Sphere::new(OBJECT_RADIUS).into(),
            Self::Cylinder => Cylinder::new(OBJECT_RADIUS, OBJECT_HEIGHT).into(),
            Self::Cone => Cone::new(OBJECT_RADIUS, OBJECT_HEIGHT).into(),
        }
    }
}

/// One palette slot. A missing colour means a random hue per object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaletteEntry {
    pub shape: ObjectShape,
    /// Hex sRGB, e.g. `"#ff6b6b"`.
    #[serde(default)]
    pub colour: Option<String>,
}

/// Shapes and colours placed objects are drawn from (`placement_palette.json`).
#[derive(Asset, TypePath, Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementPalette {
    pub entries: Vec<PaletteEntry>,
}

impl Default for PlacementPalette {
    fn default() -> Self {
        let entry = |shape, colour: &str| PaletteEntry {
            shape,
            colour: Some(colour.to_string()),
        };
        Self {
            entries: vec![
                entry(ObjectShape::Box, "#ff6b6b"),
                entry(ObjectShape::Sphere, "#4ecdc4"),
                entry(ObjectShape::Cylinder, "#45b7d1"),
                entry(ObjectShape::Cone, "#ffa07a"),
            ],
        }
    }
}

/// Shape, colour and orientation chosen when an object is placed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisualDescriptor {
    pub shape: ObjectShape,
    pub colour: Color,
    pub rotation: Quat,
}

impl PlacementPalette {
    pub fn pick(&self, rng: &mut impl Rng) -> VisualDescriptor {
        let entry = match self.entries.len() {
            0 => None,
            len => self.entries.get(rng.gen_range(0..len)),
        };
        let shape = entry.map(|e| e.shape).unwrap_or(ObjectShape::Box);
        let colour = entry
            .and_then(|e| e.colour.as_deref())
            .and_then(|hex| Srgba::hex(hex).ok())
            .map(Color::from)
            .unwrap_or_else(|| random_hue(rng));

        let pi = std::f32::consts::PI;
        let rotation = Quat::from_euler(
            EulerRot::XYZ,
            rng.gen_range(0.0..pi),
            rng.gen_range(0.0..pi),
            rng.gen_range(0.0..pi),
        );

        VisualDescriptor {
            shape,
            colour,
            rotation,
        }
    }
}

fn random_hue(rng: &mut impl Rng) -> Color {
    Color::hsl(
        rng.gen_range(0.0..360.0),
        RANDOM_HUE_SATURATION,
        RANDOM_HUE_LIGHTNESS,
    )
}

/// Randomness behind visual descriptors, seeded from config when set.
#[derive(Resource)]
pub struct PlacementRng(pub SmallRng);

impl FromWorld for PlacementRng {
    fn from_world(world: &mut World) -> Self {
        let seed = world
            .get_resource::<ArConfig>()
            .and_then(|config| config.rng_seed)
            .unwrap_or_else(|| {
                std::collections::hash_map::RandomState::new()
                    .build_hasher()
                    .finish()
            });
        Self(SmallRng::seed_from_u64(seed))
    }
}

/// Palette asset being loaded from disk, applied once ready.
#[derive(Resource, Default)]
pub struct PaletteLoader {
    pub handle: Option<Handle<PlacementPalette>>,
    pub loaded: bool,
}

pub fn start_palette_loading(
    mut loader: ResMut<PaletteLoader>,
    asset_server: Res<AssetServer>,
    config: Res<ArConfig>,
) {
    info!("Loading placement palette from: {}", config.palette_path);
    loader.handle = Some(asset_server.load(config.palette_path.as_str()));
}

pub fn apply_loaded_palette(
    mut loader: ResMut<PaletteLoader>,
    palettes: Res<Assets<PlacementPalette>>,
    mut active: ResMut<PlacementPalette>,
) {
    if loader.loaded {
        return;
    }
    let Some(palette) = loader.handle.as_ref().and_then(|h| palettes.get(h)) else {
        return;
    };
    if palette.entries.is_empty() {
        warn!("Placement palette is empty, keeping built-in palette");
    } else {
        info!("Placement palette loaded ({} entries)", palette.entries.len());
        *active = palette.clone();
    }
    loader.loaded = true;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_picks_are_reproducible() {
        let palette = PlacementPalette::default();
        let mut a = SmallRng::seed_from_u64(42);
        let mut b = SmallRng::seed_from_u64(42);
        for _ in 0..20 {
            assert_eq!(palette.pick(&mut a), palette.pick(&mut b));
        }
    }

    #[test]
    fn entry_without_colour_gets_random_hue() {
        let palette: PlacementPalette =
            serde_json::from_str(r#"{ "entries": [ { "shape": "cone" } ] }"#).unwrap();
        let mut rng = SmallRng::seed_from_u64(1);
        let descriptor = palette.pick(&mut rng);
        assert_eq!(descriptor.shape, ObjectShape::Cone);

        let hsl = Hsla::from(descriptor.colour);
        assert!((hsl.saturation - RANDOM_HUE_SATURATION).abs() < 1e-3);
        assert!((hsl.lightness - RANDOM_HUE_LIGHTNESS).abs() < 1e-3);
    }

    #[test]
    fn empty_palette_still_yields_a_box() {
        let palette = PlacementPalette { entries: Vec::new() };
        let mut rng = SmallRng::seed_from_u64(3);
        assert_eq!(palette.pick(&mut rng).shape, ObjectShape::Box);
    }
}
