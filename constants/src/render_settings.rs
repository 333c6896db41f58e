use bevy::color::Color;

/// Reticle ring radii (flat annulus laid on the tracked surface).
pub const RETICLE_INNER_RADIUS: f32 = 0.15;
pub const RETICLE_OUTER_RADIUS: f32 = 0.2;
pub const RETICLE_COLOUR: Color = Color::srgba(0.0, 1.0, 0.0, 0.8);

/// Pulse applied to the reticle scale while visible: 1 + amplitude * sin(t * rate).
pub const RETICLE_PULSE_AMPLITUDE: f32 = 0.2;
pub const RETICLE_PULSE_RATE: f32 = 5.0;

pub const POINTER_RADIUS: f32 = 0.02;
pub const POINTER_COLOUR: Color = Color::srgb(0.8, 0.8, 0.8);

/// Placed objects are drawn this far above the captured surface pose.
pub const OBJECT_LIFT: f32 = 0.05;

/// Placed objects grow from nothing to full size over this long.
pub const OBJECT_SCALE_IN_SECS: f32 = 1.0 / 3.0;
/// Vertical bob around the resting height: amplitude * sin(t * rate + phase).
pub const OBJECT_BOB_AMPLITUDE: f32 = 0.02;
pub const OBJECT_BOB_RATE: f32 = 3.0;
/// Slow spin about the vertical axis, radians per second.
pub const OBJECT_SPIN_RATE: f32 = 0.6;

pub const OBJECT_BOX_SIZE: f32 = 0.1;
pub const OBJECT_RADIUS: f32 = 0.05;
pub const OBJECT_HEIGHT: f32 = 0.1;

/// Saturation and lightness used for random-hue object colours.
pub const RANDOM_HUE_SATURATION: f32 = 0.7;
pub const RANDOM_HUE_LIGHTNESS: f32 = 0.6;

/// Opacity of the simulated surface planes in the desktop preview.
pub const SURFACE_PLANE_COLOUR: Color = Color::srgba(0.5, 0.5, 0.5, 0.3);
