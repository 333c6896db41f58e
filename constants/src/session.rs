/// Feature every session request must carry.
pub const FEATURE_HIT_TEST: &str = "hit-test";

/// Overlay UI binding, requested opportunistically.
pub const FEATURE_DOM_OVERLAY: &str = "dom-overlay";

/// Reference space poses are reported in.
pub const REFERENCE_SPACE_LOCAL: &str = "local";

/// Space the hit-test probe ray is cast from.
pub const PROBE_SPACE_VIEWER: &str = "viewer";

/// Ticks a UI-armed select suppression stays valid without being consumed.
pub const SELECT_SUPPRESSION_FRAMES: u32 = 2;

/// Abandoned acquisitions kept waiting for a late resolution before the oldest is dropped.
pub const MAX_ORPHANED_ACQUISITIONS: usize = 8;

/// Environment variable naming a JSON config file.
pub const CONFIG_ENV_VAR: &str = "AR_PLACEMENT_CONFIG";

pub const PALETTE_ASSET_PATH: &str = "placement_palette.json";

pub const DEFAULT_LOG_FILTER: &str = "wgpu=error,naga=warn,ar_placement_engine=info";
