//! Surface tracking.
//!
//! Converts the host's per-frame hit-test candidates into a single
//! [`TrackedPose`]. The tracker owns the session's hit-test source from its
//! lazy acquisition on the first active frame until the session leaves
//! `Active`.

/// Hit-test source lifecycle and per-frame pose selection.
pub mod hit_test;

/// Pose type and the tracked-pose resource.
pub mod pose;

use bevy::prelude::*;

use crate::engine::core::app_state::{ArSystemSet, SessionState};
use hit_test::{
    HitTestTracker, release_orphaned_probes, reset_tracked_pose, teardown_probe_source,
    update_hit_test,
};
use pose::TrackedPose;

pub struct TrackingPlugin;

impl Plugin for TrackingPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<HitTestTracker>()
            .init_resource::<TrackedPose>()
            .add_systems(
                Update,
                (
                    update_hit_test.run_if(in_state(SessionState::Active)),
                    release_orphaned_probes,
                )
                    .chain()
                    .in_set(ArSystemSet::Tracking),
            )
            .add_systems(OnExit(SessionState::Active), teardown_probe_source)
            .add_systems(OnEnter(SessionState::Idle), reset_tracked_pose);
    }
}
