use bevy::prelude::*;

use crate::engine::core::config::ArConfig;
use crate::engine::host::{
    ArHost, ArHostResource, HostFrame, OrphanedAcquisitions, Pending, ProbeHandle, SessionHandle,
};
use crate::engine::scene::frame_loop::CurrentFrame;
use crate::engine::session::session_manager::SessionManager;
use crate::engine::tracking::pose::{Pose, TrackedPose};
use crate::error::{ArError, ArErrorEvent};

/// Creation state of the session's single hit-test source.
pub enum ProbeSourceState {
    Unrequested,
    Requested(Pending<ProbeHandle>),
    Ready(ProbeHandle),
    /// Acquisition failed; tracking stays lost until the session ends.
    Failed,
}

/// Payload-free view of [`ProbeSourceState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeCreationState {
    Unrequested,
    Requested,
    Ready,
    Failed,
}

/// Turns per-frame hit-test candidates into the tracked surface pose.
#[derive(Resource)]
pub struct HitTestTracker {
    state: ProbeSourceState,
    orphans: OrphanedAcquisitions<ProbeHandle>,
    acquisitions: usize,
}

impl Default for HitTestTracker {
    fn default() -> Self {
        Self {
            state: ProbeSourceState::Unrequested,
            orphans: OrphanedAcquisitions::default(),
            acquisitions: 0,
        }
    }
}

impl HitTestTracker {
    pub fn creation_state(&self) -> ProbeCreationState {
        match self.state {
            ProbeSourceState::Unrequested => ProbeCreationState::Unrequested,
            ProbeSourceState::Requested(_) => ProbeCreationState::Requested,
            ProbeSourceState::Ready(_) => ProbeCreationState::Ready,
            ProbeSourceState::Failed => ProbeCreationState::Failed,
        }
    }

    /// Acquisitions issued over the tracker's lifetime.
    pub fn acquisitions(&self) -> usize {
        self.acquisitions
    }

    pub fn orphan_count(&self) -> usize {
        self.orphans.len()
    }

    /// Pose for one delivered frame.
    ///
    /// The first call issues the probe acquisition; calls made while it is in
    /// flight report no pose. An acquisition failure is returned exactly once,
    /// after which every call reports no pose.
    pub fn update(
        &mut self,
        host: &mut dyn ArHost,
        session: SessionHandle,
        probe_space: &str,
        frame: &HostFrame,
    ) -> Result<Option<Pose>, ArError> {
        if let ProbeSourceState::Unrequested = self.state {
            debug!("Requesting hit-test source from '{}' space", probe_space);
            self.state = ProbeSourceState::Requested(host.request_probe_source(session, probe_space));
            self.acquisitions += 1;
        }

        if let ProbeSourceState::Requested(pending) = &self.state {
            match pending.try_take() {
                None => return Ok(None),
                Some(Ok(probe)) => {
                    info!("Hit-test source ready");
                    self.state = ProbeSourceState::Ready(probe);
                }
                Some(Err(e)) => {
                    self.state = ProbeSourceState::Failed;
                    return Err(ArError::ProbeAcquisitionFailed(e.to_string()));
                }
            }
        }

        match self.state {
            // Host ranking is kept as delivered; the first candidate wins.
            ProbeSourceState::Ready(probe) => Ok(frame.hit_test_results(probe).first().copied()),
            _ => Ok(None),
        }
    }

    /// Release the probe source so the next session acquires a fresh one.
    pub fn teardown(&mut self, host: &mut dyn ArHost) {
        match std::mem::replace(&mut self.state, ProbeSourceState::Unrequested) {
            ProbeSourceState::Ready(probe) => host.release_probe_source(probe),
            ProbeSourceState::Requested(pending) => self.orphans.push(pending),
            ProbeSourceState::Unrequested | ProbeSourceState::Failed => {}
        }
    }

    /// Release probe sources that resolved after their session ended.
    pub fn release_orphans(&mut self, host: &mut dyn ArHost) {
        self.orphans.release(|probe| {
            debug!("{}: releasing hit-test source {:?}", ArError::TeardownRace, probe);
            host.release_probe_source(probe);
        });
    }
}

pub fn update_hit_test(
    frame: Res<CurrentFrame>,
    manager: Res<SessionManager>,
    config: Res<ArConfig>,
    mut host: ResMut<ArHostResource>,
    mut tracker: ResMut<HitTestTracker>,
    mut tracked: ResMut<TrackedPose>,
    mut errors: EventWriter<ArErrorEvent>,
) {
    let (Some(frame), Some(session)) = (frame.frame(), manager.session_handle()) else {
        return;
    };

    let pose = match tracker.update(host.host_mut(), session, &config.probe_space, frame) {
        Ok(pose) => pose,
        Err(e) => {
            errors.write(ArErrorEvent(e));
            None
        }
    };

    if pose.is_some() != tracked.is_tracked() {
        debug!("Surface tracking {}", if pose.is_some() { "acquired" } else { "lost" });
    }
    tracked.set(pose);
}

pub fn release_orphaned_probes(mut tracker: ResMut<HitTestTracker>, mut host: ResMut<ArHostResource>) {
    if tracker.orphan_count() > 0 {
        tracker.release_orphans(host.host_mut());
    }
}

pub fn teardown_probe_source(
    mut tracker: ResMut<HitTestTracker>,
    mut host: ResMut<ArHostResource>,
    mut tracked: ResMut<TrackedPose>,
) {
    tracker.teardown(host.host_mut());
    tracked.set(None);
}

pub fn reset_tracked_pose(mut tracked: ResMut<TrackedPose>) {
    tracked.set(None);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::host::RenderSurface;
    use crate::engine::host::simulated::SimulatedHost;

    fn active_session(host: &mut SimulatedHost) -> SessionHandle {
        let request = crate::engine::core::config::ArConfig::default().session_request();
        let grant = host.request_session(&request).try_take().unwrap().unwrap();
        host.bind_render_surface(grant.session, RenderSurface { camera: Entity::PLACEHOLDER })
            .unwrap();
        grant.session
    }

    #[test]
    fn acquisition_is_issued_once_while_pending() {
        let mut host = SimulatedHost::new();
        let handle = host.handle();
        handle.hold_probe_requests(true);
        let session = active_session(&mut host);
        let mut tracker = HitTestTracker::default();

        for _ in 0..5 {
            let frame = host.poll_frame(session).unwrap();
            assert_eq!(tracker.update(&mut host, session, "viewer", &frame), Ok(None));
        }
        assert_eq!(handle.probe_requests(), 1);
        assert_eq!(tracker.creation_state(), ProbeCreationState::Requested);

        handle.release_held_probes();
        let frame = host.poll_frame(session).unwrap();
        assert!(tracker.update(&mut host, session, "viewer", &frame).unwrap().is_some());
        assert_eq!(tracker.creation_state(), ProbeCreationState::Ready);
        assert_eq!(tracker.acquisitions(), 1);
    }

    #[test]
    fn no_candidates_drops_the_previous_pose() {
        let mut host = SimulatedHost::new();
        let handle = host.handle();
        let session = active_session(&mut host);
        let mut tracker = HitTestTracker::default();

        let frame = host.poll_frame(session).unwrap();
        tracker.update(&mut host, session, "viewer", &frame).unwrap();
        let frame = host.poll_frame(session).unwrap();
        assert!(tracker.update(&mut host, session, "viewer", &frame).unwrap().is_some());

        handle.script_hits(Some(Vec::new()));
        let frame = host.poll_frame(session).unwrap();
        assert_eq!(tracker.update(&mut host, session, "viewer", &frame), Ok(None));
    }

    #[test]
    fn first_candidate_is_taken_without_resorting() {
        let mut host = SimulatedHost::new();
        let handle = host.handle();
        let far = Pose::from_translation(Vec3::new(0.0, -1.0, -5.0));
        let near = Pose::from_translation(Vec3::new(0.0, -1.0, -1.0));
        handle.script_hits(Some(vec![far, near]));
        let session = active_session(&mut host);
        let mut tracker = HitTestTracker::default();

        let frame = host.poll_frame(session).unwrap();
        tracker.update(&mut host, session, "viewer", &frame).unwrap();
        let frame = host.poll_frame(session).unwrap();
        assert_eq!(tracker.update(&mut host, session, "viewer", &frame), Ok(Some(far)));
    }

    #[test]
    fn failure_is_reported_once_and_not_retried() {
        let mut host = SimulatedHost::new();
        let handle = host.handle();
        handle.fail_probe_requests(Some("sensor busy"));
        let session = active_session(&mut host);
        let mut tracker = HitTestTracker::default();

        let frame = host.poll_frame(session).unwrap();
        assert!(matches!(
            tracker.update(&mut host, session, "viewer", &frame),
            Err(ArError::ProbeAcquisitionFailed(_))
        ));
        for _ in 0..10 {
            let frame = host.poll_frame(session).unwrap();
            assert_eq!(tracker.update(&mut host, session, "viewer", &frame), Ok(None));
        }
        assert_eq!(handle.probe_requests(), 1);
        assert_eq!(tracker.creation_state(), ProbeCreationState::Failed);
    }

    #[test]
    fn late_acquisition_after_teardown_is_released() {
        let mut host = SimulatedHost::new();
        let handle = host.handle();
        handle.hold_probe_requests(true);
        let session = active_session(&mut host);
        let mut tracker = HitTestTracker::default();

        let frame = host.poll_frame(session).unwrap();
        tracker.update(&mut host, session, "viewer", &frame).unwrap();
        tracker.teardown(&mut host);
        assert_eq!(tracker.creation_state(), ProbeCreationState::Unrequested);
        assert_eq!(tracker.orphan_count(), 1);

        handle.release_held_probes();
        assert_eq!(handle.live_probe_count(), 1);
        tracker.release_orphans(&mut host);
        assert_eq!(handle.live_probe_count(), 0);
        assert_eq!(tracker.orphan_count(), 0);
    }
}
