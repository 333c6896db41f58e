//! World-select handling and UI/world disambiguation.
//!
//! Overlay controls may also reach the world as a controller `select` on some
//! hosts. Every UI-originated placement operation arms a one-shot
//! [`SelectSuppression`] right before it runs; the next world select consumes
//! it instead of placing. An armed flag that nobody consumes expires after
//! `select_suppression_frames` ticks.

use bevy::prelude::*;

use crate::engine::core::app_state::SessionState;
use crate::engine::core::config::ArConfig;
use crate::engine::tracking::pose::TrackedPose;
use crate::tools::placement::placement::PlacementManager;

/// A `select` delivered with a device frame.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct WorldSelectEvent {
    pub timestamp: f64,
}

#[derive(Resource, Debug, Default)]
pub struct SelectSuppression {
    armed_at: Option<u64>,
    tick: u64,
}

impl SelectSuppression {
    pub fn arm(&mut self) {
        self.armed_at = Some(self.tick);
    }

    pub fn is_armed(&self) -> bool {
        self.armed_at.is_some()
    }

    /// Clears the flag and reports whether it was set.
    pub fn consume(&mut self) -> bool {
        self.armed_at.take().is_some()
    }

    pub fn clear(&mut self) {
        self.armed_at = None;
    }

    /// End of tick: expire a stale flag, then move to the next tick.
    pub fn advance(&mut self, window: u32) {
        if let Some(armed_at) = self.armed_at {
            if self.tick - armed_at >= u64::from(window) {
                debug!("Select suppression expired unused");
                self.armed_at = None;
            }
        }
        self.tick += 1;
    }
}

pub fn handle_world_selects(
    mut selects: EventReader<WorldSelectEvent>,
    mut suppression: ResMut<SelectSuppression>,
    state: Res<State<SessionState>>,
    tracked: Res<TrackedPose>,
    mut placement: PlacementManager,
) {
    for _ in selects.read() {
        if suppression.consume() {
            debug!("World select already handled by UI");
            continue;
        }
        if *state.get() != SessionState::Active || !tracked.is_tracked() {
            continue;
        }
        placement.place(&tracked);
    }
}

pub fn advance_select_suppression(
    mut suppression: ResMut<SelectSuppression>,
    config: Res<ArConfig>,
) {
    suppression.advance(config.select_suppression_frames);
}

pub fn clear_select_suppression(mut suppression: ResMut<SelectSuppression>) {
    suppression.clear();
}

/// Desktop preview: a left click is the simulated device's screen tap.
///
/// Clicks on overlay buttons are forwarded too, the way a phone delivers
/// them, and are absorbed by the suppression the button armed.
#[cfg(not(target_arch = "wasm32"))]
pub fn forward_clicks_to_host(
    mouse_button: Res<ButtonInput<MouseButton>>,
    state: Res<State<SessionState>>,
    control: Option<Res<crate::engine::host::simulated::SimulatedHostControl>>,
) {
    let Some(control) = control else {
        return;
    };
    if *state.get() == SessionState::Active && mouse_button.just_pressed(MouseButton::Left) {
        control.0.tap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_is_one_shot() {
        let mut suppression = SelectSuppression::default();
        suppression.arm();
        assert!(suppression.consume());
        assert!(!suppression.consume());
    }

    #[test]
    fn unconsumed_flag_expires_after_window() {
        let mut suppression = SelectSuppression::default();
        suppression.arm();
        suppression.advance(2);
        assert!(suppression.is_armed());
        suppression.advance(2);
        assert!(suppression.is_armed());
        suppression.advance(2);
        assert!(!suppression.is_armed());
    }

    #[test]
    fn zero_window_expires_at_end_of_arming_tick() {
        let mut suppression = SelectSuppression::default();
        suppression.arm();
        suppression.advance(0);
        assert!(!suppression.is_armed());
    }
}
