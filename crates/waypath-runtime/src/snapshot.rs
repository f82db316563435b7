#![forbid(unsafe_code)]

//! Published navigation state.

use waypath_core::{FlashlightTarget, FrictionState, Point, Session};

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationSnapshot {
    /// Normalized scroll position.
    pub position: f64,
    /// `position / total_distance` in `[0, 1)`.
    pub progress: f64,
    /// Camera position in screen space.
    pub camera: Point,
    /// Id of the current waypoint.
    pub waypoint_id: Option<String>,
    pub friction_state: FrictionState,
    pub in_sticky_zone: bool,
    pub scan_progress: f64,
    pub flashlight: FlashlightTarget,
    /// Whether a click-to-travel flight is running.
    pub travelling: bool,
}

impl NavigationSnapshot {
    /// Capture the session's derived state.
    #[must_use]
    pub fn capture(session: &Session, flashlight: FlashlightTarget, travelling: bool) -> Self {
        Self {
            position: session.position(),
            progress: session.progress(),
            camera: session.camera(),
            waypoint_id: session.current_waypoint().map(|wp| wp.id.clone()),
            friction_state: session.friction_state(),
            in_sticky_zone: session.in_sticky_zone(),
            scan_progress: session.scan_progress(),
            flashlight,
            travelling,
        }
    }

    #[inline]
    #[must_use]
    pub fn camera_locked(&self) -> bool {
        self.friction_state.camera_locked()
    }

    #[inline]
    #[must_use]
    pub fn flashlight_follows_scroll(&self) -> bool {
        self.friction_state.flashlight_follows_scroll()
    }

    #[inline]
    #[must_use]
    pub fn zoom_out(&self) -> bool {
        self.friction_state.zoom_out()
    }
}
