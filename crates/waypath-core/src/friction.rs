#![forbid(unsafe_code)]

//! Friction state machine.
//!
//! Friction decides how strongly raw scroll input moves the session. Between
//! waypoints input is amplified (`Travel`); approaching a waypoint it slows
//! (`StickyEntering`); at the waypoint the camera freezes while the
//! flashlight scan runs (`StickyLocked`); after the scan it releases gently
//! (`StickyExiting`).
//!
//! [`transition`] is a pure function of the previous state and the freshly
//! derived position facts. The caller owns side effects such as resetting
//! scan progress.
//!
//! # Transition rules
//!
//! | Condition | Previous | Next |
//! |-----------|----------|------|
//! | no waypoint | any | `Travel` |
//! | in sticky zone | `Locked` | `Exiting` if scan ≥ 1, else `Locked` |
//! | in sticky zone | `Travel`/`Entering` | `Locked` if d < lock ratio × size, else `Entering` |
//! | in sticky zone | `Exiting` | `Exiting` |
//! | d < approach ratio × size | `Locked`/`Exiting` | `Exiting` |
//! | d < approach ratio × size | `Travel`/`Entering` | `Entering` |
//! | otherwise | any | `Travel` |
//!
//! `d` is the distance from the waypoint's center. With the default lock
//! ratio (0.8) every in-zone sample locks immediately, so `Entering` can be
//! skipped entirely when the first sample already lands near the center.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::path::Waypoint;

/// Friction applied to scroll input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FrictionState {
    /// Free travel between waypoints.
    #[default]
    Travel,
    /// Approaching a waypoint.
    StickyEntering,
    /// Camera frozen on a waypoint while the scan completes.
    StickyLocked,
    /// Releasing from a waypoint after the scan.
    StickyExiting,
}

impl FrictionState {
    /// All states, in lifecycle order.
    pub const ALL: [Self; 4] = [
        Self::Travel,
        Self::StickyEntering,
        Self::StickyLocked,
        Self::StickyExiting,
    ];

    /// Default multiplier applied to raw input deltas in this state.
    #[inline]
    #[must_use]
    pub const fn scroll_multiplier(self) -> f64 {
        match self {
            Self::Travel => 5.0,
            Self::StickyEntering => 2.0,
            Self::StickyLocked => 0.0,
            Self::StickyExiting => 0.5,
        }
    }

    /// Whether the camera is frozen.
    #[inline]
    #[must_use]
    pub const fn camera_locked(self) -> bool {
        matches!(self, Self::StickyLocked)
    }

    /// Whether the flashlight should track the scroll/scan rather than idle.
    #[inline]
    #[must_use]
    pub const fn flashlight_follows_scroll(self) -> bool {
        matches!(self, Self::StickyEntering | Self::StickyLocked)
    }

    /// Whether the renderer should pull the camera out to the overview zoom.
    #[inline]
    #[must_use]
    pub const fn zoom_out(self) -> bool {
        matches!(self, Self::Travel | Self::StickyExiting)
    }

    /// Stable label for renderers and logs.
    #[inline]
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Travel => "TRAVEL",
            Self::StickyEntering => "STICKY_ENTERING",
            Self::StickyLocked => "STICKY_LOCKED",
            Self::StickyExiting => "STICKY_EXITING",
        }
    }

    /// Whether this is one of the states that follow a lock.
    #[inline]
    #[must_use]
    pub const fn is_releasing_or_locked(self) -> bool {
        matches!(self, Self::StickyLocked | Self::StickyExiting)
    }
}

impl fmt::Display for FrictionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Tunable ratios and multipliers. Defaults match the built-in constants.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FrictionTuning {
    /// Multiplier while travelling.
    pub travel_multiplier: f64,
    /// Multiplier while entering a sticky zone.
    pub entering_multiplier: f64,
    /// Multiplier while locked. Position never moves from input while
    /// locked regardless of this value.
    pub locked_multiplier: f64,
    /// Multiplier while exiting.
    pub exiting_multiplier: f64,
    /// Fraction of the sticky zone size within which an in-zone sample locks.
    pub lock_ratio: f64,
    /// Fraction of the sticky zone size within which the approach states apply.
    pub approach_ratio: f64,
}

impl Default for FrictionTuning {
    fn default() -> Self {
        Self {
            travel_multiplier: FrictionState::Travel.scroll_multiplier(),
            entering_multiplier: FrictionState::StickyEntering.scroll_multiplier(),
            locked_multiplier: FrictionState::StickyLocked.scroll_multiplier(),
            exiting_multiplier: FrictionState::StickyExiting.scroll_multiplier(),
            lock_ratio: 0.8,
            approach_ratio: 0.75,
        }
    }
}

impl FrictionTuning {
    /// Multiplier for `state`.
    #[inline]
    #[must_use]
    pub fn multiplier(&self, state: FrictionState) -> f64 {
        match state {
            FrictionState::Travel => self.travel_multiplier,
            FrictionState::StickyEntering => self.entering_multiplier,
            FrictionState::StickyLocked => self.locked_multiplier,
            FrictionState::StickyExiting => self.exiting_multiplier,
        }
    }

    /// Out-of-range fields, described for config validation.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        for (name, value) in [
            ("travel_multiplier", self.travel_multiplier),
            ("entering_multiplier", self.entering_multiplier),
            ("locked_multiplier", self.locked_multiplier),
            ("exiting_multiplier", self.exiting_multiplier),
        ] {
            if !value.is_finite() || value < 0.0 {
                errors.push(format!("friction.{name} must be finite and >= 0, got {value}"));
            }
        }
        for (name, value) in [
            ("lock_ratio", self.lock_ratio),
            ("approach_ratio", self.approach_ratio),
        ] {
            if !value.is_finite() || value <= 0.0 {
                errors.push(format!("friction.{name} must be finite and > 0, got {value}"));
            }
        }
        errors
    }
}

/// Next friction state using the default tuning.
#[must_use]
pub fn transition(
    state: FrictionState,
    position: f64,
    waypoint: Option<&Waypoint>,
    in_sticky: bool,
    scan_progress: f64,
) -> FrictionState {
    transition_with(
        &FrictionTuning::default(),
        state,
        position,
        waypoint,
        in_sticky,
        scan_progress,
    )
}

/// Next friction state under `tuning`.
#[must_use]
pub fn transition_with(
    tuning: &FrictionTuning,
    state: FrictionState,
    position: f64,
    waypoint: Option<&Waypoint>,
    in_sticky: bool,
    scan_progress: f64,
) -> FrictionState {
    use FrictionState::{StickyEntering, StickyExiting, StickyLocked, Travel};

    let Some(waypoint) = waypoint else {
        return Travel;
    };
    let distance = waypoint.distance_from_center(position);
    let size = waypoint.sticky_zone_size;

    if in_sticky {
        return match state {
            StickyLocked if scan_progress >= 1.0 => StickyExiting,
            StickyLocked => StickyLocked,
            Travel | StickyEntering if distance < tuning.lock_ratio * size => StickyLocked,
            Travel | StickyEntering => StickyEntering,
            StickyExiting => StickyExiting,
        };
    }

    if distance < tuning.approach_ratio * size {
        if state.is_releasing_or_locked() {
            StickyExiting
        } else {
            StickyEntering
        }
    } else {
        Travel
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Point, Size};

    use super::FrictionState::*;

    /// center 2000, sticky 1200: zone half-width 600, lock 960, approach 900.
    fn station() -> Waypoint {
        Waypoint {
            id: "s".into(),
            name: "S".into(),
            position: Point::new(0.0, -1600.0),
            scroll_start: 1000.0,
            scroll_end: 3000.0,
            sticky_zone_size: 1200.0,
            virtual_content_bounds: Size::new(1000.0, 800.0),
            angle: Some(270.0),
        }
    }

    fn step(state: FrictionState, position: f64, scan: f64) -> FrictionState {
        let wp = station();
        let in_sticky = wp.distance_from_center(position) < wp.sticky_zone_size / 2.0;
        transition(state, position, Some(&wp), in_sticky, scan)
    }

    #[test]
    fn multipliers_and_flags() {
        assert_eq!(Travel.scroll_multiplier(), 5.0);
        assert_eq!(StickyEntering.scroll_multiplier(), 2.0);
        assert_eq!(StickyLocked.scroll_multiplier(), 0.0);
        assert_eq!(StickyExiting.scroll_multiplier(), 0.5);
        assert!(StickyLocked.camera_locked());
        assert!(FrictionState::ALL
            .iter()
            .filter(|s| s.camera_locked())
            .eq([&StickyLocked]));
        assert!(Travel.zoom_out() && StickyExiting.zoom_out());
        assert!(!StickyLocked.zoom_out());
        assert!(StickyLocked.flashlight_follows_scroll());
        assert!(!Travel.flashlight_follows_scroll());
    }

    #[test]
    fn labels() {
        assert_eq!(StickyLocked.to_string(), "STICKY_LOCKED");
        assert_eq!(Travel.label(), "TRAVEL");
    }

    #[test]
    fn no_waypoint_is_travel() {
        for state in FrictionState::ALL {
            assert_eq!(transition(state, 0.0, None, true, 1.0), Travel);
        }
    }

    #[test]
    fn early_lock_skips_entering() {
        assert_eq!(step(Travel, 2050.0, 0.0), StickyLocked);
        assert_eq!(step(StickyEntering, 1500.0, 0.0), StickyLocked);
    }

    #[test]
    fn locked_holds_until_scan_complete() {
        assert_eq!(step(StickyLocked, 2000.0, 0.99), StickyLocked);
        assert_eq!(step(StickyLocked, 2000.0, 1.0), StickyExiting);
    }

    #[test]
    fn exiting_stays_exiting_inside_zone() {
        assert_eq!(step(StickyExiting, 2100.0, 0.0), StickyExiting);
    }

    #[test]
    fn approach_band_depends_on_history() {
        // Outside the zone (d = 700) but inside the approach band (900).
        assert_eq!(step(Travel, 1300.0, 0.0), StickyEntering);
        assert_eq!(step(StickyEntering, 1300.0, 0.0), StickyEntering);
        assert_eq!(step(StickyLocked, 2700.0, 0.0), StickyExiting);
        assert_eq!(step(StickyExiting, 2700.0, 0.0), StickyExiting);
    }

    #[test]
    fn far_from_center_is_travel() {
        for state in FrictionState::ALL {
            assert_eq!(step(state, 1050.0, 0.0), Travel);
            assert_eq!(step(state, 2950.0, 0.0), Travel);
        }
    }

    #[test]
    fn lower_lock_ratio_allows_entering_inside_zone() {
        let tuning = FrictionTuning {
            lock_ratio: 0.2,
            ..FrictionTuning::default()
        };
        let wp = station();
        // d = 500: inside the zone (600) but beyond 0.2 × 1200 = 240.
        let next = transition_with(&tuning, Travel, 2500.0, Some(&wp), true, 0.0);
        assert_eq!(next, StickyEntering);
        let next = transition_with(&tuning, StickyEntering, 2100.0, Some(&wp), true, 0.0);
        assert_eq!(next, StickyLocked);
    }

    #[test]
    fn tuning_defaults_match_states() {
        let tuning = FrictionTuning::default();
        for state in FrictionState::ALL {
            assert_eq!(tuning.multiplier(state), state.scroll_multiplier());
        }
        assert!(tuning.validate().is_empty());
    }

    #[test]
    fn tuning_validation_reports_fields() {
        let tuning = FrictionTuning {
            travel_multiplier: f64::NAN,
            lock_ratio: 0.0,
            ..FrictionTuning::default()
        };
        let errors = tuning.validate();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].contains("travel_multiplier"));
        assert!(errors[1].contains("lock_ratio"));
    }
}
