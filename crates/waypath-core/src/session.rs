#![forbid(unsafe_code)]

//! Scroll session controller.
//!
//! A [`Session`] is the live navigation state for one active view. It is
//! mutated only through [`Session::apply_delta`] (raw input, in arrival
//! order) and [`Session::jump_to`] (imperative repositioning, also the
//! per-frame primitive used by click-to-travel). After every mutation the
//! current waypoint, sticky flag and friction state are re-derived.
//!
//! # Invariants
//!
//! 1. `position()` is always in `[0, total_distance)`.
//! 2. While `StickyLocked`, `apply_delta` never moves the position; it only
//!    accumulates scan progress.
//! 3. Scan progress is reset to 0 whenever the session enters or leaves
//!    `StickyLocked`, and on every `jump_to`.
//! 4. `apply_delta(0.0)` changes nothing.
//!
//! # Failure Modes
//!
//! - Non-finite deltas or jump targets, and deltas that overflow once
//!   scaled by friction, are rejected and logged; the session
//!   is unchanged for that call.
//! - If a waypoint cannot be resolved the session logs a warning and keeps
//!   its last known waypoint and friction state.

use tracing::{debug, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::friction::{FrictionState, FrictionTuning, transition_with};
use crate::geometry::Point;
use crate::input::InputError;
use crate::path::{Path, Waypoint};

/// Scan accumulation parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ScanTuning {
    /// Scroll distance needed to finish a scan, as a multiple of the
    /// waypoint's content height.
    pub height_factor: f64,
}

impl Default for ScanTuning {
    fn default() -> Self {
        Self { height_factor: 1.5 }
    }
}

impl ScanTuning {
    /// Out-of-range fields, described for config validation.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        if self.height_factor.is_finite() && self.height_factor > 0.0 {
            Vec::new()
        } else {
            vec![format!(
                "scan.height_factor must be finite and > 0, got {}",
                self.height_factor
            )]
        }
    }
}

/// What a call to [`Session::apply_delta`] did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeltaOutcome {
    /// Zero delta; nothing changed.
    Ignored,
    /// The delta, or its friction-scaled value, was not finite; nothing
    /// changed.
    Rejected(InputError),
    /// Locked: scan progress advanced to the given value.
    Scanned { progress: f64 },
    /// Locked: the scan finished and the session is now exiting.
    ScanCompleted,
    /// The position moved by the given (post-friction) distance.
    Moved { distance: f64 },
}

/// Plain copy of the session's observable state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionState {
    /// Normalized scroll position.
    pub position: f64,
    /// Index of the current waypoint in the path.
    pub waypoint: Option<usize>,
    /// Current friction state.
    pub friction: FrictionState,
    /// Whether the position is inside the current waypoint's sticky zone.
    pub in_sticky_zone: bool,
    /// Scan progress in `[0, 1]`.
    pub scan_progress: f64,
}

/// Live navigation state for one active view.
#[derive(Debug, Clone)]
pub struct Session {
    path: Path,
    friction_tuning: FrictionTuning,
    scan_tuning: ScanTuning,
    position: f64,
    current: Option<usize>,
    friction: FrictionState,
    in_sticky_zone: bool,
    scan_progress: f64,
}

impl Session {
    /// Start a session at position 0 with default tuning.
    #[must_use]
    pub fn new(path: Path) -> Self {
        Self::with_tuning(path, FrictionTuning::default(), ScanTuning::default())
    }

    /// Start a session at position 0 with explicit tuning.
    #[must_use]
    pub fn with_tuning(path: Path, friction: FrictionTuning, scan: ScanTuning) -> Self {
        let mut session = Self {
            path,
            friction_tuning: friction,
            scan_tuning: scan,
            position: 0.0,
            current: None,
            friction: FrictionState::Travel,
            in_sticky_zone: false,
            scan_progress: 0.0,
        };
        session.rederive();
        session
    }

    // -- Accessors ----------------------------------------------------------

    /// The path this session navigates.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Normalized position in `[0, total_distance)`.
    #[inline]
    #[must_use]
    pub fn position(&self) -> f64 {
        self.position
    }

    /// Normalized progress `position / total_distance`.
    #[inline]
    #[must_use]
    pub fn progress(&self) -> f64 {
        self.position / self.path.total_distance()
    }

    /// Index of the current waypoint.
    #[inline]
    #[must_use]
    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    /// The current waypoint.
    #[inline]
    #[must_use]
    pub fn current_waypoint(&self) -> Option<&Waypoint> {
        self.current.and_then(|i| self.path.get(i))
    }

    /// Current friction state.
    #[inline]
    #[must_use]
    pub fn friction_state(&self) -> FrictionState {
        self.friction
    }

    /// Whether the position is inside the current waypoint's sticky zone.
    #[inline]
    #[must_use]
    pub fn in_sticky_zone(&self) -> bool {
        self.in_sticky_zone
    }

    /// Scan progress in `[0, 1]`; meaningful only while locked.
    #[inline]
    #[must_use]
    pub fn scan_progress(&self) -> f64 {
        self.scan_progress
    }

    /// Multiplier currently applied to input deltas.
    #[inline]
    #[must_use]
    pub fn multiplier(&self) -> f64 {
        self.friction_tuning.multiplier(self.friction)
    }

    /// Screen-space camera position for the current scroll position.
    #[must_use]
    pub fn camera(&self) -> Point {
        match self.path.cartesian_at(self.position) {
            Ok(point) => point,
            Err(err) => {
                warn!(%err, "camera position unresolved; using current waypoint");
                self.current_waypoint().map_or(Point::ZERO, |wp| wp.position)
            }
        }
    }

    /// Copy of the observable state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        SessionState {
            position: self.position,
            waypoint: self.current,
            friction: self.friction,
            in_sticky_zone: self.in_sticky_zone,
            scan_progress: self.scan_progress,
        }
    }

    // -- Mutation -----------------------------------------------------------

    /// Apply one raw input delta.
    ///
    /// While locked the delta feeds the scan instead of moving the camera.
    /// Otherwise it is scaled by the current friction multiplier, added to
    /// the position (wrapping around the ring) and the state is re-derived.
    pub fn apply_delta(&mut self, delta: f64) -> DeltaOutcome {
        if !delta.is_finite() {
            let err = InputError::NonFinite {
                what: "scroll delta",
            };
            warn!(delta, "rejecting scroll delta");
            return DeltaOutcome::Rejected(err);
        }
        if delta == 0.0 {
            return DeltaOutcome::Ignored;
        }

        if self.friction == FrictionState::StickyLocked {
            return self.accumulate_scan(delta);
        }

        let distance = delta * self.multiplier();
        let target = self.position + distance;
        if !target.is_finite() {
            warn!(delta, distance, "rejecting overflowing scroll delta");
            return DeltaOutcome::Rejected(InputError::NonFinite {
                what: "scaled scroll delta",
            });
        }
        self.position = self.path.normalize(target);
        self.rederive();
        DeltaOutcome::Moved { distance }
    }

    /// Reposition directly (deep links, per-frame travel) and reset the scan.
    pub fn jump_to(&mut self, position: f64) -> Result<(), InputError> {
        if !position.is_finite() {
            warn!(position, "rejecting jump target");
            return Err(InputError::NonFinite {
                what: "jump position",
            });
        }
        self.position = self.path.normalize(position);
        self.scan_progress = 0.0;
        self.rederive();
        Ok(())
    }

    /// Jump to the center of the waypoint with `id`.
    ///
    /// Returns `true` if the waypoint exists, `false` otherwise (no-op).
    pub fn jump_to_waypoint(&mut self, id: &str) -> bool {
        let Some(center) = self.path.waypoint(id).map(Waypoint::center) else {
            warn!(id, "jump to unknown waypoint ignored");
            return false;
        };
        self.jump_to(center).is_ok()
    }

    fn accumulate_scan(&mut self, delta: f64) -> DeltaOutcome {
        let Some(height) = self
            .current_waypoint()
            .map(|wp| wp.virtual_content_bounds.height)
        else {
            warn!("locked without a waypoint; releasing to travel");
            self.friction = FrictionState::Travel;
            self.scan_progress = 0.0;
            return DeltaOutcome::Ignored;
        };

        let step = delta.abs() / (height * self.scan_tuning.height_factor);
        self.scan_progress = (self.scan_progress + step).clamp(0.0, 1.0);
        if self.scan_progress >= 1.0 {
            debug!(position = self.position, "scan complete");
            self.friction = FrictionState::StickyExiting;
            self.scan_progress = 0.0;
            DeltaOutcome::ScanCompleted
        } else {
            DeltaOutcome::Scanned {
                progress: self.scan_progress,
            }
        }
    }

    /// Re-derive waypoint, sticky flag and friction from the position.
    fn rederive(&mut self) {
        let previous = self.friction;
        let index = match self.path.section_index_at(self.position) {
            Ok(index) => index,
            Err(err) => {
                warn!(%err, "retaining last known waypoint");
                return;
            }
        };
        let waypoint = &self.path.waypoints()[index];
        let in_sticky = self.path.is_in_sticky_zone(self.position, waypoint);
        let next = transition_with(
            &self.friction_tuning,
            previous,
            self.position,
            Some(waypoint),
            in_sticky,
            self.scan_progress,
        );

        self.current = Some(index);
        self.in_sticky_zone = in_sticky;
        self.friction = next;

        let locked_before = previous == FrictionState::StickyLocked;
        let locked_now = next == FrictionState::StickyLocked;
        if locked_before != locked_now {
            self.scan_progress = 0.0;
        }
        if previous != next {
            debug!(
                from = previous.label(),
                to = next.label(),
                position = self.position,
                waypoint = %waypoint.id,
                "friction transition"
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
