#![forbid(unsafe_code)]

//! Click-to-travel animator.
//!
//! [`TravelAnimator::animate_to`] plans an eased flight from the session's
//! position to a waypoint's center along the shorter arc of the ring, and
//! [`TravelAnimator::advance`] flies it one frame at a time by calling
//! [`Session::jump_to`]. The animator never reads a clock; the host passes
//! frame deltas.
//!
//! Duration grows with distance and is capped:
//!
//! ```text
//! duration = min(max, base + |delta| × per_unit)   // 500ms + |delta|/5 ms, ≤ 2s
//! ```
//!
//! # Invariants
//!
//! 1. At most one flight is in progress. A new `animate_to` supersedes the
//!    old one, whose callback receives [`TravelOutcome::Superseded`].
//! 2. Every accepted callback is invoked exactly once.
//! 3. Positions written during a flight move monotonically along the
//!    planned arc (ease-in-out is monotonic) and end exactly on the target
//!    center.
//!
//! # Failure Modes
//!
//! - Unknown target id: the callback receives
//!   [`TravelOutcome::UnknownTarget`] immediately and any in-flight travel
//!   continues untouched.

use std::fmt;
use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use tracing::{debug, warn};

use crate::animation::{Animation, ease_in_out_cubic};
use crate::session::Session;

/// How a travel request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TravelOutcome {
    /// Reached the target center.
    Arrived,
    /// Stopped by [`TravelAnimator::cancel`] or by user input.
    Cancelled,
    /// Replaced by a newer `animate_to`.
    Superseded,
    /// No waypoint has the requested id.
    UnknownTarget,
}

impl fmt::Display for TravelOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Arrived => "arrived",
            Self::Cancelled => "cancelled",
            Self::Superseded => "superseded",
            Self::UnknownTarget => "unknown target",
        })
    }
}

/// Completion callback for a travel request.
pub type TravelCallback = Box<dyn FnOnce(TravelOutcome)>;

/// Travel timing.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TravelConfig {
    /// Fixed part of every flight, in milliseconds.
    pub base_ms: f64,
    /// Milliseconds added per scroll unit travelled.
    pub ms_per_unit: f64,
    /// Upper bound on flight duration, in milliseconds.
    pub max_ms: f64,
}

impl Default for TravelConfig {
    fn default() -> Self {
        Self {
            base_ms: 500.0,
            ms_per_unit: 0.2,
            max_ms: 2000.0,
        }
    }
}

impl TravelConfig {
    /// Flight duration for a signed scroll distance.
    #[must_use]
    pub fn duration_for(&self, delta: f64) -> Duration {
        let ms = (self.base_ms + delta.abs() * self.ms_per_unit).min(self.max_ms);
        Duration::from_micros((ms.max(0.0) * 1000.0).round() as u64)
    }

    /// Out-of-range fields, described for config validation.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        for (name, value) in [
            ("base_ms", self.base_ms),
            ("ms_per_unit", self.ms_per_unit),
            ("max_ms", self.max_ms),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                errors.push(format!("travel.{name} must be finite and >= 0, got {value}"));
            }
        }
        errors
    }
}

struct Flight {
    target_id: String,
    start: f64,
    delta: f64,
    duration: Duration,
    elapsed: Duration,
    on_complete: TravelCallback,
}

impl Flight {
    fn progress(&self) -> f64 {
        if self.duration.is_zero() {
            1.0
        } else {
            (self.elapsed.as_secs_f64() / self.duration.as_secs_f64()).clamp(0.0, 1.0)
        }
    }
}

/// Drives at most one eased flight between waypoints.
pub struct TravelAnimator {
    config: TravelConfig,
    flight: Option<Flight>,
}

impl fmt::Debug for TravelAnimator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TravelAnimator")
            .field("config", &self.config)
            .field("target", &self.target_id())
            .field("progress", &self.progress())
            .finish()
    }
}

impl Default for TravelAnimator {
    fn default() -> Self {
        Self::new(TravelConfig::default())
    }
}

impl TravelAnimator {
    #[must_use]
    pub fn new(config: TravelConfig) -> Self {
        Self {
            config,
            flight: None,
        }
    }

    /// Whether a flight is in progress.
    #[inline]
    #[must_use]
    pub fn is_travelling(&self) -> bool {
        self.flight.is_some()
    }

    /// Id of the waypoint being flown to.
    #[must_use]
    pub fn target_id(&self) -> Option<&str> {
        self.flight.as_ref().map(|f| f.target_id.as_str())
    }

    /// Linear time progress of the current flight, 0 when idle.
    #[must_use]
    pub fn progress(&self) -> f64 {
        self.flight.as_ref().map_or(0.0, Flight::progress)
    }

    /// Planned duration of the current flight.
    #[must_use]
    pub fn duration(&self) -> Option<Duration> {
        self.flight.as_ref().map(|f| f.duration)
    }

    /// Plan a flight to the center of waypoint `target_id`.
    ///
    /// Returns `true` if a flight was started. Unknown ids report
    /// [`TravelOutcome::UnknownTarget`] through `on_complete` and leave any
    /// in-flight travel alone.
    pub fn animate_to(
        &mut self,
        session: &Session,
        target_id: &str,
        on_complete: impl FnOnce(TravelOutcome) + 'static,
    ) -> bool {
        let path = session.path();
        let Some(target) = path.waypoint(target_id) else {
            warn!(target_id, "travel to unknown waypoint");
            on_complete(TravelOutcome::UnknownTarget);
            return false;
        };

        let start = session.position();
        let delta = path.shortest_delta(start, path.center_of(target));
        let duration = self.config.duration_for(delta);

        if let Some(old) = self.flight.take() {
            debug!(from = %old.target_id, to = target_id, "travel superseded");
            (old.on_complete)(TravelOutcome::Superseded);
        }
        debug!(
            target_id,
            start,
            delta,
            duration_ms = duration.as_millis() as u64,
            "travel started"
        );
        self.flight = Some(Flight {
            target_id: target_id.to_owned(),
            start,
            delta,
            duration,
            elapsed: Duration::ZERO,
            on_complete: Box::new(on_complete),
        });
        true
    }

    /// Abort the current flight. Returns `true` if one was in progress.
    pub fn cancel(&mut self) -> bool {
        match self.flight.take() {
            Some(flight) => {
                debug!(target_id = %flight.target_id, "travel cancelled");
                (flight.on_complete)(TravelOutcome::Cancelled);
                true
            }
            None => false,
        }
    }

    /// Advance the clock by `dt` and move the session along the arc.
    ///
    /// Returns the outcome when the flight lands on this frame.
    pub fn advance(&mut self, dt: Duration, session: &mut Session) -> Option<TravelOutcome> {
        if self.flight.is_none() {
            return None;
        }
        Animation::tick(self, dt);
        self.apply(session)
    }

    /// Write the current eased position into `session`, finishing the
    /// flight if its time is up.
    pub fn apply(&mut self, session: &mut Session) -> Option<TravelOutcome> {
        let flight = self.flight.as_ref()?;
        let position = flight.start + flight.delta * self.value();
        if let Err(err) = session.jump_to(position) {
            warn!(%err, "travel frame dropped");
        }
        if !self.is_complete() {
            return None;
        }
        let flight = self.flight.take()?;
        debug!(target_id = %flight.target_id, "travel arrived");
        (flight.on_complete)(TravelOutcome::Arrived);
        Some(TravelOutcome::Arrived)
    }
}

impl Animation for TravelAnimator {
    fn tick(&mut self, dt: Duration) {
        if let Some(flight) = self.flight.as_mut() {
            flight.elapsed = flight.elapsed.saturating_add(dt);
        }
    }

    /// Idle animators count as complete.
    fn is_complete(&self) -> bool {
        self.flight.as_ref().is_none_or(|f| f.progress() >= 1.0)
    }

    fn value(&self) -> f64 {
        self.flight
            .as_ref()
            .map_or(0.0, |f| ease_in_out_cubic(f.progress()))
    }

    /// Restart the current flight's clock.
    fn reset(&mut self) {
        if let Some(flight) = self.flight.as_mut() {
            flight.elapsed = Duration::ZERO;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Point, Size};
    use crate::path::{Path, Waypoint};
    use std::cell::RefCell;
    use std::rc::Rc;

    const FRAME: Duration = Duration::from_millis(16);

    fn wp(id: &str, start: f64, end: f64) -> Waypoint {
        Waypoint {
            id: id.into(),
            name: id.into(),
            position: Point::ZERO,
            scroll_start: start,
            scroll_end: end,
            sticky_zone_size: 100.0,
            virtual_content_bounds: Size::new(100.0, 100.0),
            angle: None,
        }
    }

    /// `near` is centered at 500, `far` at 9500.
    fn session() -> Session {
        let path = Path::new(
            vec![
                wp("near", 0.0, 1000.0),
                wp("mid", 1000.0, 9000.0),
                wp("far", 9000.0, 10_000.0),
            ],
            10_000.0,
        )
        .unwrap();
        let mut session = Session::new(path);
        session.jump_to(500.0).unwrap();
        session
    }

    fn recorder() -> (Rc<RefCell<Vec<TravelOutcome>>>, impl Fn() -> TravelCallback) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let make = {
            let log = Rc::clone(&log);
            move || -> TravelCallback {
                let log = Rc::clone(&log);
                Box::new(move |outcome| log.borrow_mut().push(outcome))
            }
        };
        (log, make)
    }

    #[test]
    fn duration_formula_and_cap() {
        let config = TravelConfig::default();
        assert_eq!(config.duration_for(0.0), Duration::from_millis(500));
        assert_eq!(config.duration_for(-1000.0), Duration::from_millis(700));
        assert_eq!(config.duration_for(50_000.0), Duration::from_millis(2000));
    }

    #[test]
    fn takes_short_arc_through_wrap() {
        let mut session = session();
        let mut travel = TravelAnimator::default();
        let (log, cb) = recorder();
        assert!(travel.animate_to(&session, "far", cb()));
        assert_eq!(travel.duration(), Some(Duration::from_millis(700)));

        // Unwrap onto a continuous axis: 500 → -500 (≡ 9500).
        let mut last = 500.0;
        let mut frames = 0;
        while travel.is_travelling() {
            travel.advance(FRAME, &mut session);
            let p = session.position();
            let unwrapped = if p > 5000.0 { p - 10_000.0 } else { p };
            assert!(unwrapped <= last + 1e-9, "moved backwards: {unwrapped} > {last}");
            assert!(unwrapped >= -500.0 - 1e-9);
            last = unwrapped;
            frames += 1;
            assert!(frames < 1000);
        }
        assert!((session.position() - 9500.0).abs() < 1e-6);
        assert_eq!(*log.borrow(), vec![TravelOutcome::Arrived]);
    }

    #[test]
    fn unknown_target_reports_and_keeps_flight() {
        let session = session();
        let mut travel = TravelAnimator::default();
        let (log, cb) = recorder();
        assert!(travel.animate_to(&session, "mid", cb()));
        assert!(!travel.animate_to(&session, "nowhere", cb()));
        assert_eq!(*log.borrow(), vec![TravelOutcome::UnknownTarget]);
        assert_eq!(travel.target_id(), Some("mid"));
    }

    #[test]
    fn new_travel_supersedes_old() {
        let session = session();
        let mut travel = TravelAnimator::default();
        let (log, cb) = recorder();
        travel.animate_to(&session, "mid", cb());
        travel.animate_to(&session, "far", cb());
        assert_eq!(*log.borrow(), vec![TravelOutcome::Superseded]);
        assert_eq!(travel.target_id(), Some("far"));
    }

    #[test]
    fn cancel_reports_once() {
        let mut session = session();
        let mut travel = TravelAnimator::default();
        let (log, cb) = recorder();
        travel.animate_to(&session, "mid", cb());
        travel.advance(FRAME, &mut session);
        assert!(travel.cancel());
        assert!(!travel.cancel());
        assert_eq!(travel.advance(FRAME, &mut session), None);
        assert_eq!(*log.borrow(), vec![TravelOutcome::Cancelled]);
    }

    #[test]
    fn one_big_frame_lands_exactly() {
        let mut session = session();
        let mut travel = TravelAnimator::default();
        let (log, cb) = recorder();
        travel.animate_to(&session, "mid", cb());
        assert_eq!(
            travel.advance(Duration::from_secs(5), &mut session),
            Some(TravelOutcome::Arrived)
        );
        assert_eq!(session.position(), 5000.0);
        assert!(!travel.is_travelling());
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn travel_to_current_center_still_completes() {
        let mut session = session();
        let mut travel = TravelAnimator::default();
        let (log, cb) = recorder();
        travel.animate_to(&session, "near", cb());
        while travel.advance(FRAME, &mut session).is_none() {}
        assert_eq!(session.position(), 500.0);
        assert_eq!(*log.borrow(), vec![TravelOutcome::Arrived]);
    }

    #[test]
    fn animation_trait_view() {
        let session = session();
        let mut travel = TravelAnimator::default();
        assert!(travel.is_complete());
        assert_eq!(travel.value(), 0.0);
        travel.animate_to(&session, "far", |_| {});
        travel.tick(Duration::from_millis(350));
        assert!((travel.value() - 0.5).abs() < 1e-9);
        assert!(!travel.is_complete());
        travel.reset();
        assert_eq!(travel.progress(), 0.0);
    }
}
