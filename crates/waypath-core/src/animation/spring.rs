#![forbid(unsafe_code)]

//! Damped spring filter for smoothing moving targets.
//!
//! The flashlight never jumps straight to its target. Each axis is a damped
//! harmonic oscillator chasing a target that the mapper moves every frame:
//!
//!   a = -stiffness × (position - target) - damping × velocity
//!
//! With `damping = 2√stiffness` the spring is critically damped: it converges
//! as fast as possible without overshooting, which is what turns grid-cell
//! jumps into continuous motion.
//!
//! # Integration
//!
//! Semi-implicit Euler with a fixed maximum step. Large frame deltas are
//! subdivided so a stiff spring stays stable after a dropped frame, and
//! capped at one second so a stalled host cannot trigger unbounded work.
//!
//! # Invariants
//!
//! 1. Stiffness is at least [`MIN_STIFFNESS`]; damping is never negative.
//! 2. A spring at rest stays at rest until its target moves beyond the rest
//!    threshold or it is snapped elsewhere.
//! 3. `advance(Duration::ZERO)` changes nothing.

use std::time::Duration;

use crate::geometry::Point;

/// Maximum integration step (4ms).
const MAX_STEP_SECS: f64 = 0.004;

/// Longest span integrated by one `advance` call. Anything beyond it is
/// dropped, bounding the work after a long stall to 250 steps.
const MAX_ADVANCE_SECS: f64 = 1.0;

/// Position delta below which the spring may settle (pixels).
const DEFAULT_REST_THRESHOLD: f64 = 0.01;

/// Velocity below which the spring may settle (pixels per second).
const DEFAULT_VELOCITY_THRESHOLD: f64 = 0.05;

/// Lower bound on stiffness; a zero-stiffness spring never converges.
pub const MIN_STIFFNESS: f64 = 0.1;

/// A single-axis damped spring.
#[derive(Debug, Clone)]
pub struct Spring {
    position: f64,
    velocity: f64,
    target: f64,
    stiffness: f64,
    damping: f64,
    rest_threshold: f64,
    at_rest: bool,
}

impl Spring {
    /// Create a critically damped spring at rest on `position`.
    #[must_use]
    pub fn new(position: f64, stiffness: f64) -> Self {
        let stiffness = stiffness.max(MIN_STIFFNESS);
        Self {
            position,
            velocity: 0.0,
            target: position,
            stiffness,
            damping: 2.0 * stiffness.sqrt(),
            rest_threshold: DEFAULT_REST_THRESHOLD,
            at_rest: true,
        }
    }

    /// Override damping (builder pattern). Clamped to zero or more.
    #[must_use]
    pub fn with_damping(mut self, damping: f64) -> Self {
        self.damping = damping.max(0.0);
        self
    }

    /// Override the rest threshold (builder pattern).
    #[must_use]
    pub fn with_rest_threshold(mut self, threshold: f64) -> Self {
        self.rest_threshold = threshold.abs();
        self
    }

    /// Current position.
    #[inline]
    #[must_use]
    pub fn position(&self) -> f64 {
        self.position
    }

    /// Current velocity.
    #[inline]
    #[must_use]
    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    /// Current target.
    #[inline]
    #[must_use]
    pub fn target(&self) -> f64 {
        self.target
    }

    /// Stiffness parameter.
    #[inline]
    #[must_use]
    pub fn stiffness(&self) -> f64 {
        self.stiffness
    }

    /// Damping parameter.
    #[inline]
    #[must_use]
    pub fn damping(&self) -> f64 {
        self.damping
    }

    /// Whether the spring has settled on its target.
    #[inline]
    #[must_use]
    pub fn is_at_rest(&self) -> bool {
        self.at_rest
    }

    /// Move the target. Wakes the spring unless the move is within the
    /// rest threshold.
    pub fn set_target(&mut self, target: f64) {
        if (self.target - target).abs() > self.rest_threshold {
            self.target = target;
            self.at_rest = false;
        }
    }

    /// Change stiffness, keeping the spring critically damped.
    ///
    /// Position and velocity are preserved so the change is seamless.
    pub fn retune(&mut self, stiffness: f64) {
        let stiffness = stiffness.max(MIN_STIFFNESS);
        self.stiffness = stiffness;
        self.damping = 2.0 * stiffness.sqrt();
    }

    /// Teleport to `position` and settle there.
    pub fn snap_to(&mut self, position: f64) {
        self.position = position;
        self.target = position;
        self.velocity = 0.0;
        self.at_rest = true;
    }

    fn step(&mut self, dt: f64) {
        let displacement = self.position - self.target;
        let acceleration = -self.stiffness * displacement - self.damping * self.velocity;
        self.velocity += acceleration * dt;
        self.position += self.velocity * dt;
    }

    /// Advance by `dt`, subdividing into stable steps.
    pub fn advance(&mut self, dt: Duration) {
        if self.at_rest {
            return;
        }
        let mut remaining = dt.as_secs_f64().min(MAX_ADVANCE_SECS);
        while remaining > 0.0 {
            let step = remaining.min(MAX_STEP_SECS);
            self.step(step);
            remaining -= step;
        }
        if (self.position - self.target).abs() < self.rest_threshold
            && self.velocity.abs() < DEFAULT_VELOCITY_THRESHOLD
        {
            self.position = self.target;
            self.velocity = 0.0;
            self.at_rest = true;
        }
    }
}

/// Two springs driving a screen-space point.
#[derive(Debug, Clone)]
pub struct SpringPoint {
    x: Spring,
    y: Spring,
}

impl SpringPoint {
    /// Create a critically damped point spring at rest on `at`.
    #[must_use]
    pub fn new(at: Point, stiffness: f64) -> Self {
        Self {
            x: Spring::new(at.x, stiffness),
            y: Spring::new(at.y, stiffness),
        }
    }

    /// Current smoothed position.
    #[inline]
    #[must_use]
    pub fn position(&self) -> Point {
        Point::new(self.x.position(), self.y.position())
    }

    /// Current target.
    #[inline]
    #[must_use]
    pub fn target(&self) -> Point {
        Point::new(self.x.target(), self.y.target())
    }

    /// Stiffness shared by both axes.
    #[inline]
    #[must_use]
    pub fn stiffness(&self) -> f64 {
        self.x.stiffness()
    }

    /// Whether both axes have settled.
    #[inline]
    #[must_use]
    pub fn is_at_rest(&self) -> bool {
        self.x.is_at_rest() && self.y.is_at_rest()
    }

    /// Move the target.
    pub fn set_target(&mut self, target: Point) {
        self.x.set_target(target.x);
        self.y.set_target(target.y);
    }

    /// Change stiffness on both axes.
    pub fn retune(&mut self, stiffness: f64) {
        self.x.retune(stiffness);
        self.y.retune(stiffness);
    }

    /// Teleport and settle.
    pub fn snap_to(&mut self, at: Point) {
        self.x.snap_to(at.x);
        self.y.snap_to(at.y);
    }

    /// Advance both axes.
    pub fn advance(&mut self, dt: Duration) {
        self.x.advance(dt);
        self.y.advance(dt);
    }
}
