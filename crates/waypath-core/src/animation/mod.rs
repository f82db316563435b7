#![forbid(unsafe_code)]

//! Animation primitives shared by the navigation engine.
//!
//! - [`Animation`]: a time-driven value advanced by explicit `tick(dt)` calls.
//! - Easing curves mapping normalized time `t ∈ [0, 1]` to eased progress.
//! - [`Spring`] / [`SpringPoint`]: damped oscillators used to smooth the
//!   flashlight target.
//!
//! Nothing here reads a clock. Hosts advance time by passing frame deltas,
//! so every animation is deterministic under test.

pub mod spring;

use std::time::Duration;

pub use spring::{Spring, SpringPoint};

/// An easing curve over normalized time.
pub type EasingFn = fn(f64) -> f64;

/// A time-driven animation advanced by the host's frame loop.
pub trait Animation {
    /// Advance the animation by `dt`.
    fn tick(&mut self, dt: Duration);

    /// Whether the animation has reached its end state.
    fn is_complete(&self) -> bool;

    /// Current eased progress in `[0.0, 1.0]`.
    fn value(&self) -> f64;

    /// Return to the initial state.
    fn reset(&mut self);
}

/// Identity easing.
#[inline]
#[must_use]
pub fn linear(t: f64) -> f64 {
    t.clamp(0.0, 1.0)
}

/// Quadratic ease-in-out. Used for camera interpolation between waypoints.
#[inline]
#[must_use]
pub fn ease_in_out_quad(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
    }
}

/// Cubic ease-in-out. Used for click-to-travel.
#[inline]
#[must_use]
pub fn ease_in_out_cubic(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

/// Linear interpolation between `a` and `b`.
#[inline]
#[must_use]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}
