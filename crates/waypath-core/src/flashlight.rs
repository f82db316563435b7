#![forbid(unsafe_code)]

//! Flashlight coordinate mapper.
//!
//! The flashlight is a screen-space spotlight the renderer draws over the
//! current waypoint. Its target comes from one of two sources:
//!
//! - **Free-look**: the raw pointer or touch position, plus an optional
//!   ambient wobble driven by elapsed time.
//! - **Grid-scan**: while locked on a touch device, a deterministic sweep of
//!   a 5 × 3 grid over the waypoint's content bounds, indexed by scan
//!   progress.
//!
//! Either way the raw target is fed through a critically damped
//! [`SpringPoint`], stiffer in grid-scan so cell changes feel snappy while
//! still reading as continuous motion.
//!
//! # Invariants
//!
//! 1. Grid cell indices are clamped to the last cell, so scan progress 1.0
//!    maps to the bottom-right corner rather than out of bounds.
//! 2. The first update snaps the spring to the raw target; every later
//!    update is smoothed.

use std::f64::consts::TAU;
use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use tracing::trace;

use crate::animation::SpringPoint;
use crate::friction::FrictionState;
use crate::geometry::{Point, Size};
use crate::input::DeviceClass;
use crate::path::Waypoint;
use crate::session::Session;

/// Rows in the scan grid.
pub const GRID_ROWS: usize = 5;

/// Columns in the scan grid.
pub const GRID_COLS: usize = 3;

/// How the flashlight target is being produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FlashlightMode {
    /// Follows the pointer or finger.
    #[default]
    FreeLook,
    /// Sweeps the scan grid.
    GridScan,
}

impl FlashlightMode {
    /// Mode for a friction state on a device class.
    #[must_use]
    pub const fn select(friction: FrictionState, device: DeviceClass) -> Self {
        match (friction, device) {
            (FrictionState::StickyLocked, DeviceClass::Touch) => Self::GridScan,
            _ => Self::FreeLook,
        }
    }
}

/// Smoothed spotlight target handed to the renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlashlightTarget {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub mode: FlashlightMode,
}

impl FlashlightTarget {
    /// Target position as a point.
    #[inline]
    #[must_use]
    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Flashlight filter and presentation constants.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FlashlightConfig {
    /// Spring stiffness while following the pointer.
    pub free_look_stiffness: f64,
    /// Spring stiffness while sweeping the grid.
    pub grid_stiffness: f64,
    /// Spotlight radius in free-look (pixels).
    pub free_look_radius: f64,
    /// Spotlight radius in grid-scan (pixels).
    pub grid_radius: f64,
    /// Ambient wobble amplitude in pixels. Zero disables it.
    pub jitter_amplitude: f64,
    /// Ambient wobble frequency in hertz.
    pub jitter_frequency: f64,
}

impl Default for FlashlightConfig {
    fn default() -> Self {
        Self {
            free_look_stiffness: 170.0,
            grid_stiffness: 400.0,
            free_look_radius: 180.0,
            grid_radius: 140.0,
            jitter_amplitude: 6.0,
            jitter_frequency: 0.35,
        }
    }
}

impl FlashlightConfig {
    /// Out-of-range fields, described for config validation.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let positive = [
            ("free_look_stiffness", self.free_look_stiffness),
            ("grid_stiffness", self.grid_stiffness),
            ("free_look_radius", self.free_look_radius),
            ("grid_radius", self.grid_radius),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                errors.push(format!("flashlight.{name} must be finite and > 0, got {value}"));
            }
        }
        let non_negative = [
            ("jitter_amplitude", self.jitter_amplitude),
            ("jitter_frequency", self.jitter_frequency),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                errors.push(format!("flashlight.{name} must be finite and >= 0, got {value}"));
            }
        }
        errors
    }

    fn stiffness(&self, mode: FlashlightMode) -> f64 {
        match mode {
            FlashlightMode::FreeLook => self.free_look_stiffness,
            FlashlightMode::GridScan => self.grid_stiffness,
        }
    }

    fn radius(&self, mode: FlashlightMode) -> f64 {
        match mode {
            FlashlightMode::FreeLook => self.free_look_radius,
            FlashlightMode::GridScan => self.grid_radius,
        }
    }
}

// ---------------------------------------------------------------------------
// Grid math
// ---------------------------------------------------------------------------

/// `(row, col)` of the grid cell for `scan_progress`.
#[must_use]
pub fn grid_cell(scan_progress: f64) -> (usize, usize) {
    let last = GRID_ROWS * GRID_COLS - 1;
    let raw = (scan_progress.clamp(0.0, 1.0) * (GRID_ROWS * GRID_COLS) as f64).floor();
    let index = (raw as usize).min(last);
    (index / GRID_COLS, index % GRID_COLS)
}

/// Offset of the current grid cell from the center of `bounds`.
#[must_use]
pub fn grid_local(scan_progress: f64, bounds: Size) -> Point {
    let (row, col) = grid_cell(scan_progress);
    let x = (col as f64 / (GRID_COLS - 1) as f64) * bounds.width - bounds.width / 2.0;
    let y = (row as f64 / (GRID_ROWS - 1) as f64) * bounds.height - bounds.height / 2.0;
    Point::new(x, y)
}

/// Screen position of the current grid cell.
///
/// `viewport_center + waypoint_offset - camera + local`.
#[must_use]
pub fn grid_screen(
    viewport: Size,
    waypoint: &Waypoint,
    camera: Point,
    scan_progress: f64,
) -> Point {
    viewport.center() + waypoint.position - camera
        + grid_local(scan_progress, waypoint.virtual_content_bounds)
}

/// Deterministic ambient wobble at `elapsed`.
#[must_use]
pub fn ambient_jitter(amplitude: f64, frequency: f64, elapsed: Duration) -> Point {
    if amplitude == 0.0 {
        return Point::ZERO;
    }
    let phase = TAU * frequency * elapsed.as_secs_f64();
    // Incommensurate y rate keeps the wobble from tracing a fixed line.
    Point::new(amplitude * phase.sin(), amplitude * (phase * 0.71 + 1.3).sin())
}

// ---------------------------------------------------------------------------
// Mapper
// ---------------------------------------------------------------------------

/// Per-frame inputs the session does not carry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlashlightInputs {
    /// Latest raw pointer or touch position.
    pub pointer: Point,
    /// Viewport size.
    pub viewport: Size,
    /// Device class reported by the host.
    pub device: DeviceClass,
}

/// Derives and smooths the flashlight target each frame.
#[derive(Debug, Clone)]
pub struct FlashlightMapper {
    config: FlashlightConfig,
    spring: SpringPoint,
    mode: FlashlightMode,
    elapsed: Duration,
    primed: bool,
}

impl Default for FlashlightMapper {
    fn default() -> Self {
        Self::new(FlashlightConfig::default())
    }
}

impl FlashlightMapper {
    /// Create a mapper; the first update snaps to its raw target.
    #[must_use]
    pub fn new(config: FlashlightConfig) -> Self {
        Self {
            spring: SpringPoint::new(Point::ZERO, config.free_look_stiffness),
            config,
            mode: FlashlightMode::FreeLook,
            elapsed: Duration::ZERO,
            primed: false,
        }
    }

    /// Active configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &FlashlightConfig {
        &self.config
    }

    /// Mode chosen by the last update.
    #[inline]
    #[must_use]
    pub fn mode(&self) -> FlashlightMode {
        self.mode
    }

    /// Current smoothed output without advancing time.
    #[must_use]
    pub fn current(&self) -> FlashlightTarget {
        let at = self.spring.position();
        FlashlightTarget {
            x: at.x,
            y: at.y,
            radius: self.config.radius(self.mode),
            mode: self.mode,
        }
    }

    /// Whether the smoothed output has caught up with its target.
    #[inline]
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.spring.is_at_rest()
    }

    /// Forget smoothing history; the next update snaps.
    pub fn reset(&mut self) {
        self.primed = false;
        self.elapsed = Duration::ZERO;
        self.mode = FlashlightMode::FreeLook;
        self.spring = SpringPoint::new(Point::ZERO, self.config.free_look_stiffness);
    }

    /// Unsmoothed target for the session's current state.
    #[must_use]
    pub fn raw_target(&self, session: &Session, inputs: &FlashlightInputs) -> (Point, FlashlightMode) {
        let mode = FlashlightMode::select(session.friction_state(), inputs.device);
        match (mode, session.current_waypoint()) {
            (FlashlightMode::GridScan, Some(waypoint)) => (
                grid_screen(
                    inputs.viewport,
                    waypoint,
                    session.camera(),
                    session.scan_progress(),
                ),
                mode,
            ),
            _ => {
                let wobble = ambient_jitter(
                    self.config.jitter_amplitude,
                    self.config.jitter_frequency,
                    self.elapsed,
                );
                (inputs.pointer + wobble, FlashlightMode::FreeLook)
            }
        }
    }

    /// Advance by `dt` and return the smoothed target.
    pub fn update(
        &mut self,
        session: &Session,
        inputs: &FlashlightInputs,
        dt: Duration,
    ) -> FlashlightTarget {
        self.elapsed = self.elapsed.saturating_add(dt);
        let (raw, mode) = self.raw_target(session, inputs);

        if mode != self.mode {
            trace!(?mode, "flashlight mode change");
            self.spring.retune(self.config.stiffness(mode));
            self.mode = mode;
        }

        if self.primed {
            self.spring.set_target(raw);
            self.spring.advance(dt);
        } else {
            self.spring.snap_to(raw);
            self.primed = true;
        }
        self.current()
    }
}
