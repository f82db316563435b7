#![forbid(unsafe_code)]

//! Core: scroll-path navigation engine.
//!
//! # Role in Waypath
//! `waypath-core` turns linear scroll input into motion around a closed ring
//! of named waypoints. It is pure computation: no clock, no I/O, no host
//! bindings. The runtime (`waypath-runtime`) owns activation, frame
//! scheduling and change notification around it.
//!
//! # Primary responsibilities
//! - **Path**: the validated waypoint partition, wraparound math and camera
//!   interpolation.
//! - **Friction**: the state machine deciding how hard input moves the
//!   camera.
//! - **Session**: the live position, friction and scan accumulator.
//! - **Flashlight**: the smoothed spotlight target (free-look or grid-scan).
//! - **Travel**: eased click-to-travel flights along the shorter arc.
//!
//! # Data flow
//! Host input goes through [`input::InputNormalizer`] into
//! [`Session::apply_delta`]. Each frame the runtime advances the
//! [`TravelAnimator`] (which writes back via [`Session::jump_to`]) and the
//! [`FlashlightMapper`], then reads the session's derived state.

pub mod animation;
pub mod flashlight;
pub mod friction;
pub mod geometry;
pub mod input;
pub mod path;
pub mod session;
pub mod travel;

pub use flashlight::{FlashlightConfig, FlashlightMapper, FlashlightMode, FlashlightTarget};
pub use friction::{FrictionState, FrictionTuning, transition};
pub use geometry::{Point, Size};
pub use input::{DeviceClass, InputConfig, InputError, InputEvent, InputNormalizer};
pub use path::{Path, PathError, Waypoint};
pub use session::{DeltaOutcome, ScanTuning, Session, SessionState};
pub use travel::{TravelAnimator, TravelConfig, TravelOutcome};
