#![forbid(unsafe_code)]

//! Host input normalization.
//!
//! Hosts push raw [`InputEvent`]s (wheel deltas, touch points, pointer
//! moves, viewport resizes). [`InputNormalizer`] turns them into the signed
//! scroll deltas the session consumes and the absolute pointer positions the
//! flashlight consumes.
//!
//! Touch drags are converted to deltas here: the normalizer remembers the
//! previous touch Y and emits `(previous - current) × touch_scale`, so
//! dragging upward scrolls forward, just like a downward wheel.
//!
//! # Failure Modes
//!
//! Non-finite values from a misbehaving source are rejected with
//! [`InputError::NonFinite`] and leave the normalizer untouched.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Size};

/// Whether the host is touch-first or pointer-first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DeviceClass {
    /// Mouse, trackpad or pen with hover.
    #[default]
    Pointer,
    /// Touch screen without hover.
    Touch,
}

/// Raw input pushed by the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Wheel or trackpad scroll, in device pixels (positive = forward).
    Wheel { delta_y: f64 },
    /// A finger touched down.
    TouchStart { at: Point },
    /// A finger moved.
    TouchMove { at: Point },
    /// The finger lifted or the touch was cancelled.
    TouchEnd,
    /// The pointer moved to an absolute viewport position.
    PointerMove { at: Point },
    /// The viewport changed size.
    Resize { viewport: Size },
}

/// What a raw event means to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NormalizedInput {
    /// Signed scroll delta to feed the session, if any.
    pub delta: Option<f64>,
    /// New absolute pointer/touch position, if any.
    pub pointer: Option<Point>,
    /// New viewport size, if any.
    pub viewport: Option<Size>,
}

/// Scale factors applied to raw deltas.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct InputConfig {
    /// Multiplier for wheel deltas.
    pub wheel_scale: f64,
    /// Multiplier for touch-drag deltas.
    pub touch_scale: f64,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            wheel_scale: 1.0,
            touch_scale: 2.0,
        }
    }
}

impl InputConfig {
    /// Out-of-range fields, described for config validation.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if !self.wheel_scale.is_finite() {
            errors.push(format!("input.wheel_scale must be finite, got {}", self.wheel_scale));
        }
        if !self.touch_scale.is_finite() {
            errors.push(format!("input.touch_scale must be finite, got {}", self.touch_scale));
        }
        errors
    }
}

/// Rejected input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputError {
    /// A delta or coordinate was NaN or infinite.
    NonFinite { what: &'static str },
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonFinite { what } => write!(f, "non-finite {what}"),
        }
    }
}

impl std::error::Error for InputError {}

/// Converts raw host events into engine input.
#[derive(Debug, Clone, Default)]
pub struct InputNormalizer {
    config: InputConfig,
    touch_anchor: Option<f64>,
}

impl InputNormalizer {
    /// Create a normalizer with `config`.
    #[must_use]
    pub fn new(config: InputConfig) -> Self {
        Self {
            config,
            touch_anchor: None,
        }
    }

    /// Whether a touch drag is in progress.
    #[inline]
    #[must_use]
    pub fn is_touching(&self) -> bool {
        self.touch_anchor.is_some()
    }

    /// Normalize one event.
    pub fn process(&mut self, event: InputEvent) -> Result<NormalizedInput, InputError> {
        match event {
            InputEvent::Wheel { delta_y } => {
                finite(delta_y, "wheel delta")?;
                let delta = delta_y * self.config.wheel_scale;
                finite(delta, "scaled wheel delta")?;
                Ok(NormalizedInput {
                    delta: Some(delta),
                    ..NormalizedInput::default()
                })
            }
            InputEvent::TouchStart { at } => {
                finite_point(at, "touch position")?;
                self.touch_anchor = Some(at.y);
                Ok(NormalizedInput {
                    pointer: Some(at),
                    ..NormalizedInput::default()
                })
            }
            InputEvent::TouchMove { at } => {
                finite_point(at, "touch position")?;
                // A move without a start (e.g. touch began outside the view)
                // anchors here and scrolls from the next move.
                let delta = self
                    .touch_anchor
                    .map(|previous| (previous - at.y) * self.config.touch_scale);
                if let Some(delta) = delta {
                    finite(delta, "scaled touch delta")?;
                }
                self.touch_anchor = Some(at.y);
                Ok(NormalizedInput {
                    delta,
                    pointer: Some(at),
                    viewport: None,
                })
            }
            InputEvent::TouchEnd => {
                self.touch_anchor = None;
                Ok(NormalizedInput::default())
            }
            InputEvent::PointerMove { at } => {
                finite_point(at, "pointer position")?;
                Ok(NormalizedInput {
                    pointer: Some(at),
                    ..NormalizedInput::default()
                })
            }
            InputEvent::Resize { viewport } => {
                finite_point(Point::new(viewport.width, viewport.height), "viewport size")?;
                Ok(NormalizedInput {
                    viewport: Some(viewport),
                    ..NormalizedInput::default()
                })
            }
        }
    }
}

fn finite(value: f64, what: &'static str) -> Result<(), InputError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(InputError::NonFinite { what })
    }
}

fn finite_point(point: Point, what: &'static str) -> Result<(), InputError> {
    if point.is_finite() {
        Ok(())
    } else {
        Err(InputError::NonFinite { what })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overflowing_scaled_delta_is_rejected() {
        let mut input = InputNormalizer::new(InputConfig {
            wheel_scale: 4.0,
            touch_scale: 4.0,
        });
        assert_eq!(
            input.process(InputEvent::Wheel { delta_y: f64::MAX }),
            Err(InputError::NonFinite {
                what: "scaled wheel delta"
            })
        );

        input
            .process(InputEvent::TouchStart {
                at: Point::new(0.0, f64::MAX),
            })
            .unwrap();
        assert!(input
            .process(InputEvent::TouchMove {
                at: Point::new(0.0, -f64::MAX),
            })
            .is_err());
        // The anchor survives the rejected move.
        let next = input
            .process(InputEvent::TouchMove {
                at: Point::new(0.0, f64::MAX),
            })
            .unwrap();
        assert!(next.delta.is_some_and(f64::is_finite));
    }

    #[test]
    fn wheel_passes_through_scaled() {
        let mut input = InputNormalizer::new(InputConfig {
            wheel_scale: 0.5,
            ..InputConfig::default()
        });
        let out = input.process(InputEvent::Wheel { delta_y: 120.0 }).unwrap();
        assert_eq!(out.delta, Some(60.0));
        assert_eq!(out.pointer, None);
    }

    #[test]
    fn touch_drag_up_scrolls_forward_doubled() {
        let mut input = InputNormalizer::default();
        input
            .process(InputEvent::TouchStart {
                at: Point::new(50.0, 400.0),
            })
            .unwrap();
        assert!(input.is_touching());
        let out = input
            .process(InputEvent::TouchMove {
                at: Point::new(52.0, 380.0),
            })
            .unwrap();
        assert_eq!(out.delta, Some(40.0));
        assert_eq!(out.pointer, Some(Point::new(52.0, 380.0)));

        let out = input
            .process(InputEvent::TouchMove {
                at: Point::new(52.0, 390.0),
            })
            .unwrap();
        assert_eq!(out.delta, Some(-20.0));
    }

    #[test]
    fn touch_move_without_start_anchors_first() {
        let mut input = InputNormalizer::default();
        let out = input
            .process(InputEvent::TouchMove {
                at: Point::new(0.0, 100.0),
            })
            .unwrap();
        assert_eq!(out.delta, None);
        let out = input
            .process(InputEvent::TouchMove {
                at: Point::new(0.0, 90.0),
            })
            .unwrap();
        assert_eq!(out.delta, Some(20.0));
    }

    #[test]
    fn touch_end_clears_anchor() {
        let mut input = InputNormalizer::default();
        input
            .process(InputEvent::TouchStart { at: Point::ZERO })
            .unwrap();
        input.process(InputEvent::TouchEnd).unwrap();
        assert!(!input.is_touching());
    }

    #[test]
    fn non_finite_values_are_rejected_without_side_effects() {
        let mut input = InputNormalizer::default();
        input
            .process(InputEvent::TouchStart {
                at: Point::new(0.0, 100.0),
            })
            .unwrap();
        let err = input
            .process(InputEvent::TouchMove {
                at: Point::new(0.0, f64::NAN),
            })
            .unwrap_err();
        assert_eq!(err, InputError::NonFinite { what: "touch position" });
        // Anchor survives the bad sample.
        let out = input
            .process(InputEvent::TouchMove {
                at: Point::new(0.0, 95.0),
            })
            .unwrap();
        assert_eq!(out.delta, Some(10.0));

        assert!(input
            .process(InputEvent::Wheel {
                delta_y: f64::INFINITY
            })
            .is_err());
        assert!(input
            .process(InputEvent::Resize {
                viewport: Size::new(f64::NAN, 10.0)
            })
            .is_err());
    }

    #[test]
    fn pointer_and_resize() {
        let mut input = InputNormalizer::default();
        let out = input
            .process(InputEvent::PointerMove {
                at: Point::new(10.0, 20.0),
            })
            .unwrap();
        assert_eq!(out.pointer, Some(Point::new(10.0, 20.0)));
        let out = input
            .process(InputEvent::Resize {
                viewport: Size::new(800.0, 600.0),
            })
            .unwrap();
        assert_eq!(out.viewport, Some(Size::new(800.0, 600.0)));
        assert_eq!(out.delta, None);
    }

    #[test]
    fn error_display() {
        let err = InputError::NonFinite { what: "wheel delta" };
        assert_eq!(err.to_string(), "non-finite wheel delta");
    }

    #[test]
    fn config_validation() {
        assert!(InputConfig::default().validate().is_empty());
        let bad = InputConfig {
            touch_scale: f64::NAN,
            ..InputConfig::default()
        };
        assert_eq!(bad.validate().len(), 1);
    }
}
