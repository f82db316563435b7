#![forbid(unsafe_code)]

//! Path model: the closed circular sequence of waypoints.
//!
//! A [`Path`] maps a one-dimensional scroll axis `[0, total_distance)` onto a
//! ring of [`Waypoint`]s. Each waypoint owns a half-open scroll range; the
//! ranges partition the axis exactly once and the axis wraps, so the last
//! waypoint's end connects back to the first waypoint's start.
//!
//! # Invariants
//!
//! 1. Ranges are ordered, non-empty, gapless and non-overlapping; the first
//!    starts at 0 and the last ends at `total_distance`. Checked once in
//!    [`Path::new`], never on queries.
//! 2. For every finite position, [`Path::section_at`] resolves exactly one
//!    waypoint.
//! 3. [`Path::normalize`] always returns a value in `[0, total_distance)`.
//!
//! # Failure Modes
//!
//! - Malformed tables are rejected at construction with a [`PathError`].
//! - Non-finite positions cannot be resolved and yield
//!   [`PathError::Unresolved`]; callers keep their last known waypoint.

use std::collections::HashSet;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::animation::{ease_in_out_quad, lerp};
use crate::geometry::{Point, Size};

// ---------------------------------------------------------------------------
// Waypoint
// ---------------------------------------------------------------------------

/// A named region of the path with a spatial position and a scroll range.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Waypoint {
    /// Stable identifier used for click-to-travel and deep links.
    pub id: String,
    /// Display name.
    pub name: String,
    /// World-space location of the waypoint's content.
    pub position: Point,
    /// Start of the scroll range (inclusive).
    pub scroll_start: f64,
    /// End of the scroll range (exclusive).
    pub scroll_end: f64,
    /// Width of the sticky zone centered on the range midpoint.
    pub sticky_zone_size: f64,
    /// Size of the content swept by the flashlight while locked.
    pub virtual_content_bounds: Size,
    /// Polar angle in degrees (0 = east, 90 = south). `None` marks the hub.
    #[cfg_attr(feature = "serde", serde(default))]
    pub angle: Option<f64>,
}

impl Waypoint {
    /// Midpoint of the scroll range.
    #[inline]
    #[must_use]
    pub fn center(&self) -> f64 {
        (self.scroll_start + self.scroll_end) / 2.0
    }

    /// Length of the scroll range.
    #[inline]
    #[must_use]
    pub fn span(&self) -> f64 {
        self.scroll_end - self.scroll_start
    }

    /// Whether this is the hub (center of the ring, radius 0).
    #[inline]
    #[must_use]
    pub fn is_hub(&self) -> bool {
        self.angle.is_none()
    }

    /// Whether `position` falls inside `[scroll_start, scroll_end)`.
    #[inline]
    #[must_use]
    pub fn contains(&self, position: f64) -> bool {
        position >= self.scroll_start && position < self.scroll_end
    }

    /// Absolute distance from `position` to the range midpoint.
    #[inline]
    #[must_use]
    pub fn distance_from_center(&self, position: f64) -> f64 {
        (position - self.center()).abs()
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Path configuration and lookup errors.
#[derive(Debug, Clone, PartialEq)]
pub enum PathError {
    /// The waypoint table is empty.
    Empty,
    /// `total_distance` is not finite and positive.
    InvalidTotal(f64),
    /// The first waypoint does not start at 0.
    StartMismatch { id: String, start: f64 },
    /// A waypoint's range is empty or inverted.
    EmptyRange { id: String, start: f64, end: f64 },
    /// Uncovered positions between two consecutive waypoints.
    Gap { after: String, from: f64, to: f64 },
    /// Two consecutive waypoints cover the same positions.
    Overlap { after: String, at: f64 },
    /// The last waypoint does not end at `total_distance`.
    EndMismatch { id: String, end: f64, total: f64 },
    /// Two waypoints share an id.
    DuplicateId(String),
    /// A waypoint field is out of range (sticky size, bounds, angle).
    InvalidWaypoint { id: String, field: &'static str },
    /// No waypoint could be resolved for a position.
    Unresolved { position: f64 },
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "path has no waypoints"),
            Self::InvalidTotal(total) => write!(f, "invalid total distance: {total}"),
            Self::StartMismatch { id, start } => {
                write!(f, "first waypoint '{id}' starts at {start}, expected 0")
            }
            Self::EmptyRange { id, start, end } => {
                write!(f, "waypoint '{id}' has empty range [{start}, {end})")
            }
            Self::Gap { after, from, to } => {
                write!(f, "gap after waypoint '{after}': [{from}, {to}) is uncovered")
            }
            Self::Overlap { after, at } => {
                write!(f, "overlap after waypoint '{after}' at {at}")
            }
            Self::EndMismatch { id, end, total } => {
                write!(f, "last waypoint '{id}' ends at {end}, expected {total}")
            }
            Self::DuplicateId(id) => write!(f, "duplicate waypoint id '{id}'"),
            Self::InvalidWaypoint { id, field } => {
                write!(f, "waypoint '{id}' has invalid {field}")
            }
            Self::Unresolved { position } => {
                write!(f, "no waypoint resolves position {position}")
            }
        }
    }
}

impl std::error::Error for PathError {}

// ---------------------------------------------------------------------------
// Path
// ---------------------------------------------------------------------------

/// A validated, closed circular sequence of waypoints.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    waypoints: Vec<Waypoint>,
    total_distance: f64,
}

impl Path {
    /// Build a path, checking the partition invariant once.
    pub fn new(waypoints: Vec<Waypoint>, total_distance: f64) -> Result<Self, PathError> {
        if !total_distance.is_finite() || total_distance <= 0.0 {
            return Err(PathError::InvalidTotal(total_distance));
        }
        let first = waypoints.first().ok_or(PathError::Empty)?;
        if first.scroll_start != 0.0 {
            return Err(PathError::StartMismatch {
                id: first.id.clone(),
                start: first.scroll_start,
            });
        }

        let mut ids = HashSet::with_capacity(waypoints.len());
        for wp in &waypoints {
            if !ids.insert(wp.id.as_str()) {
                return Err(PathError::DuplicateId(wp.id.clone()));
            }
            validate_waypoint(wp)?;
        }

        for pair in waypoints.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            if next.scroll_start > prev.scroll_end {
                return Err(PathError::Gap {
                    after: prev.id.clone(),
                    from: prev.scroll_end,
                    to: next.scroll_start,
                });
            }
            if next.scroll_start < prev.scroll_end {
                return Err(PathError::Overlap {
                    after: prev.id.clone(),
                    at: next.scroll_start,
                });
            }
        }

        // `first()` succeeded, so `last()` does too.
        if let Some(last) = waypoints.last() {
            if last.scroll_end != total_distance {
                return Err(PathError::EndMismatch {
                    id: last.id.clone(),
                    end: last.scroll_end,
                    total: total_distance,
                });
            }
        }

        Ok(Self {
            waypoints,
            total_distance,
        })
    }

    /// The default seven-waypoint layout: a hub followed by six ring
    /// waypoints, spanning 10 000 scroll units.
    #[must_use]
    pub fn standard() -> Self {
        const RING_RADIUS: f64 = 1600.0;
        let hub = Waypoint {
            id: "home".into(),
            name: "Home".into(),
            position: Point::ZERO,
            scroll_start: 0.0,
            scroll_end: 1000.0,
            sticky_zone_size: 500.0,
            virtual_content_bounds: Size::new(1200.0, 800.0),
            angle: None,
        };
        let ring = [
            ("about", "About", 270.0),
            ("work", "Work", 330.0),
            ("lab", "Lab", 30.0),
            ("journal", "Journal", 90.0),
            ("gallery", "Gallery", 150.0),
            ("contact", "Contact", 210.0),
        ];
        let mut waypoints = vec![hub];
        for (i, (id, name, angle)) in ring.into_iter().enumerate() {
            let start = 1000.0 + 1500.0 * i as f64;
            waypoints.push(Waypoint {
                id: id.into(),
                name: name.into(),
                position: Point::from_polar(RING_RADIUS, angle),
                scroll_start: start,
                scroll_end: start + 1500.0,
                sticky_zone_size: 600.0,
                virtual_content_bounds: Size::new(1400.0, 1000.0),
                angle: Some(angle),
            });
        }
        debug_assert!(Self::new(waypoints.clone(), 10_000.0).is_ok());
        Self {
            waypoints,
            total_distance: 10_000.0,
        }
    }

    /// Total length of the scroll axis.
    #[inline]
    #[must_use]
    pub fn total_distance(&self) -> f64 {
        self.total_distance
    }

    /// All waypoints in path order.
    #[inline]
    #[must_use]
    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    /// Number of waypoints.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    /// Always false for a constructed path; present for API symmetry.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Waypoint by index.
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Waypoint> {
        self.waypoints.get(index)
    }

    /// Index of the waypoint with `id`.
    #[must_use]
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.waypoints.iter().position(|wp| wp.id == id)
    }

    /// Waypoint with `id`.
    #[must_use]
    pub fn waypoint(&self, id: &str) -> Option<&Waypoint> {
        self.waypoints.iter().find(|wp| wp.id == id)
    }

    /// Index of the waypoint after `index`, wrapping to the first.
    #[inline]
    #[must_use]
    pub fn next_index(&self, index: usize) -> usize {
        (index + 1) % self.waypoints.len()
    }

    /// Index of the waypoint before `index`, wrapping to the last.
    #[inline]
    #[must_use]
    pub fn prev_index(&self, index: usize) -> usize {
        (index + self.waypoints.len() - 1) % self.waypoints.len()
    }

    /// Wrap any finite position into `[0, total_distance)`.
    ///
    /// Non-finite input is returned unchanged so lookups can reject it.
    #[must_use]
    pub fn normalize(&self, position: f64) -> f64 {
        let wrapped = position.rem_euclid(self.total_distance);
        // rem_euclid can round a tiny negative input up to the modulus itself.
        if wrapped >= self.total_distance {
            0.0
        } else {
            wrapped
        }
    }

    /// Normalized progress `position / total_distance` in `[0, 1)`.
    #[inline]
    #[must_use]
    pub fn progress(&self, position: f64) -> f64 {
        self.normalize(position) / self.total_distance
    }

    /// Index of the waypoint whose range contains the normalized position.
    pub fn section_index_at(&self, position: f64) -> Result<usize, PathError> {
        if !position.is_finite() {
            return Err(PathError::Unresolved { position });
        }
        let p = self.normalize(position);
        let index = self.waypoints.partition_point(|wp| wp.scroll_end <= p);
        match self.waypoints.get(index) {
            Some(wp) if wp.contains(p) => Ok(index),
            _ => Err(PathError::Unresolved { position }),
        }
    }

    /// The waypoint whose range contains the normalized position.
    pub fn section_at(&self, position: f64) -> Result<&Waypoint, PathError> {
        self.section_index_at(position).map(|i| &self.waypoints[i])
    }

    /// Midpoint of a waypoint's scroll range.
    #[inline]
    #[must_use]
    pub fn center_of(&self, waypoint: &Waypoint) -> f64 {
        waypoint.center()
    }

    /// Whether `position` lies strictly within half a sticky zone of the
    /// waypoint's center.
    #[inline]
    #[must_use]
    pub fn is_in_sticky_zone(&self, position: f64, waypoint: &Waypoint) -> bool {
        waypoint.distance_from_center(position) < waypoint.sticky_zone_size / 2.0
    }

    /// Signed minimal distance from `from` to `to` around the ring.
    ///
    /// The magnitude never exceeds half the total distance.
    #[must_use]
    pub fn shortest_delta(&self, from: f64, to: f64) -> f64 {
        let total = self.total_distance;
        let raw = to - from;
        if raw.abs() > total / 2.0 {
            if raw > 0.0 { raw - total } else { raw + total }
        } else {
            raw
        }
    }

    /// Screen-space camera position for a scroll position.
    ///
    /// Interpolates from the current waypoint toward the next one with
    /// quadratic ease-in-out over the current range. Legs touching the hub
    /// are straight lines through the origin; ring-to-ring legs sweep the
    /// angle forward (adding 360° when the end angle is smaller) while
    /// blending the radius.
    pub fn cartesian_at(&self, position: f64) -> Result<Point, PathError> {
        let index = self.section_index_at(position)?;
        let current = &self.waypoints[index];
        let next = &self.waypoints[self.next_index(index)];
        let local = (self.normalize(position) - current.scroll_start) / current.span();
        let t = ease_in_out_quad(local);

        let point = match (current.angle, next.angle) {
            (None, None) => Point::ZERO,
            (None, Some(_)) => Point::ZERO.lerp(next.position, t),
            (Some(_), None) => current.position.lerp(Point::ZERO, t),
            (Some(start), Some(end)) => {
                let end = if end < start { end + 360.0 } else { end };
                let angle = lerp(start, end, t);
                let radius = lerp(current.position.length(), next.position.length(), t);
                Point::from_polar(radius, angle)
            }
        };
        Ok(point)
    }
}

fn validate_waypoint(wp: &Waypoint) -> Result<(), PathError> {
    let invalid = |field| PathError::InvalidWaypoint {
        id: wp.id.clone(),
        field,
    };
    if !wp.scroll_start.is_finite() || !wp.scroll_end.is_finite() {
        return Err(invalid("scroll range"));
    }
    if wp.scroll_end <= wp.scroll_start {
        return Err(PathError::EmptyRange {
            id: wp.id.clone(),
            start: wp.scroll_start,
            end: wp.scroll_end,
        });
    }
    if !wp.sticky_zone_size.is_finite() || wp.sticky_zone_size <= 0.0 {
        return Err(invalid("sticky zone size"));
    }
    if !wp.virtual_content_bounds.is_positive() {
        return Err(invalid("content bounds"));
    }
    if !wp.position.is_finite() {
        return Err(invalid("position"));
    }
    if wp.angle.is_some_and(|a| !a.is_finite()) {
        return Err(invalid("angle"));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn wp(id: &str, start: f64, end: f64, angle: Option<f64>) -> Waypoint {
        let position = angle.map_or(Point::ZERO, |a| Point::from_polar(1000.0, a));
        Waypoint {
            id: id.into(),
            name: id.to_uppercase(),
            position,
            scroll_start: start,
            scroll_end: end,
            sticky_zone_size: 400.0,
            virtual_content_bounds: Size::new(900.0, 600.0),
            angle,
        }
    }

    fn ring() -> Path {
        Path::new(
            vec![
                wp("hub", 0.0, 2000.0, None),
                wp("east", 2000.0, 5000.0, Some(0.0)),
                wp("south", 5000.0, 7000.0, Some(90.0)),
                wp("north", 7000.0, 10_000.0, Some(270.0)),
            ],
            10_000.0,
        )
        .expect("valid ring")
    }

    fn close(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < 1e-6 && (a.y - b.y).abs() < 1e-6
    }

    // ── Construction ────────────────────────────────────────────────

    #[test]
    fn standard_path_is_valid() {
        let path = Path::standard();
        let rebuilt = Path::new(path.waypoints().to_vec(), path.total_distance());
        assert_eq!(rebuilt.as_ref(), Ok(&path));
        assert_eq!(path.len(), 7);
        assert_eq!(path.total_distance(), 10_000.0);
        assert!(path.waypoints()[0].is_hub());
        assert!(path.waypoints()[1..].iter().all(|w| !w.is_hub()));
    }

    #[test]
    fn rejects_empty() {
        assert_eq!(Path::new(vec![], 100.0), Err(PathError::Empty));
    }

    #[test]
    fn rejects_bad_total() {
        let err = Path::new(vec![wp("a", 0.0, 10.0, None)], 0.0).unwrap_err();
        assert!(matches!(err, PathError::InvalidTotal(_)));
        let err = Path::new(vec![wp("a", 0.0, 10.0, None)], f64::NAN).unwrap_err();
        assert!(matches!(err, PathError::InvalidTotal(_)));
    }

    #[test]
    fn rejects_gap() {
        let err = Path::new(
            vec![wp("a", 0.0, 10.0, None), wp("b", 12.0, 20.0, Some(0.0))],
            20.0,
        )
        .unwrap_err();
        assert!(matches!(err, PathError::Gap { .. }), "{err}");
    }

    #[test]
    fn rejects_overlap() {
        let err = Path::new(
            vec![wp("a", 0.0, 10.0, None), wp("b", 8.0, 20.0, Some(0.0))],
            20.0,
        )
        .unwrap_err();
        assert!(matches!(err, PathError::Overlap { .. }), "{err}");
    }

    #[test]
    fn rejects_end_and_start_mismatch() {
        let err = Path::new(vec![wp("a", 0.0, 10.0, None)], 20.0).unwrap_err();
        assert!(matches!(err, PathError::EndMismatch { .. }));
        let err = Path::new(vec![wp("a", 5.0, 20.0, None)], 20.0).unwrap_err();
        assert!(matches!(err, PathError::StartMismatch { .. }));
    }

    #[test]
    fn rejects_duplicate_ids_and_bad_fields() {
        let err = Path::new(
            vec![wp("a", 0.0, 10.0, None), wp("a", 10.0, 20.0, Some(0.0))],
            20.0,
        )
        .unwrap_err();
        assert_eq!(err, PathError::DuplicateId("a".into()));

        let mut bad = wp("a", 0.0, 10.0, None);
        bad.sticky_zone_size = 0.0;
        let err = Path::new(vec![bad], 10.0).unwrap_err();
        assert!(matches!(err, PathError::InvalidWaypoint { field: "sticky zone size", .. }));

        let mut bad = wp("a", 0.0, 10.0, None);
        bad.virtual_content_bounds = Size::new(100.0, 0.0);
        let err = Path::new(vec![bad], 10.0).unwrap_err();
        assert!(matches!(err, PathError::InvalidWaypoint { field: "content bounds", .. }));

        let err = Path::new(vec![wp("a", 0.0, 0.0, None)], 10.0).unwrap_err();
        assert!(matches!(err, PathError::EmptyRange { .. }));
    }

    #[test]
    fn error_display_names_the_waypoint() {
        let err = PathError::Gap {
            after: "east".into(),
            from: 10.0,
            to: 12.0,
        };
        assert!(err.to_string().contains("east"));
        assert!(
            PathError::Unresolved {
                position: f64::NAN
            }
            .to_string()
            .contains("NaN")
        );
    }

    // ── Lookup ──────────────────────────────────────────────────────

    #[test]
    fn section_at_boundaries_are_half_open() {
        let path = ring();
        assert_eq!(path.section_at(0.0).unwrap().id, "hub");
        assert_eq!(path.section_at(1999.999).unwrap().id, "hub");
        assert_eq!(path.section_at(2000.0).unwrap().id, "east");
        assert_eq!(path.section_at(9999.9).unwrap().id, "north");
    }

    #[test]
    fn section_at_wraps_out_of_range_positions() {
        let path = ring();
        assert_eq!(path.section_at(10_000.0).unwrap().id, "hub");
        assert_eq!(path.section_at(-1.0).unwrap().id, "north");
        assert_eq!(path.section_at(25_500.0).unwrap().id, "south");
    }

    #[test]
    fn section_at_rejects_non_finite() {
        let path = ring();
        assert!(matches!(
            path.section_at(f64::NAN),
            Err(PathError::Unresolved { .. })
        ));
        assert!(path.section_at(f64::INFINITY).is_err());
    }

    #[test]
    fn normalize_handles_negative_and_tiny_values() {
        let path = ring();
        assert_eq!(path.normalize(-50.0), 9950.0);
        assert_eq!(path.normalize(10_050.0), 50.0);
        let tiny = path.normalize(-1e-20);
        assert!((0.0..10_000.0).contains(&tiny));
    }

    #[test]
    fn index_and_neighbors_wrap() {
        let path = ring();
        assert_eq!(path.index_of("south"), Some(2));
        assert_eq!(path.index_of("missing"), None);
        assert_eq!(path.next_index(3), 0);
        assert_eq!(path.prev_index(0), 3);
        assert_eq!(path.waypoint("east").map(|w| w.center()), Some(3500.0));
    }

    // ── Sticky zone ─────────────────────────────────────────────────

    #[test]
    fn sticky_zone_is_strict_half_width() {
        let path = ring();
        let east = path.waypoint("east").unwrap();
        assert_eq!(path.center_of(east), 3500.0);
        assert!(path.is_in_sticky_zone(3500.0, east));
        assert!(path.is_in_sticky_zone(3699.0, east));
        assert!(!path.is_in_sticky_zone(3700.0, east));
        assert!(!path.is_in_sticky_zone(3300.0, east));
    }

    // ── Shortest delta ──────────────────────────────────────────────

    #[test]
    fn shortest_delta_prefers_wrap_when_shorter() {
        let path = ring();
        assert_eq!(path.shortest_delta(0.0, 9999.0), -1.0);
        assert_eq!(path.shortest_delta(9999.0, 0.0), 1.0);
        assert_eq!(path.shortest_delta(500.0, 9500.0), -1000.0);
        assert_eq!(path.shortest_delta(1000.0, 4000.0), 3000.0);
        assert_eq!(path.shortest_delta(4000.0, 1000.0), -3000.0);
    }

    #[test]
    fn shortest_delta_half_ring_keeps_raw_sign() {
        let path = ring();
        assert_eq!(path.shortest_delta(0.0, 5000.0), 5000.0);
        assert_eq!(path.shortest_delta(5000.0, 0.0), -5000.0);
    }

    // ── Cartesian ───────────────────────────────────────────────────

    #[test]
    fn hub_leg_starts_at_origin_and_heads_to_next() {
        let path = ring();
        assert!(close(path.cartesian_at(0.0).unwrap(), Point::ZERO));
        let mid = path.cartesian_at(1000.0).unwrap();
        assert!(close(mid, Point::new(500.0, 0.0)), "{mid:?}");
    }

    #[test]
    fn ring_leg_sweeps_angle() {
        let path = ring();
        // east (0°) → south (90°), halfway through east's range.
        let mid = path.cartesian_at(3500.0).unwrap();
        assert!(close(mid, Point::from_polar(1000.0, 45.0)), "{mid:?}");
    }

    #[test]
    fn ring_leg_wraps_angle_forward() {
        let path = Path::new(
            vec![
                wp("west", 0.0, 1000.0, Some(300.0)),
                wp("east", 1000.0, 2000.0, Some(20.0)),
                wp("hub", 2000.0, 3000.0, None),
            ],
            3000.0,
        )
        .unwrap();
        // 300° → 20° must pass through 340°, not sweep back through 160°.
        let mid = path.cartesian_at(500.0).unwrap();
        assert!(close(mid, Point::from_polar(1000.0, 340.0)), "{mid:?}");
    }

    #[test]
    fn last_ring_waypoint_returns_to_hub() {
        let path = ring();
        let mid = path.cartesian_at(8500.0).unwrap();
        let north = Point::from_polar(1000.0, 270.0);
        assert!(close(mid, north.lerp(Point::ZERO, 0.5)), "{mid:?}");
        let end = path.cartesian_at(9999.999_999).unwrap();
        assert!(end.length() < 1e-3, "{end:?}");
    }

    #[test]
    fn cartesian_uses_eased_progress() {
        let path = ring();
        // A quarter of the way through the hub leg, eased t = 0.125.
        let p = path.cartesian_at(500.0).unwrap();
        assert!(close(p, Point::new(125.0, 0.0)), "{p:?}");
    }

    #[test]
    fn cartesian_rejects_non_finite() {
        assert!(ring().cartesian_at(f64::NAN).is_err());
    }
}
