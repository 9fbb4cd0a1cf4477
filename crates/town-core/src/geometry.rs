//! 2-D plane geometry and path interpolation over a flat tile plane:
//! distances are plain Euclidean/Manhattan rather than geodesic, and `f64`
//! is used throughout since the town is tile-scale, not planetary.

use crate::time::Timestamp;

/// A point (or, by convention, a displacement vector) in the 2-D tile plane.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Component-wise sum.
    #[inline]
    pub fn add(self, other: Point) -> Point {
        Point::new(self.x + other.x, self.y + other.y)
    }

    /// Component-wise difference (`self - other`).
    #[inline]
    pub fn sub(self, other: Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }

    #[inline]
    pub fn scale(self, k: f64) -> Point {
        Point::new(self.x * k, self.y * k)
    }

    /// Euclidean distance to `other`.
    #[inline]
    pub fn distance(self, other: Point) -> f64 {
        self.sub(other).length()
    }

    /// Manhattan (L1) distance to `other` — the admissible A* heuristic for a
    /// grid where every move is an axis-aligned unit step (spec.md §4.4).
    #[inline]
    pub fn manhattan_distance(self, other: Point) -> f64 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    /// Euclidean length of `self` treated as a vector from the origin.
    #[inline]
    pub fn length(self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Unit vector in the direction of `self`, or `None` if `self` is too
    /// short to have a meaningful direction (spec.md §4.1: threshold `1e-4`).
    pub fn normalize(self) -> Option<Point> {
        let len = self.length();
        if len < 1e-4 {
            None
        } else {
            Some(self.scale(1.0 / len))
        }
    }

    /// Exact equality. Point data is tile-grid derived so exact comparison is
    /// meaningful (no accumulated float drift expected at this scale).
    #[inline]
    pub fn eq(self, other: Point) -> bool {
        self.x == other.x && self.y == other.y
    }

    /// `true` if both coordinates are integers — i.e. this point sits exactly
    /// on a grid intersection (spec.md §4.4 neighbour-generation rule).
    #[inline]
    pub fn is_grid_aligned(self) -> bool {
        self.x.fract() == 0.0 && self.y.fract() == 0.0
    }
}

/// Error returned by [`orientation_degrees`] when the input vector is too
/// short to have a well-defined orientation.
#[derive(Debug, thiserror::Error)]
#[error("vector {0:?} is too short ({1:.6}) to have an orientation")]
pub struct OrientationError(pub Point, pub f64);

/// Orientation of `vector` in degrees, measured counter-clockwise from the
/// positive x-axis, in `[0, 360)`.
///
/// Errors if `vector`'s length is below the same `1e-4` threshold used by
/// [`Point::normalize`] (spec.md §4.1).
pub fn orientation_degrees(vector: Point) -> Result<f64, OrientationError> {
    let len = vector.length();
    if len < 1e-4 {
        return Err(OrientationError(vector, len));
    }
    let deg = vector.y.atan2(vector.x).to_degrees();
    Ok(if deg < 0.0 { deg + 360.0 } else { deg })
}

// ── Path ──────────────────────────────────────────────────────────────────────

/// One waypoint of a [`Path`]: a scheduled arrival time and position.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PathPoint {
    pub t: Timestamp,
    pub position: Point,
}

/// An ordered sequence of waypoints with strictly increasing timestamps
/// (spec.md §3 invariant 7). A `Path` with fewer than two points cannot be
/// traversed — [`path_position`] and [`path_overlaps`] treat it as stationary
/// at its only point (or the origin, if empty).
pub type Path = Vec<PathPoint>;

/// Interpolated state of an agent walking `path` at time `t`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PathPosition {
    pub position: Point,
    /// Unit facing vector, or `None` if stationary / between coincident points.
    pub facing: Option<Point>,
    pub velocity: f64,
}

/// Linearly interpolate `path` at time `t`.
///
/// Outside the path's span (`t` before the first point or at/after the last),
/// the position clamps to the nearest endpoint with zero velocity, per
/// spec.md §4.1.
pub fn path_position(path: &Path, t: Timestamp) -> PathPosition {
    if path.is_empty() {
        return PathPosition { position: Point::default(), facing: None, velocity: 0.0 };
    }
    if path.len() == 1 || t <= path[0].t {
        return PathPosition { position: path[0].position, facing: None, velocity: 0.0 };
    }
    if t >= path[path.len() - 1].t {
        let last = path[path.len() - 1];
        return PathPosition { position: last.position, facing: None, velocity: 0.0 };
    }

    // Find the enclosing segment: the last point with `.t <= t`.
    let idx = path.partition_point(|p| p.t <= t).saturating_sub(1);
    let a = path[idx];
    let b = path[idx + 1];

    let span_ms = b.t.since(a.t).max(1) as f64;
    let frac = (t.since(a.t) as f64 / span_ms).clamp(0.0, 1.0);

    let delta = b.position.sub(a.position);
    let position = a.position.add(delta.scale(frac));
    let facing = delta.normalize();
    let velocity = delta.length() / (span_ms / 1000.0);

    PathPosition { position, facing, velocity }
}

/// `true` if `t` falls within `path`'s span (`path[0].t <= t <= path[-1].t`).
///
/// Mirrors [`path_position`]'s clamping boundary but as a cheap bounds check
/// for callers (e.g. the pathfinder's dynamic-obstacle check) that only need
/// to know whether a path is "in progress" at `t`, not the interpolated
/// position itself.
pub fn path_overlaps(path: &Path, t: Timestamp) -> bool {
    match (path.first(), path.last()) {
        (Some(first), Some(last)) => t >= first.t && t <= last.t,
        _ => false,
    }
}
