//! Shared geometry utilities.
//!
//! Everything here is a pure function over `kurbo` values. Divisions are
//! guarded so parallel or zero-length inputs resolve to "no result"
//! instead of infinities.

use kurbo::{BezPath, CubicBez, Line, ParamCurve, PathEl, PathSeg, Point, Rect};

/// Determinants smaller than this are treated as parallel lines.
const PARALLEL_EPSILON: f64 = 1e-12;

/// Decimal places every angle is rounded to before it is compared.
const ANGLE_PRECISION: u32 = 3;

/// Where a line crosses a cubic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveHit {
    pub point: Point,
    /// Parameter along the curve.
    pub t: f64,
    /// Parameter along the line.
    pub line_t: f64,
}

/// Round `value` to `places` decimal places.
fn round_to(value: f64, places: u32) -> f64 {
    let scale = 10f64.powi(places as i32);
    (value * scale).round() / scale
}

/// Round both coordinates to the nearest integer.
pub fn round_point(p: Point) -> Point {
    Point::new(p.x.round(), p.y.round())
}

/// Angle in degrees of the vector `p1 → p2`, in `(-180, 180]`.
///
/// Always rounded to three decimals, then to `round_to` decimals when
/// given. Several analyzers compare two angles for exact equality, so the
/// rounding is part of the contract.
pub fn angle(p1: Point, p2: Point, round_to_places: Option<u32>) -> f64 {
    let width = p2.x - p1.x;
    let height = p2.y - p1.y;
    let mut angle = round_to(height.atan2(width).to_degrees(), ANGLE_PRECISION);
    if let Some(places) = round_to_places {
        angle = round_to(angle, places);
    }
    if angle <= -180.0 {
        angle += 360.0;
    }
    angle
}

/// Intersection of two finite line segments.
///
/// Returns `None` for parallel or degenerate lines, or when the crossing
/// falls outside either segment.
pub fn line_line_intersection(a: Line, b: Line) -> Option<Point> {
    let (a1, a2, b1, b2) = (a.p0, a.p1, b.p0, b.p1);
    let ua_t = (b2.x - b1.x) * (a1.y - b1.y) - (b2.y - b1.y) * (a1.x - b1.x);
    let ub_t = (a2.x - a1.x) * (a1.y - b1.y) - (a2.y - a1.y) * (a1.x - b1.x);
    let u_b = (b2.y - b1.y) * (a2.x - a1.x) - (b2.x - b1.x) * (a2.y - a1.y);
    if u_b.abs() < PARALLEL_EPSILON {
        return None;
    }
    let ua = ua_t / u_b;
    let ub = ub_t / u_b;
    if (0.0..=1.0).contains(&ua) && (0.0..=1.0).contains(&ub) {
        Some(Point::new(a1.x + ua * (a2.x - a1.x), a1.y + ua * (a2.y - a1.y)))
    } else {
        None
    }
}

/// Crossings of a finite line with a cubic, ordered along the line.
pub fn line_curve_intersection(line: Line, curve: CubicBez) -> Vec<CurveHit> {
    if line.p0 == line.p1 {
        return Vec::new();
    }
    let mut hits: Vec<CurveHit> = PathSeg::Cubic(curve)
        .intersect_line(line)
        .into_iter()
        .map(|hit| CurveHit {
            point: curve.eval(hit.segment_t),
            t: hit.segment_t,
            line_t: hit.line_t,
        })
        .collect();
    hits.sort_by(|a, b| a.line_t.total_cmp(&b.line_t));
    hits
}

pub fn line_length(p1: Point, p2: Point) -> f64 {
    (p1.x - p2.x).hypot(p1.y - p2.y)
}

/// A segment of half-length `length` through `pt` at `angle_deg`.
pub fn ray_through_point(pt: Point, angle_deg: f64, length: f64) -> Line {
    let (sin, cos) = angle_deg.to_radians().sin_cos();
    Line::new(
        Point::new(pt.x - cos * length, pt.y - sin * length),
        Point::new(pt.x + cos * length, pt.y + sin * length),
    )
}

/// Opposite side of a right triangle with adjacent side `distance` and
/// angle `angle_deg`, via the law of sines.
///
/// Returns 0 when the third angle degenerates.
fn angle_offset(angle_deg: f64, distance: f64) -> f64 {
    let a = 90.0;
    let b = angle_deg;
    let c = 180.0 - (a + b);
    if c == 0.0 {
        return 0.0;
    }
    let sin_c = c.to_radians().sin();
    if sin_c.abs() < PARALLEL_EPSILON {
        return 0.0;
    }
    round_to(distance * b.to_radians().sin() / sin_c, 5)
}

/// A wide line through `pt` following `angle_deg`, spanning
/// `half_width` units on each side horizontally (vertically for
/// vertical angles).
pub fn handle_ray(pt: Point, angle_deg: f64, half_width: f64) -> Line {
    if angle_deg == 0.0 || angle_deg == 180.0 {
        Line::new(
            Point::new(pt.x + half_width, pt.y),
            Point::new(pt.x - half_width, pt.y),
        )
    } else if angle_deg == 90.0 || angle_deg == -90.0 {
        Line::new(
            Point::new(pt.x, pt.y + half_width),
            Point::new(pt.x, pt.y - half_width),
        )
    } else {
        let y_offset = angle_offset(angle_deg, half_width);
        Line::new(
            Point::new(pt.x + half_width, pt.y + y_offset),
            Point::new(pt.x - half_width, pt.y - y_offset),
        )
    }
}

/// Signed area of a BezPath via the shoelace formula (on-curve points only).
///
/// Positive = counter-clockwise, negative = clockwise.
pub fn signed_area(path: &BezPath) -> f64 {
    let mut area = 0.0;
    let mut first = Point::ZERO;
    let mut current = Point::ZERO;
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => {
                first = p;
                current = p;
            }
            PathEl::LineTo(p) | PathEl::CurveTo(_, _, p) | PathEl::QuadTo(_, p) => {
                area += current.x * p.y - p.x * current.y;
                current = p;
            }
            PathEl::ClosePath => {
                area += current.x * first.y - first.x * current.y;
            }
        }
    }
    area / 2.0
}

/// True when two rectangles share a region of non-zero area.
pub fn rects_overlap(a: Rect, b: Rect) -> bool {
    let x_min = a.x0.max(b.x0);
    let y_min = a.y0.max(b.y0);
    let x_max = a.x1.min(b.x1);
    let y_max = a.y1.min(b.y1);
    x_min < x_max && y_min < y_max
}
