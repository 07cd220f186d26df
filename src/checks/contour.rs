//! Contour-level checks: open and tiny contours, missing extrema and
//! almost-symmetric curve pairs.

use kurbo::{Point, Rect};

use crate::config::CheckConfig;
use crate::contour::{ContourView, Segment, SegmentKind};
use crate::extrema::insert_extrema;

/// A cubic as its four points.
pub type CurvePoints = [Point; 4];

/// Bounds of a contour whose bounding box covers almost no area.
pub fn small_contours(contour: &dyn ContourView, config: &CheckConfig) -> Option<Rect> {
    if contour.len() <= 1 {
        return None;
    }
    let bounds = contour.bounds()?;
    (bounds.area().abs() <= config.small_contour_max_area).then_some(bounds)
}

/// `(start, end)` of an open contour whose ends do not meet.
pub fn open_contour(contour: &dyn ContourView) -> Option<(Point, Point)> {
    if !contour.is_open() {
        return None;
    }
    let start = contour.segment(0)?.on_curve;
    let end = contour.segment(-1)?.on_curve;
    (start != end).then_some((start, end))
}

/// On-curve points that extrema insertion would add, sorted.
pub fn extreme_points(contour: &dyn ContourView) -> Vec<Point> {
    let existing = contour.on_curve_points();
    let mut missing: Vec<Point> = insert_extrema(contour)
        .on_curve_points()
        .into_iter()
        .filter(|p| !existing.contains(p))
        .collect();
    missing.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    missing.dedup();
    missing
}

// ── Curve symmetry ──────────────────────────────────────────

/// Size and handle lengths of a curve whose handles are horizontal or
/// vertical.
#[derive(Debug, Clone, Copy, PartialEq)]
struct CurveShape {
    w: f64,
    h: f64,
    bcp_w: f64,
    bcp_h: f64,
    points: CurvePoints,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Flip {
    Horizontal,
    Vertical,
}

impl CurveShape {
    fn new(points: CurvePoints) -> Option<Self> {
        let [p0, p1, p2, p3] = points;
        if p0.x != p1.x && p0.y != p1.y {
            return None;
        }
        if p3.x != p2.x && p3.y != p2.y {
            return None;
        }
        let mut bcp_w = None;
        let mut bcp_h = None;
        if p0.x == p1.x {
            bcp_h = Some((p1.y - p0.y).abs());
        } else if p0.y == p1.y {
            bcp_w = Some((p1.x - p0.x).abs());
        }
        if p2.x == p3.x {
            bcp_h = Some((p3.y - p2.y).abs());
        } else if p2.y == p3.y {
            bcp_w = Some((p3.x - p2.x).abs());
        }
        Some(Self {
            w: (p3.x - p0.x).abs(),
            h: (p3.y - p0.y).abs(),
            bcp_w: bcp_w?,
            bcp_h: bcp_h?,
            points,
        })
    }

    fn dimensions(&self) -> (f64, f64, f64, f64) {
        (self.w, self.h, self.bcp_w, self.bcp_h)
    }

    /// This curve mirrored onto `other`, or `None` when the two are
    /// already identical or too different to be meant as mirrors.
    fn flip_onto(&self, other: &CurveShape, config: &CheckConfig) -> Option<CurvePoints> {
        if self.dimensions() == other.dimensions() {
            return None;
        }
        let size = config.curve_symmetry_size_tolerance;
        let bcp = config.curve_symmetry_handle_tolerance;
        if (self.w - other.w).abs() > size || (self.h - other.h).abs() > size {
            return None;
        }
        if (self.bcp_w - other.bcp_w).abs() > bcp || (self.bcp_h - other.bcp_h).abs() > bcp {
            return None;
        }

        let [s0, _, _, s3] = self.points;
        let [o0, _, _, o3] = other.points;
        let flip = if (s0.x.min(s3.x) - o0.x.min(o3.x)).abs() <= size {
            Flip::Vertical
        } else if (s0.y.min(s3.y) - o0.y.min(o3.y)).abs() <= size {
            Flip::Horizontal
        } else {
            return None;
        };

        let mirrored = self.points.map(|p| match flip {
            Flip::Horizontal => Point::new(-p.x, p.y),
            Flip::Vertical => Point::new(p.x, -p.y),
        });
        let last = mirrored[3];
        let (dx, dy) = match flip {
            Flip::Horizontal => (last.x - o0.x, 0.0),
            Flip::Vertical => (0.0, last.y - o0.y),
        };
        Some(mirrored.map(|p| Point::new(p.x - dx, p.y - dy)))
    }
}

fn curve_points(start: Point, segment: &Segment) -> Option<CurvePoints> {
    let (h1, h2) = segment.handles()?;
    Some([start, h1, h2, segment.on_curve])
}

/// Adjacent curve pairs: curve + curve, and curve + h/v line + curve.
fn curve_pairs(contour: &dyn ContourView) -> Vec<(CurvePoints, CurvePoints)> {
    let mut pairs = Vec::new();
    for (index, segment) in contour.segments().iter().enumerate() {
        let i = index as isize;
        let (Some(prev), Some(prev_prev)) = (contour.segment(i - 1), contour.segment(i - 2)) else {
            continue;
        };
        let pair = match segment.kind {
            SegmentKind::Line => {
                let Some(next) = contour.segment(i + 1) else {
                    continue;
                };
                let joint = prev.on_curve;
                let axis_aligned = joint.x == segment.on_curve.x || joint.y == segment.on_curve.y;
                if !axis_aligned {
                    continue;
                }
                curve_points(prev_prev.on_curve, prev).zip(curve_points(segment.on_curve, next))
            }
            SegmentKind::Curve => {
                curve_points(prev_prev.on_curve, prev).zip(curve_points(prev.on_curve, segment))
            }
            _ => None,
        };
        if let Some((c1, c2)) = pair {
            pairs.push((c1, c2));
            pairs.push((c2, c1));
        }
    }
    pairs
}

/// Neighbouring curves that are almost mirror images.
///
/// Each entry is the first curve mirrored onto the second, followed by
/// the second curve as drawn.
pub fn curve_symmetry(contour: &dyn ContourView, config: &CheckConfig) -> Vec<(CurvePoints, CurvePoints)> {
    let mut found: Vec<(CurvePoints, CurvePoints)> = Vec::new();
    for (curve1, curve2) in curve_pairs(contour) {
        let (Some(shape1), Some(shape2)) = (CurveShape::new(curve1), CurveShape::new(curve2)) else {
            continue;
        };
        let Some(flipped) = shape1.flip_onto(&shape2, config) else {
            continue;
        };
        let mut reversed = flipped;
        reversed.reverse();
        if reversed == curve2 {
            continue;
        }
        let entry = (flipped, curve2);
        if !found.contains(&entry) {
            found.push(entry);
        }
    }
    found
}
