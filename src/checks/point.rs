//! Point-level checks: stray, unnecessary and overlapping points.

use kurbo::{CubicBez, ParamCurve, ParamCurveArclen, Point};

use crate::config::CheckConfig;
use crate::contour::{ContourView, SegmentKind};
use crate::geom::angle;

/// Accuracy passed to kurbo's arc length approximation.
const ARCLEN_ACCURACY: f64 = 1e-3;

/// A contour made of a single point.
pub fn stray_points(contour: &dyn ContourView) -> Option<Point> {
    if contour.len() == 1 {
        contour.segment(0).map(|s| s.on_curve)
    } else {
        None
    }
}

/// On-curve points that can be removed without changing the outline.
///
/// Always checks for collinear line points. When enabled in `config`,
/// smooth points joining two curves are also tested by merging the two
/// curves into one and measuring how far the result drifts.
pub fn unnecessary_points(contour: &dyn ContourView, config: &CheckConfig) -> Vec<Point> {
    let mut found = unnecessary_line_points(contour);
    if config.detect_unnecessary_curve_points {
        found.extend(unnecessary_curve_points(contour, config));
    }
    found
}

/// Consecutive on-curve points sharing the same coordinates.
pub fn overlapping_points(contour: &dyn ContourView) -> Vec<Point> {
    let mut found = Vec::new();
    if contour.len() < 2 {
        return found;
    }
    let Some(mut prev) = contour.segment(-1).map(|s| s.on_curve) else {
        return found;
    };
    for segment in contour.segments() {
        if segment.on_curve == prev {
            found.push(segment.on_curve);
        }
        prev = segment.on_curve;
    }
    found
}

fn unnecessary_line_points(contour: &dyn ContourView) -> Vec<Point> {
    let mut found = Vec::new();
    if contour.len() < 2 {
        return found;
    }
    for (index, segment) in contour.segments().iter().enumerate() {
        if segment.kind != SegmentKind::Line {
            continue;
        }
        let i = index as isize;
        let (Some(prev), Some(next)) = (contour.segment(i - 1), contour.segment(i + 1)) else {
            continue;
        };
        if next.kind != SegmentKind::Line {
            continue;
        }
        let this_angle = angle(prev.on_curve, segment.on_curve, None);
        let next_angle = angle(segment.on_curve, next.on_curve, None);
        if this_angle == next_angle {
            found.push(segment.on_curve);
        }
    }
    found
}

fn unnecessary_curve_points(contour: &dyn ContourView, config: &CheckConfig) -> Vec<Point> {
    let mut found = Vec::new();
    if contour.len() < 3 {
        return found;
    }
    for (index, segment) in contour.segments().iter().enumerate() {
        if !segment.smooth {
            continue;
        }
        let i = index as isize;
        let (Some(prev), Some(next)) = (contour.segment(i - 1), contour.segment(i + 1)) else {
            continue;
        };
        let (Some((a1, a2)), Some((b1, b2))) = (segment.handles(), next.handles()) else {
            continue;
        };
        let middle = segment.on_curve;
        let bcp_in = a2 - middle;
        let bcp_out = b1 - middle;
        // Axis-aligned handles mark an extremum, which is always needed.
        let oblique = bcp_in.x != bcp_out.x
            && bcp_in.x != 0.0
            && bcp_out.x != 0.0
            && bcp_in.y != bcp_out.y
            && bcp_in.y != 0.0
            && bcp_out.y != 0.0;
        if !oblique {
            continue;
        }
        let before1 = CubicBez::new(prev.on_curve, a1, a2, middle);
        let before2 = CubicBez::new(middle, b1, b2, next.on_curve);
        if curves_merge_within_leash(before1, before2, config) {
            found.push(middle);
        }
    }
    found
}

/// Whether two joined cubics can be replaced by one without any sample
/// drifting further than the leash.
fn curves_merge_within_leash(first: CubicBez, second: CubicBez, config: &CheckConfig) -> bool {
    let len1 = first.arclen(ARCLEN_ACCURACY).abs();
    let len2 = second.arclen(ARCLEN_ACCURACY).abs();
    let total = len1 + len2;
    if total <= 0.0 {
        return false;
    }
    let t = len1 / total;
    if t <= 0.0 || t >= 1.0 {
        return false;
    }
    let merged = merge_cubics(first, second, t);
    let leash = total * config.curve_point_leash;

    let count = config.curve_point_samples.max(1);
    let before = sample_pair(first, second, count);
    let after = sample_pair(merged.subsegment(0.0..t), merged.subsegment(t..1.0), count);
    before
        .iter()
        .zip(&after)
        .all(|(b, a)| b.distance(*a) <= leash)
}

/// Invert a De Casteljau split at `t`: the outer handles of the halves
/// determine the handles of the whole.
fn merge_cubics(first: CubicBez, second: CubicBez, t: f64) -> CubicBez {
    let p0 = first.p0;
    let p3 = second.p3;
    let p1 = p0 + (first.p1 - p0) / t;
    let p2 = p3 + (second.p2 - p3) / (1.0 - t);
    CubicBez::new(p0, p1, p2, p3)
}

fn sample_pair(first: CubicBez, second: CubicBez, count: usize) -> Vec<Point> {
    let ts = (0..=count).map(|k| k as f64 / count as f64);
    let mut points: Vec<Point> = ts.clone().map(|t| first.eval(t)).collect();
    points.extend(ts.skip(1).map(|t| second.eval(t)));
    points
}
