//! Segment-level checks.
//!
//! These walk a contour's segments with the previous on-curve point as the
//! segment start, so the first segment of a closed contour starts at the
//! contour's last on-curve point.

use std::collections::BTreeMap;

use kurbo::{BezPath, CubicBez, Line, ParamCurve, Point};
use ordered_float::OrderedFloat;
use serde::Serialize;

use crate::config::CheckConfig;
use crate::contour::{ContourView, SegmentKind};
use crate::font::FontInfo;
use crate::geom::{
    angle, handle_ray, line_curve_intersection, line_length, line_line_intersection,
    ray_through_point,
};

/// Points near a vertical metric, keyed by the metric value they miss.
pub type MetricHits = BTreeMap<OrderedFloat<f64>, Vec<Point>>;

/// A curve whose handle lines cross.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossedHandle {
    /// The curve, with the crossed handle replaced by the crossing point
    /// for indirect hits.
    pub points: [Point; 4],
    pub intersection: Point,
}

/// A curve whose handles do unequal amounts of work.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnevenHandle {
    pub off1: Point,
    pub off2: Point,
    /// Closed region between the first handle and the curve.
    pub off1_shape: BezPath,
    /// Closed region between the second handle and the curve.
    pub off2_shape: BezPath,
}

/// Every cubic segment of the contour, joined to its start point.
fn cubics(contour: &dyn ContourView) -> Vec<CubicBez> {
    let mut curves = Vec::new();
    let Some(mut start) = contour.segment(-1).map(|s| s.on_curve) else {
        return curves;
    };
    for segment in contour.segments() {
        if let Some((h1, h2)) = segment.handles() {
            curves.push(CubicBez::new(start, h1, h2, segment.on_curve));
        }
        start = segment.on_curve;
    }
    curves
}

// ── Straight lines ──────────────────────────────────────────

/// Lines that are a few units off horizontal or vertical.
pub fn angle_near_miss(contour: &dyn ContourView, config: &CheckConfig) -> Vec<(Point, Point)> {
    let mut found: Vec<(Point, Point)> = Vec::new();
    let Some(mut prev) = contour.segment(-1).map(|s| s.on_curve) else {
        return found;
    };
    let near = |delta: f64| delta > 0.0 && delta <= config.near_miss_max;
    for segment in contour.segments() {
        let point = segment.on_curve;
        if segment.kind == SegmentKind::Line {
            let x = (prev.x - point.x).abs();
            let y = (prev.y - point.y).abs();
            let off_vertical = near(x) && prev.y != point.y;
            let off_horizontal = near(y) && prev.x != point.x;
            if (off_vertical || off_horizontal) && !found.contains(&(prev, point)) {
                found.push((prev, point));
            }
        }
        prev = point;
    }
    found
}

// ── Vertical metrics ────────────────────────────────────────

/// Top and bottom `(bottom, top)` zones from blue values and metrics.
pub fn vertical_zones(info: &FontInfo) -> (Vec<(f64, f64)>, Vec<(f64, f64)>) {
    let mut top = zone_pairs(&info.blue_values);
    let mut bottom = zone_pairs(&info.other_blues);
    // The baseline overshoot zone lives in blueValues but guards the bottom.
    if let Some(&(b, t)) = top.first() {
        if b <= 0.0 && t == 0.0 {
            bottom.push(top.remove(0));
        }
    }
    let top_metrics = [info.x_height, info.cap_height, info.ascender];
    for value in top_metrics.into_iter().flatten() {
        add_metric_zone(&mut top, value);
    }
    for value in info.descender.into_iter().chain([0.0]) {
        add_metric_zone(&mut bottom, value);
    }
    (top, bottom)
}

fn zone_pairs(blues: &[f64]) -> Vec<(f64, f64)> {
    if blues.len() % 2 != 0 {
        return Vec::new();
    }
    blues.chunks_exact(2).map(|pair| (pair[0], pair[1])).collect()
}

fn add_metric_zone(zones: &mut Vec<(f64, f64)>, value: f64) {
    if !zones.iter().any(|&(b, t)| b <= value && t >= value) {
        zones.push((value, value));
    }
}

/// Extreme points that sit just outside a vertical metric or blue zone.
pub fn points_near_vertical_metrics(
    contour: &dyn ContourView,
    info: &FontInfo,
    config: &CheckConfig,
) -> MetricHits {
    let mut found = MetricHits::new();
    let n = contour.len();
    if n < 3 {
        return found;
    }
    let (top_zones, bottom_zones) = vertical_zones(info);
    let threshold = config.metrics_zone_threshold;
    let zone_edge = |y: f64, (b, t): (f64, f64)| {
        if y > t && (t - y).abs() <= threshold {
            Some(t)
        } else if y < b && (b - y).abs() <= threshold {
            Some(b)
        } else {
            None
        }
    };

    for index in 0..n as isize {
        let (Some(prev), Some(segment), Some(next)) = (
            contour.segment(index - 1),
            contour.segment(index),
            contour.segment(index + 1),
        ) else {
            continue;
        };
        let pt = segment.on_curve;
        let (py, ny) = (prev.on_curve.y, next.on_curve.y);

        if pt.y >= py && pt.y >= ny {
            for zone in &top_zones {
                if let Some(edge) = zone_edge(pt.y, *zone) {
                    if contour.contains(Point::new(pt.x, pt.y - 1.0)) {
                        add_hit(&mut found, edge, pt);
                    }
                }
            }
        }
        if pt.y <= py && pt.y <= ny {
            for zone in &bottom_zones {
                if let Some(edge) = zone_edge(pt.y, *zone) {
                    if contour.contains(Point::new(pt.x, pt.y + 1.0)) {
                        add_hit(&mut found, edge, pt);
                    }
                }
            }
        }
    }
    for points in found.values_mut() {
        points.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    }
    found
}

fn add_hit(found: &mut MetricHits, edge: f64, pt: Point) {
    let points = found.entry(OrderedFloat(edge)).or_default();
    if !points.contains(&pt) {
        points.push(pt);
    }
}

// ── Curves ──────────────────────────────────────────────────

/// Smooth points whose handles do not line up, as (in, anchor, out).
pub fn unsmooth_smooths(contour: &dyn ContourView, config: &CheckConfig) -> Vec<(Point, Point, Point)> {
    let mut found = Vec::new();
    let Some(mut prev) = contour.segment(-1) else {
        return found;
    };
    let places = Some(config.unsmooth_angle_precision);
    for segment in contour.segments() {
        if let (Some((_, in_handle)), Some((out_handle, _))) = (prev.handles(), segment.handles()) {
            if prev.smooth {
                let anchor = prev.on_curve;
                if angle(in_handle, anchor, places) != angle(anchor, out_handle, places) {
                    found.push((in_handle, anchor, out_handle));
                }
            }
        }
        prev = segment;
    }
    found
}

/// Curves whose chord crosses the handle-to-handle line, implying an S.
pub fn complex_curves(contour: &dyn ContourView) -> Vec<[Point; 4]> {
    cubics(contour)
        .into_iter()
        .filter(|c| line_line_intersection(Line::new(c.p0, c.p3), Line::new(c.p1, c.p2)).is_some())
        .map(|c| [c.p0, c.p1, c.p2, c.p3])
        .collect()
}

/// Curves whose handles cross, directly or when extended.
pub fn crossed_handles(contour: &dyn ContourView, config: &CheckConfig) -> Vec<CrossedHandle> {
    let mut found = Vec::new();
    let half_width = config.handle_ray_half_width;
    for c in cubics(contour) {
        let (p0, p1, p2, p3) = (c.p0, c.p1, c.p2, c.p3);
        if let Some(hit) = line_line_intersection(Line::new(p0, p1), Line::new(p2, p3)) {
            if !crossed_handle_with_no_other_options(p0, p1, p2, p3) {
                found.push(CrossedHandle {
                    points: [p0, p1, p2, p3],
                    intersection: hit,
                });
            }
            continue;
        }
        // First handle extended against the second handle.
        if p0 != p1 {
            let ray = handle_ray(p0, angle(p0, p1, None), half_width);
            if let Some(hit) = line_line_intersection(ray, Line::new(p2, p3)) {
                if !crossed_handle_with_no_other_options(p0, p1, p2, p3) {
                    found.push(CrossedHandle {
                        points: [p0, hit, p2, p3],
                        intersection: hit,
                    });
                }
                continue;
            }
        }
        // Second handle extended against the first handle.
        if p3 != p2 {
            let ray = handle_ray(p3, angle(p3, p2, None), half_width);
            if let Some(hit) = line_line_intersection(ray, Line::new(p0, p1)) {
                if !crossed_handle_with_no_other_options(p0, p1, p2, p3) {
                    found.push(CrossedHandle {
                        points: [p0, p1, hit, p3],
                        intersection: hit,
                    });
                }
            }
        }
    }
    found
}

/// Heuristic exclusion for one-unit curves.
///
/// A curve spanning a single unit on one axis, with handles that also
/// span one unit on that axis and do not outgrow the curve on the other
/// axis, cannot be drawn without its handles crossing.
fn crossed_handle_with_no_other_options(p0: Point, p1: Point, p2: Point, p3: Point) -> bool {
    let w = (p0.x - p3.x).abs();
    let h = (p0.y - p3.y).abs();
    let bw = (p0.x - p1.x).abs().max((p3.x - p2.x).abs());
    let bh = (p0.y - p1.y).abs().max((p3.y - p2.y).abs());
    (w == 1.0 && bw == 1.0 && bh <= h) || (h == 1.0 && bh == 1.0 && bw <= w)
}

/// Curves whose handles both lie along the chord, as (h1, h2).
///
/// A handle retracted onto its anchor counts as lying along the chord.
pub fn unnecessary_handles(contour: &dyn ContourView) -> Vec<(Point, Point)> {
    cubics(contour)
        .into_iter()
        .filter(|c| {
            let line_angle = angle(c.p0, c.p3, Some(0));
            let along = |from: Point, to: Point| from == to || angle(from, to, Some(0)) == line_angle;
            c.p0 != c.p3 && along(c.p0, c.p1) && along(c.p2, c.p3)
        })
        .map(|c| (c.p1, c.p2))
        .collect()
}

/// Curves where one handle does much more of the work than the other.
pub fn uneven_handles(contour: &dyn ContourView, config: &CheckConfig) -> Vec<UnevenHandle> {
    let mut found = Vec::new();
    for curve in cubics(contour) {
        let (on1, off1, off2, on2) = (curve.p0, curve.p1, curve.p2, curve.p3);
        // Rays perpendicular to each handle, through its anchor.
        let on1_ray = ray_through_point(on1, angle(on1, off1, None) - 90.0, config.long_ray_length);
        let on2_ray = ray_through_point(on2, angle(off2, on2, None) - 90.0, config.long_ray_length);
        let Some(ray_hit) = line_line_intersection(on1_ray, on2_ray) else {
            continue;
        };
        let first_hit = |off: Point| line_curve_intersection(Line::new(off, ray_hit), curve).into_iter().next();
        let (Some(hit1), Some(hit2)) = (first_hit(off1), first_hit(off2)) else {
            continue;
        };
        let length1 = line_length(off1, hit1.point);
        let length2 = line_length(off2, hit2.point);
        let (short, long) = if length1 <= length2 {
            (length1, length2)
        } else {
            (length2, length1)
        };
        if short < config.uneven_handle_min_length || long / short <= config.uneven_handle_ratio {
            continue;
        }
        found.push(UnevenHandle {
            off1,
            off2,
            off1_shape: handle_shape(curve, 0.0, hit1.t, off1),
            off2_shape: handle_shape(curve, hit2.t, 1.0, off2),
        });
    }
    found
}

/// The curve from `t0` to `t1`, closed through `off`.
fn handle_shape(curve: CubicBez, t0: f64, t1: f64, off: Point) -> BezPath {
    let piece = curve.subsegment(t0..t1);
    let mut path = BezPath::new();
    path.move_to(piece.p0);
    path.curve_to(piece.p1, piece.p2, piece.p3);
    path.line_to(off);
    path.close_path();
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contour::{Contour, ContourPoint, PointType};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn pt(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    fn on(x: f64, y: f64, typ: PointType, smooth: bool) -> ContourPoint {
        ContourPoint::new(x, y, typ, smooth)
    }

    fn off(x: f64, y: f64) -> ContourPoint {
        ContourPoint::new(x, y, PointType::OffCurve, false)
    }

    /// A closed contour holding the single cubic `p0 p1 p2 p3`.
    fn curve_contour(p0: (f64, f64), p1: (f64, f64), p2: (f64, f64), p3: (f64, f64)) -> Contour {
        Contour::new(vec![
            on(p0.0, p0.1, PointType::Line, false),
            off(p1.0, p1.1),
            off(p2.0, p2.1),
            on(p3.0, p3.1, PointType::Curve, false),
        ])
    }

    #[rstest]
    #[case(5.0, true)]
    #[case(0.0, false)]
    #[case(5.0001, false)]
    #[case(3.0, true)]
    fn near_miss_boundary(#[case] dx: f64, #[case] flagged: bool) {
        let contour = Contour::polygon(&[(0.0, 0.0), (dx, 200.0), (-100.0, 200.0), (-100.0, 0.0)]);
        let found = angle_near_miss(&contour, &CheckConfig::default());
        assert_eq!(found.contains(&(pt(0.0, 0.0), pt(dx, 200.0))), flagged);
    }

    #[test]
    fn near_miss_on_horizontal() {
        let contour = Contour::polygon(&[(0.0, 0.0), (200.0, 2.0), (200.0, 100.0)]);
        let found = angle_near_miss(&contour, &CheckConfig::default());
        assert_eq!(found, vec![(pt(0.0, 0.0), pt(200.0, 2.0))]);
    }

    #[test]
    fn zones_from_blues_and_metrics() {
        let info = FontInfo {
            blue_values: vec![-10.0, 0.0, 500.0, 510.0],
            x_height: Some(500.0),
            cap_height: Some(700.0),
            descender: Some(-200.0),
            ..Default::default()
        };
        let (top, bottom) = vertical_zones(&info);
        assert_eq!(top, vec![(500.0, 510.0), (700.0, 700.0)]);
        assert_eq!(bottom, vec![(-10.0, 0.0), (-200.0, -200.0)]);
    }

    #[test]
    fn odd_blue_list_is_ignored() {
        let info = FontInfo {
            blue_values: vec![0.0, 10.0, 500.0],
            ..Default::default()
        };
        let (top, bottom) = vertical_zones(&info);
        assert!(top.is_empty());
        assert_eq!(bottom, vec![(0.0, 0.0)]);
    }

    #[rstest]
    #[case(503.0, true)]
    #[case(497.0, true)]
    #[case(500.0, false)]
    #[case(506.0, false)]
    fn apex_near_x_height(#[case] apex: f64, #[case] flagged: bool) {
        let info = FontInfo {
            x_height: Some(500.0),
            ..Default::default()
        };
        let contour = Contour::polygon(&[(0.0, 0.0), (100.0, 0.0), (50.0, apex)]);
        let found = points_near_vertical_metrics(&contour, &info, &CheckConfig::default());
        let expected: MetricHits = if flagged {
            [(OrderedFloat(500.0), vec![pt(50.0, apex)])].into_iter().collect()
        } else {
            MetricHits::new()
        };
        assert_eq!(found, expected);
    }

    #[test]
    fn notch_probe_outside_contour() {
        let info = FontInfo {
            other_blues: vec![498.0, 500.0],
            ..Default::default()
        };
        // The notch bottom is a local minimum, but the probe above it is outside.
        let contour = Contour::polygon(&[(0.0, 0.0), (100.0, 0.0), (100.0, 600.0), (50.0, 503.0), (0.0, 600.0)]);
        let found = points_near_vertical_metrics(&contour, &info, &CheckConfig::default());
        assert!(found.is_empty());
    }

    #[test]
    fn unsmooth_smooth_point() {
        let contour = Contour::new(vec![
            on(0.0, 0.0, PointType::Line, false),
            off(20.0, -20.0),
            off(40.0, 0.0),
            on(50.0, 0.0, PointType::Curve, true),
            off(60.0, 5.0),
            off(100.0, 20.0),
            on(100.0, 50.0, PointType::Curve, false),
        ]);
        assert_eq!(
            unsmooth_smooths(&contour, &CheckConfig::default()),
            vec![(pt(40.0, 0.0), pt(50.0, 0.0), pt(60.0, 5.0))]
        );
    }

    #[test]
    fn s_curve_is_complex() {
        let contour = curve_contour((0.0, 0.0), (80.0, 0.0), (20.0, 100.0), (100.0, 100.0));
        assert_eq!(
            complex_curves(&contour),
            vec![[pt(0.0, 0.0), pt(80.0, 0.0), pt(20.0, 100.0), pt(100.0, 100.0)]]
        );
        assert!(crossed_handles(&contour, &CheckConfig::default()).is_empty());
    }

    #[test]
    fn direct_handle_crossing() {
        let contour = curve_contour((0.0, 0.0), (100.0, 100.0), (0.0, 100.0), (100.0, 0.0));
        let found = crossed_handles(&contour, &CheckConfig::default());
        assert_eq!(
            found,
            vec![CrossedHandle {
                points: [pt(0.0, 0.0), pt(100.0, 100.0), pt(0.0, 100.0), pt(100.0, 0.0)],
                intersection: pt(50.0, 50.0),
            }]
        );
    }

    #[test]
    fn indirect_handle_crossing() {
        let contour = curve_contour((0.0, 0.0), (10.0, 10.0), (60.0, 100.0), (100.0, 40.0));
        let found = crossed_handles(&contour, &CheckConfig::default());
        assert_eq!(found.len(), 1);
        let hit = found[0].intersection;
        assert!((hit.x - 76.0).abs() < 1e-6 && (hit.y - 76.0).abs() < 1e-6);
        assert_eq!(found[0].points[1], hit);
    }

    #[test]
    fn second_handle_extended() {
        let contour = curve_contour((100.0, 40.0), (60.0, 100.0), (10.0, 10.0), (0.0, 0.0));
        let found = crossed_handles(&contour, &CheckConfig::default());
        assert_eq!(found.len(), 1);
        let hit = found[0].intersection;
        assert!((hit.x - 76.0).abs() < 1e-6 && (hit.y - 76.0).abs() < 1e-6);
        assert_eq!(found[0].points, [pt(100.0, 40.0), pt(60.0, 100.0), hit, pt(0.0, 0.0)]);
    }

    #[rstest]
    #[case::retracted_first((0.0, 0.0), (0.0, 0.0), (50.0, -20.0), (100.0, 40.0))]
    #[case::retracted_second((0.0, 0.0), (50.0, 60.0), (100.0, 30.0), (100.0, 30.0))]
    fn retracted_handle_is_not_extended(
        #[case] p0: (f64, f64),
        #[case] p1: (f64, f64),
        #[case] p2: (f64, f64),
        #[case] p3: (f64, f64),
    ) {
        let contour = curve_contour(p0, p1, p2, p3);
        assert!(crossed_handles(&contour, &CheckConfig::default()).is_empty());
    }

    #[test]
    fn one_unit_curve_is_excluded() {
        assert!(crossed_handle_with_no_other_options(
            pt(0.0, 0.0),
            pt(1.0, 0.0),
            pt(0.0, 0.0),
            pt(1.0, 0.0)
        ));
        assert!(!crossed_handle_with_no_other_options(
            pt(0.0, 0.0),
            pt(100.0, 100.0),
            pt(0.0, 100.0),
            pt(100.0, 0.0)
        ));
    }

    #[test]
    fn handles_along_chord() {
        let contour = curve_contour((0.0, 0.0), (30.0, 30.0), (70.0, 70.0), (100.0, 100.0));
        assert_eq!(unnecessary_handles(&contour), vec![(pt(30.0, 30.0), pt(70.0, 70.0))]);
        let retracted = curve_contour((0.0, 0.0), (0.0, 0.0), (70.0, 70.0), (100.0, 100.0));
        assert_eq!(unnecessary_handles(&retracted).len(), 1);
        let bowed = curve_contour((0.0, 0.0), (0.0, 50.0), (50.0, 100.0), (100.0, 100.0));
        assert!(unnecessary_handles(&bowed).is_empty());
    }

    #[test]
    fn uneven_handles_flagged() {
        let contour = curve_contour((0.0, 0.0), (0.0, 270.0), (240.0, 300.0), (300.0, 300.0));
        let found = uneven_handles(&contour, &CheckConfig::default());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].off1, pt(0.0, 270.0));
        assert_eq!(found[0].off2, pt(240.0, 300.0));
    }

    #[test]
    fn balanced_handles_pass() {
        let contour = curve_contour((0.0, 0.0), (0.0, 165.0), (135.0, 300.0), (300.0, 300.0));
        assert!(uneven_handles(&contour, &CheckConfig::default()).is_empty());
    }
}
