//! Extrema insertion for cubic segments.
//!
//! Splits every cubic at its horizontal and vertical extrema so that each
//! extremum becomes an on-curve point. The missing-extrema check runs this
//! on a private copy and diffs the on-curve points.

use kurbo::{CubicBez, ParamCurve, ParamCurveExtrema, Point};

use crate::contour::{segment_cubic, Contour, ContourPoint, ContourView, PointType, SegmentKind};
use crate::geom::round_point;

/// Extrema closer to either end of the curve than this are skipped.
const ENDPOINT_MARGIN: f64 = 0.01;

/// Split t-values closer than this collapse into one.
const T_DEDUP: f64 = 0.001;

/// A copy of `contour` with on-curve points inserted at H/V extrema.
///
/// Every interior extremum is inserted, however shallow. Inserted points
/// are rounded to integer coordinates, as an editor would place them.
pub fn insert_extrema(contour: &dyn ContourView) -> Contour {
    let mut points: Vec<ContourPoint> = Vec::new();
    let segments = contour.segments();

    for (index, segment) in segments.iter().enumerate() {
        if segment.kind == SegmentKind::Move {
            points.push(on_curve(segment.on_curve, PointType::Move, segment.smooth));
            continue;
        }
        let start = match contour.segment(index as isize - 1) {
            Some(prev) => prev.on_curve,
            None => continue,
        };
        let splits = segment_cubic(start, segment)
            .map(|cubic| (cubic, extrema_t_values(&cubic)))
            .filter(|(_, ts)| !ts.is_empty());

        match splits {
            Some((cubic, ts)) => split_at_ts(&mut points, &cubic, &ts, segment.smooth),
            None => {
                points.extend(segment.off_curve.iter().map(|p| off_curve(*p)));
                let typ = match segment.kind {
                    SegmentKind::Curve => PointType::Curve,
                    SegmentKind::QCurve => PointType::QCurve,
                    _ => PointType::Line,
                };
                points.push(on_curve(segment.on_curve, typ, segment.smooth));
            }
        }
    }
    Contour::new(points)
}

fn on_curve(p: Point, typ: PointType, smooth: bool) -> ContourPoint {
    ContourPoint::new(p.x, p.y, typ, smooth)
}

fn off_curve(p: Point) -> ContourPoint {
    ContourPoint::new(p.x, p.y, PointType::OffCurve, false)
}

/// Sorted t-values of the H/V extrema inside a cubic.
fn extrema_t_values(cubic: &CubicBez) -> Vec<f64> {
    let mut t_values: Vec<f64> = cubic
        .extrema()
        .into_iter()
        .filter(|t| *t > ENDPOINT_MARGIN && *t < 1.0 - ENDPOINT_MARGIN)
        .collect();
    t_values.sort_by(f64::total_cmp);
    t_values.dedup_by(|a, b| (*a - *b).abs() < T_DEDUP);
    t_values
}

/// Split a cubic at sorted t-values, appending the pieces as points.
///
/// Each piece is cut from the original curve so rounding one split point
/// doesn't drift the next.
fn split_at_ts(points: &mut Vec<ContourPoint>, cubic: &CubicBez, ts: &[f64], end_smooth: bool) {
    let mut prev_t = 0.0;
    for &t in ts {
        let piece = cubic.subsegment(prev_t..t);
        points.push(off_curve(piece.p1));
        points.push(off_curve(piece.p2));
        points.push(on_curve(round_point(piece.p3), PointType::Curve, true));
        prev_t = t;
    }
    let last = cubic.subsegment(prev_t..1.0);
    points.push(off_curve(last.p1));
    points.push(off_curve(last.p2));
    points.push(on_curve(cubic.p3, PointType::Curve, end_smooth));
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn arch() -> Contour {
        Contour::new(vec![
            ContourPoint::new(0.0, 0.0, PointType::Line, false),
            ContourPoint::new(0.0, 100.0, PointType::OffCurve, false),
            ContourPoint::new(100.0, 100.0, PointType::OffCurve, false),
            ContourPoint::new(100.0, 0.0, PointType::Curve, false),
        ])
    }

    #[test]
    fn arch_gains_top_extremum() {
        let result = insert_extrema(&arch());
        let mut on: Vec<Point> = result.on_curve_points();
        on.sort_by(|a, b| a.x.total_cmp(&b.x));
        assert_eq!(
            on,
            vec![Point::new(0.0, 0.0), Point::new(50.0, 75.0), Point::new(100.0, 0.0)]
        );
    }

    #[test]
    fn shallow_extrema_are_inserted() {
        // An S-bend whose y-extrema stay between the end points.
        let s_bend = Contour::new(vec![
            ContourPoint::new(0.0, 0.0, PointType::Line, false),
            ContourPoint::new(100.0, 250.0, PointType::OffCurve, false),
            ContourPoint::new(200.0, -50.0, PointType::OffCurve, false),
            ContourPoint::new(300.0, 200.0, PointType::Curve, false),
            ContourPoint::new(300.0, -100.0, PointType::Line, false),
        ]);
        let result = insert_extrema(&s_bend);
        let mut on: Vec<Point> = result.on_curve_points();
        on.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
        assert_eq!(
            on,
            vec![
                Point::new(0.0, 0.0),
                Point::new(105.0, 108.0),
                Point::new(195.0, 92.0),
                Point::new(300.0, -100.0),
                Point::new(300.0, 200.0),
            ]
        );
    }

    #[test]
    fn lines_pass_through() {
        let square = Contour::polygon(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]);
        let result = insert_extrema(&square);
        assert_eq!(result.on_curve_points().len(), 4);
    }
}
