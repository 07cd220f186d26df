//! Glyph-level checks: stem widths, duplicated contours and components,
//! and overlapping contour counts.

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use indexmap::IndexMap;
use kurbo::{Point, Rect};
use ordered_float::OrderedFloat;
use serde::Serialize;

use crate::checks::CheckContext;
use crate::config::CheckConfig;
use crate::contour::{ContourPoint, ContourView, PointType, SegmentKind};
use crate::font::FontInfo;
use crate::geom::{angle, rects_overlap};
use crate::glyph::GlyphView;

/// An item index paired with its bounds.
pub type IndexedBounds = Vec<(usize, Option<Rect>)>;

// ── Stem widths ─────────────────────────────────────────────

/// A stem located between two parallel edges.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StemRun {
    /// Lower edge on the primary axis.
    pub start: f64,
    /// `start` plus the registered width.
    pub end: f64,
    /// Secondary-axis extents of the two edges.
    pub spans: [f64; 4],
    /// The registered stem value that matched.
    pub width: f64,
    /// The measured distance between the edges.
    pub measured: f64,
}

/// Stems found per direction. Horizontal stems are measured along y.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StemReport {
    pub horizontal: Vec<StemRun>,
    pub vertical: Vec<StemRun>,
}

impl StemReport {
    pub fn is_empty(&self) -> bool {
        self.horizontal.is_empty() && self.vertical.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum StemAxis {
    Horizontal,
    Vertical,
}

impl StemAxis {
    fn primary(self, p: Point) -> f64 {
        match self {
            StemAxis::Horizontal => p.y,
            StemAxis::Vertical => p.x,
        }
    }

    fn secondary(self, p: Point) -> f64 {
        match self {
            StemAxis::Horizontal => p.x,
            StemAxis::Vertical => p.y,
        }
    }

    /// Edge angle skipped as the first edge of a single-contour pair.
    fn skipped_angle(self, clockwise: bool) -> f64 {
        match (self, clockwise) {
            (StemAxis::Horizontal, true) => 0.0,
            (StemAxis::Horizontal, false) => 180.0,
            (StemAxis::Vertical, true) => -90.0,
            (StemAxis::Vertical, false) => 90.0,
        }
    }
}

/// Edges of one contour: angle → primary coordinate → secondary spans.
type EdgeMap = BTreeMap<OrderedFloat<f64>, BTreeMap<OrderedFloat<f64>, Vec<(f64, f64)>>>;

struct ContourEdges {
    clockwise: bool,
    bounds: Rect,
    edges: EdgeMap,
}

/// Locate stems whose width is close to a registered stem snap value.
pub fn stem_widths(glyph: &dyn GlyphView, info: &FontInfo, config: &CheckConfig) -> StemReport {
    let mut report = StemReport::default();
    if !info.stem_snap_h.is_empty() {
        report.horizontal = find_stems(glyph, &info.stem_snap_h, StemAxis::Horizontal, config.stem_tolerance);
    }
    if !info.stem_snap_v.is_empty() {
        report.vertical = find_stems(glyph, &info.stem_snap_v, StemAxis::Vertical, config.stem_tolerance);
    }
    report
}

fn collect_edges(contour: &dyn ContourView, axis: StemAxis) -> EdgeMap {
    let mut edges = EdgeMap::new();
    let Some(last) = contour.segment(-1) else {
        return edges;
    };
    let mut add = |from: Point, to: Point| {
        let (s1, s2) = min_max(axis.secondary(from), axis.secondary(to));
        edges
            .entry(OrderedFloat(angle(from, to, None)))
            .or_default()
            .entry(OrderedFloat(axis.primary(to)))
            .or_default()
            .push((s1, s2));
    };

    let mut previous = last.on_curve;
    for segment in contour.segments() {
        let point = segment.on_curve;
        if segment.kind == SegmentKind::Line
            && axis.primary(previous) == axis.primary(point)
            && axis.secondary(previous) != axis.secondary(point)
        {
            add(previous, point);
        }
        previous = point;
    }

    // Handles on either side of a curve-curve joint imply a tangent edge.
    let mut prev_segment = last;
    for segment in contour.segments() {
        if let (Some((_, bcp1)), Some((bcp2, _))) = (prev_segment.handles(), segment.handles()) {
            if axis.primary(bcp1) == axis.primary(bcp2) {
                add(bcp1, bcp2);
            }
        }
        prev_segment = segment;
    }
    edges
}

fn min_max(a: f64, b: f64) -> (f64, f64) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

fn spans_overlap((a1, a2): (f64, f64), (b1, b2): (f64, f64)) -> bool {
    !(a1 > b2 || a2 < b1)
}

/// The registered stem closest to `measured`, within tolerance.
fn closest_stem(stems: &[f64], measured: f64, tolerance: f64) -> Option<f64> {
    stems
        .iter()
        .map(|&value| ((value - measured).abs(), value))
        .filter(|(diff, _)| *diff <= tolerance)
        .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)))
        .map(|(_, value)| value)
}

fn find_stems(glyph: &dyn GlyphView, stems: &[f64], axis: StemAxis, tolerance: f64) -> Vec<StemRun> {
    let contours: Vec<ContourEdges> = glyph
        .contours()
        .into_iter()
        .filter_map(|contour| {
            Some(ContourEdges {
                clockwise: contour.is_clockwise(),
                bounds: contour.bounds()?,
                edges: collect_edges(contour, axis),
            })
        })
        .collect();

    let mut runs: Vec<StemRun> = Vec::new();
    let mut record = |start: f64, measured: f64, spans: [f64; 4]| {
        if let Some(width) = closest_stem(stems, measured, tolerance) {
            runs.push(StemRun {
                start,
                end: start + width,
                spans,
                width,
                measured,
            });
        }
    };

    // Edges of the same contour.
    for contour in &contours {
        let skipped = axis.skipped_angle(contour.clockwise);
        for (angle1, lines1) in &contour.edges {
            if angle1.0 == skipped {
                continue;
            }
            for (angle2, lines2) in &contour.edges {
                if angle1 == angle2 {
                    continue;
                }
                for (p1, spans1) in lines1 {
                    for (p2, spans2) in lines2 {
                        if p2 <= p1 {
                            continue;
                        }
                        for &a in spans1 {
                            for &b in spans2 {
                                if spans_overlap(a, b) {
                                    record(p1.0, p2.0 - p1.0, [a.0, a.1, b.0, b.1]);
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    // Outer edge of one contour against the inner edge of another.
    for outer in contours.iter().filter(|c| c.clockwise) {
        for inner in contours.iter().filter(|c| !c.clockwise) {
            if !rects_overlap(outer.bounds, inner.bounds) {
                continue;
            }
            for (outer_angle, outer_lines) in &outer.edges {
                for (inner_angle, inner_lines) in &inner.edges {
                    if outer_angle == inner_angle {
                        continue;
                    }
                    for (outer_p, outer_spans) in outer_lines {
                        for (inner_p, inner_spans) in inner_lines {
                            for &a in outer_spans {
                                for &b in inner_spans {
                                    if spans_overlap(a, b) {
                                        let start = outer_p.0.min(inner_p.0);
                                        let measured = (inner_p.0 - outer_p.0).abs();
                                        record(start, measured, [a.0, a.1, b.0, b.1]);
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    runs.sort_by(|a, b| {
        a.start
            .total_cmp(&b.start)
            .then(a.end.total_cmp(&b.end))
            .then_with(|| {
                a.spans
                    .iter()
                    .zip(&b.spans)
                    .map(|(x, y)| x.total_cmp(y))
                    .find(|o| o.is_ne())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    });
    runs.dedup();
    runs
}

// ── Duplicates ──────────────────────────────────────────────

/// Order-sensitive digest of a contour, independent of where a closed
/// contour's point list happens to start.
pub fn contour_digest(contour: &dyn ContourView) -> u64 {
    let points = contour.points();
    let start = if contour.is_open() { 0 } else { canonical_start(points) };

    let mut hasher = DefaultHasher::new();
    contour.is_open().hash(&mut hasher);
    for p in points[start..].iter().chain(&points[..start]) {
        point_key(p).hash(&mut hasher);
    }
    hasher.finish()
}

type PointKey = (u8, OrderedFloat<f64>, OrderedFloat<f64>, bool);

fn point_key(p: &ContourPoint) -> PointKey {
    (p.typ as u8, OrderedFloat(p.x), OrderedFloat(p.y), p.smooth)
}

/// Start of the smallest rotation among the lowest, leftmost on-curve
/// points. Ties (points drawn on top of each other) are broken by
/// comparing the whole rotated sequence.
fn canonical_start(points: &[ContourPoint]) -> usize {
    let lowest = |p: &ContourPoint| (OrderedFloat(p.y), OrderedFloat(p.x));
    let on_curve = points.iter().any(|p| p.typ != PointType::OffCurve);
    let eligible = |p: &&ContourPoint| !on_curve || p.typ != PointType::OffCurve;
    let Some(min) = points.iter().filter(eligible).map(lowest).min() else {
        return 0;
    };
    let rotation = |start: usize| {
        points[start..]
            .iter()
            .chain(&points[..start])
            .map(point_key)
    };
    (0..points.len())
        .filter(|&i| eligible(&&points[i]) && lowest(&points[i]) == min)
        .min_by(|&a, &b| rotation(a).cmp(rotation(b)))
        .unwrap_or(0)
}

/// Contours drawn exactly on top of an earlier contour.
pub fn duplicate_contours(glyph: &dyn GlyphView) -> IndexedBounds {
    let mut groups: IndexMap<u64, Vec<usize>> = IndexMap::new();
    for (index, contour) in glyph.contours().into_iter().enumerate() {
        if contour.is_empty() {
            continue;
        }
        groups.entry(contour_digest(contour)).or_default().push(index);
    }
    let mut found: IndexedBounds = groups
        .values()
        .flat_map(|indexes| indexes.iter().skip(1))
        .map(|&index| (index, glyph.contour(index).and_then(|c| c.bounds())))
        .collect();
    found.sort_by_key(|(index, _)| *index);
    found
}

/// Components repeating an earlier component's base and transform.
pub fn duplicate_components(glyph: &dyn GlyphView, cx: &CheckContext) -> IndexedBounds {
    let mut seen: Vec<(&str, [u64; 6])> = Vec::new();
    let mut found = IndexedBounds::new();
    for (index, component) in glyph.components().iter().enumerate() {
        let key = (
            component.base.as_str(),
            component.transform.as_coeffs().map(f64::to_bits),
        );
        if seen.contains(&key) {
            found.push((index, component.bounds(cx.font)));
        } else {
            seen.push(key);
        }
    }
    found
}

// ── Overlaps ────────────────────────────────────────────────

/// Flag glyphs where overlap removal would merge away many contours.
///
/// Not applicable without an overlap removal collaborator.
pub fn contour_count(glyph: &dyn GlyphView, cx: &CheckContext) -> Option<String> {
    let remover = cx.overlap_remover?;
    let count = glyph.contour_count();
    let remaining = remover.remove_overlap(glyph).len();
    (count.saturating_sub(remaining) > cx.config.overlap_contour_excess)
        .then(|| "This glyph has an unusually high number of overlapping contours.".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contour::Contour;
    use crate::font::Font;
    use crate::glyph::{Component, Glyph};
    use crate::report::OverlapRemover;
    use kurbo::Affine;
    use pretty_assertions::assert_eq;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Contour {
        Contour::polygon(&[(x0, y0), (x1, y0), (x1, y1), (x0, y1)])
    }

    fn rect_cw(x0: f64, y0: f64, x1: f64, y1: f64) -> Contour {
        Contour::polygon(&[(x0, y0), (x0, y1), (x1, y1), (x1, y0)])
    }

    fn stems(v: Vec<f64>, h: Vec<f64>) -> FontInfo {
        FontInfo {
            stem_snap_v: v,
            stem_snap_h: h,
            ..Default::default()
        }
    }

    #[test]
    fn vertical_stem_round_trip() {
        let mut glyph = Glyph::new("l");
        glyph.add_contour(rect(0.0, 0.0, 80.0, 700.0));
        let report = stem_widths(&glyph, &stems(vec![80.0], vec![]), &CheckConfig::default());
        assert_eq!(
            report.vertical,
            vec![StemRun {
                start: 0.0,
                end: 80.0,
                spans: [0.0, 700.0, 0.0, 700.0],
                width: 80.0,
                measured: 80.0,
            }]
        );
        assert!(report.horizontal.is_empty());
    }

    #[test]
    fn near_stem_uses_closest_value() {
        let mut glyph = Glyph::new("l");
        glyph.add_contour(rect(0.0, 0.0, 83.0, 700.0));
        let report = stem_widths(&glyph, &stems(vec![80.0, 85.0], vec![]), &CheckConfig::default());
        assert_eq!(report.vertical.len(), 1);
        assert_eq!(report.vertical[0].width, 85.0);
        assert_eq!(report.vertical[0].end, 85.0);
        assert_eq!(report.vertical[0].measured, 83.0);
    }

    #[test]
    fn stem_outside_tolerance_is_ignored() {
        let mut glyph = Glyph::new("l");
        glyph.add_contour(rect(0.0, 0.0, 100.0, 700.0));
        let report = stem_widths(&glyph, &stems(vec![80.0], vec![]), &CheckConfig::default());
        assert!(report.is_empty());
    }

    #[test]
    fn stem_between_outer_and_counter() {
        let mut glyph = Glyph::new("o");
        glyph.add_contour(rect_cw(0.0, 0.0, 300.0, 500.0));
        glyph.add_contour(rect(90.0, 60.0, 210.0, 440.0));
        let report = stem_widths(&glyph, &stems(vec![90.0], vec![]), &CheckConfig::default());
        let starts: Vec<f64> = report.vertical.iter().map(|r| r.start).collect();
        assert!(starts.contains(&0.0));
        assert!(starts.contains(&210.0));
    }

    #[test]
    fn rotated_duplicate_contour() {
        let mut glyph = Glyph::new("a");
        glyph.add_contour(Contour::polygon(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]));
        glyph.add_contour(Contour::polygon(&[(10.0, 10.0), (0.0, 10.0), (0.0, 0.0), (10.0, 0.0)]));
        glyph.add_contour(rect(50.0, 0.0, 60.0, 10.0));
        assert_eq!(
            duplicate_contours(&glyph),
            vec![(1, Some(Rect::new(0.0, 0.0, 10.0, 10.0)))]
        );
    }

    #[test]
    fn stacked_start_points_digest_alike() {
        let a = Contour::polygon(&[(0.0, 0.0), (0.0, 0.0), (10.0, 5.0), (5.0, 10.0)]);
        let b = Contour::polygon(&[(0.0, 0.0), (10.0, 5.0), (5.0, 10.0), (0.0, 0.0)]);
        let c = Contour::polygon(&[(5.0, 10.0), (0.0, 0.0), (0.0, 0.0), (10.0, 5.0)]);
        assert_eq!(contour_digest(&a), contour_digest(&b));
        assert_eq!(contour_digest(&a), contour_digest(&c));
        let reversed = Contour::polygon(&[(0.0, 0.0), (0.0, 0.0), (5.0, 10.0), (10.0, 5.0)]);
        assert_ne!(contour_digest(&a), contour_digest(&reversed));
    }

    #[test]
    fn duplicate_component() {
        let mut font = Font::default();
        let mut base = Glyph::new("acute");
        base.add_contour(rect(0.0, 0.0, 10.0, 10.0));
        font.insert(base);
        let config = CheckConfig::default();
        let cx = CheckContext::new(&font, &config);

        let mut glyph = Glyph::new("a");
        glyph.add_component(Component::new("acute", Affine::translate((5.0, 0.0))));
        glyph.add_component(Component::new("acute", Affine::translate((5.0, 100.0))));
        glyph.add_component(Component::new("acute", Affine::translate((5.0, 0.0))));
        assert_eq!(
            duplicate_components(&glyph, &cx),
            vec![(2, Some(Rect::new(5.0, 0.0, 15.0, 10.0)))]
        );
    }

    struct MergeAll;

    impl OverlapRemover for MergeAll {
        fn remove_overlap(&self, glyph: &dyn GlyphView) -> Vec<Contour> {
            glyph
                .contours()
                .first()
                .map(|c| vec![Contour::new(c.points().to_vec())])
                .unwrap_or_default()
        }
    }

    #[test]
    fn contour_count_needs_remover() {
        let font = Font::default();
        let config = CheckConfig::default();
        let mut glyph = Glyph::new("x");
        for i in 0..4 {
            let offset = i as f64 * 5.0;
            glyph.add_contour(rect(offset, 0.0, offset + 20.0, 20.0));
        }
        let cx = CheckContext::new(&font, &config);
        assert_eq!(contour_count(&glyph, &cx), None);
        let remover = MergeAll;
        let cx = cx.with_overlap_remover(&remover);
        assert!(contour_count(&glyph, &cx).is_some());
    }
}
