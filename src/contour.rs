//! Read-only contour model.
//!
//! Analyzers only ever see a [`ContourView`]: an ordered, cyclic list of
//! segments plus a few derived attributes. [`Contour`] is the owned
//! implementation; host representations (UFO, kurbo paths) are converted
//! into it at the boundary.

use kurbo::{BezPath, CubicBez, ParamCurveExtrema, PathEl, PathSeg, Point, Rect, Shape};

use crate::geom::signed_area;

/// UFO-style point type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointType {
    Move,
    Line,
    OffCurve,
    Curve,
    QCurve,
}

/// A single point of a contour, as stored by the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContourPoint {
    pub x: f64,
    pub y: f64,
    pub typ: PointType,
    pub smooth: bool,
}

impl ContourPoint {
    pub fn new(x: f64, y: f64, typ: PointType, smooth: bool) -> Self {
        Self { x, y, typ, smooth }
    }

    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn is_on_curve(&self) -> bool {
        self.typ != PointType::OffCurve
    }
}

/// The kind of edge a segment draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentKind {
    Move,
    Line,
    Curve,
    QCurve,
}

impl From<PointType> for SegmentKind {
    fn from(typ: PointType) -> Self {
        match typ {
            PointType::Move => SegmentKind::Move,
            PointType::Curve => SegmentKind::Curve,
            PointType::QCurve => SegmentKind::QCurve,
            PointType::Line | PointType::OffCurve => SegmentKind::Line,
        }
    }
}

/// One edge of a contour, ending at an on-curve point.
///
/// The start of a segment is the `on_curve` of the previous segment.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub kind: SegmentKind,
    pub off_curve: Vec<Point>,
    pub on_curve: Point,
    pub smooth: bool,
}

impl Segment {
    /// The two handles of a cubic segment.
    pub fn handles(&self) -> Option<(Point, Point)> {
        match (self.kind, self.off_curve.as_slice()) {
            (SegmentKind::Curve, [h1, h2]) => Some((*h1, *h2)),
            _ => None,
        }
    }
}

/// The read interface every analyzer is written against.
pub trait ContourView {
    /// Segments in drawing order. For a closed contour the last segment
    /// ends on the contour's first point.
    fn segments(&self) -> &[Segment];

    /// Raw points as stored by the host.
    fn points(&self) -> &[ContourPoint];

    fn is_open(&self) -> bool;

    fn len(&self) -> usize {
        self.segments().len()
    }

    fn is_empty(&self) -> bool {
        self.segments().is_empty()
    }

    /// Segment access with Python-style wraparound: `-1` is the last
    /// segment, `len` is the first.
    fn segment(&self, index: isize) -> Option<&Segment> {
        let segments = self.segments();
        if segments.is_empty() {
            return None;
        }
        let n = segments.len() as isize;
        segments.get(index.rem_euclid(n) as usize)
    }

    fn on_curve_points(&self) -> Vec<Point> {
        self.segments().iter().map(|s| s.on_curve).collect()
    }

    /// The outline as a kurbo path. Always closed unless the contour is open.
    fn to_bez_path(&self) -> BezPath {
        let mut path = BezPath::new();
        let segments = self.segments();
        let Some(last) = segments.last() else {
            return path;
        };
        let (start, body) = if self.is_open() {
            (segments[0].on_curve, &segments[1..])
        } else {
            (last.on_curve, segments)
        };
        path.move_to(start);
        for segment in body {
            match (segment.kind, segment.off_curve.as_slice()) {
                (SegmentKind::Curve, [a, b]) => path.curve_to(*a, *b, segment.on_curve),
                (SegmentKind::QCurve, [a]) | (SegmentKind::Curve, [a]) => {
                    path.quad_to(*a, segment.on_curve)
                }
                (SegmentKind::QCurve, offs) if offs.len() > 1 => {
                    // Implied on-curve points between consecutive quadratic handles.
                    for pair in offs.windows(2) {
                        path.quad_to(pair[0], pair[0].midpoint(pair[1]));
                    }
                    if let Some(last_off) = offs.last() {
                        path.quad_to(*last_off, segment.on_curve);
                    }
                }
                _ => path.line_to(segment.on_curve),
            }
        }
        if !self.is_open() {
            path.close_path();
        }
        path
    }

    /// Tight bounds of the drawn outline, or `None` when empty.
    fn bounds(&self) -> Option<Rect> {
        if self.is_empty() {
            return None;
        }
        path_bounds(&self.to_bez_path())
    }

    /// Winding direction from the on-curve polygon.
    fn is_clockwise(&self) -> bool {
        signed_area(&self.to_bez_path()) < 0.0
    }

    /// Nonzero-winding inside test against the closed outline.
    fn contains(&self, point: Point) -> bool {
        if self.len() < 2 {
            return false;
        }
        let mut path = self.to_bez_path();
        if self.is_open() {
            path.close_path();
        }
        path.contains(point)
    }
}

/// Tight bounds of a path: every end point plus curve extrema.
pub fn path_bounds(path: &BezPath) -> Option<Rect> {
    let mut rect: Option<Rect> = None;
    let mut add = |r: Rect| rect = Some(rect.map_or(r, |b| b.union(r)));
    for el in path.elements() {
        if let PathEl::MoveTo(p) = el {
            add(Rect::from_points(*p, *p));
        }
    }
    for seg in path.segments() {
        add(match seg {
            PathSeg::Line(l) => Rect::from_points(l.p0, l.p1),
            PathSeg::Quad(q) => ParamCurveExtrema::bounding_box(&q),
            PathSeg::Cubic(c) => ParamCurveExtrema::bounding_box(&c),
        });
    }
    rect
}

/// Owned contour: the host-neutral read model.
#[derive(Debug, Clone, PartialEq)]
pub struct Contour {
    points: Vec<ContourPoint>,
    segments: Vec<Segment>,
    open: bool,
}

impl Contour {
    /// Build from a UFO-style point list. The contour is open when its
    /// first point is a `Move`.
    pub fn new(points: Vec<ContourPoint>) -> Self {
        let open = points.first().is_some_and(|p| p.typ == PointType::Move);
        let segments = build_segments(&points, open);
        Self {
            points,
            segments,
            open,
        }
    }

    /// A closed contour made only of straight lines.
    pub fn polygon(coords: &[(f64, f64)]) -> Self {
        Self::new(
            coords
                .iter()
                .map(|&(x, y)| ContourPoint::new(x, y, PointType::Line, false))
                .collect(),
        )
    }

    /// Convert every subpath of a kurbo path into a contour.
    pub fn from_bez_path(path: &BezPath) -> Vec<Contour> {
        let mut contours = Vec::new();
        let mut current: Vec<PathEl> = Vec::new();
        for el in path.elements() {
            if matches!(el, PathEl::MoveTo(_)) && !current.is_empty() {
                contours.push(contour_from_elements(&current));
                current.clear();
            }
            current.push(*el);
        }
        if !current.is_empty() {
            contours.push(contour_from_elements(&current));
        }
        contours
    }
}

impl ContourView for Contour {
    fn segments(&self) -> &[Segment] {
        &self.segments
    }

    fn points(&self) -> &[ContourPoint] {
        &self.points
    }

    fn is_open(&self) -> bool {
        self.open
    }
}

/// Group points into segments. Closed contours are rotated so the last
/// segment ends on the first on-curve point of the list.
fn build_segments(points: &[ContourPoint], open: bool) -> Vec<Segment> {
    let ordered: Vec<ContourPoint> = if open {
        points.to_vec()
    } else {
        let Some(first_on) = points.iter().position(ContourPoint::is_on_curve) else {
            return Vec::new();
        };
        points[first_on + 1..]
            .iter()
            .chain(&points[..=first_on])
            .copied()
            .collect()
    };

    let mut segments = Vec::new();
    let mut pending: Vec<Point> = Vec::new();
    for p in ordered {
        if p.typ == PointType::OffCurve {
            pending.push(p.point());
            continue;
        }
        segments.push(Segment {
            kind: p.typ.into(),
            off_curve: std::mem::take(&mut pending),
            on_curve: p.point(),
            smooth: p.smooth,
        });
    }
    if !pending.is_empty() {
        log::trace!("dropping {} trailing off-curve points", pending.len());
    }
    segments
}

fn contour_point(p: Point, typ: PointType, smooth: bool) -> ContourPoint {
    ContourPoint::new(p.x, p.y, typ, smooth)
}

/// One kurbo subpath → one contour.
fn contour_from_elements(elements: &[PathEl]) -> Contour {
    let first = match elements.first() {
        Some(PathEl::MoveTo(p)) => *p,
        _ => return Contour::new(Vec::new()),
    };
    let closed = matches!(elements.last(), Some(PathEl::ClosePath));

    let mut points: Vec<ContourPoint> = Vec::new();
    for el in elements.iter().skip(1) {
        match *el {
            PathEl::LineTo(p) => points.push(contour_point(p, PointType::Line, false)),
            PathEl::CurveTo(a, b, p) => {
                points.push(contour_point(a, PointType::OffCurve, false));
                points.push(contour_point(b, PointType::OffCurve, false));
                points.push(contour_point(p, PointType::Curve, false));
            }
            PathEl::QuadTo(a, p) => {
                points.push(contour_point(a, PointType::OffCurve, false));
                points.push(contour_point(p, PointType::QCurve, false));
            }
            PathEl::MoveTo(_) | PathEl::ClosePath => {}
        }
    }

    if !closed {
        points.insert(0, contour_point(first, PointType::Move, false));
        return Contour::new(points);
    }

    // First point type comes from the closing segment.
    let closing_type = elements
        .iter()
        .rev()
        .find(|e| !matches!(e, PathEl::ClosePath))
        .map(|e| match e {
            PathEl::CurveTo(..) => PointType::Curve,
            PathEl::QuadTo(..) => PointType::QCurve,
            _ => PointType::Line,
        })
        .unwrap_or(PointType::Line);

    // A closing segment that returns to the start duplicates the MoveTo;
    // contours are cyclic so the first point closes the loop implicitly.
    if let Some(last) = points.last() {
        if last.is_on_curve() && last.point() == first {
            points.pop();
        }
    }
    points.insert(0, contour_point(first, closing_type, false));
    Contour::new(points)
}

/// A cubic segment as a kurbo curve.
pub fn segment_cubic(start: Point, segment: &Segment) -> Option<CubicBez> {
    let (h1, h2) = segment.handles()?;
    Some(CubicBez::new(start, h1, h2, segment.on_curve))
}
