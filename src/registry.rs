//! The closed set of tests, their metadata and dispatch table.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::checks::{contour, glyph, info, metrics, point, segment, CheckContext};
use crate::contour::ContourView;
use crate::error::CheckError;
use crate::glyph::GlyphView;
use crate::report::Finding;

/// Stable identifier of every test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TestId {
    UnicodeValue,
    StemWidths,
    DuplicateContours,
    DuplicateComponents,
    ContourCount,
    LigatureMetrics,
    ComponentMetrics,
    MetricsSymmetry,
    SmallContours,
    OpenContour,
    ExtremePoints,
    CurveSymmetry,
    AngleNearMiss,
    PointsNearVerticalMetrics,
    UnsmoothSmooths,
    ComplexCurves,
    CrossedHandles,
    UnnecessaryHandles,
    UnevenHandles,
    StrayPoints,
    UnnecessaryPoints,
    OverlappingPoints,
}

/// The granularity a test inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Level {
    GlyphInfo,
    Glyph,
    Metrics,
    Contour,
    Segment,
    Point,
}

/// How a test is invoked.
#[derive(Clone, Copy)]
pub enum Runner {
    /// Once per contour; results keyed by contour index.
    Contour(fn(&dyn ContourView, &CheckContext) -> Option<Finding>),
    /// Once per glyph.
    Glyph(fn(&dyn GlyphView, &CheckContext) -> Option<Finding>),
}

/// Registry entry.
#[derive(Clone, Copy)]
pub struct TestDef {
    pub id: TestId,
    pub level: Level,
    pub title: &'static str,
    pub description: &'static str,
    pub run: Runner,
}

impl fmt::Debug for TestDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestDef")
            .field("id", &self.id)
            .field("level", &self.level)
            .finish_non_exhaustive()
    }
}

/// Every test, in the order reports list them.
pub static TEST_DEFS: &[TestDef] = &[
    // Glyph info
    TestDef {
        id: TestId::UnicodeValue,
        level: Level::GlyphInfo,
        title: "Incorrect Unicode value",
        description: "The Unicode value for this glyph does not match its name, or is shared with another glyph.",
        run: Runner::Glyph(run_unicode_value),
    },
    // Glyph
    TestDef {
        id: TestId::StemWidths,
        level: Level::Glyph,
        title: "Stem widths",
        description: "Stems matching one of the font's registered stem widths.",
        run: Runner::Glyph(run_stem_widths),
    },
    TestDef {
        id: TestId::DuplicateContours,
        level: Level::Glyph,
        title: "Duplicate contours",
        description: "One or more contours are duplicated.",
        run: Runner::Glyph(run_duplicate_contours),
    },
    TestDef {
        id: TestId::DuplicateComponents,
        level: Level::Glyph,
        title: "Duplicate components",
        description: "One or more components are duplicated.",
        run: Runner::Glyph(run_duplicate_components),
    },
    TestDef {
        id: TestId::ContourCount,
        level: Level::Glyph,
        title: "Contour count",
        description: "This glyph has an unusually high number of overlapping contours.",
        run: Runner::Glyph(run_contour_count),
    },
    // Metrics
    TestDef {
        id: TestId::LigatureMetrics,
        level: Level::Metrics,
        title: "Ligature side-bearings",
        description: "The side-bearings don't match the ligature's presumed part metrics.",
        run: Runner::Glyph(run_ligature_metrics),
    },
    TestDef {
        id: TestId::ComponentMetrics,
        level: Level::Metrics,
        title: "Component side-bearings",
        description: "The side-bearings don't match the component's metrics.",
        run: Runner::Glyph(run_component_metrics),
    },
    TestDef {
        id: TestId::MetricsSymmetry,
        level: Level::Metrics,
        title: "Symmetry",
        description: "The side-bearings are almost equal.",
        run: Runner::Glyph(run_metrics_symmetry),
    },
    // Contour
    TestDef {
        id: TestId::SmallContours,
        level: Level::Contour,
        title: "Small contours",
        description: "One or more contours are suspiciously small.",
        run: Runner::Contour(run_small_contours),
    },
    TestDef {
        id: TestId::OpenContour,
        level: Level::Contour,
        title: "Open contours",
        description: "One or more contours are not properly closed.",
        run: Runner::Contour(run_open_contour),
    },
    TestDef {
        id: TestId::ExtremePoints,
        level: Level::Contour,
        title: "Extreme points",
        description: "One or more curves need an extreme point.",
        run: Runner::Contour(run_extreme_points),
    },
    TestDef {
        id: TestId::CurveSymmetry,
        level: Level::Contour,
        title: "Curve symmetry",
        description: "One or more curve pairs are slightly asymmetrical.",
        run: Runner::Contour(run_curve_symmetry),
    },
    // Segment
    TestDef {
        id: TestId::AngleNearMiss,
        level: Level::Segment,
        title: "Angle near miss",
        description: "One or more lines are nearly at important angles.",
        run: Runner::Contour(run_angle_near_miss),
    },
    TestDef {
        id: TestId::PointsNearVerticalMetrics,
        level: Level::Segment,
        title: "Near vertical metrics",
        description: "Two or more points are just off a vertical metric.",
        run: Runner::Contour(run_points_near_vertical_metrics),
    },
    TestDef {
        id: TestId::UnsmoothSmooths,
        level: Level::Segment,
        title: "Unsmooth smooths",
        description: "One or more smooth points do not have handles that are properly placed.",
        run: Runner::Contour(run_unsmooth_smooths),
    },
    TestDef {
        id: TestId::ComplexCurves,
        level: Level::Segment,
        title: "Complex curves",
        description: "One or more curves is suspiciously complex.",
        run: Runner::Contour(run_complex_curves),
    },
    TestDef {
        id: TestId::CrossedHandles,
        level: Level::Segment,
        title: "Crossed handles",
        description: "One or more curves contain crossed handles.",
        run: Runner::Contour(run_crossed_handles),
    },
    TestDef {
        id: TestId::UnnecessaryHandles,
        level: Level::Segment,
        title: "Unnecessary handles",
        description: "One or more curves has unnecessary handles.",
        run: Runner::Contour(run_unnecessary_handles),
    },
    TestDef {
        id: TestId::UnevenHandles,
        level: Level::Segment,
        title: "Uneven handles",
        description: "One or more curves has uneven handles.",
        run: Runner::Contour(run_uneven_handles),
    },
    // Point
    TestDef {
        id: TestId::StrayPoints,
        level: Level::Point,
        title: "Stray points",
        description: "One or more stray points are present.",
        run: Runner::Contour(run_stray_points),
    },
    TestDef {
        id: TestId::UnnecessaryPoints,
        level: Level::Point,
        title: "Unnecessary points",
        description: "One or more unnecessary points are present.",
        run: Runner::Contour(run_unnecessary_points),
    },
    TestDef {
        id: TestId::OverlappingPoints,
        level: Level::Point,
        title: "Overlapping points",
        description: "Two or more points are overlapping.",
        run: Runner::Contour(run_overlapping_points),
    },
];

impl TestId {
    pub fn def(self) -> &'static TestDef {
        // The table lists every variant exactly once, in declaration order.
        &TEST_DEFS[self as usize]
    }

    pub fn all() -> impl Iterator<Item = TestId> {
        TEST_DEFS.iter().map(|def| def.id)
    }

    /// The camelCase key used in reports and selections.
    pub fn as_str(self) -> &'static str {
        match self {
            TestId::UnicodeValue => "unicodeValue",
            TestId::StemWidths => "stemWidths",
            TestId::DuplicateContours => "duplicateContours",
            TestId::DuplicateComponents => "duplicateComponents",
            TestId::ContourCount => "contourCount",
            TestId::LigatureMetrics => "ligatureMetrics",
            TestId::ComponentMetrics => "componentMetrics",
            TestId::MetricsSymmetry => "metricsSymmetry",
            TestId::SmallContours => "smallContours",
            TestId::OpenContour => "openContour",
            TestId::ExtremePoints => "extremePoints",
            TestId::CurveSymmetry => "curveSymmetry",
            TestId::AngleNearMiss => "angleNearMiss",
            TestId::PointsNearVerticalMetrics => "pointsNearVerticalMetrics",
            TestId::UnsmoothSmooths => "unsmoothSmooths",
            TestId::ComplexCurves => "complexCurves",
            TestId::CrossedHandles => "crossedHandles",
            TestId::UnnecessaryHandles => "unnecessaryHandles",
            TestId::UnevenHandles => "unevenHandles",
            TestId::StrayPoints => "strayPoints",
            TestId::UnnecessaryPoints => "unnecessaryPoints",
            TestId::OverlappingPoints => "overlappingPoints",
        }
    }
}

impl fmt::Display for TestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TestId {
    type Err = CheckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TestId::all()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| CheckError::UnknownTest(s.to_string()))
    }
}

/// The set of tests to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestSelection(BTreeSet<TestId>);

impl TestSelection {
    pub fn all() -> Self {
        Self(TestId::all().collect())
    }

    pub fn none() -> Self {
        Self(BTreeSet::new())
    }

    pub fn contains(&self, id: TestId) -> bool {
        self.0.contains(&id)
    }

    pub fn insert(&mut self, id: TestId) {
        self.0.insert(id);
    }

    pub fn remove(&mut self, id: TestId) {
        self.0.remove(&id);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Selected tests in report order.
    pub fn defs(&self) -> impl Iterator<Item = &'static TestDef> + '_ {
        TEST_DEFS.iter().filter(|def| self.contains(def.id))
    }
}

impl Default for TestSelection {
    fn default() -> Self {
        Self::all()
    }
}

impl FromIterator<TestId> for TestSelection {
    fn from_iter<I: IntoIterator<Item = TestId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Parses a comma separated list of identifiers.
impl FromStr for TestSelection {
    type Err = CheckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(TestId::from_str)
            .collect()
    }
}

/// Serialized as an object of every identifier to whether it is enabled.
impl Serialize for TestSelection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(TestId::all().map(|id| (id, self.contains(id))))
    }
}

/// Identifiers missing from the object default to enabled.
impl<'de> Deserialize<'de> for TestSelection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let flags = indexmap::IndexMap::<TestId, bool>::deserialize(deserializer)?;
        Ok(TestId::all()
            .filter(|id| flags.get(id).copied().unwrap_or(true))
            .collect())
    }
}

// ── Runners ─────────────────────────────────────────────────

fn run_unicode_value(g: &dyn GlyphView, cx: &CheckContext) -> Option<Finding> {
    Finding::Messages(info::unicode_value(g, cx)).non_empty()
}

fn run_stem_widths(g: &dyn GlyphView, cx: &CheckContext) -> Option<Finding> {
    Finding::Stems(glyph::stem_widths(g, cx.font.info(), cx.config)).non_empty()
}

fn run_duplicate_contours(g: &dyn GlyphView, _cx: &CheckContext) -> Option<Finding> {
    Finding::IndexedBounds(glyph::duplicate_contours(g)).non_empty()
}

fn run_duplicate_components(g: &dyn GlyphView, cx: &CheckContext) -> Option<Finding> {
    Finding::IndexedBounds(glyph::duplicate_components(g, cx)).non_empty()
}

fn run_contour_count(g: &dyn GlyphView, cx: &CheckContext) -> Option<Finding> {
    glyph::contour_count(g, cx).map(Finding::Message)
}

fn run_ligature_metrics(g: &dyn GlyphView, cx: &CheckContext) -> Option<Finding> {
    metrics::ligature_metrics(g, cx).map(Finding::SideBearings)
}

fn run_component_metrics(g: &dyn GlyphView, cx: &CheckContext) -> Option<Finding> {
    metrics::component_metrics(g, cx).map(Finding::SideBearings)
}

fn run_metrics_symmetry(g: &dyn GlyphView, cx: &CheckContext) -> Option<Finding> {
    metrics::metrics_symmetry(g, cx).map(Finding::Symmetry)
}

fn run_small_contours(c: &dyn ContourView, cx: &CheckContext) -> Option<Finding> {
    contour::small_contours(c, cx.config).map(Finding::Bounds)
}

fn run_open_contour(c: &dyn ContourView, _cx: &CheckContext) -> Option<Finding> {
    contour::open_contour(c).map(|(start, end)| Finding::Ends(start, end))
}

fn run_extreme_points(c: &dyn ContourView, _cx: &CheckContext) -> Option<Finding> {
    Finding::Points(contour::extreme_points(c)).non_empty()
}

fn run_curve_symmetry(c: &dyn ContourView, cx: &CheckContext) -> Option<Finding> {
    Finding::CurvePairs(contour::curve_symmetry(c, cx.config)).non_empty()
}

fn run_angle_near_miss(c: &dyn ContourView, cx: &CheckContext) -> Option<Finding> {
    Finding::PointPairs(segment::angle_near_miss(c, cx.config)).non_empty()
}

fn run_points_near_vertical_metrics(c: &dyn ContourView, cx: &CheckContext) -> Option<Finding> {
    Finding::MetricPoints(segment::points_near_vertical_metrics(c, cx.font.info(), cx.config)).non_empty()
}

fn run_unsmooth_smooths(c: &dyn ContourView, cx: &CheckContext) -> Option<Finding> {
    Finding::Triples(segment::unsmooth_smooths(c, cx.config)).non_empty()
}

fn run_complex_curves(c: &dyn ContourView, _cx: &CheckContext) -> Option<Finding> {
    Finding::Curves(segment::complex_curves(c)).non_empty()
}

fn run_crossed_handles(c: &dyn ContourView, cx: &CheckContext) -> Option<Finding> {
    Finding::CrossedHandles(segment::crossed_handles(c, cx.config)).non_empty()
}

fn run_unnecessary_handles(c: &dyn ContourView, _cx: &CheckContext) -> Option<Finding> {
    Finding::PointPairs(segment::unnecessary_handles(c)).non_empty()
}

fn run_uneven_handles(c: &dyn ContourView, cx: &CheckContext) -> Option<Finding> {
    Finding::UnevenHandles(segment::uneven_handles(c, cx.config)).non_empty()
}

fn run_stray_points(c: &dyn ContourView, _cx: &CheckContext) -> Option<Finding> {
    point::stray_points(c).map(Finding::Point)
}

fn run_unnecessary_points(c: &dyn ContourView, cx: &CheckContext) -> Option<Finding> {
    Finding::Points(point::unnecessary_points(c, cx.config)).non_empty()
}

fn run_overlapping_points(c: &dyn ContourView, _cx: &CheckContext) -> Option<Finding> {
    Finding::Points(point::overlapping_points(c)).non_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn table_matches_declaration_order() {
        assert_eq!(TEST_DEFS.len(), 22);
        for (index, def) in TEST_DEFS.iter().enumerate() {
            assert_eq!(def.id as usize, index, "{}", def.id);
            assert_eq!(def.id.def().id, def.id);
        }
    }

    #[test]
    fn ids_round_trip_through_strings() {
        for id in TestId::all() {
            assert_eq!(id.as_str().parse::<TestId>().unwrap(), id);
            assert_eq!(serde_json::to_string(&id).unwrap(), format!("\"{id}\""));
        }
    }

    #[test]
    fn parse_comma_list() {
        let selection: TestSelection = "strayPoints, openContour,".parse().unwrap();
        assert!(selection.contains(TestId::StrayPoints));
        assert!(selection.contains(TestId::OpenContour));
        assert!(!selection.contains(TestId::StemWidths));
        let ids: Vec<TestId> = selection.defs().map(|d| d.id).collect();
        assert_eq!(ids, vec![TestId::OpenContour, TestId::StrayPoints]);
    }

    #[test]
    fn unknown_id_is_an_error() {
        let err = "strayPoints,bogus".parse::<TestSelection>().unwrap_err();
        assert!(matches!(err, CheckError::UnknownTest(ref s) if s == "bogus"));
    }

    #[test]
    fn selection_json_defaults_to_enabled() {
        let selection: TestSelection =
            serde_json::from_str(r#"{"stemWidths": false, "openContour": true}"#).unwrap();
        assert!(!selection.contains(TestId::StemWidths));
        assert!(selection.contains(TestId::OpenContour));
        assert!(selection.contains(TestId::StrayPoints));

        let json = serde_json::to_value(&selection).unwrap();
        assert_eq!(json["stemWidths"], serde_json::Value::Bool(false));
        assert_eq!(json["unicodeValue"], serde_json::Value::Bool(true));
    }
}
