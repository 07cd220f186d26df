//! Running selected tests over glyphs and fonts, and the report shapes.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use indexmap::IndexMap;
use kurbo::{Point, Rect};
use rayon::prelude::*;
use serde::{Serialize, Serializer};

use crate::checks::contour::CurvePoints;
use crate::checks::glyph::{IndexedBounds, StemReport};
use crate::checks::metrics::{SideBearingReport, SymmetryReport};
use crate::checks::segment::{CrossedHandle, MetricHits, UnevenHandle};
use crate::checks::CheckContext;
use crate::config::CheckConfig;
use crate::contour::Contour;
use crate::error::CheckError;
use crate::font::FontView;
use crate::glyph::{Glyph, GlyphView};
use crate::registry::{Runner, TestId, TestSelection};

/// Flattens overlapping contours. Supplied by the host.
pub trait OverlapRemover: Sync {
    /// The glyph's contours after overlap removal. Must not modify `glyph`.
    fn remove_overlap(&self, glyph: &dyn GlyphView) -> Vec<Contour>;
}

/// The payload of a single flagged test.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Finding {
    Message(String),
    Messages(Vec<String>),
    Point(Point),
    Points(Vec<Point>),
    Ends(Point, Point),
    PointPairs(Vec<(Point, Point)>),
    Triples(Vec<(Point, Point, Point)>),
    Curves(Vec<CurvePoints>),
    CurvePairs(Vec<(CurvePoints, CurvePoints)>),
    #[serde(serialize_with = "metric_hits")]
    MetricPoints(MetricHits),
    CrossedHandles(Vec<CrossedHandle>),
    UnevenHandles(Vec<UnevenHandle>),
    Bounds(Rect),
    IndexedBounds(IndexedBounds),
    Stems(StemReport),
    SideBearings(SideBearingReport),
    Symmetry(SymmetryReport),
}

impl Finding {
    /// Whether the payload means "passed".
    pub fn is_empty(&self) -> bool {
        match self {
            Finding::Message(m) => m.is_empty(),
            Finding::Messages(v) => v.is_empty(),
            Finding::Point(_) | Finding::Ends(..) | Finding::Bounds(_) => false,
            Finding::Points(v) => v.is_empty(),
            Finding::PointPairs(v) => v.is_empty(),
            Finding::Triples(v) => v.is_empty(),
            Finding::Curves(v) => v.is_empty(),
            Finding::CurvePairs(v) => v.is_empty(),
            Finding::MetricPoints(m) => m.is_empty(),
            Finding::CrossedHandles(v) => v.is_empty(),
            Finding::UnevenHandles(v) => v.is_empty(),
            Finding::IndexedBounds(v) => v.is_empty(),
            Finding::Stems(s) => s.is_empty(),
            Finding::SideBearings(_) | Finding::Symmetry(_) => false,
        }
    }

    pub(crate) fn non_empty(self) -> Option<Self> {
        (!self.is_empty()).then_some(self)
    }
}

/// JSON object keys must be strings.
fn metric_hits<S: Serializer>(hits: &MetricHits, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_map(hits.iter().map(|(value, points)| (value.0.to_string(), points)))
}

/// The result of one test on one glyph.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TestResult {
    Glyph(Finding),
    /// Findings keyed by contour index.
    Contours(BTreeMap<usize, Finding>),
}

/// Every flagged test for one glyph, in registry order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct GlyphReport(IndexMap<TestId, TestResult>);

impl GlyphReport {
    pub fn get(&self, id: TestId) -> Option<&TestResult> {
        self.0.get(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TestId, &TestResult)> {
        self.0.iter()
    }

    /// The finding for a glyph-level test.
    pub fn glyph_finding(&self, id: TestId) -> Option<&Finding> {
        match self.get(id)? {
            TestResult::Glyph(finding) => Some(finding),
            TestResult::Contours(_) => None,
        }
    }

    /// The finding for a contour-level test on one contour.
    pub fn contour_finding(&self, id: TestId, contour: usize) -> Option<&Finding> {
        match self.get(id)? {
            TestResult::Contours(map) => map.get(&contour),
            TestResult::Glyph(_) => None,
        }
    }
}

/// Reports for every flagged glyph, in font glyph order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FontReport(IndexMap<String, GlyphReport>);

impl FontReport {
    pub fn get(&self, name: &str) -> Option<&GlyphReport> {
        self.0.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &GlyphReport)> {
        self.0.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

/// Run the selected tests on one glyph. Passed tests are left out.
pub fn test_glyph(glyph: &dyn GlyphView, selection: &TestSelection, cx: &CheckContext) -> GlyphReport {
    let contours = glyph.contours();
    let mut report = IndexMap::new();
    for def in selection.defs() {
        let result = match def.run {
            Runner::Glyph(run) => run(glyph, cx).map(TestResult::Glyph),
            Runner::Contour(run) => {
                let found: BTreeMap<usize, Finding> = contours
                    .iter()
                    .enumerate()
                    .filter_map(|(index, contour)| run(*contour, cx).map(|f| (index, f)))
                    .collect();
                (!found.is_empty()).then_some(TestResult::Contours(found))
            }
        };
        if let Some(result) = result {
            report.insert(def.id, result);
        }
    }
    GlyphReport(report)
}

/// Options for [`test_font`].
#[derive(Default, Clone, Copy)]
pub struct FontRunOptions<'a> {
    /// Test glyphs on the rayon thread pool.
    pub parallel: bool,
    /// Checked before each glyph; when set the run stops.
    pub cancel: Option<&'a AtomicBool>,
    pub overlap_remover: Option<&'a dyn OverlapRemover>,
    /// Flatten overlaps on a copy of each glyph before testing.
    pub remove_overlap_first: bool,
    /// Restrict the run to these glyphs. `None` tests the whole font.
    pub glyphs: Option<&'a [String]>,
}

/// Run the selected tests on every glyph of a font.
///
/// Only glyphs with at least one flagged test appear in the report.
pub fn test_font(
    font: &dyn FontView,
    selection: &TestSelection,
    config: &CheckConfig,
    options: FontRunOptions,
) -> Result<FontReport, CheckError> {
    let t_start = Instant::now();
    let names: Vec<&str> = match options.glyphs {
        Some(requested) => {
            for name in requested {
                if !font.contains(name) {
                    return Err(CheckError::MissingGlyph(name.clone()));
                }
            }
            requested.iter().map(String::as_str).collect()
        }
        None => font.glyph_order(),
    };

    let mut cx = CheckContext::new(font, config);
    if let Some(remover) = options.overlap_remover {
        cx = cx.with_overlap_remover(remover);
    }

    let run_one = |name: &str| -> Result<Option<(String, GlyphReport)>, CheckError> {
        if options.cancel.is_some_and(|c| c.load(Ordering::Relaxed)) {
            return Err(CheckError::Cancelled { completed: 0 });
        }
        let Some(glyph) = font.glyph(name) else {
            log::debug!("skipping missing glyph {name}");
            return Ok(None);
        };
        let t_glyph = Instant::now();
        let report = match (options.remove_overlap_first, options.overlap_remover) {
            (true, Some(remover)) => {
                let mut flattened = Glyph::from_view(glyph);
                flattened.set_contours(remover.remove_overlap(glyph));
                test_glyph(&flattened, selection, &cx)
            }
            _ => test_glyph(glyph, selection, &cx),
        };
        log::trace!("{name}: {} flagged in {:?}", report.len(), t_glyph.elapsed());
        Ok((!report.is_empty()).then(|| (name.to_string(), report)))
    };

    let results: Vec<Result<Option<(String, GlyphReport)>, CheckError>> = if options.parallel {
        names.par_iter().map(|name| run_one(name)).collect()
    } else {
        let mut results = Vec::with_capacity(names.len());
        for name in &names {
            let result = run_one(name);
            let stop = result.is_err();
            results.push(result);
            if stop {
                break;
            }
        }
        results
    };

    let mut report = IndexMap::new();
    let mut completed = 0;
    for result in results {
        match result {
            Ok(entry) => {
                completed += 1;
                if let Some((name, glyph_report)) = entry {
                    report.insert(name, glyph_report);
                }
            }
            Err(CheckError::Cancelled { .. }) => return Err(CheckError::Cancelled { completed }),
            Err(e) => return Err(e),
        }
    }
    log::debug!(
        "tested {} glyphs, {} flagged ({}ms)",
        completed,
        report.len(),
        t_start.elapsed().as_millis()
    );
    Ok(FontReport(report))
}
