//! Glyph read model: contours, components, anchors and derived metrics.

use std::sync::atomic::{AtomicU64, Ordering};

use kurbo::{Affine, Point, Rect};
use serde::{Deserialize, Serialize};

use crate::contour::{path_bounds, Contour, ContourView};
use crate::font::FontView;

/// Component references nested deeper than this are ignored, which also
/// stops cyclic references.
pub const MAX_COMPONENT_DEPTH: usize = 32;

/// A reference to another glyph, placed with an affine transform.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub base: String,
    pub transform: Affine,
}

impl Component {
    pub fn new(base: impl Into<String>, transform: Affine) -> Self {
        Self {
            base: base.into(),
            transform,
        }
    }

    /// Horizontal scale factor of the placement.
    pub fn x_scale(&self) -> f64 {
        self.transform.as_coeffs()[0]
    }

    /// Bounds of the transformed base outline, if the base exists and draws
    /// anything.
    pub fn bounds(&self, font: &dyn FontView) -> Option<Rect> {
        let base = font.glyph(&self.base)?;
        outline_bounds(base, font, self.transform, 1)
    }
}

/// A named point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    pub name: Option<String>,
    pub position: Point,
}

/// The read interface glyph-level analyzers are written against.
pub trait GlyphView: Sync {
    fn name(&self) -> &str;
    fn unicodes(&self) -> &[char];
    fn width(&self) -> f64;
    fn contour_count(&self) -> usize;
    fn contour(&self, index: usize) -> Option<&dyn ContourView>;
    fn components(&self) -> &[Component];
    fn anchors(&self) -> &[Anchor];

    /// Identity stamp of this glyph state. It changes on every edit and is
    /// never shared by two glyphs whose contents may differ. Memoization
    /// keys on this.
    fn version(&self) -> u64;

    fn contours(&self) -> Vec<&dyn ContourView> {
        (0..self.contour_count())
            .filter_map(|i| self.contour(i))
            .collect()
    }

    fn unicode(&self) -> Option<char> {
        self.unicodes().first().copied()
    }
}

/// Bounds of a glyph's contours and (decomposed) components.
pub fn glyph_bounds(glyph: &dyn GlyphView, font: &dyn FontView) -> Option<Rect> {
    outline_bounds(glyph, font, Affine::IDENTITY, 0)
}

/// `(left, right)` side-bearings, or `None` for a glyph that draws nothing.
pub fn margins(glyph: &dyn GlyphView, font: &dyn FontView) -> Option<(f64, f64)> {
    let bounds = glyph_bounds(glyph, font)?;
    Some((bounds.x0, glyph.width() - bounds.x1))
}

fn outline_bounds(
    glyph: &dyn GlyphView,
    font: &dyn FontView,
    affine: Affine,
    depth: usize,
) -> Option<Rect> {
    if depth > MAX_COMPONENT_DEPTH {
        log::debug!("component nesting too deep at '{}'", glyph.name());
        return None;
    }
    let mut bounds: Option<Rect> = None;
    let mut add = |rect: Rect| {
        bounds = Some(bounds.map_or(rect, |b| b.union(rect)));
    };
    for contour in glyph.contours() {
        if contour.is_empty() {
            continue;
        }
        let mut path = contour.to_bez_path();
        path.apply_affine(affine);
        if let Some(rect) = path_bounds(&path) {
            add(rect);
        }
    }
    for component in glyph.components() {
        let Some(base) = font.glyph(&component.base) else {
            continue;
        };
        if let Some(rect) = outline_bounds(base, font, affine * component.transform, depth + 1) {
            add(rect);
        }
    }
    bounds
}

/// Source of [`Glyph`] version stamps, shared by every glyph in the process.
static NEXT_VERSION: AtomicU64 = AtomicU64::new(1);

fn next_version() -> u64 {
    NEXT_VERSION.fetch_add(1, Ordering::Relaxed)
}

/// Owned glyph. Creation and every mutator take a fresh version stamp;
/// clones keep it, since their contents are identical.
#[derive(Debug, Clone, Default)]
pub struct Glyph {
    name: String,
    unicodes: Vec<char>,
    width: f64,
    contours: Vec<Contour>,
    components: Vec<Component>,
    anchors: Vec<Anchor>,
    version: u64,
}

impl Glyph {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: next_version(),
            ..Default::default()
        }
    }

    /// Deep copy of any glyph view into the owned model.
    pub fn from_view(view: &dyn GlyphView) -> Self {
        Self {
            name: view.name().to_string(),
            unicodes: view.unicodes().to_vec(),
            width: view.width(),
            contours: view
                .contours()
                .into_iter()
                .map(|c| Contour::new(c.points().to_vec()))
                .collect(),
            components: view.components().to_vec(),
            anchors: view.anchors().to_vec(),
            version: next_version(),
        }
    }

    pub fn set_width(&mut self, width: f64) {
        self.width = width;
        self.touch();
    }

    pub fn set_unicodes(&mut self, unicodes: Vec<char>) {
        self.unicodes = unicodes;
        self.touch();
    }

    pub fn add_contour(&mut self, contour: Contour) {
        self.contours.push(contour);
        self.touch();
    }

    /// Replace all contours at once.
    pub fn set_contours(&mut self, contours: Vec<Contour>) {
        self.contours = contours;
        self.touch();
    }

    pub fn add_component(&mut self, component: Component) {
        self.components.push(component);
        self.touch();
    }

    pub fn add_anchor(&mut self, anchor: Anchor) {
        self.anchors.push(anchor);
        self.touch();
    }

    fn touch(&mut self) {
        self.version = next_version();
    }
}

// Contents only; the version stamp is identity, not data.
impl PartialEq for Glyph {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.unicodes == other.unicodes
            && self.width == other.width
            && self.contours == other.contours
            && self.components == other.components
            && self.anchors == other.anchors
    }
}

impl GlyphView for Glyph {
    fn name(&self) -> &str {
        &self.name
    }

    fn unicodes(&self) -> &[char] {
        &self.unicodes
    }

    fn width(&self) -> f64 {
        self.width
    }

    fn contour_count(&self) -> usize {
        self.contours.len()
    }

    fn contour(&self, index: usize) -> Option<&dyn ContourView> {
        self.contours.get(index).map(|c| c as &dyn ContourView)
    }

    fn components(&self) -> &[Component] {
        &self.components
    }

    fn anchors(&self) -> &[Anchor] {
        &self.anchors
    }

    fn version(&self) -> u64 {
        self.version
    }
}
