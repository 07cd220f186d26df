//! Side-bearing checks for ligatures, composites and near-symmetric glyphs.

use icu_properties::props::GeneralCategory;
use icu_properties::CodePointMapData;
use kurbo::Rect;
use serde::Serialize;

use crate::checks::CheckContext;
use crate::font::FontView;
use crate::glyph::{glyph_bounds, margins, Component, GlyphView};

/// Side-bearing mismatches against the glyphs a glyph is built from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SideBearingReport {
    pub left_message: Option<String>,
    pub right_message: Option<String>,
    pub left: Option<f64>,
    pub right: Option<f64>,
    pub width: f64,
    pub bounds: Option<Rect>,
}

impl SideBearingReport {
    fn new(glyph: &dyn GlyphView, font: &dyn FontView) -> Self {
        Self {
            left_message: None,
            right_message: None,
            left: None,
            right: None,
            width: glyph.width(),
            bounds: glyph_bounds(glyph, font),
        }
    }

    fn has_problem(&self) -> bool {
        self.left_message.is_some() || self.right_message.is_some()
    }
}

/// Side-bearings that are nearly, but not exactly, equal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymmetryReport {
    pub left: f64,
    pub right: f64,
    pub width: f64,
    pub message: String,
}

// ── Ligatures ───────────────────────────────────────────────

/// Compare a ligature's side-bearings with its presumed parts.
///
/// `f_i.alt` is split into `f` and `i`, preferring `f.alt` and `i.alt`
/// when those exist.
pub fn ligature_metrics(glyph: &dyn GlyphView, cx: &CheckContext) -> Option<SideBearingReport> {
    let font = cx.font;
    let name = glyph.name();
    if !name.contains('_') {
        return None;
    }
    let (base, suffix) = match name.split_once('.') {
        Some((base, suffix)) => (base, Some(suffix)),
        None => (name, None),
    };
    let parts: Vec<&str> = base.split('_').collect();
    let with_suffix = |part: &str| -> String {
        if let Some(suffix) = suffix {
            let candidate = format!("{part}.{suffix}");
            if font.contains(&candidate) {
                return candidate;
            }
        }
        part.to_string()
    };
    let left_part = with_suffix(parts.first()?);
    let right_part = with_suffix(parts.last()?);

    let (left, right) = margins(glyph, font)?;
    let mut report = SideBearingReport::new(glyph, font);
    report.left = Some(left);
    report.right = Some(right);

    match font.glyph(&left_part) {
        None => report.left_message = Some("Couldn't find the ligature's left component.".into()),
        Some(part) => {
            if margins(part, font).map(|(l, _)| l) != Some(left) {
                report.left_message = Some(format!("Left doesn't match the presumed part {left_part} left"));
            }
        }
    }
    match font.glyph(&right_part) {
        None => report.right_message = Some("Couldn't find the ligature's right component.".into()),
        Some(part) => {
            if margins(part, font).map(|(_, r)| r) != Some(right) {
                report.right_message = Some(format!("Right doesn't match the presumed part {right_part} right"));
            }
        }
    }
    report.has_problem().then_some(report)
}

// ── Components ──────────────────────────────────────────────

/// Whether a base glyph is a mark, spacing modifier or modifier letter.
fn is_mark_glyph(name: &str, font: &dyn FontView) -> bool {
    let Some(ch) = glyph_char(name, font) else {
        return false;
    };
    matches!(
        CodePointMapData::<GeneralCategory>::new().get(ch),
        GeneralCategory::NonspacingMark
            | GeneralCategory::SpacingMark
            | GeneralCategory::EnclosingMark
            | GeneralCategory::ModifierSymbol
            | GeneralCategory::ModifierLetter
    )
}

/// The glyph's own codepoint, or one implied by its name.
fn glyph_char(name: &str, font: &dyn FontView) -> Option<char> {
    if let Some(ch) = font.glyph(name).and_then(|g| g.unicode()) {
        return Some(ch);
    }
    let stem = name.split('.').next().unwrap_or(name);
    if stem != name {
        if let Some(ch) = font.glyph(stem).and_then(|g| g.unicode()) {
            return Some(ch);
        }
    }
    let hex = stem
        .strip_prefix("uni")
        .filter(|h| h.len() == 4)
        .or_else(|| stem.strip_prefix('u').filter(|h| (4..=6).contains(&h.len())))?;
    u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
}

/// Compare the outermost components' side-bearings with their base glyphs.
pub fn component_metrics(glyph: &dyn GlyphView, cx: &CheckContext) -> Option<SideBearingReport> {
    let font = cx.font;
    let mut placed: Vec<(&Component, Rect)> = Vec::new();
    for component in glyph.components() {
        if !font.contains(&component.base) {
            continue;
        }
        // A component drawing nothing makes the comparison meaningless.
        placed.push((component, component.bounds(font)?));
    }
    if placed.is_empty() {
        return None;
    }
    if placed.len() > 1 {
        let non_marks: Vec<(&Component, Rect)> = placed
            .iter()
            .filter(|(c, _)| !is_mark_glyph(&c.base, font))
            .copied()
            .collect();
        if !non_marks.is_empty() {
            placed = non_marks;
        }
    }

    let (left_component, left_bounds) = *placed
        .iter()
        .min_by(|a, b| a.1.x0.total_cmp(&b.1.x0).then_with(|| a.0.base.cmp(&b.0.base)))?;
    let (right_component, right_bounds) = *placed
        .iter()
        .max_by(|a, b| a.1.x1.total_cmp(&b.1.x1).then_with(|| a.0.base.cmp(&b.0.base)))?;

    let expected_left = base_margins(left_component, font)?.0;
    let expected_right = base_margins(right_component, font)?.1;
    let left = left_bounds.x0;
    let right = glyph.width() - right_bounds.x1;

    let mut report = SideBearingReport::new(glyph, font);
    if left != expected_left {
        let base = &left_component.base;
        report.left_message = Some(format!("{base} component left does not match {base} left"));
        report.left = Some(left);
    }
    if right != expected_right {
        let base = &right_component.base;
        report.right_message = Some(format!("{base} component right does not match {base} right"));
        report.right = Some(right);
    }
    report.has_problem().then_some(report)
}

/// Base glyph margins scaled by the component's horizontal scale.
fn base_margins(component: &Component, font: &dyn FontView) -> Option<(f64, f64)> {
    let base = font.glyph(&component.base)?;
    let (left, right) = margins(base, font)?;
    let scale = component.x_scale();
    Some((left * scale, right * scale))
}

// ── Symmetry ────────────────────────────────────────────────

pub fn metrics_symmetry(glyph: &dyn GlyphView, cx: &CheckContext) -> Option<SymmetryReport> {
    let (left, right) = margins(glyph, cx.font)?;
    // Halves go to the even neighbour, so a 0.5 difference is no difference.
    let diff = (left - right).abs().round_ties_even();
    if diff <= 0.0 || diff > cx.config.symmetry_max_difference {
        return None;
    }
    let message = if diff == 1.0 {
        "The side-bearings are 1 unit from being equal.".to_string()
    } else {
        format!("The side-bearings are {diff} units from being equal.")
    };
    Some(SymmetryReport {
        left,
        right,
        width: glyph.width(),
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CheckConfig;
    use crate::contour::Contour;
    use crate::font::Font;
    use crate::glyph::Glyph;
    use kurbo::Affine;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn glyph(name: &str, x0: f64, x1: f64, width: f64) -> Glyph {
        let mut g = Glyph::new(name);
        g.set_width(width);
        g.add_contour(Contour::polygon(&[(x0, 0.0), (x1, 0.0), (x1, 100.0), (x0, 100.0)]));
        g
    }

    fn with_unicode(mut g: Glyph, ch: char) -> Glyph {
        g.set_unicodes(vec![ch]);
        g
    }

    #[test]
    fn ligature_matches_parts() {
        let mut font = Font::default();
        font.insert(glyph("f", 20.0, 80.0, 100.0));
        font.insert(glyph("i", 30.0, 60.0, 100.0));
        font.insert(glyph("f_i", 20.0, 160.0, 200.0));
        let config = CheckConfig::default();
        let cx = CheckContext::new(&font, &config);
        let lig = font.glyph("f_i").unwrap();
        // Left 20 matches f; right 40 matches i.
        assert_eq!(ligature_metrics(lig, &cx), None);
    }

    #[test]
    fn ligature_mismatch_and_missing_part() {
        let mut font = Font::default();
        font.insert(glyph("f", 25.0, 80.0, 100.0));
        font.insert(glyph("f_j", 20.0, 160.0, 200.0));
        let config = CheckConfig::default();
        let cx = CheckContext::new(&font, &config);
        let report = ligature_metrics(font.glyph("f_j").unwrap(), &cx).unwrap();
        assert_eq!(report.left_message.as_deref(), Some("Left doesn't match the presumed part f left"));
        assert_eq!(
            report.right_message.as_deref(),
            Some("Couldn't find the ligature's right component.")
        );
        assert_eq!(report.left, Some(20.0));
        assert_eq!(report.right, Some(40.0));
    }

    #[test]
    fn ligature_prefers_suffixed_part() {
        let mut font = Font::default();
        font.insert(glyph("f", 25.0, 80.0, 100.0));
        font.insert(glyph("f.sc", 20.0, 80.0, 100.0));
        font.insert(glyph("i", 30.0, 60.0, 100.0));
        font.insert(glyph("f_i.sc", 20.0, 160.0, 200.0));
        let config = CheckConfig::default();
        let cx = CheckContext::new(&font, &config);
        assert_eq!(ligature_metrics(font.glyph("f_i.sc").unwrap(), &cx), None);
    }

    #[test]
    fn component_margins_ignore_marks() {
        let mut font = Font::default();
        font.insert(with_unicode(glyph("a", 30.0, 470.0, 500.0), 'a'));
        font.insert(with_unicode(glyph("acutecomb", -100.0, 50.0, 0.0), '\u{301}'));
        let mut composite = Glyph::new("aacute");
        composite.set_width(500.0);
        composite.add_component(Component::new("a", Affine::IDENTITY));
        composite.add_component(Component::new("acutecomb", Affine::translate((250.0, 0.0))));
        font.insert(composite);
        let config = CheckConfig::default();
        let cx = CheckContext::new(&font, &config);
        assert_eq!(component_metrics(font.glyph("aacute").unwrap(), &cx), None);
    }

    #[test]
    fn component_margin_mismatch() {
        let mut font = Font::default();
        font.insert(glyph("a", 30.0, 470.0, 500.0));
        let mut composite = Glyph::new("a.alt");
        composite.set_width(520.0);
        composite.add_component(Component::new("a", Affine::IDENTITY));
        font.insert(composite);
        let config = CheckConfig::default();
        let cx = CheckContext::new(&font, &config);
        let report = component_metrics(font.glyph("a.alt").unwrap(), &cx).unwrap();
        assert_eq!(report.left_message, None);
        assert_eq!(
            report.right_message.as_deref(),
            Some("a component right does not match a right")
        );
        assert_eq!(report.right, Some(50.0));
    }

    #[test]
    fn missing_base_is_skipped() {
        let font = Font::default();
        let mut composite = Glyph::new("x");
        composite.add_component(Component::new("nope", Affine::IDENTITY));
        let config = CheckConfig::default();
        let cx = CheckContext::new(&font, &config);
        assert_eq!(component_metrics(&composite, &cx), None);
    }

    #[rstest]
    #[case(50.0, 449.0, Some("The side-bearings are 1 unit from being equal."))]
    #[case(50.0, 447.0, Some("The side-bearings are 3 units from being equal."))]
    #[case(50.0, 450.0, None)]
    #[case(50.0, 440.0, None)]
    #[case(50.0, 449.5, None)]
    #[case(50.0, 447.5, Some("The side-bearings are 2 units from being equal."))]
    fn symmetry(#[case] x0: f64, #[case] x1: f64, #[case] message: Option<&str>) {
        let font = Font::default();
        let g = glyph("o", x0, x1, 500.0);
        let config = CheckConfig::default();
        let cx = CheckContext::new(&font, &config);
        let report = metrics_symmetry(&g, &cx);
        assert_eq!(report.map(|r| r.message), message.map(str::to_string));
    }
}
