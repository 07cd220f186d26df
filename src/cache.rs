//! Memoized glyph reports.
//!
//! Entries are keyed by the glyph's version stamp and the selection they
//! were computed for. Stamps are unique per glyph state, so two glyphs that
//! share a name never share an entry, and an edited glyph simply stops
//! hitting its old one.
//! Cross-glyph tests (unicodeValue, the metrics tests) also depend on other
//! glyphs; call [`ReportCache::clear`] when those change.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::checks::CheckContext;
use crate::glyph::GlyphView;
use crate::registry::TestSelection;
use crate::report::{test_glyph, GlyphReport};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    name: String,
    version: u64,
    selection: Vec<u8>,
}

impl CacheKey {
    fn new(glyph: &dyn GlyphView, selection: &TestSelection) -> Self {
        Self {
            name: glyph.name().to_string(),
            version: glyph.version(),
            selection: selection.defs().map(|def| def.id as u8).collect(),
        }
    }
}

/// Thread-safe report memo.
#[derive(Debug, Default)]
pub struct ReportCache {
    reports: RwLock<HashMap<CacheKey, Arc<GlyphReport>>>,
}

impl ReportCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached report for this glyph state, computing it on a miss.
    pub fn get_or_test(
        &self,
        glyph: &dyn GlyphView,
        selection: &TestSelection,
        cx: &CheckContext,
    ) -> Arc<GlyphReport> {
        let key = CacheKey::new(glyph, selection);
        if let Some(hit) = self
            .reports
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return hit.clone();
        }
        let report = Arc::new(test_glyph(glyph, selection, cx));
        let mut reports = self.reports.write().unwrap_or_else(PoisonError::into_inner);
        // Older states of a glyph with this name are most likely dead.
        reports.retain(|k, _| k.name != key.name || k.version == key.version);
        reports.insert(key, report.clone());
        report
    }

    pub fn len(&self) -> usize {
        self.reports.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.reports.write().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CheckConfig;
    use crate::contour::Contour;
    use crate::font::Font;
    use crate::glyph::Glyph;
    use crate::registry::TestId;

    #[test]
    fn hit_until_glyph_changes() {
        let font = Font::default();
        let config = CheckConfig::default();
        let cx = CheckContext::new(&font, &config);
        let selection = TestSelection::all();
        let cache = ReportCache::new();

        let mut glyph = Glyph::new("a");
        glyph.add_contour(Contour::polygon(&[(10.0, 10.0)]));
        let first = cache.get_or_test(&glyph, &selection, &cx);
        let second = cache.get_or_test(&glyph, &selection, &cx);
        assert!(Arc::ptr_eq(&first, &second));
        assert!(first.get(TestId::StrayPoints).is_some());

        glyph.set_contours(vec![Contour::polygon(&[(0.0, 0.0), (100.0, 0.0), (100.0, 100.0)])]);
        let third = cache.get_or_test(&glyph, &selection, &cx);
        assert!(third.get(TestId::StrayPoints).is_none());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn same_name_different_glyph() {
        let font = Font::default();
        let config = CheckConfig::default();
        let cx = CheckContext::new(&font, &config);
        let selection: TestSelection = "strayPoints".parse().unwrap();
        let cache = ReportCache::new();

        let mut stray = Glyph::new("a");
        stray.add_contour(Contour::polygon(&[(10.0, 10.0)]));
        let mut square = Glyph::new("a");
        square.add_contour(Contour::polygon(&[(0.0, 0.0), (100.0, 0.0), (100.0, 100.0), (0.0, 100.0)]));

        assert!(cache.get_or_test(&stray, &selection, &cx).get(TestId::StrayPoints).is_some());
        assert!(cache.get_or_test(&square, &selection, &cx).get(TestId::StrayPoints).is_none());
        let copy = Glyph::from_view(&square);
        assert!(cache.get_or_test(&copy, &selection, &cx).get(TestId::StrayPoints).is_none());
    }

    #[test]
    fn selection_is_part_of_the_key() {
        let font = Font::default();
        let config = CheckConfig::default();
        let cx = CheckContext::new(&font, &config);
        let cache = ReportCache::new();
        let glyph = Glyph::new("a");
        cache.get_or_test(&glyph, &TestSelection::all(), &cx);
        cache.get_or_test(&glyph, &"strayPoints".parse().unwrap(), &cx);
        assert_eq!(cache.len(), 2);
        cache.clear();
        assert!(cache.is_empty());
    }
}
