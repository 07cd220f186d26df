//! Font read model: glyph lookup, glyph order and global metrics.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::glyph::{Glyph, GlyphView};

/// Vertical metrics and PostScript hinting values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FontInfo {
    pub units_per_em: Option<f64>,
    pub ascender: Option<f64>,
    pub descender: Option<f64>,
    pub x_height: Option<f64>,
    pub cap_height: Option<f64>,
    /// Flat list of (bottom, top) pairs.
    pub blue_values: Vec<f64>,
    /// Flat list of (bottom, top) pairs below the baseline.
    pub other_blues: Vec<f64>,
    pub stem_snap_h: Vec<f64>,
    pub stem_snap_v: Vec<f64>,
}

/// The read interface for cross-glyph lookups.
pub trait FontView: Sync {
    fn glyph(&self, name: &str) -> Option<&dyn GlyphView>;

    /// Glyph names in production order.
    fn glyph_order(&self) -> Vec<&str>;

    fn info(&self) -> &FontInfo;

    fn contains(&self, name: &str) -> bool {
        self.glyph(name).is_some()
    }

    /// Names of every glyph mapped to `ch`.
    fn glyphs_for_unicode(&self, ch: char) -> Vec<&str> {
        self.glyph_order()
            .into_iter()
            .filter(|name| {
                self.glyph(name)
                    .is_some_and(|g| g.unicodes().contains(&ch))
            })
            .collect()
    }
}

/// Owned font: glyphs keyed by name in insertion order.
#[derive(Debug, Clone, Default)]
pub struct Font {
    glyphs: IndexMap<String, Glyph>,
    info: FontInfo,
    cmap: HashMap<char, Vec<String>>,
}

impl Font {
    pub fn new(info: FontInfo) -> Self {
        Self {
            info,
            ..Default::default()
        }
    }

    /// Insert or replace a glyph. Replacing keeps the glyph's position.
    pub fn insert(&mut self, glyph: Glyph) {
        if let Some(old) = self.glyphs.get(glyph.name()) {
            for ch in old.unicodes() {
                if let Some(names) = self.cmap.get_mut(ch) {
                    names.retain(|n| n != glyph.name());
                }
            }
        }
        for ch in glyph.unicodes() {
            self.cmap.entry(*ch).or_default().push(glyph.name().to_string());
        }
        self.glyphs.insert(glyph.name().to_string(), glyph);
    }

    pub fn get(&self, name: &str) -> Option<&Glyph> {
        self.glyphs.get(name)
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Glyph> {
        self.glyphs.values()
    }

    /// Reorder glyphs. Names not in `order` keep their relative position
    /// after the listed ones.
    pub fn apply_glyph_order(&mut self, order: &[String]) {
        let rank: HashMap<&str, usize> = order
            .iter()
            .enumerate()
            .map(|(i, name)| (name.as_str(), i))
            .collect();
        let mut entries: Vec<(String, Glyph)> = std::mem::take(&mut self.glyphs).into_iter().collect();
        entries.sort_by_key(|(name, _)| rank.get(name.as_str()).copied().unwrap_or(usize::MAX));
        self.glyphs = entries.into_iter().collect();
    }
}

impl FontView for Font {
    fn glyph(&self, name: &str) -> Option<&dyn GlyphView> {
        self.glyphs.get(name).map(|g| g as &dyn GlyphView)
    }

    fn glyph_order(&self) -> Vec<&str> {
        self.glyphs.keys().map(String::as_str).collect()
    }

    fn info(&self) -> &FontInfo {
        &self.info
    }

    fn glyphs_for_unicode(&self, ch: char) -> Vec<&str> {
        self.cmap
            .get(&ch)
            .map(|names| names.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn glyph(name: &str, ch: Option<char>) -> Glyph {
        let mut g = Glyph::new(name);
        if let Some(ch) = ch {
            g.set_unicodes(vec![ch]);
        }
        g
    }

    #[test]
    fn replacing_keeps_order_and_cmap() {
        let mut font = Font::default();
        font.insert(glyph("a", Some('a')));
        font.insert(glyph("b", Some('b')));
        font.insert(glyph("a", Some('x')));
        assert_eq!(font.glyph_order(), vec!["a", "b"]);
        assert!(font.glyphs_for_unicode('a').is_empty());
        assert_eq!(font.glyphs_for_unicode('x'), vec!["a"]);
    }

    #[test]
    fn glyph_order_applies_stable_sort() {
        let mut font = Font::default();
        for name in ["c", "a", "b", "z"] {
            font.insert(glyph(name, None));
        }
        font.apply_glyph_order(&["a".to_string(), "b".to_string(), "c".to_string()]);
        assert_eq!(font.glyph_order(), vec!["a", "b", "c", "z"]);
    }
}
