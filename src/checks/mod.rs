//! The analyzers, grouped by the granularity they inspect.
//!
//! Every analyzer is a pure function of its input geometry and a
//! [`CheckContext`]. Malformed input degrades to an empty result; nothing
//! in here returns an error.

pub mod contour;
pub mod glyph;
pub mod info;
pub mod metrics;
pub mod point;
pub mod segment;

use crate::config::CheckConfig;
use crate::font::FontView;
use crate::report::OverlapRemover;

/// Read-only inputs shared by every analyzer in a run.
#[derive(Clone, Copy)]
pub struct CheckContext<'a> {
    /// The owning font, for cross-glyph lookups and global metrics.
    pub font: &'a dyn FontView,
    pub config: &'a CheckConfig,
    pub overlap_remover: Option<&'a dyn OverlapRemover>,
}

impl<'a> CheckContext<'a> {
    pub fn new(font: &'a dyn FontView, config: &'a CheckConfig) -> Self {
        Self {
            font,
            config,
            overlap_remover: None,
        }
    }

    pub fn with_overlap_remover(mut self, remover: &'a dyn OverlapRemover) -> Self {
        self.overlap_remover = Some(remover);
        self
    }
}
