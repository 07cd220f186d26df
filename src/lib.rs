//! outlinecheck: geometric defect detection for glyph outlines.
//!
//! Runs a fixed set of analyzers over the contours, components and
//! metrics of font glyphs and reports points, segments and contours that
//! look like drawing mistakes: stray points, near-miss angles, crossed or
//! uneven handles, missing extrema, duplicated contours and so on.
//!
//! # Example
//!
//! ```no_run
//! use outlinecheck::{test_font, CheckConfig, FontRunOptions, TestSelection};
//! use std::path::Path;
//!
//! let font = outlinecheck::ufo::load(Path::new("MyFont.ufo"))?;
//! let report = test_font(&font, &TestSelection::all(), &CheckConfig::default(), FontRunOptions::default())?;
//! println!("{}", serde_json::to_string_pretty(&report)?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![forbid(unsafe_code)]

mod geom;

pub mod cache;
pub mod checks;
pub mod config;
pub mod contour;
pub mod error;
pub mod extrema;
pub mod font;
pub mod glyph;
pub mod registry;
pub mod report;

#[cfg(feature = "ufo")]
pub mod ufo;

// Re-export kurbo so downstream users get the same geometry types.
pub use kurbo;

pub use cache::ReportCache;
pub use checks::CheckContext;
pub use config::CheckConfig;
pub use contour::{Contour, ContourPoint, ContourView, PointType, Segment, SegmentKind};
pub use error::CheckError;
pub use font::{Font, FontInfo, FontView};
pub use glyph::{Anchor, Component, Glyph, GlyphView};
pub use registry::{Level, TestDef, TestId, TestSelection, TEST_DEFS};
pub use report::{
    test_font, test_glyph, Finding, FontReport, FontRunOptions, GlyphReport, OverlapRemover,
    TestResult,
};
