use thiserror::Error;

/// Errors that can occur while running outline checks.
///
/// Analyzers themselves never fail: malformed geometry produces an empty
/// result. These errors cover the caller-facing edges only.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum CheckError {
    #[error("unknown test identifier: {0}")]
    UnknownTest(String),

    #[error("glyph not found: {0}")]
    MissingGlyph(String),

    #[error("cancelled after {completed} glyphs")]
    Cancelled { completed: usize },

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "ufo")]
    #[error("norad error: {0}")]
    Norad(#[from] norad::error::FontLoadError),
}
