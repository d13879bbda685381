//! Error types for cover rendering

use thiserror::Error;

/// Problems with the caller's input, reported before anything is drawn.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("text cannot be empty")]
    EmptyText,

    #[error("unsupported canvas size '{0}' (expected 1:1 or 4:5)")]
    UnsupportedSize(String),

    #[error("text too long ({len} characters, max {max})")]
    TextTooLong { len: usize, max: usize },

    #[error("too many lines ({lines}, max {max})")]
    TooManyLines { lines: usize, max: usize },

    #[error("line {line} too long ({len} characters, max {max})")]
    LineTooLong { line: usize, len: usize, max: usize },

    /// Even the minimum font size leaves the text outside the margins.
    #[error("text does not fit the canvas at {font_size}px")]
    DoesNotFit { font_size: f32 },
}

#[derive(Error, Debug)]
pub enum CoverError {
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// The drawing surface could not be obtained; nothing was drawn.
    #[error("rendering failed: {0}")]
    Render(String),

    /// Rasterising or encoding failed. The drawing is intact and export can
    /// be retried.
    #[error("export failed: {0}")]
    Export(String),
}

impl CoverError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoverError::Export(_))
    }
}
