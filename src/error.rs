//! Error types for sector construction and level data loading

use thiserror::Error;

/// Result type alias for template loading
pub type Result<T> = std::result::Result<T, TemplateError>;

/// Invariant violations raised while building sectors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SectorError {
    /// Sector angles are quadrant indices and must be 0, 1, 2 or 3
    #[error("sector angle must be 0, 1, 2 or 3, got {0}")]
    InvalidAngle(u8),
}

/// Errors that can occur when parsing level template data
#[derive(Debug, Error)]
pub enum TemplateError {
    /// The payload is not valid JSON for a list of grids
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A template has no columns or no rows
    #[error("template {index} is empty")]
    Empty { index: usize },

    /// Columns of a template differ in length
    #[error("template {index} is not rectangular: column {column} has {len} rows, expected {expected}")]
    NotRectangular {
        index: usize,
        column: usize,
        len: usize,
        expected: usize,
    },

    /// A cell code outside 0..=3 (or NaN)
    #[error("template {index} has invalid cell code {value} at ({x}, {y})")]
    InvalidCode {
        index: usize,
        x: usize,
        y: usize,
        value: f32,
    },
}
