//! Errors reported synchronously by the marker API.

use thiserror::Error;

/// Structural errors in marker input.
///
/// Unknown ids are not errors; lookups return `None` or `false` instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarkerError {
    /// A marker span with `start > end` or a negative offset.
    #[error("invalid marker range {start}..{end}")]
    InvalidRange { start: i64, end: i64 },
}

/// Result alias for marker operations.
pub type Result<T> = std::result::Result<T, MarkerError>;
