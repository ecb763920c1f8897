//! Marker data model and the marker store.
//!
//! A marker is a named span of the plain text of the document. Offsets count
//! Unicode scalar values of the line-ending-normalized text (see
//! [`crate::view::normalize_line_endings`]), so the same marker can be
//! resolved in every view.

mod store;

pub use store::{MarkerStore, SortField};

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{MarkerError, Result};
use crate::view::Highlight;

/// Opaque marker identifier.
///
/// Ids are compared as strings. Numeric ids coming from JSON are accepted and
/// stored in their decimal form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "RawMarkerId", into = "String")]
pub struct MarkerId(String);

impl MarkerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MarkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MarkerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for MarkerId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<u64> for MarkerId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<MarkerId> for String {
    fn from(id: MarkerId) -> Self {
        id.0
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawMarkerId {
    Text(String),
    Unsigned(u64),
    Signed(i64),
}

impl From<RawMarkerId> for MarkerId {
    fn from(raw: RawMarkerId) -> Self {
        match raw {
            RawMarkerId::Text(s) => Self(s),
            RawMarkerId::Unsigned(n) => Self(n.to_string()),
            RawMarkerId::Signed(n) => Self(n.to_string()),
        }
    }
}

/// A marker as held by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Marker {
    pub id: MarkerId,
    pub start: usize,
    pub end: usize,
    /// Native range and geometry in the view that last resolved this marker.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlight: Option<Highlight>,
}

impl Marker {
    pub const fn new(id: MarkerId, start: usize, end: usize) -> Self {
        Self {
            id,
            start,
            end,
            highlight: None,
        }
    }

    /// Length of the span in characters.
    pub const fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// True for point markers.
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn data(&self) -> MarkerData {
        MarkerData {
            id: self.id.clone(),
            start: self.start,
            end: self.end,
        }
    }
}

/// Plain `{id, start, end}` snapshot of a marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerData {
    pub id: MarkerId,
    pub start: usize,
    pub end: usize,
}

/// Marker input as supplied by callers of a bulk load.
///
/// The id is optional and offsets are signed so that bad input can be
/// rejected instead of failing to deserialize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerSeed {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<MarkerId>,
    pub start: i64,
    pub end: i64,
}

impl MarkerSeed {
    pub fn new(start: i64, end: i64, id: Option<MarkerId>) -> Self {
        Self { id, start, end }
    }

    /// Validated `(start, end)` offsets.
    ///
    /// # Errors
    /// Returns [`MarkerError::InvalidRange`] for negative offsets or `start > end`.
    pub fn span(&self) -> Result<(usize, usize)> {
        let invalid = MarkerError::InvalidRange {
            start: self.start,
            end: self.end,
        };
        if self.start > self.end {
            return Err(invalid);
        }
        let start = usize::try_from(self.start).map_err(|_| invalid.clone())?;
        let end = usize::try_from(self.end).map_err(|_| invalid)?;
        Ok((start, end))
    }
}

impl From<MarkerData> for MarkerSeed {
    fn from(data: MarkerData) -> Self {
        Self {
            id: Some(data.id),
            start: i64::try_from(data.start).unwrap_or(i64::MAX),
            end: i64::try_from(data.end).unwrap_or(i64::MAX),
        }
    }
}

/// An abstract offset span read back from a view selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MarkerSpan {
    pub start: usize,
    pub end: usize,
}

impl MarkerSpan {
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}
