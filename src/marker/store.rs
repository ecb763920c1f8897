use std::collections::HashSet;

use crate::error::{MarkerError, Result};

use super::{Marker, MarkerData, MarkerId, MarkerSeed};

/// Field used to order the store's marker sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Start,
    End,
}

/// The authoritative marker set of one document.
///
/// Besides the markers the store keeps the baseline text that the next
/// reconciliation diffs against, and the ids the caller supplied since that
/// baseline was taken.
#[derive(Debug, Clone, Default)]
pub struct MarkerStore {
    markers: Vec<Marker>,
    baseline: Option<String>,
    supplied: HashSet<MarkerId>,
    next_id: u64,
}

impl MarkerStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a marker, or move an existing one when `id` is already taken.
    ///
    /// Without an id, a fresh one is generated from the store's own counter.
    ///
    /// # Errors
    /// Returns [`MarkerError::InvalidRange`] if `start > end`.
    pub fn add_marker(&mut self, start: usize, end: usize, id: Option<MarkerId>) -> Result<Marker> {
        if start > end {
            return Err(MarkerError::InvalidRange {
                start: i64::try_from(start).unwrap_or(i64::MAX),
                end: i64::try_from(end).unwrap_or(i64::MAX),
            });
        }
        let id = id.unwrap_or_else(|| self.generate_id());
        self.supplied.insert(id.clone());

        if let Some(existing) = self.markers.iter_mut().find(|m| m.id == id) {
            existing.start = start;
            existing.end = end;
            existing.highlight = None;
            return Ok(existing.clone());
        }

        let marker = Marker::new(id, start, end);
        self.markers.push(marker.clone());
        Ok(marker)
    }

    /// Insert a marker from caller-supplied seed data.
    ///
    /// # Errors
    /// Returns [`MarkerError::InvalidRange`] for negative or reversed offsets.
    pub fn add_seed(&mut self, seed: &MarkerSeed) -> Result<Marker> {
        let (start, end) = seed.span()?;
        self.add_marker(start, end, seed.id.clone())
    }

    /// Remove a marker. Returns `false` if the id is unknown.
    pub fn remove_marker(&mut self, id: &MarkerId) -> bool {
        let before = self.markers.len();
        self.markers.retain(|m| &m.id != id);
        self.supplied.remove(id);
        self.markers.len() != before
    }

    pub fn get_marker(&self, id: &MarkerId) -> Option<&Marker> {
        self.markers.iter().find(|m| &m.id == id)
    }

    /// All markers in the order of the last explicit sort.
    pub fn get_all(&self) -> &[Marker] {
        &self.markers
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Stable sort of the marker sequence.
    pub fn sort_with(&mut self, field: SortField) {
        match field {
            SortField::Start => self.markers.sort_by_key(|m| m.start),
            SortField::End => self.markers.sort_by_key(|m| m.end),
        }
    }

    /// Drop every marker together with the baseline text.
    pub fn reset_markers(&mut self) {
        self.markers.clear();
        self.baseline = None;
        self.supplied.clear();
    }

    /// Owned `{id, start, end}` snapshot of every marker.
    pub fn markers_data(&self) -> Vec<MarkerData> {
        self.markers.iter().map(Marker::data).collect()
    }

    /// The text the next reconciliation diffs against.
    pub fn baseline(&self) -> Option<&str> {
        self.baseline.as_deref()
    }

    /// True if the caller added `id` since the baseline was last taken.
    pub fn is_supplied(&self, id: &MarkerId) -> bool {
        self.supplied.contains(id)
    }

    pub(crate) fn set_baseline(&mut self, text: String) {
        self.baseline = Some(text);
        self.supplied.clear();
    }

    /// Clamp every marker into a text of `len` characters.
    pub(crate) fn clamp_to(&mut self, len: usize) {
        for marker in &mut self.markers {
            marker.end = marker.end.min(len);
            marker.start = marker.start.min(marker.end);
        }
    }

    pub(crate) fn markers_mut(&mut self) -> &mut Vec<Marker> {
        &mut self.markers
    }

    fn generate_id(&mut self) -> MarkerId {
        loop {
            self.next_id += 1;
            let candidate = MarkerId::new(format!("marker-{}", self.next_id));
            if self.get_marker(&candidate).is_none() {
                return candidate;
            }
        }
    }
}
