use std::ops::Range;

use ropey::Rope;

use crate::marker::{Marker, MarkerSpan};

use super::{Affinity, Highlight, NativePoint, ViewAdapter, ViewMode, layout};

/// The markdown source surface.
///
/// Backed by a rope; native positions are rope character indices (for the
/// selection) and line/column points (for highlights). Abstract offsets skip
/// line terminators, so column `c` of line `l` sits at the summed content
/// length of lines `0..l` plus `c`.
#[derive(Debug, Clone)]
pub struct SourceView {
    rope: Rope,
    /// Selection as rope character indices.
    selection: Option<Range<usize>>,
    width: u16,
    lines: LineIndex,
}

/// Per-line prefix sums, rebuilt whenever the text or the width changes.
#[derive(Debug, Clone, Default)]
struct LineIndex {
    /// Normalized offset where each line starts, plus the total length.
    offsets: Vec<usize>,
    /// First wrapped row of each line.
    rows: Vec<usize>,
}

impl LineIndex {
    fn build(rope: &Rope, width: u16) -> Self {
        let mut offsets = Vec::with_capacity(rope.len_lines() + 1);
        let mut rows = Vec::with_capacity(rope.len_lines());
        let (mut offset, mut row) = (0, 0);
        for line in rope.lines() {
            let content: String = line.chars().filter(|c| *c != '\n' && *c != '\r').collect();
            offsets.push(offset);
            rows.push(row);
            offset += content.chars().count();
            row += layout::row_count(&content, width);
        }
        offsets.push(offset);
        Self { offsets, rows }
    }

    fn total(&self) -> usize {
        self.offsets.last().copied().unwrap_or(0)
    }
}

impl SourceView {
    /// Create a source view over `text` laid out at `width` columns.
    pub fn from_text(text: &str, width: u16) -> Self {
        let rope = Rope::from_str(text);
        let lines = LineIndex::build(&rope, width);
        Self {
            rope,
            selection: None,
            width,
            lines,
        }
    }

    /// The raw source, line endings untouched.
    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Replace the whole source. The selection is dropped.
    pub fn set_text(&mut self, text: &str) {
        self.rope = Rope::from_str(text);
        self.selection = None;
        self.reindex();
    }

    /// Total characters in the raw source.
    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    /// Replace the raw character range `range` with `text`.
    ///
    /// The range is clamped to the source. A selection touching the edit
    /// collapses to the end of the inserted text.
    pub fn replace(&mut self, range: Range<usize>, text: &str) {
        let len = self.rope.len_chars();
        let end = range.end.min(len);
        let start = range.start.min(end);
        self.rope.remove(start..end);
        self.rope.insert(start, text);
        self.reindex();

        let inserted = text.chars().count();
        if let Some(sel) = self.selection.clone() {
            let shift = |idx: usize| {
                if idx <= start {
                    idx
                } else if idx >= end {
                    idx - (end - start) + inserted
                } else {
                    start + inserted
                }
            };
            self.selection = Some(shift(sel.start)..shift(sel.end));
        }
    }

    /// Total number of lines.
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Length of a line in characters, without its terminator.
    pub fn line_len(&self, line_idx: usize) -> usize {
        if line_idx >= self.rope.len_lines() {
            return 0;
        }
        let line = self.rope.line(line_idx);
        let mut len = line.len_chars();
        if len > 0 && line.char(len - 1) == '\n' {
            len -= 1;
        }
        if len > 0 && line.char(len - 1) == '\r' {
            len -= 1;
        }
        len
    }

    /// Content of a line without its terminator.
    pub fn line_at(&self, line_idx: usize) -> Option<String> {
        if line_idx >= self.rope.len_lines() {
            return None;
        }
        let len = self.line_len(line_idx);
        Some(self.rope.line(line_idx).chars().take(len).collect())
    }

    /// Select a raw character range, as a user would with the mouse.
    pub fn set_selection(&mut self, range: Option<Range<usize>>) {
        let len = self.rope.len_chars();
        self.selection = range.map(|r| r.start.min(len)..r.end.min(len));
    }

    pub fn selection(&self) -> Option<Range<usize>> {
        self.selection.clone()
    }

    pub fn set_width(&mut self, width: u16) {
        if self.width != width {
            self.width = width;
            self.reindex();
        }
    }

    fn reindex(&mut self) {
        self.lines = LineIndex::build(&self.rope, self.width);
    }

    /// Length of the normalized text.
    fn content_len(&self) -> usize {
        self.lines.total()
    }

    /// Line/column point of a normalized offset, clamped to the content.
    ///
    /// An offset on the boundary of two lines belongs to the earlier line
    /// with [`Affinity::Backward`] and to the next non-empty one otherwise.
    fn point_at(&self, offset: usize, affinity: Affinity) -> (usize, usize) {
        let last = self.line_count().saturating_sub(1);
        let ends = self.lines.offsets.get(1..).unwrap_or_default();
        let line = match affinity {
            Affinity::Forward => ends.partition_point(|&end| end <= offset),
            Affinity::Backward => ends.partition_point(|&end| end < offset),
        }
        .min(last);
        let column = offset
            .saturating_sub(self.lines.offsets[line])
            .min(self.line_len(line));
        (line, column)
    }

    /// Normalized offset of a raw rope character index.
    fn offset_of_char(&self, char_idx: usize) -> usize {
        let char_idx = char_idx.min(self.rope.len_chars());
        let line = self.rope.char_to_line(char_idx);
        let col = (char_idx - self.rope.line_to_char(line)).min(self.line_len(line));
        self.lines.offsets[line] + col
    }

    fn char_of_point(&self, (line, column): (usize, usize)) -> usize {
        self.rope.line_to_char(line) + column
    }

    fn cell(&self, (line, column): (usize, usize)) -> (usize, usize) {
        let text = self.line_at(line).unwrap_or_default();
        let (row, col) = layout::locate(&text, column, self.width);
        (self.lines.rows[line] + row, col)
    }

    fn span_points(&self, start: usize, end: usize) -> ((usize, usize), (usize, usize)) {
        if start == end {
            let point = self.point_at(start, Affinity::Forward);
            (point, point)
        } else {
            (
                self.point_at(start, Affinity::Forward),
                self.point_at(end, Affinity::Backward),
            )
        }
    }
}

impl ViewAdapter for SourceView {
    fn mode(&self) -> ViewMode {
        ViewMode::Source
    }

    fn text_content(&self) -> String {
        super::normalize_line_endings(&self.rope.to_string())
    }

    fn update_marker_with_extra_info(&self, marker: &mut Marker) {
        let end = marker.end.min(self.content_len());
        let start = marker.start.min(end);
        let (start_point, end_point) = self.span_points(start, end);
        let (top, left) = self.cell(start_point);
        let (bottom, _) = self.cell(end_point);
        marker.highlight = Some(Highlight {
            start: NativePoint::Line {
                line: start_point.0,
                column: start_point.1,
            },
            end: NativePoint::Line {
                line: end_point.0,
                column: end_point.1,
            },
            top,
            left,
            height: bottom - top + 1,
        });
    }

    fn marker_info_of_current_selection(&self) -> Option<MarkerSpan> {
        let sel = self.selection.as_ref()?;
        let a = self.offset_of_char(sel.start);
        let b = self.offset_of_char(sel.end);
        Some(MarkerSpan::new(a.min(b), a.max(b)))
    }

    fn select_offset_range(&mut self, start: usize, end: usize) {
        if start > end || end > self.content_len() {
            return;
        }
        let (start_point, end_point) = self.span_points(start, end);
        self.selection = Some(self.char_of_point(start_point)..self.char_of_point(end_point));
    }

    fn clear_select(&mut self) {
        self.selection = None;
    }
}
