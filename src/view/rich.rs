use crate::marker::{Marker, MarkerSpan};

use super::{Affinity, BlockPoint, RenderedBlocks, ViewAdapter, ViewMode};

/// The WYSIWYG surface.
///
/// Text content is the rendered block text of the markdown. The selection is
/// a pair of block points, like a DOM range's start and end containers.
#[derive(Debug, Clone)]
pub struct RichTextView {
    blocks: RenderedBlocks,
    selection: Option<(BlockPoint, BlockPoint)>,
    width: u16,
}

impl RichTextView {
    pub fn from_markdown(markdown: &str, width: u16) -> Self {
        Self {
            blocks: RenderedBlocks::parse(markdown),
            selection: None,
            width,
        }
    }

    /// Re-render from new markdown.
    ///
    /// The selection survives when both of its points still exist.
    pub fn rerender(&mut self, markdown: &str) {
        self.blocks = RenderedBlocks::parse(markdown);
        if let Some((anchor, focus)) = self.selection {
            let valid =
                self.blocks.offset_of(anchor).is_some() && self.blocks.offset_of(focus).is_some();
            if !valid {
                self.selection = None;
            }
        }
    }

    pub const fn blocks(&self) -> &RenderedBlocks {
        &self.blocks
    }

    /// Select between two block points, as a user would with the mouse.
    ///
    /// Points outside the rendered blocks clear the selection.
    pub fn set_selection(&mut self, anchor: BlockPoint, focus: BlockPoint) {
        let valid =
            self.blocks.offset_of(anchor).is_some() && self.blocks.offset_of(focus).is_some();
        self.selection = valid.then_some((anchor, focus));
    }

    pub const fn selection(&self) -> Option<(BlockPoint, BlockPoint)> {
        self.selection
    }

    pub const fn set_width(&mut self, width: u16) {
        self.width = width;
    }
}

impl ViewAdapter for RichTextView {
    fn mode(&self) -> ViewMode {
        ViewMode::RichText
    }

    fn text_content(&self) -> String {
        self.blocks.text()
    }

    fn update_marker_with_extra_info(&self, marker: &mut Marker) {
        marker.highlight = Some(self.blocks.highlight(marker.start, marker.end, self.width));
    }

    fn marker_info_of_current_selection(&self) -> Option<MarkerSpan> {
        let (anchor, focus) = self.selection?;
        let a = self.blocks.offset_of(anchor)?;
        let b = self.blocks.offset_of(focus)?;
        Some(MarkerSpan::new(a.min(b), a.max(b)))
    }

    fn select_offset_range(&mut self, start: usize, end: usize) {
        if start > end || end > self.blocks.len() {
            return;
        }
        let anchor = self.blocks.point_at(start, Affinity::Forward);
        let focus = if start == end {
            anchor
        } else {
            self.blocks.point_at(end, Affinity::Backward)
        };
        self.selection = Some((anchor, focus));
    }

    fn clear_select(&mut self) {
        self.selection = None;
    }
}
