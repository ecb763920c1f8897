use crate::marker::{Marker, MarkerSpan};

use super::{RenderedBlocks, ViewAdapter, ViewMode};

/// The read-only preview surface.
///
/// Markers can be shown here but not authored or selected.
#[derive(Debug, Clone)]
pub struct RenderView {
    blocks: RenderedBlocks,
    width: u16,
}

impl RenderView {
    pub fn from_markdown(markdown: &str, width: u16) -> Self {
        Self {
            blocks: RenderedBlocks::parse(markdown),
            width,
        }
    }

    pub fn rerender(&mut self, markdown: &str) {
        self.blocks = RenderedBlocks::parse(markdown);
    }

    pub const fn blocks(&self) -> &RenderedBlocks {
        &self.blocks
    }

    pub const fn set_width(&mut self, width: u16) {
        self.width = width;
    }
}

impl ViewAdapter for RenderView {
    fn mode(&self) -> ViewMode {
        ViewMode::RenderOnly
    }

    fn text_content(&self) -> String {
        self.blocks.text()
    }

    fn update_marker_with_extra_info(&self, marker: &mut Marker) {
        marker.highlight = Some(self.blocks.highlight(marker.start, marker.end, self.width));
    }

    fn marker_info_of_current_selection(&self) -> Option<MarkerSpan> {
        None
    }

    fn select_offset_range(&mut self, _start: usize, _end: usize) {}

    fn clear_select(&mut self) {}
}
