use std::ops::Range;

use crate::view::{
    BlockPoint, RenderView, RichTextView, SourceView, ViewAdapter, ViewMode,
};

/// Viewport width used when none is configured.
pub const DEFAULT_WIDTH: u16 = 80;

/// Lifecycle notifications emitted by the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorEvent {
    /// The whole content was replaced programmatically.
    ContentReplaced,
    /// The active surface changed to the given mode.
    ModeChanged(ViewMode),
    /// The content was edited in place.
    ContentEdited,
    /// The viewport was resized to the given width.
    ViewportResized(u16),
}

/// A markdown document with three interchangeable surfaces.
///
/// The markdown source is the document of record. Every edit re-renders the
/// rich text and preview surfaces, so all three always show the same
/// document and any of them can be read at any time.
#[derive(Debug, Clone)]
pub struct Editor {
    source: SourceView,
    rich: RichTextView,
    preview: RenderView,
    mode: ViewMode,
    view_only: bool,
    width: u16,
    events: Vec<EditorEvent>,
}

impl Editor {
    pub fn new(markdown: &str, mode: ViewMode, width: u16) -> Self {
        Self {
            source: SourceView::from_text(markdown, width),
            rich: RichTextView::from_markdown(markdown, width),
            preview: RenderView::from_markdown(markdown, width),
            mode,
            view_only: false,
            width,
            events: Vec::new(),
        }
    }

    /// A viewer: fixed to the preview surface, no edits, no mode changes.
    pub fn view_only(markdown: &str, width: u16) -> Self {
        Self {
            view_only: true,
            ..Self::new(markdown, ViewMode::RenderOnly, width)
        }
    }

    pub const fn is_view_only(&self) -> bool {
        self.view_only
    }

    pub fn is_wysiwyg_mode(&self) -> bool {
        self.mode == ViewMode::RichText
    }

    pub const fn mode(&self) -> ViewMode {
        self.mode
    }

    pub const fn width(&self) -> u16 {
        self.width
    }

    /// The markdown source, line endings untouched.
    pub fn value(&self) -> String {
        self.source.text()
    }

    /// Replace the document programmatically.
    pub fn set_value(&mut self, markdown: &str) {
        self.source.set_text(markdown);
        self.rerender();
        self.events.push(EditorEvent::ContentReplaced);
    }

    /// Switch the active surface. Returns false if nothing changed.
    pub fn change_mode(&mut self, mode: ViewMode) -> bool {
        if self.view_only || mode == self.mode {
            return false;
        }
        self.mode = mode;
        self.events.push(EditorEvent::ModeChanged(mode));
        true
    }

    /// Replace a character range of the markdown source, as typing would.
    ///
    /// Returns false on a view-only editor.
    pub fn replace_range(&mut self, range: Range<usize>, text: &str) -> bool {
        if self.view_only {
            return false;
        }
        self.source.replace(range, text);
        self.rerender();
        self.events.push(EditorEvent::ContentEdited);
        true
    }

    /// Replace the whole source as an edit rather than a reload.
    ///
    /// Used for external changes to a watched file, which should flow through
    /// the same reconciliation as typing.
    pub fn replace_all(&mut self, markdown: &str) -> bool {
        let len = self.source.len_chars();
        self.replace_range(0..len, markdown)
    }

    pub fn resize(&mut self, width: u16) {
        if width == self.width {
            return;
        }
        self.width = width;
        self.source.set_width(width);
        self.rich.set_width(width);
        self.preview.set_width(width);
        self.events.push(EditorEvent::ViewportResized(width));
    }

    /// Select a raw character range of the source surface.
    pub fn select_source(&mut self, range: Option<Range<usize>>) {
        self.source.set_selection(range);
    }

    /// Select between two points of the rich text surface.
    pub fn select_rich(&mut self, anchor: BlockPoint, focus: BlockPoint) {
        self.rich.set_selection(anchor, focus);
    }

    pub const fn source_view(&self) -> &SourceView {
        &self.source
    }

    pub const fn rich_view(&self) -> &RichTextView {
        &self.rich
    }

    pub const fn preview_view(&self) -> &RenderView {
        &self.preview
    }

    /// The surface for `mode`.
    pub fn adapter(&self, mode: ViewMode) -> &dyn ViewAdapter {
        match mode {
            ViewMode::Source => &self.source,
            ViewMode::RichText => &self.rich,
            ViewMode::RenderOnly => &self.preview,
        }
    }

    pub fn adapter_mut(&mut self, mode: ViewMode) -> &mut dyn ViewAdapter {
        match mode {
            ViewMode::Source => &mut self.source,
            ViewMode::RichText => &mut self.rich,
            ViewMode::RenderOnly => &mut self.preview,
        }
    }

    /// Drain queued lifecycle events, oldest first.
    pub fn take_events(&mut self) -> Vec<EditorEvent> {
        std::mem::take(&mut self.events)
    }

    fn rerender(&mut self) {
        let _scope = crate::perf::scope("editor.rerender");
        let markdown = self.source.text();
        self.rich.rerender(&markdown);
        self.preview.rerender(&markdown);
    }
}
