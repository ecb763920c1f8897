//! View adapters.
//!
//! Each way of presenting the document (rich text, markdown source, read-only
//! preview) addresses text natively in its own terms. A [`ViewAdapter`]
//! translates between those native positions and the abstract character
//! offsets the marker store works with.
//!
//! - [`SourceView`]: rope-backed markdown source, line/column addressing
//! - [`RichTextView`]: rendered blocks with a writable selection
//! - [`RenderView`]: rendered blocks, read-only, no selection

mod blocks;
pub mod layout;
mod render;
mod rich;
mod source;

pub use blocks::{BlockPoint, RenderedBlocks};
pub use render::RenderView;
pub use rich::RichTextView;
pub use source::SourceView;

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::marker::{Marker, MarkerSpan};

static LINE_BREAK_RX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\r\n|\r|\n").expect("line break pattern is valid"));

/// Strip every line terminator (`\r\n`, `\r`, `\n`) from `text`.
///
/// All marker offsets are counted on text normalized this way, so views with
/// different line-ending conventions, or that render block boundaries without
/// any newline, agree on the offsets of the remaining characters.
pub fn normalize_line_endings(text: &str) -> String {
    LINE_BREAK_RX.replace_all(text, "").into_owned()
}

/// The interchangeable ways of presenting a document.
#[derive(
    clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum ViewMode {
    /// Editable WYSIWYG surface
    #[value(alias = "wysiwyg")]
    RichText,
    /// Editable markdown source
    #[value(alias = "markdown")]
    Source,
    /// Read-only rendered preview
    #[value(alias = "preview")]
    RenderOnly,
}

impl ViewMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RichText => "rich-text",
            Self::Source => "source",
            Self::RenderOnly => "render-only",
        }
    }

    /// Parse a mode name as used in config files.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "rich-text" | "wysiwyg" => Some(Self::RichText),
            "source" | "markdown" => Some(Self::Source),
            "render-only" | "preview" => Some(Self::RenderOnly),
            _ => None,
        }
    }
}

/// Which side of a boundary an offset resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Affinity {
    /// Prefer the start of the following line or block.
    Forward,
    /// Prefer the end of the preceding line or block.
    Backward,
}

/// A position in a view's native addressing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NativePoint {
    /// Source line and column, in characters, excluding the line terminator.
    Line { line: usize, column: usize },
    /// Rendered block and character offset within it.
    Block { block: usize, offset: usize },
}

/// View-specific realization of a marker.
///
/// `top`, `left` and `height` are screen cells at the view's current
/// viewport width, so they change on resize even when the text does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Highlight {
    pub start: NativePoint,
    pub end: NativePoint,
    pub top: usize,
    pub left: usize,
    pub height: usize,
}

/// Capability contract every view offers to the marker core.
pub trait ViewAdapter {
    fn mode(&self) -> ViewMode;

    /// Current plain text of the view, line endings normalized.
    fn text_content(&self) -> String;

    /// Attach the native highlight for the marker's offsets.
    ///
    /// Offsets past the current content are clamped, never rejected; they
    /// are transient and fixed by the next reconciliation. Calling this twice
    /// on unchanged content attaches the same highlight.
    fn update_marker_with_extra_info(&self, marker: &mut Marker);

    /// The current selection as offsets, `None` without a selection.
    fn marker_info_of_current_selection(&self) -> Option<MarkerSpan>;

    /// Select the native range for `start..end`.
    ///
    /// Does nothing if the offsets do not fit the current content.
    fn select_offset_range(&mut self, start: usize, end: usize);

    fn clear_select(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_all_line_endings() {
        assert_eq!(normalize_line_endings("a\r\nb\rc\nd"), "abcd");
        assert_eq!(normalize_line_endings("\n\n"), "");
    }

    #[test]
    fn test_normalize_keeps_other_whitespace() {
        assert_eq!(normalize_line_endings("a\tb c"), "a\tb c");
    }

    #[test]
    fn test_view_mode_parse_accepts_aliases() {
        assert_eq!(ViewMode::parse("wysiwyg"), Some(ViewMode::RichText));
        assert_eq!(ViewMode::parse("markdown"), Some(ViewMode::Source));
        assert_eq!(ViewMode::parse("preview"), Some(ViewMode::RenderOnly));
        assert_eq!(ViewMode::parse("bogus"), None);
    }

    #[test]
    fn test_view_mode_names_round_trip() {
        for mode in [ViewMode::RichText, ViewMode::Source, ViewMode::RenderOnly] {
            assert_eq!(ViewMode::parse(mode.as_str()), Some(mode));
        }
    }
}
