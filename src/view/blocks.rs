//! Rendered block text shared by the rich-text and preview views.
//!
//! Markdown is parsed with comrak and every text-bearing block (paragraph,
//! heading, table cell, code block) becomes one block of plain text: the text
//! content a rendered surface would report, without markup characters.

use comrak::nodes::{AstNode, NodeValue};
use comrak::{Arena, Options, parse_document};
use serde::Serialize;

use super::{Affinity, Highlight, NativePoint, layout, normalize_line_endings};

/// A position inside a rendered block, in characters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BlockPoint {
    pub block: usize,
    pub offset: usize,
}

impl BlockPoint {
    pub const fn new(block: usize, offset: usize) -> Self {
        Self { block, offset }
    }
}

impl From<BlockPoint> for NativePoint {
    fn from(point: BlockPoint) -> Self {
        Self::Block {
            block: point.block,
            offset: point.offset,
        }
    }
}

/// The block structure of a rendered document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedBlocks {
    blocks: Vec<String>,
    /// Character offset of each block in the concatenated text.
    starts: Vec<usize>,
    /// Character length of each block.
    lens: Vec<usize>,
}

impl RenderedBlocks {
    /// Render `markdown` into blocks.
    pub fn parse(markdown: &str) -> Self {
        let arena = Arena::new();
        let options = create_options();
        let root = parse_document(&arena, markdown, &options);

        let mut blocks = Vec::new();
        collect_blocks(root, &mut blocks);
        Self::from_blocks(blocks)
    }

    /// Build from already extracted block texts. Empty blocks are dropped.
    pub fn from_blocks(blocks: Vec<String>) -> Self {
        let blocks: Vec<String> = blocks
            .into_iter()
            .map(|b| normalize_line_endings(&b))
            .filter(|b| !b.is_empty())
            .collect();
        let lens: Vec<usize> = blocks.iter().map(|b| b.chars().count()).collect();
        let starts = lens
            .iter()
            .scan(0, |acc, len| {
                let start = *acc;
                *acc += len;
                Some(start)
            })
            .collect();
        Self {
            blocks,
            starts,
            lens,
        }
    }

    pub fn blocks(&self) -> &[String] {
        &self.blocks
    }

    /// Concatenated text content of all blocks.
    pub fn text(&self) -> String {
        self.blocks.concat()
    }

    /// Total length in characters.
    pub fn len(&self) -> usize {
        self.lens.iter().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Resolve a text offset to a block point, clamping to the content.
    ///
    /// Offsets on a boundary between two blocks resolve to the start of the
    /// next block with [`Affinity::Forward`] and to the end of the previous
    /// block with [`Affinity::Backward`].
    pub fn point_at(&self, offset: usize, affinity: Affinity) -> BlockPoint {
        let offset = offset.min(self.len());
        let mut found = None;
        for (idx, (&start, &len)) in self.starts.iter().zip(&self.lens).enumerate() {
            if offset < start || offset > start + len {
                continue;
            }
            found = Some(BlockPoint::new(idx, offset - start));
            if affinity == Affinity::Backward || offset < start + len {
                break;
            }
        }
        found.unwrap_or_default()
    }

    /// Text offset of a block point, or `None` if the point is not in the content.
    pub fn offset_of(&self, point: BlockPoint) -> Option<usize> {
        let start = *self.starts.get(point.block)?;
        let len = self.lens[point.block];
        (point.offset <= len).then_some(start + point.offset)
    }

    /// Native range and layout geometry for an offset span.
    ///
    /// Blocks are laid out one after another with a blank row between them.
    pub fn highlight(&self, start: usize, end: usize, width: u16) -> Highlight {
        let end = end.min(self.len());
        let start = start.min(end);
        let (start_point, end_point) = if start == end {
            let point = self.point_at(start, Affinity::Forward);
            (point, point)
        } else {
            (
                self.point_at(start, Affinity::Forward),
                self.point_at(end, Affinity::Backward),
            )
        };
        let (top, left) = self.cell(start_point, width);
        let (bottom, _) = self.cell(end_point, width);
        Highlight {
            start: start_point.into(),
            end: end_point.into(),
            top,
            left,
            height: bottom - top + 1,
        }
    }

    fn cell(&self, point: BlockPoint, width: u16) -> (usize, usize) {
        let Some(text) = self.blocks.get(point.block) else {
            return (0, 0);
        };
        let first_row: usize = self.blocks[..point.block]
            .iter()
            .map(|b| layout::row_count(b, width) + 1)
            .sum();
        let (row, col) = layout::locate(text, point.offset, width);
        (first_row + row, col)
    }
}

fn create_options() -> Options {
    let mut options = Options::default();

    // GFM extensions, so tables and strikethrough render like the editor does
    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;
    options.extension.footnotes = true;

    options
}

fn collect_blocks<'a>(node: &'a AstNode<'a>, blocks: &mut Vec<String>) {
    match &node.data.borrow().value {
        NodeValue::Paragraph | NodeValue::Heading(_) | NodeValue::TableCell => {
            let mut text = String::new();
            for child in node.children() {
                extract_inline_text(child, &mut text);
            }
            blocks.push(text);
        }
        NodeValue::CodeBlock(code_block) => {
            blocks.push(code_block.literal.clone());
        }
        NodeValue::HtmlBlock(_) | NodeValue::ThematicBreak => {}
        _ => {
            for child in node.children() {
                collect_blocks(child, blocks);
            }
        }
    }
}

fn extract_inline_text<'a>(node: &'a AstNode<'a>, text: &mut String) {
    match &node.data.borrow().value {
        NodeValue::Text(t) => {
            text.push_str(t);
        }
        NodeValue::Code(c) => {
            text.push_str(&c.literal);
        }
        NodeValue::SoftBreak | NodeValue::LineBreak => {
            text.push('\n');
        }
        // Rendered images and raw HTML contribute no text content.
        NodeValue::Image(_) | NodeValue::HtmlInline(_) => {}
        _ => {
            for child in node.children() {
                extract_inline_text(child, text);
            }
        }
    }
}
