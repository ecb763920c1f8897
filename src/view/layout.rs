//! Character-wrapped layout used to place highlights on screen.
//!
//! Text is wrapped per character at the viewport width, using terminal display
//! widths, so a native point can be turned into a `(row, column)` cell.

use unicode_width::UnicodeWidthChar;

/// Cell position of the character at `offset` in `text` wrapped at `width`.
///
/// An offset equal to the text length addresses the position just past the
/// last character.
pub fn locate(text: &str, offset: usize, width: u16) -> (usize, usize) {
    let width = usize::from(width.max(1));
    let mut row = 0;
    let mut col = 0;
    for (idx, ch) in text.chars().enumerate() {
        let ch_width = ch.width().unwrap_or(0);
        if col > 0 && col + ch_width > width {
            row += 1;
            col = 0;
        }
        if idx == offset {
            return (row, col);
        }
        col += ch_width;
    }
    (row, col)
}

/// Number of rows `text` occupies when wrapped at `width` (at least one).
pub fn row_count(text: &str, width: u16) -> usize {
    locate(text, text.chars().count(), width).0 + 1
}
