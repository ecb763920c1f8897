//! Character alignment between two renderings of the same document.
//!
//! Markdown source and rendered text differ by markup that one side carries
//! and the other lacks, scattered through the whole document. After trimming
//! the common prefix and suffix, the shorter window is matched into the longer
//! one as an in-order subsequence. Characters with no counterpart count as
//! inserted or removed, so a marker over text that exists on both sides keeps
//! covering exactly that text.

use std::collections::HashMap;

use super::ChangeWindow;

/// Offset mapping from an old text into a new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alignment {
    window: ChangeWindow,
    /// New offset of a span starting at each old window position.
    starts: Vec<usize>,
    /// New offset of a span ending at each old window position.
    ends: Vec<usize>,
}

impl Alignment {
    /// Align `old` against `new`, or `None` when the texts are equal.
    pub fn between(old: &str, new: &str) -> Option<Self> {
        let window = ChangeWindow::between(old, new)?;
        let old_window: Vec<char> = old
            .chars()
            .skip(window.prefix)
            .take(window.old_end - window.prefix)
            .collect();
        let new_window: Vec<char> = new
            .chars()
            .skip(window.prefix)
            .take(window.new_end - window.prefix)
            .collect();
        let matched = match_window(&old_window, &new_window);

        let width = old_window.len();
        let mut starts = vec![window.new_end; width + 1];
        for k in (0..width).rev() {
            starts[k] = matched[k].map_or(starts[k + 1], |j| window.prefix + j);
        }
        let mut ends = vec![window.prefix; width + 1];
        for k in 1..=width {
            ends[k] = matched[k - 1].map_or(ends[k - 1], |j| window.prefix + j + 1);
        }

        Some(Self {
            window,
            starts,
            ends,
        })
    }

    /// Map an old-text span into the new text.
    ///
    /// The start moves forward past removed characters and the end moves
    /// back. Returns `None` when a non-empty span ends up covering nothing;
    /// `keep` turns that into a point marker instead.
    pub fn map_span(&self, start: usize, end: usize, keep: bool) -> Option<(usize, usize)> {
        let new_start = self.map_start(start);
        if start == end {
            return Some((new_start, new_start));
        }
        let new_end = self.map_end(end);
        if new_start < new_end {
            Some((new_start, new_end))
        } else if keep {
            Some((new_end, new_end))
        } else {
            None
        }
    }

    fn map_start(&self, offset: usize) -> usize {
        let w = &self.window;
        if offset < w.prefix {
            offset
        } else if offset >= w.old_end {
            offset - w.old_end + w.new_end
        } else {
            self.starts[offset - w.prefix]
        }
    }

    fn map_end(&self, offset: usize) -> usize {
        let w = &self.window;
        if offset <= w.prefix {
            offset
        } else if offset > w.old_end {
            offset - w.old_end + w.new_end
        } else {
            self.ends[offset - w.prefix]
        }
    }
}

/// New-window index matched to each old-window character.
fn match_window(old: &[char], new: &[char]) -> Vec<Option<usize>> {
    let mut matched = vec![None; old.len()];
    if new.len() <= old.len() {
        for (j, i) in subsequence(new, old) {
            matched[i] = Some(j);
        }
    } else {
        for (i, j) in subsequence(old, new) {
            matched[i] = Some(j);
        }
    }
    matched
}

/// Greedy in-order match of `short` into `long`, as `(short, long)` index
/// pairs. Characters of `short` with no later occurrence are skipped.
fn subsequence(short: &[char], long: &[char]) -> Vec<(usize, usize)> {
    let mut positions: HashMap<char, Vec<usize>> = HashMap::new();
    for (idx, ch) in long.iter().enumerate() {
        positions.entry(*ch).or_default().push(idx);
    }

    let mut cursor = 0;
    let mut pairs = Vec::with_capacity(short.len());
    for (idx, ch) in short.iter().enumerate() {
        let Some(list) = positions.get(ch) else {
            continue;
        };
        if let Some(&found) = list.get(list.partition_point(|&p| p < cursor)) {
            pairs.push((idx, found));
            cursor = found + 1;
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn covered(text: &str, (start, end): (usize, usize)) -> String {
        text.chars().skip(start).take(end - start).collect()
    }

    #[test]
    fn test_equal_texts_need_no_alignment() {
        assert_eq!(Alignment::between("same", "same"), None);
    }

    #[test]
    fn test_source_to_rendered_keeps_emphasized_word() {
        let old = "Some **bold** text";
        let new = "Some bold text";
        let alignment = Alignment::between(old, new).unwrap();
        let span = alignment.map_span(7, 11, false).unwrap();
        assert_eq!(covered(new, span), "bold");
    }

    #[test]
    fn test_rendered_to_source_skips_markup_on_both_sides() {
        let old = "Some bold text";
        let new = "Some **bold** text";
        let alignment = Alignment::between(old, new).unwrap();
        assert_eq!(alignment.map_span(5, 9, false), Some((7, 11)));
    }

    #[test]
    fn test_span_over_markup_shrinks_to_text() {
        let old = "a **b** c";
        let alignment = Alignment::between(old, "a b c").unwrap();
        // "**b**" becomes "b".
        assert_eq!(alignment.map_span(2, 7, false), Some((2, 3)));
    }

    #[test]
    fn test_span_over_markup_only_is_dropped_unless_kept() {
        let alignment = Alignment::between("x **y**", "x y").unwrap();
        assert_eq!(alignment.map_span(2, 4, false), None);
        assert_eq!(alignment.map_span(2, 4, true), Some((2, 2)));
    }

    #[test]
    fn test_spans_around_several_markup_runs() {
        let old = "# Plan## Ship `code` and [link](http://x.y) end";
        let new = "PlanShip code and link end";
        let alignment = Alignment::between(old, new).unwrap();
        for word in ["Plan", "Ship", "code", "link", "end"] {
            let start = old.find(word).unwrap();
            let span = alignment
                .map_span(start, start + word.len(), false)
                .unwrap();
            assert_eq!(covered(new, span), word);
        }
    }

    #[test]
    fn test_point_marker_moves_with_text() {
        let alignment = Alignment::between("ab", "**a**b").unwrap();
        assert_eq!(alignment.map_span(1, 1, false), Some((5, 5)));
    }

    #[test]
    fn test_unmatched_characters_do_not_stall_alignment() {
        // '©' has no counterpart in the old text.
        let alignment = Alignment::between("a &copy; b", "a © b").unwrap();
        assert_eq!(alignment.map_span(9, 10, false), Some((4, 5)));
    }
}
