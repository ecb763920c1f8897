//! Marker reconciliation against changed plain text.
//!
//! The common prefix and common suffix of the baseline and the new text are
//! trimmed, and whatever remains is treated as one replaced window.
//!
//! Placement rules for a marker `start..end` against the old window
//! `prefix..old_end`, replaced by `prefix..new_end`:
//!
//! - ends at or before the window: unchanged
//! - starts at or after the window: shifted by the length delta
//! - lies wholly inside the window: dropped, unless the caller supplied the id
//!   since the baseline was taken, in which case it snaps to the replacement
//! - otherwise: the untouched side is kept and the touched side is stretched to
//!   cover the replacement text
//!
//! Switching between the markdown source and a rendered surface is not one
//! edit but many small markup differences. [`Reconciler::realign_markers`]
//! handles that case through a character [`Alignment`] instead.

mod align;

pub use align::Alignment;

use tracing::debug;

use crate::marker::{Marker, MarkerStore};

/// The replaced region between two texts, in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeWindow {
    /// Length of the common prefix; the window starts here in both texts.
    pub prefix: usize,
    /// End of the replaced window in the old text.
    pub old_end: usize,
    /// End of the replacement in the new text.
    pub new_end: usize,
}

impl ChangeWindow {
    /// Compute the changed window, or `None` when the texts are equal.
    ///
    /// Prefix and suffix never overlap, so for `"aa"` → `"aaa"` the window is
    /// an insertion at 2 rather than an overlapping match.
    pub fn between(old: &str, new: &str) -> Option<Self> {
        if old == new {
            return None;
        }
        let old_len = old.chars().count();
        let new_len = new.chars().count();
        let prefix = old
            .chars()
            .zip(new.chars())
            .take_while(|(a, b)| a == b)
            .count();
        let suffix = old
            .chars()
            .rev()
            .zip(new.chars().rev())
            .take(old_len.min(new_len) - prefix)
            .take_while(|(a, b)| a == b)
            .count();
        Some(Self {
            prefix,
            old_end: old_len - suffix,
            new_end: new_len - suffix,
        })
    }

    /// Map an old-text marker span into the new text.
    ///
    /// Returns `None` when the span is destroyed by the edit. `keep` turns a
    /// destroyed span into one covering the replacement.
    pub const fn map_span(&self, start: usize, end: usize, keep: bool) -> Option<(usize, usize)> {
        if end <= self.prefix {
            return Some((start, end));
        }
        if start >= self.old_end {
            return Some((
                start - self.old_end + self.new_end,
                end - self.old_end + self.new_end,
            ));
        }
        let inside = start >= self.prefix && end <= self.old_end;
        if inside && !keep {
            return None;
        }
        let new_start = if start < self.prefix { start } else { self.prefix };
        let new_end = if end > self.old_end {
            end - self.old_end + self.new_end
        } else {
            self.new_end
        };
        Some((new_start, new_end))
    }
}

/// Recomputes marker offsets when the underlying text changes.
#[derive(Debug, Clone, Copy, Default)]
pub struct Reconciler;

impl Reconciler {
    pub const fn new() -> Self {
        Self
    }

    /// Rebase the store's baseline without touching any marker.
    ///
    /// Used when the previous baseline no longer describes the text the
    /// offsets refer to, e.g. right after a bulk load.
    pub fn reset_content(&self, store: &mut MarkerStore, text: impl Into<String>) {
        store.set_baseline(text.into());
    }

    /// Diff `new_text` against the baseline, rewrite every marker and make
    /// `new_text` the new baseline. Returns the updated marker sequence.
    pub fn update_markers_by_content<'s>(
        &self,
        store: &'s mut MarkerStore,
        new_text: &str,
    ) -> &'s [Marker] {
        let _scope = crate::perf::scope("reconcile.pass");
        let window = store
            .baseline()
            .and_then(|old| ChangeWindow::between(old, new_text));

        if let Some(window) = window {
            debug!(
                prefix = window.prefix,
                old_end = window.old_end,
                new_end = window.new_end,
                "reconciling markers"
            );
            remap(store, |start, end, keep| window.map_span(start, end, keep));
        }
        rebase_onto(store, new_text)
    }

    /// Carry markers over to another rendering of the same document.
    ///
    /// The baseline and `new_text` are aligned character by character, so a
    /// marker keeps covering the same words however much markup lies between
    /// them. A span left covering only markup is dropped unless its id was
    /// supplied since the last rebase. `new_text` becomes the new baseline.
    pub fn realign_markers<'s>(&self, store: &'s mut MarkerStore, new_text: &str) -> &'s [Marker] {
        let _scope = crate::perf::scope("reconcile.realign");
        let alignment = store
            .baseline()
            .and_then(|old| Alignment::between(old, new_text));

        if let Some(alignment) = alignment {
            debug!(markers = store.len(), "realigning markers");
            remap(store, |start, end, keep| alignment.map_span(start, end, keep));
        }
        rebase_onto(store, new_text)
    }
}

/// Move every marker through `map`, dropping the ones it destroys.
fn remap(store: &mut MarkerStore, map: impl Fn(usize, usize, bool) -> Option<(usize, usize)>) {
    let supplied: Vec<bool> = store
        .get_all()
        .iter()
        .map(|m| store.is_supplied(&m.id))
        .collect();
    let mut keep_flags = supplied.into_iter();
    let before = store.len();
    store.markers_mut().retain_mut(|marker| {
        let keep = keep_flags.next().unwrap_or(false);
        match map(marker.start, marker.end, keep) {
            Some((start, end)) => {
                marker.start = start;
                marker.end = end;
                true
            }
            None => false,
        }
    });
    let dropped = before - store.len();
    if dropped > 0 {
        crate::perf::log_event("reconcile.dropped", format!("count={dropped}"));
    }
}

fn rebase_onto<'s>(store: &'s mut MarkerStore, new_text: &str) -> &'s [Marker] {
    store.clamp_to(new_text.chars().count());
    store.set_baseline(new_text.to_string());
    store.get_all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marker::MarkerId;

    fn store_with(text: &str, markers: &[(&str, usize, usize)]) -> MarkerStore {
        let mut store = MarkerStore::new();
        for (id, start, end) in markers {
            store.add_marker(*start, *end, Some((*id).into())).unwrap();
        }
        Reconciler::new().reset_content(&mut store, text);
        store
    }

    fn span(store: &MarkerStore, id: &str) -> Option<(usize, usize)> {
        store
            .get_marker(&MarkerId::from(id))
            .map(|m| (m.start, m.end))
    }

    // --- ChangeWindow ---

    #[test]
    fn test_window_none_for_equal_text() {
        assert_eq!(ChangeWindow::between("same", "same"), None);
    }

    #[test]
    fn test_window_for_append() {
        let w = ChangeWindow::between("hello", "hello world").unwrap();
        assert_eq!(w, ChangeWindow { prefix: 5, old_end: 5, new_end: 11 });
    }

    #[test]
    fn test_window_prefix_and_suffix_do_not_overlap() {
        let w = ChangeWindow::between("aa", "aaa").unwrap();
        assert_eq!(w, ChangeWindow { prefix: 2, old_end: 2, new_end: 3 });
    }

    #[test]
    fn test_window_counts_characters_not_bytes() {
        let w = ChangeWindow::between("café au lait", "café noir").unwrap();
        assert_eq!(w.prefix, 5);
    }

    // --- Reconciler ---

    #[test]
    fn test_no_op_edit_keeps_offsets() {
        let mut store = store_with("hello", &[("a", 1, 3)]);
        Reconciler::new().update_markers_by_content(&mut store, "hello");
        assert_eq!(span(&store, "a"), Some((1, 3)));
    }

    #[test]
    fn test_same_text_twice_is_idempotent() {
        let mut store = store_with("hello", &[("a", 1, 3)]);
        let reconciler = Reconciler::new();
        reconciler.update_markers_by_content(&mut store, "hello there");
        let first = store.markers_data();
        reconciler.update_markers_by_content(&mut store, "hello there");
        assert_eq!(store.markers_data(), first);
    }

    #[test]
    fn test_pure_append_leaves_marker() {
        let mut store = store_with("hello", &[("a", 0, 5)]);
        Reconciler::new().update_markers_by_content(&mut store, "hello world");
        assert_eq!(span(&store, "a"), Some((0, 5)));
    }

    #[test]
    fn test_prefix_insertion_shifts_marker() {
        let mut store = store_with("world", &[("a", 0, 5)]);
        Reconciler::new().update_markers_by_content(&mut store, "hello world");
        assert_eq!(span(&store, "a"), Some((6, 11)));
    }

    #[test]
    fn test_replacing_whole_span_drops_marker() {
        let mut store = store_with("abcdef", &[("a", 1, 3)]);
        Reconciler::new().update_markers_by_content(&mut store, "aXYZdef");
        assert_eq!(span(&store, "a"), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_supplied_marker_snaps_to_replacement() {
        let mut store = store_with("abcdef", &[]);
        store.add_marker(1, 3, Some("fresh".into())).unwrap();
        Reconciler::new().update_markers_by_content(&mut store, "aXYZdef");
        assert_eq!(span(&store, "fresh"), Some((1, 4)));
    }

    #[test]
    fn test_supplied_flag_only_protects_one_pass() {
        let mut store = store_with("abcdef", &[]);
        store.add_marker(1, 3, Some("fresh".into())).unwrap();
        let reconciler = Reconciler::new();
        reconciler.update_markers_by_content(&mut store, "aXYZdef");
        reconciler.update_markers_by_content(&mut store, "a--def");
        assert_eq!(span(&store, "fresh"), None);
    }

    #[test]
    fn test_marker_straddling_window_start_stretches_end() {
        // "hello world" -> "hello there": window covers "world"
        let mut store = store_with("hello world", &[("a", 3, 8)]);
        Reconciler::new().update_markers_by_content(&mut store, "hello there");
        assert_eq!(span(&store, "a"), Some((3, 11)));
    }

    #[test]
    fn test_marker_straddling_window_end_snaps_start() {
        // "abcdef" -> "aXdef": window "bc" -> "X"
        let mut store = store_with("abcdef", &[("a", 2, 5)]);
        Reconciler::new().update_markers_by_content(&mut store, "aXdef");
        assert_eq!(span(&store, "a"), Some((1, 4)));
    }

    #[test]
    fn test_marker_containing_window_covers_replacement() {
        let mut store = store_with("the quick fox", &[("a", 0, 13)]);
        Reconciler::new().update_markers_by_content(&mut store, "the slow fox");
        assert_eq!(span(&store, "a"), Some((0, 12)));
    }

    #[test]
    fn test_deletion_inside_marker_shrinks_it() {
        let mut store = store_with("abcdefgh", &[("a", 1, 7)]);
        Reconciler::new().update_markers_by_content(&mut store, "abgh");
        assert_eq!(span(&store, "a"), Some((1, 3)));
    }

    #[test]
    fn test_point_marker_at_insertion_stays() {
        let mut store = store_with("ab", &[("p", 1, 1)]);
        Reconciler::new().update_markers_by_content(&mut store, "aXb");
        assert_eq!(span(&store, "p"), Some((1, 1)));
    }

    #[test]
    fn test_markers_before_and_after_edit() {
        let mut store = store_with("one two three", &[("one", 0, 3), ("three", 8, 13)]);
        Reconciler::new().update_markers_by_content(&mut store, "one 2 three");
        assert_eq!(span(&store, "one"), Some((0, 3)));
        assert_eq!(span(&store, "three"), Some((6, 11)));
    }

    #[test]
    fn test_baseline_follows_each_pass() {
        let mut store = store_with("a", &[]);
        Reconciler::new().update_markers_by_content(&mut store, "ab");
        assert_eq!(store.baseline(), Some("ab"));
    }

    #[test]
    fn test_first_pass_without_baseline_adopts_text() {
        let mut store = MarkerStore::new();
        store.add_marker(0, 2, Some("a".into())).unwrap();
        Reconciler::new().update_markers_by_content(&mut store, "hello");
        assert_eq!(span(&store, "a"), Some((0, 2)));
        assert_eq!(store.baseline(), Some("hello"));
    }

    #[test]
    fn test_offsets_past_text_are_clamped() {
        let mut store = store_with("hi", &[("a", 0, 10)]);
        Reconciler::new().update_markers_by_content(&mut store, "hi");
        assert_eq!(span(&store, "a"), Some((0, 2)));
    }

    #[test]
    fn test_reset_content_does_not_move_markers() {
        let mut store = store_with("hello", &[("a", 1, 2)]);
        Reconciler::new().reset_content(&mut store, "completely different");
        assert_eq!(span(&store, "a"), Some((1, 2)));
        assert_eq!(store.baseline(), Some("completely different"));
    }

    // --- Realignment ---

    #[test]
    fn test_realign_keeps_marker_inside_emphasis() {
        let mut store = store_with("Some **bold** text", &[("b", 7, 11)]);
        Reconciler::new().realign_markers(&mut store, "Some bold text");
        assert_eq!(span(&store, "b"), Some((5, 9)));
        assert_eq!(store.baseline(), Some("Some bold text"));
    }

    #[test]
    fn test_window_pass_over_emphasis_would_drop_marker() {
        let mut store = store_with("Some **bold** text", &[("b", 7, 11)]);
        Reconciler::new().update_markers_by_content(&mut store, "Some bold text");
        assert_eq!(span(&store, "b"), None);
    }

    #[test]
    fn test_realign_round_trip_is_stable() {
        let source = "- item with `code` and *em*";
        let rendered = "item with code and em";
        let mut store = store_with(source, &[("code", 13, 17), ("em", 24, 26)]);
        let reconciler = Reconciler::new();
        reconciler.realign_markers(&mut store, rendered);
        assert_eq!(span(&store, "code"), Some((10, 14)));
        assert_eq!(span(&store, "em"), Some((19, 21)));

        reconciler.realign_markers(&mut store, source);
        assert_eq!(span(&store, "code"), Some((13, 17)));
        assert_eq!(span(&store, "em"), Some((24, 26)));
    }

    #[test]
    fn test_realign_protects_supplied_ids_covering_markup() {
        let mut store = store_with("x **y**", &[("old", 2, 4)]);
        store.add_marker(2, 4, Some("fresh".into())).unwrap();
        Reconciler::new().realign_markers(&mut store, "x y");
        assert_eq!(span(&store, "fresh"), Some((2, 2)));
        assert_eq!(span(&store, "old"), None);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn offsets_stay_within_new_text(
                old in "[a-d ]{0,40}",
                new in "[a-d ]{0,40}",
                a in 0..40usize,
                b in 0..40usize,
            ) {
                let len = old.chars().count();
                let (start, end) = (a.min(b).min(len), a.max(b).min(len));
                let mut store = store_with(&old, &[("m", start, end)]);
                Reconciler::new().update_markers_by_content(&mut store, &new);

                let new_len = new.chars().count();
                for marker in store.get_all() {
                    prop_assert!(marker.start <= marker.end);
                    prop_assert!(marker.end <= new_len);
                }
            }

            #[test]
            fn repeated_pass_is_identity(
                old in "[a-c]{0,30}",
                new in "[a-c]{0,30}",
                a in 0..30usize,
                b in 0..30usize,
            ) {
                let len = old.chars().count();
                let (start, end) = (a.min(b).min(len), a.max(b).min(len));
                let mut store = store_with(&old, &[("m", start, end)]);
                let reconciler = Reconciler::new();
                reconciler.update_markers_by_content(&mut store, &new);
                let once = store.markers_data();
                reconciler.update_markers_by_content(&mut store, &new);
                prop_assert_eq!(store.markers_data(), once);
            }

            #[test]
            fn realigned_offsets_stay_within_new_text(
                old in "[a-c*_ ]{0,40}",
                new in "[a-c*_ ]{0,40}",
                a in 0..40usize,
                b in 0..40usize,
            ) {
                let len = old.chars().count();
                let (start, end) = (a.min(b).min(len), a.max(b).min(len));
                let mut store = store_with(&old, &[("m", start, end)]);
                Reconciler::new().realign_markers(&mut store, &new);

                let new_len = new.chars().count();
                for marker in store.get_all() {
                    prop_assert!(marker.start <= marker.end);
                    prop_assert!(marker.end <= new_len);
                }
            }

            #[test]
            fn stripped_markup_keeps_word(
                head in "[a-z ]{0,10}",
                word in "[a-z]{1,8}",
                tail in "[a-z ]{0,10}",
            ) {
                let source = format!("{head}**{word}**{tail}");
                let rendered = format!("{head}{word}{tail}");
                let start = head.chars().count() + 2;
                let mut store = store_with(&source, &[("m", start, start + word.len())]);
                Reconciler::new().realign_markers(&mut store, &rendered);
                let marker = &store.get_all()[0];
                let covered: String = rendered.chars().skip(marker.start).take(marker.len()).collect();
                prop_assert_eq!(covered, word);
            }

            #[test]
            fn untouched_text_keeps_marker_content(
                head in "[a-z]{1,10}",
                inserted in "[0-9]{1,5}",
                tail in "[a-z]{0,10}",
            ) {
                // Marker over `head`, insertion right after it.
                let old = format!("{head}{tail}");
                let new = format!("{head}{inserted}{tail}");
                let head_len = head.chars().count();
                let mut store = store_with(&old, &[("m", 0, head_len)]);
                Reconciler::new().update_markers_by_content(&mut store, &new);
                let marker = &store.get_all()[0];
                let covered: String = new.chars().skip(marker.start).take(marker.len()).collect();
                prop_assert_eq!(covered, head);
            }
        }
    }
}
