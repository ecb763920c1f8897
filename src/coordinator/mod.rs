//! Marker coordinator.
//!
//! Glues the host [`Editor`], the [`MarkerStore`] and the [`Reconciler`]
//! together. Editor lifecycle events are fed in through
//! [`MarkerCoordinator::handle_event`] (or drained with
//! [`MarkerCoordinator::pump`]); the coordinator keeps marker offsets in
//! step with whichever surface is active and queues a [`MarkerUpdate`] every
//! time the marker set is recomputed.
//!
//! Time is passed in as milliseconds, so debouncing is deterministic.

mod debounce;

pub use debounce::{Debouncer, MARKER_UPDATE_DELAY_MS};

use serde::Serialize;
use tracing::debug;

use crate::editor::{Editor, EditorEvent};
use crate::error::Result;
use crate::marker::{
    Marker, MarkerData, MarkerId, MarkerSeed, MarkerSpan, MarkerStore, SortField,
};
use crate::reconcile::Reconciler;
use crate::view::{ViewMode, normalize_line_endings};

/// Why a marker notification was emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateReason {
    /// A debounced pass after edits.
    Reconciled,
    /// The active surface changed.
    ModeChanged,
    /// Markers were loaded together with new content.
    BulkLoad,
    /// Geometry changed with the viewport.
    Resized,
    /// A marker was authored.
    Added,
}

/// A `markerUpdated` notification: the full marker sequence after a change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarkerUpdate {
    pub reason: UpdateReason,
    pub markers: Vec<Marker>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorOptions {
    /// Quiet period after the last edit before markers are reconciled.
    pub debounce_ms: u64,
}

impl Default for CoordinatorOptions {
    fn default() -> Self {
        Self {
            debounce_ms: MARKER_UPDATE_DELAY_MS,
        }
    }
}

/// Keeps markers consistent across edits and surface changes.
#[derive(Debug)]
pub struct MarkerCoordinator {
    editor: Editor,
    store: MarkerStore,
    reconciler: Reconciler,
    debouncer: Debouncer,
    /// Surface the marker offsets currently refer to.
    active: ViewMode,
    updates: Vec<MarkerUpdate>,
}

impl MarkerCoordinator {
    pub fn new(editor: Editor, options: CoordinatorOptions) -> Self {
        let active = editor.mode();
        let mut coordinator = Self {
            editor,
            store: MarkerStore::new(),
            reconciler: Reconciler::new(),
            debouncer: Debouncer::new(options.debounce_ms),
            active,
            updates: Vec::new(),
        };
        coordinator.rebase();
        coordinator
    }

    pub const fn editor(&self) -> &Editor {
        &self.editor
    }

    /// Mutable access for edits, selections and mode changes.
    ///
    /// Changes are picked up from the editor's event queue on the next
    /// [`pump`](Self::pump).
    pub const fn editor_mut(&mut self) -> &mut Editor {
        &mut self.editor
    }

    pub const fn active_mode(&self) -> ViewMode {
        self.active
    }

    /// Markers in their current order.
    pub fn markers(&self) -> &[Marker] {
        self.store.get_all()
    }

    /// True while an edit is waiting for its debounced reconciliation.
    pub const fn has_pending_update(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// Replace the content and the whole marker set at once.
    ///
    /// Marker offsets refer to the line-ending-normalized markdown source.
    /// All seeds are validated before anything changes. Events queued by the
    /// editor before the load are superseded by it.
    ///
    /// # Errors
    /// Returns [`MarkerError::InvalidRange`](crate::error::MarkerError) if any
    /// seed has negative or reversed offsets.
    pub fn set_value_with_markers(
        &mut self,
        content: &str,
        markers: &[MarkerSeed],
    ) -> Result<Vec<Marker>> {
        let _scope = crate::perf::scope("coordinator.bulk_load");
        for seed in markers {
            seed.span()?;
        }

        self.debouncer.cancel();
        self.store.reset_markers();
        let source = normalize_line_endings(content);
        self.reconciler.reset_content(&mut self.store, source.as_str());
        // Seeds are supplied against the fresh baseline.
        for seed in markers {
            self.store.add_seed(seed)?;
        }

        self.editor.set_value(content);
        self.editor.take_events();
        self.active = self.editor.mode();

        if self.active == ViewMode::Source {
            self.reconciler
                .update_markers_by_content(&mut self.store, &source);
        } else {
            let text = self.editor.adapter(self.active).text_content();
            self.reconciler.realign_markers(&mut self.store, &text);
        }
        self.attach_info();
        crate::perf::log_event(
            "coordinator.bulk_load",
            format!("markers={} mode={}", self.store.len(), self.active.as_str()),
        );
        self.notify(UpdateReason::BulkLoad);
        Ok(self.store.get_all().to_vec())
    }

    /// Turn the active surface's current selection into a marker.
    ///
    /// Returns `Ok(None)` on the preview surface or without a selection.
    ///
    /// # Errors
    /// Propagates [`MarkerError::InvalidRange`](crate::error::MarkerError)
    /// from the store.
    pub fn add_marker_at_selection(&mut self, id: Option<MarkerId>) -> Result<Option<Marker>> {
        if self.active == ViewMode::RenderOnly {
            return Ok(None);
        }
        self.flush();
        let Some(span) = self.current_selection() else {
            return Ok(None);
        };
        self.insert_marker(span.start, span.end, id).map(Some)
    }

    /// Add a marker over explicit offsets of the active surface's text.
    ///
    /// Offsets past the end of the text are clamped to it. Returns `Ok(None)`
    /// on the preview surface.
    ///
    /// # Errors
    /// Returns [`MarkerError::InvalidRange`](crate::error::MarkerError) if
    /// `start > end`.
    pub fn add_marker_at_range(
        &mut self,
        start: usize,
        end: usize,
        id: Option<MarkerId>,
    ) -> Result<Option<Marker>> {
        if self.active == ViewMode::RenderOnly {
            return Ok(None);
        }
        self.flush();
        self.insert_marker(start, end, id).map(Some)
    }

    pub fn remove_marker(&mut self, id: &MarkerId) -> bool {
        self.store.remove_marker(id)
    }

    pub fn get_marker(&self, id: &MarkerId) -> Option<&Marker> {
        self.store.get_marker(id)
    }

    /// Snapshot of every marker as plain data.
    ///
    /// Offsets always refer to the normalized markdown source, the same
    /// offsets [`set_value_with_markers`](Self::set_value_with_markers)
    /// takes. On a rendered surface the markers take a round trip through the
    /// source and back, leaving their rendered offsets as they were.
    pub fn export_markers(&mut self) -> Vec<MarkerData> {
        self.flush();
        if self.active == ViewMode::Source {
            return self.store.markers_data();
        }

        let _scope = crate::perf::scope("coordinator.export");
        let source = normalize_line_endings(&self.editor.value());
        self.reconciler.realign_markers(&mut self.store, &source);
        let data = self.store.markers_data();

        let rendered = self.editor.adapter(self.active).text_content();
        self.reconciler.realign_markers(&mut self.store, &rendered);
        self.attach_info();
        data
    }

    /// Select a marker's span on the active surface. Unknown ids are ignored.
    pub fn select_marker(&mut self, id: &MarkerId) {
        let Some(marker) = self.store.get_marker(id) else {
            return;
        };
        let (start, end) = (marker.start, marker.end);
        self.editor
            .adapter_mut(self.active)
            .select_offset_range(start, end);
    }

    /// The active surface's selection as offsets.
    pub fn current_selection(&self) -> Option<MarkerSpan> {
        self.editor
            .adapter(self.active)
            .marker_info_of_current_selection()
    }

    pub fn clear_select(&mut self) {
        self.editor.adapter_mut(self.active).clear_select();
    }

    /// React to one editor lifecycle event.
    pub fn handle_event(&mut self, event: EditorEvent, now_ms: u64) {
        debug!(?event, now_ms, "editor event");
        match event {
            EditorEvent::ContentReplaced => {
                self.debouncer.cancel();
                self.rebase();
            }
            EditorEvent::ModeChanged(mode) => {
                if !self.editor.is_view_only() {
                    self.transition(mode);
                }
            }
            EditorEvent::ContentEdited => {
                if !self.editor.is_view_only() {
                    self.debouncer.queue(now_ms);
                }
            }
            EditorEvent::ViewportResized(width) => {
                if self.store.is_empty() {
                    return;
                }
                crate::perf::log_event("coordinator.resize", format!("width={width}"));
                self.attach_info();
                self.notify(UpdateReason::Resized);
            }
        }
    }

    /// Drain the editor's queued events, then run any due reconciliation.
    pub fn pump(&mut self, now_ms: u64) {
        for event in self.editor.take_events() {
            self.handle_event(event, now_ms);
        }
        self.tick(now_ms);
    }

    /// Run the debounced pass if its quiet period has elapsed.
    pub fn tick(&mut self, now_ms: u64) {
        if self.debouncer.take_ready(now_ms) {
            self.reconcile_active(UpdateReason::Reconciled);
        }
    }

    /// Run the debounced pass now, if one is pending.
    pub fn flush(&mut self) {
        if self.debouncer.take_pending() {
            self.reconcile_active(UpdateReason::Reconciled);
        }
    }

    /// Drain queued notifications, oldest first.
    pub fn take_updates(&mut self) -> Vec<MarkerUpdate> {
        std::mem::take(&mut self.updates)
    }

    fn insert_marker(&mut self, start: usize, end: usize, id: Option<MarkerId>) -> Result<Marker> {
        let marker = self.store.add_marker(start, end, id)?;
        let len = self.editor.adapter(self.active).text_content().chars().count();
        self.store.clamp_to(len);
        self.store.sort_with(SortField::End);
        self.attach_info();
        self.notify(UpdateReason::Added);
        Ok(self
            .store
            .get_marker(&marker.id)
            .cloned()
            .unwrap_or(marker))
    }

    fn transition(&mut self, mode: ViewMode) {
        if mode == self.active {
            return;
        }
        let _scope = crate::perf::scope("coordinator.mode_change");
        // A pending edit is measured on the surface it was made in.
        self.flush();
        let previous = std::mem::replace(&mut self.active, mode);
        crate::perf::log_event(
            "coordinator.mode_change",
            format!("from={} to={}", previous.as_str(), mode.as_str()),
        );

        if self.store.is_empty() {
            self.rebase();
            return;
        }
        let text = self.editor.adapter(self.active).text_content();
        self.reconciler.realign_markers(&mut self.store, &text);
        self.attach_info();
        self.notify(UpdateReason::ModeChanged);
    }

    fn reconcile_active(&mut self, reason: UpdateReason) {
        let text = self.editor.adapter(self.active).text_content();
        self.reconciler
            .update_markers_by_content(&mut self.store, &text);
        self.attach_info();
        self.notify(reason);
    }

    fn rebase(&mut self) {
        let text = self.editor.adapter(self.active).text_content();
        self.reconciler.reset_content(&mut self.store, text);
    }

    fn attach_info(&mut self) {
        let adapter = self.editor.adapter(self.active);
        for marker in self.store.markers_mut().iter_mut() {
            adapter.update_marker_with_extra_info(marker);
        }
    }

    fn notify(&mut self, reason: UpdateReason) {
        debug!(?reason, markers = self.store.len(), "markers updated");
        self.updates.push(MarkerUpdate {
            reason,
            markers: self.store.get_all().to_vec(),
        });
    }
}
