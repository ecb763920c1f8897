// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. marker::MarkerStore)
    clippy::module_name_repetitions
)]

//! # Markspan
//!
//! Persistent markers for a multi-view markdown editor.
//!
//! A document is shown as editable rich text, as markdown source, or as a
//! read-only preview. A marker is a named span of the active view's plain
//! text. Markspan keeps every marker on the same words while the text is
//! edited, the view is switched, or the viewport is resized.
//!
//! ## Architecture
//!
//! - **Store**: the authoritative marker set and the baseline text
//! - **Reconciler**: diffs the baseline against new text and moves markers
//! - **Views**: map abstract offsets to each surface's native positions
//! - **Coordinator**: reacts to editor events and emits marker updates
//!
//! ## Modules
//!
//! - [`marker`]: Marker types and the marker store
//! - [`reconcile`]: Prefix/suffix reconciliation
//! - [`view`]: View adapters for the three surfaces
//! - [`editor`]: In-memory host editor
//! - [`coordinator`]: Event handling, debouncing and notifications
//! - [`config`]: Saved command-line defaults
//! - [`watcher`]: File watching
//! - [`perf`]: Timing and event log

pub mod config;
pub mod coordinator;
pub mod editor;
pub mod error;
pub mod marker;
pub mod perf;
pub mod reconcile;
pub mod view;
pub mod watcher;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::coordinator::{CoordinatorOptions, MarkerCoordinator, MarkerUpdate, UpdateReason};
    pub use crate::editor::{Editor, EditorEvent};
    pub use crate::error::MarkerError;
    pub use crate::marker::{Marker, MarkerData, MarkerId, MarkerSeed, MarkerStore};
    pub use crate::view::{ViewAdapter, ViewMode};
}
