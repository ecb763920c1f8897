//! In-memory host editor.
//!
//! Owns one document presented through three surfaces (source, rich text and
//! preview), tracks which one is active, and queues lifecycle events for the
//! marker coordinator to consume.

mod host;

pub use host::{DEFAULT_WIDTH, Editor, EditorEvent};
