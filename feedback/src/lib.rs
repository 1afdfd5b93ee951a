//! Feedback ingestion for external analysis runs.
//!
//! An analysis tool drops one JSON result file per finding into a run-scoped
//! directory. This crate watches that directory, decodes each file into a
//! [`verity_types::ResultEvent`], and keeps the per-category annotations of
//! the host's open documents up to date. [`RunLifecycle`] is the entry point.

pub mod decode;
pub mod document;
pub mod host;
pub mod types;

pub(crate) mod store;
pub(crate) mod style;
pub(crate) mod watcher;

mod lifecycle;

pub use decode::{DecodeError, decode};
pub use document::{DocumentId, DocumentMatcher};
pub use host::{AnnotationHost, MemoryHost};
pub use lifecycle::RunLifecycle;
pub use store::{AnnotationStore, ApplyError, MAX_COVERAGE_SPAN};
pub use style::StyleSheet;
pub use types::{FeedbackEvent, FeedbackOptions, RunOutcome, RunSummary};
pub use watcher::{FeedbackWatcher, WatchError};
