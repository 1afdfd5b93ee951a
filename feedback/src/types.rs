//! Run-level types shared between the watcher, the lifecycle and front ends.

use std::path::PathBuf;

use verity_types::ResultEvent;

use crate::document::DocumentMatcher;
use crate::style::StyleSheet;

/// Directory name under the system temp dir used when no root is configured.
pub const DEFAULT_ROOT_DIR_NAME: &str = "verity-feedback";

/// A decoded result file, tagged with the run that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackEvent {
    pub generation: u64,
    /// Path of the result file the event was read from.
    pub source: PathBuf,
    pub event: ResultEvent,
}

/// How the external tool finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Exited(i32),
    /// Terminated without an exit code (e.g. killed by a signal).
    Signaled,
}

impl RunOutcome {
    #[must_use]
    pub const fn success(self) -> bool {
        matches!(self, Self::Exited(0))
    }
}

/// Messages shown when a run ends with a known outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub success: String,
    pub failure: String,
}

impl Default for RunSummary {
    fn default() -> Self {
        Self {
            success: "Logika verified".to_string(),
            failure: "Ill-formed program".to_string(),
        }
    }
}

/// Knobs for a [`crate::RunLifecycle`].
#[derive(Debug, Clone)]
pub struct FeedbackOptions {
    /// Parent of the per-run directories.
    pub root: PathBuf,
    /// Delete result files once they have been decoded and forwarded.
    pub delete_processed: bool,
    pub matcher: DocumentMatcher,
    pub styles: StyleSheet,
    /// `None` disables the end-of-run message.
    pub summary: Option<RunSummary>,
}

impl Default for FeedbackOptions {
    fn default() -> Self {
        Self {
            root: std::env::temp_dir().join(DEFAULT_ROOT_DIR_NAME),
            delete_processed: true,
            matcher: DocumentMatcher::platform_default(),
            styles: StyleSheet::default(),
            summary: None,
        }
    }
}
