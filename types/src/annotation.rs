//! Annotation primitives shared by the store and its hosts.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Opaque handle to a visual style created by the host.
///
/// All entries of one category share a single handle, so one
/// `set_annotations` call redraws every marker of that kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct StyleHandle(u64);

impl StyleHandle {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for StyleHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "style#{}", self.0)
    }
}

/// Gutter icons for light and dark themes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IconPair {
    pub light: PathBuf,
    pub dark: PathBuf,
}

/// How every marker of one category looks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnnotationStyle {
    pub icons: Option<IconPair>,
    /// CSS-like size for the gutter icon (e.g. "75%"). Only meaningful with icons.
    pub icon_size: Option<String>,
    /// Background and overview-ruler tint (e.g. `rgba(129, 62, 200, 0.2)`).
    pub background: Option<String>,
    pub whole_line: bool,
    /// Whether entries of this style carry hover text.
    pub hover: bool,
}

/// 0-indexed line/column span in a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct LineRange {
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
}

impl LineRange {
    /// Zero-width range at the start of `line`; rendered whole-line by the style.
    #[must_use]
    pub const fn line(line: u32) -> Self {
        Self {
            start_line: line,
            start_col: 0,
            end_line: line,
            end_col: 0,
        }
    }
}

/// One visual marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnotationEntry {
    range: LineRange,
    hover: Option<String>,
}

impl AnnotationEntry {
    #[must_use]
    pub fn new(range: LineRange, hover: Option<String>) -> Self {
        Self { range, hover }
    }

    #[must_use]
    pub fn range(&self) -> LineRange {
        self.range
    }

    /// 0-indexed first line.
    #[must_use]
    pub fn line(&self) -> u32 {
        self.range.start_line
    }

    #[must_use]
    pub fn hover(&self) -> Option<&str> {
        self.hover.as_deref()
    }
}
