//! Core domain types for Verity.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Decoding lives in `verity-feedback`; everything here is what a decoded result
//! looks like and what an annotation on a document is made of.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory

mod annotation;
pub use annotation::{AnnotationEntry, AnnotationStyle, IconPair, LineRange, StyleHandle};

use serde::Serialize;
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;
use thiserror::Error;

// ============================================================================
// Categories
// ============================================================================

/// Analysis category of a result event.
///
/// Each category has its own rendering rule and its own annotation bucket.
/// The set is open-ended on the wire; tags outside this list decode to
/// [`ResultEvent::Unrecognized`] rather than to a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    QueryInfo,
    ProofState,
    VerificationInfo,
    Coverage,
    Report,
}

#[derive(Debug, Error)]
#[error("unknown result category: {0}")]
pub struct UnknownCategory(String);

impl Category {
    pub const ALL: [Category; 5] = [
        Category::QueryInfo,
        Category::ProofState,
        Category::VerificationInfo,
        Category::Coverage,
        Category::Report,
    ];

    /// Discriminator used by the analysis tool in result files.
    #[must_use]
    pub const fn wire_tag(self) -> &'static str {
        match self {
            Self::QueryInfo => "Logika.Verify.Smt2Query",
            Self::ProofState => "Logika.Verify.State",
            Self::VerificationInfo => "Logika.Verify.Info",
            Self::Coverage => "Analysis.Coverage",
            Self::Report => "Report",
        }
    }

    #[must_use]
    pub fn from_wire_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.wire_tag() == tag)
    }

    /// Short human-readable name (also the `FromStr` spelling).
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::QueryInfo => "query-info",
            Self::ProofState => "proof-state",
            Self::VerificationInfo => "verification-info",
            Self::Coverage => "coverage",
            Self::Report => "report",
        }
    }

    /// Point categories put one gutter marker on the first reported line.
    #[must_use]
    pub const fn is_point(self) -> bool {
        matches!(
            self,
            Self::QueryInfo | Self::ProofState | Self::VerificationInfo
        )
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.label() == s)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

// ============================================================================
// Positions
// ============================================================================

/// A span as reported by the analysis tool: 1-based lines and columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    begin_line: u32,
    begin_column: u32,
    end_line: u32,
    end_column: u32,
}

impl Position {
    #[must_use]
    pub const fn new(begin_line: u32, begin_column: u32, end_line: u32, end_column: u32) -> Self {
        Self {
            begin_line,
            begin_column,
            end_line,
            end_column,
        }
    }

    #[must_use]
    pub const fn begin_line(&self) -> u32 {
        self.begin_line
    }

    #[must_use]
    pub const fn begin_column(&self) -> u32 {
        self.begin_column
    }

    #[must_use]
    pub const fn end_line(&self) -> u32 {
        self.end_line
    }

    #[must_use]
    pub const fn end_column(&self) -> u32 {
        self.end_column
    }

    /// 0-indexed first line.
    #[must_use]
    pub const fn first_line(&self) -> u32 {
        self.begin_line.saturating_sub(1)
    }

    /// 0-indexed lines covered by this span.
    ///
    /// An inverted span (end before begin) collapses to its first line.
    #[must_use]
    pub fn lines(&self) -> RangeInclusive<u32> {
        let first = self.first_line();
        let last = self.end_line.saturating_sub(1).max(first);
        first..=last
    }

    /// Number of lines in [`Position::lines`]; at least 1.
    #[must_use]
    pub fn line_count(&self) -> u32 {
        let lines = self.lines();
        lines.end() - lines.start() + 1
    }
}

/// Where a result points: the producer's document identifier plus a span.
///
/// `document` is kept exactly as produced (usually a `file:` URI); matching it
/// against open documents is the consumer's job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Location {
    document: String,
    position: Position,
}

impl Location {
    #[must_use]
    pub fn new(document: impl Into<String>, position: Position) -> Self {
        Self {
            document: document.into(),
            position,
        }
    }

    #[must_use]
    pub fn document(&self) -> &str {
        &self.document
    }

    #[must_use]
    pub fn position(&self) -> Position {
        self.position
    }
}

// ============================================================================
// Result events
// ============================================================================

/// One decoded result file.
///
/// Constructed fresh per file and discarded once applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "category", rename_all = "kebab-case")]
pub enum ResultEvent {
    QueryInfo {
        location: Option<Location>,
        info: String,
        query: String,
    },
    ProofState {
        location: Option<Location>,
        claims: String,
    },
    VerificationInfo {
        location: Option<Location>,
        message: String,
    },
    Coverage {
        location: Option<Location>,
    },
    Report {
        location: Option<Location>,
        level: i64,
        message: String,
    },
    /// A discriminator this build does not know. Logged and ignored.
    Unrecognized { kind: String },
}

impl ResultEvent {
    /// `None` for [`ResultEvent::Unrecognized`].
    #[must_use]
    pub fn category(&self) -> Option<Category> {
        match self {
            Self::QueryInfo { .. } => Some(Category::QueryInfo),
            Self::ProofState { .. } => Some(Category::ProofState),
            Self::VerificationInfo { .. } => Some(Category::VerificationInfo),
            Self::Coverage { .. } => Some(Category::Coverage),
            Self::Report { .. } => Some(Category::Report),
            Self::Unrecognized { .. } => None,
        }
    }

    #[must_use]
    pub fn location(&self) -> Option<&Location> {
        match self {
            Self::QueryInfo { location, .. }
            | Self::ProofState { location, .. }
            | Self::VerificationInfo { location, .. }
            | Self::Coverage { location }
            | Self::Report { location, .. } => location.as_ref(),
            Self::Unrecognized { .. } => None,
        }
    }

    /// Hover text shown on the gutter marker of a point event.
    #[must_use]
    pub fn hover_text(&self) -> Option<String> {
        match self {
            Self::QueryInfo { info, query, .. } => Some(format!("{info}\n{query}")),
            Self::ProofState { claims, .. } => Some(claims.clone()),
            Self::VerificationInfo { message, .. } => Some(message.clone()),
            Self::Coverage { .. } | Self::Report { .. } | Self::Unrecognized { .. } => None,
        }
    }
}

// ============================================================================
// User messages
// ============================================================================

/// Severity of a transient message shown by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageSeverity {
    Error,
    Warning,
    Info,
}

impl MessageSeverity {
    /// Map a report level: 1 is an error, 2 a warning, anything else informational.
    #[must_use]
    pub const fn from_level(level: i64) -> Self {
        match level {
            1 => Self::Error,
            2 => Self::Warning,
            _ => Self::Info,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

impl fmt::Display for MessageSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
