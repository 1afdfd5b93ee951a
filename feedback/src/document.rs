//! Document identity and matching between producer and host.
//!
//! The analysis tool names documents with `file:` URIs while hosts usually
//! know paths. Both are normalised to one key so they can be compared, with
//! case folding on platforms whose filesystems ignore case.

use std::fmt;
use std::path::{Component, Path, PathBuf};

/// Identity of a document, normalised for comparison.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocumentId {
    key: String,
}

fn normalize_path(path: &Path) -> PathBuf {
    let mut out = Vec::new();
    for c in path.components() {
        match c {
            Component::ParentDir => {
                out.pop();
            }
            Component::CurDir => {}
            other => out.push(other),
        }
    }
    out.iter().collect()
}

/// Windows drive letters (`C:\x`) parse as a one-letter URL scheme.
fn is_uri(raw: &str) -> bool {
    raw.find(':').is_some_and(|i| i > 1)
}

impl DocumentId {
    /// Build from the producer's identifier: a `file:` URI, another URI, or a
    /// bare path.
    #[must_use]
    pub fn from_uri(raw: &str) -> Self {
        if !is_uri(raw) {
            return Self::from_path(Path::new(raw));
        }
        match url::Url::parse(raw) {
            Ok(url) if url.scheme() == "file" => match url.to_file_path() {
                Ok(path) => Self::from_path(&path),
                Err(()) => Self {
                    key: url.to_string(),
                },
            },
            Ok(url) => Self {
                key: url.to_string(),
            },
            Err(_) => Self {
                key: raw.to_string(),
            },
        }
    }

    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        Self {
            key: normalize_path(path).to_string_lossy().into_owned(),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

impl From<&Path> for DocumentId {
    fn from(path: &Path) -> Self {
        Self::from_path(path)
    }
}

/// Compares document identities, optionally ignoring case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentMatcher {
    case_insensitive: bool,
}

impl DocumentMatcher {
    #[must_use]
    pub const fn new(case_insensitive: bool) -> Self {
        Self { case_insensitive }
    }

    /// Case-insensitive on Windows and macOS, exact elsewhere.
    #[must_use]
    pub const fn platform_default() -> Self {
        Self::new(cfg!(any(windows, target_os = "macos")))
    }

    #[must_use]
    pub const fn is_case_insensitive(self) -> bool {
        self.case_insensitive
    }

    #[must_use]
    pub fn matches(self, a: &DocumentId, b: &DocumentId) -> bool {
        if self.case_insensitive {
            a.key.to_lowercase() == b.key.to_lowercase()
        } else {
            a.key == b.key
        }
    }

    /// Key under which per-document state is remembered.
    #[must_use]
    pub fn key(self, document: &DocumentId) -> String {
        if self.case_insensitive {
            document.key.to_lowercase()
        } else {
            document.key.clone()
        }
    }
}

impl Default for DocumentMatcher {
    fn default() -> Self {
        Self::platform_default()
    }
}
