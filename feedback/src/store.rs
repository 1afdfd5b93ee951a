//! Annotation store. Accumulates per-category markers for the current run.
//!
//! Every category draws with one host style. Entries accumulate for the
//! whole run and each redraw pushes the full list for a document, so the
//! host never has to merge.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use verity_types::{
    AnnotationEntry, Category, LineRange, Location, MessageSeverity, ResultEvent, StyleHandle,
};

use crate::document::{DocumentId, DocumentMatcher};
use crate::host::AnnotationHost;
use crate::style::StyleSheet;

/// Widest coverage span accepted from one record, in lines.
pub const MAX_COVERAGE_SPAN: u32 = 100_000;

#[derive(Debug, thiserror::Error)]
pub enum ApplyError {
    /// Reports are unanchored by contract; one with a location is a
    /// producer bug and is not rendered.
    #[error("report carries a location in {document}")]
    ReportWithLocation { document: String },
    #[error("coverage span of {lines} lines in {document} exceeds {}", MAX_COVERAGE_SPAN)]
    CoverageSpanTooLarge { document: String, lines: u32 },
}

#[derive(Debug)]
struct Bucket {
    handle: StyleHandle,
    entries: Vec<(DocumentId, AnnotationEntry)>,
}

/// Per-run annotation state.
#[derive(Debug)]
pub struct AnnotationStore {
    styles: StyleSheet,
    matcher: DocumentMatcher,
    buckets: BTreeMap<Category, Bucket>,
    /// Matcher key → 0-indexed lines already tinted.
    coverage_lines: HashMap<String, BTreeSet<u32>>,
}

impl AnnotationStore {
    #[must_use]
    pub fn new(styles: StyleSheet, matcher: DocumentMatcher) -> Self {
        Self {
            styles,
            matcher,
            buckets: BTreeMap::new(),
            coverage_lines: HashMap::new(),
        }
    }

    /// Apply one decoded event and redraw the documents it touched.
    ///
    /// Returns the number of entries added.
    pub fn apply<H: AnnotationHost + ?Sized>(
        &mut self,
        host: &mut H,
        event: &ResultEvent,
    ) -> Result<usize, ApplyError> {
        let category = match event.category() {
            Some(category) => category,
            None => {
                if let ResultEvent::Unrecognized { kind } = event {
                    tracing::debug!(kind = %kind, "Ignoring unrecognized result");
                }
                return Ok(0);
            }
        };

        if let ResultEvent::Report {
            location,
            level,
            message,
        } = event
        {
            if let Some(location) = location {
                tracing::error!(
                    document = %location.document(),
                    line = location.position().begin_line(),
                    "Report result carries a location; not rendered"
                );
                return Err(ApplyError::ReportWithLocation {
                    document: location.document().to_string(),
                });
            }
            host.show_message(MessageSeverity::from_level(*level), message);
            return Ok(0);
        }

        let Some(location) = event.location() else {
            tracing::debug!(category = %category, "Result has no location; skipped");
            return Ok(0);
        };
        let lines = location.position().line_count();
        if category == Category::Coverage && lines > MAX_COVERAGE_SPAN {
            tracing::warn!(
                document = %location.document(),
                lines,
                "Coverage span too large; not rendered"
            );
            return Err(ApplyError::CoverageSpanTooLarge {
                document: location.document().to_string(),
                lines,
            });
        }
        let targets = self.visible_targets(host, location);
        if targets.is_empty() {
            tracing::debug!(
                document = %location.document(),
                category = %category,
                "Result for a document that is not visible; dropped"
            );
            return Ok(0);
        }

        let added = if category == Category::Coverage {
            self.add_coverage(host, location, &targets)
        } else {
            let range = LineRange::line(location.position().first_line());
            let hover = event.hover_text();
            let bucket = self.bucket(host, category);
            for document in &targets {
                bucket
                    .entries
                    .push((document.clone(), AnnotationEntry::new(range, hover.clone())));
            }
            targets.len()
        };

        if added > 0 {
            for document in &targets {
                self.redraw(host, document);
            }
        }
        Ok(added)
    }

    fn add_coverage<H: AnnotationHost + ?Sized>(
        &mut self,
        host: &mut H,
        location: &Location,
        targets: &[DocumentId],
    ) -> usize {
        let key = self
            .matcher
            .key(&DocumentId::from_uri(location.document()));
        let covered = self.coverage_lines.entry(key).or_default();
        let fresh: Vec<u32> = location
            .position()
            .lines()
            .filter(|line| covered.insert(*line))
            .collect();
        if fresh.is_empty() {
            return 0;
        }

        let bucket = self.bucket(host, Category::Coverage);
        for document in targets {
            for line in &fresh {
                bucket
                    .entries
                    .push((document.clone(), AnnotationEntry::new(LineRange::line(*line), None)));
            }
        }
        fresh.len() * targets.len()
    }

    /// Distinct visible documents that `location` refers to.
    fn visible_targets<H: AnnotationHost + ?Sized>(
        &self,
        host: &H,
        location: &Location,
    ) -> Vec<DocumentId> {
        let wanted = DocumentId::from_uri(location.document());
        let mut targets: Vec<DocumentId> = Vec::new();
        for document in host.visible_documents() {
            if self.matcher.matches(&document, &wanted) && !targets.contains(&document) {
                targets.push(document);
            }
        }
        targets
    }

    /// Bucket for `category`, creating its host style on first use.
    fn bucket<H: AnnotationHost + ?Sized>(&mut self, host: &mut H, category: Category) -> &mut Bucket {
        let styles = &self.styles;
        self.buckets.entry(category).or_insert_with(|| {
            let handle = host.create_style(&styles.style(category));
            tracing::debug!(category = %category, handle = %handle, "Created annotation style");
            Bucket {
                handle,
                entries: Vec::new(),
            }
        })
    }

    /// Push every accumulated entry for `document` to the host, per category.
    pub fn redraw<H: AnnotationHost + ?Sized>(&self, host: &mut H, document: &DocumentId) {
        for bucket in self.buckets.values() {
            let entries: Vec<AnnotationEntry> = bucket
                .entries
                .iter()
                .filter(|(d, _)| d == document)
                .map(|(_, entry)| entry.clone())
                .collect();
            host.set_annotations(document, bucket.handle, &entries);
        }
    }

    /// Remove every marker from every visible document and release all styles.
    ///
    /// Safe to call repeatedly; a second call finds nothing to do.
    pub fn clear_all<H: AnnotationHost + ?Sized>(&mut self, host: &mut H) {
        if !self.buckets.is_empty() {
            let documents = host.visible_documents();
            for bucket in self.buckets.values() {
                for document in &documents {
                    host.set_annotations(document, bucket.handle, &[]);
                }
            }
            for (category, bucket) in std::mem::take(&mut self.buckets) {
                tracing::debug!(
                    category = %category,
                    count = bucket.entries.len(),
                    "Released annotation style"
                );
                host.release_style(bucket.handle);
            }
        }
        self.coverage_lines.clear();
    }

    #[must_use]
    pub fn entries(&self, category: Category) -> &[(DocumentId, AnnotationEntry)] {
        self.buckets
            .get(&category)
            .map(|b| b.entries.as_slice())
            .unwrap_or(&[])
    }

    #[must_use]
    pub fn handle(&self, category: Category) -> Option<StyleHandle> {
        self.buckets.get(&category).map(|b| b.handle)
    }

    /// Lines of `document` already tinted as covered.
    #[must_use]
    pub fn coverage_lines(&self, document: &DocumentId) -> Option<&BTreeSet<u32>> {
        self.coverage_lines.get(&self.matcher.key(document))
    }

    /// Categories holding a live style, in category order.
    pub fn categories(&self) -> impl Iterator<Item = Category> + '_ {
        self.buckets.keys().copied()
    }

    /// Every entry, ordered by category then insertion.
    pub fn annotations(&self) -> impl Iterator<Item = (Category, &DocumentId, &AnnotationEntry)> {
        self.buckets.iter().flat_map(|(category, bucket)| {
            bucket
                .entries
                .iter()
                .map(move |(document, entry)| (*category, document, entry))
        })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.values().all(|b| b.entries.is_empty()) && self.coverage_lines.is_empty()
    }

    /// Total entries across categories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.values().map(|b| b.entries.len()).sum()
    }
}
