//! Host seam: what the annotation engine needs from an editor or terminal.

use std::collections::BTreeMap;

use verity_types::{AnnotationEntry, AnnotationStyle, MessageSeverity, StyleHandle};

use crate::document::DocumentId;

/// Rendering, document enumeration and messaging capabilities of a host UI.
///
/// `set_annotations` replaces, for every visible view of `document`, all
/// markers drawn with `handle` by `entries`. An empty slice removes them.
pub trait AnnotationHost {
    /// Documents currently visible. A document shown in several views may
    /// appear once per view.
    fn visible_documents(&self) -> Vec<DocumentId>;

    fn create_style(&mut self, style: &AnnotationStyle) -> StyleHandle;

    fn release_style(&mut self, handle: StyleHandle);

    fn set_annotations(
        &mut self,
        document: &DocumentId,
        handle: StyleHandle,
        entries: &[AnnotationEntry],
    );

    fn show_message(&mut self, severity: MessageSeverity, text: &str);
}

/// In-memory host that records what would be on screen.
///
/// Used by the terminal front end and by tests.
#[derive(Debug, Default)]
pub struct MemoryHost {
    documents: Vec<DocumentId>,
    styles: BTreeMap<StyleHandle, AnnotationStyle>,
    styles_created: u64,
    rendered: BTreeMap<(DocumentId, StyleHandle), Vec<AnnotationEntry>>,
    messages: Vec<(MessageSeverity, String)>,
}

impl MemoryHost {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_documents(documents: impl IntoIterator<Item = DocumentId>) -> Self {
        Self {
            documents: documents.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Show `document` in one more view.
    pub fn open(&mut self, document: DocumentId) {
        self.documents.push(document);
    }

    /// Close every view of `document` and drop what was drawn on it.
    pub fn close(&mut self, document: &DocumentId) {
        self.documents.retain(|d| d != document);
        self.rendered.retain(|(d, _), _| d != document);
    }

    /// Markers currently drawn on `document` with `handle`.
    #[must_use]
    pub fn rendered(&self, document: &DocumentId, handle: StyleHandle) -> &[AnnotationEntry] {
        self.rendered
            .get(&(document.clone(), handle))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Total markers drawn on `document`, across styles.
    #[must_use]
    pub fn rendered_count(&self, document: &DocumentId) -> usize {
        self.rendered
            .iter()
            .filter(|((d, _), _)| d == document)
            .map(|(_, entries)| entries.len())
            .sum()
    }

    #[must_use]
    pub fn style(&self, handle: StyleHandle) -> Option<&AnnotationStyle> {
        self.styles.get(&handle)
    }

    /// Styles created and not yet released.
    #[must_use]
    pub fn live_styles(&self) -> usize {
        self.styles.len()
    }

    #[must_use]
    pub fn styles_created(&self) -> u64 {
        self.styles_created
    }

    #[must_use]
    pub fn messages(&self) -> &[(MessageSeverity, String)] {
        &self.messages
    }

    pub fn take_messages(&mut self) -> Vec<(MessageSeverity, String)> {
        std::mem::take(&mut self.messages)
    }
}

impl AnnotationHost for MemoryHost {
    fn visible_documents(&self) -> Vec<DocumentId> {
        self.documents.clone()
    }

    fn create_style(&mut self, style: &AnnotationStyle) -> StyleHandle {
        self.styles_created += 1;
        let handle = StyleHandle::new(self.styles_created);
        self.styles.insert(handle, style.clone());
        handle
    }

    fn release_style(&mut self, handle: StyleHandle) {
        self.styles.remove(&handle);
        self.rendered.retain(|(_, h), _| *h != handle);
    }

    fn set_annotations(
        &mut self,
        document: &DocumentId,
        handle: StyleHandle,
        entries: &[AnnotationEntry],
    ) {
        if !self.documents.contains(document) {
            return;
        }
        let key = (document.clone(), handle);
        if entries.is_empty() {
            self.rendered.remove(&key);
        } else {
            self.rendered.insert(key, entries.to_vec());
        }
    }

    fn show_message(&mut self, severity: MessageSeverity, text: &str) {
        self.messages.push((severity, text.to_string()));
    }
}
