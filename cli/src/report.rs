//! Plain-text rendering of a finished run.
//!
//! One line per annotation, `path:line: [category] hover`, with 1-based line
//! numbers. Continuation lines of multi-line hovers are indented. Host
//! messages follow as `severity: text`.

use std::fmt::Write as _;

use verity_feedback::AnnotationStore;
use verity_types::MessageSeverity;

const CONTINUATION_INDENT: &str = "    ";

pub fn render(store: &AnnotationStore, messages: &[(MessageSeverity, String)]) -> String {
    let mut out = String::new();

    for (category, document, entry) in store.annotations() {
        let _ = write!(out, "{document}:{}: [{category}]", entry.line() + 1);
        let mut lines = entry.hover().unwrap_or_default().lines();
        if let Some(first) = lines.next() {
            let _ = write!(out, " {first}");
        }
        out.push('\n');
        for line in lines {
            let _ = writeln!(out, "{CONTINUATION_INDENT}{line}");
        }
    }

    for (severity, text) in messages {
        let _ = writeln!(out, "{severity}: {text}");
    }
    out
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use verity_feedback::{DocumentId, DocumentMatcher, MemoryHost, StyleSheet};
    use verity_types::{Location, Position, ResultEvent};

    use super::*;

    fn at(line: u32, end: u32) -> Option<Location> {
        Some(Location::new("file:///work/a.sc", Position::new(line, 1, end, 1)))
    }

    fn fixture() -> (AnnotationStore, MemoryHost) {
        (
            AnnotationStore::new(StyleSheet::default(), DocumentMatcher::new(false)),
            MemoryHost::with_documents([DocumentId::from_path(Path::new("/work/a.sc"))]),
        )
    }

    #[test]
    fn test_render_annotations_and_messages() {
        let (mut store, mut host) = fixture();
        for event in [
            ResultEvent::ProofState {
                location: at(10, 10),
                claims: "x > 0".to_string(),
            },
            ResultEvent::Coverage {
                location: at(20, 21),
            },
            ResultEvent::QueryInfo {
                location: at(4, 4),
                info: "Result: Unsat".to_string(),
                query: "(assert p)\n(check-sat)".to_string(),
            },
            ResultEvent::Report {
                location: None,
                level: 2,
                message: "deprecated syntax".to_string(),
            },
        ] {
            store.apply(&mut host, &event).unwrap();
        }

        insta::assert_snapshot!(render(&store, host.messages()), @r"
        /work/a.sc:4: [query-info] Result: Unsat
            (assert p)
            (check-sat)
        /work/a.sc:10: [proof-state] x > 0
        /work/a.sc:20: [coverage]
        /work/a.sc:21: [coverage]
        warning: deprecated syntax
        ");
    }

    #[test]
    fn test_render_empty_run() {
        let (store, _) = fixture();
        assert_eq!(render(&store, &[]), "");
    }
}
