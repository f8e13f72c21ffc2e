//! Open document storage for the cell tracker.

use dashmap::DashMap;
use tower_lsp::lsp_types::{Position, Range, TextDocumentContentChangeEvent, Url};

use crate::cells::LineEdit;
use crate::tracker::DocumentSource;

use super::text::LineIndex;

/// Thread-safe storage for open documents, keyed by document key.
#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: DashMap<String, String>,
}

impl DocumentStore {
    /// Create a new empty document store.
    pub fn new() -> Self {
        Self {
            documents: DashMap::new(),
        }
    }

    /// Open or replace a document.
    pub fn open(&self, key: impl Into<String>, text: String) {
        self.documents.insert(key.into(), text);
    }

    /// Close a document.
    pub fn close(&self, key: &str) {
        self.documents.remove(key);
    }

    /// Apply `didChange` content changes in order and return them as line
    /// edits, each in the coordinates valid when it was applied.
    ///
    /// A change without a range replaces the whole text and is reported as
    /// an edit spanning the entire previous document. Returns `None` if the
    /// document is not open.
    pub fn apply_changes(
        &self,
        key: &str,
        changes: Vec<TextDocumentContentChangeEvent>,
    ) -> Option<Vec<LineEdit>> {
        let mut doc = self.documents.get_mut(key)?;
        let mut text = std::mem::take(&mut *doc);
        let mut edits = Vec::with_capacity(changes.len());

        for change in changes {
            let index = LineIndex::new(text);
            match change.range {
                Some(range) => {
                    text = index.splice(range, &change.text);
                    edits.push(LineEdit::new(range, change.text));
                }
                None => {
                    let whole = Range::new(Position::new(0, 0), index.end_position());
                    edits.push(LineEdit::new(whole, change.text.clone()));
                    text = change.text;
                }
            }
        }

        *doc = text;
        Some(edits)
    }
}

impl DocumentSource for DocumentStore {
    fn text(&self, file: &str) -> Option<String> {
        self.documents.get(file).map(|doc| doc.clone())
    }
}

/// Stable key for a document: the file path for `file:` URIs, the URI
/// itself otherwise.
pub fn document_key(uri: &Url) -> String {
    if uri.scheme() == "file" {
        if let Ok(path) = uri.to_file_path() {
            return path.display().to_string();
        }
    }
    uri.to_string()
}

/// Normalise a key supplied by an execution engine, which may be either a
/// path or a `file:` URI.
pub fn normalize_key(file: &str) -> String {
    match Url::parse(file) {
        Ok(uri) if uri.scheme() == "file" => document_key(&uri),
        _ => file.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn change(start: (u32, u32), end: (u32, u32), text: &str) -> TextDocumentContentChangeEvent {
        TextDocumentContentChangeEvent {
            range: Some(Range::new(
                Position::new(start.0, start.1),
                Position::new(end.0, end.1),
            )),
            range_length: None,
            text: text.to_string(),
        }
    }

    #[test]
    fn incremental_changes_apply_in_order() {
        let store = DocumentStore::new();
        store.open("a.py", "#%%\nx = 1\n".to_string());

        let edits = store
            .apply_changes(
                "a.py",
                vec![change((0, 0), (0, 0), "import os\n"), change((2, 4), (2, 5), "2")],
            )
            .unwrap();

        assert_eq!(edits.len(), 2);
        assert_eq!(edits[0], LineEdit::insert(0, 0, "import os\n"));
        assert_eq!(store.text("a.py").as_deref(), Some("import os\n#%%\nx = 2\n"));
    }

    #[test]
    fn full_change_spans_previous_text() {
        let store = DocumentStore::new();
        store.open("a.py", "a\nbc".to_string());

        let edits = store
            .apply_changes(
                "a.py",
                vec![TextDocumentContentChangeEvent {
                    range: None,
                    range_length: None,
                    text: "new".to_string(),
                }],
            )
            .unwrap();

        assert_eq!(edits, vec![LineEdit::replace((0, 0), (1, 2), "new")]);
        assert_eq!(store.text("a.py").as_deref(), Some("new"));
    }

    #[test]
    fn changes_to_closed_document_are_ignored() {
        let store = DocumentStore::new();
        assert!(store.apply_changes("nope.py", vec![]).is_none());
    }

    #[test]
    fn line_count_ignores_trailing_newline() {
        let store = DocumentStore::new();
        store.open("a.py", "a\nb\n".to_string());
        assert_eq!(store.line_count("a.py"), Some(2));
    }

    #[test]
    fn file_uris_become_paths() {
        let uri = Url::parse("file:///tmp/notebook.py").unwrap();
        assert_eq!(document_key(&uri), "/tmp/notebook.py");
        assert_eq!(normalize_key("file:///tmp/notebook.py"), "/tmp/notebook.py");
        assert_eq!(normalize_key("/tmp/notebook.py"), "/tmp/notebook.py");
        let untitled = Url::parse("untitled:Untitled-1").unwrap();
        assert_eq!(document_key(&untitled), "untitled:Untitled-1");
    }
}
