//! Open-document tracking.
//!
//! The bridge never mutates document text; it records the latest version the
//! client handed over so snapshots and position maps can be validated
//! against it.

use std::sync::Arc;

use dashmap::DashMap;
use tower_lsp::lsp_types::Url;

use super::snapshot::generated_file_name;
use super::text::LineIndex;

/// An open original document as last reported by the client.
#[derive(Debug)]
pub struct Document {
    pub uri: Url,
    /// Monotonically increasing client version.
    pub version: i32,
    /// Line index over the original text.
    pub line_index: LineIndex,
}

impl Document {
    pub fn new(uri: Url, text: String, version: i32) -> Self {
        Self {
            uri,
            version,
            line_index: LineIndex::new(text),
        }
    }

    /// The original text.
    pub fn text(&self) -> &str {
        self.line_index.source()
    }

    /// Filesystem-style path of the document, used for project resolution
    /// and generated-file naming.
    pub fn path(&self) -> &str {
        self.uri.path()
    }
}

/// Thread-safe storage for open documents, last-write-wins per URI.
#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: DashMap<Url, Arc<Document>>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self {
            documents: DashMap::new(),
        }
    }

    /// Open or update a document with the given source text.
    pub fn open(&self, uri: Url, text: String, version: i32) -> Arc<Document> {
        let doc = Arc::new(Document::new(uri.clone(), text, version));
        self.documents.insert(uri, Arc::clone(&doc));
        doc
    }

    /// Close a document.
    pub fn close(&self, uri: &Url) {
        self.documents.remove(uri);
    }

    /// Get a document's latest state.
    pub fn get(&self, uri: &Url) -> Option<Arc<Document>> {
        self.documents.get(uri).map(|r| Arc::clone(&r))
    }

    /// Find the open document whose generated representation has the given
    /// engine-visible name.
    pub fn find_by_generated_name(&self, generated_name: &str) -> Option<Arc<Document>> {
        self.documents
            .iter()
            .find(|entry| generated_file_name(entry.key().path()) == generated_name)
            .map(|entry| Arc::clone(&entry))
    }

    /// Find an open document by its filesystem-style path.
    pub fn find_by_path(&self, path: &str) -> Option<Arc<Document>> {
        self.documents
            .iter()
            .find(|entry| entry.key().path() == path)
            .map(|entry| Arc::clone(&entry))
    }
}
