//! Generated-representation snapshots.
//!
//! Each open document has at most one [`Snapshot`]: the converter's latest
//! output plus the metadata needed to query the engine and translate its
//! results back. Snapshots are replaced wholesale on every document update;
//! a snapshot whose `source_version` trails the document is stale and must
//! not be used.

use std::sync::Arc;

use dashmap::DashMap;
use tower_lsp::lsp_types::Url;
use tracing::{debug, warn};

use crate::convert::{Converter, GeneratedKind};

use super::store::Document;
use super::text::LineIndex;

/// Engine-visible name for a document's generated representation.
///
/// Deterministic suffixing keeps distinct originals distinct and lets the
/// registry map engine file names back to documents.
pub fn generated_file_name(path: &str) -> String {
    format!("{path}.gen")
}

/// The generated representation of one document version.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Document version this snapshot was derived from.
    pub source_version: i32,
    /// Structural kind of the generated text.
    pub kind: GeneratedKind,
    /// Raw position-map artifact (JSON) from the converter, if any.
    pub raw_map: Option<String>,
    /// Line index over the generated text.
    pub line_index: LineIndex,
}

impl Snapshot {
    /// The generated text.
    pub fn generated_text(&self) -> &str {
        self.line_index.source()
    }

    /// Length of the generated text in bytes.
    pub fn generated_len(&self) -> usize {
        self.line_index.len()
    }

    /// Snapshot standing in for a failed conversion: empty text, no map.
    fn empty(source_version: i32) -> Self {
        Self {
            source_version,
            kind: GeneratedKind::Script,
            raw_map: None,
            line_index: LineIndex::new(String::new()),
        }
    }
}

/// Per-document snapshot storage, keyed by original URI.
#[derive(Debug, Default)]
pub struct SnapshotCache {
    snapshots: DashMap<Url, Arc<Snapshot>>,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self {
            snapshots: DashMap::new(),
        }
    }

    /// Reconvert `doc` and replace its stored snapshot.
    ///
    /// Always runs the converter, even when the version is unchanged; the
    /// converter is cheap next to the cost of serving stale generated text.
    /// Conversion failure is logged and degrades to an empty snapshot so
    /// downstream engine queries return empty results instead of erroring.
    pub fn update(&self, doc: &Document, converter: &dyn Converter) -> Arc<Snapshot> {
        let snapshot = match converter.convert(doc.text(), doc.path()) {
            Ok(out) => {
                debug!(
                    uri = %doc.uri,
                    version = doc.version,
                    kind = ?out.kind,
                    mapped = out.map.is_some(),
                    "converted document"
                );
                Snapshot {
                    source_version: doc.version,
                    kind: out.kind,
                    raw_map: out.map,
                    line_index: LineIndex::new(out.generated_text),
                }
            }
            Err(err) => {
                warn!(uri = %doc.uri, version = doc.version, %err, "conversion failed");
                Snapshot::empty(doc.version)
            }
        };

        let snapshot = Arc::new(snapshot);
        self.snapshots.insert(doc.uri.clone(), Arc::clone(&snapshot));
        snapshot
    }

    /// Pure lookup, no recomputation. Used by the engine's file-system
    /// callbacks.
    pub fn get(&self, uri: &Url) -> Option<Arc<Snapshot>> {
        self.snapshots.get(uri).map(|r| Arc::clone(&r))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::{ConvertError, ConvertOutput};

    struct UpperConverter;

    impl Converter for UpperConverter {
        fn convert(&self, text: &str, _path: &str) -> Result<ConvertOutput, ConvertError> {
            Ok(ConvertOutput {
                generated_text: text.to_uppercase(),
                kind: GeneratedKind::Script,
                map: None,
            })
        }
    }

    struct FailingConverter;

    impl Converter for FailingConverter {
        fn convert(&self, _text: &str, path: &str) -> Result<ConvertOutput, ConvertError> {
            Err(ConvertError::UnsupportedFormat(path.to_string()))
        }
    }

    fn doc(text: &str, version: i32) -> Document {
        Document::new(
            Url::parse("file:///a.src").unwrap(),
            text.to_string(),
            version,
        )
    }

    #[test]
    fn update_replaces_snapshot() {
        let cache = SnapshotCache::new();
        let converter = UpperConverter;

        cache.update(&doc("one", 0), &converter);
        cache.update(&doc("two", 1), &converter);

        let snap = cache.get(&Url::parse("file:///a.src").unwrap()).unwrap();
        assert_eq!(snap.source_version, 1);
        assert_eq!(snap.generated_text(), "TWO");
    }

    #[test]
    fn conversion_failure_degrades_to_empty() {
        let cache = SnapshotCache::new();
        let snap = cache.update(&doc("anything", 3), &FailingConverter);

        assert_eq!(snap.source_version, 3);
        assert_eq!(snap.generated_len(), 0);
        assert!(snap.raw_map.is_none());
    }

    #[test]
    fn get_does_not_recompute() {
        let cache = SnapshotCache::new();
        assert!(cache.get(&Url::parse("file:///missing.src").unwrap()).is_none());
    }

    #[test]
    fn generated_names_are_stable_and_distinct() {
        assert_eq!(generated_file_name("/p/a.src"), "/p/a.src.gen");
        assert_ne!(generated_file_name("/p/a.src"), generated_file_name("/p/b.src"));
    }
}
