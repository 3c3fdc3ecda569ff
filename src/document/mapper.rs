//! Bidirectional position mapping between original and generated text.
//!
//! The converter's map artifact is an opaque JSON document. It is parsed at
//! most once per document version (see [`PositionMapper::ensure_map`]) and
//! queried synchronously after that. Map entries use 1-based line/column
//! coordinates; the public contract is 0-based byte offsets, and this module
//! owns the conversion at that boundary.
//!
//! Missing data is never an error here: no artifact means identity fallback,
//! and a position with no corresponding entry falls back to its line/column
//! conversion alone.

use std::sync::Arc;

use dashmap::DashMap;
use serde::Deserialize;
use tower_lsp::lsp_types::Url;
use tracing::warn;

use super::snapshot::Snapshot;
use super::store::Document;
use super::text::{LineCol, LineIndex};

/// One correspondence between the representations, 1-based lines/columns.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapEntry {
    pub original_line: u32,
    pub original_column: u32,
    pub generated_line: u32,
    pub generated_column: u32,
}

impl MapEntry {
    fn original(&self) -> LineCol {
        LineCol::new(self.original_line, self.original_column)
    }

    fn generated(&self) -> LineCol {
        LineCol::new(self.generated_line, self.generated_column)
    }
}

#[derive(Debug, Deserialize)]
struct RawMap {
    entries: Vec<MapEntry>,
}

/// A parsed map artifact, sorted for nearest-entry lookup in both
/// directions.
#[derive(Debug)]
pub struct ParsedMap {
    by_original: Vec<MapEntry>,
    by_generated: Vec<MapEntry>,
}

impl ParsedMap {
    /// Parse the raw JSON artifact.
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        let raw: RawMap = serde_json::from_str(raw)?;
        let mut by_original = raw.entries.clone();
        by_original.sort_by_key(MapEntry::original);
        let mut by_generated = raw.entries;
        by_generated.sort_by_key(MapEntry::generated);
        Ok(Self {
            by_original,
            by_generated,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.by_original.is_empty()
    }

    /// Nearest entry at or before `pos` on the same original-side line.
    fn lookup_original(&self, pos: LineCol) -> Option<&MapEntry> {
        nearest_on_line(&self.by_original, pos, |e| e.original())
    }

    /// Nearest entry at or before `pos` on the same generated-side line.
    fn lookup_generated(&self, pos: LineCol) -> Option<&MapEntry> {
        nearest_on_line(&self.by_generated, pos, |e| e.generated())
    }
}

/// Last entry whose key is `<= pos`, provided it sits on the same line.
///
/// Entries on earlier lines are not a usable anchor: their column delta is
/// meaningless across a line break, so such queries take the line/column
/// fallback instead.
fn nearest_on_line(
    entries: &[MapEntry],
    pos: LineCol,
    key: impl Fn(&MapEntry) -> LineCol,
) -> Option<&MapEntry> {
    let idx = entries.partition_point(|e| key(e) <= pos);
    let entry = entries[..idx].last()?;
    (key(entry).line == pos.line).then_some(entry)
}

/// Parsed-map cache slot for one document.
#[derive(Debug, Clone)]
struct MapCacheEntry {
    source_version: i32,
    /// `None` records "no usable map for this version" so a failed or absent
    /// artifact is not re-parsed on every query.
    map: Option<Arc<ParsedMap>>,
}

/// Translates offsets between a document and its generated representation.
///
/// Construction of the parsed map is the one suspending phase: callers run
/// [`PositionMapper::ensure_map`] for the snapshot they are about to query,
/// then translate synchronously against the cached result.
#[derive(Debug, Default)]
pub struct PositionMapper {
    cache: DashMap<Url, MapCacheEntry>,
}

impl PositionMapper {
    pub fn new() -> Self {
        Self {
            cache: DashMap::new(),
        }
    }

    /// Parse (or reuse) the map for this document version.
    ///
    /// Parsing runs on the blocking pool; artifacts can be large. A missing
    /// or malformed artifact caches as `None`, which downgrades every
    /// translation for that version to the identity fallback.
    pub async fn ensure_map(&self, doc: &Document, snapshot: &Snapshot) -> Option<Arc<ParsedMap>> {
        if let Some(entry) = self.cache.get(&doc.uri) {
            if entry.source_version == snapshot.source_version {
                return entry.map.clone();
            }
        }

        let map = match &snapshot.raw_map {
            None => None,
            Some(raw) => {
                let raw = raw.clone();
                match tokio::task::spawn_blocking(move || ParsedMap::parse(&raw)).await {
                    Ok(Ok(parsed)) => Some(Arc::new(parsed)),
                    Ok(Err(err)) => {
                        warn!(uri = %doc.uri, %err, "discarding unparsable position map");
                        None
                    }
                    Err(err) => {
                        warn!(uri = %doc.uri, %err, "position map parse task failed");
                        None
                    }
                }
            }
        };

        self.cache.insert(
            doc.uri.clone(),
            MapCacheEntry {
                source_version: snapshot.source_version,
                map: map.clone(),
            },
        );
        map
    }

    /// Drop the cached map for a closed document.
    pub fn forget(&self, uri: &Url) {
        self.cache.remove(uri);
    }

    fn cached(&self, uri: &Url, source_version: i32) -> Option<Arc<ParsedMap>> {
        let entry = self.cache.get(uri)?;
        if entry.source_version != source_version {
            return None;
        }
        entry.map.clone()
    }

    /// Translate an offset in the original document to the generated text.
    ///
    /// Without a usable map the input is returned unchanged (clamped to the
    /// generated length so the result is always addressable).
    pub fn to_generated(&self, doc: &Document, snapshot: &Snapshot, original_offset: usize) -> usize {
        let Some(map) = self.cached(&doc.uri, snapshot.source_version) else {
            return original_offset.min(snapshot.generated_len());
        };
        translate(
            &doc.line_index,
            &snapshot.line_index,
            original_offset,
            |pos| map.lookup_original(pos).map(|e| (e.original(), e.generated())),
        )
    }

    /// Translate an offset in the generated text back to the original
    /// document.
    ///
    /// Positions in synthetic generated code with no source correspondence
    /// fall back to their line/column conversion alone, which can be
    /// misaligned when injected code shifts later lines; callers get an
    /// in-bounds approximation, never an error.
    pub fn to_original(&self, doc: &Document, snapshot: &Snapshot, generated_offset: usize) -> usize {
        let Some(map) = self.cached(&doc.uri, snapshot.source_version) else {
            return generated_offset.min(doc.line_index.len());
        };
        translate(
            &snapshot.line_index,
            &doc.line_index,
            generated_offset,
            |pos| map.lookup_generated(pos).map(|e| (e.generated(), e.original())),
        )
    }
}

/// Shared translation core: offset -> line/col -> nearest same-line entry ->
/// column delta -> offset on the other side. `lookup` returns the matched
/// entry as `(from-side, to-side)` coordinates.
fn translate(
    from: &LineIndex,
    to: &LineIndex,
    offset: usize,
    lookup: impl Fn(LineCol) -> Option<(LineCol, LineCol)>,
) -> usize {
    let pos = from.offset_to_line_col(offset);
    let target = match lookup(pos) {
        Some((anchor, mapped)) => LineCol::new(mapped.line, mapped.col + (pos.col - anchor.col)),
        // No correspondence: carry the line/column over unchanged.
        None => pos,
    };
    to.line_col_to_offset(target)
}
