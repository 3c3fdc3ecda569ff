//! Session state.
//!
//! A [`Session`] owns every piece of mutable bridge state: the open
//! documents, their snapshots, the parsed-map cache, and the project
//! registry. It is created once per server and passed wherever needed;
//! there is no ambient/global state.
//!
//! Feature handlers issue exactly two calls per request:
//! [`Session::update_document`] (or [`Session::engine_for`] when the text is
//! unchanged) to get an engine handle, and [`Session::translator`] to bring
//! the engine's answer back into original-document coordinates.

use std::sync::Arc;

use tower_lsp::lsp_types::Url;

use crate::config::ConfigLoader;
use crate::convert::Converter;
use crate::document::{Document, DocumentStore, PositionMapper, Snapshot, SnapshotCache};
use crate::engine::registry::{EngineHandle, EngineRegistry};
use crate::engine::translate::Translator;
use crate::engine::EngineFactory;

/// Everything a request needs to query the engine for one document.
pub struct DocumentAccess {
    pub document: Arc<Document>,
    pub snapshot: Arc<Snapshot>,
    pub handle: EngineHandle,
}

/// Owner of all bridge state for one server instance.
pub struct Session {
    documents: DocumentStore,
    snapshots: Arc<SnapshotCache>,
    mapper: PositionMapper,
    registry: EngineRegistry,
    converter: Arc<dyn Converter>,
}

impl Session {
    pub fn new(
        converter: Arc<dyn Converter>,
        loader: Arc<dyn ConfigLoader>,
        factory: Arc<dyn EngineFactory>,
    ) -> Self {
        let snapshots = Arc::new(SnapshotCache::new());
        Self {
            documents: DocumentStore::new(),
            snapshots: Arc::clone(&snapshots),
            mapper: PositionMapper::new(),
            registry: EngineRegistry::new(snapshots, loader, factory),
            converter,
        }
    }

    /// Record new document text, refresh its snapshot and position map, and
    /// return the project's engine.
    ///
    /// Completing this call is what makes translation for the new version
    /// valid: the parsed map is awaited here, before any query runs.
    pub async fn update_document(&self, uri: Url, text: String, version: i32) -> DocumentAccess {
        let document = self.documents.open(uri, text, version);
        self.access(document).await
    }

    /// Like [`Session::update_document`] for a document whose text the
    /// client did not resend (hover, completion, and other positional
    /// requests). Returns `None` for unknown documents.
    pub async fn engine_for(&self, uri: &Url) -> Option<DocumentAccess> {
        let document = self.documents.get(uri)?;
        Some(self.access(document).await)
    }

    async fn access(&self, document: Arc<Document>) -> DocumentAccess {
        let (snapshot, handle) = self.registry.get_engine(&document, self.converter.as_ref());
        self.mapper.ensure_map(&document, &snapshot).await;
        DocumentAccess {
            document,
            snapshot,
            handle,
        }
    }

    /// Forget a closed document.
    ///
    /// Its snapshot stays cached (eviction is out of scope); the document is
    /// detached from its project so the engine stops seeing it.
    pub fn close_document(&self, uri: &Url) {
        if let Some(doc) = self.documents.get(uri) {
            self.registry.detach(doc.path());
        }
        self.documents.close(uri);
        self.mapper.forget(uri);
    }

    /// Translator over the session's current mapping state.
    pub fn translator(&self) -> Translator<'_> {
        Translator::new(&self.documents, &self.snapshots, &self.mapper)
    }

    pub fn document(&self, uri: &Url) -> Option<Arc<Document>> {
        self.documents.get(uri)
    }

    pub fn documents(&self) -> &DocumentStore {
        &self.documents
    }

    pub fn mapper(&self) -> &PositionMapper {
        &self.mapper
    }

    pub fn registry(&self) -> &EngineRegistry {
        &self.registry
    }
}
