//! Per-project engine instance registry.
//!
//! Each distinct project configuration owns exactly one [`ProjectContext`]
//! and one live engine instance. Attaching a document updates its snapshot,
//! records it in the context's file view, and rebuilds the engine when the
//! document's structural kind no longer matches the kind it had when the
//! engine was built. Contexts live for the process lifetime; there is no
//! eviction.

use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock, RwLockWriteGuard};

use dashmap::DashMap;
use tower_lsp::lsp_types::Url;
use tracing::{debug, info, warn};

use crate::config::{ConfigLoader, EngineOptions, ProjectConfig};
use crate::convert::{Converter, GeneratedKind};
use crate::document::{generated_file_name, Document, Snapshot, SnapshotCache};

use super::vfs::ProjectFileView;
use super::{
    AnalysisEngine, CodeFixAction, CompletionList, DefinitionSpan, EngineDiagnostic, EngineError,
    EngineFactory, EngineFileSystem, NavigationNode, QuickInfo,
};

/// Handle to a live engine instance.
///
/// Engine replacement bumps the generation, so a holder of an old handle can
/// compare generations instead of racing the swap. The wrapped instance
/// stays alive for as long as any handle references it.
#[derive(Clone)]
pub struct EngineHandle {
    generation: u64,
    engine: Arc<dyn AnalysisEngine>,
}

impl EngineHandle {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn engine(&self) -> &Arc<dyn AnalysisEngine> {
        &self.engine
    }

    /// Whether two handles refer to the same engine instance.
    pub fn same_instance(&self, other: &EngineHandle) -> bool {
        Arc::ptr_eq(&self.engine, &other.engine)
    }
}

struct EngineSlot {
    generation: u64,
    engine: Arc<dyn AnalysisEngine>,
}

/// State for one resolved project configuration.
pub struct ProjectContext {
    /// Identity; empty path means "no config, default options".
    config_path: PathBuf,
    options: EngineOptions,
    files: Arc<ProjectFileView>,
    /// Structural kind each attached path had when last attached.
    attached_kinds: DashMap<String, GeneratedKind>,
    /// The engine slot; replacement requires the write half.
    slot: RwLock<Option<EngineSlot>>,
}

impl ProjectContext {
    fn new(config_path: PathBuf, config: ProjectConfig, snapshots: Arc<SnapshotCache>) -> Self {
        Self {
            config_path,
            options: config.options.with_forced(),
            files: Arc::new(ProjectFileView::new(snapshots, config.file_names)),
            attached_kinds: DashMap::new(),
            slot: RwLock::new(None),
        }
    }

    fn write_slot(&self) -> RwLockWriteGuard<'_, Option<EngineSlot>> {
        self.slot.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn build_engine(&self, factory: &dyn EngineFactory) -> Arc<dyn AnalysisEngine> {
        let files = Arc::clone(&self.files) as Arc<dyn EngineFileSystem>;
        match factory.create(&self.options, files) {
            Ok(engine) => engine,
            Err(err) => {
                warn!(config = %self.config_path.display(), %err, "engine construction failed, serving empty results");
                Arc::new(NullEngine)
            }
        }
    }

    /// Attach one document revision and return the current engine.
    ///
    /// Holds the slot's write lock across engine construction/replacement so
    /// no query can observe a half-swapped slot.
    fn attach(
        &self,
        factory: &dyn EngineFactory,
        generated_name: String,
        uri: Url,
        kind: GeneratedKind,
    ) -> EngineHandle {
        self.files.attach(generated_name.clone(), uri);
        let previous_kind = self.attached_kinds.insert(generated_name.clone(), kind);

        let mut slot = self.write_slot();
        if let Some(existing) = slot.as_mut() {
            if previous_kind.is_some_and(|k| k != kind) {
                // The engine cannot be reconfigured in place across kinds.
                info!(
                    config = %self.config_path.display(),
                    file = %generated_name,
                    ?kind,
                    "structural kind changed, rebuilding engine"
                );
                *existing = EngineSlot {
                    generation: existing.generation + 1,
                    engine: self.build_engine(factory),
                };
            }
        }
        let current = slot.get_or_insert_with(|| {
            debug!(config = %self.config_path.display(), "creating engine instance");
            EngineSlot {
                generation: 1,
                engine: self.build_engine(factory),
            }
        });

        EngineHandle {
            generation: current.generation,
            engine: Arc::clone(&current.engine),
        }
    }

    fn detach(&self, generated_name: &str) {
        self.files.detach(generated_name);
        self.attached_kinds.remove(generated_name);
    }

    fn current_generation(&self) -> Option<u64> {
        let slot = self.slot.read().unwrap_or_else(PoisonError::into_inner);
        slot.as_ref().map(|s| s.generation)
    }
}

/// Registry of project contexts, keyed by resolved config path.
pub struct EngineRegistry {
    snapshots: Arc<SnapshotCache>,
    loader: Arc<dyn ConfigLoader>,
    factory: Arc<dyn EngineFactory>,
    contexts: DashMap<PathBuf, Arc<ProjectContext>>,
}

impl EngineRegistry {
    pub fn new(
        snapshots: Arc<SnapshotCache>,
        loader: Arc<dyn ConfigLoader>,
        factory: Arc<dyn EngineFactory>,
    ) -> Self {
        Self {
            snapshots,
            loader,
            factory,
            contexts: DashMap::new(),
        }
    }

    /// Resolve `doc`'s project, refresh its snapshot, attach it, and return
    /// the snapshot together with the project's engine.
    ///
    /// Always returns a usable handle: configuration and construction
    /// failures degrade rather than propagate.
    pub fn get_engine(
        &self,
        doc: &Document,
        converter: &dyn Converter,
    ) -> (Arc<Snapshot>, EngineHandle) {
        let snapshot = self.snapshots.update(doc, converter);
        let context = self.context_for(doc);
        let handle = context.attach(
            self.factory.as_ref(),
            generated_file_name(doc.path()),
            doc.uri.clone(),
            snapshot.kind,
        );
        (snapshot, handle)
    }

    /// Remove a closed document from whichever context tracks it.
    pub fn detach(&self, doc_path: &str) {
        let generated_name = generated_file_name(doc_path);
        for context in self.contexts.iter() {
            context.detach(&generated_name);
        }
    }

    /// Generation of the engine currently serving `doc`, if one exists.
    ///
    /// Compare against [`EngineHandle::generation`] to detect staleness.
    pub fn generation_of(&self, doc: &Document) -> Option<u64> {
        let config_path = self.resolve_config_path(doc);
        let context = self.contexts.get(&config_path)?;
        context.current_generation()
    }

    /// Number of live project contexts.
    pub fn context_count(&self) -> usize {
        self.contexts.len()
    }

    fn resolve_config_path(&self, doc: &Document) -> PathBuf {
        let dir = Path::new(doc.path()).parent().unwrap_or_else(|| Path::new("/"));
        self.loader.find_config(dir).unwrap_or_default()
    }

    fn context_for(&self, doc: &Document) -> Arc<ProjectContext> {
        let config_path = self.resolve_config_path(doc);
        let entry = self.contexts.entry(config_path.clone()).or_insert_with(|| {
            let config = self.load_config(&config_path);
            debug!(config = %config_path.display(), files = config.file_names.len(), "creating project context");
            Arc::new(ProjectContext::new(
                config_path.clone(),
                config,
                Arc::clone(&self.snapshots),
            ))
        });
        Arc::clone(&entry)
    }

    fn load_config(&self, config_path: &Path) -> ProjectConfig {
        if config_path.as_os_str().is_empty() {
            return ProjectConfig::default();
        }
        match self.loader.parse_config(config_path) {
            Ok(config) => config,
            Err(err) => {
                warn!(config = %config_path.display(), %err, "config parse failed, using defaults");
                ProjectConfig::default()
            }
        }
    }
}

/// Stand-in engine used when construction fails: every query succeeds with
/// an empty result.
struct NullEngine;

impl AnalysisEngine for NullEngine {
    fn get_diagnostics(&self, _file: &str) -> Result<Vec<EngineDiagnostic>, EngineError> {
        Ok(Vec::new())
    }

    fn get_suggestions(&self, _file: &str) -> Result<Vec<EngineDiagnostic>, EngineError> {
        Ok(Vec::new())
    }

    fn get_semantic_issues(&self, _file: &str) -> Result<Vec<EngineDiagnostic>, EngineError> {
        Ok(Vec::new())
    }

    fn get_quick_info(&self, _file: &str, _offset: usize) -> Result<Option<QuickInfo>, EngineError> {
        Ok(None)
    }

    fn get_completions(
        &self,
        _file: &str,
        _offset: usize,
    ) -> Result<Option<CompletionList>, EngineError> {
        Ok(None)
    }

    fn get_navigation_tree(&self, _file: &str) -> Result<Option<NavigationNode>, EngineError> {
        Ok(None)
    }

    fn get_definitions(
        &self,
        _file: &str,
        _offset: usize,
    ) -> Result<Vec<DefinitionSpan>, EngineError> {
        Ok(Vec::new())
    }

    fn get_code_fixes(
        &self,
        _file: &str,
        _start: usize,
        _end: usize,
        _codes: &[u32],
    ) -> Result<Vec<CodeFixAction>, EngineError> {
        Ok(Vec::new())
    }
}
