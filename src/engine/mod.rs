//! The analysis engine boundary.
//!
//! The engine is a black box that reads files through [`EngineFileSystem`]
//! and answers queries in generated-file coordinates. This module defines
//! that contract plus the result types the [`translate`] module rewrites
//! into original-document coordinates.

pub mod registry;
pub mod translate;
pub mod vfs;

use std::sync::Arc;

use thiserror::Error;

use crate::config::EngineOptions;

/// A span in one representation: start byte offset plus length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSpan {
    pub start: usize,
    pub length: usize,
}

impl EngineSpan {
    pub fn new(start: usize, length: usize) -> Self {
        Self { start, length }
    }

    pub fn end(&self) -> usize {
        self.start + self.length
    }
}

/// Severity bucket the engine assigns a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticCategory {
    Error,
    Warning,
    Suggestion,
}

/// One engine diagnostic, in the coordinates of the queried file.
///
/// Engine-internal/global diagnostics carry no start offset; they pass
/// through translation with positions unset.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineDiagnostic {
    pub code: Option<u32>,
    pub category: DiagnosticCategory,
    pub message: String,
    pub start: Option<usize>,
    pub length: Option<usize>,
}

/// Hover-style information about the symbol at an offset.
#[derive(Debug, Clone, PartialEq)]
pub struct QuickInfo {
    /// Primary display text, engine-defined formatting.
    pub display: String,
    pub documentation: Option<String>,
    pub span: EngineSpan,
}

/// One node of the engine's navigation tree.
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationNode {
    pub text: String,
    /// Engine-defined node kind ("function", "class", ...).
    pub kind: String,
    pub spans: Vec<EngineSpan>,
    pub children: Vec<NavigationNode>,
}

/// A completion candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionEntry {
    pub name: String,
    pub kind: String,
    pub sort_text: String,
    /// Span the completion replaces, when it differs from the query point.
    pub replacement_span: Option<EngineSpan>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompletionList {
    pub is_incomplete: bool,
    pub entries: Vec<CompletionEntry>,
}

/// Definition target: a span in some engine-visible file.
#[derive(Debug, Clone, PartialEq)]
pub struct DefinitionSpan {
    pub file_name: String,
    pub span: EngineSpan,
}

/// A single text replacement.
#[derive(Debug, Clone, PartialEq)]
pub struct TextEdit {
    pub span: EngineSpan,
    pub new_text: String,
}

/// Edits for one file within a code fix.
#[derive(Debug, Clone, PartialEq)]
pub struct FileEdit {
    pub file_name: String,
    pub edits: Vec<TextEdit>,
}

/// One applicable code fix, possibly touching several files.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeFixAction {
    pub description: String,
    pub changes: Vec<FileEdit>,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("engine construction failed: {0}")]
    Construct(String),

    #[error("engine query failed: {0}")]
    Query(String),
}

/// The virtual file system view an engine instance reads from.
///
/// Backed by the project's declared files, the attached documents'
/// generated representations, and the ambient shim declarations.
pub trait EngineFileSystem: Send + Sync {
    /// Every file name currently visible to the engine.
    fn list_files(&self) -> Vec<String>;

    /// Content version for cache invalidation inside the engine.
    fn version_of(&self, file: &str) -> Option<i32>;

    /// Current text of a visible file.
    fn snapshot_of(&self, file: &str) -> Option<Arc<str>>;

    /// Resolve a module reference to a visible file name.
    fn resolve_module(&self, name: &str, containing_file: &str) -> Option<String>;
}

/// Query surface of one live engine instance.
///
/// All file names and offsets are in generated coordinates. Queries either
/// return or fail deterministically; failures degrade to empty results at
/// the call site and are never retried.
pub trait AnalysisEngine: Send + Sync {
    fn get_diagnostics(&self, file: &str) -> Result<Vec<EngineDiagnostic>, EngineError>;

    fn get_suggestions(&self, file: &str) -> Result<Vec<EngineDiagnostic>, EngineError>;

    fn get_semantic_issues(&self, file: &str) -> Result<Vec<EngineDiagnostic>, EngineError>;

    fn get_quick_info(&self, file: &str, offset: usize) -> Result<Option<QuickInfo>, EngineError>;

    fn get_completions(
        &self,
        file: &str,
        offset: usize,
    ) -> Result<Option<CompletionList>, EngineError>;

    fn get_navigation_tree(&self, file: &str) -> Result<Option<NavigationNode>, EngineError>;

    fn get_definitions(
        &self,
        file: &str,
        offset: usize,
    ) -> Result<Vec<DefinitionSpan>, EngineError>;

    fn get_code_fixes(
        &self,
        file: &str,
        start: usize,
        end: usize,
        codes: &[u32],
    ) -> Result<Vec<CodeFixAction>, EngineError>;
}

/// Constructs engine instances for the registry.
///
/// Called once per project context, and again whenever a structural-kind
/// change forces a rebuild.
pub trait EngineFactory: Send + Sync {
    fn create(
        &self,
        options: &EngineOptions,
        files: Arc<dyn EngineFileSystem>,
    ) -> Result<Arc<dyn AnalysisEngine>, EngineError>;
}
