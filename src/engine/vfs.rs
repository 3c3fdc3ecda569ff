//! Virtual file system view served to engine instances.
//!
//! One view exists per project context. It is the union of the project's
//! declared files, the generated representations of attached documents, and
//! a fixed set of ambient shim declarations. Attach/detach maintain the view
//! incrementally; nothing is rebuilt per engine callback.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use dashmap::DashMap;
use tower_lsp::lsp_types::Url;
use tracing::warn;

use crate::document::{generated_file_name, SnapshotCache};

use super::EngineFileSystem;

/// Ambient declarations describing the generated representation's shape.
/// Every engine instance sees these under fixed names.
const SHIM_FILES: &[(&str, &str)] = &[(
    "/__lsbridge/shims.gen",
    "declare module \"*.gen\" { const component: unknown; export default component; }\n",
)];

/// File view for one project context.
#[derive(Debug)]
pub struct ProjectFileView {
    snapshots: Arc<SnapshotCache>,
    /// Declared project files, fixed at context creation.
    declared: Vec<String>,
    /// Generated file name -> original document URI.
    attached: DashMap<String, Url>,
}

impl ProjectFileView {
    pub(crate) fn new(snapshots: Arc<SnapshotCache>, declared: Vec<String>) -> Self {
        Self {
            snapshots,
            declared,
            attached: DashMap::new(),
        }
    }

    /// Make a document's generated representation visible to the engine.
    pub(crate) fn attach(&self, generated_name: String, uri: Url) {
        self.attached.insert(generated_name, uri);
    }

    /// Remove a closed document from the engine's view.
    pub(crate) fn detach(&self, generated_name: &str) {
        self.attached.remove(generated_name);
    }

    fn attached_uri(&self, file: &str) -> Option<Url> {
        self.attached.get(file).map(|r| r.value().clone())
    }

    fn shim(file: &str) -> Option<&'static str> {
        SHIM_FILES
            .iter()
            .find(|(name, _)| *name == file)
            .map(|(_, content)| *content)
    }

    fn is_declared(&self, file: &str) -> bool {
        self.declared.iter().any(|f| f == file)
    }
}

impl EngineFileSystem for ProjectFileView {
    fn list_files(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut files = Vec::new();

        for (name, _) in SHIM_FILES {
            if seen.insert(name.to_string()) {
                files.push(name.to_string());
            }
        }
        for name in &self.declared {
            if seen.insert(name.clone()) {
                files.push(name.clone());
            }
        }
        for entry in self.attached.iter() {
            if seen.insert(entry.key().clone()) {
                files.push(entry.key().clone());
            }
        }
        files
    }

    fn version_of(&self, file: &str) -> Option<i32> {
        if Self::shim(file).is_some() {
            return Some(0);
        }
        if let Some(uri) = self.attached_uri(file) {
            return self.snapshots.get(&uri).map(|s| s.source_version);
        }
        // Declared files only change between sessions.
        self.is_declared(file).then_some(0)
    }

    fn snapshot_of(&self, file: &str) -> Option<Arc<str>> {
        if let Some(content) = Self::shim(file) {
            return Some(Arc::from(content));
        }
        if let Some(uri) = self.attached_uri(file) {
            return self
                .snapshots
                .get(&uri)
                .map(|s| Arc::from(s.generated_text()));
        }
        if self.is_declared(file) {
            return match std::fs::read_to_string(file) {
                Ok(content) => Some(Arc::from(content.as_str())),
                Err(err) => {
                    warn!(file, %err, "declared project file is unreadable");
                    None
                }
            };
        }
        None
    }

    fn resolve_module(&self, name: &str, containing_file: &str) -> Option<String> {
        let base = Path::new(containing_file)
            .parent()
            .unwrap_or_else(|| Path::new("/"));
        let resolved = normalize(&base.join(name).to_string_lossy());

        // A reference to an original document resolves to its generated
        // representation; tracked generated names resolve to themselves.
        let generated = generated_file_name(&resolved);
        if self.attached.contains_key(&generated) || self.is_declared(&generated) {
            return Some(generated);
        }
        if self.attached.contains_key(&resolved) || self.is_declared(&resolved) {
            return Some(resolved);
        }
        None
    }
}

/// Lexically normalize `.` and `..` segments of a slash-separated path.
fn normalize(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    format!("/{}", parts.join("/"))
}
