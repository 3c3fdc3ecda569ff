//! Rewrites engine results into original-document coordinates.
//!
//! Every position field the engine reports is pushed through the position
//! mapper's `to_original`. Results for files without a tracked snapshot keep
//! their positions untouched: only documents with an original representation
//! have a coordinate space to translate into.

use std::sync::Arc;

use crate::document::{Document, DocumentStore, PositionMapper, Snapshot, SnapshotCache};

use super::{
    CodeFixAction, CompletionList, DefinitionSpan, EngineDiagnostic, EngineSpan, FileEdit,
    NavigationNode, QuickInfo, TextEdit,
};

/// Translator bound to the session's mapping state.
pub struct Translator<'a> {
    documents: &'a DocumentStore,
    snapshots: &'a SnapshotCache,
    mapper: &'a PositionMapper,
}

impl<'a> Translator<'a> {
    pub fn new(
        documents: &'a DocumentStore,
        snapshots: &'a SnapshotCache,
        mapper: &'a PositionMapper,
    ) -> Self {
        Self {
            documents,
            snapshots,
            mapper,
        }
    }

    /// The document and current snapshot behind a generated file name, if
    /// that file is a tracked, up-to-date document.
    fn context_for(&self, generated_name: &str) -> Option<(Arc<Document>, Arc<Snapshot>)> {
        let doc = self.documents.find_by_generated_name(generated_name)?;
        let snapshot = self.snapshots.get(&doc.uri)?;
        // A snapshot is only valid for the version it was derived from.
        (snapshot.source_version == doc.version).then_some((doc, snapshot))
    }

    fn span(&self, doc: &Document, snapshot: &Snapshot, span: EngineSpan) -> EngineSpan {
        let start = self.mapper.to_original(doc, snapshot, span.start);
        let end = self.mapper.to_original(doc, snapshot, span.end());
        EngineSpan::new(start, end.saturating_sub(start))
    }

    /// Translate a diagnostic list reported against `generated_name`.
    ///
    /// Diagnostics without a start offset are engine-global; they pass
    /// through with positions unset rather than being pinned to offset 0.
    pub fn diagnostics(
        &self,
        diagnostics: Vec<EngineDiagnostic>,
        generated_name: &str,
    ) -> Vec<EngineDiagnostic> {
        let Some((doc, snapshot)) = self.context_for(generated_name) else {
            return diagnostics;
        };

        diagnostics
            .into_iter()
            .map(|d| match d.start {
                None => d,
                Some(start) => {
                    let translated = self.span(
                        &doc,
                        &snapshot,
                        EngineSpan::new(start, d.length.unwrap_or(0)),
                    );
                    EngineDiagnostic {
                        start: Some(translated.start),
                        length: d.length.map(|_| translated.length),
                        ..d
                    }
                }
            })
            .collect()
    }

    pub fn quick_info(&self, info: QuickInfo, generated_name: &str) -> QuickInfo {
        let Some((doc, snapshot)) = self.context_for(generated_name) else {
            return info;
        };
        QuickInfo {
            span: self.span(&doc, &snapshot, info.span),
            ..info
        }
    }

    /// Translate a navigation tree, spans rewritten recursively per node.
    pub fn navigation_tree(&self, node: NavigationNode, generated_name: &str) -> NavigationNode {
        let Some((doc, snapshot)) = self.context_for(generated_name) else {
            return node;
        };
        self.navigation_node(node, &doc, &snapshot)
    }

    fn navigation_node(
        &self,
        node: NavigationNode,
        doc: &Document,
        snapshot: &Snapshot,
    ) -> NavigationNode {
        NavigationNode {
            spans: node
                .spans
                .into_iter()
                .map(|s| self.span(doc, snapshot, s))
                .collect(),
            children: node
                .children
                .into_iter()
                .map(|c| self.navigation_node(c, doc, snapshot))
                .collect(),
            ..node
        }
    }

    /// Translate per-entry replacement spans of a completion list.
    pub fn completions(&self, list: CompletionList, generated_name: &str) -> CompletionList {
        let Some((doc, snapshot)) = self.context_for(generated_name) else {
            return list;
        };
        CompletionList {
            is_incomplete: list.is_incomplete,
            entries: list
                .entries
                .into_iter()
                .map(|e| super::CompletionEntry {
                    replacement_span: e.replacement_span.map(|s| self.span(&doc, &snapshot, s)),
                    ..e
                })
                .collect(),
        }
    }

    /// Translate definition targets.
    ///
    /// Targets inside tracked documents are renamed to the original path and
    /// translated; anything else (shims, declared disk files) is returned
    /// as the engine reported it.
    pub fn definitions(&self, definitions: Vec<DefinitionSpan>) -> Vec<DefinitionSpan> {
        definitions
            .into_iter()
            .map(|def| match self.context_for(&def.file_name) {
                Some((doc, snapshot)) => DefinitionSpan {
                    file_name: doc.path().to_string(),
                    span: self.span(&doc, &snapshot, def.span),
                },
                None => def,
            })
            .collect()
    }

    /// Translate code-fix edit sets, file by file.
    pub fn code_fixes(&self, fixes: Vec<CodeFixAction>) -> Vec<CodeFixAction> {
        fixes
            .into_iter()
            .map(|fix| CodeFixAction {
                description: fix.description,
                changes: fix.changes.into_iter().map(|c| self.file_edit(c)).collect(),
            })
            .collect()
    }

    fn file_edit(&self, change: FileEdit) -> FileEdit {
        match self.context_for(&change.file_name) {
            Some((doc, snapshot)) => FileEdit {
                file_name: doc.path().to_string(),
                edits: change
                    .edits
                    .into_iter()
                    .map(|e| TextEdit {
                        span: self.span(&doc, &snapshot, e.span),
                        new_text: e.new_text,
                    })
                    .collect(),
            },
            None => change,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::{ConvertError, ConvertOutput, Converter, GeneratedKind};
    use crate::document::generated_file_name;
    use crate::engine::DiagnosticCategory;
    use tower_lsp::lsp_types::Url;

    /// Generated text prefixes `>>>>` on the first line; a single anchor
    /// shifts columns back by four.
    struct PrefixConverter;

    impl Converter for PrefixConverter {
        fn convert(&self, text: &str, _path: &str) -> Result<ConvertOutput, ConvertError> {
            Ok(ConvertOutput {
                generated_text: format!(">>>>{text}"),
                kind: GeneratedKind::Script,
                map: Some(
                    r#"{"entries":[
                        {"originalLine":1,"originalColumn":1,"generatedLine":1,"generatedColumn":5}
                    ]}"#
                    .to_string(),
                ),
            })
        }
    }

    struct Fixture {
        documents: DocumentStore,
        snapshots: SnapshotCache,
        mapper: PositionMapper,
        generated_name: String,
    }

    impl Fixture {
        async fn new(text: &str) -> Self {
            let documents = DocumentStore::new();
            let snapshots = SnapshotCache::new();
            let mapper = PositionMapper::new();

            let uri = Url::parse("file:///p/a.src").unwrap();
            let doc = documents.open(uri, text.to_string(), 0);
            let snapshot = snapshots.update(&doc, &PrefixConverter);
            mapper.ensure_map(&doc, &snapshot).await;

            Self {
                documents,
                snapshots,
                mapper,
                generated_name: generated_file_name("/p/a.src"),
            }
        }

        fn translator(&self) -> Translator<'_> {
            Translator::new(&self.documents, &self.snapshots, &self.mapper)
        }
    }

    fn diag(start: Option<usize>, length: Option<usize>) -> EngineDiagnostic {
        EngineDiagnostic {
            code: Some(1000),
            category: DiagnosticCategory::Error,
            message: "problem".to_string(),
            start,
            length,
        }
    }

    #[tokio::test]
    async fn diagnostics_shift_back_through_map() {
        let fx = Fixture::new("let x = 1").await;
        // Generated offset 8 is 'x' (4-byte prefix + 4).
        let out = fx
            .translator()
            .diagnostics(vec![diag(Some(8), Some(1))], &fx.generated_name);

        assert_eq!(out[0].start, Some(4));
        assert_eq!(out[0].length, Some(1));
    }

    #[tokio::test]
    async fn global_diagnostics_keep_positions_unset() {
        let fx = Fixture::new("let x = 1").await;
        let out = fx
            .translator()
            .diagnostics(vec![diag(None, None)], &fx.generated_name);

        assert_eq!(out[0].start, None);
        assert_eq!(out[0].length, None);
    }

    #[tokio::test]
    async fn translated_spans_stay_in_bounds() {
        let fx = Fixture::new("ab").await;
        // Way past the end of both texts.
        let out = fx
            .translator()
            .diagnostics(vec![diag(Some(500), Some(10))], &fx.generated_name);

        let start = out[0].start.unwrap();
        assert!(start <= 2);
        assert!(start + out[0].length.unwrap() <= 2);
    }

    #[tokio::test]
    async fn untracked_file_passes_through() {
        let fx = Fixture::new("let x = 1").await;
        let out = fx
            .translator()
            .diagnostics(vec![diag(Some(8), Some(1))], "/elsewhere/other.gen");

        assert_eq!(out[0].start, Some(8));
    }

    #[tokio::test]
    async fn navigation_tree_translates_recursively() {
        let fx = Fixture::new("let x = 1").await;
        let tree = NavigationNode {
            text: "module".to_string(),
            kind: "module".to_string(),
            spans: vec![EngineSpan::new(4, 9)],
            children: vec![NavigationNode {
                text: "x".to_string(),
                kind: "var".to_string(),
                spans: vec![EngineSpan::new(8, 1)],
                children: vec![],
            }],
        };

        let out = fx.translator().navigation_tree(tree, &fx.generated_name);
        assert_eq!(out.spans[0], EngineSpan::new(0, 9));
        assert_eq!(out.children[0].spans[0], EngineSpan::new(4, 1));
    }

    #[tokio::test]
    async fn code_fixes_translate_only_tracked_files() {
        let fx = Fixture::new("let x = 1").await;
        let fixes = vec![CodeFixAction {
            description: "rename".to_string(),
            changes: vec![
                FileEdit {
                    file_name: fx.generated_name.clone(),
                    edits: vec![TextEdit {
                        span: EngineSpan::new(8, 1),
                        new_text: "y".to_string(),
                    }],
                },
                FileEdit {
                    file_name: "/lib/external.gen".to_string(),
                    edits: vec![TextEdit {
                        span: EngineSpan::new(8, 1),
                        new_text: "y".to_string(),
                    }],
                },
            ],
        }];

        let out = fx.translator().code_fixes(fixes);
        let tracked = &out[0].changes[0];
        assert_eq!(tracked.file_name, "/p/a.src");
        assert_eq!(tracked.edits[0].span, EngineSpan::new(4, 1));

        let untracked = &out[0].changes[1];
        assert_eq!(untracked.file_name, "/lib/external.gen");
        assert_eq!(untracked.edits[0].span, EngineSpan::new(8, 1));
    }

    #[tokio::test]
    async fn definitions_rename_to_original_path() {
        let fx = Fixture::new("let x = 1").await;
        let defs = vec![DefinitionSpan {
            file_name: fx.generated_name.clone(),
            span: EngineSpan::new(8, 1),
        }];

        let out = fx.translator().definitions(defs);
        assert_eq!(out[0].file_name, "/p/a.src");
        assert_eq!(out[0].span, EngineSpan::new(4, 1));
    }

    #[tokio::test]
    async fn quick_info_span_translates() {
        let fx = Fixture::new("let x = 1").await;
        let info = QuickInfo {
            display: "let x: number".to_string(),
            documentation: None,
            span: EngineSpan::new(8, 1),
        };

        let out = fx.translator().quick_info(info, &fx.generated_name);
        assert_eq!(out.span, EngineSpan::new(4, 1));
    }
}
