//! Language service bridge for documents analyzed through a generated
//! representation.
//!
//! An analysis engine that only understands its own input format can still
//! serve documents written in another one: a [`Converter`] produces a
//! generated representation per document, a [`Session`] tracks snapshots and
//! position maps, and every engine result is translated back into
//! original-document coordinates before it reaches the client.
//!
//! The engine, the converter, and the project configuration loader are
//! injected; [`create_service`] wires them into a tower-lsp server.

use std::sync::Arc;

use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer, LspService};

pub mod config;
pub mod convert;
pub mod document;
pub mod engine;
pub mod lsp;
mod session;

pub use config::{ConfigLoader, EngineOptions, ProjectConfig, TomlConfigLoader};
pub use convert::{ConvertError, ConvertOutput, Converter, GeneratedKind};
pub use document::{generated_file_name, Document, LineIndex, PositionMapper, Snapshot};
pub use engine::registry::{EngineHandle, EngineRegistry};
pub use engine::translate::Translator;
pub use engine::{AnalysisEngine, EngineError, EngineFactory, EngineFileSystem};
pub use session::{DocumentAccess, Session};

pub struct Backend {
    client: Client,
    session: Session,
}

impl Backend {
    pub(crate) fn new(client: Client, session: Session) -> Self {
        Self { client, session }
    }

    /// Refresh the document and publish its translated diagnostics.
    async fn on_document_change(&self, uri: Url, text: String, version: i32) {
        let access = self.session.update_document(uri.clone(), text, version).await;
        let diagnostics = self.collect_diagnostics(&access);
        self.client
            .publish_diagnostics(uri, diagnostics, Some(access.document.version))
            .await;
    }

    /// All three diagnostic kinds the engine reports, translated and
    /// converted for publishing.
    fn collect_diagnostics(&self, access: &DocumentAccess) -> Vec<Diagnostic> {
        let name = generated_file_name(access.document.path());
        let engine = access.handle.engine();

        let mut all = lsp::or_empty(engine.get_diagnostics(&name), "diagnostics");
        all.extend(lsp::or_empty(engine.get_suggestions(&name), "suggestions"));
        all.extend(lsp::or_empty(engine.get_semantic_issues(&name), "semantic issues"));

        let translated = self.session.translator().diagnostics(all, &name);
        lsp::to_lsp_diagnostics(&translated, &access.document.line_index)
    }

    /// Resolve a positional request to the generated coordinate the engine
    /// should be queried at.
    async fn generated_query_point(
        &self,
        uri: &Url,
        position: Position,
    ) -> Option<(DocumentAccess, String, usize)> {
        let access = self.session.engine_for(uri).await?;
        let offset = access.document.line_index.position_to_offset(position)?;
        let generated_offset =
            self.session
                .mapper()
                .to_generated(&access.document, &access.snapshot, offset);
        let name = generated_file_name(access.document.path());
        Some((access, name, generated_offset))
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, _params: InitializeParams) -> Result<InitializeResult> {
        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                completion_provider: Some(CompletionOptions {
                    trigger_characters: Some(vec![".".to_string()]),
                    resolve_provider: Some(false),
                    ..Default::default()
                }),
                definition_provider: Some(OneOf::Left(true)),
                document_symbol_provider: Some(OneOf::Left(true)),
                code_action_provider: Some(CodeActionProviderCapability::Simple(true)),
                ..Default::default()
            },
            ..Default::default()
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        self.client
            .log_message(MessageType::INFO, "lsbridge initialized")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        self.on_document_change(
            params.text_document.uri,
            params.text_document.text,
            params.text_document.version,
        )
        .await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        // FULL sync: exactly one change with the complete text
        if let Some(change) = params.content_changes.into_iter().next() {
            self.on_document_change(
                params.text_document.uri,
                change.text,
                params.text_document.version,
            )
            .await;
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        self.session.close_document(&params.text_document.uri);
        // Clear diagnostics
        self.client
            .publish_diagnostics(params.text_document.uri, vec![], None)
            .await;
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let uri = params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;

        let Some((access, name, offset)) = self.generated_query_point(&uri, position).await else {
            return Ok(None);
        };

        let info = lsp::or_empty(
            access.handle.engine().get_quick_info(&name, offset),
            "quick info",
        );
        let Some(info) = info else {
            return Ok(None);
        };

        let info = self.session.translator().quick_info(info, &name);
        Ok(Some(lsp::to_hover(&info, &access.document.line_index)))
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let uri = params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;

        let Some((access, name, offset)) = self.generated_query_point(&uri, position).await else {
            return Ok(None);
        };

        let list = lsp::or_empty(
            access.handle.engine().get_completions(&name, offset),
            "completions",
        );
        let Some(list) = list else {
            return Ok(None);
        };

        let list = self.session.translator().completions(list, &name);
        Ok(Some(lsp::to_completion_response(
            &list,
            &access.document.line_index,
        )))
    }

    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> Result<Option<GotoDefinitionResponse>> {
        let uri = params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;

        let Some((access, name, offset)) = self.generated_query_point(&uri, position).await else {
            return Ok(None);
        };

        let definitions = lsp::or_empty(
            access.handle.engine().get_definitions(&name, offset),
            "definitions",
        );
        let definitions = self.session.translator().definitions(definitions);
        let locations = lsp::to_locations(&definitions, self.session.documents());
        Ok((!locations.is_empty()).then_some(GotoDefinitionResponse::Array(locations)))
    }

    async fn document_symbol(
        &self,
        params: DocumentSymbolParams,
    ) -> Result<Option<DocumentSymbolResponse>> {
        let uri = params.text_document.uri;

        let Some(access) = self.session.engine_for(&uri).await else {
            return Ok(None);
        };
        let name = generated_file_name(access.document.path());

        let tree = lsp::or_empty(
            access.handle.engine().get_navigation_tree(&name),
            "navigation tree",
        );
        let Some(tree) = tree else {
            return Ok(None);
        };

        let tree = self.session.translator().navigation_tree(tree, &name);
        let symbols = lsp::to_document_symbols(&tree, &access.document.line_index);
        Ok(Some(DocumentSymbolResponse::Nested(symbols)))
    }

    async fn code_action(&self, params: CodeActionParams) -> Result<Option<CodeActionResponse>> {
        let uri = params.text_document.uri;

        let Some(access) = self.session.engine_for(&uri).await else {
            return Ok(None);
        };
        let line_index = &access.document.line_index;
        let (Some(start), Some(end)) = (
            line_index.position_to_offset(params.range.start),
            line_index.position_to_offset(params.range.end),
        ) else {
            return Ok(None);
        };

        let mapper = self.session.mapper();
        let generated_start = mapper.to_generated(&access.document, &access.snapshot, start);
        let generated_end = mapper.to_generated(&access.document, &access.snapshot, end);
        let codes: Vec<u32> = params
            .context
            .diagnostics
            .iter()
            .filter_map(|d| match &d.code {
                Some(NumberOrString::Number(n)) => u32::try_from(*n).ok(),
                _ => None,
            })
            .collect();

        let name = generated_file_name(access.document.path());
        let fixes = lsp::or_empty(
            access.handle.engine().get_code_fixes(
                &name,
                generated_start,
                generated_end,
                &codes,
            ),
            "code fixes",
        );
        let fixes = self.session.translator().code_fixes(fixes);
        let actions = lsp::to_code_actions(&fixes, self.session.documents());
        Ok((!actions.is_empty()).then_some(actions))
    }
}

/// Build the LSP service around the injected collaborators.
pub fn create_service(
    converter: Arc<dyn Converter>,
    loader: Arc<dyn ConfigLoader>,
    factory: Arc<dyn EngineFactory>,
) -> (LspService<Backend>, tower_lsp::ClientSocket) {
    LspService::new(move |client| {
        Backend::new(
            client,
            Session::new(
                Arc::clone(&converter),
                Arc::clone(&loader),
                Arc::clone(&factory),
            ),
        )
    })
}
