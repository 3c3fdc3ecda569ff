//! Completion conversion from engine completion lists.

use tower_lsp::lsp_types::{
    CompletionItem, CompletionItemKind, CompletionResponse, CompletionTextEdit, TextEdit,
};

use crate::document::LineIndex;
use crate::engine::CompletionList;

/// Map an engine-defined entry kind to an LSP completion kind.
fn completion_kind(kind: &str) -> Option<CompletionItemKind> {
    match kind {
        "function" => Some(CompletionItemKind::FUNCTION),
        "method" => Some(CompletionItemKind::METHOD),
        "class" => Some(CompletionItemKind::CLASS),
        "interface" => Some(CompletionItemKind::INTERFACE),
        "module" => Some(CompletionItemKind::MODULE),
        "var" | "let" | "local var" => Some(CompletionItemKind::VARIABLE),
        "const" => Some(CompletionItemKind::CONSTANT),
        "property" | "field" => Some(CompletionItemKind::FIELD),
        "keyword" => Some(CompletionItemKind::KEYWORD),
        "enum" => Some(CompletionItemKind::ENUM),
        _ => None,
    }
}

/// Convert a translated completion list to an LSP response.
pub fn to_completion_response(list: &CompletionList, line_index: &LineIndex) -> CompletionResponse {
    let items = list
        .entries
        .iter()
        .map(|entry| CompletionItem {
            label: entry.name.clone(),
            kind: completion_kind(&entry.kind),
            sort_text: Some(entry.sort_text.clone()),
            text_edit: entry.replacement_span.map(|span| {
                CompletionTextEdit::Edit(TextEdit {
                    range: line_index.span_to_range(&(span.start..span.end())),
                    new_text: entry.name.clone(),
                })
            }),
            ..Default::default()
        })
        .collect();

    CompletionResponse::List(tower_lsp::lsp_types::CompletionList {
        is_incomplete: list.is_incomplete,
        items,
    })
}
