//! Code action conversion from engine code fixes.

use std::collections::HashMap;

use tower_lsp::lsp_types::{
    CodeAction, CodeActionKind, CodeActionOrCommand, TextEdit, Url, WorkspaceEdit,
};
use tracing::debug;

use crate::document::DocumentStore;
use crate::engine::CodeFixAction;

/// Convert translated code fixes to LSP code actions.
///
/// Edits are grouped per document URI. Files that are not open documents
/// cannot be addressed by the client and are skipped.
pub fn to_code_actions(fixes: &[CodeFixAction], documents: &DocumentStore) -> Vec<CodeActionOrCommand> {
    fixes
        .iter()
        .filter_map(|fix| {
            let mut changes: HashMap<Url, Vec<TextEdit>> = HashMap::new();

            for change in &fix.changes {
                let Some(doc) = documents.find_by_path(&change.file_name) else {
                    debug!(file = %change.file_name, "skipping edit for unopened file");
                    continue;
                };
                let edits = change
                    .edits
                    .iter()
                    .map(|e| TextEdit {
                        range: doc.line_index.span_to_range(&(e.span.start..e.span.end())),
                        new_text: e.new_text.clone(),
                    })
                    .collect::<Vec<_>>();
                changes.entry(doc.uri.clone()).or_default().extend(edits);
            }

            if changes.is_empty() {
                return None;
            }

            Some(CodeActionOrCommand::CodeAction(CodeAction {
                title: fix.description.clone(),
                kind: Some(CodeActionKind::QUICKFIX),
                edit: Some(WorkspaceEdit::new(changes)),
                ..Default::default()
            }))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineSpan, FileEdit, TextEdit as EngineTextEdit};

    #[test]
    fn fixes_become_quickfix_actions() {
        let documents = DocumentStore::new();
        documents.open(
            Url::parse("file:///p/a.src").unwrap(),
            "let x = 1".to_string(),
            0,
        );

        let fixes = vec![CodeFixAction {
            description: "rename x to y".to_string(),
            changes: vec![FileEdit {
                file_name: "/p/a.src".to_string(),
                edits: vec![EngineTextEdit {
                    span: EngineSpan::new(4, 1),
                    new_text: "y".to_string(),
                }],
            }],
        }];

        let actions = to_code_actions(&fixes, &documents);
        assert_eq!(actions.len(), 1);
        let CodeActionOrCommand::CodeAction(action) = &actions[0] else {
            panic!("expected a code action");
        };
        assert_eq!(action.title, "rename x to y");
        assert_eq!(action.kind, Some(CodeActionKind::QUICKFIX));
        assert!(action.edit.is_some());
    }

    #[test]
    fn fix_touching_only_unknown_files_is_dropped() {
        let documents = DocumentStore::new();
        let fixes = vec![CodeFixAction {
            description: "patch library".to_string(),
            changes: vec![FileEdit {
                file_name: "/lib/external.gen".to_string(),
                edits: vec![],
            }],
        }];

        assert!(to_code_actions(&fixes, &documents).is_empty());
    }
}
