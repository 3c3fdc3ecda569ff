//! Navigation conversions: document symbols and definition locations.

#![allow(deprecated)] // DocumentSymbol::deprecated must still be populated

use tower_lsp::lsp_types::{DocumentSymbol, Location, SymbolKind};

use crate::document::{DocumentStore, LineIndex};
use crate::engine::{DefinitionSpan, NavigationNode};

fn symbol_kind(kind: &str) -> SymbolKind {
    match kind {
        "function" => SymbolKind::FUNCTION,
        "method" => SymbolKind::METHOD,
        "class" => SymbolKind::CLASS,
        "interface" => SymbolKind::INTERFACE,
        "module" => SymbolKind::MODULE,
        "enum" => SymbolKind::ENUM,
        "const" => SymbolKind::CONSTANT,
        "property" | "field" => SymbolKind::FIELD,
        _ => SymbolKind::VARIABLE,
    }
}

/// Convert a translated navigation tree to LSP document symbols.
///
/// The engine's root node stands for the file itself; its children are the
/// document's top-level symbols.
pub fn to_document_symbols(tree: &NavigationNode, line_index: &LineIndex) -> Vec<DocumentSymbol> {
    tree.children
        .iter()
        .filter_map(|child| to_symbol(child, line_index))
        .collect()
}

fn to_symbol(node: &NavigationNode, line_index: &LineIndex) -> Option<DocumentSymbol> {
    let span = node.spans.first()?;
    let range = line_index.span_to_range(&(span.start..span.end()));
    let children: Vec<_> = node
        .children
        .iter()
        .filter_map(|child| to_symbol(child, line_index))
        .collect();

    Some(DocumentSymbol {
        name: node.text.clone(),
        detail: None,
        kind: symbol_kind(&node.kind),
        tags: None,
        deprecated: None,
        range,
        selection_range: range,
        children: (!children.is_empty()).then_some(children),
    })
}

/// Convert translated definition spans to LSP locations.
///
/// Only spans inside open documents can be addressed; the rest (shims,
/// declared disk files in generated form) have no original coordinate space
/// and are omitted.
pub fn to_locations(definitions: &[DefinitionSpan], documents: &DocumentStore) -> Vec<Location> {
    definitions
        .iter()
        .filter_map(|def| {
            let doc = documents.find_by_path(&def.file_name)?;
            let range = doc
                .line_index
                .span_to_range(&(def.span.start..def.span.end()));
            Some(Location {
                uri: doc.uri.clone(),
                range,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineSpan;
    use tower_lsp::lsp_types::{Position, Url};

    #[test]
    fn symbols_come_from_root_children() {
        let idx = LineIndex::new("fn main\nfn other".to_string());
        let tree = NavigationNode {
            text: "file".to_string(),
            kind: "module".to_string(),
            spans: vec![EngineSpan::new(0, 16)],
            children: vec![NavigationNode {
                text: "main".to_string(),
                kind: "function".to_string(),
                spans: vec![EngineSpan::new(0, 7)],
                children: vec![],
            }],
        };

        let symbols = to_document_symbols(&tree, &idx);
        assert_eq!(symbols.len(), 1);
        assert_eq!(symbols[0].name, "main");
        assert_eq!(symbols[0].kind, SymbolKind::FUNCTION);
        assert_eq!(symbols[0].range.start, Position::new(0, 0));
    }

    #[test]
    fn spanless_nodes_are_skipped() {
        let idx = LineIndex::new("text".to_string());
        let tree = NavigationNode {
            text: "file".to_string(),
            kind: "module".to_string(),
            spans: vec![],
            children: vec![NavigationNode {
                text: "ghost".to_string(),
                kind: "var".to_string(),
                spans: vec![],
                children: vec![],
            }],
        };
        assert!(to_document_symbols(&tree, &idx).is_empty());
    }

    #[test]
    fn locations_only_for_open_documents() {
        let documents = DocumentStore::new();
        documents.open(
            Url::parse("file:///p/a.src").unwrap(),
            "let x = 1".to_string(),
            0,
        );

        let defs = vec![
            DefinitionSpan {
                file_name: "/p/a.src".to_string(),
                span: EngineSpan::new(4, 1),
            },
            DefinitionSpan {
                file_name: "/__lsbridge/shims.gen".to_string(),
                span: EngineSpan::new(0, 1),
            },
        ];

        let locations = to_locations(&defs, &documents);
        assert_eq!(locations.len(), 1);
        assert_eq!(locations[0].uri.path(), "/p/a.src");
        assert_eq!(locations[0].range.start, Position::new(0, 4));
    }
}
