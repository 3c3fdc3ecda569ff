//! Hover conversion from engine quick info.

use tower_lsp::lsp_types::{Hover, HoverContents, MarkupContent, MarkupKind};

use crate::document::LineIndex;
use crate::engine::QuickInfo;

/// Convert a translated quick-info result to an LSP hover.
pub fn to_hover(info: &QuickInfo, line_index: &LineIndex) -> Hover {
    let mut value = format!("```\n{}\n```", info.display);
    if let Some(docs) = &info.documentation {
        value.push_str("\n\n");
        value.push_str(docs);
    }

    Hover {
        contents: HoverContents::Markup(MarkupContent {
            kind: MarkupKind::Markdown,
            value,
        }),
        range: Some(line_index.span_to_range(&(info.span.start..info.span.end()))),
    }
}
