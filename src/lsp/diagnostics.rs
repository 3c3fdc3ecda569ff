//! Diagnostics conversion from engine results to LSP diagnostics.

use tower_lsp::lsp_types::{Diagnostic, DiagnosticSeverity, NumberOrString};
use tracing::debug;

use crate::document::LineIndex;
use crate::engine::{DiagnosticCategory, EngineDiagnostic};

fn severity(category: DiagnosticCategory) -> DiagnosticSeverity {
    match category {
        DiagnosticCategory::Error => DiagnosticSeverity::ERROR,
        DiagnosticCategory::Warning => DiagnosticSeverity::WARNING,
        DiagnosticCategory::Suggestion => DiagnosticSeverity::HINT,
    }
}

/// Convert translated diagnostics to LSP diagnostics against the original
/// document.
///
/// Engine-global diagnostics carry no position and have no place in a
/// per-document publish; they are logged and dropped rather than pinned to
/// the top of the file.
pub fn to_lsp_diagnostics(diagnostics: &[EngineDiagnostic], line_index: &LineIndex) -> Vec<Diagnostic> {
    diagnostics
        .iter()
        .filter_map(|d| {
            let Some(start) = d.start else {
                debug!(message = %d.message, "dropping positionless engine diagnostic");
                return None;
            };
            let end = start + d.length.unwrap_or(0);
            Some(Diagnostic {
                range: line_index.span_to_range(&(start..end)),
                severity: Some(severity(d.category)),
                code: d.code.map(|c| NumberOrString::Number(c as i32)),
                code_description: None,
                source: Some("lsbridge".to_string()),
                message: d.message.clone(),
                related_information: None,
                tags: None,
                data: None,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tower_lsp::lsp_types::Position;

    fn diag(start: Option<usize>, length: Option<usize>) -> EngineDiagnostic {
        EngineDiagnostic {
            code: Some(2304),
            category: DiagnosticCategory::Error,
            message: "cannot find name".to_string(),
            start,
            length,
        }
    }

    #[test]
    fn positioned_diagnostic_converts() {
        let idx = LineIndex::new("let x = y".to_string());
        let out = to_lsp_diagnostics(&[diag(Some(8), Some(1))], &idx);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].range.start, Position::new(0, 8));
        assert_eq!(out[0].range.end, Position::new(0, 9));
        assert_eq!(out[0].severity, Some(DiagnosticSeverity::ERROR));
        assert_eq!(out[0].code, Some(NumberOrString::Number(2304)));
        assert_eq!(out[0].source, Some("lsbridge".to_string()));
    }

    #[test]
    fn positionless_diagnostic_is_dropped_not_pinned() {
        let idx = LineIndex::new("text".to_string());
        let out = to_lsp_diagnostics(&[diag(None, None)], &idx);
        assert!(out.is_empty());
    }

    #[test]
    fn suggestion_maps_to_hint() {
        let idx = LineIndex::new("text".to_string());
        let mut d = diag(Some(0), Some(4));
        d.category = DiagnosticCategory::Suggestion;
        let out = to_lsp_diagnostics(&[d], &idx);
        assert_eq!(out[0].severity, Some(DiagnosticSeverity::HINT));
    }
}
