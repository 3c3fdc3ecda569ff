//! LSP protocol feature conversions.
//!
//! Engine results arrive here already translated into original-document
//! coordinates; these modules only reshape them into protocol types.

mod code_action;
mod completion;
mod diagnostics;
mod hover;
mod navigation;

pub use code_action::to_code_actions;
pub use completion::to_completion_response;
pub use diagnostics::to_lsp_diagnostics;
pub use hover::to_hover;
pub use navigation::{to_document_symbols, to_locations};

use tracing::warn;

use crate::engine::EngineError;

/// Collapse a failed engine query to its empty value.
///
/// Engine failures degrade to empty results for the affected request and
/// are never retried.
pub(crate) fn or_empty<T: Default>(result: Result<T, EngineError>, query: &'static str) -> T {
    match result {
        Ok(value) => value,
        Err(err) => {
            warn!(%err, query, "engine query failed");
            T::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_query_degrades_to_empty() {
        let failed: Result<Vec<i32>, EngineError> = Err(EngineError::Query("boom".to_string()));
        assert!(or_empty(failed, "diagnostics").is_empty());

        let ok: Result<Vec<i32>, EngineError> = Ok(vec![1]);
        assert_eq!(or_empty(ok, "diagnostics"), vec![1]);
    }
}
