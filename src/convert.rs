//! The converter boundary.
//!
//! A [`Converter`] turns an original document into the generated
//! representation the analysis engine understands, optionally producing a
//! position-map artifact correlating the two. The transformation itself is
//! supplied by the integrator; this crate only defines the contract and
//! contains failures at the boundary.

use thiserror::Error;

/// Structural classification of a generated representation.
///
/// The engine cannot be reconfigured in place across kinds, so a kind change
/// for an attached document forces the owning project to rebuild its engine
/// instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GeneratedKind {
    /// The generated representation is plain script.
    #[default]
    Script,
    /// The generated representation interleaves markup with script.
    MarkupScript,
}

/// Output of a successful conversion.
#[derive(Debug, Clone)]
pub struct ConvertOutput {
    /// The generated text, in the engine's input format.
    pub generated_text: String,
    /// Structural kind of `generated_text`.
    pub kind: GeneratedKind,
    /// Raw position-map artifact (JSON), if the converter produced one.
    ///
    /// Absent means positions translate by identity fallback.
    pub map: Option<String>,
}

/// Conversion failure, raised by converter implementations.
///
/// Callers inside the crate never propagate this: a failed conversion
/// degrades to an empty snapshot so engine queries return empty results.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("unsupported source format: {0}")]
    UnsupportedFormat(String),

    #[error("conversion failed: {0}")]
    Failed(String),
}

/// Deterministic source-to-generated transformation.
///
/// Must be pure: same `(text, path)` input, same output. Implementations
/// report failure through `ConvertError`; they must not panic on malformed
/// input.
pub trait Converter: Send + Sync {
    fn convert(&self, text: &str, path: &str) -> Result<ConvertOutput, ConvertError>;
}
