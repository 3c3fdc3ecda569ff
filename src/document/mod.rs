//! Document state, snapshots, and position mapping.
//!
//! This module provides:
//! - `LineIndex` for efficient byte offset <-> position conversion
//! - `Document` and `DocumentStore` for open original documents
//! - `Snapshot` and `SnapshotCache` for generated representations
//! - `PositionMapper` for translating offsets between the two

mod mapper;
mod snapshot;
mod store;
mod text;

pub use mapper::{MapEntry, ParsedMap, PositionMapper};
pub use snapshot::{generated_file_name, Snapshot, SnapshotCache};
pub use store::{Document, DocumentStore};
pub use text::{LineCol, LineIndex};
