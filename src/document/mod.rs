//! Document state management and text utilities.
//!
//! This module provides:
//! - `LineIndex` for efficient byte offset <-> LSP position conversion
//! - `DocumentStore` for open documents, which feeds the tracker its text
//!   and turns `didChange` events into line edits

mod state;
mod text;

pub use state::{document_key, normalize_key, DocumentStore};
pub use text::LineIndex;
