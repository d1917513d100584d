//! Core types shared across the Lexrag ingestion and retrieval pipeline.

pub mod chunk;
pub mod document;
pub mod source;

pub use chunk::{
    Chunk, ChunkMetadata, GuidelineMetadata, LawChunkKind, LawMetadata, QaMetadata,
    ViolationMetadata,
};
pub use document::{
    Article, GuidelineDocument, Item, LawDocument, Paragraph, QaDocument, QaItem,
};
pub use source::{ParseSourceError, QaSource, Source};

/// Chunk size measured in Unicode scalar values.
///
/// Byte length over-counts Japanese text threefold, so every size threshold
/// in the chunkers and the merge pass uses this.
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}
