//! Structural chunkers: turn typed legal-reference documents into ordered
//! sequences of bounded, context-preserving chunks.
//!
//! Three families, one chunker each:
//! - [`law::chunk_law`]: statute articles/paragraphs/items,
//! - [`guideline::chunk_guideline`]: PDF-derived guideline text,
//! - [`qa::chunk_qa`]: question/answer corpora.
//!
//! The law and guideline chunkers feed the shared [`merge`] pass, which
//! folds undersized chunks into neighbours without exceeding a maximum
//! size. Chunkers never fail on malformed structure; missing paragraphs or
//! items simply degrade to flatter chunk shapes.

pub mod guideline;
pub mod law;
pub mod merge;
pub mod qa;

pub use guideline::{GuidelineChunkOptions, chunk_guideline};
pub use law::{LawChunkMode, LawChunkOptions, chunk_law};
pub use merge::merge_undersized;
pub use qa::{QaChunkOptions, chunk_qa};

/// Default lower bound below which a chunk is merged into its neighbour.
pub const DEFAULT_MIN_CHUNK_SIZE: usize = 100;
/// Default upper bound a merge may never exceed.
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 2000;
