//! Chunk records: bounded units of text with family-specific provenance.
//!
//! A chunk is the unit of embedding and retrieval. Its metadata is a tagged
//! variant discriminated by the `source` field, so the store can flatten
//! any family into one physical schema and decode it back without loss.

use serde::{Deserialize, Serialize};

use crate::source::QaSource;

/// A bounded unit of text plus provenance metadata.
///
/// Invariants: `content` is non-empty after trimming; `id` is unique within
/// one ingestion run and follows `"<parentId>-<kind><index>"`. Identity does
/// not outlive an ingestion cycle; the corpus is rebuilt in full each run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub content: String,
    pub metadata: ChunkMetadata,
}

impl Chunk {
    /// Content length in characters (the unit all size thresholds use).
    pub fn len(&self) -> usize {
        crate::char_len(&self.content)
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// Family-specific chunk metadata, tagged by document source.
///
/// The serialized form is the opaque blob the store persists; the tag keeps
/// decode total across all stored families.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum ChunkMetadata {
    Law(LawMetadata),
    Guideline(GuidelineMetadata),
    Qa(QaMetadata),
    Violation(ViolationMetadata),
}

/// Structural level a law chunk was cut at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LawChunkKind {
    Article,
    Paragraph,
    Item,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LawMetadata {
    pub law_id: String,
    pub law_title: String,
    /// Article number; encodes a merged range as `"5-6"`.
    pub article_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub article_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paragraph_number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_number: Option<u32>,
    pub chunk_type: LawChunkKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuidelineMetadata {
    pub filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_title: Option<String>,
    /// Sequential position, renumbered after the merge pass.
    pub chunk_index: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaMetadata {
    pub qa_source: QaSource,
    pub category: String,
    /// Original item id; comma-joined when several items were combined.
    pub original_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Metadata for violation-case rows ingested by an external collaborator.
///
/// No chunker produces this family here; the variant keeps store decode
/// total over every value of the source column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViolationMetadata {
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}
