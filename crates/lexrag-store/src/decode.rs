//! Strict row decoding: persisted rows back into typed search results.
//!
//! Every required field is checked for presence and type; a row that fails
//! any check raises [`StoreError::Decode`] rather than being coerced.

use arrow::array::{Float32Array, StringArray};
use arrow::record_batch::RecordBatch;

use lexrag_core::chunk::ChunkMetadata;
use lexrag_core::source::Source;

use crate::StoreError;

/// One ranked similarity hit. `score` is a distance: lower is closer.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub id: String,
    pub content: String,
    pub source: Source,
    pub article_number: Option<String>,
    pub category: Option<String>,
    pub filename: Option<String>,
    pub metadata: ChunkMetadata,
    pub score: f32,
}

/// Decode one row of a similarity-query result batch.
pub fn parse_search_result(batch: &RecordBatch, row: usize) -> Result<SearchResult, StoreError> {
    let id = str_value(batch, "id", row)?;
    let content = str_value(batch, "content", row)?;
    let source_str = str_value(batch, "source", row)?;
    let source = Source::parse(&source_str)
        .map_err(|e| StoreError::Decode(format!("row {row}: {e}")))?;

    let article_number = non_empty(str_value(batch, "article_number", row)?);
    let category = non_empty(str_value(batch, "category", row)?);
    let filename = non_empty(str_value(batch, "filename", row)?);

    let blob = str_value(batch, "metadata", row)?;
    let metadata: ChunkMetadata = serde_json::from_str(&blob)?;
    if metadata_source(&metadata) != source {
        return Err(StoreError::Decode(format!(
            "row {row}: metadata family {:?} disagrees with source column {source}",
            metadata_source(&metadata)
        )));
    }

    let score = f32_value(batch, "_distance", row)?;

    Ok(SearchResult {
        id,
        content,
        source,
        article_number,
        category,
        filename,
        metadata,
        score,
    })
}

pub(crate) fn decode_batches(batches: &[RecordBatch]) -> Result<Vec<SearchResult>, StoreError> {
    let mut results = Vec::new();
    for batch in batches {
        for row in 0..batch.num_rows() {
            results.push(parse_search_result(batch, row)?);
        }
    }
    Ok(results)
}

fn metadata_source(metadata: &ChunkMetadata) -> Source {
    match metadata {
        ChunkMetadata::Law(_) => Source::Law,
        ChunkMetadata::Guideline(_) => Source::Guideline,
        ChunkMetadata::Qa(_) => Source::Qa,
        ChunkMetadata::Violation(_) => Source::Violation,
    }
}

/// Empty string is the physical encoding for "not applicable".
fn non_empty(s: String) -> Option<String> {
    if s.is_empty() { None } else { Some(s) }
}

fn str_value(batch: &RecordBatch, name: &str, row: usize) -> Result<String, StoreError> {
    let column = batch
        .column_by_name(name)
        .ok_or_else(|| StoreError::Decode(format!("missing column {name:?}")))?;
    let array = column
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| {
            StoreError::Decode(format!(
                "column {name:?}: expected Utf8, got {:?}",
                column.data_type()
            ))
        })?;
    Ok(array.value(row).to_string())
}

fn f32_value(batch: &RecordBatch, name: &str, row: usize) -> Result<f32, StoreError> {
    let column = batch
        .column_by_name(name)
        .ok_or_else(|| StoreError::Decode(format!("missing column {name:?}")))?;
    let array = column
        .as_any()
        .downcast_ref::<Float32Array>()
        .ok_or_else(|| {
            StoreError::Decode(format!(
                "column {name:?}: expected Float32, got {:?}",
                column.data_type()
            ))
        })?;
    Ok(array.value(row))
}
