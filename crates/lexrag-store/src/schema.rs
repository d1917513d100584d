//! Physical schema and chunk-to-row flattening.
//!
//! Every document family shares one table: flat Utf8 columns for equality
//! filtering (`source`, `article_number`, `category`, `filename`), the
//! serialized metadata blob, and a fixed-size vector column. The flat
//! columns use the empty string for "not applicable"; that encoding exists
//! only here, and the logical model carries `Option<String>`.

use std::sync::Arc;

use arrow::array::{FixedSizeListBuilder, Float32Builder, RecordBatch, StringArray};
use arrow::datatypes::{DataType, Field, Schema};

use lexrag_core::chunk::{Chunk, ChunkMetadata};
use lexrag_core::source::Source;

use crate::StoreError;

/// The single table all document families share.
pub const TABLE_NAME: &str = "legal_documents";

/// Arrow schema for the document table.
pub fn document_schema(dim: i32) -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("content", DataType::Utf8, false),
        Field::new("source", DataType::Utf8, false),
        Field::new("article_number", DataType::Utf8, false),
        Field::new("category", DataType::Utf8, false),
        Field::new("filename", DataType::Utf8, false),
        Field::new("metadata", DataType::Utf8, false),
        Field::new(
            "vector",
            DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim),
            true,
        ),
    ]))
}

/// Logical persisted row: a chunk flattened for storage.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub content: String,
    pub vector: Vec<f32>,
    pub source: Source,
    pub article_number: Option<String>,
    pub category: Option<String>,
    pub filename: Option<String>,
    pub metadata: ChunkMetadata,
}

impl StoredDocument {
    /// Flatten a chunk and its embedding into a row, projecting the
    /// family-specific metadata onto the filter columns.
    pub fn from_chunk(chunk: &Chunk, vector: Vec<f32>) -> Self {
        let (source, article_number, category, filename) = match &chunk.metadata {
            ChunkMetadata::Law(m) => {
                (Source::Law, Some(m.article_number.clone()), None, None)
            }
            ChunkMetadata::Guideline(m) => {
                (Source::Guideline, None, None, Some(m.filename.clone()))
            }
            ChunkMetadata::Qa(m) => (Source::Qa, None, Some(m.category.clone()), None),
            ChunkMetadata::Violation(m) => {
                (Source::Violation, None, Some(m.category.clone()), None)
            }
        };
        Self {
            id: chunk.id.clone(),
            content: chunk.content.clone(),
            vector,
            source,
            article_number,
            category,
            filename,
            metadata: chunk.metadata.clone(),
        }
    }
}

/// Encode rows into one RecordBatch; `None` filter fields become `""`.
pub(crate) fn encode_batch(
    docs: &[StoredDocument],
    dim: usize,
) -> Result<RecordBatch, StoreError> {
    let mut metadata_blobs = Vec::with_capacity(docs.len());
    for doc in docs {
        if doc.vector.len() != dim {
            return Err(StoreError::Other(format!(
                "document {} has a {}-dimensional vector, table expects {dim}",
                doc.id,
                doc.vector.len()
            )));
        }
        metadata_blobs.push(serde_json::to_string(&doc.metadata)?);
    }

    let ids = StringArray::from_iter_values(docs.iter().map(|d| d.id.as_str()));
    let contents = StringArray::from_iter_values(docs.iter().map(|d| d.content.as_str()));
    let sources = StringArray::from_iter_values(docs.iter().map(|d| d.source.as_str()));
    let article_numbers = StringArray::from_iter_values(
        docs.iter().map(|d| d.article_number.as_deref().unwrap_or("")),
    );
    let categories =
        StringArray::from_iter_values(docs.iter().map(|d| d.category.as_deref().unwrap_or("")));
    let filenames =
        StringArray::from_iter_values(docs.iter().map(|d| d.filename.as_deref().unwrap_or("")));
    let metadata = StringArray::from_iter_values(metadata_blobs.iter().map(String::as_str));

    let mut vectors = FixedSizeListBuilder::new(Float32Builder::new(), dim as i32);
    for doc in docs {
        vectors.values().append_slice(&doc.vector);
        vectors.append(true);
    }

    let batch = RecordBatch::try_new(
        document_schema(dim as i32),
        vec![
            Arc::new(ids),
            Arc::new(contents),
            Arc::new(sources),
            Arc::new(article_numbers),
            Arc::new(categories),
            Arc::new(filenames),
            Arc::new(metadata),
            Arc::new(vectors.finish()),
        ],
    )?;
    Ok(batch)
}
