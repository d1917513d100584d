//! LanceDB document store: persistence and similarity search over the
//! shared `legal_documents` table, plus the multi-source fan-out.

use std::path::Path;

use arrow::array::RecordBatchIterator;
use arrow::record_batch::RecordBatch;
use futures::TryStreamExt;
use futures::future::try_join_all;
use lancedb::query::{ExecutableQuery, QueryBase};
use tracing::info;

use lexrag_core::chunk::Chunk;
use lexrag_core::source::Source;
use lexrag_embed::EmbeddingGateway;

use crate::decode::{SearchResult, decode_batches};
use crate::error::StoreError;
use crate::schema::{StoredDocument, TABLE_NAME, encode_batch};

#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Maximum rows returned, nearest first.
    pub limit: usize,
    /// Restrict to one document family. The enum is the allow-list; raw
    /// strings must pass [`Source::parse`] before they get here.
    pub source: Option<Source>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: 10,
            source: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MultiSearchOptions {
    pub limit_per_source: usize,
    pub sources: Vec<Source>,
}

/// Document store over a single LanceDB table.
///
/// The connection is created once in [`DocumentStore::open`] and reused by
/// every operation. Reads and appends are individually consistent;
/// concurrent `add_documents` racing a `clear_table` is not, and must be
/// serialised by the caller.
pub struct DocumentStore {
    db: lancedb::Connection,
    gateway: EmbeddingGateway,
    table_name: String,
}

impl DocumentStore {
    /// Connect to a LanceDB database at the given path, creating the
    /// directory if absent.
    pub async fn open(path: &Path, gateway: EmbeddingGateway) -> Result<Self, StoreError> {
        let uri = path
            .to_str()
            .ok_or_else(|| StoreError::Other("non-UTF8 database path".into()))?;
        let db = lancedb::connect(uri)
            .execute()
            .await
            .map_err(StoreError::lance("connect"))?;
        Ok(Self {
            db,
            gateway,
            table_name: TABLE_NAME.to_string(),
        })
    }

    /// Embed and persist a batch of chunks. No-op on empty input.
    ///
    /// Embeddings are generated in one gateway batch call; rows are
    /// appended to the table, which is created on first write.
    pub async fn add_documents(&self, chunks: &[Chunk]) -> Result<usize, StoreError> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let vectors = self
            .gateway
            .embed_many(&texts)
            .await
            .map_err(|source| StoreError::Embedding {
                op: "embed_documents",
                source,
            })?;

        let docs: Vec<StoredDocument> = chunks
            .iter()
            .zip(vectors)
            .map(|(chunk, vector)| StoredDocument::from_chunk(chunk, vector))
            .collect();
        let batch = encode_batch(&docs, self.gateway.dim())?;
        let rows = batch.num_rows();

        if self.table_exists().await? {
            let table = self.open_table().await?;
            table
                .add(Box::new(batch_reader(batch)))
                .execute()
                .await
                .map_err(StoreError::lance("append_rows"))?;
        } else {
            self.db
                .create_table(&self.table_name, Box::new(batch_reader(batch)))
                .execute()
                .await
                .map_err(StoreError::lance("create_table"))?;
        }

        info!(table = %self.table_name, rows, "stored documents");
        Ok(rows)
    }

    /// Similarity search: nearest `limit` rows to the query text,
    /// ascending by distance, optionally restricted to one source.
    pub async fn search(
        &self,
        query: &str,
        opts: &SearchOptions,
    ) -> Result<Vec<SearchResult>, StoreError> {
        if query.trim().is_empty() {
            return Err(StoreError::EmptyQuery);
        }

        let vector = self
            .gateway
            .embed_one(query)
            .await
            .map_err(|source| StoreError::Embedding {
                op: "embed_query",
                source,
            })?;

        let table = self.open_table().await?;
        let mut request = table
            .vector_search(vector.as_slice())
            .map_err(StoreError::lance("vector_search"))?
            .limit(opts.limit);
        if let Some(source) = opts.source {
            // The predicate is built from the enum's fixed string, so no
            // caller-controlled text can reach the filter expression.
            request = request.only_if(format!("source = '{}'", source.as_str()));
        }

        let batches: Vec<RecordBatch> = request
            .execute()
            .await
            .map_err(StoreError::lance("execute_query"))?
            .try_collect()
            .await
            .map_err(StoreError::lance("collect_results"))?;

        decode_batches(&batches)
    }

    /// Fan a query out across several sources concurrently and merge the
    /// hits into one globally-ranked list.
    ///
    /// Sub-searches run fire-all/await-all; the output order is imposed by
    /// the final sort (ascending score, ties broken by source name then id)
    /// so completion order never shows through.
    pub async fn multi_search(
        &self,
        query: &str,
        opts: &MultiSearchOptions,
    ) -> Result<Vec<SearchResult>, StoreError> {
        if query.trim().is_empty() {
            return Err(StoreError::EmptyQuery);
        }

        let searches = opts.sources.iter().map(|&source| {
            let per_source = SearchOptions {
                limit: opts.limit_per_source,
                source: Some(source),
            };
            async move { self.search(query, &per_source).await }
        });
        let groups = try_join_all(searches).await?;

        let mut results: Vec<SearchResult> = groups.into_iter().flatten().collect();
        results.sort_by(|a, b| {
            a.score
                .total_cmp(&b.score)
                .then_with(|| a.source.as_str().cmp(b.source.as_str()))
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(results)
    }

    /// Drop the table if it exists. Idempotent.
    pub async fn clear_table(&self) -> Result<(), StoreError> {
        if self.table_exists().await? {
            self.db
                .drop_table(&self.table_name, &[])
                .await
                .map_err(StoreError::lance("drop_table"))?;
            info!(table = %self.table_name, "dropped table");
        }
        Ok(())
    }

    /// Row count; 0 when the table has not been created yet.
    pub async fn count_documents(&self) -> Result<usize, StoreError> {
        if !self.table_exists().await? {
            return Ok(0);
        }
        let table = self.open_table().await?;
        let count = table
            .count_rows(None)
            .await
            .map_err(StoreError::lance("count_rows"))?;
        Ok(count)
    }

    // ── Internal ──

    async fn table_exists(&self) -> Result<bool, StoreError> {
        let names = self
            .db
            .table_names()
            .execute()
            .await
            .map_err(StoreError::lance("list_tables"))?;
        Ok(names.contains(&self.table_name))
    }

    async fn open_table(&self) -> Result<lancedb::Table, StoreError> {
        self.db
            .open_table(&self.table_name)
            .execute()
            .await
            .map_err(StoreError::lance("open_table"))
    }
}

fn batch_reader(
    batch: RecordBatch,
) -> RecordBatchIterator<std::vec::IntoIter<Result<RecordBatch, arrow::error::ArrowError>>> {
    let schema = batch.schema();
    RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema)
}
