use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{error, info};

use lexrag_chunk::{
    GuidelineChunkOptions, LawChunkMode, LawChunkOptions, QaChunkOptions, chunk_guideline,
    chunk_law, chunk_qa,
};
use lexrag_core::chunk::Chunk;
use lexrag_core::document::{GuidelineDocument, LawDocument, QaDocument};
use lexrag_core::source::Source;
use lexrag_embed::{EmbeddingGateway, OnnxEmbedder};
use lexrag_store::{DocumentStore, MultiSearchOptions, SearchOptions};

mod display;

#[derive(Parser)]
#[command(name = "lexrag", version, about = "Legal-reference ingestion and semantic search")]
struct Cli {
    /// LanceDB database directory.
    #[arg(long, global = true, default_value = "data/lancedb")]
    db: PathBuf,

    /// Directory containing model.onnx and tokenizer.json.
    #[arg(long, global = true, default_value = "models/all-MiniLM-L6-v2")]
    model: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Chunk, embed, and store documents from JSON files.
    ///
    /// Each document family is ingested independently; a failure in one
    /// family is logged and the others continue.
    Ingest {
        /// Law document (hierarchical articles/paragraphs/items).
        #[arg(long)]
        law: Option<PathBuf>,

        /// Array of PDF-derived guideline documents.
        #[arg(long)]
        guidelines: Option<PathBuf>,

        /// Array of QA corpora.
        #[arg(long)]
        qa: Option<PathBuf>,

        /// Chunk laws per paragraph instead of per article.
        #[arg(long)]
        per_paragraph: bool,

        /// Group QA items by category into larger chunks.
        #[arg(long)]
        combine_qa: bool,

        /// Drop the existing table before ingesting.
        #[arg(long)]
        rebuild: bool,
    },

    /// Similarity search, optionally restricted to one source.
    Search {
        query: String,

        /// One of: law, guideline, qa, violation.
        #[arg(long)]
        source: Option<String>,

        #[arg(long, default_value_t = 5)]
        limit: usize,
    },

    /// Concurrent search across several sources, merged by distance.
    MultiSearch {
        query: String,

        /// Comma-separated source list.
        #[arg(long, value_delimiter = ',', default_value = "law,guideline,qa")]
        sources: Vec<String>,

        #[arg(long, default_value_t = 3)]
        limit_per_source: usize,
    },

    /// Print the stored document count.
    Count,

    /// Drop the document table.
    Clear,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let embedder = OnnxEmbedder::load(&cli.model)
        .with_context(|| format!("loading embedding model from {:?}", cli.model))?;
    let gateway = EmbeddingGateway::new(Arc::new(embedder));
    let store = DocumentStore::open(&cli.db, gateway).await?;

    match cli.command {
        Command::Ingest {
            law,
            guidelines,
            qa,
            per_paragraph,
            combine_qa,
            rebuild,
        } => {
            if rebuild {
                store.clear_table().await?;
            }
            let failed = ingest(
                &store,
                law.as_deref(),
                guidelines.as_deref(),
                qa.as_deref(),
                per_paragraph,
                combine_qa,
            )
            .await;
            let total = store.count_documents().await?;
            println!("{total} documents stored");
            anyhow::ensure!(failed == 0, "{failed} document families failed to ingest");
        }
        Command::Search {
            query,
            source,
            limit,
        } => {
            let source = source.as_deref().map(Source::parse).transpose()?;
            let results = store
                .search(&query, &SearchOptions { limit, source })
                .await?;
            display::print_results(&results);
        }
        Command::MultiSearch {
            query,
            sources,
            limit_per_source,
        } => {
            let sources = sources
                .iter()
                .map(|s| Source::parse(s))
                .collect::<Result<Vec<_>, _>>()?;
            let results = store
                .multi_search(
                    &query,
                    &MultiSearchOptions {
                        limit_per_source,
                        sources,
                    },
                )
                .await?;
            display::print_results(&results);
        }
        Command::Count => {
            println!("{}", store.count_documents().await?);
        }
        Command::Clear => {
            store.clear_table().await?;
            println!("cleared");
        }
    }
    Ok(())
}

/// Ingest each requested family, continuing past per-family failures.
/// Returns the number of families that failed.
async fn ingest(
    store: &DocumentStore,
    law: Option<&Path>,
    guidelines: Option<&Path>,
    qa: Option<&Path>,
    per_paragraph: bool,
    combine_qa: bool,
) -> usize {
    let mut failed = 0usize;

    if let Some(path) = law {
        let result = ingest_law(store, path, per_paragraph).await;
        failed += log_family("law", result);
    }
    if let Some(path) = guidelines {
        let result = ingest_guidelines(store, path).await;
        failed += log_family("guideline", result);
    }
    if let Some(path) = qa {
        let result = ingest_qa(store, path, combine_qa).await;
        failed += log_family("qa", result);
    }
    failed
}

fn log_family(family: &str, result: anyhow::Result<usize>) -> usize {
    match result {
        Ok(chunks) => {
            info!(family, chunks, "ingested document family");
            0
        }
        Err(err) => {
            error!(family, error = %format!("{err:#}"), "family ingestion failed; continuing");
            1
        }
    }
}

async fn ingest_law(
    store: &DocumentStore,
    path: &Path,
    per_paragraph: bool,
) -> anyhow::Result<usize> {
    let doc: LawDocument = read_json(path)?;
    let opts = LawChunkOptions {
        mode: if per_paragraph {
            LawChunkMode::Paragraph
        } else {
            LawChunkMode::Article
        },
        ..Default::default()
    };
    let chunks = chunk_law(&doc, &opts);
    add_all(store, chunks).await
}

async fn ingest_guidelines(store: &DocumentStore, path: &Path) -> anyhow::Result<usize> {
    let docs: Vec<GuidelineDocument> = read_json(path)?;
    let opts = GuidelineChunkOptions::default();
    let mut chunks = Vec::new();
    for doc in &docs {
        chunks.extend(chunk_guideline(doc, &opts));
    }
    add_all(store, chunks).await
}

async fn ingest_qa(store: &DocumentStore, path: &Path, combine: bool) -> anyhow::Result<usize> {
    let docs: Vec<QaDocument> = read_json(path)?;
    let opts = QaChunkOptions {
        combine_by_category: combine,
        ..Default::default()
    };
    let mut chunks = Vec::new();
    for doc in &docs {
        chunks.extend(chunk_qa(doc, &opts));
    }
    add_all(store, chunks).await
}

async fn add_all(store: &DocumentStore, chunks: Vec<Chunk>) -> anyhow::Result<usize> {
    let stored = store.add_documents(&chunks).await?;
    Ok(stored)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading {path:?}"))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {path:?}"))
}
