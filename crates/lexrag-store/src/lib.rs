//! Storage layer: LanceDB-backed document store and the multi-source
//! similarity retriever.
//!
//! Chunks from any document family are flattened into one physical schema
//! (equality-filter columns plus an opaque metadata blob), persisted with
//! their embedding vectors, and served back as ranked, filtered search
//! results.

mod decode;
mod error;
mod schema;
mod store;

pub use decode::{SearchResult, parse_search_result};
pub use error::StoreError;
pub use schema::{StoredDocument, TABLE_NAME, document_schema};
pub use store::{DocumentStore, MultiSearchOptions, SearchOptions};
