use lexrag_core::source::ParseSourceError;
use lexrag_embed::EmbedError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Rejected before any I/O: query text was empty or whitespace-only.
    #[error("query text is empty")]
    EmptyQuery,

    /// Rejected before any I/O: source string failed the allow-list.
    #[error(transparent)]
    InvalidSource(#[from] ParseSourceError),

    /// The embedding gateway failed; `op` names the failing operation.
    #[error("{op}: {source}")]
    Embedding {
        op: &'static str,
        #[source]
        source: EmbedError,
    },

    /// A LanceDB operation failed; `op` names the failing operation.
    #[error("{op}: {source}")]
    Lance {
        op: &'static str,
        #[source]
        source: lancedb::Error,
    },

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// A persisted row is missing or mis-typing a required field.
    #[error("row decode failed: {0}")]
    Decode(String),

    /// The opaque metadata blob did not parse back into a known family.
    #[error("metadata blob: {0}")]
    Metadata(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl StoreError {
    /// Wrap a LanceDB error with the name of the failing operation.
    pub(crate) fn lance(op: &'static str) -> impl FnOnce(lancedb::Error) -> StoreError {
        move |source| StoreError::Lance { op, source }
    }
}
