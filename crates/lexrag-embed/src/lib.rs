//! Embedding gateway: a thin façade over an external embedding provider.
//!
//! The provider is constructed once at process start and injected wherever
//! embeddings are needed; the gateway adds the operation-name error
//! wrapping and the one-vector-per-input contract check, and nothing else.
//! Retry policy belongs to callers.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

#[cfg(feature = "onnx")]
mod onnx;
#[cfg(feature = "onnx")]
pub use onnx::OnnxEmbedder;

/// Failure surfaced by the gateway or its provider.
#[derive(Debug, Error)]
pub enum EmbedError {
    /// The underlying provider failed; `op` names the failing operation.
    #[error("{op}: {source}")]
    Provider {
        op: &'static str,
        #[source]
        source: anyhow::Error,
    },

    /// Provider broke the order-preserving batch contract.
    #[error("provider returned {got} vectors for {expected} inputs")]
    ShapeMismatch { expected: usize, got: usize },
}

/// An external embedding provider producing fixed-dimension float vectors.
///
/// `embed_many` must be order-preserving: one vector per input text, in
/// input order. The dimension is provider-defined and treated opaquely
/// downstream.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embedding dimensionality.
    fn dim(&self) -> usize;

    /// Embed a batch of texts in a single provider call.
    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError>;
}

/// Façade over an [`EmbeddingProvider`].
///
/// Cheap to clone; clones share the underlying provider, preserving the
/// construct-once, reuse-everywhere lifetime without hidden global state.
#[derive(Clone)]
pub struct EmbeddingGateway {
    provider: Arc<dyn EmbeddingProvider>,
}

impl EmbeddingGateway {
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self { provider }
    }

    pub fn dim(&self) -> usize {
        self.provider.dim()
    }

    /// Embed a single text.
    pub async fn embed_one(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let texts = [text.to_string()];
        let mut vectors = self.embed_many(&texts).await?;
        Ok(vectors.remove(0))
    }

    /// Embed a batch of texts, enforcing the one-vector-per-input contract.
    pub async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }
        let vectors = self.provider.embed_many(texts).await?;
        if vectors.len() != texts.len() {
            return Err(EmbedError::ShapeMismatch {
                expected: texts.len(),
                got: vectors.len(),
            });
        }
        Ok(vectors)
    }
}

impl std::fmt::Debug for EmbeddingGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingGateway")
            .field("dim", &self.provider.dim())
            .finish()
    }
}
