//! ONNX Runtime embedding provider for sentence-transformers models.
//!
//! Produces mean-pooled, L2-normalised embeddings. The model directory must
//! contain `model.onnx` and `tokenizer.json`.

use std::path::Path;

use async_trait::async_trait;
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::Tokenizer;
use tokio::sync::Mutex;
use tracing::info;

use crate::{EmbedError, EmbeddingProvider};

/// Maximum token length fed to the model; longer inputs are truncated.
const MAX_TOKENS: usize = 256;

/// Embedding provider backed by a local ONNX sentence-transformer.
///
/// The ort session requires exclusive access per inference call, so the
/// provider serialises calls behind an async mutex. Inference is CPU-bound;
/// callers wanting isolation run the provider on a blocking-friendly
/// runtime.
pub struct OnnxEmbedder {
    inner: Mutex<Inner>,
    dim: usize,
}

struct Inner {
    session: Session,
    tokenizer: Tokenizer,
}

impl OnnxEmbedder {
    /// Load a model from a directory containing `model.onnx` and
    /// `tokenizer.json`.
    pub fn load(model_dir: &Path) -> anyhow::Result<Self> {
        let model_path = model_dir.join("model.onnx");
        let tokenizer_path = model_dir.join("tokenizer.json");
        anyhow::ensure!(model_path.exists(), "model.onnx not found in {model_dir:?}");
        anyhow::ensure!(
            tokenizer_path.exists(),
            "tokenizer.json not found in {model_dir:?}"
        );

        let session = Session::builder()?.commit_from_file(&model_path)?;
        let dim = output_dim(session.outputs()[0].dtype()).unwrap_or(384);

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("load tokenizer: {e}"))?;
        tokenizer
            .with_truncation(Some(tokenizers::TruncationParams {
                max_length: MAX_TOKENS,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("set truncation: {e}"))?;
        tokenizer.with_padding(Some(tokenizers::PaddingParams::default()));

        info!(dim, model = %model_path.display(), "loaded embedding model");
        Ok(Self {
            inner: Mutex::new(Inner { session, tokenizer }),
            dim,
        })
    }

    fn run_batch(&self, inner: &mut Inner, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        let batch_size = texts.len();
        let encodings = inner
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| anyhow::anyhow!("tokenize: {e}"))?;
        let seq_len = encodings
            .iter()
            .map(|e| e.get_ids().len())
            .max()
            .unwrap_or(0);

        // Flatten to [batch_size, seq_len] input tensors.
        let mut input_ids = vec![0i64; batch_size * seq_len];
        let mut attention_mask = vec![0i64; batch_size * seq_len];
        let mut token_type_ids = vec![0i64; batch_size * seq_len];
        for (row, encoding) in encodings.iter().enumerate() {
            let offset = row * seq_len;
            for (col, &id) in encoding.get_ids().iter().enumerate() {
                input_ids[offset + col] = id as i64;
            }
            for (col, &mask) in encoding.get_attention_mask().iter().enumerate() {
                attention_mask[offset + col] = mask as i64;
            }
            for (col, &tid) in encoding.get_type_ids().iter().enumerate() {
                token_type_ids[offset + col] = tid as i64;
            }
        }

        let shape = [batch_size as i64, seq_len as i64];
        let outputs = inner.session.run(ort::inputs![
            "input_ids" => Tensor::from_array((shape, input_ids.into_boxed_slice()))?,
            "attention_mask" => Tensor::from_array((shape, attention_mask.clone().into_boxed_slice()))?,
            "token_type_ids" => Tensor::from_array((shape, token_type_ids.into_boxed_slice()))?,
        ])?;

        let (output_shape, output_data) = outputs[0].try_extract_tensor::<f32>()?;
        let dims: &[i64] = output_shape;
        anyhow::ensure!(
            dims.len() == 3 && dims[0] as usize == batch_size && dims[2] as usize == self.dim,
            "unexpected output shape {dims:?} for batch of {batch_size}"
        );
        let actual_seq_len = dims[1] as usize;

        let mut embeddings = Vec::with_capacity(batch_size);
        for row in 0..batch_size {
            embeddings.push(mean_pool(
                output_data,
                &attention_mask[row * seq_len..(row + 1) * seq_len],
                row,
                actual_seq_len,
                self.dim,
            ));
        }
        Ok(embeddings)
    }
}

#[async_trait]
impl EmbeddingProvider for OnnxEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }
        let mut inner = self.inner.lock().await;
        self.run_batch(&mut inner, texts)
            .map_err(|source| EmbedError::Provider {
                op: "onnx_embed_batch",
                source,
            })
    }
}

/// Attention-masked mean pooling followed by L2 normalisation.
fn mean_pool(
    token_embeddings: &[f32],
    attention_mask: &[i64],
    row: usize,
    seq_len: usize,
    dim: usize,
) -> Vec<f32> {
    let mut pooled = vec![0.0f32; dim];
    let mut token_count = 0.0f32;
    for (col, &mask) in attention_mask.iter().take(seq_len).enumerate() {
        if mask > 0 {
            let offset = (row * seq_len + col) * dim;
            for (d, p) in pooled.iter_mut().enumerate() {
                *p += token_embeddings[offset + d];
            }
            token_count += 1.0;
        }
    }
    if token_count > 0.0 {
        for p in &mut pooled {
            *p /= token_count;
        }
    }
    let norm: f32 = pooled.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for p in &mut pooled {
            *p /= norm;
        }
    }
    pooled
}

/// Infer the embedding dimension from the model's first output tensor.
fn output_dim(output_type: &ort::value::ValueType) -> Option<usize> {
    match output_type {
        ort::value::ValueType::Tensor { shape, .. } => shape
            .last()
            .and_then(|&d| if d > 0 { Some(d as usize) } else { None }),
        _ => None,
    }
}
