//! Text embeddings for semantic intent matching
//!
//! The classifier treats the embedding model as a frozen external
//! dependency behind [`TextEmbedder`]. The real backend is an ONNX
//! sentence encoder (MiniLM-class, `onnx` feature); without it a
//! deterministic hashed bag-of-words embedder stands in, which keeps the
//! pipeline and its tests runnable with no model files on disk.

use crate::Result;

/// Embeds text into a dense vector
///
/// Implementations are synchronous and CPU-bound; the classifier may hold
/// a lock across calls.
pub trait TextEmbedder: Send + Sync {
    /// Embed one text
    ///
    /// # Errors
    ///
    /// Returns error if the model fails
    fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Compute cosine similarity between two vectors
///
/// Returns 0.0 if either vector has zero magnitude or the lengths differ
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let mut dot = 0.0_f32;
    let mut norm_a = 0.0_f32;
    let mut norm_b = 0.0_f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        return 0.0;
    }

    dot / denom
}

/// Deterministic hashed bag-of-words embedder
///
/// Each token is FNV-hashed onto a dimension with a hash-derived sign, and
/// the resulting vector is L2-normalized. Identical texts always embed
/// identically, which is what the classifier's idempotence contract needs.
pub struct HashEmbedder {
    dim: usize,
}

impl HashEmbedder {
    /// Create an embedder with the given output dimension
    #[must_use]
    pub const fn new(dim: usize) -> Self {
        Self { dim }
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(384)
    }
}

impl TextEmbedder for HashEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0_f32; self.dim];

        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let hash = fnv1a(token.to_lowercase().as_bytes());
            let index = usize::try_from(hash % self.dim as u64).unwrap_or(0);
            let sign = if (hash >> 63) == 0 { 1.0 } else { -1.0 };
            vector[index] += sign;
        }

        normalize(&mut vector);
        Ok(vector)
    }
}

/// 64-bit FNV-1a; fixed constants so embeddings are stable across builds
const fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash = 0xcbf2_9ce4_8422_2325_u64;
    let mut i = 0;
    while i < bytes.len() {
        hash ^= bytes[i] as u64;
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
        i += 1;
    }
    hash
}

/// Scale a vector to unit length in place
fn normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in vector.iter_mut() {
            *v /= norm;
        }
    }
}

/// ONNX sentence encoder (MiniLM-class)
///
/// Loads `model.onnx` and `tokenizer.json` from a model directory, mean
/// pools the last hidden state and L2-normalizes.
#[cfg(feature = "onnx")]
pub struct OnnxEmbedder {
    session: std::sync::Mutex<ort::Session>,
    tokenizer: tokenizers::Tokenizer,
    max_seq_len: usize,
    dim: usize,
}

#[cfg(feature = "onnx")]
impl OnnxEmbedder {
    const MAX_SEQ_LEN: usize = 256;
    const DIM: usize = 384;

    /// Load the encoder from a model directory
    ///
    /// # Errors
    ///
    /// Returns error if the model or tokenizer cannot be loaded
    pub fn load(model_dir: &std::path::Path) -> Result<Self> {
        use crate::Error;

        let session = ort::Session::builder()
            .map_err(|e| Error::Embedding(e.to_string()))?
            .with_optimization_level(ort::GraphOptimizationLevel::Level3)
            .map_err(|e| Error::Embedding(e.to_string()))?
            .commit_from_file(model_dir.join("model.onnx"))
            .map_err(|e| Error::Embedding(e.to_string()))?;

        let tokenizer = tokenizers::Tokenizer::from_file(model_dir.join("tokenizer.json"))
            .map_err(|e| Error::Embedding(e.to_string()))?;

        tracing::debug!(model_dir = %model_dir.display(), "ONNX embedder loaded");

        Ok(Self {
            session: std::sync::Mutex::new(session),
            tokenizer,
            max_seq_len: Self::MAX_SEQ_LEN,
            dim: Self::DIM,
        })
    }
}

#[cfg(feature = "onnx")]
impl TextEmbedder for OnnxEmbedder {
    #[allow(clippy::cast_precision_loss)]
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        use crate::Error;

        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| Error::Embedding(e.to_string()))?;

        let seq_len = encoding.get_ids().len().min(self.max_seq_len);

        let mut input_ids = vec![0_i64; self.max_seq_len];
        let mut attention_mask = vec![0_i64; self.max_seq_len];
        let mut token_type_ids = vec![0_i64; self.max_seq_len];

        for i in 0..seq_len {
            input_ids[i] = i64::from(encoding.get_ids()[i]);
            attention_mask[i] = i64::from(encoding.get_attention_mask()[i]);
            token_type_ids[i] = i64::from(encoding.get_type_ids()[i]);
        }

        let input_ids = ndarray::Array2::from_shape_vec((1, self.max_seq_len), input_ids)
            .map_err(|e| Error::Embedding(e.to_string()))?;
        let attention_mask =
            ndarray::Array2::from_shape_vec((1, self.max_seq_len), attention_mask)
                .map_err(|e| Error::Embedding(e.to_string()))?;
        let token_type_ids =
            ndarray::Array2::from_shape_vec((1, self.max_seq_len), token_type_ids)
                .map_err(|e| Error::Embedding(e.to_string()))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| Error::Embedding("embedder session poisoned".to_string()))?;

        let outputs = session
            .run(
                ort::inputs![
                    "input_ids" => input_ids.view(),
                    "attention_mask" => attention_mask.view(),
                    "token_type_ids" => token_type_ids.view(),
                ]
                .map_err(|e| Error::Embedding(e.to_string()))?,
            )
            .map_err(|e| Error::Embedding(e.to_string()))?;

        let hidden = outputs
            .get("last_hidden_state")
            .ok_or_else(|| Error::Embedding("missing output tensor".to_string()))?
            .try_extract_tensor::<f32>()
            .map_err(|e| Error::Embedding(e.to_string()))?;
        let hidden = hidden.view();

        // Mean pooling over the real (unpadded) sequence positions
        let mut vector = vec![0.0_f32; self.dim];
        for j in 0..seq_len {
            for (k, v) in vector.iter_mut().enumerate() {
                *v += hidden[[0, j, k]];
            }
        }
        for v in &mut vector {
            *v /= seq_len.max(1) as f32;
        }

        normalize(&mut vector);
        Ok(vector)
    }
}

/// Build the embedder the configuration asks for
///
/// With the `onnx` feature and a configured model directory, loads the
/// ONNX encoder; otherwise falls back to the hashed embedder.
///
/// # Errors
///
/// Returns error if a configured ONNX model fails to load
pub fn default_embedder(
    config: &crate::config::NlpConfig,
) -> Result<std::sync::Arc<dyn TextEmbedder>> {
    #[cfg(feature = "onnx")]
    if let Some(model_dir) = &config.model_dir {
        return Ok(std::sync::Arc::new(OnnxEmbedder::load(model_dir)?));
    }

    #[cfg(not(feature = "onnx"))]
    if config.model_dir.is_some() {
        tracing::warn!("nlp.model_dir set but the onnx feature is disabled; using hashed embedder");
    }

    Ok(std::sync::Arc::new(HashEmbedder::default()))
}
