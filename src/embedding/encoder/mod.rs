//! Bi-encoder: independent embeddings for the query and each candidate.
//!
//! Use [`EncoderConfig::stub`] for tests without model files.

pub mod config;


pub use config::{ENCODER_EMBEDDING_DIM, ENCODER_MAX_SEQ_LEN, EncoderConfig};

use std::sync::Arc;

use candle_core::{Device, Tensor};
use tokenizers::Tokenizer;
use tracing::{debug, info, warn};

use crate::embedding::bert::BertEncoder;
use crate::embedding::device::select_device;
use crate::embedding::error::EmbeddingError;
use crate::embedding::utils::{
    content_terms, l2_normalize, load_tokenizer_with_truncation, missing_model_file,
};
use crate::embedding::{ModelMode, TextEmbedder};

enum EncoderBackend {
    Model {
        model: BertEncoder,
        tokenizer: Arc<Tokenizer>,
        device: Device,
    },
    Stub,
}

/// Sentence embedder for stage 1 (supports stub mode).
pub struct BiEncoder {
    backend: EncoderBackend,
    config: EncoderConfig,
}

impl std::fmt::Debug for BiEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BiEncoder")
            .field(
                "backend",
                &match &self.backend {
                    EncoderBackend::Model { device, .. } => format!("Model({:?})", device),
                    EncoderBackend::Stub => "Stub".to_string(),
                },
            )
            .field("embedding_dim", &self.embedding_dim())
            .field("max_seq_len", &self.config.max_seq_len)
            .finish()
    }
}

impl BiEncoder {
    /// Loads the encoder; a config without `model_path` yields the stub.
    pub fn load(config: EncoderConfig) -> Result<Self, EmbeddingError> {
        config.validate()?;

        let Some(model_path) = config.model_path.clone() else {
            warn!("No encoder model path configured, using deterministic stub embeddings");
            return Ok(Self {
                backend: EncoderBackend::Stub,
                config,
            });
        };

        if let Some(missing) = missing_model_file(&model_path) {
            return Err(EmbeddingError::ModelLoadFailed {
                reason: format!("Missing {} in {}", missing, model_path.display()),
            });
        }

        let device = select_device();
        debug!(?device, "Selected compute device for encoder");

        let model = BertEncoder::load(&model_path, &device).map_err(|e| {
            EmbeddingError::ModelLoadFailed {
                reason: format!("Failed to load BERT encoder: {}", e),
            }
        })?;

        let tokenizer =
            load_tokenizer_with_truncation(&model_path, config.max_seq_len).map_err(|e| {
                EmbeddingError::ModelLoadFailed {
                    reason: format!("Failed to load tokenizer: {}", e),
                }
            })?;

        info!(
            model_path = %model_path.display(),
            hidden_size = model.hidden_size(),
            max_seq_len = config.max_seq_len,
            "Encoder model loaded"
        );

        Ok(Self {
            backend: EncoderBackend::Model {
                model,
                tokenizer: Arc::new(tokenizer),
                device,
            },
            config,
        })
    }

    pub fn stub() -> Self {
        Self {
            backend: EncoderBackend::Stub,
            config: EncoderConfig::stub(),
        }
    }

    /// Generates an L2-normalized embedding.
    pub fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if text.trim().is_empty() {
            return Err(EmbeddingError::EmptyInput);
        }

        match &self.backend {
            EncoderBackend::Model {
                model,
                tokenizer,
                device,
            } => Self::embed_with_model(text, model, tokenizer, device),
            EncoderBackend::Stub => self.embed_stub(text),
        }
    }

    fn embed_with_model(
        text: &str,
        model: &BertEncoder,
        tokenizer: &Tokenizer,
        device: &Device,
    ) -> Result<Vec<f32>, EmbeddingError> {
        let encoding =
            tokenizer
                .encode(text, true)
                .map_err(|e| EmbeddingError::TokenizationFailed {
                    reason: e.to_string(),
                })?;

        if encoding.get_ids().is_empty() {
            return Err(EmbeddingError::EmptyInput);
        }

        debug!(
            text_len = text.len(),
            token_count = encoding.get_ids().len(),
            "Generating embedding (encoder forward pass)"
        );

        let input_ids = Tensor::new(encoding.get_ids(), device)?.unsqueeze(0)?;
        let type_ids = Tensor::new(encoding.get_type_ids(), device)?.unsqueeze(0)?;
        let attention_mask = Tensor::new(encoding.get_attention_mask(), device)?.unsqueeze(0)?;

        let pooled = model
            .forward_pooled(&input_ids, &type_ids, &attention_mask)
            .map_err(|e| EmbeddingError::InferenceFailed {
                reason: format!("Encoder forward pass failed: {}", e),
            })?;

        let mut embedding = pooled.squeeze(0)?.to_vec1::<f32>()?;
        l2_normalize(&mut embedding);
        Ok(embedding)
    }

    /// Hashed bag-of-words: each content term increments one blake3-chosen
    /// bucket, so texts sharing vocabulary have positive cosine similarity.
    fn embed_stub(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let terms = content_terms(text);
        if terms.is_empty() {
            return Err(EmbeddingError::EmptyInput);
        }

        let dim = self.config.embedding_dim;
        let mut embedding = vec![0.0f32; dim];
        for term in &terms {
            let hash = blake3::hash(term.as_bytes());
            let mut bucket = [0u8; 8];
            bucket.copy_from_slice(&hash.as_bytes()[..8]);
            embedding[(u64::from_le_bytes(bucket) % dim as u64) as usize] += 1.0;
        }

        debug!(
            text_len = text.len(),
            term_count = terms.len(),
            "Generated stub embedding"
        );

        l2_normalize(&mut embedding);
        Ok(embedding)
    }

    /// Model hidden size when loaded, otherwise the configured stub width.
    pub fn embedding_dim(&self) -> usize {
        match &self.backend {
            EncoderBackend::Model { model, .. } => model.hidden_size(),
            EncoderBackend::Stub => self.config.embedding_dim,
        }
    }

    pub fn is_stub(&self) -> bool {
        matches!(self.backend, EncoderBackend::Stub)
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }
}

impl TextEmbedder for BiEncoder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        BiEncoder::embed(self, text)
    }

    fn mode(&self) -> ModelMode {
        if self.is_stub() {
            ModelMode::Stub
        } else {
            ModelMode::Model
        }
    }
}
