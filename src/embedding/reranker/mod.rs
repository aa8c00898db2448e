pub mod config;
pub mod error;

#[cfg(test)]
mod tests;

pub use config::{MAX_SEQ_LEN, RerankerConfig};
pub use error::RerankerError;

use std::collections::HashSet;

use candle_core::Tensor;
use tokenizers::Tokenizer;
use tracing::{debug, info, warn};

use crate::embedding::bert::BertClassifier;
use crate::embedding::device::select_device;
use crate::embedding::utils::{
    content_terms, load_tokenizer_with_truncation, missing_model_file, sigmoid,
};
use crate::embedding::{ModelMode, PairScorer};

/// Cross-encoder producing a relevance probability for a (query, candidate) pair.
pub struct CrossEncoder {
    device: candle_core::Device,
    config: RerankerConfig,
    model: Option<(BertClassifier, Tokenizer)>,
}

impl std::fmt::Debug for CrossEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrossEncoder")
            .field("device", &format!("{:?}", self.device))
            .field("config", &self.config)
            .field("model_loaded", &self.is_model_loaded())
            .finish()
    }
}

impl CrossEncoder {
    pub fn load(config: RerankerConfig) -> Result<Self, RerankerError> {
        if let Err(msg) = config.validate() {
            return Err(RerankerError::InvalidConfig { reason: msg });
        }

        let Some(model_path) = config.model_path.clone() else {
            warn!("No reranker model path configured, using deterministic stub scores");
            return Ok(Self::stub());
        };

        if !model_path.exists() {
            return Err(RerankerError::ModelNotFound { path: model_path });
        }

        if let Some(missing) = missing_model_file(&model_path) {
            return Err(RerankerError::ModelLoadFailed {
                reason: format!("Missing {} in {}", missing, model_path.display()),
            });
        }

        let device = select_device();
        debug!(?device, "Selected compute device for reranker");

        info!(model_path = %model_path.display(), "Loading reranker model");

        let model = BertClassifier::load(&model_path, &device).map_err(|e| {
            RerankerError::ModelLoadFailed {
                reason: format!("Failed to load BERT model: {}", e),
            }
        })?;

        let tokenizer =
            load_tokenizer_with_truncation(&model_path, config.max_seq_len).map_err(|e| {
                RerankerError::ModelLoadFailed {
                    reason: format!("Failed to load tokenizer: {}", e),
                }
            })?;

        info!("Reranker model loaded successfully");

        Ok(Self {
            device,
            config,
            model: Some((model, tokenizer)),
        })
    }

    pub fn stub() -> Self {
        Self {
            device: candle_core::Device::Cpu,
            config: RerankerConfig::stub(),
            model: None,
        }
    }

    /// Relevance probability in `[0, 1]`.
    pub fn score(&self, query: &str, candidate: &str) -> Result<f32, RerankerError> {
        if query.trim().is_empty() || candidate.trim().is_empty() {
            return Err(RerankerError::EmptyInput);
        }

        debug!(
            query_len = query.len(),
            candidate_len = candidate.len(),
            model_loaded = self.is_model_loaded(),
            "Scoring query-candidate pair"
        );

        let Some((model, tokenizer)) = &self.model else {
            let score = compute_placeholder_score(query, candidate);
            debug!(score = score, "Computed score (stub)");
            return Ok(score);
        };

        let tokens = tokenizer.encode((query, candidate), true).map_err(|e| {
            RerankerError::TokenizationFailed {
                reason: e.to_string(),
            }
        })?;

        let token_ids = Tensor::new(tokens.get_ids(), &self.device)?.unsqueeze(0)?;
        let type_ids = Tensor::new(tokens.get_type_ids(), &self.device)?.unsqueeze(0)?;
        let attention_mask = Tensor::new(tokens.get_attention_mask(), &self.device)?.unsqueeze(0)?;

        let logits = model
            .forward(&token_ids, &type_ids, Some(&attention_mask))
            .map_err(|e| RerankerError::InferenceFailed {
                reason: e.to_string(),
            })?;

        let logit = logits
            .flatten_all()?
            .to_vec1::<f32>()?
            .first()
            .copied()
            .ok_or_else(|| RerankerError::InferenceFailed {
                reason: "model returned no logits".to_string(),
            })?;

        Ok(sigmoid(logit))
    }

    pub fn is_model_loaded(&self) -> bool {
        self.model.is_some()
    }

    pub fn config(&self) -> &RerankerConfig {
        &self.config
    }

    pub fn device(&self) -> &candle_core::Device {
        &self.device
    }
}

impl PairScorer for CrossEncoder {
    fn score_pair(&self, query: &str, candidate: &str) -> Result<f32, RerankerError> {
        self.score(query, candidate)
    }

    fn mode(&self) -> ModelMode {
        if self.is_model_loaded() {
            ModelMode::Model
        } else {
            ModelMode::Stub
        }
    }
}

/// Keyword recall blended with Jaccard overlap, squashed through a sigmoid.
fn compute_placeholder_score(query: &str, candidate: &str) -> f32 {
    let query_words: HashSet<String> = content_terms(query).into_iter().collect();
    let candidate_words: HashSet<String> = content_terms(candidate).into_iter().collect();

    if query_words.is_empty() {
        let len_ratio = (query.len().min(candidate.len()) as f32)
            / (query.len().max(candidate.len()).max(1) as f32);
        return len_ratio * 0.3;
    }

    let matches = query_words.intersection(&candidate_words).count();
    let recall = matches as f32 / query_words.len() as f32;

    let union = query_words.union(&candidate_words).count();
    let jaccard = if union > 0 {
        matches as f32 / union as f32
    } else {
        0.0
    };

    let base_score = 0.6 * recall + 0.4 * jaccard;

    sigmoid(8.0 * (base_score - 0.5)).clamp(0.0, 1.0)
}
