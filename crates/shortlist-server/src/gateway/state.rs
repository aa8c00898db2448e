use std::sync::Arc;

use shortlist::{
    ModelMode, PairScorer, PipelineError, RankingConfig, RankingPipeline, ReputationAggregator,
    TextEmbedder,
};

#[derive(Clone)]
pub struct HandlerState {
    pub pipeline: Arc<RankingPipeline>,

    pub encoder_mode: ModelMode,

    pub reranker_mode: ModelMode,

    /// Configured reputation source names, for readiness reporting.
    pub reputation_sources: Vec<String>,
}

impl HandlerState {
    pub fn new(
        config: RankingConfig,
        embedder: Arc<dyn TextEmbedder>,
        scorer: Arc<dyn PairScorer>,
        reputation: ReputationAggregator,
    ) -> Result<Self, PipelineError> {
        let encoder_mode = embedder.mode();
        let reranker_mode = scorer.mode();
        let reputation_sources = reputation
            .sources()
            .iter()
            .map(|s| s.name.clone())
            .collect();

        Ok(Self {
            pipeline: Arc::new(RankingPipeline::new(config, embedder, scorer, reputation)?),
            encoder_mode,
            reranker_mode,
            reputation_sources,
        })
    }
}
