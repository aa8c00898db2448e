//! Scriptable scoring models for tests.
//!
//! Both mocks fall back to the deterministic stubs and let a test inject
//! failures, latency or raw outputs for texts containing a marker.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::embedding::{
    BiEncoder, CrossEncoder, EmbeddingError, ModelMode, PairScorer, RerankerError, TextEmbedder,
};

#[derive(Default)]
pub struct MockEmbedder {
    inner: Option<BiEncoder>,
    fail_markers: Vec<String>,
    unavailable: bool,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockEmbedder {
    pub fn new() -> Self {
        Self {
            inner: Some(BiEncoder::stub()),
            ..Default::default()
        }
    }

    /// Every call fails with a fatal error.
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::new()
        }
    }

    /// Texts containing `marker` fail with a per-candidate inference error.
    pub fn failing_on(mut self, marker: impl Into<String>) -> Self {
        self.fail_markers.push(marker.into());
        self
    }

    /// Blocks the calling thread for `delay` on every call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TextEmbedder for MockEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }

        if self.unavailable {
            return Err(EmbeddingError::ModelUnavailable {
                reason: "mock model offline".to_string(),
            });
        }

        if self.fail_markers.iter().any(|m| text.contains(m.as_str())) {
            return Err(EmbeddingError::InferenceFailed {
                reason: "mock inference failure".to_string(),
            });
        }

        match &self.inner {
            Some(encoder) => encoder.embed(text),
            None => Err(EmbeddingError::ModelUnavailable {
                reason: "mock has no encoder".to_string(),
            }),
        }
    }

    fn mode(&self) -> ModelMode {
        ModelMode::Stub
    }
}

#[derive(Default)]
pub struct MockScorer {
    inner: Option<CrossEncoder>,
    scripted: Vec<(String, f32)>,
    fail_markers: Vec<String>,
    unavailable: bool,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockScorer {
    pub fn new() -> Self {
        Self {
            inner: Some(CrossEncoder::stub()),
            ..Default::default()
        }
    }

    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::new()
        }
    }

    /// Candidates containing `marker` score `raw` verbatim (may be out of range).
    pub fn scoring(mut self, marker: impl Into<String>, raw: f32) -> Self {
        self.scripted.push((marker.into(), raw));
        self
    }

    pub fn failing_on(mut self, marker: impl Into<String>) -> Self {
        self.fail_markers.push(marker.into());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PairScorer for MockScorer {
    fn score_pair(&self, query: &str, candidate: &str) -> Result<f32, RerankerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }

        if self.unavailable {
            return Err(RerankerError::NotAvailable {
                reason: "mock model offline".to_string(),
            });
        }

        if self.fail_markers.iter().any(|m| candidate.contains(m.as_str())) {
            return Err(RerankerError::InferenceFailed {
                reason: "mock inference failure".to_string(),
            });
        }

        if let Some((_, raw)) = self
            .scripted
            .iter()
            .find(|(marker, _)| candidate.contains(marker.as_str()))
        {
            return Ok(*raw);
        }

        match &self.inner {
            Some(reranker) => reranker.score(query, candidate),
            None => Err(RerankerError::NotAvailable {
                reason: "mock has no reranker".to_string(),
            }),
        }
    }

    fn mode(&self) -> ModelMode {
        ModelMode::Stub
    }
}
