//! The per-platform seam and its configured instances.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;

use crate::model::Metrics;

use super::error::FetchError;

#[async_trait]
/// One external platform that can describe a candidate's public profile.
pub trait ProfileFetcher: Send + Sync {
    /// Finds the candidate's identifier on this platform in resume text.
    fn locate_handle(&self, text: &str) -> Option<String>;

    /// Fetches raw metrics for `handle`.
    async fn fetch(
        &self,
        client: &reqwest::Client,
        handle: &str,
        token: Option<&str>,
    ) -> Result<Metrics, FetchError>;

    /// Normalizes metrics into a [0,100] sub-score.
    fn sub_score(&self, metrics: &Metrics) -> f64;
}

/// A named, weighted fetcher with its own timeout and optional token.
#[derive(Clone)]
pub struct ReputationSource {
    pub name: String,
    pub fetcher: Arc<dyn ProfileFetcher>,
    pub weight: f64,
    pub timeout: Duration,
    pub token: Option<String>,
}

impl fmt::Debug for ReputationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReputationSource")
            .field("name", &self.name)
            .field("weight", &self.weight)
            .field("timeout", &self.timeout)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl ReputationSource {
    pub fn new(
        name: impl Into<String>,
        fetcher: Arc<dyn ProfileFetcher>,
        weight: f64,
        timeout: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            fetcher,
            weight,
            timeout,
            token: None,
        }
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }
}

/// First capture of the first matching pattern.
pub(crate) fn first_capture(patterns: &[Regex], text: &str) -> Option<String> {
    patterns
        .iter()
        .find_map(|re| re.captures(text))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Reads a metric, treating absence as zero.
pub(crate) fn metric(metrics: &Metrics, name: &str) -> f64 {
    metrics.get(name).copied().unwrap_or(0.0)
}
