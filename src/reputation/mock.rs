//! Scripted reputation source for tests.
//!
//! [`ScriptedFetcher`] finds handles written as `<prefix>: <handle>` and
//! answers from a per-handle script instead of the network.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;

use crate::constants::SCORE_MAX;
use crate::model::Metrics;

use super::error::FetchError;
use super::source::{ProfileFetcher, metric};

#[derive(Debug, Clone)]
pub enum ScriptedResponse {
    /// Succeeds with `score` as the sub-score.
    Score(f64),
    /// Fails on every attempt.
    Fail(FetchError),
    /// Sleeps, then succeeds.
    Slow(Duration, f64),
    /// Fails the first attempt, succeeds afterwards.
    FailOnce(FetchError, f64),
}

pub struct ScriptedFetcher {
    handle_pattern: Regex,
    responses: HashMap<String, ScriptedResponse>,
    attempts: Mutex<HashMap<String, u32>>,
    calls: AtomicUsize,
}

impl ScriptedFetcher {
    pub fn new(prefix: &str) -> Self {
        let pattern = format!(r"(?i){}:\s*([\w-]+)", regex::escape(prefix));
        Self {
            handle_pattern: Regex::new(&pattern).expect("escaped prefix is a valid pattern"),
            responses: HashMap::new(),
            attempts: Mutex::new(HashMap::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn respond(mut self, handle: &str, response: ScriptedResponse) -> Self {
        self.responses.insert(handle.to_string(), response);
        self
    }

    /// Total fetch calls across all handles.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn score_metrics(score: f64) -> Metrics {
    Metrics::from([("score".to_string(), score)])
}

#[async_trait]
impl ProfileFetcher for ScriptedFetcher {
    fn locate_handle(&self, text: &str) -> Option<String> {
        self.handle_pattern
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }

    async fn fetch(
        &self,
        _client: &reqwest::Client,
        handle: &str,
        _token: Option<&str>,
    ) -> Result<Metrics, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let attempt = {
            let mut attempts = self.attempts.lock().unwrap_or_else(|e| e.into_inner());
            let entry = attempts.entry(handle.to_string()).or_insert(0);
            *entry += 1;
            *entry
        };

        match self.responses.get(handle).cloned() {
            None => Err(FetchError::NotFound),
            Some(ScriptedResponse::Score(score)) => Ok(score_metrics(score)),
            Some(ScriptedResponse::Fail(e)) => Err(e),
            Some(ScriptedResponse::Slow(delay, score)) => {
                tokio::time::sleep(delay).await;
                Ok(score_metrics(score))
            }
            Some(ScriptedResponse::FailOnce(e, score)) => {
                if attempt == 1 {
                    Err(e)
                } else {
                    Ok(score_metrics(score))
                }
            }
        }
    }

    fn sub_score(&self, metrics: &Metrics) -> f64 {
        metric(metrics, "score").clamp(0.0, SCORE_MAX)
    }
}
