//! GitHub: public repositories, followers and stars.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use tracing::debug;

use crate::constants::SCORE_MAX;
use crate::model::Metrics;

use super::error::FetchError;
use super::source::{ProfileFetcher, first_capture, metric};

pub const GITHUB_API_URL: &str = "https://api.github.com";

static HANDLE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)github\.com/([\w-]+)").unwrap(),
        Regex::new(r"(?i)github:\s*([\w-]+)").unwrap(),
        Regex::new(r"(?i)github\s+username:\s*([\w-]+)").unwrap(),
    ]
});

#[derive(Debug, Deserialize)]
struct UserResponse {
    #[serde(default)]
    public_repos: u64,
    #[serde(default)]
    followers: u64,
}

#[derive(Debug, Deserialize)]
struct RepoResponse {
    #[serde(default)]
    stargazers_count: u64,
}

#[derive(Debug, Clone)]
pub struct GithubFetcher {
    base_url: String,
}

impl Default for GithubFetcher {
    fn default() -> Self {
        Self::new(GITHUB_API_URL)
    }
}

impl GithubFetcher {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn get(&self, client: &reqwest::Client, path: &str, token: Option<&str>) -> reqwest::RequestBuilder {
        let request = client
            .get(format!("{}{}", self.base_url, path))
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", "shortlist");
        match token {
            Some(token) => request.header("Authorization", format!("token {token}")),
            None => request,
        }
    }

    async fn total_stars(
        &self,
        client: &reqwest::Client,
        handle: &str,
        token: Option<&str>,
    ) -> Result<u64, FetchError> {
        let resp = self
            .get(client, &format!("/users/{handle}/repos?per_page=100"), token)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(FetchError::from_status(resp.status(), resp.headers()));
        }
        let repos: Vec<RepoResponse> = resp
            .json()
            .await
            .map_err(|e| FetchError::malformed(e.to_string()))?;
        Ok(repos.iter().map(|r| r.stargazers_count).sum())
    }
}

#[async_trait]
impl ProfileFetcher for GithubFetcher {
    fn locate_handle(&self, text: &str) -> Option<String> {
        first_capture(&HANDLE_PATTERNS, text)
    }

    async fn fetch(
        &self,
        client: &reqwest::Client,
        handle: &str,
        token: Option<&str>,
    ) -> Result<Metrics, FetchError> {
        let resp = self
            .get(client, &format!("/users/{handle}"), token)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(FetchError::from_status(resp.status(), resp.headers()));
        }
        let user: UserResponse = resp
            .json()
            .await
            .map_err(|e| FetchError::malformed(e.to_string()))?;

        // Stars are a bonus; the profile itself already succeeded.
        let total_stars = match self.total_stars(client, handle, token).await {
            Ok(stars) => stars,
            Err(e) => {
                debug!(handle, error = %e, "GitHub star lookup failed, counting 0 stars");
                0
            }
        };

        let mut metrics = Metrics::new();
        metrics.insert("public_repos".into(), user.public_repos as f64);
        metrics.insert("followers".into(), user.followers as f64);
        metrics.insert("total_stars".into(), total_stars as f64);
        Ok(metrics)
    }

    fn sub_score(&self, metrics: &Metrics) -> f64 {
        let raw = 2.0 * metric(metrics, "public_repos")
            + metric(metrics, "followers")
            + 0.5 * metric(metrics, "total_stars");
        raw.clamp(0.0, SCORE_MAX)
    }
}
