//! LeetCode: accepted submissions via the public GraphQL endpoint.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use serde_json::json;

use crate::constants::SCORE_MAX;
use crate::model::Metrics;

use super::error::FetchError;
use super::source::{ProfileFetcher, first_capture, metric};

pub const LEETCODE_URL: &str = "https://leetcode.com";

const PROFILE_QUERY: &str = "query getUserProfile($username: String!) { \
    matchedUser(username: $username) { \
        submitStats { acSubmissionNum { difficulty count } } \
    } \
}";

static HANDLE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)leetcode\.com/(?:u/)?([\w-]+)").unwrap(),
        Regex::new(r"(?i)leetcode:\s*([\w-]+)").unwrap(),
        Regex::new(r"(?i)leetcode\s+username:\s*([\w-]+)").unwrap(),
    ]
});

#[derive(Debug, Deserialize)]
struct GraphqlResponse {
    data: Option<GraphqlData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphqlData {
    matched_user: Option<MatchedUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MatchedUser {
    submit_stats: SubmitStats,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitStats {
    ac_submission_num: Vec<DifficultyCount>,
}

#[derive(Debug, Deserialize)]
struct DifficultyCount {
    difficulty: String,
    count: u64,
}

#[derive(Debug, Clone)]
pub struct LeetcodeFetcher {
    base_url: String,
}

impl Default for LeetcodeFetcher {
    fn default() -> Self {
        Self::new(LEETCODE_URL)
    }
}

impl LeetcodeFetcher {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

/// Builds metrics from the per-difficulty buckets.
///
/// `total_solved` is the `All` bucket; without one, the other buckets are summed.
fn solved_metrics(buckets: &[DifficultyCount]) -> Metrics {
    let mut metrics = Metrics::new();
    let mut all = None;
    let mut sum = 0u64;

    for bucket in buckets {
        let difficulty = bucket.difficulty.to_lowercase();
        if difficulty == "all" {
            all = Some(bucket.count);
        } else {
            sum += bucket.count;
            metrics.insert(format!("{difficulty}_solved"), bucket.count as f64);
        }
    }

    metrics.insert("total_solved".into(), all.unwrap_or(sum) as f64);
    metrics
}

#[async_trait]
impl ProfileFetcher for LeetcodeFetcher {
    fn locate_handle(&self, text: &str) -> Option<String> {
        first_capture(&HANDLE_PATTERNS, text)
    }

    async fn fetch(
        &self,
        client: &reqwest::Client,
        handle: &str,
        token: Option<&str>,
    ) -> Result<Metrics, FetchError> {
        let mut request = client
            .post(format!("{}/graphql", self.base_url))
            .header("Referer", format!("{}/{handle}/", self.base_url))
            .json(&json!({
                "query": PROFILE_QUERY,
                "variables": { "username": handle },
            }));
        if let Some(session) = token {
            request = request.header("Cookie", format!("LEETCODE_SESSION={session}"));
        }

        let resp = request.send().await?;
        if !resp.status().is_success() {
            return Err(FetchError::from_status(resp.status(), resp.headers()));
        }

        let body: GraphqlResponse = resp
            .json()
            .await
            .map_err(|e| FetchError::malformed(e.to_string()))?;

        let user = body
            .data
            .ok_or_else(|| FetchError::malformed("response has no data"))?
            .matched_user
            .ok_or(FetchError::NotFound)?;

        Ok(solved_metrics(&user.submit_stats.ac_submission_num))
    }

    fn sub_score(&self, metrics: &Metrics) -> f64 {
        (0.5 * metric(metrics, "total_solved")).clamp(0.0, SCORE_MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bucket(difficulty: &str, count: u64) -> DifficultyCount {
        DifficultyCount {
            difficulty: difficulty.to_string(),
            count,
        }
    }

    #[test]
    fn test_all_bucket_is_not_double_counted() {
        let metrics = solved_metrics(&[
            bucket("All", 120),
            bucket("Easy", 60),
            bucket("Medium", 50),
            bucket("Hard", 10),
        ]);
        assert_eq!(metric(&metrics, "total_solved"), 120.0);
        assert_eq!(metric(&metrics, "medium_solved"), 50.0);
    }

    #[test]
    fn test_missing_all_bucket_falls_back_to_sum() {
        let metrics = solved_metrics(&[bucket("Easy", 3), bucket("Hard", 2)]);
        assert_eq!(metric(&metrics, "total_solved"), 5.0);
    }
}
