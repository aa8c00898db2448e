//! CodeChef: rating and solved count scraped from the public profile page.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;

use crate::constants::SCORE_MAX;
use crate::model::Metrics;

use super::error::FetchError;
use super::source::{ProfileFetcher, first_capture, metric};

pub const CODECHEF_URL: &str = "https://www.codechef.com";

static HANDLE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)codechef\.com/users/([\w-]+)").unwrap(),
        Regex::new(r"(?i)codechef:\s*([\w-]+)").unwrap(),
        Regex::new(r"(?i)codechef\s+username:\s*([\w-]+)").unwrap(),
    ]
});

static RATING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)class="rating-number"[^>]*>\s*(\d+)"#).unwrap());

static PROBLEMS_SOLVED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Total\s+Problems\s+Solved:?\s*(?:</[^>]+>\s*)*(\d+)").unwrap());

#[derive(Debug, Clone)]
pub struct CodechefFetcher {
    base_url: String,
}

impl Default for CodechefFetcher {
    fn default() -> Self {
        Self::new(CODECHEF_URL)
    }
}

impl CodechefFetcher {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

fn capture_number(re: &Regex, html: &str) -> Option<f64> {
    re.captures(html)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Extracts `rating` and `problems_solved` from profile HTML.
fn parse_profile(html: &str) -> Result<Metrics, FetchError> {
    let rating = capture_number(&RATING, html);
    let solved = capture_number(&PROBLEMS_SOLVED, html);

    if rating.is_none() && solved.is_none() {
        return Err(FetchError::malformed(
            "profile page has neither rating nor solved count",
        ));
    }

    let mut metrics = Metrics::new();
    metrics.insert("rating".into(), rating.unwrap_or(0.0));
    metrics.insert("problems_solved".into(), solved.unwrap_or(0.0));
    Ok(metrics)
}

#[async_trait]
impl ProfileFetcher for CodechefFetcher {
    fn locate_handle(&self, text: &str) -> Option<String> {
        first_capture(&HANDLE_PATTERNS, text)
    }

    async fn fetch(
        &self,
        client: &reqwest::Client,
        handle: &str,
        _token: Option<&str>,
    ) -> Result<Metrics, FetchError> {
        let resp = client
            .get(format!("{}/users/{handle}", self.base_url))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(FetchError::from_status(resp.status(), resp.headers()));
        }

        let html = resp
            .text()
            .await
            .map_err(|e| FetchError::malformed(e.to_string()))?;
        parse_profile(&html)
    }

    fn sub_score(&self, metrics: &Metrics) -> f64 {
        let raw = 0.3 * metric(metrics, "problems_solved") + 0.05 * metric(metrics, "rating");
        raw.clamp(0.0, SCORE_MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_profile_page() {
        let html = r#"
            <div class="rating-number">1875</div>
            <h3>Total Problems Solved: 212</h3>
        "#;
        let metrics = parse_profile(html).unwrap();
        assert_eq!(metric(&metrics, "rating"), 1875.0);
        assert_eq!(metric(&metrics, "problems_solved"), 212.0);
    }

    #[test]
    fn test_parse_profile_rejects_unrelated_page() {
        let err = parse_profile("<html><body>Maintenance</body></html>").unwrap_err();
        assert!(matches!(err, FetchError::Malformed { .. }));
    }

    #[test]
    fn test_sub_score_formula() {
        let fetcher = CodechefFetcher::default();
        let mut metrics = Metrics::new();
        metrics.insert("problems_solved".into(), 100.0);
        metrics.insert("rating".into(), 1000.0);
        // 0.3·100 + 0.05·1000 = 80
        assert!((fetcher.sub_score(&metrics) - 80.0).abs() < 1e-9);
    }
}
