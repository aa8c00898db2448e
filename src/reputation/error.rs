use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use thiserror::Error;

use crate::model::FetchStatus;

/// Failure of one (candidate, source) fetch attempt.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FetchError {
    #[error("profile not found")]
    NotFound,

    #[error("rate limited by source")]
    RateLimited,

    #[error("request timed out")]
    Timeout,

    #[error("transient failure: {reason}")]
    Transient { reason: String },

    #[error("malformed response: {reason}")]
    Malformed { reason: String },
}

impl FetchError {
    /// Timeouts, rate limiting and transient errors may succeed on retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FetchError::Timeout | FetchError::RateLimited | FetchError::Transient { .. }
        )
    }

    pub fn status(&self) -> FetchStatus {
        match self {
            FetchError::NotFound => FetchStatus::NotFound,
            FetchError::RateLimited => FetchStatus::RateLimited,
            FetchError::Timeout => FetchStatus::Timeout,
            FetchError::Transient { .. } | FetchError::Malformed { .. } => FetchStatus::Error,
        }
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        FetchError::Malformed {
            reason: reason.into(),
        }
    }

    /// Maps a non-success HTTP status onto a fetch failure.
    ///
    /// 403 counts as rate limiting only when `x-ratelimit-remaining` is `0`.
    pub fn from_status(status: StatusCode, headers: &HeaderMap) -> Self {
        match status {
            StatusCode::NOT_FOUND => FetchError::NotFound,
            StatusCode::TOO_MANY_REQUESTS => FetchError::RateLimited,
            StatusCode::FORBIDDEN if rate_limit_exhausted(headers) => FetchError::RateLimited,
            s if s.is_server_error() => FetchError::Transient {
                reason: format!("server returned {s}"),
            },
            s => FetchError::Malformed {
                reason: format!("unexpected status {s}"),
            },
        }
    }
}

fn rate_limit_exhausted(headers: &HeaderMap) -> bool {
    headers
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim() == "0")
        .unwrap_or(false)
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if err.is_decode() {
            FetchError::Malformed {
                reason: err.to_string(),
            }
        } else if let Some(status) = err.status() {
            FetchError::from_status(status, &HeaderMap::new())
        } else {
            FetchError::Transient {
                reason: err.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_status_mapping() {
        let empty = HeaderMap::new();
        assert_eq!(
            FetchError::from_status(StatusCode::NOT_FOUND, &empty),
            FetchError::NotFound
        );
        assert_eq!(
            FetchError::from_status(StatusCode::TOO_MANY_REQUESTS, &empty),
            FetchError::RateLimited
        );
        assert!(matches!(
            FetchError::from_status(StatusCode::BAD_GATEWAY, &empty),
            FetchError::Transient { .. }
        ));
        assert!(matches!(
            FetchError::from_status(StatusCode::FORBIDDEN, &empty),
            FetchError::Malformed { .. }
        ));
    }

    #[test]
    fn test_forbidden_with_exhausted_quota_is_rate_limited() {
        let mut headers = HeaderMap::new();
        headers.insert("x-ratelimit-remaining", HeaderValue::from_static("0"));
        assert_eq!(
            FetchError::from_status(StatusCode::FORBIDDEN, &headers),
            FetchError::RateLimited
        );
    }

    #[test]
    fn test_retryable_and_status() {
        assert!(FetchError::Timeout.is_retryable());
        assert!(FetchError::RateLimited.is_retryable());
        assert!(!FetchError::NotFound.is_retryable());
        assert!(!FetchError::malformed("x").is_retryable());

        assert_eq!(FetchError::Timeout.status(), FetchStatus::Timeout);
        assert_eq!(FetchError::malformed("x").status(), FetchStatus::Error);
    }
}
