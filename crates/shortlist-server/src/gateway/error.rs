use axum::{
    Json,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use shortlist::PipelineError;

use super::SHORTLIST_STATUS_HEADER;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("ranking failed: {0}")]
    RankingFailed(#[from] PipelineError),
}

#[derive(serde::Serialize, serde::Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl GatewayError {
    fn status(&self) -> (StatusCode, &'static str) {
        match self {
            GatewayError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            GatewayError::RankingFailed(e) if e.is_input_error() => {
                (StatusCode::BAD_REQUEST, "invalid_request")
            }
            GatewayError::RankingFailed(PipelineError::ModelUnavailable(_)) => {
                (StatusCode::SERVICE_UNAVAILABLE, "model_unavailable")
            }
            GatewayError::RankingFailed(PipelineError::DeadlineExceeded) => {
                (StatusCode::GATEWAY_TIMEOUT, "deadline_exceeded")
            }
            GatewayError::RankingFailed(_) => (StatusCode::INTERNAL_SERVER_ERROR, "ranking_error"),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, shortlist_status) = self.status();

        if status.is_server_error() {
            tracing::error!(error = %self, code = status.as_u16(), "Request failed");
        } else {
            tracing::debug!(error = %self, code = status.as_u16(), "Request rejected");
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            SHORTLIST_STATUS_HEADER,
            HeaderValue::from_static(shortlist_status),
        );

        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: status.as_u16(),
        });

        (status, headers, body).into_response()
    }
}
