use axum::{
    Json,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::gateway::error::GatewayError;
use crate::gateway::payload::{RankRequest, RankResponse};
use crate::gateway::state::HandlerState;
use crate::gateway::{SHORTLIST_STATUS_HEADER, STATUS_INCOMPLETE, STATUS_RANKED};

#[instrument(skip(state, request), fields(request_id = tracing::field::Empty))]
pub async fn rank_handler(
    State(state): State<HandlerState>,
    Json(request): Json<serde_json::Value>,
) -> Result<Response, GatewayError> {
    let request: RankRequest = serde_json::from_value(request)
        .map_err(|e| GatewayError::InvalidRequest(format!("Invalid request schema: {}", e)))?;

    let request_id = Uuid::new_v4().to_string();
    tracing::Span::current().record("request_id", tracing::field::display(&request_id));

    let outcome = state
        .pipeline
        .rank(request.into_ranking_request())
        .await?;

    info!(
        total = outcome.total_processed,
        returned = outcome.top_candidates.len(),
        incomplete = outcome.incomplete,
        "Rank request served"
    );

    let status = if outcome.incomplete {
        STATUS_INCOMPLETE
    } else {
        STATUS_RANKED
    };

    let body = RankResponse {
        success: true,
        request_id,
        generated_at: chrono::Utc::now().to_rfc3339(),
        outcome,
    };

    Ok(make_response(body, status))
}

pub(crate) fn make_response(body: RankResponse, status: &'static str) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(SHORTLIST_STATUS_HEADER, HeaderValue::from_static(status));
    (StatusCode::OK, headers, Json(body)).into_response()
}
