//! HTTP gateway (Axum) for ranking requests.
//!
//! This module is primarily used by the `shortlist` server binary.

#![allow(missing_docs)]

pub mod error;
pub mod handler;
pub mod payload;
pub mod state;


use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::HeaderValue},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

pub use handler::rank_handler;
pub use state::HandlerState;

/// Response header carrying a machine-readable outcome.
pub const SHORTLIST_STATUS_HEADER: &str = "x-shortlist-status";
pub const STATUS_HEALTHY: &str = "healthy";
pub const STATUS_READY: &str = "ready";
pub const STATUS_RANKED: &str = "ranked";
pub const STATUS_INCOMPLETE: &str = "incomplete";

pub fn create_router_with_state(state: HandlerState) -> Router {
    Router::new()
        .route("/healthz", get(health_handler))
        .route("/ready", get(ready_handler))
        .route("/v1/rank", post(rank_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(serde::Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(serde::Serialize)]
pub struct ReadyResponse {
    pub status: &'static str,
    pub components: ComponentStatus,
}

#[derive(serde::Serialize)]
pub struct ComponentStatus {
    pub http: &'static str,
    pub encoder_mode: &'static str,
    pub reranker_mode: &'static str,
    pub reputation_sources: Vec<String>,
    pub top_k: usize,
    pub top_n: usize,
}

#[tracing::instrument]
pub async fn health_handler() -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(
        SHORTLIST_STATUS_HEADER,
        HeaderValue::from_static(STATUS_HEALTHY),
    );

    (
        StatusCode::OK,
        headers,
        Json(HealthResponse { status: "ok" }),
    )
        .into_response()
}

/// Models are loaded before the router is built, so a serving process is ready.
#[tracing::instrument(skip(state))]
pub async fn ready_handler(State(state): State<HandlerState>) -> Response {
    let config = state.pipeline.config();
    let components = ComponentStatus {
        http: STATUS_READY,
        encoder_mode: state.encoder_mode.as_str(),
        reranker_mode: state.reranker_mode.as_str(),
        reputation_sources: state.reputation_sources.clone(),
        top_k: config.top_k,
        top_n: config.top_n,
    };

    let mut headers = HeaderMap::new();
    headers.insert(
        SHORTLIST_STATUS_HEADER,
        HeaderValue::from_static(STATUS_READY),
    );

    (
        StatusCode::OK,
        headers,
        Json(ReadyResponse {
            status: "ok",
            components,
        }),
    )
        .into_response()
}
