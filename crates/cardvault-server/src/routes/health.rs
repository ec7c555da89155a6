//! Liveness probe: `GET /health`. Unauthenticated.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use serde::Serialize;

use crate::extract::ApiJson;
use crate::state::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health))
}

async fn health() -> ApiJson<HealthResponse> {
    ApiJson(HealthResponse { status: "ok" })
}
