//! HTTP routes for `CardVault`.
//!
//! [`router`] assembles the full application: the bearer-gated card and
//! credential resources, the open health probe, and the response layers
//! shared by every route.

pub mod cards;
pub mod credentials;
pub mod health;

use std::sync::Arc;

use axum::http::{HeaderValue, Method, header};
use axum::{Router, middleware};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::auth::auth_middleware;
use crate::state::AppState;

/// `{ "data": ... }` wrapper used by the credential routes.
#[derive(Debug, Serialize)]
pub struct DataEnvelope<T> {
    pub data: T,
}

impl<T> DataEnvelope<T> {
    #[must_use]
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Build the application router.
///
/// The access gate is a `route_layer`, so it runs only for matched gated
/// routes and always before their body or path extractors.
pub fn router(state: Arc<AppState>) -> Router {
    let gated = Router::new()
        .nest("/cards", cards::router())
        .nest("/credentials", credentials::router())
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            auth_middleware,
        ));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .merge(gated)
        .merge(health::router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .with_state(state)
}
