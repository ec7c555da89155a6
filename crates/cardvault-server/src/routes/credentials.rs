//! Credential routes: `/credentials`
//!
//! Same surface as `/cards`, with every successful body wrapped in
//! `{ "data": ... }`.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Extension, Router};

use cardvault_core::models::{CreateCredential, CredentialSummary, CredentialView};
use cardvault_core::token::Identity;

use super::DataEnvelope;
use crate::error::AppError;
use crate::extract::{ApiJson, ApiPath};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_credentials).post(create_credential))
        .route("/{id}", get(get_credential).delete(delete_credential))
}

async fn create_credential(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    ApiJson(body): ApiJson<CreateCredential>,
) -> Result<(StatusCode, ApiJson<DataEnvelope<CredentialSummary>>), AppError> {
    body.validate()?;
    let credential = state.credentials.create(body, &identity).await?;
    Ok((StatusCode::CREATED, ApiJson(DataEnvelope::new(credential))))
}

async fn list_credentials(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<ApiJson<DataEnvelope<Vec<CredentialView>>>, AppError> {
    let credentials = state.credentials.find_all(identity.id).await?;
    Ok(ApiJson(DataEnvelope::new(credentials)))
}

async fn get_credential(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    ApiPath(id): ApiPath<i64>,
) -> Result<ApiJson<DataEnvelope<CredentialView>>, AppError> {
    let credential = state.credentials.find_one(id, identity.id).await?;
    Ok(ApiJson(DataEnvelope::new(credential)))
}

async fn delete_credential(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    ApiPath(id): ApiPath<i64>,
) -> Result<ApiJson<DataEnvelope<CredentialSummary>>, AppError> {
    let credential = state.credentials.remove(id, identity.id).await?;
    Ok(ApiJson(DataEnvelope::new(credential)))
}
