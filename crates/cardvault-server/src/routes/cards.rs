//! Card routes: `/cards`
//!
//! - `POST   /cards`      create, `201` with the card minus password and timestamps
//! - `GET    /cards`      every card of the caller, passwords decrypted
//! - `GET    /cards/{id}` one card of the caller, password decrypted
//! - `DELETE /cards/{id}` delete, returns the card minus secrets and timestamps

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Extension, Router};

use cardvault_core::models::{CardSummary, CardView, CreateCard, DeletedCard};
use cardvault_core::token::Identity;

use crate::error::AppError;
use crate::extract::{ApiJson, ApiPath};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_cards).post(create_card))
        .route("/{id}", get(get_card).delete(delete_card))
}

async fn create_card(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    ApiJson(body): ApiJson<CreateCard>,
) -> Result<(StatusCode, ApiJson<CardSummary>), AppError> {
    body.validate()?;
    let card = state.cards.create(body, &identity).await?;
    Ok((StatusCode::CREATED, ApiJson(card)))
}

async fn list_cards(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<ApiJson<Vec<CardView>>, AppError> {
    Ok(ApiJson(state.cards.find_all(identity.id).await?))
}

async fn get_card(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    ApiPath(id): ApiPath<i64>,
) -> Result<ApiJson<CardView>, AppError> {
    Ok(ApiJson(state.cards.find_one(id, identity.id).await?))
}

async fn delete_card(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    ApiPath(id): ApiPath<i64>,
) -> Result<ApiJson<DeletedCard>, AppError> {
    Ok(ApiJson(state.cards.remove(id, identity.id).await?))
}
