//! Bearer token gate.
//!
//! Every card and credential route sits behind [`auth_middleware`]. It reads
//! `Authorization: Bearer <token>`, asks the configured
//! [`TokenValidator`](cardvault_core::token::TokenValidator) for the caller's
//! [`Identity`], and attaches it to the request extensions. Handlers pull it
//! back out with `Extension<Identity>`.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use tracing::debug;

use cardvault_core::token::Identity;

use crate::error::AppError;
use crate::state::AppState;

/// Authenticate the request and attach the caller's [`Identity`].
///
/// # Errors
///
/// Returns [`AppError::Unauthorized`] if the header is missing, is not a
/// bearer credential, or carries a token the validator rejects.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::Unauthorized("missing authorization token".to_owned()))?;

    let token = header
        .to_str()
        .ok()
        .and_then(bearer_token)
        .ok_or_else(|| AppError::Unauthorized("invalid token".to_owned()))?;

    let identity: Identity = state.token_validator.validate(token).await.map_err(|e| {
        debug!(error = %e, "bearer token rejected");
        AppError::Unauthorized("invalid or expired token".to_owned())
    })?;

    debug!(user_id = identity.id, "request authenticated");
    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}

/// Split `Bearer <token>` into its token. Anything but exactly two
/// space-separated parts with the `Bearer` scheme yields `None`.
#[must_use]
pub fn bearer_token(header: &str) -> Option<&str> {
    let mut parts = header.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if !token.is_empty() => Some(token),
        _ => None,
    }
}
