//! Shared application state for `CardVault` server.
//!
//! A single [`AppState`] is constructed at startup and shared across all
//! axum handlers via `Arc`.

use std::sync::Arc;

use cardvault_core::cards::CardService;
use cardvault_core::credentials::CredentialService;
use cardvault_core::token::TokenValidator;

/// Shared application state passed to all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// Card operations.
    pub cards: CardService,
    /// Credential operations.
    pub credentials: CredentialService,
    /// Bearer token verification for the access gate.
    pub token_validator: Arc<dyn TokenValidator>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("cards", &self.cards)
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}
