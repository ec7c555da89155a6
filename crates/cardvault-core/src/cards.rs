//! Card service.
//!
//! Sits between the HTTP handlers and the record store. Every read or delete
//! is checked against the caller's identity, the card password is encrypted
//! before it is stored and decrypted only for the owner, and store failures
//! are translated into [`CardError`] so nothing engine-specific leaks out.

use std::sync::Arc;

use cardvault_storage::{RecordStore, StoreError};
use tracing::{debug, info, warn};

use crate::crypto::SecretCodec;
use crate::error::{CardError, OwnershipError};
use crate::models::{
    parse_expiration_date, Card, CardSummary, CardView, CreateCard, DeletedCard, NewCard,
};
use crate::ownership::ensure_owner;
use crate::token::Identity;

/// Owner-scoped card operations.
#[derive(Clone)]
pub struct CardService {
    store: Arc<dyn RecordStore<Card>>,
    codec: Arc<SecretCodec>,
}

impl std::fmt::Debug for CardService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardService").finish_non_exhaustive()
    }
}

impl CardService {
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore<Card>>, codec: Arc<SecretCodec>) -> Self {
        Self { store, codec }
    }

    /// Create a card owned by `identity`.
    ///
    /// # Errors
    ///
    /// - [`CardError::Invalid`] if `expirationDate` is not a date.
    /// - [`CardError::Conflict`] if the caller already has a card with this number.
    /// - [`CardError::CreationFailed`] for any other store failure.
    /// - [`CardError::Codec`] if the password cannot be encrypted.
    pub async fn create(
        &self,
        input: CreateCard,
        identity: &Identity,
    ) -> Result<CardSummary, CardError> {
        let expiration_date =
            parse_expiration_date(&input.expiration_date).ok_or_else(|| CardError::Invalid {
                reason: format!("'{}' is not a valid date", input.expiration_date),
            })?;
        let password = self.codec.encrypt(&input.password)?;

        let draft = NewCard {
            title: input.title,
            name: input.name,
            number: input.number,
            secure_code: input.secure_code,
            password,
            expiration_date,
            is_virtual: input.is_virtual,
            card_type: input.card_type,
            author_id: identity.id,
        };

        let card = self.store.create(draft).await.map_err(|e| match e {
            StoreError::UniqueViolation { .. } => {
                debug!(author_id = identity.id, "duplicate card number");
                CardError::Conflict
            }
            other => {
                warn!(author_id = identity.id, error = %other, "card creation failed");
                CardError::CreationFailed { source: other }
            }
        })?;

        info!(card_id = card.id, author_id = card.author_id, "card created");
        Ok(CardSummary::from(card))
    }

    /// All cards owned by `owner_id`, passwords decrypted.
    ///
    /// # Errors
    ///
    /// - [`CardError::Store`] if the store fails.
    /// - [`CardError::Codec`] if any stored password cannot be decrypted.
    pub async fn find_all(&self, owner_id: i64) -> Result<Vec<CardView>, CardError> {
        let cards = self.store.find_by_author(owner_id).await?;
        cards.into_iter().map(|card| self.reveal(card)).collect()
    }

    /// One card, if `owner_id` owns it, password decrypted.
    ///
    /// # Errors
    ///
    /// - [`CardError::NotFound`] if no card has this id.
    /// - [`CardError::Forbidden`] if the card belongs to someone else.
    /// - [`CardError::Codec`] if the stored password cannot be decrypted.
    pub async fn find_one(&self, id: i64, owner_id: i64) -> Result<CardView, CardError> {
        let card = self.owned(id, owner_id).await?;
        self.reveal(card)
    }

    /// Delete a card owned by `owner_id`.
    ///
    /// The ownership check and the delete are separate store calls; if the
    /// card disappears in between, the result is [`CardError::NotFound`].
    ///
    /// # Errors
    ///
    /// - [`CardError::NotFound`] if no card has this id.
    /// - [`CardError::Forbidden`] if the card belongs to someone else.
    /// - [`CardError::Store`] if the store fails.
    pub async fn remove(&self, id: i64, owner_id: i64) -> Result<DeletedCard, CardError> {
        let card = self.owned(id, owner_id).await?;

        let deleted = self.store.delete(card.id).await.map_err(|e| match e {
            StoreError::NotFound { id, .. } => CardError::NotFound { id },
            other => CardError::Store(other),
        })?;

        info!(card_id = id, author_id = owner_id, "card deleted");
        Ok(DeletedCard::from(deleted))
    }

    async fn owned(&self, id: i64, owner_id: i64) -> Result<Card, CardError> {
        let record = self.store.find_by_id(id).await?;
        ensure_owner(record, owner_id).map_err(|e| match e {
            OwnershipError::Missing => CardError::NotFound { id },
            OwnershipError::NotOwner => {
                warn!(card_id = id, caller_id = owner_id, "card access denied");
                CardError::Forbidden { id }
            }
        })
    }

    fn reveal(&self, card: Card) -> Result<CardView, CardError> {
        let password = self.codec.decrypt(&card.password)?;
        Ok(CardView::with_password(card, password))
    }
}
