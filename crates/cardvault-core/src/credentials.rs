//! Credential service.
//!
//! Same shape as the card service without the per-owner uniqueness rule.
//! A credential owned by someone else is reported exactly like a missing
//! one: callers only ever learn about their own records.

use std::sync::Arc;

use cardvault_storage::{RecordStore, StoreError};
use tracing::{info, warn};

use crate::crypto::SecretCodec;
use crate::error::{CredentialError, OwnershipError};
use crate::models::{
    CreateCredential, Credential, CredentialSummary, CredentialView, NewCredential,
};
use crate::ownership::ensure_owner;
use crate::token::Identity;

/// Owner-scoped credential operations.
#[derive(Clone)]
pub struct CredentialService {
    store: Arc<dyn RecordStore<Credential>>,
    codec: Arc<SecretCodec>,
}

impl std::fmt::Debug for CredentialService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialService").finish_non_exhaustive()
    }
}

impl CredentialService {
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore<Credential>>, codec: Arc<SecretCodec>) -> Self {
        Self { store, codec }
    }

    /// Create a credential owned by `identity`.
    ///
    /// # Errors
    ///
    /// - [`CredentialError::CreationFailed`] if the store rejects the write.
    /// - [`CredentialError::Codec`] if the password cannot be encrypted.
    pub async fn create(
        &self,
        input: CreateCredential,
        identity: &Identity,
    ) -> Result<CredentialSummary, CredentialError> {
        let password = self.codec.encrypt(&input.password)?;
        let draft = NewCredential {
            title: input.title,
            url: input.url,
            username: input.username,
            password,
            author_id: identity.id,
        };

        let credential = self.store.create(draft).await.map_err(|e| {
            warn!(author_id = identity.id, error = %e, "credential creation failed");
            CredentialError::CreationFailed { source: e }
        })?;

        info!(
            credential_id = credential.id,
            author_id = credential.author_id,
            "credential created"
        );
        Ok(CredentialSummary::from(credential))
    }

    /// All credentials owned by `owner_id`, passwords decrypted.
    ///
    /// # Errors
    ///
    /// - [`CredentialError::Store`] if the store fails.
    /// - [`CredentialError::Codec`] if any stored password cannot be decrypted.
    pub async fn find_all(&self, owner_id: i64) -> Result<Vec<CredentialView>, CredentialError> {
        let credentials = self.store.find_by_author(owner_id).await?;
        credentials
            .into_iter()
            .map(|credential| self.reveal(credential))
            .collect()
    }

    /// One credential owned by `owner_id`, password decrypted.
    ///
    /// # Errors
    ///
    /// - [`CredentialError::NotFound`] if the id is unknown or owned by someone else.
    /// - [`CredentialError::Codec`] if the stored password cannot be decrypted.
    pub async fn find_one(&self, id: i64, owner_id: i64) -> Result<CredentialView, CredentialError> {
        let credential = self.owned(id, owner_id).await?;
        self.reveal(credential)
    }

    /// Delete a credential owned by `owner_id`.
    ///
    /// # Errors
    ///
    /// - [`CredentialError::NotFound`] if the id is unknown, owned by someone
    ///   else, or deleted concurrently.
    /// - [`CredentialError::Store`] if the store fails.
    pub async fn remove(
        &self,
        id: i64,
        owner_id: i64,
    ) -> Result<CredentialSummary, CredentialError> {
        let credential = self.owned(id, owner_id).await?;

        let deleted = self.store.delete(credential.id).await.map_err(|e| match e {
            StoreError::NotFound { id, .. } => CredentialError::NotFound { id },
            other => CredentialError::Store(other),
        })?;

        info!(credential_id = id, author_id = owner_id, "credential deleted");
        Ok(CredentialSummary::from(deleted))
    }

    async fn owned(&self, id: i64, owner_id: i64) -> Result<Credential, CredentialError> {
        let record = self.store.find_by_id(id).await?;
        ensure_owner(record, owner_id).map_err(|e| {
            if e == OwnershipError::NotOwner {
                warn!(credential_id = id, caller_id = owner_id, "credential access denied");
            }
            CredentialError::NotFound { id }
        })
    }

    fn reveal(&self, credential: Credential) -> Result<CredentialView, CredentialError> {
        let password = self.codec.decrypt(&credential.password)?;
        Ok(CredentialView::with_password(credential, password))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::crypto::EncryptionKey;
    use cardvault_storage::MemoryStore;

    fn identity(id: i64) -> Identity {
        Identity {
            id,
            email: format!("user{id}@example.com"),
        }
    }

    fn github() -> CreateCredential {
        CreateCredential {
            title: "GitHub".to_owned(),
            url: "https://github.com".to_owned(),
            username: "octocat".to_owned(),
            password: "hunter2".to_owned(),
        }
    }

    fn service() -> (CredentialService, MemoryStore<Credential>) {
        let store = MemoryStore::<Credential>::new();
        let codec = Arc::new(SecretCodec::new(EncryptionKey::generate()));
        (CredentialService::new(Arc::new(store.clone()), codec), store)
    }

    #[tokio::test]
    async fn create_encrypts_password() {
        let (credentials, store) = service();
        let summary = credentials.create(github(), &identity(1)).await.unwrap();
        assert_eq!(summary.username, "octocat");

        let stored = store.find_by_id(summary.id).await.unwrap().unwrap();
        assert_ne!(stored.password, "hunter2");

        let json = serde_json::to_value(&summary).unwrap();
        assert!(json.get("password").is_none());
    }

    #[tokio::test]
    async fn duplicates_are_allowed() {
        let (credentials, store) = service();
        credentials.create(github(), &identity(1)).await.unwrap();
        credentials.create(github(), &identity(1)).await.unwrap();
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn owner_reads_decrypted_password() {
        let (credentials, _) = service();
        let created = credentials.create(github(), &identity(1)).await.unwrap();
        let view = credentials.find_one(created.id, 1).await.unwrap();
        assert_eq!(view.password, "hunter2");

        let all = credentials.find_all(1).await.unwrap();
        assert_eq!(all, vec![view]);
    }

    #[tokio::test]
    async fn foreign_credential_looks_missing() {
        let (credentials, store) = service();
        let created = credentials.create(github(), &identity(1)).await.unwrap();

        assert!(matches!(
            credentials.find_one(created.id, 2).await,
            Err(CredentialError::NotFound { .. })
        ));
        assert!(matches!(
            credentials.remove(created.id, 2).await,
            Err(CredentialError::NotFound { .. })
        ));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn missing_credential_is_not_found() {
        let (credentials, _) = service();
        assert!(matches!(
            credentials.find_one(7, 1).await,
            Err(CredentialError::NotFound { id: 7 })
        ));
    }

    #[tokio::test]
    async fn find_all_without_credentials_is_empty() {
        let (credentials, _) = service();
        assert!(credentials.find_all(1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn remove_deletes_and_hides_password() {
        let (credentials, store) = service();
        let created = credentials.create(github(), &identity(1)).await.unwrap();
        let deleted = credentials.remove(created.id, 1).await.unwrap();
        assert_eq!(deleted, created);
        assert!(store.is_empty().await);
        assert!(matches!(
            credentials.remove(created.id, 1).await,
            Err(CredentialError::NotFound { .. })
        ));
    }
}
