//! Record store abstraction for `CardVault`.
//!
//! This crate defines the [`RecordStore`] trait, a create/find/delete
//! interface over owned records keyed by a numeric id. It knows nothing about
//! cards, credentials, or encryption. Services in `cardvault-core` encrypt
//! secret fields before a record ever reaches this layer.
//!
//! The store is the single arbiter of existence and uniqueness: concurrent
//! creates of the same unique key race through the store, and exactly one
//! wins.
//!
//! Implementations provided here:
//!
//! - [`MemoryStore`]: in-memory, for development and tests
//!
//! The PostgreSQL implementations live next to the schema they own, in
//! `cardvault-server`.

mod error;
mod memory;

pub use error::StoreError;
pub use memory::MemoryStore;

/// A record owned by exactly one author.
///
/// `Draft` is the not-yet-persisted form; the store assigns the id when it
/// materializes a draft into a record.
pub trait Record: Clone + Send + Sync + 'static {
    /// Input accepted by [`RecordStore::create`].
    type Draft: Send + 'static;

    /// Name of the record kind, used in error messages and logs.
    const KIND: &'static str;

    /// Store-assigned identifier.
    fn id(&self) -> i64;

    /// Identifier of the owning identity.
    fn author_id(&self) -> i64;

    /// Key that must be unique across all records of this kind, if any.
    ///
    /// The default is `None` (no uniqueness constraint).
    fn unique_key(&self) -> Option<String> {
        None
    }

    /// Build a persisted record from a draft and its assigned id.
    fn from_draft(id: i64, draft: Self::Draft) -> Self;
}

/// A pluggable store for owned records.
///
/// Implementations must be safe to share across async tasks (`Send + Sync`).
#[async_trait::async_trait]
pub trait RecordStore<R: Record>: Send + Sync + 'static {
    /// Persist a new record and return it with its assigned id.
    ///
    /// # Errors
    ///
    /// - [`StoreError::UniqueViolation`] if the record's unique key is taken.
    /// - [`StoreError::Backend`] if the underlying engine fails.
    async fn create(&self, draft: R::Draft) -> Result<R, StoreError>;

    /// Return every record owned by `author_id`, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the underlying engine fails.
    async fn find_by_author(&self, author_id: i64) -> Result<Vec<R>, StoreError>;

    /// Look up a record by id, regardless of owner.
    ///
    /// Returns `Ok(None)` if no record has this id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the underlying engine fails.
    async fn find_by_id(&self, id: i64) -> Result<Option<R>, StoreError>;

    /// Delete a record by id and return what was removed.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if no record has this id (including when a
    ///   concurrent delete got there first).
    /// - [`StoreError::Backend`] if the underlying engine fails.
    async fn delete(&self, id: i64) -> Result<R, StoreError>;
}
