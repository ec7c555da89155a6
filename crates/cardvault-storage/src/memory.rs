//! In-memory record store.
//!
//! Records live in a `BTreeMap` keyed by id behind a `RwLock`. Nothing is
//! persisted; all data is lost when the process exits. Use this for
//! development and for tests that need a real store without a database.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{Record, RecordStore, StoreError};

/// An in-memory store for records of type `R`.
///
/// Ids start at 1 and are never reused. Uniqueness is checked under the
/// write lock, so concurrent creates of the same unique key cannot both
/// succeed. Clones share the same underlying data.
#[derive(Debug)]
pub struct MemoryStore<R: Record> {
    inner: Arc<RwLock<Inner<R>>>,
}

#[derive(Debug)]
struct Inner<R> {
    next_id: i64,
    records: BTreeMap<i64, R>,
}

impl<R: Record> MemoryStore<R> {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                next_id: 1,
                records: BTreeMap::new(),
            })),
        }
    }

    /// Number of records currently held.
    pub async fn len(&self) -> usize {
        self.inner.read().await.records.len()
    }

    /// Whether the store holds no records.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.records.is_empty()
    }
}

impl<R: Record> Clone for MemoryStore<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: Record> Default for MemoryStore<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl<R: Record> RecordStore<R> for MemoryStore<R> {
    async fn create(&self, draft: R::Draft) -> Result<R, StoreError> {
        let mut inner = self.inner.write().await;
        let record = R::from_draft(inner.next_id, draft);

        if let Some(key) = record.unique_key() {
            let taken = inner
                .records
                .values()
                .any(|existing| existing.unique_key().as_deref() == Some(key.as_str()));
            if taken {
                tracing::debug!(kind = R::KIND, "unique key already taken");
                return Err(StoreError::UniqueViolation {
                    constraint: format!("{}_unique", R::KIND),
                });
            }
        }

        inner.next_id = inner.next_id.saturating_add(1);
        inner.records.insert(record.id(), record.clone());
        tracing::debug!(kind = R::KIND, id = record.id(), "record created");
        Ok(record)
    }

    async fn find_by_author(&self, author_id: i64) -> Result<Vec<R>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .records
            .values()
            .filter(|r| r.author_id() == author_id)
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<R>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.records.get(&id).cloned())
    }

    async fn delete(&self, id: i64) -> Result<R, StoreError> {
        let mut inner = self.inner.write().await;
        inner
            .records
            .remove(&id)
            .ok_or(StoreError::NotFound { kind: R::KIND, id })
    }
}
