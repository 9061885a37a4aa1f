//! In-process store for Scribe
//!
//! Provides [`MemoryStore`], a concurrent brand profile and document store
//! implementing the core store traits. Used by the server when no external
//! store is configured, and by tests that need a store they can take
//! offline on demand.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use scribe_core::{BrandStore, DocumentStore, NewDocument, PersistedDocument, StoreError, UserId};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use ulid::{Generator, Ulid};

/// Document identifier
///
/// Issued by a monotonic generator, so ids from one store sort in insertion
/// order even within the same millisecond.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub Ulid);

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Document as held by the store
#[derive(Debug, Clone)]
pub struct StoredDocument {
    /// Store-assigned id
    pub id: DocumentId,
    /// Store-assigned creation time
    pub created_at: DateTime<Utc>,
    /// Written payload
    pub document: NewDocument,
}

/// Concurrent in-memory store
///
/// Brand profiles are keyed by account, documents by id. The store can be
/// switched offline to exercise degraded paths.
pub struct MemoryStore {
    brands: DashMap<UserId, String>,
    documents: DashMap<DocumentId, StoredDocument>,
    ids: Mutex<Generator>,
    available: AtomicBool,
}

impl MemoryStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            brands: DashMap::new(),
            documents: DashMap::new(),
            ids: Mutex::new(Generator::new()),
            available: AtomicBool::new(true),
        }
    }

    /// Take the store online or offline
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
        tracing::info!(available, "memory store availability changed");
    }

    /// Check availability
    #[inline]
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    fn next_id(&self) -> Result<DocumentId, StoreError> {
        self.ids
            .lock()
            .generate()
            .map(DocumentId)
            .map_err(|e| StoreError::Rejected(format!("document id exhausted: {e}")))
    }

    fn ensure_available(&self) -> Result<(), StoreError> {
        if self.is_available() {
            Ok(())
        } else {
            Err(StoreError::Unavailable("memory store is offline".to_string()))
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("brands", &self.brands.len())
            .field("documents", &self.documents.len())
            .field("available", &self.is_available())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl BrandStore for MemoryStore {
    async fn load_brand(&self, user: &UserId) -> Result<Option<String>, StoreError> {
        self.ensure_available()?;
        Ok(self.brands.get(user).map(|entry| entry.value().clone()))
    }

    async fn save_brand(&self, user: &UserId, text: &str) -> Result<(), StoreError> {
        self.ensure_available()?;
        self.brands.insert(user.clone(), text.to_string());
        Ok(())
    }

    async fn clear_brand(&self, user: &UserId) -> Result<(), StoreError> {
        self.ensure_available()?;
        self.brands.remove(user);
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert_document(
        &self,
        document: NewDocument,
    ) -> Result<PersistedDocument, StoreError> {
        self.ensure_available()?;

        let id = self.next_id()?;
        let created_at = Utc::now();
        self.documents.insert(
            id,
            StoredDocument {
                id,
                created_at,
                document,
            },
        );

        Ok(PersistedDocument {
            id: id.to_string(),
            created_at,
        })
    }
}
