//! Persistent store seams
//!
//! Brand profiles and documents live in an external key-value store that
//! may be unreachable. Callers hold these as `Option<Arc<dyn ...>>`; `None`
//! means the store is not configured.

use crate::error::StoreError;
use crate::types::{ComposerSettings, PersistedDocument, UserId};
use async_trait::async_trait;

/// Brand voice profiles keyed by account
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BrandStore: Send + Sync {
    /// Stored brand text for an account
    async fn load_brand(&self, user: &UserId) -> Result<Option<String>, StoreError>;

    /// Replace the stored brand text
    async fn save_brand(&self, user: &UserId, text: &str) -> Result<(), StoreError>;

    /// Remove the stored brand text
    async fn clear_brand(&self, user: &UserId) -> Result<(), StoreError>;
}

/// Document to be written after a successful generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDocument {
    /// Owning account
    pub owner: UserId,
    /// Derived title
    pub title: String,
    /// Original brief
    pub prompt: String,
    /// Generated copy
    pub content: String,
    /// Style description, if the style stage succeeded
    pub writing_style: Option<String>,
    /// Settings used
    pub settings: ComposerSettings,
    /// Editor document this draft was composed in
    pub source_document_id: Option<String>,
}

/// Generated documents
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a document and return its store-assigned identity
    async fn insert_document(&self, document: NewDocument) -> Result<PersistedDocument, StoreError>;
}
