//! Best-effort document persistence
//!
//! Writing a generated document is a convenience, never a requirement. The
//! adapter returns an optional record and swallows every failure after
//! logging it, so nothing here can change the outcome of a request.

use crate::config::duration_ms;
use crate::store::{DocumentStore, NewDocument};
use crate::types::{ComposeRequest, GenerationResult, PersistedDocument, UserId};
use std::sync::Arc;
use std::time::Duration;

/// Writes generation results for authenticated callers
#[derive(Clone)]
pub struct PersistenceAdapter {
    store: Option<Arc<dyn DocumentStore>>,
    timeout: Duration,
}

impl PersistenceAdapter {
    /// Create adapter; `store` is `None` when the store is unreachable
    #[inline]
    #[must_use]
    pub fn new(store: Option<Arc<dyn DocumentStore>>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Check if a store is wired in
    #[inline]
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.store.is_some()
    }

    /// Persist a result
    ///
    /// Anonymous callers and an unreachable store skip the write entirely.
    /// Store errors and timeouts yield `None`.
    pub async fn persist(
        &self,
        result: &GenerationResult,
        identity: Option<&UserId>,
        request: &ComposeRequest,
    ) -> Option<PersistedDocument> {
        let owner = identity?;
        let Some(store) = self.store.as_ref() else {
            tracing::debug!(user = %owner, "document store unavailable, skipping persistence");
            return None;
        };

        let document = NewDocument {
            owner: owner.clone(),
            title: result.title.clone(),
            prompt: request.prompt.clone(),
            content: result.content.clone(),
            writing_style: result.writing_style.clone(),
            settings: request.settings.clone(),
            source_document_id: request
                .editor_context
                .as_ref()
                .and_then(|ctx| ctx.document_id.clone()),
        };

        match tokio::time::timeout(self.timeout, store.insert_document(document)).await {
            Ok(Ok(persisted)) => {
                tracing::info!(user = %owner, document_id = %persisted.id, "document persisted");
                Some(persisted)
            }
            Ok(Err(e)) => {
                tracing::warn!(user = %owner, error = %e, "document persistence failed");
                None
            }
            Err(_) => {
                tracing::warn!(
                    user = %owner,
                    timeout_ms = duration_ms(self.timeout),
                    "document persistence timed out"
                );
                None
            }
        }
    }
}

impl std::fmt::Debug for PersistenceAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceAdapter")
            .field("store", &self.store.is_some())
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::store::MockDocumentStore;
    use crate::types::EditorContext;
    use chrono::{TimeZone, Utc};

    fn result() -> GenerationResult {
        GenerationResult {
            content: "Crisp copy.".to_string(),
            writing_style: None,
            title: "Bakery tagline".to_string(),
        }
    }

    fn user() -> UserId {
        UserId("u-7".to_string())
    }

    fn adapter(store: MockDocumentStore) -> PersistenceAdapter {
        PersistenceAdapter::new(Some(Arc::new(store)), Duration::from_millis(100))
    }

    #[tokio::test]
    async fn returns_store_identity() {
        let created_at = Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap();
        let mut store = MockDocumentStore::new();
        store
            .expect_insert_document()
            .withf(|doc| {
                doc.owner.as_str() == "u-7" && doc.source_document_id.as_deref() == Some("doc-1")
            })
            .returning(move |_| {
                Ok(PersistedDocument {
                    id: "01HZX".to_string(),
                    created_at,
                })
            });

        let request = ComposeRequest::new("Write a tagline for a bakery").with_editor_context(
            EditorContext {
                document_id: Some("doc-1".into()),
                ..EditorContext::default()
            },
        );
        let persisted = adapter(store).persist(&result(), Some(&user()), &request).await;

        assert_eq!(
            persisted,
            Some(PersistedDocument {
                id: "01HZX".to_string(),
                created_at
            })
        );
    }

    #[tokio::test]
    async fn anonymous_skips_store() {
        let mut store = MockDocumentStore::new();
        store.expect_insert_document().never();

        let request = ComposeRequest::new("Write a tagline for a bakery");
        assert!(adapter(store).persist(&result(), None, &request).await.is_none());
    }

    #[tokio::test]
    async fn write_error_is_swallowed() {
        let mut store = MockDocumentStore::new();
        store
            .expect_insert_document()
            .times(1)
            .returning(|_| Err(StoreError::Rejected("unique constraint".into())));

        let request = ComposeRequest::new("Write a tagline for a bakery");
        assert!(adapter(store)
            .persist(&result(), Some(&user()), &request)
            .await
            .is_none());
    }

    #[tokio::test]
    async fn unreachable_store_returns_none() {
        let adapter = PersistenceAdapter::new(None, Duration::from_millis(100));
        let request = ComposeRequest::new("Write a tagline for a bakery");

        assert!(!adapter.is_available());
        assert!(adapter.persist(&result(), Some(&user()), &request).await.is_none());
    }
}
