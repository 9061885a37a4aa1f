//! Brand context resolution
//!
//! Picks the single authoritative brand voice for a request. Sources are
//! ranked, never merged:
//! 1. explicit override in the request
//! 2. stored profile of the authenticated account
//! 3. guest cookie
//! 4. nothing

use crate::config::duration_ms;
use crate::store::BrandStore;
use crate::types::{non_blank, BrandContext, BrandSource, UserId};
use std::sync::Arc;
use std::time::Duration;

/// Cookie carrying an anonymous visitor's brand text
pub const GUEST_BRAND_COOKIE: &str = "scribe_brand";

/// Resolves the brand voice for one request
#[derive(Clone)]
pub struct BrandContextResolver {
    store: Option<Arc<dyn BrandStore>>,
    timeout: Duration,
}

impl BrandContextResolver {
    /// Create resolver; `store` is `None` when the store is unreachable
    #[inline]
    #[must_use]
    pub fn new(store: Option<Arc<dyn BrandStore>>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Resolve the winning brand context
    ///
    /// A stored-profile read that fails or times out is logged and the
    /// resolution falls through to the guest cookie.
    pub async fn resolve(
        &self,
        explicit_override: Option<&str>,
        user: Option<&UserId>,
        guest_cookie: Option<&str>,
    ) -> BrandContext {
        if let Some(text) = non_blank(explicit_override) {
            return BrandContext {
                text,
                source: BrandSource::Explicit,
            };
        }

        if let Some(user) = user {
            if let Some(text) = self.stored_profile(user).await {
                return BrandContext {
                    text,
                    source: BrandSource::Stored,
                };
            }
        }

        if let Some(text) = non_blank(guest_cookie) {
            return BrandContext {
                text,
                source: BrandSource::GuestCookie,
            };
        }

        BrandContext::none()
    }

    async fn stored_profile(&self, user: &UserId) -> Option<String> {
        let store = self.store.as_ref()?;

        match tokio::time::timeout(self.timeout, store.load_brand(user)).await {
            Ok(Ok(text)) => non_blank(text.as_deref()),
            Ok(Err(e)) => {
                tracing::warn!(user = %user, error = %e, "brand profile read failed");
                None
            }
            Err(_) => {
                tracing::warn!(
                    user = %user,
                    timeout_ms = duration_ms(self.timeout),
                    "brand profile read timed out, falling through"
                );
                None
            }
        }
    }
}

impl std::fmt::Debug for BrandContextResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrandContextResolver")
            .field("store", &self.store.is_some())
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::store::MockBrandStore;

    fn user() -> UserId {
        UserId("u-42".to_string())
    }

    fn resolver_with(store: MockBrandStore) -> BrandContextResolver {
        BrandContextResolver::new(Some(Arc::new(store)), Duration::from_millis(200))
    }

    #[tokio::test]
    async fn explicit_override_wins_over_everything() {
        let mut store = MockBrandStore::new();
        store.expect_load_brand().never();

        let ctx = resolver_with(store)
            .resolve(Some(" Bold and dry "), Some(&user()), Some("guest voice"))
            .await;

        assert_eq!(ctx.source, BrandSource::Explicit);
        assert_eq!(ctx.text, "Bold and dry");
    }

    #[tokio::test]
    async fn stored_profile_beats_guest_cookie() {
        let mut store = MockBrandStore::new();
        store
            .expect_load_brand()
            .returning(|_| Ok(Some("Stored warmth".to_string())));

        let ctx = resolver_with(store)
            .resolve(None, Some(&user()), Some("guest voice"))
            .await;

        assert_eq!(ctx.source, BrandSource::Stored);
        assert_eq!(ctx.text, "Stored warmth");
    }

    #[tokio::test]
    async fn blank_override_is_skipped() {
        let mut store = MockBrandStore::new();
        store.expect_load_brand().returning(|_| Ok(Some("   ".to_string())));

        let ctx = resolver_with(store)
            .resolve(Some("  "), Some(&user()), Some("guest voice"))
            .await;

        assert_eq!(ctx.source, BrandSource::GuestCookie);
    }

    #[tokio::test]
    async fn store_failure_falls_through_to_cookie() {
        let mut store = MockBrandStore::new();
        store
            .expect_load_brand()
            .returning(|_| Err(StoreError::Unavailable("connection refused".into())));

        let ctx = resolver_with(store)
            .resolve(None, Some(&user()), Some("guest voice"))
            .await;

        assert_eq!(ctx.source, BrandSource::GuestCookie);
        assert_eq!(ctx.text, "guest voice");
    }

    #[tokio::test]
    async fn anonymous_caller_never_reads_store() {
        let mut store = MockBrandStore::new();
        store.expect_load_brand().never();

        let ctx = resolver_with(store).resolve(None, None, None).await;
        assert_eq!(ctx, BrandContext::none());
    }

    #[tokio::test]
    async fn unreachable_store_uses_cookie() {
        let resolver = BrandContextResolver::new(None, Duration::from_millis(200));
        let ctx = resolver.resolve(None, Some(&user()), Some("cookie")).await;
        assert_eq!(ctx.source, BrandSource::GuestCookie);
    }
}
