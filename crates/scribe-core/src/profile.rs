//! Brand profile management
//!
//! Read, summarize and clear the brand voice a caller composes with.
//! Authenticated accounts keep it in the brand store; anonymous visitors
//! keep it in a client cookie.

use crate::brand::{BrandContextResolver, GUEST_BRAND_COOKIE};
use crate::config::{duration_ms, ScribeConfig};
use crate::error::{ComposeError, GenerationError};
use crate::generation::{GenerationRequest, GenerationService};
use crate::orchestrator::{bounded, non_empty, GenerationParams};
use crate::prompt::PromptComposer;
use crate::store::BrandStore;
use crate::types::{BrandSource, CallerContext, ClientCookie, UserId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Shortest accepted brand source material
pub const MIN_BRAND_SOURCE_CHARS: usize = 10;
/// Longest accepted brand source material
pub const MAX_BRAND_SOURCE_CHARS: usize = 20_000;
/// Longest summary kept in the guest cookie
pub const MAX_GUEST_BRAND_CHARS: usize = 1_500;
/// Largest summary, in UTF-8 bytes, kept in the guest cookie
///
/// Unpadded base64 turns 2,850 bytes into 3,800 characters, which leaves
/// room for the cookie name and attributes under the 4 KiB browser limit.
pub const MAX_GUEST_BRAND_BYTES: usize = 2_850;

/// Brand voice as seen by its owner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandProfile {
    /// Summary text, `None` when nothing is stored
    pub summary: Option<String>,
    /// Where the summary lives
    pub source: BrandSource,
}

impl BrandProfile {
    /// No profile
    #[inline]
    #[must_use]
    pub fn empty() -> Self {
        Self {
            summary: None,
            source: BrandSource::None,
        }
    }
}

/// Profile plus the client-state writes to attach
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrandOutcome {
    /// Profile after the operation
    pub profile: BrandProfile,
    /// Cookies to set on the response
    pub client_writes: Vec<ClientCookie>,
}

/// Brand profile operations
#[derive(Clone)]
pub struct BrandService {
    store: Option<Arc<dyn BrandStore>>,
    generation: Option<Arc<dyn GenerationService>>,
    params: GenerationParams,
    store_timeout: Duration,
    cookie_max_age_secs: u64,
}

impl BrandService {
    /// Create service from configuration and collaborators
    #[must_use]
    pub fn new(
        config: &ScribeConfig,
        store: Option<Arc<dyn BrandStore>>,
        generation: Option<Arc<dyn GenerationService>>,
    ) -> Self {
        Self {
            store: store.filter(|_| config.storage.enabled),
            generation,
            params: GenerationParams::from(&config.generation),
            store_timeout: config.storage.timeout(),
            cookie_max_age_secs: config.server.brand_cookie_max_age_secs,
        }
    }

    /// Current profile
    ///
    /// Authenticated callers see only their stored profile; an unreadable
    /// store reads as empty. Anonymous callers see their cookie.
    pub async fn get(&self, caller: &CallerContext) -> BrandProfile {
        let guest_cookie = if caller.is_authenticated() {
            None
        } else {
            caller.guest.brand.as_deref()
        };

        let context = BrandContextResolver::new(self.store.clone(), self.store_timeout)
            .resolve(None, caller.user.as_ref(), guest_cookie)
            .await;

        match context.source {
            BrandSource::None => BrandProfile::empty(),
            source => BrandProfile {
                summary: Some(context.text),
                source,
            },
        }
    }

    /// Summarize source material into a voice profile and keep it
    ///
    /// # Errors
    /// - `ComposeError::Validation` when `source_text` is out of bounds
    /// - `ComposeError::Configuration` when no generation service is wired
    /// - `ComposeError::UpstreamContent` when summarization fails
    pub async fn summarize_and_store(
        &self,
        caller: &CallerContext,
        source_text: &str,
    ) -> Result<BrandOutcome, ComposeError> {
        let chars = source_text.trim().chars().count();
        if chars < MIN_BRAND_SOURCE_CHARS {
            return Err(ComposeError::invalid_field(
                "sourceText",
                format!("must be at least {MIN_BRAND_SOURCE_CHARS} characters"),
            ));
        }
        if chars > MAX_BRAND_SOURCE_CHARS {
            return Err(ComposeError::invalid_field(
                "sourceText",
                format!("must be at most {MAX_BRAND_SOURCE_CHARS} characters"),
            ));
        }

        let service = self.generation.as_ref().ok_or_else(|| {
            tracing::error!("brand summary requested but no generation service is configured");
            ComposeError::Configuration("generation service is not configured".to_string())
        })?;

        let summary = self
            .summarize(service.as_ref(), source_text)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "brand summary failed");
                ComposeError::UpstreamContent(e)
            })?;

        match caller.user.as_ref() {
            Some(user) => {
                self.save(user, &summary).await;
                Ok(BrandOutcome {
                    profile: BrandProfile {
                        summary: Some(summary),
                        source: BrandSource::Stored,
                    },
                    client_writes: Vec::new(),
                })
            }
            None => {
                let summary =
                    truncate_for_cookie(&summary, MAX_GUEST_BRAND_CHARS, MAX_GUEST_BRAND_BYTES);
                let cookie = ClientCookie::set(
                    GUEST_BRAND_COOKIE,
                    summary.clone(),
                    self.cookie_max_age_secs,
                );
                Ok(BrandOutcome {
                    profile: BrandProfile {
                        summary: Some(summary),
                        source: BrandSource::GuestCookie,
                    },
                    client_writes: vec![cookie],
                })
            }
        }
    }

    /// Forget the profile
    ///
    /// Store removal is best effort. The guest cookie is always cleared.
    pub async fn clear(&self, caller: &CallerContext) -> BrandOutcome {
        if let (Some(user), Some(store)) = (caller.user.as_ref(), self.store.as_ref()) {
            match tokio::time::timeout(self.store_timeout, store.clear_brand(user)).await {
                Ok(Ok(())) => tracing::info!(user = %user, "brand profile cleared"),
                Ok(Err(e)) => {
                    tracing::warn!(user = %user, error = %e, "brand profile clear failed");
                }
                Err(_) => tracing::warn!(
                    user = %user,
                    timeout_ms = duration_ms(self.store_timeout),
                    "brand profile clear timed out"
                ),
            }
        }

        BrandOutcome {
            profile: BrandProfile::empty(),
            client_writes: vec![ClientCookie::remove(GUEST_BRAND_COOKIE)],
        }
    }

    async fn summarize(
        &self,
        service: &dyn GenerationService,
        source_text: &str,
    ) -> Result<String, GenerationError> {
        let prompt = PromptComposer::compose_brand_summary(source_text);
        let request = GenerationRequest::from_prompt(
            &prompt,
            self.params.temperature,
            self.params.max_output_tokens,
        );
        let text = bounded(self.params.content_timeout, service.generate_content(request)).await?;
        non_empty(text)
    }

    async fn save(&self, user: &UserId, summary: &str) {
        let Some(store) = self.store.as_ref() else {
            tracing::warn!(user = %user, "brand store unavailable, summary not saved");
            return;
        };

        match tokio::time::timeout(self.store_timeout, store.save_brand(user, summary)).await {
            Ok(Ok(())) => tracing::info!(user = %user, "brand profile saved"),
            Ok(Err(e)) => tracing::warn!(user = %user, error = %e, "brand profile save failed"),
            Err(_) => tracing::warn!(
                user = %user,
                timeout_ms = duration_ms(self.store_timeout),
                "brand profile save timed out"
            ),
        }
    }
}

impl std::fmt::Debug for BrandService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrandService")
            .field("store", &self.store.is_some())
            .field("generation", &self.generation.is_some())
            .field("store_timeout", &self.store_timeout)
            .finish_non_exhaustive()
    }
}

/// Cut `text` to at most `max_chars` characters and `max_bytes` bytes,
/// on a character boundary
fn truncate_for_cookie(text: &str, max_chars: usize, max_bytes: usize) -> String {
    let end = text
        .char_indices()
        .take(max_chars)
        .map(|(idx, ch)| idx + ch.len_utf8())
        .take_while(|&end| end <= max_bytes)
        .last()
        .unwrap_or(0);

    if end == text.len() {
        text.to_string()
    } else {
        text[..end].trim_end().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::generation::MockGenerationService;
    use crate::store::MockBrandStore;

    const SOURCE: &str = "We bake sourdough by hand every morning and talk like neighbours.";

    fn user() -> UserId {
        UserId("u-3".to_string())
    }

    fn summarizer(reply: &'static str) -> Arc<dyn GenerationService> {
        let mut service = MockGenerationService::new();
        service
            .expect_generate_content()
            .withf(|req| req.user_prompt.contains("sourdough"))
            .returning(move |_| Ok(reply.to_string()));
        Arc::new(service)
    }

    fn service(
        store: Option<MockBrandStore>,
        generation: Option<Arc<dyn GenerationService>>,
    ) -> BrandService {
        BrandService::new(
            &ScribeConfig::new(),
            store.map(|s| Arc::new(s) as Arc<dyn BrandStore>),
            generation,
        )
    }

    #[tokio::test]
    async fn guest_get_reads_cookie() {
        let svc = service(None, None);
        let caller = CallerContext::anonymous().with_guest_brand("Friendly and plain");

        let profile = svc.get(&caller).await;
        assert_eq!(profile.summary.as_deref(), Some("Friendly and plain"));
        assert_eq!(profile.source, BrandSource::GuestCookie);
    }

    #[tokio::test]
    async fn authenticated_get_ignores_cookie() {
        let mut store = MockBrandStore::new();
        store
            .expect_load_brand()
            .returning(|_| Err(StoreError::Unavailable("offline".into())));
        let svc = service(Some(store), None);
        let caller = CallerContext::authenticated(user()).with_guest_brand("cookie voice");

        assert_eq!(svc.get(&caller).await, BrandProfile::empty());
    }

    #[tokio::test]
    async fn source_text_bounds() {
        let svc = service(None, Some(summarizer("unused")));
        let caller = CallerContext::anonymous();

        let short = svc.summarize_and_store(&caller, "tiny").await.unwrap_err();
        assert_eq!(short.status_code(), 400);

        let long = "x".repeat(MAX_BRAND_SOURCE_CHARS + 1);
        let long = svc.summarize_and_store(&caller, &long).await.unwrap_err();
        assert_eq!(long.status_code(), 400);
    }

    #[tokio::test]
    async fn missing_generation_is_configuration_error() {
        let svc = service(None, None);
        let err = svc
            .summarize_and_store(&CallerContext::anonymous(), SOURCE)
            .await
            .unwrap_err();
        assert!(matches!(err, ComposeError::Configuration(_)));
    }

    #[tokio::test]
    async fn guest_summary_goes_to_cookie() {
        let svc = service(None, Some(summarizer("  Warm, neighbourly, unhurried.  ")));

        let outcome = svc
            .summarize_and_store(&CallerContext::anonymous(), SOURCE)
            .await
            .unwrap();

        assert_eq!(outcome.profile.summary.as_deref(), Some("Warm, neighbourly, unhurried."));
        assert_eq!(outcome.client_writes.len(), 1);
        assert_eq!(outcome.client_writes[0].name, GUEST_BRAND_COOKIE);
        assert_eq!(outcome.client_writes[0].max_age_secs, 31_536_000);
    }

    #[tokio::test]
    async fn authenticated_summary_survives_store_failure() {
        let mut store = MockBrandStore::new();
        store
            .expect_save_brand()
            .times(1)
            .returning(|_, _| Err(StoreError::Rejected("too large".into())));
        let svc = service(Some(store), Some(summarizer("Warm.")));

        let outcome = svc
            .summarize_and_store(&CallerContext::authenticated(user()), SOURCE)
            .await
            .unwrap();

        assert_eq!(outcome.profile.source, BrandSource::Stored);
        assert!(outcome.client_writes.is_empty());
    }

    #[tokio::test]
    async fn blank_summary_is_upstream_failure() {
        let svc = service(None, Some(summarizer("   ")));
        let err = svc
            .summarize_and_store(&CallerContext::anonymous(), SOURCE)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 502);
    }

    #[tokio::test]
    async fn clear_removes_cookie_and_store_entry() {
        let mut store = MockBrandStore::new();
        store.expect_clear_brand().times(1).returning(|_| Ok(()));
        let svc = service(Some(store), None);

        let outcome = svc.clear(&CallerContext::authenticated(user())).await;
        assert_eq!(outcome.profile, BrandProfile::empty());
        assert!(outcome.client_writes[0].is_removal());
    }

    #[tokio::test]
    async fn guest_summary_fits_cookie_in_multibyte_text() {
        let wide = "品牌声音温暖而直接".repeat(200);
        let mut generation = MockGenerationService::new();
        generation
            .expect_generate_content()
            .returning(move |_| Ok(wide.clone()));
        let svc = service(None, Some(Arc::new(generation)));

        let outcome = svc
            .summarize_and_store(&CallerContext::anonymous(), SOURCE)
            .await
            .unwrap();

        let stored = &outcome.client_writes[0].value;
        assert!(stored.len() <= MAX_GUEST_BRAND_BYTES);
        assert_eq!(stored.chars().count(), MAX_GUEST_BRAND_BYTES / 3);
        assert_eq!(outcome.profile.summary.as_ref(), Some(stored));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_for_cookie("héllo wörld", 7, 100), "héllo w");
        assert_eq!(truncate_for_cookie("short", 10, 100), "short");
        assert_eq!(truncate_for_cookie("héllo", 10, 2), "h");
        assert_eq!(truncate_for_cookie("ab cd", 10, 3), "ab");
    }
}
