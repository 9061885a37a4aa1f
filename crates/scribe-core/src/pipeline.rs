//! Compose pipeline
//!
//! The entry point for a compose request. Owns the collaborators and runs
//! the stages in order:
//!
//! validate -> quota -> configuration -> brand -> prompt -> generate ->
//! persist -> assemble
//!
//! Every stage before `generate` may reject the request without touching
//! the generation service. After content is produced, nothing can turn the
//! request into an error.

use crate::brand::BrandContextResolver;
use crate::config::ScribeConfig;
use crate::error::ComposeError;
use crate::generation::GenerationService;
use crate::orchestrator::{GenerationOrchestrator, GenerationParams};
use crate::persistence::PersistenceAdapter;
use crate::profile::BrandService;
use crate::prompt::PromptComposer;
use crate::quota::{
    next_counter, parse_counter, CookieQuotaStore, QuotaDecision, QuotaGate, QuotaStore,
};
use crate::response::ResponseAssembler;
use crate::store::{BrandStore, DocumentStore};
use crate::title::derive_title;
use crate::types::{CallerContext, ComposeOutcome, ComposeRequest, GenerationResult};
use crate::validation::validate_request;
use std::sync::Arc;

/// Composition pipeline with its collaborators
#[derive(Clone)]
pub struct ComposePipeline {
    config: ScribeConfig,
    gate: QuotaGate,
    generation: Option<Arc<dyn GenerationService>>,
    brand_store: Option<Arc<dyn BrandStore>>,
    document_store: Option<Arc<dyn DocumentStore>>,
    quota_store: Arc<dyn QuotaStore>,
}

impl ComposePipeline {
    /// Create pipeline with no collaborators wired
    ///
    /// Quota state defaults to the client cookie with the configured window.
    #[must_use]
    pub fn new(config: ScribeConfig) -> Self {
        let quota_store = Arc::new(CookieQuotaStore::new(config.quota.window_secs));
        Self {
            config,
            gate: QuotaGate::new(),
            generation: None,
            brand_store: None,
            document_store: None,
            quota_store,
        }
    }

    /// With generation service
    #[inline]
    #[must_use]
    pub fn with_generation(mut self, service: Arc<dyn GenerationService>) -> Self {
        self.generation = Some(service);
        self
    }

    /// With brand profile store
    #[inline]
    #[must_use]
    pub fn with_brand_store(mut self, store: Arc<dyn BrandStore>) -> Self {
        self.brand_store = Some(store);
        self
    }

    /// With document store
    #[inline]
    #[must_use]
    pub fn with_document_store(mut self, store: Arc<dyn DocumentStore>) -> Self {
        self.document_store = Some(store);
        self
    }

    /// With quota store
    #[inline]
    #[must_use]
    pub fn with_quota_store(mut self, store: Arc<dyn QuotaStore>) -> Self {
        self.quota_store = store;
        self
    }

    /// Get configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ScribeConfig {
        &self.config
    }

    /// Generation service, if configured
    #[inline]
    #[must_use]
    pub fn generation(&self) -> Option<&Arc<dyn GenerationService>> {
        self.generation.as_ref()
    }

    /// Brand store, if configured and storage is enabled
    #[must_use]
    pub fn brand_store(&self) -> Option<Arc<dyn BrandStore>> {
        self.brand_store
            .clone()
            .filter(|_| self.config.storage.enabled)
    }

    /// Document store, if configured and storage is enabled
    #[must_use]
    pub fn document_store(&self) -> Option<Arc<dyn DocumentStore>> {
        self.document_store
            .clone()
            .filter(|_| self.config.storage.enabled)
    }

    /// Brand profile operations sharing this pipeline's collaborators
    #[must_use]
    pub fn brand_service(&self) -> BrandService {
        BrandService::new(&self.config, self.brand_store.clone(), self.generation.clone())
    }

    /// Run a compose request end to end
    ///
    /// # Errors
    /// - `ComposeError::Validation` for malformed input
    /// - `ComposeError::QuotaExceeded` for anonymous callers over the limit
    /// - `ComposeError::Configuration` when no generation service is wired
    /// - `ComposeError::UpstreamContent` when the content call fails
    pub async fn compose(
        &self,
        request: ComposeRequest,
        caller: &CallerContext,
    ) -> Result<ComposeOutcome, ComposeError> {
        let request = validate_request(request)?;
        tracing::info!(
            authenticated = caller.is_authenticated(),
            prompt_chars = request.prompt.chars().count(),
            "compose request accepted"
        );

        // Quota
        let raw_counter = self.quota_store.read_counter(&caller.guest).await;
        let decision = self.gate.check(
            caller.is_authenticated(),
            raw_counter.as_deref(),
            self.config.quota.enforce,
        );
        if let QuotaDecision::Deny { used, .. } = decision {
            tracing::info!(used, limit = self.gate.limit(), "guest quota exhausted");
            return Err(ComposeError::QuotaExceeded {
                used,
                limit: self.gate.limit(),
            });
        }

        // Configuration
        let service = self.generation.clone().ok_or_else(|| {
            tracing::error!("compose requested but no generation service is configured");
            ComposeError::Configuration("generation service is not configured".to_string())
        })?;

        // Brand
        let resolver = BrandContextResolver::new(self.brand_store(), self.config.storage.timeout());
        let brand = resolver
            .resolve(
                request.brand_summary.as_deref(),
                caller.user.as_ref(),
                caller.guest.brand.as_deref(),
            )
            .await;
        tracing::debug!(source = ?brand.source, "brand context resolved");

        // Prompt
        let prompt = PromptComposer::compose_request(&request, brand.as_text());

        // Generate
        let orchestrator =
            GenerationOrchestrator::new(service, GenerationParams::from(&self.config.generation));
        let output = orchestrator
            .run(&prompt)
            .await
            .into_output()
            .map_err(ComposeError::UpstreamContent)?;

        let result = GenerationResult {
            content: output.content,
            writing_style: output.writing_style,
            title: derive_title(&request.prompt),
        };

        // Persist
        let adapter = PersistenceAdapter::new(self.document_store(), self.config.storage.timeout());
        let persisted = adapter
            .persist(&result, caller.user.as_ref(), &request)
            .await;

        // Quota commit, guests only
        let quota_commit = if caller.is_authenticated() {
            None
        } else {
            let next = next_counter(parse_counter(raw_counter.as_deref()));
            self.quota_store.write_counter(&caller.guest, next).await
        };

        tracing::info!(
            persisted = persisted.is_some(),
            has_style = result.writing_style.is_some(),
            "compose request completed"
        );
        Ok(ResponseAssembler::assemble(
            result,
            persisted,
            &request,
            quota_commit,
        ))
    }
}

impl std::fmt::Debug for ComposePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComposePipeline")
            .field("config", &self.config)
            .field("generation", &self.generation.is_some())
            .field("brand_store", &self.brand_store.is_some())
            .field("document_store", &self.document_store.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{GenerationError, StoreError};
    use crate::generation::MockGenerationService;
    use crate::quota::GUEST_USAGE_COOKIE;
    use crate::store::{MockBrandStore, MockDocumentStore};
    use crate::types::{PersistedDocument, UserId};
    use chrono::Utc;

    const PROMPT: &str = "Write a tagline for a neighbourhood bakery";

    fn config() -> ScribeConfig {
        ScribeConfig::new()
    }

    fn ok_service() -> MockGenerationService {
        let mut service = MockGenerationService::new();
        service
            .expect_generate_content()
            .returning(|_| Ok("Bread worth waking up for.".to_string()));
        service
            .expect_describe_style()
            .returning(|_| Ok("Warm, short, confident.".to_string()));
        service
    }

    fn user() -> UserId {
        UserId("u-1".to_string())
    }

    #[tokio::test]
    async fn guest_over_limit_denied_before_generation() {
        let mut service = MockGenerationService::new();
        service.expect_generate_content().never();
        service.expect_describe_style().never();
        let pipeline = ComposePipeline::new(config()).with_generation(Arc::new(service));

        let caller = CallerContext::anonymous().with_usage_counter("5");
        let err = pipeline
            .compose(ComposeRequest::new(PROMPT), &caller)
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), 403);
        assert!(err.require_auth());
    }

    #[tokio::test]
    async fn validation_runs_before_quota() {
        let pipeline = ComposePipeline::new(config());
        let caller = CallerContext::anonymous().with_usage_counter("99");

        let err = pipeline
            .compose(ComposeRequest::new("short"), &caller)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn missing_service_is_configuration_error() {
        let pipeline = ComposePipeline::new(config());
        let err = pipeline
            .compose(ComposeRequest::new(PROMPT), &CallerContext::anonymous())
            .await
            .unwrap_err();
        assert!(matches!(err, ComposeError::Configuration(_)));
        assert_eq!(err.status_code(), 500);
    }

    #[tokio::test]
    async fn empty_content_is_502_and_skips_persistence() {
        let mut service = MockGenerationService::new();
        service
            .expect_generate_content()
            .returning(|_| Ok(String::new()));
        service.expect_describe_style().never();
        let mut documents = MockDocumentStore::new();
        documents.expect_insert_document().never();

        let pipeline = ComposePipeline::new(config())
            .with_generation(Arc::new(service))
            .with_document_store(Arc::new(documents));

        let err = pipeline
            .compose(ComposeRequest::new(PROMPT), &CallerContext::authenticated(user()))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 502);
        assert!(matches!(err, ComposeError::UpstreamContent(GenerationError::EmptyOutput)));
    }

    #[tokio::test]
    async fn guest_success_commits_quota() {
        let pipeline = ComposePipeline::new(config()).with_generation(Arc::new(ok_service()));
        let caller = CallerContext::anonymous().with_usage_counter("2");

        let outcome = pipeline.compose(ComposeRequest::new(PROMPT), &caller).await.unwrap();

        assert_eq!(outcome.client_writes.len(), 1);
        assert_eq!(outcome.client_writes[0].name, GUEST_USAGE_COOKIE);
        assert_eq!(outcome.client_writes[0].value, "3");
        assert_eq!(outcome.client_writes[0].max_age_secs, 86_400);
        assert!(outcome.response.document_id.is_none());
    }

    #[tokio::test]
    async fn authenticated_success_persists_without_quota_write() {
        let created_at = Utc::now();
        let mut documents = MockDocumentStore::new();
        documents
            .expect_insert_document()
            .times(1)
            .returning(move |_| {
                Ok(PersistedDocument {
                    id: "doc-1".to_string(),
                    created_at,
                })
            });
        let mut brands = MockBrandStore::new();
        brands.expect_load_brand().returning(|_| Ok(None));

        let pipeline = ComposePipeline::new(config())
            .with_generation(Arc::new(ok_service()))
            .with_brand_store(Arc::new(brands))
            .with_document_store(Arc::new(documents));

        let outcome = pipeline
            .compose(ComposeRequest::new(PROMPT), &CallerContext::authenticated(user()))
            .await
            .unwrap();

        assert_eq!(outcome.response.document_id.as_deref(), Some("doc-1"));
        assert_eq!(outcome.response.created_at, created_at);
        assert_eq!(outcome.response.title, "Write a tagline for a neighbourhood bakery");
        assert!(outcome.client_writes.is_empty());
    }

    #[tokio::test]
    async fn persistence_failure_still_succeeds() {
        let mut documents = MockDocumentStore::new();
        documents
            .expect_insert_document()
            .returning(|_| Err(StoreError::Unavailable("down".into())));

        let pipeline = ComposePipeline::new(config())
            .with_generation(Arc::new(ok_service()))
            .with_document_store(Arc::new(documents));

        let outcome = pipeline
            .compose(ComposeRequest::new(PROMPT), &CallerContext::authenticated(user()))
            .await
            .unwrap();

        assert!(outcome.response.document_id.is_none());
        assert_eq!(outcome.response.content, "Bread worth waking up for.");
    }

    #[tokio::test]
    async fn disabled_storage_never_touches_stores() {
        let mut documents = MockDocumentStore::new();
        documents.expect_insert_document().never();
        let mut brands = MockBrandStore::new();
        brands.expect_load_brand().never();

        let pipeline = ComposePipeline::new(config().with_storage_enabled(false))
            .with_generation(Arc::new(ok_service()))
            .with_brand_store(Arc::new(brands))
            .with_document_store(Arc::new(documents));

        let outcome = pipeline
            .compose(ComposeRequest::new(PROMPT), &CallerContext::authenticated(user()))
            .await
            .unwrap();
        assert!(outcome.response.document_id.is_none());
    }

    #[tokio::test]
    async fn explicit_brand_reaches_prompt() {
        let mut service = MockGenerationService::new();
        service
            .expect_generate_content()
            .withf(|req| {
                req.system_prompt.contains("Quiet luxury, no exclamation marks")
                    && !req.system_prompt.contains("stored voice")
            })
            .returning(|_| Ok("Copy".to_string()));
        service
            .expect_describe_style()
            .returning(|_| Ok("Style".to_string()));
        let mut brands = MockBrandStore::new();
        brands.expect_load_brand().never();

        let pipeline = ComposePipeline::new(config())
            .with_generation(Arc::new(service))
            .with_brand_store(Arc::new(brands));

        let request =
            ComposeRequest::new(PROMPT).with_brand_summary("Quiet luxury, no exclamation marks");
        let caller = CallerContext::authenticated(user()).with_guest_brand("stored voice");
        assert!(pipeline.compose(request, &caller).await.is_ok());
    }

    #[tokio::test]
    async fn enforcement_disabled_allows_guest_and_still_counts() {
        let pipeline = ComposePipeline::new(config().with_quota_enforcement(false))
            .with_generation(Arc::new(ok_service()));
        let caller = CallerContext::anonymous().with_usage_counter("12");

        let outcome = pipeline.compose(ComposeRequest::new(PROMPT), &caller).await.unwrap();
        assert_eq!(outcome.client_writes[0].value, "13");
    }
}
