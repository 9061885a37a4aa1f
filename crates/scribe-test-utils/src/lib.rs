//! Testing utilities for the Scribe workspace
//!
//! Scripted generation services, recording and failing stores, and
//! request fixtures.

#![allow(missing_docs)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use scribe_core::{
    BrandStore, CallerContext, ComposePipeline, ComposeRequest, DocumentStore, GenerationError,
    GenerationRequest, GenerationService, NewDocument, PersistedDocument, ScribeConfig, StoreError,
    UserId,
};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_CONTENT: &str = "Fresh bread, every morning, from the corner you already love.";
pub const DEFAULT_STYLE: &str = "Warm, short sentences, second person.";
pub const SAMPLE_PROMPT: &str = "Write a tagline for a neighbourhood sourdough bakery";

type Reply = Result<String, GenerationError>;

/// Generation service answering from per-stage scripts
///
/// An exhausted script falls back to a fixed reply. Every request is
/// recorded so tests can inspect the prompts that were sent.
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    content: Mutex<VecDeque<Reply>>,
    style: Mutex<VecDeque<Reply>>,
    delay: Option<Duration>,
    content_calls: AtomicUsize,
    style_calls: AtomicUsize,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_content(self, reply: Reply) -> Self {
        self.content.lock().push_back(reply);
        self
    }

    #[must_use]
    pub fn with_style(self, reply: Reply) -> Self {
        self.style.lock().push_back(reply);
        self
    }

    /// Sleep before answering each call
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn content_calls(&self) -> usize {
        self.content_calls.load(Ordering::SeqCst)
    }

    pub fn style_calls(&self) -> usize {
        self.style_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.content_calls() + self.style_calls()
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().clone()
    }

    async fn answer(
        &self,
        request: GenerationRequest,
        script: &Mutex<VecDeque<Reply>>,
        fallback: &str,
    ) -> Reply {
        self.requests.lock().push(request);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = script.lock().pop_front();
        next.unwrap_or_else(|| Ok(fallback.to_string()))
    }
}

#[async_trait]
impl GenerationService for ScriptedGenerator {
    async fn generate_content(
        &self,
        request: GenerationRequest,
    ) -> Result<String, GenerationError> {
        self.content_calls.fetch_add(1, Ordering::SeqCst);
        self.answer(request, &self.content, DEFAULT_CONTENT).await
    }

    async fn describe_style(&self, request: GenerationRequest) -> Result<String, GenerationError> {
        self.style_calls.fetch_add(1, Ordering::SeqCst);
        self.answer(request, &self.style, DEFAULT_STYLE).await
    }
}

/// Timestamp handed out by [`RecordingStore`]
pub fn fixed_created_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 4, 12, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

/// In-memory brand and document store that records every write
#[derive(Debug, Default)]
pub struct RecordingStore {
    brands: Mutex<HashMap<String, String>>,
    documents: Mutex<Vec<NewDocument>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_brand(self, user: &str, text: &str) -> Self {
        self.brands.lock().insert(user.to_string(), text.to_string());
        self
    }

    pub fn documents(&self) -> Vec<NewDocument> {
        self.documents.lock().clone()
    }

    pub fn brand_of(&self, user: &str) -> Option<String> {
        self.brands.lock().get(user).cloned()
    }
}

#[async_trait]
impl BrandStore for RecordingStore {
    async fn load_brand(&self, user: &UserId) -> Result<Option<String>, StoreError> {
        Ok(self.brands.lock().get(user.as_str()).cloned())
    }

    async fn save_brand(&self, user: &UserId, text: &str) -> Result<(), StoreError> {
        self.brands.lock().insert(user.as_str().to_string(), text.to_string());
        Ok(())
    }

    async fn clear_brand(&self, user: &UserId) -> Result<(), StoreError> {
        self.brands.lock().remove(user.as_str());
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for RecordingStore {
    async fn insert_document(
        &self,
        document: NewDocument,
    ) -> Result<PersistedDocument, StoreError> {
        let mut documents = self.documents.lock();
        documents.push(document);
        Ok(PersistedDocument {
            id: format!("doc-{}", documents.len()),
            created_at: fixed_created_at(),
        })
    }
}

/// Store that fails every operation, optionally after a delay
#[derive(Debug, Default)]
pub struct FailingStore {
    delay: Option<Duration>,
    attempts: AtomicUsize,
}

impl FailingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hang for `delay` before failing, long enough to trip a timeout
    #[must_use]
    pub fn hanging(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    async fn fail<T>(&self) -> Result<T, StoreError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Err(StoreError::Unavailable("connection refused".to_string()))
    }
}

#[async_trait]
impl BrandStore for FailingStore {
    async fn load_brand(&self, _user: &UserId) -> Result<Option<String>, StoreError> {
        self.fail().await
    }

    async fn save_brand(&self, _user: &UserId, _text: &str) -> Result<(), StoreError> {
        self.fail().await
    }

    async fn clear_brand(&self, _user: &UserId) -> Result<(), StoreError> {
        self.fail().await
    }
}

#[async_trait]
impl DocumentStore for FailingStore {
    async fn insert_document(
        &self,
        _document: NewDocument,
    ) -> Result<PersistedDocument, StoreError> {
        self.fail().await
    }
}

/// Configuration with short budgets for tests
pub fn test_config() -> ScribeConfig {
    ScribeConfig::new()
        .with_generation_timeouts(Duration::from_millis(500), Duration::from_millis(200))
        .with_storage_timeout(Duration::from_millis(100))
}

pub fn sample_request() -> ComposeRequest {
    ComposeRequest::new(SAMPLE_PROMPT)
}

pub fn signed_in(user: &str) -> CallerContext {
    CallerContext::authenticated(UserId(user.to_string()))
}

/// Anonymous caller who has used `used` generations
pub fn guest_with_usage(used: u32) -> CallerContext {
    CallerContext::anonymous().with_usage_counter(used.to_string())
}

/// Pipeline wired to a generator and a shared store
pub fn pipeline_with(
    generator: Arc<ScriptedGenerator>,
    store: Arc<RecordingStore>,
) -> ComposePipeline {
    ComposePipeline::new(test_config())
        .with_generation(generator)
        .with_brand_store(store.clone())
        .with_document_store(store)
}
