//! Scribe Core - composition pipeline
//!
//! Turns a short brief into finished marketing copy:
//! - Validates the request and enforces the guest quota
//! - Resolves the authoritative brand voice
//! - Assembles layered prompts from composer settings
//! - Runs the content and style calls as an explicit state machine
//! - Persists results best effort and assembles the response
//!
//! # Example
//!
//! ```rust,ignore
//! use scribe_core::{CallerContext, ComposePipeline, ComposeRequest, ScribeConfig};
//!
//! # async fn example(service: std::sync::Arc<dyn scribe_core::GenerationService>)
//! #     -> Result<(), Box<dyn std::error::Error>> {
//! let pipeline = ComposePipeline::new(ScribeConfig::new()).with_generation(service);
//!
//! let request = ComposeRequest::new("Write a launch email for our spring menu");
//! let outcome = pipeline.compose(request, &CallerContext::anonymous()).await?;
//!
//! println!("{}", outcome.response.title);
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod brand;
pub mod config;
pub mod error;
pub mod generation;
pub mod orchestrator;
pub mod persistence;
pub mod pipeline;
pub mod profile;
pub mod prompt;
pub mod quota;
pub mod response;
pub mod store;
pub mod title;
pub mod types;
pub mod validation;

// Re-exports for convenience
pub use brand::{BrandContextResolver, GUEST_BRAND_COOKIE};
pub use config::{GenerationConfig, QuotaConfig, ScribeConfig, ServerConfig, StorageConfig};
pub use error::{ComposeError, ConfigError, FieldErrors, GenerationError, StoreError};
pub use generation::{GenerationRequest, GenerationService};
pub use orchestrator::{
    GenerationOrchestrator, GenerationOutput, GenerationParams, GenerationPhase, GenerationRun,
    GenerationState,
};
pub use persistence::PersistenceAdapter;
pub use pipeline::ComposePipeline;
pub use profile::{BrandOutcome, BrandProfile, BrandService};
pub use prompt::PromptComposer;
pub use quota::{
    CookieQuotaStore, QuotaDecision, QuotaGate, QuotaStore, GUEST_GENERATION_LIMIT,
    GUEST_USAGE_COOKIE,
};
pub use response::ResponseAssembler;
pub use store::{BrandStore, DocumentStore, NewDocument};
pub use title::derive_title;
pub use types::{
    BrandContext, BrandSource, CallerContext, ClientCookie, ComposeOutcome, ComposeRequest,
    ComposeResponse, ComposedPrompt, ComposerSettings, EditorContext, GenerationResult,
    GuestState, MarketTier, PersistedDocument, StyleGuide, UserId,
};
pub use validation::validate_request;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with Scribe Core
    pub use crate::{
        CallerContext, ComposeError, ComposeOutcome, ComposePipeline, ComposeRequest,
        ComposerSettings, GenerationService, MarketTier, ScribeConfig,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
