//! Generation service seam
//!
//! The pipeline talks to the generative text service through this trait
//! only. The HTTP implementation lives in `scribe-llm`.

use crate::error::GenerationError;
use crate::types::ComposedPrompt;
use async_trait::async_trait;

/// One call to the generation service
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// System instruction
    pub system_prompt: String,
    /// User instruction
    pub user_prompt: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Output ceiling in tokens
    pub max_output_tokens: u32,
}

impl GenerationRequest {
    /// Build a request from composed prompts
    #[inline]
    #[must_use]
    pub fn from_prompt(prompt: &ComposedPrompt, temperature: f32, max_output_tokens: u32) -> Self {
        Self {
            system_prompt: prompt.system_prompt.clone(),
            user_prompt: prompt.user_prompt.clone(),
            temperature,
            max_output_tokens,
        }
    }
}

/// Generative text service
///
/// Two independent call shapes: the required content call and the optional
/// style description call. Implementations return the raw model text; blank
/// output handling is the orchestrator's job.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Produce copy for a composed brief
    async fn generate_content(&self, request: GenerationRequest) -> Result<String, GenerationError>;

    /// Describe the voice, tone and structure of finished copy
    async fn describe_style(&self, request: GenerationRequest) -> Result<String, GenerationError>;
}
