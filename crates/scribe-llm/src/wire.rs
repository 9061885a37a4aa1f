//! Chat-completions wire format

use scribe_core::{GenerationError, GenerationRequest};
use serde::{Deserialize, Serialize};

/// Request body for `POST {base}/chat/completions`
#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest<'a> {
    /// Model name
    pub model: &'a str,
    /// System then user message
    pub messages: Vec<ChatMessage<'a>>,
    /// Sampling temperature
    pub temperature: f32,
    /// Output ceiling
    pub max_tokens: u32,
}

impl<'a> ChatCompletionRequest<'a> {
    /// Build the body for one generation request
    #[must_use]
    pub fn new(model: &'a str, request: &'a GenerationRequest) -> Self {
        Self {
            model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user_prompt,
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_output_tokens,
        }
    }
}

/// One chat message
#[derive(Debug, Serialize)]
pub struct ChatMessage<'a> {
    /// `system` or `user`
    pub role: &'static str,
    /// Message text
    pub content: &'a str,
}

/// Response body
#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    /// Candidate completions
    #[serde(default)]
    pub choices: Vec<Choice>,
}

/// One candidate completion
#[derive(Debug, Deserialize)]
pub struct Choice {
    /// Assistant message
    pub message: ChoiceMessage,
}

/// Assistant message in a choice
#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    /// Text, absent on refusals and tool calls
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatCompletionResponse {
    /// Text of the first choice
    ///
    /// A missing `content` reads as empty text; blank output is judged by
    /// the caller.
    ///
    /// # Errors
    /// `GenerationError::Decode` when the response has no choices
    pub fn into_text(self) -> Result<String, GenerationError> {
        self.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.unwrap_or_default())
            .ok_or_else(|| GenerationError::Decode("response contained no choices".to_string()))
    }
}

/// Error body returned with non-success statuses
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    /// Error detail
    pub error: ApiErrorDetail,
}

/// Error detail
#[derive(Debug, Deserialize)]
pub struct ApiErrorDetail {
    /// Human-readable message
    pub message: String,
}

/// Longest upstream error excerpt carried in `GenerationError::Status`
pub const ERROR_EXCERPT_CHARS: usize = 200;

/// Short description of a failed response body
///
/// Prefers the structured error message; otherwise the raw body, cut to
/// [`ERROR_EXCERPT_CHARS`].
#[must_use]
pub fn error_excerpt(body: &str) -> String {
    let message = serde_json::from_str::<ApiErrorBody>(body)
        .map(|parsed| parsed.error.message)
        .unwrap_or_else(|_| body.trim().to_string());
    message.chars().take(ERROR_EXCERPT_CHARS).collect()
}
