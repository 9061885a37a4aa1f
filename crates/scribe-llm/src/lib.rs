//! Scribe LLM - chat-completions generation service
//!
//! Implements [`scribe_core::GenerationService`] against any endpoint that
//! speaks the chat-completions protocol. Both call shapes (content and
//! style) are plain completions; the prompts decide which is which.

pub mod client;
pub mod wire;

pub use client::{ChatClient, LlmClientError};
pub use wire::{ChatCompletionRequest, ChatCompletionResponse};
