//! Error types for Scribe Core
//!
//! Provides the failure taxonomy of the composition pipeline:
//! - Request validation failures with field-level detail
//! - Guest quota exhaustion
//! - Missing generation service configuration
//! - Upstream content failures
//!
//! Style-stage and persistence failures are deliberately absent from
//! `ComposeError`: they degrade to null fields and are only logged.

use std::collections::BTreeMap;

/// Field path to messages, e.g. `settings.characterLength`
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    /// Create empty error map
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message against a field
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    /// Check if any field failed
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of failing fields
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Messages for one field
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// Iterate failing fields
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

/// Main compose error type
#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    /// Malformed or undersized input
    #[error("invalid request: {} field(s) failed validation", .0.len())]
    Validation(FieldErrors),

    /// Anonymous caller reached the guest limit
    #[error("guest generation limit of {limit} reached")]
    QuotaExceeded {
        /// Generations already used
        used: u32,
        /// Threshold in force
        limit: u32,
    },

    /// Generation service missing or misconfigured
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Required content call failed or returned nothing
    #[error("content generation failed: {0}")]
    UpstreamContent(#[source] GenerationError),
}

impl ComposeError {
    /// HTTP status this error maps to
    #[inline]
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::QuotaExceeded { .. } => 403,
            Self::Configuration(_) => 500,
            Self::UpstreamContent(_) => 502,
        }
    }

    /// Check if the caller should be told to sign in
    #[inline]
    #[must_use]
    pub fn require_auth(&self) -> bool {
        matches!(self, Self::QuotaExceeded { .. })
    }

    /// Caller-facing message, free of upstream detail
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Validation(_) => "Request failed validation".to_string(),
            Self::QuotaExceeded { limit, .. } => format!(
                "You have used all {limit} free generations. Sign in to keep writing."
            ),
            Self::Configuration(_) => "Generation service is not configured".to_string(),
            Self::UpstreamContent(_) => {
                "The writing service failed to produce copy. Try again.".to_string()
            }
        }
    }

    /// Single-field validation error
    #[must_use]
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.add(field, message);
        Self::Validation(errors)
    }
}

/// Generation service call failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    /// Transport failure reaching the service
    #[error("request failed: {0}")]
    Request(String),

    /// Service answered with a non-success status
    #[error("service returned status {status}: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response excerpt
        message: String,
    },

    /// Response body could not be decoded
    #[error("malformed response: {0}")]
    Decode(String),

    /// Call exceeded its time budget
    #[error("call timed out after {after_ms}ms")]
    Timeout {
        /// Budget in milliseconds
        after_ms: u64,
    },

    /// Service returned blank text
    #[error("service returned empty output")]
    EmptyOutput,

    /// Orchestrator reached an impossible state
    #[error("internal generation error: {0}")]
    Internal(String),
}

impl GenerationError {
    /// Check if error is transient
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Request(_) | Self::Timeout { .. } => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Decode(_) | Self::EmptyOutput | Self::Internal(_) => false,
        }
    }
}

/// Key-value store failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Store cannot be reached
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Write rejected (constraint violation, quota, ...)
    #[error("write rejected: {0}")]
    Rejected(String),

    /// Operation exceeded its time budget
    #[error("store operation timed out after {after_ms}ms")]
    Timeout {
        /// Budget in milliseconds
        after_ms: u64,
    },
}

/// Configuration loading failures
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("cannot read config {path}: {source}")]
    Read {
        /// Path attempted
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// File is not valid TOML for the config schema
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Values parsed but are out of range
    #[error("invalid config value: {0}")]
    Invalid(String),
}
