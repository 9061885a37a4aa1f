//! Scribe configuration
//!
//! Every section has working defaults so an empty TOML file is valid.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScribeConfig {
    /// Guest quota policy
    pub quota: QuotaConfig,
    /// Generation service settings
    pub generation: GenerationConfig,
    /// Persistent store settings
    pub storage: StorageConfig,
    /// HTTP surface settings
    pub server: ServerConfig,
}

impl ScribeConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from TOML text
    ///
    /// # Errors
    /// `ConfigError::Parse` on malformed TOML, `ConfigError::Invalid` on
    /// out-of-range values
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    ///
    /// # Errors
    /// `ConfigError::Read` if the file cannot be read, otherwise as
    /// [`ScribeConfig::from_toml_str`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// With quota enforcement toggled
    #[inline]
    #[must_use]
    pub fn with_quota_enforcement(mut self, enforce: bool) -> Self {
        self.quota.enforce = enforce;
        self
    }

    /// With storage toggled
    #[inline]
    #[must_use]
    pub fn with_storage_enabled(mut self, enabled: bool) -> Self {
        self.storage.enabled = enabled;
        self
    }

    /// With content and style call timeouts
    #[inline]
    #[must_use]
    pub fn with_generation_timeouts(mut self, content: Duration, style: Duration) -> Self {
        self.generation.content_timeout_ms = duration_ms(content);
        self.generation.style_timeout_ms = duration_ms(style);
        self
    }

    /// With persistence timeout
    #[inline]
    #[must_use]
    pub fn with_storage_timeout(mut self, timeout: Duration) -> Self {
        self.storage.timeout_ms = duration_ms(timeout);
        self
    }

    /// Reject values that would disable a bound
    ///
    /// # Errors
    /// `ConfigError::Invalid` naming the offending key
    pub fn validate(&self) -> Result<(), ConfigError> {
        let g = &self.generation;
        if !(0.0..=2.0).contains(&g.temperature) {
            return Err(ConfigError::Invalid(format!(
                "generation.temperature must be within 0.0..=2.0, got {}",
                g.temperature
            )));
        }
        for (key, value) in [
            ("generation.content_timeout_ms", g.content_timeout_ms),
            ("generation.style_timeout_ms", g.style_timeout_ms),
            ("storage.timeout_ms", self.storage.timeout_ms),
            ("quota.window_secs", self.quota.window_secs),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid(format!("{key} must be greater than zero")));
            }
        }
        if g.max_output_tokens == 0 || g.style_max_tokens == 0 {
            return Err(ConfigError::Invalid(
                "generation token ceilings must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Guest quota policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuotaConfig {
    /// Enforce the guest limit
    pub enforce: bool,
    /// Validity of the usage counter token
    pub window_secs: u64,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            enforce: true,
            window_secs: 24 * 60 * 60,
        }
    }
}

/// Generation service settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Chat-completions base URL
    pub base_url: String,
    /// Model name
    pub model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Sampling temperature for the content call
    pub temperature: f32,
    /// Output ceiling for the content call
    pub max_output_tokens: u32,
    /// Output ceiling for the style call
    pub style_max_tokens: u32,
    /// Content call budget
    pub content_timeout_ms: u64,
    /// Style call budget
    pub style_timeout_ms: u64,
}

impl GenerationConfig {
    /// Content call budget
    #[inline]
    #[must_use]
    pub fn content_timeout(&self) -> Duration {
        Duration::from_millis(self.content_timeout_ms)
    }

    /// Style call budget
    #[inline]
    #[must_use]
    pub fn style_timeout(&self) -> Duration {
        Duration::from_millis(self.style_timeout_ms)
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "SCRIBE_API_KEY".to_string(),
            temperature: 0.4,
            max_output_tokens: 1200,
            style_max_tokens: 200,
            content_timeout_ms: 60_000,
            style_timeout_ms: 20_000,
        }
    }
}

/// Persistent store settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Use the store at all
    pub enabled: bool,
    /// Per-operation budget
    pub timeout_ms: u64,
}

impl StorageConfig {
    /// Per-operation budget
    #[inline]
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_ms: 3_000,
        }
    }
}

/// HTTP surface settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address
    pub bind: String,
    /// Validity of the guest brand cookie
    pub brand_cookie_max_age_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8787".to_string(),
            brand_cookie_max_age_secs: 365 * 24 * 60 * 60,
        }
    }
}

pub(crate) fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
