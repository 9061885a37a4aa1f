//! Core types for Scribe
//!
//! Defines the data that flows through the composition pipeline:
//! - Compose requests and composer settings
//! - Caller identity and client-held guest state
//! - Brand context and its provenance
//! - Generation results, persisted documents and the response payload

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Authenticated account identifier supplied by the session layer
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    /// Create a user id, rejecting blank values
    #[inline]
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// Borrow the raw id
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Guest state carried by the client between requests
///
/// Values are the decoded cookie payloads; the server owns the wire encoding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuestState {
    /// Raw usage counter token (integer string when well formed)
    pub usage_counter: Option<String>,
    /// Brand text remembered for an anonymous visitor
    pub brand: Option<String>,
}

/// Who is calling and what they carry
#[derive(Debug, Clone, Default)]
pub struct CallerContext {
    /// Authenticated identity, `None` for anonymous callers
    pub user: Option<UserId>,
    /// Client-held guest state
    pub guest: GuestState,
}

impl CallerContext {
    /// Anonymous caller with no guest state
    #[inline]
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Authenticated caller
    #[inline]
    #[must_use]
    pub fn authenticated(user: UserId) -> Self {
        Self {
            user: Some(user),
            guest: GuestState::default(),
        }
    }

    /// With guest usage counter token
    #[inline]
    #[must_use]
    pub fn with_usage_counter(mut self, raw: impl Into<String>) -> Self {
        self.guest.usage_counter = Some(raw.into());
        self
    }

    /// With guest brand text
    #[inline]
    #[must_use]
    pub fn with_guest_brand(mut self, brand: impl Into<String>) -> Self {
        self.guest.brand = Some(brand.into());
        self
    }

    /// Check whether the caller carries an identity
    #[inline]
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

/// Audience positioning tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MarketTier {
    /// Broad consumer audience
    MassMarket,
    /// Value-conscious but quality-aware audience
    MidMarket,
    /// Discerning buyers paying for quality
    Premium,
    /// Exclusive, high-end positioning
    Luxury,
}

impl MarketTier {
    /// Wire name of the tier
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketTier::MassMarket => "mass-market",
            MarketTier::MidMarket => "mid-market",
            MarketTier::Premium => "premium",
            MarketTier::Luxury => "luxury",
        }
    }

    /// Tone directive for the tier
    #[must_use]
    pub fn directive(&self) -> &'static str {
        match self {
            MarketTier::MassMarket => {
                "Write for a broad mass-market audience: plain words, clear benefits, an approachable and energetic voice."
            }
            MarketTier::MidMarket => {
                "Write for a mid-market audience: practical value first, confident but never pushy."
            }
            MarketTier::Premium => {
                "Write for a premium audience: polished and assured, leaning on craft and quality rather than price."
            }
            MarketTier::Luxury => {
                "Write for a luxury audience: restrained, understated and exclusive. Never sound eager or discount-driven."
            }
        }
    }
}

impl fmt::Display for MarketTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured tone and length constraints
///
/// Every field is independently optional. A present field becomes one
/// directive in the prompt brief.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComposerSettings {
    /// Audience positioning
    #[serde(default)]
    pub market_tier: Option<MarketTier>,
    /// Hard character ceiling (1..=2000)
    #[serde(default)]
    pub character_length: Option<i64>,
    /// Approximate word target (1..=1500)
    #[serde(default)]
    pub word_length: Option<i64>,
    /// Reading level, e.g. "8th grade"
    #[serde(default)]
    pub grade_level: Option<String>,
    /// Reference publication or brand to mirror
    #[serde(default)]
    pub benchmark: Option<String>,
    /// Comma-separated words that must not appear
    #[serde(default)]
    pub avoid_words: Option<String>,
}

impl ComposerSettings {
    /// Create empty settings
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With market tier
    #[inline]
    #[must_use]
    pub fn with_market_tier(mut self, tier: MarketTier) -> Self {
        self.market_tier = Some(tier);
        self
    }

    /// With character ceiling
    #[inline]
    #[must_use]
    pub fn with_character_length(mut self, chars: i64) -> Self {
        self.character_length = Some(chars);
        self
    }

    /// With word target
    #[inline]
    #[must_use]
    pub fn with_word_length(mut self, words: i64) -> Self {
        self.word_length = Some(words);
        self
    }

    /// With reading level
    #[inline]
    #[must_use]
    pub fn with_grade_level(mut self, level: impl Into<String>) -> Self {
        self.grade_level = Some(level.into());
        self
    }

    /// With benchmark to mirror
    #[inline]
    #[must_use]
    pub fn with_benchmark(mut self, benchmark: impl Into<String>) -> Self {
        self.benchmark = Some(benchmark.into());
        self
    }

    /// With forbidden words
    #[inline]
    #[must_use]
    pub fn with_avoid_words(mut self, words: impl Into<String>) -> Self {
        self.avoid_words = Some(words.into());
        self
    }

    /// Trim text fields and drop the ones left blank
    #[must_use]
    pub fn normalized(&self) -> Self {
        Self {
            market_tier: self.market_tier,
            character_length: self.character_length,
            word_length: self.word_length,
            grade_level: non_blank(self.grade_level.as_deref()),
            benchmark: non_blank(self.benchmark.as_deref()),
            avoid_words: non_blank(self.avoid_words.as_deref()),
        }
    }

    /// True when no directive would be emitted
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.market_tier.is_none()
            && self.character_length.is_none()
            && self.word_length.is_none()
            && self.grade_level.is_none()
            && self.benchmark.is_none()
            && self.avoid_words.is_none()
    }
}

/// Named style guide supplied with a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleGuide {
    /// Display name
    pub name: String,
    /// Free-text guidance
    pub description: String,
}

/// Surrounding document text when composing inside an editor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorContext {
    /// Text before the cursor
    #[serde(default)]
    pub before: Option<String>,
    /// Text after the cursor
    #[serde(default)]
    pub after: Option<String>,
    /// Currently selected text
    #[serde(default)]
    pub selection: Option<String>,
    /// Document being edited
    #[serde(default)]
    pub document_id: Option<String>,
}

impl EditorContext {
    /// True when no surrounding text was supplied
    #[must_use]
    pub fn is_blank(&self) -> bool {
        [&self.before, &self.after, &self.selection]
            .iter()
            .all(|field| field.as_deref().map_or(true, |s| s.trim().is_empty()))
    }
}

/// A compose request as received from the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComposeRequest {
    /// Natural-language brief
    pub prompt: String,
    /// Tone and length constraints
    #[serde(default)]
    pub settings: ComposerSettings,
    /// Explicit brand voice override
    #[serde(default)]
    pub brand_summary: Option<String>,
    /// Named style guide
    #[serde(default)]
    pub style_guide: Option<StyleGuide>,
    /// Editor surroundings
    #[serde(default)]
    pub editor_context: Option<EditorContext>,
}

impl ComposeRequest {
    /// Create request with default settings
    #[inline]
    #[must_use]
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            settings: ComposerSettings::default(),
            brand_summary: None,
            style_guide: None,
            editor_context: None,
        }
    }

    /// With settings
    #[inline]
    #[must_use]
    pub fn with_settings(mut self, settings: ComposerSettings) -> Self {
        self.settings = settings;
        self
    }

    /// With explicit brand override
    #[inline]
    #[must_use]
    pub fn with_brand_summary(mut self, brand: impl Into<String>) -> Self {
        self.brand_summary = Some(brand.into());
        self
    }

    /// With style guide
    #[inline]
    #[must_use]
    pub fn with_style_guide(
        mut self,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        self.style_guide = Some(StyleGuide {
            name: name.into(),
            description: description.into(),
        });
        self
    }

    /// With editor context
    #[inline]
    #[must_use]
    pub fn with_editor_context(mut self, context: EditorContext) -> Self {
        self.editor_context = Some(context);
        self
    }
}

/// Where the resolved brand text came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BrandSource {
    /// Supplied in the request
    Explicit,
    /// Stored profile of the authenticated account
    Stored,
    /// Guest cookie
    GuestCookie,
    /// No brand constraint
    None,
}

/// Resolved brand voice for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrandContext {
    /// Trimmed brand text (empty when `source` is `None`)
    pub text: String,
    /// Winning source
    pub source: BrandSource,
}

impl BrandContext {
    /// No brand constraint
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        Self {
            text: String::new(),
            source: BrandSource::None,
        }
    }

    /// Brand text, if any
    #[inline]
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self.source {
            BrandSource::None => None,
            _ => Some(&self.text),
        }
    }
}

/// System and user instructions sent to the generation service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedPrompt {
    /// System instruction
    pub system_prompt: String,
    /// User instruction
    pub user_prompt: String,
}

/// Output of a completed generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResult {
    /// Generated copy, non-empty after trim
    pub content: String,
    /// Style description, `None` when the style stage degraded
    pub writing_style: Option<String>,
    /// Title derived from the prompt
    pub title: String,
}

/// Document record assigned by the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedDocument {
    /// Store-assigned id
    pub id: String,
    /// Store-assigned creation time
    pub created_at: DateTime<Utc>,
}

/// Client-side state write carried on an outgoing response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientCookie {
    /// Cookie name
    pub name: &'static str,
    /// Decoded value
    pub value: String,
    /// Validity in seconds, zero removes the cookie
    pub max_age_secs: u64,
}

impl ClientCookie {
    /// Set a cookie
    #[inline]
    #[must_use]
    pub fn set(name: &'static str, value: impl Into<String>, max_age_secs: u64) -> Self {
        Self {
            name,
            value: value.into(),
            max_age_secs,
        }
    }

    /// Remove a cookie
    #[inline]
    #[must_use]
    pub fn remove(name: &'static str) -> Self {
        Self {
            name,
            value: String::new(),
            max_age_secs: 0,
        }
    }

    /// Check if this write clears the cookie
    #[inline]
    #[must_use]
    pub fn is_removal(&self) -> bool {
        self.max_age_secs == 0
    }
}

/// Successful compose payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComposeResponse {
    /// Persisted document id, `None` when not persisted
    pub document_id: Option<String>,
    /// Derived title
    pub title: String,
    /// Generated copy
    pub content: String,
    /// Style description
    pub writing_style: Option<String>,
    /// Store timestamp or local fallback
    pub created_at: DateTime<Utc>,
    /// Original prompt
    pub prompt: String,
    /// Settings echoed back
    pub settings: ComposerSettings,
}

/// Response payload plus the client-state writes to attach
#[derive(Debug, Clone)]
pub struct ComposeOutcome {
    /// JSON body
    pub response: ComposeResponse,
    /// Cookies to set on the response
    pub client_writes: Vec<ClientCookie>,
}

pub(crate) fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_deserialize_camel_case() {
        let json = r#"{"marketTier":"luxury","characterLength":280,"avoidWords":"cheap"}"#;
        let settings: ComposerSettings = serde_json::from_str(json).unwrap();

        assert_eq!(settings.market_tier, Some(MarketTier::Luxury));
        assert_eq!(settings.character_length, Some(280));
        assert_eq!(settings.avoid_words.as_deref(), Some("cheap"));
        assert!(settings.word_length.is_none());
    }

    #[test]
    fn settings_echo_null_market_tier() {
        let value = serde_json::to_value(ComposerSettings::new()).unwrap();
        assert!(value["marketTier"].is_null());
    }

    #[test]
    fn settings_normalized_drops_blank_text() {
        let settings = ComposerSettings::new()
            .with_grade_level("   ")
            .with_benchmark("  The Atlantic ");

        let normalized = settings.normalized();
        assert!(normalized.grade_level.is_none());
        assert_eq!(normalized.benchmark.as_deref(), Some("The Atlantic"));
    }

    #[test]
    fn request_defaults_missing_settings() {
        let request: ComposeRequest =
            serde_json::from_str(r#"{"prompt":"Write a launch email"}"#).unwrap();
        assert!(request.settings.is_empty());
        assert!(request.brand_summary.is_none());
    }

    #[test]
    fn brand_context_none_has_no_text() {
        assert!(BrandContext::none().as_text().is_none());
    }

    #[test]
    fn user_id_rejects_blank() {
        assert!(UserId::parse("  ").is_none());
        assert_eq!(UserId::parse(" u-1 ").unwrap().as_str(), "u-1");
    }

    #[test]
    fn editor_context_blank_detection() {
        assert!(EditorContext::default().is_blank());
        let ctx = EditorContext {
            selection: Some("old line".into()),
            ..EditorContext::default()
        };
        assert!(!ctx.is_blank());
    }
}
