//! Response assembly
//!
//! Merges the generation output, the persistence outcome and the original
//! request into the payload returned to the caller.

use crate::types::{
    ClientCookie, ComposeOutcome, ComposeRequest, ComposeResponse, GenerationResult,
    PersistedDocument,
};
use chrono::Utc;

/// Builds the success payload
pub struct ResponseAssembler;

impl ResponseAssembler {
    /// Assemble a success payload
    ///
    /// Without a persisted document the id is `None` and the timestamp is
    /// taken locally. `quota_commit` is attached as-is; callers only pass it
    /// on the success path.
    #[must_use]
    pub fn assemble(
        result: GenerationResult,
        persisted: Option<PersistedDocument>,
        request: &ComposeRequest,
        quota_commit: Option<ClientCookie>,
    ) -> ComposeOutcome {
        let (document_id, created_at) = match persisted {
            Some(doc) => (Some(doc.id), doc.created_at),
            None => (None, Utc::now()),
        };

        ComposeOutcome {
            response: ComposeResponse {
                document_id,
                title: result.title,
                content: result.content,
                writing_style: result.writing_style,
                created_at,
                prompt: request.prompt.clone(),
                settings: request.settings.clone(),
            },
            client_writes: quota_commit.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quota::GUEST_USAGE_COOKIE;
    use crate::types::{ComposerSettings, MarketTier};
    use chrono::{DateTime, TimeZone};

    fn result() -> GenerationResult {
        GenerationResult {
            content: "Copy".to_string(),
            writing_style: Some("Plain.".to_string()),
            title: "Tagline".to_string(),
        }
    }

    #[test]
    fn persisted_identity_is_used() {
        let created_at = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let request = ComposeRequest::new("Write a tagline for a bakery");

        let outcome = ResponseAssembler::assemble(
            result(),
            Some(PersistedDocument {
                id: "doc-9".into(),
                created_at,
            }),
            &request,
            None,
        );

        assert_eq!(outcome.response.document_id.as_deref(), Some("doc-9"));
        assert_eq!(outcome.response.created_at, created_at);
        assert!(outcome.client_writes.is_empty());
    }

    #[test]
    fn local_timestamp_without_persistence() {
        let before = Utc::now();
        let request = ComposeRequest::new("Write a tagline for a bakery");
        let outcome = ResponseAssembler::assemble(result(), None, &request, None);

        assert!(outcome.response.document_id.is_none());
        assert!(outcome.response.created_at >= before);
    }

    #[test]
    fn payload_shape() {
        let request = ComposeRequest::new("Write a tagline for a bakery")
            .with_settings(ComposerSettings::new().with_word_length(12));
        let commit = ClientCookie::set(GUEST_USAGE_COOKIE, "1", 86_400);
        let outcome = ResponseAssembler::assemble(result(), None, &request, Some(commit.clone()));

        let json = serde_json::to_value(&outcome.response).unwrap();
        assert!(json["documentId"].is_null());
        assert!(json["settings"]["marketTier"].is_null());
        assert_eq!(json["settings"]["wordLength"], 12);
        assert_eq!(json["writingStyle"], "Plain.");
        assert_eq!(json["prompt"], "Write a tagline for a bakery");
        let created = json["createdAt"].as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(created).is_ok());
        assert_eq!(outcome.client_writes, vec![commit]);
    }

    #[test]
    fn market_tier_echoed() {
        let request = ComposeRequest::new("Write a tagline for a bakery")
            .with_settings(ComposerSettings::new().with_market_tier(MarketTier::Luxury));
        let outcome = ResponseAssembler::assemble(result(), None, &request, None);

        let json = serde_json::to_value(&outcome.response).unwrap();
        assert_eq!(json["settings"]["marketTier"], "luxury");
    }
}
