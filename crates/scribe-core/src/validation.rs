//! Request validation
//!
//! Runs before any external call. Collects every failing field instead of
//! stopping at the first one.

use crate::error::{ComposeError, FieldErrors};
use crate::types::{non_blank, ComposeRequest, EditorContext, StyleGuide};

/// Minimum brief length in characters, after trimming
pub const MIN_PROMPT_CHARS: usize = 10;
/// Largest accepted character ceiling
pub const MAX_CHARACTER_LENGTH: i64 = 2000;
/// Largest accepted word target
pub const MAX_WORD_LENGTH: i64 = 1500;
/// Longest grade level label
pub const MAX_GRADE_LEVEL_CHARS: usize = 32;
/// Longest benchmark reference
pub const MAX_BENCHMARK_CHARS: usize = 120;
/// Longest forbidden-words list
pub const MAX_AVOID_WORDS_CHARS: usize = 200;

/// Validate a request and return its normalized form
///
/// Normalization trims optional text and drops blank values, so a present
/// field always carries something to say.
///
/// # Errors
/// `ComposeError::Validation` with one entry per failing field
pub fn validate_request(request: ComposeRequest) -> Result<ComposeRequest, ComposeError> {
    let mut errors = FieldErrors::new();

    if request.prompt.trim().chars().count() < MIN_PROMPT_CHARS {
        errors.add(
            "prompt",
            format!("must be at least {MIN_PROMPT_CHARS} characters"),
        );
    }

    let settings = request.settings.normalized();
    check_range(
        &mut errors,
        "settings.characterLength",
        settings.character_length,
        MAX_CHARACTER_LENGTH,
    );
    check_range(&mut errors, "settings.wordLength", settings.word_length, MAX_WORD_LENGTH);
    check_len(
        &mut errors,
        "settings.gradeLevel",
        settings.grade_level.as_deref(),
        MAX_GRADE_LEVEL_CHARS,
    );
    check_len(
        &mut errors,
        "settings.benchmark",
        settings.benchmark.as_deref(),
        MAX_BENCHMARK_CHARS,
    );
    check_len(
        &mut errors,
        "settings.avoidWords",
        settings.avoid_words.as_deref(),
        MAX_AVOID_WORDS_CHARS,
    );

    let style_guide = match request.style_guide {
        Some(guide) if guide.name.trim().is_empty() && !guide.description.trim().is_empty() => {
            errors.add("styleGuide.name", "is required when a description is given");
            None
        }
        Some(guide) if guide.description.trim().is_empty() => None,
        Some(guide) => Some(StyleGuide {
            name: guide.name.trim().to_string(),
            description: guide.description.trim().to_string(),
        }),
        None => None,
    };

    if !errors.is_empty() {
        return Err(ComposeError::Validation(errors));
    }

    Ok(ComposeRequest {
        prompt: request.prompt,
        settings,
        brand_summary: non_blank(request.brand_summary.as_deref()),
        style_guide,
        editor_context: request.editor_context.filter(|ctx| !is_empty_editor(ctx)),
    })
}

fn is_empty_editor(ctx: &EditorContext) -> bool {
    ctx.is_blank() && ctx.document_id.as_deref().map_or(true, |id| id.trim().is_empty())
}

fn check_range(errors: &mut FieldErrors, field: &str, value: Option<i64>, max: i64) {
    match value {
        Some(v) if v < 1 => errors.add(field, "must be a positive integer"),
        Some(v) if v > max => errors.add(field, format!("must be at most {max}")),
        _ => {}
    }
}

fn check_len(errors: &mut FieldErrors, field: &str, value: Option<&str>, max: usize) {
    if let Some(text) = value {
        if text.chars().count() > max {
            errors.add(field, format!("must be at most {max} characters"));
        }
    }
}
