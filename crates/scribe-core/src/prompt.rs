//! Prompt composition
//!
//! Turns a request into the system and user instructions sent to the
//! generation service. Everything here is pure string assembly: no I/O, no
//! clock, no randomness. Identical inputs always produce identical prompts.

use crate::types::{ComposeRequest, ComposedPrompt, ComposerSettings, EditorContext, StyleGuide};

/// Non-negotiable output rules
pub const RULES_BLOCK: &str = "\
You are a senior copywriter. Follow these rules without exception:
- Never use em dashes or en dashes. Use commas, periods or parentheses instead.
- No filler phrasing, throat-clearing or hedging. Every sentence must earn its place.
- If a factual detail is missing (a price, a date, a name), write it in square brackets, e.g. [launch date].
- Never ask the user follow-up questions. Deliver the copy.
- Never use emoji unless the brief explicitly asks for them.";

/// Guidance against tell-tale machine prose
pub const ANTI_PATTERN_BLOCK: &str = "\
Avoid the patterns that make copy sound generated:
- Vary sentence rhythm. Mix short sentences with longer ones.
- Do not default to lists of three or triplet constructions.
- Skip stock transitions such as \"Moreover\", \"Furthermore\", \"In today's fast-paced world\" or \"Whether you're\".";

/// How the model must behave when executing the brief
pub const EXECUTION_BLOCK: &str = "\
Execution requirements:
- Produce the final copy immediately.
- Infer any missing details from the brief and brand context instead of asking.
- Never output placeholder instructions or notes about what you would write.";

const STYLE_ANALYSIS_SYSTEM: &str = "\
You are an editor who describes writing style precisely. \
Describe the voice, tone and structure of the text you are given in 2-3 sentences. \
Do not quote the text, do not praise it and do not suggest changes.";

const BRAND_SUMMARY_SYSTEM: &str = "\
You condense brand material into a reusable voice profile. \
Describe who the brand speaks to, how it sounds and what it never says, in at most 120 words of plain prose. \
Never use em dashes or en dashes.";

/// Builds prompts for the generation service
///
/// Stateless: only formats text.
pub struct PromptComposer;

impl PromptComposer {
    /// Compose prompts from a brief, its settings and the resolved brand
    #[must_use]
    pub fn compose(
        prompt: &str,
        settings: &ComposerSettings,
        brand_context: Option<&str>,
    ) -> ComposedPrompt {
        ComposedPrompt {
            system_prompt: Self::system_prompt(brand_context, None),
            user_prompt: Self::user_prompt(prompt, settings, brand_context, None),
        }
    }

    /// Compose prompts for a full request, including the style guide and
    /// editor surroundings when present
    #[must_use]
    pub fn compose_request(
        request: &ComposeRequest,
        brand_context: Option<&str>,
    ) -> ComposedPrompt {
        ComposedPrompt {
            system_prompt: Self::system_prompt(brand_context, request.style_guide.as_ref()),
            user_prompt: Self::user_prompt(
                &request.prompt,
                &request.settings,
                brand_context,
                request.editor_context.as_ref(),
            ),
        }
    }

    /// Prompts asking the service to describe finished copy
    #[must_use]
    pub fn compose_style_analysis(content: &str) -> ComposedPrompt {
        ComposedPrompt {
            system_prompt: STYLE_ANALYSIS_SYSTEM.to_string(),
            user_prompt: format!("Describe the writing style of this text:\n\n{}", content.trim()),
        }
    }

    /// Prompts condensing raw brand material into a voice profile
    #[must_use]
    pub fn compose_brand_summary(source_text: &str) -> ComposedPrompt {
        ComposedPrompt {
            system_prompt: BRAND_SUMMARY_SYSTEM.to_string(),
            user_prompt: format!(
                "Summarize the brand voice described by this material:\n\n{}",
                source_text.trim()
            ),
        }
    }

    /// Brief directives for the settings, in emission order
    ///
    /// Only present settings contribute a line.
    #[must_use]
    pub fn brief_directives(settings: &ComposerSettings) -> Vec<String> {
        let mut directives = Vec::new();

        if let Some(tier) = settings.market_tier {
            directives.push(format!("Market tier ({tier}): {}", tier.directive()));
        }
        if let Some(level) = &settings.grade_level {
            directives.push(format!(
                "Reading level: write so a {level} reader follows every sentence without effort."
            ));
        }
        if let Some(benchmark) = &settings.benchmark {
            directives.push(format!(
                "Benchmark: mirror the voice and polish of {benchmark} without borrowing its wording."
            ));
        }
        if let Some(chars) = settings.character_length {
            directives.push(format!(
                "Character limit: stay under {chars} characters including spaces. If the draft exceeds it, revise and shorten before answering."
            ));
        }
        if let Some(words) = settings.word_length {
            directives.push(format!(
                "Word count: aim for about {words} words. Treat it as a target, not a hard limit."
            ));
        }
        if let Some(words) = &settings.avoid_words {
            directives.push(format!(
                "Forbidden words: never use {words}. Where one would fit, substitute a natural alternative."
            ));
        }

        directives
    }

    fn system_prompt(brand_context: Option<&str>, style_guide: Option<&StyleGuide>) -> String {
        let mut prompt = String::new();

        prompt.push_str(RULES_BLOCK);
        prompt.push_str("\n\n");
        prompt.push_str(ANTI_PATTERN_BLOCK);

        if let Some(brand) = brand_context {
            prompt.push_str("\n\n=== BRAND GUIDELINES ===\n");
            prompt.push_str(
                "The guidelines below are authoritative. Where they conflict with any other style cue, follow them.\n",
            );
            prompt.push_str(brand.trim());
            prompt.push_str("\n=== END BRAND GUIDELINES ===");
        }

        if let Some(guide) = style_guide.filter(|g| !g.description.trim().is_empty()) {
            prompt.push_str("\n\n=== STYLE GUIDE: ");
            prompt.push_str(guide.name.trim());
            prompt.push_str(" ===\n");
            prompt.push_str(guide.description.trim());
            prompt.push_str("\n=== END STYLE GUIDE ===");
        }

        prompt
    }

    fn user_prompt(
        prompt: &str,
        settings: &ComposerSettings,
        brand_context: Option<&str>,
        editor: Option<&EditorContext>,
    ) -> String {
        let mut out = String::new();

        out.push_str(prompt.trim());

        if let Some(brand) = brand_context {
            out.push_str("\n\nBrand summary (use it to fill in any missing context):\n");
            out.push_str(brand.trim());
        }

        out.push_str("\n\n");
        out.push_str(EXECUTION_BLOCK);

        let directives = Self::brief_directives(settings);
        if !directives.is_empty() {
            out.push_str("\n\nBrief:");
            for directive in &directives {
                out.push_str("\n- ");
                out.push_str(directive);
            }
        }

        if let Some(editor) = editor.filter(|e| !e.is_blank()) {
            push_editor_context(&mut out, editor);
        }

        out
    }
}

fn push_editor_context(out: &mut String, editor: &EditorContext) {
    out.push_str("\n\nEditor context (write copy that fits at the cursor):");
    for (label, value) in [
        ("Text before the cursor", &editor.before),
        ("Selected text to replace", &editor.selection),
        ("Text after the cursor", &editor.after),
    ] {
        if let Some(text) = value.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            out.push('\n');
            out.push_str(label);
            out.push_str(":\n\"\"\"\n");
            out.push_str(text);
            out.push_str("\n\"\"\"");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MarketTier;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn full_settings() -> ComposerSettings {
        ComposerSettings::new()
            .with_market_tier(MarketTier::Premium)
            .with_character_length(280)
            .with_word_length(45)
            .with_grade_level("8th grade")
            .with_benchmark("Monocle")
            .with_avoid_words("synergy, leverage")
    }

    fn prefixes(directives: &[String]) -> Vec<&str> {
        directives
            .iter()
            .map(|d| d.split(':').next().unwrap_or_default())
            .collect()
    }

    #[test]
    fn directives_follow_fixed_order() {
        let directives = PromptComposer::brief_directives(&full_settings());

        assert_eq!(
            prefixes(&directives),
            vec![
                "Market tier (premium)",
                "Reading level",
                "Benchmark",
                "Character limit",
                "Word count",
                "Forbidden words",
            ]
        );
    }

    #[test]
    fn character_limit_demands_revision() {
        let directives =
            PromptComposer::brief_directives(&ComposerSettings::new().with_character_length(150));
        assert_eq!(directives.len(), 1);
        assert!(directives[0].contains("under 150 characters"));
        assert!(directives[0].contains("revise"));
    }

    #[test]
    fn brief_omitted_when_no_settings() {
        let prompt =
            PromptComposer::compose("Write a product blurb", &ComposerSettings::new(), None);
        assert!(!prompt.user_prompt.contains("Brief:"));
        assert!(prompt.user_prompt.ends_with(EXECUTION_BLOCK));
    }

    #[test]
    fn user_prompt_sections_in_order() {
        let prompt = PromptComposer::compose(
            "  Write a launch email for our kettle  ",
            &full_settings(),
            Some("Calm, precise, Scandinavian"),
        );
        let user = &prompt.user_prompt;

        assert!(user.starts_with("Write a launch email for our kettle\n\n"));
        let brand = user.find("Brand summary").unwrap();
        let exec = user.find("Execution requirements").unwrap();
        let brief = user.find("Brief:").unwrap();
        assert!(brand < exec && exec < brief);
    }

    #[test]
    fn no_brand_block_without_context() {
        let prompt = PromptComposer::compose("Write a product blurb", &full_settings(), None);
        assert!(!prompt.user_prompt.contains("Brand summary"));
        assert!(!prompt.system_prompt.contains("BRAND GUIDELINES"));
    }

    #[test]
    fn system_prompt_layout() {
        let prompt = PromptComposer::compose(
            "Write a product blurb",
            &ComposerSettings::new(),
            Some("Warm"),
        );
        let system = &prompt.system_prompt;

        assert!(system.starts_with(RULES_BLOCK));
        let anti = system.find(ANTI_PATTERN_BLOCK).unwrap();
        let brand = system.find("=== BRAND GUIDELINES ===").unwrap();
        assert!(anti < brand);
        assert!(system.contains("authoritative"));
        assert!(system.ends_with("=== END BRAND GUIDELINES ==="));
    }

    #[test]
    fn style_guide_follows_brand_block() {
        let request = ComposeRequest::new("Write a product blurb")
            .with_style_guide("House", "Short paragraphs, British spelling.");
        let prompt = PromptComposer::compose_request(&request, Some("Warm"));

        let brand = prompt.system_prompt.find("BRAND GUIDELINES").unwrap();
        let guide = prompt.system_prompt.find("=== STYLE GUIDE: House ===").unwrap();
        assert!(brand < guide);
    }

    #[test]
    fn editor_context_appended_after_brief() {
        let request = ComposeRequest::new("Rewrite the selected sentence")
            .with_settings(ComposerSettings::new().with_word_length(20))
            .with_editor_context(EditorContext {
                before: Some("Our store opens at nine.".into()),
                selection: Some("We sell good stuff.".into()),
                ..EditorContext::default()
            });
        let prompt = PromptComposer::compose_request(&request, None);
        let user = &prompt.user_prompt;

        let brief = user.find("Brief:").unwrap();
        let editor = user.find("Editor context").unwrap();
        assert!(brief < editor);
        assert!(user.contains("We sell good stuff."));
        assert!(!user.contains("Text after the cursor"));
    }

    #[test]
    fn composition_is_deterministic() {
        let a = PromptComposer::compose("Write a product blurb", &full_settings(), Some("Warm"));
        let b = PromptComposer::compose("Write a product blurb", &full_settings(), Some("Warm"));
        assert_eq!(a, b);
    }

    #[test]
    fn rule_block_bans_dashes() {
        assert!(!RULES_BLOCK.contains('\u{2014}'));
        assert!(!RULES_BLOCK.contains('\u{2013}'));
        assert!(RULES_BLOCK.contains("em dashes"));
    }

    fn arb_settings() -> impl Strategy<Value = ComposerSettings> {
        (
            proptest::option::of(prop_oneof![
                Just(MarketTier::MassMarket),
                Just(MarketTier::MidMarket),
                Just(MarketTier::Premium),
                Just(MarketTier::Luxury),
            ]),
            proptest::option::of(1i64..=2000),
            proptest::option::of(1i64..=1500),
            proptest::option::of("[a-z0-9 ]{1,20}"),
            proptest::option::of("[A-Za-z ]{1,40}"),
            proptest::option::of("[a-z, ]{1,60}"),
        )
            .prop_map(|(tier, chars, words, grade, bench, avoid)| ComposerSettings {
                market_tier: tier,
                character_length: chars,
                word_length: words,
                grade_level: grade,
                benchmark: bench,
                avoid_words: avoid,
            })
    }

    proptest! {
        #[test]
        fn prop_brief_lists_only_present_settings_in_order(settings in arb_settings()) {
            let directives = PromptComposer::brief_directives(&settings);

            let expected: Vec<&str> = [
                (settings.market_tier.is_some(), "Market tier"),
                (settings.grade_level.is_some(), "Reading level"),
                (settings.benchmark.is_some(), "Benchmark"),
                (settings.character_length.is_some(), "Character limit"),
                (settings.word_length.is_some(), "Word count"),
                (settings.avoid_words.is_some(), "Forbidden words"),
            ]
            .into_iter()
            .filter(|(present, _)| *present)
            .map(|(_, label)| label)
            .collect();

            prop_assert_eq!(directives.len(), expected.len());
            for (directive, label) in directives.iter().zip(&expected) {
                prop_assert!(directive.starts_with(label));
            }

            let prompt = PromptComposer::compose("Write a product blurb", &settings, None);
            prop_assert_eq!(prompt.user_prompt.contains("Brief:"), !expected.is_empty());
        }
    }
}
