//! Document title derivation

/// Longest title produced, in characters, before the ellipsis
pub const MAX_TITLE_CHARS: usize = 60;

/// Title used when the prompt yields nothing usable
pub const FALLBACK_TITLE: &str = "Untitled draft";

const CLAUSE_BREAKS: [char; 6] = ['.', '!', '?', ';', ':', '\n'];

/// Derive a short title from the brief
///
/// Takes the first clause, collapses whitespace, capitalizes the first
/// letter and cuts on a word boundary. Deterministic.
#[must_use]
pub fn derive_title(prompt: &str) -> String {
    let clause = prompt
        .trim()
        .split(|c: char| CLAUSE_BREAKS.contains(&c))
        .map(str::trim)
        .find(|part| !part.is_empty())
        .unwrap_or_default();

    let words: Vec<&str> = clause.split_whitespace().collect();
    if words.is_empty() {
        return FALLBACK_TITLE.to_string();
    }

    let mut title = String::new();
    let mut truncated = false;
    for word in &words {
        let extra = if title.is_empty() { 0 } else { 1 };
        if title.chars().count() + extra + word.chars().count() > MAX_TITLE_CHARS {
            truncated = true;
            break;
        }
        if extra == 1 {
            title.push(' ');
        }
        title.push_str(word);
    }

    if title.is_empty() {
        // First word alone is longer than the limit
        title = words[0].chars().take(MAX_TITLE_CHARS).collect();
        truncated = true;
    }

    let title = capitalize_first(&title);
    if truncated {
        format!("{}...", title.trim_end_matches(|c: char| c == ',' || c == ' '))
    } else {
        title
    }
}

fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_clause_becomes_title() {
        assert_eq!(
            derive_title("write a launch email for our new kettle. Mention the price."),
            "Write a launch email for our new kettle"
        );
    }

    #[test]
    fn whitespace_is_collapsed() {
        assert_eq!(derive_title("  product   blurb\tfor socks  "), "Product blurb for socks");
    }

    #[test]
    fn long_clause_cut_on_word_boundary() {
        let title = derive_title(
            "draft a detailed announcement covering every single feature we shipped in the autumn release",
        );
        assert!(title.ends_with("..."));
        assert!(title.chars().count() <= MAX_TITLE_CHARS + 3);
        assert!(!title.contains("  "));
        assert!(title.starts_with("Draft a detailed announcement"));
    }

    #[test]
    fn single_giant_word_is_clipped() {
        let title = derive_title(&"x".repeat(200));
        assert_eq!(title.chars().count(), MAX_TITLE_CHARS + 3);
    }

    #[test]
    fn leading_punctuation_skipped() {
        assert_eq!(derive_title("...? tagline for a bakery"), "Tagline for a bakery");
    }

    #[test]
    fn blank_prompt_uses_fallback() {
        assert_eq!(derive_title(" .!? "), FALLBACK_TITLE);
    }

    #[test]
    fn derivation_is_stable() {
        let prompt = "Write three taglines for a climbing gym";
        assert_eq!(derive_title(prompt), derive_title(prompt));
    }
}
