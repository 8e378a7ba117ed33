use common::language::Language;
use once_cell::sync::Lazy;
use std::collections::HashSet;

static STOPWORDS_EN: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "he", "in", "is",
        "it", "its", "of", "on", "that", "the", "to", "was", "were", "will", "with", "this",
        "but", "or", "not", "so",
    ]
    .into_iter()
    .collect()
});

static STOPWORDS_AR: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    ["في", "من", "على", "إلى", "عن", "مع", "هو", "هي", "و", "أن", "ان"]
        .into_iter()
        .collect()
});

/// Splits `text` into lowercased word tokens, applies Arabic-specific normalization when
/// `language` is Arabic, drops the language's stopwords and single-character tokens.
pub fn tokenize(text: &str, language: &Language) -> Vec<String> {
    let stopwords: &HashSet<&str> = if language.is_arabic() {
        &STOPWORDS_AR
    } else {
        &STOPWORDS_EN
    };

    text.split(|c: char| !c.is_alphanumeric())
        .filter(|raw| !raw.is_empty())
        .map(|raw| {
            if language.is_arabic() {
                common::language::normalize_entity_name(raw)
            } else {
                raw.to_lowercase()
            }
        })
        .filter(|token| token.chars().count() > 1)
        .filter(|token| !stopwords.contains(token.as_str()))
        .collect()
}
