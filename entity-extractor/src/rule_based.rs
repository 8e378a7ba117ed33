use async_trait::async_trait;
use common::language::Language;
use common::types::entity::EntityType;
use common::types::Mention;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

use crate::EntityExtractor;

static DATE_RE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(
        r"(?x)
        \b(
            \d{4}-\d{2}-\d{2}                                   # 2024-03-05
            | (?:January|February|March|April|May|June|July|August|September|October|November|December)
              \s+\d{1,2}(?:st|nd|rd|th)?,?\s+\d{4}               # March 5, 2024
            | \b\d{4}\b                                          # bare year
        )\b
        ",
    )
    .unwrap()
});

static ORG_SUFFIXES: &[&str] = &[
    "Inc", "Inc.", "Corp", "Corp.", "Ltd", "Ltd.", "LLC", "University", "Company", "Foundation",
    "Institute", "Association",
];

static CAPITALIZED_WORD: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"\b\p{Lu}[\p{L}'’-]*\b").unwrap()
});

/// Deterministic, dependency-free NER backend: capitalization runs classified by simple
/// heuristics, a regex for dates, and a caller-provided gazetteer for CONCEPT/PRODUCT/EVENT.
/// Not a quality bar — stands in so the pipeline runs end-to-end without an external model or
/// network call (see SPEC_FULL.md §4.2).
pub struct RuleBasedExtractor {
    gazetteer: HashMap<String, EntityType>,
}

impl RuleBasedExtractor {
    pub fn new(gazetteer: HashMap<String, EntityType>) -> Self {
        Self { gazetteer }
    }

    fn classify_span(&self, span_text: &str) -> EntityType {
        let lower = span_text.to_lowercase();
        if let Some(&entity_type) = self.gazetteer.get(&lower) {
            return entity_type;
        }
        if ORG_SUFFIXES
            .iter()
            .any(|suffix| span_text.ends_with(suffix))
        {
            return EntityType::Organization;
        }
        if span_text.split_whitespace().count() >= 2 {
            EntityType::Person
        } else {
            EntityType::Other
        }
    }
}

impl Default for RuleBasedExtractor {
    fn default() -> Self {
        Self::new(HashMap::new())
    }
}

#[async_trait]
impl EntityExtractor for RuleBasedExtractor {
    async fn extract(&self, chunk_text: &str, language: &Language) -> Vec<Mention> {
        let mut mentions = Vec::new();

        for date_match in DATE_RE.find_iter(chunk_text) {
            mentions.push(Mention {
                canonical_name: date_match.as_str().to_string(),
                entity_type: EntityType::Date,
                confidence: 0.9,
                span: (date_match.start(), date_match.end()),
            });
        }

        // Merge consecutive capitalized words into a single proper-noun span ("Ada Lovelace").
        let mut run_start: Option<usize> = None;
        let mut run_end = 0usize;
        let mut prev_end = 0usize;
        let words: Vec<regex::Match> = CAPITALIZED_WORD.find_iter(chunk_text).collect();

        for (idx, word) in words.iter().enumerate() {
            let adjacent = run_start.is_some() && chunk_text[prev_end..word.start()].trim() == "";
            if adjacent {
                run_end = word.end();
            } else {
                if let Some(start) = run_start.take() {
                    push_span(&mut mentions, self, chunk_text, start, run_end);
                }
                run_start = Some(word.start());
                run_end = word.end();
            }
            prev_end = word.end();
            if idx == words.len() - 1 {
                if let Some(start) = run_start.take() {
                    push_span(&mut mentions, self, chunk_text, start, run_end);
                }
            }
        }

        if language.is_arabic() {
            tracing::debug!("rule-based extractor has no Arabic-specific capitalization signal");
        }

        mentions
    }
}

fn push_span(
    mentions: &mut Vec<Mention>,
    extractor: &RuleBasedExtractor,
    text: &str,
    start: usize,
    end: usize,
) {
    let span_text = &text[start..end];
    // Single common sentence-starters are not proper nouns; skip obvious false positives.
    if matches!(span_text, "The" | "A" | "An" | "This" | "That") {
        return;
    }
    mentions.push(Mention {
        canonical_name: span_text.to_string(),
        entity_type: extractor.classify_span(span_text),
        confidence: 0.6,
        span: (start, end),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn en() -> Language {
        Language::default_en()
    }

    #[tokio::test]
    async fn finds_person_like_span() {
        let extractor = RuleBasedExtractor::default();
        let mentions = extractor.extract("Ada Lovelace wrote the first algorithm.", &en()).await;
        assert!(mentions
            .iter()
            .any(|m| m.canonical_name == "Ada Lovelace" && m.entity_type == EntityType::Person));
    }

    #[tokio::test]
    async fn finds_organization_by_suffix() {
        let extractor = RuleBasedExtractor::default();
        let mentions = extractor
            .extract("She studied at Stanford University.", &en())
            .await;
        assert!(mentions
            .iter()
            .any(|m| m.entity_type == EntityType::Organization));
    }

    #[tokio::test]
    async fn finds_dates() {
        let extractor = RuleBasedExtractor::default();
        let mentions = extractor
            .extract("The event happened on 2024-03-05.", &en())
            .await;
        assert!(mentions
            .iter()
            .any(|m| m.entity_type == EntityType::Date && m.canonical_name == "2024-03-05"));
    }

    #[tokio::test]
    async fn gazetteer_overrides_default_classification() {
        let mut gaz = HashMap::new();
        gaz.insert("rust".to_string(), EntityType::Product);
        let extractor = RuleBasedExtractor::new(gaz);
        let mentions = extractor.extract("Rust is great.", &en()).await;
        assert!(mentions
            .iter()
            .any(|m| m.canonical_name == "Rust" && m.entity_type == EntityType::Product));
    }

    #[tokio::test]
    async fn is_deterministic() {
        let extractor = RuleBasedExtractor::default();
        let text = "Marie Curie visited Paris in 1903.";
        let a = extractor.extract(text, &en()).await;
        let b = extractor.extract(text, &en()).await;
        assert_eq!(a.len(), b.len());
    }

    #[tokio::test]
    async fn empty_text_yields_empty_set() {
        let extractor = RuleBasedExtractor::default();
        assert!(extractor.extract("", &en()).await.is_empty());
    }
}
