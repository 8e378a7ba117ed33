use std::fmt;

const ARABIC_DIACRITICS: [char; 13] = [
    '\u{064B}', '\u{064C}', '\u{064D}', '\u{064E}', '\u{064F}', '\u{0650}', '\u{0651}', '\u{0652}',
    '\u{0653}', '\u{0654}', '\u{0655}', '\u{0656}', '\u{0670}',
];
const TATWEEL: char = '\u{0640}';

/// Case- and Arabic-diacritic-insensitive normalization, shared by the tokenizer and by
/// `GraphStore::find_entities_by_name` so lookups and postings agree on what "the same name" means.
pub fn normalize_entity_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .filter(|c| *c != TATWEEL && !ARABIC_DIACRITICS.contains(c))
        .collect()
}

/// A BCP-47-ish language tag. Kept as a thin wrapper over `String` rather than a closed enum
/// because the corpus is explicitly multilingual and open-ended ("en, ar, es, …").
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Language(String);

impl Language {
    pub fn new(tag: impl Into<String>) -> Result<Self, String> {
        let tag = tag.into();
        let normalized = tag.trim().to_lowercase();
        if normalized.is_empty() || !normalized.chars().all(|c| c.is_ascii_alphabetic() || c == '-')
        {
            return Err(format!("invalid language tag: {tag:?}"));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn default_en() -> Self {
        Self("en".to_string())
    }

    /// Is this an RTL, diacritic-heavy script needing Arabic-specific tokenization rules?
    pub fn is_arabic(&self) -> bool {
        self.0 == "ar" || self.0.starts_with("ar-")
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_tags() {
        assert!(Language::new("").is_err());
        assert!(Language::new("en_US!").is_err());
    }

    #[test]
    fn normalizes_case() {
        assert_eq!(Language::new("EN").unwrap().as_str(), "en");
    }

    #[test]
    fn detects_arabic() {
        assert!(Language::new("ar").unwrap().is_arabic());
        assert!(Language::new("ar-EG").unwrap().is_arabic());
        assert!(!Language::new("en").unwrap().is_arabic());
    }

    #[test]
    fn normalize_entity_name_strips_diacritics_and_case() {
        assert_eq!(normalize_entity_name("كِتَـاب"), normalize_entity_name("كتاب"));
        assert_eq!(normalize_entity_name("Ada Lovelace"), "ada lovelace");
    }
}
