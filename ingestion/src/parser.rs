use async_trait::async_trait;
use common::error::EngineError;
use common::language::Language;

/// The seam a real document-format adapter (PDF, DOCX, …) plugs into. Out of scope as a feature
/// here; the bundled implementation below is enough to exercise the full pipeline end-to-end.
#[async_trait]
pub trait DocumentParser: Send + Sync {
    async fn parse(
        &self,
        bytes: &[u8],
        filename: &str,
        language_hint: Option<&Language>,
    ) -> Result<(String, Language), EngineError>;
}

/// Decodes bytes as UTF-8 plain text. Detects language with a lightweight heuristic (Arabic
/// script presence) when no hint is supplied, otherwise falls back to the configured default.
pub struct PlainTextParser {
    default_language: Language,
}

impl PlainTextParser {
    pub fn new(default_language: Language) -> Self {
        Self { default_language }
    }

    fn detect_language(&self, text: &str) -> Language {
        let has_arabic = text.chars().any(|c| ('\u{0600}'..='\u{06FF}').contains(&c));
        if has_arabic {
            Language::new("ar").unwrap_or_else(|_| self.default_language.clone())
        } else {
            self.default_language.clone()
        }
    }
}

#[async_trait]
impl DocumentParser for PlainTextParser {
    async fn parse(
        &self,
        bytes: &[u8],
        filename: &str,
        language_hint: Option<&Language>,
    ) -> Result<(String, Language), EngineError> {
        let text = String::from_utf8(bytes.to_vec())
            .map_err(|e| EngineError::InvalidRequest(format!("{filename}: not valid UTF-8 ({e})")))?;
        let language = match language_hint {
            Some(lang) => lang.clone(),
            None => self.detect_language(&text),
        };
        Ok((text, language))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn decodes_utf8_bytes() {
        let parser = PlainTextParser::new(Language::default_en());
        let (text, language) = parser.parse("hello world".as_bytes(), "f.txt", None).await.unwrap();
        assert_eq!(text, "hello world");
        assert_eq!(language.as_str(), "en");
    }

    #[tokio::test]
    async fn rejects_invalid_utf8() {
        let parser = PlainTextParser::new(Language::default_en());
        let bytes = vec![0xFF, 0xFE, 0xFD];
        assert!(parser.parse(&bytes, "f.txt", None).await.is_err());
    }

    #[tokio::test]
    async fn detects_arabic_script_without_a_hint() {
        let parser = PlainTextParser::new(Language::default_en());
        let (_, language) = parser.parse("مرحبا".as_bytes(), "f.txt", None).await.unwrap();
        assert!(language.is_arabic());
    }

    #[tokio::test]
    async fn explicit_hint_overrides_detection() {
        let parser = PlainTextParser::new(Language::default_en());
        let es = Language::new("es").unwrap();
        let (_, language) = parser.parse("hola".as_bytes(), "f.txt", Some(&es)).await.unwrap();
        assert_eq!(language.as_str(), "es");
    }
}
