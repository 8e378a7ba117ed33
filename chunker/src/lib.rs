//! C1: splits parsed document text into ordered, immutable chunks with deterministic ids.

use common::language::Language;
use common::types::Chunk;
use unicode_normalization::UnicodeNormalization;

/// Splits `text` on paragraph boundaries (maximal runs of non-empty lines separated by one or
/// more blank lines), trims each paragraph, drops empty ones, and normalizes to NFC before
/// assigning ordinals. Deterministic: identical input always yields identical chunks.
pub fn chunk(doc_id: &str, text: &str, language: &Language) -> Vec<Chunk> {
    let normalized: String = text.nfc().collect();

    let mut chunks = Vec::new();
    let mut ordinal = 0usize;
    let mut current = String::new();

    let mut flush = |current: &mut String, chunks: &mut Vec<Chunk>, ordinal: &mut usize| {
        let trimmed = current.trim();
        if !trimmed.is_empty() {
            chunks.push(Chunk::new(doc_id, *ordinal, trimmed.to_string(), language.clone()));
            *ordinal += 1;
        }
        current.clear();
    };

    for line in normalized.lines() {
        if line.trim().is_empty() {
            flush(&mut current, &mut chunks, &mut ordinal);
        } else {
            if !current.is_empty() {
                current.push('\n');
            }
            current.push_str(line);
        }
    }
    flush(&mut current, &mut chunks, &mut ordinal);

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn en() -> Language {
        Language::default_en()
    }

    #[test]
    fn splits_on_blank_lines() {
        let text = "First paragraph.\n\nSecond paragraph.\n\n\nThird paragraph.";
        let chunks = chunk("doc1", text, &en());
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].id, "doc1_chunk_0");
        assert_eq!(chunks[0].text, "First paragraph.");
        assert_eq!(chunks[1].ordinal, 1);
        assert_eq!(chunks[2].text, "Third paragraph.");
    }

    #[test]
    fn no_blank_lines_is_one_chunk() {
        let text = "line one\nline two\nline three";
        let chunks = chunk("doc1", text, &en());
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "line one\nline two\nline three");
    }

    #[test]
    fn whitespace_only_yields_zero_chunks() {
        let chunks = chunk("doc1", "   \n\n\t\n   ", &en());
        assert!(chunks.is_empty());
    }

    #[test]
    fn empty_string_yields_zero_chunks() {
        let chunks = chunk("doc1", "", &en());
        assert!(chunks.is_empty());
    }

    #[test]
    fn ids_are_deterministic_across_reingestion() {
        let text = "alpha\n\nbeta";
        let a = chunk("doc1", text, &en());
        let b = chunk("doc1", text, &en());
        assert_eq!(
            a.iter().map(|c| c.id.clone()).collect::<Vec<_>>(),
            b.iter().map(|c| c.id.clone()).collect::<Vec<_>>()
        );
    }

    #[test]
    fn embedding_id_matches_chunk_id() {
        let chunks = chunk("doc1", "only one paragraph", &en());
        assert_eq!(chunks[0].embedding_id, chunks[0].id);
    }

    #[test]
    fn trims_leading_and_trailing_whitespace_per_paragraph() {
        let text = "  padded text  \n\nnext";
        let chunks = chunk("doc1", text, &en());
        assert_eq!(chunks[0].text, "padded text");
    }
}
