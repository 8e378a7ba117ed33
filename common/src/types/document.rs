use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::hex16;
use crate::language::Language;

/// A single ingested document. `id == content_hash` makes ingestion idempotent: identical bytes
/// always produce the identical document id, so re-ingesting a document upserts rather than
/// duplicates. Documents are never mutated once created; they are only removed wholesale via
/// admin reset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Document {
    pub id: String,
    pub title: String,
    pub language: Language,
    pub created_at: DateTime<Utc>,
    pub content_hash: String,
}

impl Document {
    pub fn new(bytes: &[u8], title: impl Into<String>, language: Language) -> Self {
        let content_hash = hex16(bytes);
        Self {
            id: content_hash.clone(),
            title: title.into(),
            language,
            created_at: Utc::now(),
            content_hash,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_equals_content_hash() {
        let doc = Document::new(b"hello world", "t", Language::default_en());
        assert_eq!(doc.id, doc.content_hash);
    }

    #[test]
    fn identical_bytes_yield_identical_ids() {
        let a = Document::new(b"same bytes", "a", Language::default_en());
        let b = Document::new(b"same bytes", "b", Language::default_en());
        assert_eq!(a.id, b.id);
    }
}
