use serde::{Deserialize, Serialize};

use crate::ids::chunk_id;
use crate::language::Language;

/// The smallest addressable unit of retrieved text. Immutable once written; `ordinal` reflects
/// reading order within the source document. `embedding_id` MUST equal `id` — it exists as a
/// distinct field only so callers crossing into the Dense Index never have to remember that
/// invariant themselves.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    pub id: String,
    pub doc_id: String,
    pub ordinal: usize,
    pub text: String,
    pub language: Language,
    pub embedding_id: String,
}

impl Chunk {
    pub fn new(doc_id: &str, ordinal: usize, text: String, language: Language) -> Self {
        let id = chunk_id(doc_id, ordinal);
        let embedding_id = id.clone();
        Self {
            id,
            doc_id: doc_id.to_string(),
            ordinal,
            text,
            language,
            embedding_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedding_id_equals_id() {
        let chunk = Chunk::new("doc1", 3, "text".into(), Language::default_en());
        assert_eq!(chunk.id, chunk.embedding_id);
        assert_eq!(chunk.id, "doc1_chunk_3");
    }
}
