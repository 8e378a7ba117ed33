use sha2::{Digest, Sha256};

/// Renders the first 16 hex characters of a SHA-256 digest of `bytes`.
///
/// Used for both `Document::id` (content hash) and `Entity::id` (canonical_name, type hash) so
/// the same helper backs every content-addressed identifier in the system.
pub fn hex16(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut hex = String::with_capacity(32);
    for byte in digest.iter().take(8) {
        hex.push_str(&format!("{byte:02x}"));
    }
    hex
}

/// Centralizes chunk ID construction so Chunker, Graph adapter, Sparse Index, and Dense Index
/// never re-derive the format independently (see DESIGN NOTES: "Chunk ID string interpolation
/// scattered across modules").
pub fn chunk_id(doc_id: &str, ordinal: usize) -> String {
    format!("{doc_id}_chunk_{ordinal}")
}

/// Stable entity id: hash of (canonical_name, type) so re-extraction of the same entity merges.
pub fn entity_id(canonical_name: &str, entity_type: &str) -> String {
    let key = format!("{}\u{1f}{}", canonical_name.to_lowercase(), entity_type);
    hex16(key.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex16_is_deterministic() {
        assert_eq!(hex16(b"hello"), hex16(b"hello"));
        assert_ne!(hex16(b"hello"), hex16(b"world"));
        assert_eq!(hex16(b"hello").len(), 16);
    }

    #[test]
    fn chunk_id_format() {
        assert_eq!(chunk_id("abc123", 0), "abc123_chunk_0");
        assert_eq!(chunk_id("abc123", 7), "abc123_chunk_7");
    }

    #[test]
    fn entity_id_merges_case_insensitively() {
        assert_eq!(
            entity_id("Ada Lovelace", "PERSON"),
            entity_id("ada lovelace", "PERSON")
        );
        assert_ne!(
            entity_id("Ada Lovelace", "PERSON"),
            entity_id("Ada Lovelace", "ORGANIZATION")
        );
    }
}
