use async_trait::async_trait;
use common::error::EngineError;
use common::language::Language;
use dashmap::DashMap;
use sha2::{Digest, Sha256};

/// Deterministic hash of `chunk_id` truncated to a 128-bit point id, so re-upserting the same
/// `chunk_id` always lands on the same physical slot (replacement, never duplication).
pub fn point_id(chunk_id: &str) -> String {
    let digest = Sha256::digest(chunk_id.as_bytes());
    digest.iter().take(16).map(|b| format!("{b:02x}")).collect()
}

#[derive(Debug, Clone)]
pub struct VectorPayload {
    pub chunk_id: String,
    pub doc_id: String,
    pub language: Language,
    pub text: String,
}

#[derive(Debug, Clone)]
struct VectorRecord {
    payload: VectorPayload,
    vector: Vec<f32>,
}

/// C5's storage contract. `search` returns cosine similarity, which for unit-norm vectors is a
/// plain dot product.
#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn upsert(&self, vector: Vec<f32>, payload: VectorPayload) -> Result<(), EngineError>;

    async fn search(
        &self,
        query_vector: &[f32],
        language_filter: Option<&Language>,
        top_k: usize,
    ) -> Result<Vec<(String, f32)>, EngineError>;

    async fn delete_by_doc_id(&self, doc_id: &str) -> Result<(), EngineError>;

    async fn clear_collection(&self) -> Result<(), EngineError>;

    async fn count(&self) -> Result<usize, EngineError>;

    /// Looks up a chunk's payload by id. Every ingested chunk passes through the Dense Index
    /// (see SPEC_FULL.md §4.7 step 7), so this doubles as the canonical hydration source for
    /// result records surfaced by the sparse and graph retrievers, which only carry chunk ids.
    async fn get(&self, chunk_id: &str) -> Result<Option<VectorPayload>, EngineError>;
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// In-process, exact (flat) cosine index keyed by [`point_id`]. Satisfies the "approximate
/// nearest neighbor" contract at the scale this core targets; a future HNSW-backed store can
/// implement the same trait without touching callers.
#[derive(Default)]
pub struct FlatCosineStore {
    vectors: DashMap<String, VectorRecord>,
}

impl FlatCosineStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorStore for FlatCosineStore {
    async fn upsert(&self, vector: Vec<f32>, payload: VectorPayload) -> Result<(), EngineError> {
        let id = point_id(&payload.chunk_id);
        self.vectors.insert(id, VectorRecord { payload, vector });
        Ok(())
    }

    async fn search(
        &self,
        query_vector: &[f32],
        language_filter: Option<&Language>,
        top_k: usize,
    ) -> Result<Vec<(String, f32)>, EngineError> {
        let mut scored: Vec<(String, f32)> = self
            .vectors
            .iter()
            .filter(|entry| match language_filter {
                Some(lang) => &entry.value().payload.language == lang,
                None => true,
            })
            .map(|entry| {
                (
                    entry.value().payload.chunk_id.clone(),
                    cosine(query_vector, &entry.value().vector),
                )
            })
            .collect();

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        scored.truncate(top_k);
        Ok(scored)
    }

    async fn delete_by_doc_id(&self, doc_id: &str) -> Result<(), EngineError> {
        self.vectors.retain(|_, record| record.payload.doc_id != doc_id);
        Ok(())
    }

    async fn clear_collection(&self) -> Result<(), EngineError> {
        self.vectors.clear();
        Ok(())
    }

    async fn count(&self) -> Result<usize, EngineError> {
        Ok(self.vectors.len())
    }

    async fn get(&self, chunk_id: &str) -> Result<Option<VectorPayload>, EngineError> {
        let id = point_id(chunk_id);
        Ok(self.vectors.get(&id).map(|entry| entry.value().payload.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn en() -> Language {
        Language::default_en()
    }

    fn payload(chunk_id: &str, doc_id: &str, language: Language) -> VectorPayload {
        VectorPayload {
            chunk_id: chunk_id.to_string(),
            doc_id: doc_id.to_string(),
            language,
            text: "text".to_string(),
        }
    }

    #[test]
    fn point_id_is_deterministic_and_fixed_length() {
        assert_eq!(point_id("c1"), point_id("c1"));
        assert_ne!(point_id("c1"), point_id("c2"));
        assert_eq!(point_id("c1").len(), 32);
    }

    #[tokio::test]
    async fn upsert_then_search_finds_exact_match() {
        let store = FlatCosineStore::new();
        store.upsert(vec![1.0, 0.0], payload("c1", "d1", en())).await.unwrap();
        store.upsert(vec![0.0, 1.0], payload("c2", "d1", en())).await.unwrap();

        let result = store.search(&[1.0, 0.0], None, 10).await.unwrap();
        assert_eq!(result[0].0, "c1");
        assert!(result[0].1 > result[1].1);
    }

    #[tokio::test]
    async fn reupserting_same_chunk_id_replaces_not_duplicates() {
        let store = FlatCosineStore::new();
        store.upsert(vec![1.0, 0.0], payload("c1", "d1", en())).await.unwrap();
        store.upsert(vec![0.0, 1.0], payload("c1", "d1", en())).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn delete_by_doc_id_removes_only_that_documents_chunks() {
        let store = FlatCosineStore::new();
        store.upsert(vec![1.0, 0.0], payload("c1", "d1", en())).await.unwrap();
        store.upsert(vec![0.0, 1.0], payload("c2", "d2", en())).await.unwrap();
        store.delete_by_doc_id("d1").await.unwrap();
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn language_filter_excludes_other_languages() {
        let ar = Language::new("ar").unwrap();
        let store = FlatCosineStore::new();
        store.upsert(vec![1.0, 0.0], payload("c1", "d1", en())).await.unwrap();
        store.upsert(vec![1.0, 0.0], payload("c2", "d1", ar)).await.unwrap();
        let result = store.search(&[1.0, 0.0], Some(&en()), 10).await.unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].0, "c1");
    }

    #[tokio::test]
    async fn get_returns_the_stored_payload() {
        let store = FlatCosineStore::new();
        store.upsert(vec![1.0, 0.0], payload("c1", "d1", en())).await.unwrap();
        let found = store.get("c1").await.unwrap().unwrap();
        assert_eq!(found.doc_id, "d1");
        assert!(store.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn clear_collection_empties_store() {
        let store = FlatCosineStore::new();
        store.upsert(vec![1.0, 0.0], payload("c1", "d1", en())).await.unwrap();
        store.clear_collection().await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
    }
}
