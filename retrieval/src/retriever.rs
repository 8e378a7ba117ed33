use std::sync::Arc;

use async_trait::async_trait;
use common::error::EngineError;
use common::language::Language;
use dense_index::VectorStore;
use entity_extractor::EntityExtractor;
use graph_store::GraphStore;
use sparse_index::SparseIndex;

use crate::types::RankedCandidate;

/// The one capability the orchestrator depends on. Per SPEC_FULL.md §4.6.5/§9, the three
/// concrete retrievers below all implement this rather than being dispatched by name.
#[async_trait]
pub trait Retriever: Send + Sync {
    fn method_name(&self) -> &'static str;

    async fn search(
        &self,
        query: &str,
        top_k: usize,
        language_filter: Option<&Language>,
    ) -> Result<Vec<RankedCandidate>, EngineError>;
}

pub struct SparseRetriever {
    index: Arc<SparseIndex>,
    query_language: Language,
}

impl SparseRetriever {
    pub fn new(index: Arc<SparseIndex>, query_language: Language) -> Self {
        Self { index, query_language }
    }
}

#[async_trait]
impl Retriever for SparseRetriever {
    fn method_name(&self) -> &'static str {
        "sparse"
    }

    async fn search(
        &self,
        query: &str,
        top_k: usize,
        language_filter: Option<&Language>,
    ) -> Result<Vec<RankedCandidate>, EngineError> {
        let hits = self
            .index
            .search(query, &self.query_language, language_filter, top_k)
            .await;
        Ok(hits
            .into_iter()
            .map(|(chunk_id, score)| RankedCandidate { chunk_id, score })
            .collect())
    }
}

pub struct DenseRetriever<E> {
    store: Arc<dyn VectorStore>,
    encoder: Arc<E>,
}

impl<E> DenseRetriever<E> {
    pub fn new(store: Arc<dyn VectorStore>, encoder: Arc<E>) -> Self {
        Self { store, encoder }
    }
}

/// Encoders usable behind a [`DenseRetriever`] implement just the one method the retriever
/// needs, so tests can supply a trivial stand-in without pulling in `fastembed`.
#[async_trait]
pub trait QueryEncoder: Send + Sync {
    async fn encode_query(&self, text: &str) -> Result<Vec<f32>, EngineError>;
}

#[async_trait]
impl QueryEncoder for dense_index::DenseEncoder {
    async fn encode_query(&self, text: &str) -> Result<Vec<f32>, EngineError> {
        let mut vectors = self.encode_batch(vec![text.to_string()]).await?;
        vectors.pop().ok_or_else(|| EngineError::EncoderError("empty batch result".to_string()))
    }
}

#[async_trait]
impl<E: QueryEncoder> Retriever for DenseRetriever<E> {
    fn method_name(&self) -> &'static str {
        "dense"
    }

    async fn search(
        &self,
        query: &str,
        top_k: usize,
        language_filter: Option<&Language>,
    ) -> Result<Vec<RankedCandidate>, EngineError> {
        let query_vector = self.encoder.encode_query(query).await?;
        let hits = self.store.search(&query_vector, language_filter, top_k).await?;
        Ok(hits
            .into_iter()
            .map(|(chunk_id, score)| RankedCandidate { chunk_id, score })
            .collect())
    }
}

pub struct GraphRetriever<X> {
    store: Arc<dyn GraphStore>,
    extractor: Arc<X>,
}

impl<X> GraphRetriever<X> {
    pub fn new(store: Arc<dyn GraphStore>, extractor: Arc<X>) -> Self {
        Self { store, extractor }
    }
}

#[async_trait]
impl<X: EntityExtractor> Retriever for GraphRetriever<X> {
    fn method_name(&self) -> &'static str {
        "graph"
    }

    async fn search(
        &self,
        query: &str,
        top_k: usize,
        language_filter: Option<&Language>,
    ) -> Result<Vec<RankedCandidate>, EngineError> {
        let language = language_filter.cloned().unwrap_or_else(Language::default_en);
        let mentions = self.extractor.extract(query, &language).await;
        if mentions.is_empty() {
            return Ok(Vec::new());
        }

        let mut entity_ids = Vec::new();
        for mention in &mentions {
            let found = self
                .store
                .find_entities_by_name(&mention.canonical_name, &language)
                .await?;
            entity_ids.extend(found);
        }
        if entity_ids.is_empty() {
            return Ok(Vec::new());
        }
        entity_ids.sort();
        entity_ids.dedup();

        let weighted = self.store.find_chunks_by_entities(&entity_ids, 2, top_k).await?;
        Ok(weighted
            .into_iter()
            .map(|(chunk_id, score)| RankedCandidate { chunk_id, score })
            .collect())
    }
}
