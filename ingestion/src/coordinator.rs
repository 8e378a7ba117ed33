use std::sync::Arc;
use std::time::Instant;

use common::error::EngineError;
use common::ids::hex16;
use common::language::Language;
use common::progress::{ProgressEvent, Stage};
use common::types::{Chunk, Document, Entity};
use dashmap::DashMap;
use dense_index::{DenseEncoder, VectorPayload, VectorStore};
use entity_extractor::EntityExtractor;
use graph_store::GraphStore;
use serde::Serialize;
use sparse_index::SparseIndex;
use tokio::sync::Mutex as AsyncMutex;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::Retry;

use crate::journal::ChunkJournal;
use crate::parser::DocumentParser;
use crate::state::received;

/// Weight assigned to an opportunistic co-occurrence edge between two entities mentioned in the
/// same chunk (see SPEC_FULL.md §9.1 — creation policy is left to this enrichment pass).
const COOCCURRENCE_WEIGHT: f32 = 0.1;

#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub doc_id: String,
    pub chunks_created: usize,
    pub entities_extracted: usize,
    pub relationships_created: usize,
    pub processing_time_ms: u64,
}

/// C7: parses, chunks, extracts entities, writes the graph, updates both indexes, streams
/// progress, and enforces idempotency and per-doc serialization.
pub struct IngestionCoordinator {
    parser: Arc<dyn DocumentParser>,
    extractor: Arc<dyn EntityExtractor>,
    graph: Arc<dyn GraphStore>,
    sparse: Arc<SparseIndex>,
    dense_store: Arc<dyn VectorStore>,
    dense_encoder: Arc<DenseEncoder>,
    journal: ChunkJournal,
    locks: DashMap<String, Arc<AsyncMutex<()>>>,
}

impl IngestionCoordinator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        parser: Arc<dyn DocumentParser>,
        extractor: Arc<dyn EntityExtractor>,
        graph: Arc<dyn GraphStore>,
        sparse: Arc<SparseIndex>,
        dense_store: Arc<dyn VectorStore>,
        dense_encoder: Arc<DenseEncoder>,
        journal: ChunkJournal,
    ) -> Self {
        Self {
            parser,
            extractor,
            graph,
            sparse,
            dense_store,
            dense_encoder,
            journal,
            locks: DashMap::new(),
        }
    }

    async fn lock_for(&self, doc_id: &str) -> Arc<AsyncMutex<()>> {
        Arc::clone(
            self.locks
                .entry(doc_id.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .value(),
        )
    }

    fn release_lock(&self, doc_id: &str) {
        // Best-effort cleanup: if nothing else references the lock besides the map entry and
        // the clone we just dropped, remove it so the map does not grow without bound.
        if let Some(entry) = self.locks.get(doc_id) {
            if Arc::strong_count(entry.value()) <= 1 {
                drop(entry);
                self.locks.remove(doc_id);
            }
        }
    }

    #[tracing::instrument(skip(self, bytes), fields(filename))]
    pub async fn ingest(
        &self,
        bytes: &[u8],
        filename: &str,
        language_hint: Option<&Language>,
    ) -> Result<IngestReport, EngineError> {
        self.ingest_with_progress(bytes, filename, language_hint, |_| {}).await
    }

    /// Empties the chunk journal. Called by admin `reset` alongside the store-level clears so a
    /// subsequent `bootstrap` never recovers the Sparse Index from stale journal content.
    pub async fn truncate_journal(&self) -> Result<(), EngineError> {
        self.journal.truncate().await
    }

    /// Same contract as [`Self::ingest`], but invokes `on_progress` at each stage boundary in
    /// the order `{parse, chunk, graph, sparse, dense, done}` (streaming contract, SPEC_FULL.md §6).
    #[tracing::instrument(skip(self, bytes, on_progress), fields(filename))]
    pub async fn ingest_with_progress(
        &self,
        bytes: &[u8],
        filename: &str,
        language_hint: Option<&Language>,
        mut on_progress: impl FnMut(ProgressEvent),
    ) -> Result<IngestReport, EngineError> {
        let started = Instant::now();
        let doc_id = hex16(bytes);
        let lock = self.lock_for(&doc_id).await;
        let _guard = lock.lock().await;

        let result = self.run_pipeline(&doc_id, bytes, filename, language_hint, &mut on_progress, started).await;
        drop(_guard);
        self.release_lock(&doc_id);
        result
    }

    #[allow(clippy::too_many_lines)]
    async fn run_pipeline(
        &self,
        doc_id: &str,
        bytes: &[u8],
        filename: &str,
        language_hint: Option<&Language>,
        on_progress: &mut impl FnMut(ProgressEvent),
        started: Instant,
    ) -> Result<IngestReport, EngineError> {
        let machine = received();

        let (text, language) = self.parser.parse(bytes, filename, language_hint).await?;
        let machine = machine.parse().map_err(|_| EngineError::Internal("bad transition: parse".to_string()))?;
        on_progress(ProgressEvent::new(Stage::Parse, 10, "parsed document"));

        let chunks = chunker::chunk(doc_id, &text, &language);
        if chunks.is_empty() {
            return Err(EngineError::EmptyDocument);
        }
        let machine = machine.chunk().map_err(|_| EngineError::Internal("bad transition: chunk".to_string()))?;
        on_progress(ProgressEvent::new(Stage::Chunk, 25, format!("created {} chunks", chunks.len())));

        let document = Document::new(bytes, filename, language.clone());
        self.graph
            .upsert_document(&document)
            .await
            .map_err(|e| EngineError::GraphUnavailable(e.to_string()))?;
        for chunk in &chunks {
            self.graph
                .upsert_chunk(chunk)
                .await
                .map_err(|e| EngineError::GraphUnavailable(e.to_string()))?;
        }
        let machine = machine
            .write_graph()
            .map_err(|_| EngineError::Internal("bad transition: write_graph".to_string()))?;
        on_progress(ProgressEvent::new(Stage::Graph, 45, "graph writes committed"));

        let (entities_extracted, relationships_created) = self.extract_and_link_entities(&chunks).await;

        self.sparse.add(&chunks).await;
        let machine = machine
            .write_sparse()
            .map_err(|_| EngineError::Internal("bad transition: write_sparse".to_string()))?;
        on_progress(ProgressEvent::new(Stage::Sparse, 65, "sparse index updated"));

        if let Err(error) = self.encode_and_upsert_dense(&chunks).await {
            tracing::warn!(%error, doc_id, "dense index write failed after retry");
            let _ = machine.abort();
            return Err(EngineError::IndexWriteFailed { index: "dense", reason: error.to_string() });
        }
        let machine = machine
            .write_dense()
            .map_err(|_| EngineError::Internal("bad transition: write_dense".to_string()))?;
        on_progress(ProgressEvent::new(Stage::Dense, 90, "dense index updated"));

        self.journal.append(&chunks).await?;
        let _machine = machine.finish().map_err(|_| EngineError::Internal("bad transition: finish".to_string()))?;
        on_progress(ProgressEvent::new(Stage::Done, 100, "ingestion complete"));

        Ok(IngestReport {
            doc_id: doc_id.to_string(),
            chunks_created: chunks.len(),
            entities_extracted,
            relationships_created,
            processing_time_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        })
    }

    async fn extract_and_link_entities(&self, chunks: &[Chunk]) -> (usize, usize) {
        let mut entities_extracted = 0;
        let mut relationships_created = 0;

        for chunk in chunks {
            let mentions = self.extractor.extract(&chunk.text, &chunk.language).await;
            let mut chunk_entity_ids = Vec::with_capacity(mentions.len());

            for mention in &mentions {
                let entity = Entity::new(
                    mention.canonical_name.clone(),
                    mention.entity_type,
                    chunk.language.clone(),
                    mention.confidence,
                );
                if let Err(error) = self.graph.upsert_entity(&entity).await {
                    tracing::warn!(%error, chunk_id = %chunk.id, "entity upsert failed, skipping mention");
                    continue;
                }
                if let Err(error) = self.graph.link_mention(&chunk.id, &entity.id, entity.confidence).await {
                    tracing::warn!(%error, chunk_id = %chunk.id, "mention link failed");
                    continue;
                }
                entities_extracted += 1;
                relationships_created += 1;
                chunk_entity_ids.push(entity.id);
            }

            if chunk_entity_ids.len() > 1 {
                if let Err(error) = self.graph.record_cooccurrence(&chunk_entity_ids, COOCCURRENCE_WEIGHT).await {
                    tracing::warn!(%error, chunk_id = %chunk.id, "co-occurrence edge write failed");
                } else {
                    relationships_created += chunk_entity_ids.len() * (chunk_entity_ids.len() - 1) / 2;
                }
            }
        }

        (entities_extracted, relationships_created)
    }

    async fn encode_and_upsert_dense(&self, chunks: &[Chunk]) -> Result<(), EngineError> {
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let strategy = ExponentialBackoff::from_millis(50).map(jitter).take(1);

        let vectors = Retry::spawn(strategy, || self.dense_encoder.encode_batch(texts.clone())).await?;

        for (chunk, vector) in chunks.iter().zip(vectors) {
            self.dense_store
                .upsert(
                    vector,
                    VectorPayload {
                        chunk_id: chunk.id.clone(),
                        doc_id: chunk.doc_id.clone(),
                        language: chunk.language.clone(),
                        text: chunk.text.clone(),
                    },
                )
                .await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dense_index::FlatCosineStore;
    use entity_extractor::RuleBasedExtractor;
    use graph_store::InMemoryGraphStore;
    use sparse_index::Bm25Params;

    fn coordinator(journal_enabled: bool) -> (IngestionCoordinator, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let journal_path = dir.path().join("journal.ndjson");
        let coordinator = IngestionCoordinator::new(
            Arc::new(crate::parser::PlainTextParser::new(Language::default_en())),
            Arc::new(RuleBasedExtractor::default()),
            Arc::new(InMemoryGraphStore::new()),
            Arc::new(SparseIndex::new(Bm25Params::default())),
            Arc::new(FlatCosineStore::new()),
            Arc::new(DenseEncoder::hashed_fallback()),
            ChunkJournal::new(journal_path.clone(), journal_enabled),
        );
        std::mem::forget(dir);
        (coordinator, journal_path)
    }

    #[tokio::test]
    async fn ingest_produces_a_report_with_expected_chunk_count() {
        let (coordinator, _) = coordinator(false);
        let report = coordinator
            .ingest(b"Ada Lovelace wrote the first algorithm.\n\nShe worked with Babbage.", "f.txt", None)
            .await
            .unwrap();
        assert_eq!(report.chunks_created, 2);
    }

    #[tokio::test]
    async fn empty_document_is_rejected() {
        let (coordinator, _) = coordinator(false);
        let err = coordinator.ingest(b"   \n\n  ", "f.txt", None).await.unwrap_err();
        assert_eq!(err.kind(), "EmptyDocument");
    }

    #[tokio::test]
    async fn reingesting_identical_bytes_is_idempotent() {
        let (coordinator, _) = coordinator(false);
        let bytes = b"Rust is a systems programming language.";
        let first = coordinator.ingest(bytes, "f.txt", None).await.unwrap();
        let second = coordinator.ingest(bytes, "f.txt", None).await.unwrap();
        assert_eq!(first.doc_id, second.doc_id);
        assert_eq!(first.chunks_created, second.chunks_created);
    }

    #[tokio::test]
    async fn progress_events_fire_in_order() {
        let (coordinator, _) = coordinator(false);
        let stages = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let stages_clone = std::sync::Arc::clone(&stages);
        coordinator
            .ingest_with_progress(b"hello world", "f.txt", None, move |event| {
                stages_clone.lock().unwrap().push(event.stage);
            })
            .await
            .unwrap();
        let recorded = stages.lock().unwrap().clone();
        assert_eq!(
            recorded,
            vec![Stage::Parse, Stage::Chunk, Stage::Graph, Stage::Sparse, Stage::Dense, Stage::Done]
        );
    }

    #[tokio::test]
    async fn journal_enabled_persists_chunk_text_for_rebuild() {
        let (coordinator, path) = coordinator(true);
        coordinator.ingest(b"machine learning transforms data", "f.txt", None).await.unwrap();
        let journal = ChunkJournal::new(path, true);
        let rebuilt = journal.rebuild().await.unwrap();
        assert_eq!(rebuilt.len(), 1);
    }

    #[tokio::test]
    async fn concurrent_ingests_of_different_docs_both_succeed() {
        let (coordinator, _) = coordinator(false);
        let coordinator = Arc::new(coordinator);
        let a = Arc::clone(&coordinator);
        let b = Arc::clone(&coordinator);
        let (ra, rb) = tokio::join!(
            a.ingest(b"first document text here", "a.txt", None),
            b.ingest(b"second document text here", "b.txt", None),
        );
        assert!(ra.is_ok());
        assert!(rb.is_ok());
    }
}
