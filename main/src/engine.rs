use std::sync::Arc;
use std::time::Duration;

use common::config::EngineConfig;
use common::error::EngineError;
use common::language::Language;
use common::progress::{ComponentHealth, HealthStatus};
use dense_index::{DenseEncoder, FlatCosineStore, VectorStore};
use entity_extractor::RuleBasedExtractor;
use graph_store::{GraphStore, SurrealGraphStore};
use ingestion::{ChunkJournal, IngestReport, IngestionCoordinator, PlainTextParser};
use retrieval::{DenseRetriever, GraphRetriever, QueryOrchestrator, QueryRequest, QueryResponse, Retriever, SparseRetriever};
use sparse_index::{Bm25Params, SparseIndex};

/// Owns every component the CLI drives. No globals: every handle here is constructed once in
/// [`Engine::bootstrap`] and threaded through explicitly, the way the teacher's `StorageManager`
/// is built once in `main` and passed into router state.
pub struct Engine {
    graph: Arc<dyn GraphStore>,
    sparse: Arc<SparseIndex>,
    dense_store: Arc<dyn VectorStore>,
    dense_encoder: Arc<DenseEncoder>,
    coordinator: IngestionCoordinator,
    orchestrator: QueryOrchestrator,
}

impl Engine {
    #[tracing::instrument(skip(config))]
    pub async fn bootstrap(config: &EngineConfig) -> Result<Self, EngineError> {
        let language_default = Language::new(&config.language_default)
            .map_err(EngineError::InvalidRequest)?;

        let graph: Arc<dyn GraphStore> = Arc::new(
            SurrealGraphStore::connect(&config.graph_address, &config.graph_namespace, &config.graph_database)
                .await?,
        );
        let sparse = Arc::new(SparseIndex::new(Bm25Params { k1: config.bm25_k1, b: config.bm25_b }));
        let dense_store: Arc<dyn VectorStore> = Arc::new(FlatCosineStore::new());
        let dense_encoder = Arc::new(DenseEncoder::load(&config.dense_model_id, config.dense_batch_size));
        let extractor = Arc::new(RuleBasedExtractor::default());
        let parser = Arc::new(PlainTextParser::new(language_default.clone()));
        let journal = ChunkJournal::new(config.chunk_journal_path.clone(), config.persist_ingested_content);

        if config.persist_ingested_content {
            let recovered = journal.rebuild().await?;
            if !recovered.is_empty() {
                tracing::info!(count = recovered.len(), "rebuilding sparse index from chunk journal");
                sparse.add(&recovered).await;
            }
        }

        let coordinator = IngestionCoordinator::new(
            parser,
            extractor.clone(),
            graph.clone(),
            sparse.clone(),
            dense_store.clone(),
            dense_encoder.clone(),
            journal,
        );

        let retrievers: Vec<Arc<dyn Retriever>> = vec![
            Arc::new(SparseRetriever::new(sparse.clone(), language_default.clone())),
            Arc::new(DenseRetriever::new(dense_store.clone(), dense_encoder.clone())),
            Arc::new(GraphRetriever::new(graph.clone(), extractor.clone())),
        ];
        let orchestrator = QueryOrchestrator::new(
            retrievers,
            dense_store.clone(),
            Duration::from_millis(config.per_retriever_timeout_ms),
            config.k_fanout,
        );

        Ok(Self { graph, sparse, dense_store, dense_encoder, coordinator, orchestrator })
    }

    pub async fn ingest_file(&self, bytes: &[u8], filename: &str) -> Result<IngestReport, EngineError> {
        self.coordinator.ingest(bytes, filename, None).await
    }

    pub async fn query(&self, request: QueryRequest) -> Result<QueryResponse, EngineError> {
        self.orchestrator.query(request).await
    }

    /// Clears every store in the order spec.md §5 mandates — Sparse writer-lock, then Dense,
    /// then Graph — so a reader never observes a populated Sparse/Dense index pointing at an
    /// already-emptied Graph. The chunk journal is truncated last so a concurrent `bootstrap`
    /// never recovers the Sparse Index from stale content.
    pub async fn reset(&self) -> Result<(), EngineError> {
        self.sparse.clear().await;
        self.dense_store.clear_collection().await?;
        self.graph.reset_all().await?;
        self.coordinator.truncate_journal().await?;
        Ok(())
    }

    pub async fn health(&self) -> HealthStatus {
        let graph = match self.graph.stats().await {
            Ok(_) => ComponentHealth::ok(),
            Err(error) => ComponentHealth::unavailable(error.to_string()),
        };
        let dense = match self.dense_encoder.encode_batch(vec!["health check".to_string()]).await {
            Ok(_) => ComponentHealth::ok(),
            Err(error) => ComponentHealth::unavailable(error.to_string()),
        };
        HealthStatus {
            sparse: ComponentHealth::ok(),
            dense,
            graph,
            extractor: ComponentHealth::ok(),
        }
    }
}
