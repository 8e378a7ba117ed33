use async_trait::async_trait;
use common::error::EngineError;
use common::language::Language;
use common::types::{Chunk, Document, Entity};
use serde::{Deserialize, Serialize};
use surrealdb::engine::any::Any;
use surrealdb::Surreal;

use crate::{accumulate_weighted_chunks, GraphStats, GraphStore, WeightedChunk};

#[derive(Debug, Serialize, Deserialize)]
struct MentionRecord {
    chunk_id: String,
    entity_id: String,
    confidence: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct RelatesRecord {
    source_entity_id: String,
    target_entity_id: String,
    weight: f32,
}

/// Durable backend: reuses the teacher's own persistence engine (SurrealDB) for nodes and edges
/// instead of the teacher's document+auth schema. Connects via `surrealdb::engine::any`, so the
/// same type serves both an embedded `mem://` instance (tests) and a remote deployment.
pub struct SurrealGraphStore {
    db: Surreal<Any>,
}

impl SurrealGraphStore {
    /// `address` is anything `surrealdb::engine::any::connect` accepts (`mem://`, `ws://host`, …).
    #[tracing::instrument(skip(address, namespace, database))]
    pub async fn connect(
        address: &str,
        namespace: &str,
        database: &str,
    ) -> Result<Self, EngineError> {
        let db = surrealdb::engine::any::connect(address)
            .await
            .map_err(|e| EngineError::GraphUnavailable(e.to_string()))?;
        db.use_ns(namespace)
            .use_db(database)
            .await
            .map_err(|e| EngineError::GraphUnavailable(e.to_string()))?;
        Ok(Self { db })
    }

    fn mention_id(chunk_id: &str, entity_id: &str) -> String {
        format!("{chunk_id}__{entity_id}")
    }

    fn relates_id(source: &str, target: &str) -> String {
        if source < target {
            format!("{source}__{target}")
        } else {
            format!("{target}__{source}")
        }
    }
}

#[async_trait]
impl GraphStore for SurrealGraphStore {
    #[tracing::instrument(skip(self, doc))]
    async fn upsert_document(&self, doc: &Document) -> Result<(), EngineError> {
        self.db
            .upsert::<Option<Document>>(("document", doc.id.as_str()))
            .content(doc.clone())
            .await
            .map_err(|e| EngineError::Graph(e.to_string()))?;
        Ok(())
    }

    #[tracing::instrument(skip(self, chunk))]
    async fn upsert_chunk(&self, chunk: &Chunk) -> Result<(), EngineError> {
        self.db
            .upsert::<Option<Chunk>>(("chunk", chunk.id.as_str()))
            .content(chunk.clone())
            .await
            .map_err(|e| EngineError::Graph(e.to_string()))?;
        Ok(())
    }

    #[tracing::instrument(skip(self, entity))]
    async fn upsert_entity(&self, entity: &Entity) -> Result<(), EngineError> {
        let existing: Option<Entity> = self
            .db
            .select(("entity", entity.id.as_str()))
            .await
            .map_err(|e| EngineError::Graph(e.to_string()))?;
        let mut merged = entity.clone();
        if let Some(existing) = existing {
            merged.confidence = Entity::merge_confidence(existing.confidence, entity.confidence);
        }
        self.db
            .upsert::<Option<Entity>>(("entity", entity.id.as_str()))
            .content(merged)
            .await
            .map_err(|e| EngineError::Graph(e.to_string()))?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn link_mention(
        &self,
        chunk_id: &str,
        entity_id: &str,
        confidence: f32,
    ) -> Result<(), EngineError> {
        let id = Self::mention_id(chunk_id, entity_id);
        let existing: Option<MentionRecord> = self
            .db
            .select(("mentions", id.as_str()))
            .await
            .map_err(|e| EngineError::Graph(e.to_string()))?;
        let merged = match existing {
            Some(record) => Entity::merge_confidence(record.confidence, confidence),
            None => confidence,
        };
        self.db
            .upsert::<Option<MentionRecord>>(("mentions", id.as_str()))
            .content(MentionRecord {
                chunk_id: chunk_id.to_string(),
                entity_id: entity_id.to_string(),
                confidence: merged,
            })
            .await
            .map_err(|e| EngineError::Graph(e.to_string()))?;
        Ok(())
    }

    #[tracing::instrument(skip(self, entity_ids))]
    async fn record_cooccurrence(&self, entity_ids: &[String], weight: f32) -> Result<(), EngineError> {
        for i in 0..entity_ids.len() {
            for j in (i + 1)..entity_ids.len() {
                let (a, b) = (&entity_ids[i], &entity_ids[j]);
                if a == b {
                    continue;
                }
                let id = Self::relates_id(a, b);
                let existing: Option<RelatesRecord> = self
                    .db
                    .select(("relates_to", id.as_str()))
                    .await
                    .map_err(|e| EngineError::Graph(e.to_string()))?;
                let merged = existing.map_or(weight, |record| record.weight.max(weight));
                self.db
                    .upsert::<Option<RelatesRecord>>(("relates_to", id.as_str()))
                    .content(RelatesRecord {
                        source_entity_id: a.clone(),
                        target_entity_id: b.clone(),
                        weight: merged,
                    })
                    .await
                    .map_err(|e| EngineError::Graph(e.to_string()))?;
            }
        }
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn find_entities_by_name(
        &self,
        name: &str,
        language: &Language,
    ) -> Result<Vec<String>, EngineError> {
        // Diacritic stripping has no direct SurrealQL equivalent, so pull the full table and
        // compare in Rust with the same normalization the in-memory backend and the sparse
        // tokenizer use (`common::language::normalize_entity_name`).
        let needle = common::language::normalize_entity_name(name);
        let mut response = self
            .db
            .query("SELECT id, canonical_name, language FROM entity")
            .await
            .map_err(|e| EngineError::Graph(e.to_string()))?;
        let entities: Vec<Entity> = response
            .take(0)
            .map_err(|e| EngineError::Graph(e.to_string()))?;

        let mut same_language = Vec::new();
        let mut other_language = Vec::new();
        for entity in entities {
            if common::language::normalize_entity_name(&entity.canonical_name) != needle {
                continue;
            }
            if &entity.language == language {
                same_language.push(entity.id);
            } else {
                other_language.push(entity.id);
            }
        }
        Ok(if same_language.is_empty() {
            other_language
        } else {
            same_language
        })
    }

    #[tracing::instrument(skip(self))]
    async fn find_chunks_by_entities(
        &self,
        entity_ids: &[String],
        hops: u8,
        limit: usize,
    ) -> Result<Vec<WeightedChunk>, EngineError> {
        // Pulled once up front: traversal itself is plain in-memory graph math shared with the
        // in-memory backend (`accumulate_weighted_chunks`), only the loading differs.
        let mut mentions_resp = self
            .db
            .query("SELECT entity_id, chunk_id, confidence FROM mentions")
            .await
            .map_err(|e| EngineError::Graph(e.to_string()))?;
        let mentions: Vec<MentionRecord> = mentions_resp
            .take(0)
            .map_err(|e| EngineError::Graph(e.to_string()))?;

        let mut relates_resp = self
            .db
            .query("SELECT source_entity_id, target_entity_id, weight FROM relates_to")
            .await
            .map_err(|e| EngineError::Graph(e.to_string()))?;
        let relates: Vec<RelatesRecord> = relates_resp
            .take(0)
            .map_err(|e| EngineError::Graph(e.to_string()))?;

        let mentions_of = |entity_id: &str| -> Vec<(String, f32)> {
            mentions
                .iter()
                .filter(|m| m.entity_id == entity_id)
                .map(|m| (m.chunk_id.clone(), m.confidence))
                .collect()
        };
        let neighbors_of = |entity_id: &str| -> Vec<(String, f32)> {
            relates
                .iter()
                .filter_map(|r| {
                    if r.source_entity_id == entity_id {
                        Some((r.target_entity_id.clone(), r.weight))
                    } else if r.target_entity_id == entity_id {
                        Some((r.source_entity_id.clone(), r.weight))
                    } else {
                        None
                    }
                })
                .collect()
        };

        Ok(accumulate_weighted_chunks(
            entity_ids,
            hops,
            limit,
            neighbors_of,
            mentions_of,
        ))
    }

    #[tracing::instrument(skip(self))]
    async fn chunk_exists(&self, chunk_id: &str) -> Result<bool, EngineError> {
        let chunk: Option<Chunk> = self
            .db
            .select(("chunk", chunk_id))
            .await
            .map_err(|e| EngineError::Graph(e.to_string()))?;
        Ok(chunk.is_some())
    }

    #[tracing::instrument(skip(self))]
    async fn reset_all(&self) -> Result<(), EngineError> {
        for table in ["document", "chunk", "entity", "mentions", "relates_to"] {
            self.db
                .query(format!("DELETE {table}"))
                .await
                .map_err(|e| EngineError::Graph(e.to_string()))?;
        }
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn stats(&self) -> Result<GraphStats, EngineError> {
        async fn count(db: &Surreal<Any>, table: &str) -> Result<usize, EngineError> {
            let mut response = db
                .query(format!("SELECT count() AS n FROM {table} GROUP ALL"))
                .await
                .map_err(|e| EngineError::Graph(e.to_string()))?;
            #[derive(Deserialize)]
            struct Count {
                n: usize,
            }
            let rows: Vec<Count> = response.take(0).map_err(|e| EngineError::Graph(e.to_string()))?;
            Ok(rows.first().map_or(0, |c| c.n))
        }

        let documents = count(&self.db, "document").await?;
        let chunks = count(&self.db, "chunk").await?;
        let entities = count(&self.db, "entity").await?;
        let mentions = count(&self.db, "mentions").await?;
        let relates = count(&self.db, "relates_to").await?;

        Ok(GraphStats {
            documents,
            chunks,
            entities,
            relationships: mentions + relates,
        })
    }
}
