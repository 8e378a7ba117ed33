use std::collections::HashMap;

use async_trait::async_trait;
use common::error::EngineError;
use common::language::Language;
use common::types::{Chunk, Document, Entity};
use dashmap::DashMap;

use crate::{accumulate_weighted_chunks, GraphStats, GraphStore, WeightedChunk};

/// `dashmap`-backed adjacency, no external I/O. Used by unit/integration tests and for
/// embedded/offline deployments where a SurrealDB instance is unavailable.
#[derive(Default)]
pub struct InMemoryGraphStore {
    documents: DashMap<String, Document>,
    chunks: DashMap<String, Chunk>,
    entities: DashMap<String, Entity>,
    /// (chunk_id, entity_id) -> confidence
    mentions: DashMap<(String, String), f32>,
    /// entity_id -> Vec<(chunk_id, confidence)>, kept in sync with `mentions`.
    mentions_by_entity: DashMap<String, Vec<(String, f32)>>,
    /// unordered pair key (sorted) -> weight
    relates: DashMap<(String, String), f32>,
    /// entity_id -> Vec<(neighbor_entity_id, weight)>, kept in sync with `relates`.
    relates_by_entity: DashMap<String, Vec<(String, f32)>>,
}

impl InMemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GraphStore for InMemoryGraphStore {
    async fn upsert_document(&self, doc: &Document) -> Result<(), EngineError> {
        self.documents.insert(doc.id.clone(), doc.clone());
        Ok(())
    }

    async fn upsert_chunk(&self, chunk: &Chunk) -> Result<(), EngineError> {
        self.chunks.insert(chunk.id.clone(), chunk.clone());
        Ok(())
    }

    async fn upsert_entity(&self, entity: &Entity) -> Result<(), EngineError> {
        self.entities
            .entry(entity.id.clone())
            .and_modify(|existing| {
                existing.confidence = Entity::merge_confidence(existing.confidence, entity.confidence);
            })
            .or_insert_with(|| entity.clone());
        Ok(())
    }

    async fn link_mention(
        &self,
        chunk_id: &str,
        entity_id: &str,
        confidence: f32,
    ) -> Result<(), EngineError> {
        let key = (chunk_id.to_string(), entity_id.to_string());
        let merged = match self.mentions.get(&key) {
            Some(existing) => Entity::merge_confidence(*existing, confidence),
            None => confidence,
        };
        self.mentions.insert(key, merged);

        self.mentions_by_entity
            .entry(entity_id.to_string())
            .and_modify(|edges| {
                if let Some(entry) = edges.iter_mut().find(|(c, _)| c == chunk_id) {
                    entry.1 = merged;
                } else {
                    edges.push((chunk_id.to_string(), merged));
                }
            })
            .or_insert_with(|| vec![(chunk_id.to_string(), merged)]);
        Ok(())
    }

    async fn record_cooccurrence(&self, entity_ids: &[String], weight: f32) -> Result<(), EngineError> {
        for i in 0..entity_ids.len() {
            for j in (i + 1)..entity_ids.len() {
                let (a, b) = (&entity_ids[i], &entity_ids[j]);
                if a == b {
                    continue;
                }
                let key = if a < b {
                    (a.clone(), b.clone())
                } else {
                    (b.clone(), a.clone())
                };
                let merged = match self.relates.get(&key) {
                    Some(existing) => existing.max(weight),
                    None => weight,
                };
                self.relates.insert(key, merged);

                for (from, to) in [(a, b), (b, a)] {
                    self.relates_by_entity
                        .entry(from.clone())
                        .and_modify(|edges| {
                            if let Some(entry) = edges.iter_mut().find(|(n, _)| n == to) {
                                entry.1 = merged;
                            } else {
                                edges.push((to.clone(), merged));
                            }
                        })
                        .or_insert_with(|| vec![(to.clone(), merged)]);
                }
            }
        }
        Ok(())
    }

    async fn find_entities_by_name(
        &self,
        name: &str,
        language: &Language,
    ) -> Result<Vec<String>, EngineError> {
        let needle = common::language::normalize_entity_name(name);
        let mut same_language = Vec::new();
        let mut other_language = Vec::new();
        for entry in &self.entities {
            if common::language::normalize_entity_name(&entry.value().canonical_name) == needle {
                if &entry.value().language == language {
                    same_language.push(entry.key().clone());
                } else {
                    other_language.push(entry.key().clone());
                }
            }
        }
        if !same_language.is_empty() {
            Ok(same_language)
        } else {
            Ok(other_language)
        }
    }

    async fn find_chunks_by_entities(
        &self,
        entity_ids: &[String],
        hops: u8,
        limit: usize,
    ) -> Result<Vec<WeightedChunk>, EngineError> {
        let neighbors_of = |entity_id: &str| -> Vec<(String, f32)> {
            self.relates_by_entity
                .get(entity_id)
                .map(|edges| edges.clone())
                .unwrap_or_default()
        };
        let mentions_of = |entity_id: &str| -> Vec<(String, f32)> {
            self.mentions_by_entity
                .get(entity_id)
                .map(|edges| edges.clone())
                .unwrap_or_default()
        };
        Ok(accumulate_weighted_chunks(
            entity_ids,
            hops,
            limit,
            neighbors_of,
            mentions_of,
        ))
    }

    async fn chunk_exists(&self, chunk_id: &str) -> Result<bool, EngineError> {
        Ok(self.chunks.contains_key(chunk_id))
    }

    async fn reset_all(&self) -> Result<(), EngineError> {
        self.documents.clear();
        self.chunks.clear();
        self.entities.clear();
        self.mentions.clear();
        self.mentions_by_entity.clear();
        self.relates.clear();
        self.relates_by_entity.clear();
        Ok(())
    }

    async fn stats(&self) -> Result<GraphStats, EngineError> {
        Ok(GraphStats {
            documents: self.documents.len(),
            chunks: self.chunks.len(),
            entities: self.entities.len(),
            relationships: self.mentions.len() + self.relates.len(),
        })
    }
}
