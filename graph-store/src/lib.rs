//! C3: persists documents, chunks, entities, and MENTIONS / RELATES_TO edges; answers
//! entity-anchored traversal queries for the graph retriever.

pub mod memory;
pub mod surreal;

pub use memory::InMemoryGraphStore;
pub use surreal::SurrealGraphStore;

use async_trait::async_trait;
use common::error::EngineError;
use common::language::Language;
use common::types::{Chunk, Document, Entity};
use serde::{Deserialize, Serialize};

/// Node/edge counts, surfaced via `health()`/admin tooling.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GraphStats {
    pub documents: usize,
    pub chunks: usize,
    pub entities: usize,
    pub relationships: usize,
}

/// One matched chunk with its accumulated traversal weight.
pub type WeightedChunk = (String, f32);

/// Adapter boundary for C3. Both the in-memory and SurrealDB-backed implementations satisfy the
/// same contract and the same integration-test suite (see each module's tests).
#[async_trait]
pub trait GraphStore: Send + Sync {
    async fn upsert_document(&self, doc: &Document) -> Result<(), EngineError>;

    async fn upsert_chunk(&self, chunk: &Chunk) -> Result<(), EngineError>;

    async fn upsert_entity(&self, entity: &Entity) -> Result<(), EngineError>;

    async fn link_mention(
        &self,
        chunk_id: &str,
        entity_id: &str,
        confidence: f32,
    ) -> Result<(), EngineError>;

    /// Opportunistic co-occurrence writer: entities mentioned together in one chunk get (or
    /// merge into) a low-weight RELATES_TO edge. Never required for correctness (see §9.1).
    async fn record_cooccurrence(&self, entity_ids: &[String], weight: f32) -> Result<(), EngineError>;

    /// Case/diacritic-insensitive canonical-name lookup, scoped to `language` when an entity
    /// with a matching name exists in more than one language.
    async fn find_entities_by_name(
        &self,
        name: &str,
        language: &Language,
    ) -> Result<Vec<String>, EngineError>;

    /// BFS from `entity_ids` across MENTIONS (inverse) and RELATES_TO, `hops` deep, weighting by
    /// `edge_confidence / (1 + hop_distance)` and summing per chunk. `hops` is clamped to `{1,2}`.
    async fn find_chunks_by_entities(
        &self,
        entity_ids: &[String],
        hops: u8,
        limit: usize,
    ) -> Result<Vec<WeightedChunk>, EngineError>;

    async fn chunk_exists(&self, chunk_id: &str) -> Result<bool, EngineError>;

    async fn reset_all(&self) -> Result<(), EngineError>;

    async fn stats(&self) -> Result<GraphStats, EngineError>;
}

/// Shared BFS weighting logic: given the direct match set, the per-entity RELATES_TO neighbor
/// lookup, and the per-entity MENTIONS lookup, compute the accumulated per-chunk weight.
/// Both backends delegate to this so the traversal policy is defined exactly once.
pub(crate) fn accumulate_weighted_chunks(
    entity_ids: &[String],
    hops: u8,
    limit: usize,
    neighbors_of: impl Fn(&str) -> Vec<(String, f32)>,
    mentions_of: impl Fn(&str) -> Vec<(String, f32)>,
) -> Vec<WeightedChunk> {
    use std::collections::HashMap;

    let hops = hops.clamp(1, 2);
    let mut visited: HashMap<String, u8> = entity_ids.iter().cloned().map(|id| (id, 0u8)).collect();
    let mut frontier: Vec<String> = entity_ids.to_vec();

    for distance in 1..hops {
        let mut next = Vec::new();
        for entity_id in &frontier {
            for (neighbor, _weight) in neighbors_of(entity_id) {
                if !visited.contains_key(&neighbor) {
                    visited.insert(neighbor.clone(), distance);
                    next.push(neighbor);
                }
            }
        }
        frontier = next;
    }

    let mut accumulated: HashMap<String, f32> = HashMap::new();
    for (entity_id, distance) in &visited {
        for (chunk_id, confidence) in mentions_of(entity_id) {
            let contribution = confidence / (1.0 + f32::from(*distance));
            *accumulated.entry(chunk_id).or_insert(0.0) += contribution;
        }
    }

    let mut ranked: Vec<WeightedChunk> = accumulated.into_iter().collect();
    ranked.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    ranked.truncate(limit);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_hop_weights_by_confidence_only() {
        let result = accumulate_weighted_chunks(
            &["e1".to_string()],
            1,
            10,
            |_| vec![],
            |eid| if eid == "e1" { vec![("c1".to_string(), 0.8)] } else { vec![] },
        );
        assert_eq!(result, vec![("c1".to_string(), 0.8)]);
    }

    #[test]
    fn two_hop_discounts_by_distance() {
        let result = accumulate_weighted_chunks(
            &["e1".to_string()],
            2,
            10,
            |eid| if eid == "e1" { vec![("e2".to_string(), 0.5)] } else { vec![] },
            |eid| match eid {
                "e1" => vec![("c1".to_string(), 1.0)],
                "e2" => vec![("c2".to_string(), 1.0)],
                _ => vec![],
            },
        );
        assert_eq!(result[0], ("c1".to_string(), 1.0));
        assert_eq!(result[1], ("c2".to_string(), 0.5));
    }

    #[test]
    fn ties_break_by_chunk_id_ascending() {
        let result = accumulate_weighted_chunks(
            &["e1".to_string()],
            1,
            10,
            |_| vec![],
            |_| vec![("b".to_string(), 0.5), ("a".to_string(), 0.5)],
        );
        assert_eq!(result, vec![("a".to_string(), 0.5), ("b".to_string(), 0.5)]);
    }

    #[test]
    fn limit_truncates_result() {
        let result = accumulate_weighted_chunks(
            &["e1".to_string()],
            1,
            1,
            |_| vec![],
            |_| vec![("a".to_string(), 0.5), ("b".to_string(), 0.9)],
        );
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].0, "b");
    }
}
