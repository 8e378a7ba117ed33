use serde::{Deserialize, Serialize};

/// `Chunk --MENTIONS {confidence}--> Entity`. MERGE semantics on (chunk_id, entity_id):
/// confidence becomes `max(old, new)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MentionsEdge {
    pub chunk_id: String,
    pub entity_id: String,
    pub confidence: f32,
}

/// `Entity --RELATES_TO {weight}--> Entity`, derived from co-occurrence. Optional: traversal
/// must tolerate a graph with none of these edges (see open question resolution in SPEC_FULL.md
/// §9.1).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RelatesToEdge {
    pub source_entity_id: String,
    pub target_entity_id: String,
    pub weight: f32,
}
