use serde::{Deserialize, Serialize};

use crate::ids::entity_id;
use crate::language::Language;

/// Fixed set of entity categories the extractor backend may produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityType {
    Person,
    Organization,
    Location,
    Concept,
    Product,
    Event,
    Date,
    Other,
}

impl EntityType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Person => "PERSON",
            Self::Organization => "ORGANIZATION",
            Self::Location => "LOCATION",
            Self::Concept => "CONCEPT",
            Self::Product => "PRODUCT",
            Self::Event => "EVENT",
            Self::Date => "DATE",
            Self::Other => "OTHER",
        }
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A knowledge-graph entity. `id` is a stable hash of `(canonical_name, type)` so re-ingestion
/// of the same entity merges rather than duplicates: confidence is updated to `max(old, new)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Entity {
    pub id: String,
    pub canonical_name: String,
    pub entity_type: EntityType,
    pub language: Language,
    pub confidence: f32,
}

impl Entity {
    pub fn new(
        canonical_name: impl Into<String>,
        entity_type: EntityType,
        language: Language,
        confidence: f32,
    ) -> Self {
        let canonical_name = canonical_name.into();
        let id = entity_id(&canonical_name, entity_type.as_str());
        Self {
            id,
            canonical_name,
            entity_type,
            language,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    /// Merge policy for re-ingestion: confidence takes the max of the two observations.
    pub fn merge_confidence(existing: f32, incoming: f32) -> f32 {
        existing.max(incoming)
    }
}

/// A candidate entity mention surfaced by the Entity Extractor, before it is persisted to the
/// graph. `span` is the byte-offset range of the mention within the chunk text.
#[derive(Debug, Clone, PartialEq)]
pub struct Mention {
    pub canonical_name: String,
    pub entity_type: EntityType,
    pub confidence: f32,
    pub span: (usize, usize),
}
