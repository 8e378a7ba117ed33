//! C2: pluggable NER backend. The core depends only on the `EntityExtractor` trait; ingestion
//! treats a backend failure as non-fatal (empty set + warning).

mod rule_based;

pub use rule_based::RuleBasedExtractor;

use async_trait::async_trait;
use common::language::Language;
use common::types::Mention;

/// One pluggable entity-extraction backend. Implementations MUST be deterministic for a given
/// backend version so ingestion tests are reproducible.
#[async_trait]
pub trait EntityExtractor: Send + Sync {
    async fn extract(&self, chunk_text: &str, language: &Language) -> Vec<Mention>;
}
