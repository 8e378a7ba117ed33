use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Where the Dense Index encoder should run.
#[derive(Clone, Copy, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DenseDevice {
    Cpu,
    Cuda,
    Mps,
    Auto,
}

fn default_bm25_k1() -> f32 {
    1.5
}
fn default_bm25_b() -> f32 {
    0.75
}
fn default_rrf_k() -> u32 {
    60
}
fn default_top_k() -> usize {
    10
}
fn default_dense_model_id() -> String {
    "sentence-transformers/all-MiniLM-L6-v2".to_string()
}
fn default_dense_device() -> DenseDevice {
    DenseDevice::Auto
}
fn default_dense_batch_size() -> usize {
    32
}
fn default_timeout_ms() -> u64 {
    2_000
}
fn default_journal_path() -> String {
    "./data/chunk_journal.ndjson".to_string()
}
fn default_language() -> String {
    "en".to_string()
}
fn default_k_fanout() -> usize {
    50
}

/// Every recognized configuration option from SPEC_FULL.md §6, layered the way the teacher's
/// `AppConfig` is: an optional TOML file, overridden by environment variables.
#[derive(Clone, Deserialize, Debug)]
pub struct EngineConfig {
    #[serde(default = "default_bm25_k1")]
    pub bm25_k1: f32,
    #[serde(default = "default_bm25_b")]
    pub bm25_b: f32,
    #[serde(default = "default_rrf_k")]
    pub rrf_k: u32,
    #[serde(default = "default_top_k")]
    pub top_k_default: usize,
    #[serde(default = "default_k_fanout")]
    pub k_fanout: usize,
    #[serde(default = "default_dense_model_id")]
    pub dense_model_id: String,
    #[serde(default = "default_dense_device")]
    pub dense_device: DenseDevice,
    #[serde(default = "default_dense_batch_size")]
    pub dense_batch_size: usize,
    #[serde(default = "default_timeout_ms")]
    pub per_retriever_timeout_ms: u64,
    #[serde(default)]
    pub persist_ingested_content: bool,
    #[serde(default = "default_journal_path")]
    pub chunk_journal_path: String,
    #[serde(default = "default_language")]
    pub language_default: String,
    /// Resolved per SPEC_FULL.md §9.1: dense retrieval is language-filtered by default.
    #[serde(default = "default_dense_language_filtered")]
    pub dense_language_filtered: bool,
    /// Graph store backend connection string (e.g. `mem://` or a SurrealDB endpoint).
    #[serde(default = "default_graph_address")]
    pub graph_address: String,
    #[serde(default = "default_graph_namespace")]
    pub graph_namespace: String,
    #[serde(default = "default_graph_database")]
    pub graph_database: String,
}

fn default_dense_language_filtered() -> bool {
    true
}
fn default_graph_address() -> String {
    "mem://".to_string()
}
fn default_graph_namespace() -> String {
    "retrieval".to_string()
}
fn default_graph_database() -> String {
    "core".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bm25_k1: default_bm25_k1(),
            bm25_b: default_bm25_b(),
            rrf_k: default_rrf_k(),
            top_k_default: default_top_k(),
            k_fanout: default_k_fanout(),
            dense_model_id: default_dense_model_id(),
            dense_device: default_dense_device(),
            dense_batch_size: default_dense_batch_size(),
            per_retriever_timeout_ms: default_timeout_ms(),
            persist_ingested_content: false,
            chunk_journal_path: default_journal_path(),
            language_default: default_language(),
            dense_language_filtered: default_dense_language_filtered(),
            graph_address: default_graph_address(),
            graph_namespace: default_graph_namespace(),
            graph_database: default_graph_database(),
        }
    }
}

/// Loads configuration from an optional `config.toml` in the working directory, then applies
/// `ENGINE_`-prefixed environment variable overrides (e.g. `ENGINE_BM25_K1=1.2`).
pub fn load_config() -> Result<EngineConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::with_name("config").required(false))
        .add_source(Environment::with_prefix("ENGINE").separator("__"))
        .build()?;

    config.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.bm25_k1, 1.5);
        assert_eq!(cfg.bm25_b, 0.75);
        assert_eq!(cfg.rrf_k, 60);
        assert_eq!(cfg.k_fanout, 50);
        assert!(cfg.dense_language_filtered);
    }
}
