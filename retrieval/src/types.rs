use std::collections::HashMap;

use common::language::Language;
use serde::{Deserialize, Serialize};

/// One retrieval method a caller may select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    Sparse,
    Dense,
    Graph,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sparse => "sparse",
            Self::Dense => "dense",
            Self::Graph => "graph",
        }
    }

    pub const ALL: [Method; 3] = [Method::Sparse, Method::Dense, Method::Graph];
}

#[derive(Debug, Clone)]
pub struct QueryRequest {
    pub text: String,
    pub language: Option<Language>,
    pub top_k: usize,
    pub methods: Vec<Method>,
    pub rrf_k: u32,
}

impl QueryRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            language: None,
            top_k: 10,
            methods: Vec::new(),
            rrf_k: 60,
        }
    }
}

/// One candidate surfaced by a single retriever, before fusion.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedCandidate {
    pub chunk_id: String,
    pub score: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerMethodScore {
    pub score: f32,
    pub rank: usize,
}

/// One fused result, carrying enough per-method detail for observability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultRecord {
    pub chunk_id: String,
    pub doc_id: String,
    pub text: String,
    pub language: Language,
    pub rrf_score: f32,
    pub rank: usize,
    pub per_method: HashMap<String, PerMethodScore>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timings {
    pub per_method_ms: HashMap<String, u64>,
    pub fusion_ms: u64,
    pub total_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub results: Vec<ResultRecord>,
    pub timings_ms: Timings,
    pub methods_used: Vec<String>,
}
