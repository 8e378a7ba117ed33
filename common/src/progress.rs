use serde::{Deserialize, Serialize};

/// Ingestion stage boundaries, emitted in this exact order for a single `ingest` call. The
/// streaming adapter (out of scope here) turns these into newline-delimited JSON or SSE events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Parse,
    Chunk,
    Graph,
    Sparse,
    Dense,
    Done,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub stage: Stage,
    pub percent: u8,
    pub detail: String,
}

impl ProgressEvent {
    pub fn new(stage: Stage, percent: u8, detail: impl Into<String>) -> Self {
        Self {
            stage,
            percent,
            detail: detail.into(),
        }
    }
}

/// Availability of one component, surfaced via `health()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub available: bool,
    pub detail: Option<String>,
}

impl ComponentHealth {
    pub fn ok() -> Self {
        Self {
            available: true,
            detail: None,
        }
    }

    pub fn unavailable(detail: impl Into<String>) -> Self {
        Self {
            available: false,
            detail: Some(detail.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub sparse: ComponentHealth,
    pub dense: ComponentHealth,
    pub graph: ComponentHealth,
    pub extractor: ComponentHealth,
}
