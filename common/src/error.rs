use thiserror::Error;

/// The one error type crossing component boundaries in the retrieval core.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("document produced zero chunks")]
    EmptyDocument,
    #[error("graph store unavailable: {0}")]
    GraphUnavailable(String),
    #[error("index write failed ({index}): {reason}")]
    IndexWriteFailed { index: &'static str, reason: String },
    #[error("embedding encoder failed: {0}")]
    EncoderError(String),
    #[error("retriever timed out: {0}")]
    RetrieverTimeout(&'static str),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("graph store error: {0}")]
    Graph(String),
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl EngineError {
    /// A stable, machine-readable discriminant the service adapter can map to user-facing
    /// responses without matching on the `Display` text.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::EmptyDocument => "EmptyDocument",
            Self::GraphUnavailable(_) => "GraphUnavailable",
            Self::IndexWriteFailed { .. } => "IndexWriteFailed",
            Self::EncoderError(_) => "EncoderError",
            Self::RetrieverTimeout(_) => "RetrieverTimeout",
            Self::InvalidRequest(_) => "InvalidRequest",
            Self::Graph(_) => "GraphError",
            Self::Io(_) => "Io",
            Self::Serde(_) => "Serde",
            Self::Config(_) => "Config",
            Self::Join(_) => "Join",
            Self::Internal(_) => "Internal",
        }
    }
}
