//! C5: sentence-embedding encoder plus an in-process vector store keyed by chunk id.

pub mod encoder;
pub mod vector_store;

pub use encoder::DenseEncoder;
pub use vector_store::{point_id, FlatCosineStore, VectorPayload, VectorStore};
