//! C6: runs the three retrievers concurrently, RRF-fuses their ranked lists, dedupes, and
//! returns the top-k.

pub mod fusion;
pub mod orchestrator;
pub mod retriever;
pub mod types;

pub use orchestrator::QueryOrchestrator;
pub use retriever::{DenseRetriever, GraphRetriever, QueryEncoder, Retriever, SparseRetriever};
pub use types::{Method, QueryRequest, QueryResponse, RankedCandidate, ResultRecord};
