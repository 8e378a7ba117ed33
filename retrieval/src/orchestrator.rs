use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use common::error::EngineError;
use common::language::Language;
use dense_index::VectorStore;

use crate::fusion::{reciprocal_rank_fusion, MethodResult};
use crate::retriever::Retriever;
use crate::types::{Method, QueryRequest, QueryResponse, ResultRecord, Timings};

impl Method {
    /// Rejects the `colbert` alias explicitly rather than silently remapping it to `dense`
    /// (resolved open question, see SPEC_FULL.md §9.1).
    pub fn parse(raw: &str) -> Result<Method, EngineError> {
        match raw {
            "sparse" => Ok(Method::Sparse),
            "dense" => Ok(Method::Dense),
            "graph" => Ok(Method::Graph),
            "colbert" => Err(EngineError::InvalidRequest("unsupported method: colbert".to_string())),
            other => Err(EngineError::InvalidRequest(format!("unsupported method: {other}"))),
        }
    }
}

fn validate(request: &QueryRequest) -> Result<(), EngineError> {
    if request.text.trim().is_empty() {
        return Err(EngineError::InvalidRequest("query text must not be empty".to_string()));
    }
    if request.top_k == 0 {
        return Err(EngineError::InvalidRequest("top_k must be >= 1".to_string()));
    }
    Ok(())
}

/// Query-time orchestrator: fans out to the selected retrievers concurrently, each under its own
/// deadline, RRF-fuses the ranked lists, hydrates, and returns the top-k.
pub struct QueryOrchestrator {
    retrievers: Vec<Arc<dyn Retriever>>,
    hydration_source: Arc<dyn VectorStore>,
    per_retriever_timeout: Duration,
    k_fanout: usize,
}

impl QueryOrchestrator {
    pub fn new(
        retrievers: Vec<Arc<dyn Retriever>>,
        hydration_source: Arc<dyn VectorStore>,
        per_retriever_timeout: Duration,
        k_fanout: usize,
    ) -> Self {
        Self { retrievers, hydration_source, per_retriever_timeout, k_fanout }
    }

    #[tracing::instrument(skip(self, request), fields(query = %request.text))]
    pub async fn query(&self, request: QueryRequest) -> Result<QueryResponse, EngineError> {
        validate(&request)?;
        let overall_start = Instant::now();

        let selected_methods: Vec<Method> = if request.methods.is_empty() {
            Method::ALL.to_vec()
        } else {
            request.methods.clone()
        };

        let fan_out_k = request.top_k.max(self.k_fanout);
        let language_filter = request.language.clone();

        let mut method_results = Vec::new();
        let mut methods_used = Vec::new();
        let mut per_method_ms = HashMap::new();

        let active: Vec<&Arc<dyn Retriever>> = self
            .retrievers
            .iter()
            .filter(|r| selected_methods.iter().any(|m| m.as_str() == r.method_name()))
            .collect();

        let futures = active.iter().map(|retriever| {
            let retriever = Arc::clone(retriever);
            let text = request.text.clone();
            let language_filter = language_filter.clone();
            let timeout = self.per_retriever_timeout;
            async move {
                let start = Instant::now();
                let outcome = tokio::time::timeout(
                    timeout,
                    retriever.search(&text, fan_out_k, language_filter.as_ref()),
                )
                .await;
                let elapsed = start.elapsed();
                let method = retriever.method_name();
                match outcome {
                    Ok(Ok(candidates)) => (method, Some(candidates), elapsed),
                    Ok(Err(error)) => {
                        tracing::warn!(method, %error, "retriever failed");
                        (method, None, elapsed)
                    }
                    Err(_) => {
                        tracing::warn!(method, "retriever timed out");
                        (method, None, elapsed)
                    }
                }
            }
        });

        for (method, candidates, elapsed) in futures::future::join_all(futures).await {
            per_method_ms.insert(method.to_string(), elapsed.as_millis() as u64);
            if let Some(candidates) = candidates {
                methods_used.push(method.to_string());
                method_results.push(MethodResult { method, candidates });
            }
        }

        let fusion_start = Instant::now();
        let fused = reciprocal_rank_fusion(&method_results, request.rrf_k);
        let fusion_ms = fusion_start.elapsed().as_millis() as u64;

        let mut results = Vec::with_capacity(request.top_k.min(fused.len()));
        for entry in fused {
            if results.len() == request.top_k {
                break;
            }
            let Some(payload) = self.hydration_source.get(&entry.chunk_id).await? else {
                continue;
            };
            results.push(ResultRecord {
                chunk_id: entry.chunk_id,
                doc_id: payload.doc_id,
                text: payload.text,
                language: payload.language,
                rrf_score: entry.rrf_score,
                rank: results.len() + 1,
                per_method: entry.per_method,
            });
        }

        Ok(QueryResponse {
            results,
            timings_ms: Timings {
                per_method_ms,
                fusion_ms,
                total_ms: overall_start.elapsed().as_millis() as u64,
            },
            methods_used,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colbert_is_rejected_not_remapped() {
        let err = Method::parse("colbert").unwrap_err();
        assert_eq!(err.kind(), "InvalidRequest");
    }

    #[test]
    fn known_methods_parse() {
        assert_eq!(Method::parse("sparse").unwrap(), Method::Sparse);
        assert_eq!(Method::parse("dense").unwrap(), Method::Dense);
        assert_eq!(Method::parse("graph").unwrap(), Method::Graph);
    }

    #[test]
    fn validate_rejects_empty_text_and_zero_top_k() {
        let mut request = QueryRequest::new("  ");
        assert!(validate(&request).is_err());
        request.text = "hello".to_string();
        request.top_k = 0;
        assert!(validate(&request).is_err());
    }
}
