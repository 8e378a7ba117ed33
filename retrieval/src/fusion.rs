use std::collections::HashMap;

use crate::types::{PerMethodScore, RankedCandidate};

/// One method's ranked output, already truncated to its fan-out limit.
pub struct MethodResult {
    pub method: &'static str,
    pub candidates: Vec<RankedCandidate>,
}

pub struct FusedEntry {
    pub chunk_id: String,
    pub rrf_score: f32,
    pub per_method: HashMap<String, PerMethodScore>,
}

/// `RRF(c) = Σ_i [c ∈ R_i] · 1 / (rrf_k + rank_i(c))`, rank starting at 1. Ties are broken by
/// `(number of lists containing c, chunk_id ascending)` — see SPEC_FULL.md §4.6.3.
pub fn reciprocal_rank_fusion(results: &[MethodResult], rrf_k: u32) -> Vec<FusedEntry> {
    let mut accumulated: HashMap<String, (f32, HashMap<String, PerMethodScore>)> = HashMap::new();

    for method_result in results {
        for (index, candidate) in method_result.candidates.iter().enumerate() {
            let rank = index + 1;
            #[allow(clippy::cast_precision_loss)]
            let contribution = 1.0 / (rrf_k as f32 + rank as f32);
            let entry = accumulated
                .entry(candidate.chunk_id.clone())
                .or_insert_with(|| (0.0, HashMap::new()));
            entry.0 += contribution;
            entry.1.insert(
                method_result.method.to_string(),
                PerMethodScore { score: candidate.score, rank },
            );
        }
    }

    let mut fused: Vec<FusedEntry> = accumulated
        .into_iter()
        .map(|(chunk_id, (rrf_score, per_method))| FusedEntry { chunk_id, rrf_score, per_method })
        .collect();

    fused.sort_by(|a, b| {
        let list_count_a = a.per_method.len();
        let list_count_b = b.per_method.len();
        b.rrf_score
            .partial_cmp(&a.rrf_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| list_count_b.cmp(&list_count_a))
            .then_with(|| a.chunk_id.cmp(&b.chunk_id))
    });

    fused
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidates(ids: &[&str]) -> Vec<RankedCandidate> {
        ids.iter()
            .enumerate()
            .map(|(i, id)| RankedCandidate { chunk_id: (*id).to_string(), score: 1.0 / (i as f32 + 1.0) })
            .collect()
    }

    #[test]
    fn missing_from_a_list_contributes_zero() {
        let results = vec![
            MethodResult { method: "sparse", candidates: candidates(&["a", "b"]) },
            MethodResult { method: "dense", candidates: vec![] },
        ];
        let fused = reciprocal_rank_fusion(&results, 60);
        assert_eq!(fused[0].chunk_id, "a");
        assert_eq!(fused[0].rrf_score, 1.0 / 61.0);
    }

    #[test]
    fn tie_breaks_by_chunk_id_ascending() {
        let results = vec![
            MethodResult { method: "sparse", candidates: candidates(&["a", "b"]) },
            MethodResult { method: "dense", candidates: candidates(&["b", "a"]) },
        ];
        let fused = reciprocal_rank_fusion(&results, 60);
        assert_eq!(fused[0].chunk_id, "a");
        assert_eq!(fused[1].chunk_id, "b");
        assert!((fused[0].rrf_score - fused[1].rrf_score).abs() < 1e-9);
    }

    #[test]
    fn fusion_is_order_independent() {
        let forward = vec![
            MethodResult { method: "sparse", candidates: candidates(&["a", "b", "c"]) },
            MethodResult { method: "dense", candidates: candidates(&["c", "a"]) },
        ];
        let backward = vec![
            MethodResult { method: "dense", candidates: candidates(&["c", "a"]) },
            MethodResult { method: "sparse", candidates: candidates(&["a", "b", "c"]) },
        ];
        let fused_forward = reciprocal_rank_fusion(&forward, 60);
        let fused_backward = reciprocal_rank_fusion(&backward, 60);
        let ids_forward: Vec<_> = fused_forward.iter().map(|f| f.chunk_id.clone()).collect();
        let ids_backward: Vec<_> = fused_backward.iter().map(|f| f.chunk_id.clone()).collect();
        assert_eq!(ids_forward, ids_backward);
    }

    #[test]
    fn fusion_bound_is_tight_for_top_rank_in_every_list() {
        let results = vec![
            MethodResult { method: "sparse", candidates: candidates(&["a"]) },
            MethodResult { method: "dense", candidates: candidates(&["a"]) },
        ];
        let fused = reciprocal_rank_fusion(&results, 60);
        assert!((fused[0].rrf_score - 2.0 / 61.0).abs() < 1e-9);
    }

    #[test]
    fn presence_in_more_lists_breaks_ties_over_fewer() {
        // a: rank 2 in two lists -> 2/62. b: rank 1 in one list -> 1/61. Not equal, so pick
        // scores that tie exactly on rrf_score but differ in list count.
        let results = vec![
            MethodResult { method: "sparse", candidates: vec![RankedCandidate { chunk_id: "a".into(), score: 1.0 }] },
            MethodResult { method: "dense", candidates: vec![RankedCandidate { chunk_id: "a".into(), score: 1.0 }] },
            MethodResult { method: "graph", candidates: vec![RankedCandidate { chunk_id: "b".into(), score: 1.0 }] },
        ];
        let fused = reciprocal_rank_fusion(&results, 60);
        let a_score = fused.iter().find(|f| f.chunk_id == "a").unwrap().rrf_score;
        let b_score = fused.iter().find(|f| f.chunk_id == "b").unwrap().rrf_score;
        assert!(a_score > b_score);
    }
}
