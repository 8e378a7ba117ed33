/// `IDF(t) = log( (N - df(t) + 0.5) / (df(t) + 0.5) + 1 )`
pub fn idf(total_docs: usize, doc_freq: usize) -> f32 {
    #[allow(clippy::cast_precision_loss)]
    let n = total_docs as f32;
    #[allow(clippy::cast_precision_loss)]
    let df = doc_freq as f32;
    (((n - df + 0.5) / (df + 0.5)) + 1.0).ln()
}

/// Okapi BM25 per-term contribution: `IDF(t) · f(t,d)·(k1+1) / (f(t,d) + k1·(1 - b + b·|d|/avgdl))`
#[allow(clippy::too_many_arguments)]
pub fn term_score(
    term_idf: f32,
    term_freq: u32,
    doc_len: usize,
    avg_doc_len: f32,
    k1: f32,
    b: f32,
) -> f32 {
    if avg_doc_len <= 0.0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let tf = term_freq as f32;
    #[allow(clippy::cast_precision_loss)]
    let dl = doc_len as f32;
    let numerator = tf * (k1 + 1.0);
    let denominator = tf + k1 * (1.0 - b + b * (dl / avg_doc_len));
    term_idf * (numerator / denominator)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idf_decreases_as_document_frequency_grows() {
        let rare = idf(100, 1);
        let common = idf(100, 50);
        assert!(rare > common);
    }

    #[test]
    fn idf_is_never_negative_for_reasonable_inputs() {
        assert!(idf(100, 99) >= 0.0);
    }

    #[test]
    fn term_score_monotonic_in_term_frequency_when_length_fixed() {
        let low = term_score(1.0, 1, 10, 10.0, 1.5, 0.75);
        let high = term_score(1.0, 5, 10, 10.0, 1.5, 0.75);
        assert!(high > low);
    }

    #[test]
    fn term_score_penalizes_longer_documents() {
        let short = term_score(1.0, 2, 5, 10.0, 1.5, 0.75);
        let long = term_score(1.0, 2, 40, 10.0, 1.5, 0.75);
        assert!(short > long);
    }

    #[test]
    fn zero_average_length_yields_zero_score() {
        assert_eq!(term_score(1.0, 2, 5, 0.0, 1.5, 0.75), 0.0);
    }
}
