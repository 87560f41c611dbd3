// ============================================================
// Evaluation Layer — BLEU and ROUGE
// ============================================================
// Scores a sequence of predictions against a sequence of
// reference sets (one set per prediction; here each set holds a
// single reference answer, but the signatures accept more).
//
// BLEU is computed at corpus level: clipped n-gram matches and
// candidate lengths are accumulated over the whole sample before
// the geometric mean and brevity penalty are applied, following
// Papineni et al. (2002). ROUGE-1/2/L are per-pair F1 scores
// averaged over the sample, taking the best reference in each
// set, following Lin (2004).
//
// All scores are in [0, 1].

use std::collections::HashMap;

/// Maximum n-gram order used for BLEU.
const BLEU_MAX_N: usize = 4;

/// ROUGE-1, ROUGE-2 and ROUGE-L F1 averaged over the sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RougeScores {
    pub rouge1:  f64,
    pub rouge2:  f64,
    pub rouge_l: f64,
}

/// Corpus-level BLEU over (prediction, reference-set) pairs.
///
/// Each prediction is scored against every reference in its set;
/// n-gram counts are clipped to the maximum reference count. The
/// pair sequences must be the same length.
pub fn bleu(predictions: &[String], references: &[Vec<String>]) -> f64 {
    assert_eq!(
        predictions.len(),
        references.len(),
        "predictions and reference sets must pair up one-to-one"
    );
    if predictions.is_empty() {
        return 0.0;
    }

    let mut clipped_by_n = [0usize; BLEU_MAX_N];
    let mut total_by_n   = [0usize; BLEU_MAX_N];
    let mut hyp_len_sum  = 0usize;
    let mut ref_len_sum  = 0usize;

    for (pred, refs) in predictions.iter().zip(references) {
        let hyp: Vec<&str> = pred.split_whitespace().collect();
        let ref_lists: Vec<Vec<&str>> = refs
            .iter()
            .map(|r| r.split_whitespace().collect())
            .collect();

        hyp_len_sum += hyp.len();
        ref_len_sum += closest_reference_length(&ref_lists, hyp.len());

        for n in 1..=BLEU_MAX_N {
            let (clipped, total) = clipped_ngram_matches(&ref_lists, &hyp, n);
            clipped_by_n[n - 1] += clipped;
            total_by_n[n - 1]   += total;
        }
    }

    // Geometric mean of the modified precisions (uniform weights).
    // Any empty order zeroes the whole score, as in the original
    // formulation.
    let mut log_precision_sum = 0.0f64;
    for n in 0..BLEU_MAX_N {
        if total_by_n[n] == 0 || clipped_by_n[n] == 0 {
            return 0.0;
        }
        log_precision_sum += (clipped_by_n[n] as f64 / total_by_n[n] as f64).ln();
    }
    let geo_mean = (log_precision_sum / BLEU_MAX_N as f64).exp();

    // Corpus-level brevity penalty
    let bp = if hyp_len_sum >= ref_len_sum {
        1.0
    } else if hyp_len_sum == 0 {
        0.0
    } else {
        (1.0 - ref_len_sum as f64 / hyp_len_sum as f64).exp()
    };

    bp * geo_mean
}

/// ROUGE-1/2/L averaged over (prediction, reference-set) pairs.
/// For a multi-reference set the best-scoring reference counts.
pub fn rouge(predictions: &[String], references: &[Vec<String>]) -> RougeScores {
    assert_eq!(
        predictions.len(),
        references.len(),
        "predictions and reference sets must pair up one-to-one"
    );
    if predictions.is_empty() {
        return RougeScores { rouge1: 0.0, rouge2: 0.0, rouge_l: 0.0 };
    }

    let mut sum1 = 0.0f64;
    let mut sum2 = 0.0f64;
    let mut suml = 0.0f64;

    for (pred, refs) in predictions.iter().zip(references) {
        sum1 += best_over_refs(refs, |r| rouge_n_pair(r, pred, 1));
        sum2 += best_over_refs(refs, |r| rouge_n_pair(r, pred, 2));
        suml += best_over_refs(refs, |r| rouge_l_pair(r, pred));
    }

    let count = predictions.len() as f64;
    RougeScores {
        rouge1:  sum1 / count,
        rouge2:  sum2 / count,
        rouge_l: suml / count,
    }
}

/// Highest score any reference in the set achieves.
fn best_over_refs(refs: &[String], score: impl Fn(&str) -> f64) -> f64 {
    refs.iter()
        .map(|r| score(r))
        .fold(0.0f64, f64::max)
}

/// Reference length closest to the hypothesis length — ties go to
/// the shorter reference, matching the original BLEU definition.
fn closest_reference_length(references: &[Vec<&str>], hyp_len: usize) -> usize {
    references
        .iter()
        .map(Vec::len)
        .min_by_key(|&len| {
            ((len as isize - hyp_len as isize).unsigned_abs(), len)
        })
        .unwrap_or(0)
}

/// Clipped n-gram matches of the hypothesis against all references,
/// plus the total number of hypothesis n-grams of this order.
fn clipped_ngram_matches(
    references: &[Vec<&str>],
    hypothesis: &[&str],
    n:          usize,
) -> (usize, usize) {
    let hyp_ngrams = count_ngrams(hypothesis, n);
    let total: usize = hyp_ngrams.values().sum();

    let mut clipped = 0usize;
    for (ngram, &hyp_count) in &hyp_ngrams {
        let max_ref_count = references
            .iter()
            .map(|r| count_ngrams(r, n).get(ngram).copied().unwrap_or(0))
            .max()
            .unwrap_or(0);
        clipped += hyp_count.min(max_ref_count);
    }

    (clipped, total)
}

/// Count the n-grams of a token sequence.
fn count_ngrams<'a>(tokens: &[&'a str], n: usize) -> HashMap<Vec<&'a str>, usize> {
    let mut counts = HashMap::new();
    if tokens.len() >= n && n > 0 {
        for window in tokens.windows(n) {
            *counts.entry(window.to_vec()).or_insert(0) += 1;
        }
    }
    counts
}

/// ROUGE-N F1 for a single (reference, hypothesis) pair.
fn rouge_n_pair(reference: &str, hypothesis: &str, n: usize) -> f64 {
    let ref_tokens: Vec<&str> = reference.split_whitespace().collect();
    let hyp_tokens: Vec<&str> = hypothesis.split_whitespace().collect();

    if ref_tokens.len() < n || hyp_tokens.len() < n {
        return 0.0;
    }

    let ref_ngrams = count_ngrams(&ref_tokens, n);
    let hyp_ngrams = count_ngrams(&hyp_tokens, n);

    let mut overlap = 0usize;
    for (ngram, &hyp_count) in &hyp_ngrams {
        let ref_count = ref_ngrams.get(ngram).copied().unwrap_or(0);
        overlap += hyp_count.min(ref_count);
    }

    let ref_total: usize = ref_ngrams.values().sum();
    let hyp_total: usize = hyp_ngrams.values().sum();
    f1(overlap, hyp_total, ref_total)
}

/// ROUGE-L F1 for a single (reference, hypothesis) pair, based on
/// the longest common subsequence of tokens.
fn rouge_l_pair(reference: &str, hypothesis: &str) -> f64 {
    let ref_tokens: Vec<&str> = reference.split_whitespace().collect();
    let hyp_tokens: Vec<&str> = hypothesis.split_whitespace().collect();

    if ref_tokens.is_empty() || hyp_tokens.is_empty() {
        return 0.0;
    }

    let lcs = lcs_length(&ref_tokens, &hyp_tokens);
    f1(lcs, hyp_tokens.len(), ref_tokens.len())
}

/// F1 from an overlap count and the two totals.
fn f1(overlap: usize, hyp_total: usize, ref_total: usize) -> f64 {
    if hyp_total == 0 || ref_total == 0 {
        return 0.0;
    }
    let precision = overlap as f64 / hyp_total as f64;
    let recall    = overlap as f64 / ref_total as f64;
    if precision + recall == 0.0 {
        return 0.0;
    }
    2.0 * precision * recall / (precision + recall)
}

/// Length of the longest common subsequence of two token slices.
fn lcs_length(a: &[&str], b: &[&str]) -> usize {
    let n = a.len();
    let m = b.len();
    let mut dp = vec![vec![0usize; m + 1]; n + 1];

    for i in 1..=n {
        for j in 1..=m {
            if a[i - 1] == b[j - 1] {
                dp[i][j] = dp[i - 1][j - 1] + 1;
            } else {
                dp[i][j] = dp[i - 1][j].max(dp[i][j - 1]);
            }
        }
    }

    dp[n][m]
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn single(s: &str) -> Vec<String> {
        vec![s.to_string()]
    }

    #[test]
    fn test_bleu_perfect_match_is_one() {
        let preds = vec!["the crop needs water and sunlight to grow".to_string()];
        let refs  = vec![single("the crop needs water and sunlight to grow")];
        let score = bleu(&preds, &refs);
        assert!((score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_bleu_disjoint_is_zero() {
        let preds = vec!["alpha beta gamma delta".to_string()];
        let refs  = vec![single("one two three four")];
        assert_eq!(bleu(&preds, &refs), 0.0);
    }

    #[test]
    fn test_bleu_in_unit_interval() {
        let preds = vec![
            "wheat grows best with nitrogen fertilizer applied early".to_string(),
            "rotate crops to keep the soil healthy".to_string(),
        ];
        let refs = vec![
            single("wheat responds well to nitrogen fertilizer applied in early spring"),
            single("crop rotation keeps the soil healthy"),
        ];
        let score = bleu(&preds, &refs);
        assert!(score > 0.0 && score < 1.0);
    }

    #[test]
    fn test_bleu_short_hypothesis_penalized() {
        // Identical 4-gram content, but the truncated candidate
        // must score below the full-length one.
        let full  = vec!["plant maize in rows two meters apart".to_string()];
        let short = vec!["plant maize in rows".to_string()];
        let refs  = vec![single("plant maize in rows two meters apart")];

        assert!(bleu(&short, &refs) < bleu(&full, &refs));
    }

    #[test]
    fn test_bleu_empty_prediction_is_zero() {
        let preds = vec![String::new()];
        let refs  = vec![single("a reference answer")];
        assert_eq!(bleu(&preds, &refs), 0.0);
    }

    #[test]
    fn test_rouge_perfect_match_is_one() {
        let preds  = vec!["irrigate the field at dawn".to_string()];
        let refs   = vec![single("irrigate the field at dawn")];
        let scores = rouge(&preds, &refs);
        assert!((scores.rouge1 - 1.0).abs() < 1e-9);
        assert!((scores.rouge2 - 1.0).abs() < 1e-9);
        assert!((scores.rouge_l - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_rouge_disjoint_is_zero() {
        let preds  = vec!["alpha beta gamma".to_string()];
        let refs   = vec![single("one two three")];
        let scores = rouge(&preds, &refs);
        assert_eq!(scores.rouge1, 0.0);
        assert_eq!(scores.rouge2, 0.0);
        assert_eq!(scores.rouge_l, 0.0);
    }

    #[test]
    fn test_rouge_partial_overlap_between_zero_and_one() {
        let preds  = vec!["water the soil every morning".to_string()];
        let refs   = vec![single("water the crops every evening")];
        let scores = rouge(&preds, &refs);
        assert!(scores.rouge1 > 0.0 && scores.rouge1 < 1.0);
        assert!(scores.rouge_l > 0.0 && scores.rouge_l < 1.0);
    }

    #[test]
    fn test_rouge_l_rewards_order() {
        // Same unigrams, different order: ROUGE-1 identical,
        // ROUGE-L lower for the scrambled candidate.
        let ordered   = vec!["soil must drain well".to_string()];
        let scrambled = vec!["well drain must soil".to_string()];
        let refs      = vec![single("soil must drain well")];

        let a = rouge(&ordered, &refs);
        let b = rouge(&scrambled, &refs);
        assert_eq!(a.rouge1, b.rouge1);
        assert!(a.rouge_l > b.rouge_l);
    }

    #[test]
    fn test_multi_reference_takes_best() {
        let preds = vec!["compost improves soil".to_string()];
        let refs  = vec![vec![
            "unrelated text entirely".to_string(),
            "compost improves soil".to_string(),
        ]];
        let scores = rouge(&preds, &refs);
        assert!((scores.rouge1 - 1.0).abs() < 1e-9);
    }

    #[test]
    #[should_panic]
    fn test_mismatched_lengths_panic() {
        let preds = vec!["a".to_string(), "b".to_string()];
        let refs  = vec![single("a")];
        bleu(&preds, &refs);
    }
}
