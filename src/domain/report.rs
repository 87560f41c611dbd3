// ============================================================
// Layer 3 — Evaluation Report Domain Type
// ============================================================
// Aggregate text-overlap scores for one evaluation invocation.
// Created once per `evaluate` run, read-only after creation.
// All scores live in [0, 1].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Aggregate BLEU and ROUGE scores over a fixed-size sample of
/// generated vs. reference answers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// Number of (prediction, reference) pairs scored
    pub sample_size: usize,

    /// Corpus-level BLEU (n-grams up to 4, brevity penalty applied)
    pub bleu: f64,

    /// Average ROUGE-1 F1 (unigram overlap)
    pub rouge1: f64,

    /// Average ROUGE-2 F1 (bigram overlap)
    pub rouge2: f64,

    /// Average ROUGE-L F1 (longest common subsequence)
    pub rouge_l: f64,
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Evaluation over {} validation questions", self.sample_size)?;
        writeln!(f, "  BLEU:    {:.4}", self.bleu)?;
        writeln!(f, "  ROUGE-1: {:.4}", self.rouge1)?;
        writeln!(f, "  ROUGE-2: {:.4}", self.rouge2)?;
        write!(f,   "  ROUGE-L: {:.4}", self.rouge_l)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_contains_all_scores() {
        let r = EvaluationReport {
            sample_size: 50,
            bleu:        0.1234,
            rouge1:      0.5,
            rouge2:      0.25,
            rouge_l:     0.4,
        };
        let text = r.to_string();
        assert!(text.contains("50 validation questions"));
        assert!(text.contains("BLEU:    0.1234"));
        assert!(text.contains("ROUGE-L: 0.4000"));
    }
}
