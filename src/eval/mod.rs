// ============================================================
// Evaluation Layer — Text-Overlap Metrics
// ============================================================
// Pure scoring functions over generated and reference text.
// No framework types and no I/O — the evaluate use case feeds
// in decoded strings and reads back numbers.

/// BLEU and ROUGE scorers
pub mod text_metrics;
