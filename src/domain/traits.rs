// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// By programming against traits instead of concrete types,
// we can swap implementations without changing the code
// that uses them. For example:
//   - JsonCorpusLoader implements CorpusSource
//   - A future HubCorpusLoader could also implement CorpusSource
//   - The application layer only sees CorpusSource
//     and works with both without any changes
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;
use crate::domain::record::QaRecord;

// ─── CorpusSource ─────────────────────────────────────────────────────────────
/// Any component that can retrieve a labelled Q&A corpus by
/// dataset identifier.
///
/// Implementations:
///   - JsonCorpusLoader → reads a JSON/JSONL corpus file from disk
///   - (future) HubCorpusLoader → pulls from a dataset hub
pub trait CorpusSource {
    /// Load the full corpus for the given dataset identifier.
    /// Source unavailability is a fatal retrieval error — no retry.
    fn load(&self, dataset_id: &str) -> Result<Vec<QaRecord>>;
}

// ─── QuestionAnswerer ─────────────────────────────────────────────────────────
/// Any component that can answer natural language questions.
///
/// Implementations:
///   - RespondUseCase → beam-search generation from a snapshot
pub trait QuestionAnswerer {
    /// Given a question string, return the generated answer text.
    fn answer(&self, question: &str) -> Result<String>;
}

// ─── RelevanceGate ────────────────────────────────────────────────────────────
/// Decides whether generated text is in-domain. The default
/// implementation is a keyword scan; a trained classifier can be
/// substituted behind the same interface without changing the
/// rest of the pipeline.
pub trait RelevanceGate {
    /// True when the text should be shown to the user as-is.
    fn is_relevant(&self, text: &str) -> bool;
}
