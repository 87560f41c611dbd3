// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Handles all cross-cutting concerns that don't belong in
// any specific business layer:
//
//   checkpoint.rs      — Model snapshot saving and loading.
//                        Uses Burn's CompactRecorder to serialise
//                        model parameters, plus a JSON config so
//                        later stages can rebuild the exact
//                        architecture. One directory per run name.
//
//   tokenizer_store.rs — Tokenizer persistence.
//                        Builds a word-level tokenizer from the
//                        corpus when no pretrained one exists, or
//                        loads a previously saved tokenizer.json.
//                        Ensures the same vocabulary is used for
//                        training, evaluation and answering.
//
//   metrics.rs         — Training run record.
//                        Appends per-pass train/validation loss to
//                        a CSV file for later plotting/analysis.
//
// Reference: Rust Book §7 (Modules)
//            Burn Book §5 (Checkpointing)

/// Model snapshot saving and loading
pub mod checkpoint;

/// Tokenizer building, saving, and loading
pub mod tokenizer_store;

/// Per-pass loss CSV logger
pub mod metrics;
