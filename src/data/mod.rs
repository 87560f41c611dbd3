// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// This layer handles everything from the raw corpus file
// all the way to GPU-ready tensor batches.
//
// The pipeline flows in this order:
//
//   corpus file (JSON/JSONL)
//       │
//       ▼
//   JsonCorpusLoader  → reads records by dataset identifier
//       │
//       ▼
//   split_train_val   → seeded deterministic 80/20 partition
//       │
//       ▼
//   Preprocessor      → placeholders, prompt framing, token ids
//       │
//       ▼
//   Seq2SeqDataset    → implements Burn's Dataset trait
//       │
//       ▼
//   Seq2SeqBatcher    → stacks examples into tensor batches
//       │
//       ▼
//   DataLoader        → feeds batches to the training loop
//
// Each module is responsible for exactly one step.
// This makes each step independently testable and replaceable.
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Loads corpus records from JSON/JSONL files
pub mod loader;

/// Deterministic seeded train/validation split
pub mod splitter;

/// Prompt framing and fixed-length tokenization
pub mod preprocessor;

/// Implements Burn's Dataset trait for encoded examples
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;
