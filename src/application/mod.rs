// ============================================================
// Layer 2 — Application Layer (Use Cases)
// ============================================================
// One use case per CLI command. Each orchestrates the lower
// layers end to end and owns its own device/resource scope:
// the training device is released when TrainUseCase::execute
// returns, before the evaluator or responder acquires its own
// read-only model copy.
//
//   train_use_case.rs    — load → split → preprocess → fine-tune
//                          → persist one snapshot
//   evaluate_use_case.rs — reload snapshot → generate for a
//                          validation sample → BLEU/ROUGE report
//   respond_use_case.rs  — one question in, one gated answer out

/// Fine-tuning pipeline orchestration
pub mod train_use_case;

/// Snapshot evaluation with BLEU/ROUGE
pub mod evaluate_use_case;

/// Single-question answering with the domain gate
pub mod respond_use_case;
