// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// This layer contains ALL Burn framework specific code.
// No other layer imports from burn directly — only this one
// and the thin tensor plumbing in data/batcher.rs.
//
// What's in this layer:
//
//   model.rs     — The encoder-decoder transformer
//                  • Shared token embeddings
//                  • Learned positional embeddings
//                  • Encoder stack (self-attention + FFN)
//                  • Decoder stack (causal self-attention,
//                    cross-attention over the encoder output, FFN)
//                  • LM head projecting to the vocabulary
//                  • Teacher-forced cross-entropy loss with
//                    padding positions excluded
//
//   trainer.rs   — The fine-tuning loop
//                  Shuffled training batches, fixed-order
//                  validation batches, per-pass loss record,
//                  one snapshot written after the final pass
//
//   generator.rs — Beam search decoding
//                  Keeps the top-k partial sequences per step,
//                  stops on the end-of-sequence token, decodes
//                  ids back to text
//
// Reference: Vaswani et al. (2017) Attention Is All You Need
//            Raffel et al. (2020) T5
//            Burn Book §3 (Building Blocks), §5 (Training)

/// Encoder-decoder transformer architecture
pub mod model;

/// Fine-tuning loop with validation and snapshotting
pub mod trainer;

/// Beam search answer generation
pub mod generator;
