// ============================================================
// Layer 4 — Seq2Seq Batcher
// ============================================================
// Implements Burn's Batcher trait to convert a Vec<EncodedExample>
// into GPU-ready tensors.
//
// How batching works here:
//   Input:  Vec of N examples, each with sequences of length S
//   Output: Seq2SeqBatch with tensors of shape [N, S]
//
//   We flatten all ids into one long Vec, then reshape:
//   [s1_t1, s1_t2, ..., s1_tS, s2_t1, ..., sN_tS] → [N, S]
//
// All sequences are already padded to the same length by the
// Preprocessor, so no dynamic padding is needed at this point.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::EncodedExample;

// ─── Seq2SeqBatch ─────────────────────────────────────────────────────────────
/// A batch of examples ready for the model forward pass.
/// All tensors have batch_size as their first dimension.
///
/// B is the Burn Backend (e.g. Wgpu, NdArray) —
/// generic so the same batcher works on any device.
#[derive(Debug, Clone)]
pub struct Seq2SeqBatch<B: Backend> {
    /// Framed-input token ids — shape: [batch_size, seq_len]
    pub input_ids: Tensor<B, 2, Int>,

    /// Attention masks — shape: [batch_size, seq_len]
    /// 1 = real token, 0 = padding
    pub attention_mask: Tensor<B, 2, Int>,

    /// Answer token ids — shape: [batch_size, seq_len]
    /// Padding positions are excluded from the loss
    pub labels: Tensor<B, 2, Int>,
}

// ─── Seq2SeqBatcher ───────────────────────────────────────────────────────────
/// The batcher struct — holds the target device so tensors
/// are created on the correct GPU/CPU.
#[derive(Clone, Debug)]
pub struct Seq2SeqBatcher<B: Backend> {
    /// The device to create tensors on (e.g. GPU index 0)
    pub device: B::Device,
}

impl<B: Backend> Seq2SeqBatcher<B> {
    /// Create a new batcher for the given device
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

// ─── Burn Batcher Trait Implementation ────────────────────────────────────────
// This is what makes Seq2SeqBatcher work with Burn's DataLoader.
// The DataLoader calls .batch(items) with each mini-batch of examples.
impl<B: Backend> Batcher<EncodedExample, Seq2SeqBatch<B>> for Seq2SeqBatcher<B> {
    /// Convert a Vec of examples into a single Seq2SeqBatch.
    ///
    /// Steps:
    ///   1. Flatten each field into one Vec<i32>
    ///      (Burn uses i32 for Int tensors)
    ///   2. Create a 1D tensor from the flat Vec
    ///   3. Reshape to [batch_size, seq_len]
    fn batch(&self, items: Vec<EncodedExample>) -> Seq2SeqBatch<B> {
        let batch_size = items.len();
        // All sequences have the same length (pre-padded)
        let seq_len    = items[0].input_ids.len();

        // ── Flatten input_ids ─────────────────────────────────────────────────
        let input_flat: Vec<i32> = items
            .iter()
            .flat_map(|ex| ex.input_ids.iter().map(|&x| x as i32))
            .collect();

        // ── Flatten attention_mask ────────────────────────────────────────────
        let mask_flat: Vec<i32> = items
            .iter()
            .flat_map(|ex| ex.attention_mask.iter().map(|&x| x as i32))
            .collect();

        // ── Flatten labels ────────────────────────────────────────────────────
        let label_flat: Vec<i32> = items
            .iter()
            .flat_map(|ex| ex.labels.iter().map(|&x| x as i32))
            .collect();

        // ── Create tensors ────────────────────────────────────────────────────
        let input_ids = Tensor::<B, 1, Int>::from_ints(
            input_flat.as_slice(), &self.device
        ).reshape([batch_size, seq_len]);

        let attention_mask = Tensor::<B, 1, Int>::from_ints(
            mask_flat.as_slice(), &self.device
        ).reshape([batch_size, seq_len]);

        let labels = Tensor::<B, 1, Int>::from_ints(
            label_flat.as_slice(), &self.device
        ).reshape([batch_size, seq_len]);

        Seq2SeqBatch { input_ids, attention_mask, labels }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    fn example(fill: u32, len: usize) -> EncodedExample {
        EncodedExample {
            input_ids:      vec![fill; len],
            attention_mask: vec![1; len],
            labels:         vec![fill + 1; len],
        }
    }

    #[test]
    fn test_batch_shapes() {
        let batcher = Seq2SeqBatcher::<NdArray>::new(Default::default());
        let batch   = batcher.batch(vec![example(3, 8), example(5, 8)]);

        assert_eq!(batch.input_ids.dims(), [2, 8]);
        assert_eq!(batch.attention_mask.dims(), [2, 8]);
        assert_eq!(batch.labels.dims(), [2, 8]);
    }
}
