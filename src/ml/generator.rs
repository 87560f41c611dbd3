// ============================================================
// Layer 5 — Beam Search Generator
// ============================================================
// Decodes one answer from a framed input using beam search:
// the top-k partial output sequences are kept at every step and
// extended token by token until they emit the end-of-sequence
// token or hit the length limit.
//
// The per-step distribution is read back to the host as Vec<f32>
// and the search bookkeeping happens in plain Rust; only the
// encoder/decoder forward passes run on the device.
//
// Reference: Sutskever et al. (2014) — seq2seq with beam decoding

use anyhow::Result;
use burn::prelude::*;
use tokenizers::Tokenizer;

use crate::data::preprocessor::EOS_MARKER;
use crate::ml::model::Seq2SeqModel;

/// Decoding parameters, shared by the evaluator and the responder.
#[derive(Debug, Clone, Copy)]
pub struct GenerationParams {
    /// Number of partial sequences kept per step
    pub beam_width: usize,
    /// Maximum number of generated tokens
    pub max_len: usize,
}

impl GenerationParams {
    pub fn new(beam_width: usize, max_len: usize) -> Self {
        Self { beam_width, max_len }
    }
}

impl Default for GenerationParams {
    fn default() -> Self {
        // Matches the original experiment: 4 beams, 128 tokens
        Self { beam_width: 4, max_len: 128 }
    }
}

/// One partial output sequence under consideration.
#[derive(Debug, Clone)]
struct Beam {
    /// Decoder token ids, starting with the pad/start token
    ids: Vec<i32>,
    /// Cumulative log-probability of the generated tokens
    score: f64,
    /// True once the end-of-sequence token was emitted
    finished: bool,
}

impl Beam {
    /// Length-normalized score used for the final ranking, so
    /// longer answers are not penalized for accumulating more
    /// log-probability terms.
    fn normalized_score(&self) -> f64 {
        let generated = self.ids.len().saturating_sub(1).max(1);
        self.score / generated as f64
    }
}

/// Generates answers from a fine-tuned model, read-only.
pub struct AnswerGenerator<B: Backend> {
    model:  Seq2SeqModel<B>,
    device: B::Device,
    params: GenerationParams,
    pad_id: u32,
    eos_id: u32,
}

impl<B: Backend> AnswerGenerator<B> {
    pub fn new(
        model:     Seq2SeqModel<B>,
        device:    B::Device,
        tokenizer: &Tokenizer,
        params:    GenerationParams,
    ) -> Result<Self> {
        let pad_id = tokenizer
            .token_to_id("<pad>")
            .ok_or_else(|| anyhow::anyhow!("Tokenizer has no <pad> token"))?;
        let eos_id = tokenizer
            .token_to_id(EOS_MARKER)
            .ok_or_else(|| anyhow::anyhow!("Tokenizer has no {EOS_MARKER} token"))?;
        Ok(Self { model, device, params, pad_id, eos_id })
    }

    /// Generate one answer for an already-encoded framed input.
    /// `input_ids` and `attention_mask` are the fixed-length
    /// sequences produced by the Preprocessor.
    pub fn generate(
        &self,
        input_ids:      &[u32],
        attention_mask: &[u32],
        tokenizer:      &Tokenizer,
    ) -> Result<String> {
        let seq_len = input_ids.len();

        let ids_flat: Vec<i32>  = input_ids.iter().map(|&x| x as i32).collect();
        let mask_flat: Vec<i32> = attention_mask.iter().map(|&x| x as i32).collect();

        let input = Tensor::<B, 1, Int>::from_ints(ids_flat.as_slice(), &self.device)
            .reshape([1, seq_len]);
        let mask = Tensor::<B, 1, Int>::from_ints(mask_flat.as_slice(), &self.device)
            .reshape([1, seq_len]);

        // The source is encoded exactly once; every beam reuses it.
        let src_pad_mask = mask.equal_elem(0);
        let encoder_out  = self.model.encode(input, src_pad_mask.clone());

        let mut beams = vec![Beam {
            ids:      vec![self.pad_id as i32],
            score:    0.0,
            finished: false,
        }];

        // The decoder prefix read at step i is 1 + i tokens long
        // (start token + generated so far); it must stay inside the
        // position-embedding table.
        let max_steps = self.params.max_len.min(self.model.max_seq_len);

        for _ in 0..max_steps {
            if beams.iter().all(|b| b.finished) {
                break;
            }

            let mut candidates: Vec<Beam> = Vec::new();

            for beam in &beams {
                if beam.finished {
                    // Finished beams compete unchanged against new expansions
                    candidates.push(beam.clone());
                    continue;
                }

                let log_probs = self.next_token_log_probs(beam, &encoder_out, &src_pad_mask)?;

                for (token, log_prob) in top_k(&log_probs, self.params.beam_width) {
                    let mut ids = beam.ids.clone();
                    ids.push(token as i32);
                    candidates.push(Beam {
                        ids,
                        score:    beam.score + log_prob as f64,
                        finished: token as u32 == self.eos_id,
                    });
                }
            }

            // Keep the best beam_width candidates by cumulative score
            candidates.sort_by(|a, b| {
                b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal)
            });
            candidates.truncate(self.params.beam_width);
            beams = candidates;
        }

        let best = beams
            .into_iter()
            .max_by(|a, b| {
                a.normalized_score()
                    .partial_cmp(&b.normalized_score())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .ok_or_else(|| anyhow::anyhow!("Beam search produced no candidates"))?;

        // Drop the start token; decode strips <pad> and </s>
        let output_ids: Vec<u32> = best.ids[1..].iter().map(|&i| i as u32).collect();
        let text = tokenizer
            .decode(&output_ids, true)
            .map_err(|e| anyhow::anyhow!("Decode error: {e}"))?;

        Ok(text.trim().to_string())
    }

    /// One decoder forward pass for a beam; returns the host-side
    /// log-probabilities of the next token.
    fn next_token_log_probs(
        &self,
        beam:         &Beam,
        encoder_out:  &Tensor<B, 3>,
        src_pad_mask: &Tensor<B, 2, Bool>,
    ) -> Result<Vec<f32>> {
        let len = beam.ids.len();
        let decoder_ids = Tensor::<B, 1, Int>::from_ints(beam.ids.as_slice(), &self.device)
            .reshape([1, len]);

        let logits = self
            .model
            .decode(decoder_ids, encoder_out.clone(), src_pad_mask.clone());
        let [_, t, vocab] = logits.dims();

        let last: Vec<f32> = logits
            .slice([0..1, (t - 1)..t, 0..vocab])
            .reshape([vocab])
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| anyhow::anyhow!("Cannot read logits from device: {e:?}"))?;

        Ok(log_softmax_host(&last))
    }
}

/// Numerically stable log-softmax over a host-side logit row.
pub(crate) fn log_softmax_host(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let sum: f32 = logits.iter().map(|&l| (l - max).exp()).sum();
    let log_sum = max + sum.ln();
    logits.iter().map(|&l| l - log_sum).collect()
}

/// Indices and values of the k largest entries, best first.
/// k is tiny (the beam width), so a bounded insertion pass beats
/// sorting the whole vocabulary row.
pub(crate) fn top_k(values: &[f32], k: usize) -> Vec<(usize, f32)> {
    let mut best: Vec<(usize, f32)> = Vec::with_capacity(k + 1);

    for (idx, &v) in values.iter().enumerate() {
        let pos = best.partition_point(|&(_, s)| s >= v);
        if pos < k {
            best.insert(pos, (idx, v));
            if best.len() > k {
                best.pop();
            }
        }
    }

    best
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_softmax_is_normalized() {
        let log_probs = log_softmax_host(&[1.0, 2.0, 3.0]);
        let total: f32 = log_probs.iter().map(|lp| lp.exp()).sum();
        assert!((total - 1.0).abs() < 1e-5);
        // Ordering of the inputs is preserved
        assert!(log_probs[2] > log_probs[1] && log_probs[1] > log_probs[0]);
    }

    #[test]
    fn test_log_softmax_handles_large_values() {
        let log_probs = log_softmax_host(&[1000.0, 1001.0]);
        assert!(log_probs.iter().all(|lp| lp.is_finite()));
    }

    #[test]
    fn test_top_k_returns_best_first() {
        let picked = top_k(&[0.1, 0.9, 0.5, 0.7], 2);
        assert_eq!(picked.len(), 2);
        assert_eq!(picked[0].0, 1);
        assert_eq!(picked[1].0, 3);
    }

    #[test]
    fn test_top_k_with_short_input() {
        let picked = top_k(&[0.3], 4);
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].0, 0);
    }

    #[test]
    fn test_normalized_score_prefers_probable_tokens() {
        let short = Beam { ids: vec![0, 7], score: -1.0, finished: true };
        let long  = Beam { ids: vec![0, 7, 8, 9], score: -1.5, finished: true };
        // -1.0 over one token vs -0.5 per token over three
        assert!(long.normalized_score() > short.normalized_score());
    }
}
