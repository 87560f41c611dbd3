// ============================================================
// Layer 2 — RespondUseCase
// ============================================================
// Turns one free-text question into one generated answer:
// frame with the training template, beam-search an answer from a
// read-only snapshot, then pass the text through the relevance
// gate. Off-domain output is replaced by a fixed refusal string.
//
// This is the operation a chat front end would call per user
// turn: non-empty question in, answer-or-refusal out. Past
// construction it never returns an error — a generation failure
// degrades to the refusal string.
//
// The gate is a keyword scan over the GENERATED text, not the
// question: a gardening model answers weather questions with
// whatever it can, so the output is what gets checked. It is a
// best-effort heuristic behind the RelevanceGate trait; swap in
// a classifier without touching anything else here.

use anyhow::Result;
use tokenizers::Tokenizer;

use crate::data::preprocessor::{frame_question, Preprocessor};
use crate::domain::traits::{QuestionAnswerer, RelevanceGate};
use crate::infra::checkpoint::SnapshotManager;
use crate::ml::generator::{AnswerGenerator, GenerationParams};
use crate::ml::model::Seq2SeqConfig;

type InferBackend = burn::backend::Wgpu;

/// Fixed response for output that fails the domain gate.
pub const REFUSAL: &str = "I can only answer agriculture questions.";

/// Keywords whose presence marks generated text as in-domain.
pub const DOMAIN_KEYWORDS: [&str; 3] = ["agriculture", "crop", "soil"];

// ─── KeywordGate ──────────────────────────────────────────────────────────────
/// Case-insensitive substring scan for a fixed keyword set.
pub struct KeywordGate {
    keywords: Vec<String>,
}

impl KeywordGate {
    pub fn new(keywords: &[&str]) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
        }
    }

    /// The default agriculture gate
    pub fn agriculture() -> Self {
        Self::new(&DOMAIN_KEYWORDS)
    }
}

impl RelevanceGate for KeywordGate {
    fn is_relevant(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.keywords.iter().any(|k| lower.contains(k.as_str()))
    }
}

/// Apply a gate to generated text: in-domain text passes through
/// unchanged, everything else becomes the fixed refusal.
pub fn gate_response(gate: &dyn RelevanceGate, generated: String) -> String {
    if gate.is_relevant(&generated) {
        generated
    } else {
        REFUSAL.to_string()
    }
}

// ─── RespondUseCase ───────────────────────────────────────────────────────────
pub struct RespondUseCase {
    generator:    AnswerGenerator<InferBackend>,
    preprocessor: Preprocessor,
    tokenizer:    Tokenizer,
    gate:         Box<dyn RelevanceGate>,
}

impl RespondUseCase {
    /// Load a snapshot read-only and build the responder over it.
    /// Snapshot problems surface here, not during answering.
    pub fn new(
        models_dir:  &str,
        run_name:    &str,
        beam_width:  usize,
        max_gen_len: usize,
    ) -> Result<Self> {
        let snapshot  = SnapshotManager::new(models_dir, run_name);
        let train_cfg = snapshot.load_config()?;
        let tokenizer = snapshot.tokenizer_store().load()?;

        let device = burn::backend::wgpu::WgpuDevice::default();
        let model_cfg = Seq2SeqConfig::new(
            train_cfg.vocab_size,
            train_cfg.max_seq_len,
            train_cfg.d_model,
            train_cfg.num_heads,
            train_cfg.num_encoder_layers,
            train_cfg.num_decoder_layers,
            train_cfg.d_ff,
            0.0,
        );
        let model = model_cfg.init::<InferBackend>(&device);
        let model = snapshot.load_model(model, &device)?;
        tracing::info!("Responder ready on snapshot '{}'", run_name);

        let generator = AnswerGenerator::new(
            model,
            device,
            &tokenizer,
            GenerationParams::new(beam_width, max_gen_len),
        )?;
        let preprocessor = Preprocessor::new(tokenizer.clone(), train_cfg.max_seq_len)?;

        Ok(Self {
            generator,
            preprocessor,
            tokenizer,
            gate: Box::new(KeywordGate::agriculture()),
        })
    }

    /// Replace the default keyword gate with another implementation
    pub fn with_gate(mut self, gate: Box<dyn RelevanceGate>) -> Self {
        self.gate = gate;
        self
    }

    /// Answer one question, gated. Never fails: generation errors
    /// are logged and collapse to the refusal string.
    pub fn respond(&self, question: &str) -> String {
        match self.generate_answer(question) {
            Ok(text) => gate_response(self.gate.as_ref(), text),
            Err(e) => {
                tracing::warn!("Generation failed: {e}");
                REFUSAL.to_string()
            }
        }
    }

    /// Raw (ungated) generation for one question.
    fn generate_answer(&self, question: &str) -> Result<String> {
        let framed = frame_question(question);
        let (input_ids, attention_mask) = self.preprocessor.encode_input(&framed)?;
        self.generator
            .generate(&input_ids, &attention_mask, &self.tokenizer)
    }
}

impl QuestionAnswerer for RespondUseCase {
    fn answer(&self, question: &str) -> Result<String> {
        self.generate_answer(question)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_off_domain_text_becomes_refusal() {
        let gate = KeywordGate::agriculture();
        // Generated text with none of {agriculture, crop, soil}
        let out = gate_response(&gate, "It will probably rain tomorrow.".to_string());
        assert_eq!(out, "I can only answer agriculture questions.");
    }

    #[test]
    fn test_in_domain_text_passes_through() {
        let gate   = KeywordGate::agriculture();
        let answer = "Rotate the crop each season to protect the soil.".to_string();
        assert_eq!(gate_response(&gate, answer.clone()), answer);
    }

    #[test]
    fn test_gate_is_case_insensitive() {
        let gate = KeywordGate::agriculture();
        assert!(gate.is_relevant("AGRICULTURE is the backbone of the economy"));
    }

    #[test]
    fn test_keyword_inside_word_counts() {
        // Substring scan by design: "croplands" contains "crop"
        let gate = KeywordGate::agriculture();
        assert!(gate.is_relevant("Vast croplands stretch to the horizon"));
    }

    #[test]
    fn test_custom_gate_keywords() {
        let gate = KeywordGate::new(&["vineyard"]);
        assert!(gate.is_relevant("The vineyard needs pruning"));
        assert!(!gate.is_relevant("Rotate the crop each season"));
    }

    #[test]
    fn test_empty_generation_refused() {
        let gate = KeywordGate::agriculture();
        assert_eq!(gate_response(&gate, String::new()), REFUSAL);
    }
}
