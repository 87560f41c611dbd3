// ============================================================
// Layer 2 — EvaluateUseCase
// ============================================================
// Scores a fine-tuned snapshot on held-out validation questions:
//
//   Step 1: Load the snapshot read-only   (Layer 6 - infra)
//   Step 2: Re-derive the validation set  (Layer 4 - data)
//   Step 3: Beam-search one answer per    (Layer 5 - ml)
//           sampled question
//   Step 4: Score BLEU + ROUGE            (eval)
//
// The sample is the FIRST N validation questions in split order —
// order matters so repeated evaluations score the same questions.
// Each reference is a single-element reference set. The only
// output is the returned report; nothing is written to disk.

use anyhow::Result;

use crate::data::{
    loader::JsonCorpusLoader,
    preprocessor::{frame_question, Preprocessor},
    splitter::split_train_val,
};
use crate::domain::report::EvaluationReport;
use crate::domain::traits::CorpusSource;
use crate::eval::text_metrics::{bleu, rouge};
use crate::infra::checkpoint::SnapshotManager;
use crate::ml::generator::{AnswerGenerator, GenerationParams};
use crate::ml::model::Seq2SeqConfig;

type InferBackend = burn::backend::Wgpu;

/// Everything the evaluator needs to know about a run.
#[derive(Debug, Clone)]
pub struct EvaluateConfig {
    pub run_name:    String,
    pub models_dir:  String,
    pub data_dir:    String,
    /// None = the dataset recorded in the snapshot config
    pub dataset_id:  Option<String>,
    pub sample_size: usize,
    pub beam_width:  usize,
    pub max_gen_len: usize,
}

pub struct EvaluateUseCase {
    config: EvaluateConfig,
}

impl EvaluateUseCase {
    pub fn new(config: EvaluateConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<EvaluationReport> {
        let cfg = &self.config;

        // ── Step 1: Load the snapshot read-only ───────────────────────────────
        // The device is scoped to this use case; training released
        // its own context when it returned.
        let snapshot  = SnapshotManager::new(&cfg.models_dir, cfg.run_name.clone());
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
            // Dropout off for deterministic generation
            0.0,
        );
        let model = model_cfg.init::<InferBackend>(&device);
        let model = snapshot.load_model(model, &device)?;
        tracing::info!("Loaded snapshot '{}'", cfg.run_name);

        let generator = AnswerGenerator::new(
            model,
            device,
            &tokenizer,
            GenerationParams::new(cfg.beam_width, cfg.max_gen_len),
        )?;

        // ── Step 2: Re-derive the validation split ────────────────────────────
        // Same corpus, same fraction, same seed as training → the
        // identical held-out set, guaranteed disjoint from training.
        let dataset_id = cfg
            .dataset_id
            .as_deref()
            .unwrap_or(&train_cfg.dataset_id);
        let loader  = JsonCorpusLoader::new(&cfg.data_dir);
        let records = loader.load(dataset_id)?;
        let (_, val_records) =
            split_train_val(records, train_cfg.train_fraction, train_cfg.seed);

        let sample: Vec<_> = val_records.iter().take(cfg.sample_size).collect();
        anyhow::ensure!(
            !sample.is_empty(),
            "validation split is empty — nothing to evaluate"
        );
        tracing::info!("Generating answers for {} validation questions", sample.len());

        // ── Step 3: Generate one answer per sampled question ──────────────────
        // Inputs are framed and tokenized exactly as in training.
        let preprocessor = Preprocessor::new(tokenizer.clone(), train_cfg.max_seq_len)?;

        let mut predictions: Vec<String>   = Vec::with_capacity(sample.len());
        let mut references: Vec<Vec<String>> = Vec::with_capacity(sample.len());

        for record in &sample {
            let framed = frame_question(record.question_text());
            let (input_ids, attention_mask) = preprocessor.encode_input(&framed)?;

            let answer = generator.generate(&input_ids, &attention_mask, &tokenizer)?;
            tracing::debug!("Q: {} → A: {}", record.question_text(), answer);

            predictions.push(answer);
            references.push(vec![record.answer_text().to_string()]);
        }

        // ── Step 4: Score ─────────────────────────────────────────────────────
        let bleu_score   = bleu(&predictions, &references);
        let rouge_scores = rouge(&predictions, &references);

        Ok(EvaluationReport {
            sample_size: predictions.len(),
            bleu:        bleu_score,
            rouge1:      rouge_scores.rouge1,
            rouge2:      rouge_scores.rouge2,
            rouge_l:     rouge_scores.rouge_l,
        })
    }
}
