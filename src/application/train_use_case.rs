// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full fine-tuning pipeline in order:
//
//   Step 1: Load the Q&A corpus         (Layer 4 - data)
//   Step 2: Split train/validation      (Layer 4 - data)
//   Step 3: Resolve tokenizer + shape   (Layer 6 - infra)
//   Step 4: Encode fixed-length batches (Layer 4 - data)
//   Step 5: Build datasets              (Layer 4 - data)
//   Step 6: Persist config + tokenizer  (Layer 6 - infra)
//   Step 7: Run the fine-tuning loop    (Layer 5 - ml)
//
// Reference: Burn Book §5 (Training)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::{
    loader::JsonCorpusLoader,
    preprocessor::{frame_question, Preprocessor},
    dataset::Seq2SeqDataset,
    splitter::split_train_val,
};
use crate::domain::traits::CorpusSource;
use crate::infra::{
    checkpoint::SnapshotManager,
    metrics::MetricsLogger,
};
use crate::ml::trainer::run_training;

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters for a fine-tuning run.
// Serialisable so it can be saved into the snapshot and reloaded
// by the evaluator/responder to rebuild the same architecture.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub dataset_id:         String,
    pub data_dir:           String,
    pub models_dir:         String,
    pub run_name:           String,
    /// Pretrained checkpoint to start from; None = from scratch
    pub base_model:         Option<String>,
    pub seed:               u64,
    pub train_fraction:     f64,
    pub max_seq_len:        usize,
    pub batch_size:         usize,
    pub epochs:             usize,
    pub lr:                 f64,
    /// Early-stopping patience in passes; None = fixed pass count
    pub patience:           Option<usize>,
    pub d_model:            usize,
    pub num_heads:          usize,
    pub num_encoder_layers: usize,
    pub num_decoder_layers: usize,
    pub d_ff:               usize,
    pub dropout:            f64,
    pub vocab_size:         usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            dataset_id:         "KisanVaani/agriculture-qa-english-only".to_string(),
            data_dir:           "data".to_string(),
            models_dir:         "models".to_string(),
            run_name:           "fine_tuned_t5_agriculture".to_string(),
            base_model:         Some("t5-base".to_string()),
            seed:               42,
            train_fraction:     0.8,
            max_seq_len:        128,
            batch_size:         8,
            epochs:             21,
            lr:                 2e-5,
            patience:           None,
            d_model:            256,
            num_heads:          8,
            num_encoder_layers: 6,
            num_decoder_layers: 6,
            d_ff:               1024,
            dropout:            0.1,
            vocab_size:         32000,
        }
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
// Owns the config and runs the full fine-tuning pipeline.
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    /// Create a new TrainUseCase with the given configuration
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full fine-tuning pipeline end to end
    pub fn execute(&self) -> Result<()> {
        // Architecture fields may be overwritten from the base
        // checkpoint below; the resolved copy is what gets saved.
        let mut cfg = self.config.clone();

        // ── Step 1: Load the labelled corpus ──────────────────────────────────
        // Missing or unreadable corpus is a fatal retrieval error.
        tracing::info!("Loading corpus '{}' from '{}'", cfg.dataset_id, cfg.data_dir);
        let loader  = JsonCorpusLoader::new(&cfg.data_dir);
        let records = loader.load(&cfg.dataset_id)?;
        tracing::info!("Loaded {} records", records.len());

        // ── Step 2: Deterministic train/validation split ──────────────────────
        // The seed is recorded in the snapshot config so evaluation
        // later re-derives the identical validation set.
        let (train_records, val_records) =
            split_train_val(records, cfg.train_fraction, cfg.seed);
        tracing::info!(
            "Split: {} train, {} validation (seed {})",
            train_records.len(),
            val_records.len(),
            cfg.seed,
        );

        // ── Step 3: Resolve tokenizer and architecture ────────────────────────
        // With a base checkpoint, its config dictates the model shape
        // and its tokenizer is reused. From scratch, a word-level
        // tokenizer is built from the framed corpus.
        let snapshot = SnapshotManager::new(&cfg.models_dir, &cfg.run_name);
        let base = cfg
            .base_model
            .as_ref()
            .map(|id| SnapshotManager::new(&cfg.models_dir, id.clone()));

        let tokenizer = match &base {
            Some(base_snap) => {
                let base_cfg = base_snap.load_config().with_context(|| {
                    format!(
                        "Base checkpoint '{}' is not installed under '{}' — \
                         add its assets or pass --from-scratch",
                        base_snap.name(),
                        cfg.models_dir,
                    )
                })?;
                cfg.max_seq_len        = base_cfg.max_seq_len;
                cfg.d_model            = base_cfg.d_model;
                cfg.num_heads          = base_cfg.num_heads;
                cfg.num_encoder_layers = base_cfg.num_encoder_layers;
                cfg.num_decoder_layers = base_cfg.num_decoder_layers;
                cfg.d_ff               = base_cfg.d_ff;

                base_snap.tokenizer_store().load().with_context(|| {
                    format!("Base checkpoint '{}' has no tokenizer", base_snap.name())
                })?
            }
            None => {
                // Vocabulary over exactly what the model will see:
                // framed questions plus raw answers.
                let texts: Vec<String> = train_records
                    .iter()
                    .chain(val_records.iter())
                    .flat_map(|r| {
                        [
                            frame_question(r.question_text()),
                            r.answer_text().to_string(),
                        ]
                    })
                    .collect();
                snapshot.tokenizer_store().load_or_build(&texts, cfg.vocab_size)?
            }
        };

        // The embedding and LM-head sizes must match the vocabulary
        cfg.vocab_size = tokenizer.get_vocab_size(true);

        // ── Step 4: Encode fixed-length examples ──────────────────────────────
        let preprocessor   = Preprocessor::new(tokenizer.clone(), cfg.max_seq_len)?;
        let train_examples = preprocessor.encode_batch(&train_records)?;
        let val_examples   = preprocessor.encode_batch(&val_records)?;
        tracing::info!(
            "Encoded {} train / {} validation examples at length {}",
            train_examples.len(),
            val_examples.len(),
            cfg.max_seq_len,
        );

        // ── Step 5: Build Burn datasets ───────────────────────────────────────
        let train_dataset = Seq2SeqDataset::new(train_examples);
        let val_dataset   = Seq2SeqDataset::new(val_examples);

        // ── Step 6: Persist config + tokenizer into the snapshot ──────────────
        // Saved before training so the snapshot directory is always
        // self-describing once the weights land next to them.
        snapshot.save_config(&cfg)?;
        snapshot.tokenizer_store().save(&tokenizer)?;

        // ── Step 7: Run the fine-tuning loop (Layer 5) ────────────────────────
        let logger  = MetricsLogger::new(snapshot.dir())?;
        let history = run_training(
            &cfg,
            train_dataset,
            val_dataset,
            base.as_ref(),
            &snapshot,
            &logger,
        )?;

        if let Some(last) = history.last() {
            tracing::info!(
                "Finished after {} passes: train_loss={:.4}, val_loss={:.4} (record: {})",
                last.epoch,
                last.train_loss,
                last.val_loss,
                logger.csv_path().display(),
            );
        }

        Ok(())
    }
}
