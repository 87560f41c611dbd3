// ============================================================
// Layer 5 — Fine-Tuning Loop
// ============================================================
// Full train + validation loop using Burn's DataLoader and Adam.
//
// Backend notes:
//   - Training uses Autodiff<Wgpu> for gradients
//   - model.valid() returns the model on the inner backend (Wgpu)
//   - Validation batches must also use the inner backend, so no
//     autodiff bookkeeping happens while measuring validation loss
//
// Training batches are shuffled with the run seed; validation
// batches keep their fixed order. One snapshot is written after
// the final pass (or at the early-stopping pass when --patience
// is set) — never per pass.
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use anyhow::Result;
use burn::{
    data::dataloader::DataLoaderBuilder,
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::application::train_use_case::TrainConfig;
use crate::data::{batcher::Seq2SeqBatcher, dataset::Seq2SeqDataset};
use crate::infra::checkpoint::SnapshotManager;
use crate::infra::metrics::{EpochMetrics, MetricsLogger};
use crate::ml::model::{Seq2SeqConfig, Seq2SeqModel};

type TrainBackend = burn::backend::Autodiff<burn::backend::Wgpu>;

/// Fine-tune on the training split, measuring validation loss once
/// per pass, and persist one snapshot at the end. Returns the
/// per-pass loss record.
///
/// `base` holds the pretrained checkpoint to start from; `None`
/// starts from freshly initialized parameters.
pub fn run_training(
    cfg:           &TrainConfig,
    train_dataset: Seq2SeqDataset,
    val_dataset:   Seq2SeqDataset,
    base:          Option<&SnapshotManager>,
    snapshot:      &SnapshotManager,
    logger:        &MetricsLogger,
) -> Result<Vec<EpochMetrics>> {
    // Refuse to produce an untrained snapshot — checked before any
    // device work so the failure is immediate.
    anyhow::ensure!(
        train_dataset.example_count() > 0,
        "training split is empty — refusing to produce an untrained snapshot"
    );

    let device = burn::backend::wgpu::WgpuDevice::default();
    tracing::info!("Using WGPU device: {:?}", device);
    train_loop::<TrainBackend>(cfg, train_dataset, val_dataset, base, snapshot, logger, device)
}

fn train_loop<B: AutodiffBackend>(
    cfg:           &TrainConfig,
    train_dataset: Seq2SeqDataset,
    val_dataset:   Seq2SeqDataset,
    base:          Option<&SnapshotManager>,
    snapshot:      &SnapshotManager,
    logger:        &MetricsLogger,
    device:        B::Device,
) -> Result<Vec<EpochMetrics>> {

    // ── Build model ───────────────────────────────────────────────────────────
    let model_cfg = Seq2SeqConfig::new(
        cfg.vocab_size, cfg.max_seq_len, cfg.d_model, cfg.num_heads,
        cfg.num_encoder_layers, cfg.num_decoder_layers, cfg.d_ff, cfg.dropout,
    );
    let mut model: Seq2SeqModel<B> = model_cfg.init(&device);

    // Fine-tuning starts from the base checkpoint's parameters;
    // without one this is a from-scratch run.
    if let Some(base) = base {
        model = base.load_model(model, &device)?;
        tracing::info!("Loaded base checkpoint '{}'", base.dir().display());
    } else {
        tracing::info!("No base checkpoint — training from fresh parameters");
    }
    tracing::info!(
        "Model ready: {}+{} layers, d_model={}, vocab={}",
        cfg.num_encoder_layers, cfg.num_decoder_layers, cfg.d_model, cfg.vocab_size,
    );

    // ── Adam optimiser ────────────────────────────────────────────────────────
    // m = β1*m + (1-β1)*g        (mean)
    // v = β2*v + (1-β2)*g²       (variance)
    // θ = θ - lr * m / (√v + ε)  (update)
    let optim_cfg = AdamConfig::new().with_epsilon(1e-8);
    let mut optim = optim_cfg.init();

    // ── Training data loader (AutodiffBackend, shuffled per pass) ─────────────
    let train_batcher = Seq2SeqBatcher::<B>::new(device.clone());
    let train_loader  = DataLoaderBuilder::new(train_batcher)
        .batch_size(cfg.batch_size)
        .shuffle(cfg.seed)
        .num_workers(1)
        .build(train_dataset);

    // ── Validation data loader (InnerBackend, fixed order) ────────────────────
    let val_batcher = Seq2SeqBatcher::<B::InnerBackend>::new(device.clone());
    let val_loader  = DataLoaderBuilder::new(val_batcher)
        .batch_size(cfg.batch_size)
        .num_workers(1)
        .build(val_dataset);

    // ── Pass loop ─────────────────────────────────────────────────────────────
    let mut history: Vec<EpochMetrics> = Vec::with_capacity(cfg.epochs);
    let mut best_val_loss = f64::INFINITY;
    let mut stale_passes  = 0usize;

    for epoch in 1..=cfg.epochs {

        // ── Training phase ────────────────────────────────────────────────────
        let mut train_loss_sum = 0.0f64;
        let mut train_batches  = 0usize;

        for batch in train_loader.iter() {
            let loss = model.forward_training(
                batch.input_ids,
                batch.attention_mask,
                batch.labels,
            );

            let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();
            train_loss_sum += loss_val;
            train_batches  += 1;

            // Backward pass + Adam update
            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(cfg.lr, model, grads);
        }

        let avg_train_loss = if train_batches > 0 {
            train_loss_sum / train_batches as f64
        } else { f64::NAN };

        // ── Validation phase ──────────────────────────────────────────────────
        // model.valid() → Seq2SeqModel<B::InnerBackend>
        // no autodiff graph, no parameter updates, dropout disabled
        let model_valid = model.valid();

        let mut val_loss_sum = 0.0f64;
        let mut val_batches  = 0usize;

        for batch in val_loader.iter() {
            let loss = model_valid.forward_training(
                batch.input_ids,
                batch.attention_mask,
                batch.labels,
            );
            val_loss_sum += loss.into_scalar().elem::<f64>();
            val_batches  += 1;
        }

        let avg_val_loss = if val_batches > 0 {
            val_loss_sum / val_batches as f64
        } else { f64::NAN };

        println!(
            "Pass {:>3}/{} | train_loss={:.4} | val_loss={:.4}",
            epoch, cfg.epochs, avg_train_loss, avg_val_loss,
        );

        let metrics = EpochMetrics::new(epoch, avg_train_loss, avg_val_loss);
        logger.log(&metrics)?;
        history.push(metrics);

        // ── Optional early stopping ───────────────────────────────────────────
        // Off by default: the documented stopping policy is the fixed
        // pass count above.
        if let Some(patience) = cfg.patience {
            if avg_val_loss < best_val_loss {
                best_val_loss = avg_val_loss;
                stale_passes  = 0;
            } else {
                stale_passes += 1;
                if stale_passes >= patience {
                    tracing::info!(
                        "Validation loss has not improved for {} passes — stopping at pass {}",
                        patience, epoch,
                    );
                    break;
                }
            }
        }
    }

    // ── Persist one immutable snapshot ────────────────────────────────────────
    snapshot.save_model(&model)?;
    tracing::info!("Snapshot saved to '{}'", snapshot.dir().display());

    // Model and device buffers drop here, before any later stage
    // acquires its own read-only copy.
    Ok(history)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_training_split_fails_fast() {
        let tmp      = tempfile::tempdir().unwrap();
        let snapshot = SnapshotManager::new(tmp.path(), "run");
        let logger   = MetricsLogger::new(snapshot.dir()).unwrap();

        let cfg = TrainConfig::default();
        let err = run_training(
            &cfg,
            Seq2SeqDataset::new(Vec::new()),
            Seq2SeqDataset::new(Vec::new()),
            None,
            &snapshot,
            &logger,
        )
        .unwrap_err();

        assert!(err.to_string().contains("training split is empty"));
        // No snapshot may exist after the failure
        assert!(!snapshot.has_weights());
    }
}
