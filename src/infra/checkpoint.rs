// ============================================================
// Layer 6 — Snapshot Manager
// ============================================================
// Saves and restores model state using Burn's CompactRecorder.
//
// One directory per snapshot, identified by name:
//
//   models/
//     t5-base/                      ← pretrained base checkpoint
//       model.mpk.gz                   (weights, if installed)
//       train_config.json              (architecture)
//       tokenizer.json                 (vocabulary)
//     fine_tuned_t5_agriculture/    ← written by `train`
//       model.mpk.gz
//       train_config.json
//       tokenizer.json
//       metrics.csv
//
// The config JSON is saved separately so `evaluate`/`ask` can
// rebuild the exact architecture (d_model, layer counts, vocab
// size) before loading the weights into it. A snapshot is written
// once at the end of training and only ever read afterwards.
//
// Burn's CompactRecorder:
//   - Serialises model parameters to MessagePack format
//   - Compresses with gzip for smaller file size
//   - Type-safe: loading fails if the architecture doesn't match
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use std::{fs, path::{Path, PathBuf}};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};
use serde_json;

use crate::application::train_use_case::TrainConfig;
use crate::infra::tokenizer_store::TokenizerStore;
use crate::ml::model::Seq2SeqModel;

/// Manages one named snapshot directory.
pub struct SnapshotManager {
    /// Snapshot name (run name or base checkpoint identifier)
    name: String,
    /// Full path to the snapshot directory
    dir: PathBuf,
}

impl SnapshotManager {
    /// Create a manager for `<models_dir>/<name>`.
    /// Creates the directory if it doesn't already exist.
    pub fn new(models_dir: impl AsRef<Path>, name: impl Into<String>) -> Self {
        let name = name.into();
        let dir  = models_dir.as_ref().join(&name);
        // create_dir_all creates parent directories too, like `mkdir -p`
        fs::create_dir_all(&dir).ok();
        Self { name, dir }
    }

    /// The snapshot directory on disk
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The snapshot name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// True once model weights have been recorded here
    pub fn has_weights(&self) -> bool {
        self.dir.join("model.mpk.gz").exists()
    }

    /// A tokenizer store rooted in this snapshot directory
    pub fn tokenizer_store(&self) -> TokenizerStore {
        TokenizerStore::new(self.dir.clone())
    }

    /// Record the model parameters.
    ///
    /// Uses Burn's CompactRecorder which:
    ///   1. Calls model.into_record() to extract all parameters
    ///   2. Serialises to MessagePack binary format
    ///   3. Compresses with gzip
    ///   4. Writes to {dir}/model.mpk.gz
    pub fn save_model<B: Backend>(&self, model: &Seq2SeqModel<B>) -> Result<()> {
        // Build the file path (without extension — recorder adds it)
        let path = self.dir.join("model");

        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| {
                format!("Failed to save snapshot to '{}'", path.display())
            })?;

        tracing::debug!("Recorded model weights at '{}'", path.display());
        Ok(())
    }

    /// Restore weights into a freshly built model.
    ///
    /// The model parameter must have the correct architecture
    /// (matching the recorded weights) or loading will fail.
    pub fn load_model<B: Backend>(
        &self,
        model:  Seq2SeqModel<B>,
        device: &B::Device,
    ) -> Result<Seq2SeqModel<B>> {
        let path = self.dir.join("model");

        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!(
                    "Cannot load model weights from '{}'. \
                     Have you trained this run (or installed the base checkpoint)?",
                    path.display()
                )
            })?;

        // load_record() returns a new model with the loaded weights
        Ok(model.load_record(record))
    }

    /// Save the training configuration to JSON.
    ///
    /// This must happen before weights are recorded so a snapshot
    /// is always independently loadable: the config carries the
    /// architecture needed to rebuild the model.
    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        let path = self.dir.join("train_config.json");

        let json = serde_json::to_string_pretty(cfg)?;

        fs::write(&path, json)
            .with_context(|| {
                format!("Cannot write config to '{}'", path.display())
            })?;

        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    /// Load the training configuration from JSON.
    ///
    /// Called by the evaluator and responder to know what model
    /// architecture was used so they can rebuild the same model.
    pub fn load_config(&self) -> Result<TrainConfig> {
        let path = self.dir.join("train_config.json");

        let json = fs::read_to_string(&path)
            .with_context(|| {
                format!(
                    "Cannot read config from '{}'. \
                     Make sure you have run 'train' before 'evaluate'/'ask'.",
                    path.display()
                )
            })?;

        Ok(serde_json::from_str(&json)?)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_round_trip() {
        let tmp  = tempfile::tempdir().unwrap();
        let snap = SnapshotManager::new(tmp.path(), "run_a");

        let mut cfg = TrainConfig::default();
        cfg.epochs     = 3;
        cfg.vocab_size = 777;
        snap.save_config(&cfg).unwrap();

        let loaded = snap.load_config().unwrap();
        assert_eq!(loaded.epochs, 3);
        assert_eq!(loaded.vocab_size, 777);
        assert_eq!(loaded.run_name, cfg.run_name);
    }

    #[test]
    fn test_missing_config_mentions_training() {
        let tmp  = tempfile::tempdir().unwrap();
        let snap = SnapshotManager::new(tmp.path(), "untrained");
        let err  = snap.load_config().unwrap_err();
        assert!(err.to_string().contains("train"));
    }

    #[test]
    fn test_fresh_snapshot_has_no_weights() {
        let tmp  = tempfile::tempdir().unwrap();
        let snap = SnapshotManager::new(tmp.path(), "empty");
        assert!(!snap.has_weights());
    }
}
