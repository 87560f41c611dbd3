// ============================================================
// Layer 6 — Training Run Record
// ============================================================
// Records per-pass losses to a CSV file inside the run snapshot.
//
// Metrics recorded per pass:
//   - epoch:      the pass number (1, 2, 3, ...)
//   - train_loss: average cross-entropy loss on training batches
//   - val_loss:   average cross-entropy loss on validation batches
//
// Output file: models/<run-name>/metrics.csv
//
// Example CSV output:
//   epoch,train_loss,val_loss
//   1,3.124500,3.089200
//   2,2.890100,2.854300
//   ...
//
// How to read the metrics:
//   - Loss should decrease each pass (model is learning)
//   - If val_loss rises while train_loss falls → overfitting
//
// Reference: Rust Book §12 (I/O and File Handling)

use anyhow::Result;
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};
use serde::{Deserialize, Serialize};

/// One row of the training run record — the losses of one pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// The pass number (starts at 1)
    pub epoch: usize,

    /// Average cross-entropy loss over all training batches
    pub train_loss: f64,

    /// Average cross-entropy loss on the validation set
    /// Should track train_loss — divergence indicates overfitting
    pub val_loss: f64,
}

impl EpochMetrics {
    /// Create a new EpochMetrics record
    pub fn new(epoch: usize, train_loss: f64, val_loss: f64) -> Self {
        Self { epoch, train_loss, val_loss }
    }

    /// Returns true if this pass improved over the previous best val_loss
    pub fn is_improvement(&self, best_val_loss: f64) -> bool {
        self.val_loss < best_val_loss
    }
}

/// Appends pass metrics to a CSV file for later analysis.
pub struct MetricsLogger {
    /// Full path to the CSV file
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create a new MetricsLogger.
    /// Writes the CSV header if the file doesn't exist yet.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let csv_path = dir.join("metrics.csv");

        // Write the header only for a new file, so a rerun with the
        // same run name appends rather than overwrites
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)?;
            writeln!(f, "epoch,train_loss,val_loss")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    /// Append one pass's metrics as a new row in the CSV.
    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)?;

        writeln!(
            f,
            "{},{:.6},{:.6}",
            m.epoch,
            m.train_loss,
            m.val_loss,
        )?;

        tracing::debug!(
            "Logged pass {} metrics: train_loss={:.4}, val_loss={:.4}",
            m.epoch,
            m.train_loss,
            m.val_loss,
        );

        Ok(())
    }

    /// Return the path to the metrics CSV file
    pub fn csv_path(&self) -> &PathBuf {
        &self.csv_path
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_improvement() {
        let m = EpochMetrics::new(2, 2.5, 2.3);
        // 2.3 < 3.0 → this is an improvement
        assert!(m.is_improvement(3.0));
        // 2.3 is NOT less than 2.0 → not an improvement
        assert!(!m.is_improvement(2.0));
    }

    #[test]
    fn test_log_appends_rows() {
        let tmp    = tempfile::tempdir().unwrap();
        let logger = MetricsLogger::new(tmp.path()).unwrap();

        logger.log(&EpochMetrics::new(1, 3.1, 3.0)).unwrap();
        logger.log(&EpochMetrics::new(2, 2.8, 2.9)).unwrap();

        let content = fs::read_to_string(logger.csv_path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "epoch,train_loss,val_loss");
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("1,3.1"));
        assert!(lines[2].starts_with("2,2.8"));
    }
}
