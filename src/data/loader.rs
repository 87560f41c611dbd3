// ============================================================
// Layer 4 — Corpus Loader
// ============================================================
// Retrieves the labelled Q&A corpus for a dataset identifier.
//
// An identifier like "KisanVaani/agriculture-qa-english-only" is
// mapped to a filesystem-safe name and resolved against the data
// directory, trying two layouts:
//
//   <data_dir>/<id>.jsonl   — one JSON record per line
//   <data_dir>/<id>.json    — a single JSON array of records
//
// Records carry (question, answers) text fields. Rows with missing
// fields are kept — placeholder substitution happens later in the
// Preprocessor. Rows that are not valid JSON at all are skipped
// with a warning; a missing or unreadable corpus file is a fatal
// retrieval error with no retry.
//
// Reference: Rust Book §9 (Error Handling), §12 (I/O)

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::domain::record::QaRecord;
use crate::domain::traits::CorpusSource;

/// Loads corpus records from JSON/JSONL files in a directory.
/// Implements the CorpusSource trait from Layer 3.
pub struct JsonCorpusLoader {
    /// Path to the directory containing corpus files
    dir: PathBuf,
}

impl JsonCorpusLoader {
    /// Create a new loader pointed at a data directory
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Map a dataset identifier to a filesystem-safe file stem.
    /// Hub-style identifiers contain a slash ("org/name").
    fn file_stem(dataset_id: &str) -> String {
        dataset_id.replace('/', "__")
    }

    /// Resolve the corpus file for an identifier, preferring the
    /// line-delimited layout.
    fn resolve(&self, dataset_id: &str) -> Option<PathBuf> {
        let stem = Self::file_stem(dataset_id);
        for ext in ["jsonl", "json"] {
            let candidate = self.dir.join(format!("{stem}.{ext}"));
            if candidate.exists() {
                return Some(candidate);
            }
        }
        None
    }
}

impl CorpusSource for JsonCorpusLoader {
    fn load(&self, dataset_id: &str) -> Result<Vec<QaRecord>> {
        let path = self.resolve(dataset_id).with_context(|| {
            format!(
                "Corpus for dataset '{}' not found under '{}' (expected '{}.jsonl' or '{}.json')",
                dataset_id,
                self.dir.display(),
                Self::file_stem(dataset_id),
                Self::file_stem(dataset_id),
            )
        })?;

        let records = load_corpus_file(&path)?;
        tracing::info!(
            "Loaded {} records for dataset '{}' from '{}'",
            records.len(),
            dataset_id,
            path.display()
        );
        Ok(records)
    }
}

/// Parse one corpus file into records, dispatching on extension.
fn load_corpus_file(path: &Path) -> Result<Vec<QaRecord>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read corpus file '{}'", path.display()))?;

    if path.extension().and_then(|e| e.to_str()) == Some("json") {
        // Whole-file JSON array layout
        let records: Vec<QaRecord> = serde_json::from_str(&text)
            .with_context(|| format!("Corpus file '{}' is not a JSON array of records", path.display()))?;
        return Ok(records);
    }

    // Line-delimited layout: parse each non-empty line independently
    // so one corrupt row does not abort the whole retrieval.
    let mut records = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<QaRecord>(line) {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::warn!(
                    "Skipping corrupt record at {}:{}: {}",
                    path.display(),
                    lineno + 1,
                    e
                );
            }
        }
    }

    Ok(records)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_corpus(dir: &Path, name: &str, content: &str) {
        let mut f = std::fs::File::create(dir.join(name)).unwrap();
        f.write_all(content.as_bytes()).unwrap();
    }

    #[test]
    fn test_loads_jsonl_records() {
        let tmp = tempfile::tempdir().unwrap();
        write_corpus(
            tmp.path(),
            "org__qa.jsonl",
            "{\"question\": \"q1\", \"answers\": \"a1\"}\n{\"question\": \"q2\", \"answers\": \"a2\"}\n",
        );

        let loader  = JsonCorpusLoader::new(tmp.path());
        let records = loader.load("org/qa").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].question_text(), "q1");
        assert_eq!(records[1].answer_text(), "a2");
    }

    #[test]
    fn test_loads_json_array() {
        let tmp = tempfile::tempdir().unwrap();
        write_corpus(
            tmp.path(),
            "plain.json",
            r#"[{"question": "q", "answers": "a"}]"#,
        );

        let loader  = JsonCorpusLoader::new(tmp.path());
        let records = loader.load("plain").unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_missing_corpus_is_fatal() {
        let tmp    = tempfile::tempdir().unwrap();
        let loader = JsonCorpusLoader::new(tmp.path());
        let err    = loader.load("does/not-exist").unwrap_err();
        assert!(err.to_string().contains("does/not-exist"));
    }

    #[test]
    fn test_corrupt_lines_are_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        write_corpus(
            tmp.path(),
            "mixed.jsonl",
            "{\"question\": \"good\", \"answers\": \"row\"}\nnot json at all\n",
        );

        let loader  = JsonCorpusLoader::new(tmp.path());
        let records = loader.load("mixed").unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_missing_fields_are_kept_for_normalization() {
        let tmp = tempfile::tempdir().unwrap();
        write_corpus(tmp.path(), "gaps.jsonl", "{\"question\": \"only q\"}\n");

        let loader  = JsonCorpusLoader::new(tmp.path());
        let records = loader.load("gaps").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].answer_text(), crate::domain::record::NO_ANSWER);
    }
}
