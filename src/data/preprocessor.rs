// ============================================================
// Layer 4 — Preprocessor
// ============================================================
// Maps raw corpus records to fixed-length encoded examples.
//
// For each record:
//   1. Substitute placeholders for missing question/answer text
//      (done by QaRecord, Layer 3).
//   2. Build the input string from the task-framing template:
//        "question: {q} context: agriculture </s>"
//      The same template is used for training, evaluation, and
//      interactive answering — the model only ever sees inputs
//      in this shape.
//   3. Tokenize the input string and the raw answer independently
//      with the same vocabulary.
//   4. Truncate or pad every token sequence to exactly 128
//      positions; the attention mask marks real tokens (1) vs.
//      padding (0).
//
// The transformation is pure: no shared mutable state between
// batches, and the output order matches the input order. An
// empty string still encodes to a valid all-padding sequence.
//
// Reference: Raffel et al. (2020) — T5 text-to-text framing

use anyhow::Result;
use tokenizers::Tokenizer;

use crate::data::dataset::EncodedExample;
use crate::domain::record::QaRecord;

/// Task-framing prefix placed before the question text.
pub const TASK_PREFIX: &str = "question: ";

/// Domain-context suffix placed after the question text.
pub const CONTEXT_SUFFIX: &str = " context: agriculture ";

/// End-of-sequence marker appended to every framed input.
pub const EOS_MARKER: &str = "</s>";

/// Build the framed input string for a question.
/// `"What grows?"` → `"question: What grows? context: agriculture </s>"`
pub fn frame_question(question: &str) -> String {
    format!("{TASK_PREFIX}{question}{CONTEXT_SUFFIX}{EOS_MARKER}")
}

/// Tokenizes framed inputs and answers to fixed-length id sequences.
pub struct Preprocessor {
    tokenizer: Tokenizer,
    max_len:   usize,
    pad_id:    u32,
    eos_id:    u32,
}

impl Preprocessor {
    /// Create a preprocessor over a tokenizer. The pad and
    /// end-of-sequence ids are resolved from the vocabulary once.
    pub fn new(tokenizer: Tokenizer, max_len: usize) -> Result<Self> {
        let pad_id = tokenizer
            .token_to_id("<pad>")
            .ok_or_else(|| anyhow::anyhow!("Tokenizer has no <pad> token"))?;
        let eos_id = tokenizer
            .token_to_id(EOS_MARKER)
            .ok_or_else(|| anyhow::anyhow!("Tokenizer has no {EOS_MARKER} token"))?;
        Ok(Self { tokenizer, max_len, pad_id, eos_id })
    }

    pub fn pad_id(&self) -> u32 { self.pad_id }
    pub fn eos_id(&self) -> u32 { self.eos_id }
    pub fn max_len(&self) -> usize { self.max_len }

    /// Encode one record into a fixed-length example.
    pub fn encode_record(&self, record: &QaRecord) -> Result<EncodedExample> {
        let framed = frame_question(record.question_text());
        let (input_ids, attention_mask) = self.encode_input(&framed)?;
        let labels = self.encode_labels(record.answer_text())?;

        Ok(EncodedExample { input_ids, attention_mask, labels })
    }

    /// Encode a batch of records, preserving input order.
    pub fn encode_batch(&self, records: &[QaRecord]) -> Result<Vec<EncodedExample>> {
        records.iter().map(|r| self.encode_record(r)).collect()
    }

    /// Tokenize an already-framed input string to (ids, mask),
    /// both exactly `max_len` long.
    pub fn encode_input(&self, framed: &str) -> Result<(Vec<u32>, Vec<u32>)> {
        let enc = self
            .tokenizer
            .encode(framed, false)
            .map_err(|e| anyhow::anyhow!("Tokenisation error: {e}"))?;
        Ok(self.fit(enc.get_ids()))
    }

    /// Tokenize an answer to a fixed-length label sequence.
    /// The end-of-sequence id is appended so generation learns to
    /// terminate; it is lost for answers at or over the limit,
    /// matching max-length truncation of the framed inputs.
    fn encode_labels(&self, answer: &str) -> Result<Vec<u32>> {
        let enc = self
            .tokenizer
            .encode(answer, false)
            .map_err(|e| anyhow::anyhow!("Tokenisation error: {e}"))?;

        let mut ids: Vec<u32> = enc.get_ids().to_vec();
        ids.push(self.eos_id);
        let (labels, _) = self.fit(&ids);
        Ok(labels)
    }

    /// Truncate or pad `ids` to exactly `max_len`, returning the
    /// fitted ids and the matching attention mask.
    fn fit(&self, ids: &[u32]) -> (Vec<u32>, Vec<u32>) {
        let mut fitted: Vec<u32> = ids.iter().copied().take(self.max_len).collect();
        let real = fitted.len();

        let mut mask = vec![1u32; real];
        while fitted.len() < self.max_len {
            fitted.push(self.pad_id);
            mask.push(0);
        }

        (fitted, mask)
    }

    /// Decode token ids back to text, stripping special tokens.
    pub fn decode(&self, ids: &[u32]) -> Result<String> {
        self.tokenizer
            .decode(ids, true)
            .map_err(|e| anyhow::anyhow!("Decode error: {e}"))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::{NO_ANSWER, UNKNOWN_QUESTION};
    use crate::infra::tokenizer_store::TokenizerStore;

    /// Build a word-level tokenizer over a tiny fixed corpus so the
    /// tests run without any pretrained assets.
    fn test_preprocessor(max_len: usize) -> Preprocessor {
        let texts: Vec<String> = vec![
            frame_question("What is the best fertilizer for wheat?"),
            frame_question(UNKNOWN_QUESTION),
            "nitrogen rich manure works best for wheat".to_string(),
            NO_ANSWER.to_string(),
        ];
        let tmp   = tempfile::tempdir().unwrap();
        let store = TokenizerStore::new(tmp.path().to_str().unwrap());
        let tok   = store.load_or_build(&texts, 1000).unwrap();
        Preprocessor::new(tok, max_len).unwrap()
    }

    #[test]
    fn test_framing_template_exact() {
        assert_eq!(
            frame_question("What is the best fertilizer for wheat?"),
            "question: What is the best fertilizer for wheat? context: agriculture </s>"
        );
    }

    #[test]
    fn test_encoded_lengths_are_exact() {
        let prep = test_preprocessor(128);
        let rec  = QaRecord::new(
            "What is the best fertilizer for wheat?",
            "nitrogen rich manure works best for wheat",
        );
        let ex = prep.encode_record(&rec).unwrap();
        assert_eq!(ex.input_ids.len(), 128);
        assert_eq!(ex.attention_mask.len(), 128);
        assert_eq!(ex.labels.len(), 128);
    }

    #[test]
    fn test_truncation_to_max_len() {
        let prep = test_preprocessor(8);
        let long = QaRecord::new(
            "What is the best fertilizer for wheat? What is the best fertilizer for wheat?",
            "nitrogen rich manure works best for wheat nitrogen rich manure works best for wheat",
        );
        let ex = prep.encode_record(&long).unwrap();
        assert_eq!(ex.input_ids.len(), 8);
        assert_eq!(ex.labels.len(), 8);
        // Fully occupied — no padding anywhere
        assert!(ex.attention_mask.iter().all(|&m| m == 1));
    }

    #[test]
    fn test_missing_question_encodes_placeholder() {
        let prep = test_preprocessor(128);
        let rec  = QaRecord { question: None, answer: Some("soil".into()) };
        let ex   = prep.encode_record(&rec).unwrap();

        // The input must be built from the placeholder framing
        let (expected, _) = prep
            .encode_input(&frame_question(UNKNOWN_QUESTION))
            .unwrap();
        assert_eq!(ex.input_ids, expected);
    }

    #[test]
    fn test_label_round_trip() {
        let prep   = test_preprocessor(128);
        let answer = "nitrogen rich manure works best for wheat";
        let rec    = QaRecord::new("What is the best fertilizer for wheat?", answer);
        let ex     = prep.encode_record(&rec).unwrap();

        // Decoding the label ids (special tokens stripped) must
        // reconstruct the normalized answer text.
        let decoded = prep.decode(&ex.labels).unwrap();
        assert_eq!(decoded, answer);
    }

    #[test]
    fn test_empty_string_still_encodes() {
        let prep = test_preprocessor(16);
        let (ids, mask) = prep.encode_input("").unwrap();
        assert_eq!(ids.len(), 16);
        // Padding-heavy: every position is padding
        assert!(ids.iter().all(|&id| id == prep.pad_id()));
        assert!(mask.iter().all(|&m| m == 0));
    }

    #[test]
    fn test_attention_mask_marks_real_tokens() {
        let prep = test_preprocessor(128);
        let (ids, mask) = prep
            .encode_input(&frame_question("What is the best fertilizer for wheat?"))
            .unwrap();

        let real = mask.iter().filter(|&&m| m == 1).count();
        assert!(real > 0 && real < 128);
        // Real prefix, then padding to the end
        assert!(ids[real..].iter().all(|&id| id == prep.pad_id()));
        assert!(mask[..real].iter().all(|&m| m == 1));
    }

    #[test]
    fn test_batch_preserves_order() {
        let prep = test_preprocessor(128);
        let records = vec![
            QaRecord::new("What is the best fertilizer for wheat?", "manure"),
            QaRecord { question: None, answer: Some("soil".into()) },
        ];
        let batch = prep.encode_batch(&records).unwrap();
        assert_eq!(batch.len(), 2);

        let first = prep.encode_record(&records[0]).unwrap();
        assert_eq!(batch[0].input_ids, first.input_ids);
    }
}
