// ============================================================
// Layer 6 — Tokenizer Store
// ============================================================
// Manages tokenizer building, saving, and loading.
//
// A pretrained base checkpoint ships its own tokenizer.json; a
// from-scratch run builds a word-level vocabulary from the corpus
// instead. Either way the file format is the HuggingFace
// tokenizer JSON that Tokenizer::from_file() expects, with
// T5-style special tokens at fixed ids:
//
//   <pad> = 0   (padding, and the decoder start token)
//   </s>  = 1   (end of sequence)
//   <unk> = 2   (out-of-vocabulary words)
//
// Words are kept verbatim (split on whitespace, no lowercasing),
// so decoding a label sequence reconstructs the original answer
// text for in-vocabulary answers.
//
// Reference: tokenizers crate documentation (WordLevel model)

use anyhow::{Context, Result};
use std::path::PathBuf;
use tokenizers::Tokenizer;

pub struct TokenizerStore {
    dir: PathBuf,
}

impl TokenizerStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the tokenizer JSON inside this store
    pub fn path(&self) -> PathBuf {
        self.dir.join("tokenizer.json")
    }

    /// True once a tokenizer has been saved here
    pub fn exists(&self) -> bool {
        self.path().exists()
    }

    /// Load existing tokenizer or build a new one from texts
    pub fn load_or_build(
        &self,
        texts:      &[String],
        vocab_size: usize,
    ) -> Result<Tokenizer> {
        if self.exists() {
            tracing::info!("Loading existing tokenizer from disk");
            self.load()
        } else {
            tracing::info!("Building new tokenizer (vocab_size={})", vocab_size);
            self.build_and_save(texts, vocab_size)
        }
    }

    /// Load a previously saved tokenizer from its JSON file
    pub fn load(&self) -> Result<Tokenizer> {
        let path = self.path();
        Tokenizer::from_file(&path)
            .map_err(|e| anyhow::anyhow!(
                "Cannot load tokenizer from '{}': {}", path.display(), e
            ))
    }

    /// Save a tokenizer into this store (used to copy the base
    /// checkpoint's tokenizer into a run snapshot).
    pub fn save(&self, tokenizer: &Tokenizer) -> Result<()> {
        std::fs::create_dir_all(&self.dir).ok();
        let path = self.path();
        tokenizer
            .save(&path, true)
            .map_err(|e| anyhow::anyhow!(
                "Cannot save tokenizer to '{}': {}", path.display(), e
            ))
    }

    /// Build a word-level vocabulary from corpus texts and write a
    /// valid tokenizer JSON directly, then load it back.
    fn build_and_save(&self, texts: &[String], vocab_size: usize) -> Result<Tokenizer> {
        std::fs::create_dir_all(&self.dir).ok();

        // ── Step 1: Count word frequencies across the corpus ──────────────────
        // Tokens are whitespace-split and kept verbatim so that
        // encode→decode round-trips reproduce the source text.
        use std::collections::HashMap;
        let mut freq: HashMap<&str, usize> = HashMap::new();

        for text in texts {
            for word in text.split_whitespace() {
                *freq.entry(word).or_insert(0) += 1;
            }
        }

        // Specials have reserved ids — never duplicate them as words
        freq.remove("<pad>");
        freq.remove("</s>");
        freq.remove("<unk>");

        // Sort by frequency descending (ties alphabetical, so the
        // built vocabulary is deterministic), keep the top
        // vocab_size - 3 words.
        let mut words: Vec<(&str, usize)> = freq.into_iter().collect();
        words.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
        let max_words = vocab_size.saturating_sub(3);
        words.truncate(max_words);

        // ── Step 2: Build the vocab JSON ──────────────────────────────────────
        let mut vocab = serde_json::json!({
            "<pad>": 0,
            "</s>":  1,
            "<unk>": 2,
        });

        let mut next_id = 3usize;
        for (word, _) in &words {
            if vocab.get(word).is_none() {
                vocab[word] = serde_json::json!(next_id);
                next_id += 1;
            }
        }

        // ── Step 3: Write tokenizer JSON in HuggingFace format ────────────────
        // This format is what Tokenizer::from_file() expects
        let tokenizer_json = serde_json::json!({
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": [
                {"id": 0, "content": "<pad>", "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true},
                {"id": 1, "content": "</s>",  "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true},
                {"id": 2, "content": "<unk>", "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true}
            ],
            "normalizer": null,
            "pre_tokenizer": {
                "type": "WhitespaceSplit"
            },
            "post_processor": null,
            "decoder": null,
            "model": {
                "type": "WordLevel",
                "vocab": vocab,
                "unk_token": "<unk>"
            }
        });

        let path = self.path();
        std::fs::write(
            &path,
            serde_json::to_string_pretty(&tokenizer_json)?
        ).with_context(|| "Cannot write tokenizer JSON")?;

        tracing::info!(
            "Tokenizer built with {} entries, saved to '{}'",
            next_id,
            path.display()
        );

        // Load back as a proper Tokenizer instance
        Tokenizer::from_file(&path)
            .map_err(|e| anyhow::anyhow!("Cannot reload tokenizer: {e}"))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn sample_texts() -> Vec<String> {
        vec![
            "question: how deep to plant maize context: agriculture </s>".to_string(),
            "plant maize about five cm deep".to_string(),
        ]
    }

    #[test]
    fn test_special_token_ids_are_fixed() {
        let tmp   = tempfile::tempdir().unwrap();
        let store = TokenizerStore::new(tmp.path());
        let tok   = store.load_or_build(&sample_texts(), 100).unwrap();

        assert_eq!(tok.token_to_id("<pad>"), Some(0));
        assert_eq!(tok.token_to_id("</s>"),  Some(1));
        assert_eq!(tok.token_to_id("<unk>"), Some(2));
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let tmp   = tempfile::tempdir().unwrap();
        let store = TokenizerStore::new(tmp.path());
        let tok   = store.load_or_build(&sample_texts(), 100).unwrap();

        let enc = tok.encode("plant maize deep", false).unwrap();
        let out = tok.decode(enc.get_ids(), true).unwrap();
        assert_eq!(out, "plant maize deep");
    }

    #[test]
    fn test_unknown_word_maps_to_unk() {
        let tmp   = tempfile::tempdir().unwrap();
        let store = TokenizerStore::new(tmp.path());
        let tok   = store.load_or_build(&sample_texts(), 100).unwrap();

        let enc = tok.encode("zebra", false).unwrap();
        assert_eq!(enc.get_ids(), &[2]);
    }

    #[test]
    fn test_eos_marker_encodes_to_eos_id() {
        let tmp   = tempfile::tempdir().unwrap();
        let store = TokenizerStore::new(tmp.path());
        let tok   = store.load_or_build(&sample_texts(), 100).unwrap();

        let enc = tok.encode("maize </s>", false).unwrap();
        assert_eq!(*enc.get_ids().last().unwrap(), 1);
    }

    #[test]
    fn test_second_call_loads_existing() {
        let tmp   = tempfile::tempdir().unwrap();
        let store = TokenizerStore::new(tmp.path());

        let first  = store.load_or_build(&sample_texts(), 100).unwrap();
        // Different texts must NOT rebuild — the saved file wins
        let second = store.load_or_build(&["other words entirely".to_string()], 100).unwrap();

        assert_eq!(
            first.token_to_id("maize"),
            second.token_to_id("maize"),
        );
    }

    #[test]
    fn test_vocab_cap_respected() {
        let tmp   = tempfile::tempdir().unwrap();
        let store = TokenizerStore::new(tmp.path());
        // Cap far below the number of distinct words
        let texts: Vec<String> = (0..50).map(|i| format!("word{i}")).collect();
        let tok = store.load_or_build(&texts, 10).unwrap();

        assert!(tok.get_vocab_size(true) <= 10);
    }
}
