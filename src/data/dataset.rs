use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

/// One fully tokenized and padded training example.
/// Input format: "question: {q} context: agriculture </s>" + padding;
/// labels hold the tokenized answer followed by </s> and padding.
/// All three sequences are exactly max_seq_len (128) long.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodedExample {
    pub input_ids:      Vec<u32>,
    pub attention_mask: Vec<u32>,
    pub labels:         Vec<u32>,
}

impl EncodedExample {
    /// Number of non-padding input tokens
    pub fn real_token_count(&self) -> usize {
        self.attention_mask.iter().filter(|&&m| m == 1).count()
    }
}

pub struct Seq2SeqDataset {
    examples: Vec<EncodedExample>,
}

impl Seq2SeqDataset {
    pub fn new(examples: Vec<EncodedExample>) -> Self { Self { examples } }

    pub fn example_count(&self) -> usize { self.examples.len() }
}

impl Dataset<EncodedExample> for Seq2SeqDataset {
    fn get(&self, index: usize) -> Option<EncodedExample> {
        self.examples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.examples.len()
    }
}
